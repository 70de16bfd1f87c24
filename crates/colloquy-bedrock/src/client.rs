use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};

/// Attempts per Converse call: the first try plus one retry on a transient
/// (throttling, 5xx, dispatch) failure.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Load the shared AWS config for `region` from the default credential chain.
pub async fn load_config(region: &str, max_attempts: u32) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::standard().with_max_attempts(max_attempts))
        .load()
        .await
}

/// Build a Bedrock runtime client for `region` with the default retry policy.
pub async fn build_client_with_region(region: &str) -> aws_sdk_bedrockruntime::Client {
    let config = load_config(region, DEFAULT_MAX_ATTEMPTS).await;
    aws_sdk_bedrockruntime::Client::new(&config)
}
