use colloquy_core::models::usage::{ModelPricing, TokenCount};

/// Extract token counts from a Bedrock Converse response.
pub fn extract_token_usage(usage: &aws_sdk_bedrockruntime::types::TokenUsage) -> TokenCount {
    TokenCount {
        input: usage.input_tokens.max(0) as u64,
        output: usage.output_tokens.max(0) as u64,
    }
}

/// Sonnet 4 list price per million tokens; other models log no cost.
const SONNET_4: ModelPricing = ModelPricing {
    input_per_million: 3.0,
    output_per_million: 15.0,
};

pub fn get_pricing(model_id: &str) -> Option<ModelPricing> {
    model_id.contains("claude-sonnet-4").then_some(SONNET_4)
}
