pub mod chunk;
pub mod envelope;
pub mod prompt;
pub mod response;
pub mod upload;
pub mod usage;
