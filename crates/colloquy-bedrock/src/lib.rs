//! colloquy-bedrock
//!
//! The completion provider seam and its Bedrock Converse implementation.

pub mod client;
pub mod converse;
pub mod error;
pub mod provider;
pub mod tokens;
