//! colloquy-rag
//!
//! Retrieval-augmented generation pipeline: extract text from uploads, split
//! it into chunks, store each file once per conversation, and assemble
//! retrieved chunks into a prompt context block.

pub mod chunker;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod retrieve;
pub mod store;
