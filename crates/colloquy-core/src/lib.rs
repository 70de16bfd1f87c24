//! colloquy-core
//!
//! Request/response DTOs, error codes, validation, persona templates and the
//! chunk index schema. No AWS or HTTP dependency. This is the shared
//! vocabulary of the Colloquy backend.

pub mod error;
pub mod models;
pub mod persona;
pub mod schema;
pub mod validate;
