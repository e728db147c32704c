//! Core domain types
//!
//! Error hierarchy and shared result alias used throughout the crate.

pub mod errors;

pub use errors::RehideError;

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, RehideError>;
