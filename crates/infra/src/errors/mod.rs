//! Infrastructure error handling

pub mod conversions;

pub use conversions::{postgres_error, InfraError};
