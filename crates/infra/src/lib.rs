//! # statsampler Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - PostgreSQL database session (`tokio-postgres`, optional TLS)
//! - JSON file model store
//! - Configuration loading from environment and files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `statsampler-core`
//! - Contains all "impure" code (network and file I/O)

pub mod config;
pub mod errors;
pub mod model_store;
pub mod observability;
pub mod postgres;

// Re-export commonly used items
pub use errors::InfraError;
pub use model_store::FileModelStore;
pub use observability::init_tracing;
pub use postgres::PostgresSession;
