//! PostgreSQL adapters
//!
//! `tokio-postgres` implementation of the core database session port.

pub mod session;

pub use session::{statistics_target_for, PostgresSession};
