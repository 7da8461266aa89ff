//! # statsampler Domain
//!
//! Domain types and models for learned ANALYZE sample-size estimation.
//!
//! This crate contains:
//! - Table identifiers, metrics and the versioned feature schema
//! - Sample-size decisions, plan outcomes and the training corpus
//! - The persisted model artifact
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other statsampler crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
