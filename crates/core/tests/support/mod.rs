//! Shared test helpers for `statsampler-core` integration tests.
//!
//! In-memory mocks for every collaborator the flow controllers consume, plus
//! fixtures for metrics, plans and model artifacts. Mocks record their calls
//! so tests can assert on ordering and side effects.

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;
