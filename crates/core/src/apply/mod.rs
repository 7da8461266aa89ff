pub mod controller;

pub use controller::{ApplyFlowController, ApplyOutcome};
