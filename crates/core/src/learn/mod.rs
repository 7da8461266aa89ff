pub mod controller;
pub mod state;

pub use controller::{LearnFlowController, LearnPipeline, LearnReport, SkippedTable};
pub use state::LearnState;
