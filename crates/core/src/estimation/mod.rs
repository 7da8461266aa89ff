pub mod heuristic;
pub mod model;
pub mod ports;

pub use heuristic::HeuristicEstimator;
pub use model::{ClampedPrediction, ModelEstimator};
pub use ports::{SampleSizeEstimator, SampleSizeModel};
