pub mod features;
pub mod ports;
pub mod regression;
pub mod trainer;

pub use features::{signed_log, transform};
pub use ports::{ModelLoader, ModelSink, ModelTrainer, TrainedModel};
pub use regression::{fit_ridge, RidgeFit};
pub use trainer::{training_target, RegressionTrainer};
