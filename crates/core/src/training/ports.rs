//! Port interfaces for model training and artifact storage

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use statsampler_domain::{RegressionModel, Result, TrainingCorpus};

use crate::estimation::SampleSizeModel;

/// Fitted model together with where it was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub model: RegressionModel,
    pub location: String,
}

/// Trait for fitting a model from one LEARN run's corpus
#[async_trait]
pub trait ModelTrainer: Send + Sync {
    /// Fit and persist a model.
    ///
    /// Fails with `InsufficientData` when the corpus is smaller than the
    /// configured minimum. The model is only returned once it is durable.
    async fn train(&self, corpus: TrainingCorpus) -> Result<TrainedModel>;
}

/// Trait for writing model artifacts to durable storage
#[async_trait]
pub trait ModelSink: Send + Sync {
    /// Persist `model`, returning the location it can be loaded from.
    async fn persist(&self, model: &RegressionModel) -> Result<String>;
}

/// Trait for reading model artifacts back for APPLY
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Load the artifact at `location`.
    ///
    /// Missing, unreadable or inconsistent artifacts fail with
    /// `ModelNotFound`; a partially-constructed model is never returned.
    async fn load(&self, location: &Path) -> Result<Arc<dyn SampleSizeModel>>;
}
