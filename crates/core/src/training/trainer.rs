//! Ridge-regression model trainer

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use statsampler_domain::constants::{
    MODEL_FORMAT_VERSION, TARGET_ADJUSTMENT_MAX, TARGET_ADJUSTMENT_MIN,
};
use statsampler_domain::{
    FeatureSchema, LearnConfig, RegressionModel, Result, SampleSize, SampleUnit, StatSamplerError,
    TrainingCorpus, TrainingExample,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::features::transform;
use super::ports::{ModelSink, ModelTrainer, TrainedModel};
use super::regression::fit_ridge;

/// Sample size an example suggests in hindsight, expressed in `unit`.
///
/// The sample actually used is scaled by `sqrt(q_error / target_q_error)`
/// (bounded to [0.5, 2]): plans that misestimated badly ask for more rows,
/// plans that beat the target ask for fewer. The result stays within
/// `[1, row_estimate]` rows.
pub fn training_target(
    example: &TrainingExample,
    target_q_error: f64,
    unit: SampleUnit,
) -> Result<f64> {
    let row_count = example.metrics().row_count()?;
    let used = example.decision().rows as f64;
    let q_error = example.plan().max_q_error.max(1.0);

    let adjustment =
        (q_error / target_q_error).sqrt().clamp(TARGET_ADJUSTMENT_MIN, TARGET_ADJUSTMENT_MAX);
    let rows = (used * adjustment).min(row_count).max(1.0);

    Ok(SampleSize::from_rows(rows, row_count, unit).value)
}

/// Fits a [`RegressionModel`] and hands it to a [`ModelSink`].
pub struct RegressionTrainer {
    sink: Arc<dyn ModelSink>,
    schema: FeatureSchema,
    unit: SampleUnit,
    min_examples: usize,
    target_q_error: f64,
    ridge_lambda: f64,
}

impl RegressionTrainer {
    pub fn new(sink: Arc<dyn ModelSink>, config: &LearnConfig, unit: SampleUnit) -> Self {
        Self {
            sink,
            schema: FeatureSchema::current(),
            unit,
            min_examples: config.min_training_examples.max(1),
            target_q_error: config.target_q_error,
            ridge_lambda: config.ridge_lambda,
        }
    }

    /// Fit without persisting.
    pub fn fit(&self, corpus: &TrainingCorpus) -> Result<RegressionModel> {
        if corpus.len() < self.min_examples {
            return Err(StatSamplerError::InsufficientData {
                required: self.min_examples,
                available: corpus.len(),
            });
        }

        let mut rows = Vec::with_capacity(corpus.len());
        let mut targets = Vec::with_capacity(corpus.len());
        for example in corpus {
            rows.push(transform(&self.schema, example.metrics())?);
            targets.push(training_target(example, self.target_q_error, self.unit)?.ln_1p());
        }

        let fit = fit_ridge(&rows, &targets, self.ridge_lambda)?;
        let model = RegressionModel {
            format_version: MODEL_FORMAT_VERSION,
            model_id: Uuid::now_v7(),
            trained_at: Utc::now(),
            feature_schema_version: self.schema.version(),
            feature_names: self.schema.names(),
            means: fit.means,
            scales: fit.scales,
            weights: fit.weights,
            intercept: fit.intercept,
            unit: self.unit,
            example_count: corpus.len(),
            trained_tables: corpus.tables().iter().map(ToString::to_string).collect(),
        };

        model.validate(&self.schema).map_err(StatSamplerError::Internal)?;
        Ok(model)
    }
}

#[async_trait]
impl ModelTrainer for RegressionTrainer {
    #[instrument(skip(self, corpus), fields(examples = corpus.len(), unit = %self.unit))]
    async fn train(&self, corpus: TrainingCorpus) -> Result<TrainedModel> {
        let model = self.fit(&corpus)?;
        let location = self.sink.persist(&model).await?;

        info!(
            model_id = %model.model_id,
            location = %location,
            intercept = model.intercept,
            "model trained and persisted"
        );
        Ok(TrainedModel { model, location })
    }
}
