//! JSON file store for model artifacts.
//!
//! LEARN persists through [`ModelSink`] and APPLY reads back through
//! [`ModelLoader`]; the file is the only hand-off between the two processes.
//! Writes go to a sibling temporary file first and are renamed into place, so
//! a reader never observes a half-written artifact.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use statsampler_core::{ModelLoader, ModelSink, SampleSizeModel};
use statsampler_domain::{FeatureSchema, RegressionModel, Result as DomainResult, StatSamplerError};
use tokio::fs;
use tracing::{debug, info, instrument};

/// Model artifact store rooted at one file path.
#[derive(Debug, Clone)]
pub struct FileModelStore {
    path: PathBuf,
}

impl FileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the artifact at `location`.
    ///
    /// # Errors
    /// `StatSamplerError::ModelNotFound` when the file is missing, is not a
    /// model document, or does not match the current feature schema.
    pub async fn read(location: &Path) -> DomainResult<RegressionModel> {
        let not_found = |reason: String| StatSamplerError::ModelNotFound {
            location: location.display().to_string(),
            reason,
        };

        let bytes = fs::read(location).await.map_err(|e| not_found(e.to_string()))?;
        let model: RegressionModel = serde_json::from_slice(&bytes)
            .map_err(|e| not_found(format!("corrupt model artifact: {e}")))?;
        model
            .validate(&FeatureSchema::current())
            .map_err(|reason| not_found(format!("invalid model artifact: {reason}")))?;
        Ok(model)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> StatSamplerError {
    StatSamplerError::Internal(format!("failed to write model to {}: {err}", path.display()))
}

#[async_trait]
impl ModelSink for FileModelStore {
    #[instrument(skip(self, model), fields(path = %self.path.display(), model_id = %model.model_id))]
    async fn persist(&self, model: &RegressionModel) -> DomainResult<String> {
        let json = serde_json::to_vec_pretty(model).map_err(|e| write_error(&self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| write_error(&self.path, e))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, &json).await.map_err(|e| write_error(&temp, e))?;
        if let Err(err) = fs::rename(&temp, &self.path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(write_error(&self.path, err));
        }

        info!(bytes = json.len(), "model artifact written");
        Ok(self.path.display().to_string())
    }
}

#[async_trait]
impl ModelLoader for FileModelStore {
    #[instrument(skip(self), fields(location = %location.display()))]
    async fn load(&self, location: &Path) -> DomainResult<Arc<dyn SampleSizeModel>> {
        let model = Self::read(location).await?;
        debug!(
            model_id = %model.model_id,
            unit = %model.unit,
            examples = model.example_count,
            "model artifact loaded"
        );
        Ok(Arc::new(model))
    }
}
