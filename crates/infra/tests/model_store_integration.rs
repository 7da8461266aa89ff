//! Integration tests for the JSON file model store
//!
//! Covers the LEARN → APPLY hand-off through the filesystem.

use chrono::Utc;
use statsampler_core::{ModelLoader, ModelSink, SampleSizeModel};
use statsampler_domain::constants::MODEL_FORMAT_VERSION;
use statsampler_domain::{
    Feature, FeatureSchema, RegressionModel, SampleUnit, StatSamplerError, TableMetrics, TableName,
};
use statsampler_infra::FileModelStore;
use tempfile::tempdir;
use uuid::Uuid;

fn model() -> RegressionModel {
    let schema = FeatureSchema::current();
    let width = schema.features().len();
    RegressionModel {
        format_version: MODEL_FORMAT_VERSION,
        model_id: Uuid::new_v4(),
        trained_at: Utc::now(),
        feature_schema_version: schema.version(),
        feature_names: schema.names(),
        means: (0..width).map(|i| i as f64 * 0.5).collect(),
        scales: vec![1.5; width],
        weights: (0..width).map(|i| 0.01 * i as f64).collect(),
        intercept: 6.2,
        unit: SampleUnit::Rows,
        example_count: 3,
        trained_tables: vec!["orders".into(), "customers".into(), "items".into()],
    }
}

fn metrics() -> TableMetrics {
    Feature::ALL
        .iter()
        .fold(TableMetrics::builder(TableName::parse("orders").unwrap()), |b, f| b.set(*f, 0.3))
        .set(Feature::RowEstimate, 250_000.0)
        .build()
}

fn assert_model_not_found(result: Result<(), StatSamplerError>) {
    match result {
        Err(StatSamplerError::ModelNotFound { .. }) => {}
        other => panic!("expected ModelNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn persisted_model_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/models/model.json");
    let store = FileModelStore::new(&path);
    let original = model();

    let location = store.persist(&original).await.unwrap();
    assert_eq!(location, path.display().to_string());
    assert!(!dir.path().join("nested/models/model.json.tmp").exists());

    let reread = FileModelStore::read(&path).await.unwrap();
    assert_eq!(reread, original);

    let loaded = store.load(&path).await.unwrap();
    assert_eq!(loaded.unit(), SampleUnit::Rows);
    assert_eq!(loaded.predict(&metrics()).unwrap(), original.predict(&metrics()).unwrap());
}

#[tokio::test]
async fn persisting_again_replaces_the_artifact() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let store = FileModelStore::new(&path);

    store.persist(&model()).await.unwrap();
    let second = model();
    store.persist(&second).await.unwrap();

    assert_eq!(FileModelStore::read(&path).await.unwrap().model_id, second.model_id);
}

#[tokio::test]
async fn missing_artifact_is_model_not_found() {
    let dir = tempdir().unwrap();
    let store = FileModelStore::new(dir.path().join("model.json"));

    assert_model_not_found(store.load(&dir.path().join("absent.json")).await.map(|_| ()));
}

#[tokio::test]
async fn corrupt_artifact_is_model_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, b"{\"format_version\": 1, \"weights\": [").unwrap();

    assert_model_not_found(FileModelStore::new(&path).load(&path).await.map(|_| ()));
}

#[tokio::test]
async fn inconsistent_artifact_is_model_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let mut truncated = model();
    truncated.weights.truncate(3);
    std::fs::write(&path, serde_json::to_vec(&truncated).unwrap()).unwrap();

    assert_model_not_found(FileModelStore::new(&path).load(&path).await.map(|_| ()));
}

#[tokio::test]
async fn artifact_from_other_schema_is_model_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let mut drifted = model();
    drifted.feature_schema_version += 1;
    std::fs::write(&path, serde_json::to_vec(&drifted).unwrap()).unwrap();

    assert_model_not_found(FileModelStore::new(&path).load(&path).await.map(|_| ()));
}
