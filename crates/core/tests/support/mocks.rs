//! Mock collaborator implementations for testing

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use statsampler_core::{
    AnalyzeExecutor, DatabaseSession, MetricsCollector, ModelLoader, ModelTrainer, PlanLogger,
    QueryRow, SampleSizeModel, TrainedModel,
};
use statsampler_domain::constants::DEFAULT_REPRESENTATIVE_QUERY;
use statsampler_domain::{
    PlanOutcome, Result as DomainResult, SampleSizeDecision, SampleUnit, StatSamplerError,
    TableMetrics, TableName, TrainingCorpus,
};
use tokio_util::sync::CancellationToken;

use super::fixtures;

/// Session that only counts lifecycle calls.
#[derive(Default)]
pub struct CountingSession {
    closes: AtomicUsize,
    fail_close: bool,
}

impl CountingSession {
    pub fn failing_close() -> Self {
        Self { closes: AtomicUsize::new(0), fail_close: true }
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseSession for CountingSession {
    async fn run_query(&self, _sql: &str, _params: &[&str]) -> DomainResult<Vec<QueryRow>> {
        Ok(Vec::new())
    }

    async fn run_explain_analyze(&self, _sql: &str) -> DomainResult<serde_json::Value> {
        Ok(json!([]))
    }

    async fn run_statistics_refresh(
        &self,
        _table: &TableName,
        _sample_rows: Option<u64>,
    ) -> DomainResult<()> {
        Ok(())
    }

    async fn close(&self) -> DomainResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(StatSamplerError::Connection("connection reset during close".into()));
        }
        Ok(())
    }
}

/// Collector returning pre-built metrics; unknown tables are not found.
#[derive(Default)]
pub struct FixedMetricsCollector {
    metrics: HashMap<TableName, TableMetrics>,
    calls: Mutex<Vec<TableName>>,
}

impl FixedMetricsCollector {
    pub fn with(mut self, metrics: TableMetrics) -> Self {
        self.metrics.insert(metrics.table().clone(), metrics);
        self
    }

    pub fn calls(&self) -> Vec<TableName> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsCollector for FixedMetricsCollector {
    async fn collect(&self, table: &TableName) -> DomainResult<TableMetrics> {
        self.calls.lock().unwrap().push(table.clone());
        self.metrics
            .get(table)
            .cloned()
            .ok_or_else(|| StatSamplerError::TableNotFound { table: table.to_string() })
    }
}

/// One recorded `run_analyze` call.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzeCall {
    pub table: TableName,
    pub decision: Option<SampleSizeDecision>,
}

impl AnalyzeCall {
    pub fn sample_rows(&self) -> Option<u64> {
        self.decision.as_ref().map(|d| d.rows)
    }
}

/// Executor that records calls instead of touching a database.
#[derive(Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<AnalyzeCall>>,
    failures: HashMap<TableName, StatSamplerError>,
}

impl RecordingExecutor {
    /// Make `run_analyze` on `table` fail with `error`.
    pub fn failing_on(mut self, table: &str, error: StatSamplerError) -> Self {
        self.failures.insert(fixtures::table(table), error);
        self
    }

    pub fn calls(&self) -> Vec<AnalyzeCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalyzeExecutor for RecordingExecutor {
    async fn run_analyze(
        &self,
        table: &TableName,
        sample: Option<&SampleSizeDecision>,
    ) -> DomainResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(AnalyzeCall { table: table.clone(), decision: sample.cloned() });
        match self.failures.get(table) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn run_and_capture_plan(
        &self,
        table: &TableName,
        query: &str,
    ) -> DomainResult<PlanOutcome> {
        Ok(fixtures::plan(&table.to_string(), query))
    }
}

/// Plan logger returning fixed outcomes; can trip a cancellation token.
#[derive(Default)]
pub struct FixedPlanLogger {
    captured: Mutex<Vec<TableName>>,
    cancel_after: Option<(TableName, CancellationToken)>,
}

impl FixedPlanLogger {
    /// Cancel `token` once the plan for `table` has been captured.
    pub fn cancelling_after(table: &str, token: CancellationToken) -> Self {
        Self { captured: Mutex::default(), cancel_after: Some((fixtures::table(table), token)) }
    }

    pub fn captured(&self) -> Vec<TableName> {
        self.captured.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanLogger for FixedPlanLogger {
    async fn capture_plan(&self, table: &TableName) -> DomainResult<PlanOutcome> {
        self.captured.lock().unwrap().push(table.clone());
        if let Some((trigger, token)) = &self.cancel_after {
            if trigger == table {
                token.cancel();
            }
        }
        Ok(fixtures::plan(&table.to_string(), DEFAULT_REPRESENTATIVE_QUERY))
    }

    fn query_template(&self) -> &str {
        DEFAULT_REPRESENTATIVE_QUERY
    }
}

/// Trainer that records every corpus it receives.
#[derive(Default)]
pub struct RecordingTrainer {
    corpora: Mutex<Vec<TrainingCorpus>>,
}

impl RecordingTrainer {
    pub fn corpora(&self) -> Vec<TrainingCorpus> {
        self.corpora.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelTrainer for RecordingTrainer {
    async fn train(&self, corpus: TrainingCorpus) -> DomainResult<TrainedModel> {
        let names: Vec<String> = corpus.tables().iter().map(ToString::to_string).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let model = fixtures::regression_model(&refs);
        self.corpora.lock().unwrap().push(corpus);
        Ok(TrainedModel { model, location: "memory://trained".to_string() })
    }
}

/// Model whose prediction ignores its input.
pub struct FixedPredictionModel {
    pub value: f64,
    pub unit: SampleUnit,
}

impl SampleSizeModel for FixedPredictionModel {
    fn predict(&self, _metrics: &TableMetrics) -> DomainResult<f64> {
        Ok(self.value)
    }

    fn unit(&self) -> SampleUnit {
        self.unit
    }
}

/// Loader handing out one fixed model, or failing when none is set.
pub struct FixedModelLoader {
    model: Option<Arc<dyn SampleSizeModel>>,
    loads: Mutex<Vec<PathBuf>>,
}

impl FixedModelLoader {
    pub fn predicting(value: f64, unit: SampleUnit) -> Self {
        Self {
            model: Some(Arc::new(FixedPredictionModel { value, unit })),
            loads: Mutex::default(),
        }
    }

    pub fn missing() -> Self {
        Self { model: None, loads: Mutex::default() }
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelLoader for FixedModelLoader {
    async fn load(&self, location: &Path) -> DomainResult<Arc<dyn SampleSizeModel>> {
        self.loads.lock().unwrap().push(location.to_path_buf());
        self.model.clone().ok_or_else(|| StatSamplerError::ModelNotFound {
            location: location.display().to_string(),
            reason: "no such file".to_string(),
        })
    }
}

/// Heuristic inputs keyed by table, for building collectors quickly.
pub fn collector_for(tables: &[(&str, f64, f64, f64)]) -> FixedMetricsCollector {
    tables.iter().fold(FixedMetricsCollector::default(), |collector, (name, rows, distinct, dead)| {
        collector.with(fixtures::metrics(name, *rows, *distinct, *dead))
    })
}

/// Names a set of tables that should never be touched.
pub fn untouched(calls: &[TableName], tables: &[&str]) -> bool {
    let forbidden: HashSet<TableName> = tables.iter().map(|t| fixtures::table(t)).collect();
    calls.iter().all(|call| !forbidden.contains(call))
}
