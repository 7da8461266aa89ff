//! Training examples and the per-run corpus

use serde::{Deserialize, Serialize};

use super::metrics::TableMetrics;
use super::plan::PlanOutcome;
use super::sample::SampleSizeDecision;
use super::table::TableName;
use crate::errors::{Result, StatSamplerError};

/// One observed (metrics, sample size, plan outcome) triple for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    metrics: TableMetrics,
    decision: SampleSizeDecision,
    plan: PlanOutcome,
}

impl TrainingExample {
    /// Pair the halves of one table's LEARN iteration.
    ///
    /// Fails when the metrics, decision and plan do not all refer to the same
    /// table.
    pub fn new(
        metrics: TableMetrics,
        decision: SampleSizeDecision,
        plan: PlanOutcome,
    ) -> Result<Self> {
        let table = metrics.table();
        if &decision.table != table || &plan.table != table {
            return Err(StatSamplerError::Internal(format!(
                "training example mixes tables: metrics={table}, decision={}, plan={}",
                decision.table, plan.table
            )));
        }
        Ok(Self { metrics, decision, plan })
    }

    pub fn table(&self) -> &TableName {
        self.metrics.table()
    }

    pub fn metrics(&self) -> &TableMetrics {
        &self.metrics
    }

    pub fn decision(&self) -> &SampleSizeDecision {
        &self.decision
    }

    pub fn plan(&self) -> &PlanOutcome {
        &self.plan
    }
}

/// Ordered, append-only collection of examples from one LEARN run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingCorpus {
    examples: Vec<TrainingExample>,
}

impl TrainingCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, example: TrainingExample) {
        self.examples.push(example);
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn examples(&self) -> &[TrainingExample] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrainingExample> {
        self.examples.iter()
    }

    /// Tables in insertion order.
    pub fn tables(&self) -> Vec<TableName> {
        self.examples.iter().map(|e| e.table().clone()).collect()
    }
}

impl<'a> IntoIterator for &'a TrainingCorpus {
    type Item = &'a TrainingExample;
    type IntoIter = std::slice::Iter<'a, TrainingExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}
