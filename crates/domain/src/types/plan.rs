//! Captured execution-plan outcomes

use serde::{Deserialize, Serialize};

use super::table::TableName;

/// Buffer and I/O counters for one executed plan, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BufferUsage {
    pub shared_hit_bytes: u64,
    pub shared_read_bytes: u64,
    pub shared_dirtied_bytes: u64,
    pub shared_written_bytes: u64,
    pub local_read_bytes: u64,
    pub temp_read_bytes: u64,
    pub temp_written_bytes: u64,
}

impl BufferUsage {
    /// Bytes that had to be read from outside shared buffers.
    pub fn read_bytes(&self) -> u64 {
        self.shared_read_bytes
            .saturating_add(self.local_read_bytes)
            .saturating_add(self.temp_read_bytes)
    }
}

/// Normalized record of one EXPLAIN (ANALYZE, BUFFERS) execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub table: TableName,
    pub query: String,
    /// Root node type, e.g. `Limit` or `Seq Scan`
    pub root_node: String,
    pub estimated_rows: f64,
    /// Root actual rows multiplied by loops
    pub actual_rows: f64,
    pub startup_cost: f64,
    pub total_cost: f64,
    pub planning_time_ms: f64,
    pub execution_time_ms: f64,
    pub buffers: BufferUsage,
    pub node_count: usize,
    /// Worst per-node q-error across the whole plan tree
    pub max_q_error: f64,
}

impl PlanOutcome {
    /// Q-error of the root node's row estimate.
    pub fn root_q_error(&self) -> f64 {
        q_error(self.estimated_rows, self.actual_rows)
    }
}

/// Symmetric estimation error `max(est/act, act/est)`.
///
/// Both sides are floored at one row so empty results do not divide by zero;
/// a perfect estimate scores 1.0.
pub fn q_error(estimated: f64, actual: f64) -> f64 {
    let estimated = if estimated.is_finite() { estimated.max(1.0) } else { 1.0 };
    let actual = if actual.is_finite() { actual.max(1.0) } else { 1.0 };
    (estimated / actual).max(actual / estimated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn q_error_is_symmetric_and_floored() {
        assert_eq!(q_error(100.0, 100.0), 1.0);
        assert_eq!(q_error(10.0, 100.0), 10.0);
        assert_eq!(q_error(100.0, 10.0), 10.0);
        assert_eq!(q_error(0.0, 0.0), 1.0);
        assert_eq!(q_error(0.0, 50.0), 50.0);
    }

    #[test]
    fn read_bytes_sums_sources() {
        let usage = BufferUsage {
            shared_read_bytes: 8192,
            local_read_bytes: 8192,
            temp_read_bytes: 16384,
            ..BufferUsage::default()
        };
        assert_eq!(usage.read_bytes(), 32768);
    }
}
