//! EXPLAIN (ANALYZE, BUFFERS, FORMAT JSON) parsing
//!
//! Extracts the fields a [`PlanOutcome`] needs from PostgreSQL's JSON plan
//! document and converts buffer block counts to bytes.

use serde_json::Value;
use statsampler_domain::constants::BLOCK_SIZE_BYTES;
use statsampler_domain::{q_error, BufferUsage, PlanOutcome, Result, StatSamplerError, TableName};

/// Parse one EXPLAIN JSON document into a plan outcome for `table`.
///
/// Accepts both the top-level array PostgreSQL returns and the single object
/// it wraps.
pub fn parse_explain(table: &TableName, query: &str, document: &Value) -> Result<PlanOutcome> {
    let malformed = |reason: &str| StatSamplerError::Execution {
        table: Some(table.to_string()),
        reason: format!("malformed EXPLAIN output: {reason}"),
    };

    let top = match document {
        Value::Array(items) => items.first().ok_or_else(|| malformed("empty plan array"))?,
        other => other,
    };
    let root = top.get("Plan").ok_or_else(|| malformed("missing \"Plan\" node"))?;

    let root_node = root
        .get("Node Type")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing \"Node Type\""))?
        .to_string();
    let estimated_rows = number(root, "Plan Rows").ok_or_else(|| malformed("missing \"Plan Rows\""))?;
    let actual_per_loop = number(root, "Actual Rows")
        .ok_or_else(|| malformed("missing \"Actual Rows\"; was ANALYZE requested?"))?;
    let loops = number(root, "Actual Loops").unwrap_or(1.0);

    let mut walk = TreeWalk::default();
    walk.visit(root);

    Ok(PlanOutcome {
        table: table.clone(),
        query: query.to_string(),
        root_node,
        estimated_rows,
        actual_rows: actual_per_loop * loops,
        startup_cost: number(root, "Startup Cost").unwrap_or(0.0),
        total_cost: number(root, "Total Cost").unwrap_or(0.0),
        planning_time_ms: number(top, "Planning Time").unwrap_or(0.0),
        execution_time_ms: number(top, "Execution Time").unwrap_or(0.0),
        buffers: buffer_usage(root),
        node_count: walk.nodes,
        max_q_error: walk.max_q_error,
    })
}

#[derive(Debug)]
struct TreeWalk {
    nodes: usize,
    max_q_error: f64,
}

impl Default for TreeWalk {
    fn default() -> Self {
        Self { nodes: 0, max_q_error: 1.0 }
    }
}

impl TreeWalk {
    fn visit(&mut self, node: &Value) {
        self.nodes += 1;

        // Never-executed nodes have zero loops and say nothing about estimates.
        let loops = number(node, "Actual Loops").unwrap_or(0.0);
        if loops > 0.0 {
            if let (Some(estimated), Some(actual)) =
                (number(node, "Plan Rows"), number(node, "Actual Rows"))
            {
                self.max_q_error = self.max_q_error.max(q_error(estimated, actual));
            }
        }

        if let Some(children) = node.get("Plans").and_then(Value::as_array) {
            for child in children {
                self.visit(child);
            }
        }
    }
}

fn number(node: &Value, key: &str) -> Option<f64> {
    node.get(key).and_then(Value::as_f64)
}

fn blocks_to_bytes(node: &Value, key: &str) -> u64 {
    node.get(key).and_then(Value::as_u64).unwrap_or(0).saturating_mul(BLOCK_SIZE_BYTES)
}

fn buffer_usage(root: &Value) -> BufferUsage {
    BufferUsage {
        shared_hit_bytes: blocks_to_bytes(root, "Shared Hit Blocks"),
        shared_read_bytes: blocks_to_bytes(root, "Shared Read Blocks"),
        shared_dirtied_bytes: blocks_to_bytes(root, "Shared Dirtied Blocks"),
        shared_written_bytes: blocks_to_bytes(root, "Shared Written Blocks"),
        local_read_bytes: blocks_to_bytes(root, "Local Read Blocks"),
        temp_read_bytes: blocks_to_bytes(root, "Temp Read Blocks"),
        temp_written_bytes: blocks_to_bytes(root, "Temp Written Blocks"),
    }
}
