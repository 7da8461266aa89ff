//! Catalog-backed metrics collector
//!
//! Reads `pg_class`, `pg_stat_user_tables` and `pg_stats` through the
//! database session and folds them into the version 1 feature schema.

use std::sync::Arc;

use async_trait::async_trait;
use statsampler_domain::{Feature, Result, StatSamplerError, TableMetrics, TableName};
use tracing::{debug, instrument};

use super::ports::MetricsCollector;
use crate::database_session_ports::{DatabaseSession, QueryRow};

const CLASS_SQL: &str = "\
SELECT c.reltuples::float8 AS reltuples,
       c.relpages::float8 AS relpages,
       pg_total_relation_size(c.oid)::float8 AS total_bytes,
       (SELECT count(*) FROM pg_attribute a
         WHERE a.attrelid = c.oid AND a.attnum > 0 AND NOT a.attisdropped)::float8 AS column_count
  FROM pg_class c
 WHERE c.oid = to_regclass($1::text)";

const ACTIVITY_SQL: &str = "\
SELECT s.n_live_tup::float8 AS live_tuples,
       s.n_dead_tup::float8 AS dead_tuples,
       s.n_mod_since_analyze::float8 AS mod_since_analyze
  FROM pg_stat_user_tables s
 WHERE s.relid = to_regclass($1::text)";

const COLUMN_STATS_SQL: &str = "\
SELECT st.null_frac::float8 AS null_frac,
       st.n_distinct::float8 AS n_distinct,
       st.correlation::float8 AS correlation
  FROM pg_stats st
  JOIN pg_namespace n ON n.nspname = st.schemaname
  JOIN pg_class c ON c.relnamespace = n.oid AND c.relname = st.tablename
 WHERE c.oid = to_regclass($1::text)";

/// Metrics collector backed by the PostgreSQL system catalogs.
pub struct CatalogMetricsCollector {
    session: Arc<dyn DatabaseSession>,
}

impl CatalogMetricsCollector {
    pub fn new(session: Arc<dyn DatabaseSession>) -> Self {
        Self { session }
    }

    async fn query(&self, table: &TableName, sql: &str) -> Result<Vec<QueryRow>> {
        let regclass = table.quoted();
        self.session.run_query(sql, &[regclass.as_str()]).await.map_err(|err| match err {
            StatSamplerError::Execution { reason, .. } => StatSamplerError::MetricsUnavailable {
                table: table.to_string(),
                reason,
            },
            other => other,
        })
    }
}

#[async_trait]
impl MetricsCollector for CatalogMetricsCollector {
    #[instrument(skip(self), fields(table = %table))]
    async fn collect(&self, table: &TableName) -> Result<TableMetrics> {
        let class_rows = self.query(table, CLASS_SQL).await?;
        let class_row = class_rows
            .into_iter()
            .next()
            .ok_or_else(|| StatSamplerError::TableNotFound { table: table.to_string() })?;

        let activity_row = self.query(table, ACTIVITY_SQL).await?.into_iter().next();
        let column_stats = self.query(table, COLUMN_STATS_SQL).await?;

        let metrics = build_metrics(table, &class_row, activity_row.as_ref(), &column_stats)?;
        debug!(
            row_estimate = metrics.get(Feature::RowEstimate),
            stats_columns = column_stats.len(),
            "collected table metrics"
        );
        Ok(metrics)
    }
}

/// Fold raw catalog rows into a [`TableMetrics`].
///
/// `reltuples` is negative for tables that were never vacuumed or analyzed;
/// live tuples from the activity view stand in for it then. Without either
/// the row estimate is unknown and collection fails.
pub fn build_metrics(
    table: &TableName,
    class_row: &QueryRow,
    activity_row: Option<&QueryRow>,
    column_stats: &[QueryRow],
) -> Result<TableMetrics> {
    let unavailable = |reason: &str| StatSamplerError::MetricsUnavailable {
        table: table.to_string(),
        reason: reason.to_string(),
    };

    let live_tuples = activity_row.and_then(|row| row.get_f64("live_tuples"));
    let row_estimate = match class_row.get_f64("reltuples") {
        Some(reltuples) if reltuples >= 0.0 => reltuples,
        _ => live_tuples.ok_or_else(|| unavailable("catalog row estimate is not available"))?,
    };

    let page_count = class_row
        .get_f64("relpages")
        .ok_or_else(|| unavailable("relpages is not available"))?
        .max(0.0);
    let total_bytes = class_row.get_f64("total_bytes").unwrap_or(0.0).max(0.0);
    let column_count = class_row.get_f64("column_count").unwrap_or(0.0).max(0.0);

    let dead_tuples = activity_row.and_then(|row| row.get_f64("dead_tuples")).unwrap_or(0.0);
    let mod_since_analyze =
        activity_row.and_then(|row| row.get_f64("mod_since_analyze")).unwrap_or(0.0);

    let dead_tuple_ratio = dead_tuples.max(0.0) / live_tuples.unwrap_or(row_estimate).max(1.0);
    let mod_since_analyze_ratio = mod_since_analyze.max(0.0) / row_estimate.max(1.0);

    let stats_coverage = if column_count > 0.0 {
        (column_stats.len() as f64 / column_count).min(1.0)
    } else {
        0.0
    };

    let null_fracs = column_stats.iter().filter_map(|row| row.get_f64("null_frac"));
    let distinct_ratios = column_stats
        .iter()
        .filter_map(|row| row.get_f64("n_distinct"))
        .map(|n_distinct| distinct_ratio(n_distinct, row_estimate));
    let correlations =
        column_stats.iter().filter_map(|row| row.get_f64("correlation")).map(f64::abs);

    Ok(TableMetrics::builder(table.clone())
        .set(Feature::RowEstimate, row_estimate)
        .set(Feature::TotalBytes, total_bytes)
        .set(Feature::PageCount, page_count)
        .set(Feature::ColumnCount, column_count)
        .set(Feature::StatsCoverage, stats_coverage)
        .set(Feature::AvgNullFrac, mean(null_fracs))
        .set(Feature::AvgDistinctRatio, mean(distinct_ratios))
        .set(Feature::AvgAbsCorrelation, mean(correlations))
        .set(Feature::DeadTupleRatio, dead_tuple_ratio)
        .set(Feature::ModSinceAnalyzeRatio, mod_since_analyze_ratio)
        .build())
}

/// `n_distinct` is a negated ratio when negative and an absolute count
/// otherwise; normalize both to a ratio in [0, 1].
fn distinct_ratio(n_distinct: f64, row_estimate: f64) -> f64 {
    let ratio = if n_distinct < 0.0 { -n_distinct } else { n_distinct / row_estimate.max(1.0) };
    ratio.clamp(0.0, 1.0)
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
