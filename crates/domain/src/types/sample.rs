//! Sample-size values and decisions

use std::fmt;

use serde::{Deserialize, Serialize};

use super::table::TableName;

/// Unit a sample size is expressed in.
///
/// The unit is fixed by configuration and recorded in the model artifact so a
/// model is always applied in the unit it was trained on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleUnit {
    /// Absolute number of rows
    #[default]
    Rows,
    /// Proportion of the table, in [0, 1]
    Fraction,
}

impl SampleUnit {
    /// Upper bound of the valid domain for a table with `row_count` rows.
    pub fn upper_bound(self, row_count: f64) -> f64 {
        match self {
            SampleUnit::Rows => row_count.max(0.0),
            SampleUnit::Fraction => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SampleUnit::Rows => "rows",
            SampleUnit::Fraction => "fraction",
        }
    }
}

impl fmt::Display for SampleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single numeric sample-size value with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleSize {
    pub value: f64,
    pub unit: SampleUnit,
}

impl SampleSize {
    pub fn rows(value: f64) -> Self {
        Self { value, unit: SampleUnit::Rows }
    }

    pub fn fraction(value: f64) -> Self {
        Self { value, unit: SampleUnit::Fraction }
    }

    /// Express `rows` out of `row_count` in `unit`.
    pub fn from_rows(rows: f64, row_count: f64, unit: SampleUnit) -> Self {
        match unit {
            SampleUnit::Rows => Self::rows(rows),
            SampleUnit::Fraction if row_count > 0.0 => Self::fraction((rows / row_count).min(1.0)),
            SampleUnit::Fraction => Self::fraction(0.0),
        }
    }

    /// Absolute row count this size stands for on a table of `row_count` rows.
    pub fn to_rows(self, row_count: f64) -> u64 {
        let rows = match self.unit {
            SampleUnit::Rows => self.value,
            SampleUnit::Fraction => self.value * row_count.max(0.0),
        };
        if !(rows.is_finite() && rows > 0.0) {
            return 0;
        }
        // A fraction taken from a whole row count must map back to that count.
        let nearest = rows.round();
        if (rows - nearest).abs() <= WHOLE_ROW_TOLERANCE * nearest.max(1.0) {
            nearest as u64
        } else {
            rows.ceil() as u64
        }
    }
}

/// Relative distance from a whole row under which a product counts as that row.
const WHOLE_ROW_TOLERANCE: f64 = 1e-9;

/// Sample size chosen for one table, resolved to a row count.
///
/// Derived per table and consumed immediately by the analyze executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeDecision {
    pub table: TableName,
    pub size: SampleSize,
    pub rows: u64,
}

impl SampleSizeDecision {
    pub fn new(table: TableName, size: SampleSize, row_count: f64) -> Self {
        let rows = size.to_rows(row_count);
        Self { table, size, rows }
    }
}
