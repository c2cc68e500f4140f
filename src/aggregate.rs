// ➕ Aggregator - sum of Total Funds grouped by one or two dimensions
// Dense reindex fills every (row, column) combination of a declared domain

use crate::error::AggregateError;
use crate::records::{
    BursaryRecord, COL_ETHNIC_GROUP, COL_GENDER, COL_INSTITUTION, COL_QUALIFICATION,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// DIMENSIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Institution,
    Qualification,
    Gender,
    EthnicGroup,
}

impl Dimension {
    /// Source column this dimension reads
    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Institution => COL_INSTITUTION,
            Dimension::Qualification => COL_QUALIFICATION,
            Dimension::Gender => COL_GENDER,
            Dimension::EthnicGroup => COL_ETHNIC_GROUP,
        }
    }

    pub fn value_of<'a>(&self, record: &'a BursaryRecord) -> &'a str {
        match self {
            Dimension::Institution => &record.institution,
            Dimension::Qualification => &record.qualification,
            Dimension::Gender => &record.gender,
            Dimension::EthnicGroup => &record.ethnic_group,
        }
    }
}

/// Distinct values of one dimension, ascending
pub fn distinct_values(records: &[BursaryRecord], dimension: Dimension) -> Vec<String> {
    records
        .iter()
        .map(|r| dimension.value_of(r).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// AGGREGATED SERIES
// ============================================================================

/// Group key: one value per dimension, in dimension order
pub type GroupKey = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSeries {
    pub dimensions: Vec<Dimension>,
    pub totals: HashMap<GroupKey, f64>,
}

impl AggregatedSeries {
    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }

    pub fn get(&self, key: &[&str]) -> Option<f64> {
        let key: GroupKey = key.iter().map(|k| k.to_string()).collect();
        self.totals.get(&key).copied()
    }

    /// Entries ordered by key, ascending
    pub fn sorted_by_key(&self) -> Vec<(GroupKey, f64)> {
        let mut entries: Vec<(GroupKey, f64)> =
            self.totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Entries ordered by total, descending; ties by key
    pub fn sorted_descending(&self) -> Vec<(GroupKey, f64)> {
        let mut entries: Vec<(GroupKey, f64)> =
            self.totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        entries
    }

    /// Flatten one-dimension keys to plain labels
    pub fn labeled(entries: Vec<(GroupKey, f64)>) -> Vec<(String, f64)> {
        entries
            .into_iter()
            .map(|(key, value)| (key.join(" / "), value))
            .collect()
    }
}

/// Sum Total Funds per group of 1 or 2 dimensions
pub fn sum_by(
    records: &[BursaryRecord],
    dimensions: &[Dimension],
) -> Result<AggregatedSeries, AggregateError> {
    if dimensions.is_empty() || dimensions.len() > 2 {
        return Err(AggregateError::UnsupportedDimensions(dimensions.len()));
    }

    let mut totals: HashMap<GroupKey, f64> = HashMap::new();
    for record in records {
        let key: GroupKey = dimensions
            .iter()
            .map(|d| d.value_of(record).to_string())
            .collect();
        *totals.entry(key).or_insert(0.0) += record.total_funds;
    }

    Ok(AggregatedSeries {
        dimensions: dimensions.to_vec(),
        totals,
    })
}

// ============================================================================
// DENSE REINDEX
// ============================================================================

/// Two-dimension totals over a full rows × columns grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseSeries {
    pub rows: Vec<String>,
    pub columns: Vec<String>,

    /// `values[r][c]` is the total for (rows[r], columns[c])
    pub values: Vec<Vec<f64>>,
}

impl DenseSeries {
    /// Number of (row, column) entries
    pub fn len(&self) -> usize {
        self.rows.len() * self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|v| v == column)?;
        Some(self.values[r][c])
    }

    /// The one-dimensional slice of a single row, in column order
    pub fn row(&self, row: &str) -> Option<Vec<(String, f64)>> {
        let r = self.rows.iter().position(|v| v == row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(self.values[r].iter().copied())
                .collect(),
        )
    }

    /// (row, column, value) in cross-product order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(move |(r, row)| {
            self.columns
                .iter()
                .enumerate()
                .map(move |(c, column)| (row.as_str(), column.as_str(), self.values[r][c]))
        })
    }

    pub fn total(&self) -> f64 {
        self.values.iter().flatten().sum()
    }
}

/// Cover every (row, column) pair of the declared domain, absent pairs at 0.
/// Pairs outside the domain are dropped.
pub fn dense_reindex(
    series: &AggregatedSeries,
    row_values: &[String],
    column_values: &[String],
) -> Result<DenseSeries, AggregateError> {
    if series.dimensions.len() != 2 {
        return Err(AggregateError::NotTwoDimensional(series.dimensions.len()));
    }

    let values = row_values
        .iter()
        .map(|row| {
            column_values
                .iter()
                .map(|column| {
                    let key = vec![row.clone(), column.clone()];
                    series.totals.get(&key).copied().unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    Ok(DenseSeries {
        rows: row_values.to_vec(),
        columns: column_values.to_vec(),
        values,
    })
}
