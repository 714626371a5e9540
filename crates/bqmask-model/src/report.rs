//! Per-table failure accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DatasetRef, TableId};

/// Where in the per-table pipeline a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    ListTables,
    SchemaFetch,
    Submission,
    Execution,
}

impl FailureStage {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListTables => "list tables",
            Self::SchemaFetch => "schema fetch",
            Self::Submission => "submission",
            Self::Execution => "execution",
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What failed: normally a destination table, or a whole destination dataset
/// when its source could not even be listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureTarget {
    Table(TableId),
    Dataset(DatasetRef),
}

impl fmt::Display for FailureTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(table) => table.fmt(f),
            Self::Dataset(dataset) => dataset.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableFailure {
    pub target: FailureTarget,
    pub stage: FailureStage,
    pub cause: String,
}

impl fmt::Display for TableFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.target, self.stage, self.cause)
    }
}

/// Failures collected while masking one or more datasets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    failures: Vec<TableFailure>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, target: FailureTarget, stage: FailureStage, cause: impl Into<String>) {
        self.failures.push(TableFailure {
            target,
            stage,
            cause: cause.into(),
        });
    }

    pub fn push(&mut self, failure: TableFailure) {
        self.failures.push(failure);
    }

    /// Moves every failure of `other` into this report.
    pub fn merge(&mut self, other: FailureReport) {
        self.failures.extend(other.failures);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableFailure> {
        self.failures.iter()
    }

    /// Failed destinations, in the order they were recorded.
    pub fn targets(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|failure| failure.target.to_string())
            .collect()
    }
}

impl<'a> IntoIterator for &'a FailureReport {
    type Item = &'a TableFailure;
    type IntoIter = std::slice::Iter<'a, TableFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for FailureReport {
    type Item = TableFailure;
    type IntoIter = std::vec::IntoIter<TableFailure>;

    fn into_iter(self) -> Self::IntoIter {
        self.failures.into_iter()
    }
}

impl FromIterator<TableFailure> for FailureReport {
    fn from_iter<I: IntoIterator<Item = TableFailure>>(iter: I) -> Self {
        Self {
            failures: iter.into_iter().collect(),
        }
    }
}

impl Extend<TableFailure> for FailureReport {
    fn extend<I: IntoIterator<Item = TableFailure>>(&mut self, iter: I) {
        self.failures.extend(iter);
    }
}
