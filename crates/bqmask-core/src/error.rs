//! Error types for masking runs.
//!
//! Only [`MaskError`] ever reaches the caller of a run. Table-level errors are
//! converted into [`FailureReport`] entries so sibling tables keep going.

use bqmask_model::{FailureReport, FailureStage, ModelError, ProjectId, TableId};
use thiserror::Error;

/// Errors reported by a [`Warehouse`](crate::Warehouse) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum WarehouseError {
    /// The request never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The referenced dataset, table or job does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The warehouse refused the request (permissions, location, invalid input).
    #[error("rejected: {0}")]
    Rejected(String),

    /// A response could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl WarehouseError {
    /// Whether the same request may succeed when sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Failure while preparing or submitting the job for one table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("failed to fetch schema for {table}: {source}")]
    SchemaFetch {
        table: TableId,
        #[source]
        source: WarehouseError,
    },

    #[error("masking job for {table} has no columns to select")]
    EmptySelect { table: TableId },

    #[error("failed to submit masking job for {table}: {source}")]
    Submission {
        table: TableId,
        #[source]
        source: WarehouseError,
    },
}

impl TableError {
    /// The source table the error belongs to.
    pub fn table(&self) -> &TableId {
        match self {
            Self::SchemaFetch { table, .. }
            | Self::EmptySelect { table }
            | Self::Submission { table, .. } => table,
        }
    }

    pub fn stage(&self) -> FailureStage {
        match self {
            Self::SchemaFetch { .. } => FailureStage::SchemaFetch,
            Self::EmptySelect { .. } | Self::Submission { .. } => FailureStage::Submission,
        }
    }
}

/// Terminal errors of a masking run.
#[derive(Debug, Error)]
pub enum MaskError {
    /// Masking into the source project would overwrite the data being masked.
    #[error(
        "source project `{source_project}` and target project `{target_project}` are the same; masking in place is not supported"
    )]
    Configuration {
        source_project: ProjectId,
        target_project: ProjectId,
    },

    #[error("invalid dataset `{dataset}`: {source}")]
    InvalidDataset {
        dataset: String,
        #[source]
        source: ModelError,
    },

    /// At least one table could not be masked. Raised after every table was attempted.
    #[error("masking failed for the following tables: {}", .failures.targets().join(", "))]
    RunFailed { failures: FailureReport },
}

impl MaskError {
    /// The collected failures of a failed run.
    pub fn failures(&self) -> Option<&FailureReport> {
        match self {
            Self::RunFailed { failures } => Some(failures),
            Self::Configuration { .. } | Self::InvalidDataset { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MaskError>;
