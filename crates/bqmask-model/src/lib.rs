//! Data model for masking warehouse datasets.
//!
//! Identifiers, schemas and the values passed between the masking stages.
//! Nothing here performs I/O.

pub mod column;
pub mod error;
pub mod ids;
pub mod job;
pub mod masking;
pub mod policy;
pub mod report;
pub mod table;
pub mod transform;

pub use column::{ColumnSchema, ColumnType};
pub use error::{ModelError, Result};
pub use ids::{DatasetRef, ProjectId, TableId};
pub use job::{JobHandle, JobResult, JobStatus};
pub use masking::MaskingSpec;
pub use policy::OverwritePolicy;
pub use report::{FailureReport, FailureStage, FailureTarget, TableFailure};
pub use table::{TableKind, TableMetadata, TableSchema};
pub use transform::{FingerprintOutput, SelectExpression, TransformExpression};
