//! The warehouse collaborator.
//!
//! Listing, schema lookup, job submission and job polling are all done by the
//! warehouse; this crate only decides what to ask for.

use async_trait::async_trait;
use bqmask_model::{
    DatasetRef, JobHandle, JobResult, MaskingSpec, OverwritePolicy, SelectExpression, TableId,
    TableMetadata, TableSchema,
};

use crate::error::WarehouseError;

/// A masking query ready to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub select: Vec<SelectExpression>,
    pub source: TableId,
    pub destination: TableId,
    pub overwrite: OverwritePolicy,
    pub location: Option<String>,
}

impl From<MaskingSpec> for QueryRequest {
    fn from(spec: MaskingSpec) -> Self {
        Self {
            select: spec.select,
            source: spec.source,
            destination: spec.destination,
            overwrite: spec.overwrite,
            location: spec.location,
        }
    }
}

/// Operations a warehouse must provide to run masking jobs.
///
/// One handle is created per run and passed down by reference; implementations
/// must tolerate concurrent calls from sibling tables.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Lists every object in `dataset`, of any kind.
    async fn list_tables(&self, dataset: &DatasetRef) -> Result<Vec<TableMetadata>, WarehouseError>;

    async fn get_schema(&self, table: &TableId) -> Result<TableSchema, WarehouseError>;

    /// Starts the query and returns without waiting for it to finish.
    async fn submit_query(&self, request: QueryRequest) -> Result<JobHandle, WarehouseError>;

    /// Reports the current state of a job; may still be pending.
    async fn poll_job(&self, handle: &JobHandle) -> Result<JobResult, WarehouseError>;
}

