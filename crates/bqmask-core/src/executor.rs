//! Submission and completion tracking of masking jobs.

use std::time::Duration;

use bqmask_model::{JobHandle, JobResult, JobStatus, MaskingSpec};
use tracing::{debug, info, warn};

use crate::error::TableError;
use crate::warehouse::{QueryRequest, Warehouse};

/// Submits masking specs as warehouse jobs and waits for them to finish.
pub struct TableMaskExecutor<'a, W: ?Sized> {
    warehouse: &'a W,
    poll_interval: Duration,
}

impl<'a, W: Warehouse + ?Sized> TableMaskExecutor<'a, W> {
    pub fn new(warehouse: &'a W, poll_interval: Duration) -> Self {
        Self {
            warehouse,
            poll_interval,
        }
    }

    /// Starts the masking job for `spec` and returns without waiting for it.
    ///
    /// # Errors
    ///
    /// [`TableError::EmptySelect`] when `spec` selects no column, and
    /// [`TableError::Submission`] when the warehouse rejects the job.
    pub async fn submit(&self, spec: MaskingSpec) -> Result<JobHandle, TableError> {
        if spec.select.is_empty() {
            return Err(TableError::EmptySelect { table: spec.source });
        }
        let source = spec.source.clone();
        let handle = self
            .warehouse
            .submit_query(QueryRequest::from(spec))
            .await
            .map_err(|source_error| TableError::Submission {
                table: source.clone(),
                source: source_error,
            })?;
        info!(
            table = %source,
            destination = %handle.destination,
            job_id = %handle.id,
            "masking job submitted"
        );
        Ok(handle)
    }

    /// Polls the job until it reaches a terminal state.
    ///
    /// Never returns an error: a failing job, or a job that can no longer be
    /// polled, is reported as a failed [`JobResult`]. Transport errors while
    /// polling leave the job running and are retried after `poll_interval`.
    pub async fn wait(&self, handle: &JobHandle) -> JobResult {
        loop {
            match self.warehouse.poll_job(handle).await {
                Ok(result) if result.status.is_terminal() => return result,
                Ok(_) => {
                    debug!(job_id = %handle.id, "job still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(error) if error.is_transient() => {
                    warn!(job_id = %handle.id, error = %error, "job poll failed, retrying");
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(error) => {
                    return JobResult::new(
                        handle,
                        JobStatus::Failed(format!("failed to poll job: {error}")),
                    );
                }
            }
        }
    }
}
