//! Masking of every table in one dataset.

use bqmask_model::{
    DatasetRef, FailureReport, FailureStage, FailureTarget, JobHandle, MaskingSpec,
    OverwritePolicy, ProjectId, TableFailure, TableMetadata,
};
use futures_util::stream::{self, StreamExt};
use tracing::{Instrument, debug, error, info, info_span};

use crate::builder::TableMaskJobBuilder;
use crate::error::TableError;
use crate::executor::TableMaskExecutor;
use crate::options::RunOptions;
use crate::warehouse::Warehouse;

/// Outcome of masking one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetReport {
    pub failures: FailureReport,
    /// Tables whose masking job finished successfully.
    pub tables_masked: usize,
    /// Listed objects that are not regular tables (views, external tables, ...).
    pub tables_skipped: usize,
    /// Columns copied unmasked across all submitted tables.
    pub passthrough_columns: usize,
}

/// Masking specs of one dataset, built without submitting anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetPlan {
    /// Specs ordered by source table.
    pub specs: Vec<MaskingSpec>,
    pub failures: FailureReport,
    pub tables_skipped: usize,
}

struct Submitted {
    handle: JobHandle,
    passthrough_columns: usize,
}

/// Fans masking out over the tables of a dataset.
///
/// Each table is prepared and submitted independently; a failure in one table
/// is recorded and never stops its siblings. Jobs are awaited only once every
/// submission has been issued so the warehouse runs them side by side.
pub struct DatasetOrchestrator<'a, W: ?Sized> {
    warehouse: &'a W,
    options: RunOptions,
}

impl<'a, W: Warehouse + ?Sized> DatasetOrchestrator<'a, W> {
    pub fn new(warehouse: &'a W, options: RunOptions) -> Self {
        Self { warehouse, options }
    }

    /// Masks every regular table of `dataset` into the same-named dataset of
    /// `destination_project`.
    pub async fn run(
        &self,
        dataset: &DatasetRef,
        destination_project: &ProjectId,
        overwrite: OverwritePolicy,
    ) -> DatasetReport {
        let destination = dataset.with_project(destination_project.clone());
        let span = info_span!("dataset", dataset = %dataset, destination = %destination);
        self.run_dataset(dataset, &destination, overwrite)
            .instrument(span)
            .await
    }

    async fn run_dataset(
        &self,
        dataset: &DatasetRef,
        destination: &DatasetRef,
        overwrite: OverwritePolicy,
    ) -> DatasetReport {
        let mut report = DatasetReport::default();

        let (tables, skipped) = match self.list_regular_tables(dataset, destination).await {
            Ok(listed) => listed,
            Err(failure) => {
                report.failures.push(failure);
                return report;
            }
        };
        report.tables_skipped = skipped;

        let concurrency = self.options.table_concurrency.max(1);
        let submissions: Vec<Result<Submitted, TableError>> = stream::iter(&tables)
            .map(|table| {
                let span = info_span!("table", table = %table.id);
                self.submit_table(table, destination, overwrite)
                    .instrument(span)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut handles = Vec::with_capacity(submissions.len());
        for submission in submissions {
            match submission {
                Ok(submitted) => {
                    report.passthrough_columns += submitted.passthrough_columns;
                    handles.push(submitted.handle);
                }
                Err(table_error) => {
                    report.failures.push(table_failure(&table_error, destination));
                }
            }
        }

        let executor = TableMaskExecutor::new(self.warehouse, self.options.poll_interval);
        let results: Vec<_> = stream::iter(&handles)
            .map(|handle| executor.wait(handle))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        for result in results {
            if result.succeeded() {
                info!(destination = %result.destination, job_id = %result.job_id, "table masked");
                report.tables_masked += 1;
                continue;
            }
            let cause = result
                .status
                .error()
                .unwrap_or("job ended without a terminal state")
                .to_string();
            error!(
                destination = %result.destination,
                job_id = %result.job_id,
                error = %cause,
                "masking job has errors"
            );
            report.failures.record(
                FailureTarget::Table(result.destination),
                FailureStage::Execution,
                cause,
            );
        }

        report
    }

    /// Builds the masking spec of every regular table of `dataset` without
    /// submitting any job.
    pub async fn plan(
        &self,
        dataset: &DatasetRef,
        destination_project: &ProjectId,
        overwrite: OverwritePolicy,
    ) -> DatasetPlan {
        let destination = dataset.with_project(destination_project.clone());
        let span = info_span!("plan", dataset = %dataset, destination = %destination);
        self.plan_dataset(dataset, &destination, overwrite)
            .instrument(span)
            .await
    }

    async fn plan_dataset(
        &self,
        dataset: &DatasetRef,
        destination: &DatasetRef,
        overwrite: OverwritePolicy,
    ) -> DatasetPlan {
        let mut plan = DatasetPlan::default();
        let (tables, skipped) = match self.list_regular_tables(dataset, destination).await {
            Ok(listed) => listed,
            Err(failure) => {
                plan.failures.push(failure);
                return plan;
            }
        };
        plan.tables_skipped = skipped;

        let builder = TableMaskJobBuilder::new(self.warehouse);
        let built: Vec<Result<MaskingSpec, TableError>> = stream::iter(&tables)
            .map(|table| builder.build(&table.id, destination, overwrite))
            .buffer_unordered(self.options.table_concurrency.max(1))
            .collect()
            .await;
        for result in built {
            match result {
                Ok(spec) => plan.specs.push(spec),
                Err(table_error) => plan.failures.push(table_failure(&table_error, destination)),
            }
        }
        plan.specs.sort_by(|a, b| a.source.cmp(&b.source));
        plan
    }

    /// Lists `dataset` and keeps regular tables, returning them with the
    /// number of skipped objects.
    async fn list_regular_tables(
        &self,
        dataset: &DatasetRef,
        destination: &DatasetRef,
    ) -> Result<(Vec<TableMetadata>, usize), TableFailure> {
        let listed = self.warehouse.list_tables(dataset).await.map_err(|list_error| {
            error!(dataset = %dataset, error = %list_error, "failed to list tables");
            TableFailure {
                target: FailureTarget::Dataset(destination.clone()),
                stage: FailureStage::ListTables,
                cause: list_error.to_string(),
            }
        })?;

        let (tables, skipped): (Vec<TableMetadata>, Vec<TableMetadata>) =
            listed.into_iter().partition(|table| table.kind.is_table());
        for table in &skipped {
            debug!(table = %table.id, kind = %table.kind, "skipping non-table object");
        }
        info!(
            table_count = tables.len(),
            skipped_count = skipped.len(),
            "listed dataset"
        );
        Ok((tables, skipped.len()))
    }

    async fn submit_table(
        &self,
        table: &TableMetadata,
        destination: &DatasetRef,
        overwrite: OverwritePolicy,
    ) -> Result<Submitted, TableError> {
        let spec = TableMaskJobBuilder::new(self.warehouse)
            .build(&table.id, destination, overwrite)
            .await?;
        let passthrough_columns = spec.passthrough_count();
        let handle = TableMaskExecutor::new(self.warehouse, self.options.poll_interval)
            .submit(spec)
            .await?;
        Ok(Submitted {
            handle,
            passthrough_columns,
        })
    }
}

/// Logs a table error and converts it into a report entry keyed by the
/// destination table.
fn table_failure(table_error: &TableError, destination: &DatasetRef) -> TableFailure {
    let target = table_error.table().in_dataset(destination);
    error!(
        table = %table_error.table(),
        destination = %target,
        stage = %table_error.stage(),
        error = %table_error,
        "error masking table"
    );
    TableFailure {
        target: FailureTarget::Table(target),
        stage: table_error.stage(),
        cause: table_error.to_string(),
    }
}
