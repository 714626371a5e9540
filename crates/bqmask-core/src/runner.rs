//! Masking runs over several datasets.

use bqmask_model::{DatasetRef, FailureReport, MaskingSpec, OverwritePolicy, ProjectId};
use tracing::{Instrument, error, info, info_span};

use crate::error::{MaskError, Result};
use crate::options::RunOptions;
use crate::orchestrator::DatasetOrchestrator;
use crate::warehouse::Warehouse;

/// Totals of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub datasets: usize,
    pub tables_masked: usize,
    pub tables_skipped: usize,
    pub passthrough_columns: usize,
}

/// Masking specs for a list of datasets, built without submitting anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunPlan {
    pub specs: Vec<MaskingSpec>,
    pub failures: FailureReport,
    pub tables_skipped: usize,
}

/// Masks a list of datasets from one project into another.
pub struct MultiDatasetRunner<'a, W: ?Sized> {
    warehouse: &'a W,
    options: RunOptions,
}

impl<'a, W: Warehouse + ?Sized> MultiDatasetRunner<'a, W> {
    pub fn new(warehouse: &'a W, options: RunOptions) -> Self {
        Self { warehouse, options }
    }

    /// Masks every dataset in `datasets` (names inside `source_project`) into
    /// the dataset of the same name in `target_project`.
    ///
    /// All datasets and tables are attempted before the outcome is decided.
    ///
    /// # Errors
    ///
    /// - [`MaskError::Configuration`] when both projects are the same; nothing is touched.
    /// - [`MaskError::InvalidDataset`] when a dataset name is not a valid identifier.
    /// - [`MaskError::RunFailed`] when any table failed, carrying every failure.
    pub async fn run(
        &self,
        source_project: &ProjectId,
        target_project: &ProjectId,
        datasets: &[String],
        overwrite: OverwritePolicy,
    ) -> Result<RunSummary> {
        let datasets = validate(source_project, target_project, datasets)?;

        let span = info_span!(
            "run",
            source_project = %source_project,
            target_project = %target_project,
            overwrite = %overwrite
        );
        self.run_datasets(&datasets, target_project, overwrite)
            .instrument(span)
            .await
    }

    /// Lists every dataset and builds the masking spec of each table, without
    /// submitting any job. Schema and listing failures are collected in the
    /// returned plan.
    ///
    /// # Errors
    ///
    /// [`MaskError::Configuration`] and [`MaskError::InvalidDataset`], as for
    /// [`run`](Self::run).
    pub async fn plan(
        &self,
        source_project: &ProjectId,
        target_project: &ProjectId,
        datasets: &[String],
        overwrite: OverwritePolicy,
    ) -> Result<RunPlan> {
        let datasets = validate(source_project, target_project, datasets)?;
        let orchestrator = DatasetOrchestrator::new(self.warehouse, self.options.clone());
        let mut plan = RunPlan::default();
        for dataset in &datasets {
            let dataset_plan = orchestrator.plan(dataset, target_project, overwrite).await;
            plan.specs.extend(dataset_plan.specs);
            plan.failures.merge(dataset_plan.failures);
            plan.tables_skipped += dataset_plan.tables_skipped;
        }
        Ok(plan)
    }

    async fn run_datasets(
        &self,
        datasets: &[DatasetRef],
        target_project: &ProjectId,
        overwrite: OverwritePolicy,
    ) -> Result<RunSummary> {
        info!(dataset_count = datasets.len(), "starting masking run");
        let orchestrator = DatasetOrchestrator::new(self.warehouse, self.options.clone());
        let mut failures = FailureReport::new();
        let mut summary = RunSummary::default();

        for dataset in datasets {
            let report = orchestrator.run(dataset, target_project, overwrite).await;
            summary.datasets += 1;
            summary.tables_masked += report.tables_masked;
            summary.tables_skipped += report.tables_skipped;
            summary.passthrough_columns += report.passthrough_columns;
            failures.merge(report.failures);
        }

        if failures.is_empty() {
            info!(
                datasets = summary.datasets,
                tables_masked = summary.tables_masked,
                tables_skipped = summary.tables_skipped,
                passthrough_columns = summary.passthrough_columns,
                "masking run complete"
            );
            Ok(summary)
        } else {
            error!(
                failed_count = failures.len(),
                tables_masked = summary.tables_masked,
                "masking run finished with errors"
            );
            Err(MaskError::RunFailed { failures })
        }
    }
}

/// Refuses masking in place and resolves dataset names inside `source_project`.
fn validate(
    source_project: &ProjectId,
    target_project: &ProjectId,
    datasets: &[String],
) -> Result<Vec<DatasetRef>> {
    if source_project == target_project {
        return Err(MaskError::Configuration {
            source_project: source_project.clone(),
            target_project: target_project.clone(),
        });
    }
    datasets
        .iter()
        .map(|name| {
            DatasetRef::new(source_project.clone(), name.as_str()).map_err(|source| {
                MaskError::InvalidDataset {
                    dataset: name.clone(),
                    source,
                }
            })
        })
        .collect()
}

/// Masks `datasets` of `source_project` into `target_project`.
///
/// Convenience entry point around [`MultiDatasetRunner`].
///
/// # Errors
///
/// See [`MultiDatasetRunner::run`].
pub async fn hash_datasets<W: Warehouse + ?Sized>(
    warehouse: &W,
    source_project: &ProjectId,
    target_project: &ProjectId,
    datasets: &[String],
    overwrite: OverwritePolicy,
    options: RunOptions,
) -> Result<RunSummary> {
    MultiDatasetRunner::new(warehouse, options)
        .run(source_project, target_project, datasets, overwrite)
        .await
}
