use anyhow::{Context, Result};
use bqmask_bigquery::{BigQueryClient, BigQueryConfig};
use bqmask_cli::config::{RawSettings, Settings};
use bqmask_core::{MultiDatasetRunner, RunPlan, RunSummary};
use tracing::{info, warn};

use crate::cli::MaskArgs;

/// Merges flags over the config file and validates the result.
pub fn load_settings(args: &MaskArgs) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => RawSettings::load(path)?,
        None => RawSettings::default(),
    };
    let settings = args.overrides().or(file).resolve()?;
    if settings.datasets.is_empty() {
        warn!("no datasets given, nothing to mask");
    }
    Ok(settings)
}

fn client(settings: &Settings) -> Result<BigQueryClient> {
    let config = BigQueryConfig::new(
        settings.source_project.clone(),
        settings.access_token.clone(),
    )
    .with_api_base(settings.api_base.clone());
    BigQueryClient::new(config).context("create BigQuery client")
}

pub async fn run_mask(args: &MaskArgs) -> Result<(Settings, RunSummary)> {
    let settings = load_settings(args)?;
    let client = client(&settings)?;
    info!(
        source_project = %settings.source_project,
        target_project = %settings.target_project,
        datasets = ?settings.datasets,
        "masking datasets"
    );
    let summary = MultiDatasetRunner::new(&client, settings.options.clone())
        .run(
            &settings.source_project,
            &settings.target_project,
            &settings.datasets,
            settings.overwrite,
        )
        .await?;
    Ok((settings, summary))
}

pub async fn run_plan(args: &MaskArgs) -> Result<RunPlan> {
    let settings = load_settings(args)?;
    let client = client(&settings)?;
    let plan = MultiDatasetRunner::new(&client, settings.options.clone())
        .plan(
            &settings.source_project,
            &settings.target_project,
            &settings.datasets,
            settings.overwrite,
        )
        .await?;
    Ok(plan)
}
