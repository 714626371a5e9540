//! Masking of warehouse datasets.
//!
//! Every table of every requested dataset is rewritten column by column with a
//! deterministic, type-specific masking transform and materialized into the
//! same-named table of a separate target project.
//!
//! # Components
//!
//! - [`masker::mask`] chooses the transform for a column from its type.
//! - [`TableMaskJobBuilder`] turns a table schema into a [`MaskingSpec`].
//! - [`TableMaskExecutor`] submits a spec as a warehouse job and waits for it.
//! - [`DatasetOrchestrator`] fans out over the tables of one dataset and
//!   collects per-table failures.
//! - [`MultiDatasetRunner`] runs several datasets and fails once, at the end,
//!   if any table failed.
//!
//! The warehouse itself is reached through the [`Warehouse`] trait; the
//! [`memory`] module provides an in-process implementation.
//!
//! # Example
//!
//! ```no_run
//! use bqmask_core::{MultiDatasetRunner, RunOptions, memory::MemoryWarehouse};
//! use bqmask_model::{OverwritePolicy, ProjectId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let warehouse = MemoryWarehouse::new();
//! let source = ProjectId::new("prod")?;
//! let target = ProjectId::new("prod-masked")?;
//! MultiDatasetRunner::new(&warehouse, RunOptions::default())
//!     .run(&source, &target, &["sales".to_string()], OverwritePolicy::Truncate)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`MaskingSpec`]: bqmask_model::MaskingSpec

pub mod builder;
pub mod error;
pub mod executor;
pub mod masker;
pub mod memory;
pub mod options;
pub mod orchestrator;
pub mod runner;
pub mod sql;
pub mod warehouse;

pub use builder::{TableMaskJobBuilder, build_spec};
pub use error::{MaskError, Result, TableError, WarehouseError};
pub use executor::TableMaskExecutor;
pub use options::RunOptions;
pub use orchestrator::{DatasetOrchestrator, DatasetPlan, DatasetReport};
pub use runner::{MultiDatasetRunner, RunPlan, RunSummary, hash_datasets};
pub use warehouse::{QueryRequest, Warehouse};
