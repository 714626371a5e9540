//! BigQuery REST API warehouse for bqmask.
//!
//! [`BigQueryClient`] implements [`bqmask_core::Warehouse`] on top of the v2
//! REST API: `tables.list`, `tables.get`, `jobs.insert` and `jobs.get`.
//! Authentication is left to the caller, who supplies a bearer token.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::BigQueryClient;
pub use config::{BigQueryConfig, DEFAULT_API_BASE, DEFAULT_USER_AGENT};
pub use error::{ClientError, Result};
