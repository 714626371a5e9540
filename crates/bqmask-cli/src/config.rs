//! Run settings from the command line and an optional TOML file.
//!
//! Command-line values take precedence over the file; built-in defaults apply
//! to whatever neither sets.
//!
//! ```toml
//! source-project = "prod"
//! target-project = "prod-masked"
//! datasets = ["sales", "hr"]
//! write-disposition = "truncate"
//! table-concurrency = 8
//! poll-interval-ms = 2000
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bqmask_bigquery::DEFAULT_API_BASE;
use bqmask_core::RunOptions;
use bqmask_model::{ModelError, OverwritePolicy, ProjectId};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting `{0}` (pass --{0} or set it in the config file)")]
    Missing(&'static str),

    #[error("invalid `{key}`: {source}")]
    Invalid {
        key: &'static str,
        #[source]
        source: ModelError,
    },

    #[error("`{key}` must be greater than zero")]
    Zero { key: &'static str },
}

/// Raw settings as written in the config file or given as flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawSettings {
    pub source_project: Option<String>,
    pub target_project: Option<String>,
    #[serde(default)]
    pub datasets: Vec<String>,
    pub write_disposition: Option<String>,
    pub table_concurrency: Option<usize>,
    pub poll_interval_ms: Option<u64>,
    pub api_base: Option<String>,
    pub access_token: Option<String>,
}

impl RawSettings {
    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(settings)
    }

    /// Fills every unset value from `lower`. A non-empty dataset list replaces
    /// the one in `lower` rather than extending it.
    #[must_use]
    pub fn or(self, lower: Self) -> Self {
        Self {
            source_project: self.source_project.or(lower.source_project),
            target_project: self.target_project.or(lower.target_project),
            datasets: if self.datasets.is_empty() {
                lower.datasets
            } else {
                self.datasets
            },
            write_disposition: self.write_disposition.or(lower.write_disposition),
            table_concurrency: self.table_concurrency.or(lower.table_concurrency),
            poll_interval_ms: self.poll_interval_ms.or(lower.poll_interval_ms),
            api_base: self.api_base.or(lower.api_base),
            access_token: self.access_token.or(lower.access_token),
        }
    }

    /// Validates the settings and applies defaults.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let source_project = project("source-project", self.source_project)?;
        let target_project = project("target-project", self.target_project)?;
        let overwrite = match self.write_disposition {
            Some(value) => value
                .parse::<OverwritePolicy>()
                .map_err(|source| ConfigError::Invalid {
                    key: "write-disposition",
                    source,
                })?,
            None => OverwritePolicy::default(),
        };

        let mut options = RunOptions::default();
        if let Some(concurrency) = self.table_concurrency {
            if concurrency == 0 {
                return Err(ConfigError::Zero {
                    key: "table-concurrency",
                });
            }
            options = options.with_table_concurrency(concurrency);
        }
        if let Some(millis) = self.poll_interval_ms {
            if millis == 0 {
                return Err(ConfigError::Zero {
                    key: "poll-interval-ms",
                });
            }
            options = options.with_poll_interval(Duration::from_millis(millis));
        }

        let access_token = self
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::Missing("access-token"))?;

        Ok(Settings {
            source_project,
            target_project,
            datasets: self.datasets,
            overwrite,
            options,
            api_base: self
                .api_base
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            access_token,
        })
    }
}

fn project(key: &'static str, value: Option<String>) -> Result<ProjectId, ConfigError> {
    let value = value.ok_or(ConfigError::Missing(key))?;
    ProjectId::new(value).map_err(|source| ConfigError::Invalid { key, source })
}

/// Validated settings of one invocation.
#[derive(Clone)]
pub struct Settings {
    pub source_project: ProjectId,
    pub target_project: ProjectId,
    pub datasets: Vec<String>,
    pub overwrite: OverwritePolicy,
    pub options: RunOptions,
    pub api_base: String,
    pub access_token: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("source_project", &self.source_project)
            .field("target_project", &self.target_project)
            .field("datasets", &self.datasets)
            .field("overwrite", &self.overwrite)
            .field("options", &self.options)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}
