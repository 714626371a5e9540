//! Connection settings for the BigQuery REST API.

use std::fmt;

use bqmask_model::ProjectId;

/// Default endpoint of the BigQuery v2 REST API.
pub const DEFAULT_API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("bqmask/", env!("CARGO_PKG_VERSION"));

/// Settings for [`BigQueryClient`](crate::BigQueryClient).
#[derive(Clone)]
pub struct BigQueryConfig {
    /// Project that runs (and is billed for) the masking jobs.
    pub project: ProjectId,
    pub api_base: String,
    /// OAuth2 bearer token, e.g. from `gcloud auth print-access-token`.
    pub access_token: String,
    pub user_agent: String,
}

impl BigQueryConfig {
    pub fn new(project: ProjectId, access_token: impl Into<String>) -> Self {
        Self {
            project,
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: access_token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl fmt::Debug for BigQueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BigQueryConfig")
            .field("project", &self.project)
            .field("api_base", &self.api_base)
            .field("access_token", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
