//! BigQuery REST client implementing [`Warehouse`].

use async_trait::async_trait;
use bqmask_core::sql::render_query;
use bqmask_core::{QueryRequest, Warehouse, WarehouseError};
use bqmask_model::{
    DatasetRef, JobHandle, JobResult, JobStatus, ProjectId, TableId, TableMetadata, TableSchema,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::BigQueryConfig;
use crate::error::{ClientError, Result};
use crate::types::{
    ErrorResponse, Job, JobConfiguration, JobReference, JobState, QueryConfiguration, Table,
    TableList, TableReference,
};

/// Client for the BigQuery v2 REST API.
///
/// Jobs are created in the configured project, which is expected to be the
/// project the data is read from.
#[derive(Debug, Clone)]
pub struct BigQueryClient {
    client: reqwest::Client,
    base: Url,
    project: ProjectId,
}

impl BigQueryClient {
    /// Creates a client with the bearer token and user agent as default headers.
    pub fn new(config: BigQueryConfig) -> Result<Self> {
        let base = Url::parse(&config.api_base).map_err(|e| ClientError::InvalidApiBase {
            url: config.api_base.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidApiBase {
                url: config.api_base,
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        let mut authorization = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .map_err(|_| ClientError::InvalidToken)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|_| ClientError::InvalidUserAgent)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            project: config.project,
        })
    }

    /// The project jobs are created in.
    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Appends percent-encoded path segments to the API base.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, WarehouseError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| WarehouseError::Transport(format!("invalid API base URL {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> std::result::Result<T, WarehouseError> {
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;
        handle_response(response).await
    }
}

fn transport(error: reqwest::Error) -> WarehouseError {
    WarehouseError::Transport(error.to_string())
}

/// Checks the HTTP status and parses the JSON body.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, WarehouseError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }
    response
        .json()
        .await
        .map_err(|e| WarehouseError::Decode(e.to_string()))
}

/// Maps a non-success status to a [`WarehouseError`], keeping the API message.
fn status_error(status: StatusCode, body: &str) -> WarehouseError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|response| response.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let message = if message.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {message}")
    };
    match status {
        StatusCode::NOT_FOUND => WarehouseError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::CONFLICT => {
            WarehouseError::Rejected(message)
        }
        _ => WarehouseError::Transport(message),
    }
}

/// Builds the `jobs.insert` body for a masking query.
fn job_request(project: &ProjectId, request: &QueryRequest) -> Job {
    Job {
        job_reference: JobReference {
            project_id: project.to_string(),
            job_id: None,
            location: request.location.clone(),
        },
        configuration: Some(JobConfiguration {
            query: QueryConfiguration {
                query: render_query(&request.select, &request.source),
                destination_table: TableReference::from(&request.destination),
                write_disposition: request.overwrite.write_disposition().to_string(),
                create_disposition: "CREATE_IF_NEEDED".to_string(),
                use_legacy_sql: false,
            },
        }),
        status: None,
    }
}

fn job_status(state: Option<&JobState>) -> JobStatus {
    match state {
        Some(state) if state.state == "DONE" => match &state.error_result {
            Some(error) => JobStatus::Failed(error.describe()),
            None => JobStatus::Succeeded,
        },
        _ => JobStatus::Pending,
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn list_tables(
        &self,
        dataset: &DatasetRef,
    ) -> std::result::Result<Vec<TableMetadata>, WarehouseError> {
        let url = self.endpoint(&[
            "projects",
            dataset.project.as_str(),
            "datasets",
            &dataset.dataset,
            "tables",
        ])?;

        let mut tables = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = Vec::new();
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: TableList = self.get(url.clone(), &query).await?;
            for entry in &page.tables {
                tables.push(entry.to_metadata()?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(dataset = %dataset, table_count = tables.len(), "listed tables");
        Ok(tables)
    }

    async fn get_schema(&self, table: &TableId) -> std::result::Result<TableSchema, WarehouseError> {
        let url = self.endpoint(&[
            "projects",
            table.project.as_str(),
            "datasets",
            &table.dataset,
            "tables",
            &table.table,
        ])?;
        let resource: Table = self.get(url, &[]).await?;
        resource.to_schema()
    }

    async fn submit_query(
        &self,
        request: QueryRequest,
    ) -> std::result::Result<JobHandle, WarehouseError> {
        let body = job_request(&self.project, &request);
        let url = self.endpoint(&["projects", self.project.as_str(), "jobs"])?;
        debug!(
            url = %url,
            destination = %request.destination,
            write_disposition = request.overwrite.write_disposition(),
            "POST"
        );

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let job: Job = handle_response(response).await?;
        let id = job
            .job_reference
            .job_id
            .ok_or_else(|| WarehouseError::Decode("job response has no job id".to_string()))?;

        Ok(JobHandle {
            id,
            destination: request.destination,
            location: job.job_reference.location.or(request.location),
        })
    }

    async fn poll_job(&self, handle: &JobHandle) -> std::result::Result<JobResult, WarehouseError> {
        let url = self.endpoint(&["projects", self.project.as_str(), "jobs", &handle.id])?;
        let query: Vec<(&str, &str)> = handle
            .location
            .as_deref()
            .map(|location| ("location", location))
            .into_iter()
            .collect();
        let job: Job = self.get(url, &query).await?;
        Ok(JobResult::new(handle, job_status(job.status.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use bqmask_model::{
        FingerprintOutput, OverwritePolicy, SelectExpression, TransformExpression,
    };
    use serde_json::json;

    use super::*;

    fn client(api_base: &str) -> BigQueryClient {
        let config = BigQueryConfig::new(ProjectId::new("prod").unwrap(), "token")
            .with_api_base(api_base);
        BigQueryClient::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("https://bigquery.googleapis.com/bigquery/v2/");
        let url = client
            .endpoint(&["projects", "example.com:analytics", "jobs", "job 1"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://bigquery.googleapis.com/bigquery/v2/projects/example.com:analytics/jobs/job%201"
        );
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let project = ProjectId::new("prod").unwrap();
        let bad_base = BigQueryConfig::new(project.clone(), "token").with_api_base("not a url");
        assert!(matches!(
            BigQueryClient::new(bad_base),
            Err(ClientError::InvalidApiBase { .. })
        ));
        let bad_token = BigQueryConfig::new(project, "line\nbreak");
        assert!(matches!(
            BigQueryClient::new(bad_token),
            Err(ClientError::InvalidToken)
        ));
    }

    #[test]
    fn test_status_codes_map_to_error_kinds() {
        let body = r#"{"error": {"code": 404, "message": "Not found: Dataset prod:missing", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            status_error(StatusCode::NOT_FOUND, body),
            WarehouseError::NotFound("404 Not Found: Not found: Dataset prod:missing".to_string())
        );
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "{}"),
            WarehouseError::Rejected(_)
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, ""),
            WarehouseError::Rejected(_)
        ));
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, ""),
            WarehouseError::Transport("502 Bad Gateway".to_string())
        );
    }

    #[test]
    fn test_job_request_body() {
        let request = QueryRequest {
            select: vec![
                SelectExpression::new("id", TransformExpression::Fingerprint(FingerprintOutput::Int64)),
                SelectExpression::new("note", TransformExpression::Identity),
            ],
            source: TableId::parse("prod.sales.orders").unwrap(),
            destination: TableId::parse("masked.sales.orders").unwrap(),
            overwrite: OverwritePolicy::FailIfExists,
            location: Some("EU".to_string()),
        };
        let body = serde_json::to_value(job_request(&ProjectId::new("prod").unwrap(), &request))
            .unwrap();
        assert_eq!(
            body,
            json!({
                "jobReference": {"projectId": "prod", "location": "EU"},
                "configuration": {
                    "query": {
                        "query": "SELECT FARM_FINGERPRINT(CAST(`id` AS STRING)) AS `id`, `note` FROM `prod.sales.orders`",
                        "destinationTable": {"projectId": "masked", "datasetId": "sales", "tableId": "orders"},
                        "writeDisposition": "WRITE_EMPTY",
                        "createDisposition": "CREATE_IF_NEEDED",
                        "useLegacySql": false
                    }
                }
            })
        );
    }

    #[test]
    fn test_job_states() {
        let decode = |value: serde_json::Value| -> JobState { serde_json::from_value(value).unwrap() };
        assert_eq!(job_status(None), JobStatus::Pending);
        assert_eq!(
            job_status(Some(&decode(json!({"state": "RUNNING"})))),
            JobStatus::Pending
        );
        assert_eq!(
            job_status(Some(&decode(json!({"state": "DONE"})))),
            JobStatus::Succeeded
        );
        assert_eq!(
            job_status(Some(&decode(json!({
                "state": "DONE",
                "errorResult": {"message": "Already Exists: Table masked:sales.orders"}
            })))),
            JobStatus::Failed("Already Exists: Table masked:sales.orders".to_string())
        );
    }
}
