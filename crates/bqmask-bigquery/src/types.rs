//! BigQuery REST API types.
//!
//! Only the fields the masking run reads or writes are modelled; everything
//! else in the API payloads is ignored.

use bqmask_core::WarehouseError;
use bqmask_model::{
    ColumnSchema, ColumnType, DatasetRef, ProjectId, TableId, TableKind, TableMetadata,
    TableSchema,
};
use serde::{Deserialize, Serialize};

/// Fully-qualified reference to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReference {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableReference {
    pub fn to_table_id(&self) -> Result<TableId, WarehouseError> {
        let decode = |error: bqmask_model::ModelError| WarehouseError::Decode(error.to_string());
        let project = ProjectId::new(self.project_id.as_str()).map_err(decode)?;
        let dataset = DatasetRef::new(project, self.dataset_id.as_str()).map_err(decode)?;
        TableId::new(&dataset, self.table_id.as_str()).map_err(decode)
    }
}

impl From<&TableId> for TableReference {
    fn from(id: &TableId) -> Self {
        Self {
            project_id: id.project.to_string(),
            dataset_id: id.dataset.clone(),
            table_id: id.table.clone(),
        }
    }
}

/// One page of `tables.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableList {
    #[serde(default)]
    pub tables: Vec<TableListEntry>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableListEntry {
    pub table_reference: TableReference,
    /// `TABLE`, `VIEW`, `MATERIALIZED_VIEW`, `EXTERNAL`, `SNAPSHOT`, ...
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl TableListEntry {
    pub fn to_metadata(&self) -> Result<TableMetadata, WarehouseError> {
        Ok(TableMetadata {
            id: self.table_reference.to_table_id()?,
            kind: table_kind(self.kind.as_deref()),
        })
    }
}

/// Response of `tables.get`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub table_reference: TableReference,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub schema: Option<TableFieldList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableFieldList {
    #[serde(default)]
    pub fields: Vec<TableField>,
}

/// A top-level schema field. Nested `RECORD` fields are not descended into.
#[derive(Debug, Clone, Deserialize)]
pub struct TableField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl Table {
    pub fn to_schema(&self) -> Result<TableSchema, WarehouseError> {
        let columns = self
            .schema
            .as_ref()
            .map(|schema| {
                schema
                    .fields
                    .iter()
                    .map(|field| {
                        ColumnSchema::new(
                            field.name.clone(),
                            ColumnType::from_type_name(&field.field_type),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        TableSchema::new(
            self.table_reference.to_table_id()?,
            table_kind(self.kind.as_deref()),
            self.location.clone(),
            columns,
        )
        .map_err(|error| WarehouseError::Decode(error.to_string()))
    }
}

fn table_kind(kind: Option<&str>) -> TableKind {
    kind.map_or(TableKind::Table, TableKind::from_type_name)
}

/// Body of `jobs.insert` and the job resource returned by `jobs.get`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_reference: JobReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<JobConfiguration>,
    #[serde(default, skip_serializing)]
    pub status: Option<JobState>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobReference {
    pub project_id: String,
    /// Assigned by the service when omitted on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfiguration {
    pub query: QueryConfiguration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfiguration {
    pub query: String,
    pub destination_table: TableReference,
    pub write_disposition: String,
    pub create_disposition: String,
    pub use_legacy_sql: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    /// `PENDING`, `RUNNING` or `DONE`.
    pub state: String,
    pub error_result: Option<ErrorProto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorProto {
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl ErrorProto {
    pub fn describe(&self) -> String {
        match (&self.reason, &self.message) {
            (Some(reason), Some(message)) => format!("{reason}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(reason), None) => reason.clone(),
            (None, None) => "job failed without an error message".to_string(),
        }
    }
}

/// Error envelope of non-success responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: Option<u16>,
    pub message: String,
}
