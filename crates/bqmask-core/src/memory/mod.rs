//! An in-process [`Warehouse`].
//!
//! Tables live in memory and masking jobs are evaluated locally, which makes
//! the whole run observable without a network: the masked rows can be read
//! back, failures can be injected per table, and every call is recorded.

mod eval;
mod value;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use bqmask_model::{
    ColumnSchema, DatasetRef, JobHandle, JobResult, JobStatus, OverwritePolicy, TableId,
    TableKind, TableMetadata, TableSchema,
};

pub use eval::{evaluate, fingerprint, output_type};
pub use value::Value;

use crate::error::WarehouseError;
use crate::warehouse::{QueryRequest, Warehouse};

pub type Row = Vec<Value>;

/// A stored table: its schema and rows in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryTable {
    pub schema: TableSchema,
    pub rows: Vec<Row>,
}

#[derive(Debug)]
enum Outcome {
    Write { table: MemoryTable, overwrite: OverwritePolicy },
    Fail(String),
}

#[derive(Debug)]
struct Job {
    handle: JobHandle,
    remaining_polls: usize,
    poll_errors: VecDeque<WarehouseError>,
    outcome: Option<Outcome>,
    status: JobStatus,
}

#[derive(Debug, Default)]
struct Faults {
    listing: BTreeMap<DatasetRef, WarehouseError>,
    schema: BTreeMap<TableId, WarehouseError>,
    submission: BTreeMap<TableId, WarehouseError>,
    job: BTreeMap<TableId, String>,
    polls: BTreeMap<TableId, Vec<WarehouseError>>,
}

#[derive(Debug, Default)]
struct State {
    tables: BTreeMap<TableId, MemoryTable>,
    jobs: BTreeMap<String, Job>,
    next_job: u64,
    faults: Faults,
    listed: Vec<DatasetRef>,
    submitted: Vec<TableId>,
}

/// Warehouse backed by in-memory tables.
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    state: Mutex<State>,
    pending_polls: usize,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs report `Pending` for this many polls before completing.
    #[must_use]
    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds (or replaces) a table. Rows shorter than the schema read as NULL.
    pub fn add_table(&self, schema: TableSchema, rows: Vec<Row>) {
        self.state()
            .tables
            .insert(schema.id.clone(), MemoryTable { schema, rows });
    }

    /// Listing `dataset` fails with `error`.
    pub fn fail_listing(&self, dataset: DatasetRef, error: WarehouseError) {
        self.state().faults.listing.insert(dataset, error);
    }

    /// Fetching the schema of `table` fails with `error`.
    pub fn fail_schema(&self, table: TableId, error: WarehouseError) {
        self.state().faults.schema.insert(table, error);
    }

    /// Submitting a job that reads `table` is rejected with `error`.
    pub fn reject_submission(&self, table: TableId, error: WarehouseError) {
        self.state().faults.submission.insert(table, error);
    }

    /// A job that reads `table` is accepted but ends failed with `cause`.
    pub fn fail_job(&self, table: TableId, cause: impl Into<String>) {
        self.state().faults.job.insert(table, cause.into());
    }

    /// Polls of a job that reads `table` return `errors` in order before the
    /// job reports its real state.
    pub fn fail_polls(&self, table: TableId, errors: Vec<WarehouseError>) {
        self.state().faults.polls.insert(table, errors);
    }

    pub fn table(&self, id: &TableId) -> Option<MemoryTable> {
        self.state().tables.get(id).cloned()
    }

    pub fn rows(&self, id: &TableId) -> Option<Vec<Row>> {
        self.table(id).map(|table| table.rows)
    }

    /// Datasets listed so far, in call order.
    pub fn listed_datasets(&self) -> Vec<DatasetRef> {
        self.state().listed.clone()
    }

    /// Destinations of accepted jobs, in submission order.
    pub fn submitted_destinations(&self) -> Vec<TableId> {
        self.state().submitted.clone()
    }
}

fn run_query(source: &MemoryTable, request: &QueryRequest) -> Result<MemoryTable, String> {
    let mut positions = Vec::with_capacity(request.select.len());
    let mut columns = Vec::with_capacity(request.select.len());
    for expression in &request.select {
        let position = source
            .schema
            .columns()
            .iter()
            .position(|column| column.name == expression.column)
            .ok_or_else(|| format!("Unrecognized name: {}", expression.column))?;
        let input_type = &source.schema.columns()[position].column_type;
        columns.push(ColumnSchema::new(
            expression.column.clone(),
            output_type(expression.transform, input_type),
        ));
        positions.push(position);
    }

    let mut rows = Vec::with_capacity(source.rows.len());
    for row in &source.rows {
        let masked = request
            .select
            .iter()
            .zip(&positions)
            .map(|(expression, &position)| {
                evaluate(expression.transform, row.get(position).unwrap_or(&Value::Null))
            })
            .collect::<Result<Row, String>>()?;
        rows.push(masked);
    }

    let schema = TableSchema::new(
        request.destination.clone(),
        TableKind::Table,
        source.schema.location.clone(),
        columns,
    )
    .map_err(|error| error.to_string())?;
    Ok(MemoryTable { schema, rows })
}

fn apply(state: &mut State, destination: &TableId, outcome: Outcome) -> JobStatus {
    let (table, overwrite) = match outcome {
        Outcome::Fail(cause) => return JobStatus::Failed(cause),
        Outcome::Write { table, overwrite } => (table, overwrite),
    };
    let exists = state.tables.contains_key(destination);
    match overwrite {
        OverwritePolicy::FailIfExists if exists => {
            JobStatus::Failed(format!("Already Exists: Table {destination}"))
        }
        OverwritePolicy::Append if exists => append_rows(state, destination, table),
        _ => {
            state.tables.insert(destination.clone(), table);
            JobStatus::Succeeded
        }
    }
}

fn append_rows(state: &mut State, destination: &TableId, table: MemoryTable) -> JobStatus {
    let Some(existing) = state.tables.get_mut(destination) else {
        return JobStatus::Failed(format!("Not found: Table {destination}"));
    };
    if existing.schema.columns() != table.schema.columns() {
        return JobStatus::Failed(format!(
            "Provided Schema does not match Table {destination}"
        ));
    }
    existing.rows.extend(table.rows);
    JobStatus::Succeeded
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn list_tables(&self, dataset: &DatasetRef) -> Result<Vec<TableMetadata>, WarehouseError> {
        let mut state = self.state();
        state.listed.push(dataset.clone());
        if let Some(error) = state.faults.listing.get(dataset) {
            return Err(error.clone());
        }
        Ok(state
            .tables
            .values()
            .filter(|table| table.schema.id.dataset_ref() == *dataset)
            .map(|table| TableMetadata {
                id: table.schema.id.clone(),
                kind: table.schema.kind.clone(),
            })
            .collect())
    }

    async fn get_schema(&self, table: &TableId) -> Result<TableSchema, WarehouseError> {
        let state = self.state();
        if let Some(error) = state.faults.schema.get(table) {
            return Err(error.clone());
        }
        state
            .tables
            .get(table)
            .map(|stored| stored.schema.clone())
            .ok_or_else(|| WarehouseError::NotFound(format!("Table {table}")))
    }

    async fn submit_query(&self, request: QueryRequest) -> Result<JobHandle, WarehouseError> {
        let mut state = self.state();
        if let Some(error) = state.faults.submission.get(&request.source) {
            return Err(error.clone());
        }
        let source = state
            .tables
            .get(&request.source)
            .ok_or_else(|| WarehouseError::NotFound(format!("Table {}", request.source)))?;
        let outcome = match state.faults.job.get(&request.source) {
            Some(cause) => Outcome::Fail(cause.clone()),
            None => match run_query(source, &request) {
                Ok(table) => Outcome::Write {
                    table,
                    overwrite: request.overwrite,
                },
                Err(cause) => Outcome::Fail(cause),
            },
        };

        let poll_errors = state
            .faults
            .polls
            .get(&request.source)
            .cloned()
            .unwrap_or_default()
            .into();

        state.next_job += 1;
        let handle = JobHandle {
            id: format!("memory_job_{}", state.next_job),
            destination: request.destination.clone(),
            location: request.location.clone(),
        };
        state.submitted.push(request.destination);
        state.jobs.insert(
            handle.id.clone(),
            Job {
                handle: handle.clone(),
                remaining_polls: self.pending_polls,
                poll_errors,
                outcome: Some(outcome),
                status: JobStatus::Pending,
            },
        );
        Ok(handle)
    }

    async fn poll_job(&self, handle: &JobHandle) -> Result<JobResult, WarehouseError> {
        let mut state = self.state();
        let job = state
            .jobs
            .get_mut(&handle.id)
            .ok_or_else(|| WarehouseError::NotFound(format!("Job {}", handle.id)))?;
        if let Some(error) = job.poll_errors.pop_front() {
            return Err(error);
        }
        if job.remaining_polls > 0 {
            job.remaining_polls -= 1;
            return Ok(JobResult::new(&job.handle, JobStatus::Pending));
        }
        let Some(outcome) = job.outcome.take() else {
            return Ok(JobResult::new(&job.handle, job.status.clone()));
        };
        let job_handle = job.handle.clone();
        let status = apply(&mut state, &job_handle.destination, outcome);
        if let Some(job) = state.jobs.get_mut(&handle.id) {
            job.status = status.clone();
        }
        Ok(JobResult::new(&job_handle, status))
    }
}
