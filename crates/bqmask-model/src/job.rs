use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::TableId;

/// Reference to a submitted masking job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    pub id: String,
    pub destination: TableId,
    pub location: Option<String>,
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {} -> {}", self.id, self.destination)
    }
}

/// State of a job. A cause exists exactly when the job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "cause")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(cause) => Some(cause),
            Self::Pending | Self::Succeeded => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: String,
    pub destination: TableId,
    pub status: JobStatus,
}

impl JobResult {
    pub fn new(handle: &JobHandle, status: JobStatus) -> Self {
        Self {
            job_id: handle.id.clone(),
            destination: handle.destination.clone(),
            status,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, JobStatus::Succeeded)
    }
}
