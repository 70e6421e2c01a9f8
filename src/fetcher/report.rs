//! Per-task outcomes collected by the fetcher

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single download failed
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TaskError {
    #[error("unable to create {}: {reason}", path.display())]
    CreateFile { path: PathBuf, reason: String },

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("bad status: {0}")]
    BadStatus(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("unable to write data to file: {0}")]
    Write(String),

    #[error("cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded { bytes: u64 },
    Failed { error: TaskError },
}

/// Result of one finished task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutcome {
    pub name: String,
    pub url: String,
    pub destination: PathBuf,
    #[serde(flatten)]
    pub status: TaskStatus,
    pub elapsed_ms: u64,
}

impl TaskOutcome {
    pub fn new(
        name: String,
        url: String,
        destination: PathBuf,
        result: Result<u64, TaskError>,
        elapsed: Duration,
    ) -> Self {
        let status = match result {
            Ok(bytes) => TaskStatus::Succeeded { bytes },
            Err(error) => TaskStatus::Failed { error },
        };
        Self {
            name,
            url,
            destination,
            status,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }

    pub fn bytes(&self) -> Option<u64> {
        match self.status {
            TaskStatus::Succeeded { bytes } => Some(bytes),
            TaskStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&TaskError> {
        match &self.status {
            TaskStatus::Succeeded { .. } => None,
            TaskStatus::Failed { error } => Some(error),
        }
    }
}

/// Outcomes of every task that finished during one batch, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    outcomes: Vec<TaskOutcome>,
}

impl FetchReport {
    pub fn new(mut outcomes: Vec<TaskOutcome>) -> Self {
        outcomes.sort_by(|a, b| a.name.cmp(&b.name));
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    pub fn get(&self, name: &str) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// True when every task in the batch downloaded successfully
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TaskOutcome::is_success)
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes.iter().filter_map(TaskOutcome::bytes).sum()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
