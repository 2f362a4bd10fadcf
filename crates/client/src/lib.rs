//! Sources of workflow executions and their histories.
//!
//! A [`WorkflowProvider`] lists executions, fetches full histories as
//! [`RawEvent`] slices, and carries out the mutating commands an operator can
//! issue. Callers bound every call with their own deadline.

pub mod error;
pub mod file;
pub mod history_json;
pub mod http;
pub mod mock;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempo_history::RawEvent;

pub use error::{ClientError, Result};
pub use file::FileProvider;
pub use http::HttpProvider;
pub use mock::MockProvider;
pub use retry::RetryConfig;

/// One execution: a workflow id and, optionally, a specific run.
/// Without a run id the provider resolves the latest run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionRef {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl ExecutionRef {
    pub fn new(workflow_id: impl Into<String>, run_id: Option<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            run_id: run_id.filter(|r| !r.is_empty()),
        }
    }

    pub fn latest(workflow_id: impl Into<String>) -> Self {
        Self::new(workflow_id, None)
    }

    pub fn run_id_or_empty(&self) -> &str {
        self.run_id.as_deref().unwrap_or("")
    }
}

impl std::fmt::Display for ExecutionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.run_id {
            Some(run) => write!(f, "{}/{}", self.workflow_id, run),
            None => f.write_str(&self.workflow_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub workflow_id: String,
    pub run_id: String,
    pub workflow_type: String,
    /// Normalized execution status, e.g. `Running`, `Completed`, `TimedOut`.
    pub status: String,
    #[serde(default)]
    pub task_queue: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub history_length: Option<u64>,
}

impl WorkflowSummary {
    pub fn execution(&self) -> ExecutionRef {
        ExecutionRef::new(self.workflow_id.clone(), Some(self.run_id.clone()))
    }

    pub fn is_running(&self) -> bool {
        self.status == "Running"
    }

    pub fn duration(&self, now: DateTime<Utc>) -> chrono::Duration {
        (self.end_time.unwrap_or(now) - self.start_time).max(chrono::Duration::zero())
    }
}

/// Backend a console session talks to.
#[async_trait]
pub trait WorkflowProvider: Send + Sync {
    /// Short label for the status bar.
    fn name(&self) -> String;

    /// Executions in `namespace`, newest first. `query` is a visibility
    /// filter; empty means all.
    async fn list_workflows(&self, namespace: &str, query: &str) -> Result<Vec<WorkflowSummary>>;

    async fn describe_workflow(&self, namespace: &str, execution: &ExecutionRef) -> Result<WorkflowSummary>;

    /// The complete, ordered history of one execution.
    async fn fetch_history(&self, namespace: &str, execution: &ExecutionRef) -> Result<Vec<RawEvent>>;

    async fn signal(
        &self,
        namespace: &str,
        execution: &ExecutionRef,
        signal_name: &str,
        input: Option<serde_json::Value>,
    ) -> Result<()>;

    async fn cancel(&self, namespace: &str, execution: &ExecutionRef, reason: &str) -> Result<()>;

    async fn terminate(&self, namespace: &str, execution: &ExecutionRef, reason: &str) -> Result<()>;

    /// Removes the execution and its history. Running executions are
    /// terminated first by the server.
    async fn delete(&self, namespace: &str, execution: &ExecutionRef) -> Result<()>;

    /// Resets to just after the workflow task completed by `event_id`.
    /// Returns the new run id.
    async fn reset(
        &self,
        namespace: &str,
        execution: &ExecutionRef,
        event_id: i64,
        reason: &str,
    ) -> Result<String>;

    /// Runs a query and returns its result rendered as text.
    async fn query(
        &self,
        namespace: &str,
        execution: &ExecutionRef,
        query_type: &str,
        args: Option<serde_json::Value>,
    ) -> Result<String>;
}
