use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tempo_history::RawEvent;
use tempo_history::classify::{GroupKind, classify};
use tracing::warn;

use crate::error::{ClientError, Result};
use crate::history_json::decode_history;
use crate::{ExecutionRef, WorkflowProvider, WorkflowSummary};

/// Read-only provider over exported history JSON files.
///
/// `root` is either one export or a directory of `*.json` exports. Each file
/// is one execution whose workflow id is the file stem.
pub struct FileProvider {
    root: PathBuf,
}

const RUN_ID: &str = "exported";

impl FileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn files(&self) -> Result<Vec<PathBuf>> {
        let meta = tokio::fs::metadata(&self.root).await?;
        if meta.is_file() {
            return Ok(vec![self.root.clone()]);
        }
        let mut files = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    async fn file_for(&self, workflow_id: &str) -> Result<PathBuf> {
        self.files()
            .await?
            .into_iter()
            .find(|path| workflow_id_of(path) == workflow_id)
            .ok_or_else(|| ClientError::NotFound(workflow_id.to_string()))
    }
}

fn workflow_id_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn read_events(path: &Path) -> Result<Vec<RawEvent>> {
    let text = tokio::fs::read_to_string(path).await?;
    let doc: Value = serde_json::from_str(&text)?;
    decode_history(&doc)
}

/// Derives list metadata from the history itself.
pub fn summarize(workflow_id: &str, run_id: &str, events: &[RawEvent]) -> Option<WorkflowSummary> {
    let first = events.first()?;
    let workflow_type = serde_json::from_str::<Value>(&first.details)
        .ok()
        .and_then(|d| d.get("workflowType")?.get("name")?.as_str().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string());
    let task_queue = serde_json::from_str::<Value>(&first.details)
        .ok()
        .and_then(|d| d.get("taskQueue")?.get("name")?.as_str().map(str::to_string))
        .unwrap_or_default();
    let closing = events.iter().rev().find(|e| {
        let class = classify(&e.event_type);
        class.kind == GroupKind::Workflow
            && class.is_group_end()
            && class.status != tempo_history::classify::STATUS_UNKNOWN
    });

    Some(WorkflowSummary {
        workflow_id: workflow_id.to_string(),
        run_id: run_id.to_string(),
        workflow_type,
        status: closing
            .map(|e| classify(&e.event_type).status.to_string())
            .unwrap_or_else(|| "Running".to_string()),
        task_queue,
        start_time: first.timestamp,
        end_time: closing.map(|e| e.timestamp),
        parent_id: None,
        history_length: Some(events.len() as u64),
    })
}

#[async_trait]
impl WorkflowProvider for FileProvider {
    fn name(&self) -> String {
        format!("file:{}", self.root.display())
    }

    async fn list_workflows(&self, _namespace: &str, query: &str) -> Result<Vec<WorkflowSummary>> {
        let needle = query.trim().to_lowercase();
        let mut out = Vec::new();
        for path in self.files().await? {
            let workflow_id = workflow_id_of(&path);
            let events = match read_events(&path).await {
                Ok(events) => events,
                Err(e) => {
                    warn!(path = %path.display(), "skipping unreadable history export: {e}");
                    continue;
                }
            };
            let Some(summary) = summarize(&workflow_id, RUN_ID, &events) else {
                continue;
            };
            if needle.is_empty()
                || summary.workflow_id.to_lowercase().contains(&needle)
                || summary.workflow_type.to_lowercase().contains(&needle)
            {
                out.push(summary);
            }
        }
        out.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(out)
    }

    async fn describe_workflow(&self, _namespace: &str, execution: &ExecutionRef) -> Result<WorkflowSummary> {
        let path = self.file_for(&execution.workflow_id).await?;
        let events = read_events(&path).await?;
        summarize(&execution.workflow_id, RUN_ID, &events)
            .ok_or_else(|| ClientError::Decode(format!("{} has an empty history", path.display())))
    }

    async fn fetch_history(&self, _namespace: &str, execution: &ExecutionRef) -> Result<Vec<RawEvent>> {
        let path = self.file_for(&execution.workflow_id).await?;
        read_events(&path).await
    }

    async fn signal(&self, _: &str, _: &ExecutionRef, _: &str, _: Option<Value>) -> Result<()> {
        Err(ClientError::Unsupported("signal"))
    }

    async fn cancel(&self, _: &str, _: &ExecutionRef, _: &str) -> Result<()> {
        Err(ClientError::Unsupported("cancel"))
    }

    async fn terminate(&self, _: &str, _: &ExecutionRef, _: &str) -> Result<()> {
        Err(ClientError::Unsupported("terminate"))
    }

    async fn delete(&self, _: &str, _: &ExecutionRef) -> Result<()> {
        Err(ClientError::Unsupported("delete"))
    }

    async fn reset(&self, _: &str, _: &ExecutionRef, _: i64, _: &str) -> Result<String> {
        Err(ClientError::Unsupported("reset"))
    }

    async fn query(&self, _: &str, _: &ExecutionRef, _: &str, _: Option<Value>) -> Result<String> {
        Err(ClientError::Unsupported("query"))
    }
}
