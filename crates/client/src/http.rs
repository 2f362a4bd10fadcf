use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tempo_history::RawEvent;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::history_json::{self, decode_execution_info, decode_history};
use crate::retry::{RetryConfig, retry_get};
use crate::{ExecutionRef, WorkflowProvider, WorkflowSummary};

const IDENTITY: &str = "tempo";
/// Guards against a server that keeps handing out page tokens.
const MAX_HISTORY_PAGES: usize = 10_000;

/// Provider backed by the Temporal HTTP API (`/api/v1/...`).
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry: RetryConfig,
}

impl HttpProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        let base_url = if base_url.contains("://") {
            base_url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", base_url.trim_end_matches('/'))
        };
        Self {
            client,
            base_url,
            api_key: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key).filter(|k| !k.is_empty());
    }

    pub fn set_retry(&mut self, retry: RetryConfig) {
        self.retry = retry;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, namespace: &str, path: &str) -> String {
        format!(
            "{}/api/v1/namespaces/{}{}",
            self.base_url,
            urlencoding::encode(namespace),
            path
        )
    }

    fn workflow_url(&self, namespace: &str, workflow_id: &str, suffix: &str) -> String {
        self.url(
            namespace,
            &format!("/workflows/{}{}", urlencoding::encode(workflow_id), suffix),
        )
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = retry_get(
            || {
                let req = self.client.get(url).query(query);
                match &self.api_key {
                    Some(key) => req.bearer_auth(key),
                    None => req,
                }
            },
            &self.retry,
        )
        .await?;
        parse_response(resp).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let mut req = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        parse_response(req.send().await?).await
    }

    async fn delete_request(&self, url: &str, query: &[(&'static str, String)]) -> Result<Value> {
        let mut req = self.client.delete(url).query(query);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        parse_response(req.send().await?).await
    }
}

fn execution_body(execution: &ExecutionRef) -> Value {
    json!({
        "workflowId": execution.workflow_id,
        "runId": execution.run_id_or_empty(),
    })
}

async fn parse_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    if status.is_success() {
        let text = resp.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_str(&text)?);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(message));
    }
    Err(ClientError::Http {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl WorkflowProvider for HttpProvider {
    fn name(&self) -> String {
        self.base_url.clone()
    }

    async fn list_workflows(&self, namespace: &str, query: &str) -> Result<Vec<WorkflowSummary>> {
        let mut params = vec![("pageSize", "100".to_string())];
        if !query.trim().is_empty() {
            params.push(("query", query.trim().to_string()));
        }
        let body = self.get_json(&self.url(namespace, "/workflows"), &params).await?;
        body.get("executions")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(decode_execution_info).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn describe_workflow(&self, namespace: &str, execution: &ExecutionRef) -> Result<WorkflowSummary> {
        let url = self.workflow_url(namespace, &execution.workflow_id, "");
        let params = [("execution.runId", execution.run_id_or_empty().to_string())];
        let body = self.get_json(&url, &params).await?;
        let info = body
            .get("workflowExecutionInfo")
            .ok_or_else(|| ClientError::Decode("describe response without workflowExecutionInfo".into()))?;
        decode_execution_info(info)
    }

    async fn fetch_history(&self, namespace: &str, execution: &ExecutionRef) -> Result<Vec<RawEvent>> {
        let url = self.workflow_url(namespace, &execution.workflow_id, "/history");
        let mut events = Vec::new();
        let mut token = String::new();
        for page in 0..MAX_HISTORY_PAGES {
            let mut params = vec![("execution.runId", execution.run_id_or_empty().to_string())];
            if !token.is_empty() {
                params.push(("nextPageToken", token.clone()));
            }
            let body = self.get_json(&url, &params).await?;
            let batch = match body.get("history") {
                Some(history) if history.get("events").is_some() => decode_history(history)?,
                _ => Vec::new(),
            };
            debug!(page, events = batch.len(), "fetched history page");
            events.extend(batch);
            token = body
                .get("nextPageToken")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if token.is_empty() {
                return Ok(events);
            }
        }
        Err(ClientError::Decode(format!(
            "history of {execution} exceeded {MAX_HISTORY_PAGES} pages"
        )))
    }

    async fn signal(
        &self,
        namespace: &str,
        execution: &ExecutionRef,
        signal_name: &str,
        input: Option<Value>,
    ) -> Result<()> {
        let suffix = format!("/signal/{}", urlencoding::encode(signal_name));
        let url = self.workflow_url(namespace, &execution.workflow_id, &suffix);
        let mut body = json!({
            "workflowExecution": execution_body(execution),
            "identity": IDENTITY,
        });
        if let Some(input) = input {
            body["input"] = history_json::encode_payloads(&input)?;
        }
        self.post_json(&url, &body).await?;
        info!(%execution, signal_name, "signal sent");
        Ok(())
    }

    async fn cancel(&self, namespace: &str, execution: &ExecutionRef, reason: &str) -> Result<()> {
        let url = self.workflow_url(namespace, &execution.workflow_id, "/cancel");
        let body = json!({
            "workflowExecution": execution_body(execution),
            "reason": reason,
            "identity": IDENTITY,
        });
        self.post_json(&url, &body).await?;
        info!(%execution, "cancel requested");
        Ok(())
    }

    async fn terminate(&self, namespace: &str, execution: &ExecutionRef, reason: &str) -> Result<()> {
        let url = self.workflow_url(namespace, &execution.workflow_id, "/terminate");
        let body = json!({
            "workflowExecution": execution_body(execution),
            "reason": reason,
            "identity": IDENTITY,
        });
        self.post_json(&url, &body).await?;
        info!(%execution, "terminated");
        Ok(())
    }

    async fn delete(&self, namespace: &str, execution: &ExecutionRef) -> Result<()> {
        let url = self.workflow_url(namespace, &execution.workflow_id, "");
        self.delete_request(&url, &run_query(execution)).await?;
        info!(%execution, "deleted");
        Ok(())
    }

    async fn reset(
        &self,
        namespace: &str,
        execution: &ExecutionRef,
        event_id: i64,
        reason: &str,
    ) -> Result<String> {
        let url = self.workflow_url(namespace, &execution.workflow_id, "/reset");
        let body = json!({
            "workflowExecution": execution_body(execution),
            "reason": reason,
            "workflowTaskFinishEventId": event_id.to_string(),
            "requestId": uuid::Uuid::new_v4().to_string(),
        });
        let resp = self.post_json(&url, &body).await?;
        let run_id = resp
            .get("runId")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Decode("reset response without runId".into()))?
            .to_string();
        info!(%execution, event_id, new_run = %run_id, "reset");
        Ok(run_id)
    }

    async fn query(
        &self,
        namespace: &str,
        execution: &ExecutionRef,
        query_type: &str,
        args: Option<Value>,
    ) -> Result<String> {
        let suffix = format!("/query/{}", urlencoding::encode(query_type));
        let url = self.workflow_url(namespace, &execution.workflow_id, &suffix);
        let mut query = json!({ "queryType": query_type });
        if let Some(args) = args {
            query["queryArgs"] = history_json::encode_payloads(&args)?;
        }
        let body = json!({ "execution": execution_body(execution), "query": query });
        let resp = self.post_json(&url, &body).await?;

        if let Some(rejected) = resp.get("queryRejected").filter(|r| !r.is_null()) {
            let status = rejected
                .get("status")
                .and_then(Value::as_str)
                .map(history_json::normalize_status)
                .unwrap_or_else(|| "Unknown".to_string());
            return Err(ClientError::QueryRejected(format!("workflow is {status}")));
        }
        let values = resp
            .get("queryResult")
            .map(history_json::decode_payloads)
            .transpose()?
            .unwrap_or_default();
        Ok(render_query_result(values))
    }
}

/// Pins a DELETE to one run. Without a run id the server picks the latest.
fn run_query(execution: &ExecutionRef) -> Vec<(&'static str, String)> {
    execution
        .run_id
        .iter()
        .map(|run| ("workflowExecution.runId", run.clone()))
        .collect()
}

fn render_query_result(values: Vec<Value>) -> String {
    values
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_namespace_and_workflow_id() {
        let provider = HttpProvider::with_client(reqwest::Client::new(), "localhost:8233/");
        assert_eq!(provider.base_url(), "http://localhost:8233");
        assert_eq!(
            provider.workflow_url("prod ns", "order/1", "/history"),
            "http://localhost:8233/api/v1/namespaces/prod%20ns/workflows/order%2F1/history"
        );
    }

    #[test]
    fn delete_targets_workflow_url_and_pins_run() {
        let provider = HttpProvider::with_client(reqwest::Client::new(), "localhost:8233");
        assert_eq!(
            provider.workflow_url("default", "order-1", ""),
            "http://localhost:8233/api/v1/namespaces/default/workflows/order-1"
        );
        let pinned = ExecutionRef::new("order-1", Some("run-2".into()));
        assert_eq!(run_query(&pinned), vec![("workflowExecution.runId", "run-2".to_string())]);
        assert!(run_query(&ExecutionRef::latest("order-1")).is_empty());
    }

    #[test]
    fn query_results_render_strings_raw_and_json_pretty() {
        let text = render_query_result(vec![json!("stack"), json!({ "a": 1 })]);
        assert_eq!(text, "stack\n{\n  \"a\": 1\n}");
    }
}
