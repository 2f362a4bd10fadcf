//! Deterministic in-memory provider for demos and tests.
//!
//! Mutations append the events the server would write, so a refetch after a
//! signal, cancel, terminate, or reset shows the new state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};
use tempo_history::RawEvent;
use tracing::info;

use crate::error::{ClientError, Result};
use crate::{ExecutionRef, WorkflowProvider, WorkflowSummary};

#[derive(Debug, Clone)]
struct MockRun {
    summary: WorkflowSummary,
    events: Vec<RawEvent>,
}

impl MockRun {
    fn next_id(&self) -> i64 {
        self.events.last().map_or(1, |e| e.id + 1)
    }

    /// Appends an event stamped no earlier than the last one.
    fn append(&mut self, event_type: &str, details: Value) -> &mut RawEvent {
        let at = self
            .events
            .last()
            .map_or_else(Utc::now, |last| Utc::now().max(last.timestamp));
        let event = RawEvent::new(self.next_id(), event_type, at).with_details(details.to_string());
        self.events.push(event);
        let last = self.events.len() - 1;
        &mut self.events[last]
    }

    fn close(&mut self, status: &str) {
        self.summary.status = status.to_string();
        self.summary.end_time = self.events.last().map(|e| e.timestamp);
        self.summary.history_length = Some(self.events.len() as u64);
    }

    fn ensure_running(&self) -> Result<()> {
        if self.summary.is_running() {
            Ok(())
        } else {
            Err(ClientError::Http {
                status: 400,
                message: format!("workflow execution is already {}", self.summary.status),
            })
        }
    }
}

pub struct MockProvider {
    runs: Mutex<Vec<MockRun>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Seeds fixtures relative to `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        let runs = WORKFLOWS
            .iter()
            .map(|w| {
                let summary = w.summary(now);
                let events = if w.id == ORDER_WORKFLOW_ID {
                    order_history(now)
                } else {
                    synthetic_history(&summary)
                };
                MockRun {
                    summary: WorkflowSummary {
                        history_length: Some(events.len() as u64),
                        ..summary
                    },
                    events,
                }
            })
            .collect();
        Self {
            runs: Mutex::new(runs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MockRun>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Index of the latest run matching `execution`.
    fn position(runs: &[MockRun], execution: &ExecutionRef) -> Result<usize> {
        runs.iter()
            .rposition(|r| {
                r.summary.workflow_id == execution.workflow_id
                    && execution
                        .run_id
                        .as_ref()
                        .is_none_or(|id| *id == r.summary.run_id)
            })
            .ok_or_else(|| ClientError::NotFound(execution.to_string()))
    }

    fn with_run<T>(
        &self,
        execution: &ExecutionRef,
        f: impl FnOnce(&mut MockRun) -> Result<T>,
    ) -> Result<T> {
        let mut runs = self.lock();
        let index = Self::position(&runs, execution)?;
        f(&mut runs[index])
    }
}

#[async_trait]
impl WorkflowProvider for MockProvider {
    fn name(&self) -> String {
        "mock".to_string()
    }

    async fn list_workflows(&self, _namespace: &str, query: &str) -> Result<Vec<WorkflowSummary>> {
        let needle = query.trim().to_lowercase();
        let runs = self.lock();
        let mut out: Vec<WorkflowSummary> = Vec::new();
        for run in runs.iter().rev() {
            let s = &run.summary;
            if out.iter().any(|o| o.workflow_id == s.workflow_id) {
                continue;
            }
            let matches = needle.is_empty()
                || [&s.workflow_id, &s.workflow_type, &s.status]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle));
            if matches {
                out.push(s.clone());
            }
        }
        out.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(out)
    }

    async fn describe_workflow(&self, _namespace: &str, execution: &ExecutionRef) -> Result<WorkflowSummary> {
        self.with_run(execution, |run| Ok(run.summary.clone()))
    }

    async fn fetch_history(&self, _namespace: &str, execution: &ExecutionRef) -> Result<Vec<RawEvent>> {
        self.with_run(execution, |run| Ok(run.events.clone()))
    }

    async fn signal(
        &self,
        _namespace: &str,
        execution: &ExecutionRef,
        signal_name: &str,
        input: Option<Value>,
    ) -> Result<()> {
        self.with_run(execution, |run| {
            run.ensure_running()?;
            run.append(
                "WorkflowExecutionSignaled",
                json!({ "signalName": signal_name, "input": input, "identity": "tempo" }),
            );
            run.summary.history_length = Some(run.events.len() as u64);
            Ok(())
        })?;
        info!(%execution, signal_name, "mock signal recorded");
        Ok(())
    }

    async fn cancel(&self, _namespace: &str, execution: &ExecutionRef, reason: &str) -> Result<()> {
        self.with_run(execution, |run| {
            run.ensure_running()?;
            let requested = run.next_id();
            run.append(
                "WorkflowExecutionCancelRequested",
                json!({ "cause": reason, "identity": "tempo" }),
            );
            append_workflow_task(run);
            run.append(
                "WorkflowExecutionCanceled",
                json!({ "cancelRequestedEventId": requested.to_string() }),
            );
            run.close("Canceled");
            Ok(())
        })?;
        info!(%execution, "mock cancel recorded");
        Ok(())
    }

    async fn terminate(&self, _namespace: &str, execution: &ExecutionRef, reason: &str) -> Result<()> {
        self.with_run(execution, |run| {
            run.ensure_running()?;
            run.append(
                "WorkflowExecutionTerminated",
                json!({ "reason": reason, "identity": "tempo" }),
            );
            run.close("Terminated");
            Ok(())
        })?;
        info!(%execution, "mock terminate recorded");
        Ok(())
    }

    async fn delete(&self, _namespace: &str, execution: &ExecutionRef) -> Result<()> {
        {
            let mut runs = self.lock();
            let index = Self::position(&runs, execution)?;
            runs.remove(index);
        }
        info!(%execution, "mock delete recorded");
        Ok(())
    }

    async fn reset(
        &self,
        _namespace: &str,
        execution: &ExecutionRef,
        event_id: i64,
        reason: &str,
    ) -> Result<String> {
        let new_run = self.with_run(execution, |run| {
            let target = run
                .events
                .iter()
                .find(|e| e.id == event_id && e.event_type == "WorkflowTaskCompleted")
                .cloned()
                .ok_or_else(|| ClientError::Http {
                    status: 400,
                    message: format!("event {event_id} is not a completed workflow task"),
                })?;

            let mut events: Vec<RawEvent> =
                run.events.iter().filter(|e| e.id < event_id).cloned().collect();
            let mut reset_run = MockRun {
                summary: WorkflowSummary {
                    run_id: uuid::Uuid::new_v4().to_string(),
                    status: "Running".to_string(),
                    end_time: None,
                    ..run.summary.clone()
                },
                events: Vec::new(),
            };
            let failed_id = events.last().map_or(1, |e| e.id + 1);
            events.push(
                RawEvent::new(failed_id, "WorkflowTaskFailed", target.timestamp)
                    .with_scheduled(target.scheduled_event_id.unwrap_or_default())
                    .with_details(json!({ "cause": "ResetWorkflow", "reason": reason }).to_string()),
            );
            reset_run.events = events;
            append_workflow_task(&mut reset_run);
            reset_run.summary.history_length = Some(reset_run.events.len() as u64);

            if run.summary.is_running() {
                run.append(
                    "WorkflowExecutionTerminated",
                    json!({ "reason": format!("reset: {reason}") }),
                );
                run.close("Terminated");
            }
            Ok(reset_run)
        })?;

        let run_id = new_run.summary.run_id.clone();
        info!(%execution, event_id, new_run = %run_id, "mock reset recorded");
        self.lock().push(new_run);
        Ok(run_id)
    }

    async fn query(
        &self,
        _namespace: &str,
        execution: &ExecutionRef,
        query_type: &str,
        _args: Option<Value>,
    ) -> Result<String> {
        self.with_run(execution, |run| match query_type {
            "__stack_trace" => Ok(format!(
                "coroutine root [blocked on selector-1.Select]:\n\
                 main.{}(...)\n\
                 \tworkflows/{}.go:42",
                run.summary.workflow_type,
                run.summary.workflow_type.to_lowercase()
            )),
            "status" => Ok(serde_json::to_string_pretty(&json!({
                "status": run.summary.status,
                "events": run.events.len(),
            }))?),
            other => Err(ClientError::QueryRejected(format!(
                "unknown queryType {other}. KnownQueryTypes=[__stack_trace status]"
            ))),
        })
    }
}

fn append_workflow_task(run: &mut MockRun) {
    let scheduled = run.next_id();
    run.append("WorkflowTaskScheduled", json!({ "taskQueue": { "name": run.summary.task_queue } }));
    run.append("WorkflowTaskStarted", json!({ "identity": "tempo" }))
        .scheduled_event_id = Some(scheduled);
    run.append("WorkflowTaskCompleted", json!({}))
        .scheduled_event_id = Some(scheduled);
}

struct Fixture {
    id: &'static str,
    run: &'static str,
    workflow_type: &'static str,
    status: &'static str,
    task_queue: &'static str,
    /// Seconds before `now`.
    started: i64,
    ended: Option<i64>,
    parent: Option<&'static str>,
}

impl Fixture {
    fn summary(&self, now: DateTime<Utc>) -> WorkflowSummary {
        WorkflowSummary {
            workflow_id: self.id.to_string(),
            run_id: self.run.to_string(),
            workflow_type: self.workflow_type.to_string(),
            status: self.status.to_string(),
            task_queue: self.task_queue.to_string(),
            start_time: now - Duration::seconds(self.started),
            end_time: self.ended.map(|s| now - Duration::seconds(s)),
            parent_id: self.parent.map(str::to_string),
            history_length: None,
        }
    }
}

pub const ORDER_WORKFLOW_ID: &str = "order-processing-abc123";

const fn fixture(
    id: &'static str,
    run: &'static str,
    workflow_type: &'static str,
    status: &'static str,
    task_queue: &'static str,
    started: i64,
    ended: Option<i64>,
) -> Fixture {
    Fixture {
        id,
        run,
        workflow_type,
        status,
        task_queue,
        started,
        ended,
        parent: None,
    }
}

const WORKFLOWS: &[Fixture] = &[
    fixture(ORDER_WORKFLOW_ID, "run-001-xyz", "OrderWorkflow", "Running", "order-tasks", 300, None),
    fixture("payment-xyz789", "run-002-abc", "PaymentWorkflow", "Completed", "payment-tasks", 3_600, Some(3_300)),
    fixture("shipment-def456", "run-003-def", "ShipmentWorkflow", "Failed", "shipment-tasks", 1_800, Some(1_500)),
    fixture("inventory-check-111", "run-004-ghi", "InventoryWorkflow", "Running", "inventory-tasks", 600, None),
    fixture("user-signup-222", "run-005-jkl", "UserOnboardingWorkflow", "Completed", "user-tasks", 7_200, Some(6_300)),
    fixture("refund-process-333", "run-006-mno", "RefundWorkflow", "Canceled", "payment-tasks", 2_700, Some(2_400)),
    fixture("email-campaign-444", "run-007-pqr", "EmailCampaignWorkflow", "Running", "email-tasks", 900, None),
    fixture("data-sync-555", "run-008-stu", "DataSyncWorkflow", "Terminated", "sync-tasks", 10_800, Some(7_200)),
    fixture("report-gen-666", "run-009-vwx", "ReportWorkflow", "Completed", "report-tasks", 14_400, Some(12_600)),
    fixture("cleanup-job-777", "run-010-yz0", "CleanupWorkflow", "Running", "maintenance-tasks", 120, None),
    fixture("notification-888", "run-011-123", "NotificationWorkflow", "Completed", "notification-tasks", 1_200, Some(1_190)),
    fixture("batch-import-999", "run-012-456", "BatchImportWorkflow", "TimedOut", "import-tasks", 5_400, Some(3_600)),
    Fixture {
        parent: Some(ORDER_WORKFLOW_ID),
        ..fixture("child-workflow-aaa", "run-013-789", "ChildWorkflow", "Completed", "order-tasks", 240, Some(180))
    },
];

fn attrs(pairs: Value) -> String {
    pairs.to_string()
}

/// The showcase history: sequential activities, a rescheduled retry, a
/// running child workflow, an open timer, a signal, a marker, and an activity
/// on its third attempt.
fn order_history(now: DateTime<Utc>) -> Vec<RawEvent> {
    let t = |secs_ago: i64| now - Duration::seconds(secs_ago);
    let queue = json!({ "name": "order-tasks" });
    let mut events = vec![
        RawEvent::new(1, "WorkflowExecutionStarted", t(300)).with_details(attrs(json!({
            "workflowType": { "name": "OrderWorkflow" },
            "taskQueue": queue,
            "input": { "orderId": "abc123", "amount": 129.5 },
        }))),
    ];
    let wt = |events: &mut Vec<RawEvent>, at: i64| {
        let s = events.len() as i64 + 1;
        events.push(RawEvent::new(s, "WorkflowTaskScheduled", t(at)).with_details(attrs(json!({ "taskQueue": queue }))));
        events.push(
            RawEvent::new(s + 1, "WorkflowTaskStarted", t(at - 1))
                .with_scheduled(s)
                .with_details(attrs(json!({ "identity": "worker-1@host" }))),
        );
        events.push(
            RawEvent::new(s + 2, "WorkflowTaskCompleted", t(at - 1))
                .with_scheduled(s)
                .with_details(attrs(json!({ "scheduledEventId": s.to_string() }))),
        );
    };
    let activity = |events: &mut Vec<RawEvent>, name: &str, at: i64| -> i64 {
        let id = events.len() as i64 + 1;
        events.push(
            RawEvent::new(id, "ActivityTaskScheduled", t(at))
                .with_activity_type(name)
                .with_details(attrs(json!({ "activityType": { "name": name }, "taskQueue": queue }))),
        );
        id
    };
    let step = |events: &mut Vec<RawEvent>, tag: &str, scheduled: i64, at: i64, details: Value| {
        let id = events.len() as i64 + 1;
        events.push(
            RawEvent::new(id, tag, t(at))
                .with_scheduled(scheduled)
                .with_details(attrs(details)),
        );
        id
    };

    wt(&mut events, 300);
    let validate = activity(&mut events, "ValidateOrder", 290);
    step(&mut events, "ActivityTaskStarted", validate, 285, json!({ "identity": "worker-1@host", "attempt": 1 }));
    step(&mut events, "ActivityTaskCompleted", validate, 280, json!({ "result": { "valid": true } }));
    wt(&mut events, 280);

    let reserve = activity(&mut events, "ReserveInventory", 270);
    step(&mut events, "ActivityTaskStarted", reserve, 265, json!({ "identity": "worker-2@host", "attempt": 1 }));
    step(&mut events, "ActivityTaskCompleted", reserve, 250, json!({ "result": { "reserved": true } }));
    wt(&mut events, 250);

    let payment = activity(&mut events, "ProcessPayment", 240);
    step(&mut events, "ActivityTaskStarted", payment, 235, json!({ "identity": "worker-3@host", "attempt": 1 }));
    step(
        &mut events,
        "ActivityTaskFailed",
        payment,
        230,
        json!({ "failure": { "message": "PaymentDeclined", "applicationFailureInfo": { "type": "CardError" } } }),
    );
    let retry = activity(&mut events, "ProcessPayment", 225);
    let started = step(&mut events, "ActivityTaskStarted", retry, 220, json!({ "identity": "worker-3@host", "attempt": 2 }));
    if let Some(e) = events.iter_mut().find(|e| e.id == started) {
        e.attempt = Some(2);
    }
    step(&mut events, "ActivityTaskCompleted", retry, 200, json!({ "result": { "transactionId": "txn-123" } }));
    wt(&mut events, 200);

    let child = events.len() as i64 + 1;
    events.push(
        RawEvent::new(child, "StartChildWorkflowExecutionInitiated", t(190))
            .with_child_workflow_type("ShipmentWorkflow")
            .with_details(attrs(json!({ "workflowType": { "name": "ShipmentWorkflow" }, "workflowId": "shipment-def456" }))),
    );
    events.push(
        RawEvent::new(child + 1, "ChildWorkflowExecutionStarted", t(185))
            .with_initiated(child)
            .with_child_workflow_type("ShipmentWorkflow")
            .with_details(attrs(json!({ "workflowExecution": { "workflowId": "shipment-def456", "runId": "run-child-001" } }))),
    );
    events.push(
        RawEvent::new(child + 2, "TimerStarted", t(180))
            .with_timer_id("wait-for-shipment")
            .with_details(attrs(json!({ "timerId": "wait-for-shipment", "startToFireTimeout": "86400s" }))),
    );
    events.push(
        RawEvent::new(child + 3, "SignalExternalWorkflowExecutionInitiated", t(150))
            .with_details(attrs(json!({ "workflowExecution": { "workflowId": "notification-888" }, "signalName": "order-update" }))),
    );
    events.push(
        RawEvent::new(child + 4, "ExternalWorkflowExecutionSignaled", t(145))
            .with_initiated(child + 3)
            .with_details(attrs(json!({ "workflowExecution": { "workflowId": "notification-888" } }))),
    );
    events.push(
        RawEvent::new(child + 5, "WorkflowExecutionSignaled", t(120))
            .with_details(attrs(json!({ "signalName": "address-updated", "input": { "zip": "94107" } }))),
    );
    events.push(
        RawEvent::new(child + 6, "MarkerRecorded", t(110))
            .with_details(attrs(json!({ "markerName": "Version", "details": { "change-id": 1 } }))),
    );
    wt(&mut events, 100);

    let notify = activity(&mut events, "NotifyCustomer", 90);
    let started = step(&mut events, "ActivityTaskStarted", notify, 30, json!({ "identity": "worker-2@host", "attempt": 3, "lastFailure": { "message": "smtp timeout" } }));
    if let Some(e) = events.iter_mut().find(|e| e.id == started) {
        e.attempt = Some(3);
    }
    events
}

/// Minimal plausible history ending in `summary.status`.
fn synthetic_history(summary: &WorkflowSummary) -> Vec<RawEvent> {
    let start = summary.start_time;
    let end = summary.end_time.unwrap_or(start + Duration::seconds(60));
    let span = (end - start).max(Duration::seconds(10));
    let at = |n: i32| start + span * n / 10;
    let queue = json!({ "name": summary.task_queue });
    let activity = format!("{}Step", summary.workflow_type.trim_end_matches("Workflow"));

    let mut events = vec![
        RawEvent::new(1, "WorkflowExecutionStarted", at(0)).with_details(attrs(json!({
            "workflowType": { "name": summary.workflow_type },
            "taskQueue": queue,
        }))),
        RawEvent::new(2, "WorkflowTaskScheduled", at(0)),
        RawEvent::new(3, "WorkflowTaskStarted", at(1)).with_scheduled(2),
        RawEvent::new(4, "WorkflowTaskCompleted", at(1)).with_scheduled(2),
        RawEvent::new(5, "ActivityTaskScheduled", at(2))
            .with_activity_type(activity.as_str())
            .with_details(attrs(json!({ "activityType": { "name": activity } }))),
        RawEvent::new(6, "ActivityTaskStarted", at(3)).with_scheduled(5).with_attempt(1),
    ];

    let closing: &[(&str, i32)] = match summary.status.as_str() {
        "Completed" => &[("ActivityTaskCompleted", 7), ("WorkflowExecutionCompleted", 10)],
        "Failed" => &[("ActivityTaskFailed", 8), ("WorkflowExecutionFailed", 10)],
        "TimedOut" => &[("ActivityTaskTimedOut", 9), ("WorkflowExecutionTimedOut", 10)],
        "Canceled" => &[
            ("WorkflowExecutionCancelRequested", 6),
            ("ActivityTaskCanceled", 8),
            ("WorkflowExecutionCanceled", 10),
        ],
        "Terminated" => &[("WorkflowExecutionTerminated", 10)],
        _ => &[],
    };
    for (tag, step) in closing {
        let id = events.len() as i64 + 1;
        let mut event = RawEvent::new(id, *tag, at(*step));
        if tag.starts_with("ActivityTask") {
            event = event.with_scheduled(5);
        }
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_history::{GroupKind, build_tree};

    fn order() -> ExecutionRef {
        ExecutionRef::latest(ORDER_WORKFLOW_ID)
    }

    #[test]
    fn order_history_reconstructs_every_operation_kind() {
        let roots = build_tree(&order_history(Utc::now()));
        for kind in [
            GroupKind::Workflow,
            GroupKind::WorkflowTask,
            GroupKind::Activity,
            GroupKind::Timer,
            GroupKind::ChildWorkflow,
            GroupKind::Signal,
            GroupKind::Marker,
            GroupKind::Other,
        ] {
            assert!(roots.iter().any(|r| r.kind == kind), "{kind} missing");
        }
        let notify = roots.iter().find(|r| r.name == "Activity: NotifyCustomer").unwrap();
        assert_eq!(notify.attempt_count, 2);
        assert!(notify.is_open());
    }

    #[test]
    fn synthetic_histories_close_with_summary_status() {
        let now = Utc::now();
        for fixture in WORKFLOWS.iter().filter(|f| f.id != ORDER_WORKFLOW_ID) {
            let summary = fixture.summary(now);
            let roots = build_tree(&synthetic_history(&summary));
            let workflow = roots.iter().find(|r| r.kind == GroupKind::Workflow).unwrap();
            assert_eq!(workflow.status, summary.status, "{}", fixture.id);
        }
    }

    #[tokio::test]
    async fn list_filters_by_query() {
        let mock = MockProvider::new();
        assert_eq!(mock.list_workflows("default", "").await.unwrap().len(), WORKFLOWS.len());
        let failed = mock.list_workflows("default", "failed").await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].workflow_id, "shipment-def456");
    }

    #[tokio::test]
    async fn terminate_appends_event_and_closes() {
        let mock = MockProvider::new();
        mock.terminate("default", &order(), "stuck").await.unwrap();
        let summary = mock.describe_workflow("default", &order()).await.unwrap();
        assert_eq!(summary.status, "Terminated");
        let events = mock.fetch_history("default", &order()).await.unwrap();
        assert_eq!(events.last().unwrap().event_type, "WorkflowExecutionTerminated");
        let err = mock.cancel("default", &order(), "again").await.unwrap_err();
        assert!(matches!(err, ClientError::Http { status: 400, .. }));
    }

    #[tokio::test]
    async fn reset_creates_running_run_from_workflow_task() {
        let mock = MockProvider::new();
        let run_id = mock.reset("default", &order(), 4, "retry payment").await.unwrap();
        let reset = ExecutionRef::new(ORDER_WORKFLOW_ID, Some(run_id.clone()));
        let summary = mock.describe_workflow("default", &reset).await.unwrap();
        assert!(summary.is_running());
        let events = mock.fetch_history("default", &reset).await.unwrap();
        assert_eq!(events[3].event_type, "WorkflowTaskFailed");
        assert_eq!(events[3].scheduled_event_id, Some(2));
        assert_eq!(events.last().unwrap().event_type, "WorkflowTaskCompleted");
        assert!(events.windows(2).all(|w| w[1].id == w[0].id + 1));

        let listed = mock.list_workflows("default", ORDER_WORKFLOW_ID).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].run_id, run_id);

        let old = ExecutionRef::new(ORDER_WORKFLOW_ID, Some("run-001-xyz".into()));
        assert_eq!(mock.describe_workflow("default", &old).await.unwrap().status, "Terminated");
    }

    #[tokio::test]
    async fn delete_removes_run_from_list_and_history() {
        let mock = MockProvider::new();
        let before = mock.list_workflows("default", "").await.unwrap().len();
        mock.delete("default", &order()).await.unwrap();

        let listed = mock.list_workflows("default", "").await.unwrap();
        assert_eq!(listed.len(), before - 1);
        assert!(listed.iter().all(|w| w.workflow_id != ORDER_WORKFLOW_ID));
        let err = mock.fetch_history("default", &order()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        let err = mock.delete("default", &order()).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_query_is_rejected() {
        let mock = MockProvider::new();
        let trace = mock.query("default", &order(), "__stack_trace", None).await.unwrap();
        assert!(trace.contains("OrderWorkflow"));
        let err = mock.query("default", &order(), "nope", None).await.unwrap_err();
        assert!(matches!(err, ClientError::QueryRejected(_)));
    }
}
