use chrono::{DateTime, Utc};

use crate::RawEvent;

/// 2024-01-01T00:00:00Z, the zero point of every fixture timestamp.
const BASE_SECS: i64 = 1_704_067_200;

/// Fixture instant `secs` seconds after the base time (negative allowed).
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(BASE_SECS + secs, 0).unwrap_or_default()
}

/// Event with the given id and tag at `secs` after the base time.
pub fn ev(id: i64, event_type: &str, secs: i64) -> RawEvent {
    RawEvent::new(id, event_type, at(secs))
}

/// A finished order workflow: one workflow task, an activity that retried,
/// a timer, a signal, and a child workflow.
pub fn order_history() -> Vec<RawEvent> {
    vec![
        ev(1, "WorkflowExecutionStarted", 0),
        ev(2, "WorkflowTaskScheduled", 0),
        ev(3, "WorkflowTaskStarted", 1).with_scheduled(2),
        ev(4, "WorkflowTaskCompleted", 2).with_scheduled(2),
        ev(5, "ActivityTaskScheduled", 2).with_activity_type("ChargeCard"),
        ev(6, "ActivityTaskStarted", 20).with_scheduled(5).with_attempt(2),
        ev(7, "ActivityTaskCompleted", 25).with_scheduled(5),
        ev(8, "TimerStarted", 26).with_timer_id("cooldown"),
        ev(9, "WorkflowExecutionSignaled", 30),
        ev(10, "TimerFired", 86).with_started(8),
        ev(11, "StartChildWorkflowExecutionInitiated", 87)
            .with_child_workflow_type("ShipOrder"),
        ev(12, "ChildWorkflowExecutionStarted", 88).with_initiated(11),
        ev(13, "ChildWorkflowExecutionCompleted", 150).with_initiated(11),
        ev(14, "WorkflowExecutionCompleted", 151),
    ]
}

/// Same shape as [`order_history`] but cut off while the child workflow runs.
pub fn running_history() -> Vec<RawEvent> {
    order_history().into_iter().take(12).collect()
}
