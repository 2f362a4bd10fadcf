//! Reset targets derived from a fetched history.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::RawEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetPoint {
    /// Id of the `WorkflowTaskCompleted` event to reset to.
    pub event_id: i64,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    /// Last completed workflow task before the first failure.
    pub failure_point: bool,
}

fn is_failure_event(event_type: &str) -> bool {
    matches!(
        event_type,
        "ActivityTaskFailed"
            | "ActivityTaskTimedOut"
            | "WorkflowTaskFailed"
            | "WorkflowTaskTimedOut"
            | "ChildWorkflowExecutionFailed"
            | "ChildWorkflowExecutionTimedOut"
            | "WorkflowExecutionFailed"
            | "WorkflowExecutionTimedOut"
    )
}

/// Every completed workflow task, in history order.
pub fn reset_points(events: &[RawEvent]) -> Vec<ResetPoint> {
    let first_failure = events.iter().find(|e| is_failure_event(&e.event_type));
    let failure_target = first_failure.and_then(|failure| {
        events
            .iter()
            .filter(|e| e.event_type == "WorkflowTaskCompleted" && e.id < failure.id)
            .map(|e| e.id)
            .next_back()
    });

    events
        .iter()
        .filter(|e| e.event_type == "WorkflowTaskCompleted")
        .map(|e| {
            let failure_point = Some(e.id) == failure_target;
            let description = match (failure_point, first_failure) {
                (true, Some(failure)) => format!(
                    "Before first failure ({} at event {})",
                    failure.event_type, failure.id
                ),
                _ => format!("Workflow task completed at {}", e.timestamp.format("%H:%M:%S")),
            };
            ResetPoint {
                event_id: e.id,
                timestamp: e.timestamp,
                description,
                failure_point,
            }
        })
        .collect()
}

pub fn first_failure_point(points: &[ResetPoint]) -> Option<&ResetPoint> {
    points.iter().find(|p| p.failure_point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ev, order_history};

    #[test]
    fn every_completed_workflow_task_is_a_target() {
        let points = reset_points(&order_history());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].event_id, 4);
        assert!(first_failure_point(&points).is_none());
    }

    #[test]
    fn failure_point_is_last_task_before_first_failure() {
        let events = vec![
            ev(1, "WorkflowExecutionStarted", 0),
            ev(4, "WorkflowTaskCompleted", 1),
            ev(7, "WorkflowTaskCompleted", 2),
            ev(8, "ActivityTaskFailed", 3),
            ev(10, "WorkflowTaskCompleted", 4),
            ev(11, "WorkflowExecutionFailed", 5),
        ];
        let points = reset_points(&events);
        assert_eq!(points.len(), 3);
        let point = first_failure_point(&points).unwrap();
        assert_eq!(point.event_id, 7);
        assert!(point.description.contains("ActivityTaskFailed"));
        assert_eq!(points.iter().filter(|p| p.failure_point).count(), 1);
    }

    #[test]
    fn failure_before_any_task_has_no_quick_reset() {
        let events = vec![
            ev(1, "WorkflowExecutionStarted", 0),
            ev(2, "WorkflowTaskTimedOut", 1),
            ev(5, "WorkflowTaskCompleted", 2),
        ];
        let points = reset_points(&events);
        assert_eq!(points.len(), 1);
        assert!(first_failure_point(&points).is_none());
    }
}
