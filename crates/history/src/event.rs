use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of an execution's append-only history log.
///
/// Only the correlation fields the reconstruction needs are lifted out of the
/// type-specific payload; everything else stays in `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Monotonically increasing within one execution.
    pub id: i64,
    /// Domain type tag, e.g. `ActivityTaskScheduled`.
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    /// Free-form, type-specific payload (usually compact JSON).
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_event_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_event_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initiated_event_id: Option<i64>,
    /// 1 = first try.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_workflow_type: Option<String>,
}

impl RawEvent {
    pub fn new(id: i64, event_type: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            event_type: event_type.into(),
            timestamp,
            details: String::new(),
            scheduled_event_id: None,
            started_event_id: None,
            initiated_event_id: None,
            attempt: None,
            timer_id: None,
            activity_type: None,
            child_workflow_type: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn with_scheduled(mut self, scheduled_event_id: i64) -> Self {
        self.scheduled_event_id = Some(scheduled_event_id);
        self
    }

    pub fn with_started(mut self, started_event_id: i64) -> Self {
        self.started_event_id = Some(started_event_id);
        self
    }

    pub fn with_initiated(mut self, initiated_event_id: i64) -> Self {
        self.initiated_event_id = Some(initiated_event_id);
        self
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn with_timer_id(mut self, timer_id: impl Into<String>) -> Self {
        self.timer_id = Some(timer_id.into());
        self
    }

    pub fn with_activity_type(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = Some(activity_type.into());
        self
    }

    pub fn with_child_workflow_type(mut self, workflow_type: impl Into<String>) -> Self {
        self.child_workflow_type = Some(workflow_type.into());
        self
    }

    /// Attempt number, treating a missing value as the first try.
    pub fn attempt_or_first(&self) -> u32 {
        self.attempt.unwrap_or(1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_missing_correlation_fields() {
        let raw = r#"{"id":5,"eventType":"ActivityTaskScheduled","timestamp":"2024-01-01T00:00:00Z","activityType":"Charge"}"#;
        let event: RawEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.id, 5);
        assert_eq!(event.activity_type.as_deref(), Some("Charge"));
        assert_eq!(event.scheduled_event_id, None);
        assert!(event.details.is_empty());
    }

    #[test]
    fn attempt_defaults_to_first_try() {
        let event = RawEvent::new(1, "ActivityTaskStarted", Utc::now());
        assert_eq!(event.attempt_or_first(), 1);
        assert_eq!(event.with_attempt(0).attempt_or_first(), 1);
    }
}
