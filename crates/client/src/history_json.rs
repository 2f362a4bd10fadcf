//! Decoding of Temporal proto-JSON histories and execution info.
//!
//! Both the HTTP API and `tctl`/`temporal` CLI exports use the same shape:
//! events carry `eventId` (a string or a number), `eventTime`, an
//! `eventType` that is either `EVENT_TYPE_FOO_BAR` or `FooBar`, and exactly one
//! `*EventAttributes` object with the type-specific payload.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tempo_history::RawEvent;

use crate::WorkflowSummary;
use crate::error::{ClientError, Result};

/// Decodes a whole history document: `{"events": [...]}`,
/// `{"history": {"events": [...]}}`, or a bare array.
pub fn decode_history(doc: &Value) -> Result<Vec<RawEvent>> {
    let events = doc
        .get("history")
        .and_then(|h| h.get("events"))
        .or_else(|| doc.get("events"))
        .or(Some(doc))
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::Decode("history has no events array".into()))?;
    events.iter().map(decode_event).collect()
}

/// Decodes one event. Objects without `eventId` are read as already
/// flattened [`RawEvent`]s.
pub fn decode_event(value: &Value) -> Result<RawEvent> {
    if value.get("eventId").is_none() {
        return Ok(serde_json::from_value(value.clone())?);
    }

    let id = int_field(value, "eventId")
        .ok_or_else(|| ClientError::Decode("event without a numeric eventId".into()))?;
    let event_type = value
        .get("eventType")
        .and_then(Value::as_str)
        .map(normalize_event_type)
        .ok_or_else(|| ClientError::Decode(format!("event {id} has no eventType")))?;
    let timestamp = value
        .get("eventTime")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Decode(format!("event {id} has no eventTime")))
        .and_then(parse_time)?;

    let mut event = RawEvent::new(id, event_type, timestamp);
    let Some(attrs) = attributes(value) else {
        return Ok(event);
    };

    event.scheduled_event_id = int_field(attrs, "scheduledEventId");
    event.started_event_id = int_field(attrs, "startedEventId");
    event.initiated_event_id = int_field(attrs, "initiatedEventId");
    event.attempt = int_field(attrs, "attempt").and_then(|a| u32::try_from(a).ok());
    event.timer_id = attrs
        .get("timerId")
        .and_then(Value::as_str)
        .map(str::to_string);
    event.activity_type = type_name(attrs, "activityType");
    if event.event_type.contains("ChildWorkflow") {
        event.child_workflow_type = type_name(attrs, "workflowType");
    }
    event.details = serde_json::to_string(attrs)?;
    Ok(event)
}

fn attributes(value: &Value) -> Option<&Value> {
    value
        .as_object()?
        .iter()
        .find(|(key, v)| key.ends_with("EventAttributes") && v.is_object())
        .map(|(_, v)| v)
}

fn type_name(attrs: &Value, field: &str) -> Option<String> {
    attrs
        .get(field)
        .and_then(|t| t.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Reads an int64 field, which proto JSON renders as a string.
pub fn int_field(value: &Value, field: &str) -> Option<i64> {
    match value.get(field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ClientError::Decode(format!("bad timestamp {raw:?}: {e}")))
}

/// `EVENT_TYPE_ACTIVITY_TASK_SCHEDULED` → `ActivityTaskScheduled`.
/// Tags already in PascalCase pass through.
pub fn normalize_event_type(raw: &str) -> String {
    match raw.strip_prefix("EVENT_TYPE_") {
        Some(rest) => pascal_case(rest),
        None => raw.to_string(),
    }
}

/// `WORKFLOW_EXECUTION_STATUS_TIMED_OUT` → `TimedOut`.
pub fn normalize_status(raw: &str) -> String {
    match raw.strip_prefix("WORKFLOW_EXECUTION_STATUS_") {
        Some("UNSPECIFIED") => "Unknown".to_string(),
        Some(rest) => pascal_case(rest),
        None => raw.to_string(),
    }
}

fn pascal_case(screaming: &str) -> String {
    screaming
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Reads a `WorkflowExecutionInfo` object (list and describe responses).
pub fn decode_execution_info(info: &Value) -> Result<WorkflowSummary> {
    let execution = info
        .get("execution")
        .ok_or_else(|| ClientError::Decode("execution info without execution".into()))?;
    let workflow_id = execution
        .get("workflowId")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Decode("execution without workflowId".into()))?;
    let start_time = info
        .get("startTime")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::Decode(format!("{workflow_id} has no startTime")))
        .and_then(parse_time)?;
    let end_time = info
        .get("closeTime")
        .and_then(Value::as_str)
        .map(parse_time)
        .transpose()?;

    Ok(WorkflowSummary {
        workflow_id: workflow_id.to_string(),
        run_id: str_field(execution, "runId"),
        workflow_type: info
            .get("type")
            .and_then(|t| t.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        status: info
            .get("status")
            .and_then(Value::as_str)
            .map(normalize_status)
            .unwrap_or_else(|| "Unknown".to_string()),
        task_queue: str_field(info, "taskQueue"),
        start_time,
        end_time,
        parent_id: info
            .get("parentExecution")
            .and_then(|p| p.get("workflowId"))
            .and_then(Value::as_str)
            .map(str::to_string),
        history_length: int_field(info, "historyLength").and_then(|n| u64::try_from(n).ok()),
    })
}

fn str_field(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

const JSON_ENCODING: &str = "json/plain";

/// Wraps a JSON value as a single `json/plain` payload list.
pub fn encode_payloads(value: &Value) -> Result<Value> {
    let data = serde_json::to_vec(value)?;
    Ok(json!({
        "payloads": [{
            "metadata": { "encoding": STANDARD.encode(JSON_ENCODING) },
            "data": STANDARD.encode(data),
        }]
    }))
}

/// Decodes each payload's data. JSON payloads come back as values, anything
/// else as a string.
pub fn decode_payloads(payloads: &Value) -> Result<Vec<Value>> {
    let Some(list) = payloads.get("payloads").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    list.iter()
        .map(|payload| {
            let raw = payload
                .get("data")
                .and_then(Value::as_str)
                .map(|d| STANDARD.decode(d))
                .transpose()
                .map_err(|e| ClientError::Decode(format!("payload data: {e}")))?
                .unwrap_or_default();
            Ok(serde_json::from_slice(&raw)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&raw).into_owned())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_screaming_tags() {
        assert_eq!(
            normalize_event_type("EVENT_TYPE_START_CHILD_WORKFLOW_EXECUTION_INITIATED"),
            "StartChildWorkflowExecutionInitiated"
        );
        assert_eq!(normalize_event_type("TimerFired"), "TimerFired");
        assert_eq!(normalize_status("WORKFLOW_EXECUTION_STATUS_CONTINUED_AS_NEW"), "ContinuedAsNew");
        assert_eq!(normalize_status("WORKFLOW_EXECUTION_STATUS_RUNNING"), "Running");
    }

    #[test]
    fn decodes_correlation_fields_from_attributes() {
        let value = json!({
            "eventId": "6",
            "eventTime": "2024-01-01T00:00:01.500Z",
            "eventType": "EVENT_TYPE_ACTIVITY_TASK_STARTED",
            "activityTaskStartedEventAttributes": {
                "scheduledEventId": "5",
                "attempt": 2,
                "identity": "worker-1"
            }
        });
        let event = decode_event(&value).unwrap();
        assert_eq!(event.id, 6);
        assert_eq!(event.event_type, "ActivityTaskStarted");
        assert_eq!(event.scheduled_event_id, Some(5));
        assert_eq!(event.attempt, Some(2));
        assert!(event.details.contains("worker-1"));
        assert_eq!(event.timestamp.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn child_type_only_on_child_events() {
        let started = json!({
            "eventId": 1,
            "eventTime": "2024-01-01T00:00:00Z",
            "eventType": "WorkflowExecutionStarted",
            "workflowExecutionStartedEventAttributes": { "workflowType": { "name": "Order" } }
        });
        assert_eq!(decode_event(&started).unwrap().child_workflow_type, None);

        let child = json!({
            "eventId": 9,
            "eventTime": "2024-01-01T00:00:00Z",
            "eventType": "EVENT_TYPE_START_CHILD_WORKFLOW_EXECUTION_INITIATED",
            "startChildWorkflowExecutionInitiatedEventAttributes": { "workflowType": { "name": "Ship" } }
        });
        assert_eq!(decode_event(&child).unwrap().child_workflow_type.as_deref(), Some("Ship"));
    }

    #[test]
    fn accepts_flattened_events_and_wrapped_documents() {
        let doc = json!({
            "history": { "events": [
                { "id": 1, "eventType": "MarkerRecorded", "timestamp": "2024-01-01T00:00:00Z" }
            ]}
        });
        let events = decode_history(&doc).unwrap();
        assert_eq!(events[0].event_type, "MarkerRecorded");
        assert!(decode_history(&json!({ "nope": 1 })).is_err());
    }

    #[test]
    fn missing_time_is_a_decode_error() {
        let err = decode_event(&json!({ "eventId": 1, "eventType": "TimerFired" })).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn payloads_encode_as_base64_json() {
        let encoded = encode_payloads(&json!({ "approved": true })).unwrap();
        let decoded = decode_payloads(&encoded).unwrap();
        assert_eq!(decoded, vec![json!({ "approved": true })]);
        let metadata = encoded["payloads"][0]["metadata"]["encoding"].as_str().unwrap();
        assert_eq!(STANDARD.decode(metadata).unwrap(), b"json/plain");
    }

    #[test]
    fn execution_info_reads_summary() {
        let info = json!({
            "execution": { "workflowId": "order-1", "runId": "r1" },
            "type": { "name": "OrderWorkflow" },
            "startTime": "2024-01-01T00:00:00Z",
            "closeTime": "2024-01-01T00:05:00Z",
            "status": "WORKFLOW_EXECUTION_STATUS_FAILED",
            "taskQueue": "orders",
            "historyLength": "42"
        });
        let summary = decode_execution_info(&info).unwrap();
        assert_eq!(summary.status, "Failed");
        assert_eq!(summary.history_length, Some(42));
        assert!(summary.end_time.is_some());
    }
}
