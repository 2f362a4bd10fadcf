//! Event-tag classification.
//!
//! Each history tag maps to a group kind, the role the event plays inside its
//! logical operation, a status label, and the correlation field that links it
//! back to the event that opened the operation. Rules are evaluated top to
//! bottom and the first match wins.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupKind {
    Workflow,
    WorkflowTask,
    Activity,
    Timer,
    ChildWorkflow,
    Signal,
    Marker,
    Other,
}

impl GroupKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Workflow => "Workflow",
            Self::WorkflowTask => "WorkflowTask",
            Self::Activity => "Activity",
            Self::Timer => "Timer",
            Self::ChildWorkflow => "ChildWorkflow",
            Self::Signal => "Signal",
            Self::Marker => "Marker",
            Self::Other => "Other",
        }
    }

    /// Structural kinds are hidden from the timeline.
    pub fn is_structural(self) -> bool {
        matches!(self, Self::Workflow | Self::WorkflowTask)
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The part an event plays in its logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Opens a new operation.
    Start,
    /// Updates an open operation without closing it.
    Continue,
    /// Closes an open operation.
    End,
    /// Opens and closes its own operation.
    Single,
}

/// Which back-reference links an event to the operation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Later events reference this event's own id.
    OwnId,
    ScheduledEventId,
    StartedEventId,
    InitiatedEventId,
    /// The execution itself; at most one Workflow node is open per history.
    Execution,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: GroupKind,
    pub role: Role,
    pub status: &'static str,
    pub correlation: Correlation,
}

impl Classification {
    const fn new(
        kind: GroupKind,
        role: Role,
        status: &'static str,
        correlation: Correlation,
    ) -> Self {
        Self {
            kind,
            role,
            status,
            correlation,
        }
    }

    pub fn is_group_start(&self) -> bool {
        matches!(self.role, Role::Start | Role::Single)
    }

    pub fn is_group_end(&self) -> bool {
        matches!(self.role, Role::End | Role::Single)
    }

    /// Classification given to events with no matching open group.
    pub const fn orphan() -> Self {
        Self::new(GroupKind::Other, Role::Single, STATUS_UNKNOWN, Correlation::None)
    }
}

pub const STATUS_UNKNOWN: &str = "Unknown";

/// Every status label the classifier and the tree builder can produce.
pub const STATUS_VOCABULARY: &[&str] = &[
    "Running",
    "Completed",
    "Failed",
    "TimedOut",
    "Canceled",
    "Terminated",
    "ContinuedAsNew",
    "Scheduled",
    "Initiated",
    "Fired",
    "Received",
    "Recorded",
    STATUS_UNKNOWN,
];

pub struct Rule {
    pub name: &'static str,
    matches: fn(&str) -> bool,
    classify: fn(&str) -> Classification,
}

impl Rule {
    pub fn matches(&self, event_type: &str) -> bool {
        (self.matches)(event_type)
    }

    pub fn apply(&self, event_type: &str) -> Classification {
        (self.classify)(event_type)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

const WORKFLOW_PREFIX: &str = "WorkflowExecution";
const WORKFLOW_STARTED: &str = "WorkflowExecutionStarted";
const WORKFLOW_SIGNALED: &str = "WorkflowExecutionSignaled";

/// Ordered classification rules. The final rule matches everything.
pub static RULES: &[Rule] = &[
    Rule {
        name: "workflow-started",
        matches: |t| t == WORKFLOW_STARTED,
        classify: |_| {
            Classification::new(
                GroupKind::Workflow,
                Role::Start,
                "Running",
                Correlation::Execution,
            )
        },
    },
    Rule {
        name: "workflow-end",
        matches: |t| t.starts_with(WORKFLOW_PREFIX) && t != WORKFLOW_STARTED && t != WORKFLOW_SIGNALED,
        classify: |t| {
            Classification::new(
                GroupKind::Workflow,
                Role::End,
                workflow_status(t),
                Correlation::Execution,
            )
        },
    },
    Rule {
        name: "activity-scheduled",
        matches: |t| t == "ActivityTaskScheduled",
        classify: |_| {
            Classification::new(
                GroupKind::Activity,
                Role::Start,
                "Scheduled",
                Correlation::OwnId,
            )
        },
    },
    Rule {
        name: "activity-started",
        matches: |t| t == "ActivityTaskStarted",
        classify: |_| {
            Classification::new(
                GroupKind::Activity,
                Role::Continue,
                "Running",
                Correlation::ScheduledEventId,
            )
        },
    },
    Rule {
        name: "activity-end",
        matches: |t| {
            matches!(
                t,
                "ActivityTaskCompleted"
                    | "ActivityTaskFailed"
                    | "ActivityTaskTimedOut"
                    | "ActivityTaskCanceled"
            )
        },
        classify: |t| {
            Classification::new(
                GroupKind::Activity,
                Role::End,
                suffix_status(t, "ActivityTask"),
                Correlation::ScheduledEventId,
            )
        },
    },
    Rule {
        name: "timer-started",
        matches: |t| t == "TimerStarted",
        classify: |_| {
            Classification::new(GroupKind::Timer, Role::Start, "Running", Correlation::OwnId)
        },
    },
    Rule {
        name: "timer-end",
        matches: |t| matches!(t, "TimerFired" | "TimerCanceled"),
        classify: |t| {
            let status = if t == "TimerFired" { "Fired" } else { "Canceled" };
            Classification::new(GroupKind::Timer, Role::End, status, Correlation::StartedEventId)
        },
    },
    Rule {
        name: "child-initiated",
        matches: |t| t == "StartChildWorkflowExecutionInitiated",
        classify: |_| {
            Classification::new(
                GroupKind::ChildWorkflow,
                Role::Start,
                "Initiated",
                Correlation::OwnId,
            )
        },
    },
    Rule {
        name: "child-started",
        matches: |t| t == "ChildWorkflowExecutionStarted",
        classify: |_| {
            Classification::new(
                GroupKind::ChildWorkflow,
                Role::Continue,
                "Running",
                Correlation::InitiatedEventId,
            )
        },
    },
    Rule {
        name: "child-end",
        matches: |t| {
            matches!(
                t,
                "ChildWorkflowExecutionCompleted"
                    | "ChildWorkflowExecutionFailed"
                    | "ChildWorkflowExecutionTimedOut"
                    | "ChildWorkflowExecutionCanceled"
                    | "ChildWorkflowExecutionTerminated"
            )
        },
        classify: |t| {
            Classification::new(
                GroupKind::ChildWorkflow,
                Role::End,
                suffix_status(t, "ChildWorkflowExecution"),
                Correlation::InitiatedEventId,
            )
        },
    },
    Rule {
        name: "workflow-task-scheduled",
        matches: |t| t == "WorkflowTaskScheduled",
        classify: |_| {
            Classification::new(
                GroupKind::WorkflowTask,
                Role::Start,
                "Scheduled",
                Correlation::OwnId,
            )
        },
    },
    Rule {
        name: "workflow-task-started",
        matches: |t| t == "WorkflowTaskStarted",
        classify: |_| {
            Classification::new(
                GroupKind::WorkflowTask,
                Role::Continue,
                "Running",
                Correlation::ScheduledEventId,
            )
        },
    },
    Rule {
        name: "workflow-task-end",
        matches: |t| {
            matches!(
                t,
                "WorkflowTaskCompleted" | "WorkflowTaskFailed" | "WorkflowTaskTimedOut"
            )
        },
        classify: |t| {
            Classification::new(
                GroupKind::WorkflowTask,
                Role::End,
                suffix_status(t, "WorkflowTask"),
                Correlation::ScheduledEventId,
            )
        },
    },
    Rule {
        name: "signal",
        matches: |t| t == WORKFLOW_SIGNALED,
        classify: |_| {
            Classification::new(GroupKind::Signal, Role::Single, "Received", Correlation::None)
        },
    },
    Rule {
        name: "marker",
        matches: |t| t == "MarkerRecorded",
        classify: |_| {
            Classification::new(GroupKind::Marker, Role::Single, "Recorded", Correlation::None)
        },
    },
    Rule {
        name: "other",
        matches: |_| true,
        classify: |_| Classification::orphan(),
    },
];

/// The rule that decides `event_type`.
pub fn matching_rule(event_type: &str) -> &'static Rule {
    RULES
        .iter()
        .find(|rule| rule.matches(event_type))
        .unwrap_or(&RULES[RULES.len() - 1])
}

pub fn classify(event_type: &str) -> Classification {
    matching_rule(event_type).apply(event_type)
}

/// Status for a workflow-level tag; non-terminal tags map to `Unknown`.
pub fn workflow_status(event_type: &str) -> &'static str {
    match event_type.strip_prefix(WORKFLOW_PREFIX) {
        Some("ContinuedAsNew") => "ContinuedAsNew",
        Some(suffix) => terminal_suffix(suffix),
        None => STATUS_UNKNOWN,
    }
}

fn suffix_status(event_type: &str, prefix: &str) -> &'static str {
    event_type
        .strip_prefix(prefix)
        .map(terminal_suffix)
        .unwrap_or(STATUS_UNKNOWN)
}

fn terminal_suffix(suffix: &str) -> &'static str {
    match suffix {
        "Completed" => "Completed",
        "Failed" => "Failed",
        "TimedOut" => "TimedOut",
        "Canceled" => "Canceled",
        "Terminated" => "Terminated",
        _ => STATUS_UNKNOWN,
    }
}
