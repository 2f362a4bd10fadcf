//! Reconstruction of logical operations from a flat history log.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::classify::{self, Classification, Correlation, GroupKind, Role};
use crate::event::RawEvent;

/// Identity of an operation: the id of the event that opened it.
///
/// Event ids are stable across fetches of the same execution, so keys survive
/// a rebuild even though nodes do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey(pub i64);

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Address of a node inside a root list: a root, optionally one of its
/// attempt children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodePath {
    pub root: usize,
    pub child: Option<usize>,
}

impl NodePath {
    pub fn root(root: usize) -> Self {
        Self { root, child: None }
    }

    pub fn child(root: usize, child: usize) -> Self {
        Self {
            root,
            child: Some(child),
        }
    }

    pub fn depth(&self) -> usize {
        usize::from(self.child.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationNode {
    pub key: NodeKey,
    pub name: String,
    pub kind: GroupKind,
    pub status: String,
    pub start_time: DateTime<Utc>,
    /// `None` while the operation is still open.
    pub end_time: Option<DateTime<Utc>>,
    /// Retries beyond the first try.
    pub attempt_count: u32,
    pub events: Vec<RawEvent>,
    pub children: Vec<OperationNode>,
}

impl OperationNode {
    fn open(key: NodeKey, name: String, class: Classification, event: &RawEvent) -> Self {
        Self {
            key,
            name,
            kind: class.kind,
            status: class.status.to_string(),
            start_time: event.timestamp,
            end_time: None,
            attempt_count: 0,
            events: vec![event.clone()],
            children: Vec::new(),
        }
    }

    fn close(&mut self, status: &str, at: DateTime<Utc>) {
        self.status = status.to_string();
        self.end_time = Some(at);
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Elapsed time of a closed operation. Open operations have no duration.
    pub fn duration(&self) -> Option<Duration> {
        self.end_time
            .map(|end| (end - self.start_time).max(Duration::zero()))
    }

    /// Elapsed time measured against `now` for operations that are still open.
    pub fn live_duration(&self, now: DateTime<Utc>) -> Duration {
        (self.end_time.unwrap_or(now) - self.start_time).max(Duration::zero())
    }

    /// End of the operation, or `now` when it is still open.
    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end_time.unwrap_or(now).max(self.start_time)
    }

    /// Own events plus those of attempt children, in id order.
    pub fn all_events(&self) -> Vec<&RawEvent> {
        let mut events: Vec<&RawEvent> = self
            .events
            .iter()
            .chain(self.children.iter().flat_map(|c| c.events.iter()))
            .collect();
        events.sort_by_key(|e| e.id);
        events
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    fn open_attempt_mut(&mut self) -> Option<&mut OperationNode> {
        self.children.last_mut().filter(|child| child.is_open())
    }
}

pub fn node_at(roots: &[OperationNode], path: NodePath) -> Option<&OperationNode> {
    let root = roots.get(path.root)?;
    match path.child {
        Some(child) => root.children.get(child),
        None => Some(root),
    }
}

/// Finds the path of the node with `key`, searching roots then attempts.
pub fn path_of(roots: &[OperationNode], key: NodeKey) -> Option<NodePath> {
    roots.iter().enumerate().find_map(|(ri, root)| {
        if root.key == key {
            return Some(NodePath::root(ri));
        }
        root.children
            .iter()
            .position(|child| child.key == key)
            .map(|ci| NodePath::child(ri, ci))
    })
}

/// Rebuilds the operation roots from an ordered event slice.
///
/// Total over any input: unknown tags and dangling references become
/// standalone `Other` nodes. Events whose id was already consumed (as happens
/// when fetched pages overlap) are skipped.
pub fn build_tree(events: &[RawEvent]) -> Vec<OperationNode> {
    let mut builder = TreeBuilder::default();
    for event in events {
        builder.push(event);
    }
    let roots = builder.finish();
    tracing::debug!(events = events.len(), roots = roots.len(), "rebuilt operation tree");
    roots
}

/// Scoped state for one build pass.
#[derive(Default)]
struct TreeBuilder {
    roots: Vec<OperationNode>,
    activities: HashMap<i64, usize>,
    timers: HashMap<i64, usize>,
    child_workflows: HashMap<i64, usize>,
    workflow_tasks: HashMap<i64, usize>,
    execution: Option<usize>,
    processed: HashSet<i64>,
}

impl TreeBuilder {
    fn push(&mut self, event: &RawEvent) {
        if !self.processed.insert(event.id) {
            tracing::debug!(event_id = event.id, "skipping duplicate history event");
            return;
        }

        let class = classify::classify(&event.event_type);
        match class.role {
            Role::Start => self.start(event, class),
            Role::Single => self.single(event, class),
            Role::Continue | Role::End => {
                if !self.correlate(event, class) {
                    self.orphan(event);
                }
            }
        }
    }

    fn start(&mut self, event: &RawEvent, class: Classification) {
        let index = self.roots.len();
        self.roots.push(OperationNode::open(
            NodeKey(event.id),
            display_name(event, class.kind),
            class,
            event,
        ));
        match class.kind {
            GroupKind::Workflow => self.execution = Some(index),
            GroupKind::Activity => {
                self.activities.insert(event.id, index);
            }
            GroupKind::Timer => {
                self.timers.insert(event.id, index);
            }
            GroupKind::ChildWorkflow => {
                self.child_workflows.insert(event.id, index);
            }
            GroupKind::WorkflowTask => {
                self.workflow_tasks.insert(event.id, index);
            }
            GroupKind::Signal | GroupKind::Marker | GroupKind::Other => {}
        }
    }

    fn single(&mut self, event: &RawEvent, class: Classification) {
        let mut node = OperationNode::open(
            NodeKey(event.id),
            display_name(event, class.kind),
            class,
            event,
        );
        node.end_time = Some(event.timestamp);
        self.roots.push(node);
    }

    fn orphan(&mut self, event: &RawEvent) {
        tracing::debug!(
            event_id = event.id,
            event_type = %event.event_type,
            "no open operation for event"
        );
        self.single(event, Classification::orphan());
    }

    /// Attaches a continuation or end event to its open group. Returns false
    /// when no group matches.
    fn correlate(&mut self, event: &RawEvent, class: Classification) -> bool {
        let map = match class.kind {
            GroupKind::Activity => &mut self.activities,
            GroupKind::Timer => &mut self.timers,
            GroupKind::ChildWorkflow => &mut self.child_workflows,
            GroupKind::WorkflowTask => &mut self.workflow_tasks,
            GroupKind::Workflow => return self.correlate_execution(event, class),
            GroupKind::Signal | GroupKind::Marker | GroupKind::Other => return false,
        };
        let reference = match class.correlation {
            Correlation::ScheduledEventId => event.scheduled_event_id,
            Correlation::StartedEventId => event.started_event_id,
            Correlation::InitiatedEventId => event.initiated_event_id,
            Correlation::OwnId | Correlation::Execution | Correlation::None => None,
        };
        let Some(reference) = reference else {
            return false;
        };
        let index = if class.role == Role::End {
            map.remove(&reference)
        } else {
            map.get(&reference).copied()
        };
        let Some(node) = index.and_then(|i| self.roots.get_mut(i)) else {
            return false;
        };

        match class.role {
            Role::Continue => continue_group(node, event, class),
            _ => end_group(node, event, class),
        }
        true
    }

    fn correlate_execution(&mut self, event: &RawEvent, class: Classification) -> bool {
        let Some(node) = self.execution.and_then(|i| self.roots.get_mut(i)) else {
            return false;
        };
        node.events.push(event.clone());
        if class.status != classify::STATUS_UNKNOWN {
            node.close(class.status, event.timestamp);
            self.execution = None;
        }
        true
    }

    fn finish(self) -> Vec<OperationNode> {
        self.roots
    }
}

/// Status of an attempt closed by the start of the next one.
const SUPERSEDED_ATTEMPT: &str = "Failed";

fn continue_group(node: &mut OperationNode, event: &RawEvent, class: Classification) {
    node.status = class.status.to_string();
    let attempt = event.attempt_or_first();
    if class.kind == GroupKind::Activity && attempt > 1 {
        node.attempt_count = node.attempt_count.max(attempt - 1);
        // A newer attempt supersedes one that never reported an outcome.
        if let Some(previous) = node.open_attempt_mut() {
            previous.close(SUPERSEDED_ATTEMPT, event.timestamp);
        }
        node.children.push(OperationNode {
            key: NodeKey(event.id),
            name: format!("Attempt {attempt}"),
            kind: class.kind,
            status: class.status.to_string(),
            start_time: event.timestamp,
            end_time: None,
            attempt_count: 0,
            events: vec![event.clone()],
            children: Vec::new(),
        });
    } else {
        node.events.push(event.clone());
    }
}

fn end_group(node: &mut OperationNode, event: &RawEvent, class: Classification) {
    match node.open_attempt_mut() {
        Some(attempt) => {
            attempt.events.push(event.clone());
            attempt.close(class.status, event.timestamp);
        }
        None => node.events.push(event.clone()),
    }
    node.close(class.status, event.timestamp);
}

fn display_name(event: &RawEvent, kind: GroupKind) -> String {
    match kind {
        GroupKind::Workflow => "Workflow Started".to_string(),
        GroupKind::WorkflowTask => "WorkflowTask".to_string(),
        GroupKind::Activity => match event.activity_type.as_deref() {
            Some(name) if !name.is_empty() => format!("Activity: {name}"),
            _ => "Activity".to_string(),
        },
        GroupKind::Timer => match event.timer_id.as_deref() {
            Some(id) if !id.is_empty() => format!("Timer: {id}"),
            _ => format!("Timer: {}", event.id),
        },
        GroupKind::ChildWorkflow => match event.child_workflow_type.as_deref() {
            Some(name) if !name.is_empty() => format!("ChildWorkflow: {name}"),
            _ => "ChildWorkflow".to_string(),
        },
        GroupKind::Signal => "Signal Received".to_string(),
        GroupKind::Marker => "Marker".to_string(),
        GroupKind::Other => event.event_type.clone(),
    }
}
