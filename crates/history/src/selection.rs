//! One fetched history and the three projections drawn from it.
//!
//! Each projection owns its own cursor. Switching projections carries the
//! selected operation across: an event selects its owning node, a node
//! selects its lane, a lane selects its node, and a node selects its first
//! event.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::RawEvent;
use crate::list::EventListState;
use crate::outline::TreeState;
use crate::timeline::TimelineState;
use crate::tree::{NodeKey, NodePath, OperationNode, build_tree, node_at, path_of};

/// Immutable result of one fetch: the raw feed and the tree built from it.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    events: Vec<RawEvent>,
    roots: Vec<OperationNode>,
    owner: HashMap<i64, NodePath>,
}

impl HistorySnapshot {
    pub fn build(events: Vec<RawEvent>) -> Self {
        let roots = build_tree(&events);
        let mut owner = HashMap::with_capacity(events.len());
        for (ri, root) in roots.iter().enumerate() {
            for event in &root.events {
                owner.insert(event.id, NodePath::root(ri));
            }
            for (ci, child) in root.children.iter().enumerate() {
                for event in &child.events {
                    owner.insert(event.id, NodePath::child(ri, ci));
                }
            }
        }
        Self {
            events,
            roots,
            owner,
        }
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    pub fn roots(&self) -> &[OperationNode] {
        &self.roots
    }

    /// Node that consumed the event with `event_id`.
    pub fn owner_of(&self, event_id: i64) -> Option<NodePath> {
        self.owner.get(&event_id).copied()
    }

    pub fn node(&self, path: NodePath) -> Option<&OperationNode> {
        node_at(&self.roots, path)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    List,
    Tree,
    Timeline,
}

impl Projection {
    pub const ALL: [Projection; 3] = [Self::List, Self::Tree, Self::Timeline];

    pub fn next(self) -> Self {
        match self {
            Self::List => Self::Tree,
            Self::Tree => Self::Timeline,
            Self::Timeline => Self::List,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Tree => "Tree",
            Self::Timeline => "Timeline",
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy)]
enum Focus {
    Event(i64),
    Node(NodePath),
}

#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    snapshot: HistorySnapshot,
    projection: Projection,
    list: EventListState,
    tree: TreeState,
    timeline: TimelineState,
}

impl HistoryView {
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> &HistorySnapshot {
        &self.snapshot
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn list(&self) -> &EventListState {
        &self.list
    }

    pub fn tree(&self) -> &TreeState {
        &self.tree
    }

    pub fn timeline(&self) -> &TimelineState {
        &self.timeline
    }

    /// Installs a freshly fetched snapshot, discarding the previous tree.
    /// Each projection keeps its selection if the same event or operation
    /// exists in the new snapshot.
    pub fn replace_snapshot(
        &mut self,
        snapshot: HistorySnapshot,
        now: DateTime<Utc>,
        preserve_tree: bool,
    ) {
        let list_event = self.list.selected(self.snapshot.events()).map(|e| e.id);
        let lane_key = self
            .timeline
            .selected_lane()
            .and_then(|lane| self.snapshot.node(lane.node))
            .map(|node| node.key);

        self.snapshot = snapshot;
        let roots = self.snapshot.roots();

        self.list.set_len(self.snapshot.events().len());
        if let Some(id) = list_event {
            self.list.select_event(self.snapshot.events(), id);
        }

        self.tree.replace_nodes(roots, preserve_tree);

        self.timeline.set_nodes(roots, now);
        if let Some(path) = lane_key.and_then(|key| path_of(roots, key)) {
            self.timeline.select_node(path);
        }

        tracing::debug!(
            events = self.snapshot.events().len(),
            roots = roots.len(),
            lanes = self.timeline.lanes().len(),
            "history snapshot replaced"
        );
    }

    /// Switches projection, carrying the current selection over.
    pub fn set_projection(&mut self, projection: Projection) {
        if projection == self.projection {
            return;
        }
        let focus = self.focus();
        self.projection = projection;
        let Some(focus) = focus else {
            return;
        };
        let roots = self.snapshot.roots();
        match (projection, focus) {
            (Projection::List, Focus::Node(path)) => {
                let first = node_at(roots, path)
                    .and_then(|node| node.all_events().first().map(|e| e.id));
                if let Some(first) = first {
                    self.list.select_event(self.snapshot.events(), first);
                }
            }
            (Projection::List, Focus::Event(id)) => {
                self.list.select_event(self.snapshot.events(), id);
            }
            (Projection::Tree, focus) => {
                if let Some(path) = self.resolve(focus) {
                    self.tree.select_path(roots, path);
                }
            }
            (Projection::Timeline, focus) => {
                if let Some(path) = self.resolve(focus) {
                    self.timeline.select_node(path);
                }
            }
        }
    }

    pub fn cycle_projection(&mut self) {
        self.set_projection(self.projection.next());
    }

    fn focus(&self) -> Option<Focus> {
        match self.projection {
            Projection::List => self.list.selected(self.snapshot.events()).map(|e| Focus::Event(e.id)),
            Projection::Tree => self.tree.selected_path().map(Focus::Node),
            Projection::Timeline => self.timeline.selected_lane().map(|l| Focus::Node(l.node)),
        }
    }

    fn resolve(&self, focus: Focus) -> Option<NodePath> {
        match focus {
            Focus::Node(path) => Some(path),
            Focus::Event(id) => self.snapshot.owner_of(id),
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        match self.projection {
            Projection::List => self.list.move_selection(delta),
            Projection::Tree => self.tree.move_selection(delta),
            Projection::Timeline => self.timeline.move_selection(delta),
        }
    }

    /// Horizontal scroll; only the timeline scrolls sideways.
    pub fn scroll(&mut self, delta: isize) {
        if self.projection == Projection::Timeline {
            self.timeline.scroll(delta);
        }
    }

    /// Zoom; only the timeline zooms.
    pub fn zoom(&mut self, factor: f64) {
        if self.projection == Projection::Timeline {
            self.timeline.zoom(factor);
        }
    }

    pub fn reset_view(&mut self) {
        if self.projection == Projection::Timeline {
            self.timeline.reset_view();
        }
    }

    pub fn page(&mut self, down: bool) {
        if self.projection == Projection::List {
            if down {
                self.list.page_down();
            } else {
                self.list.page_up();
            }
        } else {
            let rows = match self.projection {
                Projection::Tree => self.tree.cursor().viewport(),
                _ => self.timeline.cursor().viewport(),
            };
            let rows = rows as isize;
            self.move_selection(if down { rows } else { -rows });
        }
    }

    pub fn set_viewport_rows(&mut self, projection: Projection, rows: usize) {
        match projection {
            Projection::List => self.list.set_viewport_rows(rows),
            Projection::Tree => self.tree.set_viewport_rows(rows),
            Projection::Timeline => self.timeline.set_viewport_rows(rows),
        }
    }

    pub fn toggle_selected(&mut self) -> bool {
        self.projection == Projection::Tree && self.tree.toggle_selected(self.snapshot.roots())
    }

    pub fn expand_all(&mut self) {
        self.tree.expand_all(self.snapshot.roots());
    }

    pub fn collapse_all(&mut self) {
        self.tree.collapse_all(self.snapshot.roots());
    }

    pub fn selected_path(&self) -> Option<NodePath> {
        match self.focus()? {
            Focus::Node(path) => Some(path),
            Focus::Event(id) => self.snapshot.owner_of(id),
        }
    }

    pub fn selected_node(&self) -> Option<&OperationNode> {
        self.selected_path().and_then(|path| self.snapshot.node(path))
    }

    pub fn selected_key(&self) -> Option<NodeKey> {
        self.selected_node().map(|node| node.key)
    }

    pub fn selected_event(&self) -> Option<&RawEvent> {
        match self.projection {
            Projection::List => self.list.selected(self.snapshot.events()),
            _ => self.selected_node().and_then(|n| n.all_events().into_iter().next()),
        }
    }

    /// Events the detail panel should show for the current selection.
    pub fn selected_events(&self) -> Vec<&RawEvent> {
        match self.projection {
            Projection::List => self.selected_event().into_iter().collect(),
            _ => self
                .selected_node()
                .map(OperationNode::all_events)
                .unwrap_or_default(),
        }
    }
}
