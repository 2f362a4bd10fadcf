//! Time-scaled projection of operation nodes.
//!
//! Structural nodes (the workflow itself and its workflow tasks) are left out;
//! every other root becomes one lane whose bar spans `[start, end-or-now)` on a
//! shared axis.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::classify::GroupKind;
use crate::cursor::Cursor;
use crate::tree::{NodePath, OperationNode};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_IN: f64 = 1.2;
pub const ZOOM_OUT: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineLane {
    pub name: String,
    pub kind: GroupKind,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub node: NodePath,
}

impl TimelineLane {
    fn from_node(node: &OperationNode, path: NodePath) -> Self {
        Self {
            name: node.name.clone(),
            kind: node.kind,
            status: node.status.clone(),
            start_time: node.start_time,
            end_time: node.end_time,
            node: path,
        }
    }

    pub fn end_or(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.end_time.unwrap_or(now).max(self.start_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Narrowest axis the projection will draw.
    pub fn min_width() -> Duration {
        Duration::minutes(1)
    }

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start + Self::min_width()),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Position of `t` on the axis as a fraction of the range (0 = start).
    pub fn fraction(&self, t: DateTime<Utc>) -> f64 {
        let total = self.duration().num_milliseconds().max(1) as f64;
        (t - self.start).num_milliseconds() as f64 / total
    }

    pub fn at_fraction(&self, fraction: f64) -> DateTime<Utc> {
        let total = self.duration().num_milliseconds() as f64;
        self.start + Duration::milliseconds((total * fraction).round() as i64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineProjection {
    pub lanes: Vec<TimelineLane>,
    /// `None` when there are no lanes.
    pub range: Option<TimeRange>,
}

/// Lays out every non-structural root on a shared axis.
///
/// The axis ends at the latest observed end; open lanes contribute `now`, but
/// never pull the end below their own start or below closed ends.
pub fn project_timeline(roots: &[OperationNode], now: DateTime<Utc>) -> TimelineProjection {
    let lanes: Vec<TimelineLane> = roots
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.kind.is_structural())
        .map(|(i, node)| TimelineLane::from_node(node, NodePath::root(i)))
        .collect();

    let start = lanes.iter().map(|l| l.start_time).min();
    let end = lanes.iter().map(|l| l.end_or(now)).max();
    let range = start.zip(end).map(|(start, end)| TimeRange::new(start, end));
    TimelineProjection { lanes, range }
}

/// Horizontal cell span of one bar, `[start, end)` within the bar area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarSpan {
    pub start: usize,
    pub end: usize,
}

impl BarSpan {
    pub fn width(&self) -> usize {
        self.end - self.start
    }
}

/// Maps a lane onto `width` cells at the given zoom and horizontal scroll.
///
/// Bars are at least one cell wide. Returns `None` when the bar lies entirely
/// outside the visible window.
pub fn bar_span(
    lane: &TimelineLane,
    range: &TimeRange,
    width: usize,
    zoom: f64,
    scroll_x: usize,
    now: DateTime<Utc>,
) -> Option<BarSpan> {
    if width == 0 {
        return None;
    }
    let cells = width as f64;
    let raw_start = (cells * range.fraction(lane.start_time)).floor() as i64;
    let mut raw_end = (cells * range.fraction(lane.end_or(now))).floor() as i64;
    if raw_end <= raw_start {
        raw_end = raw_start + 1;
    }

    let scroll = scroll_x as i64;
    let start = (raw_start as f64 * zoom).floor() as i64 - scroll;
    let mut end = (raw_end as f64 * zoom).floor() as i64 - scroll;
    if end <= start {
        end = start + 1;
    }

    let limit = width as i64;
    if end <= 0 || start >= limit {
        return None;
    }
    Some(BarSpan {
        start: start.clamp(0, limit) as usize,
        end: end.clamp(0, limit) as usize,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisTick {
    /// Cell offset inside the bar area.
    pub offset: usize,
    pub label: String,
}

/// Tick marks for the visible window, labelled at a precision that suits the
/// visible span: tenths of a second under a minute, seconds under an hour,
/// minutes beyond that.
pub fn axis_ticks(range: &TimeRange, width: usize, zoom: f64, scroll_x: usize) -> Vec<AxisTick> {
    if width == 0 {
        return Vec::new();
    }
    let count = if width < 60 { 3 } else { 5 };
    let zoom = zoom.max(f64::EPSILON);
    let span = Duration::milliseconds((range.duration().num_milliseconds() as f64 / zoom) as i64);
    let scaled = width as f64 * zoom;
    (0..=count)
        .map(|i| {
            let offset = width * i / count;
            let t = range.at_fraction((offset + scroll_x) as f64 / scaled);
            AxisTick {
                offset,
                label: tick_label(t, span),
            }
        })
        .collect()
}

fn tick_label(t: DateTime<Utc>, span: Duration) -> String {
    if span < Duration::minutes(1) {
        let tenths = t.timestamp_subsec_millis() / 100;
        format!("{}.{tenths}", t.format("%M:%S"))
    } else if span < Duration::hours(1) {
        t.format("%M:%S").to_string()
    } else {
        t.format("%H:%M").to_string()
    }
}

/// Presentation-neutral meaning of a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    InProgress,
    Good,
    Bad,
    Warning,
    Muted,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusStyle {
    pub glyph: char,
    pub tone: Tone,
}

const IN_PROGRESS: char = '▓';
const SOLID: char = '█';
const HATCHED: char = '░';
const LIGHT: char = '▒';

const STATUS_STYLES: &[(&str, StatusStyle)] = &[
    ("Running", StatusStyle { glyph: IN_PROGRESS, tone: Tone::InProgress }),
    ("Completed", StatusStyle { glyph: SOLID, tone: Tone::Good }),
    ("Fired", StatusStyle { glyph: SOLID, tone: Tone::Good }),
    ("Received", StatusStyle { glyph: SOLID, tone: Tone::Good }),
    ("Recorded", StatusStyle { glyph: SOLID, tone: Tone::Good }),
    ("ContinuedAsNew", StatusStyle { glyph: SOLID, tone: Tone::Neutral }),
    ("Failed", StatusStyle { glyph: HATCHED, tone: Tone::Bad }),
    ("TimedOut", StatusStyle { glyph: HATCHED, tone: Tone::Bad }),
    ("Canceled", StatusStyle { glyph: LIGHT, tone: Tone::Warning }),
    ("Terminated", StatusStyle { glyph: LIGHT, tone: Tone::Warning }),
    ("Scheduled", StatusStyle { glyph: LIGHT, tone: Tone::Muted }),
    ("Initiated", StatusStyle { glyph: LIGHT, tone: Tone::Muted }),
    ("Pending", StatusStyle { glyph: LIGHT, tone: Tone::Muted }),
    ("Unknown", StatusStyle { glyph: LIGHT, tone: Tone::Neutral }),
];

const DEFAULT_STYLE: StatusStyle = StatusStyle {
    glyph: LIGHT,
    tone: Tone::Neutral,
};

/// Statuses shown in the timeline legend, in display order.
pub const LEGEND: &[&str] = &["Running", "Completed", "Failed", "Canceled", "Scheduled"];

pub fn status_style(status: &str) -> StatusStyle {
    STATUS_STYLES
        .iter()
        .find(|(name, _)| *name == status)
        .map(|(_, style)| *style)
        .unwrap_or(DEFAULT_STYLE)
}

/// True for statuses that only appear on closed operations.
pub fn is_terminal_status(status: &str) -> bool {
    matches!(
        status,
        "Completed"
            | "Failed"
            | "TimedOut"
            | "Canceled"
            | "Terminated"
            | "ContinuedAsNew"
            | "Fired"
            | "Received"
            | "Recorded"
    )
}

pub fn is_failure_status(status: &str) -> bool {
    matches!(status, "Failed" | "TimedOut")
}

/// Interactive state of the timeline projection.
#[derive(Debug, Clone)]
pub struct TimelineState {
    projection: TimelineProjection,
    cursor: Cursor,
    scroll_x: usize,
    zoom: f64,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self {
            projection: TimelineProjection::default(),
            cursor: Cursor::default(),
            scroll_x: 0,
            zoom: 1.0,
        }
    }
}

impl TimelineState {
    /// Replaces the lanes. Selection returns to the first lane; zoom and
    /// horizontal scroll are kept.
    pub fn set_nodes(&mut self, roots: &[OperationNode], now: DateTime<Utc>) {
        self.projection = project_timeline(roots, now);
        self.cursor.set_len(self.projection.lanes.len());
        self.cursor.reset();
    }

    pub fn lanes(&self) -> &[TimelineLane] {
        &self.projection.lanes
    }

    pub fn range(&self) -> Option<&TimeRange> {
        self.projection.range.as_ref()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub fn scroll_x(&self) -> usize {
        self.scroll_x
    }

    pub fn move_selection(&mut self, delta: isize) {
        self.cursor.move_by(delta);
    }

    /// Horizontal scroll in cells, never below zero.
    pub fn scroll(&mut self, delta: isize) {
        self.scroll_x = self.scroll_x.saturating_add_signed(delta);
    }

    pub fn zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn reset_view(&mut self) {
        self.zoom = 1.0;
        self.scroll_x = 0;
        self.cursor.reset();
    }

    pub fn set_viewport_rows(&mut self, rows: usize) {
        self.cursor.set_viewport(rows);
    }

    pub fn selected_lane(&self) -> Option<&TimelineLane> {
        self.cursor
            .current()
            .and_then(|i| self.projection.lanes.get(i))
    }

    /// Selects the lane drawn from `path`. Returns false if no lane matches.
    pub fn select_node(&mut self, path: NodePath) -> bool {
        let root = NodePath::root(path.root);
        match self.projection.lanes.iter().position(|l| l.node == root) {
            Some(index) => {
                self.cursor.select(index);
                true
            }
            None => false,
        }
    }

    /// Lanes in the vertical window, paired with their absolute index.
    pub fn visible_lanes(&self) -> impl Iterator<Item = (usize, &TimelineLane)> {
        let range = self.cursor.visible_range();
        self.projection.lanes[range.clone()]
            .iter()
            .enumerate()
            .map(move |(i, lane)| (range.start + i, lane))
    }

    pub fn bar(&self, lane: &TimelineLane, width: usize, now: DateTime<Utc>) -> Option<BarSpan> {
        let range = self.projection.range.as_ref()?;
        bar_span(lane, range, width, self.zoom, self.scroll_x, now)
    }

    pub fn ticks(&self, width: usize) -> Vec<AxisTick> {
        self.projection
            .range
            .as_ref()
            .map(|range| axis_ticks(range, width, self.zoom, self.scroll_x))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::STATUS_VOCABULARY;
    use crate::testing::{at, ev, order_history, running_history};
    use crate::tree::build_tree;

    #[test]
    fn structural_nodes_are_excluded() {
        let roots = build_tree(&order_history());
        let projection = project_timeline(&roots, at(1_000));
        assert!(projection.lanes.iter().all(|l| !l.kind.is_structural()));
        let names: Vec<&str> = projection.lanes.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Activity: ChargeCard",
                "Timer: cooldown",
                "Signal Received",
                "ChildWorkflow: ShipOrder"
            ]
        );
    }

    #[test]
    fn closed_range_ignores_wall_clock() {
        let roots = build_tree(&order_history());
        let range = project_timeline(&roots, at(10_000)).range.unwrap();
        assert_eq!(range.start, at(2));
        assert_eq!(range.end, at(150));
    }

    #[test]
    fn open_lane_extends_range_to_now() {
        let roots = build_tree(&running_history());
        let range = project_timeline(&roots, at(400)).range.unwrap();
        assert_eq!(range.end, at(400));
    }

    #[test]
    fn range_has_minimum_width() {
        let roots = build_tree(&[ev(1, "MarkerRecorded", 5)]);
        let range = project_timeline(&roots, at(5)).range.unwrap();
        assert_eq!(range.duration(), Duration::minutes(1));
    }

    #[test]
    fn empty_projection_has_no_range() {
        let roots = build_tree(&[ev(1, "WorkflowExecutionStarted", 0)]);
        let projection = project_timeline(&roots, at(1));
        assert!(projection.lanes.is_empty());
        assert!(projection.range.is_none());
    }

    fn lane(start: i64, end: Option<i64>) -> TimelineLane {
        TimelineLane {
            name: "x".into(),
            kind: GroupKind::Activity,
            status: "Completed".into(),
            start_time: at(start),
            end_time: end.map(at),
            node: NodePath::root(0),
        }
    }

    #[test]
    fn bar_span_scales_to_width() {
        let range = TimeRange::new(at(0), at(100));
        let span = bar_span(&lane(25, Some(50)), &range, 100, 1.0, 0, at(100)).unwrap();
        assert_eq!(span, BarSpan { start: 25, end: 50 });
    }

    #[test]
    fn instant_bar_is_one_cell_wide() {
        let range = TimeRange::new(at(0), at(100));
        let span = bar_span(&lane(40, Some(40)), &range, 100, 1.0, 0, at(100)).unwrap();
        assert_eq!(span.width(), 1);
    }

    #[test]
    fn zoom_and_scroll_shift_bars_and_clip() {
        let range = TimeRange::new(at(0), at(100));
        let span = bar_span(&lane(25, Some(50)), &range, 100, 2.0, 30, at(100)).unwrap();
        assert_eq!(span, BarSpan { start: 20, end: 70 });
        assert!(bar_span(&lane(0, Some(10)), &range, 100, 1.0, 50, at(100)).is_none());
        let clipped = bar_span(&lane(60, Some(100)), &range, 100, 5.0, 0, at(100));
        assert!(clipped.is_none());
    }

    #[test]
    fn open_bar_runs_to_now() {
        let range = TimeRange::new(at(0), at(100));
        let span = bar_span(&lane(50, None), &range, 100, 1.0, 0, at(75)).unwrap();
        assert_eq!(span.end, 75);
    }

    #[test]
    fn tick_labels_follow_range_precision() {
        let short = TimeRange::new(at(0), at(60));
        assert_eq!(axis_ticks(&short, 40, 1.0, 0)[0].label, "00:00");
        let zoomed = axis_ticks(&short, 40, 2.0, 0);
        assert_eq!(zoomed.len(), 4);
        assert_eq!(zoomed[0].label, "00:00.0");
        let medium = TimeRange::new(at(0), at(600));
        assert_eq!(axis_ticks(&medium, 100, 1.0, 0)[5].label, "10:00");
        let long = TimeRange::new(at(0), at(7_200));
        let ticks = axis_ticks(&long, 100, 1.0, 0);
        assert_eq!(ticks.len(), 6);
        assert_eq!(ticks[5].label, "02:00");
    }

    #[test]
    fn status_table_covers_vocabulary() {
        for status in STATUS_VOCABULARY {
            assert!(
                STATUS_STYLES.iter().any(|(name, _)| name == status),
                "{status} has no style"
            );
        }
        assert_eq!(status_style("Running").glyph, '▓');
        assert_eq!(status_style("Fired").tone, Tone::Good);
        assert_eq!(status_style("TimedOut").glyph, '░');
        assert_eq!(status_style("Terminated").tone, Tone::Warning);
        assert_eq!(status_style("Pending").tone, Tone::Muted);
        assert_eq!(status_style("whatever"), DEFAULT_STYLE);
    }

    #[test]
    fn terminal_statuses_match_closing_tags() {
        assert!(is_terminal_status("Fired"));
        assert!(!is_terminal_status("Running"));
        assert!(!is_terminal_status("Scheduled"));
    }

    #[test]
    fn zoom_is_clamped_and_reset() {
        let mut state = TimelineState::default();
        for _ in 0..20 {
            state.zoom(ZOOM_IN);
        }
        assert_eq!(state.zoom_level(), MAX_ZOOM);
        for _ in 0..20 {
            state.zoom(ZOOM_OUT);
        }
        assert_eq!(state.zoom_level(), MIN_ZOOM);
        state.scroll(-5);
        assert_eq!(state.scroll_x(), 0);
        state.scroll(15);
        state.reset_view();
        assert_eq!((state.zoom_level(), state.scroll_x()), (1.0, 0));
    }

    #[test]
    fn selection_follows_viewport() {
        let events: Vec<_> = (1..=10)
            .map(|i| ev(i, "MarkerRecorded", i))
            .collect();
        let mut state = TimelineState::default();
        state.set_nodes(&build_tree(&events), at(20));
        state.set_viewport_rows(3);
        state.move_selection(4);
        let visible: Vec<usize> = state.visible_lanes().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![2, 3, 4]);
        assert_eq!(state.selected_lane().unwrap().start_time, at(5));
    }
}
