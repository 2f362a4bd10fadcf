use std::collections::HashSet;

use chrono::Duration;
use proptest::prelude::*;
use tempo_history::testing::{at, ev};
use tempo_history::{GroupKind, RawEvent, build_tree, project_timeline};

fn contributing_ids(roots: &[tempo_history::OperationNode]) -> Vec<i64> {
    let mut ids: Vec<i64> = roots
        .iter()
        .flat_map(|root| root.all_events())
        .map(|e| e.id)
        .collect();
    ids.sort_unstable();
    ids
}

#[test]
fn single_activity_chain() {
    let roots = build_tree(&[
        ev(5, "ActivityTaskScheduled", 0),
        ev(6, "ActivityTaskStarted", 1).with_scheduled(5).with_attempt(1),
        ev(7, "ActivityTaskCompleted", 2).with_scheduled(5),
    ]);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].kind, GroupKind::Activity);
    assert_eq!(roots[0].status, "Completed");
    let ids: Vec<i64> = roots[0].events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![5, 6, 7]);
    assert!(roots[0].children.is_empty());
}

#[test]
fn rescheduled_retry_yields_two_roots() {
    let roots = build_tree(&[
        ev(5, "ActivityTaskScheduled", 0),
        ev(6, "ActivityTaskStarted", 1).with_scheduled(5).with_attempt(1),
        ev(7, "ActivityTaskFailed", 2).with_scheduled(5),
        ev(8, "ActivityTaskScheduled", 3),
        ev(9, "ActivityTaskStarted", 4).with_scheduled(8).with_attempt(2),
        ev(10, "ActivityTaskCompleted", 5).with_scheduled(8),
    ]);
    let activities: Vec<_> = roots
        .iter()
        .filter(|r| r.kind == GroupKind::Activity)
        .collect();
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].status, "Failed");
    assert_eq!(activities[1].status, "Completed");
    assert_eq!(activities[1].attempt_count, 1);
}

#[test]
fn dangling_terminal_becomes_other() {
    let roots = build_tree(&[ev(9, "ActivityTaskCompleted", 0).with_scheduled(99)]);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].kind, GroupKind::Other);
    assert_eq!(roots[0].status, "Unknown");
    assert_eq!(roots[0].events[0].id, 9);
}

#[test]
fn range_end_never_precedes_closed_ends() {
    let events = vec![
        ev(1, "TimerStarted", 0).with_timer_id("long"),
        ev(2, "ActivityTaskScheduled", 120),
        ev(3, "TimerFired", 300).with_started(1),
    ];
    let roots = build_tree(&events);

    // "now" earlier than the closed end, as with a skewed fixture clock
    let skewed = project_timeline(&roots, at(200)).range.unwrap();
    assert_eq!(skewed.start, at(0));
    assert_eq!(skewed.end, at(300));

    let live = project_timeline(&roots, at(420)).range.unwrap();
    assert_eq!(live.end, at(420));
}

#[test]
fn live_duration_is_monotone_without_rebuild() {
    let roots = build_tree(&[ev(1, "ActivityTaskScheduled", 0)]);
    let node = &roots[0];
    assert!(node.end_time.is_none());
    assert!(node.duration().is_none());
    let mut last = Duration::zero();
    for secs in [1, 5, 5, 60, 3_600] {
        let d = node.live_duration(at(secs));
        assert!(d >= last);
        last = d;
    }
}

const TAGS: &[&str] = &[
    "WorkflowExecutionStarted",
    "WorkflowExecutionCompleted",
    "WorkflowExecutionSignaled",
    "WorkflowTaskScheduled",
    "WorkflowTaskStarted",
    "WorkflowTaskCompleted",
    "ActivityTaskScheduled",
    "ActivityTaskStarted",
    "ActivityTaskFailed",
    "ActivityTaskCompleted",
    "TimerStarted",
    "TimerFired",
    "StartChildWorkflowExecutionInitiated",
    "ChildWorkflowExecutionStarted",
    "ChildWorkflowExecutionCompleted",
    "MarkerRecorded",
    "UpsertWorkflowSearchAttributes",
];

fn arb_history() -> impl Strategy<Value = Vec<RawEvent>> {
    prop::collection::vec(
        (
            0..TAGS.len(),
            prop::option::of(1i64..40),
            prop::option::of(1u32..4),
        ),
        0..40,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (tag, reference, attempt))| {
                let id = i as i64 + 1;
                let mut event = ev(id, TAGS[tag], id);
                event.scheduled_event_id = reference;
                event.started_event_id = reference;
                event.initiated_event_id = reference;
                event.attempt = attempt;
                event
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn every_event_lands_in_exactly_one_node(events in arb_history()) {
        let roots = build_tree(&events);
        let expected: Vec<i64> = events.iter().map(|e| e.id).collect();
        prop_assert_eq!(contributing_ids(&roots), expected);
        let unique: HashSet<i64> = contributing_ids(&roots).into_iter().collect();
        prop_assert_eq!(unique.len(), events.len());
    }

    #[test]
    fn rebuild_is_a_pure_function(events in arb_history()) {
        prop_assert_eq!(build_tree(&events), build_tree(&events));
    }

    #[test]
    fn closed_nodes_never_have_negative_duration(events in arb_history()) {
        for root in build_tree(&events) {
            if let Some(d) = root.duration() {
                prop_assert!(d >= Duration::zero());
            }
        }
    }
}
