use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyCode;
use tempo_client::MockProvider;
use tempo_client::mock::ORDER_WORKFLOW_ID;
use tempo_history::Projection;
use tempo_tui::app::{App, AppOptions, FlashLevel, View};
use tempo_tui::async_ops::{CommandContext, execute};
use tempo_tui::config::TimeoutConfig;
use tempo_tui::refresh::AutoRefresh;

struct Harness {
    rt: tokio::runtime::Runtime,
    ctx: CommandContext,
    app: App,
}

impl Harness {
    fn new() -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let ctx = CommandContext {
            provider: Arc::new(MockProvider::new()),
            namespace: "default".into(),
            timeouts: TimeoutConfig::default(),
        };
        let app = App::new(AppOptions {
            provider_name: "mock".into(),
            namespace: "default".into(),
            default_projection: Projection::List,
            preserve_tree: false,
            auto_refresh: AutoRefresh::new(Duration::from_secs(5), false),
        });
        Self { rt, ctx, app }
    }

    /// Runs queued commands to completion, including follow-up fetches.
    fn settle(&mut self) {
        for _ in 0..10 {
            let cmds = self.app.take_pending();
            if cmds.is_empty() {
                return;
            }
            for cmd in cmds {
                let result = self.rt.block_on(execute(&self.ctx, cmd));
                self.app.apply_command_result(result);
            }
        }
    }

    fn keys(&mut self, keys: &[KeyCode]) {
        for key in keys {
            self.app.handle_key(*key);
        }
    }

    fn type_text(&mut self, text: &str) {
        for c in text.chars() {
            self.app.handle_key(KeyCode::Char(c));
        }
    }

    fn open_order(&mut self) {
        self.app.refresh_list();
        self.settle();
        let index = self
            .app
            .workflows
            .iter()
            .position(|w| w.workflow_id == ORDER_WORKFLOW_ID)
            .unwrap();
        self.app.list_state.select(Some(index));
        self.keys(&[KeyCode::Enter]);
        self.settle();
    }

    fn signal_count(&self) -> usize {
        self.app
            .detail
            .as_ref()
            .unwrap()
            .history
            .snapshot()
            .events()
            .iter()
            .filter(|e| e.event_type == "WorkflowExecutionSignaled")
            .count()
    }
}

#[test]
fn browse_order_history_across_projections() {
    let mut h = Harness::new();
    h.open_order();

    assert_eq!(h.app.view, View::WorkflowDetail);
    let detail = h.app.detail.as_ref().unwrap();
    assert!(detail.loaded);
    assert!(detail.is_running());
    assert!(detail.error.is_none());

    h.keys(&[KeyCode::Char('2'), KeyCode::Char('E')]);
    let history = &h.app.detail.as_ref().unwrap().history;
    assert_eq!(history.projection(), Projection::Tree);
    assert!(history.tree().rows().len() > history.snapshot().roots().len());

    h.keys(&[KeyCode::Char('3')]);
    let history = &h.app.detail.as_ref().unwrap().history;
    assert!(history.timeline().lanes().iter().all(|l| !l.kind.is_structural()));
    assert!(!history.timeline().lanes().is_empty());

    h.keys(&[KeyCode::Esc]);
    assert_eq!(h.app.view, View::WorkflowList);
    assert!(h.app.detail.is_none());
}

#[test]
fn signal_round_trip_refetches_history() {
    let mut h = Harness::new();
    h.open_order();
    let before = h.signal_count();

    h.keys(&[KeyCode::Char('s')]);
    h.type_text("approve");
    h.keys(&[KeyCode::Enter]);
    h.settle();

    assert!(matches!(h.app.flash_message, Some((_, FlashLevel::Success))));
    assert_eq!(h.signal_count(), before + 1);
}

#[test]
fn terminate_closes_the_workflow() {
    let mut h = Harness::new();
    h.open_order();

    h.keys(&[KeyCode::Char('X'), KeyCode::Char('y')]);
    h.settle();

    let detail = h.app.detail.as_ref().unwrap();
    assert_eq!(detail.summary.as_ref().unwrap().status, "Terminated");
    assert_eq!(
        detail.history.snapshot().events().last().unwrap().event_type,
        "WorkflowExecutionTerminated"
    );

    // Commands on a closed workflow are refused before reaching the provider.
    h.keys(&[KeyCode::Char('c')]);
    assert!(h.app.modal.is_none());
    assert!(matches!(h.app.flash_message, Some((_, FlashLevel::Error))));
}

#[test]
fn list_search_filters_through_provider() {
    let mut h = Harness::new();
    h.app.refresh_list();
    h.settle();
    let all = h.app.workflows.len();

    h.keys(&[KeyCode::Char('/')]);
    h.type_text("Failed");
    h.keys(&[KeyCode::Enter]);
    h.settle();

    assert_eq!(h.app.query, "Failed");
    assert!(h.app.workflows.len() < all);
    assert!(h.app.workflows.iter().all(|w| w.status == "Failed"));
}

#[test]
fn delete_removes_workflow_from_list() {
    let mut h = Harness::new();
    h.open_order();

    h.keys(&[KeyCode::Char('D'), KeyCode::Enter]);
    h.settle();

    assert_eq!(h.app.view, View::WorkflowList);
    assert!(h.app.detail.is_none());
    assert!(!h.app.workflows.is_empty());
    assert!(h.app.workflows.iter().all(|w| w.workflow_id != ORDER_WORKFLOW_ID));
}
