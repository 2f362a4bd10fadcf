use std::time::Instant;

use chrono::Utc;
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use serde_json::Value;
use tempo_client::{ExecutionRef, WorkflowSummary};
use tempo_history::cursor::Cursor;
use tempo_history::details::{DetailLine, pretty_details};
use tempo_history::reset::{ResetPoint, first_failure_point, reset_points};
use tempo_history::timeline::{ZOOM_IN, ZOOM_OUT};
use tempo_history::{HistorySnapshot, HistoryView, Projection, RawEvent};
use tracing::{debug, info, warn};

use crate::async_ops::{AsyncCommand, CommandResult, Mutation};
use crate::clipboard;
use crate::refresh::{AutoRefresh, RefreshGate};
use crate::views::modal::{ConfirmAction, InputAction, InputField, Modal};

const OPERATOR_REASON: &str = "requested from tempo";
const DEFAULT_QUERY: &str = "__stack_trace";
/// Cells per horizontal timeline scroll step.
const SCROLL_STEP: isize = 4;

/// Which screen the user is viewing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    WorkflowList,
    WorkflowDetail,
    Help,
}

/// Flash message severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// Startup settings resolved from config and flags.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub provider_name: String,
    pub namespace: String,
    pub default_projection: Projection,
    pub preserve_tree: bool,
    pub auto_refresh: AutoRefresh,
}

/// One open execution.
pub struct WorkflowDetail {
    pub execution: ExecutionRef,
    pub summary: Option<WorkflowSummary>,
    pub history: HistoryView,
    pub loading: bool,
    /// At least one history fetch has succeeded.
    pub loaded: bool,
    /// Last history fetch failure, shown inline until the next success.
    pub error: Option<String>,
    /// Last describe failure. Kept apart so it never masks loaded history.
    pub summary_error: Option<String>,
}

impl WorkflowDetail {
    fn new(execution: ExecutionRef, summary: Option<WorkflowSummary>, projection: Projection) -> Self {
        Self {
            execution,
            summary,
            history: HistoryView::new(projection),
            loading: false,
            loaded: false,
            error: None,
            summary_error: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.summary.as_ref().is_some_and(WorkflowSummary::is_running)
    }

    pub fn is_empty(&self) -> bool {
        self.loaded && self.history.snapshot().is_empty()
    }
}

pub struct App {
    pub view: View,
    help_return: View,
    pub provider_name: String,
    pub namespace: String,

    // Workflow list state
    pub workflows: Vec<WorkflowSummary>,
    pub list_state: ListState,
    pub query: String,
    pub searching: bool,
    pub search_buffer: String,
    pub list_loading: bool,
    pub list_error: Option<String>,

    pub detail: Option<WorkflowDetail>,

    pub modal: Option<Modal>,
    pub flash_message: Option<(String, FlashLevel)>,
    pub auto_refresh: AutoRefresh,
    /// Where `y` sends text. Swapped out in tests.
    pub clipboard: fn(&str) -> anyhow::Result<()>,

    pending: Vec<AsyncCommand>,
    list_gate: RefreshGate,
    detail_gate: RefreshGate,
    default_projection: Projection,
    preserve_tree: bool,
}

impl App {
    pub fn new(options: AppOptions) -> Self {
        Self {
            view: View::WorkflowList,
            help_return: View::WorkflowList,
            provider_name: options.provider_name,
            namespace: options.namespace,
            workflows: Vec::new(),
            list_state: ListState::default(),
            query: String::new(),
            searching: false,
            search_buffer: String::new(),
            list_loading: false,
            list_error: None,
            detail: None,
            modal: None,
            flash_message: None,
            auto_refresh: options.auto_refresh,
            clipboard: clipboard::copy,
            pending: Vec::new(),
            list_gate: RefreshGate::default(),
            detail_gate: RefreshGate::default(),
            default_projection: options.default_projection,
            preserve_tree: options.preserve_tree,
        }
    }

    /// Commands queued since the last call, for the loop to spawn.
    pub fn take_pending(&mut self) -> Vec<AsyncCommand> {
        std::mem::take(&mut self.pending)
    }

    pub fn selected_workflow(&self) -> Option<&WorkflowSummary> {
        self.list_state.selected().and_then(|i| self.workflows.get(i))
    }

    /// The screen under the help overlay.
    pub fn base_view(&self) -> View {
        if self.view == View::Help {
            self.help_return
        } else {
            self.view
        }
    }

    // ── Fetching ──────────────────────────────────────────────────────

    /// Refetches whatever the current screen shows.
    pub fn refresh(&mut self) {
        match self.base_view() {
            View::WorkflowDetail if self.detail.is_some() => self.refresh_detail(),
            _ => self.refresh_list(),
        }
    }

    pub fn refresh_list(&mut self) {
        let generation = self.list_gate.begin();
        self.list_loading = true;
        self.auto_refresh.mark(Instant::now());
        self.pending.push(AsyncCommand::ListWorkflows {
            generation,
            query: self.query.clone(),
        });
    }

    fn refresh_detail(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let generation = self.detail_gate.begin();
        detail.loading = true;
        self.auto_refresh.mark(Instant::now());
        self.pending.push(AsyncCommand::Describe {
            generation,
            execution: detail.execution.clone(),
        });
        self.pending.push(AsyncCommand::FetchHistory {
            generation,
            execution: detail.execution.clone(),
        });
    }

    pub fn open_workflow(&mut self, execution: ExecutionRef) {
        let summary = self
            .workflows
            .iter()
            .find(|w| w.workflow_id == execution.workflow_id && execution.run_id.as_deref().is_none_or(|r| r == w.run_id))
            .cloned();
        self.detail_gate.invalidate();
        self.detail = Some(WorkflowDetail::new(execution, summary, self.default_projection));
        self.view = View::WorkflowDetail;
        self.refresh_detail();
    }

    fn close_detail(&mut self) {
        self.detail_gate.invalidate();
        self.detail = None;
        self.view = View::WorkflowList;
        self.refresh_list();
    }

    /// Called by the render loop on every tick.
    pub fn tick(&mut self, now: Instant) {
        if self.modal.is_none() && self.auto_refresh.poll(now) {
            debug!("auto refresh");
            self.refresh();
        }
    }

    pub fn toggle_auto_refresh(&mut self) {
        if self.auto_refresh.toggle(Instant::now()) {
            self.flash_info(format!(
                "Auto refresh every {}s",
                self.auto_refresh.interval().as_secs()
            ));
        } else {
            self.flash_info("Auto refresh off");
        }
    }

    // ── Keys ──────────────────────────────────────────────────────────

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        // Clear flash message on any key press
        self.flash_message = None;

        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }

        if self.searching {
            self.handle_search_key(key);
            return false;
        }

        if key == KeyCode::Char('?') {
            if self.view == View::Help {
                self.view = self.help_return;
            } else {
                self.help_return = self.view;
                self.view = View::Help;
            }
            return false;
        }

        match self.view {
            View::WorkflowList => self.handle_list_key(key),
            View::WorkflowDetail => {
                self.handle_detail_key(key);
                false
            }
            View::Help => {
                // Any key exits help
                self.view = self.help_return;
                false
            }
        }
    }

    fn handle_list_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('j') | KeyCode::Down => self.move_list(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_list(-1),
            KeyCode::PageDown => self.move_list(10),
            KeyCode::PageUp => self.move_list(-10),
            KeyCode::Char('g') | KeyCode::Home => self.move_list(isize::MIN),
            KeyCode::Char('G') | KeyCode::End => self.move_list(isize::MAX),
            KeyCode::Enter => {
                if let Some(execution) = self.selected_workflow().map(WorkflowSummary::execution) {
                    self.open_workflow(execution);
                }
            }
            KeyCode::Char('/') => {
                self.searching = true;
                self.search_buffer = self.query.clone();
            }
            KeyCode::Char('r') => self.refresh_list(),
            KeyCode::Char('a') => self.toggle_auto_refresh(),
            _ => {}
        }
        false
    }

    fn move_list(&mut self, delta: isize) {
        if self.workflows.is_empty() {
            self.list_state.select(None);
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        let next = current
            .saturating_add_signed(delta)
            .min(self.workflows.len() - 1);
        self.list_state.select(Some(next));
    }

    fn handle_search_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.searching = false;
                self.search_buffer.clear();
            }
            KeyCode::Enter => {
                self.searching = false;
                self.query = std::mem::take(&mut self.search_buffer).trim().to_string();
                self.refresh_list();
            }
            KeyCode::Backspace => {
                self.search_buffer.pop();
            }
            KeyCode::Char(c) => self.search_buffer.push(c),
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => {
                self.close_detail();
                return;
            }
            KeyCode::Char('r') => {
                self.refresh_detail();
                return;
            }
            KeyCode::Char('a') => {
                self.toggle_auto_refresh();
                return;
            }
            KeyCode::Char('s') => return self.start_signal(),
            KeyCode::Char('c') => return self.start_cancel(),
            KeyCode::Char('X') => return self.start_terminate(),
            KeyCode::Char('D') => return self.start_delete(),
            KeyCode::Char('d') => return self.show_event_detail(),
            KeyCode::Char('y') => return self.yank_selected(),
            KeyCode::Char('R') => return self.start_reset(),
            KeyCode::Char('Q') => return self.start_query(),
            _ => {}
        }

        let Some(history) = self.detail.as_mut().map(|d| &mut d.history) else {
            return;
        };
        match key {
            KeyCode::Char('v') | KeyCode::Tab => history.cycle_projection(),
            KeyCode::Char('1') => history.set_projection(Projection::List),
            KeyCode::Char('2') => history.set_projection(Projection::Tree),
            KeyCode::Char('3') => history.set_projection(Projection::Timeline),
            KeyCode::Char('j') | KeyCode::Down => history.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => history.move_selection(-1),
            KeyCode::PageDown => history.page(true),
            KeyCode::PageUp => history.page(false),
            KeyCode::Char('g') | KeyCode::Home => history.move_selection(isize::MIN / 2),
            KeyCode::Char('G') | KeyCode::End => history.move_selection(isize::MAX / 2),
            KeyCode::Char('h') | KeyCode::Left => history.scroll(-SCROLL_STEP),
            KeyCode::Char('l') | KeyCode::Right => history.scroll(SCROLL_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => history.zoom(ZOOM_IN),
            KeyCode::Char('-') => history.zoom(ZOOM_OUT),
            KeyCode::Char('0') => history.reset_view(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                history.toggle_selected();
            }
            KeyCode::Char('E') => history.expand_all(),
            KeyCode::Char('C') => history.collapse_all(),
            _ => {}
        }
    }

    // ── Operator actions ──────────────────────────────────────────────

    /// The open execution, if it is running. Flashes why not otherwise.
    fn running_execution(&mut self, what: &str) -> Option<ExecutionRef> {
        let detail = self.detail.as_ref()?;
        if detail.is_running() {
            return Some(detail.execution.clone());
        }
        let status = detail
            .summary
            .as_ref()
            .map_or("not loaded", |s| s.status.as_str())
            .to_string();
        self.flash_error(format!("Cannot {what}: workflow is {status}"));
        None
    }

    fn start_signal(&mut self) {
        let Some(execution) = self.running_execution("signal") else {
            return;
        };
        self.modal = Some(Modal::Input {
            title: "Signal workflow".into(),
            fields: vec![
                InputField::new("Signal name", ""),
                InputField::new("Input JSON (optional)", ""),
            ],
            focus: 0,
            action: InputAction::Signal(execution),
        });
    }

    fn start_cancel(&mut self) {
        let Some(execution) = self.running_execution("cancel") else {
            return;
        };
        self.modal = Some(Modal::Confirm {
            title: "Cancel workflow".into(),
            message: format!("Request cancellation of {execution}?"),
            action: ConfirmAction::Cancel(execution),
        });
    }

    fn start_terminate(&mut self) {
        let Some(execution) = self.running_execution("terminate") else {
            return;
        };
        self.modal = Some(Modal::Confirm {
            title: "Terminate workflow".into(),
            message: format!("Terminate {execution}? No cleanup code will run."),
            action: ConfirmAction::Terminate(execution),
        });
    }

    fn start_delete(&mut self) {
        let Some(execution) = self.detail.as_ref().map(|d| d.execution.clone()) else {
            return;
        };
        self.modal = Some(Modal::Confirm {
            title: "Delete workflow".into(),
            message: format!("Permanently delete {execution} and its history? This cannot be undone."),
            action: ConfirmAction::Delete(execution),
        });
    }

    fn selected_event_lines(&self) -> Option<(String, Vec<DetailLine>)> {
        let history = &self.detail.as_ref()?.history;
        let events = history.selected_events();
        let first = events.first()?;
        let title = match history.projection() {
            Projection::List => format!("Event #{} {}", first.id, first.event_type),
            _ => history
                .selected_node()
                .map_or_else(|| first.event_type.clone(), |node| node.name.clone()),
        };
        Some((title, event_detail_lines(&events)))
    }

    fn show_event_detail(&mut self) {
        match self.selected_event_lines() {
            Some((title, lines)) => {
                self.modal = Some(Modal::EventDetail {
                    title,
                    lines,
                    scroll: 0,
                })
            }
            None => self.flash_info("No event selected"),
        }
    }

    fn yank_selected(&mut self) {
        match self.selected_event_lines() {
            Some((_, lines)) => self.copy_lines(&lines),
            None => self.flash_info("No event selected"),
        }
    }

    fn copy_lines(&mut self, lines: &[DetailLine]) {
        let text = plain_text(lines);
        match (self.clipboard)(&text) {
            Ok(()) => self.flash_success("Event details copied to clipboard"),
            Err(e) => {
                warn!("clipboard copy failed: {e:#}");
                self.flash_error(format!("Copy failed: {e}"));
            }
        }
    }

    fn start_query(&mut self) {
        let Some(execution) = self.running_execution("query") else {
            return;
        };
        self.modal = Some(Modal::Input {
            title: "Query workflow".into(),
            fields: vec![
                InputField::new("Query type", DEFAULT_QUERY),
                InputField::new("Arguments JSON (optional)", ""),
            ],
            focus: 0,
            action: InputAction::Query(execution),
        });
    }

    fn start_reset(&mut self) {
        let Some(detail) = self.detail.as_ref() else {
            return;
        };
        let points = reset_points(detail.history.snapshot().events());
        if points.is_empty() {
            self.flash_error("No completed workflow task to reset to");
            return;
        }
        let execution = detail.execution.clone();
        self.modal = Some(match first_failure_point(&points).cloned() {
            Some(point) => Modal::QuickReset {
                execution,
                point,
                points,
            },
            None => reset_picker(execution, points),
        });
    }

    fn dispatch(&mut self, cmd: AsyncCommand) {
        info!(?cmd, "dispatching operator command");
        self.pending.push(cmd);
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> bool {
        let Some(modal) = self.modal.take() else {
            return false;
        };

        match modal {
            Modal::Confirm {
                title,
                message,
                action,
            } => match key {
                KeyCode::Char('y') | KeyCode::Enter => self.confirm(action),
                KeyCode::Char('n') | KeyCode::Esc => {}
                _ => {
                    self.modal = Some(Modal::Confirm {
                        title,
                        message,
                        action,
                    });
                }
            },
            Modal::Input {
                title,
                mut fields,
                mut focus,
                action,
            } => {
                let count = fields.len().max(1);
                match key {
                    KeyCode::Esc => return false,
                    KeyCode::Enter => match self.submit_input(&fields, &action) {
                        Ok(cmd) => {
                            self.dispatch(cmd);
                            return false;
                        }
                        Err(message) => self.flash_error(message),
                    },
                    KeyCode::Tab | KeyCode::Down => focus = (focus + 1) % count,
                    KeyCode::BackTab | KeyCode::Up => focus = (focus + count - 1) % count,
                    KeyCode::Backspace => {
                        if let Some(field) = fields.get_mut(focus) {
                            field.value.pop();
                        }
                    }
                    KeyCode::Char(c) => {
                        if let Some(field) = fields.get_mut(focus) {
                            field.value.push(c);
                        }
                    }
                    _ => {}
                }
                self.modal = Some(Modal::Input {
                    title,
                    fields,
                    focus,
                    action,
                });
            }
            Modal::QueryResult {
                title,
                body,
                mut scroll,
            } => match key {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {}
                _ => {
                    match key {
                        KeyCode::Char('j') | KeyCode::Down => scroll = scroll.saturating_add(1),
                        KeyCode::Char('k') | KeyCode::Up => scroll = scroll.saturating_sub(1),
                        KeyCode::PageDown => scroll = scroll.saturating_add(10),
                        KeyCode::PageUp => scroll = scroll.saturating_sub(10),
                        _ => {}
                    }
                    self.modal = Some(Modal::QueryResult {
                        title,
                        body,
                        scroll,
                    });
                }
            },
            Modal::EventDetail {
                title,
                lines,
                mut scroll,
            } => match key {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('d') => {}
                _ => {
                    match key {
                        KeyCode::Char('j') | KeyCode::Down => scroll = scroll.saturating_add(1),
                        KeyCode::Char('k') | KeyCode::Up => scroll = scroll.saturating_sub(1),
                        KeyCode::PageDown => scroll = scroll.saturating_add(10),
                        KeyCode::PageUp => scroll = scroll.saturating_sub(10),
                        KeyCode::Char('g') | KeyCode::Home => scroll = 0,
                        KeyCode::Char('y') => self.copy_lines(&lines),
                        _ => {}
                    }
                    self.modal = Some(Modal::EventDetail {
                        title,
                        lines,
                        scroll,
                    });
                }
            },
            Modal::ResetPicker {
                execution,
                points,
                mut cursor,
            } => match key {
                KeyCode::Esc => {}
                KeyCode::Enter => {
                    if let Some(point) = cursor.current().and_then(|i| points.get(i)) {
                        self.modal = Some(Modal::Confirm {
                            title: "Reset workflow".into(),
                            message: format!(
                                "Reset {execution} to workflow task #{}?",
                                point.event_id
                            ),
                            action: ConfirmAction::Reset {
                                execution,
                                event_id: point.event_id,
                            },
                        });
                    }
                }
                _ => {
                    match key {
                        KeyCode::Char('j') | KeyCode::Down => cursor.move_by(1),
                        KeyCode::Char('k') | KeyCode::Up => cursor.move_by(-1),
                        KeyCode::Char('g') | KeyCode::Home => cursor.home(),
                        KeyCode::Char('G') | KeyCode::End => cursor.end(),
                        _ => {}
                    }
                    self.modal = Some(Modal::ResetPicker {
                        execution,
                        points,
                        cursor,
                    });
                }
            },
            Modal::QuickReset {
                execution,
                point,
                points,
            } => match key {
                KeyCode::Enter | KeyCode::Char('y') => {
                    self.dispatch(AsyncCommand::Reset {
                        execution,
                        event_id: point.event_id,
                        reason: OPERATOR_REASON.to_string(),
                    });
                }
                KeyCode::Char('p') => self.modal = Some(reset_picker(execution, points)),
                KeyCode::Esc | KeyCode::Char('n') => {}
                _ => {
                    self.modal = Some(Modal::QuickReset {
                        execution,
                        point,
                        points,
                    });
                }
            },
        }
        false
    }

    fn confirm(&mut self, action: ConfirmAction) {
        let reason = OPERATOR_REASON.to_string();
        let cmd = match action {
            ConfirmAction::Cancel(execution) => AsyncCommand::Cancel { execution, reason },
            ConfirmAction::Terminate(execution) => AsyncCommand::Terminate { execution, reason },
            ConfirmAction::Delete(execution) => AsyncCommand::Delete { execution },
            ConfirmAction::Reset {
                execution,
                event_id,
            } => AsyncCommand::Reset {
                execution,
                event_id,
                reason,
            },
        };
        self.dispatch(cmd);
    }

    fn submit_input(&self, fields: &[InputField], action: &InputAction) -> Result<AsyncCommand, String> {
        let value = |idx: usize| fields.get(idx).map_or("", |f| f.value.trim());
        match action {
            InputAction::Signal(execution) => {
                let name = value(0);
                if name.is_empty() {
                    return Err("Signal name is required".into());
                }
                Ok(AsyncCommand::Signal {
                    execution: execution.clone(),
                    name: name.to_string(),
                    input: parse_json_arg(value(1))?,
                })
            }
            InputAction::Query(execution) => {
                let query_type = value(0);
                if query_type.is_empty() {
                    return Err("Query type is required".into());
                }
                Ok(AsyncCommand::Query {
                    execution: execution.clone(),
                    query_type: query_type.to_string(),
                    args: parse_json_arg(value(1))?,
                })
            }
        }
    }

    // ── Results ───────────────────────────────────────────────────────

    pub fn apply_command_result(&mut self, result: CommandResult) {
        match result {
            CommandResult::Workflows { generation, result } => {
                if !self.list_gate.is_current(generation) {
                    debug!(generation, "dropping stale workflow list");
                    return;
                }
                self.list_loading = false;
                match result {
                    Ok(workflows) => self.replace_workflows(workflows),
                    Err(e) => {
                        warn!("workflow list fetch failed: {e}");
                        self.list_error = Some(e);
                    }
                }
            }
            CommandResult::Described { generation, result } => {
                if !self.detail_gate.is_current(generation) {
                    debug!(generation, "dropping stale describe response");
                    return;
                }
                let Some(detail) = self.detail.as_mut() else {
                    return;
                };
                match result {
                    Ok(summary) => {
                        detail.summary = Some(summary);
                        detail.summary_error = None;
                    }
                    Err(e) => {
                        warn!(execution = %detail.execution, "describe failed: {e}");
                        detail.summary_error = Some(e);
                    }
                }
            }
            CommandResult::History { generation, result } => {
                if !self.detail_gate.is_current(generation) {
                    warn!(generation, "dropping stale history response");
                    return;
                }
                let preserve = self.preserve_tree;
                let Some(detail) = self.detail.as_mut() else {
                    return;
                };
                detail.loading = false;
                match result {
                    Ok(events) => {
                        detail
                            .history
                            .replace_snapshot(HistorySnapshot::build(events), Utc::now(), preserve);
                        detail.loaded = true;
                        detail.error = None;
                    }
                    Err(e) => {
                        warn!(execution = %detail.execution, "history fetch failed: {e}");
                        detail.error = Some(e);
                    }
                }
            }
            CommandResult::Mutated {
                mutation,
                execution,
                result,
            } => match result {
                Ok(_) if mutation == Mutation::Delete => {
                    info!(%execution, "workflow deleted");
                    let open = self
                        .detail
                        .as_ref()
                        .is_some_and(|d| d.execution.workflow_id == execution.workflow_id);
                    if open {
                        self.close_detail();
                    } else {
                        self.refresh_list();
                    }
                    self.flash_success(mutation.past_tense());
                }
                Ok(new_run) => {
                    info!(%execution, mutation = mutation.label(), "command succeeded");
                    self.flash_success(mutation.past_tense());
                    if let (Some(run_id), Some(detail)) = (new_run, self.detail.as_mut()) {
                        if detail.execution.workflow_id == execution.workflow_id {
                            detail.execution = ExecutionRef::new(execution.workflow_id, Some(run_id));
                            detail.summary = None;
                        }
                    }
                    self.refresh();
                }
                Err(e) => {
                    warn!(%execution, mutation = mutation.label(), "command failed: {e}");
                    self.flash_error(format!("{} failed: {e}", mutation.label()));
                }
            },
            CommandResult::Queried { query_type, result } => match result {
                Ok(body) => {
                    self.modal = Some(Modal::QueryResult {
                        title: format!("Query: {query_type}"),
                        body,
                        scroll: 0,
                    });
                }
                Err(e) => self.flash_error(format!("Query {query_type} failed: {e}")),
            },
        }
    }

    fn replace_workflows(&mut self, workflows: Vec<WorkflowSummary>) {
        let previous = self.selected_workflow().map(|w| w.workflow_id.clone());
        self.workflows = workflows;
        self.list_error = None;
        let index = previous
            .and_then(|id| self.workflows.iter().position(|w| w.workflow_id == id))
            .or(if self.workflows.is_empty() { None } else { Some(0) });
        self.list_state.select(index);
        // Keep the open detail's header current.
        if let Some(detail) = self.detail.as_mut() {
            if let Some(summary) = self.workflows.iter().find(|w| w.execution() == detail.execution) {
                detail.summary = Some(summary.clone());
            }
        }
    }

    pub fn flash_success(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Success));
    }

    pub fn flash_error(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Error));
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }
}

fn reset_picker(execution: ExecutionRef, points: Vec<ResetPoint>) -> Modal {
    let mut cursor = Cursor::new(points.len());
    cursor.end();
    Modal::ResetPicker {
        execution,
        points,
        cursor,
    }
}

/// One unindented header per event followed by its indented payload.
fn event_detail_lines(events: &[&RawEvent]) -> Vec<DetailLine> {
    let mut lines = Vec::new();
    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            lines.push(DetailLine {
                key: None,
                text: String::new(),
            });
        }
        lines.push(DetailLine {
            key: None,
            text: format!(
                "#{} {}  {}",
                event.id,
                event.event_type,
                event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f UTC")
            ),
        });
        lines.extend(pretty_details(&event.details).into_iter().map(|line| match line.key {
            Some(key) => DetailLine {
                key: Some(format!("  {key}")),
                text: line.text,
            },
            None => DetailLine {
                key: None,
                text: format!("  {}", line.text),
            },
        }));
    }
    lines
}

fn plain_text(lines: &[DetailLine]) -> String {
    lines
        .iter()
        .map(|line| match &line.key {
            Some(key) => format!("{key}: {}", line.text),
            None => line.text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Empty input means no argument.
fn parse_json_arg(raw: &str) -> Result<Option<Value>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| format!("Invalid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;
    use tempo_history::testing::{at, ev, order_history};

    fn app() -> App {
        App::new(AppOptions {
            provider_name: "mock".into(),
            namespace: "default".into(),
            default_projection: Projection::List,
            preserve_tree: false,
            auto_refresh: AutoRefresh::new(Duration::from_secs(5), false),
        })
    }

    fn summary(status: &str) -> WorkflowSummary {
        WorkflowSummary {
            workflow_id: "order-1".into(),
            run_id: "run-1".into(),
            workflow_type: "OrderWorkflow".into(),
            status: status.into(),
            task_queue: "orders".into(),
            start_time: at(0),
            end_time: None,
            parent_id: None,
            history_length: None,
        }
    }

    /// Opens `order-1` and answers its fetches with `events`.
    fn open_with(app: &mut App, status: &str, events: Vec<tempo_history::RawEvent>) {
        app.workflows = vec![summary(status)];
        app.list_state.select(Some(0));
        app.handle_key(KeyCode::Enter);
        let generation = history_generation(&app.take_pending());
        app.apply_command_result(CommandResult::History {
            generation,
            result: Ok(events),
        });
    }

    fn history_generation(cmds: &[AsyncCommand]) -> u64 {
        cmds.iter()
            .find_map(|c| match c {
                AsyncCommand::FetchHistory { generation, .. } => Some(*generation),
                _ => None,
            })
            .unwrap()
    }

    fn failing_history() -> Vec<tempo_history::RawEvent> {
        vec![
            ev(1, "WorkflowExecutionStarted", 0),
            ev(2, "WorkflowTaskScheduled", 0),
            ev(3, "WorkflowTaskStarted", 1).with_scheduled(2),
            ev(4, "WorkflowTaskCompleted", 2).with_scheduled(2),
            ev(5, "ActivityTaskScheduled", 3).with_activity_type("Charge"),
            ev(6, "ActivityTaskStarted", 4).with_scheduled(5),
            ev(7, "ActivityTaskFailed", 5).with_scheduled(5),
            ev(8, "WorkflowTaskScheduled", 5),
            ev(9, "WorkflowTaskStarted", 6).with_scheduled(8),
            ev(10, "WorkflowTaskCompleted", 7).with_scheduled(8),
        ]
    }

    #[test]
    fn opening_a_workflow_fetches_metadata_and_history() {
        let mut app = app();
        app.workflows = vec![summary("Running")];
        app.list_state.select(Some(0));
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::WorkflowDetail);
        let cmds = app.take_pending();
        assert_eq!(cmds.len(), 2);
        assert!(matches!(cmds[0], AsyncCommand::Describe { .. }));
        assert!(app.detail.as_ref().unwrap().loading);
    }

    #[test]
    fn stale_history_is_dropped() {
        let mut app = app();
        app.workflows = vec![summary("Running")];
        app.list_state.select(Some(0));
        app.handle_key(KeyCode::Enter);
        let first = history_generation(&app.take_pending());
        app.handle_key(KeyCode::Char('r'));
        let second = history_generation(&app.take_pending());

        app.apply_command_result(CommandResult::History {
            generation: second,
            result: Ok(order_history()),
        });
        app.apply_command_result(CommandResult::History {
            generation: first,
            result: Ok(Vec::new()),
        });
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.history.snapshot().events().len(), 14);
        assert!(!detail.is_empty());
    }

    #[test]
    fn fetch_failure_keeps_previous_tree_and_shows_error() {
        let mut app = app();
        open_with(&mut app, "Running", order_history());
        app.handle_key(KeyCode::Char('r'));
        let generation = history_generation(&app.take_pending());
        app.apply_command_result(CommandResult::History {
            generation,
            result: Err("request timed out".into()),
        });
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.error.as_deref(), Some("request timed out"));
        assert!(!detail.loading);
        assert_eq!(detail.history.snapshot().roots().len(), build_roots_len());
    }

    fn build_roots_len() -> usize {
        tempo_history::build_tree(&order_history()).len()
    }

    #[test]
    fn empty_history_is_not_an_error() {
        let mut app = app();
        open_with(&mut app, "Running", Vec::new());
        let detail = app.detail.as_ref().unwrap();
        assert!(detail.is_empty());
        assert!(detail.error.is_none());
    }

    #[test]
    fn projection_keys_switch_views() {
        let mut app = app();
        open_with(&mut app, "Completed", order_history());
        app.handle_key(KeyCode::Char('3'));
        assert_eq!(app.detail.as_ref().unwrap().history.projection(), Projection::Timeline);
        app.handle_key(KeyCode::Char('v'));
        assert_eq!(app.detail.as_ref().unwrap().history.projection(), Projection::List);
        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.detail.as_ref().unwrap().history.projection(), Projection::Tree);
    }

    #[test]
    fn reset_offers_failure_point_first() {
        let mut app = app();
        open_with(&mut app, "Running", failing_history());
        app.handle_key(KeyCode::Char('R'));
        assert!(matches!(
            app.modal,
            Some(Modal::QuickReset { ref point, .. }) if point.event_id == 4
        ));
        app.handle_key(KeyCode::Enter);
        assert!(app.modal.is_none());
        let cmds = app.take_pending();
        assert!(matches!(cmds[..], [AsyncCommand::Reset { event_id: 4, .. }]));
    }

    #[test]
    fn reset_picker_confirms_before_dispatch() {
        let mut app = app();
        open_with(&mut app, "Completed", order_history());
        app.handle_key(KeyCode::Char('R'));
        assert!(matches!(app.modal, Some(Modal::ResetPicker { .. })));
        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.modal, Some(Modal::Confirm { .. })));
        assert!(app.take_pending().is_empty());
        app.handle_key(KeyCode::Char('y'));
        assert!(matches!(app.take_pending()[..], [AsyncCommand::Reset { event_id: 4, .. }]));
    }

    #[test]
    fn queries_need_a_running_workflow() {
        let mut app = app();
        open_with(&mut app, "Completed", order_history());
        app.handle_key(KeyCode::Char('Q'));
        assert!(app.modal.is_none());
        assert!(matches!(app.flash_message, Some((_, FlashLevel::Error))));
    }

    #[test]
    fn signal_input_validates_json() {
        let mut app = app();
        open_with(&mut app, "Running", order_history());
        app.handle_key(KeyCode::Char('s'));
        for c in "approve".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Tab);
        for c in "{oops".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
        assert!(app.modal.is_some());
        assert!(app.take_pending().is_empty());

        for _ in 0..5 {
            app.handle_key(KeyCode::Backspace);
        }
        for c in "{\"ok\":true}".chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
        assert!(app.modal.is_none());
        match &app.take_pending()[..] {
            [AsyncCommand::Signal { name, input, .. }] => {
                assert_eq!(name, "approve");
                assert_eq!(input, &Some(serde_json::json!({ "ok": true })));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn successful_reset_follows_the_new_run() {
        let mut app = app();
        open_with(&mut app, "Running", failing_history());
        app.apply_command_result(CommandResult::Mutated {
            mutation: Mutation::Reset,
            execution: ExecutionRef::new("order-1", Some("run-1".into())),
            result: Ok(Some("run-2".into())),
        });
        let detail = app.detail.as_ref().unwrap();
        assert_eq!(detail.execution.run_id.as_deref(), Some("run-2"));
        let cmds = app.take_pending();
        assert!(cmds.iter().any(|c| matches!(
            c,
            AsyncCommand::FetchHistory { execution, .. } if execution.run_id.as_deref() == Some("run-2")
        )));
    }

    #[test]
    fn leaving_detail_drops_in_flight_history() {
        let mut app = app();
        app.workflows = vec![summary("Running")];
        app.list_state.select(Some(0));
        app.handle_key(KeyCode::Enter);
        let generation = history_generation(&app.take_pending());
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.view, View::WorkflowList);
        app.handle_key(KeyCode::Enter);
        app.apply_command_result(CommandResult::History {
            generation,
            result: Ok(order_history()),
        });
        assert!(!app.detail.as_ref().unwrap().loaded);
    }

    #[test]
    fn list_refresh_keeps_selection_by_id() {
        let mut app = app();
        app.refresh_list();
        let generation = match app.take_pending()[..] {
            [AsyncCommand::ListWorkflows { generation, .. }] => generation,
            _ => panic!("expected a list fetch"),
        };
        let mut other = summary("Completed");
        other.workflow_id = "other".into();
        app.apply_command_result(CommandResult::Workflows {
            generation,
            result: Ok(vec![summary("Running"), other.clone()]),
        });
        app.handle_key(KeyCode::Char('j'));
        assert_eq!(app.selected_workflow().unwrap().workflow_id, "other");

        app.handle_key(KeyCode::Char('r'));
        let generation = match app.take_pending()[..] {
            [AsyncCommand::ListWorkflows { generation, .. }] => generation,
            _ => panic!("expected a list fetch"),
        };
        app.apply_command_result(CommandResult::Workflows {
            generation,
            result: Ok(vec![other, summary("Running")]),
        });
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.selected_workflow().unwrap().workflow_id, "other");
    }

    #[test]
    fn delete_confirms_then_returns_to_list() {
        let mut app = app();
        open_with(&mut app, "Completed", order_history());
        app.handle_key(KeyCode::Char('D'));
        assert!(matches!(
            app.modal,
            Some(Modal::Confirm {
                action: ConfirmAction::Delete(_),
                ..
            })
        ));
        app.handle_key(KeyCode::Char('y'));
        let execution = match &app.take_pending()[..] {
            [AsyncCommand::Delete { execution }] => execution.clone(),
            other => panic!("expected a delete, got {other:?}"),
        };
        assert_eq!(execution.workflow_id, "order-1");

        app.apply_command_result(CommandResult::Mutated {
            mutation: Mutation::Delete,
            execution,
            result: Ok(None),
        });
        assert_eq!(app.view, View::WorkflowList);
        assert!(app.detail.is_none());
        assert!(matches!(app.take_pending()[..], [AsyncCommand::ListWorkflows { .. }]));
        assert!(matches!(app.flash_message, Some((_, FlashLevel::Success))));
    }

    #[test]
    fn declined_delete_dispatches_nothing() {
        let mut app = app();
        open_with(&mut app, "Running", order_history());
        app.handle_key(KeyCode::Char('D'));
        app.handle_key(KeyCode::Char('n'));
        assert!(app.modal.is_none());
        assert!(app.take_pending().is_empty());
        assert_eq!(app.view, View::WorkflowDetail);
    }

    fn started_with_payload() -> Vec<tempo_history::RawEvent> {
        vec![
            ev(1, "WorkflowExecutionStarted", 0)
                .with_details(r#"{"workflowType":{"name":"OrderWorkflow"},"attempt":1}"#),
            ev(2, "WorkflowTaskScheduled", 0),
        ]
    }

    #[test]
    fn event_detail_modal_shows_full_payload() {
        let mut app = app();
        open_with(&mut app, "Running", started_with_payload());
        app.handle_key(KeyCode::Char('g'));
        app.handle_key(KeyCode::Char('d'));
        let Some(Modal::EventDetail { title, lines, scroll }) = &app.modal else {
            panic!("expected the event detail modal");
        };
        assert_eq!(title, "Event #1 WorkflowExecutionStarted");
        assert_eq!(*scroll, 0);
        assert!(lines[0].text.starts_with("#1 WorkflowExecutionStarted"));
        assert!(lines.iter().any(|l| l.text.contains("\"OrderWorkflow\"")));

        app.handle_key(KeyCode::Char('j'));
        assert!(matches!(app.modal, Some(Modal::EventDetail { scroll: 1, .. })));
        app.handle_key(KeyCode::Esc);
        assert!(app.modal.is_none());
        assert_eq!(app.view, View::WorkflowDetail);
    }

    thread_local! {
        static COPIED: RefCell<Option<String>> = const { RefCell::new(None) };
    }

    fn record_copy(text: &str) -> anyhow::Result<()> {
        COPIED.with(|c| *c.borrow_mut() = Some(text.to_string()));
        Ok(())
    }

    fn refuse_copy(_: &str) -> anyhow::Result<()> {
        anyhow::bail!("no clipboard")
    }

    #[test]
    fn yank_copies_selected_event_details() {
        let mut app = app();
        app.clipboard = record_copy;
        open_with(&mut app, "Running", started_with_payload());
        app.handle_key(KeyCode::Char('g'));
        app.handle_key(KeyCode::Char('y'));

        assert!(matches!(app.flash_message, Some((_, FlashLevel::Success))));
        let copied = COPIED.with(|c| c.borrow_mut().take()).unwrap();
        assert!(copied.starts_with("#1 WorkflowExecutionStarted"));
        assert!(copied.contains("\"OrderWorkflow\""));
        assert!(!copied.contains("WorkflowTaskScheduled"));
    }

    #[test]
    fn yank_failure_is_flashed() {
        let mut app = app();
        app.clipboard = refuse_copy;
        open_with(&mut app, "Running", started_with_payload());
        app.handle_key(KeyCode::Char('y'));
        let Some((message, FlashLevel::Error)) = &app.flash_message else {
            panic!("expected an error flash");
        };
        assert!(message.contains("no clipboard"));
    }

    #[test]
    fn describe_failure_does_not_mask_loaded_history() {
        let mut app = app();
        open_with(&mut app, "Running", order_history());
        app.handle_key(KeyCode::Char('r'));
        let generation = history_generation(&app.take_pending());
        app.apply_command_result(CommandResult::History {
            generation,
            result: Ok(order_history()),
        });
        app.apply_command_result(CommandResult::Described {
            generation,
            result: Err("deadline exceeded".into()),
        });

        let detail = app.detail.as_ref().unwrap();
        assert!(detail.loaded);
        assert!(detail.error.is_none());
        assert_eq!(detail.summary_error.as_deref(), Some("deadline exceeded"));
        assert!(detail.is_running());

        app.apply_command_result(CommandResult::Described {
            generation,
            result: Ok(summary("Running")),
        });
        assert!(app.detail.as_ref().unwrap().summary_error.is_none());
    }
}
