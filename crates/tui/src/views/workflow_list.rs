use chrono::{DateTime, Local, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{HighlightSpacing, List, ListItem, Paragraph};
use tempo_client::WorkflowSummary;
use tempo_history::details::format_duration;

use crate::app::App;
use crate::theme::{self, Theme};
use crate::views::fit;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = list_title(app);

    if app.workflows.is_empty() {
        let (msg, color) = if let Some(err) = &app.list_error {
            (format!("Could not load workflows: {err}"), Theme::ACCENT_RED)
        } else if app.list_loading {
            ("Loading workflows...".to_string(), Theme::ACCENT_YELLOW)
        } else if !app.query.is_empty() {
            (format!("No workflows match \"{}\".", app.query), Color::DarkGray)
        } else {
            ("No workflows in this namespace.".to_string(), Color::DarkGray)
        };
        let block = Theme::block_dim().title(title).padding(Theme::PADDING_CARD);
        frame.render_widget(Paragraph::new(msg).block(block).style(Style::new().fg(color)), area);
        return;
    }

    let now = Utc::now();
    let id_width = (area.width as usize / 3).clamp(16, 48);
    let items: Vec<ListItem> = app
        .workflows
        .iter()
        .map(|w| ListItem::new(row(w, id_width, now)))
        .collect();

    let list = List::new(items)
        .block(Theme::block_dim().title(title))
        .highlight_style(Style::new().bg(Theme::BG_SURFACE).add_modifier(Modifier::BOLD))
        .highlight_symbol(" > ")
        .highlight_spacing(HighlightSpacing::Always);

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn row(w: &WorkflowSummary, id_width: usize, now: DateTime<Utc>) -> Line<'static> {
    let status_color = theme::status_color(&w.status);
    let duration = if w.is_running() {
        format!("{} so far", format_duration(w.duration(now)))
    } else {
        format_duration(w.duration(now))
    };
    let mut spans = vec![
        theme::status_span(&w.status),
        Span::raw(" "),
        Span::styled(fit(&w.status, 11), Style::new().fg(status_color)),
        Span::styled(fit(&w.workflow_id, id_width), Style::new().fg(Theme::TEXT_PRIMARY)),
        Span::raw(" "),
        Span::styled(fit(&w.workflow_type, 24), Style::new().fg(Theme::ACCENT_PURPLE)),
        Span::raw(" "),
        Span::styled(
            w.start_time.with_timezone(&Local).format("%m-%d %H:%M:%S").to_string(),
            Style::new().fg(Theme::TEXT_SECONDARY),
        ),
        Span::raw("  "),
        Span::styled(fit(&duration, 14), Style::new().fg(Theme::TEXT_CONTENT)),
    ];
    if !w.task_queue.is_empty() {
        spans.push(Span::styled(
            format!(" {}", w.task_queue),
            Style::new().fg(Theme::TEXT_MUTED),
        ));
    }
    if w.parent_id.is_some() {
        spans.push(Span::styled(" child", Style::new().fg(Theme::ACCENT_CYAN)));
    }
    Line::from(spans)
}

fn list_title(app: &App) -> String {
    let mut title = format!(" Workflows ({}) ", app.workflows.len());
    if !app.query.is_empty() {
        title.push_str(&format!("[query:{}] ", app.query));
    }
    if app.list_loading {
        title.push_str("[refreshing] ");
    }
    title
}
