use chrono::{DateTime, Local, Utc};
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};
use tempo_history::Projection;
use tempo_history::details::{format_duration, pretty_details};

use crate::app::{App, WorkflowDetail};
use crate::theme::{self, Theme};
use crate::views::{event_list, event_tree, timeline};

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some(detail) = app.detail.as_mut() else {
        return;
    };
    let now = Utc::now();

    let error_height = u16::from(detail.error.is_some());
    let [summary_area, tabs_area, error_area, body_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(error_height),
        Constraint::Fill(1),
    ])
    .areas(area);

    render_summary(frame, detail, summary_area, now);
    render_tabs(frame, detail, tabs_area);
    if let Some(err) = &detail.error {
        let msg = if detail.loaded {
            format!(" ⚠ Refresh failed, showing last loaded history: {err}")
        } else {
            format!(" ⚠ Could not load history: {err}")
        };
        frame.render_widget(
            Paragraph::new(msg).style(Style::new().fg(Theme::ACCENT_RED)),
            error_area,
        );
    }

    if !detail.loaded {
        let msg = if detail.loading { "Loading history..." } else { "History not loaded. Press r to retry." };
        let block = Theme::block_dim().padding(Theme::PADDING_CARD);
        frame.render_widget(
            Paragraph::new(msg).block(block).style(Style::new().fg(Theme::ACCENT_YELLOW)),
            body_area,
        );
        return;
    }
    if detail.is_empty() {
        let block = Theme::block_dim().padding(Theme::PADDING_CARD);
        frame.render_widget(
            Paragraph::new("This execution has no history events yet.")
                .block(block)
                .style(Style::new().fg(Color::DarkGray)),
            body_area,
        );
        return;
    }

    let [view_area, panel_area] =
        Layout::horizontal([Constraint::Percentage(62), Constraint::Percentage(38)]).areas(body_area);

    let history = &mut detail.history;
    match history.projection() {
        Projection::List => event_list::render(frame, history, view_area, true),
        Projection::Tree => event_tree::render(frame, history, view_area, true, now),
        Projection::Timeline => timeline::render(frame, history, view_area, true, now),
    }
    render_panel(frame, detail, panel_area, now);
}

fn render_summary(frame: &mut Frame, detail: &WorkflowDetail, area: Rect, now: DateTime<Utc>) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut spans = vec![Span::styled(
        format!(" {} ", detail.execution.workflow_id),
        Style::new().fg(Theme::TEXT_PRIMARY).bold(),
    )];
    match &detail.summary {
        Some(summary) => {
            spans.push(Span::styled(
                format!(" {} ", summary.status),
                Style::new().fg(Color::Black).bg(theme::status_color(&summary.status)).bold(),
            ));
            spans.push(Span::styled(
                format!("  {}", summary.workflow_type),
                Style::new().fg(Theme::ACCENT_PURPLE),
            ));
            spans.push(Span::styled(
                format!("  queue {}", summary.task_queue),
                Style::new().fg(Theme::TEXT_SECONDARY),
            ));
            spans.push(Span::styled(
                format!(
                    "  started {}  ran {}",
                    summary.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
                    format_duration(summary.duration(now))
                ),
                Style::new().fg(Theme::TEXT_SECONDARY),
            ));
            if let Some(parent) = &summary.parent_id {
                spans.push(Span::styled(
                    format!("  parent {parent}"),
                    Style::new().fg(Theme::ACCENT_CYAN),
                ));
            }
        }
        None if detail.summary_error.is_some() => {}
        None => spans.push(Span::styled(" loading details", Style::new().fg(Theme::TEXT_MUTED))),
    }
    if let Some(err) = &detail.summary_error {
        spans.push(Span::styled(
            format!("  ⚠ details unavailable: {err}"),
            Style::new().fg(Theme::ACCENT_RED),
        ));
    }
    spans.push(Span::styled(
        format!("  run {}", detail.execution.run_id_or_empty()),
        Style::new().fg(Theme::TEXT_MUTED),
    ));
    if detail.loading {
        spans.push(Span::styled("  refreshing…", Style::new().fg(Theme::ACCENT_YELLOW).italic()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_tabs(frame: &mut Frame, detail: &WorkflowDetail, area: Rect) {
    let current = detail.history.projection();
    let mut spans = vec![Span::raw(" ")];
    for (idx, projection) in Projection::ALL.iter().enumerate() {
        let label = format!(" {} {} ", idx + 1, projection.label());
        let style = if *projection == current {
            Style::new().fg(Color::Black).bg(Theme::ACCENT_BLUE).bold()
        } else {
            Style::new().fg(Theme::TEXT_SECONDARY)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(
        format!("  {} events", detail.history.snapshot().events().len()),
        Style::new().fg(Theme::TEXT_MUTED),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Details of the selected event or operation.
fn render_panel(frame: &mut Frame, detail: &WorkflowDetail, area: Rect, now: DateTime<Utc>) {
    let history = &detail.history;
    let block = Theme::block_dim().title(" Details ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let key_style = Style::new().fg(Theme::ACCENT_BLUE);
    let text_style = Style::new().fg(Theme::TEXT_CONTENT);
    let mut lines: Vec<Line> = Vec::new();

    if history.projection() != Projection::List {
        if let Some(node) = history.selected_node() {
            lines.push(Line::from(Span::styled(
                node.name.clone(),
                Style::new().fg(Theme::TEXT_PRIMARY).bold(),
            )));
            let elapsed = match node.duration() {
                Some(d) => format_duration(d),
                None => format!("{} (open)", format_duration(node.live_duration(now))),
            };
            lines.push(Line::from(vec![
                theme::status_span(&node.status),
                Span::styled(format!(" {}", node.status), Style::new().fg(theme::status_color(&node.status))),
                Span::styled(format!("  {}  {elapsed}", node.kind), Style::new().fg(Theme::TEXT_SECONDARY)),
            ]));
            if node.attempt_count > 0 {
                lines.push(Line::from(Span::styled(
                    format!("{} retries", node.attempt_count),
                    Style::new().fg(Theme::ACCENT_ORANGE),
                )));
            }
            lines.push(Line::raw(""));
        }
    }

    for event in history.selected_events() {
        lines.push(Line::from(vec![
            Span::styled(format!("#{} ", event.id), Style::new().fg(Theme::TEXT_MUTED)),
            Span::styled(event.event_type.clone(), Style::new().fg(Theme::TEXT_PRIMARY).bold()),
        ]));
        lines.push(Line::from(Span::styled(
            event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            Style::new().fg(Theme::TEXT_SECONDARY),
        )));
        for line in pretty_details(&event.details) {
            lines.push(match line.key {
                Some(key) => Line::from(vec![
                    Span::styled(format!("  {key}: "), key_style),
                    Span::styled(line.text, text_style),
                ]),
                None => Line::from(Span::styled(format!("  {}", line.text), text_style)),
            });
        }
        lines.push(Line::raw(""));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled("Nothing selected", Style::new().fg(Color::DarkGray))));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
