use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use tempo_history::details::format_duration;
use tempo_history::outline::TreeRow;
use tempo_history::tree::OperationNode;
use tempo_history::{HistoryView, Projection};

use crate::theme::{self, Theme};
use crate::views::fit;

pub fn render(frame: &mut Frame, history: &mut HistoryView, area: Rect, focused: bool, now: DateTime<Utc>) {
    let block = if focused { Theme::block_accent() } else { Theme::block_dim() };
    let block = block.title(format!(" Operations ({}) ", history.snapshot().roots().len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    history.set_viewport_rows(Projection::Tree, inner.height as usize);
    let tree = history.tree();
    let cursor = tree.cursor();
    let selected = cursor.current();
    let name_width = (inner.width as usize).saturating_sub(36).clamp(12, 60);

    let lines: Vec<Line> = cursor
        .visible_range()
        .filter_map(|idx| {
            let row = tree.rows().get(idx)?;
            let node = history.snapshot().node(row.path)?;
            let mut line = row_line(row, node, name_width, now);
            if Some(idx) == selected {
                line = line.style(Style::new().bg(Theme::BG_SELECTED).add_modifier(Modifier::BOLD));
            }
            Some(line)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn row_line(row: &TreeRow, node: &OperationNode, name_width: usize, now: DateTime<Utc>) -> Line<'static> {
    let marker = match (row.expandable, row.expanded) {
        (true, true) => "▾ ",
        (true, false) => "▸ ",
        (false, _) => "  ",
    };
    let indent = if row.depth > 0 { "  └ " } else { "" };
    let duration = match node.duration() {
        Some(d) => format_duration(d),
        None => format!("{}…", format_duration(node.live_duration(now))),
    };

    let mut spans = vec![
        Span::styled(indent, Style::new().fg(Theme::TREE)),
        Span::styled(marker, Style::new().fg(Theme::TREE)),
        theme::status_span(&node.status),
        Span::raw(" "),
        Span::styled(
            fit(&node.name, name_width.saturating_sub(indent.len())),
            Style::new().fg(Theme::TEXT_PRIMARY),
        ),
        Span::raw(" "),
        Span::styled(fit(&node.status, 11), Style::new().fg(theme::status_color(&node.status))),
        Span::styled(format!("{duration:>9}"), Style::new().fg(Theme::TEXT_SECONDARY)),
    ];
    if node.attempt_count > 0 {
        let noun = if node.attempt_count == 1 { "retry" } else { "retries" };
        spans.push(Span::styled(
            format!("  {} {noun}", node.attempt_count),
            Style::new().fg(Theme::ACCENT_ORANGE),
        ));
    }
    Line::from(spans)
}
