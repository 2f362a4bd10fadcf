use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use tempo_history::{HistoryView, Projection, classify};

use crate::theme::{self, Theme};
use crate::views::fit;

/// Flat list of every event in history order.
pub fn render(frame: &mut Frame, history: &mut HistoryView, area: Rect, focused: bool) {
    let block = if focused { Theme::block_accent() } else { Theme::block_dim() };
    let block = block.title(format!(" Events ({}) ", history.snapshot().events().len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    history.set_viewport_rows(Projection::List, inner.height as usize);
    let cursor = history.list().cursor();
    let selected = cursor.current();
    let events = history.snapshot().events();
    let type_width = (inner.width as usize).saturating_sub(30).clamp(12, 44);

    let lines: Vec<Line> = cursor
        .visible_range()
        .filter_map(|idx| events.get(idx).map(|e| (idx, e)))
        .map(|(idx, event)| {
            let class = classify(&event.event_type);
            let mut line = Line::from(vec![
                Span::styled(format!("{:>5} ", event.id), Style::new().fg(Theme::TEXT_MUTED)),
                Span::styled(
                    event.timestamp.format("%H:%M:%S%.3f ").to_string(),
                    Style::new().fg(Theme::TEXT_SECONDARY),
                ),
                theme::status_span(class.status),
                Span::raw(" "),
                Span::styled(fit(&event.event_type, type_width), Style::new().fg(Theme::TEXT_PRIMARY)),
                Span::styled(format!(" {}", class.kind), Style::new().fg(Theme::TEXT_MUTED)),
            ]);
            if Some(idx) == selected {
                line = line.style(Style::new().bg(Theme::BG_SELECTED).add_modifier(Modifier::BOLD));
            }
            line
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}
