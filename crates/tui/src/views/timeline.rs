//! Time-scaled view: one lane per operation, drawn on a shared axis.

use chrono::{DateTime, Utc};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use tempo_history::timeline::{LEGEND, TimelineLane, TimelineState, status_style};
use tempo_history::{HistoryView, Projection};
use unicode_width::UnicodeWidthStr;

use crate::theme::{Theme, tone_color};
use crate::views::fit;

const LABEL_WIDTH: u16 = 28;

pub fn render(frame: &mut Frame, history: &mut HistoryView, area: Rect, focused: bool, now: DateTime<Utc>) {
    let zoom = history.timeline().zoom_level();
    let block = if focused { Theme::block_accent() } else { Theme::block_dim() };
    let block = block.title(format!(
        " Timeline ({}) zoom {zoom:.1}x ",
        history.timeline().lanes().len()
    ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [axis_area, lanes_area, legend_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    history.set_viewport_rows(Projection::Timeline, lanes_area.height as usize);
    let state = history.timeline();

    if state.lanes().is_empty() {
        frame.render_widget(
            Paragraph::new("  Nothing to draw: this history has no activities, timers, signals or child workflows.")
                .style(Style::new().fg(Color::DarkGray)),
            lanes_area,
        );
        frame.render_widget(Paragraph::new(legend()), legend_area);
        return;
    }

    let label_width = LABEL_WIDTH.min(inner.width / 2);
    let bar_width = inner.width.saturating_sub(label_width + 1) as usize;

    frame.render_widget(Paragraph::new(axis(state, label_width, bar_width)), axis_area);

    let selected = state.cursor().current();
    let lines: Vec<Line> = state
        .visible_lanes()
        .map(|(idx, lane)| lane_line(state, lane, label_width, bar_width, Some(idx) == selected, now))
        .collect();
    frame.render_widget(Paragraph::new(lines), lanes_area);

    frame.render_widget(Paragraph::new(legend()), legend_area);
}

fn axis(state: &TimelineState, label_width: u16, bar_width: usize) -> Line<'static> {
    let mut cells = vec![' '; bar_width];
    for tick in state.ticks(bar_width) {
        // Keep the last label inside the bar area.
        let label_len = tick.label.width();
        let start = tick.offset.min(bar_width.saturating_sub(label_len));
        if let Some(first) = cells.get_mut(tick.offset) {
            *first = '┬';
        }
        for (i, ch) in tick.label.chars().enumerate() {
            if let Some(cell) = cells.get_mut(start + i + 1) {
                *cell = ch;
            }
        }
    }
    Line::from(vec![
        Span::raw(" ".repeat(label_width as usize + 1)),
        Span::styled(cells.into_iter().collect::<String>(), Style::new().fg(Theme::AXIS)),
    ])
}

fn lane_line(
    state: &TimelineState,
    lane: &TimelineLane,
    label_width: u16,
    bar_width: usize,
    selected: bool,
    now: DateTime<Utc>,
) -> Line<'static> {
    let style = status_style(&lane.status);
    let color = tone_color(style.tone);
    let label_style = if selected {
        Style::new().fg(Theme::TEXT_PRIMARY).bold()
    } else {
        Style::new().fg(Theme::TEXT_CONTENT)
    };

    let mut spans = vec![
        Span::styled(fit(&lane.name, label_width as usize), label_style),
        Span::styled("│", Style::new().fg(Theme::GUTTER)),
    ];
    match state.bar(lane, bar_width, now) {
        Some(span) => {
            spans.push(Span::raw(" ".repeat(span.start)));
            spans.push(Span::styled(
                style.glyph.to_string().repeat(span.width()),
                Style::new().fg(color),
            ));
            spans.push(Span::raw(" ".repeat(bar_width.saturating_sub(span.end))));
        }
        None => spans.push(Span::raw(" ".repeat(bar_width))),
    }

    let line = Line::from(spans);
    if selected {
        line.style(Style::new().bg(Theme::BG_SELECTED))
    } else {
        line
    }
}

fn legend() -> Line<'static> {
    let mut spans = vec![Span::raw(" ")];
    for status in LEGEND {
        let style = status_style(status);
        spans.push(Span::styled(
            format!("{}{}", style.glyph, style.glyph),
            Style::new().fg(tone_color(style.tone)),
        ));
        spans.push(Span::styled(format!(" {status}  "), Style::new().fg(Theme::TEXT_SECONDARY)));
    }
    spans.push(Span::styled("h/l scroll  +/- zoom  0 reset", Style::new().fg(Theme::TEXT_MUTED)));
    Line::from(spans)
}
