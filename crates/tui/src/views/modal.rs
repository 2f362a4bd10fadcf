use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Clear, Paragraph, Wrap};
use tempo_client::ExecutionRef;
use tempo_history::cursor::Cursor;
use tempo_history::details::DetailLine;
use tempo_history::reset::ResetPoint;

use crate::theme::Theme;

/// Kinds of modal overlay.
pub enum Modal {
    /// Confirmation dialog.
    Confirm {
        title: String,
        message: String,
        action: ConfirmAction,
    },
    /// One or more text fields.
    Input {
        title: String,
        fields: Vec<InputField>,
        focus: usize,
        action: InputAction,
    },
    QueryResult {
        title: String,
        body: String,
        scroll: u16,
    },
    /// Full payload of the selected events.
    EventDetail {
        title: String,
        lines: Vec<DetailLine>,
        scroll: u16,
    },
    /// Every completed workflow task of the history.
    ResetPicker {
        execution: ExecutionRef,
        points: Vec<ResetPoint>,
        cursor: Cursor,
    },
    /// Offered instead of the picker when the history has a failure.
    QuickReset {
        execution: ExecutionRef,
        point: ResetPoint,
        points: Vec<ResetPoint>,
    },
}

/// What happens when a Confirm modal is accepted.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    Cancel(ExecutionRef),
    Terminate(ExecutionRef),
    Delete(ExecutionRef),
    Reset {
        execution: ExecutionRef,
        event_id: i64,
    },
}

#[derive(Debug, Clone)]
pub struct InputField {
    pub label: &'static str,
    pub value: String,
}

impl InputField {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// What an Input modal submits.
#[derive(Debug, Clone)]
pub enum InputAction {
    Signal(ExecutionRef),
    Query(ExecutionRef),
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn framed(frame: &mut Frame, area: Rect, title: &str, color: Color) -> Rect {
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .title(format!(" {title} "))
        .border_style(Style::new().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    inner
}

fn hints(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let mut spans = vec![Span::raw(" ")];
    for (key, desc) in pairs {
        spans.push(Span::styled(format!(" {key} "), key_style));
        spans.push(Span::styled(format!("{desc} "), desc_style));
    }
    Line::from(spans)
}

/// Render the current modal overlay on top of everything.
pub fn render(frame: &mut Frame, modal: &Modal) {
    let area = frame.area();
    match modal {
        Modal::Confirm {
            title,
            message,
            action,
        } => {
            let color = match action {
                ConfirmAction::Terminate(_) | ConfirmAction::Delete(_) => Theme::ACCENT_RED,
                _ => Theme::ACCENT_YELLOW,
            };
            let inner = framed(frame, centered(area, 60, 8), title, color);
            let lines = vec![
                Line::raw(""),
                Line::from(Span::styled(
                    format!("  {message}"),
                    Style::new().fg(Theme::TEXT_PRIMARY),
                )),
                Line::raw(""),
                hints(&[("y/Enter", "confirm"), ("n/Esc", "cancel")]),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
        Modal::Input {
            title,
            fields,
            focus,
            ..
        } => {
            let height = 4 + fields.len() as u16 * 3;
            let inner = framed(frame, centered(area, 70, height), title, Theme::ACCENT_BLUE);
            let mut lines = vec![Line::raw("")];
            for (idx, field) in fields.iter().enumerate() {
                let active = idx == *focus;
                let label_style = if active {
                    Style::new().fg(Theme::ACCENT_BLUE).bold()
                } else {
                    Style::new().fg(Theme::TEXT_SECONDARY)
                };
                lines.push(Line::from(Span::styled(format!("  {}", field.label), label_style)));
                let mut value = vec![
                    Span::styled("  > ", Style::new().fg(Theme::GUTTER)),
                    Span::styled(field.value.clone(), Style::new().fg(Theme::TEXT_PRIMARY)),
                ];
                if active {
                    value.push(Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)));
                }
                lines.push(Line::from(value));
                lines.push(Line::raw(""));
            }
            lines.push(hints(&[("Tab", "next field"), ("Enter", "submit"), ("Esc", "cancel")]));
            frame.render_widget(Paragraph::new(lines), inner);
        }
        Modal::QueryResult {
            title,
            body,
            scroll,
        } => {
            let popup = centered(area, area.width.saturating_sub(10), area.height.saturating_sub(6));
            let inner = framed(frame, popup, title, Theme::ACCENT_GREEN);
            let [body_area, hint_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
            let text: Vec<Line> = body
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), Style::new().fg(Theme::TEXT_CONTENT))))
                .collect();
            frame.render_widget(Paragraph::new(text).scroll((*scroll, 0)), body_area);
            frame.render_widget(Paragraph::new(hints(&[("j/k", "scroll"), ("Esc", "close")])), hint_area);
        }
        Modal::EventDetail {
            title,
            lines,
            scroll,
        } => {
            let popup = centered(area, area.width.saturating_sub(8), area.height.saturating_sub(4));
            let inner = framed(frame, popup, title, Theme::ACCENT_BLUE);
            let [body_area, hint_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
            let key_style = Style::new().fg(Theme::ACCENT_BLUE);
            let text_style = Style::new().fg(Theme::TEXT_CONTENT);
            let text: Vec<Line> = lines
                .iter()
                .map(|line| match &line.key {
                    Some(key) => Line::from(vec![
                        Span::styled(format!("{key}: "), key_style),
                        Span::styled(line.text.clone(), text_style),
                    ]),
                    None if !line.text.starts_with(' ') && !line.text.is_empty() => Line::from(Span::styled(
                        line.text.clone(),
                        Style::new().fg(Theme::TEXT_PRIMARY).bold(),
                    )),
                    None => Line::from(Span::styled(line.text.clone(), text_style)),
                })
                .collect();
            frame.render_widget(
                Paragraph::new(text).wrap(Wrap { trim: false }).scroll((*scroll, 0)),
                body_area,
            );
            frame.render_widget(
                Paragraph::new(hints(&[("j/k", "scroll"), ("y", "copy"), ("Esc", "close")])),
                hint_area,
            );
        }
        Modal::ResetPicker { points, cursor, .. } => {
            let height = (points.len() as u16 + 4).clamp(7, 20);
            let inner = framed(frame, centered(area, 72, height), "Reset to workflow task", Theme::ACCENT_YELLOW);
            let [list_area, hint_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
            let visible = list_area.height as usize;
            let offset = cursor.selected().saturating_sub(visible.saturating_sub(1));
            let lines: Vec<Line> = points
                .iter()
                .enumerate()
                .skip(offset)
                .take(visible)
                .map(|(idx, point)| reset_point_line(point, idx == cursor.selected()))
                .collect();
            frame.render_widget(Paragraph::new(lines), list_area);
            frame.render_widget(
                Paragraph::new(hints(&[("j/k", "move"), ("Enter", "reset here"), ("Esc", "cancel")])),
                hint_area,
            );
        }
        Modal::QuickReset { point, points, .. } => {
            let inner = framed(frame, centered(area, 72, 9), "Reset workflow", Theme::ACCENT_YELLOW);
            let lines = vec![
                Line::raw(""),
                Line::from(Span::styled(
                    format!("  {}", point.description),
                    Style::new().fg(Theme::TEXT_PRIMARY),
                )),
                Line::from(Span::styled(
                    format!(
                        "  Workflow task #{} at {}",
                        point.event_id,
                        point.timestamp.format("%H:%M:%S")
                    ),
                    Style::new().fg(Theme::TEXT_SECONDARY),
                )),
                Line::from(Span::styled(
                    format!("  {} reset points in total", points.len()),
                    Style::new().fg(Theme::TEXT_MUTED),
                )),
                Line::raw(""),
                hints(&[("Enter", "reset to failure point"), ("p", "pick another"), ("Esc", "cancel")]),
            ];
            frame.render_widget(Paragraph::new(lines), inner);
        }
    }
}

fn reset_point_line(point: &ResetPoint, selected: bool) -> Line<'static> {
    let marker = if selected { " > " } else { "   " };
    let base = if selected {
        Style::new().bg(Theme::BG_SELECTED).fg(Theme::TEXT_PRIMARY)
    } else {
        Style::new().fg(Theme::TEXT_CONTENT)
    };
    let mut spans = vec![
        Span::styled(marker, base.fg(Theme::ACCENT_YELLOW)),
        Span::styled(format!("#{:<6}", point.event_id), base.fg(Theme::TEXT_SECONDARY)),
        Span::styled(point.description.clone(), base),
    ];
    if point.failure_point {
        spans.push(Span::styled("  ⚠", base.fg(Theme::ACCENT_RED)));
    }
    Line::from(spans)
}
