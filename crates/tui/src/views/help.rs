use crate::theme::Theme;
use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Global",
        &[("?", "Toggle this help"), ("a", "Toggle auto refresh"), ("r", "Refresh now")],
    ),
    (
        "Workflow List",
        &[
            ("j/k", "Navigate up/down"),
            ("g/G", "Jump to first/last"),
            ("Enter", "Open workflow history"),
            ("/", "Filter by id, type or status"),
            ("q", "Quit"),
        ],
    ),
    (
        "Workflow History",
        &[
            ("1/2/3, v", "List / tree / timeline"),
            ("j/k, PgUp/PgDn", "Move selection"),
            ("Enter/Space", "Expand or collapse operation"),
            ("E/C", "Expand / collapse all"),
            ("d", "Show full event details"),
            ("y", "Copy event details"),
            ("h/l", "Scroll timeline"),
            ("+/-, 0", "Zoom timeline, reset view"),
            ("Esc", "Back to workflow list"),
        ],
    ),
    (
        "Operator Actions",
        &[
            ("s", "Send signal"),
            ("Q", "Query (default __stack_trace)"),
            ("c", "Request cancellation"),
            ("X", "Terminate"),
            ("R", "Reset to a workflow task"),
            ("D", "Delete workflow and history"),
        ],
    ),
];

pub fn render(frame: &mut Frame, area: Rect) {
    let popup_width = 64u16.min(area.width.saturating_sub(4));
    let popup_height = 36u16.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(popup_width)) / 2;
    let y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(x, y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let block = Theme::block_accent()
        .title(" Keyboard Shortcuts ")
        .padding(Theme::PADDING_CARD);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key_style = Style::new().fg(Theme::ACCENT_YELLOW).bold();
    let desc_style = Style::new().fg(Theme::TEXT_CONTENT);
    let header_style = Style::new().fg(Theme::ACCENT_BLUE).bold();

    let mut lines = Vec::new();
    for (idx, (title, keys)) in SECTIONS.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(format!("── {title} ──"), header_style)));
        for (key, desc) in *keys {
            lines.push(Line::from(vec![
                Span::styled(format!("  {key:<16}"), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Press any key to close",
        Style::new().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}
