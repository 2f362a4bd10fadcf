use crate::app::{App, FlashLevel, View};
use crate::theme::Theme;
use crate::views::{help, modal, workflow_detail, workflow_list};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub fn render(frame: &mut Frame, app: &mut App) {
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header_area);

    match app.base_view() {
        View::WorkflowDetail => workflow_detail::render(frame, app, body_area),
        _ => workflow_list::render(frame, app, body_area),
    }

    render_footer(frame, app, footer_area);

    // Help overlay
    if app.view == View::Help {
        help::render(frame, frame.area());
    }

    // Modal overlay
    if let Some(ref m) = app.modal {
        modal::render(frame, m);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(" tempo ", Style::new().fg(Color::Black).bg(Theme::ACCENT_ORANGE).bold()),
        Span::raw(" "),
        Span::styled(app.provider_name.clone(), Style::new().fg(Theme::ACCENT_BLUE)),
        Span::styled(format!("  ns:{}", app.namespace), Style::new().fg(Theme::TEXT_SECONDARY)),
    ];
    if app.auto_refresh.enabled() {
        spans.push(Span::styled(
            format!("  auto {}s", app.auto_refresh.interval().as_secs()),
            Style::new().fg(Theme::ACCENT_GREEN),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);

    let mut spans = if app.searching {
        vec![
            Span::styled(" / ", Style::new().fg(Color::Black).bg(Theme::ACCENT_YELLOW).bold()),
            Span::styled(format!(" {}", app.search_buffer), Style::new().fg(Theme::TEXT_PRIMARY)),
            Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)),
            Span::styled("  ESC cancel  Enter confirm", desc_style),
        ]
    } else {
        let pairs: &[(&str, &str)] = match app.base_view() {
            View::WorkflowDetail => &[
                (" v ", "view  "),
                ("j/k ", "move  "),
                ("Enter ", "expand  "),
                ("d ", "details  "),
                ("s ", "signal  "),
                ("Q ", "query  "),
                ("R ", "reset  "),
                ("Esc ", "back  "),
                ("? ", "help"),
            ],
            _ => &[
                (" j/k ", "navigate  "),
                ("Enter ", "open  "),
                ("/ ", "search  "),
                ("r ", "refresh  "),
                ("? ", "help  "),
                ("q ", "quit"),
            ],
        };
        pairs
            .iter()
            .flat_map(|(key, desc)| [Span::styled(*key, key_style), Span::styled(*desc, desc_style)])
            .collect()
    };

    // Append flash message to any view's footer
    if let Some((ref msg, level)) = app.flash_message {
        let color = match level {
            FlashLevel::Success => Theme::ACCENT_GREEN,
            FlashLevel::Error => Theme::ACCENT_RED,
            FlashLevel::Info => Theme::ACCENT_BLUE,
        };
        spans.push(Span::styled("  ", Style::new()));
        spans.push(Span::styled(msg.as_str(), Style::new().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
