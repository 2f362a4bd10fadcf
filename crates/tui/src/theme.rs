use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Padding};
use tempo_history::timeline::{Tone, status_style};

pub struct Theme;

impl Theme {
    // ── Background ───────────────────────────────────────────────────
    pub const BG_SURFACE: Color = Color::Rgb(30, 35, 50);
    pub const BG_SELECTED: Color = Color::Rgb(45, 52, 72);

    // ── Border ───────────────────────────────────────────────────────
    pub const BORDER_DIM: Color = Color::DarkGray;
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);
    pub const BORDER_ACCENT: Color = Color::Rgb(100, 180, 240);

    // ── Text hierarchy ───────────────────────────────────────────────
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);
    pub const TEXT_CONTENT: Color = Color::Rgb(170, 175, 190);

    // ── Key style (for footer hints) ─────────────────────────────────
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    // ── Accent ───────────────────────────────────────────────────────
    pub const ACCENT_BLUE: Color = Color::Rgb(100, 180, 240);
    pub const ACCENT_GREEN: Color = Color::Rgb(80, 200, 120);
    pub const ACCENT_RED: Color = Color::Rgb(220, 80, 80);
    pub const ACCENT_YELLOW: Color = Color::Rgb(220, 180, 60);
    pub const ACCENT_PURPLE: Color = Color::Rgb(180, 140, 220);
    pub const ACCENT_ORANGE: Color = Color::Rgb(217, 119, 80);
    pub const ACCENT_CYAN: Color = Color::Rgb(80, 200, 200);

    // ── Detail view colors ───────────────────────────────────────────
    pub const GUTTER: Color = Color::Rgb(55, 60, 75);
    pub const TREE: Color = Color::Rgb(70, 75, 90);
    pub const AXIS: Color = Color::Rgb(70, 75, 90);

    // ── Padding ──────────────────────────────────────────────────────
    pub const PADDING_CARD: Padding = Padding::new(2, 2, 1, 1);

    // ── Block helpers ────────────────────────────────────────────────

    pub fn block() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_NORMAL))
    }

    pub fn block_dim() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_DIM))
    }

    pub fn block_accent() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_ACCENT))
    }
}

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::InProgress => Theme::ACCENT_BLUE,
        Tone::Good => Theme::ACCENT_GREEN,
        Tone::Bad => Theme::ACCENT_RED,
        Tone::Warning => Theme::ACCENT_YELLOW,
        Tone::Muted => Theme::TEXT_SECONDARY,
        Tone::Neutral => Theme::TEXT_CONTENT,
    }
}

pub fn status_color(status: &str) -> Color {
    tone_color(status_style(status).tone)
}

/// Glyph and color for a status, as drawn in bars and badges.
pub fn status_span(status: &str) -> Span<'static> {
    let style = status_style(status);
    Span::styled(style.glyph.to_string(), Style::new().fg(tone_color(style.tone)))
}
