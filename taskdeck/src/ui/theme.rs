//! Theme and styling for the TUI.
//!
//! Two palettes (dark and light) toggled from the navigation shell. All
//! render functions take styles from the app's active [`Palette`] rather
//! than global constants so the toggle applies on the next frame.

use ratatui::style::{Color, Modifier, Style};

/// Which palette is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    /// Light-on-dark.
    Dark,
    /// Dark-on-light.
    Light,
}

/// An active color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Which palette this is.
    pub kind: ThemeKind,
    fg_primary: Color,
    fg_secondary: Color,
    highlight: Color,
    success: Color,
    error: Color,
    accent: Color,
    status_bg: Color,
}

impl Palette {
    /// The dark palette (default).
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            kind: ThemeKind::Dark,
            fg_primary: Color::White,
            fg_secondary: Color::Gray,
            highlight: Color::Cyan,
            success: Color::Green,
            error: Color::Red,
            accent: Color::LightBlue,
            status_bg: Color::Rgb(30, 30, 50),
        }
    }

    /// The light palette.
    #[must_use]
    pub const fn light() -> Self {
        Self {
            kind: ThemeKind::Light,
            fg_primary: Color::Black,
            fg_secondary: Color::DarkGray,
            highlight: Color::Blue,
            success: Color::Rgb(0, 130, 60),
            error: Color::Rgb(180, 30, 30),
            accent: Color::Rgb(60, 60, 160),
            status_bg: Color::Rgb(220, 220, 235),
        }
    }

    /// The other palette.
    #[must_use]
    pub const fn toggled(&self) -> Self {
        match self.kind {
            ThemeKind::Dark => Self::light(),
            ThemeKind::Light => Self::dark(),
        }
    }

    /// Normal text style.
    #[must_use]
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg_primary)
    }

    /// Dimmed text style (timestamps, metadata, completed tasks).
    #[must_use]
    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.fg_secondary)
    }

    /// Bold text style.
    #[must_use]
    pub fn bold(&self) -> Style {
        Style::default()
            .fg(self.fg_primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Highlighted text style (focused elements).
    #[must_use]
    pub fn highlighted(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected item style (in lists).
    #[must_use]
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(match self.kind {
                ThemeKind::Dark => Color::Black,
                ThemeKind::Light => Color::White,
            })
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Error text style.
    #[must_use]
    pub fn error(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    /// Success/positive indicator style.
    #[must_use]
    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    /// Accent style (brand, panel titles).
    #[must_use]
    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    /// Style for the status bar line.
    #[must_use]
    pub fn status_bar(&self) -> Style {
        Style::default().fg(self.fg_primary).bg(self.status_bg)
    }

    /// Color for the connection dot.
    #[must_use]
    pub const fn connection_color(&self, connected: bool) -> Color {
        if connected { self.success } else { self.error }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::dark()
    }
}
