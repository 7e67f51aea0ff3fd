//! Navigation shell rendering: brand, account identity, shell actions.
//!
//! Presentation only, no domain logic.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::App;
use crate::ui::theme::ThemeKind;

/// Render the navigation bar at the top of the task view.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let identity = app.session.shell_identity().unwrap_or("—");
    let theme_label = match app.palette.kind {
        ThemeKind::Dark => "dark",
        ThemeKind::Light => "light",
    };

    let line = Line::from(vec![
        Span::styled("Taskdeck", app.palette.accent()),
        Span::raw("  "),
        Span::styled("Tasks", app.palette.bold()),
        Span::raw("   "),
        Span::styled(identity, app.palette.normal()),
        Span::raw("   "),
        Span::styled(format!("theme: {theme_label}"), app.palette.dimmed()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.palette.dimmed());
    frame.render_widget(Paragraph::new(line).block(block), area);
}
