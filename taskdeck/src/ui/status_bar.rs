//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{App, Modal};

/// Render the status bar at the bottom of the task view.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.modal {
        Some(Modal::Create { .. } | Modal::Edit { .. }) => "Enter: save | Esc: cancel",
        Some(Modal::ConfirmDelete { .. }) => "y/Enter: delete | n/Esc: cancel",
        None => {
            if app.sync_error.is_some() {
                "r: reload | q: quit"
            } else {
                "n: new | e: edit | d: delete | Space: toggle | x: sign out | t: theme | q: quit"
            }
        }
    };

    let status_text = app.status.as_deref().unwrap_or(if app.connected {
        "Connected"
    } else {
        "Disconnected"
    });

    let line = Line::from(vec![
        Span::styled("Taskdeck v0.1.0", app.palette.bold()),
        Span::raw(" | "),
        Span::styled(
            "●",
            app.palette
                .normal()
                .fg(app.palette.connection_color(app.connected)),
        ),
        Span::raw(format!(" {status_text}")),
        Span::raw(" | "),
        Span::styled(help_text, app.palette.dimmed()),
    ]);

    frame.render_widget(Paragraph::new(line).style(app.palette.status_bar()), area);
}
