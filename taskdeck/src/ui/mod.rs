//! Terminal UI rendering.

pub mod dialog;
pub mod nav_bar;
pub mod signup_panel;
pub mod status_bar;
pub mod task_panel;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    widgets::Paragraph,
};

use crate::app::{App, Screen};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    match app.screen() {
        Screen::Loading => {
            let placeholder = Paragraph::new("Loading....")
                .style(app.palette.dimmed())
                .centered();
            frame.render_widget(placeholder, frame.area());
        }
        Screen::SignUp => {
            signup_panel::render(frame, frame.area(), app);
        }
        Screen::Tasks => {
            // Nav shell on top, task list in the middle, status bar below.
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(frame.area());

            nav_bar::render(frame, chunks[0], app);
            task_panel::render(frame, chunks[1], app);
            status_bar::render(frame, chunks[2], app);

            if app.modal.is_some() {
                dialog::render(frame, frame.area(), app);
            }
        }
    }
}
