//! Modal dialog rendering over the task view.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, Modal};
use crate::tasks::title_is_valid;

/// Render the open modal, if any, centered over `area`.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    match &app.modal {
        Some(Modal::Create { input }) => {
            render_title_dialog(
                frame,
                area,
                app,
                "Create Task",
                "Enter a title for your new task. Keep it concise and actionable.",
                &input.text,
                input.cursor,
                "Enter: create",
            );
        }
        Some(Modal::Edit { input, .. }) => {
            render_title_dialog(
                frame,
                area,
                app,
                "Edit Task",
                "Change the title of your task. Press Enter when you're done.",
                &input.text,
                input.cursor,
                "Enter: save",
            );
        }
        Some(Modal::ConfirmDelete { title, busy, .. }) => {
            render_delete_dialog(frame, area, app, title, *busy);
        }
        None => {}
    }
}

/// Shared rendering for the create and edit dialogs: one required title
/// field.
#[allow(clippy::too_many_arguments)]
fn render_title_dialog(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    description: &str,
    text: &str,
    cursor: usize,
    confirm_hint: &str,
) {
    let dialog = centered_rect(area, 48, 8);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .title(Span::styled(format!(" {title} "), app.palette.accent()))
        .borders(Borders::ALL)
        .border_style(app.palette.highlighted());

    let valid = title_is_valid(text);
    let hint = if valid {
        Line::from(vec![
            Span::styled(confirm_hint, app.palette.bold()),
            Span::styled("  Esc: cancel", app.palette.dimmed()),
        ])
    } else {
        Line::styled("Title cannot be empty  Esc: cancel", app.palette.dimmed())
    };

    let body = Paragraph::new(vec![
        Line::styled(description.to_string(), app.palette.dimmed()),
        Line::raw(""),
        Line::from(vec![
            Span::styled("Title: ", app.palette.bold()),
            Span::styled(text.to_string(), app.palette.normal()),
        ]),
        Line::raw(""),
        hint,
    ])
    .wrap(Wrap { trim: false })
    .block(block);
    frame.render_widget(body, dialog);

    // Cursor sits after "Title: " plus the cursor's character offset.
    let inner = dialog.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });
    let cursor_col = u16::try_from(7 + cursor).unwrap_or(u16::MAX);
    frame.set_cursor_position((
        inner.x.saturating_add(cursor_col).min(inner.right().saturating_sub(1)),
        inner.y.saturating_add(2),
    ));
}

/// Delete confirmation dialog showing the task's title.
fn render_delete_dialog(frame: &mut Frame, area: Rect, app: &App, title: &str, busy: bool) {
    let dialog = centered_rect(area, 48, 8);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .title(Span::styled(" Delete Task ", app.palette.error()))
        .borders(Borders::ALL)
        .border_style(app.palette.error());

    let hint = if busy {
        Line::styled("Deleting...", app.palette.dimmed())
    } else {
        Line::from(vec![
            Span::styled("y/Enter: delete", app.palette.bold()),
            Span::styled("  n/Esc: cancel", app.palette.dimmed()),
        ])
    };

    let body = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Are you sure you want to delete ", app.palette.normal()),
            Span::styled(format!("\"{title}\""), app.palette.bold()),
            Span::styled("?", app.palette.normal()),
        ]),
        Line::styled("This action cannot be undone.", app.palette.dimmed()),
        Line::raw(""),
        hint,
    ])
    .wrap(Wrap { trim: false })
    .block(block);
    frame.render_widget(body, dialog);
}

/// A fixed-size rect centered in `area`, clamped to fit.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
