//! Task list rendering: the live, snapshot-driven view.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use taskdeck_proto::document::Timestamp;

use crate::app::App;
use crate::tasks::Task;

/// Render the task panel: loading placeholder, persistent sync error, an
/// empty-state hint, or the list itself.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(Span::styled("Tasks", app.palette.accent()))
        .borders(Borders::ALL)
        .border_style(app.palette.dimmed());

    if let Some(reason) = &app.sync_error {
        render_sync_error(frame, area, app, reason, block);
        return;
    }

    if !app.tasks_loaded {
        let loading = Paragraph::new("Loading your tasks...")
            .style(app.palette.dimmed())
            .block(block)
            .centered();
        frame.render_widget(loading, area);
        return;
    }

    if app.tasks.is_empty() {
        let empty = Paragraph::new(vec![
            Line::raw(""),
            Line::styled("No tasks yet", app.palette.bold()),
            Line::styled(
                "Press n to create your first task and get started.",
                app.palette.dimmed(),
            ),
        ])
        .block(block)
        .centered();
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .tasks
        .tasks()
        .iter()
        .enumerate()
        .map(|(i, task)| task_row(app, task, i == app.selected))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// One row of the list: checkbox, title, creation date, state badge.
fn task_row<'a>(app: &App, task: &'a Task, selected: bool) -> ListItem<'a> {
    let checkbox = if task.completed { "[✓]" } else { "[ ]" };
    let title_style = if selected {
        app.palette.selected()
    } else if task.completed {
        app.palette.dimmed()
    } else {
        app.palette.normal()
    };
    let badge = if task.completed {
        Span::styled(" Done", app.palette.success())
    } else {
        Span::styled(" Todo", app.palette.dimmed())
    };

    let line = Line::from(vec![
        Span::styled(checkbox, title_style),
        Span::raw(" "),
        Span::styled(task.title.as_str(), title_style),
        Span::raw("  "),
        Span::styled(
            format_created_at(task.created_at, &app.date_format),
            app.palette.dimmed(),
        ),
        badge,
    ]);
    ListItem::new(line)
}

/// Persistent subscription failure: the only recovery offered is a full
/// reload.
fn render_sync_error(frame: &mut Frame, area: Rect, app: &App, reason: &str, block: Block<'_>) {
    let detail = if reason.contains("index") {
        "The store needs a composite index to run this query. Register it in the service configuration, then reload.".to_string()
    } else {
        reason.to_string()
    };

    let error = Paragraph::new(vec![
        Line::raw(""),
        Line::styled("Query Error", app.palette.error()),
        Line::raw(""),
        Line::styled(detail, app.palette.normal()),
        Line::raw(""),
        Line::styled("Press r to reload.", app.palette.dimmed()),
    ])
    .wrap(Wrap { trim: true })
    .block(block)
    .centered();
    frame.render_widget(error, area);
}

/// Format a creation timestamp for display.
fn format_created_at(ts: Timestamp, format: &str) -> String {
    use chrono::{Local, TimeZone};
    let millis = ts.as_millis();
    let secs = i64::try_from(millis / 1000).unwrap_or(0);
    let nsecs = u32::try_from((millis % 1000) * 1_000_000).unwrap_or(0);
    match Local.timestamp_opt(secs, nsecs) {
        chrono::LocalResult::Single(dt) => dt.format(format).to_string(),
        _ => "—".to_string(),
    }
}
