//! Onboarding (sign-up) screen rendering.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::{App, InputState, SignupField};

/// Width of the centered form card.
const CARD_WIDTH: u16 = 56;

/// Render the sign-up screen: a centered card with the four form fields,
/// inline validation, and the federated sign-in hint.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let card = centered_card(area);
    let block = Block::default()
        .title(Span::styled(" Create an account ", app.palette.accent()))
        .borders(Borders::ALL)
        .border_style(app.palette.dimmed());
    frame.render_widget(block, card);

    let inner = card.inner(ratatui::layout::Margin {
        horizontal: 2,
        vertical: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // description
            Constraint::Length(1), // error line
            Constraint::Length(2), // name
            Constraint::Length(2), // email
            Constraint::Length(2), // password
            Constraint::Length(2), // confirm
            Constraint::Length(1), // password match hint
            Constraint::Min(1),    // key hints
        ])
        .split(inner);

    let description = Paragraph::new(
        "Enter your details below to create your account and start managing tasks.",
    )
    .style(app.palette.dimmed());
    frame.render_widget(description, rows[0]);

    if let Some(error) = &app.signup.error {
        frame.render_widget(
            Paragraph::new(error.as_str()).style(app.palette.error()),
            rows[1],
        );
    }

    render_field(frame, rows[2], app, "Full Name", &app.signup.name, SignupField::Name, false);
    render_field(frame, rows[3], app, "Email", &app.signup.email, SignupField::Email, false);
    render_field(
        frame,
        rows[4],
        app,
        "Password",
        &app.signup.password,
        SignupField::Password,
        true,
    );
    render_field(
        frame,
        rows[5],
        app,
        "Confirm Password",
        &app.signup.confirm,
        SignupField::Confirm,
        true,
    );

    if !app.signup.confirm.text.is_empty() {
        let (hint, style) = if app.signup.passwords_match() {
            ("Passwords match", app.palette.success())
        } else {
            ("Passwords do not match", app.palette.error())
        };
        frame.render_widget(Paragraph::new(hint).style(style), rows[6]);
    }

    let hints = Line::from(vec![
        Span::styled("Enter", app.palette.bold()),
        Span::styled(": create account  ", app.palette.dimmed()),
        Span::styled("Ctrl+G", app.palette.bold()),
        Span::styled(": continue with Google  ", app.palette.dimmed()),
        Span::styled("Tab", app.palette.bold()),
        Span::styled(": next field  ", app.palette.dimmed()),
        Span::styled("Esc", app.palette.bold()),
        Span::styled(": quit", app.palette.dimmed()),
    ]);
    frame.render_widget(Paragraph::new(hints), rows[7]);
}

/// One labeled input line: `Label: value`, highlighted when focused.
fn render_field(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    label: &str,
    input: &InputState,
    field: SignupField,
    masked: bool,
) {
    let focused = app.signup.focus == field;
    let label_style = if focused {
        app.palette.highlighted()
    } else {
        app.palette.dimmed()
    };
    let shown = if masked {
        "\u{2022}".repeat(input.text.chars().count())
    } else {
        input.text.clone()
    };

    let line = Line::from(vec![
        Span::styled(format!("{label:>17}: "), label_style),
        Span::styled(shown, app.palette.normal()),
    ]);
    frame.render_widget(Paragraph::new(line), area);

    if focused {
        let prefix = 17 + 2;
        let cursor_col = u16::try_from(prefix + input.cursor).unwrap_or(u16::MAX);
        frame.set_cursor_position((
            area.x.saturating_add(cursor_col).min(area.right().saturating_sub(1)),
            area.y,
        ));
    }
}

/// Centers the form card in the available area.
fn centered_card(area: Rect) -> Rect {
    let width = CARD_WIDTH.min(area.width);
    let height = 16.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
