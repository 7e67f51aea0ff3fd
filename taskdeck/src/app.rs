//! Application state and event handling.
//!
//! The app is a state machine driven from two sides: key events from the
//! terminal (possibly producing a [`NetCommand`] for the sync layer) and
//! [`NetEvent`]s pushed by the sync layer. Which screen renders is derived
//! from the session — the route-guard rule: loading placeholder while the
//! session resolves, onboarding when signed out, the task view when
//! signed in.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use taskdeck_proto::document::DocumentId;

use crate::net::{NetCommand, NetEvent};
use crate::session::{AuthFlow, SessionState, auth_error_message};
use crate::tasks::{TaskList, title_is_valid};
use crate::ui::theme::Palette;

/// Which top-level view renders, derived from session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Session resolution pending.
    Loading,
    /// Signed out: onboarding (sign-up) form.
    SignUp,
    /// Signed in: the protected task view.
    Tasks,
}

/// A single-line text input with a cursor.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current text.
    pub text: String,
    /// Cursor position as a character index.
    pub cursor: usize,
}

impl InputState {
    /// Creates an input pre-filled with `text`, cursor at the end.
    #[must_use]
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor)
            .map_or(self.text.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor position.
    pub fn enter_char(&mut self, c: char) {
        let at = self.byte_index();
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.text.remove(at);
    }

    /// Move cursor left.
    pub const fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.text.chars().count() {
            self.cursor += 1;
        }
    }
}

/// Focusable fields of the sign-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignupField {
    /// Full name.
    #[default]
    Name,
    /// Email address.
    Email,
    /// Password.
    Password,
    /// Password confirmation.
    Confirm,
}

impl SignupField {
    /// Next field in tab order, wrapping.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Name => Self::Email,
            Self::Email => Self::Password,
            Self::Password => Self::Confirm,
            Self::Confirm => Self::Name,
        }
    }

    /// Previous field in tab order, wrapping.
    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Name => Self::Confirm,
            Self::Email => Self::Name,
            Self::Password => Self::Email,
            Self::Confirm => Self::Password,
        }
    }
}

/// State of the onboarding form.
#[derive(Debug, Default)]
pub struct SignupForm {
    /// Full name input.
    pub name: InputState,
    /// Email input.
    pub email: InputState,
    /// Password input.
    pub password: InputState,
    /// Confirmation input.
    pub confirm: InputState,
    /// Currently focused field.
    pub focus: SignupField,
    /// Inline error line, if any.
    pub error: Option<String>,
}

impl SignupForm {
    fn focused_input(&mut self) -> &mut InputState {
        match self.focus {
            SignupField::Name => &mut self.name,
            SignupField::Email => &mut self.email,
            SignupField::Password => &mut self.password,
            SignupField::Confirm => &mut self.confirm,
        }
    }

    /// True when both password fields are non-empty and equal.
    #[must_use]
    pub fn passwords_match(&self) -> bool {
        !self.confirm.text.is_empty() && self.password.text == self.confirm.text
    }
}

/// A modal dialog over the task view.
#[derive(Debug)]
pub enum Modal {
    /// Create-task dialog: one required title field.
    Create {
        /// Title input.
        input: InputState,
    },
    /// Edit-task dialog, pre-filled with the current title.
    Edit {
        /// Task being edited.
        id: DocumentId,
        /// Title input.
        input: InputState,
    },
    /// Delete confirmation showing the task's title.
    ConfirmDelete {
        /// Task being deleted.
        id: DocumentId,
        /// Title shown for confirmation.
        title: String,
        /// Set while the delete is being handed off; blocks repeats.
        busy: bool,
    },
}

/// Main application state.
pub struct App {
    /// Mirrored session state.
    pub session: SessionState,
    /// Auth flow awaiting a verdict, for error-message mapping.
    pub auth_flow: Option<AuthFlow>,
    /// Onboarding form state.
    pub signup: SignupForm,
    /// Live task list, replaced wholesale by snapshots.
    pub tasks: TaskList,
    /// Selected row in the task list.
    pub selected: usize,
    /// False until the first snapshot after subscribing.
    pub tasks_loaded: bool,
    /// Persistent subscription failure; recovery is reload only.
    pub sync_error: Option<String>,
    /// Transient status-line notice.
    pub status: Option<String>,
    /// Open modal dialog, if any.
    pub modal: Option<Modal>,
    /// A modal confirmed and awaiting command dispatch.
    modal_pending_close: bool,
    /// Active color palette.
    pub palette: Palette,
    /// chrono format string for creation dates in the list.
    pub date_format: String,
    /// Whether the gateway connection is alive.
    pub connected: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Whether the user asked for a full reload.
    pub reload_requested: bool,
}

impl App {
    /// Creates the initial application state: session resolving, nothing
    /// loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            session: SessionState::resolving(),
            auth_flow: None,
            signup: SignupForm::default(),
            tasks: TaskList::new(),
            selected: 0,
            tasks_loaded: false,
            sync_error: None,
            status: None,
            modal: None,
            modal_pending_close: false,
            palette: Palette::dark(),
            date_format: "%Y-%m-%d".to_string(),
            connected: true,
            should_quit: false,
            reload_requested: false,
        }
    }

    /// Sets the chrono format string used for creation dates.
    #[must_use]
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    /// The screen to render, derived from session state (the route guard).
    #[must_use]
    pub const fn screen(&self) -> Screen {
        if self.session.loading {
            Screen::Loading
        } else if self.session.user.is_some() {
            Screen::Tasks
        } else {
            Screen::SignUp
        }
    }

    /// Handle a key event. Returns a command when the action needs the
    /// sync layer.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<NetCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match self.screen() {
            Screen::Loading => {
                if key.code == KeyCode::Esc {
                    self.should_quit = true;
                }
                None
            }
            Screen::SignUp => self.handle_signup_key(key),
            Screen::Tasks => {
                self.status = None;
                if self.modal.is_some() {
                    self.handle_modal_key(key)
                } else {
                    self.handle_tasks_key(key)
                }
            }
        }
    }

    /// Key handling on the onboarding screen.
    fn handle_signup_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        if key.code == KeyCode::Char('g') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.signup.error = None;
            self.auth_flow = Some(AuthFlow::Federated);
            return Some(NetCommand::SignInFederated);
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                None
            }
            KeyCode::Tab | KeyCode::Down => {
                self.signup.focus = self.signup.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.signup.focus = self.signup.focus.prev();
                None
            }
            KeyCode::Enter => self.submit_signup(),
            KeyCode::Char(c) => {
                self.signup.focused_input().enter_char(c);
                None
            }
            KeyCode::Backspace => {
                self.signup.focused_input().delete_char();
                None
            }
            KeyCode::Left => {
                self.signup.focused_input().move_left();
                None
            }
            KeyCode::Right => {
                self.signup.focused_input().move_right();
                None
            }
            _ => None,
        }
    }

    /// Validates and submits the sign-up form.
    fn submit_signup(&mut self) -> Option<NetCommand> {
        if !self.signup.passwords_match() {
            self.signup.error = Some("Passwords do not match".to_string());
            return None;
        }
        self.signup.error = None;
        self.auth_flow = Some(AuthFlow::Credential);
        Some(NetCommand::SignUp {
            email: self.signup.email.text.clone(),
            password: self.signup.password.text.clone(),
            display_name: self.signup.name.text.clone(),
        })
    }

    /// Key handling on the task view with no modal open.
    fn handle_tasks_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('x') => Some(NetCommand::SignOut),
            KeyCode::Char('t') => {
                self.palette = self.palette.toggled();
                None
            }
            KeyCode::Char('r') => {
                if self.sync_error.is_some() || !self.connected {
                    self.reload_requested = true;
                }
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.tasks.len() {
                    self.selected += 1;
                }
                None
            }
            KeyCode::Char('n') => {
                self.modal = Some(Modal::Create {
                    input: InputState::default(),
                });
                None
            }
            KeyCode::Char('e') => {
                self.modal = self.tasks.get(self.selected).map(|task| Modal::Edit {
                    id: task.id.clone(),
                    input: InputState::with_text(&task.title),
                });
                None
            }
            KeyCode::Char('d') => {
                self.modal = self
                    .tasks
                    .get(self.selected)
                    .map(|task| Modal::ConfirmDelete {
                        id: task.id.clone(),
                        title: task.title.clone(),
                        busy: false,
                    });
                None
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.tasks.get(self.selected).map(|task| NetCommand::ToggleTask {
                    id: task.id.clone(),
                    current_completed: task.completed,
                })
            }
            _ => None,
        }
    }

    /// Key handling while a modal dialog is open.
    fn handle_modal_key(&mut self, key: KeyEvent) -> Option<NetCommand> {
        let mut close = false;
        let mut pending = false;
        let mut cmd = None;

        match self.modal.as_mut() {
            Some(Modal::Create { input }) => match key.code {
                KeyCode::Esc => close = true,
                KeyCode::Enter => {
                    // Confirm is disabled while the trimmed title is empty.
                    if title_is_valid(&input.text) {
                        cmd = Some(NetCommand::CreateTask {
                            title: input.text.clone(),
                        });
                        pending = true;
                    }
                }
                KeyCode::Char(c) => input.enter_char(c),
                KeyCode::Backspace => input.delete_char(),
                KeyCode::Left => input.move_left(),
                KeyCode::Right => input.move_right(),
                _ => {}
            },
            Some(Modal::Edit { id, input }) => match key.code {
                KeyCode::Esc => close = true,
                KeyCode::Enter => {
                    if title_is_valid(&input.text) {
                        cmd = Some(NetCommand::RenameTask {
                            id: id.clone(),
                            title: input.text.clone(),
                        });
                        pending = true;
                    }
                }
                KeyCode::Char(c) => input.enter_char(c),
                KeyCode::Backspace => input.delete_char(),
                KeyCode::Left => input.move_left(),
                KeyCode::Right => input.move_right(),
                _ => {}
            },
            Some(Modal::ConfirmDelete { id, busy, .. }) => match key.code {
                KeyCode::Esc | KeyCode::Char('n') => close = !*busy,
                KeyCode::Enter | KeyCode::Char('y') => {
                    if !*busy {
                        *busy = true;
                        cmd = Some(NetCommand::DeleteTask { id: id.clone() });
                        pending = true;
                    }
                }
                _ => {}
            },
            None => {}
        }

        if close {
            self.modal = None;
        }
        if pending {
            self.modal_pending_close = true;
        }
        cmd
    }

    /// Reports whether the command produced by the last key event reached
    /// the sync layer. A confirmed modal closes on success; on a full
    /// channel it stays open and re-arms.
    pub fn command_dispatched(&mut self, accepted: bool) {
        if !self.modal_pending_close {
            return;
        }
        self.modal_pending_close = false;
        if accepted {
            self.modal = None;
        } else if let Some(Modal::ConfirmDelete { busy, .. }) = self.modal.as_mut() {
            *busy = false;
        }
    }

    /// Applies one event pushed by the sync layer.
    pub fn apply_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::SessionChanged { user } => {
                let was_signed_in = self.session.is_signed_in();
                self.session = SessionState::resolved(user);
                self.auth_flow = None;

                if self.session.is_signed_in() && !was_signed_in {
                    // Fresh owner: reset the protected view for a new
                    // subscription.
                    self.tasks.clear();
                    self.tasks_loaded = false;
                    self.sync_error = None;
                    self.selected = 0;
                    self.signup = SignupForm::default();
                } else if !self.session.is_signed_in() {
                    // Guard redirect: nothing of the protected view survives.
                    self.tasks.clear();
                    self.tasks_loaded = false;
                    self.modal = None;
                    self.modal_pending_close = false;
                    self.selected = 0;
                }
            }
            NetEvent::AuthRejected { code } => {
                let flow = self.auth_flow.take().unwrap_or(AuthFlow::Credential);
                self.signup.error = Some(auth_error_message(code, flow).to_string());
            }
            NetEvent::TasksSnapshot { documents } => {
                self.tasks.apply_snapshot(&documents);
                self.tasks_loaded = true;
                if self.selected >= self.tasks.len() {
                    self.selected = self.tasks.len().saturating_sub(1);
                }
            }
            NetEvent::SubscriptionFailed { reason } => {
                self.sync_error = Some(reason);
            }
            NetEvent::MutationFailed { reason } => {
                self.status = Some(format!("Change not saved: {reason}"));
            }
            NetEvent::ConnectionLost => {
                self.connected = false;
                if self.session.is_signed_in() {
                    self.sync_error = Some("connection to the service was lost".to_string());
                }
            }
            NetEvent::Error(reason) => {
                self.status = Some(reason);
            }
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
