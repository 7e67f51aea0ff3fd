//! Taskdeck — terminal task manager.
//!
//! Launches the TUI and connects to the Taskdeck sync service (by default
//! a local emulator). Configuration via CLI flags, environment variables,
//! or config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # Against the local emulator on the default address
//! cargo run --bin taskdeck
//!
//! # Against a specific service endpoint
//! cargo run --bin taskdeck -- --service-url ws://127.0.0.1:7000/ws
//!
//! # Or via environment variable
//! TASKDECK_SERVICE_URL=ws://127.0.0.1:7000/ws cargo run --bin taskdeck
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::app::App;
use taskdeck::config::{CliArgs, ClientConfig};
use taskdeck::net::{self, NetCommand, NetEvent};
use taskdeck::session::SessionState;
use taskdeck::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("taskdeck starting");

    // Connect before touching the terminal so a hard failure prints cleanly.
    let (cmd_tx, evt_rx) = match net::spawn_net(config.to_net_config()).await {
        Ok(channels) => channels,
        Err(e) => {
            eprintln!("Could not connect to the service at {}: {e}", config.service_url);
            std::process::exit(1);
        }
    };

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, &config, cmd_tx, evt_rx).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("taskdeck exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until shutdown
/// to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdeck.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
    mut cmd_tx: mpsc::Sender<NetCommand>,
    mut evt_rx: mpsc::Receiver<NetEvent>,
) -> io::Result<()> {
    let mut app = App::new().with_date_format(&config.date_format);

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending NetEvents (non-blocking).
        drain_net_events(&mut app, &mut evt_rx);

        // Step 3: Handle a requested reload — tear the connection down and
        // rebuild it, the closest thing a TUI has to a full page reload.
        if app.reload_requested {
            app.reload_requested = false;
            let _ = cmd_tx.try_send(NetCommand::Shutdown);
            match net::spawn_net(config.to_net_config()).await {
                Ok((tx, rx)) => {
                    cmd_tx = tx;
                    evt_rx = rx;
                    app.session = SessionState::resolving();
                    app.tasks.clear();
                    app.tasks_loaded = false;
                    app.sync_error = None;
                    app.status = None;
                    app.connected = true;
                    tracing::info!("reloaded service connection");
                }
                Err(e) => {
                    tracing::error!(error = %e, "reload failed");
                    app.sync_error = Some(format!("reload failed: {e}"));
                }
            }
        }

        // Step 4: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // handle_key_event returns Some(NetCommand) when the action
            // needs the sync layer (auth operations and task mutations).
            if let Some(net_cmd) = app.handle_key_event(key) {
                match cmd_tx.try_send(net_cmd) {
                    Ok(()) => app.command_dispatched(true),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        app.command_dispatched(false);
                        app.status = Some("Service busy, try again".to_string());
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        app.command_dispatched(false);
                        app.status = Some("Disconnected from the service".to_string());
                    }
                }
            }
        }

        if app.should_quit {
            // Send shutdown command to the sync tasks.
            let _ = cmd_tx.try_send(NetCommand::Shutdown);
            return Ok(());
        }
    }
}

/// Drain all pending `NetEvent`s from the receiver and apply them to the app.
fn drain_net_events(app: &mut App, rx: &mut mpsc::Receiver<NetEvent>) {
    while let Ok(event) = rx.try_recv() {
        app.apply_net_event(event);
    }
}
