//! Sync coordinator wiring the TUI to the service gateway.
//!
//! This module bridges the synchronous TUI event loop (crossterm
//! poll-based) with the async [`Gateway`] connection. It spawns background
//! tokio tasks and communicates with the main thread via [`NetCommand`] /
//! [`NetEvent`] channels.
//!
//! ```text
//! TUI (main thread)  ←── NetEvent ───  tokio background tasks
//!                     ─── NetCommand →
//! ```
//!
//! It also owns the live subscription lifecycle: when the session resolves
//! to an owner, the tasks query is subscribed; when the owner goes away
//! (sign-out) or changes, the old subscription is released and snapshots
//! for it are ignored. Mutations are fire-and-forget — the list only
//! changes when the next snapshot arrives.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use taskdeck_proto::auth::{AuthErrorCode, FederatedProvider, UserProfile};
use taskdeck_proto::document::{Document, DocumentId};
use taskdeck_proto::wire::{ClientMessage, ServerMessage, SubscriptionId};

use crate::gateway::remote::RemoteGateway;
use crate::gateway::Gateway;
use crate::tasks::{TASKS_COLLECTION, new_task_fields, owner_query, rename_fields, toggle_fields};

/// Commands sent from the TUI main loop to the sync background tasks.
#[derive(Debug)]
pub enum NetCommand {
    /// Create an account and sign the session in.
    SignUp {
        /// Account email address.
        email: String,
        /// Account password.
        password: String,
        /// Display name applied to the new profile.
        display_name: String,
    },
    /// Sign in via the federated provider.
    SignInFederated,
    /// Terminate the session.
    SignOut,
    /// Create a task with the given (raw) title.
    CreateTask {
        /// Title exactly as entered; validation already happened.
        title: String,
    },
    /// Flip a task's completion flag from the caller-believed value.
    ToggleTask {
        /// Task to toggle.
        id: DocumentId,
        /// The pre-toggle value the caller observed.
        current_completed: bool,
    },
    /// Rewrite a task's title (trimmed before the write).
    RenameTask {
        /// Task to rename.
        id: DocumentId,
        /// New title as entered.
        title: String,
    },
    /// Delete a task unconditionally.
    DeleteTask {
        /// Task to delete.
        id: DocumentId,
    },
    /// Gracefully shut down the sync tasks.
    Shutdown,
}

/// Events sent from the sync background tasks to the TUI main loop.
#[derive(Debug)]
pub enum NetEvent {
    /// The session changed (including the initial resolution).
    SessionChanged {
        /// The signed-in user, or `None`.
        user: Option<UserProfile>,
    },
    /// An auth operation was rejected. The app maps the code to a
    /// user-facing message because it knows which flow it attempted.
    AuthRejected {
        /// The service's error code.
        code: AuthErrorCode,
    },
    /// A fresh snapshot for the active subscription. Replaces the whole
    /// task list.
    TasksSnapshot {
        /// All matching documents, in query order.
        documents: Vec<Document>,
    },
    /// The subscription failed; no more snapshots will arrive. Recovery
    /// is a full reload only.
    SubscriptionFailed {
        /// Human-readable failure description.
        reason: String,
    },
    /// A fire-and-forget mutation was rejected by the service.
    MutationFailed {
        /// Human-readable failure description.
        reason: String,
    },
    /// The gateway connection is gone.
    ConnectionLost,
    /// A service-level error not tied to a specific operation.
    Error(String),
}

/// Configuration for the sync layer.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// WebSocket URL of the service (e.g., `ws://127.0.0.1:9400/ws`).
    pub service_url: String,
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,
    /// Channel capacity for command/event mpsc channels.
    pub channel_capacity: usize,
}

/// Default channel capacity for commands and events.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

impl NetConfig {
    /// Creates a `NetConfig` with default capacities and timeout.
    #[must_use]
    pub fn new(service_url: String) -> Self {
        Self {
            service_url,
            connect_timeout: Duration::from_secs(10),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Owner and subscription currently driving the task view.
#[derive(Debug, Default)]
struct SyncState {
    /// The signed-in uid, if any.
    owner: Option<String>,
    /// The active subscription, if any.
    subscription: Option<SubscriptionId>,
    /// Display name to apply once a pending sign-up resolves. Account
    /// creation and the profile update are separate service operations;
    /// the second is sent only after the first produced a session.
    pending_display_name: Option<String>,
}

/// Connects to the service and spawns the sync background tasks.
///
/// Spawns:
/// 1. A **receive loop** that decodes pushed [`ServerMessage`]s, drives
///    the subscription lifecycle off auth-state changes, and forwards
///    [`NetEvent`]s.
/// 2. A **command handler** that maps [`NetCommand`]s to wire messages.
///
/// # Errors
///
/// Returns an error string if the connection cannot be established. The
/// caller decides how to surface it (the startup path exits; the reload
/// path shows the error and lets the user retry).
pub async fn spawn_net(
    config: NetConfig,
) -> Result<(mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>), String> {
    let gateway = RemoteGateway::connect(&config.service_url, config.connect_timeout)
        .await
        .map_err(|e| format!("service connection failed: {e}"))?;
    Ok(spawn_with_gateway(gateway, config.channel_capacity))
}

/// Spawns the sync tasks over an already-connected gateway.
///
/// Split out from [`spawn_net`] so tests can drive the sync layer through
/// a loopback gateway.
pub fn spawn_with_gateway<G: Gateway + 'static>(
    gateway: G,
    channel_capacity: usize,
) -> (mpsc::Sender<NetCommand>, mpsc::Receiver<NetEvent>) {
    let gateway = Arc::new(gateway);
    let state = Arc::new(Mutex::new(SyncState::default()));

    let (cmd_tx, cmd_rx) = mpsc::channel::<NetCommand>(channel_capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<NetEvent>(channel_capacity);

    let recv_gateway = Arc::clone(&gateway);
    let recv_state = Arc::clone(&state);
    let recv_evt_tx = evt_tx.clone();
    tokio::spawn(async move {
        receive_loop(recv_gateway, recv_state, recv_evt_tx).await;
    });

    tokio::spawn(async move {
        command_handler(gateway, state, cmd_rx, evt_tx).await;
    });

    (cmd_tx, evt_rx)
}

/// Background task: continuously receive pushed service messages.
async fn receive_loop<G: Gateway>(
    gateway: Arc<G>,
    state: Arc<Mutex<SyncState>>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    loop {
        match gateway.recv().await {
            Ok(msg) => {
                handle_server_message(msg, &gateway, &state, &evt_tx).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "gateway receive failed");
                let _ = evt_tx.send(NetEvent::ConnectionLost).await;
                break;
            }
        }
    }
}

/// Applies one pushed message: session changes drive the subscription
/// lifecycle, snapshots are forwarded only for the active subscription.
async fn handle_server_message<G: Gateway>(
    msg: ServerMessage,
    gateway: &Arc<G>,
    state: &Arc<Mutex<SyncState>>,
    evt_tx: &mpsc::Sender<NetEvent>,
) {
    match msg {
        ServerMessage::AuthState { user } => {
            reconcile_owner(user.as_ref(), gateway, state, evt_tx).await;
            if user.is_some() {
                apply_pending_display_name(gateway, state).await;
            }
            let _ = evt_tx.send(NetEvent::SessionChanged { user }).await;
        }
        ServerMessage::AuthRejected { code } => {
            // A rejected sign-up also cancels the queued profile update.
            state.lock().await.pending_display_name = None;
            let _ = evt_tx.send(NetEvent::AuthRejected { code }).await;
        }
        ServerMessage::Snapshot {
            subscription_id,
            documents,
        } => {
            let is_active = {
                let state = state.lock().await;
                state.subscription.as_ref() == Some(&subscription_id)
            };
            if is_active {
                let _ = evt_tx.send(NetEvent::TasksSnapshot { documents }).await;
            } else {
                tracing::debug!(
                    subscription = %subscription_id,
                    "ignoring snapshot for released subscription"
                );
            }
        }
        ServerMessage::SubscriptionError {
            subscription_id,
            reason,
        } => {
            let mut state = state.lock().await;
            if state.subscription.as_ref() == Some(&subscription_id) {
                state.subscription = None;
                drop(state);
                tracing::error!(reason = %reason, "task subscription failed");
                let _ = evt_tx.send(NetEvent::SubscriptionFailed { reason }).await;
            }
        }
        ServerMessage::WriteFailed { reason } => {
            tracing::warn!(reason = %reason, "mutation rejected by service");
            let _ = evt_tx.send(NetEvent::MutationFailed { reason }).await;
        }
        ServerMessage::Error { reason } => {
            tracing::warn!(reason = %reason, "service error");
            let _ = evt_tx.send(NetEvent::Error(reason)).await;
        }
    }
}

/// Drives the subscription lifecycle when the session's owner changes:
/// release the old subscription, establish a new one for the new owner.
async fn reconcile_owner<G: Gateway>(
    user: Option<&UserProfile>,
    gateway: &Arc<G>,
    state: &Arc<Mutex<SyncState>>,
    evt_tx: &mpsc::Sender<NetEvent>,
) {
    let new_owner = user.map(|u| u.uid.clone());
    let mut state = state.lock().await;
    if state.owner == new_owner {
        return;
    }

    if let Some(old_sub) = state.subscription.take() {
        tracing::info!(subscription = %old_sub, "releasing task subscription");
        if let Err(e) = gateway
            .send(ClientMessage::Unsubscribe {
                subscription_id: old_sub,
            })
            .await
        {
            tracing::warn!(error = %e, "failed to send unsubscribe");
        }
    }

    state.owner.clone_from(&new_owner);

    if let Some(uid) = new_owner {
        let subscription_id = SubscriptionId::new();
        tracing::info!(subscription = %subscription_id, "subscribing to task query");
        match gateway
            .send(ClientMessage::Subscribe {
                subscription_id: subscription_id.clone(),
                query: owner_query(&uid),
            })
            .await
        {
            Ok(()) => state.subscription = Some(subscription_id),
            Err(e) => {
                tracing::error!(error = %e, "failed to establish task subscription");
                drop(state);
                let _ = evt_tx
                    .send(NetEvent::SubscriptionFailed {
                        reason: e.to_string(),
                    })
                    .await;
            }
        }
    }
}

/// Sends the queued display name once a sign-up produced a session.
async fn apply_pending_display_name<G: Gateway>(gateway: &Arc<G>, state: &Arc<Mutex<SyncState>>) {
    let pending = { state.lock().await.pending_display_name.take() };
    if let Some(display_name) = pending {
        if let Err(e) = gateway
            .send(ClientMessage::UpdateProfile { display_name })
            .await
        {
            tracing::warn!(error = %e, "failed to send profile update");
        }
    }
}

/// Background task: map commands from the TUI to wire messages.
///
/// Each mutation is a single independent send; nothing waits for the
/// snapshot reflecting it.
async fn command_handler<G: Gateway>(
    gateway: Arc<G>,
    state: Arc<Mutex<SyncState>>,
    mut cmd_rx: mpsc::Receiver<NetCommand>,
    evt_tx: mpsc::Sender<NetEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            NetCommand::SignUp {
                email,
                password,
                display_name,
            } => {
                {
                    let mut state = state.lock().await;
                    state.pending_display_name = if display_name.trim().is_empty() {
                        None
                    } else {
                        Some(display_name)
                    };
                }
                send_auth(&gateway, &evt_tx, ClientMessage::SignUp { email, password }).await;
            }
            NetCommand::SignInFederated => {
                send_auth(
                    &gateway,
                    &evt_tx,
                    ClientMessage::SignInFederated {
                        provider: FederatedProvider::Google,
                    },
                )
                .await;
            }
            NetCommand::SignOut => {
                send_auth(&gateway, &evt_tx, ClientMessage::SignOut).await;
            }
            NetCommand::CreateTask { title } => {
                let owner = { state.lock().await.owner.clone() };
                if let Some(uid) = owner {
                    send_mutation(
                        &gateway,
                        &evt_tx,
                        ClientMessage::Add {
                            collection: TASKS_COLLECTION.to_string(),
                            fields: new_task_fields(&title, &uid),
                        },
                    )
                    .await;
                } else {
                    tracing::warn!("create task issued without a session, dropping");
                }
            }
            NetCommand::ToggleTask {
                id,
                current_completed,
            } => {
                send_mutation(
                    &gateway,
                    &evt_tx,
                    ClientMessage::Update {
                        collection: TASKS_COLLECTION.to_string(),
                        document_id: id,
                        fields: toggle_fields(current_completed),
                    },
                )
                .await;
            }
            NetCommand::RenameTask { id, title } => {
                send_mutation(
                    &gateway,
                    &evt_tx,
                    ClientMessage::Update {
                        collection: TASKS_COLLECTION.to_string(),
                        document_id: id,
                        fields: rename_fields(&title),
                    },
                )
                .await;
            }
            NetCommand::DeleteTask { id } => {
                send_mutation(
                    &gateway,
                    &evt_tx,
                    ClientMessage::Delete {
                        collection: TASKS_COLLECTION.to_string(),
                        document_id: id,
                    },
                )
                .await;
            }
            NetCommand::Shutdown => {
                tracing::info!("sync command handler shutting down");
                break;
            }
        }
    }
}

/// Sends an auth operation; a transport failure surfaces as a generic
/// error event.
async fn send_auth<G: Gateway>(
    gateway: &Arc<G>,
    evt_tx: &mpsc::Sender<NetEvent>,
    msg: ClientMessage,
) {
    if let Err(e) = gateway.send(msg).await {
        tracing::warn!(error = %e, "auth operation send failed");
        let _ = evt_tx.send(NetEvent::Error(format!("Send failed: {e}"))).await;
    }
}

/// Sends a mutation; a transport failure surfaces as a mutation failure.
async fn send_mutation<G: Gateway>(
    gateway: &Arc<G>,
    evt_tx: &mpsc::Sender<NetEvent>,
    msg: ClientMessage,
) {
    if let Err(e) = gateway.send(msg).await {
        tracing::warn!(error = %e, "mutation send failed");
        let _ = evt_tx
            .send(NetEvent::MutationFailed {
                reason: e.to_string(),
            })
            .await;
    }
}
