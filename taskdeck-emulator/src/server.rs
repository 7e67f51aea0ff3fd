//! WebSocket endpoint and connection lifecycle for the emulator.
//!
//! Each connection follows the same shape: wait for the client's `Hello`,
//! push the current auth state, then loop over incoming messages. A
//! per-connection writer task forwards [`ServerMessage`]s from an
//! unbounded channel to the socket; the document store pushes snapshots
//! into the same channel, so subscription traffic and direct replies
//! share one ordered outbound stream.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use taskdeck_proto::auth::{AuthErrorCode, UserProfile};
use taskdeck_proto::wire::{self, ClientMessage, ServerMessage, SubscriptionId};

use crate::accounts::AccountRegistry;
use crate::config::EmulatorConfig;
use crate::store::{CompositeIndex, DocumentStore};

/// Shared emulator state: accounts, documents, and behavior knobs.
pub struct EmulatorState {
    /// Registered accounts.
    pub accounts: AccountRegistry,
    /// Document collections and live subscriptions.
    pub store: DocumentStore,
    /// Identity handed out by federated sign-in.
    federated_email: String,
    /// When set, federated sign-in fails with the popup-blocked code.
    popup_blocked: bool,
}

impl EmulatorState {
    /// Builds emulator state from a resolved configuration.
    #[must_use]
    pub fn from_config(config: &EmulatorConfig) -> Self {
        let indexes = config
            .composite_indexes
            .iter()
            .map(|idx| CompositeIndex {
                collection: idx.collection.clone(),
                filter_field: idx.filter_field.clone(),
                order_field: idx.order_field.clone(),
            })
            .collect();
        Self {
            accounts: AccountRegistry::new(),
            store: DocumentStore::new(indexes),
            federated_email: config.federated_email.clone(),
            popup_blocked: config.popup_blocked,
        }
    }
}

/// Binds the listener and serves the emulator until the handle is dropped
/// or aborted. Returns the bound address (useful with port 0) and the
/// server task handle.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound.
pub async fn start_server(
    bind_addr: &str,
    state: Arc<EmulatorState>,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "emulator server failed");
        }
    });

    Ok((addr, handle))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<EmulatorState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handles one client connection from handshake to teardown.
async fn handle_socket(socket: WebSocket, state: Arc<EmulatorState>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    if !wait_for_hello(&mut ws_receiver).await {
        tracing::warn!("connection closed before Hello");
        return;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: encode and forward everything pushed at this connection.
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let bytes = match wire::encode_server(&msg) {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode server message");
                    continue;
                }
            };
            if ws_sender.send(Message::Binary(bytes.into())).await.is_err() {
                tracing::debug!("WebSocket write failed, client gone");
                break;
            }
        }
    });

    let mut conn = Connection {
        state,
        outbound: tx,
        session: None,
        subscriptions: Vec::new(),
    };

    // The session starts signed out; this is the push that resolves the
    // client's loading state.
    conn.push_auth_state();

    // Reader loop: process messages until the client disconnects.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Binary(data) => match wire::decode_client(&data) {
                Ok(client_msg) => conn.handle_message(client_msg).await,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode client message");
                    conn.push(ServerMessage::Error {
                        reason: format!("malformed message: {e}"),
                    });
                }
            },
            Message::Close(_) => {
                tracing::debug!("received close frame");
                break;
            }
            _ => {
                // Ignore text, ping, pong frames.
            }
        }
    }

    conn.release_subscriptions().await;
    write_task.abort();
    let _ = (&mut write_task).await;
    tracing::debug!("connection closed");
}

/// Waits for the first binary frame and checks it is `Hello`.
async fn wait_for_hello(
    receiver: &mut (impl StreamExt<Item = Result<Message, axum::Error>> + Unpin),
) -> bool {
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Binary(data) => match wire::decode_client(&data) {
                Ok(ClientMessage::Hello) => return true,
                Ok(other) => {
                    tracing::warn!(msg = ?other, "expected Hello, got different message");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to decode handshake message");
                    return false;
                }
            },
            Message::Close(_) => return false,
            _ => {
                // Skip non-binary frames during the handshake.
            }
        }
    }
    false
}

/// Per-connection state: the session and its live subscriptions.
struct Connection {
    state: Arc<EmulatorState>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    session: Option<UserProfile>,
    subscriptions: Vec<SubscriptionId>,
}

impl Connection {
    fn push(&self, msg: ServerMessage) {
        // Writer-side failure means the client is gone; the reader loop
        // will observe the disconnect shortly.
        let _ = self.outbound.send(msg);
    }

    fn push_auth_state(&self) {
        self.push(ServerMessage::AuthState {
            user: self.session.clone(),
        });
    }

    async fn handle_message(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::Hello => {
                // Duplicate Hello: re-push the current state.
                self.push_auth_state();
            }
            ClientMessage::SignUp { email, password } => {
                match self.state.accounts.sign_up(&email, &password).await {
                    Ok(profile) => {
                        tracing::info!(uid = %profile.uid, "account created");
                        self.session = Some(profile);
                        self.push_auth_state();
                    }
                    Err(code) => {
                        tracing::info!(code = %code, "sign-up rejected");
                        self.push(ServerMessage::AuthRejected { code });
                    }
                }
            }
            ClientMessage::SignInFederated { provider } => {
                if self.state.popup_blocked {
                    tracing::info!(provider = %provider, "federated sign-in blocked");
                    self.push(ServerMessage::AuthRejected {
                        code: AuthErrorCode::PopupBlocked,
                    });
                    return;
                }
                let profile = self
                    .state
                    .accounts
                    .sign_in_federated(provider, &self.state.federated_email)
                    .await;
                tracing::info!(uid = %profile.uid, provider = %provider, "federated sign-in");
                self.session = Some(profile);
                self.push_auth_state();
            }
            ClientMessage::UpdateProfile { display_name } => {
                let Some(session) = self.session.clone() else {
                    self.push(ServerMessage::AuthRejected {
                        code: AuthErrorCode::NotSignedIn,
                    });
                    return;
                };
                match self
                    .state
                    .accounts
                    .update_display_name(&session.uid, &display_name)
                    .await
                {
                    Ok(profile) => {
                        self.session = Some(profile);
                        self.push_auth_state();
                    }
                    Err(code) => self.push(ServerMessage::AuthRejected { code }),
                }
            }
            ClientMessage::SignOut => {
                self.release_subscriptions().await;
                self.session = None;
                self.push_auth_state();
            }
            ClientMessage::Subscribe {
                subscription_id,
                query,
            } => {
                let Some(session) = &self.session else {
                    self.push(ServerMessage::SubscriptionError {
                        subscription_id,
                        reason: "not signed in".to_string(),
                    });
                    return;
                };
                match self
                    .state
                    .store
                    .subscribe(
                        subscription_id.clone(),
                        query,
                        &session.uid,
                        self.outbound.clone(),
                    )
                    .await
                {
                    Ok(()) => self.subscriptions.push(subscription_id),
                    Err(e) => {
                        tracing::warn!(subscription = %subscription_id, error = %e, "subscribe failed");
                        self.push(ServerMessage::SubscriptionError {
                            subscription_id,
                            reason: e.to_string(),
                        });
                    }
                }
            }
            ClientMessage::Unsubscribe { subscription_id } => {
                self.state.store.unsubscribe(&subscription_id).await;
                self.subscriptions.retain(|id| *id != subscription_id);
            }
            ClientMessage::Add { collection, fields } => {
                let Some(uid) = self.session_uid() else {
                    self.push_write_failed("not signed in");
                    return;
                };
                if let Err(e) = self.state.store.add(&collection, fields, &uid).await {
                    tracing::warn!(collection = %collection, error = %e, "add failed");
                    self.push_write_failed(&e.to_string());
                }
            }
            ClientMessage::Update {
                collection,
                document_id,
                fields,
            } => {
                let Some(uid) = self.session_uid() else {
                    self.push_write_failed("not signed in");
                    return;
                };
                if let Err(e) = self
                    .state
                    .store
                    .update(&collection, &document_id, fields, &uid)
                    .await
                {
                    tracing::warn!(document = %document_id, error = %e, "update failed");
                    self.push_write_failed(&e.to_string());
                }
            }
            ClientMessage::Delete {
                collection,
                document_id,
            } => {
                let Some(uid) = self.session_uid() else {
                    self.push_write_failed("not signed in");
                    return;
                };
                if let Err(e) = self
                    .state
                    .store
                    .delete(&collection, &document_id, &uid)
                    .await
                {
                    tracing::warn!(document = %document_id, error = %e, "delete failed");
                    self.push_write_failed(&e.to_string());
                }
            }
        }
    }

    fn session_uid(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.uid.clone())
    }

    fn push_write_failed(&self, reason: &str) {
        self.push(ServerMessage::WriteFailed {
            reason: reason.to_string(),
        });
    }

    /// Releases every subscription this connection registered. Called on
    /// sign-out and on disconnect; afterwards no snapshots reach the
    /// connection.
    async fn release_subscriptions(&mut self) {
        for subscription_id in self.subscriptions.drain(..) {
            self.state.store.unsubscribe(&subscription_id).await;
        }
    }
}
