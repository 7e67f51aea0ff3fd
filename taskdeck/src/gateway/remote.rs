//! WebSocket gateway to the Taskdeck service.
//!
//! Implements the [`Gateway`] trait over a WebSocket connection to the
//! managed service or its local emulator. Connection setup sends the
//! `Hello` handshake and spawns a background reader task; the service's
//! `AuthState` reply flows through [`Gateway::recv`] like every other
//! pushed message, so session resolution stays in the sync layer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use taskdeck_proto::wire::{self, ClientMessage, ServerMessage};

use super::{Gateway, GatewayError};

/// Type alias for the write half of a WebSocket connection.
type WsSender = futures_util::stream::SplitSink<
    WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    Message,
>;

/// Type alias for the read half of a WebSocket connection.
type WsReader =
    futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>>;

/// Buffer size for the incoming message channel.
const INCOMING_BUFFER: usize = 256;

/// WebSocket gateway implementing the [`Gateway`] trait.
///
/// Created via [`RemoteGateway::connect`], which establishes the
/// connection, performs the `Hello` handshake, and spawns a background
/// reader task that decodes incoming frames.
pub struct RemoteGateway {
    /// The service URL (ws:// or wss://).
    service_url: String,
    /// Write half of the WebSocket connection (shared for concurrent sends).
    ws_sender: Arc<Mutex<WsSender>>,
    /// Channel for messages decoded by the background reader task.
    incoming: Mutex<mpsc::Receiver<ServerMessage>>,
    /// Whether the WebSocket connection is active.
    connected: Arc<AtomicBool>,
    /// Handle to the background reader task (kept for the gateway's lifetime).
    _reader_handle: tokio::task::JoinHandle<()>,
}

impl RemoteGateway {
    /// Connect to the service and open the session.
    ///
    /// Performs the following steps:
    /// 1. Establishes a WebSocket connection to `service_url` (with timeout)
    /// 2. Sends the `Hello` handshake
    /// 3. Spawns a background task decoding incoming frames
    ///
    /// The service's `AuthState` reply to `Hello` is NOT consumed here —
    /// it arrives through [`Gateway::recv`] so the caller observes session
    /// resolution the same way it observes every later session change.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Timeout`] if the connection attempt times out.
    /// - [`GatewayError::Unreachable`] if the URL cannot be resolved or
    ///   connected.
    /// - [`GatewayError::Io`] for handshake write failures.
    pub async fn connect(
        service_url: &str,
        connect_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        // Reject malformed URLs before attempting the connection.
        let parsed = url::Url::parse(service_url)
            .map_err(|e| GatewayError::Unreachable(format!("{service_url}: {e}")))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(GatewayError::Unreachable(format!(
                "{service_url}: expected a ws:// or wss:// URL"
            )));
        }

        let (ws_stream, _response) =
            tokio::time::timeout(connect_timeout, connect_async(service_url))
                .await
                .map_err(|_| {
                    tracing::warn!(url = service_url, "service WebSocket connect timed out");
                    GatewayError::Timeout
                })?
                .map_err(|e| {
                    tracing::warn!(url = service_url, err = %e, "service WebSocket connect failed");
                    GatewayError::Unreachable(format!("{service_url}: {e}"))
                })?;

        let (mut ws_sender, ws_reader) = ws_stream.split();

        let hello = wire::encode_client(&ClientMessage::Hello)?;
        ws_sender
            .send(Message::Binary(hello.into()))
            .await
            .map_err(|e| {
                tracing::warn!(err = %e, "failed to send Hello");
                GatewayError::Io(std::io::Error::other(format!("failed to send Hello: {e}")))
            })?;

        let (incoming_tx, incoming_rx) = mpsc::channel(INCOMING_BUFFER);
        let connected = Arc::new(AtomicBool::new(true));

        let reader_connected = Arc::clone(&connected);
        let reader_handle = tokio::spawn(async move {
            read_loop(ws_reader, incoming_tx, reader_connected).await;
        });

        tracing::info!(url = service_url, "connected to service");

        Ok(Self {
            service_url: service_url.to_string(),
            ws_sender: Arc::new(Mutex::new(ws_sender)),
            incoming: Mutex::new(incoming_rx),
            connected,
            _reader_handle: reader_handle,
        })
    }

    /// Returns the service URL this gateway is connected to.
    #[must_use]
    pub fn service_url(&self) -> &str {
        &self.service_url
    }
}

impl Gateway for RemoteGateway {
    async fn send(&self, msg: ClientMessage) -> Result<(), GatewayError> {
        if !self.is_connected() {
            return Err(GatewayError::ConnectionClosed);
        }
        let bytes = wire::encode_client(&msg)?;
        let mut sender = self.ws_sender.lock().await;
        sender
            .send(Message::Binary(bytes.into()))
            .await
            .map_err(|e| {
                self.connected.store(false, Ordering::SeqCst);
                tracing::warn!(err = %e, "WebSocket send failed");
                GatewayError::ConnectionClosed
            })
    }

    async fn recv(&self) -> Result<ServerMessage, GatewayError> {
        let mut rx = self.incoming.lock().await;
        rx.recv().await.ok_or(GatewayError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Background task: decode incoming WebSocket frames into the channel.
///
/// Ends when the connection closes or the gateway is dropped; flips the
/// shared `connected` flag on the way out.
async fn read_loop(
    mut ws_reader: WsReader,
    incoming_tx: mpsc::Sender<ServerMessage>,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = ws_reader.next().await {
        match frame {
            Ok(Message::Binary(data)) => match wire::decode_server(&data) {
                Ok(msg) => {
                    if incoming_tx.send(msg).await.is_err() {
                        // Gateway dropped; stop reading.
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(err = %e, "failed to decode service message, skipping frame");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::info!("service closed the connection");
                break;
            }
            Ok(_) => {
                // Ignore text, ping, pong frames.
            }
            Err(e) => {
                tracing::warn!(err = %e, "WebSocket read error");
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
}
