//! Loopback gateway for testing.
//!
//! Uses in-process [`tokio::sync::mpsc`] channels to simulate a service
//! connection. Created via [`LoopbackGateway::create_pair`], which returns
//! the client-side gateway and a [`LoopbackService`] handle the test uses
//! to script the service's side of the conversation.

use tokio::sync::{Mutex, mpsc};

use taskdeck_proto::wire::{ClientMessage, ServerMessage};

use super::{Gateway, GatewayError};

/// In-process gateway backed by `tokio::sync::mpsc` channels.
pub struct LoopbackGateway {
    tx: mpsc::Sender<ClientMessage>,
    rx: Mutex<mpsc::Receiver<ServerMessage>>,
}

/// Test-side handle: reads what the client sent, pushes service messages.
pub struct LoopbackService {
    tx: mpsc::Sender<ServerMessage>,
    rx: Mutex<mpsc::Receiver<ClientMessage>>,
}

impl LoopbackGateway {
    /// Create a connected gateway/service pair.
    ///
    /// The `buffer` parameter controls the channel capacity for each
    /// direction.
    #[must_use]
    pub fn create_pair(buffer: usize) -> (Self, LoopbackService) {
        let (client_tx, client_rx) = mpsc::channel(buffer);
        let (server_tx, server_rx) = mpsc::channel(buffer);

        let gateway = Self {
            tx: client_tx,
            rx: Mutex::new(server_rx),
        };
        let service = LoopbackService {
            tx: server_tx,
            rx: Mutex::new(client_rx),
        };
        (gateway, service)
    }
}

impl Gateway for LoopbackGateway {
    async fn send(&self, msg: ClientMessage) -> Result<(), GatewayError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| GatewayError::ConnectionClosed)
    }

    async fn recv(&self) -> Result<ServerMessage, GatewayError> {
        let mut rx = self.rx.lock().await;
        rx.recv().await.ok_or(GatewayError::ConnectionClosed)
    }

    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl LoopbackService {
    /// Pushes a message at the client, as the service would.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ConnectionClosed`] if the client side is gone.
    pub async fn push(&self, msg: ServerMessage) -> Result<(), GatewayError> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| GatewayError::ConnectionClosed)
    }

    /// Receives the next message the client sent, or `None` if the client
    /// side is gone.
    pub async fn next_client(&self) -> Option<ClientMessage> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}
