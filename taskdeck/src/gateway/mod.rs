//! Service gateway abstraction for the Taskdeck client.
//!
//! Defines the [`Gateway`] trait the sync layer talks through. Concrete
//! implementations:
//! - [`remote::RemoteGateway`] — WebSocket connection to the managed
//!   service (or its local emulator)
//! - [`loopback::LoopbackGateway`] — in-process channel-based gateway for
//!   testing

pub mod loopback;
pub mod remote;

use taskdeck_proto::codec::CodecError;
use taskdeck_proto::wire::{ClientMessage, ServerMessage};

/// Errors that can occur during gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The connection to the service has been closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// The operation timed out before completing.
    #[error("gateway operation timed out")]
    Timeout,

    /// The service endpoint could not be reached.
    #[error("service {0} is unreachable")]
    Unreachable(String),

    /// A message failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// An underlying I/O error occurred.
    #[error("gateway I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Async gateway trait carrying typed wire messages to and from the
/// service.
///
/// Implementations own the connection; the sync layer never sees frames
/// or sockets. [`Gateway::send`] hands a message to the transport — it
/// does NOT mean the service applied it. Outcomes arrive through
/// [`Gateway::recv`] as pushed [`ServerMessage`]s (auth state, snapshots,
/// write failures).
pub trait Gateway: Send + Sync {
    /// Send a message to the service.
    fn send(
        &self,
        msg: ClientMessage,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Receive the next message pushed by the service.
    ///
    /// Blocks asynchronously until a message arrives.
    fn recv(&self) -> impl std::future::Future<Output = Result<ServerMessage, GatewayError>> + Send;

    /// Check whether the connection to the service is currently alive.
    fn is_connected(&self) -> bool;
}
