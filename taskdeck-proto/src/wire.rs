//! Client/server messages for the Taskdeck sync service.
//!
//! Messages are postcard-encoded and carried in WebSocket binary frames.
//! The connection protocol: the client sends [`ClientMessage::Hello`]
//! first; the service answers with [`ServerMessage::AuthState`] and pushes
//! a fresh `AuthState` after every session change on that connection.
//! Mutations are fire-and-forget — a failed write comes back asynchronously
//! as [`ServerMessage::WriteFailed`], a successful one is observed only
//! through the next snapshot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AuthErrorCode, FederatedProvider, UserProfile};
use crate::codec::{self, CodecError};
use crate::document::{Document, DocumentId, Fields};
use crate::query::Query;

/// Identifier for a live query subscription, minted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Creates a new subscription identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `SubscriptionId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages sent from the client to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Opens the session. Must be the first message on a connection; the
    /// service replies with the current [`ServerMessage::AuthState`].
    Hello,

    /// Creates an account with email/password credentials and signs the
    /// connection in. The profile starts without a display name; clients
    /// follow up with [`ClientMessage::UpdateProfile`] once the session
    /// resolves.
    SignUp {
        /// Account email address.
        email: String,
        /// Account password.
        password: String,
    },

    /// Signs in via a federated identity provider.
    SignInFederated {
        /// Which provider handles the sign-in.
        provider: FederatedProvider,
    },

    /// Rewrites the signed-in user's display name.
    UpdateProfile {
        /// New display name.
        display_name: String,
    },

    /// Terminates the connection's session.
    SignOut,

    /// Establishes a live query subscription. The service pushes an
    /// initial [`ServerMessage::Snapshot`] and a fresh one after every
    /// commit that changes the result set.
    Subscribe {
        /// Client-minted id correlating snapshots to this subscription.
        subscription_id: SubscriptionId,
        /// The query to watch.
        query: Query,
    },

    /// Releases a live query subscription. No snapshots for the id are
    /// delivered afterward.
    Unsubscribe {
        /// The subscription to release.
        subscription_id: SubscriptionId,
    },

    /// Adds a document. The service assigns the id and resolves
    /// server-timestamp sentinels at commit time.
    Add {
        /// Target collection.
        collection: String,
        /// Field map for the new document.
        fields: Fields,
    },

    /// Merges fields into an existing document. Untouched fields keep
    /// their values.
    Update {
        /// Target collection.
        collection: String,
        /// Document to update.
        document_id: DocumentId,
        /// Fields to overwrite.
        fields: Fields,
    },

    /// Deletes a document. Deleting an id that does not exist is a no-op,
    /// not an error.
    Delete {
        /// Target collection.
        collection: String,
        /// Document to delete.
        document_id: DocumentId,
    },
}

/// Messages pushed from the service to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    /// The connection's current session state. Pushed once after `Hello`
    /// and again after every session change.
    AuthState {
        /// The signed-in user, or `None`.
        user: Option<UserProfile>,
    },

    /// An auth operation (sign-up, federated sign-in, profile update) was
    /// rejected. The session state is unchanged.
    AuthRejected {
        /// Why the operation was rejected.
        code: AuthErrorCode,
    },

    /// Full current result set for a subscription, superseding any prior
    /// snapshot for the same id.
    Snapshot {
        /// The subscription this snapshot belongs to.
        subscription_id: SubscriptionId,
        /// All matching documents, in query order.
        documents: Vec<Document>,
    },

    /// The subscription could not be established or has failed. No
    /// snapshots for the id will follow.
    SubscriptionError {
        /// The subscription that failed.
        subscription_id: SubscriptionId,
        /// Human-readable failure description.
        reason: String,
    },

    /// A fire-and-forget write (add/update/delete) was rejected.
    WriteFailed {
        /// Human-readable failure description.
        reason: String,
    },

    /// Protocol-level error not tied to a specific operation.
    Error {
        /// Human-readable error description.
        reason: String,
    },
}

/// Encodes a [`ClientMessage`] into bytes.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if encoding fails.
pub fn encode_client(msg: &ClientMessage) -> Result<Vec<u8>, CodecError> {
    codec::encode(msg)
}

/// Decodes a [`ClientMessage`] from bytes.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the bytes are not a valid message.
pub fn decode_client(bytes: &[u8]) -> Result<ClientMessage, CodecError> {
    codec::decode(bytes)
}

/// Encodes a [`ServerMessage`] into bytes.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if encoding fails.
pub fn encode_server(msg: &ServerMessage) -> Result<Vec<u8>, CodecError> {
    codec::encode(msg)
}

/// Decodes a [`ServerMessage`] from bytes.
///
/// # Errors
///
/// Returns [`CodecError::Serialization`] if the bytes are not a valid message.
pub fn decode_server(bytes: &[u8]) -> Result<ServerMessage, CodecError> {
    codec::decode(bytes)
}
