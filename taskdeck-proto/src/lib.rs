//! Wire protocol library for the Taskdeck sync service.
//!
//! Defines the schemaless document model, query types, auth operations,
//! and the client/server message enums exchanged over WebSocket binary
//! frames. Both the `taskdeck` client and the `taskdeck-emulator` backend
//! depend on this crate, so the wire contract lives in exactly one place.

pub mod auth;
pub mod codec;
pub mod document;
pub mod query;
pub mod wire;
