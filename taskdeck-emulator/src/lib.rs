//! Taskdeck service emulator library.
//!
//! Exposes the emulator for use in tests and embedding. The emulator
//! implements the Taskdeck service boundary locally: an account registry,
//! schemaless document collections with live query subscriptions, and the
//! WebSocket endpoint the client connects to. Production deployments talk
//! to the managed service; development and integration tests talk to this.

pub mod accounts;
pub mod config;
pub mod server;
pub mod store;
