//! Schemaless document model for the Taskdeck sync service.
//!
//! The store holds collections of documents: opaque server-assigned ids
//! mapped to string-keyed fields. Field values are dynamically typed; any
//! schema (such as the client's Task shape) is imposed by convention at
//! the boundary, never enforced by the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a document, assigned by the store on creation.
///
/// Based on UUID v7 for time-ordering. Clients never mint document ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new time-ordered document identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `DocumentId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in time, in milliseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }
}

/// A dynamically typed field value.
///
/// [`FieldValue::ServerTimestamp`] is a write-time sentinel: clients send
/// it in place of a concrete value, and the store replaces it with the
/// commit timestamp. It never appears in documents read back from the
/// store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Integer(i64),
    /// Floating-point value.
    Double(f64),
    /// UTF-8 text value.
    Text(String),
    /// A concrete point in time.
    Timestamp(Timestamp),
    /// Sentinel resolved to the commit time by the store.
    ServerTimestamp,
}

impl FieldValue {
    /// Rank used for cross-type ordering: null < bool < numbers <
    /// timestamps < text. The sentinel sorts with timestamps (it only
    /// exists transiently, before the store resolves it).
    const fn type_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Integer(_) | Self::Double(_) => 2,
            Self::Timestamp(_) | Self::ServerTimestamp => 3,
            Self::Text(_) => 4,
        }
    }

    /// Total ordering over field values, used when sorting query results.
    ///
    /// Values of different types order by type rank. Integers and doubles
    /// compare numerically as one type; doubles use IEEE total ordering.
    #[must_use]
    pub fn compare(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Double(a), Self::Double(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Double(b)) => (*a as f64).total_cmp(b),
            (Self::Double(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Field map of a document: string keys to dynamically typed values.
pub type Fields = BTreeMap<String, FieldValue>;

/// A document as read from the store: server-assigned id plus fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier, immutable for the document's lifetime.
    pub id: DocumentId,
    /// The document's field map.
    pub fields: Fields,
}

impl Document {
    /// Creates a document with the given id and fields.
    #[must_use]
    pub const fn new(id: DocumentId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Returns the raw field value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns the text value for `key`, if present and textual.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(FieldValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean value for `key`, if present and boolean.
    #[must_use]
    pub fn boolean(&self, key: &str) -> Option<bool> {
        match self.fields.get(key) {
            Some(FieldValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the timestamp value for `key`, if present and a timestamp.
    #[must_use]
    pub fn timestamp(&self, key: &str) -> Option<Timestamp> {
        match self.fields.get(key) {
            Some(FieldValue::Timestamp(t)) => Some(*t),
            _ => None,
        }
    }
}
