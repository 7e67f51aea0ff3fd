//! In-memory document store with live query subscriptions.
//!
//! Collections are maps of server-assigned ids to schemaless field maps.
//! Every committed write re-evaluates the subscriptions registered against
//! the touched collection and pushes each one a full current snapshot —
//! subscribers always replace, never patch.
//!
//! The store also enforces the service-side security rules that the client
//! codebase deliberately does not: a subscription must filter on the
//! session's own uid, and a write may only touch documents owned by the
//! session.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{RwLock, mpsc};

use taskdeck_proto::document::{Document, DocumentId, FieldValue, Fields, Timestamp};
use taskdeck_proto::query::Query;
use taskdeck_proto::wire::{ServerMessage, SubscriptionId};

/// Field name carrying document ownership, checked by the security rules.
const OWNER_FIELD: &str = "user_id";

/// A composite index registration: equality field + ordering field pair
/// for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIndex {
    /// Collection the index covers.
    pub collection: String,
    /// Field of the equality filter.
    pub filter_field: String,
    /// Field of the ordering clause.
    pub order_field: String,
}

/// Errors a write or subscribe operation can produce.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document to update does not exist.
    #[error("no document {0} in collection {1}")]
    NotFound(DocumentId, String),

    /// The session does not own the document or query it is touching.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The query's filter/ordering combination has no registered index.
    #[error(
        "query on {collection} requires a composite index on ({filter_field}, {order_field})"
    )]
    MissingIndex {
        /// Collection the query ran against.
        collection: String,
        /// Field of the equality filter.
        filter_field: String,
        /// Field of the ordering clause.
        order_field: String,
    },
}

/// A registered live subscription.
struct Subscription {
    query: Query,
    sender: mpsc::UnboundedSender<ServerMessage>,
}

/// In-memory collections plus the live subscription registry.
pub struct DocumentStore {
    collections: RwLock<HashMap<String, HashMap<DocumentId, Fields>>>,
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    indexes: Vec<CompositeIndex>,
}

impl DocumentStore {
    /// Creates an empty store with the given composite index registrations.
    #[must_use]
    pub fn new(indexes: Vec<CompositeIndex>) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            indexes,
        }
    }

    /// Returns the current commit timestamp in milliseconds since epoch.
    fn now() -> Timestamp {
        let millis = u64::try_from(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
        )
        .unwrap_or(u64::MAX);
        Timestamp::from_millis(millis)
    }

    /// Adds a document: assigns the id, resolves server-timestamp
    /// sentinels to the commit time, commits, and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PermissionDenied`] if the fields carry an
    /// owner that is not the session uid.
    pub async fn add(
        &self,
        collection: &str,
        mut fields: Fields,
        session_uid: &str,
    ) -> Result<DocumentId, StoreError> {
        check_owner_fields(&fields, session_uid)?;
        let now = Self::now();
        for value in fields.values_mut() {
            if *value == FieldValue::ServerTimestamp {
                *value = FieldValue::Timestamp(now);
            }
        }

        let id = DocumentId::new();
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), fields);
        }
        self.notify(collection).await;
        Ok(id)
    }

    /// Merges fields into an existing document and notifies subscribers.
    /// Untouched fields keep their values.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the document does not exist.
    /// - [`StoreError::PermissionDenied`] if the document belongs to a
    ///   different owner, or the update would reassign ownership.
    pub async fn update(
        &self,
        collection: &str,
        id: &DocumentId,
        fields: Fields,
        session_uid: &str,
    ) -> Result<(), StoreError> {
        check_owner_fields(&fields, session_uid)?;
        let now = Self::now();
        {
            let mut collections = self.collections.write().await;
            let existing = collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| StoreError::NotFound(id.clone(), collection.to_string()))?;
            check_owned_by(existing, session_uid)?;

            for (key, mut value) in fields {
                if value == FieldValue::ServerTimestamp {
                    value = FieldValue::Timestamp(now);
                }
                existing.insert(key, value);
            }
        }
        self.notify(collection).await;
        Ok(())
    }

    /// Deletes a document and notifies subscribers. Deleting an id that
    /// does not exist is a silent no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PermissionDenied`] if the document exists but
    /// belongs to a different owner.
    pub async fn delete(
        &self,
        collection: &str,
        id: &DocumentId,
        session_uid: &str,
    ) -> Result<(), StoreError> {
        let removed = {
            let mut collections = self.collections.write().await;
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(());
            };
            if let Some(existing) = docs.get(id) {
                check_owned_by(existing, session_uid)?;
                docs.remove(id);
                true
            } else {
                false
            }
        };
        if removed {
            self.notify(collection).await;
        }
        Ok(())
    }

    /// Registers a live subscription and pushes its initial snapshot.
    ///
    /// # Errors
    ///
    /// - [`StoreError::PermissionDenied`] if the query's equality filter
    ///   is not `user_id == <session uid>`.
    /// - [`StoreError::MissingIndex`] if the filter/ordering combination
    ///   has no registered composite index.
    pub async fn subscribe(
        &self,
        subscription_id: SubscriptionId,
        query: Query,
        session_uid: &str,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<(), StoreError> {
        if query.filter.field != OWNER_FIELD
            || query.filter.value != FieldValue::Text(session_uid.to_string())
        {
            return Err(StoreError::PermissionDenied(
                "subscriptions must filter on the session's own user_id".to_string(),
            ));
        }
        if query.needs_composite_index() && !self.has_index(&query) {
            return Err(StoreError::MissingIndex {
                collection: query.collection.clone(),
                filter_field: query.filter.field.clone(),
                order_field: query.order_by.clone(),
            });
        }

        let initial = ServerMessage::Snapshot {
            subscription_id: subscription_id.clone(),
            documents: self.evaluate(&query).await,
        };
        // A dropped receiver is handled like any other disconnect: the
        // subscription is cleaned up by the connection teardown.
        let _ = sender.send(initial);

        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.insert(subscription_id, Subscription { query, sender });
        Ok(())
    }

    /// Releases a subscription. No snapshots for the id are sent afterward.
    /// Returns true if the subscription existed.
    pub async fn unsubscribe(&self, subscription_id: &SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write().await;
        subscriptions.remove(subscription_id).is_some()
    }

    /// Evaluates a query against current state: filter, then sort.
    pub async fn evaluate(&self, query: &Query) -> Vec<Document> {
        let collections = self.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .filter(|doc| query.matches(doc))
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut documents);
        documents
    }

    /// Pushes a fresh snapshot to every subscription watching `collection`.
    async fn notify(&self, collection: &str) {
        let targets: Vec<(SubscriptionId, Query, mpsc::UnboundedSender<ServerMessage>)> = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions
                .iter()
                .filter(|(_, sub)| sub.query.collection == collection)
                .map(|(id, sub)| (id.clone(), sub.query.clone(), sub.sender.clone()))
                .collect()
        };

        for (subscription_id, query, sender) in targets {
            let documents = self.evaluate(&query).await;
            let count = documents.len();
            if sender
                .send(ServerMessage::Snapshot {
                    subscription_id: subscription_id.clone(),
                    documents,
                })
                .is_err()
            {
                tracing::debug!(
                    subscription = %subscription_id,
                    "subscriber gone, dropping subscription"
                );
                self.unsubscribe(&subscription_id).await;
            } else {
                tracing::debug!(
                    subscription = %subscription_id,
                    documents = count,
                    "pushed snapshot"
                );
            }
        }
    }

    fn has_index(&self, query: &Query) -> bool {
        self.indexes.iter().any(|idx| {
            idx.collection == query.collection
                && idx.filter_field == query.filter.field
                && idx.order_field == query.order_by
        })
    }
}

/// Rejects a field map that tries to claim ownership for someone else.
fn check_owner_fields(fields: &Fields, session_uid: &str) -> Result<(), StoreError> {
    match fields.get(OWNER_FIELD) {
        None => Ok(()),
        Some(FieldValue::Text(owner)) if owner == session_uid => Ok(()),
        Some(_) => Err(StoreError::PermissionDenied(
            "user_id must match the signed-in session".to_string(),
        )),
    }
}

/// Rejects touching a document owned by someone else. Documents without
/// an owner field are unrestricted.
fn check_owned_by(fields: &Fields, session_uid: &str) -> Result<(), StoreError> {
    match fields.get(OWNER_FIELD) {
        Some(FieldValue::Text(owner)) if owner != session_uid => Err(
            StoreError::PermissionDenied("document belongs to another user".to_string()),
        ),
        _ => Ok(()),
    }
}
