//! Task model and live list state.
//!
//! Documents coming off the wire are schemaless; this module is the
//! boundary where they become statically typed [`Task`] values. Parsing
//! is fallible and non-conforming documents are dropped from the view,
//! never passed through untyped.
//!
//! The list state follows the subscription contract: every snapshot
//! replaces the whole list. There is no diffing and no client-side merge.

use taskdeck_proto::document::{Document, DocumentId, FieldValue, Fields, Timestamp};
use taskdeck_proto::query::{Direction, FieldFilter, Query};

/// Collection holding task documents.
pub const TASKS_COLLECTION: &str = "tasks";

/// Field names of the task schema, imposed by convention.
pub const FIELD_TITLE: &str = "title";
/// Completion flag field.
pub const FIELD_COMPLETED: &str = "completed";
/// Owner uid field.
pub const FIELD_USER_ID: &str = "user_id";
/// Server-assigned creation time field.
pub const FIELD_CREATED_AT: &str = "created_at";

/// Errors from the document-to-task boundary.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    /// A required field is absent or has the wrong type.
    #[error("document {id} is not a task: missing or mistyped `{field}`")]
    Malformed {
        /// The offending document.
        id: DocumentId,
        /// The field that failed the parse.
        field: &'static str,
    },
}

/// A task as the UI sees it: parsed, typed, owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Store-assigned identifier.
    pub id: DocumentId,
    /// User-supplied title.
    pub title: String,
    /// Completion flag, toggled in place.
    pub completed: bool,
    /// Owner uid, set once at creation.
    pub user_id: String,
    /// Server-assigned creation time, the sole sort key.
    pub created_at: Timestamp,
}

impl Task {
    /// Parses a schemaless document into a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Malformed`] naming the first missing or
    /// mistyped field.
    pub fn from_document(doc: &Document) -> Result<Self, TaskError> {
        let field = |field: &'static str| TaskError::Malformed {
            id: doc.id.clone(),
            field,
        };
        Ok(Self {
            id: doc.id.clone(),
            title: doc
                .text(FIELD_TITLE)
                .ok_or_else(|| field(FIELD_TITLE))?
                .to_string(),
            completed: doc
                .boolean(FIELD_COMPLETED)
                .ok_or_else(|| field(FIELD_COMPLETED))?,
            user_id: doc
                .text(FIELD_USER_ID)
                .ok_or_else(|| field(FIELD_USER_ID))?
                .to_string(),
            created_at: doc
                .timestamp(FIELD_CREATED_AT)
                .ok_or_else(|| field(FIELD_CREATED_AT))?,
        })
    }
}

/// Returns true if the input is an acceptable title: non-empty once
/// trimmed. The stored value is the caller's business — creation stores
/// the raw text, editing stores the trimmed text.
#[must_use]
pub fn title_is_valid(input: &str) -> bool {
    !input.trim().is_empty()
}

/// Field map for a new task document: raw title, not completed, owned by
/// `uid`, creation time left to the store via the sentinel.
#[must_use]
pub fn new_task_fields(title: &str, uid: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(FIELD_TITLE.to_string(), FieldValue::Text(title.to_string()));
    fields.insert(FIELD_COMPLETED.to_string(), FieldValue::Bool(false));
    fields.insert(FIELD_USER_ID.to_string(), FieldValue::Text(uid.to_string()));
    fields.insert(FIELD_CREATED_AT.to_string(), FieldValue::ServerTimestamp);
    fields
}

/// Field map flipping the completion flag from the caller-believed value.
#[must_use]
pub fn toggle_fields(current_completed: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        FIELD_COMPLETED.to_string(),
        FieldValue::Bool(!current_completed),
    );
    fields
}

/// Field map rewriting only the title, trimmed.
#[must_use]
pub fn rename_fields(title: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        FIELD_TITLE.to_string(),
        FieldValue::Text(title.trim().to_string()),
    );
    fields
}

/// The live query for a user's tasks: owner filter, newest first.
#[must_use]
pub fn owner_query(uid: &str) -> Query {
    Query {
        collection: TASKS_COLLECTION.to_string(),
        filter: FieldFilter {
            field: FIELD_USER_ID.to_string(),
            value: FieldValue::Text(uid.to_string()),
        },
        order_by: FIELD_CREATED_AT.to_string(),
        direction: Direction::Descending,
    }
}

/// In-memory task list driven entirely by subscription snapshots.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Replaces the whole list with the snapshot's documents, preserving
    /// snapshot order. Documents that do not parse as tasks are dropped
    /// and logged; they never reach the view.
    pub fn apply_snapshot(&mut self, documents: &[Document]) {
        self.tasks = documents
            .iter()
            .filter_map(|doc| match Task::from_document(doc) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping non-task document from snapshot");
                    None
                }
            })
            .collect();
    }

    /// Clears the list (owner became unknown).
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// All tasks, in snapshot order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The task at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if there are no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
