//! Live query types: an equality filter plus a single ordering clause.
//!
//! Queries are evaluated by the store, never by the client; the matching
//! and sorting logic lives here so the emulator and tests share one
//! implementation of the semantics.

use serde::{Deserialize, Serialize};

use crate::document::{Document, FieldValue};

/// Sort direction for the ordering clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Smallest value first.
    Ascending,
    /// Largest value first.
    Descending,
}

/// Equality predicate on a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Field name the predicate applies to.
    pub field: String,
    /// Value the field must equal.
    pub value: FieldValue,
}

/// A subscription query: one collection, one equality filter, one ordering.
///
/// A document matches only if the filter holds *and* the ordering field is
/// present — documents lacking the ordering field are excluded from the
/// result set, not sorted to one end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Collection the query runs against.
    pub collection: String,
    /// Equality filter restricting the result set.
    pub filter: FieldFilter,
    /// Field name results are ordered by.
    pub order_by: String,
    /// Sort direction.
    pub direction: Direction,
}

impl Query {
    /// Returns true if `doc` belongs in this query's result set.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.filter.field) == Some(&self.filter.value)
            && doc.get(&self.order_by).is_some()
    }

    /// Sorts `docs` in place according to the ordering clause.
    ///
    /// Documents are assumed to already satisfy [`Query::matches`], so the
    /// ordering field is present; a missing field sorts as null. Ties
    /// break on document id in the query direction, so snapshots are
    /// deterministic and time-ordered ids keep creation order even when
    /// commit timestamps collide.
    pub fn sort(&self, docs: &mut [Document]) {
        docs.sort_by(|a, b| {
            let va = a.get(&self.order_by).unwrap_or(&FieldValue::Null);
            let vb = b.get(&self.order_by).unwrap_or(&FieldValue::Null);
            match self.direction {
                Direction::Ascending => va.compare(vb).then_with(|| a.id.cmp(&b.id)),
                Direction::Descending => vb.compare(va).then_with(|| b.id.cmp(&a.id)),
            }
        });
    }

    /// Returns true if this query needs a composite index: an equality
    /// filter combined with an ordering on a *different* field.
    #[must_use]
    pub fn needs_composite_index(&self) -> bool {
        self.filter.field != self.order_by
    }
}
