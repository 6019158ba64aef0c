//! Result descriptors returned by write operations.

use bson::Bson;
use serde::{Deserialize, Serialize};

/// Outcome of inserting one document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsertOneResult {
    /// Identifier of the inserted document, generated if the caller gave none.
    pub inserted_id: Bson,
}

/// Outcome of inserting many documents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct InsertManyResult {
    /// Identifiers of the inserted documents, in input order.
    pub inserted_ids: Vec<Bson>,
}

impl InsertManyResult {
    pub fn len(&self) -> usize {
        self.inserted_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted_ids.is_empty()
    }
}

/// Outcome of an update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Number of documents the filter matched.
    pub matched_count: u64,
    /// Number of documents actually changed.
    pub modified_count: u64,
}

/// Outcome of a delete.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DeleteResult {
    pub deleted_count: u64,
}
