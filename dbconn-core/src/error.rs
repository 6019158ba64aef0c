//! Error types and result types for connector operations.
//!
//! Every fallible operation in the workspace returns [`DbResult<T>`]. Errors are
//! surfaced to the caller unchanged: connectors never retry and never swallow a
//! failure.

use std::convert::Infallible;

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// All errors that can occur when talking to a backing connector.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DbError {
    /// No document in the collection matched the filter.
    #[error("No document matching the filter found in collection {0}")]
    NotFound(String),
    /// The operation targeted a collection that was never created.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// A value could not be normalized into a document, or a document could not
    /// be decoded into the requested type.
    #[error("Conversion error: {0}")]
    Conversion(String),
    /// The filter uses a shape the connectors do not support.
    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),
    /// Connector configuration or connection setup failed.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// An opaque failure reported by the underlying database driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DbError {
    /// Returns `true` for [`DbError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

/// A specialized `Result` type for connector operations.
pub type DbResult<T> = Result<T, DbError>;

impl From<BsonError> for DbError {
    fn from(err: BsonError) -> Self {
        DbError::Conversion(err.to_string())
    }
}

impl From<SerdeJsonError> for DbError {
    fn from(err: SerdeJsonError) -> Self {
        DbError::Conversion(err.to_string())
    }
}

impl From<Infallible> for DbError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}
