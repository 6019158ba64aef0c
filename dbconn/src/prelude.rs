//! Commonly used types, importable in one line:
//!
//! ```ignore
//! use dbconn::prelude::*;
//! ```

pub use dbconn_core::{
    collection::Collection,
    connector::{Connector, ConnectorBuilder, DocumentStream, DynConnector},
    database::{Database, DynDatabase},
    document::{from_document, to_document},
    error::{DbError, DbResult},
    filter::{Constraint, Filter, FilterBuilder},
    options::{FindOneOptions, FindOptions, Sort, SortDirection},
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};
