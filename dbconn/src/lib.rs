//! Uniform CRUD access to document databases.
//!
//! This crate is the entry point of the dbconn workspace. It re-exports the
//! facade and its supporting types from `dbconn-core` along with the available
//! connectors, so application code depends on one crate and picks a backend by
//! constructing a connector.
//!
//! # Features
//!
//! - **One operation set** - create, find, update and delete work the same on every backend
//! - **Any serializable value** - values are normalized into BSON documents before storage
//! - **Simple filters** - conjunctive equality and `$in` membership, validated up front
//! - **Test double** - an in-memory connector with the same contract as MongoDB
//!
//! # Quick Start
//!
//! ```ignore
//! use dbconn::{prelude::*, memory::InMemoryConnector};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(rename = "_id")]
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DbResult<()> {
//!     let db = Database::new(InMemoryConnector::new());
//!     db.create_collection("users").await?;
//!
//!     db.create(&User { id: "a".into(), name: "Alice".into() }, "users").await?;
//!
//!     let users: Vec<User> = db
//!         .find_as("users", &Filter::builder().eq("name", "Alice").build()?, None)
//!         .await?;
//!     println!("{users:?}");
//!
//!     db.shutdown().await
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! When the backend is only known at runtime, erase the connector type with
//! [`Database::into_dyn`](database::Database::into_dyn). The resulting
//! [`DynDatabase`](database::DynDatabase) has the same methods.
//!
//! ```ignore
//! use dbconn::{prelude::*, memory::InMemoryConnector};
//!
//! let db: DynDatabase = if use_mongo {
//!     Database::new(MongoConnector::builder(MongoConfig::from_env("app")?).build().await?).into_dyn()
//! } else {
//!     Database::new(InMemoryConnector::new()).into_dyn()
//! };
//! ```
//!
//! # Backends
//!
//! - [`memory`] - in-memory connector for development and testing
//! - [`mongodb`] - MongoDB connector (requires the `mongodb` feature)

pub mod prelude;

pub use dbconn_core::{collection, connector, database, document, error, filter, options, results};

// Re-export BSON types for convenience
pub use bson;

/// In-memory connector.
pub mod memory {
    pub use dbconn_memory::{InMemoryConnector, InMemoryConnectorBuilder};
}

/// MongoDB connector.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use dbconn_mongodb::{MongoConfig, MongoConnector, MongoConnectorBuilder};
}
