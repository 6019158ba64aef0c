//! In-memory connector for dbconn.
//!
//! [`InMemoryConnector`] implements the same [`Connector`](dbconn_core::connector::Connector)
//! contract as the MongoDB connector, so code written against the facade can be
//! tested without a running database.
//!
//! # Features
//!
//! - **Shared state** - clones share one store behind an async read-write lock
//! - **Strict collections** - writes to a collection that was never created fail
//! - **Filter matching** - conjunctive equality and `$in` membership, strictly typed
//! - **Read options** - sort, skip and limit on `find` and `find_one`
//!
//! # Quick Start
//!
//! ```ignore
//! use dbconn::{prelude::*, memory::InMemoryConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DbResult<()> {
//!     let connector = InMemoryConnector::builder()
//!         .collection("users")
//!         .build()
//!         .await?;
//!     let db = Database::new(connector);
//!
//!     db.create(&doc! { "_id": "a", "name": "x" }, "users").await?;
//!     let users = db.find("users", &Filter::empty(), None).await?;
//!     assert_eq!(users.len(), 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as dbconn_memory;

pub mod matcher;
pub mod store;

pub use store::{InMemoryConnector, InMemoryConnectorBuilder};
