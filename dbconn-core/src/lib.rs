//! Core of the dbconn project: a thin CRUD layer over document databases.
//!
//! This crate provides:
//!
//! - **Documents** ([`document`]) - normalizing caller values into BSON documents
//! - **Filters** ([`filter`]) - conjunctive equality / membership filter specifications
//! - **Connectors** ([`connector`]) - the trait every backing store implements
//! - **Facade** ([`database`], [`collection`]) - the backend-agnostic CRUD surface
//! - **Options and results** ([`options`], [`results`]) - read options and write outcomes
//! - **Errors** ([`error`]) - the shared error and result types
//!
//! # Example
//!
//! ```ignore
//! use dbconn::{prelude::*, memory::InMemoryConnector};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> DbResult<()> {
//!     let db = Database::new(InMemoryConnector::new());
//!
//!     db.create_collection("users").await?;
//!     db.create(&doc! { "_id": "a", "name": "x" }, "users").await?;
//!
//!     let user = db.find_one("users", &Filter::by_id("a"), None).await?;
//!     assert_eq!(user.get_str("name").unwrap(), "x");
//!
//!     db.shutdown().await
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as dbconn_core;

pub mod collection;
pub mod connector;
pub mod database;
pub mod document;
pub mod error;
pub mod filter;
pub mod options;
pub mod results;
