//! MongoDB connector for dbconn.
//!
//! This crate implements the dbconn [`Connector`](dbconn_core::connector::Connector)
//! contract on top of the official MongoDB driver. Enable it through the
//! `mongodb` feature of the facade crate:
//!
//! ```toml
//! [dependencies]
//! dbconn = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Behavior
//!
//! - `create_collection` skips collections that already exist
//! - `insert_many` is unordered, so one bad document does not stop the rest
//! - `update` sets every field of the replacement (except `_id`) on all matches
//! - `delete` removes all matches
//! - `update`, `delete` and `find_one` report `NotFound` when nothing matches
//!
//! # Example
//!
//! ```ignore
//! use dbconn::{prelude::*, mongodb::{MongoConfig, MongoConnector}};
//!
//! #[tokio::main]
//! async fn main() -> DbResult<()> {
//!     let connector = MongoConnector::builder(MongoConfig::from_env("app")?)
//!         .build()
//!         .await?;
//!     let db = Database::new(connector);
//!
//!     db.create_collection("users").await?;
//!     db.shutdown().await
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as dbconn_mongodb;

pub mod config;
pub mod connector;
pub(crate) mod query;

pub use config::MongoConfig;
pub use connector::{MongoConnector, MongoConnectorBuilder};
