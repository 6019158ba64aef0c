//! Backing connector abstraction.
//!
//! A [`Connector`] is whatever actually persists documents: the in-memory test
//! double or a live database driver. The [`Database`](crate::database::Database)
//! facade talks to connectors only through this trait, so application code never
//! branches on which backend it runs against.
//!
//! # Traits
//!
//! - [`Connector`]: the capability set every backend implements
//! - [`DynConnector`]: object-safe twin used for runtime backend selection
//! - [`ConnectorBuilder`]: factory producing a ready-to-use connector
//!
//! # Error shape
//!
//! Implementations must report the same errors for the same situations, so
//! callers stay backend-agnostic:
//!
//! - `find_one`, `update` and `delete` fail with
//!   [`DbError::NotFound`](crate::error::DbError::NotFound) when nothing matches
//! - `find` returns an empty stream when nothing matches
//! - driver failures surface as [`DbError::Backend`](crate::error::DbError::Backend)

use async_trait::async_trait;
use bson::Document;
use futures::stream::BoxStream;
use std::{any::Any, fmt::Debug};

use crate::{
    error::DbResult,
    filter::Filter,
    options::{FindOneOptions, FindOptions},
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

/// A lazily consumed sequence of documents produced by [`Connector::find`].
pub type DocumentStream = BoxStream<'static, DbResult<Document>>;

/// Capability set of a document backing store.
///
/// Implementers persist and retrieve [`Document`]s grouped into named
/// collections. The [`Database`](crate::database::Database) facade normalizes
/// caller values before handing them over, so every write receives a document
/// that already carries an `_id`.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` and safe to call from many async
/// tasks at once. How they achieve that (a lock, the driver's pool) is up to
/// the implementation.
///
/// # Cancellation
///
/// Dropping a returned future cancels the call. Writes already acknowledged by
/// the backend are not rolled back.
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    /// Creates an empty collection.
    ///
    /// Creating a collection that already exists is a no-op.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the collection to create
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` once the collection exists, or a
    /// [`DbError::Backend`](crate::error::DbError::Backend) if the driver fails.
    async fn create_collection(&self, name: &str) -> DbResult<()>;

    /// Drops a collection and every document in it.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the collection to drop
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` on success. Backends that track collections strictly
    /// return [`DbError::CollectionNotFound`](crate::error::DbError::CollectionNotFound)
    /// for an unknown name.
    async fn drop_collection(&self, name: &str) -> DbResult<()>;

    /// Lists the names of all collections, sorted.
    async fn list_collections(&self) -> DbResult<Vec<String>>;

    /// Inserts one document into a collection.
    ///
    /// A document with the same `_id` may be replaced, depending on the backend.
    ///
    /// # Arguments
    ///
    /// * `document` - The document to store, normally already carrying an `_id`
    /// * `collection` - The name of the target collection
    ///
    /// # Returns
    ///
    /// Returns the identifier the document was stored under.
    async fn insert_one(&self, document: Document, collection: &str) -> DbResult<InsertOneResult>;

    /// Inserts documents on a best-effort basis.
    ///
    /// Documents written before a failure stay written; nothing is rolled back.
    ///
    /// # Arguments
    ///
    /// * `documents` - The documents to store
    /// * `collection` - The name of the target collection
    ///
    /// # Returns
    ///
    /// Returns the identifiers of the inserted documents in input order.
    async fn insert_many(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DbResult<InsertManyResult>;

    /// Returns the first document matching `filter`.
    ///
    /// Without a sort in `options`, which match comes first is unspecified.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection to read
    /// * `filter` - The conjunctive filter documents must satisfy
    /// * `options` - Optional sort and skip
    ///
    /// # Returns
    ///
    /// Returns the document, or [`DbError::NotFound`](crate::error::DbError::NotFound)
    /// if nothing matches or the collection does not exist.
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOneOptions,
    ) -> DbResult<Document>;

    /// Returns every document matching `filter` as a stream.
    ///
    /// # Arguments
    ///
    /// * `collection` - The name of the collection to read
    /// * `filter` - The conjunctive filter documents must satisfy
    /// * `options` - Sort, then skip, then limit. A limit of zero means no limit.
    ///
    /// # Returns
    ///
    /// Returns a [`DocumentStream`], empty when nothing matches or the
    /// collection does not exist.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> DbResult<DocumentStream>;

    /// Replaces the content of matching documents with `document`.
    ///
    /// # Returns
    ///
    /// Returns the matched and modified counts, or
    /// [`DbError::NotFound`](crate::error::DbError::NotFound) when nothing matches.
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> DbResult<UpdateResult>;

    /// Deletes matching documents.
    ///
    /// # Returns
    ///
    /// Returns the number of deleted documents, or
    /// [`DbError::NotFound`](crate::error::DbError::NotFound) when nothing matches.
    async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult>;

    /// Releases the connector's resources (closes sessions, frees memory).
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DbResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Object-safe version of [`Connector`], implemented for every connector.
///
/// Methods mirror [`Connector`]; see there for their contracts.
#[async_trait]
pub trait DynConnector: Send + Sync + Debug {
    async fn create_collection(&self, name: &str) -> DbResult<()>;
    async fn drop_collection(&self, name: &str) -> DbResult<()>;
    async fn list_collections(&self) -> DbResult<Vec<String>>;
    async fn insert_one(&self, document: Document, collection: &str) -> DbResult<InsertOneResult>;
    async fn insert_many(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DbResult<InsertManyResult>;
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOneOptions,
    ) -> DbResult<Document>;
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> DbResult<DocumentStream>;
    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> DbResult<UpdateResult>;
    async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult>;
    /// [`Connector::shutdown`] for a boxed connector.
    async fn shutdown_boxed(self: Box<Self>) -> DbResult<()>;

    /// The concrete connector, for [`DynDatabase::downcast_ref`](crate::database::DynDatabase::downcast_ref).
    fn as_any(&self) -> &dyn Any;
    /// The concrete connector, for [`DynDatabase::downcast`](crate::database::DynDatabase::downcast).
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<C: Connector + 'static> DynConnector for C {
    async fn create_collection(&self, name: &str) -> DbResult<()> {
        Connector::create_collection(self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DbResult<()> {
        Connector::drop_collection(self, name).await
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        Connector::list_collections(self).await
    }

    async fn insert_one(&self, document: Document, collection: &str) -> DbResult<InsertOneResult> {
        Connector::insert_one(self, document, collection).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DbResult<InsertManyResult> {
        Connector::insert_many(self, documents, collection).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOneOptions,
    ) -> DbResult<Document> {
        Connector::find_one(self, collection, filter, options).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> DbResult<DocumentStream> {
        Connector::find(self, collection, filter, options).await
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> DbResult<UpdateResult> {
        Connector::update(self, collection, filter, document).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult> {
        Connector::delete(self, collection, filter).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DbResult<()> {
        Connector::shutdown(*self).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[async_trait]
impl Connector for Box<dyn DynConnector> {
    async fn create_collection(&self, name: &str) -> DbResult<()> {
        DynConnector::create_collection(&**self, name).await
    }

    async fn drop_collection(&self, name: &str) -> DbResult<()> {
        DynConnector::drop_collection(&**self, name).await
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        DynConnector::list_collections(&**self).await
    }

    async fn insert_one(&self, document: Document, collection: &str) -> DbResult<InsertOneResult> {
        DynConnector::insert_one(&**self, document, collection).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DbResult<InsertManyResult> {
        DynConnector::insert_many(&**self, documents, collection).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOneOptions,
    ) -> DbResult<Document> {
        DynConnector::find_one(&**self, collection, filter, options).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> DbResult<DocumentStream> {
        DynConnector::find(&**self, collection, filter, options).await
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> DbResult<UpdateResult> {
        DynConnector::update(&**self, collection, filter, document).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult> {
        DynConnector::delete(&**self, collection, filter).await
    }

    async fn shutdown(self) -> DbResult<()> {
        DynConnector::shutdown_boxed(self).await
    }
}

/// Factory for connectors that need configuration or async setup.
#[async_trait]
pub trait ConnectorBuilder {
    type Connector: Connector;

    async fn build(self) -> DbResult<Self::Connector>;
}
