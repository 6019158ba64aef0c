//! The CRUD facade application code talks to.
//!
//! [`Database`] wraps any [`Connector`] and exposes one uniform operation set.
//! Caller values are normalized into documents here, before the connector sees
//! them, so every backend receives the same input and returns the same result
//! and error shape.
//!
//! - [`Database<C>`] - statically dispatched over a known connector type
//! - [`DynDatabase`] - backed by a boxed [`DynConnector`] chosen at runtime
//!
//! # Example
//!
//! ```ignore
//! use dbconn::prelude::*;
//! use dbconn::memory::InMemoryConnector;
//! use bson::doc;
//!
//! let db = Database::new(InMemoryConnector::new());
//! db.create_collection("users").await?;
//! db.create(&doc! { "_id": "a", "name": "x" }, "users").await?;
//!
//! let user = db
//!     .find_one("users", &Filter::builder().eq("name", "x").build()?, None)
//!     .await?;
//! ```

use bson::Document;
use futures::TryStreamExt;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    collection::Collection,
    connector::{Connector, DynConnector},
    document::{ID_FIELD, from_document, normalize, to_document},
    error::{DbError, DbResult},
    filter::Filter,
    options::{FindOneOptions, FindOptions},
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

/// Uniform CRUD surface over a backing connector.
#[derive(Debug)]
pub struct Database<C: Connector> {
    connector: C,
}

/// A [`Database`] whose connector is selected at runtime.
pub type DynDatabase = Database<Box<dyn DynConnector>>;

impl<C: Connector> Database<C> {
    /// Wraps a ready-to-use connector.
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    /// Returns the underlying connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Returns a handle bound to one collection.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, C> {
        Collection::new(name.to_string(), self)
    }

    /// Creates a collection. Creating an existing collection is a no-op.
    pub async fn create_collection(&self, name: &str) -> DbResult<()> {
        self.connector
            .create_collection(name)
            .await
    }

    /// Creates several collections, stopping at the first failure.
    pub async fn create_collections<I, S>(&self, names: I) -> DbResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.connector
                .create_collection(name.as_ref())
                .await?;
        }

        Ok(())
    }

    /// Drops a collection and all of its documents.
    ///
    /// # Errors
    ///
    /// The in-memory connector returns [`DbError::CollectionNotFound`] for an
    /// unknown collection.
    pub async fn drop_collection(&self, name: &str) -> DbResult<()> {
        self.connector.drop_collection(name).await
    }

    /// Drops several collections, stopping at the first failure.
    pub async fn drop_collections<I, S>(&self, names: I) -> DbResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.connector
                .drop_collection(name.as_ref())
                .await?;
        }

        Ok(())
    }

    /// Lists the names of all collections.
    pub async fn list_collections(&self) -> DbResult<Vec<String>> {
        self.connector.list_collections().await
    }

    /// Normalizes `value` into a document and inserts it into `collection`.
    ///
    /// A missing `_id` is generated and reported in the result.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conversion`] if `value` does not normalize to a
    /// document, or whatever the connector reports.
    pub async fn create<T>(&self, value: &T, collection: &str) -> DbResult<InsertOneResult>
    where
        T: Serialize + ?Sized,
    {
        let (_, document) = normalize(value)?;

        self.connector
            .insert_one(document, collection)
            .await
    }

    /// Normalizes and inserts many values on a best-effort basis.
    ///
    /// Values that fail to normalize are skipped and every other value is
    /// inserted. Nothing is rolled back.
    ///
    /// # Errors
    ///
    /// After inserting the valid values, returns the first conversion error if
    /// any value was skipped. Connector errors are returned as they occur.
    pub async fn create_many<I, T>(&self, values: I, collection: &str) -> DbResult<InsertManyResult>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        let mut documents = Vec::new();
        let mut first_error: Option<DbError> = None;

        for (index, value) in values.into_iter().enumerate() {
            match normalize(&value) {
                Ok((_, document)) => documents.push(document),
                Err(err) => {
                    tracing::warn!(collection, index, error = %err, "skipping value that is not a document");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }

        let result = if documents.is_empty() {
            InsertManyResult::default()
        } else {
            self.connector
                .insert_many(documents, collection)
                .await?
        };

        match first_error {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Returns the first document in `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] when nothing matches.
    pub async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: impl Into<Option<FindOneOptions>>,
    ) -> DbResult<Document> {
        let options = options.into().unwrap_or_default();

        self.connector
            .find_one(collection, filter, options)
            .await
    }

    /// Like [`find_one`](Self::find_one), decoding the document into `T`.
    pub async fn find_one_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
        options: impl Into<Option<FindOneOptions>>,
    ) -> DbResult<T> {
        from_document(self.find_one(collection, filter, options).await?)
    }

    /// Returns every document in `collection` matching `filter`.
    ///
    /// An unknown collection or an unmatched filter yields an empty vector.
    pub async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: impl Into<Option<FindOptions>>,
    ) -> DbResult<Vec<Document>> {
        let options = options.into().unwrap_or_default();

        self.connector
            .find(collection, filter, options)
            .await?
            .try_collect()
            .await
    }

    /// Like [`find`](Self::find), decoding every document into `T`.
    pub async fn find_as<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: &Filter,
        options: impl Into<Option<FindOptions>>,
    ) -> DbResult<Vec<T>> {
        self.find(collection, filter, options)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    /// Replaces the content of documents matching `filter` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Conversion`] if `value` does not normalize to a
    /// document or has no fields besides `_id`, and [`DbError::NotFound`] when
    /// nothing matches.
    pub async fn update<T>(&self, collection: &str, filter: &Filter, value: &T) -> DbResult<UpdateResult>
    where
        T: Serialize + ?Sized,
    {
        let document = to_document(value)?;

        if document.keys().all(|key| key == ID_FIELD) {
            return Err(DbError::Conversion(
                "replacement has no fields besides the identifier".to_string(),
            ));
        }

        self.connector
            .update(collection, filter, document)
            .await
    }

    /// Deletes documents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotFound`] when nothing matches.
    pub async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult> {
        self.connector
            .delete(collection, filter)
            .await
    }

    /// Shuts the connector down, consuming the facade.
    pub async fn shutdown(self) -> DbResult<()> {
        self.connector.shutdown().await
    }
}

impl<C: Connector + 'static> Database<C> {
    /// Erases the connector type.
    pub fn into_dyn(self) -> DynDatabase {
        Database::new(Box::new(self.connector) as Box<dyn DynConnector>)
    }
}

impl DynDatabase {
    /// Returns the connector as `C` if that is its concrete type.
    pub fn downcast_ref<C: Connector + 'static>(&self) -> Option<&C> {
        DynConnector::as_any(&*self.connector).downcast_ref::<C>()
    }

    /// Recovers the statically typed facade if the connector is a `C`.
    ///
    /// The database is consumed either way; check with
    /// [`downcast_ref`](Self::downcast_ref) first to keep it on a mismatch.
    pub fn downcast<C: Connector + 'static>(self) -> Option<Database<C>> {
        DynConnector::into_any(self.connector)
            .downcast::<C>()
            .ok()
            .map(|connector| Database::new(*connector))
    }
}
