//! A handle bound to a single collection.
//!
//! [`Collection`] saves repeating the collection name on every call; each
//! method forwards to the matching [`Database`] operation.
//!
//! ```ignore
//! let users = db.collection("users");
//! users.create(&doc! { "_id": "a", "name": "x" }).await?;
//! let found = users.find_one(&Filter::by_id("a"), None).await?;
//! ```

use bson::Document;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    connector::Connector,
    database::Database,
    error::DbResult,
    filter::Filter,
    options::{FindOneOptions, FindOptions},
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

#[derive(Debug)]
pub struct Collection<'a, C: Connector> {
    name: String,
    database: &'a Database<C>,
}

impl<'a, C: Connector> Collection<'a, C> {
    pub(crate) fn new(name: String, database: &'a Database<C>) -> Self {
        Self { name, database }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates the collection if it does not exist yet.
    pub async fn ensure_created(&self) -> DbResult<()> {
        self.database
            .create_collection(&self.name)
            .await
    }

    pub async fn create<T>(&self, value: &T) -> DbResult<InsertOneResult>
    where
        T: Serialize + ?Sized,
    {
        self.database.create(value, &self.name).await
    }

    pub async fn create_many<I, T>(&self, values: I) -> DbResult<InsertManyResult>
    where
        I: IntoIterator<Item = T>,
        T: Serialize,
    {
        self.database
            .create_many(values, &self.name)
            .await
    }

    pub async fn find_one(
        &self,
        filter: &Filter,
        options: impl Into<Option<FindOneOptions>>,
    ) -> DbResult<Document> {
        self.database
            .find_one(&self.name, filter, options)
            .await
    }

    pub async fn find_one_as<T: DeserializeOwned>(
        &self,
        filter: &Filter,
        options: impl Into<Option<FindOneOptions>>,
    ) -> DbResult<T> {
        self.database
            .find_one_as(&self.name, filter, options)
            .await
    }

    pub async fn find(
        &self,
        filter: &Filter,
        options: impl Into<Option<FindOptions>>,
    ) -> DbResult<Vec<Document>> {
        self.database
            .find(&self.name, filter, options)
            .await
    }

    pub async fn find_as<T: DeserializeOwned>(
        &self,
        filter: &Filter,
        options: impl Into<Option<FindOptions>>,
    ) -> DbResult<Vec<T>> {
        self.database
            .find_as(&self.name, filter, options)
            .await
    }

    pub async fn update<T>(&self, filter: &Filter, value: &T) -> DbResult<UpdateResult>
    where
        T: Serialize + ?Sized,
    {
        self.database
            .update(&self.name, filter, value)
            .await
    }

    pub async fn delete(&self, filter: &Filter) -> DbResult<DeleteResult> {
        self.database
            .delete(&self.name, filter)
            .await
    }

    /// Drops the collection and all of its documents.
    pub async fn drop(self) -> DbResult<()> {
        self.database
            .drop_collection(&self.name)
            .await
    }
}
