use async_trait::async_trait;
use bson::{Document, doc};
use futures::{StreamExt, TryStreamExt};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{
        ClientOptions, FindOneOptions as MongoFindOneOptions, FindOptions as MongoFindOptions,
    },
};

use dbconn_core::{
    connector::{Connector, ConnectorBuilder, DocumentStream},
    document::ID_FIELD,
    error::{DbError, DbResult},
    filter::{Filter, FilterVisitor},
    options::{FindOneOptions, FindOptions},
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

use crate::{
    config::MongoConfig,
    query::{MongoFilterTranslator, sort_document},
};

/// Logs a driver failure and turns it into [`DbError::Backend`].
fn backend_error(operation: &'static str, collection: &str) -> impl FnOnce(mongodb::error::Error) -> DbError {
    let collection = collection.to_string();

    move |err| {
        tracing::error!(operation, collection = %collection, error = %err, "mongodb operation failed");
        DbError::Backend(err.to_string())
    }
}

/// Builds the `$set` update replacing every field of a match except `_id`.
fn set_update(mut document: Document) -> DbResult<Document> {
    document.remove(ID_FIELD);

    if document.is_empty() {
        return Err(DbError::Conversion(
            "replacement has no fields besides the identifier".to_string(),
        ));
    }

    Ok(doc! { "$set": document })
}

fn translate(filter: &Filter) -> DbResult<Document> {
    MongoFilterTranslator.visit_filter(filter)
}

/// Connector backed by a live MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    client: Client,
    database: String,
}

impl MongoConnector {
    /// Wraps an already configured driver client.
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    pub fn builder(config: MongoConfig) -> MongoConnectorBuilder {
        MongoConnectorBuilder::new(config)
    }

    /// Returns the underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn get_collection(&self, collection: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    async fn create_collection(&self, name: &str) -> DbResult<()> {
        let database = self.client.database(&self.database);
        let existing = database
            .list_collection_names()
            .await
            .map_err(backend_error("list_collections", name))?;

        if existing.iter().any(|existing| existing == name) {
            return Ok(());
        }

        database
            .create_collection(name)
            .await
            .map_err(backend_error("create_collection", name))?;

        tracing::debug!(collection = name, "created collection");

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DbResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error("drop_collection", name))?;

        tracing::debug!(collection = name, "dropped collection");

        Ok(())
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        let mut names = self
            .client
            .database(&self.database)
            .list_collection_names()
            .await
            .map_err(backend_error("list_collections", &self.database))?;
        names.sort();

        Ok(names)
    }

    async fn insert_one(&self, document: Document, collection: &str) -> DbResult<InsertOneResult> {
        let result = self
            .get_collection(collection)
            .insert_one(document)
            .await
            .map_err(backend_error("insert_one", collection))?;

        tracing::debug!(collection, id = %result.inserted_id, "inserted document");

        Ok(InsertOneResult {
            inserted_id: result.inserted_id,
        })
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DbResult<InsertManyResult> {
        if documents.is_empty() {
            return Ok(InsertManyResult::default());
        }

        let result = self
            .get_collection(collection)
            .insert_many(documents)
            .ordered(false)
            .await
            .map_err(backend_error("insert_many", collection))?;

        let mut inserted: Vec<_> = result.inserted_ids.into_iter().collect();
        inserted.sort_by_key(|(index, _)| *index);
        let inserted_ids: Vec<_> = inserted
            .into_iter()
            .map(|(_, id)| id)
            .collect();

        tracing::debug!(collection, count = inserted_ids.len(), "inserted documents");

        Ok(InsertManyResult { inserted_ids })
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOneOptions,
    ) -> DbResult<Document> {
        let mut mongo_options = MongoFindOneOptions::default();
        mongo_options.sort = options.sort.as_ref().map(sort_document);
        mongo_options.skip = options.skip.map(|skip| skip as u64);

        self.get_collection(collection)
            .find_one(translate(filter)?)
            .with_options(mongo_options)
            .await
            .map_err(backend_error("find_one", collection))?
            .ok_or_else(|| DbError::NotFound(collection.to_string()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> DbResult<DocumentStream> {
        let mut mongo_options = MongoFindOptions::default();
        mongo_options.sort = options.sort.as_ref().map(sort_document);
        mongo_options.skip = options.skip.map(|skip| skip as u64);
        mongo_options.limit = options.limit.map(|limit| limit as i64);

        let cursor = self
            .get_collection(collection)
            .find(translate(filter)?)
            .with_options(mongo_options)
            .await
            .map_err(backend_error("find", collection))?;

        let collection = collection.to_string();

        Ok(cursor
            .map_err(move |err| backend_error("find", &collection)(err))
            .boxed())
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
    ) -> DbResult<UpdateResult> {
        let update = set_update(document)?;

        let result = self
            .get_collection(collection)
            .update_many(translate(filter)?, update)
            .await
            .map_err(backend_error("update", collection))?;

        if result.matched_count == 0 {
            return Err(DbError::NotFound(collection.to_string()));
        }

        tracing::debug!(
            collection,
            matched_count = result.matched_count,
            modified_count = result.modified_count,
            "updated documents"
        );

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult> {
        let result = self
            .get_collection(collection)
            .delete_many(translate(filter)?)
            .await
            .map_err(backend_error("delete", collection))?;

        if result.deleted_count == 0 {
            return Err(DbError::NotFound(collection.to_string()));
        }

        tracing::debug!(collection, deleted_count = result.deleted_count, "deleted documents");

        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn shutdown(self) -> DbResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

/// Builds a [`MongoConnector`] from a [`MongoConfig`].
///
/// ```ignore
/// let connector = MongoConnector::builder(MongoConfig::from_env("app")?)
///     .build()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct MongoConnectorBuilder {
    config: MongoConfig,
}

impl MongoConnectorBuilder {
    pub fn new(config: MongoConfig) -> Self {
        Self { config }
    }

    async fn client_options(&self) -> DbResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.config.url)
            .await
            .map_err(|e| DbError::Initialization(e.to_string()))?;

        if let Some(app_name) = &self.config.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(timeout) = self.config.connect_timeout {
            options.connect_timeout = Some(timeout);
        }
        if let Some(timeout) = self.config.server_selection_timeout {
            options.server_selection_timeout = Some(timeout);
        }

        Ok(options)
    }
}

#[async_trait]
impl ConnectorBuilder for MongoConnectorBuilder {
    type Connector = MongoConnector;

    async fn build(self) -> DbResult<Self::Connector> {
        let options = self.client_options().await?;
        let client = Client::with_options(options)
            .map_err(|e| DbError::Initialization(e.to_string()))?;

        tracing::debug!(database = %self.config.database, "connected to mongodb");

        Ok(MongoConnector::new(client, self.config.database))
    }
}
