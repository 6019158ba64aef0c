//! In-memory connector used for tests and local development.
//!
//! Documents are kept as BSON documents in hash maps guarded by one async
//! read-write lock. The connector is strict about collections: every write must
//! target a collection that was created first.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, doc, ser::serialize_to_vec};
use futures::{StreamExt, stream};
use mea::rwlock::RwLock;

use dbconn_core::{
    connector::{Connector, ConnectorBuilder, DocumentStream},
    document::{ID_FIELD, ensure_id, ensure_id_with},
    error::{DbError, DbResult},
    filter::Filter,
    options::{FindOneOptions, FindOptions},
    results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult},
};

use crate::matcher::{DocumentMatcher, sort_documents};

type CollectionMap = HashMap<Vec<u8>, Document>;
type StoreMap = HashMap<String, CollectionMap>;

/// Key under which a document is stored: the encoded bytes of `{_id: id}`.
/// The encoding carries the BSON type, so `"1"`, `1` and `1i64` stay distinct.
fn id_key(id: &Bson) -> DbResult<Vec<u8>> {
    Ok(serialize_to_vec(&doc! { ID_FIELD: id.clone() })?)
}

/// Thread-safe in-memory document connector.
///
/// Clones share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use dbconn_memory::InMemoryConnector;
/// use dbconn::prelude::*;
/// use bson::doc;
///
/// let db = Database::new(InMemoryConnector::new());
/// db.create_collection("users").await?;
/// db.create(&doc! { "_id": "a", "name": "x" }, "users").await?;
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryConnector {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryConnector {
    /// Creates an empty connector with no collections.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    pub fn builder() -> InMemoryConnectorBuilder {
        InMemoryConnectorBuilder::default()
    }

    /// Returns the documents of `collection` that match `filter`, ordered and
    /// windowed by `options`.
    async fn select(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Vec<Document> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Vec::new();
        };

        let mut matched: Vec<&Document> =
            DocumentMatcher::filter_documents(collection_map.values(), filter).collect();

        if let Some(sort) = &options.sort {
            sort_documents(&mut matched, sort);
        }

        matched
            .into_iter()
            .skip(options.skip.unwrap_or(0))
            .take(match options.limit {
                // A zero limit means no limit, as with the driver.
                None | Some(0) => usize::MAX,
                Some(limit) => limit,
            })
            .cloned()
            .collect()
    }
}

/// Finds the key of the first document in `collection_map` matching `filter`.
fn first_match(collection_map: &CollectionMap, filter: &Filter) -> Option<Vec<u8>> {
    collection_map
        .iter()
        .find(|(_, document)| DocumentMatcher::new(document).matches(filter))
        .map(|(key, _)| key.clone())
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn create_collection(&self, name: &str) -> DbResult<()> {
        self.store
            .write()
            .await
            .entry(name.to_string())
            .or_default();

        tracing::debug!(collection = name, "created collection");

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> DbResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(DbError::CollectionNotFound(name.to_string()));
        }

        tracing::debug!(collection = name, "dropped collection");

        Ok(())
    }

    async fn list_collections(&self) -> DbResult<Vec<String>> {
        let mut names: Vec<String> = self
            .store
            .read()
            .await
            .keys()
            .cloned()
            .collect();
        names.sort();

        Ok(names)
    }

    async fn insert_one(&self, mut document: Document, collection: &str) -> DbResult<InsertOneResult> {
        let mut store = self.store.write().await;
        let collection_map = store
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;

        let id = ensure_id(&mut document);
        collection_map.insert(id_key(&id)?, document);

        tracing::debug!(collection, id = %id, "inserted document");

        Ok(InsertOneResult { inserted_id: id })
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        collection: &str,
    ) -> DbResult<InsertManyResult> {
        let mut store = self.store.write().await;
        let collection_map = store
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;

        let mut inserted_ids = Vec::with_capacity(documents.len());

        for mut document in documents {
            let id = ensure_id(&mut document);
            collection_map.insert(id_key(&id)?, document);
            inserted_ids.push(id);
        }

        tracing::debug!(collection, count = inserted_ids.len(), "inserted documents");

        Ok(InsertManyResult { inserted_ids })
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOneOptions,
    ) -> DbResult<Document> {
        self.select(collection, filter, options.into())
            .await
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(collection.to_string()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> DbResult<DocumentStream> {
        let documents = self.select(collection, filter, options).await;

        tracing::debug!(collection, count = documents.len(), "found documents");

        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }

    async fn update(
        &self,
        collection: &str,
        filter: &Filter,
        mut document: Document,
    ) -> DbResult<UpdateResult> {
        let mut store = self.store.write().await;
        let collection_map = store
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;

        let key = first_match(collection_map, filter)
            .ok_or_else(|| DbError::NotFound(collection.to_string()))?;
        let previous_id = collection_map
            .get(&key)
            .and_then(|previous| previous.get(ID_FIELD))
            .cloned()
            .unwrap_or(Bson::Null);

        let id = ensure_id_with(&mut document, || previous_id);
        let new_key = id_key(&id)?;
        let previous = collection_map
            .remove(&key)
            .ok_or_else(|| DbError::NotFound(collection.to_string()))?;
        let modified_count = u64::from(previous != document);
        collection_map.insert(new_key, document);

        tracing::debug!(collection, id = %id, modified_count, "replaced document");

        Ok(UpdateResult {
            matched_count: 1,
            modified_count,
        })
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> DbResult<DeleteResult> {
        let mut store = self.store.write().await;
        let collection_map = store
            .get_mut(collection)
            .ok_or_else(|| DbError::CollectionNotFound(collection.to_string()))?;

        let key = first_match(collection_map, filter)
            .ok_or_else(|| DbError::NotFound(collection.to_string()))?;
        collection_map.remove(&key);

        tracing::debug!(collection, "deleted document");

        Ok(DeleteResult { deleted_count: 1 })
    }

    async fn shutdown(self) -> DbResult<()> {
        self.store.write().await.clear();

        Ok(())
    }
}

/// Builder for [`InMemoryConnector`] instances.
///
/// ```ignore
/// let connector = InMemoryConnector::builder()
///     .collection("users")
///     .collection("orders")
///     .build()
///     .await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryConnectorBuilder {
    collections: Vec<String>,
}

impl InMemoryConnectorBuilder {
    /// Creates `name` as an empty collection when the connector is built.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collections.push(name.into());
        self
    }
}

#[async_trait]
impl ConnectorBuilder for InMemoryConnectorBuilder {
    type Connector = InMemoryConnector;

    async fn build(self) -> DbResult<Self::Connector> {
        let connector = InMemoryConnector::new();

        for name in &self.collections {
            Connector::create_collection(&connector, name).await?;
        }

        Ok(connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use futures::TryStreamExt;
    use dbconn_core::options::SortDirection;

    async fn connector_with_users() -> InMemoryConnector {
        InMemoryConnector::builder()
            .collection("users")
            .build()
            .await
            .unwrap()
    }

    async fn collect(stream: DocumentStream) -> Vec<Document> {
        stream.try_collect().await.unwrap()
    }

    #[tokio::test]
    async fn builder_pre_creates_collections() {
        let connector = InMemoryConnector::builder()
            .collection("users")
            .collection("orders")
            .build()
            .await
            .unwrap();

        assert_eq!(
            connector.list_collections().await.unwrap(),
            vec!["orders".to_string(), "users".to_string()]
        );
    }

    #[tokio::test]
    async fn create_collection_is_idempotent() {
        let connector = connector_with_users().await;
        connector
            .insert_one(doc! { "_id": "a" }, "users")
            .await
            .unwrap();

        connector.create_collection("users").await.unwrap();

        let found = connector
            .find_one("users", &Filter::by_id("a"), FindOneOptions::default())
            .await
            .unwrap();
        assert_eq!(found, doc! { "_id": "a" });
    }

    #[tokio::test]
    async fn writes_to_missing_collection_fail() {
        let connector = InMemoryConnector::new();

        let insert = connector.insert_one(doc! { "_id": "a" }, "users").await;
        let insert_many = connector.insert_many(vec![doc! { "_id": "a" }], "users").await;
        let update = connector
            .update("users", &Filter::empty(), doc! { "name": "x" })
            .await;
        let delete = connector.delete("users", &Filter::empty()).await;

        for result in [insert.err(), insert_many.err(), update.err(), delete.err()] {
            assert_eq!(result, Some(DbError::CollectionNotFound("users".to_string())));
        }
    }

    #[tokio::test]
    async fn reads_from_missing_collection() {
        let connector = InMemoryConnector::new();

        let err = connector
            .find_one("users", &Filter::empty(), FindOneOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let found = connector
            .find("users", &Filter::empty(), FindOptions::default())
            .await
            .unwrap();
        assert!(collect(found).await.is_empty());
    }

    #[tokio::test]
    async fn insert_overwrites_on_identifier_collision() {
        let connector = connector_with_users().await;

        connector
            .insert_one(doc! { "_id": "a", "name": "x" }, "users")
            .await
            .unwrap();
        connector
            .insert_one(doc! { "_id": "a", "name": "y" }, "users")
            .await
            .unwrap();

        let all = connector
            .find("users", &Filter::empty(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(collect(all).await, vec![doc! { "_id": "a", "name": "y" }]);
    }

    #[tokio::test]
    async fn identifiers_of_different_types_do_not_collide() {
        let connector = connector_with_users().await;

        connector
            .insert_many(
                vec![doc! { "_id": 1_i32 }, doc! { "_id": 1_i64 }, doc! { "_id": "1" }],
                "users",
            )
            .await
            .unwrap();

        let all = connector
            .find("users", &Filter::empty(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(collect(all).await.len(), 3);
    }

    #[tokio::test]
    async fn insert_generates_missing_identifier() {
        let connector = connector_with_users().await;

        let result = connector
            .insert_one(doc! { "name": "x" }, "users")
            .await
            .unwrap();
        assert!(matches!(result.inserted_id, Bson::ObjectId(_)));

        let found = connector
            .find_one("users", &Filter::by_id(result.inserted_id.clone()), FindOneOptions::default())
            .await
            .unwrap();
        assert_eq!(found.get_str("name").unwrap(), "x");
    }

    #[tokio::test]
    async fn update_keeps_matched_identifier_when_replacement_has_none() {
        let connector = connector_with_users().await;
        connector
            .insert_one(doc! { "_id": "a", "name": "x" }, "users")
            .await
            .unwrap();

        let result = connector
            .update("users", &Filter::by_id("a"), doc! { "name": "z" })
            .await
            .unwrap();
        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 1 });

        let found = connector
            .find_one("users", &Filter::by_id("a"), FindOneOptions::default())
            .await
            .unwrap();
        assert_eq!(found, doc! { "_id": "a", "name": "z" });
    }

    #[tokio::test]
    async fn update_with_new_identifier_removes_the_old_document() {
        let connector = connector_with_users().await;
        connector
            .insert_one(doc! { "_id": "a", "name": "x" }, "users")
            .await
            .unwrap();

        connector
            .update("users", &Filter::by_id("a"), doc! { "_id": "b", "name": "x" })
            .await
            .unwrap();

        let old = connector
            .find_one("users", &Filter::by_id("a"), FindOneOptions::default())
            .await
            .unwrap_err();
        assert!(old.is_not_found());

        let all = connector
            .find("users", &Filter::empty(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(collect(all).await, vec![doc! { "_id": "b", "name": "x" }]);
    }

    #[tokio::test]
    async fn update_with_identical_content_reports_no_modification() {
        let connector = connector_with_users().await;
        connector
            .insert_one(doc! { "_id": "a", "name": "x" }, "users")
            .await
            .unwrap();

        let result = connector
            .update("users", &Filter::by_id("a"), doc! { "_id": "a", "name": "x" })
            .await
            .unwrap();

        assert_eq!(result, UpdateResult { matched_count: 1, modified_count: 0 });
    }

    #[tokio::test]
    async fn update_and_delete_without_match_are_not_found() {
        let connector = connector_with_users().await;

        let update = connector
            .update("users", &Filter::by_id("a"), doc! { "name": "x" })
            .await
            .unwrap_err();
        let delete = connector
            .delete("users", &Filter::by_id("a"))
            .await
            .unwrap_err();

        assert_eq!(update, DbError::NotFound("users".to_string()));
        assert_eq!(delete, DbError::NotFound("users".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_only_the_first_match() {
        let connector = connector_with_users().await;
        connector
            .insert_many(
                vec![
                    doc! { "_id": "a", "role": "admin" },
                    doc! { "_id": "b", "role": "admin" },
                ],
                "users",
            )
            .await
            .unwrap();

        let result = connector
            .delete("users", &Filter::builder().eq("role", "admin").build().unwrap())
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 1);

        let remaining = connector
            .find("users", &Filter::empty(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(collect(remaining).await.len(), 1);
    }

    #[tokio::test]
    async fn find_applies_sort_then_skip_then_limit() {
        let connector = connector_with_users().await;
        connector
            .insert_many(
                (1..=5)
                    .map(|age| doc! { "_id": format!("u{age}"), "age": age })
                    .collect(),
                "users",
            )
            .await
            .unwrap();

        let options = FindOptions::builder()
            .sort("age", SortDirection::Desc)
            .skip(1)
            .limit(2)
            .build();
        let found = connector
            .find("users", &Filter::empty(), options)
            .await
            .unwrap();

        let ages: Vec<i32> = collect(found)
            .await
            .iter()
            .map(|document| document.get_i32("age").unwrap())
            .collect();
        assert_eq!(ages, vec![4, 3]);
    }

    #[tokio::test]
    async fn find_one_honors_sort_and_skip() {
        let connector = connector_with_users().await;
        connector
            .insert_many(
                vec![
                    doc! { "_id": "a", "age": 30 },
                    doc! { "_id": "b", "age": 10 },
                    doc! { "_id": "c", "age": 20 },
                ],
                "users",
            )
            .await
            .unwrap();

        let options = FindOneOptions::builder()
            .sort("age", SortDirection::Asc)
            .skip(1)
            .build();
        let found = connector
            .find_one("users", &Filter::empty(), options)
            .await
            .unwrap();

        assert_eq!(found.get_str("_id").unwrap(), "c");
    }

    #[tokio::test]
    async fn drop_collection_removes_documents() {
        let connector = connector_with_users().await;
        connector
            .insert_one(doc! { "_id": "a" }, "users")
            .await
            .unwrap();

        connector.drop_collection("users").await.unwrap();

        assert!(connector.list_collections().await.unwrap().is_empty());
        assert_eq!(
            connector.drop_collection("users").await,
            Err(DbError::CollectionNotFound("users".to_string()))
        );
    }

    #[tokio::test]
    async fn clones_share_state_and_shutdown_clears_it() {
        let connector = connector_with_users().await;
        let clone = connector.clone();

        clone
            .insert_one(doc! { "_id": "a" }, "users")
            .await
            .unwrap();
        assert!(connector
            .find_one("users", &Filter::by_id("a"), FindOneOptions::default())
            .await
            .is_ok());

        clone.shutdown().await.unwrap();
        assert!(connector.list_collections().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_limit_means_no_limit() {
        let connector = connector_with_users().await;
        connector
            .insert_many(vec![doc! { "_id": "a" }, doc! { "_id": "b" }], "users")
            .await
            .unwrap();

        let found = connector
            .find("users", &Filter::empty(), FindOptions::builder().limit(0).build())
            .await
            .unwrap();

        assert_eq!(collect(found).await.len(), 2);
    }

    #[tokio::test]
    async fn structured_identifiers_with_similar_text_do_not_collide() {
        let connector = connector_with_users().await;
        let quoted = doc! { "k": "a\", \"j\": \"b" };
        let split = doc! { "k": "a", "j": "b" };

        connector
            .insert_many(
                vec![doc! { "_id": quoted.clone(), "n": 1 }, doc! { "_id": split.clone(), "n": 2 }],
                "users",
            )
            .await
            .unwrap();

        let all = connector
            .find("users", &Filter::empty(), FindOptions::default())
            .await
            .unwrap();
        assert_eq!(collect(all).await.len(), 2);

        let found = connector
            .find_one("users", &Filter::by_id(quoted), FindOneOptions::default())
            .await
            .unwrap();
        assert_eq!(found.get_i32("n").unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_from_clones_are_all_applied() {
        let connector = connector_with_users().await;

        let tasks: Vec<_> = (0..32_i32)
            .map(|i| {
                let connector = connector.clone();
                tokio::spawn(async move {
                    connector
                        .insert_one(doc! { "_id": i, "n": 0 }, "users")
                        .await
                        .unwrap();
                    connector
                        .update("users", &Filter::by_id(i), doc! { "n": i * 10 })
                        .await
                        .unwrap();
                    if i % 2 == 1 {
                        connector
                            .delete("users", &Filter::by_id(i))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        let options = FindOptions::builder().sort("_id", SortDirection::Asc).build();
        let remaining = collect(
            connector
                .find("users", &Filter::empty(), options)
                .await
                .unwrap(),
        )
        .await;

        let expected: Vec<Document> = (0..32_i32)
            .filter(|i| i % 2 == 0)
            .map(|i| doc! { "_id": i, "n": i * 10 })
            .collect();
        assert_eq!(remaining, expected);
    }
}
