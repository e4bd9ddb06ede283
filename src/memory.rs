//! A [`RestaurantStore`] that keeps documents in process memory.
//!
//! Documents go through the same BSON encoding as they would on their way to
//! the server, so omitted fields and the assigned `_id` look the same to the
//! caller. Filters only support top level equality, which is all the
//! examples send.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};

use crate::{data::Restaurant, db::RestaurantStore};

/// Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, Vec<Document>>> {
        self.docs
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

fn filter_matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, want)| doc.get(key) == Some(want))
}

fn decode(doc: &Document) -> anyhow::Result<Restaurant> {
    bson::from_document(doc.clone()).context("fail to decode restaurant")
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn insert_one(&self, restaurant: &Restaurant) -> anyhow::Result<Bson> {
        let mut doc = bson::to_document(restaurant)
            .with_context(|| format!("fail to encode restaurant {}", restaurant.name))?;
        let id = Bson::ObjectId(ObjectId::new());
        doc.insert("_id", id.clone());
        self.lock()?.push(doc);
        Ok(id)
    }

    async fn find_one(&self, filter: Document) -> anyhow::Result<Option<Restaurant>> {
        let docs = self.lock()?;
        let found = docs
            .iter()
            .find(|doc| filter_matches(doc, &filter))
            .map(decode)
            .transpose();
        found
    }

    async fn find(&self, filter: Document) -> anyhow::Result<Vec<Restaurant>> {
        let docs = self.lock()?;
        let found = docs
            .iter()
            .filter(|doc| filter_matches(doc, &filter))
            .map(decode)
            .collect();
        found
    }

    async fn delete_many(&self, filter: Document) -> anyhow::Result<u64> {
        let mut docs = self.lock()?;
        let before = docs.len();
        docs.retain(|doc| !filter_matches(doc, &filter));
        Ok((before - docs.len()) as u64)
    }
}

#[tokio::test]
async fn test_insert_assigns_object_id() {
    let store = MemoryStore::new();
    let id = store
        .insert_one(&Restaurant::new("8282", "Korean"))
        .await
        .unwrap();
    assert!(matches!(id, Bson::ObjectId(_)));
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn test_filter_and_delete() {
    let store = MemoryStore::new();
    store.insert_one(&Restaurant::new("a", "Korean")).await.unwrap();
    store.insert_one(&Restaurant::new("b", "Thai")).await.unwrap();
    store.insert_one(&Restaurant::new("c", "Korean")).await.unwrap();

    let korean = store.find(crate::data::by_cuisine("Korean")).await.unwrap();
    assert_eq!(korean.len(), 2);

    let missing = store.find_one(crate::data::by_name("z")).await.unwrap();
    assert!(missing.is_none());

    // an empty filter matches everything
    assert_eq!(store.find(Document::new()).await.unwrap().len(), 3);

    let deleted = store
        .delete_many(crate::data::by_cuisine("Korean"))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(store.len().unwrap(), 1);
}
