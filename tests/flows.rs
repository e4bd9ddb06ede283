use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use restaurant_examples::{
    data::{by_cuisine, Restaurant},
    db::RestaurantStore,
    flows,
    memory::MemoryStore,
};

#[tokio::test]
async fn test_insert_and_find() {
    let store = MemoryStore::new();

    let found = flows::insert_and_find(&store).await.unwrap().unwrap();
    assert_eq!(found, Restaurant::new("8282", "Korean"));

    let mut out = Vec::new();
    flows::write_restaurant(&mut out, &found).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "8282 Korean\n");

    // cleaned up afterwards
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_insert_and_find_leaves_other_documents() {
    let store = MemoryStore::new();
    store
        .insert_one(&Restaurant::new("Sarabeth's", "American"))
        .await
        .unwrap();

    flows::insert_and_find(&store).await.unwrap().unwrap();
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_insert() {
    let store = MemoryStore::new();

    let rests = flows::concurrent_insert(&store, 5).await.unwrap();

    let mut out = Vec::new();
    flows::write_names(&mut out, &rests).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "0\n1\n2\n3\n4\n");
    assert!(rests.iter().all(|r| r.cuisine == "Korean"));
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn test_concurrent_insert_sorts_as_strings() {
    let store = MemoryStore::new();

    let rests = flows::concurrent_insert(&store, 12).await.unwrap();
    let names = rests.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(
        names,
        ["0", "1", "10", "11", "2", "3", "4", "5", "6", "7", "8", "9"]
    );
}

/// Fails every insert after the first `ok` ones.
#[derive(Clone)]
struct FlakyStore {
    inner: MemoryStore,
    ok: usize,
    seen: Arc<AtomicUsize>,
}

#[async_trait]
impl RestaurantStore for FlakyStore {
    async fn insert_one(&self, restaurant: &Restaurant) -> anyhow::Result<Bson> {
        if self.seen.fetch_add(1, Ordering::SeqCst) >= self.ok {
            anyhow::bail!("connection reset while inserting {}", restaurant.name);
        }
        self.inner.insert_one(restaurant).await
    }

    async fn find_one(&self, filter: Document) -> anyhow::Result<Option<Restaurant>> {
        self.inner.find_one(filter).await
    }

    async fn find(&self, filter: Document) -> anyhow::Result<Vec<Restaurant>> {
        self.inner.find(filter).await
    }

    async fn delete_many(&self, filter: Document) -> anyhow::Result<u64> {
        self.inner.delete_many(filter).await
    }
}

#[tokio::test]
async fn test_concurrent_insert_reports_failed_task() {
    let store = FlakyStore {
        inner: MemoryStore::new(),
        ok: 3,
        seen: Arc::new(AtomicUsize::new(0)),
    };

    let err = flows::concurrent_insert(&store, 5).await.unwrap_err();
    assert!(err.to_string().contains("connection reset"));

    // every task ran before the flow gave up
    assert_eq!(store.seen.load(Ordering::SeqCst), 5);
    // no query or cleanup after a failed fan-out
    let left = store.inner.find(by_cuisine("Korean")).await.unwrap();
    assert_eq!(left.len(), 3);
}

/// Swallows inserts, so reads never see them.
struct BlackHole;

#[async_trait]
impl RestaurantStore for BlackHole {
    async fn insert_one(&self, _restaurant: &Restaurant) -> anyhow::Result<Bson> {
        Ok(Bson::Null)
    }

    async fn find_one(&self, _filter: Document) -> anyhow::Result<Option<Restaurant>> {
        Ok(None)
    }

    async fn find(&self, _filter: Document) -> anyhow::Result<Vec<Restaurant>> {
        Ok(Vec::new())
    }

    async fn delete_many(&self, _filter: Document) -> anyhow::Result<u64> {
        panic!("nothing to clean up")
    }
}

#[tokio::test]
async fn test_insert_and_find_without_match() {
    let found = flows::insert_and_find(&BlackHole).await.unwrap();
    assert!(found.is_none());
}
