//! Runs the examples against a real server. Skipped unless `MONGODB_URI` is set.

use mongodb::bson::{oid::ObjectId, Document};
use restaurant_examples::{
    config::Config,
    data::{by_name, Restaurant},
    db::{MongoStore, RestaurantStore},
    flows,
};

// each test gets its own collection so they can run in parallel
async fn connect(test: &str) -> Option<MongoStore> {
    let uri = std::env::var("MONGODB_URI").ok().filter(|uri| !uri.is_empty())?;
    let config = Config {
        uri,
        database: "restaurant_examples_test".to_string(),
        collection: format!("{test}_{}", ObjectId::new().to_hex()),
        workers: 5,
    };

    let store = MongoStore::connect(&config).await.unwrap();
    store.ping().await.unwrap();
    Some(store)
}

#[tokio::test]
async fn test_live_insert_and_find() {
    let Some(store) = connect("insert_and_find").await else {
        eprintln!("MONGODB_URI not set, skipping");
        return;
    };

    let found = flows::insert_and_find(&store).await.unwrap().unwrap();
    assert_eq!(found, Restaurant::new("8282", "Korean"));
    assert!(store.find_one(by_name("8282")).await.unwrap().is_none());

    store.drop_collection().await.unwrap();
    store.disconnect().await;
}

#[tokio::test]
async fn test_live_drop_collection() {
    let Some(store) = connect("drop_collection").await else {
        eprintln!("MONGODB_URI not set, skipping");
        return;
    };

    store
        .insert_one(&Restaurant::new("Sarabeth's", "American"))
        .await
        .unwrap();
    store.drop_collection().await.unwrap();
    assert!(store.find(Document::new()).await.unwrap().is_empty());

    store.disconnect().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_live_concurrent_insert() {
    let Some(store) = connect("concurrent_insert").await else {
        eprintln!("MONGODB_URI not set, skipping");
        return;
    };

    let rests = flows::concurrent_insert(&store, 5).await.unwrap();
    let names = rests.iter().map(|r| r.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["0", "1", "2", "3", "4"]);

    store.drop_collection().await.unwrap();
    store.disconnect().await;
}
