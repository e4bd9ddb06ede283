use anyhow::Context;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Client, Collection,
};

use crate::{config::Config, data::Restaurant};

/// The handful of collection calls the examples are built on.
#[async_trait]
pub trait RestaurantStore: Send + Sync {
    /// Returns the id the store assigned to the new document.
    async fn insert_one(&self, restaurant: &Restaurant) -> anyhow::Result<Bson>;

    /// `None` when nothing matches.
    async fn find_one(&self, filter: Document) -> anyhow::Result<Option<Restaurant>>;

    async fn find(&self, filter: Document) -> anyhow::Result<Vec<Restaurant>>;

    async fn delete_many(&self, filter: Document) -> anyhow::Result<u64>;
}

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    collection: Collection<Restaurant>,
}

impl MongoStore {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .context("fail to connect to mongodb")?;
        let collection = client
            .database(&config.database)
            .collection::<Restaurant>(&config.collection);

        tracing::info!(
            database = %config.database,
            collection = %config.collection,
            "connected to mongodb"
        );

        Ok(Self { client, collection })
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .context("fail to ping mongodb")?;
        Ok(())
    }

    /// Drop the bound collection and every document in it.
    pub async fn drop_collection(&self) -> anyhow::Result<()> {
        self.collection
            .drop()
            .await
            .with_context(|| format!("fail to drop collection {}", self.collection.name()))?;
        tracing::info!(collection = %self.collection.name(), "dropped collection");
        Ok(())
    }

    // consumes the store, clones held by other tasks stop working after this
    pub async fn disconnect(self) {
        self.client.shutdown().await;
        tracing::info!("disconnected from mongodb");
    }
}

#[async_trait]
impl RestaurantStore for MongoStore {
    async fn insert_one(&self, restaurant: &Restaurant) -> anyhow::Result<Bson> {
        let result = self
            .collection
            .insert_one(restaurant)
            .await
            .with_context(|| format!("fail to insert restaurant {}", restaurant.name))?;
        tracing::info!(name = %restaurant.name, id = %result.inserted_id, "inserted restaurant");
        Ok(result.inserted_id)
    }

    async fn find_one(&self, filter: Document) -> anyhow::Result<Option<Restaurant>> {
        self.collection
            .find_one(filter.clone())
            .await
            .with_context(|| format!("fail to find restaurant by {filter}"))
    }

    async fn find(&self, filter: Document) -> anyhow::Result<Vec<Restaurant>> {
        let cursor = self
            .collection
            .find(filter.clone())
            .await
            .with_context(|| format!("fail to query restaurants by {filter}"))?;
        cursor
            .try_collect()
            .await
            .with_context(|| format!("fail to read restaurants matching {filter}"))
    }

    async fn delete_many(&self, filter: Document) -> anyhow::Result<u64> {
        let result = self
            .collection
            .delete_many(filter.clone())
            .await
            .with_context(|| format!("fail to delete restaurants by {filter}"))?;
        tracing::info!(count = result.deleted_count, "deleted restaurants");
        Ok(result.deleted_count)
    }
}
