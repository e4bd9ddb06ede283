use std::io::Write;

use anyhow::Context;
use tokio::task::JoinSet;

use crate::{
    data::{by_cuisine, by_name, Restaurant},
    db::RestaurantStore,
};

pub const SAMPLE_NAME: &str = "8282";
pub const SAMPLE_CUISINE: &str = "Korean";

/// Insert one restaurant and read it back by name.
///
/// Matching documents are deleted before returning. `None` means the insert
/// was not visible to the query, and nothing is cleaned up in that case.
pub async fn insert_and_find<S>(store: &S) -> anyhow::Result<Option<Restaurant>>
where
    S: RestaurantStore + ?Sized,
{
    store
        .insert_one(&Restaurant::new(SAMPLE_NAME, SAMPLE_CUISINE))
        .await?;

    let filter = by_name(SAMPLE_NAME);
    let Some(found) = store.find_one(filter.clone()).await? else {
        tracing::warn!(name = SAMPLE_NAME, "inserted restaurant not found");
        return Ok(None);
    };

    store.delete_many(filter).await?;
    Ok(Some(found))
}

/// Insert `workers` restaurants from independent tasks, wait for all of them,
/// then read back every restaurant of the shared cuisine sorted by name.
///
/// Every task is joined even if one fails; the first failure is returned.
/// On success the inserted cuisine is deleted again.
pub async fn concurrent_insert<S>(store: &S, workers: usize) -> anyhow::Result<Vec<Restaurant>>
where
    S: RestaurantStore + Clone + 'static,
{
    let mut tasks = JoinSet::new();
    for i in 0..workers {
        let store = store.clone();
        tasks.spawn(async move {
            store
                .insert_one(&Restaurant::new(i.to_string(), SAMPLE_CUISINE))
                .await
        });
    }

    let mut first_err = None;
    while let Some(joined) = tasks.join_next().await {
        let result = joined
            .context("insert task panicked")
            .and_then(|inserted| inserted);
        if let Err(e) = result {
            tracing::error!("insert task failed: {e:#}");
            if first_err.is_none() {
                first_err = Some(e);
            }
        }
    }
    if let Some(e) = first_err {
        return Err(e);
    }

    let filter = by_cuisine(SAMPLE_CUISINE);
    let mut results = store.find(filter.clone()).await?;
    results.sort_by(|a, b| a.name.cmp(&b.name));

    store.delete_many(filter).await?;
    Ok(results)
}

pub fn write_restaurant(out: &mut impl Write, rest: &Restaurant) -> std::io::Result<()> {
    writeln!(out, "{} {}", rest.name, rest.cuisine)
}

pub fn write_names(out: &mut impl Write, rests: &[Restaurant]) -> std::io::Result<()> {
    for rest in rests {
        writeln!(out, "{}", rest.name)?;
    }
    Ok(())
}

#[test]
fn test_write_restaurant() {
    let mut out = Vec::new();
    write_restaurant(&mut out, &Restaurant::new(SAMPLE_NAME, SAMPLE_CUISINE)).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "8282 Korean\n");
}
