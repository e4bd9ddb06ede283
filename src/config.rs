use anyhow::{bail, Context};

pub const DEFAULT_DATABASE: &str = "sample_restaurants";
pub const DEFAULT_COLLECTION: &str = "restaurants";
pub const DEFAULT_WORKERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// how many insert tasks the concurrent example fans out to
    pub workers: usize,
}

impl Config {
    /// Read the config from the process environment, loading `.env` first if it exists.
    pub fn from_env() -> anyhow::Result<Self> {
        if dotenvy::dotenv().is_err() {
            tracing::info!("No .env file found");
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(uri) = non_empty("MONGODB_URI") else {
            bail!("MONGODB_URI env not found")
        };

        let workers = match non_empty("EXAMPLE_WORKERS") {
            Some(raw) => {
                let n: usize = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("EXAMPLE_WORKERS is not a number: {raw}"))?;
                if n == 0 {
                    bail!("EXAMPLE_WORKERS must be at least 1");
                }
                n
            }
            None => DEFAULT_WORKERS,
        };

        Ok(Self {
            uri,
            database: non_empty("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            collection: non_empty("MONGODB_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            workers,
        })
    }
}

#[cfg(test)]
fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults() {
    let config = Config::from_lookup(lookup(&[("MONGODB_URI", "mongodb://localhost:27017")]))
        .unwrap();
    assert_eq!(config.uri, "mongodb://localhost:27017");
    assert_eq!(config.database, DEFAULT_DATABASE);
    assert_eq!(config.collection, DEFAULT_COLLECTION);
    assert_eq!(config.workers, DEFAULT_WORKERS);
}

#[test]
fn test_overrides() {
    let config = Config::from_lookup(lookup(&[
        ("MONGODB_URI", "mongodb://db:27017"),
        ("MONGODB_DATABASE", "scratch"),
        ("MONGODB_COLLECTION", "korean"),
        ("EXAMPLE_WORKERS", " 12 "),
    ]))
    .unwrap();
    assert_eq!(config.database, "scratch");
    assert_eq!(config.collection, "korean");
    assert_eq!(config.workers, 12);
}

#[test]
fn test_missing_uri() {
    let err = Config::from_lookup(lookup(&[("MONGODB_URI", "  ")])).unwrap_err();
    assert!(err.to_string().contains("MONGODB_URI"));
}

#[test]
fn test_bad_workers() {
    for raw in ["zero", "0", "-3"] {
        let result = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost"),
            ("EXAMPLE_WORKERS", raw),
        ]));
        assert!(result.is_err(), "{raw} should be rejected");
    }
}
