use std::io::Write;

use anyhow::Context;
use mongodb::bson::Document;
use restaurant_examples::{
    data::Restaurant,
    db::RestaurantStore,
    flows,
};

pub(super) const USAGE: &str = "\
Usage: restaurants <action>

  single                    insert one restaurant and read it back
  concurrent [n]            insert n restaurants from parallel tasks, then list them
  insert <name> <cuisine>   insert a restaurant
  find <field> <value>      print matching restaurants as JSON
  delete <field> <value>    delete matching restaurants";

fn eq_filter(field: String, value: String) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value);
    filter
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Action {
    Single,
    Concurrent(Option<usize>),
    Insert(String, String),
    Find(String, String),
    Delete(String, String),
}

impl Action {
    // args[0] is the program name
    pub(super) fn new(args: &[&str]) -> Result<Self, &'static str> {
        if args.len() < 2 {
            return Err("missing action");
        }

        // at most `max` words including the program name and action
        let at_most = |max: usize| -> Result<(), &'static str> {
            if args.len() > max {
                Err("too many argument")
            } else {
                Ok(())
            }
        };

        let pair = |ctor: fn(String, String) -> Action| -> Result<Action, &'static str> {
            if args.len() < 4 {
                return Err("too less argument");
            }
            at_most(4)?;
            Ok(ctor(args[2].to_string(), args[3].to_string()))
        };

        match args[1] {
            "single" => at_most(2).map(|_| Self::Single),
            "concurrent" => match at_most(3).map(|_| args.get(2))? {
                None => Ok(Self::Concurrent(None)),
                Some(raw) => match raw.parse::<usize>() {
                    Ok(n) if n > 0 => Ok(Self::Concurrent(Some(n))),
                    _ => Err("worker count must be a positive number"),
                },
            },
            "insert" => pair(Self::Insert),
            "find" => pair(Self::Find),
            "delete" => pair(Self::Delete),
            _ => Err("unexpected action"),
        }
    }

    // consumed the action
    pub(super) async fn run<S>(
        self,
        store: &S,
        workers: usize,
        out: &mut impl Write,
    ) -> anyhow::Result<()>
    where
        S: RestaurantStore + Clone + 'static,
    {
        match self {
            Self::Single => {
                if let Some(rest) = flows::insert_and_find(store).await? {
                    flows::write_restaurant(out, &rest)?;
                }
            }
            Self::Concurrent(n) => {
                let rests = flows::concurrent_insert(store, n.unwrap_or(workers)).await?;
                flows::write_names(out, &rests)?;
            }
            Self::Insert(name, cuisine) => {
                let id = store.insert_one(&Restaurant::new(name, cuisine)).await?;
                writeln!(out, "{id}")?;
            }
            Self::Find(field, value) => {
                for rest in store.find(eq_filter(field, value)).await? {
                    let line = serde_json::to_string(&rest)
                        .with_context(|| format!("fail to encode restaurant {}", rest.name))?;
                    writeln!(out, "{line}")?;
                }
            }
            Self::Delete(field, value) => {
                let count = store.delete_many(eq_filter(field, value)).await?;
                writeln!(out, "{count}")?;
            }
        }

        Ok(())
    }
}

#[test]
fn test_parse_actions() {
    assert_eq!(Action::new(&["restaurants", "single"]), Ok(Action::Single));
    assert_eq!(
        Action::new(&["restaurants", "concurrent"]),
        Ok(Action::Concurrent(None))
    );
    assert_eq!(
        Action::new(&["restaurants", "concurrent", "8"]),
        Ok(Action::Concurrent(Some(8)))
    );
    assert_eq!(
        Action::new(&["restaurants", "insert", "8282", "Korean"]),
        Ok(Action::Insert("8282".to_string(), "Korean".to_string()))
    );
    assert_eq!(
        Action::new(&["restaurants", "delete", "cuisine", "Korean"]),
        Ok(Action::Delete("cuisine".to_string(), "Korean".to_string()))
    );
}

#[test]
fn test_parse_errors() {
    assert_eq!(Action::new(&["restaurants"]), Err("missing action"));
    assert_eq!(
        Action::new(&["restaurants", "find", "name"]),
        Err("too less argument")
    );
    assert!(Action::new(&["restaurants", "concurrent", "0"]).is_err());
    assert_eq!(
        Action::new(&["restaurants", "update"]),
        Err("unexpected action")
    );
}

#[test]
fn test_parse_rejects_extra_arguments() {
    assert_eq!(
        Action::new(&["restaurants", "single", "junk"]),
        Err("too many argument")
    );
    assert_eq!(
        Action::new(&["restaurants", "concurrent", "3", "junk"]),
        Err("too many argument")
    );
    assert_eq!(
        Action::new(&["restaurants", "insert", "8282", "Korean", "Queens"]),
        Err("too many argument")
    );
}

#[tokio::test]
async fn test_run_actions() {
    use restaurant_examples::memory::MemoryStore;

    async fn run(store: &MemoryStore, args: &[&str]) -> String {
        let mut out = Vec::new();
        Action::new(args)
            .unwrap()
            .run(store, 3, &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    let store = MemoryStore::new();

    assert_eq!(run(&store, &["restaurants", "single"]).await, "8282 Korean\n");
    assert_eq!(
        run(&store, &["restaurants", "concurrent"]).await,
        "0\n1\n2\n"
    );
    assert!(store.is_empty().unwrap());

    let id = run(&store, &["restaurants", "insert", "Nyonya", "Malaysian"]).await;
    assert!(!id.trim().is_empty());
    run(&store, &["restaurants", "insert", "Kyochon", "Korean"]).await;
    run(&store, &["restaurants", "insert", "BCD Tofu", "Korean"]).await;

    let found = run(&store, &["restaurants", "find", "cuisine", "Korean"]).await;
    let lines = found.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["name"], "Kyochon");
    assert_eq!(first["cuisine"], "Korean");

    assert_eq!(
        run(&store, &["restaurants", "find", "name", "Nowhere"]).await,
        ""
    );

    assert_eq!(
        run(&store, &["restaurants", "delete", "cuisine", "Korean"]).await,
        "2\n"
    );
    assert_eq!(store.len().unwrap(), 1);
}
