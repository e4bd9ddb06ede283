use restaurant_examples::{config::Config, db::MongoStore};

mod actions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(true)
        .with_file(false)
        .with_writer(std::io::stderr)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("fail to setup logging");

    let args = std::env::args().collect::<Vec<_>>();
    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
    let action = match actions::Action::new(&args) {
        Ok(action) => action,
        Err(hint) => {
            eprintln!("{hint}\n\n{}", actions::USAGE);
            std::process::exit(2);
        }
    };

    let config = Config::from_env()?;
    let store = MongoStore::connect(&config).await?;

    let mut stdout = std::io::stdout().lock();
    let result = action.run(&store, config.workers, &mut stdout).await;

    // disconnect even when the action failed
    store.disconnect().await;
    result
}
