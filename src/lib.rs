pub mod api;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;

use anyhow::Context;
pub use config::Config;
use db::Store;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init" | "--init") => {
            Config::create_default_if_missing()?;
            println!("✓ Config file created. Edit config.toml and run again.");
            Ok(())
        }

        Some("help" | "-h" | "--help") => {
            print_help();
            Ok(())
        }

        Some(other) => {
            println!("Unknown command: {}", other);
            println!();
            print_help();
            Ok(())
        }

        None => serve(config).await,
    }
}

fn print_help() {
    println!("Quorum - Discussion Forum Server");
    println!();
    println!("USAGE:");
    println!("  quorum           Start the web server");
    println!("  quorum init      Create default config file");
    println!("  quorum help      Show this help message");
    println!();
    println!("CONFIG:");
    println!("  Edit config.toml to configure the server port, database path, etc.");
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Quorum v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let port = config.server.port;
    let state = api::create_app_state(config, store);
    let app = api::router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🌐 Forum running at http://0.0.0.0:{}", port);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Web server error: {}", e);
    }

    Ok(())
}
