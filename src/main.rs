mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxi_booking::{AppState, config::Config, db, storage::DbStore};

use crate::cli::TaxiApp;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxi_booking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app = TaxiApp::parse();
    let config = Config::from_env();

    let db = match db::connect_and_migrate(&config).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open storage");
            std::process::exit(1);
        }
    };

    let state = AppState {
        store: DbStore::new(db),
        config,
    };
    let now = chrono::Local::now().naive_local();

    if let Err(e) = app.op.run(&state, now).await {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}
