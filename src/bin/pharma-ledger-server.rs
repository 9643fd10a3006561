#![forbid(unsafe_code)]
//! REST server for the supply-chain ledger

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use pharma_ledger::api::{build_router, AppState};
use pharma_ledger::config::{Config, StoreBackend};
use pharma_ledger::utils::{MemoryStore, SqliteStore};
use pharma_ledger::{ChainSnapshot, Ledger, RecordStore, TransactionService};

fn restore_ledger(config: &Config) -> Result<Ledger, Box<dyn std::error::Error>> {
    let Some(path) = &config.ledger.snapshot_path else {
        return Ok(Ledger::new());
    };

    match ChainSnapshot::load(path)? {
        Some(snapshot) => Ok(Ledger::restore(snapshot)?),
        None => {
            tracing::info!(path = %path.display(), "no snapshot found, starting a new chain");
            Ok(Ledger::new())
        }
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn RecordStore>, Box<dyn std::error::Error>> {
    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&config.store.path)?),
    };
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config_path = env::var("PHARMA_LEDGER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));
    let config = Config::load(&config_path)?;

    let ledger = restore_ledger(&config)?;
    let store = open_store(&config)?;
    tracing::info!(
        blocks = ledger.len()?,
        backend = ?config.store.backend,
        "ledger ready"
    );

    let service = TransactionService::with_validator(store, ledger, config.validator());
    let app = build_router(AppState::new(
        Arc::new(service),
        config.ledger.snapshot_path.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(config.server.bind.as_str()).await?;
    tracing::info!(addr = %config.server.bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
