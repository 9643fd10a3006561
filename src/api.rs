//! HTTP routes for submitting transactions and reading the chain

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::ledger::{Ledger, TransactionService};
use crate::traits::RecordStore;
use crate::types::*;

type ApiResult = Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)>;

/// Shared state passed to handlers
pub struct AppState<S: RecordStore> {
    pub service: Arc<TransactionService<S>>,
    snapshots: Option<Arc<SnapshotWriter>>,
}

impl<S: RecordStore> AppState<S> {
    /// State for `service`; when `snapshot_path` is set the chain snapshot is
    /// rewritten after every chained transaction
    pub fn new(service: Arc<TransactionService<S>>, snapshot_path: Option<PathBuf>) -> Self {
        Self {
            service,
            snapshots: snapshot_path.map(|path| Arc::new(SnapshotWriter::new(path))),
        }
    }
}

impl<S: RecordStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

/// Single writer for the snapshot file
///
/// The chain is read and saved while the lock is held, and a snapshot no
/// longer than the last one saved is skipped, so the file never goes back to
/// a shorter chain.
struct SnapshotWriter {
    path: PathBuf,
    saved_length: Mutex<usize>,
}

impl SnapshotWriter {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            saved_length: Mutex::new(0),
        }
    }

    async fn persist(&self, ledger: &Ledger) -> LedgerResult<()> {
        let mut saved_length = self.saved_length.lock().await;
        let snapshot = ledger.snapshot()?;
        if snapshot.length <= *saved_length {
            return Ok(());
        }

        snapshot.save(&self.path)?;
        *saved_length = snapshot.length;
        Ok(())
    }
}

/// Build the router over a transaction service
pub fn build_router<S: RecordStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/blockchain/create_transaction",
            post(create_transaction::<S>),
        )
        .route("/blockchain/get_chain", get(get_chain::<S>))
        .route(
            "/blockchain/get_block_by_index/:index",
            get(get_block_by_index::<S>),
        )
        .route(
            "/blockchain/get_block_by_hash/:hash",
            get(get_block_by_hash::<S>),
        )
        .route("/blockchain/verify", get(verify_chain::<S>))
        .route(
            "/transactions/get_all_transactions",
            get(list_transactions::<S>),
        )
        .route("/transactions/:id", get(get_transaction::<S>))
        .with_state(state)
}

fn message(status: StatusCode, text: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": text.into() })))
}

fn error_response(err: LedgerError) -> (StatusCode, Json<Value>) {
    match &err {
        LedgerError::MissingFields { .. } | LedgerError::Validation { .. } => {
            message(StatusCode::BAD_REQUEST, err.to_string())
        }
        LedgerError::TransactionNotFound(_) => {
            message(StatusCode::NOT_FOUND, "Transaction not found")
        }
        _ => message(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!(
                "An error occurred while processing the transaction: {}",
                err
            ),
        ),
    }
}

fn block_not_found() -> (StatusCode, Json<Value>) {
    message(StatusCode::NOT_FOUND, "Block not found")
}

fn ok(value: impl serde::Serialize) -> ApiResult {
    let body = serde_json::to_value(value).map_err(|e| {
        message(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("serialization failed: {}", e),
        )
    })?;
    Ok((StatusCode::OK, Json(body)))
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /blockchain/create_transaction
async fn create_transaction<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(payload): Json<Value>,
) -> ApiResult {
    let chained = state.service.submit(&payload).await.map_err(error_response)?;

    if let Some(writer) = &state.snapshots {
        if let Err(err) = writer.persist(state.service.ledger()).await {
            tracing::error!(
                error = %err,
                path = %writer.path.display(),
                "failed to write chain snapshot"
            );
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Transaction recorded successfully",
            "transaction": chained.transaction,
            "block": chained.block,
        })),
    ))
}

/// GET /blockchain/get_chain
async fn get_chain<S: RecordStore + 'static>(State(state): State<AppState<S>>) -> ApiResult {
    let snapshot = state.service.ledger().snapshot().map_err(error_response)?;
    ok(snapshot)
}

/// GET /blockchain/get_block_by_index/:index
///
/// Anything other than a non-negative integer names no block.
async fn get_block_by_index<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(index): Path<String>,
) -> ApiResult {
    let index: u64 = index.parse().map_err(|_| block_not_found())?;
    match state
        .service
        .ledger()
        .get_by_index(index)
        .map_err(error_response)?
    {
        Some(block) => ok(block),
        None => Err(block_not_found()),
    }
}

/// GET /blockchain/get_block_by_hash/:hash
async fn get_block_by_hash<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(hash): Path<String>,
) -> ApiResult {
    match state
        .service
        .ledger()
        .get_by_hash(&hash)
        .map_err(error_response)?
    {
        Some(block) => ok(block),
        None => Err(block_not_found()),
    }
}

/// GET /blockchain/verify
async fn verify_chain<S: RecordStore + 'static>(State(state): State<AppState<S>>) -> ApiResult {
    let violation = state
        .service
        .ledger()
        .first_violation()
        .map_err(error_response)?;
    ok(json!({ "valid": violation.is_none(), "violation": violation }))
}

/// GET /transactions/:id
async fn get_transaction<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult {
    let record = state
        .service
        .get_transaction_required(id)
        .await
        .map_err(error_response)?;
    ok(record)
}

/// GET /transactions/get_all_transactions
async fn list_transactions<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
) -> ApiResult {
    let transactions = state
        .service
        .list_transactions()
        .await
        .map_err(error_response)?;
    ok(json!({ "transactions": transactions }))
}
