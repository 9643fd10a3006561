//! Transaction intake: validate, persist, then chain

use serde_json::Value;

use crate::ledger::Ledger;
use crate::traits::*;
use crate::types::*;

/// The only path from user input to a new ledger block
///
/// Every submission is validated, written to the record store, and only then
/// appended to the ledger. A rejected payload touches neither; a store failure
/// never reaches the ledger.
pub struct TransactionService<S: RecordStore> {
    store: S,
    ledger: Ledger,
    validator: Box<dyn TransactionValidator>,
}

impl<S: RecordStore> TransactionService<S> {
    /// Create a service with the default field-level validator
    pub fn new(store: S, ledger: Ledger) -> Self {
        Self {
            store,
            ledger,
            validator: Box::new(DefaultTransactionValidator),
        }
    }

    /// Create a service with a custom validator
    pub fn with_validator(
        store: S,
        ledger: Ledger,
        validator: Box<dyn TransactionValidator>,
    ) -> Self {
        Self {
            store,
            ledger,
            validator,
        }
    }

    /// The ledger this service appends to
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// The backing record store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submit a raw payload as received from a transport
    pub async fn submit(&self, payload: &Value) -> LedgerResult<ChainedTransaction> {
        let fields = match self.validate(payload) {
            Ok(fields) => fields,
            Err(err) => {
                tracing::warn!(error = %err, "rejected transaction");
                return Err(err);
            }
        };

        let record = self.store.insert_transaction(&fields).await.map_err(|err| {
            tracing::error!(error = %err, "failed to persist transaction");
            err
        })?;
        tracing::info!(record_id = record.id, product_id = %record.product_id, "stored transaction");

        let block = self
            .ledger
            .append(BlockPayload::Transaction(record.clone()))
            .map_err(|err| {
                tracing::error!(
                    record_id = record.id,
                    error = %err,
                    "transaction persisted but not chained"
                );
                LedgerError::NotChained {
                    record_id: record.id,
                    reason: err.to_string(),
                }
            })?;

        Ok(ChainedTransaction {
            transaction: record,
            block,
        })
    }

    /// Submit a typed draft through the same path as [`TransactionService::submit`]
    pub async fn submit_draft(&self, draft: &TransactionDraft) -> LedgerResult<ChainedTransaction> {
        let payload = serde_json::json!({
            "product_id": draft.product_id,
            "transaction_detail": draft.transaction_detail,
            "supplier_id": draft.supplier_id,
            "customer_id": draft.customer_id,
            "quantity": draft.quantity,
            "shipment_date": draft.shipment_date,
            "expected_delivery_date": draft.expected_delivery_date,
        });
        self.submit(&payload).await
    }

    /// Check required keys, then every field
    pub fn validate(&self, payload: &Value) -> LedgerResult<TransactionFields> {
        let Value::Object(map) = payload else {
            return Err(LedgerError::MissingFields {
                missing: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            });
        };

        check_required_fields(map)?;
        self.validator.validate(map)
    }

    /// Get a stored transaction by id
    pub async fn get_transaction(&self, id: i64) -> LedgerResult<Option<TransactionRecord>> {
        self.store.get_transaction(id).await
    }

    /// Get a stored transaction by id, returning an error if not found
    pub async fn get_transaction_required(&self, id: i64) -> LedgerResult<TransactionRecord> {
        self.store
            .get_transaction(id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// List every stored transaction
    pub async fn list_transactions(&self) -> LedgerResult<Vec<TransactionRecord>> {
        self.store.list_transactions().await
    }
}
