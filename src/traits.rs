//! Traits for storage abstraction and validation

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::types::*;
use crate::utils::validation::*;

/// Storage abstraction for transaction records
///
/// The service writes every validated transaction here before it is chained,
/// so the ledger never holds a payload the store does not. Implementations
/// assign the record id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a validated transaction and return it with its assigned id
    async fn insert_transaction(&self, fields: &TransactionFields)
        -> LedgerResult<TransactionRecord>;

    /// Get a transaction by id
    async fn get_transaction(&self, id: i64) -> LedgerResult<Option<TransactionRecord>>;

    /// List all transactions in ascending id order
    async fn list_transactions(&self) -> LedgerResult<Vec<TransactionRecord>>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn insert_transaction(
        &self,
        fields: &TransactionFields,
    ) -> LedgerResult<TransactionRecord> {
        (**self).insert_transaction(fields).await
    }

    async fn get_transaction(&self, id: i64) -> LedgerResult<Option<TransactionRecord>> {
        (**self).get_transaction(id).await
    }

    async fn list_transactions(&self) -> LedgerResult<Vec<TransactionRecord>> {
        (**self).list_transactions().await
    }
}

/// Trait for implementing transaction validation rules
///
/// Callers must run [`check_required_fields`] first; implementations may
/// assume every required key is present.
pub trait TransactionValidator: Send + Sync {
    /// Validate a payload whose required keys are present
    fn validate(&self, payload: &Map<String, Value>) -> LedgerResult<TransactionFields>;
}

/// Field-level rules only, failing on the first invalid field
pub struct DefaultTransactionValidator;

impl TransactionValidator for DefaultTransactionValidator {
    fn validate(&self, payload: &Map<String, Value>) -> LedgerResult<TransactionFields> {
        let product_id = validate_product_id(expect_str(payload, "product_id")?)?;
        let transaction_detail =
            validate_transaction_detail(expect_str(payload, "transaction_detail")?)?;
        let supplier_id = validate_party_id(
            "supplier_id",
            expect_int(payload, "supplier_id")?,
        )?;
        let customer_id = validate_party_id(
            "customer_id",
            expect_int(payload, "customer_id")?,
        )?;
        let quantity = validate_quantity(expect_int(payload, "quantity")?)?;
        let shipment_date = validate_date("shipment_date", expect_str(payload, "shipment_date")?)?;
        let expected_delivery_date = validate_date(
            "expected_delivery_date",
            expect_str(payload, "expected_delivery_date")?,
        )?;

        Ok(TransactionFields {
            product_id,
            transaction_detail,
            supplier_id,
            customer_id,
            quantity,
            shipment_date,
            expected_delivery_date,
        })
    }
}

/// Field-level rules plus `expected_delivery_date >= shipment_date`
pub struct DeliveryWindowValidator;

impl TransactionValidator for DeliveryWindowValidator {
    fn validate(&self, payload: &Map<String, Value>) -> LedgerResult<TransactionFields> {
        let fields = DefaultTransactionValidator.validate(payload)?;
        validate_delivery_window(fields.shipment_date, fields.expected_delivery_date)?;
        Ok(fields)
    }
}

/// Fail with every absent required key if any is missing
pub fn check_required_fields(payload: &Map<String, Value>) -> LedgerResult<()> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !payload.contains_key(**field))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::MissingFields { missing })
    }
}
