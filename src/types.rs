//! Core types and data structures for the supply-chain ledger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys every transaction payload must carry, in validation order
pub const REQUIRED_FIELDS: [&str; 7] = [
    "product_id",
    "transaction_detail",
    "supplier_id",
    "customer_id",
    "quantity",
    "shipment_date",
    "expected_delivery_date",
];

/// Payload of the genesis block
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// `previous_hash` sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Unvalidated transaction as typed callers build it.
///
/// Integers are signed so that negative input can be represented and rejected
/// by validation rather than by the type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub product_id: String,
    pub transaction_detail: String,
    pub supplier_id: i64,
    pub customer_id: i64,
    pub quantity: i64,
    pub shipment_date: String,
    pub expected_delivery_date: String,
}

/// Transaction fields that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFields {
    /// 6-10 ASCII letters or digits
    pub product_id: String,
    /// Free-text description, never empty
    pub transaction_detail: String,
    pub supplier_id: u64,
    pub customer_id: u64,
    pub quantity: u64,
    pub shipment_date: NaiveDate,
    pub expected_delivery_date: NaiveDate,
}

/// A transaction as held by the record store, with its store-assigned id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Identifier assigned by the record store
    pub id: i64,
    pub product_id: String,
    pub transaction_detail: String,
    pub supplier_id: u64,
    pub customer_id: u64,
    pub quantity: u64,
    pub shipment_date: NaiveDate,
    pub expected_delivery_date: NaiveDate,
}

impl TransactionRecord {
    /// Attach a store-assigned id to validated fields
    pub fn new(id: i64, fields: TransactionFields) -> Self {
        Self {
            id,
            product_id: fields.product_id,
            transaction_detail: fields.transaction_detail,
            supplier_id: fields.supplier_id,
            customer_id: fields.customer_id,
            quantity: fields.quantity,
            shipment_date: fields.shipment_date,
            expected_delivery_date: fields.expected_delivery_date,
        }
    }

    /// The record without its id
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            product_id: self.product_id.clone(),
            transaction_detail: self.transaction_detail.clone(),
            supplier_id: self.supplier_id,
            customer_id: self.customer_id,
            quantity: self.quantity,
            shipment_date: self.shipment_date,
            expected_delivery_date: self.expected_delivery_date,
        }
    }

    /// Canonical serialization fed to the block hash.
    ///
    /// Compact JSON with keys in a fixed, explicitly written order. Changing
    /// this output invalidates every stored chain.
    pub fn canonical(&self) -> String {
        format!(
            "{{\"customer_id\":{},\"expected_delivery_date\":\"{}\",\"id\":{},\"product_id\":{},\"quantity\":{},\"shipment_date\":\"{}\",\"supplier_id\":{},\"transaction_detail\":{}}}",
            self.customer_id,
            self.expected_delivery_date.format("%Y-%m-%d"),
            self.id,
            serde_json::Value::from(self.product_id.as_str()),
            self.quantity,
            self.shipment_date.format("%Y-%m-%d"),
            self.supplier_id,
            serde_json::Value::from(self.transaction_detail.as_str()),
        )
    }
}

/// Data embedded in a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockPayload {
    /// A chained supply-chain transaction
    Transaction(TransactionRecord),
    /// Plain text, used by the genesis block
    Text(String),
}

impl BlockPayload {
    /// Canonical form used when hashing, tagged with the payload kind
    ///
    /// A text payload equal to a record's canonical JSON still hashes
    /// differently from that record.
    pub fn canonical(&self) -> String {
        match self {
            BlockPayload::Transaction(record) => format!("tx:{}", record.canonical()),
            BlockPayload::Text(text) => format!("text:{}", text),
        }
    }

    /// The transaction record, if this payload carries one
    pub fn as_transaction(&self) -> Option<&TransactionRecord> {
        match self {
            BlockPayload::Transaction(record) => Some(record),
            BlockPayload::Text(_) => None,
        }
    }
}

/// Immutable, hash-linked ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, starting at 0
    pub index: u64,
    /// Seconds since the Unix epoch, non-decreasing along the chain
    pub timestamp: i64,
    pub payload: BlockPayload,
    /// Lowercase hex SHA-256 of index, previous hash, timestamp and payload
    pub hash: String,
    /// Hash of the preceding block, `"0"` for genesis
    pub previous_hash: String,
}

/// Result of a successful submission: the stored row and the block that chains it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainedTransaction {
    pub transaction: TransactionRecord,
    pub block: Block,
}

/// Which check a block failed during verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Block index does not match its position
    Index,
    /// Stored hash differs from the recomputed one
    Hash,
    /// `previous_hash` does not match the predecessor's hash
    Linkage,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Index => write!(f, "index mismatch"),
            ViolationKind::Hash => write!(f, "hash mismatch"),
            ViolationKind::Linkage => write!(f, "linkage mismatch"),
        }
    }
}

/// First integrity failure found while verifying a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityViolation {
    pub index: u64,
    pub kind: ViolationKind,
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(
        "All fields are required ({}); missing: {}",
        REQUIRED_FIELDS.join(", "),
        .missing.join(", ")
    )]
    MissingFields { missing: Vec<String> },
    #[error("Invalid {field}: {value} ({reason})")]
    Validation {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(i64),
    #[error("Ledger write failed: record {record_id} persisted but not chained: {reason}")]
    NotChained { record_id: i64, reason: String },
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("Ledger integrity violated at block {index}: {kind}")]
    Integrity { index: u64, kind: ViolationKind },
    #[error("Snapshot error: {0}")]
    Snapshot(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Build a validation error for `field`
    pub fn validation(
        field: &'static str,
        value: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        LedgerError::Validation {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors the caller can fix by correcting input and resubmitting
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LedgerError::MissingFields { .. } | LedgerError::Validation { .. }
        )
    }
}

impl From<IntegrityViolation> for LedgerError {
    fn from(violation: IntegrityViolation) -> Self {
        LedgerError::Integrity {
            index: violation.index,
            kind: violation.kind,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TransactionRecord {
        TransactionRecord::new(
            7,
            TransactionFields {
                product_id: "P12345".to_string(),
                transaction_detail: "Purchase \"bulk\"".to_string(),
                supplier_id: 101,
                customer_id: 202,
                quantity: 100,
                shipment_date: NaiveDate::from_ymd_opt(2022, 12, 1).unwrap(),
                expected_delivery_date: NaiveDate::from_ymd_opt(2022, 12, 10).unwrap(),
            },
        )
    }

    #[test]
    fn test_canonical_form_is_fixed() {
        assert_eq!(
            record().canonical(),
            "{\"customer_id\":202,\"expected_delivery_date\":\"2022-12-10\",\"id\":7,\"product_id\":\"P12345\",\"quantity\":100,\"shipment_date\":\"2022-12-01\",\"supplier_id\":101,\"transaction_detail\":\"Purchase \\\"bulk\\\"\"}"
        );
    }

    #[test]
    fn test_canonical_form_is_valid_json() {
        let parsed: serde_json::Value = serde_json::from_str(&record().canonical()).unwrap();
        assert_eq!(parsed["transaction_detail"], "Purchase \"bulk\"");
        assert_eq!(parsed["id"], 7);
    }

    #[test]
    fn test_payload_kind_is_part_of_canonical_form() {
        let record = record();
        let as_text = BlockPayload::Text(record.canonical());
        let as_record = BlockPayload::Transaction(record.clone());
        assert_ne!(as_text.canonical(), as_record.canonical());
        assert_eq!(as_record.canonical(), format!("tx:{}", record.canonical()));
        assert_eq!(
            BlockPayload::Text(GENESIS_PAYLOAD.to_string()).canonical(),
            "text:Genesis Block"
        );
    }

    #[test]
    fn test_payload_deserializes_untagged() {
        let text: BlockPayload = serde_json::from_str("\"Genesis Block\"").unwrap();
        assert_eq!(text, BlockPayload::Text(GENESIS_PAYLOAD.to_string()));

        let json = serde_json::to_string(&BlockPayload::Transaction(record())).unwrap();
        let parsed: BlockPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_transaction(), Some(&record()));
    }

    #[test]
    fn test_missing_fields_message_lists_required_keys() {
        let err = LedgerError::MissingFields {
            missing: vec!["quantity".to_string()],
        };
        let message = err.to_string();
        for field in REQUIRED_FIELDS {
            assert!(message.contains(field));
        }
        assert!(message.ends_with("missing: quantity"));
        assert!(err.is_user_error());
    }
}
