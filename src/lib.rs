//! # Pharma Ledger
//!
//! A tamper-evident, append-only record of pharmaceutical supply-chain
//! transactions.
//!
//! ## Features
//!
//! - **Hash-chained ledger**: every block commits to its predecessor with SHA-256
//! - **Integrity verification**: recompute hashes and links, locate the first broken block
//! - **Validation gate**: field-level checks before anything is stored or chained
//! - **Storage abstraction**: in-memory and SQLite record stores behind one trait
//! - **Snapshots**: persist and restore the chain as JSON
//! - **HTTP adapter** (feature `api`): submit transactions and read the chain over REST
//!
//! ## Quick Start
//!
//! ```rust
//! use pharma_ledger::{Ledger, TransactionService, utils::MemoryStore};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), pharma_ledger::LedgerError> {
//! let service = TransactionService::new(MemoryStore::new(), Ledger::new());
//!
//! let chained = service
//!     .submit(&json!({
//!         "product_id": "P12345",
//!         "transaction_detail": "Purchase",
//!         "supplier_id": 101,
//!         "customer_id": 202,
//!         "quantity": 100,
//!         "shipment_date": "2022-12-01",
//!         "expected_delivery_date": "2022-12-10"
//!     }))
//!     .await?;
//!
//! assert_eq!(chained.block.index, 1);
//! assert!(service.ledger().verify()?);
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use ledger::*;
pub use traits::*;
pub use types::*;
