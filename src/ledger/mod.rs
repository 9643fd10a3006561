//! Ledger module containing the hash chain and transaction processing

pub mod block;
pub mod chain;
pub mod core;
pub mod snapshot;
pub mod transaction;

pub use block::*;
pub use chain::*;
pub use self::core::*;
pub use snapshot::*;
pub use transaction::*;
