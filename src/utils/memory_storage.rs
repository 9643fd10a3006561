//! In-memory record store for testing and development

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    transactions: BTreeMap<i64, TransactionRecord>,
}

/// In-memory record store; ids are assigned from 1 upwards
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create a new memory store instance
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> LedgerError {
    LedgerError::Storage("memory store lock poisoned".to_string())
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_transaction(
        &self,
        fields: &TransactionFields,
    ) -> LedgerResult<TransactionRecord> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.next_id += 1;
        let record = TransactionRecord::new(tables.next_id, fields.clone());
        tables.transactions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_transaction(&self, id: i64) -> LedgerResult<Option<TransactionRecord>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.transactions.get(&id).cloned())
    }

    async fn list_transactions(&self) -> LedgerResult<Vec<TransactionRecord>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.transactions.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fields(product_id: &str) -> TransactionFields {
        TransactionFields {
            product_id: product_id.to_string(),
            transaction_detail: "Restock".to_string(),
            supplier_id: 1,
            customer_id: 2,
            quantity: 3,
            shipment_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            expected_delivery_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        let first = store.insert_transaction(&fields("AAAAAA")).await.unwrap();
        let second = store.insert_transaction(&fields("BBBBBB")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(second.fields(), fields("BBBBBB"));
    }

    #[tokio::test]
    async fn test_lookup_and_list() {
        let store = MemoryStore::new();
        assert!(store.get_transaction(1).await.unwrap().is_none());

        store.insert_transaction(&fields("AAAAAA")).await.unwrap();
        store.insert_transaction(&fields("BBBBBB")).await.unwrap();

        let found = store.get_transaction(2).await.unwrap().unwrap();
        assert_eq!(found.product_id, "BBBBBB");

        let all = store.list_transactions().await.unwrap();
        assert_eq!(
            all.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }
}
