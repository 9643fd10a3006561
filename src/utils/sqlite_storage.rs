//! SQLite-backed record store

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::traits::*;
use crate::types::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Record store keeping transactions in a SQLite `transactions` table
///
/// Calls block on the connection; there is no retry on failure.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::Storage(format!("Failed to open database {}: {}", path.display(), e))
        })?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::Storage(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> LedgerResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                product_id TEXT NOT NULL,
                transaction_detail TEXT NOT NULL,
                supplier_id INTEGER NOT NULL,
                customer_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL,
                shipment_date TEXT NOT NULL,
                expected_delivery_date TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            LedgerError::Storage(format!("Failed to create transactions table: {}", e))
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> LedgerResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::Storage("Mutex poisoned".to_string()))
    }
}

fn to_sql_int(field: &str, value: u64) -> LedgerResult<i64> {
    i64::try_from(value)
        .map_err(|_| LedgerError::Storage(format!("{} out of range: {}", field, value)))
}

fn from_sql_int(column: usize, value: i64) -> rusqlite::Result<u64> {
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(column, value))
}

fn parse_date(column: usize, value: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<TransactionRecord> {
    Ok(TransactionRecord {
        id: row.get(0)?,
        product_id: row.get(1)?,
        transaction_detail: row.get(2)?,
        supplier_id: from_sql_int(3, row.get(3)?)?,
        customer_id: from_sql_int(4, row.get(4)?)?,
        quantity: from_sql_int(5, row.get(5)?)?,
        shipment_date: parse_date(6, row.get(6)?)?,
        expected_delivery_date: parse_date(7, row.get(7)?)?,
    })
}

const SELECT_COLUMNS: &str = "SELECT id, product_id, transaction_detail, supplier_id, customer_id,
        quantity, shipment_date, expected_delivery_date FROM transactions";

#[async_trait]
impl RecordStore for SqliteStore {
    async fn insert_transaction(
        &self,
        fields: &TransactionFields,
    ) -> LedgerResult<TransactionRecord> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO transactions (product_id, transaction_detail, supplier_id, customer_id,
                quantity, shipment_date, expected_delivery_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                fields.product_id,
                fields.transaction_detail,
                to_sql_int("supplier_id", fields.supplier_id)?,
                to_sql_int("customer_id", fields.customer_id)?,
                to_sql_int("quantity", fields.quantity)?,
                fields.shipment_date.format(DATE_FORMAT).to_string(),
                fields.expected_delivery_date.format(DATE_FORMAT).to_string(),
            ],
        )
        .map_err(|e| LedgerError::Storage(format!("Failed to insert transaction: {}", e)))?;

        Ok(TransactionRecord::new(conn.last_insert_rowid(), fields.clone()))
    }

    async fn get_transaction(&self, id: i64) -> LedgerResult<Option<TransactionRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT_COLUMNS),
            params![id],
            record_from_row,
        )
        .optional()
        .map_err(|e| LedgerError::Storage(format!("Failed to load transaction {}: {}", id, e)))
    }

    async fn list_transactions(&self) -> LedgerResult<Vec<TransactionRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .map_err(|e| LedgerError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], record_from_row)
            .map_err(|e| LedgerError::Storage(format!("Failed to query transactions: {}", e)))?;

        let records = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| LedgerError::Storage(format!("Failed to read row: {}", e)))?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> TransactionFields {
        TransactionFields {
            product_id: "RX0042".to_string(),
            transaction_detail: "Cold-chain transfer, 'lot 7'".to_string(),
            supplier_id: 101,
            customer_id: 202,
            quantity: 100,
            shipment_date: NaiveDate::from_ymd_opt(2022, 12, 1).unwrap(),
            expected_delivery_date: NaiveDate::from_ymd_opt(2022, 12, 10).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_rowid() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert_transaction(&fields()).await.unwrap();
        let second = store.insert_transaction(&fields()).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let inserted = store.insert_transaction(&fields()).await.unwrap();

        let loaded = store.get_transaction(inserted.id).await.unwrap();
        assert_eq!(loaded, Some(inserted.clone()));
        assert!(store.get_transaction(99).await.unwrap().is_none());
        assert_eq!(store.list_transactions().await.unwrap(), vec![inserted]);
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supply_chain.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_transaction(&fields()).await.unwrap().id
        };

        let store = SqliteStore::open(&path).unwrap();
        let record = store.get_transaction(id).await.unwrap().unwrap();
        assert_eq!(record.fields(), fields());
    }
}
