//! redb-backed order store.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `uuid` | `TrackedOrder` (JSON) | Last emitted state per order |
//!
//! One record per order carries the snapshot tuple, the routing identity,
//! and the message-id mapping together; commits are atomic, so each save is
//! all-or-nothing from the workers' point of view.

use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use std::collections::HashMap;

use super::{OrderStore, Snapshot, StoreError, StoreResult};
use crate::tracker::{ResumableOrder, TrackedOrder};

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Order store backed by redb.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    fn load(&self, uuid: &str) -> StoreResult<Option<TrackedOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(uuid)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn load_all(&self) -> StoreResult<Vec<TrackedOrder>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: TrackedOrder = serde_json::from_slice(value.value())?;
            orders.push(order);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for RedbStore {
    async fn get_snapshot(&self, uuid: &str) -> StoreResult<Option<Snapshot>> {
        Ok(self.load(uuid)?.map(|order| Snapshot {
            status: order.last_status,
            progress: order.last_progress,
            text: order.last_text,
            raw_json: order.full_json_data,
        }))
    }

    async fn save_order(&self, order: &TrackedOrder) -> StoreResult<()> {
        let mut record = order.clone();
        // an empty message id must not erase the stored mapping
        if record.message_id.is_empty() {
            if let Some(existing) = self.load(&record.uuid)? {
                record.message_id = existing.message_id;
            }
        }

        let value = serde_json::to_vec(&record)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ORDERS_TABLE)?;
            table.insert(record.uuid.as_str(), value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    async fn get_message_id(&self, uuid: &str) -> StoreResult<Option<String>> {
        Ok(self
            .load(uuid)?
            .map(|order| order.message_id)
            .filter(|id| !id.is_empty()))
    }

    async fn get_pending_orders(&self) -> StoreResult<HashMap<String, i32>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|order| !order.last_status.is_terminal())
            .map(|order| (order.uuid, order.last_progress))
            .collect())
    }

    async fn list_resumable_orders(&self) -> StoreResult<Vec<ResumableOrder>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|order| !order.last_status.is_terminal())
            .map(|order| ResumableOrder {
                uuid: order.uuid,
                channel_id: order.channel_id,
                guild_id: order.guild_id,
                client_id: order.client_id,
                cuistot_id: order.cuistot_id,
            })
            .collect())
    }
}
