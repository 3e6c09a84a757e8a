#![forbid(unsafe_code)]

use crate::sink::NotificationSink;
use cl_core::model::{Direction, Entry};
use cl_core::query::MAX_LIMIT;
use cl_storage::{
    AddEntryRequest, OrderQuery, RepositionEntryRequest, SqliteStore, StoreError,
};

/// Stateless facade over the store: executes one mutation, then pushes the
/// fresh full order to the sink. All chain state lives in the store.
pub struct ChainService {
    store: SqliteStore,
    sink: Box<dyn NotificationSink>,
}

impl ChainService {
    pub fn new(store: SqliteStore, sink: Box<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    pub fn add(&mut self, request: AddEntryRequest) -> Result<Entry, StoreError> {
        let entry = self.store.add_entry(request)?;
        self.publish_order();
        Ok(entry)
    }

    pub fn remove(&mut self, id: i64) -> Result<Entry, StoreError> {
        let entry = self.store.remove_entry(id)?;
        self.publish_order();
        Ok(entry)
    }

    pub fn rename(&mut self, id: i64, new_name: &str) -> Result<Entry, StoreError> {
        let entry = self.store.rename_entry(id, new_name)?;
        self.publish_order();
        Ok(entry)
    }

    pub fn reposition(&mut self, request: RepositionEntryRequest) -> Result<Entry, StoreError> {
        let entry = self.store.reposition_entry(request)?;
        self.publish_order();
        Ok(entry)
    }

    /// Read-through for subscribers joining late.
    pub fn snapshot(&self, query: OrderQuery) -> Result<Vec<Entry>, StoreError> {
        self.store.ordered(query)
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Runs strictly after commit and outside any transaction. Subscribers
    /// that miss a frame recover by requesting a snapshot.
    fn publish_order(&self) {
        let full = OrderQuery {
            start_id: None,
            direction: Direction::Ascending,
            limit: MAX_LIMIT,
        };
        match self.store.ordered(full) {
            Ok(entries) => self.sink.publish(&entries),
            Err(StoreError::EmptyChain) => self.sink.publish(&[]),
            Err(_) => {}
        }
    }
}
