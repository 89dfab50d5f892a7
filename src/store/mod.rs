// src/store/mod.rs
pub mod arrow;
pub mod parquet;

pub use self::parquet::ParquetStore;

use crate::error::StoreError;
use crate::process::record::TicketRecord;

/// A persisted, schema-open collection of ticket records.
///
/// One connection is held for a whole run and closed exactly once at the end;
/// every call after `close` fails with `StoreError::Closed`.
pub trait TicketStore {
    /// Remove the collection. Returns `false` if it did not exist.
    fn drop_collection(&mut self) -> Result<bool, StoreError>;

    /// Append `records` in one write. An empty slice writes nothing.
    fn insert_many(&mut self, records: &[TicketRecord]) -> Result<usize, StoreError>;

    /// Every stored record, in insertion order.
    fn load_all(&self) -> Result<Vec<TicketRecord>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    fn close(&mut self) -> Result<(), StoreError>;
}
