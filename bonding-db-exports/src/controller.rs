use crate::{DBBatch, DBError, Key, Value};
use parking_lot::RwLock;
use std::fmt::Debug;
use std::sync::Arc;

/// Shared handle on the database
pub type ShareableDBController = Arc<RwLock<Box<dyn DBController>>>;

/// Entries read from the database, in ascending key order
pub type DBIterator<'a> = Box<dyn Iterator<Item = Result<(Key, Value), DBError>> + 'a>;

pub trait DBController: Send + Sync + Debug {
    /// Writes the batch to the DB, attached to the given change id
    fn write_batch(&mut self, batch: DBBatch, change_id: Option<u64>) -> Result<(), DBError>;

    /// Utility function to put / update a key & value in the batch
    fn put_or_update_entry_value(&self, batch: &mut DBBatch, key: Vec<u8>, value: &[u8]);

    /// Utility function to delete a key & value in the batch
    fn delete_key(&self, batch: &mut DBBatch, key: Vec<u8>);

    /// Exposes RocksDB's "get_cf" function
    fn get_cf(&self, handle_cf: &str, key: Key) -> Result<Option<Value>, DBError>;

    /// Iterates forward over the keys greater or equal to `start`
    fn iterator_from_cf(&self, handle_cf: &str, start: &[u8]) -> DBIterator<'_>;

    /// Iterates over the keys starting with `prefix`, in ascending order
    fn prefix_iterator_cf(&self, handle_cf: &str, prefix: &[u8]) -> DBIterator<'_>;

    /// Get the current change_id attached to the database.
    fn get_change_id(&self) -> Result<u64, DBError>;
}
