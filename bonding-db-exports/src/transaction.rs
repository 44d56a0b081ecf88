use crate::{DBBatch, DBError, Key, ShareableDBController, Value, STATE_CF};
use std::collections::BTreeMap;

/// Pending entries of the keys written since a savepoint, as they were before the first
/// write. `None` means the key was not pending.
type UndoLog = BTreeMap<Key, Option<Option<Value>>>;

/// Write batch layered over the committed state.
///
/// Reads see the pending writes first, then the database. Scans merge both sources in key
/// order. Each savepoint records the previous pending entry of every key it touches, so
/// that a failed message can be undone without touching the rest of the block.
#[derive(Debug)]
pub struct DBTransaction {
    db: ShareableDBController,
    batch: DBBatch,
    savepoints: Vec<UndoLog>,
}

impl DBTransaction {
    /// Opens an empty transaction on top of `db`
    pub fn new(db: ShareableDBController) -> Self {
        Self {
            db,
            batch: DBBatch::new(),
            savepoints: Vec::new(),
        }
    }

    /// Value of `key`, pending writes included
    pub fn get(&self, key: &[u8]) -> Result<Option<Value>, DBError> {
        if let Some(pending) = self.batch.get(key) {
            return Ok(pending.clone());
        }
        self.db.read().get_cf(STATE_CF, key.to_vec())
    }

    /// Whether `key` currently holds a value
    pub fn contains_key(&self, key: &[u8]) -> Result<bool, DBError> {
        Ok(self.get(key)?.is_some())
    }

    /// Puts or replaces a value
    pub fn put(&mut self, key: Key, value: Value) {
        self.record_undo(&key);
        self.db
            .read()
            .put_or_update_entry_value(&mut self.batch, key, &value);
    }

    /// Deletes a key, no-op if absent
    pub fn delete(&mut self, key: Key) {
        self.record_undo(&key);
        self.db.read().delete_key(&mut self.batch, key);
    }

    fn record_undo(&mut self, key: &Key) {
        if let Some(undo) = self.savepoints.last_mut() {
            if !undo.contains_key(key) {
                undo.insert(key.clone(), self.batch.get(key).cloned());
            }
        }
    }

    /// Every live entry whose key starts with `prefix`, in ascending key order
    pub fn prefix_entries(&self, prefix: &[u8]) -> Result<Vec<(Key, Value)>, DBError> {
        let mut merged: BTreeMap<Key, Value> = self
            .db
            .read()
            .prefix_iterator_cf(STATE_CF, prefix)
            .collect::<Result<_, _>>()?;
        let pending = self
            .batch
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix));
        Self::overlay(&mut merged, pending);
        Ok(merged.into_iter().collect())
    }

    /// Every live entry with `start <= key <= end`, in ascending key order
    pub fn range_entries(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Key, Value)>, DBError> {
        if start > end {
            return Ok(Vec::new());
        }
        let mut merged = BTreeMap::new();
        let db = self.db.read();
        for entry in db.iterator_from_cf(STATE_CF, start) {
            let (key, value) = entry?;
            if key.as_slice() > end {
                break;
            }
            merged.insert(key, value);
        }
        let pending = self.batch.range(start.to_vec()..=end.to_vec());
        Self::overlay(&mut merged, pending);
        Ok(merged.into_iter().collect())
    }

    fn overlay<'a>(
        merged: &mut BTreeMap<Key, Value>,
        pending: impl Iterator<Item = (&'a Key, &'a Option<Value>)>,
    ) {
        for (key, value) in pending {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
    }

    /// Opens a savepoint: later writes can be undone up to here
    pub fn savepoint(&mut self) {
        self.savepoints.push(UndoLog::new());
    }

    /// Undoes the writes made since the latest savepoint and drops it
    pub fn rollback_to_savepoint(&mut self) {
        let Some(undo) = self.savepoints.pop() else {
            return;
        };
        for (key, previous) in undo {
            match previous {
                Some(entry) => {
                    self.batch.insert(key, entry);
                }
                None => {
                    self.batch.remove(&key);
                }
            }
        }
    }

    /// Drops the latest savepoint, keeping the writes made since.
    /// They can still be undone by the enclosing savepoint.
    pub fn release_savepoint(&mut self) {
        let Some(undo) = self.savepoints.pop() else {
            return;
        };
        if let Some(parent) = self.savepoints.last_mut() {
            for (key, previous) in undo {
                parent.entry(key).or_insert(previous);
            }
        }
    }

    /// Pending writes
    pub fn batch(&self) -> &DBBatch {
        &self.batch
    }

    /// Writes every pending change atomically, attached to `change_id`
    pub fn commit(self, change_id: u64) -> Result<(), DBError> {
        self.db.write().write_batch(self.batch, Some(change_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DBController, DBIterator};
    use parking_lot::RwLock;
    use std::sync::Arc;

    /// Store whose scans return one entry, then a read error
    #[derive(Debug)]
    struct FailingScans;

    impl FailingScans {
        fn scan(&self) -> DBIterator<'_> {
            Box::new(
                vec![
                    Ok((b"k/1".to_vec(), vec![1])),
                    Err(DBError::RocksDBError("corrupted block".to_string())),
                    Ok((b"k/2".to_vec(), vec![2])),
                ]
                .into_iter(),
            )
        }
    }

    impl DBController for FailingScans {
        fn write_batch(&mut self, _batch: DBBatch, _change_id: Option<u64>) -> Result<(), DBError> {
            Ok(())
        }

        fn put_or_update_entry_value(&self, batch: &mut DBBatch, key: Vec<u8>, value: &[u8]) {
            batch.insert(key, Some(value.to_vec()));
        }

        fn delete_key(&self, batch: &mut DBBatch, key: Vec<u8>) {
            batch.insert(key, None);
        }

        fn get_cf(&self, _handle_cf: &str, _key: Key) -> Result<Option<Value>, DBError> {
            Ok(None)
        }

        fn iterator_from_cf(&self, _handle_cf: &str, _start: &[u8]) -> DBIterator<'_> {
            self.scan()
        }

        fn prefix_iterator_cf(&self, _handle_cf: &str, _prefix: &[u8]) -> DBIterator<'_> {
            self.scan()
        }

        fn get_change_id(&self) -> Result<u64, DBError> {
            Ok(0)
        }
    }

    #[test]
    fn test_scan_errors_are_propagated() {
        let db: ShareableDBController =
            Arc::new(RwLock::new(Box::new(FailingScans) as Box<dyn DBController>));
        let mut tx = DBTransaction::new(db);
        tx.put(b"k/3".to_vec(), vec![3]);
        assert!(matches!(
            tx.prefix_entries(b"k/"),
            Err(DBError::RocksDBError(_))
        ));
        assert!(matches!(
            tx.range_entries(b"k/0", b"k/9"),
            Err(DBError::RocksDBError(_))
        ));
    }
}
