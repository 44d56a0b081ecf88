use bonding_db_exports::{
    DBBatch, DBConfig, DBController, DBError, DBIterator, Key, Value, CF_ERROR, CHANGE_ID_KEY,
    CHANGE_ID_SER_ERROR, METADATA_CF, STATE_CF,
};
use bonding_serialization::{
    DeserializeError, Deserializer, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::{collections::BTreeMap, ops::Bound::Included, sync::Arc};
use tracing::debug;

/// Wrapped RocksDB database
///
/// The change id is the height of the last block written.
pub struct BondingDB {
    /// The rocksdb instance
    pub db: Arc<DB>,
    /// configuration for the `BondingDB`
    pub config: DBConfig,
    /// In change_history, we keep the latest changes made to the database.
    pub change_history: BTreeMap<u64, DBBatch>,
    change_id_serializer: U64VarIntSerializer,
    change_id_deserializer: U64VarIntDeserializer,
}

impl std::fmt::Debug for BondingDB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BondingDB")
            .field("db", &self.db)
            .field("config", &self.config)
            .field("change_history", &self.change_history)
            .finish()
    }
}

fn rocks_error(e: rocksdb::Error) -> DBError {
    DBError::RocksDBError(format!("{:?}", e))
}

impl BondingDB {
    /// Returns a new `BondingDB` instance
    pub fn new(config: DBConfig) -> Result<Self, DBError> {
        let db_opts = Self::default_db_opts();
        Self::new_with_options(config, db_opts).map_err(rocks_error)
    }

    pub fn default_db_opts() -> Options {
        let mut db_opts = Options::default();
        db_opts.set_max_open_files(820);
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts
    }

    /// Returns a new `BondingDB` instance given a config and RocksDB options
    pub fn new_with_options(config: DBConfig, db_opts: Options) -> Result<Self, rocksdb::Error> {
        let db = DB::open_cf_descriptors(
            &db_opts,
            &config.path,
            vec![
                ColumnFamilyDescriptor::new(STATE_CF, Options::default()),
                ColumnFamilyDescriptor::new(METADATA_CF, Options::default()),
            ],
        )?;

        let bonding_db = Self {
            db: Arc::new(db),
            config,
            change_history: BTreeMap::new(),
            change_id_serializer: U64VarIntSerializer::new(),
            change_id_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
        };

        if bonding_db.get_change_id().is_err() {
            let mut batch = WriteBatch::default();
            bonding_db.set_change_id_to_batch(&mut batch, 0);
            bonding_db.db.write(batch)?;
        }

        Ok(bonding_db)
    }

    /// Set the current change_id in the batch
    fn set_change_id_to_batch(&self, batch: &mut WriteBatch, change_id: u64) {
        let handle_metadata = self.db.cf_handle(METADATA_CF).expect(CF_ERROR);
        let mut change_id_bytes = Vec::new();
        self.change_id_serializer
            .serialize(&change_id, &mut change_id_bytes)
            .expect(CHANGE_ID_SER_ERROR);
        batch.put_cf(handle_metadata, CHANGE_ID_KEY, &change_id_bytes);
    }

    /// Writes changes associated to a given change_id
    pub fn write_changes(
        &mut self,
        changes: DBBatch,
        change_id: Option<u64>,
    ) -> Result<(), DBError> {
        if let Some(change_id) = change_id {
            if change_id < self.get_change_id()? {
                return Err(DBError::InvalidChangeID(String::from(
                    "change_id should monotonically increase after every write",
                )));
            }
        }

        let handle_state = self.db.cf_handle(STATE_CF).expect(CF_ERROR);
        let mut batch = WriteBatch::default();
        for (key, value) in changes.iter() {
            match value {
                Some(value) => batch.put_cf(handle_state, key, value),
                None => batch.delete_cf(handle_state, key),
            }
        }
        if let Some(change_id) = change_id {
            self.set_change_id_to_batch(&mut batch, change_id);
        }

        self.db
            .write(batch)
            .map_err(|e| DBError::RocksDBError(format!("Can't write batch to disk: {}", e)))?;

        let change_id = self.get_change_id()?;
        debug!(
            "bonding db: wrote {} change(s) at change id {}",
            changes.len(),
            change_id
        );
        self.change_history
            .entry(change_id)
            .or_default()
            .extend(changes);
        while self.change_history.len() > self.config.max_history_length {
            self.change_history.pop_first();
        }

        Ok(())
    }

    /// Get the current change_id attached to the database.
    pub fn get_change_id(&self) -> Result<u64, DBError> {
        let handle = self.db.cf_handle(METADATA_CF).expect(CF_ERROR);

        let Ok(Some(change_id_bytes)) = self.db.get_pinned_cf(handle, CHANGE_ID_KEY) else {
            return Err(DBError::MissingMetadata(String::from(
                "Could not recover change_id in database",
            )));
        };

        let (_rest, change_id) = self
            .change_id_deserializer
            .deserialize::<DeserializeError>(&change_id_bytes)
            .map_err(|err| DBError::MissingMetadata(format!("corrupted change_id: {}", err)))?;

        Ok(change_id)
    }
}

impl DBController for BondingDB {
    /// Writes the batch to the DB
    fn write_batch(&mut self, batch: DBBatch, change_id: Option<u64>) -> Result<(), DBError> {
        self.write_changes(batch, change_id)
    }

    /// Utility function to put / update a key & value in the batch
    fn put_or_update_entry_value(&self, batch: &mut DBBatch, key: Vec<u8>, value: &[u8]) {
        batch.insert(key, Some(value.to_vec()));
    }

    /// Utility function to delete a key & value in the batch
    fn delete_key(&self, batch: &mut DBBatch, key: Vec<u8>) {
        batch.insert(key, None);
    }

    fn get_cf(&self, handle_cf: &str, key: Key) -> Result<Option<Value>, DBError> {
        let handle = self.db.cf_handle(handle_cf).expect(CF_ERROR);

        self.db.get_cf(handle, key).map_err(rocks_error)
    }

    /// Exposes RocksDB's "iterator_cf" function, forward from `start`
    fn iterator_from_cf(&self, handle_cf: &str, start: &[u8]) -> DBIterator<'_> {
        let handle = self.db.cf_handle(handle_cf).expect(CF_ERROR);

        Box::new(
            self.db
                .iterator_cf(handle, IteratorMode::From(start, Direction::Forward))
                .map(|entry| {
                    entry
                        .map(|(k, v)| (k.to_vec(), v.to_vec()))
                        .map_err(rocks_error)
                }),
        )
    }

    /// Keys starting with `prefix`, the iteration stops at the first key outside of it
    fn prefix_iterator_cf(&self, handle_cf: &str, prefix: &[u8]) -> DBIterator<'_> {
        let handle = self.db.cf_handle(handle_cf).expect(CF_ERROR);
        let prefix = prefix.to_vec();

        Box::new(
            self.db
                .prefix_iterator_cf(handle, prefix.clone())
                .take_while(move |entry| match entry {
                    Ok((k, _)) => k.starts_with(&prefix),
                    Err(_) => true,
                })
                .map(|entry| {
                    entry
                        .map(|(k, v)| (k.to_vec(), v.to_vec()))
                        .map_err(rocks_error)
                }),
        )
    }

    fn get_change_id(&self) -> Result<u64, DBError> {
        self.get_change_id()
    }
}
