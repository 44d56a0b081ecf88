use std::collections::BTreeMap;

pub type Key = Vec<u8>;
pub type Value = Vec<u8>;

/// Pending writes: `Some` puts the value, `None` deletes the key
pub type DBBatch = BTreeMap<Key, Option<Value>>;
