use std::path::PathBuf;

/// Config structure for a `BondingDB`
#[derive(Debug, Clone)]
pub struct DBConfig {
    /// The path to the database, used in the wrapped RocksDB instance
    pub path: PathBuf,
    /// Change history to keep (indexed by ChangeID)
    pub max_history_length: usize,
}
