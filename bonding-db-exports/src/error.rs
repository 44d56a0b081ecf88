use displaydoc::Display;
use thiserror::Error;

#[non_exhaustive]
#[derive(Display, Error, Debug, Clone)]
pub enum DBError {
    /// rocksdb error: {0}
    RocksDBError(String),
    /// invalid change id: {0}
    InvalidChangeID(String),
    /// missing metadata: {0}
    MissingMetadata(String),
}
