// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::error::{StakingError, StakingResult};
use bonding_db_exports::{DBTransaction, Key, ShareableDBController};
use bonding_models::BlockHeader;
use bonding_serialization::{DeserializeError, Deserializer, Serializer};
use bonding_time::BondingTime;

/// State access of one block: its header and the pending writes on top of the store.
///
/// Every staking and slashing operation reads and writes through it, so that a whole block
/// is committed at once.
#[derive(Debug)]
pub struct ExecutionContext {
    /// header of the block being executed
    pub header: BlockHeader,
    /// pending writes
    pub tx: DBTransaction,
}

impl ExecutionContext {
    /// Opens an empty transaction for the block `header`
    pub fn new(header: BlockHeader, db: ShareableDBController) -> Self {
        Self {
            header,
            tx: DBTransaction::new(db),
        }
    }

    /// height of the current block
    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    /// time of the current block
    pub fn block_time(&self) -> BondingTime {
        self.header.time
    }

    /// Reads and decodes the value at `key`, `what` names the record in codec errors
    pub fn get_decoded<T, D: Deserializer<T>>(
        &self,
        key: &[u8],
        deserializer: &D,
        what: &str,
    ) -> StakingResult<Option<T>> {
        match self.tx.get(key)? {
            Some(bytes) => Ok(Some(decode(&bytes, deserializer, what)?)),
            None => Ok(None),
        }
    }

    /// Encodes `value` and writes it at `key`
    pub fn put_encoded<T, S: Serializer<T>>(
        &mut self,
        key: Key,
        value: &T,
        serializer: &S,
        what: &str,
    ) -> StakingResult<()> {
        let mut buffer = Vec::new();
        serializer
            .serialize(value, &mut buffer)
            .map_err(|err| StakingError::CodecError(format!("{}: {}", what, err)))?;
        self.tx.put(key, buffer);
        Ok(())
    }
}

/// Decodes a stored value, `what` names the record in codec errors
pub fn decode<T, D: Deserializer<T>>(bytes: &[u8], deserializer: &D, what: &str) -> StakingResult<T> {
    deserializer
        .deserialize::<DeserializeError>(bytes)
        .map(|(_rest, value)| value)
        .map_err(|err| StakingError::CodecError(format!("{}: {}", what, err)))
}
