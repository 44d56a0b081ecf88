//! # General description
//!
//! BondingDB is a wrapper around:
//! * A RocksDB database (on Disk)
//! * A cache of the latest changes (on RAM).
//! * a config
//!
//! # RocksDB
//!
//! RocksDB stores keys and values, which are arbitrarily-sized byte streams (aka vec<u8> or &[u8]).
//! It supports both point lookups and range scans.
//!
//! For BondingDB, we use 2 rocksdb columns:
//! * state: validators, delegations, unbonding entries, queues, signing infos, balances
//! * metadata: the change id (height of the last committed block)
//!
//! Note that data is stored with a prefix (see constants.rs in bonding-db-exports).
//! For instance, a delegation will be stored (in column: 'state') as:
//! * key: DELEGATION_PREFIX+delegator+validator (serialized as bytes)
//! * value: Delegation (serialized as bytes)
//!
//! Every block is written as a single rocksdb batch together with its change id,
//! so a crash never leaves half of a block on disk.

mod bonding_db;

pub use crate::bonding_db::*;
