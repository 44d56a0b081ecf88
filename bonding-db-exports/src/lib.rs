//! Storage abstraction of the staking state: an ordered key-value store with atomic batches.
mod constants;
mod controller;
mod db_batch;
mod error;
mod settings;
mod transaction;

pub use constants::*;
pub use controller::*;
pub use db_batch::*;
pub use error::*;
pub use settings::*;
pub use transaction::*;
