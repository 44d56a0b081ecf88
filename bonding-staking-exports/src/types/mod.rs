// Copyright (c) 2022 MASSA LABS <info@massa.net>

mod delegation;
mod historical;
mod validator;

pub use delegation::*;
pub use historical::*;
pub use validator::*;

use bonding_signature::PublicKey;
use serde::{Deserialize, Serialize};

/// Power change of a consensus key, handed to the consensus engine at the end of a block.
/// A power of zero removes the key from the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    /// consensus public key
    pub pub_key: PublicKey,
    /// new consensus power
    pub power: u64,
}
