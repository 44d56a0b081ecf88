// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::ConsensusAddress;
use bonding_time::BondingTime;
use serde::{Deserialize, Serialize};

/// Equivocation reported by the consensus layer: the key of `consensus_address` signed two
/// different blocks at `height`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// misbehaving consensus address
    pub consensus_address: ConsensusAddress,
    /// height of the infraction
    pub height: u64,
    /// time of the infraction
    pub time: BondingTime,
    /// consensus power of the validator at the infraction
    pub power: u64,
}
