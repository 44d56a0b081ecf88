// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Value types shared by the staking and slashing state.
#![warn(missing_docs)]

pub use address::{
    Address, AddressDeserializer, AddressSerializer, ConsensusAddress,
    ConsensusAddressDeserializer, ConsensusAddressSerializer, ValidatorAddress,
    ValidatorAddressDeserializer, ValidatorAddressSerializer, ADDRESS_SIZE_BYTES,
};
pub use amount::{Amount, AmountDeserializer, AmountSerializer};
pub use block::{BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer};
pub use bond_status::{BondStatus, BondStatusDeserializer, BondStatusSerializer};
pub use dec::{Dec, DecDeserializer, DecSerializer};
pub use error::{ModelsError, ModelsResult};

/// account and module addresses
pub mod address;
/// token amounts
pub mod amount;
mod block;
mod bond_status;
/// constants
pub mod constants;
/// fixed-point decimals for shares and fractions
pub mod dec;
/// models error
pub mod error;
