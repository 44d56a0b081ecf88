// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::records::SlashingRecords;
use crate::signing_info::SigningInfo;
use bonding_models::{ConsensusAddress, ValidatorAddress};
use bonding_staking_exports::{ExecutionContext, StakingHooks, StakingResult, Validator};
use tracing::debug;

/// Staking hooks keeping the slashing records in sync with the validator registry
#[derive(Clone, Default)]
pub struct SlashingHooks {
    records: SlashingRecords,
}

impl SlashingHooks {
    /// Creates the hooks
    pub fn new() -> Self {
        Self {
            records: SlashingRecords::new(),
        }
    }
}

impl StakingHooks for SlashingHooks {
    fn after_validator_created(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        self.records.add_pubkey(ctx, &validator.consensus_pubkey)
    }

    fn after_validator_bonded(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        if self.records.has_signing_info(ctx, cons_addr)? {
            return Ok(());
        }
        let info = SigningInfo::new(ctx.block_height());
        self.records.set_signing_info(ctx, cons_addr, &info)?;
        debug!(
            "signing info of {} starts at height {}",
            cons_addr, info.start_height
        );
        Ok(())
    }

    fn after_validator_removed(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.records.delete_pubkey(ctx, cons_addr);
        Ok(())
    }
}
