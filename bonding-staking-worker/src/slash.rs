// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::state::StakingState;
use bonding_logging::bonding_trace;
use bonding_models::constants::NOT_BONDED_POOL_NAME;
use bonding_models::{Amount, ConsensusAddress, Dec};
use bonding_staking_exports::{ExecutionContext, StakingError, StakingResult, UnbondingDelegation};
use tracing::{debug, warn};

impl StakingState {
    /// Burns `fraction` of the stake a validator held at `infraction_height`, when it had
    /// `power` consensus power. Undelegations started after the infraction are slashed
    /// first, the validator tokens cover the rest. Returns the amount actually burned.
    ///
    /// `infraction_height` is signed: evidence from the first blocks yields a negative
    /// distribution height, which makes every pending undelegation liable.
    /// An unknown validator is not an error: it may have been removed already.
    pub fn slash(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        infraction_height: i64,
        power: u64,
        fraction: Dec,
    ) -> StakingResult<Amount> {
        if fraction > Dec::one() {
            return Err(StakingError::Invariant(format!(
                "slash fraction {} is above one",
                fraction
            )));
        }
        // upper bound only, capped by the validator tokens below
        let amount = self.config.power_reduction.saturating_mul_u64(power);
        let slash_amount = fraction.mul_amount_floor(amount).ok_or_else(|| {
            StakingError::Invariant(format!("slash amount overflow for {}", amount))
        })?;

        let Some(validator) = self.get_validator_by_cons_addr(ctx, cons_addr)? else {
            warn!(
                "ignored attempt to slash a nonexistent validator {}",
                cons_addr
            );
            return Ok(Amount::zero());
        };
        if validator.is_unbonded() {
            return Err(StakingError::Invariant(format!(
                "cannot slash unbonded validator {}",
                validator.operator_address
            )));
        }
        let operator = validator.operator_address;
        self.hooks()
            .before_validator_slashed(ctx, &operator, fraction)?;

        let current_height = ctx.block_height() as i64;
        if infraction_height > current_height {
            return Err(StakingError::Invariant(format!(
                "infraction height {} is in the future of block {}",
                infraction_height, current_height
            )));
        }
        let mut remaining_slash_amount = slash_amount;
        if infraction_height < current_height {
            for ubd in self.get_unbonding_delegations_from_validator(ctx, &operator)? {
                let slashed =
                    self.slash_unbonding_delegation(ctx, ubd, infraction_height, fraction)?;
                remaining_slash_amount = remaining_slash_amount.saturating_sub(slashed);
            }
        }

        let tokens_to_burn = remaining_slash_amount.min(validator.tokens);
        let status = validator.status;
        let validator = self.remove_validator_tokens(ctx, validator, tokens_to_burn)?;
        self.burn_validator_tokens(ctx, status, tokens_to_burn)?;

        debug!(
            "validator {} slashed by {} at height {}: {} burned",
            operator, fraction, infraction_height, tokens_to_burn
        );
        bonding_trace!("staking.slash", {
            "validator": operator.to_string(),
            "fraction": fraction.to_string(),
            "infraction_height": infraction_height,
            "slash_amount": slash_amount.to_string(),
            "burned": tokens_to_burn.to_string(),
            "remaining_tokens": validator.tokens.to_string()
        });
        Ok(tokens_to_burn)
    }

    /// Slashes the entries of `ubd` created at or after `infraction_height` and still
    /// pending. Returns the amount the entries were liable for, which can exceed what was
    /// burned when an entry balance was already reduced.
    pub(crate) fn slash_unbonding_delegation(
        &self,
        ctx: &mut ExecutionContext,
        mut ubd: UnbondingDelegation,
        infraction_height: i64,
        fraction: Dec,
    ) -> StakingResult<Amount> {
        let now = ctx.block_time();
        let mut total_slash_amount = Amount::zero();
        let mut burned = Amount::zero();
        for entry in ubd.entries.iter_mut() {
            if (entry.creation_height as i64) < infraction_height || entry.is_mature(now) {
                continue;
            }
            let slash_amount = fraction
                .mul_amount_floor(entry.initial_balance)
                .ok_or_else(|| {
                    StakingError::Invariant("unbonding slash amount overflow".to_string())
                })?;
            total_slash_amount = total_slash_amount.saturating_add(slash_amount);
            let unbonding_slash_amount = slash_amount.min(entry.balance);
            if unbonding_slash_amount.is_zero() {
                continue;
            }
            burned = burned.saturating_add(unbonding_slash_amount);
            entry.balance = entry.balance.saturating_sub(unbonding_slash_amount);
        }
        if !burned.is_zero() {
            self.set_unbonding_delegation(ctx, &ubd)?;
            self.bank.burn_coins(ctx, NOT_BONDED_POOL_NAME, burned)?;
        }
        Ok(total_slash_amount)
    }
}
