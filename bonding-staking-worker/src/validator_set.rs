// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Active set maintenance: at the end of each block the validators with the highest power
//! are bonded, those pushed out start unbonding, and the consensus engine receives the
//! power changes.

use crate::state::StakingState;
use bonding_db_exports::{LAST_VALIDATOR_POWER_PREFIX, VALIDATOR_BY_POWER_PREFIX};
use bonding_logging::bonding_trace;
use bonding_models::{Amount, BondStatus, ValidatorAddress};
use bonding_staking_exports::keys::{
    address_suffix, last_total_power_key, last_validator_power_key, operator_from_power_key,
};
use bonding_staking_exports::{
    decode, ExecutionContext, StakingError, StakingResult, Validator, ValidatorUpdate,
};
use std::collections::BTreeMap;
use tracing::debug;

const POWER_DESER_ERROR: &str = "critical: last power deserialization failed";
const POWER_SER_ERROR: &str = "critical: last power serialization failed";

impl StakingState {
    /// Power of `operator` as last reported to the consensus engine, if it is in the set
    pub fn get_last_validator_power(
        &self,
        ctx: &ExecutionContext,
        operator: &ValidatorAddress,
    ) -> StakingResult<Option<u64>> {
        ctx.get_decoded(
            &last_validator_power_key(operator),
            &self.u64_deserializer,
            POWER_DESER_ERROR,
        )
    }

    fn set_last_validator_power(
        &self,
        ctx: &mut ExecutionContext,
        operator: &ValidatorAddress,
        power: u64,
    ) -> StakingResult<()> {
        ctx.put_encoded(
            last_validator_power_key(operator),
            &power,
            &self.u64_serializer,
            POWER_SER_ERROR,
        )
    }

    /// Sum of the powers last reported to the consensus engine
    pub fn get_last_total_power(&self, ctx: &ExecutionContext) -> StakingResult<u64> {
        Ok(ctx
            .get_decoded(
                &last_total_power_key(),
                &self.u64_deserializer,
                POWER_DESER_ERROR,
            )?
            .unwrap_or_default())
    }

    fn set_last_total_power(&self, ctx: &mut ExecutionContext, power: u64) -> StakingResult<()> {
        ctx.put_encoded(
            last_total_power_key(),
            &power,
            &self.u64_serializer,
            POWER_SER_ERROR,
        )
    }

    /// Last reported powers, by operator
    fn get_last_validator_powers(
        &self,
        ctx: &ExecutionContext,
    ) -> StakingResult<BTreeMap<ValidatorAddress, u64>> {
        ctx.tx
            .prefix_entries(LAST_VALIDATOR_POWER_PREFIX.as_bytes())?
            .iter()
            .map(|(key, value)| {
                let operator = ValidatorAddress::from(address_suffix(key)?);
                let power = decode(value, &self.u64_deserializer, POWER_DESER_ERROR)?;
                Ok((operator, power))
            })
            .collect()
    }

    /// Validators of the last reported set, highest power first
    pub fn get_last_validators(&self, ctx: &ExecutionContext) -> StakingResult<Vec<Validator>> {
        let mut validators = Vec::new();
        for (operator, power) in self.get_last_validator_powers(ctx)? {
            let validator = self.get_validator(ctx, &operator)?.ok_or_else(|| {
                StakingError::Invariant(format!(
                    "validator {} of the last set was not found",
                    operator
                ))
            })?;
            validators.push((power, validator));
        }
        validators.sort_by(|(power_a, a), (power_b, b)| {
            power_b
                .cmp(power_a)
                .then_with(|| a.operator_address.cmp(&b.operator_address))
        });
        Ok(validators.into_iter().map(|(_, validator)| validator).collect())
    }

    fn bond_validator(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
    ) -> StakingResult<Validator> {
        self.delete_validator_by_power_index(ctx, &validator);
        validator.status = BondStatus::Bonded;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(ctx, &validator);
        self.delete_validator_queue(ctx, &validator)?;
        self.hooks().after_validator_bonded(
            ctx,
            &validator.consensus_address(),
            &validator.operator_address,
        )?;
        debug!("validator {} bonded", validator.operator_address);
        Ok(validator)
    }

    fn begin_unbonding_validator(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
    ) -> StakingResult<Validator> {
        if !validator.is_bonded() {
            return Err(StakingError::Invariant(format!(
                "should not begin unbonding {} validator {}",
                validator.status, validator.operator_address
            )));
        }
        self.delete_validator_by_power_index(ctx, &validator);
        validator.status = BondStatus::Unbonding;
        validator.unbonding_time = ctx.block_time().checked_add(self.config.unbonding_time)?;
        validator.unbonding_height = ctx.block_height();
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(ctx, &validator);
        self.insert_unbonding_validator_queue(ctx, &validator)?;
        self.hooks().after_validator_begin_unbonding(
            ctx,
            &validator.consensus_address(),
            &validator.operator_address,
        )?;
        debug!(
            "validator {} begins unbonding until {}",
            validator.operator_address, validator.unbonding_time
        );
        Ok(validator)
    }

    /// Recomputes the active set from the power index: the `max_validators` highest powers
    /// are bonded, the validators that dropped out start unbonding. Returns the power
    /// changes since the last call, removals carrying a power of zero.
    pub fn apply_and_return_validator_set_updates(
        &self,
        ctx: &mut ExecutionContext,
    ) -> StakingResult<Vec<ValidatorUpdate>> {
        let power_reduction = self.config.power_reduction;
        let mut last = self.get_last_validator_powers(ctx)?;
        let mut updates = Vec::new();
        let mut total_power: u64 = 0;
        let mut amt_from_bonded_to_not_bonded = Amount::zero();
        let mut amt_from_not_bonded_to_bonded = Amount::zero();

        let index = ctx
            .tx
            .prefix_entries(VALIDATOR_BY_POWER_PREFIX.as_bytes())?;
        for (key, _) in index.iter().take(self.config.max_validators as usize) {
            let operator = operator_from_power_key(key)?;
            let mut validator = self.get_validator(ctx, &operator)?.ok_or_else(|| {
                StakingError::Invariant(format!(
                    "validator {} of the power index was not found",
                    operator
                ))
            })?;
            if validator.jailed {
                return Err(StakingError::Invariant(format!(
                    "jailed validator {} found in the power index",
                    operator
                )));
            }
            // the index is sorted: nobody after this one has power either
            if validator.potential_consensus_power(power_reduction) == 0 {
                break;
            }

            match validator.status {
                BondStatus::Bonded => {}
                BondStatus::Unbonded | BondStatus::Unbonding => {
                    amt_from_not_bonded_to_bonded = amt_from_not_bonded_to_bonded
                        .checked_add(validator.tokens)
                        .ok_or_else(|| {
                            StakingError::Invariant("bonded amount overflow".to_string())
                        })?;
                    validator = self.bond_validator(ctx, validator)?;
                }
            }

            let new_power = validator.consensus_power(power_reduction);
            if last.get(&operator) != Some(&new_power) {
                updates.push(ValidatorUpdate {
                    pub_key: validator.consensus_pubkey,
                    power: new_power,
                });
                self.set_last_validator_power(ctx, &operator, new_power)?;
            }
            last.remove(&operator);
            total_power = total_power.checked_add(new_power).ok_or_else(|| {
                StakingError::Invariant("total power overflow".to_string())
            })?;
        }

        // BTreeMap keeps the leftovers sorted by operator bytes
        for operator in last.into_keys() {
            let validator = self.must_get_validator(ctx, &operator)?;
            let validator = self.begin_unbonding_validator(ctx, validator)?;
            amt_from_bonded_to_not_bonded = amt_from_bonded_to_not_bonded
                .checked_add(validator.tokens)
                .ok_or_else(|| StakingError::Invariant("unbonded amount overflow".to_string()))?;
            ctx.tx.delete(last_validator_power_key(&operator));
            updates.push(ValidatorUpdate {
                pub_key: validator.consensus_pubkey,
                power: 0,
            });
        }

        if amt_from_not_bonded_to_bonded > amt_from_bonded_to_not_bonded {
            self.not_bonded_tokens_to_bonded(
                ctx,
                amt_from_not_bonded_to_bonded.saturating_sub(amt_from_bonded_to_not_bonded),
            )?;
        } else if amt_from_bonded_to_not_bonded > amt_from_not_bonded_to_bonded {
            self.bonded_tokens_to_not_bonded(
                ctx,
                amt_from_bonded_to_not_bonded.saturating_sub(amt_from_not_bonded_to_bonded),
            )?;
        }

        if !updates.is_empty() {
            self.set_last_total_power(ctx, total_power)?;
            bonding_trace!("staking.validator_set_updates", {
                "height": ctx.block_height(),
                "updates": updates.len(),
                "total_power": total_power
            });
        }
        Ok(updates)
    }
}
