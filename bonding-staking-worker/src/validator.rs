// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Validator registry: records, consensus address index and power index.

use crate::state::StakingState;
use bonding_db_exports::{VALIDATOR_DESER_ERROR, VALIDATOR_PREFIX, VALIDATOR_SER_ERROR};
use bonding_logging::bonding_trace;
use bonding_models::{Address, Amount, BondStatus, ConsensusAddress, Dec, ValidatorAddress};
use bonding_signature::PublicKey;
use bonding_staking_exports::keys::{
    validator_by_cons_key, validator_by_power_key, validator_key,
};
use bonding_staking_exports::{
    decode, ExecutionContext, StakingError, StakingResult, Validator,
};
use tracing::debug;

impl StakingState {
    /// Validator operated by `operator`
    pub fn get_validator(
        &self,
        ctx: &ExecutionContext,
        operator: &ValidatorAddress,
    ) -> StakingResult<Option<Validator>> {
        ctx.get_decoded(
            &validator_key(operator),
            &self.validator_deserializer,
            VALIDATOR_DESER_ERROR,
        )
    }

    /// Validator operated by `operator`, `NoValidator` if absent
    pub fn must_get_validator(
        &self,
        ctx: &ExecutionContext,
        operator: &ValidatorAddress,
    ) -> StakingResult<Validator> {
        self.get_validator(ctx, operator)?
            .ok_or(StakingError::NoValidator(*operator))
    }

    /// Validator whose consensus key derives to `cons_addr`
    pub fn get_validator_by_cons_addr(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> StakingResult<Option<Validator>> {
        let operator = ctx.get_decoded(
            &validator_by_cons_key(cons_addr),
            &self.operator_deserializer,
            VALIDATOR_DESER_ERROR,
        )?;
        match operator {
            Some(operator) => self.get_validator(ctx, &operator),
            None => Ok(None),
        }
    }

    /// Every validator, by operator bytes
    pub fn get_all_validators(&self, ctx: &ExecutionContext) -> StakingResult<Vec<Validator>> {
        ctx.tx
            .prefix_entries(VALIDATOR_PREFIX.as_bytes())?
            .iter()
            .map(|(_, value)| decode(value, &self.validator_deserializer, VALIDATOR_DESER_ERROR))
            .collect()
    }

    pub(crate) fn set_validator(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        ctx.put_encoded(
            validator_key(&validator.operator_address),
            validator,
            &self.validator_serializer,
            VALIDATOR_SER_ERROR,
        )
    }

    pub(crate) fn set_validator_by_cons_addr(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        ctx.put_encoded(
            validator_by_cons_key(&validator.consensus_address()),
            &validator.operator_address,
            &self.operator_serializer,
            VALIDATOR_SER_ERROR,
        )
    }

    /// jailed validators are kept out of the power index
    pub(crate) fn set_validator_by_power_index(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) {
        if validator.jailed {
            return;
        }
        self.set_new_validator_by_power_index(ctx, validator);
    }

    pub(crate) fn set_new_validator_by_power_index(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) {
        ctx.tx.put(
            validator_by_power_key(
                validator.potential_consensus_power(self.config.power_reduction),
                &validator.operator_address,
            ),
            Vec::new(),
        );
    }

    pub(crate) fn delete_validator_by_power_index(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) {
        ctx.tx.delete(validator_by_power_key(
            validator.potential_consensus_power(self.config.power_reduction),
            &validator.operator_address,
        ));
    }

    /// Adds delegated tokens to `validator`, returns the updated record and the issued shares
    pub fn add_validator_tokens_and_shares(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
        tokens_to_add: Amount,
    ) -> StakingResult<(Validator, Dec)> {
        self.delete_validator_by_power_index(ctx, &validator);
        let added_shares = validator.add_tokens_from_del(tokens_to_add)?;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(ctx, &validator);
        Ok((validator, added_shares))
    }

    /// Burns delegator shares of `validator`, returns the updated record and the tokens
    /// they were worth
    pub fn remove_validator_tokens_and_shares(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
        shares_to_remove: Dec,
    ) -> StakingResult<(Validator, Amount)> {
        self.delete_validator_by_power_index(ctx, &validator);
        let removed_tokens = validator.remove_del_shares(shares_to_remove)?;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(ctx, &validator);
        Ok((validator, removed_tokens))
    }

    /// Removes tokens from `validator` without touching the shares
    pub fn remove_validator_tokens(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
        tokens_to_remove: Amount,
    ) -> StakingResult<Validator> {
        self.delete_validator_by_power_index(ctx, &validator);
        validator.remove_tokens(tokens_to_remove)?;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(ctx, &validator);
        Ok(validator)
    }

    pub(crate) fn jail_validator(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
    ) -> StakingResult<Validator> {
        if validator.jailed {
            return Err(StakingError::Invariant(format!(
                "cannot jail already jailed validator {}",
                validator.operator_address
            )));
        }
        validator.jailed = true;
        self.set_validator(ctx, &validator)?;
        self.delete_validator_by_power_index(ctx, &validator);
        Ok(validator)
    }

    pub(crate) fn unjail_validator(
        &self,
        ctx: &mut ExecutionContext,
        mut validator: Validator,
    ) -> StakingResult<Validator> {
        if !validator.jailed {
            return Err(StakingError::Invariant(format!(
                "cannot unjail already unjailed validator {}",
                validator.operator_address
            )));
        }
        validator.jailed = false;
        self.set_validator(ctx, &validator)?;
        self.set_validator_by_power_index(ctx, &validator);
        Ok(validator)
    }

    fn must_get_validator_by_cons_addr(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> StakingResult<Validator> {
        self.get_validator_by_cons_addr(ctx, cons_addr)?
            .ok_or_else(|| {
                StakingError::Invariant(format!("no validator with consensus address {}", cons_addr))
            })
    }

    /// Jails the validator of `cons_addr`: it leaves the active set at the next end block
    pub fn jail(&self, ctx: &mut ExecutionContext, cons_addr: &ConsensusAddress) -> StakingResult<()> {
        let validator = self.must_get_validator_by_cons_addr(ctx, cons_addr)?;
        let validator = self.jail_validator(ctx, validator)?;
        debug!("validator {} jailed", validator.operator_address);
        Ok(())
    }

    /// Lifts the jail of the validator of `cons_addr`
    pub fn unjail(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> StakingResult<()> {
        let validator = self.must_get_validator_by_cons_addr(ctx, cons_addr)?;
        let validator = self.unjail_validator(ctx, validator)?;
        debug!("validator {} unjailed", validator.operator_address);
        Ok(())
    }

    /// Registers a new validator and bonds its self delegation from the operator account
    pub fn create_validator(
        &self,
        ctx: &mut ExecutionContext,
        operator: ValidatorAddress,
        consensus_pubkey: PublicKey,
        min_self_delegation: Amount,
        self_bond: Amount,
    ) -> StakingResult<Dec> {
        if min_self_delegation.is_zero() {
            return Err(StakingError::InvalidMinSelfDelegation);
        }
        if self_bond < min_self_delegation {
            return Err(StakingError::SelfDelegationBelowMinimum(
                self_bond.to_string(),
                min_self_delegation.to_string(),
            ));
        }
        if self.get_validator(ctx, &operator)?.is_some() {
            return Err(StakingError::ValidatorOwnerExists(operator));
        }
        let validator = Validator::new(operator, consensus_pubkey, min_self_delegation);
        if self
            .get_validator_by_cons_addr(ctx, &validator.consensus_address())?
            .is_some()
        {
            return Err(StakingError::ValidatorPubKeyExists);
        }

        self.set_validator(ctx, &validator)?;
        self.set_validator_by_cons_addr(ctx, &validator)?;
        self.set_new_validator_by_power_index(ctx, &validator);
        self.hooks().after_validator_created(ctx, &validator)?;

        bonding_trace!("staking.create_validator", {
            "operator": operator.to_string(),
            "consensus_address": validator.consensus_address().to_string(),
            "self_bond": self_bond.to_string()
        });
        self.delegate(
            ctx,
            Address::from(operator),
            self_bond,
            BondStatus::Unbonded,
            validator,
            true,
        )
    }

    /// Deletes an unbonded validator without tokens, no-op if it does not exist
    pub fn remove_validator(
        &self,
        ctx: &mut ExecutionContext,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        let Some(validator) = self.get_validator(ctx, operator)? else {
            return Ok(());
        };
        if !validator.is_unbonded() {
            return Err(StakingError::Invariant(format!(
                "cannot remove {} validator {}",
                validator.status, operator
            )));
        }
        if !validator.tokens.is_zero() {
            return Err(StakingError::Invariant(format!(
                "cannot remove validator {} still holding {} tokens",
                operator, validator.tokens
            )));
        }
        let cons_addr = validator.consensus_address();
        ctx.tx.delete(validator_key(operator));
        ctx.tx.delete(validator_by_cons_key(&cons_addr));
        self.delete_validator_by_power_index(ctx, &validator);
        self.hooks()
            .after_validator_removed(ctx, &cons_addr, operator)?;
        debug!("validator {} removed", operator);
        Ok(())
    }
}
