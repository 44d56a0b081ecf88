// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Delegation ledger: delegations, undelegations and their payout.

use crate::state::StakingState;
use bonding_db_exports::{
    DELEGATION_DESER_ERROR, DELEGATION_SER_ERROR, UNBONDING_DELEGATION_DESER_ERROR,
    UNBONDING_DELEGATION_SER_ERROR,
};
use bonding_logging::bonding_trace;
use bonding_models::constants::{BONDED_POOL_NAME, NOT_BONDED_POOL_NAME};
use bonding_models::{Address, Amount, BondStatus, Dec, ValidatorAddress};
use bonding_staking_exports::keys::{
    address_suffix, delegation_key, delegator_delegations_prefix, unbonding_delegation_by_val_key,
    unbonding_delegation_key, unbonding_delegations_by_val_prefix,
};
use bonding_staking_exports::{
    decode, Delegation, ExecutionContext, StakingError, StakingResult, UnbondingDelegation,
    Validator,
};
use bonding_time::BondingTime;

impl StakingState {
    /// Delegation of `delegator` to `operator`
    pub fn get_delegation(
        &self,
        ctx: &ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<Option<Delegation>> {
        ctx.get_decoded(
            &delegation_key(delegator, operator),
            &self.delegation_deserializer,
            DELEGATION_DESER_ERROR,
        )
    }

    /// Every delegation of `delegator`
    pub fn get_delegator_delegations(
        &self,
        ctx: &ExecutionContext,
        delegator: &Address,
    ) -> StakingResult<Vec<Delegation>> {
        ctx.tx
            .prefix_entries(&delegator_delegations_prefix(delegator))?
            .iter()
            .map(|(_, value)| {
                decode(value, &self.delegation_deserializer, DELEGATION_DESER_ERROR)
            })
            .collect()
    }

    fn set_delegation(
        &self,
        ctx: &mut ExecutionContext,
        delegation: &Delegation,
    ) -> StakingResult<()> {
        ctx.put_encoded(
            delegation_key(&delegation.delegator_address, &delegation.validator_address),
            delegation,
            &self.delegation_serializer,
            DELEGATION_SER_ERROR,
        )
    }

    fn remove_delegation(
        &self,
        ctx: &mut ExecutionContext,
        delegation: &Delegation,
    ) -> StakingResult<()> {
        self.hooks().before_delegation_removed(
            ctx,
            &delegation.delegator_address,
            &delegation.validator_address,
        )?;
        ctx.tx.delete(delegation_key(
            &delegation.delegator_address,
            &delegation.validator_address,
        ));
        Ok(())
    }

    /// Pending undelegations of `delegator` from `operator`
    pub fn get_unbonding_delegation(
        &self,
        ctx: &ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<Option<UnbondingDelegation>> {
        ctx.get_decoded(
            &unbonding_delegation_key(delegator, operator),
            &self.ubd_deserializer,
            UNBONDING_DELEGATION_DESER_ERROR,
        )
    }

    /// Pending undelegations from `operator`, by delegator bytes
    pub fn get_unbonding_delegations_from_validator(
        &self,
        ctx: &ExecutionContext,
        operator: &ValidatorAddress,
    ) -> StakingResult<Vec<UnbondingDelegation>> {
        let mut ubds = Vec::new();
        for (key, _) in ctx
            .tx
            .prefix_entries(&unbonding_delegations_by_val_prefix(operator))?
        {
            let delegator = address_suffix(&key)?;
            let ubd = self
                .get_unbonding_delegation(ctx, &delegator, operator)?
                .ok_or_else(|| {
                    StakingError::Invariant(format!(
                        "dangling unbonding delegation index for ({}, {})",
                        delegator, operator
                    ))
                })?;
            ubds.push(ubd);
        }
        Ok(ubds)
    }

    pub(crate) fn set_unbonding_delegation(
        &self,
        ctx: &mut ExecutionContext,
        ubd: &UnbondingDelegation,
    ) -> StakingResult<()> {
        ctx.put_encoded(
            unbonding_delegation_key(&ubd.delegator_address, &ubd.validator_address),
            ubd,
            &self.ubd_serializer,
            UNBONDING_DELEGATION_SER_ERROR,
        )?;
        ctx.tx.put(
            unbonding_delegation_by_val_key(&ubd.validator_address, &ubd.delegator_address),
            Vec::new(),
        );
        Ok(())
    }

    fn remove_unbonding_delegation(&self, ctx: &mut ExecutionContext, ubd: &UnbondingDelegation) {
        ctx.tx.delete(unbonding_delegation_key(
            &ubd.delegator_address,
            &ubd.validator_address,
        ));
        ctx.tx.delete(unbonding_delegation_by_val_key(
            &ubd.validator_address,
            &ubd.delegator_address,
        ));
    }

    /// true when no more entry can be added for the pair
    pub fn has_max_unbonding_delegation_entries(
        &self,
        ctx: &ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<bool> {
        Ok(self
            .get_unbonding_delegation(ctx, delegator, operator)?
            .map(|ubd| ubd.is_full(self.config.max_entries))
            .unwrap_or(false))
    }

    fn set_unbonding_delegation_entry(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
        creation_height: u64,
        completion_time: BondingTime,
        balance: Amount,
    ) -> StakingResult<UnbondingDelegation> {
        let mut ubd = self
            .get_unbonding_delegation(ctx, delegator, operator)?
            .unwrap_or_else(|| UnbondingDelegation::new(*delegator, *operator));
        ubd.add_entry(creation_height, completion_time, balance);
        self.set_unbonding_delegation(ctx, &ubd)?;
        Ok(ubd)
    }

    /// Bonds `amount` from `token_source` to `validator`, returns the issued shares.
    ///
    /// With `subtract_account` the tokens come from the delegator account, otherwise they
    /// are already held by one of the pools and only move between pools if needed.
    pub fn delegate(
        &self,
        ctx: &mut ExecutionContext,
        delegator: Address,
        amount: Amount,
        token_source: BondStatus,
        validator: Validator,
        subtract_account: bool,
    ) -> StakingResult<Dec> {
        if validator.invalid_ex_rate() {
            return Err(StakingError::InvalidExchangeRate);
        }
        let operator = validator.operator_address;
        let mut delegation = match self.get_delegation(ctx, &delegator, &operator)? {
            Some(delegation) => {
                self.hooks()
                    .before_delegation_shares_modified(ctx, &delegator, &operator)?;
                delegation
            }
            None => {
                self.hooks()
                    .before_delegation_created(ctx, &delegator, &operator)?;
                Delegation::new(delegator, operator, Dec::zero())
            }
        };

        if subtract_account {
            if token_source.is_bonded() {
                return Err(StakingError::Invariant(
                    "delegation token source cannot be bonded".to_string(),
                ));
            }
            let pool = if validator.is_bonded() {
                BONDED_POOL_NAME
            } else {
                NOT_BONDED_POOL_NAME
            };
            self.bank
                .send_coins_from_account_to_module(ctx, &delegator, pool, amount)?;
        } else {
            match (token_source.is_bonded(), validator.is_bonded()) {
                (true, true) | (false, false) => {}
                (false, true) => self.not_bonded_tokens_to_bonded(ctx, amount)?,
                (true, false) => self.bonded_tokens_to_not_bonded(ctx, amount)?,
            }
        }

        let (_, new_shares) = self.add_validator_tokens_and_shares(ctx, validator, amount)?;
        delegation.shares = delegation.shares.checked_add(new_shares).ok_or_else(|| {
            StakingError::Invariant(format!(
                "share overflow on delegation ({}, {})",
                delegator, operator
            ))
        })?;
        self.set_delegation(ctx, &delegation)?;
        self.hooks()
            .after_delegation_modified(ctx, &delegator, &operator)?;

        bonding_trace!("staking.delegate", {
            "delegator": delegator.to_string(),
            "validator": operator.to_string(),
            "amount": amount.to_string(),
            "shares": new_shares.to_string()
        });
        Ok(new_shares)
    }

    /// Removes `shares` from a delegation and from the validator, returns the tokens they
    /// were worth. Self delegations falling below the minimum jail the validator.
    pub(crate) fn unbond(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
        shares: Dec,
    ) -> StakingResult<Amount> {
        let mut delegation = self
            .get_delegation(ctx, delegator, operator)?
            .ok_or(StakingError::NoDelegation)?;
        self.hooks()
            .before_delegation_shares_modified(ctx, delegator, operator)?;
        delegation.shares = delegation
            .shares
            .checked_sub(shares)
            .ok_or(StakingError::InsufficientShares)?;

        let mut validator = self.must_get_validator(ctx, operator)?;
        let is_validator_operator = *delegator == Address::from(*operator);
        if is_validator_operator
            && !validator.jailed
            && validator.tokens_from_shares_truncated(delegation.shares)?
                < validator.min_self_delegation
        {
            validator = self.jail_validator(ctx, validator)?;
        }

        if delegation.shares.is_zero() {
            self.remove_delegation(ctx, &delegation)?;
        } else {
            self.set_delegation(ctx, &delegation)?;
            self.hooks()
                .after_delegation_modified(ctx, delegator, operator)?;
        }

        let (validator, amount) = self.remove_validator_tokens_and_shares(ctx, validator, shares)?;
        if validator.delegator_shares.is_zero() && validator.is_unbonded() {
            self.remove_validator(ctx, operator)?;
        }
        Ok(amount)
    }

    /// Starts the unbonding of `shares`, returns the completion time of the new entry
    pub fn undelegate(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
        shares: Dec,
    ) -> StakingResult<BondingTime> {
        let validator = self.must_get_validator(ctx, operator)?;
        if self.has_max_unbonding_delegation_entries(ctx, delegator, operator)? {
            return Err(StakingError::MaxUnbondingDelegationEntries);
        }

        let amount = self.unbond(ctx, delegator, operator, shares)?;
        if validator.is_bonded() {
            self.bonded_tokens_to_not_bonded(ctx, amount)?;
        }

        let creation_height = ctx.block_height();
        let completion_time = ctx
            .block_time()
            .checked_add(self.config.unbonding_time)?;
        let ubd = self.set_unbonding_delegation_entry(
            ctx,
            delegator,
            operator,
            creation_height,
            completion_time,
            amount,
        )?;
        self.insert_ubd_queue(ctx, &ubd, completion_time)?;

        bonding_trace!("staking.undelegate", {
            "delegator": delegator.to_string(),
            "validator": operator.to_string(),
            "shares": shares.to_string(),
            "amount": amount.to_string(),
            "completion_time": completion_time.to_millis()
        });
        Ok(completion_time)
    }

    /// Pays out the mature entries of an unbonding delegation, returns the paid amount
    pub fn complete_unbonding(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<Amount> {
        let mut ubd = self
            .get_unbonding_delegation(ctx, delegator, operator)?
            .ok_or(StakingError::NoUnbondingDelegation)?;
        let now = ctx.block_time();
        let (mature, pending): (Vec<_>, Vec<_>) =
            ubd.entries.into_iter().partition(|entry| entry.is_mature(now));
        ubd.entries = pending;

        let mut released = Amount::zero();
        for entry in mature {
            if entry.balance.is_zero() {
                continue;
            }
            self.bank.send_coins_from_module_to_account(
                ctx,
                NOT_BONDED_POOL_NAME,
                delegator,
                entry.balance,
            )?;
            released = released.checked_add(entry.balance).ok_or_else(|| {
                StakingError::Invariant("released amount overflow".to_string())
            })?;
        }

        if ubd.entries.is_empty() {
            self.remove_unbonding_delegation(ctx, &ubd);
        } else {
            self.set_unbonding_delegation(ctx, &ubd)?;
        }

        bonding_trace!("staking.complete_unbonding", {
            "delegator": delegator.to_string(),
            "validator": operator.to_string(),
            "amount": released.to_string()
        });
        Ok(released)
    }

    /// Shares to remove for undelegating `amount` tokens, capped at the delegation shares
    pub fn validate_unbond_amount(
        &self,
        ctx: &ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
        amount: Amount,
    ) -> StakingResult<Dec> {
        let validator = self.must_get_validator(ctx, operator)?;
        let delegation = self
            .get_delegation(ctx, delegator, operator)?
            .ok_or(StakingError::NoDelegation)?;
        let shares = validator.shares_from_tokens(amount)?;
        let shares_truncated = validator.shares_from_tokens_truncated(amount)?;
        if shares_truncated > delegation.shares {
            return Err(StakingError::BadSharesAmount);
        }
        Ok(shares.min(delegation.shares))
    }
}
