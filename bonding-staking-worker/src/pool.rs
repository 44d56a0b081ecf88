// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Pool accountant: the bonded and not-bonded module accounts.

use crate::state::StakingState;
use bonding_models::constants::{BONDED_POOL_NAME, NOT_BONDED_POOL_NAME};
use bonding_models::{Address, Amount, BondStatus};
use bonding_staking_exports::{ExecutionContext, StakingResult};

impl StakingState {
    /// Tokens backing bonded validators
    pub fn get_bonded_pool(&self, ctx: &ExecutionContext) -> StakingResult<Amount> {
        self.bank
            .get_balance(ctx, &Address::from_module_name(BONDED_POOL_NAME))
    }

    /// Tokens backing unbonding and unbonded validators and pending undelegations
    pub fn get_not_bonded_pool(&self, ctx: &ExecutionContext) -> StakingResult<Amount> {
        self.bank
            .get_balance(ctx, &Address::from_module_name(NOT_BONDED_POOL_NAME))
    }

    pub(crate) fn bonded_tokens_to_not_bonded(
        &self,
        ctx: &mut ExecutionContext,
        amount: Amount,
    ) -> StakingResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.bank.send_coins_from_module_to_module(
            ctx,
            BONDED_POOL_NAME,
            NOT_BONDED_POOL_NAME,
            amount,
        )
    }

    pub(crate) fn not_bonded_tokens_to_bonded(
        &self,
        ctx: &mut ExecutionContext,
        amount: Amount,
    ) -> StakingResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        self.bank.send_coins_from_module_to_module(
            ctx,
            NOT_BONDED_POOL_NAME,
            BONDED_POOL_NAME,
            amount,
        )
    }

    /// Burns `amount` from the pool holding the tokens of a validator with `status`
    pub(crate) fn burn_validator_tokens(
        &self,
        ctx: &mut ExecutionContext,
        status: BondStatus,
        amount: Amount,
    ) -> StakingResult<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let pool = match status {
            BondStatus::Bonded => BONDED_POOL_NAME,
            BondStatus::Unbonding | BondStatus::Unbonded => NOT_BONDED_POOL_NAME,
        };
        self.bank.burn_coins(ctx, pool, amount)
    }
}
