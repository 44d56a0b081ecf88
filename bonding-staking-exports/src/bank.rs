// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Coin movements used by the staking state.
//!
//! Pools are module accounts: their balance is the pool total. Every transfer debits and
//! credits in the same call, so value only disappears through `burn_coins`.

use crate::context::ExecutionContext;
use crate::error::{StakingError, StakingResult};
use crate::keys::balance_key;
use bonding_db_exports::{BALANCE_DESER_ERROR, BALANCE_SER_ERROR};
use bonding_models::{Address, Amount, AmountDeserializer, AmountSerializer};

/// interface of the balances kept outside of the staking records
pub trait BankController: Send + Sync {
    /// Spendable balance of `address`, zero when unknown
    fn get_balance(&self, ctx: &ExecutionContext, address: &Address) -> StakingResult<Amount>;

    /// Moves `amount` from an account to a module account.
    /// Fails with `InsufficientFunds` when the account cannot pay.
    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut ExecutionContext,
        sender: &Address,
        recipient_module: &str,
        amount: Amount,
    ) -> StakingResult<()>;

    /// Moves `amount` from a module account to an account
    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut ExecutionContext,
        sender_module: &str,
        recipient: &Address,
        amount: Amount,
    ) -> StakingResult<()>;

    /// Moves `amount` between two module accounts
    fn send_coins_from_module_to_module(
        &self,
        ctx: &mut ExecutionContext,
        sender_module: &str,
        recipient_module: &str,
        amount: Amount,
    ) -> StakingResult<()>;

    /// Destroys `amount` held by a module account
    fn burn_coins(
        &self,
        ctx: &mut ExecutionContext,
        module: &str,
        amount: Amount,
    ) -> StakingResult<()>;

    /// Creates `amount` on an account, used for initial balances
    fn mint_coins(
        &self,
        ctx: &mut ExecutionContext,
        recipient: &Address,
        amount: Amount,
    ) -> StakingResult<()>;
}

/// `BankController` keeping balances in the state store under `bank/balances/`
#[derive(Default, Clone)]
pub struct LedgerBank {
    amount_serializer: AmountSerializer,
    amount_deserializer: AmountDeserializer,
}

impl LedgerBank {
    /// Creates a `LedgerBank`
    pub fn new() -> Self {
        Self {
            amount_serializer: AmountSerializer::new(),
            amount_deserializer: AmountDeserializer::default(),
        }
    }

    fn set_balance(
        &self,
        ctx: &mut ExecutionContext,
        address: &Address,
        amount: Amount,
    ) -> StakingResult<()> {
        if amount.is_zero() {
            ctx.tx.delete(balance_key(address));
            return Ok(());
        }
        ctx.put_encoded(
            balance_key(address),
            &amount,
            &self.amount_serializer,
            BALANCE_SER_ERROR,
        )
    }

    fn add_balance(
        &self,
        ctx: &mut ExecutionContext,
        address: &Address,
        amount: Amount,
    ) -> StakingResult<()> {
        let balance = self
            .get_balance(ctx, address)?
            .checked_add(amount)
            .ok_or_else(|| StakingError::Invariant(format!("balance overflow on {}", address)))?;
        self.set_balance(ctx, address, balance)
    }

    fn sub_balance(
        &self,
        ctx: &mut ExecutionContext,
        address: &Address,
        amount: Amount,
    ) -> StakingResult<()> {
        let balance = self.get_balance(ctx, address)?;
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            StakingError::InsufficientFunds(format!(
                "{} holds {} but {} is required",
                address, balance, amount
            ))
        })?;
        self.set_balance(ctx, address, remaining)
    }

    /// module accounts are never short of funds unless the state is broken
    fn sub_module_balance(
        &self,
        ctx: &mut ExecutionContext,
        module: &str,
        amount: Amount,
    ) -> StakingResult<()> {
        self.sub_balance(ctx, &Address::from_module_name(module), amount)
            .map_err(|err| match err {
                StakingError::InsufficientFunds(msg) => {
                    StakingError::Invariant(format!("module {}: {}", module, msg))
                }
                err => err,
            })
    }
}

impl BankController for LedgerBank {
    fn get_balance(&self, ctx: &ExecutionContext, address: &Address) -> StakingResult<Amount> {
        Ok(ctx
            .get_decoded(
                &balance_key(address),
                &self.amount_deserializer,
                BALANCE_DESER_ERROR,
            )?
            .unwrap_or_default())
    }

    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut ExecutionContext,
        sender: &Address,
        recipient_module: &str,
        amount: Amount,
    ) -> StakingResult<()> {
        self.sub_balance(ctx, sender, amount)?;
        self.add_balance(ctx, &Address::from_module_name(recipient_module), amount)
    }

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut ExecutionContext,
        sender_module: &str,
        recipient: &Address,
        amount: Amount,
    ) -> StakingResult<()> {
        self.sub_module_balance(ctx, sender_module, amount)?;
        self.add_balance(ctx, recipient, amount)
    }

    fn send_coins_from_module_to_module(
        &self,
        ctx: &mut ExecutionContext,
        sender_module: &str,
        recipient_module: &str,
        amount: Amount,
    ) -> StakingResult<()> {
        self.sub_module_balance(ctx, sender_module, amount)?;
        self.add_balance(ctx, &Address::from_module_name(recipient_module), amount)
    }

    fn burn_coins(
        &self,
        ctx: &mut ExecutionContext,
        module: &str,
        amount: Amount,
    ) -> StakingResult<()> {
        self.sub_module_balance(ctx, module, amount)
    }

    fn mint_coins(
        &self,
        ctx: &mut ExecutionContext,
        recipient: &Address,
        amount: Amount,
    ) -> StakingResult<()> {
        self.add_balance(ctx, recipient, amount)
    }
}
