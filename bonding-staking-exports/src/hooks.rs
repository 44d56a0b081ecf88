// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Observers of the staking state transitions.
//!
//! Hooks run synchronously inside the operation that fires them, on the same
//! `ExecutionContext`: their writes belong to the same message, and an error returned by a
//! hook aborts it like any other staking error.

use crate::context::ExecutionContext;
use crate::error::StakingResult;
use crate::types::Validator;
use bonding_models::{Address, ConsensusAddress, Dec, ValidatorAddress};

/// Callbacks fired by the staking state. Every method defaults to a no-op.
#[cfg_attr(any(test, feature = "test-exports"), mockall::automock)]
pub trait StakingHooks: Send + Sync {
    /// a validator record was created
    fn after_validator_created(
        &self,
        _ctx: &mut ExecutionContext,
        _validator: &Validator,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// a validator record was deleted
    fn after_validator_removed(
        &self,
        _ctx: &mut ExecutionContext,
        _cons_addr: &ConsensusAddress,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// a validator entered the active set
    fn after_validator_bonded(
        &self,
        _ctx: &mut ExecutionContext,
        _cons_addr: &ConsensusAddress,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// a validator left the active set
    fn after_validator_begin_unbonding(
        &self,
        _ctx: &mut ExecutionContext,
        _cons_addr: &ConsensusAddress,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// a delegation is about to be created
    fn before_delegation_created(
        &self,
        _ctx: &mut ExecutionContext,
        _delegator: &Address,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// the shares of an existing delegation are about to change
    fn before_delegation_shares_modified(
        &self,
        _ctx: &mut ExecutionContext,
        _delegator: &Address,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// a delegation is about to be deleted
    fn before_delegation_removed(
        &self,
        _ctx: &mut ExecutionContext,
        _delegator: &Address,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// the shares of a delegation changed
    fn after_delegation_modified(
        &self,
        _ctx: &mut ExecutionContext,
        _delegator: &Address,
        _operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        Ok(())
    }

    /// a validator is about to be slashed by `fraction`
    fn before_validator_slashed(
        &self,
        _ctx: &mut ExecutionContext,
        _operator: &ValidatorAddress,
        _fraction: Dec,
    ) -> StakingResult<()> {
        Ok(())
    }
}

/// Several hooks fired in registration order, the first error stops the chain
#[derive(Default)]
pub struct MultiStakingHooks(Vec<Box<dyn StakingHooks>>);

impl MultiStakingHooks {
    /// Combines `hooks`
    pub fn new(hooks: Vec<Box<dyn StakingHooks>>) -> Self {
        Self(hooks)
    }
}

impl StakingHooks for MultiStakingHooks {
    fn after_validator_created(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.after_validator_created(ctx, validator)?;
        }
        Ok(())
    }

    fn after_validator_removed(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.after_validator_removed(ctx, cons_addr, operator)?;
        }
        Ok(())
    }

    fn after_validator_bonded(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.after_validator_bonded(ctx, cons_addr, operator)?;
        }
        Ok(())
    }

    fn after_validator_begin_unbonding(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.after_validator_begin_unbonding(ctx, cons_addr, operator)?;
        }
        Ok(())
    }

    fn before_delegation_created(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.before_delegation_created(ctx, delegator, operator)?;
        }
        Ok(())
    }

    fn before_delegation_shares_modified(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.before_delegation_shares_modified(ctx, delegator, operator)?;
        }
        Ok(())
    }

    fn before_delegation_removed(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.before_delegation_removed(ctx, delegator, operator)?;
        }
        Ok(())
    }

    fn after_delegation_modified(
        &self,
        ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.after_delegation_modified(ctx, delegator, operator)?;
        }
        Ok(())
    }

    fn before_validator_slashed(
        &self,
        ctx: &mut ExecutionContext,
        operator: &ValidatorAddress,
        fraction: Dec,
    ) -> StakingResult<()> {
        for hooks in &self.0 {
            hooks.before_validator_slashed(ctx, operator, fraction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonding_db_exports::{DBConfig, DBController};
    use bonding_db_worker::BondingDB;
    use bonding_models::BlockHeader;
    use bonding_time::BondingTime;
    use parking_lot::RwLock;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_multi_hooks_stop_at_first_error() {
        let temp_dir = tempdir().expect("Unable to create a temp folder");
        let db = BondingDB::new(DBConfig {
            path: temp_dir.path().to_path_buf(),
            max_history_length: 10,
        })
        .unwrap();
        let db = Arc::new(RwLock::new(Box::new(db) as Box<dyn DBController>));
        let mut ctx = ExecutionContext::new(BlockHeader::new(1, BondingTime::from_millis(0)), db);

        let mut first = MockStakingHooks::new();
        first
            .expect_before_delegation_created()
            .times(1)
            .returning(|_, _, _| Err(crate::StakingError::InsufficientShares));
        let mut second = MockStakingHooks::new();
        second.expect_before_delegation_created().times(0);

        let hooks = MultiStakingHooks::new(vec![Box::new(first), Box::new(second)]);
        let delegator = Address::from_module_name("delegator");
        let operator = ValidatorAddress::from(Address::from_module_name("operator"));
        assert!(hooks
            .before_delegation_created(&mut ctx, &delegator, &operator)
            .is_err());
    }
}
