// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::{ExecutionContext, StakingHooks, StakingResult, Validator};
use bonding_models::{Address, ConsensusAddress, Dec, ValidatorAddress};
use std::sync::{Arc, Mutex};

/// A hook call seen by `RecordingHooks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    /// `after_validator_created`
    ValidatorCreated(ValidatorAddress),
    /// `after_validator_removed`
    ValidatorRemoved(ValidatorAddress),
    /// `after_validator_bonded`
    ValidatorBonded(ValidatorAddress),
    /// `after_validator_begin_unbonding`
    ValidatorBeginUnbonding(ValidatorAddress),
    /// `before_delegation_created`
    DelegationCreated(Address, ValidatorAddress),
    /// `before_delegation_shares_modified`
    DelegationSharesModified(Address, ValidatorAddress),
    /// `before_delegation_removed`
    DelegationRemoved(Address, ValidatorAddress),
    /// `after_delegation_modified`
    DelegationModified(Address, ValidatorAddress),
    /// `before_validator_slashed`
    ValidatorSlashed(ValidatorAddress, Dec),
}

/// Hooks that record every call, in order, in a shared list
#[derive(Clone, Default)]
pub struct RecordingHooks {
    events: Arc<Mutex<Vec<HookEvent>>>,
}

impl RecordingHooks {
    /// Creates the hooks and the handle on their event list
    pub fn new() -> (Self, Arc<Mutex<Vec<HookEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }

    fn record(&self, event: HookEvent) -> StakingResult<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        Ok(())
    }
}

impl StakingHooks for RecordingHooks {
    fn after_validator_created(
        &self,
        _ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        self.record(HookEvent::ValidatorCreated(validator.operator_address))
    }

    fn after_validator_removed(
        &self,
        _ctx: &mut ExecutionContext,
        _cons_addr: &ConsensusAddress,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::ValidatorRemoved(*operator))
    }

    fn after_validator_bonded(
        &self,
        _ctx: &mut ExecutionContext,
        _cons_addr: &ConsensusAddress,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::ValidatorBonded(*operator))
    }

    fn after_validator_begin_unbonding(
        &self,
        _ctx: &mut ExecutionContext,
        _cons_addr: &ConsensusAddress,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::ValidatorBeginUnbonding(*operator))
    }

    fn before_delegation_created(
        &self,
        _ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::DelegationCreated(*delegator, *operator))
    }

    fn before_delegation_shares_modified(
        &self,
        _ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::DelegationSharesModified(*delegator, *operator))
    }

    fn before_delegation_removed(
        &self,
        _ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::DelegationRemoved(*delegator, *operator))
    }

    fn after_delegation_modified(
        &self,
        _ctx: &mut ExecutionContext,
        delegator: &Address,
        operator: &ValidatorAddress,
    ) -> StakingResult<()> {
        self.record(HookEvent::DelegationModified(*delegator, *operator))
    }

    fn before_validator_slashed(
        &self,
        _ctx: &mut ExecutionContext,
        operator: &ValidatorAddress,
        fraction: Dec,
    ) -> StakingResult<()> {
        self.record(HookEvent::ValidatorSlashed(*operator, fraction))
    }
}
