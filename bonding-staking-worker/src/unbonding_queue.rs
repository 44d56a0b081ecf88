// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Time-bucketed queues of the undelegations and of the validators waiting for the end of
//! their unbonding period. Buckets are keyed by big-endian completion time, so a forward
//! range scan visits them in chronological order.

use crate::state::StakingState;
use bonding_db_exports::{QUEUE_DESER_ERROR, QUEUE_SER_ERROR};
use bonding_models::{BondStatus, ValidatorAddress};
use bonding_staking_exports::keys::{unbonding_queue_key, validator_queue_key};
use bonding_staking_exports::{
    decode, DVPair, ExecutionContext, StakingError, StakingResult, UnbondingDelegation, Validator,
};
use bonding_time::BondingTime;
use tracing::{debug, warn};

impl StakingState {
    /// Pairs whose undelegations complete at `time`
    pub fn get_ubd_queue_time_slice(
        &self,
        ctx: &ExecutionContext,
        time: BondingTime,
    ) -> StakingResult<Vec<DVPair>> {
        Ok(ctx
            .get_decoded(
                &unbonding_queue_key(time),
                &self.dv_pairs_deserializer,
                QUEUE_DESER_ERROR,
            )?
            .unwrap_or_default())
    }

    /// Appends the pair of `ubd` to the bucket of `completion_time`
    pub fn insert_ubd_queue(
        &self,
        ctx: &mut ExecutionContext,
        ubd: &UnbondingDelegation,
        completion_time: BondingTime,
    ) -> StakingResult<()> {
        let mut bucket = self.get_ubd_queue_time_slice(ctx, completion_time)?;
        bucket.push(DVPair {
            delegator_address: ubd.delegator_address,
            validator_address: ubd.validator_address,
        });
        ctx.put_encoded(
            unbonding_queue_key(completion_time),
            &bucket,
            &self.dv_pairs_serializer,
            QUEUE_SER_ERROR,
        )
    }

    /// Removes every bucket up to `current_time` included and returns their pairs, oldest
    /// bucket first
    pub fn dequeue_all_mature_ubd_queue(
        &self,
        ctx: &mut ExecutionContext,
        current_time: BondingTime,
    ) -> StakingResult<Vec<DVPair>> {
        let mut mature = Vec::new();
        let buckets = ctx.tx.range_entries(
            &unbonding_queue_key(BondingTime::from_millis(0)),
            &unbonding_queue_key(current_time),
        )?;
        for (key, value) in buckets {
            let pairs: Vec<DVPair> =
                decode(&value, &self.dv_pairs_deserializer, QUEUE_DESER_ERROR)?;
            mature.extend(pairs);
            ctx.tx.delete(key);
        }
        Ok(mature)
    }

    /// Pays out every undelegation whose completion time has passed, returns the number of
    /// pairs processed. A pair whose record is gone is skipped.
    pub(crate) fn complete_all_mature_unbondings(
        &self,
        ctx: &mut ExecutionContext,
    ) -> StakingResult<usize> {
        let now = ctx.block_time();
        let mature = self.dequeue_all_mature_ubd_queue(ctx, now)?;
        let mut completed = 0;
        for pair in mature {
            match self.complete_unbonding(ctx, &pair.delegator_address, &pair.validator_address) {
                Ok(_) => completed += 1,
                Err(err) if !err.is_fatal() => {
                    warn!(
                        "skipping unbonding of ({}, {}): {}",
                        pair.delegator_address, pair.validator_address, err
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(completed)
    }

    /// Validators whose unbonding completes at `time`
    pub fn get_validator_queue_time_slice(
        &self,
        ctx: &ExecutionContext,
        time: BondingTime,
    ) -> StakingResult<Vec<ValidatorAddress>> {
        Ok(ctx
            .get_decoded(
                &validator_queue_key(time),
                &self.operators_deserializer,
                QUEUE_DESER_ERROR,
            )?
            .unwrap_or_default())
    }

    fn set_validator_queue_time_slice(
        &self,
        ctx: &mut ExecutionContext,
        time: BondingTime,
        operators: Vec<ValidatorAddress>,
    ) -> StakingResult<()> {
        if operators.is_empty() {
            ctx.tx.delete(validator_queue_key(time));
            return Ok(());
        }
        ctx.put_encoded(
            validator_queue_key(time),
            &operators,
            &self.operators_serializer,
            QUEUE_SER_ERROR,
        )
    }

    /// Queues `validator` at its unbonding time
    pub(crate) fn insert_unbonding_validator_queue(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        let mut operators = self.get_validator_queue_time_slice(ctx, validator.unbonding_time)?;
        operators.push(validator.operator_address);
        self.set_validator_queue_time_slice(ctx, validator.unbonding_time, operators)
    }

    /// Takes `validator` out of the bucket of its unbonding time, if queued
    pub(crate) fn delete_validator_queue(
        &self,
        ctx: &mut ExecutionContext,
        validator: &Validator,
    ) -> StakingResult<()> {
        let mut operators = self.get_validator_queue_time_slice(ctx, validator.unbonding_time)?;
        operators.retain(|operator| *operator != validator.operator_address);
        self.set_validator_queue_time_slice(ctx, validator.unbonding_time, operators)
    }

    /// Completes the unbonding of every validator whose unbonding time has passed. Those
    /// left without delegator shares are removed.
    pub fn unbond_all_mature_validators(&self, ctx: &mut ExecutionContext) -> StakingResult<()> {
        let buckets = ctx.tx.range_entries(
            &validator_queue_key(BondingTime::from_millis(0)),
            &validator_queue_key(ctx.block_time()),
        )?;
        for (key, value) in buckets {
            let operators: Vec<ValidatorAddress> =
                decode(&value, &self.operators_deserializer, QUEUE_DESER_ERROR)?;
            for operator in operators {
                let mut validator = self.get_validator(ctx, &operator)?.ok_or_else(|| {
                    StakingError::Invariant(format!(
                        "validator {} in the unbonding queue was not found",
                        operator
                    ))
                })?;
                if !validator.is_unbonding() {
                    return Err(StakingError::Invariant(format!(
                        "validator {} in the unbonding queue is {}",
                        operator, validator.status
                    )));
                }
                validator.status = BondStatus::Unbonded;
                self.set_validator(ctx, &validator)?;
                debug!("validator {} unbonded", operator);
                if validator.delegator_shares.is_zero() {
                    self.remove_validator(ctx, &operator)?;
                }
            }
            ctx.tx.delete(key);
        }
        Ok(())
    }
}

