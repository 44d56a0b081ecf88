// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Block lifecycle on top of the staking and slashing state.
//!
//! A block is executed in a single `ExecutionContext`. Messages run inside a savepoint so
//! that a rejected message leaves no trace. A fatal error poisons the block: every later
//! call fails and `commit` drops the pending writes.

use crate::config::FinalStateConfig;
use crate::error::{FinalStateError, FinalStateResult};
use crate::message::{Message, MessageOutcome};
use bonding_db_exports::{
    ShareableDBController, HEADER_DESER_ERROR, HEADER_SER_ERROR, LAST_HEADER_KEY,
};
use bonding_models::{
    Address, Amount, BlockHeader, BlockHeaderDeserializer, BlockHeaderSerializer, BondStatus,
};
use bonding_slashing::{Evidence, SlashingHooks, SlashingState};
use bonding_staking_exports::{
    BankController, ExecutionContext, LedgerBank, MultiStakingHooks, StakingError, StakingHooks,
    ValidatorUpdate, MAX_HISTORICAL_VALIDATORS_LENGTH, MAX_UNBONDING_ENTRIES_LENGTH,
};
use bonding_staking_worker::StakingState;
use bonding_time::BondingTime;
use tracing::{debug, info, warn};

struct PendingBlock {
    ctx: ExecutionContext,
    poisoned: Option<String>,
}

impl PendingBlock {
    /// Records a fatal error, which is handed back to the caller
    fn poison(&mut self, err: FinalStateError) -> FinalStateError {
        warn!("block {} poisoned: {}", self.ctx.block_height(), err);
        self.poisoned = Some(err.to_string());
        err
    }

    fn check_poisoned(&self) -> FinalStateResult<()> {
        match &self.poisoned {
            Some(reason) => Err(FinalStateError::BlockPoisoned(reason.clone())),
            None => Ok(()),
        }
    }
}

/// Represents a final state: the staking and slashing state at the last committed block
pub struct FinalState {
    /// final state configuration
    pub config: FinalStateConfig,
    db: ShareableDBController,
    bank: LedgerBank,
    staking: StakingState,
    slashing: SlashingState,
    block: Option<PendingBlock>,
    last_header: BlockHeader,
}

impl FinalState {
    /// Initializes a new `FinalState` on top of `db`.
    ///
    /// `extra_hooks` are fired after the slashing hooks, in order.
    pub fn new(
        config: FinalStateConfig,
        db: ShareableDBController,
        extra_hooks: Vec<Box<dyn StakingHooks>>,
    ) -> FinalStateResult<Self> {
        // an undelegation must never mature in the block that created it
        if config.staking.unbonding_time == BondingTime::from_millis(0) {
            return Err(FinalStateError::SettingsError(
                "unbonding_time must be positive".to_string(),
            ));
        }
        if config.staking.max_entries > MAX_UNBONDING_ENTRIES_LENGTH {
            return Err(FinalStateError::SettingsError(format!(
                "max_entries must not exceed {}",
                MAX_UNBONDING_ENTRIES_LENGTH
            )));
        }
        if config.staking.max_validators > MAX_HISTORICAL_VALIDATORS_LENGTH {
            return Err(FinalStateError::SettingsError(format!(
                "max_validators must not exceed {}",
                MAX_HISTORICAL_VALIDATORS_LENGTH
            )));
        }
        let mut staking = StakingState::new(config.staking.clone(), Box::new(LedgerBank::new()));
        let mut hooks: Vec<Box<dyn StakingHooks>> = vec![Box::new(SlashingHooks::new())];
        hooks.extend(extra_hooks);
        staking.set_hooks(Box::new(MultiStakingHooks::new(hooks)))?;
        let slashing = SlashingState::new(config.slashing.clone());
        // the header is written along with each block, absent before the first commit
        let change_id = db.read().get_change_id()?;
        let ctx = ExecutionContext::new(
            BlockHeader::new(change_id, BondingTime::from_millis(0)),
            db.clone(),
        );
        let last_header = ctx
            .get_decoded(
                LAST_HEADER_KEY.as_bytes(),
                &BlockHeaderDeserializer::new(),
                HEADER_DESER_ERROR,
            )?
            .unwrap_or(ctx.header);
        Ok(FinalState {
            config,
            db,
            bank: LedgerBank::new(),
            staking,
            slashing,
            block: None,
            last_header,
        })
    }

    /// staking logic
    pub fn staking(&self) -> &StakingState {
        &self.staking
    }

    /// slashing logic
    pub fn slashing(&self) -> &SlashingState {
        &self.slashing
    }

    /// Height of the last committed block, 0 before the first one
    pub fn committed_height(&self) -> FinalStateResult<u64> {
        Ok(self.db.read().get_change_id()?)
    }

    /// Read access to the block in progress
    pub fn pending_context(&self) -> Option<&ExecutionContext> {
        self.block.as_ref().map(|block| &block.ctx)
    }

    /// Fresh context over the committed state, for queries between blocks.
    /// It carries the header of the last committed block.
    pub fn committed_context(&self) -> ExecutionContext {
        ExecutionContext::new(self.last_header, self.db.clone())
    }

    /// Spendable balance of `address` in `ctx`
    pub fn balance(&self, ctx: &ExecutionContext, address: &Address) -> FinalStateResult<Amount> {
        Ok(self.bank.get_balance(ctx, address)?)
    }

    /// Opens block `header`: credits the initial balances on the very first block, punishes
    /// the reported double signs, then records the historical info of the block.
    pub fn begin_block(
        &mut self,
        header: BlockHeader,
        evidence: &[Evidence],
    ) -> FinalStateResult<()> {
        if let Some(block) = &self.block {
            return Err(FinalStateError::BlockInProgress(block.ctx.block_height()));
        }
        let committed = self.committed_height()?;
        if header.height <= committed {
            return Err(FinalStateError::InvalidBlockHeight(header.height, committed));
        }

        let block = self.block.insert(PendingBlock {
            ctx: ExecutionContext::new(header, self.db.clone()),
            poisoned: None,
        });

        if committed == 0 {
            for initial in &self.config.initial_balances {
                self.bank
                    .mint_coins(&mut block.ctx, &initial.address, initial.amount)
                    .map_err(|err| block.poison(err.into()))?;
            }
            debug!(
                "{} initial balances credited",
                self.config.initial_balances.len()
            );
        }

        for item in evidence {
            block.ctx.tx.savepoint();
            match self
                .slashing
                .handle_double_sign(&self.staking, &mut block.ctx, item)
            {
                Ok(()) => block.ctx.tx.release_savepoint(),
                Err(err) if err.is_fatal() => return Err(block.poison(err.into())),
                Err(err) => {
                    block.ctx.tx.rollback_to_savepoint();
                    info!(
                        "evidence against {} rejected: {}",
                        item.consensus_address, err
                    );
                }
            }
        }

        self.staking
            .track_historical_info(&mut block.ctx)
            .map_err(|err| block.poison(err.into()))
    }

    /// Executes `message` in the block in progress.
    ///
    /// A rejected message is rolled back and its error returned, the block goes on. A fatal
    /// error poisons the block.
    pub fn deliver(&mut self, message: &Message) -> FinalStateResult<MessageOutcome> {
        let block = self
            .block
            .as_mut()
            .ok_or(FinalStateError::NoBlockInProgress)?;
        block.check_poisoned()?;

        block.ctx.tx.savepoint();
        match execute_message(&self.staking, &self.slashing, &mut block.ctx, message) {
            Ok(outcome) => {
                block.ctx.tx.release_savepoint();
                Ok(outcome)
            }
            Err(err) if err.is_fatal() => Err(block.poison(err)),
            Err(err) => {
                block.ctx.tx.rollback_to_savepoint();
                debug!("message rejected: {}", err);
                Err(err)
            }
        }
    }

    /// Closes the block in progress and returns the power changes of the active set
    pub fn end_block(&mut self) -> FinalStateResult<Vec<ValidatorUpdate>> {
        let block = self
            .block
            .as_mut()
            .ok_or(FinalStateError::NoBlockInProgress)?;
        block.check_poisoned()?;
        self.staking
            .end_block(&mut block.ctx)
            .map_err(|err| block.poison(err.into()))
    }

    /// Writes the block in progress atomically, with its height as change id.
    /// A poisoned block is dropped instead.
    pub fn commit(&mut self) -> FinalStateResult<u64> {
        let mut block = self
            .block
            .take()
            .ok_or(FinalStateError::NoBlockInProgress)?;
        block.check_poisoned()?;
        let header = block.ctx.header;
        block.ctx.put_encoded(
            LAST_HEADER_KEY.as_bytes().to_vec(),
            &header,
            &BlockHeaderSerializer::new(),
            HEADER_SER_ERROR,
        )?;
        block.ctx.tx.commit(header.height)?;
        self.last_header = header;
        debug!("block {} committed", header.height);
        Ok(header.height)
    }

    /// Drops the block in progress, no-op if there is none
    pub fn abort_block(&mut self) {
        if let Some(block) = self.block.take() {
            warn!("block {} aborted", block.ctx.block_height());
        }
    }
}

fn execute_message(
    staking: &StakingState,
    slashing: &SlashingState,
    ctx: &mut ExecutionContext,
    message: &Message,
) -> FinalStateResult<MessageOutcome> {
    match message {
        Message::CreateValidator {
            operator,
            consensus_pubkey,
            min_self_delegation,
            self_bond,
        } => {
            let shares = staking.create_validator(
                ctx,
                *operator,
                *consensus_pubkey,
                *min_self_delegation,
                *self_bond,
            )?;
            Ok(MessageOutcome::ValidatorCreated(shares))
        }
        Message::Delegate {
            delegator,
            validator,
            amount,
        } => {
            if amount.is_zero() {
                return Err(StakingError::InvalidDelegationAmount.into());
            }
            let target = staking.must_get_validator(ctx, validator)?;
            let shares =
                staking.delegate(ctx, *delegator, *amount, BondStatus::Unbonded, target, true)?;
            Ok(MessageOutcome::Delegated(shares))
        }
        Message::Undelegate {
            delegator,
            validator,
            amount,
        } => {
            if amount.is_zero() {
                return Err(StakingError::InvalidDelegationAmount.into());
            }
            let shares = staking.validate_unbond_amount(ctx, delegator, validator, *amount)?;
            let completion_time = staking.undelegate(ctx, delegator, validator, shares)?;
            Ok(MessageOutcome::Undelegated(completion_time))
        }
        Message::Unjail { operator } => {
            slashing.unjail(staking, ctx, operator)?;
            Ok(MessageOutcome::Unjailed)
        }
    }
}
