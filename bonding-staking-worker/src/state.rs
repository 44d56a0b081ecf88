// Copyright (c) 2022 MASSA LABS <info@massa.net>

use bonding_models::{ValidatorAddressDeserializer, ValidatorAddressSerializer};
use bonding_serialization::{U64VarIntDeserializer, U64VarIntSerializer};
use bonding_staking_exports::{
    BankController, DVPairsDeserializer, DVPairsSerializer, DelegationDeserializer,
    DelegationSerializer, ExecutionContext, HistoricalInfoDeserializer, HistoricalInfoSerializer,
    StakingConfig, StakingError, StakingHooks, StakingResult, UnbondingDelegationDeserializer,
    UnbondingDelegationSerializer, ValidatorAddressesDeserializer, ValidatorAddressesSerializer,
    ValidatorDeserializer, ValidatorSerializer, ValidatorUpdate,
    MAX_HISTORICAL_VALIDATORS_LENGTH, MAX_UNBONDING_ENTRIES_LENGTH,
};
use std::ops::Bound::Included;
use tracing::debug;

struct NoHooks;

impl StakingHooks for NoHooks {}

/// Staking state logic. The records themselves live in the store behind each
/// `ExecutionContext`, this struct only holds the parameters and the collaborators.
pub struct StakingState {
    /// staking parameters
    pub config: StakingConfig,
    pub(crate) bank: Box<dyn BankController>,
    hooks: Option<Box<dyn StakingHooks>>,
    pub(crate) validator_serializer: ValidatorSerializer,
    pub(crate) validator_deserializer: ValidatorDeserializer,
    pub(crate) operator_serializer: ValidatorAddressSerializer,
    pub(crate) operator_deserializer: ValidatorAddressDeserializer,
    pub(crate) delegation_serializer: DelegationSerializer,
    pub(crate) delegation_deserializer: DelegationDeserializer,
    pub(crate) ubd_serializer: UnbondingDelegationSerializer,
    pub(crate) ubd_deserializer: UnbondingDelegationDeserializer,
    pub(crate) dv_pairs_serializer: DVPairsSerializer,
    pub(crate) dv_pairs_deserializer: DVPairsDeserializer,
    pub(crate) operators_serializer: ValidatorAddressesSerializer,
    pub(crate) operators_deserializer: ValidatorAddressesDeserializer,
    pub(crate) historical_serializer: HistoricalInfoSerializer,
    pub(crate) historical_deserializer: HistoricalInfoDeserializer,
    pub(crate) u64_serializer: U64VarIntSerializer,
    pub(crate) u64_deserializer: U64VarIntDeserializer,
}

impl StakingState {
    /// Creates the staking state logic on top of `bank`
    pub fn new(config: StakingConfig, bank: Box<dyn BankController>) -> Self {
        Self {
            config,
            bank,
            hooks: None,
            validator_serializer: ValidatorSerializer::new(),
            validator_deserializer: ValidatorDeserializer::new(),
            operator_serializer: ValidatorAddressSerializer::new(),
            operator_deserializer: ValidatorAddressDeserializer::new(),
            delegation_serializer: DelegationSerializer::new(),
            delegation_deserializer: DelegationDeserializer::new(),
            ubd_serializer: UnbondingDelegationSerializer::new(),
            ubd_deserializer: UnbondingDelegationDeserializer::new(MAX_UNBONDING_ENTRIES_LENGTH),
            dv_pairs_serializer: DVPairsSerializer::new(),
            dv_pairs_deserializer: DVPairsDeserializer::new(),
            operators_serializer: ValidatorAddressesSerializer::new(),
            operators_deserializer: ValidatorAddressesDeserializer::new(),
            historical_serializer: HistoricalInfoSerializer::new(),
            historical_deserializer: HistoricalInfoDeserializer::new(
                MAX_HISTORICAL_VALIDATORS_LENGTH,
            ),
            u64_serializer: U64VarIntSerializer::new(),
            u64_deserializer: U64VarIntDeserializer::new(Included(0), Included(u64::MAX)),
        }
    }

    /// Registers the hooks. They can only be set once.
    pub fn set_hooks(&mut self, hooks: Box<dyn StakingHooks>) -> StakingResult<()> {
        if self.hooks.is_some() {
            return Err(StakingError::HooksAlreadySet);
        }
        self.hooks = Some(hooks);
        Ok(())
    }

    pub(crate) fn hooks(&self) -> &dyn StakingHooks {
        match &self.hooks {
            Some(hooks) => hooks.as_ref(),
            None => &NoHooks,
        }
    }

    /// End of block processing: active set update, then validators and undelegations
    /// whose unbonding period is over.
    pub fn end_block(&self, ctx: &mut ExecutionContext) -> StakingResult<Vec<ValidatorUpdate>> {
        let updates = self.apply_and_return_validator_set_updates(ctx)?;
        self.unbond_all_mature_validators(ctx)?;
        let paid = self.complete_all_mature_unbondings(ctx)?;
        debug!(
            "staking end block {}: {} validator updates, {} unbondings completed",
            ctx.block_height(),
            updates.len(),
            paid
        );
        Ok(updates)
    }
}
