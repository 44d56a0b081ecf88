// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::config::{SlashingConfig, DOUBLE_SIGN_JAIL_END_TIME};
use crate::error::{SlashingError, SlashingResult};
use crate::evidence::Evidence;
use crate::records::SlashingRecords;
use crate::signing_info::SigningInfo;
use bonding_logging::bonding_trace;
use bonding_models::{Address, ConsensusAddress, ValidatorAddress};
use bonding_staking_exports::ExecutionContext;
use bonding_staking_worker::StakingState;
use tracing::{debug, info};

/// Slashing logic, working on the staking state handed to each call
pub struct SlashingState {
    /// slashing parameters
    pub config: SlashingConfig,
    records: SlashingRecords,
}

impl SlashingState {
    /// Creates the slashing logic
    pub fn new(config: SlashingConfig) -> Self {
        Self {
            config,
            records: SlashingRecords::new(),
        }
    }

    /// Store access to the slashing records
    pub fn records(&self) -> &SlashingRecords {
        &self.records
    }

    /// Signing info of `cons_addr`
    pub fn get_signing_info(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> SlashingResult<Option<SigningInfo>> {
        Ok(self.records.get_signing_info(ctx, cons_addr)?)
    }

    /// Whether `cons_addr` was tombstoned
    pub fn is_tombstoned(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> SlashingResult<bool> {
        Ok(self
            .records
            .get_signing_info(ctx, cons_addr)?
            .map(|info| info.tombstoned)
            .unwrap_or(false))
    }

    /// Punishes a double sign: slash, jail forever and tombstone.
    ///
    /// Evidence that cannot be acted upon is dropped without error: unknown key, too old,
    /// validator missing or unbonded, validator already tombstoned.
    pub fn handle_double_sign(
        &self,
        staking: &StakingState,
        ctx: &mut ExecutionContext,
        evidence: &Evidence,
    ) -> SlashingResult<()> {
        let cons_addr = evidence.consensus_address;
        if self.records.get_pubkey(ctx, &cons_addr)?.is_none() {
            info!(
                "ignored double sign evidence: no public key registered for {}",
                cons_addr
            );
            return Ok(());
        }

        let age = ctx.block_time().saturating_sub(evidence.time);
        if age > self.config.max_evidence_age {
            info!(
                "ignored double sign evidence of {}: infraction at {} is older than {} ms",
                cons_addr,
                evidence.time,
                self.config.max_evidence_age.to_millis()
            );
            return Ok(());
        }

        let validator = match staking.get_validator_by_cons_addr(ctx, &cons_addr)? {
            Some(validator) if !validator.is_unbonded() => validator,
            _ => {
                info!(
                    "ignored double sign evidence of {}: validator missing or unbonded",
                    cons_addr
                );
                return Ok(());
            }
        };

        let mut signing_info = self
            .records
            .get_signing_info(ctx, &cons_addr)?
            .ok_or_else(|| {
                SlashingError::Invariant(format!(
                    "expected signing info for validator {} but not found",
                    cons_addr
                ))
            })?;
        if signing_info.tombstoned {
            info!(
                "ignored double sign evidence of {}: validator already tombstoned",
                cons_addr
            );
            return Ok(());
        }

        // power changes reach consensus one block late
        let distribution_height =
            evidence.height as i64 - self.config.validator_update_delay as i64;
        let fraction = self.config.slash_fraction_double_sign;
        let burned = staking.slash(ctx, &cons_addr, distribution_height, evidence.power, fraction)?;
        if !validator.jailed {
            staking.jail(ctx, &cons_addr)?;
        }
        signing_info.jailed_until = DOUBLE_SIGN_JAIL_END_TIME;
        signing_info.tombstoned = true;
        self.records
            .set_signing_info(ctx, &cons_addr, &signing_info)?;

        info!(
            "validator {} tombstoned for double signing at height {}",
            validator.operator_address, evidence.height
        );
        bonding_trace!("slashing.double_sign", {
            "validator": validator.operator_address.to_string(),
            "consensus_address": cons_addr.to_string(),
            "infraction_height": evidence.height,
            "distribution_height": distribution_height,
            "power": evidence.power,
            "burned": burned.to_string()
        });
        Ok(())
    }

    /// Lets a jailed validator back into the active set once its jail time is over and its
    /// self delegation meets the minimum again
    pub fn unjail(
        &self,
        staking: &StakingState,
        ctx: &mut ExecutionContext,
        operator: &ValidatorAddress,
    ) -> SlashingResult<()> {
        let validator = staking
            .get_validator(ctx, operator)?
            .ok_or(SlashingError::NoValidator(*operator))?;
        let self_delegation = staking
            .get_delegation(ctx, &Address::from(*operator), operator)?
            .ok_or(SlashingError::MissingSelfDelegation)?;
        let tokens = validator.tokens_from_shares_truncated(self_delegation.shares)?;
        if tokens < validator.min_self_delegation {
            return Err(SlashingError::SelfDelegationTooLow(
                tokens.to_string(),
                validator.min_self_delegation.to_string(),
            ));
        }
        if !validator.jailed {
            return Err(SlashingError::NotJailed);
        }

        let cons_addr = validator.consensus_address();
        if let Some(signing_info) = self.records.get_signing_info(ctx, &cons_addr)? {
            if signing_info.tombstoned {
                return Err(SlashingError::ValidatorTombstoned);
            }
            if ctx.block_time() < signing_info.jailed_until {
                return Err(SlashingError::JailedUntilNotPassed(
                    signing_info.jailed_until.format_instant(),
                ));
            }
        }

        staking.unjail(ctx, &cons_addr)?;
        debug!("validator {} unjailed by its operator", operator);
        Ok(())
    }
}
