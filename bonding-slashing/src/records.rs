// Copyright (c) 2022 MASSA LABS <info@massa.net>

use crate::signing_info::{SigningInfo, SigningInfoDeserializer, SigningInfoSerializer};
use bonding_db_exports::{SIGNING_INFO_DESER_ERROR, SIGNING_INFO_SER_ERROR};
use bonding_models::ConsensusAddress;
use bonding_signature::{PublicKey, PublicKeyDeserializer, PublicKeySerializer};
use bonding_staking_exports::keys::{pubkey_key, signing_info_key};
use bonding_staking_exports::{ExecutionContext, StakingResult};

const PUBKEY_DESER_ERROR: &str = "critical: consensus public key deserialization failed";
const PUBKEY_SER_ERROR: &str = "critical: consensus public key serialization failed";

/// Store access to the signing infos and to the consensus public key registry
#[derive(Clone, Default)]
pub struct SlashingRecords {
    signing_info_serializer: SigningInfoSerializer,
    signing_info_deserializer: SigningInfoDeserializer,
    pubkey_serializer: PublicKeySerializer,
    pubkey_deserializer: PublicKeyDeserializer,
}

impl SlashingRecords {
    /// Creates a `SlashingRecords`
    pub fn new() -> Self {
        Self {
            signing_info_serializer: SigningInfoSerializer::new(),
            signing_info_deserializer: SigningInfoDeserializer::new(),
            pubkey_serializer: PublicKeySerializer::new(),
            pubkey_deserializer: PublicKeyDeserializer::new(),
        }
    }

    /// Signing info of `cons_addr`
    pub fn get_signing_info(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> StakingResult<Option<SigningInfo>> {
        ctx.get_decoded(
            &signing_info_key(cons_addr),
            &self.signing_info_deserializer,
            SIGNING_INFO_DESER_ERROR,
        )
    }

    /// Whether `cons_addr` has a signing info
    pub fn has_signing_info(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> StakingResult<bool> {
        Ok(ctx.tx.contains_key(&signing_info_key(cons_addr))?)
    }

    /// Writes the signing info of `cons_addr`
    pub fn set_signing_info(
        &self,
        ctx: &mut ExecutionContext,
        cons_addr: &ConsensusAddress,
        info: &SigningInfo,
    ) -> StakingResult<()> {
        ctx.put_encoded(
            signing_info_key(cons_addr),
            info,
            &self.signing_info_serializer,
            SIGNING_INFO_SER_ERROR,
        )
    }

    /// Consensus public key registered for `cons_addr`
    pub fn get_pubkey(
        &self,
        ctx: &ExecutionContext,
        cons_addr: &ConsensusAddress,
    ) -> StakingResult<Option<PublicKey>> {
        ctx.get_decoded(
            &pubkey_key(cons_addr),
            &self.pubkey_deserializer,
            PUBKEY_DESER_ERROR,
        )
    }

    /// Registers `pubkey` under its consensus address
    pub fn add_pubkey(&self, ctx: &mut ExecutionContext, pubkey: &PublicKey) -> StakingResult<()> {
        ctx.put_encoded(
            pubkey_key(&ConsensusAddress::from_public_key(pubkey)),
            pubkey,
            &self.pubkey_serializer,
            PUBKEY_SER_ERROR,
        )
    }

    /// Forgets the consensus public key of `cons_addr`
    pub fn delete_pubkey(&self, ctx: &mut ExecutionContext, cons_addr: &ConsensusAddress) {
        ctx.tx.delete(pubkey_key(cons_addr));
    }
}
