// Copyright (c) 2022 MASSA LABS <info@massa.net>

//! Consensus keys of validators.
#![warn(missing_docs)]
mod error;
mod signature_impl;

pub use error::SignatureError;
pub use signature_impl::{
    KeyPair, PublicKey, PublicKeyDeserializer, PublicKeySerializer, KEYPAIR_SIZE_BYTES,
    PUBLIC_KEY_SIZE_BYTES,
};
