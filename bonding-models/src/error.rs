// Copyright (c) 2022 MASSA LABS <info@massa.net>

use displaydoc::Display;
use thiserror::Error;

/// Result alias for this crate
pub type ModelsResult<T, E = ModelsError> = core::result::Result<T, E>;

/// Errors of the value types
#[non_exhaustive]
#[derive(Display, Error, Debug)]
pub enum ModelsError {
    /// Serialization error: {0}
    SerializeError(String),
    /// Deserialization error: {0}
    DeserializeError(String),
    /// hash error: {0}
    HashError(#[from] bonding_hash::HashError),
    /// signature error: {0}
    SignatureError(#[from] bonding_signature::SignatureError),
    /// amount parse error: {0}
    AmountParseError(String),
    /// decimal parse error: {0}
    DecParseError(String),
    /// checked operation error: {0}
    CheckedOperationError(String),
    /// Time error {0}
    TimeError(#[from] bonding_time::TimeError),
    /// Wrong prefix: expected {0}, got {1}
    WrongPrefix(String, String),
}
