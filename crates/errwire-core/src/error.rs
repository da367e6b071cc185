//! Error types for the errwire registry and codec pipeline.

use std::fmt;

use thiserror::Error;

use crate::key::TypeKey;

/// The four independent registry mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    LeafEncoder,
    LeafDecoder,
    WrapperEncoder,
    WrapperDecoder,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LeafEncoder => "leaf encoder",
            Self::LeafDecoder => "leaf decoder",
            Self::WrapperEncoder => "wrapper encoder",
            Self::WrapperDecoder => "wrapper decoder",
        };
        f.write_str(name)
    }
}

/// Errors from codec registration.
///
/// Registration happens at start-up; callers are expected to propagate
/// these straight out of `main`.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    #[error("A {slot} is already registered for type key {key}")]
    AlreadyRegistered { slot: Slot, key: TypeKey },
}

/// Errors that can occur while reconstructing an error from its records.
///
/// An unknown type key is never one of them: that case degrades to an
/// opaque error instead.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid type key {key:?}: {reason}")]
    InvalidTypeKey { key: String, reason: String },

    #[error("Malformed error chain: {reason}")]
    MalformedChain { reason: String },

    #[error("Error chain depth {depth} exceeds limit {limit}")]
    TooDeep { depth: usize, limit: usize },

    #[error("Decoder for {key} failed: {reason}")]
    DecoderFailed { key: TypeKey, reason: String },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors that can occur while encoding an error chain.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Error chain depth {depth} exceeds limit {limit}")]
    TooDeep { depth: usize, limit: usize },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
