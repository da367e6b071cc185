//! `TypeKey`: the stable identity of a concrete error type.
//!
//! Every registry slot is keyed by a `TypeKey`. Keys are derived from the
//! Rust type name, so two values of the same type always share a key within
//! one build, regardless of their field values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Longest key accepted on the decode side.
pub const MAX_TYPE_KEY_LEN: usize = 512;

const UNNAMED: &str = "<unnamed>";

/// Identifier for one concrete error type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeKey(String);

impl TypeKey {
    /// Derive the key of `E`.
    ///
    /// This is a pure function of the type: external chain drivers can call
    /// it ahead of time to pre-compute keys.
    pub fn of<E: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<E>().to_string())
    }

    /// Same as [`TypeKey::of`], inferred from a value.
    pub fn of_val<E: ?Sized + 'static>(_: &E) -> Self {
        Self::of::<E>()
    }

    /// Build a key from an explicit string, validating its syntax.
    pub fn new(key: impl Into<String>) -> Result<Self, DecodeError> {
        let key = key.into();
        validate(&key)?;
        Ok(Self(key))
    }

    /// The key reported for errors whose concrete type cannot be named.
    ///
    /// No decoder can ever match it, so such errors always come back as
    /// opaque values.
    pub fn unnamed() -> Self {
        Self(UNNAMED.to_string())
    }

    /// Returns `true` for the [`TypeKey::unnamed`] sentinel.
    pub fn is_unnamed(&self) -> bool {
        self.0 == UNNAMED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(key: &str) -> Result<(), DecodeError> {
    let invalid = |reason: &str| DecodeError::InvalidTypeKey {
        key: key.chars().take(64).collect(),
        reason: reason.to_string(),
    };
    if key.is_empty() {
        return Err(invalid("empty"));
    }
    if key.len() > MAX_TYPE_KEY_LEN {
        return Err(invalid("too long"));
    }
    if key.chars().any(char::is_control) {
        return Err(invalid("contains control characters"));
    }
    if key.trim() != key {
        return Err(invalid("leading or trailing whitespace"));
    }
    Ok(())
}

impl TryFrom<String> for TypeKey {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TypeKey> for String {
    fn from(key: TypeKey) -> Self {
        key.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
