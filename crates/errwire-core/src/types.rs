//! Portable records produced by encoding and consumed by decoding.

use serde::{Deserialize, Serialize};
use std::error::Error;

use crate::error::{DecodeError, EncodeError};
use crate::key::TypeKey;

/// Owned, thread-safe error value. Every decoded error is one of these.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Ordered diagnostic strings that an adapter vouches contain no sensitive
/// data. They cross trust boundaries unredacted.
pub type SafeDetails = Vec<String>;

// ─── Payload ──────────────────────────────────────────────────────────────────

/// Optional type-specific structured data attached to a record.
///
/// The core never looks inside it; only the adapter that produced it and the
/// matching decoder give it meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(serde_json::Value);

impl Payload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

// ─── Encoder outputs ──────────────────────────────────────────────────────────

/// What a leaf encoder extracts from an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeafParts {
    pub message: String,
    pub safe_details: SafeDetails,
    pub payload: Option<Payload>,
}

impl LeafParts {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_safe_detail(mut self, detail: impl Into<String>) -> Self {
        self.safe_details.push(detail.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// What a wrapper encoder extracts from an error. The cause is never part
/// of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapperParts {
    pub message_prefix: String,
    pub safe_details: SafeDetails,
    pub payload: Option<Payload>,
}

impl WrapperParts {
    pub fn new(message_prefix: impl Into<String>) -> Self {
        Self {
            message_prefix: message_prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_safe_detail(mut self, detail: impl Into<String>) -> Self {
        self.safe_details.push(detail.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

// ─── Records ──────────────────────────────────────────────────────────────────

/// Encoded form of a causeless error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedLeaf {
    pub type_key: TypeKey,
    pub message: String,
    pub safe_details: SafeDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

/// Encoded form of one wrapper level. Its cause is encoded separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedWrapper {
    pub type_key: TypeKey,
    pub message_prefix: String,
    pub safe_details: SafeDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

/// One level of a flattened error chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodedNode {
    Leaf(EncodedLeaf),
    Wrapper(EncodedWrapper),
}

impl EncodedNode {
    pub fn type_key(&self) -> &TypeKey {
        match self {
            Self::Leaf(leaf) => &leaf.type_key,
            Self::Wrapper(wrapper) => &wrapper.type_key,
        }
    }

    pub fn safe_details(&self) -> &[String] {
        match self {
            Self::Leaf(leaf) => &leaf.safe_details,
            Self::Wrapper(wrapper) => &wrapper.safe_details,
        }
    }
}

/// A whole error chain, innermost (the leaf) first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodedChain {
    pub nodes: Vec<EncodedNode>,
}

impl EncodedChain {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_json(&self) -> Result<String, EncodeError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a chain received from another process.
    ///
    /// Type keys are checked before the records are built, so a bad key is
    /// reported as [`DecodeError::InvalidTypeKey`] rather than a bare
    /// serialization error.
    pub fn from_json(json: &str) -> Result<Self, DecodeError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let keys = value
            .get("nodes")
            .and_then(serde_json::Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|node| node.get("type_key"))
            .filter_map(serde_json::Value::as_str);
        for key in keys {
            TypeKey::new(key)?;
        }
        Ok(serde_json::from_value(value)?)
    }
}
