//! Fallback error values for type keys with no registered decoder.
//!
//! They keep the message text and the safe details, plus the original type
//! key and payload so that re-encoding one (e.g. when forwarding an error
//! through an intermediate process) reproduces the record it came from.

use std::error::Error;
use std::fmt;

use crate::key::TypeKey;
use crate::types::{BoxError, EncodedLeaf, EncodedWrapper, Payload};

/// Stand-in for a leaf error of a type this process cannot rebuild.
#[derive(Debug, Clone)]
pub struct OpaqueLeaf {
    message: String,
    safe_details: Vec<String>,
    type_key: TypeKey,
    payload: Option<Payload>,
}

impl OpaqueLeaf {
    pub fn from_record(record: &EncodedLeaf) -> Self {
        Self {
            message: record.message.clone(),
            safe_details: record.safe_details.clone(),
            type_key: record.type_key.clone(),
            payload: record.payload.clone(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn safe_details(&self) -> &[String] {
        &self.safe_details
    }

    /// Key of the type this error was encoded from.
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
}

impl fmt::Display for OpaqueLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for OpaqueLeaf {}

/// Stand-in for a wrapper error of a type this process cannot rebuild.
///
/// Owns the already-reconstructed cause one level down.
#[derive(Debug)]
pub struct OpaqueWrapper {
    message_prefix: String,
    safe_details: Vec<String>,
    type_key: TypeKey,
    payload: Option<Payload>,
    cause: BoxError,
}

impl OpaqueWrapper {
    pub fn from_record(cause: BoxError, record: &EncodedWrapper) -> Self {
        Self {
            message_prefix: record.message_prefix.clone(),
            safe_details: record.safe_details.clone(),
            type_key: record.type_key.clone(),
            payload: record.payload.clone(),
            cause,
        }
    }

    pub fn message_prefix(&self) -> &str {
        &self.message_prefix
    }

    pub fn safe_details(&self) -> &[String] {
        &self.safe_details
    }

    /// Key of the type this error was encoded from.
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

impl fmt::Display for OpaqueWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message_prefix.is_empty() {
            write!(f, "{}", self.cause)
        } else {
            write!(f, "{}: {}", self.message_prefix, self.cause)
        }
    }
}

impl Error for OpaqueWrapper {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.cause.as_ref())
    }
}
