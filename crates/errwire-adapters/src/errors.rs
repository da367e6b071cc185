//! The example error types: two leaves and two wrappers.

use std::error::Error as StdError;
use std::fmt;

use errwire_core::BoxError;
use thiserror::Error;

use crate::stack::StackTrace;

// ─── Leaves ───────────────────────────────────────────────────────────────────

/// A bare message-only error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Message(String);

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A message-only error that also records where it was created.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Traced {
    message: String,
    stack: StackTrace,
}

impl Traced {
    /// Create the error and capture the current call stack.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_stack(message, StackTrace::capture())
    }

    pub fn with_stack(message: impl Into<String>, stack: StackTrace) -> Self {
        Self {
            message: message.into(),
            stack,
        }
    }

    pub fn stack(&self) -> &StackTrace {
        &self.stack
    }
}

// ─── Wrappers ─────────────────────────────────────────────────────────────────

/// Adds a message prefix in front of its cause: `"prefix: cause"`.
#[derive(Debug)]
pub struct Context {
    prefix: String,
    cause: BoxError,
}

impl Context {
    pub fn new(cause: impl Into<BoxError>, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            cause: cause.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.cause)
        } else {
            write!(f, "{}: {}", self.prefix, self.cause)
        }
    }
}

impl StdError for Context {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Records the call stack at the point its cause was wrapped. Adds no text
/// of its own.
#[derive(Debug)]
pub struct WithStack {
    stack: StackTrace,
    cause: BoxError,
}

impl WithStack {
    /// Wrap `cause` and capture the current call stack.
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self::with_stack(cause, StackTrace::capture())
    }

    pub fn with_stack(cause: impl Into<BoxError>, stack: StackTrace) -> Self {
        Self {
            stack,
            cause: cause.into(),
        }
    }

    pub fn stack(&self) -> &StackTrace {
        &self.stack
    }
}

impl fmt::Display for WithStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl StdError for WithStack {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.cause.as_ref())
    }
}
