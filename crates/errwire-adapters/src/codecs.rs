//! Codecs for the example error types, and the start-up hook that installs
//! them.
//!
//! | Type        | Encode                     | Decode                   | Fidelity       |
//! |-------------|----------------------------|--------------------------|----------------|
//! | `Message`   | generic extraction         | `decode_message`         | exact          |
//! | `Traced`    | `encode_traced`            | none → opaque leaf       | lossy but safe |
//! | `Context`   | generic extraction         | `decode_context`         | exact          |
//! | `WithStack` | `encode_with_stack`        | none → opaque wrapper    | lossy but safe |
//!
//! The stack-carrying types have no decoder. Their stack travels as a safe
//! detail and the receiver always gets the generic opaque type.

use std::sync::OnceLock;

use errwire_core::{
    BoxError, DecodeError, LeafParts, Payload, Registry, RegistryError, WrapperParts,
};
use tracing::debug;

use crate::errors::{Context, Message, Traced, WithStack};

pub fn decode_message(
    message: &str,
    _safe_details: &[String],
    _payload: Option<&Payload>,
) -> Result<BoxError, DecodeError> {
    Ok(Box::new(Message::new(message)))
}

/// The message is the error text; the rendered stack becomes the only safe
/// detail.
pub fn encode_traced(err: &Traced) -> LeafParts {
    LeafParts::new(err.to_string()).with_safe_detail(err.stack().to_string())
}

pub fn decode_context(
    cause: BoxError,
    message_prefix: &str,
    _safe_details: &[String],
    _payload: Option<&Payload>,
) -> Result<BoxError, DecodeError> {
    Ok(Box::new(Context::new(cause, message_prefix)))
}

/// `WithStack` adds no text, so the prefix is empty; the rendered stack is
/// the only safe detail.
pub fn encode_with_stack(err: &WithStack) -> WrapperParts {
    WrapperParts::new("").with_safe_detail(err.stack().to_string())
}

/// Register every example codec into `registry`.
///
/// Fails if any of them is already registered there.
pub fn register(registry: &Registry) -> Result<(), RegistryError> {
    registry.register_leaf_decoder::<Message, _>(decode_message)?;
    registry.register_leaf_encoder::<Traced, _>(encode_traced)?;
    registry.register_wrapper_decoder::<Context, _>(decode_context)?;
    registry.register_wrapper_encoder::<WithStack, _>(encode_with_stack)?;
    debug!(codecs = registry.len(), "example adapters registered");
    Ok(())
}

static INSTALLED: OnceLock<Result<(), RegistryError>> = OnceLock::new();

/// Register the example codecs into the process-wide registry.
///
/// Call during start-up. Only the first call registers; later calls return
/// its outcome.
pub fn install() -> Result<(), RegistryError> {
    INSTALLED
        .get_or_init(|| register(errwire_core::global()))
        .clone()
}
