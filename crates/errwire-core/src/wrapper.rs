//! Wrapper protocol: one decorator level to and from [`EncodedWrapper`].
//!
//! The cause is never touched here. The chain driver encodes it as its own
//! record and, when decoding, hands the already-rebuilt cause back in.

use std::error::Error;

use tracing::trace;

use crate::error::DecodeError;
use crate::key::TypeKey;
use crate::opaque::OpaqueWrapper;
use crate::registry::Registry;
use crate::types::{BoxError, EncodedWrapper, WrapperParts};

impl Registry {
    /// Encode one wrapper level. `cause` is only consulted by the generic
    /// extraction, to strip the cause's text from the wrapper's message.
    pub fn encode_wrapper(
        &self,
        err: &(dyn Error + 'static),
        cause: &(dyn Error + 'static),
    ) -> EncodedWrapper {
        self.encode_wrapper_keyed(err, cause, self.type_key(err))
    }

    /// Encode one wrapper level of a known concrete type. An unregistered
    /// `E` keeps its own type key.
    pub fn encode_wrapper_of<E: Error + 'static>(
        &self,
        err: &E,
        cause: &(dyn Error + 'static),
    ) -> EncodedWrapper {
        self.encode_wrapper_keyed(err, cause, self.type_key_of(err))
    }

    pub(crate) fn encode_wrapper_keyed(
        &self,
        err: &(dyn Error + 'static),
        cause: &(dyn Error + 'static),
        type_key: TypeKey,
    ) -> EncodedWrapper {
        let parts = self
            .wrapper_encoder(&type_key)
            .and_then(|encode| encode(err))
            .unwrap_or_else(|| generic_wrapper_parts(err, cause));
        EncodedWrapper {
            type_key,
            message_prefix: parts.message_prefix,
            safe_details: parts.safe_details,
            payload: parts.payload,
        }
    }

    /// Rebuild one wrapper level around `cause`.
    ///
    /// The result owns `cause` itself; it is never re-decoded. Unknown type
    /// keys produce an [`OpaqueWrapper`].
    pub fn decode_wrapper(
        &self,
        cause: BoxError,
        record: &EncodedWrapper,
    ) -> Result<BoxError, DecodeError> {
        match self.wrapper_decoder(&record.type_key) {
            Some(decode) => decode(
                cause,
                record.message_prefix.as_str(),
                record.safe_details.as_slice(),
                record.payload.as_ref(),
            ),
            None => {
                trace!(key = %record.type_key, "no wrapper decoder, using opaque wrapper");
                Ok(Box::new(OpaqueWrapper::from_record(cause, record)))
            }
        }
    }
}

fn generic_wrapper_parts(
    err: &(dyn Error + 'static),
    cause: &(dyn Error + 'static),
) -> WrapperParts {
    if let Some(opaque) = err.downcast_ref::<OpaqueWrapper>() {
        return WrapperParts {
            message_prefix: opaque.message_prefix().to_string(),
            safe_details: opaque.safe_details().to_vec(),
            payload: opaque.payload().cloned(),
        };
    }
    WrapperParts::new(extract_prefix(&err.to_string(), &cause.to_string()))
}

/// The part of `message` that the wrapper added in front of its cause.
///
/// When `message` does not end with the cause's text the whole message is
/// kept as the prefix. One trailing `": "` is dropped, since an
/// [`OpaqueWrapper`] puts it back when rendering.
///
/// This is lossy for wrappers that join their text to the cause any other
/// way. `"retrying boom"` over `"boom"` yields the prefix `"retrying "`, and
/// the opaque wrapper decoded from it renders `"retrying : boom"`. Messages
/// survive unregistered wrappers exactly only when they render as
/// `"prefix: cause"` or as the bare cause.
pub fn extract_prefix(message: &str, cause_message: &str) -> String {
    match message.strip_suffix(cause_message) {
        Some(prefix) => prefix.strip_suffix(": ").unwrap_or(prefix).to_string(),
        None => message.to_string(),
    }
}
