//! Leaf protocol: causeless errors to and from [`EncodedLeaf`] records.
//!
//! Encode priority:
//! 1. Registered leaf encoder for the error's type key
//! 2. Opaque leaf → re-emit the record it was decoded from
//! 3. Generic extraction → rendered message, no safe details
//!
//! Decode priority:
//! 1. Registered leaf decoder for the record's type key
//! 2. Fallback → [`OpaqueLeaf`]

use std::error::Error;

use tracing::trace;

use crate::error::DecodeError;
use crate::key::TypeKey;
use crate::opaque::OpaqueLeaf;
use crate::registry::Registry;
use crate::types::{BoxError, EncodedLeaf, LeafParts};

impl Registry {
    /// Encode a causeless error.
    ///
    /// Never fails: without a registered encoder, only the rendered message
    /// is carried. The key comes from [`Registry::type_key`], so an
    /// unregistered type is recorded as [`TypeKey::unnamed`].
    pub fn encode_leaf(&self, err: &(dyn Error + 'static)) -> EncodedLeaf {
        self.encode_leaf_keyed(err, self.type_key(err))
    }

    /// Encode a causeless error of a known concrete type. An unregistered
    /// `E` keeps its own type key.
    pub fn encode_leaf_of<E: Error + 'static>(&self, err: &E) -> EncodedLeaf {
        self.encode_leaf_keyed(err, self.type_key_of(err))
    }

    pub(crate) fn encode_leaf_keyed(
        &self,
        err: &(dyn Error + 'static),
        type_key: TypeKey,
    ) -> EncodedLeaf {
        let parts = self
            .leaf_encoder(&type_key)
            .and_then(|encode| encode(err))
            .unwrap_or_else(|| generic_leaf_parts(err));
        EncodedLeaf {
            type_key,
            message: parts.message,
            safe_details: parts.safe_details,
            payload: parts.payload,
        }
    }

    /// Rebuild a causeless error from its record.
    ///
    /// An unknown type key is not a failure: the result is an [`OpaqueLeaf`]
    /// carrying the message and safe details. Only a registered decoder can
    /// return `Err`.
    pub fn decode_leaf(&self, record: &EncodedLeaf) -> Result<BoxError, DecodeError> {
        match self.leaf_decoder(&record.type_key) {
            Some(decode) => decode(
                record.message.as_str(),
                record.safe_details.as_slice(),
                record.payload.as_ref(),
            ),
            None => {
                trace!(key = %record.type_key, "no leaf decoder, using opaque leaf");
                Ok(Box::new(OpaqueLeaf::from_record(record)))
            }
        }
    }
}

fn generic_leaf_parts(err: &(dyn Error + 'static)) -> LeafParts {
    match err.downcast_ref::<OpaqueLeaf>() {
        Some(opaque) => LeafParts {
            message: opaque.message().to_string(),
            safe_details: opaque.safe_details().to_vec(),
            payload: opaque.payload().cloned(),
        },
        None => LeafParts::new(err.to_string()),
    }
}
