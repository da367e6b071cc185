//! errwire-core: ship error chains across process boundaries.
//!
//! This crate defines:
//! - [`TypeKey`]: the stable identity of a concrete error type
//! - [`Registry`]: leaf/wrapper encoders and decoders keyed by `TypeKey`
//! - [`EncodedLeaf`] / [`EncodedWrapper`]: the portable per-level records
//! - [`OpaqueLeaf`] / [`OpaqueWrapper`]: what unknown types decode to
//! - [`encode_chain`] / [`decode_chain`]: the whole-chain driver
//!
//! # Quick Start
//!
//! ```rust
//! use errwire_core::{decode_chain, encode_chain, CodecConfig, Registry};
//!
//! #[derive(Debug)]
//! struct Boom;
//! impl std::fmt::Display for Boom {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("boom")
//!     }
//! }
//! impl std::error::Error for Boom {}
//!
//! let registry = Registry::new();
//! let config = CodecConfig::default();
//! let chain = encode_chain(&registry, &Boom, &config).unwrap();
//! let decoded = decode_chain(&registry, &chain, &config).unwrap();
//! assert_eq!(decoded.to_string(), "boom");
//! ```

pub mod chain;
pub mod config;
pub mod error;
pub mod key;
pub mod leaf;
pub mod opaque;
pub mod registry;
pub mod types;
pub mod wrapper;

pub use chain::{
    causes, decode_chain, decode_error, encode_chain, encode_chain_of, encode_error,
    TRUNCATION_MARKER,
};
pub use config::CodecConfig;
pub use error::{DecodeError, EncodeError, RegistryError, Slot};
pub use key::TypeKey;
pub use opaque::{OpaqueLeaf, OpaqueWrapper};
pub use registry::{global, Registry};
pub use types::{
    BoxError, EncodedChain, EncodedLeaf, EncodedNode, EncodedWrapper, LeafParts, Payload,
    SafeDetails, WrapperParts,
};
