//! errwire-adapters: example error types with their errwire codecs.
//!
//! # Quick Start
//!
//! ```rust
//! use errwire_adapters::{install, Context, Message};
//! use errwire_core::{decode_error, encode_error};
//!
//! install().unwrap();
//! let err = Context::new(Message::new("file not found"), "while loading config");
//! let chain = encode_error(&err).unwrap();
//! let decoded = decode_error(&chain).unwrap();
//! assert_eq!(decoded.to_string(), "while loading config: file not found");
//! assert!(decoded.downcast_ref::<Context>().is_some());
//! ```

pub mod codecs;
pub mod errors;
pub mod stack;

pub use codecs::{install, register};
pub use errors::{Context, Message, Traced, WithStack};
pub use stack::StackTrace;
