//! Codec registry: maps type keys to leaf/wrapper encoders and decoders.
//!
//! Four independent mappings share one `RwLock`. Registrations are expected
//! during start-up, before concurrent use; the lock only serializes the rare
//! late registration against lookups.

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{DecodeError, RegistryError, Slot};
use crate::key::TypeKey;
use crate::opaque::{OpaqueLeaf, OpaqueWrapper};
use crate::types::{BoxError, LeafParts, Payload, WrapperParts};

/// Extracts message, safe details and payload from a leaf error.
pub type LeafEncoder = Arc<dyn Fn(&(dyn Error + 'static)) -> Option<LeafParts> + Send + Sync>;

/// Rebuilds a leaf error from `(message, safe_details, payload)`.
pub type LeafDecoder =
    Arc<dyn Fn(&str, &[String], Option<&Payload>) -> Result<BoxError, DecodeError> + Send + Sync>;

/// Extracts message prefix, safe details and payload from a wrapper error.
pub type WrapperEncoder =
    Arc<dyn Fn(&(dyn Error + 'static)) -> Option<WrapperParts> + Send + Sync>;

/// Rebuilds a wrapper error around an already-decoded cause.
pub type WrapperDecoder = Arc<
    dyn Fn(BoxError, &str, &[String], Option<&Payload>) -> Result<BoxError, DecodeError>
        + Send
        + Sync,
>;

/// Tells whether a trait object is of one particular concrete type.
type Probe = fn(&(dyn Error + 'static)) -> bool;

fn probe<E: Error + 'static>(err: &(dyn Error + 'static)) -> bool {
    err.is::<E>()
}

#[derive(Default)]
struct Inner {
    leaf_encoders: HashMap<TypeKey, LeafEncoder>,
    leaf_decoders: HashMap<TypeKey, LeafDecoder>,
    wrapper_encoders: HashMap<TypeKey, WrapperEncoder>,
    wrapper_decoders: HashMap<TypeKey, WrapperDecoder>,
    /// Types nameable from a `&dyn Error`, in registration order.
    known_types: Vec<(TypeKey, Probe)>,
}

impl Inner {
    fn learn<E: Error + 'static>(&mut self) -> TypeKey {
        let key = TypeKey::of::<E>();
        if !self.known_types.iter().any(|(k, _)| *k == key) {
            self.known_types.push((key.clone(), probe::<E>));
        }
        key
    }
}

fn insert<V>(
    map: &mut HashMap<TypeKey, V>,
    slot: Slot,
    key: TypeKey,
    value: V,
) -> Result<(), RegistryError> {
    if map.contains_key(&key) {
        return Err(RegistryError::AlreadyRegistered { slot, key });
    }
    debug!(%slot, %key, "registered codec");
    map.insert(key, value);
    Ok(())
}

/// Thread-safe codec registry.
///
/// Registering a second codec into an occupied slot is rejected with
/// [`RegistryError::AlreadyRegistered`]; the first registration stays.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Make `E` nameable from a trait object without attaching any codec.
    ///
    /// Registering any codec for `E` does this implicitly.
    pub fn register_type<E: Error + 'static>(&self) -> TypeKey {
        self.write().learn::<E>()
    }

    /// Register the leaf encoder for `E`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] if `E` already has one.
    pub fn register_leaf_encoder<E, F>(&self, encoder: F) -> Result<(), RegistryError>
    where
        E: Error + 'static,
        F: Fn(&E) -> LeafParts + Send + Sync + 'static,
    {
        let erased: LeafEncoder =
            Arc::new(move |err: &(dyn Error + 'static)| err.downcast_ref::<E>().map(&encoder));
        let mut inner = self.write();
        let key = inner.learn::<E>();
        insert(&mut inner.leaf_encoders, Slot::LeafEncoder, key, erased)
    }

    /// Register the leaf decoder for records keyed as `E`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] if `E` already has one.
    pub fn register_leaf_decoder<E, F>(&self, decoder: F) -> Result<(), RegistryError>
    where
        E: Error + 'static,
        F: Fn(&str, &[String], Option<&Payload>) -> Result<BoxError, DecodeError>
            + Send
            + Sync
            + 'static,
    {
        let erased: LeafDecoder = Arc::new(decoder);
        let mut inner = self.write();
        let key = inner.learn::<E>();
        insert(&mut inner.leaf_decoders, Slot::LeafDecoder, key, erased)
    }

    /// Register the wrapper encoder for `E`.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] if `E` already has one.
    pub fn register_wrapper_encoder<E, F>(&self, encoder: F) -> Result<(), RegistryError>
    where
        E: Error + 'static,
        F: Fn(&E) -> WrapperParts + Send + Sync + 'static,
    {
        let erased: WrapperEncoder =
            Arc::new(move |err: &(dyn Error + 'static)| err.downcast_ref::<E>().map(&encoder));
        let mut inner = self.write();
        let key = inner.learn::<E>();
        insert(&mut inner.wrapper_encoders, Slot::WrapperEncoder, key, erased)
    }

    /// Register the wrapper decoder for records keyed as `E`. The decoder
    /// receives the already-decoded cause.
    ///
    /// Fails with [`RegistryError::AlreadyRegistered`] if `E` already has one.
    pub fn register_wrapper_decoder<E, F>(&self, decoder: F) -> Result<(), RegistryError>
    where
        E: Error + 'static,
        F: Fn(BoxError, &str, &[String], Option<&Payload>) -> Result<BoxError, DecodeError>
            + Send
            + Sync
            + 'static,
    {
        let erased: WrapperDecoder = Arc::new(decoder);
        let mut inner = self.write();
        let key = inner.learn::<E>();
        insert(&mut inner.wrapper_decoders, Slot::WrapperDecoder, key, erased)
    }

    // ─── Lookup ───────────────────────────────────────────────────────────────

    /// Leaf encoder registered under `key`, if any.
    pub fn leaf_encoder(&self, key: &TypeKey) -> Option<LeafEncoder> {
        self.read().leaf_encoders.get(key).cloned()
    }

    /// Leaf decoder registered under `key`, if any.
    pub fn leaf_decoder(&self, key: &TypeKey) -> Option<LeafDecoder> {
        self.read().leaf_decoders.get(key).cloned()
    }

    /// Wrapper encoder registered under `key`, if any.
    pub fn wrapper_encoder(&self, key: &TypeKey) -> Option<WrapperEncoder> {
        self.read().wrapper_encoders.get(key).cloned()
    }

    /// Wrapper decoder registered under `key`, if any.
    pub fn wrapper_decoder(&self, key: &TypeKey) -> Option<WrapperDecoder> {
        self.read().wrapper_decoders.get(key).cloned()
    }

    /// Resolve the type key of an error only known as a trait object.
    ///
    /// Opaque errors report the key they were decoded from. Otherwise the
    /// first registered type that matches wins; unknown types get
    /// [`TypeKey::unnamed`].
    pub fn type_key(&self, err: &(dyn Error + 'static)) -> TypeKey {
        if let Some(leaf) = err.downcast_ref::<OpaqueLeaf>() {
            return leaf.type_key().clone();
        }
        if let Some(wrapper) = err.downcast_ref::<OpaqueWrapper>() {
            return wrapper.type_key().clone();
        }
        self.read()
            .known_types
            .iter()
            .find(|(_, is_type)| is_type(err))
            .map(|(key, _)| key.clone())
            .unwrap_or_else(TypeKey::unnamed)
    }

    /// Resolve the type key of a value whose concrete type is known.
    ///
    /// Same as [`Registry::type_key`], except that an unregistered `E` is
    /// keyed as [`TypeKey::of::<E>()`](TypeKey::of) instead of the unnamed
    /// sentinel. Opaque errors still report the key they were decoded from.
    pub fn type_key_of<E: Error + 'static>(&self, err: &E) -> TypeKey {
        let key = self.type_key(err);
        if key.is_unnamed() {
            TypeKey::of::<E>()
        } else {
            key
        }
    }

    /// Number of registered codecs across all four slots.
    pub fn len(&self) -> usize {
        let inner = self.read();
        inner.leaf_encoders.len()
            + inner.leaf_decoders.len()
            + inner.wrapper_encoders.len()
            + inner.wrapper_decoders.len()
    }

    /// Returns `true` if no codec is registered in any slot.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry that adapters install themselves into.
pub fn global() -> &'static Registry {
    GLOBAL.get_or_init(Registry::new)
}
