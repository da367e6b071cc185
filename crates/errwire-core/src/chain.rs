//! Chain driver: flattens a whole `source()` chain into an [`EncodedChain`]
//! and folds one back into a live error.
//!
//! Records are ordered innermost first, so decoding is a left fold: each
//! step's result becomes the cause of the next wrapper.
//!
//! Both directions enforce the same [`CodecConfig`] limits. On encode an
//! oversized safe detail is cut down to `max_safe_detail_bytes`, ending in
//! [`TRUNCATION_MARKER`], so a chain this process produces is always one it
//! accepts back.

use std::error::Error;
use std::iter;

use tracing::warn;

use crate::config::CodecConfig;
use crate::error::{DecodeError, EncodeError};
use crate::key::TypeKey;
use crate::registry::{self, Registry};
use crate::types::{BoxError, EncodedChain, EncodedNode};

/// Walk `err` and its causes, outermost first.
pub fn causes<'a>(
    err: &'a (dyn Error + 'static),
) -> impl Iterator<Item = &'a (dyn Error + 'static)> {
    iter::successors(Some(err), |&e| e.source())
}

/// Appended to a safe detail that was cut down to fit the size limit.
pub const TRUNCATION_MARKER: &str = "\n[truncated]";

/// Encode `err` and every cause below it.
///
/// Every level is keyed through [`Registry::type_key`], so a level whose
/// type was never registered gets [`TypeKey::unnamed`]. Use
/// [`encode_chain_of`] when the outermost type is statically known.
pub fn encode_chain(
    registry: &Registry,
    err: &(dyn Error + 'static),
    config: &CodecConfig,
) -> Result<EncodedChain, EncodeError> {
    encode_levels(registry, err, None, config)
}

/// Like [`encode_chain`], but the outermost level is keyed as `E` even when
/// `E` was never registered. Causes below it are still resolved through the
/// registry.
pub fn encode_chain_of<E: Error + 'static>(
    registry: &Registry,
    err: &E,
    config: &CodecConfig,
) -> Result<EncodedChain, EncodeError> {
    encode_levels(registry, err, Some(registry.type_key_of(err)), config)
}

fn encode_levels(
    registry: &Registry,
    err: &(dyn Error + 'static),
    outer_key: Option<TypeKey>,
    config: &CodecConfig,
) -> Result<EncodedChain, EncodeError> {
    let levels: Vec<_> = causes(err).take(config.max_depth + 1).collect();
    if levels.len() > config.max_depth {
        return Err(EncodeError::TooDeep {
            depth: causes(err).count(),
            limit: config.max_depth,
        });
    }

    let mut nodes = Vec::with_capacity(levels.len());
    for (i, level) in levels.iter().enumerate().rev() {
        let type_key = match (&outer_key, i) {
            (Some(key), 0) => key.clone(),
            _ => registry.type_key(*level),
        };
        let mut node = match levels.get(i + 1) {
            Some(cause) => {
                EncodedNode::Wrapper(registry.encode_wrapper_keyed(*level, *cause, type_key))
            }
            None => EncodedNode::Leaf(registry.encode_leaf_keyed(*level, type_key)),
        };
        clamp_safe_details(&mut node, config.max_safe_detail_bytes);
        nodes.push(node);
    }
    Ok(EncodedChain { nodes })
}

fn clamp_safe_details(node: &mut EncodedNode, limit: usize) {
    let (type_key, details) = match node {
        EncodedNode::Leaf(leaf) => (&leaf.type_key, &mut leaf.safe_details),
        EncodedNode::Wrapper(wrapper) => (&wrapper.type_key, &mut wrapper.safe_details),
    };
    for detail in details.iter_mut().filter(|d| d.len() > limit) {
        warn!(key = %type_key, bytes = detail.len(), limit, "truncating safe detail");
        truncate_detail(detail, limit);
    }
}

/// Cut `detail` to at most `limit` bytes on a char boundary, ending in
/// [`TRUNCATION_MARKER`] when the marker itself fits.
fn truncate_detail(detail: &mut String, limit: usize) {
    if detail.len() <= limit {
        return;
    }
    let marker = if TRUNCATION_MARKER.len() <= limit { TRUNCATION_MARKER } else { "" };
    let mut cut = limit - marker.len();
    while !detail.is_char_boundary(cut) {
        cut -= 1;
    }
    detail.truncate(cut);
    detail.push_str(marker);
}

/// Rebuild an error from its flattened chain.
///
/// The chain is validated before any decoder runs. Unknown type keys never
/// fail; they decode to opaque errors.
pub fn decode_chain(
    registry: &Registry,
    chain: &EncodedChain,
    config: &CodecConfig,
) -> Result<BoxError, DecodeError> {
    validate(chain, config)?;

    let mut nodes = chain.nodes.iter();
    let mut current = match nodes.next() {
        Some(EncodedNode::Leaf(leaf)) => registry.decode_leaf(leaf)?,
        _ => {
            return Err(DecodeError::MalformedChain {
                reason: "chain must start with a leaf".into(),
            })
        }
    };
    for node in nodes {
        current = match node {
            EncodedNode::Wrapper(wrapper) => registry.decode_wrapper(current, wrapper)?,
            EncodedNode::Leaf(_) => {
                return Err(DecodeError::MalformedChain {
                    reason: "leaf record above the bottom of the chain".into(),
                })
            }
        };
    }
    Ok(current)
}

fn validate(chain: &EncodedChain, config: &CodecConfig) -> Result<(), DecodeError> {
    if chain.is_empty() {
        return Err(DecodeError::MalformedChain {
            reason: "empty chain".into(),
        });
    }
    if chain.len() > config.max_depth {
        return Err(DecodeError::TooDeep {
            depth: chain.len(),
            limit: config.max_depth,
        });
    }
    for (index, node) in chain.nodes.iter().enumerate() {
        let expect_leaf = index == 0;
        if matches!(node, EncodedNode::Leaf(_)) != expect_leaf {
            return Err(DecodeError::MalformedChain {
                reason: format!(
                    "record {index} is a {}, expected a {}",
                    if expect_leaf { "wrapper" } else { "leaf" },
                    if expect_leaf { "leaf" } else { "wrapper" },
                ),
            });
        }
        if let Some(detail) = node
            .safe_details()
            .iter()
            .find(|d| d.len() > config.max_safe_detail_bytes)
        {
            return Err(DecodeError::MalformedChain {
                reason: format!(
                    "record {index} has a {}-byte safe detail (limit {})",
                    detail.len(),
                    config.max_safe_detail_bytes
                ),
            });
        }
    }
    Ok(())
}

/// [`encode_chain_of`] against the process-wide registry with default limits.
pub fn encode_error<E: Error + 'static>(err: &E) -> Result<EncodedChain, EncodeError> {
    encode_chain_of(registry::global(), err, &CodecConfig::default())
}

/// [`decode_chain`] against the process-wide registry with default limits.
pub fn decode_error(chain: &EncodedChain) -> Result<BoxError, DecodeError> {
    decode_chain(registry::global(), chain, &CodecConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opaque::{OpaqueLeaf, OpaqueWrapper};
    use crate::types::{EncodedLeaf, EncodedWrapper, LeafParts};
    use std::fmt;

    #[derive(Debug)]
    struct Root;

    impl fmt::Display for Root {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("connection reset")
        }
    }

    impl Error for Root {}

    #[derive(Debug)]
    struct Layer {
        label: String,
        cause: BoxError,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}: {}", self.label, self.cause)
        }
    }

    impl Error for Layer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(self.cause.as_ref())
        }
    }

    fn layered(depth: usize) -> BoxError {
        (0..depth).fold(Box::new(Root) as BoxError, |cause, i| {
            Box::new(Layer { label: format!("layer {i}"), cause })
        })
    }

    fn leaf(message: &str) -> EncodedNode {
        EncodedNode::Leaf(EncodedLeaf {
            type_key: TypeKey::new("remote::Leaf").unwrap(),
            message: message.into(),
            safe_details: vec![],
            payload: None,
        })
    }

    fn wrapper(prefix: &str) -> EncodedNode {
        EncodedNode::Wrapper(EncodedWrapper {
            type_key: TypeKey::new("remote::Wrapper").unwrap(),
            message_prefix: prefix.into(),
            safe_details: vec![],
            payload: None,
        })
    }

    #[test]
    fn encodes_innermost_first() {
        let reg = Registry::new();
        let err = layered(2);
        let chain = encode_chain(&reg, err.as_ref(), &CodecConfig::default()).unwrap();
        assert_eq!(chain.len(), 3);
        assert!(matches!(&chain.nodes[0], EncodedNode::Leaf(l) if l.message == "connection reset"));
        assert!(matches!(&chain.nodes[1], EncodedNode::Wrapper(w) if w.message_prefix == "layer 0"));
        assert!(matches!(&chain.nodes[2], EncodedNode::Wrapper(w) if w.message_prefix == "layer 1"));
    }

    #[test]
    fn unknown_chain_decodes_to_opaque_levels() {
        let reg = Registry::new();
        let err = layered(3);
        let chain = encode_chain(&reg, err.as_ref(), &CodecConfig::default()).unwrap();
        let decoded = decode_chain(&reg, &chain, &CodecConfig::default()).unwrap();

        assert_eq!(decoded.to_string(), err.to_string());
        let levels: Vec<_> = causes(decoded.as_ref()).collect();
        assert_eq!(levels.len(), 4);
        assert!(levels[..3].iter().all(|e| e.is::<OpaqueWrapper>()));
        assert!(levels[3].is::<OpaqueLeaf>());
        let original: Vec<_> = causes(err.as_ref()).map(|e| e.to_string()).collect();
        let rebuilt: Vec<_> = levels.iter().map(|e| e.to_string()).collect();
        assert_eq!(original, rebuilt);
    }

    #[test]
    fn too_deep_to_encode() {
        let reg = Registry::new();
        let cfg = CodecConfig { max_depth: 3, ..CodecConfig::default() };
        let err = layered(3);
        match encode_chain(&reg, err.as_ref(), &cfg).unwrap_err() {
            EncodeError::TooDeep { depth, limit } => {
                assert_eq!(depth, 4);
                assert_eq!(limit, 3);
            }
            other => panic!("expected TooDeep, got {other:?}"),
        }
        assert!(encode_chain(&reg, layered(2).as_ref(), &cfg).is_ok());
    }

    #[test]
    fn rejects_malformed_chains() {
        let reg = Registry::new();
        let cfg = CodecConfig::default();
        let cases = [
            EncodedChain::default(),
            EncodedChain { nodes: vec![wrapper("x")] },
            EncodedChain { nodes: vec![leaf("a"), leaf("b")] },
            EncodedChain { nodes: vec![leaf("a"), wrapper("x"), leaf("b")] },
        ];
        for chain in &cases {
            let err = decode_chain(&reg, chain, &cfg).unwrap_err();
            assert!(matches!(err, DecodeError::MalformedChain { .. }), "got {err:?}");
        }
    }

    #[test]
    fn rejects_oversized_input() {
        let reg = Registry::new();
        let cfg = CodecConfig { max_depth: 2, max_safe_detail_bytes: 4 };

        let deep = EncodedChain { nodes: vec![leaf("a"), wrapper("x"), wrapper("y")] };
        assert!(matches!(
            decode_chain(&reg, &deep, &cfg).unwrap_err(),
            DecodeError::TooDeep { depth: 3, limit: 2 }
        ));

        let mut big = leaf("a");
        if let EncodedNode::Leaf(l) = &mut big {
            l.safe_details.push("too long".into());
        }
        let chain = EncodedChain { nodes: vec![big] };
        assert!(matches!(
            decode_chain(&reg, &chain, &cfg).unwrap_err(),
            DecodeError::MalformedChain { .. }
        ));
    }

    #[test]
    fn oversized_detail_is_truncated_on_encode() {
        let reg = Registry::new();
        reg.register_leaf_encoder::<Root, _>(|e| {
            LeafParts::new(e.to_string()).with_safe_detail("frame\n".repeat(20_000))
        })
        .unwrap();
        let cfg = CodecConfig::default();

        let chain = encode_chain(&reg, &Root, &cfg).unwrap();
        let detail = &chain.nodes[0].safe_details()[0];
        assert!(detail.len() <= cfg.max_safe_detail_bytes);
        assert!(detail.ends_with(TRUNCATION_MARKER));
        assert!(detail.starts_with("frame\nframe\n"));

        let decoded = decode_chain(&reg, &chain, &cfg).unwrap();
        assert_eq!(decoded.to_string(), "connection reset");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let mut detail = "é".repeat(10);
        truncate_detail(&mut detail, 15);
        assert!(detail.len() <= 15);
        assert!(detail.ends_with(TRUNCATION_MARKER));

        let mut tiny = "abcdef".to_string();
        truncate_detail(&mut tiny, 3);
        assert_eq!(tiny, "abc");

        let mut short = "ok".to_string();
        truncate_detail(&mut short, 3);
        assert_eq!(short, "ok");
    }

    #[test]
    fn outermost_level_is_keyed_by_static_type() {
        let reg = Registry::new();
        let err = Layer { label: "outer".into(), cause: Box::new(Root) };
        let cfg = CodecConfig::default();

        let chain = encode_chain_of(&reg, &err, &cfg).unwrap();
        assert_eq!(*chain.nodes[1].type_key(), TypeKey::of::<Layer>());
        assert!(chain.nodes[0].type_key().is_unnamed());

        let dynamic = encode_chain(&reg, &err, &cfg).unwrap();
        assert!(dynamic.nodes[1].type_key().is_unnamed());
        assert_eq!(chain.nodes[1].safe_details(), dynamic.nodes[1].safe_details());
    }

    #[test]
    fn json_round_trip_of_records() {
        let reg = Registry::new();
        let chain = encode_chain(&reg, layered(1).as_ref(), &CodecConfig::default()).unwrap();
        let json = chain.to_json().unwrap();
        let back = EncodedChain::from_json(&json).unwrap();
        let decoded = decode_chain(&reg, &back, &CodecConfig::default()).unwrap();
        assert_eq!(decoded.to_string(), "layer 0: connection reset");
    }
}
