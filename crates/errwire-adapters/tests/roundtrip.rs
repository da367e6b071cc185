//! End-to-end encode/decode of the example error types.

use std::error::Error;
use std::sync::Arc;
use std::thread;

use errwire_adapters::{Context, Message, StackTrace, Traced, WithStack};
use errwire_core::{
    causes, decode_chain, encode_chain, encode_chain_of, BoxError, CodecConfig, EncodedNode,
    OpaqueLeaf, OpaqueWrapper, Registry, TypeKey, TRUNCATION_MARKER,
};

fn registry() -> Registry {
    let reg = Registry::new();
    errwire_adapters::register(&reg).expect("register adapters");
    reg
}

fn round_trip(reg: &Registry, err: &(dyn Error + 'static)) -> BoxError {
    let cfg = CodecConfig::default();
    let chain = encode_chain(reg, err, &cfg).expect("encode");
    let json = chain.to_json().expect("serialize");
    let received = errwire_core::EncodedChain::from_json(&json).expect("deserialize");
    decode_chain(reg, &received, &cfg).expect("decode")
}

// ─── Exact codecs ──────────────────────────────────────────────────────────────

#[test]
fn bare_message_round_trips_exactly() {
    let reg = registry();
    let record = reg.encode_leaf(&Message::new("boom"));
    assert_eq!(record.type_key, TypeKey::of::<Message>());
    assert_eq!(record.message, "boom");
    assert!(record.safe_details.is_empty());

    let decoded = reg.decode_leaf(&record).unwrap();
    assert_eq!(decoded.to_string(), "boom");
    assert_eq!(decoded.downcast_ref::<Message>(), Some(&Message::new("boom")));
}

#[test]
fn context_over_message_round_trips_exactly() {
    let reg = registry();
    let leaf = Message::new("file not found");
    let wrapper = Context::new(leaf.clone(), "while loading config");

    let leaf_record = reg.encode_leaf(&leaf);
    let wrapper_record = reg.encode_wrapper(&wrapper, &leaf);
    assert_eq!(wrapper_record.message_prefix, "while loading config");

    let cause = reg.decode_leaf(&leaf_record).unwrap();
    let decoded = reg.decode_wrapper(cause, &wrapper_record).unwrap();
    assert_eq!(decoded.to_string(), "while loading config: file not found");

    let context = decoded.downcast_ref::<Context>().expect("exact wrapper type");
    assert_eq!(context.prefix(), "while loading config");
    assert!(decoded.source().unwrap().is::<Message>());
}

// ─── Lossy-but-safe codecs ─────────────────────────────────────────────────────

#[test]
fn traced_leaf_decodes_to_opaque_with_stack_text() {
    let reg = registry();
    let err = Traced::with_stack("disk quota exceeded", StackTrace::from_frames(["frame1", "frame2"]));
    let record = reg.encode_leaf(&err);
    assert_eq!(record.type_key, TypeKey::of::<Traced>());

    let decoded = reg.decode_leaf(&record).unwrap();
    assert!(decoded.downcast_ref::<Traced>().is_none());
    let opaque = decoded.downcast_ref::<OpaqueLeaf>().expect("opaque leaf");
    assert_eq!(opaque.message(), "disk quota exceeded");
    assert_eq!(opaque.safe_details(), ["frame1\nframe2"]);
}

#[test]
fn captured_stack_text_survives_verbatim() {
    let reg = registry();
    let err = Traced::new("boom");
    let stack_text = err.stack().to_string();
    let decoded = round_trip(&reg, &err);
    let opaque = decoded.downcast_ref::<OpaqueLeaf>().unwrap();
    assert_eq!(opaque.safe_details(), [stack_text]);
}

#[test]
fn with_stack_decodes_to_opaque_wrapper() {
    let reg = registry();
    let err = WithStack::with_stack(Message::new("boom"), StackTrace::from_frames(["frame9"]));
    let decoded = round_trip(&reg, &err);

    assert_eq!(decoded.to_string(), "boom");
    let opaque = decoded.downcast_ref::<OpaqueWrapper>().expect("opaque wrapper");
    assert_eq!(opaque.message_prefix(), "");
    assert_eq!(opaque.safe_details(), ["frame9"]);
    // The cause below it still has an exact codec.
    assert!(opaque.cause().downcast_ref::<Message>().is_some());
}

#[test]
fn oversized_stack_is_truncated_but_still_round_trips() {
    let reg = registry();
    let frames: Vec<String> = (0..1500)
        .map(|i| format!("{i:>4}: app::worker::process_batch::{{{{closure}}}} at src/worker.rs:{i}"))
        .collect();
    let stack = StackTrace::from_frames(frames);
    assert!(stack.to_string().len() > CodecConfig::default().max_safe_detail_bytes);

    let err = Traced::with_stack("boom", stack);
    let decoded = round_trip(&reg, &err);
    assert_eq!(decoded.to_string(), "boom");

    let opaque = decoded.downcast_ref::<OpaqueLeaf>().expect("opaque leaf");
    let detail = &opaque.safe_details()[0];
    assert!(detail.len() <= CodecConfig::default().max_safe_detail_bytes);
    assert!(detail.starts_with("   0: app::worker::process_batch"));
    assert!(detail.ends_with(TRUNCATION_MARKER));
}

// ─── Fallback ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct Unregistered {
    path: String,
}

impl std::fmt::Display for Unregistered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot open {}", self.path)
    }
}

impl Error for Unregistered {}

#[test]
fn unregistered_types_never_fail_to_decode() {
    let reg = registry();
    let errors: Vec<BoxError> = vec![
        Box::new(Unregistered { path: "/etc/app.toml".into() }),
        Box::new(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")),
        Box::new("x".parse::<u32>().unwrap_err()),
    ];
    for err in &errors {
        let decoded = round_trip(&reg, err.as_ref());
        assert_eq!(decoded.to_string(), err.to_string());
        assert!(decoded.is::<OpaqueLeaf>());
    }
}

#[derive(Debug)]
struct Throttled;

impl std::fmt::Display for Throttled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("throttled")
    }
}

impl Error for Throttled {}

#[test]
fn unregistered_top_level_types_keep_their_names() {
    let reg = registry();
    let cfg = CodecConfig::default();
    let a = encode_chain_of(&reg, &Unregistered { path: "/tmp/x".into() }, &cfg).unwrap();
    let b = encode_chain_of(&reg, &Throttled, &cfg).unwrap();
    assert_eq!(*a.nodes[0].type_key(), TypeKey::of::<Unregistered>());
    assert_eq!(*b.nodes[0].type_key(), TypeKey::of::<Throttled>());
    assert_ne!(a.nodes[0].type_key(), b.nodes[0].type_key());

    let decoded = decode_chain(&reg, &b, &cfg).unwrap();
    let opaque = decoded.downcast_ref::<OpaqueLeaf>().expect("opaque leaf");
    assert!(opaque.type_key().as_str().ends_with("Throttled"));
    assert_eq!(decoded.to_string(), "throttled");
}

// ─── Chains ───────────────────────────────────────────────────────────────────

#[test]
fn chain_preserves_order_and_messages() {
    let reg = registry();
    let depth = 5;
    let err = (0..depth).fold(Box::new(Message::new("root cause")) as BoxError, |cause, i| {
        if i % 2 == 0 {
            Box::new(Context::new(cause, format!("step {i}")))
        } else {
            Box::new(WithStack::with_stack(cause, StackTrace::from_frames([format!("at {i}")])))
        }
    });

    let chain = encode_chain(&reg, err.as_ref(), &CodecConfig::default()).unwrap();
    assert_eq!(chain.len(), depth + 1);
    assert!(matches!(chain.nodes[0], EncodedNode::Leaf(_)));

    let decoded = round_trip(&reg, err.as_ref());
    let original: Vec<String> = causes(err.as_ref()).map(|e| e.to_string()).collect();
    let rebuilt: Vec<String> = causes(decoded.as_ref()).map(|e| e.to_string()).collect();
    assert_eq!(rebuilt.len(), depth + 1);
    assert_eq!(rebuilt, original);
    assert_eq!(
        decoded.to_string(),
        "step 4: step 2: step 0: root cause"
    );
}

#[test]
fn mixed_chain_keeps_exact_types_where_registered() {
    let reg = registry();
    let err = Context::new(
        WithStack::with_stack(
            Traced::with_stack("file not found", StackTrace::from_frames(["frame1", "frame2"])),
            StackTrace::from_frames(["frame3"]),
        ),
        "while loading config",
    );
    let decoded = round_trip(&reg, &err);
    assert_eq!(decoded.to_string(), "while loading config: file not found");

    let levels: Vec<&(dyn Error + 'static)> = causes(decoded.as_ref()).collect();
    assert_eq!(levels.len(), 3);
    assert!(levels[0].is::<Context>());
    assert!(levels[1].is::<OpaqueWrapper>());
    assert!(levels[2].is::<OpaqueLeaf>());
}

#[test]
fn forwarding_through_an_intermediate_process_is_lossless() {
    let reg = registry();
    let err = Context::new(
        Traced::with_stack("timeout", StackTrace::from_frames(["f"])),
        "calling ledger",
    );
    let cfg = CodecConfig::default();
    let first = encode_chain(&reg, &err, &cfg).unwrap();
    let relayed = decode_chain(&reg, &first, &cfg).unwrap();
    let second = encode_chain(&reg, relayed.as_ref(), &cfg).unwrap();
    assert_eq!(first, second);
}

// ─── Concurrency ──────────────────────────────────────────────────────────────

#[test]
fn concurrent_encode_decode() {
    let reg = Arc::new(registry());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let reg = Arc::clone(&reg);
            thread::spawn(move || {
                let err = Context::new(Message::new(format!("leaf {i}")), format!("wrap {i}"));
                let decoded = round_trip(&reg, &err);
                assert!(decoded.is::<Context>());
                decoded.to_string()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("wrap {i}: leaf {i}"));
    }
}
