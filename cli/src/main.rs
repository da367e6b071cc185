//! errwire CLI: encode and decode error chains from the terminal.
//!
//! Usage:
//! ```bash
//! # Encode a sample chain, print its records, then decode it again
//! errwire demo
//!
//! # Same, printing the records as JSON
//! errwire demo --json
//!
//! # Decode an encoded chain received from elsewhere
//! errwire decode --file chain.json
//! cat chain.json | errwire decode
//! ```

mod logging;

use std::env;
use std::error::Error;
use std::io::Read;
use std::process;

use anyhow::{bail, Context as _};
use errwire_adapters::{Context, Traced, WithStack};
use tracing::debug;

use errwire_core::{
    causes, decode_error, encode_error, EncodedChain, EncodedNode, OpaqueLeaf, OpaqueWrapper,
};

fn main() {
    let log_config = match logging::LogConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    };
    logging::init_tracing(&log_config);

    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    errwire_adapters::install().context("registering example adapters")?;

    match args[1].as_str() {
        "demo" => cmd_demo(&args[2..]),
        "decode" => cmd_decode(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("errwire {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("errwire {}", env!("CARGO_PKG_VERSION"));
    println!("Encode and decode error chains\n");
    println!("USAGE:");
    println!("    errwire <COMMAND>\n");
    println!("COMMANDS:");
    println!("    demo      Encode a sample chain and decode it back");
    println!("    decode    Decode an encoded chain (JSON)");
    println!("    version   Print version");
    println!("    help      Print this help\n");
    println!("FLAGS:");
    println!("    --json            demo: print the records as JSON");
    println!("    --file <PATH>     decode: read the chain from a file instead of stdin\n");
    println!("ENVIRONMENT:");
    println!("    ERRWIRE_LOG_CONFIG  JSON file with \"level\" and \"json\" log settings");
    println!("    ERRWIRE_LOG         Log filter, overrides the file (default: warn)");
    println!("    ERRWIRE_LOG_JSON    Set to 1 for JSON logs, overrides the file");
}

fn cmd_demo(args: &[String]) -> anyhow::Result<()> {
    let mut as_json = false;
    for arg in args {
        match arg.as_str() {
            "--json" => as_json = true,
            flag => bail!("Unknown flag: {flag}"),
        }
    }

    let err = Context::new(
        WithStack::new(Traced::new("file not found")),
        "while loading config",
    );
    let chain = encode_error(&err)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
    } else {
        println!("Encoded {} record(s), innermost first:", chain.len());
        for (i, node) in chain.nodes.iter().enumerate() {
            print_node(i, node);
        }
        println!();
    }

    let decoded = decode_error(&chain)?;
    print_decoded(decoded.as_ref());
    Ok(())
}

fn cmd_decode(args: &[String]) -> anyhow::Result<()> {
    let mut path: Option<&str> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--file" => {
                i += 1;
                path = args.get(i).map(|s| s.as_str());
                if path.is_none() {
                    bail!("--file requires a path");
                }
            }
            flag => bail!("Unknown flag: {flag}"),
        }
        i += 1;
    }

    let json = match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading {p}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let chain = EncodedChain::from_json(&json).context("parsing encoded chain")?;
    debug!(records = chain.len(), "decoding chain");
    let decoded = decode_error(&chain)?;
    print_decoded(decoded.as_ref());
    Ok(())
}

fn print_node(index: usize, node: &EncodedNode) {
    match node {
        EncodedNode::Leaf(leaf) => {
            println!("  [{index}] leaf     {}", leaf.type_key);
            println!("        message: {:?}", leaf.message);
        }
        EncodedNode::Wrapper(wrapper) => {
            println!("  [{index}] wrapper  {}", wrapper.type_key);
            println!("        prefix:  {:?}", wrapper.message_prefix);
        }
    }
    print_safe_details(node.safe_details());
}

fn print_decoded(err: &(dyn Error + 'static)) {
    println!("Decoded: {err}");
    for (depth, level) in causes(err).enumerate() {
        let (kind, details): (&str, &[String]) =
            if let Some(leaf) = level.downcast_ref::<OpaqueLeaf>() {
                ("opaque leaf", leaf.safe_details())
            } else if let Some(wrapper) = level.downcast_ref::<OpaqueWrapper>() {
                ("opaque wrapper", wrapper.safe_details())
            } else {
                ("exact", &[])
            };
        println!("  {depth}: [{kind}] {level}");
        print_safe_details(details);
    }
}

fn print_safe_details(details: &[String]) {
    for detail in details {
        for (n, line) in detail.lines().enumerate() {
            let marker = if n == 0 { "safe:" } else { "     " };
            println!("        {marker} {line}");
        }
    }
}
