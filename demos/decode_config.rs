//! Decode an application config into typed structs.
//!
//! Run with: cargo run --example decode_config

use serde::Deserialize;
use serde_toml_tree::{from_str, from_str_with_config, TomlInputConfig};
use std::collections::BTreeMap;
use std::error::Error;

#[derive(Debug, Deserialize)]
struct Listener {
    port: u16,
    tls: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct Config {
    name: String,
    workers: u32,
    listeners: Vec<Listener>,
    limits: BTreeMap<String, u64>,
}

const CONFIG: &str = r#"
name = "gateway"
workers = 8
log_format = "json"   # not used by this binary

[limits]
requests_per_second = 1_000
burst = 0x40

[[listeners]]
port = 80

[[listeners]]
port = 443
tls = true
"#;

fn main() -> Result<(), Box<dyn Error>> {
    // The default configuration rejects keys the struct does not declare.
    match from_str::<Config>(CONFIG) {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("Strict decode failed as expected: {}", e),
    }

    let config = TomlInputConfig::new().with_ignore_unknown_names(true);
    let decoded: Config = from_str_with_config(CONFIG, &config)?;
    println!("{:#?}", decoded);

    assert_eq!(decoded.listeners.len(), 2);
    assert_eq!(decoded.limits["burst"], 64);
    println!("✓ Decoded {} with {} workers", decoded.name, decoded.workers);

    Ok(())
}
