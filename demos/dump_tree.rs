//! Parse a TOML document and print its node outline, then write it back.
//!
//! Run with: cargo run --example dump_tree [path]

use serde_toml_tree::{parse_str, tree_to_string, TomlOutputConfig};
use std::error::Error;

const SAMPLE: &str = r#"
# Servers behind the load balancer
[[servers]]
name = "alpha"
ip = "10.0.0.1"

[[servers]]
name = "beta"
ip = "10.0.0.2"
tls.enabled = true

[database]
ports = [
  8000, # primary
  8001, # replica
]
"#;

fn main() -> Result<(), Box<dyn Error>> {
    let text = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    let tree = parse_str(&text)?;
    println!("Outline ({} nodes):\n{}", tree.node_count(), tree.pretty_print());

    let written = tree_to_string(&tree, &TomlOutputConfig::new());
    println!("Written back:\n{}", written);

    Ok(())
}
