//! Encode Rust structs as TOML with different output options.
//!
//! Run with: cargo run --example encode_config

use serde::{Deserialize, Serialize};
use serde_toml_tree::{from_str, to_string, to_string_with_config, Indentation, TomlOutputConfig};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Dependency {
    version: String,
    optional: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Package {
    name: String,
    version: String,
    authors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Manifest {
    package: Package,
    dependencies: std::collections::BTreeMap<String, Dependency>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let manifest = Manifest {
        package: Package {
            name: "demo".to_string(),
            version: "0.1.0".to_string(),
            authors: vec!["Ada".to_string()],
        },
        dependencies: [
            (
                "serde".to_string(),
                Dependency {
                    version: "1.0".to_string(),
                    optional: None,
                },
            ),
            (
                "tracing".to_string(),
                Dependency {
                    version: "0.1".to_string(),
                    optional: Some(true),
                },
            ),
        ]
        .into_iter()
        .collect(),
    };

    let default = to_string(&manifest)?;
    println!("Default output:\n{}", default);

    let options = TomlOutputConfig::new()
        .with_indentation(Indentation::None)
        .with_explicit_tables(true)
        .with_ignore_null_values(false);
    let explicit = to_string_with_config(&manifest, &options)?;
    println!("Flat, explicit tables, nulls kept:\n{}", explicit);

    let back: Manifest = from_str(&default)?;
    assert_eq!(manifest, back);
    println!("✓ Round-trip successful");

    Ok(())
}
