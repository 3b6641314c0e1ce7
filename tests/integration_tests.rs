use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_toml_tree::{
    from_str, from_str_with_config, from_tree, parse_str, to_string, to_string_with_config,
    to_tree, to_value, tree_to_string, Error, Indentation, TomlInputConfig, TomlOutputConfig,
    TomlValue,
};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
    note: Option<String>,
}

fn order() -> Order {
    Order {
        order_id: 12345,
        customer: User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["vip".to_string()],
        },
        items: vec![
            Product {
                sku: "A-1".to_string(),
                price: 9.99,
                quantity: 2,
            },
            Product {
                sku: "B-2".to_string(),
                price: 14.5,
                quantity: 1,
            },
        ],
        total: 34.48,
        note: None,
    }
}

const EXAMPLE: &str = r#"
# This is a TOML document.

title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00 # First class dates

[database]
server = "192.168.1.1"
ports = [ 8001, 8001, 8002 ]
connection_max = 5000
enabled = true

[servers]

  # Indentation (tabs and/or spaces) is allowed but not required
  [servers.alpha]
  ip = "10.0.0.1"
  dc = "eqdc10"

  [servers.beta]
  ip = "10.0.0.2"
  dc = "eqdc10"

[clients]
data = [ ["gamma", "delta"], [1, 2] ]

# Line breaks are OK when inside arrays
hosts = [
  "alpha",
  "omega"
]
"#;

#[test]
fn test_example_document_matches_json() {
    let value: serde_json::Value = from_str(EXAMPLE).unwrap();
    assert_eq!(
        value,
        json!({
            "title": "TOML Example",
            "owner": {
                "name": "Tom Preston-Werner",
                "dob": "1979-05-27T07:32:00-08:00"
            },
            "database": {
                "server": "192.168.1.1",
                "ports": [8001, 8001, 8002],
                "connection_max": 5000,
                "enabled": true
            },
            "servers": {
                "alpha": { "ip": "10.0.0.1", "dc": "eqdc10" },
                "beta": { "ip": "10.0.0.2", "dc": "eqdc10" }
            },
            "clients": {
                "data": [["gamma", "delta"], [1, 2]],
                "hosts": ["alpha", "omega"]
            }
        })
    );
}

#[test]
fn test_example_document_typed() {
    #[derive(Deserialize)]
    struct Server {
        ip: String,
        dc: String,
    }
    #[derive(Deserialize)]
    struct Database {
        ports: Vec<u16>,
        connection_max: u32,
        enabled: bool,
    }
    #[derive(Deserialize)]
    struct Document {
        database: Database,
        servers: BTreeMap<String, Server>,
    }

    let config = TomlInputConfig::new().with_ignore_unknown_names(true);
    let doc: Document = from_str_with_config(EXAMPLE, &config).unwrap();
    assert_eq!(doc.database.ports, vec![8001, 8001, 8002]);
    assert_eq!(doc.database.connection_max, 5000);
    assert!(doc.database.enabled);
    assert_eq!(doc.servers["beta"].ip, "10.0.0.2");
    assert_eq!(doc.servers["alpha"].dc, "eqdc10");
}

#[test]
fn test_unknown_names() {
    #[derive(Deserialize, Debug)]
    struct Small {
        #[allow(dead_code)]
        title: String,
    }

    let err = from_str::<Small>(EXAMPLE).unwrap_err();
    assert_eq!(err, Error::unknown_name("owner", 6));
}

#[test]
fn test_nested_struct_round_trip() {
    let order = order();
    let toml = to_string(&order).unwrap();
    println!("Order TOML:\n{}", toml);

    let order_back: Order = from_str(&toml).unwrap();
    assert_eq!(order, order_back);
}

#[test]
fn test_round_trip_with_every_indentation() {
    for indentation in [
        Indentation::None,
        Indentation::TwoSpaces,
        Indentation::FourSpaces,
        Indentation::Tab,
    ] {
        let config = TomlOutputConfig::new().with_indentation(indentation);
        let toml = to_string_with_config(&order(), &config).unwrap();
        let order_back: Order = from_str(&toml).unwrap();
        assert_eq!(order(), order_back);
    }
}

#[test]
fn test_null_values_on_output() {
    let order = order();
    let skipped = to_string(&order).unwrap();
    assert!(!skipped.contains("note"));

    let config = TomlOutputConfig::new().with_ignore_null_values(false);
    let kept = to_string_with_config(&order, &config).unwrap();
    assert!(kept.contains("note = null\n"));

    let order_back: Order = from_str(&kept).unwrap();
    assert_eq!(order_back.note, None);
}

#[test]
fn test_explicit_tables() {
    let doc = BTreeMap::from([(
        "a",
        BTreeMap::from([("b", BTreeMap::from([("c", 1)]))]),
    )]);
    let flat = TomlOutputConfig::new().with_indentation(Indentation::None);
    assert_eq!(to_string_with_config(&doc, &flat).unwrap(), "[a.b]\nc = 1\n");
    assert_eq!(
        to_string_with_config(&doc, &flat.clone().with_explicit_tables(true)).unwrap(),
        "[a]\n\n[a.b]\nc = 1\n"
    );
}

#[test]
fn test_decode_from_tree_keeps_comments_available() {
    let tree = parse_str("# greeting\nhello = \"world\"").unwrap();
    let map: BTreeMap<String, String> = from_tree(&tree, &TomlInputConfig::new()).unwrap();
    assert_eq!(map["hello"], "world");
    assert_eq!(
        tree.node(tree.children(tree.root())[0]).comments(),
        &[" greeting".to_string()]
    );
}

#[test]
fn test_written_document_keeps_comments() {
    let text = "# top\nname = \"x\" # the name\n\n[t]\nv = 1\n";
    let tree = parse_str(text).unwrap();
    let flat = TomlOutputConfig::new().with_indentation(Indentation::None);
    assert_eq!(tree_to_string(&tree, &flat), "# top\nname = \"x\" # the name\n\n[t]\nv = 1\n");
}

#[test]
fn test_chrono_types() {
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Times {
        at: DateTime<FixedOffset>,
        day: NaiveDate,
        alarm: NaiveTime,
    }

    let times: Times =
        from_str("at = 1979-05-27T07:32:00Z\nday = 1979-05-27\nalarm = 07:32:00").unwrap();
    assert_eq!(times.day, NaiveDate::from_ymd_opt(1979, 5, 27).unwrap());
    assert_eq!(times.alarm, NaiveTime::from_hms_opt(7, 32, 0).unwrap());

    let toml = to_string(&times).unwrap();
    let back: Times = from_str(&toml).unwrap();
    assert_eq!(times, back);
}

#[test]
fn test_enum_round_trip() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Backend {
        Memory,
        Disk { path: String },
        Remote(String),
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Storage {
        primary: Backend,
        fallback: Backend,
        cache: Backend,
    }

    let storage = Storage {
        primary: Backend::Disk {
            path: "/var/data".to_string(),
        },
        fallback: Backend::Remote("s3://bucket".to_string()),
        cache: Backend::Memory,
    };
    let toml = to_string(&storage).unwrap();
    let back: Storage = from_str(&toml).unwrap();
    assert_eq!(storage, back);
}

#[test]
fn test_to_value_and_tree() {
    let value = to_value(&order()).unwrap();
    let table = value.as_table().unwrap();
    assert_eq!(table.get("order_id"), Some(&TomlValue::Integer(12345)));
    assert!(table.get("items").unwrap().is_array());

    let config = TomlOutputConfig::new();
    let tree = to_tree(&order(), &config).unwrap();
    let reparsed = parse_str(&tree_to_string(&tree, &config)).unwrap();
    assert_eq!(tree.pretty_print(), reparsed.pretty_print());
}

#[test]
fn test_decode_error_carries_line() {
    #[derive(Deserialize, Debug)]
    struct Limits {
        #[allow(dead_code)]
        max: u8,
    }
    #[derive(Deserialize, Debug)]
    struct Config {
        #[allow(dead_code)]
        limits: Limits,
    }

    let err = from_str::<Config>("[limits]\n\nmax = 1000").unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert!(err.to_string().contains("line 3"));

    let err = from_str::<Config>("[limits]\nmax = \"many\"").unwrap_err();
    assert!(matches!(err, Error::Decode { line: 2, .. }));
}

#[test]
fn test_parse_error_surfaces_through_from_str() {
    let err = from_str::<serde_json::Value>("a = 1\nb = [1, 2").unwrap_err();
    assert!(matches!(err, Error::Parse { line: 2, .. }));
}
