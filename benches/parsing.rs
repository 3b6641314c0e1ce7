use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_toml_tree::{from_str, parse_str, to_string, tree_to_string, TomlOutputConfig};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize, Deserialize, Clone)]
struct Catalog {
    title: String,
    tags: Vec<String>,
    products: Vec<Product>,
}

const DOCUMENT: &str = r#"
# This is a TOML document.
title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
enabled = true
ports = [ 8000, 8001, 8002 ]
data = [ ["delta", "phi"], [3.14] ]
temp_targets = { cpu = 79.5, case = 72.0 }

[servers]

[servers.alpha]
ip = "10.0.0.1"
role = "frontend"

[servers.beta]
ip = "10.0.0.2"
role = """
backend
service"""

[[products]]
name = "Hammer"
sku = 738594937

[[products]]

[[products]]
name = "Nail"
sku = 284758393
color = "gray"
"#;

fn catalog(size: u32) -> Catalog {
    Catalog {
        title: "catalog".to_string(),
        tags: vec!["tools".to_string(), "hardware".to_string()],
        products: (0..size)
            .map(|i| Product {
                sku: format!("SKU{}", i),
                name: format!("Product {}", i),
                price: 9.99 + f64::from(i),
                quantity: i,
            })
            .collect(),
    }
}

fn benchmark_parse_document(c: &mut Criterion) {
    c.bench_function("parse_document", |b| {
        b.iter(|| parse_str(black_box(DOCUMENT)))
    });
}

fn benchmark_decode_document(c: &mut Criterion) {
    c.bench_function("decode_document", |b| {
        b.iter(|| from_str::<serde_json::Value>(black_box(DOCUMENT)))
    });
}

fn benchmark_write_document(c: &mut Criterion) {
    let tree = parse_str(DOCUMENT).unwrap();
    let config = TomlOutputConfig::new();
    c.bench_function("write_document", |b| {
        b.iter(|| tree_to_string(black_box(&tree), &config))
    });
}

fn benchmark_array_of_tables(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_of_tables");

    for size in [10, 100, 500].iter() {
        let text = to_string(&catalog(*size)).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", size), &text, |b, text| {
            b.iter(|| from_str::<Catalog>(black_box(text)))
        });

        let data = catalog(*size);
        group.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| to_string(black_box(data)))
        });
    }
    group.finish();
}

fn benchmark_multiline_arrays(c: &mut Criterion) {
    let mut group = c.benchmark_group("multiline_arrays");

    for size in [10, 100, 1000].iter() {
        let body: String = (0..*size).map(|i| format!("  {}, # item\n", i)).collect();
        let text = format!("values = [\n{}]\n", body);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| parse_str(black_box(text)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_parse_document,
    benchmark_decode_document,
    benchmark_write_document,
    benchmark_array_of_tables,
    benchmark_multiline_arrays
);
criterion_main!(benches);
