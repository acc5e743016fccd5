//! A `criterion` harness driving the validator over a realistic document
//! shape, rather than a microbenchmark of a single handler.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use orderly::event::NoopSink;
use orderly::schema::build::{self, SchemaSource};
use orderly::schema::SchemaTree;
use orderly::validator::{ParserConfig, Validator};
use serde_json::json;

fn order_schema() -> SchemaTree {
    let source: SchemaSource = serde_json::from_value(json!({
        "kind": "object",
        "children": [
            {"kind": "string", "name": "order_id"},
            {"kind": "string", "name": "customer_email", "format": "email"},
            {"kind": "integer", "name": "quantity", "range": {"lhs": 1, "rhs": 1000}},
            {"kind": "number", "name": "unit_price", "range": {"lhs": 0.0}},
            {"kind": "boolean", "name": "expedited", "optional": true, "default_value": false},
            {
                "kind": "array",
                "name": "line_items",
                "children": [{
                    "kind": "object",
                    "children": [
                        {"kind": "string", "name": "sku"},
                        {"kind": "integer", "name": "count", "range": {"lhs": 1}}
                    ]
                }]
            }
        ]
    }))
    .unwrap();
    build::build_schema(&source).unwrap()
}

fn sample_document() -> serde_json::Value {
    json!({
        "order_id": "order-00042",
        "customer_email": "buyer@example.com",
        "quantity": 12,
        "unit_price": 19.99,
        "line_items": [
            {"sku": "sku-1", "count": 3},
            {"sku": "sku-2", "count": 9}
        ]
    })
}

fn validate_in_memory(c: &mut Criterion) {
    let tree = order_schema();
    let doc = sample_document();

    c.bench_function("validate_in_memory_document", |b| {
        b.iter(|| {
            let mut v = Validator::new(ParserConfig::default(), Some(&tree));
            let mut sink = NoopSink;
            black_box(v.validate(black_box(&doc), &mut sink));
        });
    });
}

fn validate_streamed_bytes(c: &mut Criterion) {
    let tree = order_schema();
    let body = serde_json::to_vec(&sample_document()).unwrap();

    c.bench_function("validate_streamed_bytes", |b| {
        b.iter(|| {
            let mut v = Validator::new(ParserConfig::default(), Some(&tree));
            let mut sink = NoopSink;
            black_box(v.parse_and_validate(black_box(&body), &mut sink).unwrap());
        });
    });
}

criterion_group!(benches, validate_in_memory, validate_streamed_bytes);
criterion_main!(benches);
