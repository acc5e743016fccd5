use orderly::event::NoopSink;
use orderly::schema::build::{self, SchemaSource};
use orderly::schema::SchemaTree;
use orderly::validator::{ParserConfig, Status, Validator};
use serde_json::json;

fn schema(v: serde_json::Value) -> SchemaTree {
    let source: SchemaSource = serde_json::from_value(v).unwrap();
    build::build_schema(&source).unwrap()
}

#[test]
fn accepts_a_well_formed_document() {
    let tree = schema(json!({
        "kind": "object",
        "children": [
            {"kind": "string", "name": "name"},
            {"kind": "integer", "name": "age"},
            {"kind": "boolean", "name": "active", "optional": true}
        ]
    }));

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    let mut sink = NoopSink;
    let status = v.validate(&json!({"name": "Alice", "age": 30}), &mut sink);
    assert_eq!(status, Status::Ok);
    assert!(v.get_error(false, None).is_none());
}

#[test]
fn rejects_a_type_mismatch() {
    let tree = schema(json!({
        "kind": "object",
        "children": [{"kind": "integer", "name": "age"}]
    }));

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    let mut sink = NoopSink;
    let status = v.validate(&json!({"age": "not a number"}), &mut sink);
    assert_eq!(status, Status::Error);
    assert!(v.get_error(false, None).unwrap().starts_with("schema does not allow type"));
}

#[test]
fn streamed_bytes_match_the_in_memory_result() {
    let tree = schema(json!({
        "kind": "object",
        "children": [{"kind": "string", "name": "name"}]
    }));

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    let mut sink = NoopSink;
    let status = v
        .parse_and_validate(br#"{"name": "Bob"}"#, &mut sink)
        .unwrap();
    assert_eq!(status, Status::Ok);
    assert_eq!(v.parse_complete(), Status::Ok);
}
