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
fn each_branch_is_tried_in_declaration_order() {
    let tree = schema(json!({
        "kind": "union",
        "children": [
            {"kind": "string"},
            {"kind": "integer", "range": {"lhs": 0, "rhs": 10}}
        ]
    }));

    let mut sink = NoopSink;

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    assert_eq!(v.validate(&json!("hello"), &mut sink), Status::Ok);

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    assert_eq!(v.validate(&json!(3), &mut sink), Status::Ok);
}

#[test]
fn a_branch_specific_constraint_still_applies_once_selected() {
    let tree = schema(json!({
        "kind": "union",
        "children": [
            {"kind": "string"},
            {"kind": "integer", "range": {"lhs": 0, "rhs": 10}}
        ]
    }));

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    let mut sink = NoopSink;
    assert_eq!(v.validate(&json!(42), &mut sink), Status::Error);
}

#[test]
fn a_value_matching_no_branch_is_a_type_mismatch() {
    let tree = schema(json!({
        "kind": "union",
        "children": [{"kind": "string"}, {"kind": "integer"}]
    }));
    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    let mut sink = NoopSink;
    assert_eq!(v.validate(&json!(true), &mut sink), Status::Error);
}

#[test]
fn a_union_nested_in_an_object_still_resolves_per_member() {
    let tree = schema(json!({
        "kind": "object",
        "children": [{
            "kind": "union",
            "name": "id",
            "children": [{"kind": "string"}, {"kind": "integer"}]
        }]
    }));

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    let mut sink = NoopSink;
    assert_eq!(v.validate(&json!({"id": "abc"}), &mut sink), Status::Ok);

    let mut v = Validator::new(ParserConfig::default(), Some(&tree));
    assert_eq!(v.validate(&json!({"id": 7}), &mut sink), Status::Ok);
}
