//! The validator handle: owns the frame stack and cursor, dispatches one
//! method per event kind, and accumulates at most one live error.
//!
//! Container-close handlers reconcile each frame's `required` set against
//! what was actually `seen`, synthesizing default values where one is
//! declared and raising `incomplete_container` otherwise.

use crate::cursor::{Cursor, FrameStack};
use crate::error::{ErrorCode, ExtraInfo, ValidationError};
use crate::event::EventSink;
use crate::schema::{AdditionalProperties, Kind, NodeId, Range, SchemaTree, ValueKind};

/// Knobs an incremental parser needs beyond the schema itself, kept here as
/// a small ambient configuration surface rather than threaded through every
/// call.
#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// Whether more than one top-level value is permitted back-to-back in
    /// a single stream, rather than treating anything past the first
    /// complete value as `trailing_input`.
    pub allow_multiple_values: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            allow_multiple_values: false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    NeedsMoreInput,
    Error,
}

/// A validator handle. Constructed once per document stream; `schema =
/// None` selects passthrough mode, forwarding every event unchecked rather
/// than swapping in a different callback table.
pub struct Validator<'s> {
    schema: Option<&'s SchemaTree>,
    frames: FrameStack,
    error: Option<ValidationError>,
    buffer: Vec<u8>,
    bytes_consumed: u64,
    config: ParserConfig,
}

impl<'s> Validator<'s> {
    pub fn new(config: ParserConfig, schema: Option<&'s SchemaTree>) -> Self {
        let root = schema.map(|t| t.root()).unwrap_or(NodeId::new(0));
        Validator {
            schema,
            frames: FrameStack::new(root),
            error: None,
            buffer: Vec::new(),
            bytes_consumed: 0,
            config,
        }
    }

    /// Feed another chunk of wire bytes. May be called repeatedly as more
    /// of the stream arrives; buffers internally until a complete
    /// top-level value is available.
    pub fn parse_and_validate<S: EventSink>(
        &mut self,
        bytes: &[u8],
        sink: &mut S,
    ) -> Result<Status, serde_json::Error> {
        self.buffer.extend_from_slice(bytes);

        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
            return Ok(Status::Ok);
        }

        let mut de = serde_json::Deserializer::from_slice(&self.buffer);
        match crate::de::walk(&mut de, self, sink) {
            Ok(_) => {
                let offset = de.byte_offset();
                self.bytes_consumed += offset as u64;
                self.buffer.drain(..offset);

                if !self.config.allow_multiple_values
                    && self.buffer.iter().any(|b| !b.is_ascii_whitespace())
                {
                    self.set_error(ErrorCode::TrailingInput, None, ExtraInfo::None);
                    return Ok(Status::Error);
                }
                Ok(Status::Ok)
            }
            Err(e) => {
                if self.error.is_some() {
                    Ok(Status::Error)
                } else if e.is_eof() {
                    Ok(Status::NeedsMoreInput)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Signal end of input. Promotes "no root event ever seen" to
    /// `incomplete_container`, and flags unconsumed buffered bytes as
    /// `trailing_input`.
    pub fn parse_complete(&mut self) -> Status {
        if self.error.is_some() {
            return Status::Error;
        }
        if self.schema.is_some() && !self.frames.root_seen() {
            self.set_error(ErrorCode::IncompleteContainer, None, ExtraInfo::None);
            return Status::Error;
        }
        if self.buffer.iter().any(|b| !b.is_ascii_whitespace()) {
            self.set_error(ErrorCode::TrailingInput, None, ExtraInfo::None);
            return Status::Error;
        }
        Status::Ok
    }

    /// Validate an already-materialized document by synthesizing its event
    /// sequence, rather than parsing wire bytes.
    pub fn validate<S: EventSink>(&mut self, document: &serde_json::Value, sink: &mut S) -> Status {
        if !crate::de::synthesize(self, document, sink) {
            return Status::Error;
        }
        if self.schema.is_some() && !self.frames.root_seen() {
            self.set_error(ErrorCode::IncompleteContainer, None, ExtraInfo::None);
            return Status::Error;
        }
        Status::Ok
    }

    pub fn get_error(&self, verbose: bool, parser_message: Option<&str>) -> Option<String> {
        self.error
            .as_ref()
            .map(|e| e.render(self.schema, verbose, parser_message))
    }

    pub fn get_bytes_consumed(&self) -> u64 {
        self.bytes_consumed
    }

    fn set_error(&mut self, code: ErrorCode, node: Option<NodeId>, extra: ExtraInfo) {
        tracing::debug!(?code, "validation error");
        self.error = Some(ValidationError::new(code, node, extra));
    }

    /// Resolve the schema position that should govern an incoming event of
    /// kind `value`, following union branches, or confirm a synthetic
    /// position still admits it. Records a `type_mismatch` and returns
    /// `Err` on failure.
    fn resolve_for_value(&mut self, value: ValueKind) -> Result<Cursor, ()> {
        let tree = self.schema.expect("resolve_for_value is only called in validating mode");
        match self.frames.cursor {
            Cursor::Synthetic(ap) => {
                if ap.admits(value) {
                    Ok(Cursor::Synthetic(ap))
                } else {
                    self.set_error(ErrorCode::TypeMismatch, None, ExtraInfo::None);
                    Err(())
                }
            }
            Cursor::Node(id) => {
                let node = tree.node(id);
                if node.kind() == Kind::Union {
                    for child in node.children() {
                        if tree.node(child).kind().admits(value) {
                            return Ok(Cursor::Node(child));
                        }
                    }
                    self.set_error(ErrorCode::TypeMismatch, Some(id), ExtraInfo::None);
                    Err(())
                } else if node.kind().admits(value) {
                    Ok(Cursor::Node(id))
                } else {
                    let extra = self.type_mismatch_extra(id);
                    self.set_error(ErrorCode::TypeMismatch, Some(id), extra);
                    Err(())
                }
            }
        }
    }

    fn type_mismatch_extra(&self, id: NodeId) -> ExtraInfo {
        let tree = self.schema.unwrap();
        if let Some(parent) = tree.node(id).parent() {
            let parent_node = tree.node(parent);
            if parent_node.kind() == Kind::Array && parent_node.tuple_typed() {
                let idx = parent_node.children().position(|c| c == id).map(|i| i + 1).unwrap_or(1);
                return ExtraInfo::ArrayIndex(idx);
            }
        }
        ExtraInfo::None
    }

    fn mark_resolved(&mut self, resolved: Cursor) {
        match resolved {
            Cursor::Node(id) => {
                let tree = self.schema.unwrap();
                self.frames.mark_seen(id, tree);
            }
            Cursor::Synthetic(_) => self.frames.mark_seen_synthetic(),
        }
    }

    pub(crate) fn handle_start_object<S: EventSink>(&mut self, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.start_object();
        }
        match self.resolve_for_value(ValueKind::Object) {
            Ok(entry) => {
                self.frames.push(entry, self.schema.unwrap());
                sink.start_object()
            }
            Err(()) => false,
        }
    }

    pub(crate) fn handle_start_array<S: EventSink>(&mut self, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.start_array();
        }
        match self.resolve_for_value(ValueKind::Array) {
            Ok(entry) => {
                self.frames.push(entry, self.schema.unwrap());
                sink.start_array()
            }
            Err(()) => false,
        }
    }

    pub(crate) fn handle_end_object<S: EventSink>(&mut self, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.end_object();
        }
        let tree = self.schema.unwrap();

        let missing: Vec<NodeId> = {
            let frame = self.frames.top();
            frame
                .required
                .iter()
                .copied()
                .filter(|id| !frame.seen.contains(id))
                .collect()
        };

        for id in missing {
            let node = tree.node(id);
            let name = node.name().unwrap_or_default().to_string();
            match node.default_value().cloned() {
                Some(default) => {
                    if !self.handle_map_key(&name, sink) {
                        return false;
                    }
                    if !crate::de::synthesize(self, &default, sink) {
                        return false;
                    }
                }
                None => {
                    self.set_error(
                        ErrorCode::IncompleteContainer,
                        Some(id),
                        ExtraInfo::MissingProperty(name),
                    );
                    return false;
                }
            }
        }

        if !sink.end_object() {
            return false;
        }
        let frame = self.frames.pop();
        self.mark_resolved(frame.opened_by);
        true
    }

    pub(crate) fn handle_end_array<S: EventSink>(&mut self, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.end_array();
        }
        let tree = self.schema.unwrap();

        let (opened_by, seen_len) = {
            let frame = self.frames.top();
            (frame.opened_by, frame.seen.len())
        };

        if let Cursor::Node(container_id) = opened_by {
            let node = tree.node(container_id);
            let range = node.range();
            if !range.is_unset() && !range.admits(seen_len as f64) {
                self.set_error(
                    ErrorCode::OutOfRange,
                    Some(container_id),
                    range_extra("array", true, seen_len as f64, range),
                );
                return false;
            }

            if node.tuple_typed() {
                let remaining: Vec<NodeId> = match self.frames.cursor {
                    Cursor::Node(id) => {
                        let mut v = vec![id];
                        let mut cur = id;
                        while let Some(sib) = tree.node(cur).next_sibling() {
                            v.push(sib);
                            cur = sib;
                        }
                        v
                    }
                    Cursor::Synthetic(_) => Vec::new(),
                };

                let mut missing_count = 0usize;
                for id in &remaining {
                    let child = tree.node(*id);
                    match child.default_value().cloned() {
                        Some(default) => {
                            if !crate::de::synthesize(self, &default, sink) {
                                return false;
                            }
                            self.frames.mark_seen(*id, tree);
                        }
                        None => missing_count += 1,
                    }
                }
                if missing_count > 0 {
                    self.set_error(
                        ErrorCode::IncompleteContainer,
                        Some(container_id),
                        ExtraInfo::MissingCount(missing_count),
                    );
                    return false;
                }
            }
        }

        if !sink.end_array() {
            return false;
        }
        let frame = self.frames.pop();
        self.mark_resolved(frame.opened_by);
        true
    }

    pub(crate) fn handle_map_key<S: EventSink>(&mut self, key: &str, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.map_key(key);
        }
        let tree = self.schema.unwrap();
        let container = match self.frames.top().opened_by {
            Cursor::Node(id) => Some(id),
            Cursor::Synthetic(_) => None,
        };

        match container.and_then(|id| tree.find_child_by_name(id, key)) {
            Some(child) => self.frames.cursor = Cursor::Node(child),
            None => {
                let additional_properties = match container {
                    Some(id) => tree.node(id).additional_properties(),
                    None => AdditionalProperties::Kind(Kind::Any),
                };
                match additional_properties {
                    AdditionalProperties::Forbidden => {
                        self.set_error(
                            ErrorCode::UnexpectedKey,
                            container,
                            ExtraInfo::Text(key.to_string()),
                        );
                        return false;
                    }
                    AdditionalProperties::Kind(k) => {
                        self.frames.cursor = Cursor::Synthetic(AdditionalProperties::Kind(k));
                    }
                }
            }
        }
        sink.map_key(key)
    }

    pub(crate) fn handle_string<S: EventSink>(&mut self, value: &str, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.string_value(value);
        }
        let resolved = match self.resolve_for_value(ValueKind::String) {
            Ok(c) => c,
            Err(()) => return false,
        };
        if let Cursor::Node(id) = resolved {
            let tree = self.schema.unwrap();
            let node = tree.node(id);
            let range = node.range();
            if !range.is_unset() {
                let len = value.chars().count() as f64;
                if !range.admits(len) {
                    self.set_error(
                        ErrorCode::OutOfRange,
                        Some(id),
                        range_extra("string", true, len, range),
                    );
                    return false;
                }
            }
            if let Some(re) = node.regex() {
                if !re.is_match(value).unwrap_or(false) {
                    self.set_error(
                        ErrorCode::RegexFailed,
                        Some(id),
                        ExtraInfo::Text(value.to_string()),
                    );
                    return false;
                }
            }
            if let Some(fmt) = node.format() {
                if !fmt.validate(value) {
                    self.set_error(
                        ErrorCode::InvalidFormat,
                        Some(id),
                        ExtraInfo::Text(fmt.name().to_string()),
                    );
                    return false;
                }
            }
            if let Some(values) = node.enum_values() {
                if !values.iter().any(|v| v.as_str() == Some(value)) {
                    self.set_error(
                        ErrorCode::IllegalValue,
                        Some(id),
                        ExtraInfo::Text(value.to_string()),
                    );
                    return false;
                }
            }
        }
        if !sink.string_value(value) {
            return false;
        }
        self.mark_resolved(resolved);
        true
    }

    pub(crate) fn handle_integer<S: EventSink>(&mut self, value: i64, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.integer_value(value);
        }
        let resolved = match self.resolve_for_value(ValueKind::Integer) {
            Ok(c) => c,
            Err(()) => return false,
        };
        if let Cursor::Node(id) = resolved {
            let tree = self.schema.unwrap();
            let node = tree.node(id);
            let range = node.range();
            if !range.is_unset() && !range.admits(value as f64) {
                self.set_error(
                    ErrorCode::OutOfRange,
                    Some(id),
                    range_extra(node.kind().as_str(), false, value as f64, range),
                );
                return false;
            }
            if let Some(values) = node.enum_values() {
                if !values.iter().any(|v| v.as_i64() == Some(value)) {
                    self.set_error(
                        ErrorCode::IllegalValue,
                        Some(id),
                        ExtraInfo::Text(value.to_string()),
                    );
                    return false;
                }
            }
        }
        if !sink.integer_value(value) {
            return false;
        }
        self.mark_resolved(resolved);
        true
    }

    pub(crate) fn handle_double<S: EventSink>(&mut self, value: f64, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.double_value(value);
        }
        let resolved = match self.resolve_for_value(ValueKind::Double) {
            Ok(c) => c,
            Err(()) => return false,
        };
        if let Cursor::Node(id) = resolved {
            let tree = self.schema.unwrap();
            let node = tree.node(id);
            let range = node.range();
            if !range.is_unset() && !range.admits(value) {
                self.set_error(
                    ErrorCode::OutOfRange,
                    Some(id),
                    range_extra(node.kind().as_str(), false, value, range),
                );
                return false;
            }
            if let Some(values) = node.enum_values() {
                if !values.iter().any(|v| v.as_f64() == Some(value)) {
                    self.set_error(
                        ErrorCode::IllegalValue,
                        Some(id),
                        ExtraInfo::Text(value.to_string()),
                    );
                    return false;
                }
            }
        }
        if !sink.double_value(value) {
            return false;
        }
        self.mark_resolved(resolved);
        true
    }

    pub(crate) fn handle_boolean<S: EventSink>(&mut self, value: bool, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.boolean_value(value);
        }
        let resolved = match self.resolve_for_value(ValueKind::Boolean) {
            Ok(c) => c,
            Err(()) => return false,
        };
        if let Cursor::Node(id) = resolved {
            let tree = self.schema.unwrap();
            if let Some(values) = tree.node(id).enum_values() {
                if !values.iter().any(|v| v.as_bool() == Some(value)) {
                    self.set_error(
                        ErrorCode::IllegalValue,
                        Some(id),
                        ExtraInfo::Text(value.to_string()),
                    );
                    return false;
                }
            }
        }
        if !sink.boolean_value(value) {
            return false;
        }
        self.mark_resolved(resolved);
        true
    }

    pub(crate) fn handle_null<S: EventSink>(&mut self, sink: &mut S) -> bool {
        if self.schema.is_none() {
            return sink.null_value();
        }
        let resolved = match self.resolve_for_value(ValueKind::Null) {
            Ok(c) => c,
            Err(()) => return false,
        };
        if let Cursor::Node(id) = resolved {
            let tree = self.schema.unwrap();
            if let Some(values) = tree.node(id).enum_values() {
                if !values.iter().any(|v| v.is_null()) {
                    self.set_error(
                        ErrorCode::IllegalValue,
                        Some(id),
                        ExtraInfo::Text("null".to_string()),
                    );
                    return false;
                }
            }
        }
        if !sink.null_value() {
            return false;
        }
        self.mark_resolved(resolved);
        true
    }
}

fn range_extra(kind: &'static str, is_length: bool, value: f64, range: Range) -> ExtraInfo {
    ExtraInfo::Range {
        kind,
        is_length,
        value: format_num(value),
        lhs: range.lhs.map(|b| b.to_string()),
        rhs: range.rhs.map(|b| b.to_string()),
    }
}

fn format_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NoopSink;
    use crate::schema::build;
    use serde_json::json;

    fn build_schema(v: serde_json::Value) -> SchemaTree {
        build::build_schema(&serde_json::from_value(v).unwrap()).unwrap()
    }

    #[test]
    fn basic_object_match() {
        let tree = build_schema(json!({
            "kind": "object",
            "children": [
                {"kind": "string", "name": "name"},
                {"kind": "integer", "name": "age"}
            ]
        }));
        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        let mut sink = NoopSink;
        let doc = json!({"name": "a", "age": 7});
        assert_eq!(v.validate(&doc, &mut sink), Status::Ok);
        assert!(v.get_error(false, None).is_none());
    }

    #[test]
    fn out_of_range_renders_spec_example() {
        let tree = build_schema(json!({"kind": "integer", "range": {"lhs": 0, "rhs": 10}}));
        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        let mut sink = NoopSink;
        let doc = json!(42);
        assert_eq!(v.validate(&doc, &mut sink), Status::Error);
        assert_eq!(
            v.get_error(false, None).unwrap(),
            "integer 42 not in range {0,10}."
        );
    }

    #[test]
    fn missing_required_with_default_is_synthesized() {
        let tree = build_schema(json!({
            "kind": "object",
            "children": [
                {"kind": "string", "name": "name"},
                {"kind": "integer", "name": "n", "default_value": 5}
            ]
        }));
        let mut v = Validator::new(ParserConfig::default(), Some(&tree));

        #[derive(Default)]
        struct Collect {
            keys: Vec<String>,
            ints: Vec<i64>,
        }
        impl EventSink for Collect {
            fn map_key(&mut self, key: &str) -> bool {
                self.keys.push(key.to_string());
                true
            }
            fn integer_value(&mut self, value: i64) -> bool {
                self.ints.push(value);
                true
            }
        }

        let mut sink = Collect::default();
        let doc = json!({"name": "a"});
        assert_eq!(v.validate(&doc, &mut sink), Status::Ok);
        assert_eq!(sink.keys, vec!["name", "n"]);
        assert_eq!(sink.ints, vec![5]);
    }

    #[test]
    fn unexpected_key_is_rejected() {
        let tree = build_schema(json!({
            "kind": "object",
            "children": [{"kind": "string", "name": "name"}]
        }));
        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        let mut sink = NoopSink;
        let doc = json!({"name": "a", "x": 1});
        assert_eq!(v.validate(&doc, &mut sink), Status::Error);
        assert!(v
            .get_error(false, None)
            .unwrap()
            .contains("while additionalProperties forbidden 'x'"));
    }

    #[test]
    fn tuple_array_short_reports_missing_count() {
        let tree = build_schema(json!({
            "kind": "array",
            "tuple_typed": true,
            "children": [{"kind": "string"}, {"kind": "integer"}]
        }));
        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        let mut sink = NoopSink;
        let doc = json!(["a"]);
        assert_eq!(v.validate(&doc, &mut sink), Status::Error);
        assert!(v
            .get_error(false, None)
            .unwrap()
            .contains("tuple missing 1 elements"));
    }

    #[test]
    fn union_branch_selection() {
        let tree = build_schema(json!({
            "kind": "union",
            "children": [{"kind": "string"}, {"kind": "integer"}]
        }));
        let mut sink = NoopSink;

        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        assert_eq!(v.validate(&json!("a"), &mut sink), Status::Ok);

        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        assert_eq!(v.validate(&json!(3), &mut sink), Status::Ok);

        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        assert_eq!(v.validate(&json!(true), &mut sink), Status::Error);
    }

    #[test]
    fn forbidden_tuple_overflow_rejects_extra_element() {
        let tree = build_schema(json!({
            "kind": "array",
            "tuple_typed": true,
            "children": [{"kind": "string"}]
        }));
        let mut v = Validator::new(ParserConfig::default(), Some(&tree));
        let mut sink = NoopSink;
        let doc = json!(["a", "b"]);
        assert_eq!(v.validate(&doc, &mut sink), Status::Error);
        assert_eq!(v.get_error(false, None).unwrap(), "schema does not allow type.");
    }

    #[test]
    fn passthrough_mode_forwards_without_validation() {
        let mut v: Validator<'_> = Validator::new(ParserConfig::default(), None);
        #[derive(Default)]
        struct Collect(Vec<i64>);
        impl EventSink for Collect {
            fn integer_value(&mut self, value: i64) -> bool {
                self.0.push(value);
                true
            }
        }
        let mut sink = Collect::default();
        assert_eq!(v.validate(&json!([1, 2, 3]), &mut sink), Status::Ok);
        assert_eq!(sink.0, vec![1, 2, 3]);
    }
}
