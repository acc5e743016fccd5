//! The runtime error taxonomy and its diagnostic renderer.
//!
//! `ExtraInfo` carries whatever extra context a given error kind needs (a
//! key, a missing count, a 1-based index, a formatted range) as a typed
//! enum rather than a single opaque buffer, since different kinds carry
//! differently shaped context.

use crate::schema::{Kind, NodeId, SchemaTree};
use std::fmt::Write as _;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    TypeMismatch,
    OutOfRange,
    IncompleteContainer,
    UnexpectedKey,
    IllegalValue,
    RegexFailed,
    InvalidFormat,
    TrailingInput,
}

/// Context carried alongside an [`ErrorCode`], shaped per kind.
#[derive(Clone, Debug)]
pub enum ExtraInfo {
    None,
    /// The literal value, format name, regex subject, or unexpected key.
    Text(String),
    /// An object's missing required property name.
    MissingProperty(String),
    /// A tuple array's count of missing trailing positions.
    MissingCount(usize),
    /// 1-based position of a mismatched tuple array element.
    ArrayIndex(usize),
    /// A fully-described out-of-range check.
    Range {
        kind: &'static str,
        is_length: bool,
        value: String,
        lhs: Option<String>,
        rhs: Option<String>,
    },
}

/// The single live validation error a [`crate::validator::Validator`] may be
/// holding. At most one exists at a time; recording a new one replaces it.
#[derive(Clone, Debug)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub node: Option<NodeId>,
    pub extra: ExtraInfo,
}

impl ValidationError {
    pub fn new(code: ErrorCode, node: Option<NodeId>, extra: ExtraInfo) -> Self {
        ValidationError { code, node, extra }
    }

    /// Render a human-readable diagnostic. `verbose` prepends the
    /// underlying parser's own error text, when one is available. `tree` is
    /// `None` in passthrough (schema-less) mode, where only schema-free
    /// codes like `trailing_input` can occur.
    pub fn render(&self, tree: Option<&SchemaTree>, verbose: bool, parser_message: Option<&str>) -> String {
        let mut s = String::new();

        match (&self.code, &self.extra) {
            (
                ErrorCode::OutOfRange,
                ExtraInfo::Range {
                    kind,
                    is_length,
                    value,
                    lhs,
                    rhs,
                },
            ) => {
                let _ = write!(
                    s,
                    "{}{} {} not in range {{{},{}}}",
                    kind,
                    if *is_length { " length" } else { "" },
                    value,
                    lhs.as_deref().unwrap_or(""),
                    rhs.as_deref().unwrap_or(""),
                );
            }
            (ErrorCode::TypeMismatch, extra) => {
                s.push_str("schema does not allow type");
                match extra {
                    ExtraInfo::ArrayIndex(i) => {
                        let _ = write!(s, " for array element {}", i);
                    }
                    _ => {
                        if let Some(name) = self.node_name(tree) {
                            let _ = write!(s, " for property '{}'", name);
                        }
                    }
                }
                if let Some(kind) = self.node_kind(tree) {
                    let _ = write!(s, ", expected '{}'", kind);
                }
            }
            (ErrorCode::IncompleteContainer, ExtraInfo::MissingProperty(name)) => {
                s.push_str("incomplete structure");
                let _ = write!(s, ", object missing required property '{}'", name);
            }
            (ErrorCode::IncompleteContainer, ExtraInfo::MissingCount(n)) => {
                s.push_str("incomplete structure");
                let _ = write!(s, ", tuple missing {} elements", n);
            }
            (ErrorCode::IncompleteContainer, _) => {
                s.push_str("incomplete structure");
            }
            (ErrorCode::UnexpectedKey, ExtraInfo::Text(key)) => {
                s.push_str("encountered unknown property");
                s.push_str(", while additionalProperties forbidden");
                let _ = write!(s, " '{}'", key);
            }
            (ErrorCode::IllegalValue, ExtraInfo::Text(v)) => {
                s.push_str("value not permitted");
                let _ = write!(s, " '{}'", v);
            }
            (ErrorCode::RegexFailed, ExtraInfo::Text(v)) => {
                s.push_str("string did not match regular expression");
                let _ = write!(s, " '{}'", v);
            }
            (ErrorCode::InvalidFormat, ExtraInfo::Text(v)) => {
                s.push_str("string did not match format");
                let _ = write!(s, " '{}'", v);
            }
            (ErrorCode::TrailingInput, _) => {
                s.push_str("input continued after validation completed");
            }
            _ => {
                s.push_str(self.base_text());
            }
        }

        s.push('.');

        if verbose {
            if let Some(msg) = parser_message {
                return format!("{}: {}", msg, s);
            }
        }

        s
    }

    fn base_text(&self) -> &'static str {
        match self.code {
            ErrorCode::TypeMismatch => "schema does not allow type",
            ErrorCode::OutOfRange => "value out of range",
            ErrorCode::IncompleteContainer => "incomplete structure",
            ErrorCode::UnexpectedKey => "encountered unknown property",
            ErrorCode::IllegalValue => "value not permitted",
            ErrorCode::RegexFailed => "string did not match regular expression",
            ErrorCode::InvalidFormat => "string did not match format",
            ErrorCode::TrailingInput => "input continued after validation completed",
        }
    }

    fn node_name(&self, tree: Option<&SchemaTree>) -> Option<String> {
        let tree = tree?;
        self.node
            .and_then(|id| tree.node(id).name().map(ToOwned::to_owned))
    }

    fn node_kind(&self, tree: Option<&SchemaTree>) -> Option<Kind> {
        let tree = tree?;
        self.node.map(|id| tree.node(id).kind())
    }
}
