//! Builds a [`SchemaTree`] from a `SchemaSource` tree.
//!
//! The Orderly surface syntax itself (lexer, grammar parser) is an
//! out-of-scope external collaborator; what lands here is the syntax
//! tree that front-end would already have produced, modeled as a small
//! serde-deserializable structure so tests can build schemas with
//! `serde_json::json!` directly.

use super::{AdditionalProperties, Bound, Format, Kind, NodeId, Range, SchemaNodeData, SchemaTree};
use fancy_regex::Regex;
use serde::Deserialize;

/// The schema source tree a grammar parser for Orderly would hand us: one
/// `SchemaSource` node per declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaSource {
    pub kind: Kind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub range: Option<SourceRange>,
    #[serde(default)]
    pub regex: Option<String>,
    #[serde(default)]
    pub format: Option<Format>,
    #[serde(default)]
    pub enum_values: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default = "default_additional_properties")]
    pub additional_properties: SourceAdditionalProperties,
    #[serde(default)]
    pub tuple_typed: bool,
    #[serde(default)]
    pub children: Vec<SchemaSource>,
}

fn default_additional_properties() -> SourceAdditionalProperties {
    SourceAdditionalProperties::Forbidden
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceAdditionalProperties {
    Forbidden,
    Kind(Kind),
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SourceRange {
    pub lhs: Option<SourceBound>,
    pub rhs: Option<SourceBound>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum SourceBound {
    Int(i64),
    Float(f64),
}

/// Errors encountered while building a schema tree out of a `SchemaSource`.
/// Distinct from [`crate::error::ValidationError`]: this is a build-time
/// failure over the schema itself, never surfaced while validating a
/// document.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("schema node '{name}' has range with lhs {lhs} greater than rhs {rhs}")]
    InvalidRange { name: String, lhs: f64, rhs: f64 },

    #[error("schema node '{name}' has an unbuildable regular expression: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: fancy_regex::Error,
    },

    #[error("object member at index {index} under '{parent}' is missing a name")]
    MissingMemberName { parent: String, index: usize },

    #[error("tuple array under '{parent}' declares a named child '{name}', which is only meaningful for object members")]
    UnexpectedChildName { parent: String, name: String },

    #[error("uniform array under '{parent}' must declare exactly one child, found {count}")]
    UniformArrayChildCount { parent: String, count: usize },

    #[error("union node under '{parent}' must declare at least one alternative")]
    EmptyUnion { parent: String },

    #[error("at schema '{path}': {detail}")]
    AtSchema {
        path: String,
        #[source]
        detail: Box<Error>,
    },
}

/// Build an immutable [`SchemaTree`] from a `SchemaSource` tree rooted at
/// `root`.
pub fn build_schema(root: &SchemaSource) -> Result<SchemaTree, Error> {
    let mut nodes = Vec::new();
    let root_id = build_node(&mut nodes, root, None, "$")?;
    Ok(SchemaTree {
        nodes,
        root: root_id,
    })
}

fn build_node(
    nodes: &mut Vec<SchemaNodeData>,
    src: &SchemaSource,
    parent: Option<NodeId>,
    path: &str,
) -> Result<NodeId, Error> {
    let label = src.name.as_deref().unwrap_or(path).to_string();

    if let Some(range) = src.range {
        let (lhs, rhs) = (range.lhs.map(to_bound), range.rhs.map(to_bound));
        if let (Some(l), Some(r)) = (lhs, rhs) {
            if l.as_f64() > r.as_f64() {
                return Err(Error::InvalidRange {
                    name: label.clone(),
                    lhs: l.as_f64(),
                    rhs: r.as_f64(),
                });
            }
        }
    }

    let regex = src
        .regex
        .as_deref()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| Error::InvalidRegex {
                name: label.clone(),
                source,
            })
        })
        .transpose()?;

    let additional_properties = match &src.additional_properties {
        SourceAdditionalProperties::Forbidden => AdditionalProperties::Forbidden,
        SourceAdditionalProperties::Kind(k) => AdditionalProperties::Kind(*k),
    };

    match src.kind {
        Kind::Object => {
            for (i, child) in src.children.iter().enumerate() {
                if child.name.is_none() {
                    return Err(Error::MissingMemberName {
                        parent: label.clone(),
                        index: i,
                    });
                }
            }
        }
        Kind::Array if src.tuple_typed => {
            for child in &src.children {
                if let Some(name) = &child.name {
                    return Err(Error::UnexpectedChildName {
                        parent: label.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        Kind::Array => {
            if src.children.len() != 1 {
                return Err(Error::UniformArrayChildCount {
                    parent: label.clone(),
                    count: src.children.len(),
                });
            }
        }
        Kind::Union => {
            if src.children.is_empty() {
                return Err(Error::EmptyUnion {
                    parent: label.clone(),
                });
            }
        }
        _ => {}
    }

    let data = SchemaNodeData {
        kind: src.kind,
        name: src.name.as_deref().map(Into::into),
        optional: src.optional,
        range: Range {
            lhs: src.range.and_then(|r| r.lhs).map(to_bound),
            rhs: src.range.and_then(|r| r.rhs).map(to_bound),
        },
        regex,
        format: src.format,
        enum_values: src.enum_values.clone(),
        default_value: src.default_value.clone(),
        additional_properties,
        tuple_typed: src.tuple_typed,
        parent,
        first_child: None,
        next_sibling: None,
    };

    let id = NodeId::new(nodes.len());
    nodes.push(data);

    let mut prev_child: Option<NodeId> = None;
    for (i, child_src) in src.children.iter().enumerate() {
        let child_path = format!("{}/{}", path, child_src.name.as_deref().unwrap_or(&i.to_string()));
        let child_id = build_node(nodes, child_src, Some(id), &child_path)
            .map_err(|e| Error::AtSchema {
                path: child_path.clone(),
                detail: Box::new(e),
            })?;
        match prev_child {
            None => nodes[id.to_usize()].first_child = Some(child_id),
            Some(prev) => nodes[prev.to_usize()].next_sibling = Some(child_id),
        }
        prev_child = Some(child_id);
    }

    Ok(id)
}

fn to_bound(b: SourceBound) -> Bound {
    match b {
        SourceBound::Int(i) => Bound::Int(i),
        SourceBound::Float(f) => Bound::Float(f),
    }
}
