//! The schema tree: an immutable, arena-backed representation of a parsed
//! Orderly schema.
//!
//! Nodes are stored in a flat `Vec` and referenced by index rather than by
//! pointer, so the tree has no lifetimes of its own and can be shared freely
//! behind a `&SchemaTree` across validator handles.

pub mod build;
pub mod formats;

use fancy_regex::Regex;
use serde::Deserialize;
use std::fmt;

pub use formats::Format;

/// An index into a [`SchemaTree`]'s node arena.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// The declared shape of a schema node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Any,
    Union,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Object => "object",
            Kind::Array => "array",
            Kind::String => "string",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::Boolean => "boolean",
            Kind::Null => "null",
            Kind::Any => "any",
            Kind::Union => "union",
        }
    }

    /// Whether a value of the given [`ValueKind`] satisfies this declared kind.
    pub fn admits(&self, value: ValueKind) -> bool {
        match (self, value) {
            (Kind::Any, _) => true,
            (Kind::Object, ValueKind::Object) => true,
            (Kind::Array, ValueKind::Array) => true,
            (Kind::String, ValueKind::String) => true,
            (Kind::Integer, ValueKind::Integer) => true,
            (Kind::Number, ValueKind::Integer) | (Kind::Number, ValueKind::Double) => true,
            (Kind::Boolean, ValueKind::Boolean) => true,
            (Kind::Null, ValueKind::Null) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of an incoming document event, as distinct from a schema node's
/// declared [`Kind`] (a schema node may be `number`, admitting both
/// `ValueKind::Integer` and `ValueKind::Double`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Integer,
    Double,
    Boolean,
    Null,
}

/// A numeric range endpoint.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Bound {
    Int(i64),
    Float(f64),
}

impl Bound {
    pub fn as_f64(&self) -> f64 {
        match self {
            Bound::Int(i) => *i as f64,
            Bound::Float(f) => *f,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Int(i) => write!(f, "{}", i),
            Bound::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A declared `{lhs,rhs}` range. Either side may be absent (unbounded).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Range {
    pub lhs: Option<Bound>,
    pub rhs: Option<Bound>,
}

impl Range {
    pub fn is_unset(&self) -> bool {
        self.lhs.is_none() && self.rhs.is_none()
    }

    pub fn admits(&self, value: f64) -> bool {
        if let Some(lhs) = self.lhs {
            if value < lhs.as_f64() {
                return false;
            }
        }
        if let Some(rhs) = self.rhs {
            if value > rhs.as_f64() {
                return false;
            }
        }
        true
    }
}

/// The policy applied to keys or elements not covered by a schema's declared
/// children: objects' unnamed properties, and tuple arrays' trailing
/// elements once the positional schedule is exhausted.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AdditionalProperties {
    Forbidden,
    Kind(Kind),
}

impl AdditionalProperties {
    /// Whether a value of `value` is admitted by this policy. `Forbidden`
    /// admits nothing, which is what lets the validator reject an overflow
    /// tuple element or an unnamed object property at the point it arrives
    /// rather than only at container close.
    pub fn admits(&self, value: ValueKind) -> bool {
        match self {
            AdditionalProperties::Forbidden => false,
            AdditionalProperties::Kind(k) => k.admits(value),
        }
    }
}

pub(crate) struct SchemaNodeData {
    pub kind: Kind,
    pub name: Option<Box<str>>,
    pub optional: bool,
    pub range: Range,
    pub regex: Option<Regex>,
    pub format: Option<Format>,
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub default_value: Option<serde_json::Value>,
    pub additional_properties: AdditionalProperties,
    pub tuple_typed: bool,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
}

/// An immutable, arena-backed schema tree built by [`build::build_schema`].
pub struct SchemaTree {
    pub(crate) nodes: Vec<SchemaNodeData>,
    pub(crate) root: NodeId,
}

/// A read-only view into a single node of a [`SchemaTree`].
pub struct SchemaNode<'s> {
    tree: &'s SchemaTree,
    id: NodeId,
}

impl SchemaTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> SchemaNode<'_> {
        SchemaNode { tree: self, id }
    }

    pub(crate) fn data(&self, id: NodeId) -> &SchemaNodeData {
        &self.nodes[id.0 as usize]
    }

    /// Children of `id` in declaration order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.data(id).first_child;
        std::iter::from_fn(move || {
            let cur = next?;
            next = self.data(cur).next_sibling;
            Some(cur)
        })
    }

    pub fn find_child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id).find(|&c| {
            self.data(c)
                .name
                .as_deref()
                .map(|n| n == name)
                .unwrap_or(false)
        })
    }
}

impl<'s> SchemaNode<'s> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.tree.data(self.id).kind
    }

    pub fn name(&self) -> Option<&'s str> {
        self.tree.data(self.id).name.as_deref()
    }

    pub fn optional(&self) -> bool {
        self.tree.data(self.id).optional
    }

    pub fn range(&self) -> Range {
        self.tree.data(self.id).range
    }

    pub fn regex(&self) -> Option<&'s Regex> {
        self.tree.data(self.id).regex.as_ref()
    }

    pub fn format(&self) -> Option<Format> {
        self.tree.data(self.id).format
    }

    pub fn enum_values(&self) -> Option<&'s [serde_json::Value]> {
        self.tree.data(self.id).enum_values.as_deref()
    }

    pub fn default_value(&self) -> Option<&'s serde_json::Value> {
        self.tree.data(self.id).default_value.as_ref()
    }

    pub fn additional_properties(&self) -> AdditionalProperties {
        self.tree.data(self.id).additional_properties
    }

    pub fn tuple_typed(&self) -> bool {
        self.tree.data(self.id).tuple_typed
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.tree.data(self.id).parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.tree.data(self.id).first_child
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.tree.data(self.id).next_sibling
    }

    pub fn children(&self) -> impl Iterator<Item = NodeId> + 's {
        self.tree.children(self.id)
    }
}

// Allow `NodeId` to index through `SchemaTree` ergonomically in a couple of
// hot call sites (`tree[id].kind`-style access reads naturally next to the
// arena fields above).
impl std::ops::Index<NodeId> for SchemaTree {
    type Output = SchemaNodeData;
    fn index(&self, id: NodeId) -> &SchemaNodeData {
        self.data(id)
    }
}

impl NodeId {
    pub(crate) fn new(idx: usize) -> Self {
        NodeId(idx as u32)
    }

    pub(crate) fn to_usize(self) -> usize {
        self.0 as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_admits_numeric_distinction() {
        assert!(Kind::Integer.admits(ValueKind::Integer));
        assert!(!Kind::Integer.admits(ValueKind::Double));
        assert!(Kind::Number.admits(ValueKind::Integer));
        assert!(Kind::Number.admits(ValueKind::Double));
        assert!(Kind::Any.admits(ValueKind::Null));
    }

    #[test]
    fn range_admits_bounds() {
        let r = Range {
            lhs: Some(Bound::Int(0)),
            rhs: Some(Bound::Int(10)),
        };
        assert!(r.admits(0.0));
        assert!(r.admits(10.0));
        assert!(!r.admits(-1.0));
        assert!(!r.admits(10.1));
    }

    #[test]
    fn additional_properties_forbidden_admits_nothing() {
        assert!(!AdditionalProperties::Forbidden.admits(ValueKind::Null));
        assert!(AdditionalProperties::Kind(Kind::Any).admits(ValueKind::Object));
    }
}
