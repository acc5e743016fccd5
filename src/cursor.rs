//! The validation cursor and frame stack.
//!
//! The frame stack is an owned `Vec<Frame>`; the synthetic "any" position a
//! cursor can occupy when no concrete schema node applies is a plain data
//! variant on [`Cursor`] rather than a mutable shared node.

use crate::schema::{AdditionalProperties, NodeId, SchemaTree};
use fxhash::FxHashSet;

/// Where the next event is expected to be checked against.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Cursor {
    /// A concrete schema node.
    Node(NodeId),
    /// No concrete schema node applies (a tuple array's overflow position,
    /// an object's unnamed property, or anything nested inside one);
    /// `AdditionalProperties::Forbidden` here means every subsequent value
    /// kind is rejected at the point it arrives.
    Synthetic(AdditionalProperties),
}

/// Per-container bookkeeping, pushed on container start and popped on
/// container end.
#[derive(Debug)]
pub struct Frame {
    /// The cursor value in effect when this frame was pushed; restored when
    /// it is popped so the enclosing container can mark it seen.
    pub opened_by: Cursor,
    /// Schema nodes (or, for union branches, the union node itself) that
    /// have matched an event so far.
    pub seen: FxHashSet<NodeId>,
    /// Non-optional children that must appear (or be defaulted) before this
    /// frame closes.
    pub required: Vec<NodeId>,
}

/// The frame stack plus the single current [`Cursor`].
pub struct FrameStack {
    frames: Vec<Frame>,
    pub cursor: Cursor,
}

impl FrameStack {
    pub fn new(root: NodeId) -> Self {
        FrameStack {
            frames: vec![Frame {
                opened_by: Cursor::Node(root),
                seen: FxHashSet::default(),
                required: Vec::new(),
            }],
            cursor: Cursor::Node(root),
        }
    }

    pub fn top(&self) -> &Frame {
        self.frames.last().expect("frame stack is never empty")
    }

    pub fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack is never empty")
    }

    /// Whether the sentinel root frame has recorded a top-level event;
    /// used by `parse_complete` to detect an empty document.
    pub fn root_seen(&self) -> bool {
        !self.frames[0].seen.is_empty()
    }

    /// Push a new frame opened by `entry`, computing its required children
    /// and redirecting the cursor to the first thing inside it.
    pub fn push(&mut self, entry: Cursor, tree: &SchemaTree) {
        let (required, next_cursor) = match entry {
            Cursor::Node(id) => {
                let node = tree.node(id);
                let required: Vec<NodeId> = node
                    .children()
                    .filter(|&c| {
                        let child = tree.node(c);
                        !child.optional()
                    })
                    .collect();
                let next = match node.first_child() {
                    Some(c) => Cursor::Node(c),
                    None => Cursor::Synthetic(node.additional_properties()),
                };
                (required, next)
            }
            Cursor::Synthetic(ap) => (Vec::new(), Cursor::Synthetic(ap)),
        };

        tracing::trace!(depth = self.frames.len() + 1, required = required.len(), "frame push");

        self.frames.push(Frame {
            opened_by: entry,
            seen: FxHashSet::default(),
            required,
        });
        self.cursor = next_cursor;
    }

    /// Pop the top frame, restoring the cursor to the value that opened it.
    pub fn pop(&mut self) -> Frame {
        let frame = self
            .frames
            .pop()
            .expect("pop must be preceded by a matching push");
        tracing::trace!(depth = self.frames.len(), seen = frame.seen.len(), "frame pop");
        self.cursor = frame.opened_by;
        frame
    }

    /// Record `node` as seen in the top frame, and if the enclosing
    /// container is a tuple array, advance the cursor along the positional
    /// schedule (or redirect to synthetic once it's exhausted).
    pub fn mark_seen(&mut self, node: NodeId, tree: &SchemaTree) {
        let record = match tree.node(node).parent() {
            Some(parent) if tree.node(parent).kind() == crate::schema::Kind::Union => parent,
            _ => node,
        };
        self.top_mut().seen.insert(record);

        if let Some(parent) = tree.node(node).parent() {
            let parent_node = tree.node(parent);
            if parent_node.kind() == crate::schema::Kind::Array && parent_node.tuple_typed() {
                self.cursor = match tree.node(node).next_sibling() {
                    Some(sib) => Cursor::Node(sib),
                    None => Cursor::Synthetic(parent_node.additional_properties()),
                };
            }
        }
    }

    /// Record that the synthetic "any" position matched (no concrete node
    /// to add to `seen`); tuple arrays stay in synthetic/overflow mode.
    pub fn mark_seen_synthetic(&mut self) {
        // Nothing to add to `seen` and no sibling schedule to advance:
        // overflow positions have no identity in the schema tree.
    }
}
