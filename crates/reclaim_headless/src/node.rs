//! # Scene Nodes
//!
//! Nodes are addressed by generational ids:
//! - An index into the scene's slot array
//! - A generation counter so a handle to a destroyed node never aliases
//!   the node that later reuses its slot

use reclaim_shared::Transform;

/// Handle to a scene node.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index
/// - Upper 32 bits: Generation counter for detecting stale handles
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Creates a node ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the node ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the node ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

/// What a node is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Created from a blueprint, subject to pooling.
    Instance,
    /// Empty grouping node.
    Container,
}

/// A live scene node.
#[derive(Clone, Debug)]
pub struct Node<K, S> {
    /// Display label.
    pub label: String,
    /// Instance or container.
    pub kind: NodeKind,
    /// Blueprint the node was created from. `None` for containers.
    pub key: Option<K>,
    /// Transform relative to `parent`, or world transform without one.
    pub local: Transform,
    /// Parent node.
    pub parent: Option<NodeId>,
    /// Whether the node renders, collides and ticks.
    pub active: bool,
    /// Per-node state exposed as a capability.
    pub state: Option<S>,
}

impl<K, S> Node<K, S> {
    /// An active, empty container labelled `label`.
    #[must_use]
    pub fn container(label: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            label: label.into(),
            kind: NodeKind::Container,
            key: None,
            local: Transform::IDENTITY,
            parent,
            active: true,
            state: None,
        }
    }
}
