//! # Headless Scene
//!
//! Slot arena of nodes with a free list, parent links and translation-only
//! world composition. Rotation and scale are carried but not composed.

use reclaim_shared::{Transform, Vec3};

use crate::node::{Node, NodeId};

struct Slot<K, S> {
    generation: u32,
    node: Option<Node<K, S>>,
}

/// Container for every node the headless engine knows about.
///
/// Despawned slots are recycled with a bumped generation, so stale
/// [`NodeId`]s simply stop resolving.
///
/// # Example
///
/// ```rust,ignore
/// let mut scene: Scene<&str, ()> = Scene::new();
/// let root = scene.spawn(Node::container("root", None)).unwrap();
/// assert!(scene.contains(root));
/// ```
pub struct Scene<K, S> {
    slots: Vec<Slot<K, S>>,
    /// Free list of slot indices for reuse.
    free_indices: Vec<u32>,
    alive_count: usize,
}

impl<K, S> Scene<K, S> {
    /// Creates an empty scene.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_indices: Vec::new(),
            alive_count: 0,
        }
    }

    /// Returns the number of live nodes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.alive_count
    }

    /// Whether the scene has no live nodes.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.alive_count == 0
    }

    /// Adds a node. Returns `None` only if the slot space is exhausted.
    pub fn spawn(&mut self, node: Node<K, S>) -> Option<NodeId> {
        let id = if let Some(index) = self.free_indices.pop() {
            let slot = self.slots.get_mut(index as usize)?;
            slot.node = Some(node);
            NodeId::new(index, slot.generation)
        } else {
            let index = u32::try_from(self.slots.len()).ok()?;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId::new(index, 0)
        };

        self.alive_count += 1;
        Some(id)
    }

    /// Removes a node and returns it.
    ///
    /// Children are detached, not removed: they become roots and keep
    /// their world position.
    pub fn despawn(&mut self, id: NodeId) -> Option<Node<K, S>> {
        let parent_world = self.world_position(id)?;

        let slot = self.slots.get_mut(id.index() as usize)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_indices.push(id.index());
        self.alive_count -= 1;

        for slot in &mut self.slots {
            if let Some(child) = slot.node.as_mut().filter(|n| n.parent == Some(id)) {
                child.parent = None;
                child.local.position = child.local.position + parent_world;
            }
        }

        Some(node)
    }

    /// Whether `id` refers to a live node.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Looks up a live node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node<K, S>> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_ref()
    }

    /// Looks up a live node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node<K, S>> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.node.as_mut()
    }

    /// World position of a node: its local position plus every ancestor's.
    #[must_use]
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        let mut node = self.get(id)?;
        let mut position = node.local.position;

        // A chain can never be longer than the scene.
        for _ in 0..self.alive_count {
            let Some(parent) = node.parent.and_then(|p| self.get(p)) else {
                break;
            };
            position = position + parent.local.position;
            node = parent;
        }

        Some(position)
    }

    /// Sets `id`'s transform so it ends up at `world` under its current
    /// parent.
    pub fn set_world_transform(&mut self, id: NodeId, world: Transform) {
        let parent_world = self.parent_world_position(id);
        if let Some(node) = self.get_mut(id) {
            node.local = world;
            node.local.position = world.position - parent_world;
        }
    }

    /// Moves `id` under `parent`, keeping its world position.
    ///
    /// Refuses (returns false) if `parent` is dead or is `id` itself or one
    /// of its descendants.
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> bool {
        let Some(world) = self.world_position(id) else {
            return false;
        };
        if let Some(parent) = parent {
            if !self.contains(parent) || self.is_ancestor(id, parent) {
                return false;
            }
        }

        let parent_world = parent
            .and_then(|p| self.world_position(p))
            .unwrap_or(Vec3::ZERO);

        match self.get_mut(id) {
            Some(node) => {
                node.parent = parent;
                node.local.position = world - parent_world;
                true
            }
            None => false,
        }
    }

    /// Whether `ancestor` is `id` or lies on the parent chain above `id`.
    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        for _ in 0..=self.alive_count {
            match current {
                Some(node) if node == ancestor => return true,
                Some(node) => current = self.get(node).and_then(|n| n.parent),
                None => return false,
            }
        }
        false
    }

    fn parent_world_position(&self, id: NodeId) -> Vec3 {
        self.get(id)
            .and_then(|node| node.parent)
            .and_then(|parent| self.world_position(parent))
            .unwrap_or(Vec3::ZERO)
    }

    /// Live direct children of `id`.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.parent == Some(id))
            .map(|(child, _)| child)
            .collect()
    }

    /// Iterates over all live nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<K, S>)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let node = slot.node.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((NodeId::new(index, slot.generation), node))
        })
    }
}

impl<K, S> Default for Scene<K, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> std::fmt::Debug for Scene<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("alive_count", &self.alive_count)
            .field("capacity", &self.slots.len())
            .finish()
    }
}
