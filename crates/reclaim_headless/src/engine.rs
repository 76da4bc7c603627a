//! # Headless Engine
//!
//! A [`HostEngine`] with no renderer, physics or window. Objects are scene
//! nodes created from registered blueprints; "active" is a flag.
//!
//! Useful for servers, tests and benchmarks, and as a reference for real
//! engine bindings.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use reclaim_core::{Capability, HostEngine};
use reclaim_shared::{Placement, Transform, Vec3};

use crate::node::{Node, NodeId, NodeKind};
use crate::scene::Scene;

/// Template for creating instances of one key.
#[derive(Clone, Debug)]
pub struct Blueprint<S> {
    /// Label prefix for created nodes.
    pub label: String,
    /// State cloned into every instance. `None` means the instance has no
    /// `S` capability.
    pub state: Option<S>,
}

/// Running totals of host calls, for tests and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostCounters {
    /// Instances created from blueprints.
    pub created: usize,
    /// Nodes destroyed, instances and containers alike.
    pub destroyed: usize,
    /// Containers created.
    pub containers: usize,
    /// `set_active(_, true)` calls.
    pub activations: usize,
    /// `set_active(_, false)` calls.
    pub deactivations: usize,
    /// Successful reparent calls.
    pub reparents: usize,
}

/// In-memory host engine.
///
/// `K` is the blueprint key, `S` the per-instance state exposed through
/// [`Capability<S>`].
#[derive(Debug)]
pub struct HeadlessEngine<K, S = ()> {
    scene: Scene<K, S>,
    blueprints: HashMap<K, Blueprint<S>>,
    counters: HostCounters,
}

impl<K, S> HeadlessEngine<K, S>
where
    K: Clone + Eq + Hash + Debug,
    S: Clone,
{
    /// Creates an engine with no blueprints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            blueprints: HashMap::new(),
            counters: HostCounters::default(),
        }
    }

    /// Registers how to create instances of `key`.
    pub fn register_blueprint(&mut self, key: K, label: impl Into<String>, state: Option<S>) {
        self.blueprints.insert(
            key,
            Blueprint {
                label: label.into(),
                state,
            },
        );
    }

    /// Builder form of [`Self::register_blueprint`].
    #[must_use]
    pub fn with_blueprint(mut self, key: K, label: impl Into<String>, state: Option<S>) -> Self {
        self.register_blueprint(key, label, state);
        self
    }

    /// The scene graph.
    #[inline]
    #[must_use]
    pub const fn scene(&self) -> &Scene<K, S> {
        &self.scene
    }

    /// Call totals so far.
    #[inline]
    #[must_use]
    pub const fn counters(&self) -> HostCounters {
        self.counters
    }

    /// Whether `id` is alive and active.
    #[must_use]
    pub fn is_active(&self, id: NodeId) -> bool {
        self.scene.get(id).is_some_and(|node| node.active)
    }

    /// World position of `id`.
    #[must_use]
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.scene.world_position(id)
    }

    /// Label of `id`.
    #[must_use]
    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.scene.get(id).map(|node| node.label.as_str())
    }

    /// Live instances created from `key`, active or not.
    #[must_use]
    pub fn live_instances(&self, key: &K) -> usize {
        self.scene
            .iter()
            .filter(|(_, node)| node.kind == NodeKind::Instance && node.key.as_ref() == Some(key))
            .count()
    }

    /// Parent and local transform for `placement`, falling back to world
    /// placement under `fallback` when an attach target is dead.
    fn resolve_placement(
        &self,
        placement: &Placement<NodeId>,
        fallback: Option<NodeId>,
    ) -> (Option<NodeId>, Transform) {
        let (parent, transform) = match placement {
            Placement::Attached { parent, local } if self.scene.contains(*parent) => {
                return (Some(*parent), *local);
            }
            Placement::Attached { parent, local } => {
                tracing::warn!("Attach target {:?} is gone, placing in world space", parent);
                (fallback, *local)
            }
            Placement::World(transform) => (fallback, *transform),
        };

        let parent = parent.filter(|p| self.scene.contains(*p));
        let origin = parent
            .and_then(|p| self.scene.world_position(p))
            .unwrap_or(Vec3::ZERO);
        let mut local = transform;
        local.position = transform.position - origin;
        (parent, local)
    }
}

impl<K, S> Default for HeadlessEngine<K, S>
where
    K: Clone + Eq + Hash + Debug,
    S: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> HostEngine for HeadlessEngine<K, S>
where
    K: Clone + Eq + Hash + Debug,
    S: Clone,
{
    type Key = K;
    type Handle = NodeId;

    fn create(
        &mut self,
        key: &K,
        placement: &Placement<NodeId>,
        container: Option<NodeId>,
    ) -> Option<NodeId> {
        let blueprint = self.blueprints.get(key)?;
        let (parent, local) = self.resolve_placement(placement, container);

        let node = Node {
            label: format!("{}_{}", blueprint.label, self.counters.created),
            kind: NodeKind::Instance,
            key: Some(key.clone()),
            local,
            parent,
            active: true,
            state: blueprint.state.clone(),
        };

        let id = self.scene.spawn(node)?;
        self.counters.created += 1;
        tracing::trace!("Created {:?} for {:?}", id, key);
        Some(id)
    }

    fn place(&mut self, handle: NodeId, placement: &Placement<NodeId>) {
        let current = self.scene.get(handle).and_then(|node| node.parent);
        let (parent, local) = self.resolve_placement(placement, current);
        if let Some(node) = self.scene.get_mut(handle) {
            node.parent = parent;
            node.local = local;
        }
    }

    fn set_active(&mut self, handle: NodeId, active: bool) {
        let Some(node) = self.scene.get_mut(handle) else {
            return;
        };
        node.active = active;
        if active {
            self.counters.activations += 1;
        } else {
            self.counters.deactivations += 1;
        }
    }

    fn reparent(&mut self, handle: NodeId, container: NodeId) {
        if self.scene.set_parent(handle, Some(container)) {
            self.counters.reparents += 1;
        }
    }

    fn detach(&mut self, handle: NodeId) {
        if self.scene.set_parent(handle, None) {
            self.counters.reparents += 1;
        }
    }

    fn parent_of(&self, handle: NodeId) -> Option<NodeId> {
        self.scene.get(handle)?.parent
    }

    fn is_valid(&self, handle: NodeId) -> bool {
        self.scene.contains(handle)
    }

    fn destroy(&mut self, handle: NodeId) {
        if self.scene.despawn(handle).is_some() {
            self.counters.destroyed += 1;
            tracing::trace!("Destroyed {:?}", handle);
        }
    }

    fn create_container(&mut self, name: &str, parent: Option<NodeId>) -> Option<NodeId> {
        let parent = parent.filter(|p| self.scene.contains(*p));
        let id = self.scene.spawn(Node::container(name, parent))?;
        self.counters.containers += 1;
        Some(id)
    }
}

impl<K, S> Capability<S> for HeadlessEngine<K, S>
where
    K: Clone + Eq + Hash + Debug,
    S: Clone,
{
    fn capability_mut(&mut self, handle: NodeId) -> Option<&mut S> {
        self.scene.get_mut(handle)?.state.as_mut()
    }
}
