//! # Host Engine Traits
//!
//! The pooler never touches a scene graph directly. Every engine binding
//! implements [`HostEngine`] and the pooler calls into it.
//!
//! ```text
//! reclaim_core defines:     a binding implements:
//! ┌──────────────────┐      ┌──────────────────────┐
//! │ trait HostEngine │ ←─── │ impl HostEngine for  │
//! │ trait Capability │      │   MyEngineBridge     │
//! └──────────────────┘      └──────────────────────┘
//! ```
//!
//! All calls are synchronous and happen on the thread that owns the pooler.
//! The pooler owns its host, so a host method cannot call back into the
//! pooler while it runs.

use std::fmt::Debug;
use std::hash::Hash;

use reclaim_shared::Placement;

/// Interface to the engine that actually creates and destroys objects.
pub trait HostEngine {
    /// Identity of a poolable object type (class, prefab, blueprint).
    type Key: Clone + Eq + Hash + Debug;

    /// Handle to a live scene object. Instances and containers share it.
    ///
    /// A host may hand out the value of a destroyed object again.
    type Handle: Copy + Eq + Hash + Debug;

    /// Creates a new object of type `key`, placed per `placement`.
    ///
    /// World placements are parented under `container` when one is given;
    /// attached placements go under their own parent.
    ///
    /// Returns `None` if the host cannot create the type.
    fn create(
        &mut self,
        key: &Self::Key,
        placement: &Placement<Self::Handle>,
        container: Option<Self::Handle>,
    ) -> Option<Self::Handle>;

    /// Moves an existing object to `placement`.
    fn place(&mut self, handle: Self::Handle, placement: &Placement<Self::Handle>);

    /// Toggles rendering, collision and ticking in one call.
    fn set_active(&mut self, handle: Self::Handle, active: bool);

    /// Moves `handle` under `container` keeping its world placement.
    fn reparent(&mut self, handle: Self::Handle, container: Self::Handle);

    /// Current parent of `handle`, if any.
    fn parent_of(&self, handle: Self::Handle) -> Option<Self::Handle>;

    /// Liveness check. False once the object has been destroyed by anyone.
    fn is_valid(&self, handle: Self::Handle) -> bool;

    /// Unparents `handle`, keeping its world placement.
    fn detach(&mut self, handle: Self::Handle);

    /// Permanently destroys an object.
    ///
    /// Hosts may destroy children along with it. The pooler detaches every
    /// active instance from its containers before destroying them.
    fn destroy(&mut self, handle: Self::Handle);

    /// Creates an empty grouping node labelled `name`.
    fn create_container(
        &mut self,
        name: &str,
        parent: Option<Self::Handle>,
    ) -> Option<Self::Handle>;
}

/// Typed view of an instance.
///
/// A host implements this once per component type it can expose. Lookup
/// fails with `None` when the instance does not carry `C`.
pub trait Capability<C>: HostEngine {
    /// Mutable access to the `C` attached to `handle`.
    fn capability_mut(&mut self, handle: Self::Handle) -> Option<&mut C>;
}
