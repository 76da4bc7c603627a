//! # Placement
//!
//! Where an acquired instance should end up. A single type covers both the
//! world-space and the parent-relative case so hosts expose one creation
//! path instead of one per flavour.

use crate::math::{Transform, Vec3};

/// Placement of a pooled instance, either in world space or relative to a
/// parent object.
///
/// `P` is the host's handle type for scene objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement<P> {
    /// World-space transform. The instance stays under its pool container.
    World(Transform),
    /// Transform relative to `parent`. The instance is attached to it.
    Attached {
        /// Object the instance is attached to while active.
        parent: P,
        /// Transform in the parent's space.
        local: Transform,
    },
}

impl<P> Placement<P> {
    /// World placement at `position` with no rotation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self::World(Transform::from_position(position))
    }

    /// World placement with a full transform.
    #[must_use]
    pub const fn world(transform: Transform) -> Self {
        Self::World(transform)
    }

    /// Placement relative to `parent`.
    #[must_use]
    pub const fn attached(parent: P, local: Transform) -> Self {
        Self::Attached { parent, local }
    }

    /// The transform, in world space or parent space depending on the variant.
    #[must_use]
    pub const fn transform(&self) -> &Transform {
        match self {
            Self::World(transform) | Self::Attached { local: transform, .. } => transform,
        }
    }

    /// The parent for attached placements.
    #[must_use]
    pub const fn parent(&self) -> Option<&P> {
        match self {
            Self::World(_) => None,
            Self::Attached { parent, .. } => Some(parent),
        }
    }
}

impl<P> Default for Placement<P> {
    fn default() -> Self {
        Self::World(Transform::IDENTITY)
    }
}
