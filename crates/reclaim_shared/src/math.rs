//! Spatial types handed across the host boundary.
//!
//! Every type here is `Pod` so a binding can copy it straight into engine
//! memory without a conversion pass.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// 3D vector - positions and offsets
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
}

impl Vec3 {
    /// Creates a new Vec3
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The origin
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Unit vector along X
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Rotation as a unit quaternion
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Quaternion {
    /// X component
    pub x: f32,
    /// Y component
    pub y: f32,
    /// Z component
    pub z: f32,
    /// W component
    pub w: f32,
}

impl Quaternion {
    /// Creates a new quaternion
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Identity rotation
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Rotation of `angle` radians around the Y (up) axis.
    #[must_use]
    pub fn from_yaw(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(0.0, half.sin(), 0.0, half.cos())
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position, rotation and uniform scale of a scene object.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Transform {
    /// Position
    pub position: Vec3,
    /// Scale (uniform)
    pub scale: f32,
    /// Rotation
    pub rotation: Quaternion,
}

impl Transform {
    /// Creates a new transform
    #[must_use]
    pub const fn new(position: Vec3, rotation: Quaternion, scale: f32) -> Self {
        Self { position, scale, rotation }
    }

    /// Unrotated, unscaled transform at `position`.
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self::new(position, Quaternion::IDENTITY, 1.0)
    }

    /// Same transform with a different rotation.
    #[must_use]
    pub const fn with_rotation(self, rotation: Quaternion) -> Self {
        Self::new(self.position, rotation, self.scale)
    }

    /// Identity transform
    pub const IDENTITY: Self = Self::from_position(Vec3::ZERO);
}

// A derived Default would give scale 0.0.
impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
