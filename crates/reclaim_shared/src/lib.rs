//! # RECLAIM Shared
//!
//! Plain value types used by the pooling core and by every host binding.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - A host engine
//! - Any GPU or window-related crate
//!
//! Engine-specific conversions belong in the binding that needs them.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;
pub mod placement;

pub use math::{Quaternion, Transform, Vec3};
pub use placement::Placement;
