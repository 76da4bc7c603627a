//! # RECLAIM Headless
//!
//! A host engine that lives entirely in memory.
//!
//! ## What It Models
//!
//! - A scene graph of generational nodes with parent links
//! - Translation-only world placement (rotation and scale are stored, not composed)
//! - Activation as a flag
//! - Blueprints keyed by any hashable type, each carrying optional typed state
//!
//! Destroying a node detaches its children instead of destroying them, so
//! tearing down pool containers never kills instances a caller still holds.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reclaim_core::{Category, ObjectPooler, PoolerConfig};
//! use reclaim_headless::HeadlessEngine;
//!
//! let engine = HeadlessEngine::<&str, u32>::new().with_blueprint("Enemy", "Enemy", Some(100));
//! let mut pooler = ObjectPooler::new(engine, PoolerConfig::default());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod engine;
pub mod node;
pub mod scene;

pub use engine::{Blueprint, HeadlessEngine, HostCounters};
pub use node::{Node, NodeId, NodeKind};
pub use scene::Scene;
