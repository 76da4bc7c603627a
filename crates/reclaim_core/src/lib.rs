//! # RECLAIM Core
//!
//! Object pooling for game engines: instead of destroying an actor when it
//! is done, hand it back to its pool and reuse it for the next request.
//!
//! ## Architecture
//!
//! 1. **Pool Registry** - per-key inactive sets plus the reverse mapping
//!    from instance to key, so callers never have to remember where an
//!    instance came from
//! 2. **Object Pooler** - the acquire / release / prewarm / teardown
//!    protocol, activation toggling and container parenting
//! 3. **Host Engine** - a trait the engine binding implements; the core
//!    never touches a scene graph directly
//!
//! ## Ownership Rule
//!
//! The pooler owns only what it holds inactive. Instances handed out to
//! callers are theirs, and survive teardown.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reclaim_core::{Category, ObjectPooler, PoolerConfig};
//! use reclaim_shared::{Placement, Vec3};
//!
//! let mut pooler = ObjectPooler::new(engine, PoolerConfig::default());
//! pooler.prewarm(&enemy_class, 32, Category::GameObjects)?;
//!
//! let enemy = pooler.acquire(&enemy_class, &Placement::at(Vec3::new(5.0, 0.0, 0.0)), Category::GameObjects)?;
//! pooler.release(enemy, Category::GameObjects)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod category;
pub mod config;
pub mod containers;
pub mod error;
pub mod host;
pub mod pooler;
pub mod registry;

pub use category::Category;
pub use config::{PoolerConfig, PrewarmEntry, PrewarmPlan, UnknownReleasePolicy};
pub use containers::Containers;
pub use error::{PoolError, PoolResult};
pub use host::{Capability, HostEngine};
pub use pooler::{InstanceState, ObjectPooler, ReleaseOutcome};
pub use registry::{Pool, PoolRegistry, PoolStats};
