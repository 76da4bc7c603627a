//! # Pooler Configuration
//!
//! Loaded once at session start from TOML.
//!
//! ```toml
//! root_name = "ObjectPools_Root"
//! container_prefix = "PoolRoot_"
//! unknown_release = "warn"
//! initial_pool_capacity = 8
//! ```
//!
//! A prewarm plan lives in its own document:
//!
//! ```toml
//! [[pool]]
//! key = "Enemy"
//! count = 16
//! category = "GameObjects"
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::error::{PoolError, PoolResult};

/// What to do with an instance handed to `release` that no pool knows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownReleasePolicy {
    /// Leave the instance untouched and log a warning.
    #[default]
    Warn,
    /// Log a warning and destroy the instance through the host.
    Destroy,
}

/// Pooler settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolerConfig {
    /// Label of the root container.
    pub root_name: String,
    /// Category containers are labelled `<prefix><Category>`.
    pub container_prefix: String,
    /// Policy for releasing unpooled instances.
    pub unknown_release: UnknownReleasePolicy,
    /// Inactive-set capacity reserved for each new pool.
    pub initial_pool_capacity: usize,
}

impl Default for PoolerConfig {
    fn default() -> Self {
        Self {
            root_name: "ObjectPools_Root".to_owned(),
            container_prefix: "PoolRoot_".to_owned(),
            unknown_release: UnknownReleasePolicy::Warn,
            initial_pool_capacity: 8,
        }
    }
}

impl PoolerConfig {
    /// Parses a config from TOML text. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if the text is not valid TOML
    /// or a field has the wrong type.
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        toml::from_str(text).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }

    /// Label for the container of `category`.
    #[must_use]
    pub fn container_name(&self, category: Category) -> String {
        format!("{}{}", self.container_prefix, category.name())
    }
}

/// One pool to fill ahead of demand.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrewarmEntry<K> {
    /// Pool key.
    pub key: K,
    /// Number of inactive instances to have ready.
    pub count: usize,
    /// Container category for the pool.
    #[serde(default)]
    pub category: Category,
}

/// A list of pools to prewarm at session start.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "K: Deserialize<'de>"))]
pub struct PrewarmPlan<K> {
    /// Entries, applied in order.
    #[serde(default, rename = "pool")]
    pub entries: Vec<PrewarmEntry<K>>,
}

impl<K> Default for PrewarmPlan<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: DeserializeOwned> PrewarmPlan<K> {
    /// Parses a plan from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] on malformed input.
    pub fn from_toml_str(text: &str) -> PoolResult<Self> {
        toml::from_str(text).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }
}

impl<K> PrewarmPlan<K> {
    /// Total number of instances the plan asks for.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.count).sum()
    }
}
