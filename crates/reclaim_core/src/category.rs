//! # Pool Categories
//!
//! A small closed set of tags used only to pick which organizational
//! container a pool's instances live under.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping tag for organizational containers.
///
/// Carries no pooling semantics: two pools with different categories
/// behave identically apart from where their instances are parented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    /// Graph or path nodes.
    Nodes = 0,
    /// Objects that spawn nodes.
    NodeSpawners = 1,
    /// Generic gameplay objects.
    #[default]
    GameObjects = 2,
    /// Camera-facing sprites and labels.
    Billboards = 3,
}

impl Category {
    /// Number of categories.
    pub const COUNT: usize = 4;

    /// Every category, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Nodes,
        Self::NodeSpawners,
        Self::GameObjects,
        Self::Billboards,
    ];

    /// Dense index in `0..COUNT`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Display name, also used for container labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nodes => "Nodes",
            Self::NodeSpawners => "NodeSpawners",
            Self::GameObjects => "GameObjects",
            Self::Billboards => "Billboards",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
