//! # Organizational Containers
//!
//! One root node with one child per category, created lazily. Purely
//! cosmetic: if the host cannot create a container, pooling carries on
//! with unparented instances.

use crate::category::Category;
use crate::config::PoolerConfig;
use crate::host::HostEngine;

/// Root and per-category container handles.
#[derive(Debug)]
pub struct Containers<C> {
    root: Option<C>,
    by_category: [Option<C>; Category::COUNT],
}

impl<C: Copy + Eq> Containers<C> {
    /// No containers yet.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            by_category: [None; Category::COUNT],
        }
    }

    /// Root container, if it has been created.
    #[must_use]
    pub const fn root(&self) -> Option<C> {
        self.root
    }

    /// Container of `category`, if it has been created.
    #[must_use]
    pub const fn get(&self, category: Category) -> Option<C> {
        self.by_category[category.index()]
    }

    /// Whether `handle` is the root or one of the category containers.
    #[must_use]
    pub fn holds(&self, handle: C) -> bool {
        self.root == Some(handle) || self.by_category.contains(&Some(handle))
    }

    /// Returns the container for `category`, creating it and the root on
    /// first use or after external destruction.
    pub fn resolve<H>(&mut self, host: &mut H, config: &PoolerConfig, category: Category) -> Option<C>
    where
        H: HostEngine<Handle = C>,
    {
        let root = self.resolve_root(host, config);

        let slot = &mut self.by_category[category.index()];
        if let Some(container) = *slot {
            if host.is_valid(container) {
                return Some(container);
            }
            tracing::debug!("Container for {} was destroyed, recreating", category);
        }

        let name = config.container_name(category);
        *slot = host.create_container(&name, root);
        if slot.is_none() {
            tracing::warn!("Host could not create container {}, instances stay unparented", name);
        }
        *slot
    }

    fn resolve_root<H>(&mut self, host: &mut H, config: &PoolerConfig) -> Option<C>
    where
        H: HostEngine<Handle = C>,
    {
        if let Some(root) = self.root {
            if host.is_valid(root) {
                return Some(root);
            }
        }

        self.root = host.create_container(&config.root_name, None);
        let Some(root) = self.root else {
            tracing::warn!("Host could not create root container {}", config.root_name);
            return None;
        };

        // Surviving category containers move under the new root.
        for container in self.by_category.iter().flatten() {
            if host.is_valid(*container) {
                host.reparent(*container, root);
            }
        }
        Some(root)
    }

    /// Destroys every container, categories first.
    pub fn teardown<H>(&mut self, host: &mut H)
    where
        H: HostEngine<Handle = C>,
    {
        for slot in &mut self.by_category {
            if let Some(container) = slot.take() {
                if host.is_valid(container) {
                    host.destroy(container);
                }
            }
        }
        if let Some(root) = self.root.take() {
            if host.is_valid(root) {
                host.destroy(root);
            }
        }
    }
}

impl<C: Copy + Eq> Default for Containers<C> {
    fn default() -> Self {
        Self::new()
    }
}
