//! # Pool Registry
//!
//! Bookkeeping for every pool: the inactive set per key and the reverse
//! mapping from a live instance back to the key it was created for.
//!
//! The registry never calls the host. Liveness checks are passed in as a
//! closure so the registry can be tested with plain integers as handles.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::category::Category;

/// Counters for a single pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances currently waiting in the inactive set.
    pub inactive: usize,
    /// Instances ever created for this key.
    pub created: usize,
    /// Acquisitions served from the inactive set.
    pub reused: usize,
    /// Stale handles dropped from the inactive set.
    pub discarded: usize,
}

/// The inactive set of one key.
///
/// Acts as a stack for cache locality: the most recently released
/// instance is handed out first. `parked` mirrors `inactive` so duplicate
/// returns are rejected in O(1).
#[derive(Debug)]
pub struct Pool<I> {
    /// Inactive instances, most recent last.
    inactive: Vec<I>,
    /// Membership of `inactive`.
    parked: HashSet<I>,
    /// Category the pool was first requested with.
    category: Category,
    created: usize,
    reused: usize,
    discarded: usize,
}

impl<I: Copy + Eq + Hash> Pool<I> {
    fn new(category: Category, capacity: usize) -> Self {
        Self {
            inactive: Vec::with_capacity(capacity),
            parked: HashSet::with_capacity(capacity),
            category,
            created: 0,
            reused: 0,
            discarded: 0,
        }
    }

    /// Returns the number of inactive instances.
    #[inline]
    #[must_use]
    pub fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    /// Category the pool was created with.
    #[inline]
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Whether `instance` is waiting in this pool.
    #[inline]
    #[must_use]
    pub fn contains(&self, instance: I) -> bool {
        self.parked.contains(&instance)
    }

    /// Snapshot of the pool's counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            inactive: self.inactive.len(),
            created: self.created,
            reused: self.reused,
            discarded: self.discarded,
        }
    }

    fn push(&mut self, instance: I) -> bool {
        if !self.parked.insert(instance) {
            return false;
        }
        self.inactive.push(instance);
        true
    }

    fn pop(&mut self) -> Option<I> {
        let instance = self.inactive.pop()?;
        self.parked.remove(&instance);
        Some(instance)
    }

    fn remove(&mut self, instance: I) -> bool {
        if !self.parked.remove(&instance) {
            return false;
        }
        self.inactive.retain(|&parked| parked != instance);
        true
    }

    fn drain(&mut self) -> Vec<I> {
        self.parked.clear();
        std::mem::take(&mut self.inactive)
    }
}

/// Maps pool keys to pools and instances back to their keys.
///
/// Invariants:
/// - every key in the reverse mapping has a pool;
/// - an instance sits in at most one inactive set, at most once;
/// - every inactive instance is in the reverse mapping.
///
/// # Thread Safety
///
/// NOT thread-safe and not reentrant. Owned by a single `ObjectPooler`.
#[derive(Debug)]
pub struct PoolRegistry<K, I> {
    pools: HashMap<K, Pool<I>>,
    owners: HashMap<I, K>,
    initial_capacity: usize,
}

impl<K, I> PoolRegistry<K, I>
where
    K: Clone + Eq + Hash,
    I: Copy + Eq + Hash,
{
    /// Creates an empty registry. New pools reserve `initial_capacity`
    /// inactive slots.
    #[must_use]
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            pools: HashMap::new(),
            owners: HashMap::new(),
            initial_capacity,
        }
    }

    /// Returns the pool for `key`, creating an empty one on first request.
    ///
    /// The category only applies when the pool is created.
    pub fn ensure_pool(&mut self, key: &K, category: Category) -> &mut Pool<I> {
        let capacity = self.initial_capacity;
        self.pools
            .entry(key.clone())
            .or_insert_with(|| Pool::new(category, capacity))
    }

    /// Pops one inactive instance for `key`.
    ///
    /// Handles for which `is_alive` returns false were destroyed behind the
    /// pooler's back: they are dropped, forgotten, and the search goes on.
    /// Returns `None` once the set is exhausted.
    pub fn try_take_inactive(
        &mut self,
        key: &K,
        mut is_alive: impl FnMut(I) -> bool,
    ) -> Option<I> {
        let pool = self.pools.get_mut(key)?;
        let mut stale = 0;
        let mut found = None;

        while let Some(instance) = pool.pop() {
            if is_alive(instance) {
                pool.reused += 1;
                found = Some(instance);
                break;
            }
            pool.discarded += 1;
            stale += 1;
            self.owners.remove(&instance);
        }

        if stale > 0 {
            tracing::debug!("Discarded {} destroyed inactive instances", stale);
        }
        found
    }

    /// Records that `instance` was created for `key`.
    ///
    /// Called once per instance, right after creation. Returns false if the
    /// instance was already registered, in which case nothing changes.
    pub fn register_instance(&mut self, key: &K, instance: I) -> bool {
        if self.owners.contains_key(&instance) {
            return false;
        }
        self.ensure_pool(key, Category::default()).created += 1;
        self.owners.insert(instance, key.clone());
        true
    }

    /// Puts `instance` back into the inactive set of `key`.
    ///
    /// Returns false if it was already there.
    pub fn return_inactive(&mut self, key: &K, instance: I) -> bool {
        self.ensure_pool(key, Category::default()).push(instance)
    }

    /// The key `instance` was created for, or `None` if it is not pooled.
    #[inline]
    #[must_use]
    pub fn resolve_key(&self, instance: I) -> Option<&K> {
        self.owners.get(&instance)
    }

    /// Drops every trace of `instance`. Used when it is destroyed for good.
    pub fn forget_instance(&mut self, instance: I) -> Option<K> {
        let key = self.owners.remove(&instance)?;
        if let Some(pool) = self.pools.get_mut(&key) {
            pool.remove(instance);
        }
        Some(key)
    }

    /// Whether `instance` is currently in an inactive set.
    #[must_use]
    pub fn is_inactive(&self, instance: I) -> bool {
        self.owners
            .get(&instance)
            .and_then(|key| self.pools.get(key))
            .is_some_and(|pool| pool.contains(instance))
    }

    /// Looks up the pool for `key`.
    #[inline]
    #[must_use]
    pub fn pool(&self, key: &K) -> Option<&Pool<I>> {
        self.pools.get(key)
    }

    /// Number of pools.
    #[inline]
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Number of registered instances, active and inactive.
    #[inline]
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.owners.len()
    }

    /// Registered instances that are not in any inactive set.
    #[must_use]
    pub fn active_instances(&self) -> Vec<I> {
        self.owners
            .keys()
            .copied()
            .filter(|&instance| !self.is_inactive(instance))
            .collect()
    }

    /// Empties the inactive set of `key` and forgets those instances.
    /// Active instances of the key stay registered.
    pub fn drain_pool(&mut self, key: &K) -> Vec<I> {
        let Some(pool) = self.pools.get_mut(key) else {
            return Vec::new();
        };
        let drained = pool.drain();
        for instance in &drained {
            self.owners.remove(instance);
        }
        drained
    }

    /// Empties every inactive set. Mappings are left for [`Self::clear`].
    pub fn drain_all_inactive(&mut self) -> Vec<I> {
        self.pools.values_mut().flat_map(Pool::drain).collect()
    }

    /// Removes every pool and mapping.
    pub fn clear(&mut self) {
        self.pools.clear();
        self.owners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PoolRegistry<&'static str, u32> {
        PoolRegistry::new(4)
    }

    #[test]
    fn test_ensure_pool_is_idempotent() {
        let mut reg = registry();
        reg.ensure_pool(&"enemy", Category::Nodes);
        reg.ensure_pool(&"enemy", Category::Billboards);

        assert_eq!(reg.pool_count(), 1);
        // First request wins.
        assert_eq!(reg.pool(&"enemy").unwrap().category(), Category::Nodes);
    }

    #[test]
    fn test_take_from_empty_pool() {
        let mut reg = registry();
        assert_eq!(reg.try_take_inactive(&"enemy", |_| true), None);

        reg.ensure_pool(&"enemy", Category::GameObjects);
        assert_eq!(reg.try_take_inactive(&"enemy", |_| true), None);
    }

    #[test]
    fn test_return_and_take() {
        let mut reg = registry();
        reg.ensure_pool(&"enemy", Category::GameObjects);
        assert!(reg.register_instance(&"enemy", 1));
        assert!(reg.return_inactive(&"enemy", 1));
        assert!(reg.is_inactive(1));

        assert_eq!(reg.try_take_inactive(&"enemy", |_| true), Some(1));
        assert!(!reg.is_inactive(1));
        // Still owned after being handed out.
        assert_eq!(reg.resolve_key(1), Some(&"enemy"));

        let stats = reg.pool(&"enemy").unwrap().stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn test_duplicate_return_is_rejected() {
        let mut reg = registry();
        reg.register_instance(&"enemy", 1);
        assert!(reg.return_inactive(&"enemy", 1));
        assert!(!reg.return_inactive(&"enemy", 1));
        assert_eq!(reg.pool(&"enemy").unwrap().inactive_len(), 1);
    }

    #[test]
    fn test_register_twice() {
        let mut reg = registry();
        assert!(reg.register_instance(&"enemy", 1));
        assert!(!reg.register_instance(&"enemy", 1));
        assert_eq!(reg.pool(&"enemy").unwrap().stats().created, 1);
    }

    #[test]
    fn test_stale_handles_are_skipped() {
        let mut reg = registry();
        for id in [1, 2, 3] {
            reg.register_instance(&"enemy", id);
            reg.return_inactive(&"enemy", id);
        }

        // 3 and 2 were destroyed externally; 1 is still alive.
        let taken = reg.try_take_inactive(&"enemy", |id| id == 1);
        assert_eq!(taken, Some(1));
        assert_eq!(reg.resolve_key(3), None);
        assert_eq!(reg.resolve_key(2), None);
        assert_eq!(reg.pool(&"enemy").unwrap().stats().discarded, 2);
    }

    #[test]
    fn test_all_stale_yields_none() {
        let mut reg = registry();
        reg.register_instance(&"enemy", 1);
        reg.return_inactive(&"enemy", 1);

        assert_eq!(reg.try_take_inactive(&"enemy", |_| false), None);
        assert_eq!(reg.pool(&"enemy").unwrap().inactive_len(), 0);
    }

    #[test]
    fn test_lifo_order() {
        let mut reg = registry();
        for id in [1, 2] {
            reg.register_instance(&"enemy", id);
            reg.return_inactive(&"enemy", id);
        }
        assert_eq!(reg.try_take_inactive(&"enemy", |_| true), Some(2));
    }

    #[test]
    fn test_forget_removes_from_inactive_set() {
        let mut reg = registry();
        reg.register_instance(&"enemy", 1);
        reg.return_inactive(&"enemy", 1);

        assert_eq!(reg.forget_instance(1), Some("enemy"));
        assert_eq!(reg.forget_instance(1), None);
        assert_eq!(reg.pool(&"enemy").unwrap().inactive_len(), 0);
    }

    #[test]
    fn test_drain_pool_keeps_active_instances() {
        let mut reg = registry();
        reg.register_instance(&"enemy", 1);
        reg.register_instance(&"enemy", 2);
        reg.return_inactive(&"enemy", 1);

        assert_eq!(reg.drain_pool(&"enemy"), vec![1]);
        assert_eq!(reg.resolve_key(1), None);
        assert_eq!(reg.resolve_key(2), Some(&"enemy"));
        assert_eq!(reg.instance_count(), 1);
    }

    #[test]
    fn test_active_instances() {
        let mut reg = registry();
        reg.register_instance(&"enemy", 1);
        reg.register_instance(&"enemy", 2);
        reg.return_inactive(&"enemy", 2);

        assert_eq!(reg.active_instances(), vec![1]);
    }

    #[test]
    fn test_drain_all_and_clear() {
        let mut reg = registry();
        reg.register_instance(&"enemy", 1);
        reg.register_instance(&"bullet", 2);
        reg.return_inactive(&"enemy", 1);
        reg.return_inactive(&"bullet", 2);

        let mut drained = reg.drain_all_inactive();
        drained.sort_unstable();
        assert_eq!(drained, vec![1, 2]);

        reg.clear();
        assert_eq!(reg.pool_count(), 0);
        assert_eq!(reg.instance_count(), 0);
    }
}
