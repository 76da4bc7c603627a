//! # Object Pooler
//!
//! The get/release protocol on top of [`PoolRegistry`].
//!
//! ```text
//!              acquire                     release
//! Uninitialized ──create──▶ Active ◀──acquire── Inactive ──teardown──▶ Destroyed
//!                             │                    ▲
//!                             └──────release───────┘
//! ```
//!
//! The pooler owns only what it holds inactive. Active instances belong to
//! the caller and survive [`ObjectPooler::teardown`].

use std::any::type_name;

use reclaim_shared::Placement;

use crate::category::Category;
use crate::config::{PoolerConfig, PrewarmPlan, UnknownReleasePolicy};
use crate::containers::Containers;
use crate::error::{PoolError, PoolResult};
use crate::host::{Capability, HostEngine};
use crate::registry::{PoolRegistry, PoolStats};

/// Pooling state of a registered instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceState {
    /// Handed out and owned by the caller.
    Active,
    /// Waiting in its pool.
    Inactive,
}

/// What a call to `release` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReleaseOutcome {
    /// Deactivated and put back into its pool.
    Returned,
    /// Already inactive. Nothing changed.
    AlreadyInactive,
    /// Pooled, but destroyed by someone else. Its mapping was dropped.
    Discarded,
}

/// Recycles host objects per pool key.
///
/// One pooler per host session. Dropping it tears the session down.
///
/// # Thread Safety
///
/// NOT thread-safe. All calls come from the host's main thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut pooler = ObjectPooler::new(engine, PoolerConfig::default());
///
/// let enemy = pooler.acquire(&"Enemy", &Placement::at(Vec3::ZERO), Category::GameObjects)?;
/// // ... later, instead of destroying it:
/// pooler.release(enemy, Category::GameObjects)?;
/// ```
#[derive(Debug)]
pub struct ObjectPooler<H: HostEngine> {
    host: H,
    config: PoolerConfig,
    registry: PoolRegistry<H::Key, H::Handle>,
    containers: Containers<H::Handle>,
}

impl<H: HostEngine> ObjectPooler<H> {
    /// Starts a pooling session on `host`.
    #[must_use]
    pub fn new(host: H, config: PoolerConfig) -> Self {
        Self {
            registry: PoolRegistry::new(config.initial_pool_capacity),
            containers: Containers::new(),
            host,
            config,
        }
    }

    /// The host engine.
    #[inline]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Mutable access to the host engine.
    #[inline]
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Active configuration.
    #[inline]
    pub const fn config(&self) -> &PoolerConfig {
        &self.config
    }

    /// Hands out an instance of `key`, reusing an inactive one if possible.
    ///
    /// The returned instance is active and placed per `placement`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CreationFailed`] if the pool is empty and the
    /// host cannot create a new instance.
    pub fn acquire(
        &mut self,
        key: &H::Key,
        placement: &Placement<H::Handle>,
        category: Category,
    ) -> PoolResult<H::Handle> {
        self.registry.ensure_pool(key, category);

        let host = &self.host;
        let reused = self.registry.try_take_inactive(key, |h| host.is_valid(h));
        let handle = match reused {
            Some(handle) => handle,
            None => self.create(key, placement, category)?,
        };

        self.host.place(handle, placement);
        self.host.set_active(handle, true);
        Ok(handle)
    }

    fn create(
        &mut self,
        key: &H::Key,
        placement: &Placement<H::Handle>,
        category: Category,
    ) -> PoolResult<H::Handle> {
        let container = self.containers.resolve(&mut self.host, &self.config, category);

        let Some(handle) = self.host.create(key, placement, container) else {
            tracing::error!("Host failed to create an instance for {:?}", key);
            return Err(PoolError::CreationFailed(format!("{key:?}")));
        };

        if !self.registry.register_instance(key, handle) {
            // The host reused the value of an instance destroyed while active.
            tracing::debug!("Handle {:?} was reused by the host, dropping its old mapping", handle);
            self.registry.forget_instance(handle);
            self.registry.register_instance(key, handle);
        }
        Ok(handle)
    }

    /// Acquires an instance together with its `C` capability.
    ///
    /// An instance without `C` goes straight back to its pool.
    ///
    /// # Errors
    ///
    /// Everything [`Self::acquire`] returns, plus
    /// [`PoolError::MissingCapability`].
    pub fn acquire_with<C>(
        &mut self,
        key: &H::Key,
        placement: &Placement<H::Handle>,
        category: Category,
    ) -> PoolResult<(H::Handle, &mut C)>
    where
        H: Capability<C>,
    {
        let handle = self.acquire(key, placement, category)?;

        if self.host.capability_mut(handle).is_none() {
            self.release(handle, category)?;
            return Err(Self::missing_capability::<C>(handle));
        }

        self.capability(handle).map(|capability| (handle, capability))
    }

    /// Typed view of `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::MissingCapability`] if the instance lacks `C`.
    pub fn capability<C>(&mut self, handle: H::Handle) -> PoolResult<&mut C>
    where
        H: Capability<C>,
    {
        self.host
            .capability_mut(handle)
            .ok_or_else(|| Self::missing_capability::<C>(handle))
    }

    fn missing_capability<C>(handle: H::Handle) -> PoolError {
        let capability = type_name::<C>();
        tracing::error!("Instance {:?} has no {} capability", handle, capability);
        PoolError::MissingCapability {
            instance: format!("{handle:?}"),
            capability,
        }
    }

    /// Returns `handle` to its pool, parented under the container of
    /// `category`.
    ///
    /// Releasing twice is harmless: the second call reports
    /// [`ReleaseOutcome::AlreadyInactive`].
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotPooled`] if no pool knows `handle`. The
    /// configured [`UnknownReleasePolicy`] decides whether it is destroyed.
    pub fn release(&mut self, handle: H::Handle, category: Category) -> PoolResult<ReleaseOutcome> {
        if !self.host.is_valid(handle) {
            if self.registry.forget_instance(handle).is_some() {
                tracing::debug!("Released {:?} after it was destroyed, forgetting it", handle);
                return Ok(ReleaseOutcome::Discarded);
            }
            tracing::warn!("Trying to release a dead instance that is not pooled: {:?}", handle);
            return Err(PoolError::NotPooled(format!("{handle:?}")));
        }

        let Some(key) = self.registry.resolve_key(handle).cloned() else {
            return Err(self.release_unknown(handle));
        };

        if self.registry.is_inactive(handle) {
            tracing::debug!("Instance {:?} released twice", handle);
            return Ok(ReleaseOutcome::AlreadyInactive);
        }

        self.host.set_active(handle, false);

        if let Some(container) = self.containers.resolve(&mut self.host, &self.config, category) {
            if self.host.parent_of(handle) != Some(container) {
                self.host.reparent(handle, container);
            }
        }

        self.registry.return_inactive(&key, handle);
        Ok(ReleaseOutcome::Returned)
    }

    fn release_unknown(&mut self, handle: H::Handle) -> PoolError {
        match self.config.unknown_release {
            UnknownReleasePolicy::Warn => {
                tracing::warn!("Trying to return an instance that is not pooled: {:?}", handle);
            }
            UnknownReleasePolicy::Destroy => {
                tracing::warn!("Destroying an instance that is not pooled: {:?}", handle);
                self.host.destroy(handle);
            }
        }
        PoolError::NotPooled(format!("{handle:?}"))
    }

    /// Releases `handle` under the category its pool was created with.
    ///
    /// # Errors
    ///
    /// Same as [`Self::release`].
    pub fn recycle(&mut self, handle: H::Handle) -> PoolResult<ReleaseOutcome> {
        let category = self
            .registry
            .resolve_key(handle)
            .and_then(|key| self.registry.pool(key))
            .map_or_else(Category::default, |pool| pool.category());
        self.release(handle, category)
    }

    /// Fills the pool for `key` with `count` instances at the origin.
    ///
    /// # Errors
    ///
    /// See [`Self::prewarm_at`].
    pub fn prewarm(&mut self, key: &H::Key, count: usize, category: Category) -> PoolResult<usize> {
        self.prewarm_at(key, count, &Placement::default(), category)
    }

    /// Fills the pool for `key` so at least `count` instances are inactive.
    ///
    /// All `count` instances are acquired before any is released, so
    /// pre-existing inactive instances count towards the total. Returns
    /// the inactive count afterwards. No instance is left active.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::CreationFailed`] if the host stops creating
    /// instances. Whatever was acquired up to then is released first.
    pub fn prewarm_at(
        &mut self,
        key: &H::Key,
        count: usize,
        placement: &Placement<H::Handle>,
        category: Category,
    ) -> PoolResult<usize> {
        let mut acquired = Vec::new();
        let mut failure = None;

        for _ in 0..count {
            match self.acquire(key, placement, category) {
                Ok(handle) => acquired.push(handle),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        for handle in acquired {
            if let Err(err) = self.release(handle, category) {
                tracing::warn!("Prewarm could not release {:?}: {}", handle, err);
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(self.inactive_count(key)),
        }
    }

    /// Prewarms every entry of `plan`. Returns the number of entries applied.
    ///
    /// # Errors
    ///
    /// Stops at the first entry that fails.
    pub fn apply_plan(&mut self, plan: &PrewarmPlan<H::Key>) -> PoolResult<usize> {
        tracing::debug!(
            "Applying prewarm plan: {} pools, {} instances",
            plan.entries.len(),
            plan.total_count()
        );
        for entry in &plan.entries {
            self.prewarm(&entry.key, entry.count, entry.category)?;
        }
        Ok(plan.entries.len())
    }

    /// Destroys the inactive instances of `key`. Returns how many died.
    ///
    /// Active instances of the key stay registered and can still be
    /// released later.
    pub fn clear_pool(&mut self, key: &H::Key) -> usize {
        let drained = self.registry.drain_pool(key);
        self.destroy_all(drained)
    }

    /// Ends the session: destroys every inactive instance and all
    /// containers, and forgets every mapping.
    ///
    /// Active instances are detached from the containers first and
    /// otherwise left alone. Safe to call more than once.
    pub fn teardown(&mut self) {
        let pools = self.registry.pool_count();
        let instances = self.registry.instance_count();
        let active = self.registry.active_instances();
        let drained = self.registry.drain_all_inactive();
        let destroyed = self.destroy_all(drained);

        for handle in active {
            if !self.host.is_valid(handle) {
                continue;
            }
            if self.host.parent_of(handle).is_some_and(|parent| self.containers.holds(parent)) {
                self.host.detach(handle);
            }
        }

        self.registry.clear();
        self.containers.teardown(&mut self.host);

        if pools > 0 {
            tracing::info!(
                "Pooler torn down: {} pools, {} instances known, {} inactive destroyed",
                pools,
                instances,
                destroyed
            );
        }
    }

    fn destroy_all(&mut self, handles: Vec<H::Handle>) -> usize {
        let mut destroyed = 0;
        for handle in handles {
            if self.host.is_valid(handle) {
                self.host.destroy(handle);
                destroyed += 1;
            }
        }
        destroyed
    }

    /// Pooling state of `handle`, or `None` if it is not pooled.
    #[must_use]
    pub fn state(&self, handle: H::Handle) -> Option<InstanceState> {
        self.registry.resolve_key(handle)?;
        if self.registry.is_inactive(handle) {
            Some(InstanceState::Inactive)
        } else {
            Some(InstanceState::Active)
        }
    }

    /// Whether `handle` was created by this pooler and not yet forgotten.
    #[inline]
    #[must_use]
    pub fn is_pooled(&self, handle: H::Handle) -> bool {
        self.registry.resolve_key(handle).is_some()
    }

    /// Inactive instances waiting for `key`.
    #[must_use]
    pub fn inactive_count(&self, key: &H::Key) -> usize {
        self.registry.pool(key).map_or(0, |pool| pool.inactive_len())
    }

    /// Counters for `key`, or `None` if the pool was never requested.
    #[must_use]
    pub fn stats(&self, key: &H::Key) -> Option<PoolStats> {
        self.registry.pool(key).map(|pool| pool.stats())
    }

    /// Number of pools.
    #[inline]
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.registry.pool_count()
    }

    /// Root container, once created.
    #[inline]
    #[must_use]
    pub const fn root_container(&self) -> Option<H::Handle> {
        self.containers.root()
    }

    /// Container of `category`, once created.
    #[inline]
    #[must_use]
    pub const fn container(&self, category: Category) -> Option<H::Handle> {
        self.containers.get(category)
    }
}

impl<H: HostEngine> Drop for ObjectPooler<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    struct Object {
        key: Option<&'static str>,
        parent: Option<u32>,
        active: bool,
        health: Option<i32>,
    }

    /// Minimal host: objects in a map.
    ///
    /// `reuse_ids` hands freed ids out again, `cascade` makes destroy take
    /// children down too.
    #[derive(Debug, Default)]
    struct MockHost {
        objects: HashMap<u32, Object>,
        next_id: u32,
        free_ids: Vec<u32>,
        creations: usize,
        reuse_ids: bool,
        cascade: bool,
    }

    impl MockHost {
        fn spawn(&mut self, object: Object) -> u32 {
            let id = match self.free_ids.pop() {
                Some(id) => id,
                None => {
                    self.next_id += 1;
                    self.next_id
                }
            };
            self.objects.insert(id, object);
            id
        }

        fn is_active(&self, handle: u32) -> bool {
            self.objects.get(&handle).is_some_and(|o| o.active)
        }
    }

    impl HostEngine for MockHost {
        type Key = &'static str;
        type Handle = u32;

        fn create(&mut self, key: &&'static str, placement: &Placement<u32>, container: Option<u32>) -> Option<u32> {
            if *key == "Broken" {
                return None;
            }
            self.creations += 1;
            let parent = placement.parent().copied().or(container);
            let health = (*key == "Enemy").then_some(100);
            Some(self.spawn(Object { key: Some(*key), parent, active: true, health }))
        }

        fn place(&mut self, handle: u32, placement: &Placement<u32>) {
            if let (Some(object), Some(parent)) = (self.objects.get_mut(&handle), placement.parent()) {
                object.parent = Some(*parent);
            }
        }

        fn set_active(&mut self, handle: u32, active: bool) {
            if let Some(object) = self.objects.get_mut(&handle) {
                object.active = active;
            }
        }

        fn reparent(&mut self, handle: u32, container: u32) {
            if let Some(object) = self.objects.get_mut(&handle) {
                object.parent = Some(container);
            }
        }

        fn parent_of(&self, handle: u32) -> Option<u32> {
            self.objects.get(&handle)?.parent
        }

        fn is_valid(&self, handle: u32) -> bool {
            self.objects.contains_key(&handle)
        }

        fn detach(&mut self, handle: u32) {
            if let Some(object) = self.objects.get_mut(&handle) {
                object.parent = None;
            }
        }

        fn destroy(&mut self, handle: u32) {
            if self.objects.remove(&handle).is_none() {
                return;
            }
            if self.reuse_ids {
                self.free_ids.push(handle);
            }
            if self.cascade {
                let children: Vec<u32> = self
                    .objects
                    .iter()
                    .filter(|(_, object)| object.parent == Some(handle))
                    .map(|(&id, _)| id)
                    .collect();
                for child in children {
                    self.destroy(child);
                }
            }
        }

        fn create_container(&mut self, _name: &str, parent: Option<u32>) -> Option<u32> {
            Some(self.spawn(Object { parent, ..Object::default() }))
        }
    }

    impl Capability<i32> for MockHost {
        fn capability_mut(&mut self, handle: u32) -> Option<&mut i32> {
            self.objects.get_mut(&handle)?.health.as_mut()
        }
    }

    fn pooler() -> ObjectPooler<MockHost> {
        ObjectPooler::new(MockHost::default(), PoolerConfig::default())
    }

    #[test]
    fn test_acquire_release_reuses_instance() {
        let mut pooler = pooler();
        let placement = Placement::default();

        let first = pooler.acquire(&"Enemy", &placement, Category::GameObjects).unwrap();
        assert!(pooler.host().is_active(first));
        assert_eq!(pooler.state(first), Some(InstanceState::Active));

        assert_eq!(pooler.release(first, Category::GameObjects), Ok(ReleaseOutcome::Returned));
        assert!(!pooler.host().is_active(first));
        assert_eq!(pooler.state(first), Some(InstanceState::Inactive));

        let second = pooler.acquire(&"Enemy", &placement, Category::GameObjects).unwrap();
        assert_eq!(first, second);
        assert_eq!(pooler.host().creations, 1);
        assert_eq!(pooler.inactive_count(&"Enemy"), 0);
    }

    #[test]
    fn test_instance_key_is_recorded() {
        let mut pooler = pooler();
        let handle = pooler.acquire(&"Bullet", &Placement::default(), Category::GameObjects).unwrap();
        assert_eq!(pooler.host().objects[&handle].key, Some("Bullet"));
        assert!(pooler.is_pooled(handle));
    }

    #[test]
    fn test_creation_failure() {
        let mut pooler = pooler();
        let err = pooler.acquire(&"Broken", &Placement::default(), Category::GameObjects).unwrap_err();
        assert!(matches!(err, PoolError::CreationFailed(_)));
    }

    #[test]
    fn test_release_reparents_under_category_container() {
        let mut pooler = pooler();
        let anchor = pooler.host_mut().spawn(Object::default());
        let placement = Placement::attached(anchor, reclaim_shared::Transform::IDENTITY);

        let handle = pooler.acquire(&"Enemy", &placement, Category::Billboards).unwrap();
        assert_eq!(pooler.host().parent_of(handle), Some(anchor));

        pooler.release(handle, Category::Billboards).unwrap();
        let container = pooler.container(Category::Billboards).unwrap();
        assert_eq!(pooler.host().parent_of(handle), Some(container));
        assert_eq!(pooler.host().parent_of(container), pooler.root_container());
    }

    #[test]
    fn test_double_release() {
        let mut pooler = pooler();
        let handle = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();

        pooler.release(handle, Category::GameObjects).unwrap();
        assert_eq!(pooler.release(handle, Category::GameObjects), Ok(ReleaseOutcome::AlreadyInactive));
        assert_eq!(pooler.inactive_count(&"Enemy"), 1);
    }

    #[test]
    fn test_unknown_release_warn_policy() {
        let mut pooler = pooler();
        let stranger = pooler.host_mut().spawn(Object::default());

        let err = pooler.release(stranger, Category::GameObjects).unwrap_err();
        assert!(matches!(err, PoolError::NotPooled(_)));
        assert!(pooler.host().is_valid(stranger));
    }

    #[test]
    fn test_unknown_release_destroy_policy() {
        let config = PoolerConfig {
            unknown_release: UnknownReleasePolicy::Destroy,
            ..PoolerConfig::default()
        };
        let mut pooler = ObjectPooler::new(MockHost::default(), config);
        let stranger = pooler.host_mut().spawn(Object::default());

        assert!(pooler.release(stranger, Category::GameObjects).is_err());
        assert!(!pooler.host().is_valid(stranger));
    }

    #[test]
    fn test_release_after_external_destroy() {
        let mut pooler = pooler();
        let handle = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();
        pooler.host_mut().destroy(handle);

        assert_eq!(pooler.release(handle, Category::GameObjects), Ok(ReleaseOutcome::Discarded));
        assert!(!pooler.is_pooled(handle));
    }

    #[test]
    fn test_prewarm_creates_distinct_instances() {
        let mut pooler = pooler();
        assert_eq!(pooler.prewarm(&"Enemy", 5, Category::GameObjects), Ok(5));
        assert_eq!(pooler.host().creations, 5);
        assert!(pooler.host().objects.values().filter(|o| o.key.is_some()).all(|o| !o.active));
    }

    #[test]
    fn test_reused_handle_belongs_to_new_key() {
        let host = MockHost { reuse_ids: true, ..MockHost::default() };
        let mut pooler = ObjectPooler::new(host, PoolerConfig::default());

        let enemy = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();
        pooler.host_mut().destroy(enemy);

        let bullet = pooler.acquire(&"Bullet", &Placement::default(), Category::GameObjects).unwrap();
        assert_eq!(bullet, enemy);
        assert_eq!(pooler.release(bullet, Category::GameObjects), Ok(ReleaseOutcome::Returned));

        assert_eq!(pooler.inactive_count(&"Bullet"), 1);
        assert_eq!(pooler.inactive_count(&"Enemy"), 0);

        let next = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();
        assert_eq!(pooler.host().objects[&next].key, Some("Enemy"));
    }

    #[test]
    fn test_prewarm_huge_count_fails_without_panic() {
        let mut pooler = pooler();
        let err = pooler.prewarm(&"Broken", usize::MAX, Category::GameObjects).unwrap_err();
        assert!(matches!(err, PoolError::CreationFailed(_)));
    }

    #[test]
    fn test_prewarm_failure_leaves_nothing_active() {
        let mut pooler = pooler();
        assert!(pooler.prewarm(&"Broken", 3, Category::GameObjects).is_err());
        assert_eq!(pooler.inactive_count(&"Broken"), 0);
    }

    #[test]
    fn test_recycle_uses_pool_category() {
        let mut pooler = pooler();
        let handle = pooler.acquire(&"Waypoint", &Placement::default(), Category::Nodes).unwrap();
        pooler.recycle(handle).unwrap();

        assert_eq!(pooler.host().parent_of(handle), pooler.container(Category::Nodes));
    }

    #[test]
    fn test_capability_lookup() {
        let mut pooler = pooler();
        let (enemy, health) = pooler
            .acquire_with::<i32>(&"Enemy", &Placement::default(), Category::GameObjects)
            .unwrap();
        *health -= 30;
        assert_eq!(pooler.capability::<i32>(enemy), Ok(&mut 70));

        let err = pooler
            .acquire_with::<i32>(&"Crate", &Placement::default(), Category::GameObjects)
            .unwrap_err();
        assert!(matches!(err, PoolError::MissingCapability { .. }));
        // The crate went back to its pool instead of leaking.
        assert_eq!(pooler.inactive_count(&"Crate"), 1);
    }

    #[test]
    fn test_teardown_spares_active_instances() {
        let mut pooler = pooler();
        let active = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();
        let idle = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();
        pooler.release(idle, Category::GameObjects).unwrap();

        pooler.teardown();

        assert!(pooler.host().is_valid(active));
        assert!(!pooler.host().is_valid(idle));
        assert_eq!(pooler.pool_count(), 0);
        assert_eq!(pooler.root_container(), None);

        // Idempotent.
        pooler.teardown();
        assert!(pooler.host().is_valid(active));
    }

    #[test]
    fn test_teardown_on_cascading_host_spares_active_instances() {
        let host = MockHost { cascade: true, ..MockHost::default() };
        let mut pooler = ObjectPooler::new(host, PoolerConfig::default());

        let active = pooler.acquire(&"Enemy", &Placement::default(), Category::GameObjects).unwrap();
        let container = pooler.container(Category::GameObjects).unwrap();
        assert_eq!(pooler.host().parent_of(active), Some(container));

        pooler.teardown();

        assert!(pooler.host().is_valid(active));
        assert_eq!(pooler.host().parent_of(active), None);
        assert!(!pooler.host().is_valid(container));
    }
}
