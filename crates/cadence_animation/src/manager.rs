//! Pooling tween manager
//!
//! The manager owns the per-frame loop. Every active job is advanced once per
//! [`TweenManager::tick`], in the order it was acquired. Finished jobs are
//! reset and parked in a free list keyed by their concrete type, so the next
//! [`TweenManager::acquire`] of that type reuses the instance instead of
//! allocating.
//!
//! Jobs may be attached to an owner. When the owner is destroyed the manager
//! stops the job on its next pass without running its completion callbacks
//! (unless [`ManagerConfig::complete_on_owner_lost`] is set).
//!
//! Everything here is single threaded. Callbacks may call back into the
//! manager (acquire, cancel, tick queries) at any point; the active list is
//! never borrowed while user code runs.
//!
//! Closures stored inside jobs should capture a [`ManagerHandle`] rather than
//! a [`TweenManager`], otherwise the manager and the job keep each other alive.

use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use cadence_core::{Lerp, Owned, OwnerRef, Property, PropertyRegistry};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::dynamic::{DynamicSequence, Graph};
use crate::error::{Result, TweenError};
use crate::handle::Handle;
use crate::runnable::{Finish, Runnable};
use crate::sequence::Sequence;
use crate::settings::ManagerConfig;
use crate::tween::Tween;

// ============================================================================
// Global Manager State
// ============================================================================

thread_local! {
    static GLOBAL_MANAGER: RefCell<Option<ManagerHandle>> = const { RefCell::new(None) };
}

/// Install `manager` as this thread's global manager
///
/// Only a weak handle is stored; the caller keeps the manager alive and
/// should call [`clear_global_manager`] on teardown.
pub fn set_global_manager(manager: &TweenManager) {
    GLOBAL_MANAGER.with(|global| {
        let previous = global.borrow_mut().replace(manager.handle());
        if previous.is_some_and(|handle| handle.is_alive()) {
            tracing::warn!("Replacing an installed global tween manager");
        }
    });
}

/// Remove this thread's global manager
pub fn clear_global_manager() {
    GLOBAL_MANAGER.with(|global| global.borrow_mut().take());
}

/// Get this thread's global manager
pub fn get_manager() -> Result<TweenManager> {
    GLOBAL_MANAGER.with(|global| match global.borrow().as_ref() {
        Some(handle) => handle.get(),
        None => Err(TweenError::NotInitialized),
    })
}

/// Get this thread's global manager, if one is installed and alive
pub fn try_get_manager() -> Option<TweenManager> {
    get_manager().ok()
}

/// Check if a global manager has been installed on this thread
pub fn is_manager_initialized() -> bool {
    GLOBAL_MANAGER.with(|global| global.borrow().is_some())
}

new_key_type! {
    /// Key of an active job slot
    pub struct JobId;
}

/// An active job and its bookkeeping
struct Slot {
    job: Rc<RefCell<dyn Runnable>>,
    /// Same allocation as `job`, kept for returning it to its typed pool
    pooled: Rc<dyn Any>,
    kind: TypeId,
    addr: usize,
    owner: Option<OwnerRef>,
    generation: u32,
    /// Finish requested while the job was mid-update
    pending: Option<Finish>,
}

struct ManagerInner {
    config: ManagerConfig,
    slots: SlotMap<JobId, Slot>,
    /// Acquisition order; may hold ids of removed slots until compacted
    order: Vec<JobId>,
    by_addr: FxHashMap<usize, JobId>,
    pools: FxHashMap<TypeId, Vec<Rc<dyn Any>>>,
    pooled: usize,
    /// Detached jobs whose callbacks are still running
    retiring: usize,
}

impl ManagerInner {
    fn total(&self) -> usize {
        self.slots.len() + self.pooled + self.retiring
    }

    fn compact_order(&mut self) {
        let slots = &self.slots;
        self.order.retain(|id| slots.contains_key(*id));
    }

    fn lookup(&self, addr: usize, generation: u32) -> Option<JobId> {
        let id = *self.by_addr.get(&addr)?;
        let slot = self.slots.get(id)?;
        (slot.generation == generation).then_some(id)
    }

    fn detach(&mut self, id: JobId) -> Option<Slot> {
        let slot = self.slots.remove(id)?;
        self.by_addr.remove(&slot.addr);
        Some(slot)
    }
}

// ============================================================================
// TweenManager
// ============================================================================

/// Owns, advances and recycles animation jobs
///
/// Cloning yields another reference to the same manager.
#[derive(Clone)]
pub struct TweenManager {
    inner: Rc<RefCell<ManagerInner>>,
}

impl TweenManager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ManagerInner {
                config,
                slots: SlotMap::with_key(),
                order: Vec::new(),
                by_addr: FxHashMap::default(),
                pools: FxHashMap::default(),
                pooled: 0,
                retiring: 0,
            })),
        }
    }

    /// A weak handle that does not keep the manager alive
    pub fn handle(&self) -> ManagerHandle {
        ManagerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Get a job of type `T`, reusing a pooled instance when one exists
    ///
    /// The job joins the active set immediately and starts advancing on the
    /// next tick, so it can be configured through the returned handle first.
    /// A composite owner is stored as its root.
    pub fn acquire<T: Runnable + Default>(&self, owner: Option<&dyn Owned>) -> Result<Handle<T>> {
        let kind = TypeId::of::<T>();
        let cell = {
            let mut inner = self.inner.borrow_mut();
            if !inner.config.enabled {
                return Err(TweenError::Disabled);
            }

            let recycled = inner.pools.get_mut(&kind).and_then(|pool| pool.pop());
            match recycled {
                Some(instance) => {
                    inner.pooled -= 1;
                    instance
                        .downcast::<RefCell<T>>()
                        .map_err(|_| TweenError::TypeMismatch {
                            expected: type_name::<T>(),
                        })?
                }
                None => {
                    if let Some(max) = inner.config.job_limit() {
                        if inner.total() >= max {
                            tracing::warn!(
                                "Tween manager job limit ({}) reached; refusing to create {}",
                                max,
                                type_name::<T>()
                            );
                            return Err(TweenError::CapacityExceeded { max });
                        }
                    }
                    tracing::trace!("Allocating new {}", type_name::<T>());
                    Rc::new(RefCell::new(T::default()))
                }
            }
        };

        let handle = Handle::from_cell(cell.clone());
        let slot = Slot {
            addr: handle.addr(),
            generation: handle.generation(),
            job: cell.clone(),
            pooled: cell,
            kind,
            owner: owner.map(|owner| owner.owner_ref()),
            pending: None,
        };

        let mut inner = self.inner.borrow_mut();
        let addr = slot.addr;
        let id = inner.slots.insert(slot);
        inner.order.push(id);
        inner.by_addr.insert(addr, id);
        Ok(handle)
    }

    /// Advance every active job by `dt` seconds
    ///
    /// Jobs acquired while the tick runs start on the next one.
    pub fn tick(&self, dt: f32) {
        let (ids, time_scale, owner_checks, complete_on_owner_lost) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.config.enabled {
                return;
            }
            inner.compact_order();
            (
                inner.order.clone(),
                inner.config.time_scale,
                inner.config.owner_checks,
                inner.config.complete_on_owner_lost,
            )
        };

        for id in ids {
            let (job, owner) = {
                let inner = self.inner.borrow();
                match inner.slots.get(id) {
                    Some(slot) => (slot.job.clone(), slot.owner.clone()),
                    // Finished earlier in this tick
                    None => continue,
                }
            };

            if owner_checks && owner.as_ref().is_some_and(|owner| !owner.is_alive()) {
                tracing::debug!("Job owner destroyed; stopping job");
                self.finalize(
                    id,
                    Finish::OwnerLost {
                        complete: complete_on_owner_lost,
                    },
                );
                continue;
            }

            // Borrowed by the caller that is currently running; skip this frame
            let Ok(mut guard) = job.try_borrow_mut() else {
                continue;
            };
            let scale = if guard.state().ignores_time_scale() {
                1.0
            } else {
                time_scale
            };
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                guard.tick(dt * scale);
                guard.is_complete()
            }));
            drop(guard);

            match outcome {
                Ok(complete) => {
                    // A cancel requested during the update outranks completion
                    let pending = self
                        .inner
                        .borrow_mut()
                        .slots
                        .get_mut(id)
                        .and_then(|slot| slot.pending.take());
                    match pending {
                        Some(how) => self.finalize(id, how),
                        None if complete => self.finalize(id, Finish::Completed),
                        None => {}
                    }
                }
                Err(_) => {
                    tracing::error!("Job panicked during update; dropping it");
                    let slot = self.inner.borrow_mut().detach(id);
                    drop(slot);
                }
            }
        }
    }

    /// Detach a job, run its finish semantics and return it to its pool
    fn finalize(&self, id: JobId, how: Finish) {
        let slot = {
            let mut inner = self.inner.borrow_mut();
            let Some(slot) = inner.slots.get_mut(id) else {
                return;
            };
            if slot.job.try_borrow_mut().is_err() {
                slot.pending = Some(how);
                return;
            }
            let Some(slot) = inner.detach(id) else {
                return;
            };
            inner.retiring += 1;
            slot
        };

        let finished = panic::catch_unwind(AssertUnwindSafe(|| slot.job.borrow_mut().finish(how)));
        let callbacks = match finished {
            Ok(callbacks) => callbacks,
            Err(_) => {
                tracing::error!("Job panicked while finishing; dropping it");
                self.inner.borrow_mut().retiring -= 1;
                return;
            }
        };
        for callback in callbacks {
            if panic::catch_unwind(AssertUnwindSafe(callback)).is_err() {
                tracing::error!("Completion callback panicked");
            }
        }

        self.retire(slot);
    }

    fn retire(&self, slot: Slot) {
        let Slot {
            job, pooled, kind, ..
        } = slot;
        let reset = panic::catch_unwind(AssertUnwindSafe(|| job.borrow_mut().reset()));
        drop(job);

        let mut inner = self.inner.borrow_mut();
        inner.retiring -= 1;
        match reset {
            Ok(()) => {
                inner.pools.entry(kind).or_default().push(pooled);
                inner.pooled += 1;
            }
            Err(_) => tracing::error!("Job panicked while resetting; dropping it"),
        }
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Stop a job now
    ///
    /// Typed jobs snap to their end value. Completion callbacks run only when
    /// `invoke_completion` is set. Returns false if the handle does not refer
    /// to an active run (already finished, or recycled since). A job that is
    /// cancelled from inside its own update stops right after that update.
    pub fn cancel<T: Runnable + ?Sized>(&self, job: &Handle<T>, invoke_completion: bool) -> bool {
        let id = self.inner.borrow().lookup(job.addr(), job.generation());
        match id {
            Some(id) => {
                self.finalize(
                    id,
                    Finish::Cancelled {
                        complete: invoke_completion,
                    },
                );
                true
            }
            None => false,
        }
    }

    /// Cancel every active job attached to `owner` (or to its root)
    ///
    /// Returns the number of jobs cancelled.
    pub fn cancel_owner(&self, owner: &dyn Owned, invoke_completion: bool) -> usize {
        let target = owner.owner_ref();
        let ids: Vec<JobId> = {
            let inner = self.inner.borrow();
            inner
                .order
                .iter()
                .copied()
                .filter(|id| {
                    inner
                        .slots
                        .get(*id)
                        .and_then(|slot| slot.owner.as_ref())
                        .is_some_and(|owner| owner.same_owner(&target))
                })
                .collect()
        };
        self.cancel_ids(ids, invoke_completion)
    }

    /// Cancel every active job
    pub fn cancel_all(&self, invoke_completion: bool) -> usize {
        let ids = {
            let mut inner = self.inner.borrow_mut();
            inner.compact_order();
            inner.order.clone()
        };
        self.cancel_ids(ids, invoke_completion)
    }

    fn cancel_ids(&self, ids: Vec<JobId>, invoke_completion: bool) -> usize {
        let mut cancelled = 0;
        for id in ids {
            // Earlier callbacks in this pass may already have finished it
            if !self.inner.borrow().slots.contains_key(id) {
                continue;
            }
            self.finalize(
                id,
                Finish::Cancelled {
                    complete: invoke_completion,
                },
            );
            cancelled += 1;
        }
        cancelled
    }

    // ========================================================================
    // Queries and settings
    // ========================================================================

    pub fn active_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.inner.borrow().pooled
    }

    /// Active plus pooled jobs
    pub fn total_count(&self) -> usize {
        self.inner.borrow().total()
    }

    /// Whether the handle refers to a run that is still active
    pub fn is_active<T: Runnable + ?Sized>(&self, job: &Handle<T>) -> bool {
        self.inner
            .borrow()
            .lookup(job.addr(), job.generation())
            .is_some()
    }

    /// Cap active plus pooled jobs; `None` removes the cap
    ///
    /// Lowering the cap below the current total evicts nothing; it only
    /// refuses new allocations.
    pub fn set_max_jobs(&self, max: Option<usize>) {
        let mut inner = self.inner.borrow_mut();
        let config = std::mem::take(&mut inner.config);
        inner.config = config.with_max_jobs(max);
    }

    pub fn time_scale(&self) -> f32 {
        self.inner.borrow().config.time_scale
    }

    pub fn set_time_scale(&self, time_scale: f32) {
        self.inner.borrow_mut().config.time_scale = time_scale;
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.borrow().config.enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().config.enabled = enabled;
    }

    pub fn set_owner_checks(&self, enabled: bool) {
        self.inner.borrow_mut().config.owner_checks = enabled;
    }

    pub fn config(&self) -> ManagerConfig {
        self.inner.borrow().config.clone()
    }

    /// Drop every pooled instance
    pub fn clear_pool(&self) {
        let pools = {
            let mut inner = self.inner.borrow_mut();
            inner.pooled = 0;
            std::mem::take(&mut inner.pools)
        };
        drop(pools);
    }

    // ========================================================================
    // Typed acquisition
    // ========================================================================

    /// A tween that interpolates with the value type's own lerp
    pub fn tween<V: Lerp + Clone + Default + 'static>(&self) -> Result<Handle<Tween<V>>> {
        self.make_tween(None)
    }

    pub fn tween_owned<V: Lerp + Clone + Default + 'static>(
        &self,
        owner: &dyn Owned,
    ) -> Result<Handle<Tween<V>>> {
        self.make_tween(Some(owner))
    }

    fn make_tween<V: Lerp + Clone + Default + 'static>(
        &self,
        owner: Option<&dyn Owned>,
    ) -> Result<Handle<Tween<V>>> {
        let tween = self.acquire::<Tween<V>>(owner)?;
        tween.borrow_mut().use_default_lerp();
        Ok(tween)
    }

    pub fn sequence(&self) -> Result<Handle<Sequence>> {
        self.acquire(None)
    }

    pub fn sequence_owned(&self, owner: &dyn Owned) -> Result<Handle<Sequence>> {
        self.acquire(Some(owner))
    }

    /// A graph runner loaded with `graph`, not yet started
    pub fn dynamic(
        &self,
        graph: Graph,
        owner: Option<&dyn Owned>,
    ) -> Result<Handle<DynamicSequence>> {
        let runner = self.acquire::<DynamicSequence>(owner)?;
        let loaded = runner.borrow_mut().load(graph);
        if let Err(err) = loaded {
            self.cancel(&runner, false);
            return Err(err);
        }
        Ok(runner)
    }

    /// Load `graph` into a graph runner and start it
    pub fn run_graph(
        &self,
        graph: Graph,
        owner: Option<&dyn Owned>,
    ) -> Result<Handle<DynamicSequence>> {
        let runner = self.dynamic(graph, owner)?;
        if let Err(err) = runner.run() {
            self.cancel(&runner, false);
            return Err(err);
        }
        Ok(runner)
    }

    // ========================================================================
    // Property-bound tweens
    // ========================================================================

    /// Tween a property of `holder` from its current value to `to`
    ///
    /// Only a weak reference to the holder is kept; updates stop writing once
    /// it is dropped.
    pub fn tween_property<P>(
        &self,
        holder: &Rc<P::Holder>,
        property: P,
        to: P::Value,
        duration: f32,
        owner: Option<&dyn Owned>,
    ) -> Result<Handle<Tween<P::Value>>>
    where
        P: Property + 'static,
        P::Holder: 'static,
        P::Value: Clone + Default + 'static,
    {
        let tween = self.acquire::<Tween<P::Value>>(owner)?;
        let property = Rc::new(property);
        {
            let mut job = tween.borrow_mut();
            job.set_start(property.get(holder));
            job.set_end(to);
            job.set_duration(duration);

            let interpolate = property.clone();
            job.set_lerp(move |from, to, t| interpolate.lerp(from, to, t));

            let target: Weak<P::Holder> = Rc::downgrade(holder);
            job.set_on_update(move |value| {
                if let Some(holder) = target.upgrade() {
                    property.set(&holder, value);
                }
            });
        }
        Ok(tween)
    }

    /// Tween a property looked up by key in `registry`
    ///
    /// Fails with [`TweenError::Property`] if the key is unknown or was
    /// registered for a different holder or value type.
    pub fn tween_registered<H: 'static, V: Clone + Default + 'static>(
        &self,
        registry: &PropertyRegistry,
        key: &str,
        holder: &Rc<H>,
        to: V,
        duration: f32,
        owner: Option<&dyn Owned>,
    ) -> Result<Handle<Tween<V>>> {
        let property = registry.get::<H, V>(key)?;
        self.tween_property(holder, property, to, duration, owner)
    }
}

impl Default for TweenManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl fmt::Debug for TweenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => f
                .debug_struct("TweenManager")
                .field("active", &inner.slots.len())
                .field("pooled", &inner.pooled)
                .field("config", &inner.config)
                .finish(),
            Err(_) => f.write_str("TweenManager { .. }"),
        }
    }
}

/// A weak handle to the tween manager
///
/// This is what job callbacks should hold. It won't keep the manager alive.
#[derive(Clone)]
pub struct ManagerHandle {
    inner: Weak<RefCell<ManagerInner>>,
}

impl ManagerHandle {
    pub fn get(&self) -> Result<TweenManager> {
        self.inner
            .upgrade()
            .map(|inner| TweenManager { inner })
            .ok_or(TweenError::ManagerDropped)
    }

    /// Check if the manager is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for ManagerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
