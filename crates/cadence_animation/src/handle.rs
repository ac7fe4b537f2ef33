//! Job handles
//!
//! A [`Handle`] is the caller's reference to a job: it configures the job
//! fluently right after acquisition and can query it later. Handles remember
//! which run of a pooled instance they were issued for, so a handle kept past
//! its job's completion goes stale instead of silently steering the next run.
//!
//! Every mutating method checks the run first; on a stale handle it does
//! nothing and logs at debug level.
//!
//! Borrowing: a job is mutably borrowed while it updates. Read its value from
//! the update callback argument, not through its own handle.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::curve::EaseCurve;
use crate::easing::Easing;
use crate::runnable::{Ease, LoopMode, Runnable};

/// Shared reference to a job instance
pub struct Handle<T: ?Sized> {
    cell: Rc<RefCell<T>>,
    generation: u32,
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            generation: self.generation,
        }
    }
}

impl<T: Runnable> Handle<T> {
    /// Wrap a standalone job, e.g. one driven by hand
    pub fn new(job: T) -> Self {
        Self::from_cell(Rc::new(RefCell::new(job)))
    }

    /// Erase the job type
    pub fn into_dyn(self) -> Handle<dyn Runnable> {
        let cell: Rc<RefCell<dyn Runnable>> = self.cell;
        Handle {
            cell,
            generation: self.generation,
        }
    }
}

impl<T: Runnable + ?Sized> Handle<T> {
    pub(crate) fn from_cell(cell: Rc<RefCell<T>>) -> Self {
        let generation = cell.borrow().state().generation();
        Self { cell, generation }
    }

    /// Whether the job is still on the run this handle was issued for
    pub fn is_current(&self) -> bool {
        self.cell
            .try_borrow()
            .map(|job| job.state().generation() == self.generation)
            .unwrap_or(true)
    }

    /// Mutate the job if it is still on this handle's run
    ///
    /// Returns `None` without touching the job when the handle is stale.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut job = self.cell.borrow_mut();
        let current = job.state().generation();
        if current != self.generation {
            tracing::debug!(
                handle = self.generation,
                current,
                "Ignoring stale job handle"
            );
            return None;
        }
        Some(f(&mut job))
    }

    // ========================================================================
    // Fluent setup
    // ========================================================================

    /// Seconds to wait before the job starts producing output
    pub fn delay(self, seconds: f32) -> Self {
        self.with_mut(|job| job.state_mut().set_delay(seconds));
        self
    }

    /// `loops: None` repeats forever; ignored with [`LoopMode::None`]
    pub fn looping(self, mode: LoopMode, loops: Option<u32>) -> Self {
        self.with_mut(|job| job.state_mut().set_looping(mode, loops));
        self
    }

    pub fn ease(self, easing: Easing) -> Self {
        self.with_mut(|job| job.state_mut().set_ease(easing));
        self
    }

    pub fn ease_curve(self, curve: EaseCurve) -> Self {
        self.with_mut(|job| job.state_mut().set_ease(curve));
        self
    }

    pub fn ease_with(self, f: impl Fn(f32) -> f32 + 'static) -> Self {
        self.with_mut(|job| job.state_mut().set_ease(Ease::Custom(Rc::new(f))));
        self
    }

    pub fn ignore_time_scale(self, ignore: bool) -> Self {
        self.with_mut(|job| job.state_mut().set_ignore_time_scale(ignore));
        self
    }

    /// Run `f` when the job completes (or is cancelled with completion)
    pub fn on_complete(self, f: impl FnOnce() + 'static) -> Self {
        self.with_mut(|job| job.state_mut().on_complete(f));
        self
    }

    // ========================================================================
    // Control and queries
    // ========================================================================

    pub fn pause(&self) {
        self.with_mut(|job| job.state_mut().set_paused(true));
    }

    pub fn resume(&self) {
        self.with_mut(|job| job.state_mut().set_paused(false));
    }

    pub fn is_paused(&self) -> bool {
        self.cell.borrow().state().is_paused()
    }

    pub fn progress(&self) -> f32 {
        self.cell.borrow().progress()
    }

    pub fn is_complete(&self) -> bool {
        self.cell.borrow().is_complete()
    }

    pub fn total_duration(&self) -> f32 {
        self.cell.borrow().total_duration()
    }

    /// Advance a standalone job by hand
    ///
    /// A stale handle does not advance the job.
    pub fn tick(&self, dt: f32) {
        self.with_mut(|job| job.tick(dt));
    }
}

impl<T: ?Sized> Handle<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    /// Unchecked mutable access for the manager and owning containers
    pub(crate) fn borrow_mut(&self) -> RefMut<'_, T> {
        self.cell.borrow_mut()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.borrow())
    }

    /// Run generation this handle was issued for
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether both handles point at the same instance
    pub fn ptr_eq<U: ?Sized>(&self, other: &Handle<U>) -> bool {
        self.addr() == other.addr()
    }

    /// Instance address, stable for the lifetime of the allocation
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.cell) as *const () as usize
    }

    pub(crate) fn cell(&self) -> &Rc<RefCell<T>> {
        &self.cell
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("addr", &format_args!("{:#x}", self.addr()))
            .field("generation", &self.generation)
            .finish()
    }
}
