//! Job state machine
//!
//! Every schedulable job (tweens, sequences, graph runners) embeds a
//! [`RunState`] and implements [`Runnable`]. The trait's provided methods own
//! the shared timing rules: delay, looping, easing, completion and
//! cancellation. Implementors only supply their duration and what happens on
//! each update.
//!
//! Jobs are normally driven by a [`TweenManager`](crate::TweenManager), but any
//! job can also be ticked by hand.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::curve::EaseCurve;
use crate::easing::Easing;

/// How raw progress maps onto a single cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopMode {
    /// Play once
    #[default]
    None,
    /// Restart from the beginning after each cycle
    Loop,
    /// Alternate forward and backward cycles
    PingPong,
}

impl LoopMode {
    /// Map raw progress (cycles elapsed) into `0..=1`
    pub fn apply(self, raw: f32) -> f32 {
        match self {
            LoopMode::None => raw,
            LoopMode::Loop => {
                let cycle = raw.rem_euclid(1.0);
                // The end of a cycle reads as 1, not as the start of the next
                if cycle == 0.0 && raw > 0.0 {
                    1.0
                } else {
                    cycle
                }
            }
            LoopMode::PingPong => 1.0 - (raw.rem_euclid(2.0) - 1.0).abs(),
        }
    }

    pub fn is_looping(self) -> bool {
        self != LoopMode::None
    }
}

/// Easing applied to a job's loop-transformed progress
#[derive(Clone)]
pub enum Ease {
    Preset(Easing),
    Curve(Rc<EaseCurve>),
    Custom(Rc<dyn Fn(f32) -> f32>),
}

impl Ease {
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Ease::Preset(easing) => easing.apply(t),
            Ease::Curve(curve) => curve.evaluate(t),
            Ease::Custom(f) => f(t),
        }
    }
}

impl Default for Ease {
    fn default() -> Self {
        Ease::Preset(Easing::Linear)
    }
}

impl From<Easing> for Ease {
    fn from(easing: Easing) -> Self {
        Ease::Preset(easing)
    }
}

impl From<EaseCurve> for Ease {
    fn from(curve: EaseCurve) -> Self {
        Ease::Curve(Rc::new(curve))
    }
}

impl fmt::Debug for Ease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ease::Preset(easing) => f.debug_tuple("Preset").field(easing).finish(),
            Ease::Curve(curve) => f.debug_tuple("Curve").field(curve).finish(),
            Ease::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Callback run when a job completes
pub type CompleteAction = Box<dyn FnOnce()>;

// ============================================================================
// RunState
// ============================================================================

/// Timing and lifecycle fields shared by every job
#[derive(Default)]
pub struct RunState {
    elapsed: f32,
    delay: f32,
    loop_mode: LoopMode,
    /// Cycle count when looping; `None` loops forever
    loops: Option<u32>,
    paused: bool,
    cancelled: bool,
    ignore_time_scale: bool,
    ease: Ease,
    on_complete: SmallVec<[CompleteAction; 1]>,
    /// Bumped on every reset so stale references to a recycled job can be told apart
    generation: u32,
    warned_zero_duration: Cell<bool>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return every per-run field to its default
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    /// Set the start delay; negative values clamp to zero
    pub fn set_delay(&mut self, delay: f32) {
        self.delay = delay.max(0.0);
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn loops(&self) -> Option<u32> {
        self.loops
    }

    pub fn set_looping(&mut self, mode: LoopMode, loops: Option<u32>) {
        self.loop_mode = mode;
        self.loops = loops;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn ignores_time_scale(&self) -> bool {
        self.ignore_time_scale
    }

    pub fn set_ignore_time_scale(&mut self, ignore: bool) {
        self.ignore_time_scale = ignore;
    }

    pub fn ease(&self) -> &Ease {
        &self.ease
    }

    pub fn set_ease(&mut self, ease: impl Into<Ease>) {
        self.ease = ease.into();
    }

    pub fn on_complete(&mut self, action: impl FnOnce() + 'static) {
        self.on_complete.push(Box::new(action));
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[cfg(test)]
    pub(crate) fn warned_zero_duration(&self) -> bool {
        self.warned_zero_duration.get()
    }

    /// Cycles the job runs for: 1 unless looping a finite number of times
    fn cycle_limit(&self) -> Option<f32> {
        match (self.loop_mode, self.loops) {
            (LoopMode::None, _) => Some(1.0),
            (_, Some(loops)) => Some(loops as f32),
            (_, None) => None,
        }
    }
}

impl fmt::Debug for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunState")
            .field("elapsed", &self.elapsed)
            .field("delay", &self.delay)
            .field("loop_mode", &self.loop_mode)
            .field("loops", &self.loops)
            .field("paused", &self.paused)
            .field("cancelled", &self.cancelled)
            .field("ease", &self.ease)
            .field("callbacks", &self.on_complete.len())
            .field("generation", &self.generation)
            .finish()
    }
}

/// How a job left the active set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Finish {
    /// Ran for its full duration
    Completed,
    /// Stopped by an explicit cancel
    Cancelled { complete: bool },
    /// Its owner was destroyed
    OwnerLost { complete: bool },
}

// ============================================================================
// Runnable
// ============================================================================

/// A time-driven unit of work
pub trait Runnable: 'static {
    fn state(&self) -> &RunState;

    fn state_mut(&mut self) -> &mut RunState;

    /// Length of one cycle in seconds, excluding delay and loops
    fn duration(&self) -> f32;

    /// Advance the payload; called once the delay has elapsed
    fn on_update(&mut self, dt: f32);

    /// Clear payload fields for reuse; [`RunState`] is reset separately
    fn reset_payload(&mut self);

    /// Hook run when the job is cancelled. `snap` asks for the final output.
    fn on_cancel(&mut self, _snap: bool) {}

    /// Clear every per-run field so the instance can be pooled
    fn reset(&mut self) {
        self.state_mut().reset();
        self.reset_payload();
    }

    /// Advance the job clock by `dt` seconds
    fn tick(&mut self, dt: f32) {
        let state = self.state_mut();
        if state.paused || state.cancelled {
            return;
        }
        state.elapsed += dt;
        if state.elapsed < state.delay {
            return;
        }
        self.on_update(dt);
    }

    /// Duration including delay and finite loops
    fn total_duration(&self) -> f32 {
        let state = self.state();
        let cycles = match (state.loop_mode, state.loops) {
            (LoopMode::None, _) | (_, None) => 1.0,
            (_, Some(loops)) => loops as f32,
        };
        self.duration() * cycles + state.delay
    }

    /// Cycles elapsed since the delay ended, unbounded
    fn raw_progress(&self) -> f32 {
        let duration = self.duration();
        let state = self.state();
        if duration <= 0.0 {
            if !state.warned_zero_duration.replace(true) {
                tracing::warn!(
                    "Job duration is 0; progress stays at 0. Set a duration before the job starts running"
                );
            }
            return 0.0;
        }
        (state.elapsed - state.delay).max(0.0) / duration
    }

    /// Raw progress capped at the job's final cycle
    fn bounded_progress(&self) -> f32 {
        let raw = self.raw_progress();
        match self.state().cycle_limit() {
            Some(limit) => raw.min(limit),
            None => raw,
        }
    }

    /// Eased, loop-transformed progress
    fn progress(&self) -> f32 {
        let state = self.state();
        let cycle = state.loop_mode.apply(self.bounded_progress());
        state.ease.apply(cycle)
    }

    fn is_complete(&self) -> bool {
        let state = self.state();
        if state.cancelled {
            return true;
        }
        match state.cycle_limit() {
            Some(cycles) => state.elapsed >= self.duration() * cycles + state.delay,
            None => false,
        }
    }

    /// Mark the job finished and hand back the callbacks that should run
    ///
    /// Explicit cancellation snaps the output to its end state; owner loss
    /// never writes output.
    fn finish(&mut self, how: Finish) -> SmallVec<[CompleteAction; 1]> {
        let (complete, snap) = match how {
            Finish::Completed => (true, false),
            Finish::Cancelled { complete } => (complete, true),
            Finish::OwnerLost { complete } => (complete, false),
        };
        if how != Finish::Completed {
            self.state_mut().cancelled = true;
            self.on_cancel(snap);
        }
        let callbacks = std::mem::take(&mut self.state_mut().on_complete);
        if complete {
            callbacks
        } else {
            SmallVec::new()
        }
    }

    /// Cancel a manually driven job, running callbacks if asked
    ///
    /// Jobs owned by a manager should be cancelled through
    /// [`TweenManager::cancel`](crate::TweenManager::cancel) instead.
    fn cancel(&mut self, invoke_completion: bool) {
        let callbacks = self.finish(Finish::Cancelled {
            complete: invoke_completion,
        });
        for callback in callbacks {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal job that counts updates
    #[derive(Default)]
    struct Counter {
        state: RunState,
        duration: f32,
        updates: u32,
    }

    impl Runnable for Counter {
        fn state(&self) -> &RunState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut RunState {
            &mut self.state
        }

        fn duration(&self) -> f32 {
            self.duration
        }

        fn on_update(&mut self, _dt: f32) {
            self.updates += 1;
        }

        fn reset_payload(&mut self) {
            self.duration = 0.0;
            self.updates = 0;
        }
    }

    fn counter(duration: f32) -> Counter {
        Counter {
            duration,
            ..Default::default()
        }
    }

    #[test]
    fn test_completes_on_exact_tick() {
        let mut job = counter(2.0);
        for i in 0..4 {
            assert!(!job.is_complete(), "complete early at tick {i}");
            job.tick(0.5);
        }
        assert!(job.is_complete());
        assert_eq!(job.progress(), 1.0);
        assert_eq!(job.updates, 4);
    }

    #[test]
    fn test_delay_gates_updates() {
        let mut job = counter(1.0);
        job.state_mut().set_delay(0.5);
        job.tick(0.25);
        assert_eq!(job.updates, 0);
        assert_eq!(job.progress(), 0.0);

        job.tick(0.5);
        assert_eq!(job.updates, 1);
        assert!((job.progress() - 0.25).abs() < 1e-6);
        assert_eq!(job.total_duration(), 1.5);
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut job = counter(1.0);
        job.state_mut().set_paused(true);
        job.tick(0.5);
        assert_eq!(job.state().elapsed(), 0.0);
        job.state_mut().set_paused(false);
        job.tick(0.5);
        assert_eq!(job.state().elapsed(), 0.5);
    }

    #[test]
    fn test_finite_loops_complete_after_n_cycles() {
        let mut job = counter(1.0);
        job.state_mut().set_looping(LoopMode::Loop, Some(3));
        assert_eq!(job.total_duration(), 3.0);

        for _ in 0..5 {
            job.tick(0.5);
            assert!(!job.is_complete());
        }
        assert!((job.progress() - 0.5).abs() < 1e-6);

        job.tick(0.5);
        assert!(job.is_complete());
        assert_eq!(job.progress(), 1.0);
    }

    #[test]
    fn test_infinite_loop_never_completes() {
        let mut job = counter(0.5);
        job.state_mut().set_looping(LoopMode::Loop, None);
        for _ in 0..100 {
            job.tick(0.3);
        }
        assert!(!job.is_complete());
        assert!((0.0..=1.0).contains(&job.progress()));
    }

    #[test]
    fn test_ping_pong_symmetry() {
        for i in 0..40 {
            let x = i as f32 * 0.05;
            let mirrored = 2.0 - x.rem_euclid(2.0);
            let a = LoopMode::PingPong.apply(x);
            let b = LoopMode::PingPong.apply(mirrored);
            assert!((a - b).abs() < 1e-5, "x = {x}");
        }
        assert_eq!(LoopMode::PingPong.apply(0.0), 0.0);
        assert_eq!(LoopMode::PingPong.apply(1.0), 1.0);
        assert_eq!(LoopMode::PingPong.apply(1.5), 0.5);
    }

    #[test]
    fn test_loop_cycle_boundary() {
        assert_eq!(LoopMode::Loop.apply(0.0), 0.0);
        assert_eq!(LoopMode::Loop.apply(2.0), 1.0);
        assert!((LoopMode::Loop.apply(2.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_zero_duration_reads_zero() {
        let mut job = counter(0.0);
        job.tick(0.1);
        assert_eq!(job.raw_progress(), 0.0);
        assert_eq!(job.progress(), 0.0);
        assert!(job.is_complete());
    }

    #[test]
    fn test_easing_applies_to_progress() {
        let mut job = counter(1.0);
        job.state_mut().set_ease(Easing::EaseInQuad);
        job.tick(0.5);
        assert!((job.progress() - 0.25).abs() < 1e-6);

        job.state_mut().set_ease(Ease::Custom(Rc::new(|t| 1.0 - t)));
        assert!((job.progress() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_cancel_callbacks() {
        let fired = Rc::new(Cell::new(0));

        let mut job = counter(1.0);
        let f = fired.clone();
        job.state_mut().on_complete(move || f.set(f.get() + 1));
        job.cancel(false);
        assert!(job.is_complete());
        assert_eq!(fired.get(), 0);

        let mut job = counter(1.0);
        let f = fired.clone();
        job.state_mut().on_complete(move || f.set(f.get() + 1));
        job.cancel(true);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_reset_clears_run_fields() {
        let mut job = counter(1.0);
        job.state_mut().set_delay(1.0);
        job.state_mut().set_looping(LoopMode::PingPong, Some(2));
        job.state_mut().on_complete(|| {});
        job.tick(3.0);
        let generation = job.state().generation();

        job.reset();
        let state = job.state();
        assert_eq!(state.elapsed(), 0.0);
        assert_eq!(state.delay(), 0.0);
        assert_eq!(state.loop_mode(), LoopMode::None);
        assert!(!state.is_cancelled());
        assert_eq!(state.generation(), generation + 1);
        assert_eq!(job.updates, 0);
    }

    #[test]
    fn test_negative_delay_clamps() {
        let mut state = RunState::new();
        state.set_delay(-2.0);
        assert_eq!(state.delay(), 0.0);
    }
}
