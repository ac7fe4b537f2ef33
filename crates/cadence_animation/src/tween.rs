//! Typed interpolation jobs

use std::fmt;
use std::rc::Rc;

use cadence_core::Lerp;

use crate::handle::Handle;
use crate::runnable::{RunState, Runnable};
use crate::settings::TweenSettings;

/// Interpolation function from (start, end, t)
pub type LerpFn<V> = Rc<dyn Fn(&V, &V, f32) -> V>;

/// Callback receiving the interpolated value every update
pub type UpdateFn<V> = Box<dyn FnMut(V)>;

/// A job that interpolates between two values of type `V`
///
/// `value = lerp(start, end, progress)`. A tween needs a lerp function before
/// its first update; [`TweenManager::tween`](crate::TweenManager::tween)
/// installs one for any [`Lerp`] type.
pub struct Tween<V> {
    state: RunState,
    duration: f32,
    start: V,
    end: V,
    lerp: Option<LerpFn<V>>,
    on_update: Option<UpdateFn<V>>,
    warned_missing_lerp: bool,
}

impl<V: Default> Default for Tween<V> {
    fn default() -> Self {
        Self {
            state: RunState::new(),
            duration: 0.0,
            start: V::default(),
            end: V::default(),
            lerp: None,
            on_update: None,
            warned_missing_lerp: false,
        }
    }
}

impl<V: Clone + Default + 'static> Tween<V> {
    pub fn new(start: V, end: V, duration: f32) -> Self {
        let mut tween = Self {
            start,
            end,
            ..Self::default()
        };
        tween.set_duration(duration);
        tween
    }

    /// Set the cycle duration; negative values clamp to zero
    ///
    /// Time already elapsed is kept as-is, not rescaled.
    pub fn set_duration(&mut self, duration: f32) {
        self.duration = duration.max(0.0);
    }

    pub fn start(&self) -> &V {
        &self.start
    }

    pub fn set_start(&mut self, start: V) {
        self.start = start;
    }

    pub fn end(&self) -> &V {
        &self.end
    }

    pub fn set_end(&mut self, end: V) {
        self.end = end;
    }

    pub fn set_lerp(&mut self, lerp: impl Fn(&V, &V, f32) -> V + 'static) {
        self.lerp = Some(Rc::new(lerp));
    }

    pub fn set_lerp_fn(&mut self, lerp: LerpFn<V>) {
        self.lerp = Some(lerp);
    }

    pub fn has_lerp(&self) -> bool {
        self.lerp.is_some()
    }

    pub fn set_on_update(&mut self, on_update: impl FnMut(V) + 'static) {
        self.on_update = Some(Box::new(on_update));
    }

    /// Swap start and end
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }

    /// Interpolated value at the current progress
    pub fn value(&self) -> V {
        self.value_at(self.progress())
    }

    fn value_at(&self, t: f32) -> V {
        match &self.lerp {
            Some(lerp) => lerp(&self.start, &self.end, t),
            None => self.start.clone(),
        }
    }

    fn emit(&mut self, value: V) {
        if let Some(on_update) = self.on_update.as_mut() {
            on_update(value);
        }
    }
}

impl<V: Lerp + Clone + Default + 'static> Tween<V> {
    /// Tween using the value type's own interpolation
    pub fn lerping(start: V, end: V, duration: f32) -> Self {
        let mut tween = Self::new(start, end, duration);
        tween.use_default_lerp();
        tween
    }

    pub fn use_default_lerp(&mut self) {
        self.set_lerp(V::lerp);
    }
}

impl<V: Clone + Default + 'static> Runnable for Tween<V> {
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
        if self.lerp.is_none() && self.duration > 0.0 && !self.warned_missing_lerp {
            self.warned_missing_lerp = true;
            tracing::warn!(
                "Tween<{}> has no lerp function; it will hold its start value",
                std::any::type_name::<V>()
            );
        }
        let value = self.value();
        self.emit(value);
    }

    fn on_cancel(&mut self, snap: bool) {
        if snap {
            let end = self.end.clone();
            self.emit(end);
        }
    }

    fn reset_payload(&mut self) {
        self.duration = 0.0;
        self.start = V::default();
        self.end = V::default();
        self.lerp = None;
        self.on_update = None;
        self.warned_missing_lerp = false;
    }
}

impl<V: fmt::Debug> fmt::Debug for Tween<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("state", &self.state)
            .field("duration", &self.duration)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("has_lerp", &self.lerp.is_some())
            .finish()
    }
}

// ============================================================================
// Fluent setup
// ============================================================================

impl<V: Clone + Default + 'static> Handle<Tween<V>> {
    pub fn from(self, start: V) -> Self {
        self.with_mut(|tween| tween.set_start(start));
        self
    }

    pub fn to(self, end: V) -> Self {
        self.with_mut(|tween| tween.set_end(end));
        self
    }

    pub fn duration(self, seconds: f32) -> Self {
        self.with_mut(|tween| tween.set_duration(seconds));
        self
    }

    pub fn lerp(self, lerp: impl Fn(&V, &V, f32) -> V + 'static) -> Self {
        self.with_mut(|tween| tween.set_lerp(lerp));
        self
    }

    pub fn on_update(self, f: impl FnMut(V) + 'static) -> Self {
        self.with_mut(|tween| tween.set_on_update(f));
        self
    }

    /// Swap start and end
    pub fn reverse(self) -> Self {
        self.with_mut(|tween| tween.reverse());
        self
    }

    /// Apply duration, delay, easing and looping from settings
    pub fn apply(self, settings: &TweenSettings) -> Self {
        self.with_mut(|tween| settings.apply(tween));
        self
    }

    pub fn value(&self) -> V {
        self.borrow().value()
    }
}
