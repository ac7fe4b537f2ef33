//! Linear timelines
//!
//! A [`Sequence`] is a job made of items laid end to end. Each item has a
//! duration and an optional trigger that fires when the playhead reaches it.
//! Overlay items share the time slot of the item before them instead of
//! extending the timeline, so several triggers can start together.
//!
//! Triggers usually start other jobs. Because large frame deltas can jump the
//! playhead across several short items, every skipped trigger still fires
//! once, in timeline order.

use std::fmt;

use crate::error::Result;
use crate::handle::Handle;
use crate::runnable::{LoopMode, RunState, Runnable};
use crate::settings::TweenSettings;
use crate::tween::Tween;

/// A timeline entry
pub struct SequenceItem {
    duration: f32,
    overlay: bool,
    trigger: Option<Box<dyn FnMut()>>,
}

impl SequenceItem {
    /// An item that only takes up time
    pub fn wait(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            overlay: false,
            trigger: None,
        }
    }

    /// A zero-length item that fires `f`
    pub fn call(f: impl FnMut() + 'static) -> Self {
        Self::wait(0.0).with_trigger(f)
    }

    pub fn with_trigger(mut self, f: impl FnMut() + 'static) -> Self {
        self.trigger = Some(Box::new(f));
        self
    }

    /// Share the previous item's time slot
    pub fn overlay(mut self, overlay: bool) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_overlay(&self) -> bool {
        self.overlay
    }
}

impl fmt::Debug for SequenceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceItem")
            .field("duration", &self.duration)
            .field("overlay", &self.overlay)
            .field("has_trigger", &self.trigger.is_some())
            .finish()
    }
}

/// A job that plays timeline items in order
#[derive(Default)]
pub struct Sequence {
    state: RunState,
    items: Vec<SequenceItem>,
    /// Last item whose trigger has fired in the current pass
    last_index: Option<usize>,
    /// Completed loop passes
    pass: u32,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SequenceItem] {
        &self.items
    }

    pub fn add_item(&mut self, item: SequenceItem) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn add_delay(&mut self, seconds: f32) -> &mut Self {
        self.add_item(SequenceItem::wait(seconds))
    }

    pub fn add_callback(&mut self, f: impl FnMut() + 'static) -> &mut Self {
        self.add_item(SequenceItem::call(f))
    }

    /// Embed an already configured job
    ///
    /// The job is paused now and resumed when the playhead reaches it; the
    /// item lasts for the job's total duration.
    pub fn add_now<T: Runnable + ?Sized>(&mut self, job: &Handle<T>, overlay: bool) -> &mut Self {
        job.pause();
        let duration = job.total_duration();
        let job = job.clone();
        self.add_item(
            SequenceItem::wait(duration)
                .overlay(overlay)
                .with_trigger(move || {
                    if job.is_current() {
                        job.resume();
                    }
                }),
        )
    }

    /// Add a tween built when the playhead reaches it
    ///
    /// Building late lets the tween capture live state (such as a current
    /// position as its start value) at the moment it begins.
    pub fn add<V, F>(&mut self, mut factory: F, duration: f32, delay: f32, overlay: bool) -> &mut Self
    where
        V: Clone + Default + 'static,
        F: FnMut() -> Result<Handle<Tween<V>>> + 'static,
    {
        let duration = duration.max(0.0);
        let delay = delay.max(0.0);
        self.add_item(
            SequenceItem::wait(duration + delay)
                .overlay(overlay)
                .with_trigger(move || match factory() {
                    Ok(tween) => {
                        let mut tween = tween.borrow_mut();
                        tween.set_duration(duration);
                        tween.state_mut().set_delay(delay);
                    }
                    Err(err) => tracing::error!("Sequence item failed to start its tween: {}", err),
                }),
        )
    }

    /// Add a tween built late and configured from settings
    pub fn add_with_settings<V, F>(&mut self, mut factory: F, settings: TweenSettings, overlay: bool) -> &mut Self
    where
        V: Clone + Default + 'static,
        F: FnMut() -> Result<Handle<Tween<V>>> + 'static,
    {
        let duration = settings.total_duration();
        self.add_item(
            SequenceItem::wait(duration)
                .overlay(overlay)
                .with_trigger(move || match factory() {
                    Ok(tween) => settings.apply(&mut tween.borrow_mut()),
                    Err(err) => tracing::error!("Sequence item failed to start its tween: {}", err),
                }),
        )
    }

    /// Index of the item the playhead is in at `progress`
    ///
    /// Overlay items are skipped while walking and then folded into the item
    /// they follow.
    pub fn item_index(&self, progress: f32) -> usize {
        let last = self.items.len().saturating_sub(1);
        let total = self.duration();

        let mut index = last;
        let mut cumulative = 0.0;
        for (i, item) in self.items.iter().enumerate() {
            if item.overlay {
                continue;
            }
            if total > 0.0 {
                cumulative += item.duration / total;
            }
            if cumulative > progress {
                index = i;
                break;
            }
        }

        while index + 1 < self.items.len() && self.items[index + 1].overlay {
            index += 1;
        }
        index
    }

    /// Fire every trigger after the last fired one, up to `target`
    fn dispatch_through(&mut self, target: usize) {
        let start = self.last_index.map_or(0, |i| i + 1);
        for item in self.items.iter_mut().take(target + 1).skip(start) {
            if let Some(trigger) = item.trigger.as_mut() {
                trigger();
            }
        }
        if start <= target {
            self.last_index = Some(target);
        }
    }

    fn plays_forward(&self, pass: u32) -> bool {
        self.state.loop_mode() != LoopMode::PingPong || pass % 2 == 0
    }
}

impl Runnable for Sequence {
    fn state(&self) -> &RunState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }

    /// Sum of non-overlay item durations
    fn duration(&self) -> f32 {
        self.items
            .iter()
            .filter(|item| !item.overlay)
            .map(|item| item.duration)
            .sum()
    }

    fn on_update(&mut self, _dt: f32) {
        if self.items.is_empty() {
            return;
        }
        let last = self.items.len() - 1;

        // A timeline with no length fires everything at once
        if self.duration() <= 0.0 {
            self.dispatch_through(last);
            return;
        }

        let raw = self.bounded_progress();
        let pass = if raw > 0.0 { raw.ceil() as u32 - 1 } else { 0 };
        while self.pass < pass {
            if self.plays_forward(self.pass) {
                self.dispatch_through(last);
            }
            self.pass += 1;
            self.last_index = None;
        }

        if self.plays_forward(pass) {
            let index = self.item_index(self.progress());
            self.dispatch_through(index);
        }
    }

    fn reset_payload(&mut self) {
        self.items.clear();
        self.last_index = None;
        self.pass = 0;
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("state", &self.state)
            .field("items", &self.items)
            .field("last_index", &self.last_index)
            .finish()
    }
}

// ============================================================================
// Fluent setup
// ============================================================================

impl Handle<Sequence> {
    pub fn add_item(self, item: SequenceItem) -> Self {
        self.with_mut(|seq| {
            seq.add_item(item);
        });
        self
    }

    pub fn add_delay(self, seconds: f32) -> Self {
        self.with_mut(|seq| {
            seq.add_delay(seconds);
        });
        self
    }

    pub fn add_callback(self, f: impl FnMut() + 'static) -> Self {
        self.with_mut(|seq| {
            seq.add_callback(f);
        });
        self
    }

    pub fn add_now<T: Runnable + ?Sized>(self, job: &Handle<T>, overlay: bool) -> Self {
        self.with_mut(|seq| {
            seq.add_now(job, overlay);
        });
        self
    }

    pub fn add<V, F>(self, factory: F, duration: f32, delay: f32, overlay: bool) -> Self
    where
        V: Clone + Default + 'static,
        F: FnMut() -> Result<Handle<Tween<V>>> + 'static,
    {
        self.with_mut(|seq| {
            seq.add(factory, duration, delay, overlay);
        });
        self
    }

    pub fn add_with_settings<V, F>(self, factory: F, settings: TweenSettings, overlay: bool) -> Self
    where
        V: Clone + Default + 'static,
        F: FnMut() -> Result<Handle<Tween<V>>> + 'static,
    {
        self.with_mut(|seq| {
            seq.add_with_settings(factory, settings, overlay);
        });
        self
    }
}
