//! Presets for common jobs and timings
//!
//! Ready-made jobs on [`TweenManager`] (timers, delayed calls, plain value
//! tweens) and named [`TweenSettings`] for the timings UIs reach for most.

use cadence_core::Lerp;

use crate::easing::Easing;
use crate::error::Result;
use crate::handle::Handle;
use crate::manager::TweenManager;
use crate::runnable::LoopMode;
use crate::settings::TweenSettings;
use crate::tween::Tween;

impl TweenManager {
    // ========================================================================
    // Timers
    // ========================================================================

    /// A job that does nothing for `seconds`
    ///
    /// Useful as a timer: attach callbacks with
    /// [`Handle::on_complete`](crate::Handle::on_complete).
    pub fn delay(&self, seconds: f32) -> Result<Handle<Tween<()>>> {
        Ok(self
            .acquire::<Tween<()>>(None)?
            .duration(seconds)
            .lerp(|_, _, _| ()))
    }

    /// Run `f` once `seconds` have passed
    ///
    /// Cancelling the returned job without completion skips the call.
    pub fn delayed_call(
        &self,
        seconds: f32,
        f: impl FnOnce() + 'static,
    ) -> Result<Handle<Tween<()>>> {
        Ok(self.delay(seconds)?.on_complete(f))
    }

    // ========================================================================
    // Value tweens
    // ========================================================================

    /// Tween between two values; read them with `on_update` or `value`
    pub fn tween_value<V: Lerp + Clone + Default + 'static>(
        &self,
        from: V,
        to: V,
        duration: f32,
    ) -> Result<Handle<Tween<V>>> {
        Ok(self.tween::<V>()?.from(from).to(to).duration(duration))
    }
}

/// Named timings for common transitions
pub struct TweenPreset;

impl TweenPreset {
    /// Short ease-out for hover and press feedback
    pub fn quick() -> TweenSettings {
        TweenSettings::new(0.15).with_easing(Easing::EaseOutQuad)
    }

    /// Standard ease-in-out for most transitions
    pub fn smooth() -> TweenSettings {
        TweenSettings::new(0.3).with_easing(Easing::EaseInOutCubic)
    }

    /// Entry with a slight overshoot
    pub fn pop() -> TweenSettings {
        TweenSettings::new(0.35).with_easing(Easing::EaseOutBack)
    }

    /// Landing bounce
    pub fn bounce() -> TweenSettings {
        TweenSettings::new(0.6).with_easing(Easing::EaseOutBounce)
    }

    /// Endless back-and-forth
    pub fn pulse(period: f32) -> TweenSettings {
        TweenSettings::new(period * 0.5)
            .with_easing(Easing::EaseInOutSine)
            .with_loop(LoopMode::PingPong, None)
    }

    /// Horizontal shake of `count` back-and-forth swings
    pub fn shake(duration: f32, count: u32) -> TweenSettings {
        let swings = count.max(1) * 2;
        TweenSettings::new(duration / swings as f32)
            .with_easing(Easing::EaseInOutSine)
            .with_loop(LoopMode::PingPong, Some(swings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runnable::Runnable;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_delayed_call() {
        let manager = TweenManager::default();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        manager.delayed_call(1.0, move || flag.set(true)).unwrap();

        manager.tick(0.6);
        assert!(!fired.get());
        manager.tick(0.6);
        assert!(fired.get());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_cancelled_delayed_call_is_skipped() {
        let manager = TweenManager::default();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let timer = manager.delayed_call(1.0, move || flag.set(true)).unwrap();

        manager.cancel(&timer, false);
        manager.tick(2.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_tween_value() {
        let manager = TweenManager::default();
        let tween = manager.tween_value([0.0f32, 0.0], [2.0, 4.0], 2.0).unwrap();
        manager.tick(1.0);
        assert_eq!(tween.value(), [1.0, 2.0]);
    }

    #[test]
    fn test_presets() {
        assert_eq!(TweenPreset::smooth().duration, 0.3);
        assert!(TweenPreset::pop().total_duration() > 0.0);

        let pulse = TweenPreset::pulse(2.0);
        assert_eq!(pulse.loop_mode, LoopMode::PingPong);
        assert_eq!(pulse.loops, None);

        let shake = TweenPreset::shake(1.0, 3);
        assert_eq!(shake.loops, Some(6));
        assert!((shake.total_duration() - 1.0).abs() < 1e-6);

        let mut tween = Tween::lerping(0.0f32, 1.0, 0.0);
        shake.apply(&mut tween);
        tween.tick(0.25);
        assert!(!tween.is_complete());
        tween.tick(1.0);
        assert!(tween.is_complete());
        assert_eq!(tween.value(), 0.0);
    }
}
