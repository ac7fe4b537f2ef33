//! Tween settings and manager configuration
//!
//! Both are plain serde structs so they can live in TOML files next to the
//! rest of an application's configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::curve::EaseCurve;
use crate::easing::Easing;
use crate::error::Result;
use crate::runnable::{Ease, LoopMode, Runnable};
use crate::tween::Tween;

// ============================================================================
// TweenSettings
// ============================================================================

/// Easing as stored in settings: a preset name or keyframes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EaseSetting {
    Preset(Easing),
    Curve(EaseCurve),
}

impl Default for EaseSetting {
    fn default() -> Self {
        EaseSetting::Preset(Easing::Linear)
    }
}

impl EaseSetting {
    pub fn to_ease(&self) -> Ease {
        match self {
            EaseSetting::Preset(easing) => Ease::Preset(*easing),
            EaseSetting::Curve(curve) => Ease::from(curve.clone()),
        }
    }
}

/// Reusable timing for a tween
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenSettings {
    /// Cycle duration in seconds
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// Start delay in seconds
    #[serde(default)]
    pub delay: f32,
    #[serde(default)]
    pub ease: EaseSetting,
    #[serde(default)]
    pub loop_mode: LoopMode,
    /// Cycle count when looping; absent loops forever
    #[serde(default)]
    pub loops: Option<u32>,
}

fn default_duration() -> f32 {
    1.0
}

impl Default for TweenSettings {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            delay: 0.0,
            ease: EaseSetting::default(),
            loop_mode: LoopMode::None,
            loops: None,
        }
    }
}

impl TweenSettings {
    pub fn new(duration: f32) -> Self {
        Self::default().with_duration(duration)
    }

    /// Builder: set duration, clamped to zero
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(0.0);
        self
    }

    /// Builder: set delay, clamped to zero
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.ease = EaseSetting::Preset(easing);
        self
    }

    pub fn with_curve(mut self, curve: EaseCurve) -> Self {
        self.ease = EaseSetting::Curve(curve);
        self
    }

    pub fn with_loop(mut self, mode: LoopMode, loops: Option<u32>) -> Self {
        self.loop_mode = mode;
        self.loops = loops;
        self
    }

    /// Duration including delay and finite loops
    pub fn total_duration(&self) -> f32 {
        let cycles = match (self.loop_mode, self.loops) {
            (LoopMode::None, _) | (_, None) => 1.0,
            (_, Some(loops)) => loops as f32,
        };
        self.duration.max(0.0) * cycles + self.delay.max(0.0)
    }

    /// Configure a tween with these settings
    pub fn apply<V: Clone + Default + 'static>(&self, tween: &mut Tween<V>) {
        tween.set_duration(self.duration);
        let state = tween.state_mut();
        state.set_delay(self.delay);
        state.set_ease(self.ease.to_ease());
        state.set_looping(self.loop_mode, self.loops);
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ============================================================================
// ManagerConfig
// ============================================================================

/// Tween manager configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// A disabled manager neither ticks nor hands out jobs
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Stop jobs whose owner has been destroyed
    #[serde(default = "default_true")]
    pub owner_checks: bool,
    /// Enforce `max_jobs`
    #[serde(default = "default_true")]
    pub limit_jobs: bool,
    /// Ceiling on active plus pooled jobs
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    /// Run completion callbacks when a job stops because its owner is gone
    #[serde(default)]
    pub complete_on_owner_lost: bool,
    /// Multiplier on the tick delta for jobs that do not ignore it
    #[serde(default = "default_time_scale")]
    pub time_scale: f32,
}

fn default_true() -> bool {
    true
}

fn default_max_jobs() -> usize {
    1000
}

fn default_time_scale() -> f32 {
    1.0
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            owner_checks: true,
            limit_jobs: true,
            max_jobs: default_max_jobs(),
            complete_on_owner_lost: false,
            time_scale: default_time_scale(),
        }
    }
}

impl ManagerConfig {
    /// Builder: cap active plus pooled jobs; `None` removes the cap
    pub fn with_max_jobs(mut self, max: Option<usize>) -> Self {
        match max {
            Some(max) => {
                self.limit_jobs = true;
                self.max_jobs = max;
            }
            None => self.limit_jobs = false,
        }
        self
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn with_owner_checks(mut self, enabled: bool) -> Self {
        self.owner_checks = enabled;
        self
    }

    pub fn with_complete_on_owner_lost(mut self, complete: bool) -> Self {
        self.complete_on_owner_lost = complete;
        self
    }

    /// The effective ceiling, if any
    pub fn job_limit(&self) -> Option<usize> {
        self.limit_jobs.then_some(self.max_jobs)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded tween manager config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
