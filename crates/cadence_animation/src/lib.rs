//! Cadence Animation System
//!
//! Pooled tweens, timelines, and dependency-graph runners driven by a
//! per-frame tick.
//!
//! # Features
//!
//! - **Easing**: Penner presets, cubic bezier, keyframed curves, closures
//! - **Tweens**: Typed interpolation with delay, looping and ping-pong
//! - **Pooling**: Finished jobs are recycled per type, with an optional job cap
//! - **Owners**: Jobs attached to a destroyed owner stop on their own
//! - **Sequences**: Ordered timelines with overlapping items
//! - **Graphs**: Fork/join flows of resumable actions
//!
//! # Example
//!
//! ```rust
//! use cadence_animation::{Easing, TweenManager};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let manager = TweenManager::default();
//! let x = Rc::new(Cell::new(0.0f32));
//! let target = x.clone();
//!
//! manager
//!     .tween::<f32>()
//!     .unwrap()
//!     .from(0.0)
//!     .to(100.0)
//!     .duration(0.5)
//!     .ease(Easing::EaseOutCubic)
//!     .on_update(move |v| target.set(v));
//!
//! manager.tick(0.25);
//! manager.tick(0.25);
//! assert_eq!(x.get(), 100.0);
//! assert_eq!(manager.pooled_count(), 1);
//! ```

pub mod action;
pub mod builder;
pub mod curve;
pub mod dynamic;
pub mod easing;
pub mod error;
pub mod handle;
pub mod manager;
pub mod presets;
pub mod runnable;
pub mod sequence;
pub mod settings;
pub mod tween;

pub use action::{Action, ActionState, Delay, WaitFor};
pub use builder::GraphBuilder;
pub use curve::{EaseCurve, Keyframe};
pub use dynamic::{DynamicSequence, Graph, NodeId, NodeKind, NodeState};
pub use easing::Easing;
pub use error::{Result, TweenError};
pub use handle::Handle;
pub use manager::{
    clear_global_manager, get_manager, is_manager_initialized, set_global_manager,
    try_get_manager, JobId, ManagerHandle, TweenManager,
};
pub use presets::TweenPreset;
pub use runnable::{Ease, Finish, LoopMode, RunState, Runnable};
pub use sequence::{Sequence, SequenceItem};
pub use settings::{EaseSetting, ManagerConfig, TweenSettings};
pub use tween::{LerpFn, Tween, UpdateFn};

pub use cadence_core::{
    Accessor, Axis, Channel, Lerp, Lifeline, Owned, OwnerRef, Part, Property, PropertyError,
    PropertyRegistry, Rgba,
};
