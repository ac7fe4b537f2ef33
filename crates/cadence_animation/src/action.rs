//! Resumable actions for graph runners
//!
//! An [`Action`] is stepped once per frame until it reports
//! [`ActionState::Complete`]. Each return from `step` is a suspension point.

use std::fmt;

use crate::handle::Handle;
use crate::runnable::Runnable;

/// Result of stepping an action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionState {
    Running,
    Complete,
}

impl ActionState {
    pub fn is_complete(self) -> bool {
        self == ActionState::Complete
    }
}

impl From<bool> for ActionState {
    fn from(complete: bool) -> Self {
        if complete {
            ActionState::Complete
        } else {
            ActionState::Running
        }
    }
}

/// A step function driven by a graph runner
///
/// The first step of a freshly started action receives `dt = 0`.
pub trait Action {
    fn step(&mut self, dt: f32) -> ActionState;
}

impl<F: FnMut(f32) -> ActionState> Action for F {
    fn step(&mut self, dt: f32) -> ActionState {
        self(dt)
    }
}

/// Waits for a fixed time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Delay {
    remaining: f32,
}

impl Delay {
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }
}

impl Action for Delay {
    fn step(&mut self, dt: f32) -> ActionState {
        self.remaining -= dt;
        (self.remaining <= 0.0).into()
    }
}

/// Waits for a job to finish
///
/// The wait also ends if the job instance has been recycled since the handle
/// was issued, which means the awaited run already finished.
pub struct WaitFor {
    job: Handle<dyn Runnable>,
}

impl WaitFor {
    pub fn new<T: Runnable>(job: Handle<T>) -> Self {
        Self {
            job: job.into_dyn(),
        }
    }

    pub fn from_dyn(job: Handle<dyn Runnable>) -> Self {
        Self { job }
    }
}

impl Action for WaitFor {
    fn step(&mut self, _dt: f32) -> ActionState {
        if !self.job.is_current() {
            return ActionState::Complete;
        }
        match self.job.cell().try_borrow() {
            Ok(job) => job.is_complete().into(),
            Err(_) => ActionState::Running,
        }
    }
}

impl fmt::Debug for WaitFor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitFor").field("job", &self.job).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::Tween;

    #[test]
    fn test_delay() {
        let mut delay = Delay::new(1.0);
        assert_eq!(delay.step(0.0), ActionState::Running);
        assert_eq!(delay.step(0.6), ActionState::Running);
        assert_eq!(delay.step(0.6), ActionState::Complete);
        assert!(Delay::new(0.0).step(0.0).is_complete());
    }

    #[test]
    fn test_closure_action() {
        let mut frames = 0;
        let mut action = move |_dt: f32| {
            frames += 1;
            ActionState::from(frames == 3)
        };
        assert_eq!(action.step(0.1), ActionState::Running);
        assert_eq!(action.step(0.1), ActionState::Running);
        assert_eq!(action.step(0.1), ActionState::Complete);
    }

    #[test]
    fn test_wait_for_job() {
        let tween = Handle::new(Tween::lerping(0.0f32, 1.0, 1.0));
        let mut wait = WaitFor::new(tween.clone());
        assert_eq!(wait.step(0.0), ActionState::Running);
        tween.tick(1.0);
        assert_eq!(wait.step(0.0), ActionState::Complete);
    }

    #[test]
    fn test_wait_for_recycled_job() {
        let tween = Handle::new(Tween::lerping(0.0f32, 1.0, 1.0));
        let mut wait = WaitFor::new(tween.clone());
        tween.borrow_mut().reset();
        assert_eq!(wait.step(0.0), ActionState::Complete);
    }
}
