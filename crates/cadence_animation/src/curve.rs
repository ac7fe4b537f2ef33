//! Keyframed easing curves
//!
//! An [`EaseCurve`] is a custom easing authored as keyframes rather than a
//! formula. Keyframe times and values are both normalized; the segment leading
//! into each keyframe is shaped by that keyframe's easing.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;

/// A single point on an easing curve
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time position (0.0 to 1.0)
    pub time: f32,
    /// Eased value at this time
    pub value: f32,
    /// Easing used when transitioning TO this keyframe
    #[serde(default)]
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            easing: Easing::Linear,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
}

/// Piecewise easing curve
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EaseCurve {
    keys: Vec<Keyframe>,
}

impl EaseCurve {
    /// Build a curve; keyframes are sorted by time
    pub fn new(mut keys: Vec<Keyframe>) -> Self {
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    /// Straight line from (0, 0) to (1, 1)
    pub fn linear() -> Self {
        Self::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)])
    }

    /// Builder: add a keyframe
    pub fn key(mut self, time: f32, value: f32, easing: Easing) -> Self {
        let at = self.keys.partition_point(|k| k.time <= time);
        self.keys.insert(at, Keyframe::new(time, value).with_easing(easing));
        self
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Sample the curve
    ///
    /// Before the first key and after the last the curve holds the boundary
    /// value. An empty curve is the identity.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };
        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // First key strictly after t; guaranteed in 1..len by the checks above
        let next = self.keys.partition_point(|k| k.time <= t);
        let from = &self.keys[next - 1];
        let to = &self.keys[next];

        let span = to.time - from.time;
        if span <= f32::EPSILON {
            return to.value;
        }
        let local = to.easing.apply((t - from.time) / span);
        from.value + (to.value - from.value) * local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_curve() {
        let curve = EaseCurve::linear();
        assert_eq!(curve.evaluate(0.0), 0.0);
        assert_eq!(curve.evaluate(0.25), 0.25);
        assert_eq!(curve.evaluate(1.0), 1.0);
    }

    #[test]
    fn test_segments_use_target_easing() {
        let curve = EaseCurve::default()
            .key(0.0, 0.0, Easing::Linear)
            .key(0.5, 1.0, Easing::EaseInQuad)
            .key(1.0, 1.0, Easing::Linear);

        // halfway into the first segment with quad-in easing
        assert!((curve.evaluate(0.25) - 0.25).abs() < 1e-6);
        assert_eq!(curve.evaluate(0.75), 1.0);
    }

    #[test]
    fn test_holds_outside_keys() {
        let curve = EaseCurve::new(vec![Keyframe::new(0.8, 1.0), Keyframe::new(0.2, 0.0)]);
        assert_eq!(curve.keys()[0].time, 0.2);
        assert_eq!(curve.evaluate(0.1), 0.0);
        assert_eq!(curve.evaluate(0.9), 1.0);
        assert!((curve.evaluate(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_curve_is_identity() {
        assert_eq!(EaseCurve::default().evaluate(0.3), 0.3);
    }
}
