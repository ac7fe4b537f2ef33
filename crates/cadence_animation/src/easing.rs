//! Easing functions for animations
//!
//! Every preset maps normalized progress `t` to an eased value with
//! `f(0) = 0` and `f(1) = 1`. Inputs are not clamped, and back/elastic presets
//! deliberately leave `0..=1` between the endpoints.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;
const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;
const BOUNCE_N1: f32 = 7.5625;
const BOUNCE_D1: f32 = 2.75;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the easing function to a progress value
    pub fn apply(&self, t: f32) -> f32 {
        match *self {
            Easing::Linear => t,

            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,

            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t).powi(2),
            Easing::EaseInOutQuad => in_out(t, |t| 2.0 * t * t, |t| 1.0 - (-2.0 * t + 2.0).powi(2) / 2.0),

            Easing::EaseInCubic => t * t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutCubic => {
                in_out(t, |t| 4.0 * t.powi(3), |t| 1.0 - (-2.0 * t + 2.0).powi(3) / 2.0)
            }

            Easing::EaseInQuart => t.powi(4),
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                in_out(t, |t| 8.0 * t.powi(4), |t| 1.0 - (-2.0 * t + 2.0).powi(4) / 2.0)
            }

            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => {
                in_out(t, |t| 16.0 * t.powi(5), |t| 1.0 - (-2.0 * t + 2.0).powi(5) / 2.0)
            }

            Easing::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Easing::EaseInOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    in_out(
                        t,
                        |t| 2f32.powf(20.0 * t - 10.0) / 2.0,
                        |t| (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0,
                    )
                }
            }

            // sqrt arguments are floored at zero so overshooting input stays finite
            Easing::EaseInCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Easing::EaseOutCirc => (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt(),
            Easing::EaseInOutCirc => in_out(
                t,
                |t| (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0,
                |t| ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0,
            ),

            Easing::EaseInBack => BACK_C3 * t.powi(3) - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2)
            }
            Easing::EaseInOutBack => in_out(
                t,
                |t| ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0,
                |t| {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                },
            ),

            Easing::EaseInElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
                }
            }
            Easing::EaseOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Easing::EaseInOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    in_out(
                        t,
                        |t| -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0,
                        |t| {
                            (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin())
                                / 2.0
                                + 1.0
                        },
                    )
                }
            }

            Easing::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Easing::EaseOutBounce => bounce_out(t),
            Easing::EaseInOutBounce => in_out(
                t,
                |t| (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0,
                |t| (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0,
            ),

            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
        }
    }

    /// Whether the curve leaves `0..=1` between its endpoints
    pub fn overshoots(&self) -> bool {
        match *self {
            Easing::EaseInBack
            | Easing::EaseOutBack
            | Easing::EaseInOutBack
            | Easing::EaseInElastic
            | Easing::EaseOutElastic
            | Easing::EaseInOutElastic => true,
            Easing::CubicBezier(_, y1, _, y2) => !(0.0..=1.0).contains(&y1) || !(0.0..=1.0).contains(&y2),
            _ => false,
        }
    }
}

#[inline]
fn in_out(t: f32, first: impl Fn(f32) -> f32, second: impl Fn(f32) -> f32) -> f32 {
    if t < 0.5 {
        first(t)
    } else {
        second(t)
    }
}

fn bounce_out(t: f32) -> f32 {
    if t < 1.0 / BOUNCE_D1 {
        BOUNCE_N1 * t * t
    } else if t < 2.0 / BOUNCE_D1 {
        let t = t - 1.5 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.75
    } else if t < 2.5 / BOUNCE_D1 {
        let t = t - 2.25 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.984375
    }
}

// ============================================================================
// Cubic bezier
// ============================================================================

/// Solve `x(p) = t` for the curve parameter, then return `y(p)`.
///
/// Newton iterations first; bisection when the slope flattens out. Works in
/// f64 so small frame deltas do not jitter.
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let target = t as f64;
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);

    let mut p = target;
    let mut solved = false;
    for _ in 0..8 {
        let err = bezier_axis(p, x1, x2) - target;
        if err.abs() < 1e-7 {
            solved = true;
            break;
        }
        let slope = bezier_axis_slope(p, x1, x2);
        if slope.abs() < 1e-7 {
            break;
        }
        p -= err / slope;
    }

    if !solved {
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        p = target;
        for _ in 0..24 {
            let x = bezier_axis(p, x1, x2);
            if (x - target).abs() < 1e-7 {
                break;
            }
            if x < target {
                lo = p;
            } else {
                hi = p;
            }
            p = (lo + hi) / 2.0;
        }
    }

    bezier_axis(p, y1, y2) as f32
}

/// One axis of a bezier anchored at 0 and 1: `3(1-p)²p·c1 + 3(1-p)p²·c2 + p³`
#[inline]
fn bezier_axis(p: f64, c1: f64, c2: f64) -> f64 {
    let a = 1.0 - 3.0 * c2 + 3.0 * c1;
    let b = 3.0 * c2 - 6.0 * c1;
    let c = 3.0 * c1;
    ((a * p + b) * p + c) * p
}

#[inline]
fn bezier_axis_slope(p: f64, c1: f64, c2: f64) -> f64 {
    let a = 1.0 - 3.0 * c2 + 3.0 * c1;
    let b = 3.0 * c2 - 6.0 * c1;
    let c = 3.0 * c1;
    (3.0 * a * p + 2.0 * b) * p + c
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESETS: [Easing; 31] = [
        Easing::Linear,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInExpo,
        Easing::EaseOutExpo,
        Easing::EaseInOutExpo,
        Easing::EaseInCirc,
        Easing::EaseOutCirc,
        Easing::EaseInOutCirc,
        Easing::EaseInBack,
        Easing::EaseOutBack,
        Easing::EaseInOutBack,
        Easing::EaseInElastic,
        Easing::EaseOutElastic,
        Easing::EaseInOutElastic,
        Easing::EaseInBounce,
        Easing::EaseOutBounce,
        Easing::EaseInOutBounce,
    ];

    #[test]
    fn test_endpoints() {
        for easing in PRESETS {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_midpoints() {
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::EaseInQuad.apply(0.5), 0.25);
        assert_eq!(Easing::EaseOutQuad.apply(0.5), 0.75);
        assert!((Easing::EaseInOutSine.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::EaseInOutCubic.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_in_out_mirror() {
        for t in [0.1, 0.3, 0.7] {
            let a = Easing::EaseInCubic.apply(t);
            let b = Easing::EaseOutCubic.apply(1.0 - t);
            assert!((a - (1.0 - b)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_overshoot() {
        assert!(Easing::EaseInBack.apply(0.2) < 0.0);
        assert!(Easing::EaseOutBack.apply(0.8) > 1.0);
        assert!(Easing::EaseOutElastic.apply(0.1) > 1.0);
        assert!(Easing::EaseOutBack.overshoots());
        assert!(!Easing::EaseOutBounce.overshoots());
    }

    #[test]
    fn test_bounce_stays_in_range() {
        for i in 0..=100 {
            let v = Easing::EaseOutBounce.apply(i as f32 / 100.0);
            assert!((0.0..=1.0001).contains(&v));
        }
    }

    #[test]
    fn test_unclamped_input() {
        assert_eq!(Easing::Linear.apply(1.5), 1.5);
        assert_eq!(Easing::EaseInQuad.apply(-1.0), 1.0);
        assert!(Easing::EaseInOutCirc.apply(1.5).is_finite());
    }

    #[test]
    fn test_cubic_bezier() {
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        for t in [0.1, 0.5, 0.9] {
            assert!((linear.apply(t) - t).abs() < 1e-4);
        }

        // CSS `ease`
        let ease = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);
        assert!(ease.apply(0.5) > 0.5);
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);
    }
}
