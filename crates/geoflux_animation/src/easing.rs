//! Easing functions and Bezier timing curves
//!
//! A [`TimingCurve`] is a Bezier easing curve running from (0,0) to (1,1)
//! through up to [`MAX_CONTROL_POINTS`] inner control points; two inner
//! points give the familiar CSS `cubic-bezier(x1, y1, x2, y2)`. Sampling
//! inverts x(p) = t and returns y(p).
//!
//! [`Easing`] adds the closed set of named easing functions used by layer
//! animation configs.

use geoflux_core::{ConfigError, Result};
use serde::Deserialize;
use std::str::FromStr;

/// Maximum number of inner control points of a timing curve
pub const MAX_CONTROL_POINTS: usize = 6;

const MAX_POINTS: usize = MAX_CONTROL_POINTS + 2;

/// Absolute x tolerance of the curve inversion
pub const SOLVE_EPSILON: f64 = 1e-5;

const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 32;
const MIN_SLOPE: f64 = 1e-7;

/// A Bezier timing curve with implicit endpoints (0,0) and (1,1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingCurve {
    xs: [f64; MAX_POINTS],
    ys: [f64; MAX_POINTS],
    /// Point count including both endpoints; 2 means linear
    len: usize,
}

impl TimingCurve {
    pub const LINEAR: TimingCurve = TimingCurve {
        xs: [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ys: [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        len: 2,
    };

    /// CSS-style cubic Bezier
    pub fn cubic(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self> {
        Self::from_points(&[[x1, y1], [x2, y2]])
    }

    /// Build from a flat `[x1, y1, x2, y2]` timing array
    pub fn from_timing(timing: &[f32]) -> Result<Self> {
        match timing {
            [x1, y1, x2, y2] => Self::cubic(*x1, *y1, *x2, *y2),
            [] => Err(ConfigError::EmptyCurve),
            other => Err(ConfigError::MalformedCurve(format!(
                "timing array needs 4 numbers, got {}",
                other.len()
            ))),
        }
    }

    /// Build from inner control points `[x, y]`.
    ///
    /// Every x must lie in [0, 1]. With more than two points the x values must
    /// also be non-decreasing so the curve covers [0, 1] monotonically.
    /// Points that all lie on y = x collapse to [`TimingCurve::LINEAR`].
    pub fn from_points(points: &[[f32; 2]]) -> Result<Self> {
        if points.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }
        if points.len() > MAX_CONTROL_POINTS {
            return Err(ConfigError::MalformedCurve(format!(
                "at most {MAX_CONTROL_POINTS} control points, got {}",
                points.len()
            )));
        }
        for [x, y] in points {
            if !x.is_finite() || !y.is_finite() {
                return Err(ConfigError::MalformedCurve(
                    "control point is not finite".to_string(),
                ));
            }
            if !(0.0..=1.0).contains(x) {
                return Err(ConfigError::MalformedCurve(format!(
                    "control x must be in [0, 1], got {x}"
                )));
            }
        }
        if points.len() > 2 && points.windows(2).any(|w| w[1][0] < w[0][0]) {
            return Err(ConfigError::MalformedCurve(
                "control x values must be non-decreasing".to_string(),
            ));
        }

        if points.iter().all(|[x, y]| (x - y).abs() < 1e-6) {
            return Ok(Self::LINEAR);
        }

        let mut curve = TimingCurve {
            xs: [0.0; MAX_POINTS],
            ys: [0.0; MAX_POINTS],
            len: points.len() + 2,
        };
        for (i, [x, y]) in points.iter().enumerate() {
            curve.xs[i + 1] = *x as f64;
            curve.ys[i + 1] = *y as f64;
        }
        curve.xs[curve.len - 1] = 1.0;
        curve.ys[curve.len - 1] = 1.0;
        Ok(curve)
    }

    pub fn is_linear(&self) -> bool {
        self.len == 2
    }

    /// Inner control points
    pub fn control_points(&self) -> impl Iterator<Item = [f32; 2]> + '_ {
        (1..self.len - 1).map(|i| [self.xs[i] as f32, self.ys[i] as f32])
    }

    /// Eased progress for a time fraction; `t` is clamped to [0, 1]
    pub fn sample(&self, t: f32) -> f32 {
        // Endpoints are always exact
        if t <= 0.0 || t.is_nan() {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        if self.is_linear() {
            return t;
        }

        let p = self.solve_parameter(t as f64);
        bezier_sample(&self.ys[..self.len], p) as f32
    }

    /// Find `p` with x(p) == x: Newton-Raphson, then bisection if the slope
    /// flattens or Newton leaves [0, 1]
    fn solve_parameter(&self, x: f64) -> f64 {
        let xs = &self.xs[..self.len];

        let mut p = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = bezier_sample(xs, p) - x;
            if err.abs() < SOLVE_EPSILON {
                return p;
            }
            let slope = bezier_slope(xs, p);
            if slope.abs() < MIN_SLOPE {
                break;
            }
            p -= err / slope;
            if !(0.0..=1.0).contains(&p) {
                break;
            }
        }

        let mut lo = 0.0_f64;
        let mut hi = 1.0_f64;
        p = 0.5;
        for _ in 0..BISECTION_ITERATIONS {
            let val = bezier_sample(xs, p);
            if (val - x).abs() < SOLVE_EPSILON {
                break;
            }
            if val < x {
                lo = p;
            } else {
                hi = p;
            }
            p = (lo + hi) * 0.5;
        }
        p
    }
}

impl Default for TimingCurve {
    fn default() -> Self {
        Self::LINEAR
    }
}

/// Evaluate one axis of a Bezier curve at `t` (de Casteljau)
#[inline]
fn bezier_sample(points: &[f64], t: f64) -> f64 {
    let n = points.len();
    let mut buf = [0.0_f64; MAX_POINTS];
    buf[..n].copy_from_slice(points);
    for level in 1..n {
        for i in 0..n - level {
            buf[i] += (buf[i + 1] - buf[i]) * t;
        }
    }
    buf[0]
}

/// Derivative of one axis: degree * Bezier of the point differences
#[inline]
fn bezier_slope(points: &[f64], t: f64) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let degree = (n - 1) as f64;
    let mut diffs = [0.0_f64; MAX_POINTS];
    for i in 0..n - 1 {
        diffs[i] = (points[i + 1] - points[i]) * degree;
    }
    bezier_sample(&diffs[..n - 1], t)
}

// ============================================================================
// Named easing functions
// ============================================================================

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "EasingRepr")]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    SinusoidalIn,
    SinusoidalOut,
    SinusoidalInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    CircularIn,
    CircularOut,
    CircularInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
    Curve(TimingCurve),
}

const NAMED: [(&str, Easing); 31] = [
    ("Linear", Easing::Linear),
    ("QuadraticIn", Easing::QuadraticIn),
    ("QuadraticOut", Easing::QuadraticOut),
    ("QuadraticInOut", Easing::QuadraticInOut),
    ("CubicIn", Easing::CubicIn),
    ("CubicOut", Easing::CubicOut),
    ("CubicInOut", Easing::CubicInOut),
    ("QuarticIn", Easing::QuarticIn),
    ("QuarticOut", Easing::QuarticOut),
    ("QuarticInOut", Easing::QuarticInOut),
    ("QuinticIn", Easing::QuinticIn),
    ("QuinticOut", Easing::QuinticOut),
    ("QuinticInOut", Easing::QuinticInOut),
    ("SinusoidalIn", Easing::SinusoidalIn),
    ("SinusoidalOut", Easing::SinusoidalOut),
    ("SinusoidalInOut", Easing::SinusoidalInOut),
    ("ExponentialIn", Easing::ExponentialIn),
    ("ExponentialOut", Easing::ExponentialOut),
    ("ExponentialInOut", Easing::ExponentialInOut),
    ("CircularIn", Easing::CircularIn),
    ("CircularOut", Easing::CircularOut),
    ("CircularInOut", Easing::CircularInOut),
    ("ElasticIn", Easing::ElasticIn),
    ("ElasticOut", Easing::ElasticOut),
    ("ElasticInOut", Easing::ElasticInOut),
    ("BackIn", Easing::BackIn),
    ("BackOut", Easing::BackOut),
    ("BackInOut", Easing::BackInOut),
    ("BounceIn", Easing::BounceIn),
    ("BounceOut", Easing::BounceOut),
    ("BounceInOut", Easing::BounceInOut),
];

const BACK_OVERSHOOT: f32 = 1.70158;

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => t * t,
            Easing::QuadraticOut => t * (2.0 - t),
            Easing::QuadraticInOut => in_out(t, |t| t * t),
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => in_out(t, |t| t * t * t),
            Easing::QuarticIn => t.powi(4),
            Easing::QuarticOut => 1.0 - (1.0 - t).powi(4),
            Easing::QuarticInOut => in_out(t, |t| t.powi(4)),
            Easing::QuinticIn => t.powi(5),
            Easing::QuinticOut => 1.0 - (1.0 - t).powi(5),
            Easing::QuinticInOut => in_out(t, |t| t.powi(5)),
            Easing::SinusoidalIn => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Easing::SinusoidalOut => (t * std::f32::consts::FRAC_PI_2).sin(),
            Easing::SinusoidalInOut => 0.5 * (1.0 - (std::f32::consts::PI * t).cos()),
            Easing::ExponentialIn => in_only(t, expo_in),
            Easing::ExponentialOut => out_of(t, expo_in),
            Easing::ExponentialInOut => in_out(t, expo_in),
            Easing::CircularIn => 1.0 - (1.0 - t * t).sqrt(),
            Easing::CircularOut => out_of(t, |t| 1.0 - (1.0 - t * t).sqrt()),
            Easing::CircularInOut => in_out(t, |t| 1.0 - (1.0 - t * t).sqrt()),
            Easing::ElasticIn => in_only(t, elastic_in),
            Easing::ElasticOut => out_of(t, elastic_in),
            Easing::ElasticInOut => in_out(t, elastic_in),
            Easing::BackIn => back_in(t, BACK_OVERSHOOT),
            Easing::BackOut => out_of(t, |t| back_in(t, BACK_OVERSHOOT)),
            Easing::BackInOut => in_out(t, |t| back_in(t, BACK_OVERSHOOT * 1.525)),
            Easing::BounceIn => 1.0 - bounce_out(1.0 - t),
            Easing::BounceOut => bounce_out(t),
            Easing::BounceInOut => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) * 0.5
                } else {
                    bounce_out(2.0 * t - 1.0) * 0.5 + 0.5
                }
            }
            Easing::Curve(curve) => curve.sample(t),
        }
    }

    /// Name used in configuration files, `None` for custom curves
    pub fn name(&self) -> Option<&'static str> {
        NAMED
            .iter()
            .find(|(_, easing)| easing == self)
            .map(|(name, _)| *name)
    }
}

impl FromStr for Easing {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        NAMED
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, easing)| *easing)
            .ok_or_else(|| ConfigError::UnknownEasing(s.to_string()))
    }
}

impl From<TimingCurve> for Easing {
    fn from(curve: TimingCurve) -> Self {
        if curve.is_linear() {
            Easing::Linear
        } else {
            Easing::Curve(curve)
        }
    }
}

/// Easing as written in configs: a name or a flat `[x1, y1, x2, y2]` array
#[derive(Deserialize)]
#[serde(untagged)]
enum EasingRepr {
    Name(String),
    Timing(Vec<f32>),
}

impl TryFrom<EasingRepr> for Easing {
    type Error = ConfigError;

    fn try_from(repr: EasingRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            EasingRepr::Name(name) => name.parse(),
            EasingRepr::Timing(timing) => TimingCurve::from_timing(&timing).map(Easing::from),
        }
    }
}

impl<'de> Deserialize<'de> for TimingCurve {
    /// Accepts `[x1, y1, x2, y2]` or `[[x, y], ...]`
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum CurveRepr {
            Flat(Vec<f32>),
            Points(Vec<[f32; 2]>),
        }

        let curve = match CurveRepr::deserialize(deserializer)? {
            CurveRepr::Flat(timing) => TimingCurve::from_timing(&timing),
            CurveRepr::Points(points) => TimingCurve::from_points(&points),
        };
        curve.map_err(serde::de::Error::custom)
    }
}

#[inline]
fn in_only(t: f32, f: impl Fn(f32) -> f32) -> f32 {
    f(t)
}

/// Mirror an ease-in into an ease-out
#[inline]
fn out_of(t: f32, f: impl Fn(f32) -> f32) -> f32 {
    1.0 - f(1.0 - t)
}

/// Join an ease-in and its mirror at t = 0.5
#[inline]
fn in_out(t: f32, f: impl Fn(f32) -> f32) -> f32 {
    if t < 0.5 {
        f(2.0 * t) * 0.5
    } else {
        1.0 - f(2.0 - 2.0 * t) * 0.5
    }
}

fn expo_in(t: f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else {
        2.0_f32.powf(10.0 * (t - 1.0))
    }
}

fn elastic_in(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    -(2.0_f32.powf(10.0 * (t - 1.0))) * ((t - 1.1) * 5.0 * std::f32::consts::PI).sin()
}

fn back_in(t: f32, s: f32) -> f32 {
    t * t * ((s + 1.0) * t - s)
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984375
    }
}
