//! Single-property tweens
//!
//! A tween interpolates one value over a fixed duration. The eased progress
//! comes from an [`Easing`]; the value travels along a straight line from
//! start to end, or along a value-space Bezier when control points are given.

use crate::easing::Easing;
use geoflux_core::{Color, ConfigError, LngLat, Result};
use smallvec::SmallVec;

/// Values a tween can interpolate
pub trait Interpolate: Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolate for [f32; 2] {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        [
            self[0] + (other[0] - self[0]) * t,
            self[1] + (other[1] - self[1]) * t,
        ]
    }
}

impl Interpolate for LngLat {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        LngLat::lerp(self, other, t as f64)
    }
}

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::rgba(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

/// Lifecycle of a tween
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TweenState {
    /// Configured but not started
    #[default]
    Pending,
    Running,
    Paused,
    Completed,
}

/// Playback direction across iterations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayDirection {
    /// Every iteration runs start -> end
    #[default]
    Forward,
    /// Iterations alternate start -> end, end -> start (yoyo)
    Alternate,
}

/// Result of advancing a tween by one frame
#[derive(Clone, Debug, PartialEq)]
pub struct TweenFrame<V> {
    pub value: V,
    /// True only on the frame the tween reached Completed
    pub just_completed: bool,
    /// Part of the frame's delta left over after completion
    pub overflow_ms: f32,
}

/// Validate an animation duration in milliseconds
pub fn validate_duration(duration_ms: f32) -> Result<f32> {
    if duration_ms.is_finite() && duration_ms > 0.0 {
        Ok(duration_ms)
    } else {
        Err(ConfigError::InvalidDuration(duration_ms))
    }
}

/// A time-bounded interpolation of one value
#[derive(Clone, Debug)]
pub struct Tween<V: Interpolate> {
    start: V,
    end: V,
    /// Value-space Bezier control points between start and end
    controls: SmallVec<[V; 2]>,
    easing: Easing,
    duration_ms: f32,
    elapsed_ms: f32,
    state: TweenState,
    direction: PlayDirection,
    /// Number of iterations (-1 for infinite)
    iterations: i32,
    current_iteration: i32,
    /// Whether the current iteration plays end -> start
    reversed: bool,
}

impl<V: Interpolate> Tween<V> {
    /// Create a pending tween; durations <= 0 are rejected
    pub fn new(start: V, end: V, duration_ms: f32) -> Result<Self> {
        Ok(Self {
            start,
            end,
            controls: SmallVec::new(),
            easing: Easing::Linear,
            duration_ms: validate_duration(duration_ms)?,
            elapsed_ms: 0.0,
            state: TweenState::Pending,
            direction: PlayDirection::Forward,
            iterations: 1,
            current_iteration: 0,
            reversed: false,
        })
    }

    /// Builder: set the easing
    pub fn easing(mut self, easing: impl Into<Easing>) -> Self {
        self.easing = easing.into();
        self
    }

    /// Builder: route the value through Bezier control points
    pub fn controls(mut self, controls: impl IntoIterator<Item = V>) -> Self {
        self.controls = controls.into_iter().collect();
        self
    }

    /// Builder: alternate endpoints forever until stopped
    pub fn yoyo(mut self) -> Self {
        self.direction = PlayDirection::Alternate;
        self.iterations = -1;
        self
    }

    /// Builder: set number of iterations (-1 for infinite)
    pub fn iterations(mut self, count: i32) -> Self {
        self.iterations = count;
        self
    }

    /// Builder: start immediately
    pub fn started(mut self) -> Self {
        self.start();
        self
    }

    /// Replace the start value, e.g. with the live value when a queued tween begins
    pub fn set_start_value(&mut self, start: V) {
        self.start = start;
    }

    /// Start (or restart) from the beginning
    pub fn start(&mut self) {
        self.elapsed_ms = 0.0;
        self.current_iteration = 0;
        self.reversed = false;
        self.state = TweenState::Running;
    }

    /// Freeze elapsed time; no-op unless running
    pub fn pause(&mut self) {
        if self.state == TweenState::Running {
            self.state = TweenState::Paused;
        }
    }

    /// Continue from the frozen elapsed time; no-op unless paused
    pub fn resume(&mut self) {
        if self.state == TweenState::Paused {
            self.state = TweenState::Running;
        }
    }

    /// End the tween where it is, without reporting completion
    pub fn stop(&mut self) {
        self.state = TweenState::Completed;
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TweenState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state == TweenState::Completed
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }

    pub fn start_value(&self) -> &V {
        &self.start
    }

    pub fn end_value(&self) -> &V {
        &self.end
    }

    /// Raw progress of the current iteration (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Current interpolated value
    pub fn value(&self) -> V {
        let progress = self.progress();
        let progress = if self.reversed {
            1.0 - progress
        } else {
            progress
        };
        self.interpolate(self.easing.apply(progress))
    }

    /// Advance by `dt_ms` milliseconds
    pub fn advance(&mut self, dt_ms: f32) -> TweenFrame<V> {
        if self.state != TweenState::Running || !dt_ms.is_finite() {
            return self.frame(false, 0.0);
        }

        self.elapsed_ms += dt_ms.max(0.0);
        if self.elapsed_ms < self.duration_ms {
            return self.frame(false, 0.0);
        }

        let cycles = (self.elapsed_ms / self.duration_ms).floor();
        // Iterations left including the current one
        let remaining = if self.iterations < 0 {
            f32::INFINITY
        } else {
            (self.iterations - self.current_iteration) as f32
        };

        if cycles < remaining {
            if self.iterations >= 0 {
                self.current_iteration += cycles as i32;
            }
            self.elapsed_ms -= cycles * self.duration_ms;
            if self.direction == PlayDirection::Alternate && (cycles as u64) % 2 == 1 {
                self.reversed = !self.reversed;
            }
            return self.frame(false, 0.0);
        }

        let consumed = remaining.max(1.0);
        if self.direction == PlayDirection::Alternate && (consumed as u64 - 1) % 2 == 1 {
            self.reversed = !self.reversed;
        }
        let overflow = self.elapsed_ms - consumed * self.duration_ms;
        self.elapsed_ms = self.duration_ms;
        self.current_iteration = self.iterations.max(1);
        self.state = TweenState::Completed;
        self.frame(true, overflow.max(0.0))
    }

    fn frame(&self, just_completed: bool, overflow_ms: f32) -> TweenFrame<V> {
        TweenFrame {
            value: self.value(),
            just_completed,
            overflow_ms,
        }
    }

    fn interpolate(&self, t: f32) -> V {
        if self.controls.is_empty() {
            return self.start.lerp(&self.end, t);
        }

        // de Casteljau over start, controls..., end
        let mut points: SmallVec<[V; 4]> = SmallVec::with_capacity(self.controls.len() + 2);
        points.push(self.start.clone());
        points.extend(self.controls.iter().cloned());
        points.push(self.end.clone());

        let n = points.len();
        for level in 1..n {
            for i in 0..n - level {
                points[i] = points[i].lerp(&points[i + 1], t);
            }
        }
        points.swap_remove(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::TimingCurve;

    fn linear(start: f32, end: f32, duration: f32) -> Tween<f32> {
        Tween::new(start, end, duration).unwrap().started()
    }

    #[test]
    fn test_linear_midpoint() {
        let mut tween = linear(0.0, 100.0, 1000.0);
        let frame = tween.advance(500.0);
        assert!((frame.value - 50.0).abs() < 1e-4);
        assert!(!frame.just_completed);
    }

    #[test]
    fn test_zero_advance_yields_start() {
        let mut tween = Tween::new(3.0, 9.0, 400.0)
            .unwrap()
            .easing(TimingCurve::cubic(0.42, 0.0, 0.58, 1.0).unwrap())
            .started();
        assert_eq!(tween.advance(0.0).value, 3.0);
    }

    #[test]
    fn test_completes_exactly_once() {
        let mut tween = Tween::new(0.0, 10.0, 300.0)
            .unwrap()
            .easing(Easing::CubicInOut)
            .started();

        let mut completions = 0;
        let mut last = 0.0;
        for _ in 0..10 {
            let frame = tween.advance(100.0);
            if frame.just_completed {
                completions += 1;
            }
            last = frame.value;
        }

        assert_eq!(completions, 1);
        assert!((last - 10.0).abs() < 1e-4);
        assert!(tween.is_completed());
    }

    #[test]
    fn test_overflow_reported_on_completion() {
        let mut tween = linear(0.0, 1.0, 100.0);
        let frame = tween.advance(130.0);
        assert!(frame.just_completed);
        assert!((frame.overflow_ms - 30.0).abs() < 1e-4);
        assert_eq!(frame.value, 1.0);
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        assert_eq!(
            Tween::new(0.0f32, 1.0, 0.0).unwrap_err(),
            ConfigError::InvalidDuration(0.0)
        );
        assert!(Tween::new(0.0f32, 1.0, -5.0).is_err());
        assert!(Tween::new(0.0f32, 1.0, f32::NAN).is_err());
    }

    #[test]
    fn test_pending_does_not_advance() {
        let mut tween = Tween::new(0.0f32, 1.0, 100.0).unwrap();
        assert_eq!(tween.state(), TweenState::Pending);
        assert_eq!(tween.advance(50.0).value, 0.0);
        assert_eq!(tween.elapsed_ms(), 0.0);
    }

    #[test]
    fn test_pause_freezes_and_resume_continues() {
        let mut tween = linear(0.0, 100.0, 1000.0);
        tween.advance(250.0);
        tween.pause();

        for _ in 0..5 {
            assert!((tween.advance(100.0).value - 25.0).abs() < 1e-4);
        }

        tween.resume();
        assert!((tween.advance(250.0).value - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_control_calls_in_wrong_state_are_noops() {
        let mut tween = linear(0.0, 1.0, 100.0);
        tween.resume();
        assert_eq!(tween.state(), TweenState::Running);
        tween.pause();
        tween.pause();
        assert_eq!(tween.state(), TweenState::Paused);

        let mut pending = Tween::new(0.0f32, 1.0, 100.0).unwrap();
        pending.pause();
        assert_eq!(pending.state(), TweenState::Pending);
    }

    #[test]
    fn test_yoyo_alternates_until_stopped() {
        let mut tween = linear(0.0, 10.0, 100.0).yoyo();
        tween.start();

        // Value at D equals value at 0 of the reversed cycle
        let frame = tween.advance(100.0);
        assert!(!frame.just_completed);
        assert!((frame.value - 10.0).abs() < 1e-4);
        assert!(tween.is_reversed());

        assert!((tween.advance(50.0).value - 5.0).abs() < 1e-4);
        assert!((tween.advance(50.0).value - 0.0).abs() < 1e-4);
        assert!(!tween.is_reversed());

        for _ in 0..100 {
            assert!(!tween.advance(37.0).just_completed);
        }

        tween.stop();
        assert!(tween.is_completed());
    }

    #[test]
    fn test_large_delta_wraps_yoyo_cycles() {
        let mut tween = linear(0.0, 10.0, 100.0).yoyo();
        tween.start();
        // 3.5 cycles: forward, back, forward, half of back
        let frame = tween.advance(350.0);
        assert!(tween.is_reversed());
        assert!((frame.value - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_finite_iterations() {
        let mut tween = linear(0.0, 1.0, 100.0).iterations(3);
        tween.start();
        assert!(!tween.advance(250.0).just_completed);
        let frame = tween.advance(80.0);
        assert!(frame.just_completed);
        assert!((frame.overflow_ms - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_control_points_bend_the_path() {
        let mut tween = Tween::new(LngLat::new(0.0, 0.0), LngLat::new(2.0, 0.0), 1000.0)
            .unwrap()
            .controls([LngLat::new(1.0, 2.0)])
            .started();

        let mid = tween.advance(500.0).value;
        assert!((mid.lng - 1.0).abs() < 1e-6);
        // Quadratic Bezier midpoint: 0.25*0 + 0.5*2 + 0.25*0
        assert!((mid.lat - 1.0).abs() < 1e-6);

        let end = tween.advance(500.0).value;
        assert_eq!(end, LngLat::new(2.0, 0.0));
    }

    #[test]
    fn test_color_tween() {
        let mut tween = Tween::new(Color::BLACK, Color::WHITE, 100.0)
            .unwrap()
            .started();
        let c = tween.advance(50.0).value;
        assert!((c.r - 0.5).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }
}
