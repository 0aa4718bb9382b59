//! Track animation: camera motion along a geographic path
//!
//! Elapsed time maps through the timing curve to a fraction of the total
//! path length. The position is interpolated inside the segment holding that
//! distance, and the heading turns towards the segment's bearing no faster
//! than the configured rotation speed.

use crate::easing::TimingCurve;
use crate::tween::{validate_duration, Tween, TweenState};
use geoflux_core::geo::{angle_delta, normalize_degrees};
use geoflux_core::{CameraState, Completion, ConfigError, LngLat, Result};
use serde::Deserialize;
use std::fmt;

fn default_rotation_speed() -> f32 {
    180.0
}

/// Track animation configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackConfig {
    pub path: Vec<LngLat>,
    /// Duration in milliseconds
    pub duration: f32,
    /// Speed profile over the path
    #[serde(default)]
    pub timing: TimingCurve,
    /// Maximum heading change in degrees per second
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f32,
}

impl TrackConfig {
    pub fn new(path: Vec<LngLat>, duration: f32) -> Self {
        Self {
            path,
            duration,
            timing: TimingCurve::LINEAR,
            rotation_speed: default_rotation_speed(),
        }
    }

    /// Builder: set the speed profile
    pub fn timing(mut self, timing: TimingCurve) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set the rotation speed cap
    pub fn rotation_speed(mut self, degrees_per_second: f32) -> Self {
        self.rotation_speed = degrees_per_second;
        self
    }
}

/// Output of one track advance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackFrame {
    pub position: LngLat,
    /// Degrees clockwise from north
    pub heading: f32,
    pub just_completed: bool,
}

impl TrackFrame {
    /// Camera looking along the heading from the current position
    pub fn apply(&self, camera: &mut CameraState) {
        camera.center = self.position;
        camera.rotation = self.heading;
    }
}

/// Follows a polyline with a rate-limited heading
pub struct PathFollower {
    path: Vec<LngLat>,
    /// Distance from the first vertex to each vertex, meters
    cumulative: Vec<f64>,
    /// Bearing per segment; zero-length segments inherit a neighbor's
    bearings: Vec<f32>,
    total_m: f64,
    progress: Tween<f32>,
    rotation_speed: f32,
    heading: Option<f32>,
    on_complete: Option<Completion>,
}

impl PathFollower {
    pub fn new(config: TrackConfig, on_complete: Option<Completion>) -> Result<Self> {
        let TrackConfig {
            path,
            duration,
            timing,
            rotation_speed,
        } = config;

        if path.len() < 2 {
            return Err(ConfigError::PathTooShort(path.len()));
        }
        validate_duration(duration)?;
        if !rotation_speed.is_finite() || rotation_speed <= 0.0 {
            return Err(ConfigError::InvalidRotationSpeed(rotation_speed));
        }

        let mut cumulative = Vec::with_capacity(path.len());
        cumulative.push(0.0);
        for pair in path.windows(2) {
            let last = cumulative[cumulative.len() - 1];
            cumulative.push(last + pair[0].distance_to(&pair[1]));
        }
        let total_m = cumulative[cumulative.len() - 1];
        if !(total_m > 0.0) {
            return Err(ConfigError::DegeneratePath);
        }

        let bearings = segment_bearings(&path, &cumulative);
        let progress = Tween::new(0.0, 1.0, duration)?.easing(timing);

        tracing::debug!(
            vertices = path.len(),
            length_m = total_m,
            duration_ms = duration,
            "track animation configured"
        );

        Ok(Self {
            path,
            cumulative,
            bearings,
            total_m,
            progress,
            rotation_speed,
            heading: None,
            on_complete,
        })
    }

    /// Advance by `dt_ms`; starts on the first call
    pub fn advance(&mut self, dt_ms: f32) -> TrackFrame {
        if self.progress.state() == TweenState::Pending {
            self.progress.start();
        }
        let moving = self.progress.is_running();
        let frame = self.progress.advance(dt_ms);

        let distance = frame.value as f64 * self.total_m;
        let (position, segment) = self.locate(distance);
        let target = self.bearings[segment];

        let heading = match self.heading {
            None => target,
            Some(current) if moving => {
                let max_step = self.rotation_speed * dt_ms.max(0.0) / 1000.0;
                rotate_towards(current, target, max_step)
            }
            Some(current) => current,
        };
        self.heading = Some(heading);

        TrackFrame {
            position,
            heading,
            just_completed: frame.just_completed,
        }
    }

    /// Position and segment index at a distance along the path
    fn locate(&self, distance: f64) -> (LngLat, usize) {
        let last_segment = self.path.len() - 2;
        let segment = self
            .cumulative
            .partition_point(|&c| c <= distance)
            .saturating_sub(1)
            .min(last_segment);

        let seg_start = self.cumulative[segment];
        let seg_len = self.cumulative[segment + 1] - seg_start;
        let local = if seg_len > 0.0 {
            ((distance - seg_start) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };

        (
            self.path[segment].lerp(&self.path[segment + 1], local),
            segment,
        )
    }

    pub fn pause(&mut self) {
        self.progress.pause();
    }

    pub fn resume(&mut self) {
        self.progress.resume();
    }

    /// Stop without invoking the callback
    pub fn cancel(&mut self) {
        self.progress.stop();
        self.on_complete = None;
    }

    pub fn is_paused(&self) -> bool {
        self.progress.state() == TweenState::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.progress.is_completed()
    }

    pub fn heading(&self) -> Option<f32> {
        self.heading
    }

    pub fn length_m(&self) -> f64 {
        self.total_m
    }

    /// Hand out the callback once the track completed naturally
    pub fn take_on_complete(&mut self) -> Option<Completion> {
        if self.is_finished() {
            self.on_complete.take()
        } else {
            None
        }
    }
}

impl fmt::Debug for PathFollower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFollower")
            .field("vertices", &self.path.len())
            .field("length_m", &self.total_m)
            .field("progress", &self.progress.progress())
            .field("heading", &self.heading)
            .finish()
    }
}

fn segment_bearings(path: &[LngLat], cumulative: &[f64]) -> Vec<f32> {
    let mut bearings: Vec<Option<f32>> = path
        .windows(2)
        .zip(cumulative.windows(2))
        .map(|(pts, dist)| (dist[1] > dist[0]).then(|| pts[0].bearing_to(&pts[1]) as f32))
        .collect();

    // Zero-length segments keep the heading of the segment before them, or
    // the first real segment when they lead the path
    let first = bearings.iter().flatten().copied().next().unwrap_or(0.0);
    let mut previous = first;
    for bearing in &mut bearings {
        match bearing {
            Some(b) => previous = *b,
            None => *bearing = Some(previous),
        }
    }
    bearings.into_iter().map(|b| b.unwrap_or(first)).collect()
}

/// Turn `current` towards `target` by at most `max_step` degrees
fn rotate_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = angle_delta(current as f64, target as f64) as f32;
    if delta.abs() <= max_step {
        target
    } else {
        normalize_degrees((current + max_step * delta.signum()) as f64) as f32
    }
}
