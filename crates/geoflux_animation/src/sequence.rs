//! Camera animation sequences
//!
//! A sequence is an ordered list of camera steps. Each step animates up to
//! four camera properties concurrently; the next step begins only when every
//! property of the current one has completed. Leftover time from the tick in
//! which a step ends carries into the next step.

use crate::easing::TimingCurve;
use crate::tween::{validate_duration, Interpolate, Tween};
use geoflux_core::{CameraState, Completion, LngLat, Result};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use std::collections::VecDeque;
use std::fmt;

/// A property value that can appear as a control point in step JSON
pub trait ControlPoint: Sized {
    type Repr: DeserializeOwned;

    fn from_repr(repr: Self::Repr) -> std::result::Result<Self, String>;
}

impl ControlPoint for LngLat {
    type Repr = LngLat;

    fn from_repr(repr: LngLat) -> std::result::Result<Self, String> {
        Ok(repr)
    }
}

/// Scalar control: a bare value or a `[t, value]` pair
#[derive(Deserialize)]
#[serde(untagged)]
pub enum ScalarControl {
    Value(f32),
    Point(Vec<f32>),
}

impl ControlPoint for f32 {
    type Repr = ScalarControl;

    fn from_repr(repr: ScalarControl) -> std::result::Result<Self, String> {
        match repr {
            ScalarControl::Value(v) => Ok(v),
            ScalarControl::Point(point) => match point.as_slice() {
                [v] | [_, v] => Ok(*v),
                _ => Err(format!(
                    "scalar control point must be [t, value], got {} numbers",
                    point.len()
                )),
            },
        }
    }
}

fn deserialize_controls<'de, D, V>(deserializer: D) -> std::result::Result<Vec<V>, D::Error>
where
    D: Deserializer<'de>,
    V: ControlPoint,
{
    Vec::<V::Repr>::deserialize(deserializer)?
        .into_iter()
        .map(|repr| V::from_repr(repr).map_err(de::Error::custom))
        .collect()
}

/// Animation of one camera property inside a step
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound(deserialize = "V: Deserialize<'de> + ControlPoint"))]
pub struct PropertyAnimate<V> {
    /// Value at the end of the step
    pub value: V,
    /// Bezier control points the value travels through
    #[serde(default, deserialize_with = "deserialize_controls")]
    pub control: Vec<V>,
    /// Timing curve over the step duration
    #[serde(default)]
    pub timing: TimingCurve,
    /// Duration in milliseconds
    pub duration: f32,
}

impl<V: Interpolate> PropertyAnimate<V> {
    pub fn new(value: V, duration: f32) -> Self {
        Self {
            value,
            control: Vec::new(),
            timing: TimingCurve::LINEAR,
            duration,
        }
    }

    /// Builder: set the timing curve
    pub fn timing(mut self, timing: TimingCurve) -> Self {
        self.timing = timing;
        self
    }

    /// Builder: set Bezier control points
    pub fn control(mut self, control: impl IntoIterator<Item = V>) -> Self {
        self.control = control.into_iter().collect();
        self
    }

    /// Build the pending tween; the start value is filled in on activation
    fn prepare(&self) -> Result<Tween<V>> {
        validate_duration(self.duration)?;
        Ok(Tween::new(self.value.clone(), self.value.clone(), self.duration)?
            .easing(self.timing)
            .controls(self.control.iter().cloned()))
    }
}

/// One group of concurrently animated camera properties
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CameraStep {
    pub center: Option<PropertyAnimate<LngLat>>,
    pub pitch: Option<PropertyAnimate<f32>>,
    pub zoom: Option<PropertyAnimate<f32>>,
    pub rotation: Option<PropertyAnimate<f32>>,
}

impl CameraStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: animate the center
    pub fn center(mut self, animate: PropertyAnimate<LngLat>) -> Self {
        self.center = Some(animate);
        self
    }

    /// Builder: animate the pitch
    pub fn pitch(mut self, animate: PropertyAnimate<f32>) -> Self {
        self.pitch = Some(animate);
        self
    }

    /// Builder: animate the zoom
    pub fn zoom(mut self, animate: PropertyAnimate<f32>) -> Self {
        self.zoom = Some(animate);
        self
    }

    /// Builder: animate the rotation
    pub fn rotation(mut self, animate: PropertyAnimate<f32>) -> Self {
        self.rotation = Some(animate);
        self
    }

    fn prepare(&self) -> Result<PreparedStep> {
        Ok(PreparedStep {
            center: self.center.as_ref().map(PropertyAnimate::prepare).transpose()?,
            pitch: self.pitch.as_ref().map(PropertyAnimate::prepare).transpose()?,
            zoom: self.zoom.as_ref().map(PropertyAnimate::prepare).transpose()?,
            rotation: self.rotation.as_ref().map(PropertyAnimate::prepare).transpose()?,
        })
    }
}

/// A validated step whose tweens wait for their start values
#[derive(Debug)]
struct PreparedStep {
    center: Option<Tween<LngLat>>,
    pitch: Option<Tween<f32>>,
    zoom: Option<Tween<f32>>,
    rotation: Option<Tween<f32>>,
}

impl PreparedStep {
    /// Start every tween from the camera's current values
    fn begin(&mut self, camera: &CameraState) {
        fn begin_one<V: Interpolate>(tween: &mut Option<Tween<V>>, current: V) {
            if let Some(tween) = tween {
                tween.set_start_value(current);
                tween.start();
            }
        }

        begin_one(&mut self.center, camera.center);
        begin_one(&mut self.pitch, camera.pitch);
        begin_one(&mut self.zoom, camera.zoom);
        begin_one(&mut self.rotation, camera.rotation);
    }

    /// Advance all tweens; returns the leftover time once the whole step is done
    fn advance(&mut self, dt_ms: f32) -> Option<f32> {
        fn advance_one<V: Interpolate>(tween: &mut Option<Tween<V>>, dt_ms: f32, min: &mut f32) {
            if let Some(tween) = tween {
                let frame = tween.advance(dt_ms);
                if frame.just_completed {
                    *min = min.min(frame.overflow_ms);
                }
            }
        }

        let mut leftover = f32::INFINITY;
        advance_one(&mut self.center, dt_ms, &mut leftover);
        advance_one(&mut self.pitch, dt_ms, &mut leftover);
        advance_one(&mut self.zoom, dt_ms, &mut leftover);
        advance_one(&mut self.rotation, dt_ms, &mut leftover);

        if !self.is_done() {
            return None;
        }
        // A step with no properties (or none finishing now) consumes nothing
        Some(if leftover.is_finite() { leftover } else { dt_ms })
    }

    /// Omitted properties count as done
    fn is_done(&self) -> bool {
        self.center.as_ref().map_or(true, Tween::is_completed)
            && self.pitch.as_ref().map_or(true, Tween::is_completed)
            && self.zoom.as_ref().map_or(true, Tween::is_completed)
            && self.rotation.as_ref().map_or(true, Tween::is_completed)
    }

    fn apply(&self, camera: &mut CameraState) {
        if let Some(t) = &self.center {
            camera.center = t.value();
        }
        if let Some(t) = &self.pitch {
            camera.pitch = t.value();
        }
        if let Some(t) = &self.zoom {
            camera.zoom = t.value();
        }
        if let Some(t) = &self.rotation {
            camera.rotation = t.value();
        }
    }

    fn pause(&mut self) {
        self.for_each_control(Tween::pause, Tween::pause);
    }

    fn resume(&mut self) {
        self.for_each_control(Tween::resume, Tween::resume);
    }

    fn for_each_control(
        &mut self,
        center: impl Fn(&mut Tween<LngLat>),
        scalar: impl Fn(&mut Tween<f32>),
    ) {
        if let Some(t) = &mut self.center {
            center(t);
        }
        for t in [&mut self.pitch, &mut self.zoom, &mut self.rotation]
            .into_iter()
            .flatten()
        {
            scalar(t);
        }
    }
}

/// Output of one sequence advance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SequenceFrame {
    /// Camera to push, `None` when nothing moved
    pub camera: Option<CameraState>,
    /// True on the frame the last step completed
    pub finished: bool,
}

/// Ordered camera steps with a single terminal callback
pub struct AnimationSequence {
    pending: VecDeque<PreparedStep>,
    active: Option<PreparedStep>,
    paused: bool,
    finished: bool,
    on_complete: Option<Completion>,
}

impl AnimationSequence {
    /// Validate every step up front; nothing is queued on error
    pub fn new(steps: &[CameraStep], on_complete: Option<Completion>) -> Result<Self> {
        let mut sequence = Self {
            pending: VecDeque::with_capacity(steps.len()),
            active: None,
            paused: false,
            finished: false,
            on_complete,
        };
        sequence.add_steps(steps)?;
        Ok(sequence)
    }

    /// Append steps after the ones already queued
    pub fn add_steps(&mut self, steps: &[CameraStep]) -> Result<()> {
        let prepared = steps
            .iter()
            .map(CameraStep::prepare)
            .collect::<Result<Vec<_>>>()?;
        self.pending.extend(prepared);
        Ok(())
    }

    /// Advance by `dt_ms`, starting from the host's current camera
    pub fn advance(&mut self, dt_ms: f32, base: CameraState) -> SequenceFrame {
        if self.finished || self.paused {
            return SequenceFrame {
                camera: None,
                finished: false,
            };
        }

        let mut camera = base;
        let mut remaining = dt_ms;
        loop {
            if self.active.is_none() {
                match self.pending.pop_front() {
                    Some(mut step) => {
                        step.begin(&camera);
                        self.active = Some(step);
                    }
                    None => {
                        self.finished = true;
                        return SequenceFrame {
                            camera: Some(camera),
                            finished: true,
                        };
                    }
                }
            }

            let Some(step) = self.active.as_mut() else {
                break;
            };
            let leftover = step.advance(remaining);
            step.apply(&mut camera);

            match leftover {
                Some(left) => {
                    self.active = None;
                    remaining = left;
                }
                None => break,
            }
        }

        SequenceFrame {
            camera: Some(camera),
            finished: false,
        }
    }

    /// Pause the active step's running tweens; no-op when already paused
    pub fn pause(&mut self) {
        if self.paused || self.finished {
            return;
        }
        self.paused = true;
        if let Some(step) = &mut self.active {
            step.pause();
        }
    }

    /// Resume after `pause`; no-op when not paused
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        if let Some(step) = &mut self.active {
            step.resume();
        }
    }

    /// Drop all steps without invoking the callback
    pub fn clear(&mut self) {
        self.pending.clear();
        self.active = None;
        self.on_complete = None;
        self.finished = true;
    }

    /// Hand out the terminal callback once the sequence finished naturally
    pub fn take_on_complete(&mut self) -> Option<Completion> {
        if self.finished {
            self.on_complete.take()
        } else {
            None
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Steps not yet completed, including the active one
    pub fn remaining_steps(&self) -> usize {
        self.pending.len() + usize::from(self.active.is_some())
    }
}

impl fmt::Debug for AnimationSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSequence")
            .field("remaining_steps", &self.remaining_steps())
            .field("paused", &self.paused)
            .field("finished", &self.finished)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}
