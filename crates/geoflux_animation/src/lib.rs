//! geoflux Animation System
//!
//! Timing curves, tweens, camera sequences, track following, and per-feature
//! layer animation, all advanced by one frame driver per container.
//!
//! # Features
//!
//! - **Timing Curves**: Bezier easing with 1-6 inner control points, named easings
//! - **Tweens**: Pause/resume, yoyo, iterations, value-space control points
//! - **Camera Sequences**: Gated multi-property steps with one terminal callback
//! - **Track Animation**: Path following with a rate-limited heading
//! - **Feature Animation**: Thousands of features with seeded phase jitter
//! - **Frame Driver**: Clamped deltas, camera before layers, coalesced redraws

pub mod config;
pub mod controller;
pub mod easing;
pub mod fade;
pub mod feature;
pub mod samples;
pub mod scheduler;
pub mod sequence;
pub mod track;
pub mod tween;
pub mod view;

pub use config::DriverConfig;
pub use controller::AnimationController;
pub use easing::{Easing, TimingCurve};
pub use fade::{FadeFrame, LayerFade};
pub use feature::{FeatureAnimateConfig, FeatureAnimationSet, FeatureTrack, TimeRange};
pub use samples::ValueSamples;
pub use scheduler::{DriverState, FrameDriver, LayerAnimations, TickReport};
pub use sequence::{
    AnimationSequence, CameraStep, ControlPoint, PropertyAnimate, ScalarControl, SequenceFrame,
};
pub use track::{PathFollower, TrackConfig, TrackFrame};
pub use tween::{Interpolate, PlayDirection, Tween, TweenFrame, TweenState};
pub use view::{CameraAnimation, CameraChannel};
