//! geoflux Application Container
//!
//! A [`Container`] owns the layers, lights, camera, and the frame driver of
//! one map view. The host render loop calls [`Container::frame`] once per
//! frame and redraws when [`Container::take_render`] says so.
//!
//! # Example
//!
//! ```ignore
//! use geoflux_app::prelude::*;
//!
//! let mut container = Container::default();
//! let dots = container.add_layer(Layer::new("dots").with_features(features))?;
//! container.layer_animate(
//!     dots,
//!     &FeatureAnimateConfig::new(StyleKey::Radius, vec![0.0, 1.0], 1000.0),
//!     None,
//! )?;
//! container.start();
//!
//! loop {
//!     container.frame(now_ms());
//!     if container.take_render() {
//!         draw(container.scene());
//!     }
//! }
//! ```
//!
//! Headless scenario runs (`headless_*` modules) drive a container through
//! a JSON step list with a fixed frame clock and report the outcome.

mod container;
mod error;
mod layer;

pub mod headless_report;
pub mod headless_runner;
pub mod headless_runtime;
pub mod headless_scenario;

pub use container::{Container, LightId, Scene};
pub use error::{ContainerError, Result};
pub use layer::Layer;

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::container::{Container, LightId, Scene};
    pub use crate::error::{ContainerError, Result};
    pub use crate::layer::Layer;

    pub use geoflux_animation::{
        CameraStep, DriverConfig, Easing, FeatureAnimateConfig, PropertyAnimate, TimeRange,
        TimingCurve, TrackConfig,
    };
    pub use geoflux_core::{
        CameraState, Color, Feature, Light, LngLat, StyleKey, StyleProperty, StyleValue,
    };
}
