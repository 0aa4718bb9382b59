//! geoflux Core
//!
//! Leaf types shared by the animation system and the container:
//!
//! - **Geo math**: `LngLat`, great-circle distance and bearing
//! - **Camera**: the `{center, zoom, pitch, rotation}` view state
//! - **Styles**: closed style keys, colors, constant / per-feature value providers
//! - **Lights**: the closed set of ambient, directional and point lights
//! - **Host traits**: the narrow interfaces the frame driver pushes values through
//! - **Errors**: configuration errors raised synchronously at configuration time

pub mod camera;
pub mod error;
pub mod feature;
pub mod geo;
pub mod host;
pub mod light;
pub mod style;

pub use camera::CameraState;
pub use error::{ConfigError, Result};
pub use feature::Feature;
pub use geo::LngLat;
pub use host::{
    CameraHost, Completion, FeatureStyleSink, FrameHost, LayerId, RenderRequest, RenderTrigger,
};
pub use light::{Light, LightKind};
pub use style::{Color, ResolvedStyle, StyleKey, StyleProperty, StyleValue};
