//! Camera view state

use crate::geo::LngLat;
use serde::{Deserialize, Serialize};

/// The host map's view state as seen by camera animations
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f32,
    /// Tilt in degrees (0 = looking straight down)
    pub pitch: f32,
    /// Rotation in degrees clockwise from north
    pub rotation: f32,
}

impl CameraState {
    pub fn new(center: LngLat, zoom: f32) -> Self {
        Self {
            center,
            zoom,
            ..Default::default()
        }
    }

    /// Builder: set pitch
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Builder: set rotation
    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            center: LngLat::default(),
            zoom: 10.0,
            pitch: 0.0,
            rotation: 0.0,
        }
    }
}
