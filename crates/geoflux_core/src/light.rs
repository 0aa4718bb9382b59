//! Scene lights
//!
//! Lights are a closed set of variants. Shading math lives in the renderer;
//! the container only keeps the list and enforces the single-ambient rule.

use crate::style::Color;
use serde::Deserialize;

/// Light variants accepted by a container
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Light {
    /// Uniform light applied to every lit surface
    Ambient { color: Color, intensity: f32 },
    /// Parallel light shining from `position` towards `target`.
    ///
    /// Positions are `[x, y, height_m]`.
    Directional {
        color: Color,
        intensity: f32,
        position: [f64; 3],
        target: [f64; 3],
    },
    /// Light radiating from a point, fading out over `distance` meters
    Point {
        color: Color,
        intensity: f32,
        position: [f64; 3],
        distance: f64,
    },
}

/// Discriminant of [`Light`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Light::Ambient { color, intensity }
    }

    pub fn kind(&self) -> LightKind {
        match self {
            Light::Ambient { .. } => LightKind::Ambient,
            Light::Directional { .. } => LightKind::Directional,
            Light::Point { .. } => LightKind::Point,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient { intensity, .. }
            | Light::Directional { intensity, .. }
            | Light::Point { intensity, .. } => *intensity,
        }
    }
}
