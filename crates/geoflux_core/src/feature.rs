//! Rendered feature records
//!
//! A layer keeps its features in a stable order; the position in that order
//! is the feature index used by per-feature styles and animations.

use crate::geo::LngLat;
use smallvec::SmallVec;

/// A single feature of a layer's current data
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feature {
    /// Representative position (point, or centroid for areas)
    pub position: Option<LngLat>,
    /// Numeric properties carried over from the data source
    pub properties: SmallVec<[(String, f64); 4]>,
}

impl Feature {
    pub fn at(position: LngLat) -> Self {
        Self {
            position: Some(position),
            properties: SmallVec::new(),
        }
    }

    /// Builder: attach a numeric property
    pub fn with_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.push((name.into(), value));
        self
    }

    /// Look up a numeric property by name
    pub fn property(&self, name: &str) -> Option<f64> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }
}
