//! Scenario definition for headless animation runs.

use crate::layer::Layer;
use anyhow::Result;
use geoflux_animation::{CameraStep, FeatureAnimateConfig, TrackConfig};
use geoflux_core::{
    CameraState, Color, Feature, Light, LngLat, StyleKey, StyleProperty, StyleValue,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;

/// Initial scene plus the steps to run against it.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadlessScenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub camera: CameraState,
    #[serde(default)]
    pub lights: Vec<Light>,
    #[serde(default)]
    pub layers: Vec<LayerSpec>,
    pub steps: Vec<ScenarioStep>,
}

impl HeadlessScenario {
    /// Load a scenario from JSON text.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a scenario from file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

fn default_opacity() -> f32 {
    1.0
}

/// A layer to create before the steps run.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    #[serde(flatten)]
    pub source: SourceSpec,
    #[serde(default)]
    pub styles: FxHashMap<StyleKey, StyleSpec>,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub continuous: bool,
}

impl LayerSpec {
    pub fn build(&self) -> Layer {
        let mut layer = Layer::new(self.name.clone())
            .with_features(self.source.features())
            .with_opacity(self.opacity)
            .continuous(self.continuous);
        for (key, style) in &self.styles {
            layer.set_style(*key, style.to_property());
        }
        layer
    }
}

/// Feature data: explicit features, or `count` placeholder points.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSpec {
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub count: usize,
}

impl SourceSpec {
    pub fn features(&self) -> Vec<Feature> {
        if self.features.is_empty() {
            return vec![Feature::default(); self.count];
        }
        self.features.iter().map(FeatureSpec::to_feature).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureSpec {
    #[serde(default)]
    pub position: Option<LngLat>,
    #[serde(default)]
    pub properties: FxHashMap<String, f64>,
}

impl FeatureSpec {
    pub fn to_feature(&self) -> Feature {
        let mut feature = Feature {
            position: self.position,
            ..Default::default()
        };
        let mut properties: Vec<_> = self.properties.iter().collect();
        properties.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in properties {
            feature = feature.with_property(name.clone(), *value);
        }
        feature
    }
}

/// Constant base style of a scenario layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StyleSpec {
    Number(f32),
    Offset([f32; 2]),
    Color(Color),
}

impl StyleSpec {
    pub fn to_property(&self) -> StyleProperty {
        match self {
            StyleSpec::Number(v) => StyleProperty::Number(StyleValue::Constant(*v)),
            StyleSpec::Offset(v) => StyleProperty::Offset(StyleValue::Constant(*v)),
            StyleSpec::Color(v) => StyleProperty::Color(StyleValue::Constant(*v)),
        }
    }
}

fn default_tolerance() -> f64 {
    1e-3
}

/// Scenario steps.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Queue camera steps
    Animate { steps: Vec<CameraStep> },
    /// Queue a camera track
    Track { track: TrackConfig },
    ClearAnimates,
    PauseAnimate,
    ResumeAnimate,
    /// Animate a style key of a layer
    LayerAnimate {
        layer: String,
        animate: FeatureAnimateConfig,
    },
    ShowLayer {
        layer: String,
        #[serde(default)]
        duration: Option<f32>,
    },
    HideLayer {
        layer: String,
        #[serde(default)]
        duration: Option<f32>,
    },
    /// Swap a layer's features; its animations are dropped
    SetSource {
        layer: String,
        #[serde(default)]
        features: Vec<FeatureSpec>,
        #[serde(default)]
        count: usize,
    },
    RemoveLayer { layer: String },
    Start,
    Pause,
    Resume,
    Stop,
    Wait { ms: u64 },
    Tick { frames: u32 },
    AssertCamera {
        #[serde(default)]
        center: Option<LngLat>,
        #[serde(default)]
        zoom: Option<f32>,
        #[serde(default)]
        pitch: Option<f32>,
        #[serde(default)]
        rotation: Option<f32>,
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
    AssertStyle {
        layer: String,
        index: usize,
        key: StyleKey,
        value: f32,
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
    AssertVisible { layer: String, visible: bool },
    AssertCompleted { count: usize },
    AssertIdle,
}

impl ScenarioStep {
    /// Whether the step checks state rather than changing it.
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            ScenarioStep::AssertCamera { .. }
                | ScenarioStep::AssertStyle { .. }
                | ScenarioStep::AssertVisible { .. }
                | ScenarioStep::AssertCompleted { .. }
                | ScenarioStep::AssertIdle
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let scenario = HeadlessScenario::from_json(
            r##"{
                "camera": { "center": [116.4, 39.9], "zoom": 4 },
                "lights": [{ "type": "ambient", "color": "#ffffff", "intensity": 0.6 }],
                "layers": [
                    { "name": "dots", "count": 3, "styles": { "radius": 10, "color": "#ff0000" } },
                    {
                        "name": "sites",
                        "features": [{ "position": [116.0, 40.0], "properties": { "mag": 2 } }]
                    }
                ],
                "steps": [
                    { "type": "animate", "steps": [{ "zoom": { "value": 10, "duration": 500 } }] },
                    { "type": "layer_animate", "layer": "dots",
                      "animate": { "key": "radius", "value": [0, 1], "duration": 300 } },
                    { "type": "set_source", "layer": "dots", "count": 5 },
                    { "type": "wait", "ms": 500 },
                    { "type": "assert_camera", "zoom": 10 },
                    { "type": "assert_idle" }
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(scenario.camera.zoom, 4.0);
        assert_eq!(scenario.lights.len(), 1);

        let dots = scenario.layers[0].build();
        assert_eq!(dots.feature_count(), 3);
        assert!(dots.style(StyleKey::Radius).is_some());
        assert!(dots.style(StyleKey::Color).is_some());

        let sites = scenario.layers[1].build();
        assert_eq!(sites.features()[0].property("mag"), Some(2.0));

        assert_eq!(scenario.steps.len(), 6);
        assert!(matches!(
            &scenario.steps[2],
            ScenarioStep::SetSource { count: 5, .. }
        ));
        assert!(scenario.steps[4].is_assertion());
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(HeadlessScenario::from_json(r#"{ "steps": [{ "type": "teleport" }] }"#).is_err());
    }
}
