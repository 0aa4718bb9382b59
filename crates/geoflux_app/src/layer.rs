//! Layers: feature data, base styles and animation factors
//!
//! A layer keeps its features in a stable order. Base styles are resolved per
//! feature and multiplied by the animation factor the frame driver last
//! stored for that feature (1.0 when no animation touched it).

use geoflux_core::{Feature, ResolvedStyle, StyleKey, StyleProperty};
use rustc_hash::FxHashMap;

/// Layer-wide defaults
pub const DEFAULT_OPACITY: f32 = 1.0;

#[derive(Debug)]
pub struct Layer {
    name: String,
    features: Vec<Feature>,
    styles: FxHashMap<StyleKey, StyleProperty>,
    /// Animation factor per style key, indexed by feature
    factors: FxHashMap<StyleKey, Vec<f32>>,
    opacity: f32,
    /// Opacity shown once visible; fades run towards it
    target_opacity: f32,
    visible: bool,
    z_index: i32,
    zooms: [f32; 2],
    continuous: bool,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
            styles: FxHashMap::default(),
            factors: FxHashMap::default(),
            opacity: DEFAULT_OPACITY,
            target_opacity: DEFAULT_OPACITY,
            visible: true,
            z_index: 0,
            zooms: [2.0, 20.0],
            continuous: false,
        }
    }

    /// Builder: set features
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }

    /// Builder: set a base style
    pub fn with_style(mut self, key: StyleKey, style: StyleProperty) -> Self {
        self.styles.insert(key, style);
        self
    }

    /// Builder: set the initial opacity
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    /// Builder: redraw every frame, e.g. for shader-driven effects
    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Swap the data source. Indices change meaning, so factors reset.
    pub(crate) fn replace_features(&mut self, features: Vec<Feature>) {
        self.features = features;
        self.factors.clear();
    }

    pub fn set_style(&mut self, key: StyleKey, style: StyleProperty) {
        self.styles.insert(key, style);
    }

    pub fn style(&self, key: StyleKey) -> Option<&StyleProperty> {
        self.styles.get(&key)
    }

    /// Store an animation factor; indices past the data are ignored
    pub(crate) fn set_factor(&mut self, index: usize, key: StyleKey, value: f32) {
        if index >= self.features.len() {
            return;
        }
        let count = self.features.len();
        let factors = self.factors.entry(key).or_insert_with(|| vec![1.0; count]);
        if factors.len() < count {
            factors.resize(count, 1.0);
        }
        factors[index] = value;
    }

    /// Current animation factor of one feature
    pub fn factor(&self, key: StyleKey, index: usize) -> f32 {
        self.factors
            .get(&key)
            .and_then(|factors| factors.get(index))
            .copied()
            .unwrap_or(1.0)
    }

    /// Base style of one feature scaled by its animation factor
    pub fn resolve_style(&self, key: StyleKey, index: usize) -> Option<ResolvedStyle> {
        let feature = self.features.get(index)?;
        let base = self.styles.get(&key)?.resolve(index, feature);
        Some(base.scaled(self.factor(key, index)))
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Opacity the layer shows at when fully visible
    pub fn target_opacity(&self) -> f32 {
        self.target_opacity
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.opacity = opacity;
        self.target_opacity = opacity;
    }

    /// Opacity during a fade; the target stays put
    pub(crate) fn set_current_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    pub fn zooms(&self) -> [f32; 2] {
        self.zooms
    }

    pub fn set_zooms(&mut self, zooms: [f32; 2]) {
        self.zooms = zooms;
    }

    /// Whether the layer renders at this zoom level
    pub fn in_zoom_range(&self, zoom: f32) -> bool {
        zoom >= self.zooms[0] && zoom <= self.zooms[1]
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoflux_core::{Color, LngLat, StyleValue};

    fn points(n: usize) -> Vec<Feature> {
        (0..n)
            .map(|i| Feature::at(LngLat::new(i as f64, 0.0)).with_property("mag", i as f64))
            .collect()
    }

    #[test]
    fn test_resolve_scales_by_factor() {
        let mut layer = Layer::new("scatter").with_features(points(3)).with_style(
            StyleKey::Radius,
            StyleProperty::Number(StyleValue::per_feature(|_, f: &Feature| {
                f.property("mag").unwrap_or(0.0) as f32 * 10.0
            })),
        );

        assert_eq!(
            layer.resolve_style(StyleKey::Radius, 2),
            Some(ResolvedStyle::Number(20.0))
        );
        layer.set_factor(2, StyleKey::Radius, 0.5);
        assert_eq!(
            layer.resolve_style(StyleKey::Radius, 2),
            Some(ResolvedStyle::Number(10.0))
        );
        assert_eq!(layer.factor(StyleKey::Radius, 1), 1.0);
        assert_eq!(layer.resolve_style(StyleKey::Radius, 3), None);
        assert_eq!(layer.resolve_style(StyleKey::Height, 0), None);
    }

    #[test]
    fn test_color_factor_fades_alpha() {
        let mut layer = Layer::new("fill").with_features(points(1)).with_style(
            StyleKey::Color,
            StyleProperty::Color(StyleValue::Constant(Color::rgb(1.0, 0.0, 0.0))),
        );
        layer.set_factor(0, StyleKey::Color, 0.25);
        assert_eq!(
            layer.resolve_style(StyleKey::Color, 0),
            Some(ResolvedStyle::Color(Color::rgba(1.0, 0.0, 0.0, 0.25)))
        );
    }

    #[test]
    fn test_source_swap_resets_factors() {
        let mut layer = Layer::new("scatter").with_features(points(2));
        layer.set_factor(1, StyleKey::Height, 0.0);
        layer.set_factor(5, StyleKey::Height, 0.0);
        assert_eq!(layer.factor(StyleKey::Height, 1), 0.0);

        layer.replace_features(points(4));
        assert_eq!(layer.feature_count(), 4);
        assert_eq!(layer.factor(StyleKey::Height, 1), 1.0);
    }

    #[test]
    fn test_opacity_and_zoom_range() {
        let mut layer = Layer::new("grid").with_opacity(1.5);
        assert_eq!(layer.opacity(), 1.0);
        layer.set_current_opacity(0.2);
        assert_eq!(layer.target_opacity(), 1.0);
        layer.set_zooms([5.0, 12.0]);
        assert!(layer.in_zoom_range(5.0));
        assert!(!layer.in_zoom_range(13.0));
    }
}
