//! Style keys and value providers
//!
//! Layer styles map a closed set of keys to value providers. A provider is
//! either a constant or a function of the feature index and record, and it
//! is evaluated uniformly when the layer resolves a feature's style.

use crate::error::ConfigError;
use crate::feature::Feature;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// Style Keys
// ─────────────────────────────────────────────────────────────────────────────

/// Style properties that layers expose to animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleKey {
    Radius,
    Height,
    Altitude,
    Opacity,
    Color,
    Size,
    LineWidth,
    Offset,
}

impl StyleKey {
    pub const ALL: [StyleKey; 8] = [
        StyleKey::Radius,
        StyleKey::Height,
        StyleKey::Altitude,
        StyleKey::Opacity,
        StyleKey::Color,
        StyleKey::Size,
        StyleKey::LineWidth,
        StyleKey::Offset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleKey::Radius => "radius",
            StyleKey::Height => "height",
            StyleKey::Altitude => "altitude",
            StyleKey::Opacity => "opacity",
            StyleKey::Color => "color",
            StyleKey::Size => "size",
            StyleKey::LineWidth => "lineWidth",
            StyleKey::Offset => "offset",
        }
    }
}

impl fmt::Display for StyleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StyleKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StyleKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownStyleKey(s.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color (linear space)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for Color {
    type Err = ConfigError;

    /// Parse `#rrggbb` or `#rrggbbaa`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let digits = s.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
        match digits.len() {
            6 => Ok(Color::from_hex(value)),
            8 => Ok(Color::from_hex(value >> 8).with_alpha((value & 0xFF) as f32 / 255.0)),
            _ => Err(invalid()),
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value Providers
// ─────────────────────────────────────────────────────────────────────────────

/// Per-feature style function: `(feature index, feature) -> value`
pub type StyleFn<T> = Arc<dyn Fn(usize, &Feature) -> T + Send + Sync>;

/// A style value: one constant for every feature, or computed per feature
#[derive(Clone)]
pub enum StyleValue<T> {
    Constant(T),
    PerFeature(StyleFn<T>),
}

impl<T: Clone> StyleValue<T> {
    pub fn per_feature<F>(f: F) -> Self
    where
        F: Fn(usize, &Feature) -> T + Send + Sync + 'static,
    {
        StyleValue::PerFeature(Arc::new(f))
    }

    /// Evaluate for one feature
    pub fn resolve(&self, index: usize, feature: &Feature) -> T {
        match self {
            StyleValue::Constant(value) => value.clone(),
            StyleValue::PerFeature(f) => f(index, feature),
        }
    }
}

impl<T> From<T> for StyleValue<T> {
    fn from(value: T) -> Self {
        StyleValue::Constant(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for StyleValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            StyleValue::PerFeature(_) => f.write_str("PerFeature(..)"),
        }
    }
}

/// A typed style property as stored on a layer
#[derive(Clone, Debug)]
pub enum StyleProperty {
    Number(StyleValue<f32>),
    Color(StyleValue<Color>),
    Offset(StyleValue<[f32; 2]>),
}

impl StyleProperty {
    pub fn resolve(&self, index: usize, feature: &Feature) -> ResolvedStyle {
        match self {
            StyleProperty::Number(v) => ResolvedStyle::Number(v.resolve(index, feature)),
            StyleProperty::Color(v) => ResolvedStyle::Color(v.resolve(index, feature)),
            StyleProperty::Offset(v) => ResolvedStyle::Offset(v.resolve(index, feature)),
        }
    }
}

/// A concrete style value for one feature
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResolvedStyle {
    Number(f32),
    Color(Color),
    Offset([f32; 2]),
}

impl ResolvedStyle {
    /// Apply an animation factor, where 1.0 is the configured value.
    ///
    /// Colors fade through their alpha channel.
    pub fn scaled(self, factor: f32) -> ResolvedStyle {
        match self {
            ResolvedStyle::Number(v) => ResolvedStyle::Number(v * factor),
            ResolvedStyle::Color(c) => ResolvedStyle::Color(c.with_alpha(c.a * factor)),
            ResolvedStyle::Offset([x, y]) => ResolvedStyle::Offset([x * factor, y * factor]),
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            ResolvedStyle::Number(v) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_key_round_trips_through_name() {
        for key in StyleKey::ALL {
            assert_eq!(key.as_str().parse::<StyleKey>().unwrap(), key);
        }
        assert_eq!(
            "girth".parse::<StyleKey>(),
            Err(ConfigError::UnknownStyleKey("girth".into()))
        );
    }

    #[test]
    fn test_color_parse() {
        let c: Color = "#ff0000".parse().unwrap();
        assert_eq!(c, Color::rgb(1.0, 0.0, 0.0));

        let c: Color = "#00000080".parse().unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);

        assert!("red".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#+12345".parse::<Color>().is_err());
        assert!("#-1234567".parse::<Color>().is_err());
    }

    #[test]
    fn test_style_value_per_feature() {
        let radius = StyleValue::per_feature(|index, feature: &Feature| {
            feature.property("size").unwrap_or(1.0) as f32 * (index + 1) as f32
        });
        let feature = Feature::default().with_property("size", 2.0);

        assert_eq!(radius.resolve(0, &feature), 2.0);
        assert_eq!(radius.resolve(2, &feature), 6.0);
        assert_eq!(StyleValue::from(5.0f32).resolve(9, &feature), 5.0);
    }

    #[test]
    fn test_resolved_style_scaling() {
        assert_eq!(ResolvedStyle::Number(10.0).scaled(0.5), ResolvedStyle::Number(5.0));
        assert_eq!(
            ResolvedStyle::Offset([2.0, 4.0]).scaled(0.5),
            ResolvedStyle::Offset([1.0, 2.0])
        );
        let faded = ResolvedStyle::Color(Color::WHITE).scaled(0.25);
        assert_eq!(faded, ResolvedStyle::Color(Color::WHITE.with_alpha(0.25)));
    }
}
