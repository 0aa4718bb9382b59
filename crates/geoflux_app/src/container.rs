//! Container: layers, lights, camera, and the frame driver
//!
//! The container owns one [`FrameDriver`] for its whole lifetime. The host
//! render loop calls [`Container::frame`] once per frame; camera and layer
//! values produced by the driver land in the container's [`Scene`].

use crate::error::{ContainerError, Result};
use crate::layer::Layer;
use geoflux_animation::{
    AnimationController, DriverConfig, DriverState, FeatureAnimateConfig, FrameDriver, LayerFade,
    TickReport,
};
use geoflux_core::{
    CameraHost, CameraState, Completion, ConfigError, Feature, FeatureStyleSink, LayerId, Light,
    LightKind, RenderRequest, RenderTrigger, StyleKey,
};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Unique identifier for a light within a container
    pub struct LightId;
}

/// Everything the frame driver writes to
#[derive(Debug, Default)]
pub struct Scene {
    camera: CameraState,
    layers: SlotMap<LayerId, Layer>,
    lights: SlotMap<LightId, Light>,
    render: RenderRequest,
}

impl Scene {
    pub fn camera(&self) -> CameraState {
        self.camera
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &Layer)> {
        self.layers.iter()
    }

    /// Layers in draw order
    pub fn draw_order(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self.layers.keys().collect();
        ids.sort_by_key(|id| self.layers[*id].z_index());
        ids
    }

    pub fn render_request(&self) -> &RenderRequest {
        &self.render
    }
}

impl CameraHost for Scene {
    fn camera(&self) -> CameraState {
        self.camera
    }

    fn set_camera(&mut self, camera: CameraState) {
        self.camera = camera;
    }
}

impl FeatureStyleSink for Scene {
    fn feature_count(&self, layer: LayerId) -> Option<usize> {
        self.layers.get(layer).map(Layer::feature_count)
    }

    fn set_feature_style(&mut self, layer: LayerId, index: usize, key: StyleKey, value: f32) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_factor(index, key, value);
        }
    }

    fn set_layer_opacity(&mut self, layer: LayerId, opacity: f32) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_current_opacity(opacity);
        }
    }

    fn set_layer_visible(&mut self, layer: LayerId, visible: bool) {
        if let Some(layer) = self.layers.get_mut(layer) {
            layer.set_visible(visible);
        }
    }

    fn wants_continuous_redraw(&self) -> bool {
        self.layers
            .values()
            .any(|layer| layer.is_visible() && layer.is_continuous())
    }
}

impl RenderTrigger for Scene {
    fn request_render(&mut self) {
        self.render.request();
    }
}

/// A map container with its own animation clock
#[derive(Debug)]
pub struct Container {
    scene: Scene,
    driver: FrameDriver,
}

impl Container {
    pub fn new(config: DriverConfig) -> Self {
        Self::with_camera(config, CameraState::default())
    }

    pub fn with_camera(config: DriverConfig, camera: CameraState) -> Self {
        tracing::debug!(?camera, seed = config.seed, "container created");
        Self {
            scene: Scene {
                camera,
                ..Default::default()
            },
            driver: FrameDriver::new(config),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> CameraState {
        self.scene.camera
    }

    /// Jump the camera without animation
    pub fn set_camera(&mut self, camera: CameraState) {
        self.scene.camera = camera;
        self.scene.render.request();
    }

    pub fn driver(&self) -> &FrameDriver {
        &self.driver
    }

    pub fn driver_state(&self) -> DriverState {
        self.driver.state()
    }

    /// Camera and global animation controls
    pub fn view_control(&mut self) -> AnimationController<'_> {
        AnimationController::new(&mut self.driver)
    }

    pub fn start(&mut self) {
        self.driver.start();
    }

    pub fn pause(&mut self) {
        self.driver.pause();
    }

    pub fn stop(&mut self) {
        self.driver.stop();
    }

    // Layers

    pub fn add_layer(&mut self, layer: Layer) -> Result<LayerId> {
        if self.layer_id(layer.name()).is_some() {
            return Err(ContainerError::DuplicateLayer(layer.name().to_string()));
        }
        tracing::debug!(
            name = layer.name(),
            features = layer.feature_count(),
            "layer added"
        );
        let id = self.scene.layers.insert(layer);
        self.scene.render.request();
        Ok(id)
    }

    /// Remove a layer and drop its animations without callbacks
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let layer = self.scene.layers.remove(id)?;
        self.driver.clear_layer(id);
        self.scene.render.request();
        tracing::debug!(name = layer.name(), "layer removed");
        Some(layer)
    }

    /// Remove every layer along with the lights
    pub fn clear(&mut self) {
        let ids: Vec<LayerId> = self.scene.layers.keys().collect();
        for id in ids {
            self.remove_layer(id);
        }
        self.clear_lights();
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.scene.layers.get(id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.scene.render.request();
        self.scene.layers.get_mut(id)
    }

    pub fn layer_id(&self, name: &str) -> Option<LayerId> {
        self.scene
            .layers
            .iter()
            .find(|(_, layer)| layer.name() == name)
            .map(|(id, _)| id)
    }

    /// Look a layer up by name, failing when it does not exist
    pub fn find_layer(&self, name: &str) -> Result<LayerId> {
        self.layer_id(name)
            .ok_or_else(|| ContainerError::LayerNotFound(name.to_string()))
    }

    pub fn layer_count(&self) -> usize {
        self.scene.layers.len()
    }

    /// Animate a style key across the layer's current features
    pub fn layer_animate(
        &mut self,
        id: LayerId,
        config: &FeatureAnimateConfig,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let count = self
            .scene
            .layers
            .get(id)
            .map(Layer::feature_count)
            .ok_or(ConfigError::UnknownLayer)?;
        self.driver
            .configure_layer(id, config, count, on_complete)?;
        Ok(())
    }

    /// Make a layer visible, fading its opacity in over `duration_ms`
    pub fn show_layer(
        &mut self,
        id: LayerId,
        duration_ms: Option<f32>,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let layer = self
            .scene
            .layers
            .get_mut(id)
            .ok_or(ConfigError::UnknownLayer)?;
        let target = layer.target_opacity();
        let from = if layer.is_visible() { layer.opacity() } else { 0.0 };
        layer.set_visible(true);

        match duration_ms {
            Some(duration) => {
                let fade = LayerFade::show(from, target, duration, on_complete)?;
                layer.set_current_opacity(from);
                self.driver.fade_layer(id, fade);
            }
            None => {
                layer.set_current_opacity(target);
                self.driver.cancel_fade(id);
                self.scene.render.request();
                if let Some(callback) = on_complete {
                    callback();
                }
            }
        }
        Ok(())
    }

    /// Fade a layer out over `duration_ms`, then hide it
    pub fn hide_layer(
        &mut self,
        id: LayerId,
        duration_ms: Option<f32>,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let layer = self
            .scene
            .layers
            .get_mut(id)
            .ok_or(ConfigError::UnknownLayer)?;

        match duration_ms {
            Some(duration) => {
                let fade = LayerFade::hide(layer.opacity(), duration, on_complete)?;
                self.driver.fade_layer(id, fade);
            }
            None => {
                layer.set_visible(false);
                self.driver.cancel_fade(id);
                self.scene.render.request();
                if let Some(callback) = on_complete {
                    callback();
                }
            }
        }
        Ok(())
    }

    /// Replace a layer's features; per-feature animations are dropped, a fade keeps running
    pub fn set_layer_source(&mut self, id: LayerId, features: Vec<Feature>) -> Result<()> {
        let layer = self
            .scene
            .layers
            .get_mut(id)
            .ok_or(ConfigError::UnknownLayer)?;
        layer.replace_features(features);
        if self.driver.clear_layer_features(id) {
            tracing::debug!(?id, "layer source swapped, animations dropped");
        }
        self.scene.render.request();
        Ok(())
    }

    // Lights

    /// Add a light. A second ambient light is ignored.
    pub fn add_light(&mut self, light: Light) -> Option<LightId> {
        if light.kind() == LightKind::Ambient
            && self
                .scene
                .lights
                .values()
                .any(|l| l.kind() == LightKind::Ambient)
        {
            tracing::warn!("container already has an ambient light, ignoring");
            return None;
        }
        self.scene.render.request();
        Some(self.scene.lights.insert(light))
    }

    pub fn remove_light(&mut self, id: LightId) -> Option<Light> {
        let light = self.scene.lights.remove(id)?;
        self.scene.render.request();
        Some(light)
    }

    pub fn clear_lights(&mut self) {
        self.scene.lights.clear();
        self.scene.render.request();
    }

    pub fn lights(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.scene.lights.iter()
    }

    // Frames

    pub fn request_render(&mut self) {
        self.scene.render.request();
    }

    /// Take the pending redraw, if any
    pub fn take_render(&mut self) -> bool {
        self.scene.render.take()
    }

    /// Advance animations to `now_ms`
    pub fn frame(&mut self, now_ms: f64) -> TickReport {
        self.driver.tick(now_ms, &mut self.scene)
    }

    /// Stop all animations and release layers and lights
    pub fn destroy(&mut self) {
        tracing::debug!(layers = self.scene.layers.len(), "container destroyed");
        self.driver.stop();
        self.scene.layers.clear();
        self.scene.lights.clear();
        self.scene.render.take();
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoflux_core::{Color, LngLat};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn points(n: usize) -> Vec<Feature> {
        (0..n)
            .map(|i| Feature::at(LngLat::new(116.0 + i as f64 * 0.01, 39.9)))
            .collect()
    }

    #[test]
    fn test_duplicate_layer_names_rejected() {
        let mut container = Container::default();
        container.add_layer(Layer::new("a")).unwrap();
        assert_eq!(
            container.add_layer(Layer::new("a")).unwrap_err(),
            ContainerError::DuplicateLayer("a".into())
        );
    }

    #[test]
    fn test_find_layer_by_name() {
        let mut container = Container::default();
        let id = container.add_layer(Layer::new("dots")).unwrap();
        assert_eq!(container.find_layer("dots").unwrap(), id);
        assert_eq!(
            container.find_layer("lines").unwrap_err(),
            ContainerError::LayerNotFound("lines".into())
        );
    }

    #[test]
    fn test_single_ambient_light() {
        let mut container = Container::default();
        assert!(container.add_light(Light::ambient(Color::WHITE, 0.5)).is_some());
        assert!(container.add_light(Light::ambient(Color::BLACK, 1.0)).is_none());
        assert_eq!(container.lights().count(), 1);
        container.clear_lights();
        assert_eq!(container.lights().count(), 0);
    }

    #[test]
    fn test_unknown_layer_is_a_config_error() {
        let mut container = Container::default();
        let id = container.add_layer(Layer::new("a")).unwrap();
        container.remove_layer(id);
        let config = FeatureAnimateConfig::new(StyleKey::Radius, vec![0.0, 1.0], 100.0);
        assert_eq!(
            container.layer_animate(id, &config, None).unwrap_err(),
            ContainerError::Config(ConfigError::UnknownLayer)
        );
    }

    #[test]
    fn test_hide_then_show_without_duration() {
        let mut container = Container::default();
        let id = container
            .add_layer(Layer::new("a").with_opacity(0.8))
            .unwrap();
        container.hide_layer(id, None, None).unwrap();
        assert!(!container.layer(id).unwrap().is_visible());
        container.show_layer(id, None, None).unwrap();
        let layer = container.layer(id).unwrap();
        assert!(layer.is_visible());
        assert_eq!(layer.opacity(), 0.8);
    }

    #[test]
    fn test_source_swap_drops_animations() {
        let mut container = Container::default();
        let id = container
            .add_layer(Layer::new("a").with_features(points(5)))
            .unwrap();
        let config = FeatureAnimateConfig::new(StyleKey::Radius, vec![0.0, 1.0], 1000.0);
        container.layer_animate(id, &config, None).unwrap();
        container.start();
        container.frame(0.0);
        assert_eq!(container.layer(id).unwrap().factor(StyleKey::Radius, 4), 0.0);

        container.set_layer_source(id, points(2)).unwrap();
        assert!(container.driver().layer(id).is_none());
        assert_eq!(container.layer(id).unwrap().factor(StyleKey::Radius, 0), 1.0);
    }

    #[test]
    fn test_instant_hide_cancels_running_fade() {
        let mut container = Container::default();
        let id = container.add_layer(Layer::new("a")).unwrap();
        container.hide_layer(id, None, None).unwrap();

        let shown = Arc::new(AtomicUsize::new(0));
        let counter = shown.clone();
        container
            .show_layer(
                id,
                Some(200.0),
                Some(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        container.frame(0.0);
        container.frame(100.0);

        container.hide_layer(id, None, None).unwrap();
        container.frame(200.0);
        container.frame(300.0);

        assert!(!container.layer(id).unwrap().is_visible());
        assert!(container.driver().layer(id).is_none());
        assert_eq!(shown.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_instant_show_cancels_running_hide() {
        let mut container = Container::default();
        let id = container
            .add_layer(Layer::new("a").with_opacity(0.8))
            .unwrap();
        container.hide_layer(id, Some(200.0), None).unwrap();
        container.frame(0.0);
        container.frame(100.0);

        container.show_layer(id, None, None).unwrap();
        container.frame(300.0);
        let layer = container.layer(id).unwrap();
        assert!(layer.is_visible());
        assert_eq!(layer.opacity(), 0.8);
    }

    #[test]
    fn test_source_swap_keeps_running_fade() {
        let mut container = Container::default();
        let id = container
            .add_layer(Layer::new("a").with_features(points(3)))
            .unwrap();
        let hidden = Arc::new(AtomicUsize::new(0));
        let counter = hidden.clone();
        container
            .hide_layer(
                id,
                Some(200.0),
                Some(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        container.frame(0.0);
        container.frame(100.0);

        container.set_layer_source(id, points(5)).unwrap();
        container.frame(200.0);

        let layer = container.layer(id).unwrap();
        assert!(!layer.is_visible());
        assert_eq!(layer.opacity(), 0.0);
        assert_eq!(hidden.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_removes_layers_and_lights() {
        let mut container = Container::default();
        container.add_layer(Layer::new("a")).unwrap();
        container.add_light(Light::ambient(Color::WHITE, 1.0));
        container.clear();
        assert_eq!(container.layer_count(), 0);
        assert_eq!(container.lights().count(), 0);
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut container = Container::default();
        container
            .add_layer(Layer::new("a").with_features(points(1)))
            .unwrap();
        container.add_light(Light::ambient(Color::WHITE, 1.0));
        container.destroy();
        assert_eq!(container.layer_count(), 0);
        assert_eq!(container.lights().count(), 0);
        assert_eq!(container.driver_state(), DriverState::Stopped);
        assert!(!container.take_render());
    }
}
