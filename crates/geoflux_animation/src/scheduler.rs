//! Frame driver
//!
//! The single clock of a container. Every host frame calls [`FrameDriver::tick`]
//! with a timestamp; the driver turns it into a clamped delta, advances the
//! camera channel and then every layer's animations, pushes the produced
//! values to the host, runs completion callbacks and asks for a redraw.

use crate::config::DriverConfig;
use crate::fade::LayerFade;
use crate::feature::{FeatureAnimateConfig, FeatureAnimationSet};
use crate::view::{CameraAnimation, CameraChannel};
use geoflux_core::{CameraState, Completion, FrameHost, LayerId, Result, StyleKey};
use slotmap::{Key, SecondaryMap};
use std::fmt;

/// Lifecycle of the driver
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverState {
    /// Created, never started
    #[default]
    Idle,
    Running,
    /// Clocks frozen; resumes without applying the skipped time
    Paused,
    /// Stopped and cleared
    Stopped,
}

/// What happened during one tick
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Delta applied to every clock, after clamping
    pub dt_ms: f32,
    /// Camera pushed to the host, if any
    pub camera: Option<CameraState>,
    /// Layers whose values were pushed
    pub layers_updated: usize,
    /// Completion callbacks invoked
    pub completed: usize,
    pub render_requested: bool,
}

/// Animations owned by one layer
#[derive(Debug)]
pub struct LayerAnimations {
    features: FeatureAnimationSet,
    fade: Option<LayerFade>,
}

impl LayerAnimations {
    fn new(seed: u64) -> Self {
        Self {
            features: FeatureAnimationSet::new(seed),
            fade: None,
        }
    }

    pub fn features(&self) -> &FeatureAnimationSet {
        &self.features
    }

    pub fn fade(&self) -> Option<&LayerFade> {
        self.fade.as_ref()
    }

    fn pause(&mut self) {
        self.features.pause();
        if let Some(fade) = &mut self.fade {
            fade.pause();
        }
    }

    fn resume(&mut self) {
        self.features.resume();
        if let Some(fade) = &mut self.fade {
            fade.resume();
        }
    }

    fn is_active(&self) -> bool {
        self.features.is_active()
            || (!self.features.is_paused() && self.fade.as_ref().is_some_and(|f| !f.is_finished()))
    }

    fn is_empty(&self) -> bool {
        self.features.is_empty() && self.fade.is_none()
    }
}

/// Per-container animation clock
pub struct FrameDriver {
    config: DriverConfig,
    state: DriverState,
    /// Timestamp of the previous tick; `None` makes the next delta zero
    last_tick_ms: Option<f64>,
    camera: CameraChannel,
    layers: SecondaryMap<LayerId, LayerAnimations>,
    // Scratch buffers reused across ticks
    completions: Vec<Completion>,
    finished_keys: Vec<StyleKey>,
    gone_layers: Vec<LayerId>,
    ticks: u64,
}

impl FrameDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            state: DriverState::Idle,
            last_tick_ms: None,
            camera: CameraChannel::new(),
            layers: SecondaryMap::new(),
            completions: Vec::new(),
            finished_keys: Vec::new(),
            gone_layers: Vec::new(),
            ticks: 0,
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Idle, Stopped or Paused -> Running. The next tick has a zero delta.
    pub fn start(&mut self) {
        if self.state == DriverState::Running {
            return;
        }
        tracing::debug!(from = ?self.state, "frame driver running");
        self.state = DriverState::Running;
        self.last_tick_ms = None;
    }

    /// Running -> Paused; every clock freezes
    pub fn pause(&mut self) {
        if self.state != DriverState::Running {
            return;
        }
        tracing::debug!("frame driver paused");
        self.state = DriverState::Paused;
        self.last_tick_ms = None;
    }

    /// Paused -> Running
    pub fn resume(&mut self) {
        if self.state == DriverState::Paused {
            self.start();
        }
    }

    /// Drop every animation without running callbacks
    pub fn stop(&mut self) {
        if self.state == DriverState::Stopped {
            return;
        }
        tracing::debug!(
            camera = self.camera.len(),
            layers = self.layers.len(),
            "frame driver stopped"
        );
        self.camera.clear();
        self.layers.clear();
        self.completions.clear();
        self.state = DriverState::Stopped;
        self.last_tick_ms = None;
    }

    fn ensure_started(&mut self) {
        if matches!(self.state, DriverState::Idle | DriverState::Stopped) {
            self.start();
        }
    }

    // Camera channel

    /// Queue a camera animation; an idle or stopped driver starts
    pub fn push_camera(&mut self, animation: CameraAnimation) {
        self.camera.push(animation);
        self.ensure_started();
    }

    pub fn clear_camera(&mut self) {
        self.camera.clear();
    }

    pub fn pause_camera(&mut self) {
        self.camera.pause();
    }

    pub fn resume_camera(&mut self) {
        self.camera.resume();
    }

    pub fn camera(&self) -> &CameraChannel {
        &self.camera
    }

    // Layer animations

    fn layer_entry(&mut self, layer: LayerId) -> Option<&mut LayerAnimations> {
        if !self.layers.contains_key(layer) {
            let seed = self.config.seed ^ layer.data().as_ffi();
            self.layers.insert(layer, LayerAnimations::new(seed));
        }
        self.layers.get_mut(layer)
    }

    /// Install or replace one style key's animation on a layer
    pub fn configure_layer(
        &mut self,
        layer: LayerId,
        config: &FeatureAnimateConfig,
        feature_count: usize,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let Some(animations) = self.layer_entry(layer) else {
            return Err(geoflux_core::ConfigError::UnknownLayer);
        };
        let result = animations.features.configure(config, feature_count, on_complete);
        if animations.is_empty() {
            self.layers.remove(layer);
        }
        result
    }

    /// Start a show / hide fade, replacing a running one. Starts an idle driver.
    pub fn fade_layer(&mut self, layer: LayerId, fade: LayerFade) {
        if let Some(animations) = self.layer_entry(layer) {
            if animations.fade.replace(fade).is_some() {
                tracing::debug!(?layer, "replaced running layer fade");
            }
        }
        self.ensure_started();
    }

    /// Remove every animation of a layer without running callbacks
    pub fn clear_layer(&mut self, layer: LayerId) -> bool {
        self.layers.remove(layer).is_some()
    }

    /// Drop a layer's running fade; its callback never runs
    pub fn cancel_fade(&mut self, layer: LayerId) -> bool {
        let Some(animations) = self.layers.get_mut(layer) else {
            return false;
        };
        let cancelled = animations.fade.take().is_some();
        if animations.is_empty() {
            self.layers.remove(layer);
        }
        cancelled
    }

    /// Drop a layer's per-feature animations, keeping its fade
    pub fn clear_layer_features(&mut self, layer: LayerId) -> bool {
        let Some(animations) = self.layers.get_mut(layer) else {
            return false;
        };
        let cleared = !animations.features.is_empty();
        animations.features.clear();
        if animations.is_empty() {
            self.layers.remove(layer);
        }
        cleared
    }

    /// Remove one style key's animation of a layer
    pub fn clear_layer_key(&mut self, layer: LayerId, key: StyleKey) -> bool {
        self.layers
            .get_mut(layer)
            .is_some_and(|animations| animations.features.remove(key))
    }

    pub fn pause_layer(&mut self, layer: LayerId) {
        if let Some(animations) = self.layers.get_mut(layer) {
            animations.pause();
        }
    }

    pub fn resume_layer(&mut self, layer: LayerId) {
        if let Some(animations) = self.layers.get_mut(layer) {
            animations.resume();
        }
    }

    pub fn layer(&self, layer: LayerId) -> Option<&LayerAnimations> {
        self.layers.get(layer)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Whether any animation still produces changing values
    pub fn is_active(&self) -> bool {
        self.state == DriverState::Running
            && (self.camera.is_active() || self.layers.values().any(LayerAnimations::is_active))
    }

    /// Advance every animation to `now_ms` and push the results to `host`
    pub fn tick<H: FrameHost + ?Sized>(&mut self, now_ms: f64, host: &mut H) -> TickReport {
        let mut report = TickReport::default();

        if self.state != DriverState::Running {
            if host.wants_continuous_redraw() {
                host.request_render();
                report.render_requested = true;
            }
            return report;
        }

        let dt_ms = match self.last_tick_ms {
            None => 0.0,
            Some(previous) => ((now_ms - previous).max(0.0) as f32).min(self.config.max_frame_ms),
        };
        self.last_tick_ms = Some(now_ms);
        self.ticks += 1;
        report.dt_ms = dt_ms;

        // Camera first so layers see this frame's view
        if let Some(camera) = self.camera.advance(dt_ms, host.camera(), &mut self.completions) {
            host.set_camera(camera);
            report.camera = Some(camera);
        }

        for (layer, animations) in self.layers.iter_mut() {
            if host.feature_count(layer).is_none() {
                self.gone_layers.push(layer);
                continue;
            }

            let was_active = animations.features.is_active();
            animations.features.advance(dt_ms, &mut self.finished_keys);
            if was_active {
                animations.features.push(layer, host);
                report.layers_updated += 1;
            }
            for key in self.finished_keys.drain(..) {
                tracing::debug!(?layer, %key, "layer animation finished");
                self.completions.extend(animations.features.take_completed(key));
            }

            if let Some(fade) = &mut animations.fade {
                if !animations.features.is_paused() {
                    let frame = fade.advance(dt_ms);
                    host.set_layer_opacity(layer, frame.opacity);
                    if let Some(visible) = frame.visible {
                        host.set_layer_visible(layer, visible);
                    }
                }
                if fade.is_finished() {
                    self.completions.extend(fade.take_on_complete());
                    animations.fade = None;
                }
            }

            if animations.is_empty() {
                self.gone_layers.push(layer);
            }
        }

        for layer in self.gone_layers.drain(..) {
            self.layers.remove(layer);
        }

        report.completed = self.completions.len();
        for callback in self.completions.drain(..) {
            callback();
        }

        let changed = report.camera.is_some() || report.layers_updated > 0;
        if changed || self.is_active() || host.wants_continuous_redraw() {
            host.request_render();
            report.render_requested = true;
        }

        tracing::trace!(
            tick = self.ticks,
            dt_ms,
            camera = report.camera.is_some(),
            layers = report.layers_updated,
            completed = report.completed,
            "frame"
        );
        report
    }
}

impl fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameDriver")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("camera", &self.camera)
            .field("layers", &self.layers)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(DriverConfig::default())
    }
}
