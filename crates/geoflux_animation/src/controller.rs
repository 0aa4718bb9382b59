//! Animation controller
//!
//! A borrowing facade over a [`FrameDriver`] with the camera and layer
//! animation calls a map view exposes. It owns no state of its own.

use crate::fade::LayerFade;
use crate::feature::FeatureAnimateConfig;
use crate::scheduler::{DriverState, FrameDriver};
use crate::sequence::{AnimationSequence, CameraStep};
use crate::track::{PathFollower, TrackConfig};
use crate::view::CameraAnimation;
use geoflux_core::{Completion, LayerId, Result};

pub struct AnimationController<'a> {
    driver: &'a mut FrameDriver,
}

impl<'a> AnimationController<'a> {
    pub fn new(driver: &'a mut FrameDriver) -> Self {
        Self { driver }
    }

    /// Queue camera steps that run one after another
    pub fn add_animates(
        &mut self,
        steps: &[CameraStep],
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let sequence = AnimationSequence::new(steps, on_complete)?;
        tracing::debug!(steps = steps.len(), "camera steps queued");
        self.driver.push_camera(CameraAnimation::Sequence(sequence));
        Ok(())
    }

    /// Queue a camera flight along a path
    pub fn add_track_animate(
        &mut self,
        config: TrackConfig,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let follower = PathFollower::new(config, on_complete)?;
        self.driver.push_camera(CameraAnimation::Track(follower));
        Ok(())
    }

    /// Drop all camera animations; their callbacks never run
    pub fn clear_animates(&mut self) {
        self.driver.clear_camera();
    }

    pub fn pause_animate(&mut self) {
        self.driver.pause_camera();
    }

    pub fn resume_animate(&mut self) {
        self.driver.resume_camera();
    }

    /// Animate one style key of a layer's features
    pub fn add_animate(
        &mut self,
        layer: LayerId,
        config: &FeatureAnimateConfig,
        feature_count: usize,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        self.driver
            .configure_layer(layer, config, feature_count, on_complete)
    }

    pub fn clear_layer(&mut self, layer: LayerId) {
        self.driver.clear_layer(layer);
    }

    pub fn fade_layer(&mut self, layer: LayerId, fade: LayerFade) {
        self.driver.fade_layer(layer, fade);
    }

    pub fn pause_layer(&mut self, layer: LayerId) {
        self.driver.pause_layer(layer);
    }

    pub fn resume_layer(&mut self, layer: LayerId) {
        self.driver.resume_layer(layer);
    }

    /// Freeze every clock
    pub fn pause_all(&mut self) {
        self.driver.pause();
    }

    pub fn resume_all(&mut self) {
        self.driver.resume();
    }

    /// Stop the driver and drop everything without callbacks
    pub fn cancel_all(&mut self) {
        self.driver.stop();
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    pub fn is_animating(&self) -> bool {
        self.driver.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::PropertyAnimate;
    use geoflux_core::{ConfigError, LngLat, StyleKey};
    use slotmap::SlotMap;

    #[test]
    fn test_camera_calls_start_the_driver() {
        let mut driver = FrameDriver::default();
        let mut controller = AnimationController::new(&mut driver);
        assert_eq!(controller.state(), DriverState::Idle);

        let step = CameraStep::new().pitch(PropertyAnimate::new(45.0, 300.0));
        controller.add_animates(&[step], None).unwrap();
        assert_eq!(controller.state(), DriverState::Running);
        assert!(controller.is_animating());

        controller.pause_animate();
        assert!(!controller.is_animating());
        controller.resume_animate();
        controller.clear_animates();
        assert!(!controller.is_animating());
    }

    #[test]
    fn test_rejected_config_queues_nothing() {
        let mut driver = FrameDriver::default();
        let mut controller = AnimationController::new(&mut driver);

        let err = controller
            .add_track_animate(TrackConfig::new(vec![LngLat::new(0.0, 0.0)], 100.0), None)
            .unwrap_err();
        assert_eq!(err, ConfigError::PathTooShort(1));

        let step = CameraStep::new().zoom(PropertyAnimate::new(5.0, -1.0));
        assert!(controller.add_animates(&[step], None).is_err());
        assert_eq!(controller.state(), DriverState::Idle);
        assert!(driver.camera().is_empty());
    }

    #[test]
    fn test_layer_calls_and_cancel_all() {
        let mut layers: SlotMap<LayerId, ()> = SlotMap::with_key();
        let layer = layers.insert(());
        let mut driver = FrameDriver::default();
        let mut controller = AnimationController::new(&mut driver);

        let config = FeatureAnimateConfig::new(StyleKey::Opacity, vec![0.0, 1.0], 500.0);
        controller.add_animate(layer, &config, 10, None).unwrap();
        controller.fade_layer(layer, LayerFade::show(0.0, 1.0, 200.0, None).unwrap());
        controller.pause_all();
        assert_eq!(controller.state(), DriverState::Idle);

        controller.resume_all();
        controller.cancel_all();
        assert_eq!(controller.state(), DriverState::Stopped);
        assert_eq!(driver.layer_count(), 0);
    }
}
