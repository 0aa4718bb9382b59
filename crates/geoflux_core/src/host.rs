//! Host collaborator interfaces
//!
//! The frame driver never touches the map or the renderer directly. It reads
//! the camera and pushes values through these narrow traits, which the
//! container (or a test double) implements.

use crate::camera::CameraState;
use crate::style::StyleKey;
use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a layer within a container
    pub struct LayerId;
}

/// A completion callback, invoked at most once
pub type Completion = Box<dyn FnOnce() + Send>;

/// Camera state getter / setter of the host map view
pub trait CameraHost {
    fn camera(&self) -> CameraState;
    fn set_camera(&mut self, camera: CameraState);
}

/// Per-feature style storage for the next render pass
pub trait FeatureStyleSink {
    /// Current feature count of a layer, `None` if the layer is gone
    fn feature_count(&self, layer: LayerId) -> Option<usize>;

    /// Store an animation factor for one feature; expected O(1)
    fn set_feature_style(&mut self, layer: LayerId, index: usize, key: StyleKey, value: f32);

    fn set_layer_opacity(&mut self, layer: LayerId, opacity: f32);

    fn set_layer_visible(&mut self, layer: LayerId, visible: bool);

    /// Whether some layer redraws every frame regardless of animations
    fn wants_continuous_redraw(&self) -> bool {
        false
    }
}

/// Fire-and-forget redraw signal
pub trait RenderTrigger {
    fn request_render(&mut self);
}

/// Everything the frame driver talks to
pub trait FrameHost: CameraHost + FeatureStyleSink + RenderTrigger {}

impl<T: CameraHost + FeatureStyleSink + RenderTrigger> FrameHost for T {}

/// Coalescing render request flag.
///
/// Any number of requests between two `take` calls result in one redraw.
#[derive(Debug, Default)]
pub struct RenderRequest {
    pending: bool,
    requested: u64,
}

impl RenderRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self) {
        self.pending = true;
        self.requested += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, returning whether a redraw is due
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Total requests received, coalesced or not
    pub fn request_count(&self) -> u64 {
        self.requested
    }
}

impl RenderTrigger for RenderRequest {
    fn request_render(&mut self) {
        self.request();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_requests_coalesce() {
        let mut render = RenderRequest::new();
        assert!(!render.take());

        render.request_render();
        render.request_render();
        render.request_render();

        assert!(render.is_pending());
        assert!(render.take());
        assert!(!render.take());
        assert_eq!(render.request_count(), 3);
    }
}
