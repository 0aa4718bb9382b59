//! Layer show / hide fades

use crate::tween::Tween;
use geoflux_core::{Completion, Result};
use std::fmt;

/// Opacity transition of a whole layer
pub struct LayerFade {
    tween: Tween<f32>,
    /// Visibility once the fade ends; hides only take effect at the end
    visible_after: bool,
    on_complete: Option<Completion>,
}

/// Output of one fade advance
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeFrame {
    pub opacity: f32,
    /// Set on the frame the fade ends
    pub visible: Option<bool>,
}

impl LayerFade {
    /// Fade from `from` up to `to`, leaving the layer visible
    pub fn show(from: f32, to: f32, duration_ms: f32, on_complete: Option<Completion>) -> Result<Self> {
        Self::new(from, to, duration_ms, true, on_complete)
    }

    /// Fade from `from` down to zero, then hide the layer
    pub fn hide(from: f32, duration_ms: f32, on_complete: Option<Completion>) -> Result<Self> {
        Self::new(from, 0.0, duration_ms, false, on_complete)
    }

    fn new(
        from: f32,
        to: f32,
        duration_ms: f32,
        visible_after: bool,
        on_complete: Option<Completion>,
    ) -> Result<Self> {
        let tween = Tween::new(from, to, duration_ms)?.started();
        Ok(Self {
            tween,
            visible_after,
            on_complete,
        })
    }

    pub fn advance(&mut self, dt_ms: f32) -> FadeFrame {
        let frame = self.tween.advance(dt_ms);
        FadeFrame {
            opacity: frame.value,
            visible: frame.just_completed.then_some(self.visible_after),
        }
    }

    pub fn pause(&mut self) {
        self.tween.pause();
    }

    pub fn resume(&mut self) {
        self.tween.resume();
    }

    pub fn is_finished(&self) -> bool {
        self.tween.is_completed()
    }

    pub fn is_showing(&self) -> bool {
        self.visible_after
    }

    pub fn opacity(&self) -> f32 {
        self.tween.value()
    }

    pub fn take_on_complete(&mut self) -> Option<Completion> {
        if self.is_finished() {
            self.on_complete.take()
        } else {
            None
        }
    }
}

impl fmt::Debug for LayerFade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerFade")
            .field("tween", &self.tween)
            .field("visible_after", &self.visible_after)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_reports_visibility_at_end() {
        let mut fade = LayerFade::hide(0.8, 400.0, None).unwrap();
        let frame = fade.advance(200.0);
        assert!((frame.opacity - 0.4).abs() < 1e-4);
        assert_eq!(frame.visible, None);

        let frame = fade.advance(200.0);
        assert_eq!(frame.opacity, 0.0);
        assert_eq!(frame.visible, Some(false));
        assert!(fade.is_finished());
    }

    #[test]
    fn test_show_from_current_opacity() {
        let mut fade = LayerFade::show(0.25, 1.0, 300.0, None).unwrap();
        assert_eq!(fade.opacity(), 0.25);
        let frame = fade.advance(300.0);
        assert_eq!(frame.opacity, 1.0);
        assert_eq!(frame.visible, Some(true));
    }

    #[test]
    fn test_rejects_zero_duration() {
        assert!(LayerFade::show(0.0, 1.0, 0.0, None).is_err());
    }
}
