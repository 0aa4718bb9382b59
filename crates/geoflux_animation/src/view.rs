//! Camera animation channel
//!
//! Step sequences and track animations queue up in one FIFO channel; only
//! the front animation advances, the next one starts on the following tick.

use crate::sequence::AnimationSequence;
use crate::track::PathFollower;
use geoflux_core::{CameraState, Completion};
use std::collections::VecDeque;

/// A queued camera animation
#[derive(Debug)]
pub enum CameraAnimation {
    Sequence(AnimationSequence),
    Track(PathFollower),
}

impl CameraAnimation {
    fn advance(&mut self, dt_ms: f32, base: CameraState) -> (Option<CameraState>, bool) {
        match self {
            CameraAnimation::Sequence(sequence) => {
                let frame = sequence.advance(dt_ms, base);
                (frame.camera, frame.finished)
            }
            CameraAnimation::Track(track) => {
                if track.is_paused() {
                    return (None, false);
                }
                let frame = track.advance(dt_ms);
                let mut camera = base;
                frame.apply(&mut camera);
                (Some(camera), frame.just_completed)
            }
        }
    }

    fn pause(&mut self) {
        match self {
            CameraAnimation::Sequence(sequence) => sequence.pause(),
            CameraAnimation::Track(track) => track.pause(),
        }
    }

    fn resume(&mut self) {
        match self {
            CameraAnimation::Sequence(sequence) => sequence.resume(),
            CameraAnimation::Track(track) => track.resume(),
        }
    }

    fn take_on_complete(&mut self) -> Option<Completion> {
        match self {
            CameraAnimation::Sequence(sequence) => sequence.take_on_complete(),
            CameraAnimation::Track(track) => track.take_on_complete(),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            CameraAnimation::Sequence(sequence) => sequence.is_finished(),
            CameraAnimation::Track(track) => track.is_finished(),
        }
    }
}

/// FIFO of camera animations
#[derive(Debug, Default)]
pub struct CameraChannel {
    queue: VecDeque<CameraAnimation>,
    paused: bool,
}

impl CameraChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut animation: CameraAnimation) {
        if self.paused {
            animation.pause();
        }
        self.queue.push_back(animation);
    }

    /// Advance the front animation.
    ///
    /// Returns the camera to push, if any. Callbacks of animations finished
    /// in this call are appended to `completed`; the caller runs them after
    /// the camera was pushed.
    pub fn advance(
        &mut self,
        dt_ms: f32,
        base: CameraState,
        completed: &mut Vec<Completion>,
    ) -> Option<CameraState> {
        if self.paused {
            return None;
        }
        let front = self.queue.front_mut()?;
        let (camera, finished) = front.advance(dt_ms, base);

        if finished || front.is_finished() {
            if let Some(mut done) = self.queue.pop_front() {
                tracing::debug!(remaining = self.queue.len(), "camera animation finished");
                completed.extend(done.take_on_complete());
            }
        }
        camera
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        for animation in &mut self.queue {
            animation.pause();
        }
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        for animation in &mut self.queue {
            animation.resume();
        }
    }

    /// Drop every queued animation and lift a pause; callbacks never run
    pub fn clear(&mut self) {
        if !self.queue.is_empty() {
            tracing::debug!(dropped = self.queue.len(), "camera animations cleared");
        }
        self.queue.clear();
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_active(&self) -> bool {
        !self.paused && !self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
