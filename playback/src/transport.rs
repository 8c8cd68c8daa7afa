//! Shared transport: running flag, shared time, speed and the frame range.
//!
//! Only the authority viewport writes the shared time. The frame index is
//! always derived from the time, except when the user scrubs, in which case
//! the time is derived from the frame.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::keyframes::KeyframeEstimate;
use crate::store::{SharedState, Subscription};

pub const PLACEHOLDER_TOTAL_FRAMES: u32 = 100;
pub const PLACEHOLDER_DURATION: f32 = 3.33;
pub const DEFAULT_SPEED: f32 = 1.0;
pub const SPEED_CHOICES: [f32; 3] = [0.25, 0.5, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewportId(pub u16);

impl ViewportId {
    /// The source-character viewport.
    pub const SOURCE: Self = Self(0);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub running: bool,
    pub shared_time: f32,
    pub speed: f32,
    pub frame_index: u32,
    pub total_frames: u32,
    pub duration: f32,
    /// The source clip has been analysed; before this the frame range is
    /// provisional.
    pub loaded: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            running: true,
            shared_time: 0.0,
            speed: DEFAULT_SPEED,
            frame_index: 0,
            total_frames: PLACEHOLDER_TOTAL_FRAMES,
            duration: PLACEHOLDER_DURATION,
            loaded: false,
        }
    }
}

impl TransportState {
    pub fn last_frame(&self) -> u32 {
        self.total_frames.saturating_sub(1)
    }

    fn rederive_frame(&mut self) {
        self.frame_index = frame_for_time(self.shared_time, self.duration, self.total_frames);
    }
}

/// `round((time mod duration) / duration * (total - 1))`, clamped.
pub fn frame_for_time(time: f32, duration: f32, total_frames: u32) -> u32 {
    let last = total_frames.saturating_sub(1);
    if last == 0 || !duration.is_finite() || duration <= 0.0 || !time.is_finite() {
        return 0;
    }
    let wrapped = time.rem_euclid(duration);
    let frame = (wrapped / duration * last as f32).round();
    (frame.max(0.0) as u32).min(last)
}

/// `frame / (total - 1) * duration`.
pub fn time_for_frame(frame: u32, duration: f32, total_frames: u32) -> f32 {
    let last = total_frames.saturating_sub(1);
    if last == 0 || !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    frame.min(last) as f32 / last as f32 * duration
}

#[derive(Debug, Clone)]
pub struct TransportController {
    state: SharedState<TransportState>,
    authority: ViewportId,
    reported_keyframes: Option<u32>,
    pending_seek: Option<f32>,
}

impl Default for TransportController {
    fn default() -> Self {
        Self::new(ViewportId::SOURCE)
    }
}

impl TransportController {
    pub fn new(authority: ViewportId) -> Self {
        Self {
            state: SharedState::default(),
            authority,
            reported_keyframes: None,
            pending_seek: None,
        }
    }

    pub fn authority(&self) -> ViewportId {
        self.authority
    }

    pub fn is_authority(&self, viewport: ViewportId) -> bool {
        viewport == self.authority
    }

    pub fn state(&self) -> &TransportState {
        self.state.get()
    }

    pub fn shared(&self) -> &SharedState<TransportState> {
        &self.state
    }

    pub fn subscribe(&self) -> Subscription {
        self.state.subscribe()
    }

    pub fn publish_time(&mut self, from: ViewportId, time: f32) -> Result<(), TransportError> {
        self.check_authority(from)?;
        self.state.update(Some(from), |state| {
            state.shared_time = time;
            state.rederive_frame();
        });
        Ok(())
    }

    /// Sets the frame directly and derives the shared time from it. The
    /// authority picks the time up as a seek on its next tick.
    pub fn scrub_to_frame(&mut self, frame: u32) {
        let mut seek = 0.0;
        self.state.update(None, |state| {
            state.frame_index = frame.min(state.last_frame());
            state.shared_time = time_for_frame(state.frame_index, state.duration, state.total_frames);
            seek = state.shared_time;
        });
        self.pending_seek = Some(seek);
    }

    pub fn take_seek(&mut self) -> Option<f32> {
        self.pending_seek.take()
    }

    pub fn toggle_running(&mut self) -> bool {
        let running = !self.state().running;
        self.set_running(running);
        running
    }

    pub fn set_running(&mut self, running: bool) {
        self.state.update(None, |state| state.running = running);
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), TransportError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(TransportError::InvalidSpeed(speed));
        }
        self.state.update(None, |state| state.speed = speed);
        Ok(())
    }

    /// Takes the largest keyframe count reported this session and marks the
    /// frame range as real.
    pub fn report_keyframes(
        &mut self,
        from: ViewportId,
        estimate: KeyframeEstimate,
    ) -> Result<(), TransportError> {
        self.check_authority(from)?;
        let total = self
            .reported_keyframes
            .map_or(estimate.keyframes, |previous| previous.max(estimate.keyframes))
            .max(1);
        self.reported_keyframes = Some(total);
        self.state.update(Some(from), |state| {
            state.total_frames = total;
            if estimate.duration.is_finite() && estimate.duration > 0.0 {
                state.duration = estimate.duration;
            }
            state.loaded = true;
            state.rederive_frame();
        });
        log::info!(
            "Transport loaded: {} frames over {:.2}s (fallback: {})",
            total,
            self.state().duration,
            estimate.fallback_used
        );
        Ok(())
    }

    pub fn reported_keyframes(&self) -> Option<u32> {
        self.reported_keyframes
    }

    /// Back to placeholders, playing at normal speed, from frame zero.
    pub fn reset(&mut self) {
        self.reported_keyframes = None;
        self.pending_seek = None;
        self.state.set(None, TransportState::default());
    }

    /// Upper bound of the frame slider.
    pub fn slider_max(&self) -> u32 {
        let state = self.state();
        if state.loaded {
            state.last_frame()
        } else {
            PLACEHOLDER_TOTAL_FRAMES - 1
        }
    }

    fn check_authority(&self, from: ViewportId) -> Result<(), TransportError> {
        if from == self.authority {
            Ok(())
        } else {
            Err(TransportError::NotAuthority {
                from,
                authority: self.authority,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(keyframes: u32, duration: f32) -> KeyframeEstimate {
        KeyframeEstimate {
            keyframes,
            duration,
            fallback_used: false,
        }
    }

    #[test]
    fn frame_and_time_round_trip_below_the_boundary() {
        let (duration, total) = (2.4, 73);
        for frame in 0..total - 1 {
            let time = time_for_frame(frame, duration, total);
            assert_eq!(frame_for_time(time, duration, total), frame, "frame {frame}");
        }
        // The last frame sits exactly on the loop point.
        let end = time_for_frame(total - 1, duration, total);
        assert!((end - duration).abs() < 1e-6);
        assert_eq!(frame_for_time(end, duration, total), 0);
    }

    #[test]
    fn derivations_survive_degenerate_ranges() {
        assert_eq!(frame_for_time(1.0, 0.0, 100), 0);
        assert_eq!(frame_for_time(1.0, 3.0, 1), 0);
        assert_eq!(frame_for_time(f32::NAN, 3.0, 100), 0);
        assert_eq!(time_for_frame(5, 3.0, 1), 0.0);
        assert_eq!(frame_for_time(-0.5, 2.0, 5), 3);
    }

    #[test]
    fn only_the_authority_publishes_time() {
        let mut transport = TransportController::new(ViewportId::SOURCE);
        assert_eq!(
            transport.publish_time(ViewportId(3), 1.0),
            Err(TransportError::NotAuthority {
                from: ViewportId(3),
                authority: ViewportId::SOURCE,
            })
        );
        // 1.0 / 3.33 * 99 = 29.7
        transport.publish_time(ViewportId::SOURCE, 1.0).unwrap();
        assert_eq!(transport.state().frame_index, 30);
        assert_eq!(transport.shared().last_writer(), Some(ViewportId::SOURCE));
    }

    #[test]
    fn scrubbing_sets_the_frame_and_queues_a_seek() {
        let mut transport = TransportController::default();
        transport
            .report_keyframes(ViewportId::SOURCE, estimate(11, 2.0))
            .unwrap();
        transport.scrub_to_frame(5);
        assert_eq!(transport.state().frame_index, 5);
        assert!((transport.state().shared_time - 1.0).abs() < 1e-6);
        assert_eq!(transport.take_seek(), Some(transport.state().shared_time));
        assert_eq!(transport.take_seek(), None);

        transport.scrub_to_frame(400);
        assert_eq!(transport.state().frame_index, 10);
        assert!((transport.state().shared_time - 2.0).abs() < 1e-6);
    }

    #[test]
    fn keyframe_reports_keep_the_maximum() {
        let mut transport = TransportController::default();
        assert_eq!(transport.slider_max(), 99);
        assert!(
            transport
                .report_keyframes(ViewportId(1), estimate(60, 2.0))
                .is_err()
        );
        transport
            .report_keyframes(ViewportId::SOURCE, estimate(60, 2.0))
            .unwrap();
        transport
            .report_keyframes(ViewportId::SOURCE, estimate(40, 2.0))
            .unwrap();
        assert_eq!(transport.state().total_frames, 60);
        assert!(transport.state().loaded);
        assert_eq!(transport.slider_max(), 59);
    }

    #[test]
    fn reset_restores_placeholders_whatever_came_before() {
        let mut transport = TransportController::default();
        transport
            .report_keyframes(ViewportId::SOURCE, estimate(240, 8.0))
            .unwrap();
        transport.publish_time(ViewportId::SOURCE, 5.0).unwrap();
        transport.set_running(false);
        transport.set_speed(0.25).unwrap();
        transport.scrub_to_frame(17);

        transport.reset();
        assert_eq!(*transport.state(), TransportState::default());
        assert_eq!(transport.state().frame_index, 0);
        assert_eq!(transport.state().shared_time, 0.0);
        assert_eq!(transport.state().total_frames, PLACEHOLDER_TOTAL_FRAMES);
        assert_eq!(transport.state().duration, PLACEHOLDER_DURATION);
        assert_eq!(transport.reported_keyframes(), None);
        assert_eq!(transport.take_seek(), None);
    }

    #[test]
    fn speed_must_be_positive() {
        let mut transport = TransportController::default();
        assert_eq!(transport.set_speed(0.0), Err(TransportError::InvalidSpeed(0.0)));
        assert!(transport.set_speed(f32::INFINITY).is_err());
        for speed in SPEED_CHOICES {
            transport.set_speed(speed).unwrap();
            assert_eq!(transport.state().speed, speed);
        }
    }
}
