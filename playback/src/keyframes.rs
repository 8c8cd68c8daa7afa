//! Keyframe count and duration of the source clip.

use crate::model::AnimationClip;

/// Sample counts below this are treated as a degenerate track set.
pub const MIN_PLAUSIBLE_KEYFRAMES: u32 = 10;

/// Samples per second assumed when the tracks cannot be trusted.
pub const FALLBACK_SAMPLE_RATE: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeEstimate {
    pub keyframes: u32,
    pub duration: f32,
    /// The count was derived from the duration rather than read from tracks.
    pub fallback_used: bool,
}

pub fn estimate_keyframes(clip: &AnimationClip) -> KeyframeEstimate {
    let duration = if clip.duration.is_finite() && clip.duration > 0.0 {
        clip.duration
    } else {
        0.0
    };

    let raw = clip
        .tracks
        .iter()
        .map(|track| track.sample_count())
        .max()
        .and_then(|count| u32::try_from(count).ok());

    match raw {
        Some(count) if count >= MIN_PLAUSIBLE_KEYFRAMES => KeyframeEstimate {
            keyframes: count,
            duration,
            fallback_used: false,
        },
        _ => {
            let estimate = duration_estimate(duration);
            log::debug!(
                "Clip '{}' has {:?} samples at most, assuming {} keyframes",
                clip.name,
                raw,
                estimate.keyframes
            );
            estimate
        }
    }
}

/// `round(duration * 30)`, at least one frame.
pub fn duration_estimate(duration: f32) -> KeyframeEstimate {
    let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
    KeyframeEstimate {
        keyframes: ((duration * FALLBACK_SAMPLE_RATE).round() as u32).max(1),
        duration,
        fallback_used: true,
    }
}
