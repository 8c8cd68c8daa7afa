//! Per-viewport playback engine.

use crate::error::TransportError;
use crate::transport::{TransportController, ViewportId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Ready,
    Running,
    Paused,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Advances wall-clock time and publishes it.
    Authority,
    /// Snaps to the published time every tick.
    Follower,
}

/// Play position inside one bound clip. Time wraps modulo the duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    pub time: f32,
    pub duration: f32,
    pub paused: bool,
    pub speed: f32,
}

impl PlaybackCursor {
    pub fn new(duration: f32) -> Self {
        Self {
            time: 0.0,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            paused: false,
            speed: 1.0,
        }
    }

    pub fn advance(&mut self, elapsed: f32) {
        if self.paused {
            return;
        }
        self.time = self.wrap(self.time + elapsed * self.speed);
    }

    /// Absolute set. The clip end itself is kept so a scrub to the last frame
    /// shows the last pose.
    pub fn seek(&mut self, time: f32) {
        self.time = if (0.0..=self.duration).contains(&time) {
            time
        } else {
            self.wrap(time)
        };
    }

    /// Follower sync: the shared time reduced modulo this clip's duration.
    pub fn sync_to(&mut self, shared_time: f32) {
        self.time = self.wrap(shared_time);
    }

    fn wrap(&self, time: f32) -> f32 {
        if self.duration <= 0.0 || !time.is_finite() {
            0.0
        } else {
            time.rem_euclid(self.duration)
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackEngine {
    viewport: ViewportId,
    role: Role,
    state: PlaybackState,
    cursor: Option<PlaybackCursor>,
}

impl PlaybackEngine {
    pub fn new(viewport: ViewportId, role: Role) -> Self {
        Self {
            viewport,
            role,
            state: PlaybackState::Idle,
            cursor: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> Option<&PlaybackCursor> {
        self.cursor.as_ref()
    }

    pub fn time(&self) -> Option<f32> {
        self.cursor.map(|cursor| cursor.time)
    }

    pub fn begin_loading(&mut self) {
        self.cursor = None;
        self.state = PlaybackState::Loading;
    }

    /// Clip bound after a successful load.
    pub fn bind(&mut self, duration: f32) {
        self.cursor = Some(PlaybackCursor::new(duration));
        self.state = PlaybackState::Ready;
    }

    pub fn fail(&mut self) {
        self.cursor = None;
        self.state = PlaybackState::Error;
    }

    pub fn reset(&mut self) {
        self.cursor = None;
        self.state = PlaybackState::Idle;
    }

    /// One render tick. Returns the cursor time when a clip is bound.
    pub fn tick(
        &mut self,
        elapsed: f32,
        transport: &mut TransportController,
    ) -> Result<Option<f32>, TransportError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };
        let shared = *transport.state();
        cursor.speed = shared.speed;
        cursor.paused = !shared.running;
        self.state = if shared.running {
            PlaybackState::Running
        } else {
            PlaybackState::Paused
        };

        match self.role {
            Role::Authority => {
                if let Some(seek) = transport.take_seek() {
                    cursor.seek(seek);
                } else if shared.running {
                    cursor.advance(elapsed);
                    transport.publish_time(self.viewport, cursor.time)?;
                } else {
                    cursor.seek(shared.shared_time);
                }
            }
            Role::Follower => cursor.sync_to(shared.shared_time),
        }
        Ok(Some(cursor.time))
    }
}
