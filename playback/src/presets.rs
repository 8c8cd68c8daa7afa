//! Front / side / top view presets.
//!
//! Presets are issued from the authority viewport only and carry a
//! monotonically increasing stamp, so a follower that missed several
//! commands applies just the newest one.

use glam::Vec3;

use crate::camera::CameraPose;
use crate::error::PresetError;
use crate::store::{SharedState, Subscription};
use crate::transport::ViewportId;

pub const PRESET_DISTANCE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPreset {
    Front,
    Side,
    Top,
}

impl ViewPreset {
    pub const ALL: [Self; 3] = [Self::Front, Self::Side, Self::Top];

    pub fn pose(self) -> CameraPose {
        match self {
            Self::Front => CameraPose::new(Vec3::new(0.0, 1.0, PRESET_DISTANCE), Vec3::Y),
            Self::Side => CameraPose::new(Vec3::new(PRESET_DISTANCE, 1.0, 0.0), Vec3::Y),
            Self::Top => CameraPose::new(Vec3::new(0.0, PRESET_DISTANCE, 0.0), Vec3::ZERO),
        }
    }

    /// Axis letter shown on the gizmo button.
    pub fn axis_label(self) -> &'static str {
        match self {
            Self::Front => "Z",
            Self::Side => "X",
            Self::Top => "Y",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Front => "Front",
            Self::Side => "Side",
            Self::Top => "Top",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresetCommand {
    pub preset: ViewPreset,
    pub stamp: u64,
    pub issued_by: ViewportId,
}

#[derive(Debug, Clone)]
pub struct PresetChannel {
    authority: ViewportId,
    next_stamp: u64,
    latest: SharedState<Option<PresetCommand>>,
}

impl PresetChannel {
    pub fn new(authority: ViewportId) -> Self {
        Self {
            authority,
            next_stamp: 1,
            latest: SharedState::new(None),
        }
    }

    pub fn issue(&mut self, from: ViewportId, preset: ViewPreset) -> Result<PresetCommand, PresetError> {
        if from != self.authority {
            return Err(PresetError::NotAuthority(from));
        }
        let command = PresetCommand {
            preset,
            stamp: self.next_stamp,
            issued_by: from,
        };
        self.next_stamp += 1;
        self.latest.set(Some(from), Some(command));
        Ok(command)
    }

    pub fn latest(&self) -> Option<PresetCommand> {
        *self.latest.get()
    }

    pub fn follower(&self) -> PresetFollower {
        PresetFollower {
            subscription: self.latest.subscribe(),
            applied_stamp: 0,
        }
    }
}

/// Per-viewport view of the channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresetFollower {
    subscription: Subscription,
    applied_stamp: u64,
}

impl PresetFollower {
    /// The pose of the newest unseen command, if any.
    pub fn poll(&mut self, channel: &PresetChannel) -> Option<CameraPose> {
        let command = (*self.subscription.poll(&channel.latest)?)?;
        self.accept(command)
    }

    /// Applies a command delivered out of band, ignoring stale stamps.
    pub fn accept(&mut self, command: PresetCommand) -> Option<CameraPose> {
        if command.stamp <= self.applied_stamp {
            return None;
        }
        self.applied_stamp = command.stamp;
        Some(command.preset.pose())
    }

    pub fn applied_stamp(&self) -> u64 {
        self.applied_stamp
    }
}
