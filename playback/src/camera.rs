//! Shared camera pose and the orbit controller every viewport drives.

use glam::{Vec2, Vec3};

use crate::store::{SharedState, Subscription};
use crate::transport::ViewportId;

pub const MIN_DISTANCE: f32 = 1.0;
pub const MAX_DISTANCE: f32 = 10.0;
const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.0, 1.0, 2.0),
            target: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

impl CameraPose {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self { position, target }
    }

    /// World up, or -Z when looking straight down the Y axis.
    pub fn up(&self) -> Vec3 {
        let forward = (self.target - self.position).normalize_or_zero();
        if forward.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::NEG_Z
        } else {
            Vec3::Y
        }
    }
}

/// Last write wins; every subscriber copies the pose unconditionally.
#[derive(Debug, Clone, Default)]
pub struct CameraSync {
    state: SharedState<CameraPose>,
}

impl CameraSync {
    pub fn pose(&self) -> CameraPose {
        *self.state.get()
    }

    pub fn publish(&mut self, from: ViewportId, pose: CameraPose) {
        self.state.set(Some(from), pose);
    }

    pub fn reset(&mut self) {
        self.state.set(None, CameraPose::default());
    }

    pub fn last_writer(&self) -> Option<ViewportId> {
        self.state.last_writer()
    }

    pub fn subscribe(&self) -> Subscription {
        self.state.subscribe_fresh()
    }

    pub fn poll(&self, subscription: &mut Subscription) -> Option<CameraPose> {
        subscription.poll(&self.state).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrbitGesture {
    /// Radians.
    Rotate { yaw: f32, pitch: f32 },
    /// Positive values move closer.
    Zoom(f32),
    /// Screen-space pan in world units.
    Pan(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitController {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::from_pose(CameraPose::default())
    }
}

impl OrbitController {
    pub fn from_pose(pose: CameraPose) -> Self {
        let mut orbit = Self {
            target: pose.target,
            yaw: 0.0,
            pitch: 0.0,
            distance: MIN_DISTANCE,
        };
        orbit.set_pose(pose);
        orbit
    }

    /// Overwrites the controller with a pose. The pose distance is kept even
    /// outside the zoom range so presets land exactly.
    pub fn set_pose(&mut self, pose: CameraPose) {
        let offset = pose.position - pose.target;
        let distance = offset.length();
        self.target = pose.target;
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance;
        self.pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        self.yaw = offset.z.atan2(offset.x);
    }

    pub fn pose(&self) -> CameraPose {
        CameraPose {
            position: self.target + self.direction() * self.distance,
            target: self.target,
        }
    }

    pub fn apply(&mut self, gesture: OrbitGesture) -> CameraPose {
        match gesture {
            OrbitGesture::Rotate { yaw, pitch } => {
                self.yaw += yaw;
                self.pitch = (self.pitch + pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
            }
            OrbitGesture::Zoom(amount) => {
                self.distance = (self.distance - amount).clamp(MIN_DISTANCE, MAX_DISTANCE);
            }
            OrbitGesture::Pan(delta) => {
                let forward = -self.direction();
                let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
                let up = right.cross(forward).normalize_or(Vec3::Y);
                self.target += right * delta.x + up * delta.y;
            }
        }
        self.pose()
    }

    fn direction(&self) -> Vec3 {
        let cos_pitch = self.pitch.cos();
        Vec3::new(
            self.yaw.cos() * cos_pitch,
            self.pitch.sin(),
            self.yaw.sin() * cos_pitch,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn assert_pose_eq(actual: CameraPose, expected: CameraPose) {
        assert!(
            actual.position.distance(expected.position) < EPSILON
                && actual.target.distance(expected.target) < EPSILON,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn controller_reproduces_the_pose_it_was_given() {
        let pose = CameraPose::default();
        assert_pose_eq(OrbitController::from_pose(pose).pose(), pose);

        let top = CameraPose::new(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO);
        assert_pose_eq(OrbitController::from_pose(top).pose(), top);
        assert_eq!(top.up(), Vec3::NEG_Z);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut orbit = OrbitController::default();
        orbit.apply(OrbitGesture::Zoom(100.0));
        assert_eq!(orbit.distance, MIN_DISTANCE);
        orbit.apply(OrbitGesture::Zoom(-100.0));
        assert_eq!(orbit.distance, MAX_DISTANCE);
    }

    #[test]
    fn pan_moves_target_and_position_together() {
        let mut orbit = OrbitController::default();
        let before = orbit.pose();
        let after = orbit.apply(OrbitGesture::Pan(Vec2::new(0.0, 0.5)));
        let shift = after.target - before.target;
        assert!((after.position - before.position - shift).length() < EPSILON);
        assert!((shift.length() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn broadcast_reaches_every_subscriber_once() {
        let mut sync = CameraSync::default();
        let mut subscribers: Vec<_> = (0..4).map(|_| sync.subscribe()).collect();
        let mut orbits = vec![OrbitController::default(); 4];

        let pose = orbits[2].apply(OrbitGesture::Rotate {
            yaw: 0.3,
            pitch: 0.1,
        });
        sync.publish(ViewportId(2), pose);

        for (subscription, orbit) in subscribers.iter_mut().zip(&mut orbits) {
            if let Some(shared) = sync.poll(subscription) {
                orbit.set_pose(shared);
            }
            assert_pose_eq(orbit.pose(), pose);
            assert_eq!(sync.poll(subscription), None);
        }
        assert_eq!(sync.last_writer(), Some(ViewportId(2)));
    }
}
