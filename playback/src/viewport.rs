//! One panel: a requested asset, its load status, a playback engine and an
//! orbit controller fed from the shared camera.
//!
//! Loads are identified by a [`LoadTicket`]. Any change of request bumps the
//! generation, so a result that arrives for an older ticket is dropped.

use glam::Mat4;

use crate::camera::{CameraSync, OrbitController};
use crate::engine::{PlaybackEngine, PlaybackState, Role};
use crate::error::{TransportError, ViewportError};
use crate::keyframes::{KeyframeEstimate, duration_estimate, estimate_keyframes};
use crate::model::AnimationClip;
use crate::normalize::NormalizedModel;
use crate::pose::{self, SkinnedVertices};
use crate::presets::{PresetChannel, PresetFollower};
use crate::source::AssetRequest;
use crate::store::Subscription;
use crate::transport::{PLACEHOLDER_DURATION, TransportController, ViewportId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportKind {
    Source,
    Target { row: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No character in this slot.
    Empty,
    Pending,
    Loaded,
    Error { kind: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub viewport: ViewportId,
    pub generation: u64,
    pub request: AssetRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// The ticket was superseded before the result arrived.
    Discarded,
}

/// What the panel renders. The grid is drawn under the model as well.
#[derive(Debug)]
pub enum ViewportContent<'a> {
    Model(&'a NormalizedModel),
    Grid,
}

#[derive(Debug)]
pub struct Viewport {
    id: ViewportId,
    kind: ViewportKind,
    character: Option<String>,
    request: Option<AssetRequest>,
    generation: u64,
    status: LoadStatus,
    model: Option<NormalizedModel>,
    engine: PlaybackEngine,
    orbit: OrbitController,
    camera_subscription: Subscription,
    presets: PresetFollower,
}

impl Viewport {
    pub fn new(
        id: ViewportId,
        kind: ViewportKind,
        role: Role,
        camera: &CameraSync,
        presets: &PresetChannel,
    ) -> Self {
        Self {
            id,
            kind,
            character: None,
            request: None,
            generation: 0,
            status: LoadStatus::Empty,
            model: None,
            engine: PlaybackEngine::new(id, role),
            orbit: OrbitController::from_pose(camera.pose()),
            camera_subscription: camera.subscribe(),
            presets: presets.follower(),
        }
    }

    pub fn id(&self) -> ViewportId {
        self.id
    }

    pub fn kind(&self) -> ViewportKind {
        self.kind
    }

    pub fn role(&self) -> Role {
        self.engine.role()
    }

    pub fn character(&self) -> Option<&str> {
        self.character.as_deref()
    }

    pub fn request(&self) -> Option<&AssetRequest> {
        self.request.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.engine.state()
    }

    pub fn time(&self) -> Option<f32> {
        self.engine.time()
    }

    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    pub fn orbit_mut(&mut self) -> &mut OrbitController {
        &mut self.orbit
    }

    pub fn model(&self) -> Option<&NormalizedModel> {
        self.model.as_ref()
    }

    /// Points the panel at a new asset. Anything tied to the previous path
    /// is dropped before the new load starts.
    pub fn set_request(
        &mut self,
        character: Option<String>,
        request: Option<AssetRequest>,
    ) -> Option<LoadTicket> {
        if self.request == request && self.character == character {
            return None;
        }
        self.generation += 1;
        self.model = None;
        self.character = character;
        self.request = request;

        match &self.request {
            Some(request) => {
                self.status = LoadStatus::Pending;
                self.engine.begin_loading();
                Some(LoadTicket {
                    viewport: self.id,
                    generation: self.generation,
                    request: request.clone(),
                })
            }
            None => {
                self.status = LoadStatus::Empty;
                self.engine.reset();
                None
            }
        }
    }

    /// Ticket for the current request, if it is still waiting on a load.
    pub fn pending_ticket(&self) -> Option<LoadTicket> {
        match (&self.status, &self.request) {
            (LoadStatus::Pending, Some(request)) => Some(LoadTicket {
                viewport: self.id,
                generation: self.generation,
                request: request.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.viewport == self.id
            && ticket.generation == self.generation
            && self.request.as_ref() == Some(&ticket.request)
    }

    pub fn complete(
        &mut self,
        ticket: &LoadTicket,
        result: Result<NormalizedModel, ViewportError>,
    ) -> LoadOutcome {
        if !self.is_current(ticket) {
            log::debug!(
                "Dropping superseded load of '{}' for viewport {:?}",
                ticket.request.path,
                self.id
            );
            return LoadOutcome::Discarded;
        }

        match result {
            Ok(model) => {
                let duration = model
                    .model
                    .primary_clip()
                    .map_or(0.0, |clip| clip.duration);
                self.engine.bind(duration);
                self.model = Some(model);
                self.status = LoadStatus::Loaded;
                LoadOutcome::Applied
            }
            Err(err) => {
                log::warn!(
                    "Viewport {:?} failed to load '{}': {}",
                    self.id,
                    ticket.request.path,
                    err
                );
                self.engine.fail();
                self.status = LoadStatus::Error {
                    kind: err.kind(),
                    message: err.to_string(),
                };
                LoadOutcome::Failed
            }
        }
    }

    pub fn content(&self) -> ViewportContent<'_> {
        match (&self.status, &self.model) {
            (LoadStatus::Loaded, Some(model)) => ViewportContent::Model(model),
            _ => ViewportContent::Grid,
        }
    }

    pub fn clip(&self) -> Option<&AnimationClip> {
        self.model.as_ref()?.model.primary_clip()
    }

    /// Keyframe report for the bound clip. A model without clips reports
    /// the placeholder duration.
    pub fn keyframe_estimate(&self) -> Option<KeyframeEstimate> {
        self.model.as_ref()?;
        Some(match self.clip() {
            Some(clip) => estimate_keyframes(clip),
            None => duration_estimate(PLACEHOLDER_DURATION),
        })
    }

    pub fn tick(
        &mut self,
        elapsed: f32,
        transport: &mut TransportController,
    ) -> Result<Option<f32>, TransportError> {
        self.engine.tick(elapsed, transport)
    }

    /// Copies the newest preset and the newest shared pose into the orbit
    /// controller.
    pub fn sync_camera(&mut self, camera: &CameraSync, presets: &PresetChannel) {
        if let Some(pose) = self.presets.poll(presets) {
            self.orbit.set_pose(pose);
        }
        if let Some(pose) = camera.poll(&mut self.camera_subscription) {
            self.orbit.set_pose(pose);
        }
    }

    /// Node transforms at the cursor time, before normalization.
    pub fn current_globals(&self) -> Option<Vec<Mat4>> {
        let model = self.model.as_ref()?;
        let scene = model.model.scene();
        Some(match (self.clip(), self.engine.time()) {
            (Some(clip), Some(time)) => pose::sample_globals(scene, clip, time),
            _ => pose::rest_globals(scene),
        })
    }

    /// Skinned vertices of every mesh at the cursor time.
    pub fn skinned_meshes(&self) -> Option<Vec<SkinnedVertices>> {
        let globals = self.current_globals()?;
        let scene = self.model.as_ref()?.model.scene();
        Some(
            scene
                .meshes
                .iter()
                .map(|mesh| pose::skin_mesh(mesh, &globals))
                .collect(),
        )
    }
}
