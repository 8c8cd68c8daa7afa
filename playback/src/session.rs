//! The explorer session: one source viewport, a grid of target viewports and
//! the shared transport, camera and preset channels they all follow.
//!
//! Target viewports are addressed row-major. Row `r`, column `c` shows the
//! `c`-th character of the current carousel page, loaded from that row's
//! base path.

use catalog::{AssetLocator, Carousel, Catalog, DEFAULT_TARGETS_PER_PAGE, DownloadLink, MotionClip};
use rand::Rng;

use crate::asset::AssetFormat;
use crate::camera::{CameraPose, CameraSync, OrbitGesture};
use crate::engine::Role;
use crate::error::{PresetError, TransportError, ViewportError};
use crate::normalize::NormalizedModel;
use crate::presets::{PresetChannel, ViewPreset};
use crate::source::AssetRequest;
use crate::transport::{TransportController, ViewportId};
use crate::viewport::{LoadOutcome, LoadTicket, Viewport, ViewportKind};

pub const DEFAULT_SOURCE_BASE: &str = "mixamo_fbx";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRow {
    pub label: String,
    pub base: String,
    /// Inserted into download file names to tell rows apart.
    pub download_tag: Option<String>,
}

impl TargetRow {
    pub fn new(label: impl Into<String>, base: impl Into<String>, download_tag: Option<&str>) -> Self {
        Self {
            label: label.into(),
            base: base.into(),
            download_tag: download_tag.map(str::to_string),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("MIRRORED_ANIMS_RETARGETING", "fbx", None),
            Self::new("MIXAMO_RETARGETING", "mixamo_fbx", Some("mixamo")),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub page_size: usize,
    pub source_base: String,
    pub target_rows: Vec<TargetRow>,
    /// Paths it builds are relative to the asset source root.
    pub locator: AssetLocator,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_TARGETS_PER_PAGE,
            source_base: DEFAULT_SOURCE_BASE.to_string(),
            target_rows: TargetRow::defaults(),
            locator: AssetLocator::new("", AssetFormat::Glb.into()),
        }
    }
}

#[derive(Debug)]
pub struct ExplorerSession {
    config: SessionConfig,
    catalog: Catalog,
    active: usize,
    carousel: Carousel,
    transport: TransportController,
    camera: CameraSync,
    presets: PresetChannel,
    source: Viewport,
    targets: Vec<Viewport>,
    keyframes_reported: bool,
    pending: Vec<LoadTicket>,
}

impl ExplorerSession {
    pub fn new(catalog: Catalog, mut config: SessionConfig) -> Self {
        config.page_size = config.page_size.max(1);
        let transport = TransportController::new(ViewportId::SOURCE);
        let camera = CameraSync::default();
        let presets = PresetChannel::new(ViewportId::SOURCE);

        let source = Viewport::new(
            ViewportId::SOURCE,
            ViewportKind::Source,
            Role::Authority,
            &camera,
            &presets,
        );
        let mut targets = Vec::with_capacity(config.target_rows.len() * config.page_size);
        for row in 0..config.target_rows.len() {
            for column in 0..config.page_size {
                targets.push(Viewport::new(
                    target_id(config.page_size, row, column),
                    ViewportKind::Target { row, column },
                    Role::Follower,
                    &camera,
                    &presets,
                ));
            }
        }

        let mut session = Self {
            carousel: Carousel::new(config.page_size),
            config,
            catalog,
            active: 0,
            transport,
            camera,
            presets,
            source,
            targets,
            keyframes_reported: false,
            pending: Vec::new(),
        };
        session.refresh_requests();
        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_clip(&self) -> &MotionClip {
        &self.catalog.clips()[self.active]
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn carousel_label(&self) -> String {
        self.carousel.label(self.active_clip().targets.len())
    }

    pub fn transport(&self) -> &TransportController {
        &self.transport
    }

    pub fn camera(&self) -> &CameraSync {
        &self.camera
    }

    pub fn presets(&self) -> &PresetChannel {
        &self.presets
    }

    /// `frame / max` as shown next to the slider.
    pub fn frame_label(&self) -> String {
        format!(
            "{} / {}",
            self.transport.state().frame_index,
            self.transport.slider_max()
        )
    }

    pub fn source(&self) -> &Viewport {
        &self.source
    }

    pub fn targets(&self) -> &[Viewport] {
        &self.targets
    }

    /// Source first, then targets row by row.
    pub fn viewports(&self) -> impl Iterator<Item = &Viewport> {
        std::iter::once(&self.source).chain(self.targets.iter())
    }

    pub fn viewport(&self, id: ViewportId) -> Option<&Viewport> {
        self.viewports().find(|viewport| viewport.id() == id)
    }

    pub fn viewport_mut(&mut self, id: ViewportId) -> Option<&mut Viewport> {
        if self.source.id() == id {
            return Some(&mut self.source);
        }
        self.targets.iter_mut().find(|viewport| viewport.id() == id)
    }

    pub fn target_id(&self, row: usize, column: usize) -> ViewportId {
        target_id(self.config.page_size, row, column)
    }

    /// Switches clip and resets everything derived from the previous one.
    /// Returns `false` when nothing changed.
    pub fn select_clip(&mut self, index: usize) -> bool {
        if index >= self.catalog.len() {
            log::warn!("Ignoring selection of clip {index}, catalog has {}", self.catalog.len());
            return false;
        }
        if index == self.active {
            return false;
        }
        self.active = index;
        self.carousel.reset();
        self.transport.reset();
        self.camera.reset();
        self.keyframes_reported = false;
        log::info!("Active clip: {}", self.active_clip().name);
        self.refresh_requests();
        true
    }

    pub fn random_clip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let index = self.catalog.pick_random(rng);
        self.select_clip(index);
        index
    }

    pub fn next_page(&mut self) {
        let count = self.active_clip().targets.len();
        self.carousel.next(count);
        self.refresh_requests();
    }

    pub fn previous_page(&mut self) {
        let count = self.active_clip().targets.len();
        self.carousel.previous(count);
        self.refresh_requests();
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.transport.toggle_running()
    }

    pub fn set_speed(&mut self, speed: f32) -> Result<(), TransportError> {
        self.transport.set_speed(speed)
    }

    pub fn scrub_to_frame(&mut self, frame: u32) {
        self.transport.scrub_to_frame(frame);
    }

    /// Issues a preset and funnels its pose through the camera channel.
    pub fn issue_view_preset(&mut self, from: ViewportId, preset: ViewPreset) -> Result<(), PresetError> {
        let command = self.presets.issue(from, preset)?;
        self.camera.publish(from, command.preset.pose());
        Ok(())
    }

    /// Applies a gesture to one viewport's controller and broadcasts the
    /// resulting pose.
    pub fn orbit_camera(&mut self, id: ViewportId, gesture: OrbitGesture) -> Option<CameraPose> {
        let pose = self.viewport_mut(id)?.orbit_mut().apply(gesture);
        self.camera.publish(id, pose);
        Some(pose)
    }

    pub fn take_pending_loads(&mut self) -> Vec<LoadTicket> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter(|ticket| self.is_current(ticket))
            .collect()
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.viewport(ticket.viewport)
            .is_some_and(|viewport| viewport.is_current(ticket))
    }

    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<NormalizedModel, ViewportError>,
    ) -> LoadOutcome {
        let authority = self.transport.authority();
        let Some(viewport) = self.viewport_mut(ticket.viewport) else {
            return LoadOutcome::Discarded;
        };
        let outcome = viewport.complete(ticket, result);
        let estimate = viewport.keyframe_estimate();

        if outcome == LoadOutcome::Applied && ticket.viewport == authority && !self.keyframes_reported {
            if let Some(estimate) = estimate {
                match self.transport.report_keyframes(authority, estimate) {
                    Ok(()) => self.keyframes_reported = true,
                    Err(err) => log::warn!("Keyframe report rejected: {err}"),
                }
            }
        }
        outcome
    }

    /// One frame: the authority advances and publishes first, followers read
    /// the published time, then camera state propagates to every panel.
    pub fn tick(&mut self, elapsed: f32) {
        let authority = self.transport.authority();
        let Self {
            source,
            targets,
            transport,
            ..
        } = self;
        for leading in [true, false] {
            for viewport in std::iter::once(&mut *source).chain(targets.iter_mut()) {
                if (viewport.id() == authority) == leading {
                    tick_viewport(viewport, elapsed, transport);
                }
            }
        }
        self.propagate_camera();
    }

    pub fn propagate_camera(&mut self) {
        for viewport in std::iter::once(&mut self.source).chain(self.targets.iter_mut()) {
            viewport.sync_camera(&self.camera, &self.presets);
        }
    }

    pub fn download_for(&self, id: ViewportId) -> Option<DownloadLink> {
        let viewport = self.viewport(id)?;
        let character = viewport.character()?;
        let clip = self.active_clip();
        let (base, tag) = match viewport.kind() {
            ViewportKind::Source => (self.config.source_base.as_str(), None),
            ViewportKind::Target { row, .. } => {
                let row = self.config.target_rows.get(row)?;
                (row.base.as_str(), row.download_tag.as_deref())
            }
        };
        Some(self.config.locator.download_link(base, clip, character, tag))
    }

    fn refresh_requests(&mut self) {
        let clip = self.catalog.clips()[self.active].clone();
        let format = AssetFormat::from(self.config.locator.extension());
        let window = self.carousel.window(&clip.targets).to_vec();

        let source_request = AssetRequest::new(
            self.config
                .locator
                .asset_path(&self.config.source_base, &clip, &clip.source),
            format,
        );
        if let Some(ticket) = self
            .source
            .set_request(Some(clip.source.clone()), Some(source_request))
        {
            self.pending.push(ticket);
        }

        let page_size = self.config.page_size;
        for (index, viewport) in self.targets.iter_mut().enumerate() {
            let (row, column) = (index / page_size, index % page_size);
            let Some(target_row) = self.config.target_rows.get(row) else {
                continue;
            };
            let (character, request) = match window.get(column) {
                Some(character) => {
                    let path = self
                        .config
                        .locator
                        .asset_path(&target_row.base, &clip, character);
                    (Some(character.clone()), Some(AssetRequest::new(path, format)))
                }
                None => (None, None),
            };
            if let Some(ticket) = viewport.set_request(character, request) {
                self.pending.push(ticket);
            }
        }
    }
}

fn target_id(page_size: usize, row: usize, column: usize) -> ViewportId {
    let index = 1 + row * page_size + column;
    ViewportId(u16::try_from(index).unwrap_or(u16::MAX))
}

fn tick_viewport(viewport: &mut Viewport, elapsed: f32, transport: &mut TransportController) {
    if let Err(err) = viewport.tick(elapsed, transport) {
        log::warn!("Viewport {:?} tick rejected: {err}", viewport.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ExplorerSession {
        ExplorerSession::new(Catalog::builtin(), SessionConfig::default())
    }

    #[test]
    fn initial_requests_cover_source_and_first_page() {
        let mut session = session();
        let tickets = session.take_pending_loads();
        assert_eq!(tickets.len(), 1 + 2 * 3);

        let clip = session.active_clip().clone();
        assert_eq!(
            tickets[0].request.path,
            format!("mixamo_fbx/{}/YBot.fbx.glb", clip.id)
        );
        assert_eq!(
            tickets[1].request.path,
            format!("fbx/{}/Abe.fbx.glb", clip.id)
        );
        assert_eq!(
            tickets[4].request.path,
            format!("mixamo_fbx/{}/Abe.fbx.glb", clip.id)
        );
        assert!(session.take_pending_loads().is_empty());
    }

    #[test]
    fn paging_reloads_targets_but_not_the_source() {
        let mut session = session();
        session.take_pending_loads();
        session.next_page();
        let tickets = session.take_pending_loads();
        assert_eq!(tickets.len(), 6);
        assert!(tickets.iter().all(|t| t.viewport != ViewportId::SOURCE));
        assert_eq!(session.carousel_label(), "2 / 3");
        assert_eq!(session.targets()[0].character(), Some("claire"));

        session.previous_page();
        session.previous_page();
        assert_eq!(session.carousel_label(), "3 / 3");
    }

    #[test]
    fn target_ids_are_row_major_after_the_source() {
        let session = session();
        assert_eq!(session.target_id(0, 0), ViewportId(1));
        assert_eq!(session.target_id(1, 2), ViewportId(6));
        assert_eq!(session.targets()[5].id(), ViewportId(6));
    }

    #[test]
    fn downloads_point_at_the_fbx_original() {
        let session = session();
        let clip_name = session.active_clip().name.clone();
        let link = session.download_for(session.target_id(1, 0)).unwrap();
        assert!(link.path.ends_with("/Abe.fbx"));
        assert!(link.path.starts_with("mixamo_fbx/"));
        assert_eq!(link.file_name, format!("Abe_mixamo_{clip_name}.fbx"));

        let source = session.download_for(ViewportId::SOURCE).unwrap();
        assert!(source.file_name.starts_with("YBot_"));
    }

    #[test]
    fn selecting_the_same_clip_changes_nothing() {
        let mut session = session();
        session.take_pending_loads();
        assert!(!session.select_clip(0));
        assert!(!session.select_clip(99));
        assert!(session.take_pending_loads().is_empty());
    }
}
