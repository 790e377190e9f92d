use crate::camera3d::Camera3D;
use crate::camera_nav::{yaw_pitch_degrees, CameraNavigator, Pose, ViewpointRig};
use crate::catalog::{AnimationCatalog, AnimationSource, Selection};
use crate::config::AppConfig;
use crate::events::StageEvent;
use crate::input::{Input, StageAction};
use crate::placement::{PlacementEngine, PlacementParams};
use crate::prop_registry::PropRegistry;
use crate::scene::{LoadPoll, SceneDef, SceneLoader};
use crate::search::SearchPanel;
use crate::stage::StageWorld;
use crate::time::Time;
use glam::{Vec2, Vec3};
use std::collections::VecDeque;
use winit::dpi::PhysicalSize;

const VIEW_FOV_RADIANS: f32 = 60.0_f32.to_radians();
const VIEW_NEAR: f32 = 0.1;
const VIEW_FAR: f32 = 1000.0;
const EVENT_LOG_LIMIT: usize = 64;

/// Scene-load sequencing: one load in flight, one settle tick between
/// resolution and activation so the incoming scene graph finishes its own
/// setup before the activation pass runs.
enum SceneLoadState {
    Idle,
    Loading { name: String, progress: f32 },
    Settling { scene: SceneDef },
}

/// Ties the catalog, placement engine, camera navigator, and stage world to
/// the collaborator seams (input actions, scene loads, the renderer's derived
/// state reads). All mutation funnels through here, one tick at a time.
pub struct SessionCoordinator {
    config: AppConfig,
    catalog: AnimationCatalog,
    selection: Selection,
    search: SearchPanel,
    placement: PlacementEngine,
    navigator: CameraNavigator,
    stage: StageWorld,
    props: PropRegistry,
    loader: Box<dyn SceneLoader>,
    load_state: SceneLoadState,
    scene_index: usize,
    current_scene: Option<String>,
    cursor: Option<(f32, f32)>,
    viewport: PhysicalSize<u32>,
    recent_events: VecDeque<StageEvent>,
    clock: Time,
}

impl SessionCoordinator {
    pub fn new(
        config: AppConfig,
        props: PropRegistry,
        source: &dyn AnimationSource,
        loader: Box<dyn SceneLoader>,
    ) -> Self {
        let mut catalog = AnimationCatalog::new();
        catalog.load(
            source,
            &config.catalog.preferred_collection,
            &config.catalog.fallback_collection,
        );

        let mut stage = StageWorld::new();
        stage.spawn_viewpoint(Pose::IDENTITY, true);
        let navigator = CameraNavigator::new(Pose::IDENTITY, config.camera);
        let placement = PlacementEngine::new(config.placement);

        Self {
            catalog,
            selection: Selection::default(),
            search: SearchPanel::default(),
            placement,
            navigator,
            stage,
            props,
            loader,
            load_state: SceneLoadState::Idle,
            scene_index: 0,
            current_scene: None,
            cursor: None,
            viewport: PhysicalSize::new(1280, 720),
            recent_events: VecDeque::new(),
            clock: Time::new(),
            config,
        }
    }

    pub fn set_viewport(&mut self, viewport: PhysicalSize<u32>) {
        self.viewport = viewport;
    }

    /// Explicit catalog reload; resets the selection cursor and refreshes the
    /// search view against the new contents.
    pub fn reload_catalog(&mut self, source: &dyn AnimationSource) -> usize {
        let count = self.catalog.load(
            source,
            &self.config.catalog.preferred_collection,
            &self.config.catalog.fallback_collection,
        );
        self.selection.reset();
        self.search.refresh(&self.catalog);
        count
    }

    /// Consumes one frame's worth of translated input: fired actions first,
    /// then the confirm/delete clicks against the pointer ray.
    pub fn handle_frame_input(&mut self, input: &mut Input) {
        self.cursor = input.cursor_position();
        for action in input.take_actions() {
            self.dispatch(action);
        }
        if input.take_left_click() {
            let ray = self.pointer_ray();
            let entry = self.selection.current(&self.catalog);
            self.placement.place_at(&mut self.stage, &self.props, entry, ray);
        }
        if input.take_right_click() {
            let ray = self.pointer_ray();
            self.placement.delete_at(&mut self.stage, ray);
        }
    }

    pub fn dispatch(&mut self, action: StageAction) {
        match action {
            StageAction::CameraCycle => {
                let before = self.navigator.current_slot();
                self.navigator.cycle(&mut self.stage);
                let slot = self.navigator.current_slot();
                if slot != before {
                    self.stage.push_event(StageEvent::CameraSlotEntered {
                        slot,
                        label: self.navigator.slot_label().to_string(),
                    });
                }
            }
            StageAction::PreviewToggle => {
                let entry = self.selection.current(&self.catalog);
                self.placement.toggle_preview_mode(&mut self.stage, &self.props, entry);
            }
            StageAction::AnimationNext => self.switch_animation(1),
            StageAction::AnimationPrev => self.switch_animation(-1),
            StageAction::AnimationReplay => self.placement.replay_all(&mut self.stage),
            StageAction::ScaleUp => {
                let step = self.placement.scale_step();
                self.placement.increment_scale(&mut self.stage, step);
            }
            StageAction::ScaleDown => {
                let step = self.placement.scale_step();
                self.placement.increment_scale(&mut self.stage, -step);
            }
            StageAction::RotateStep => {
                let step = self.placement.rotation_step();
                self.placement.increment_yaw(&mut self.stage, step);
            }
            StageAction::PrototypeNext => self.cycle_prototype(1),
            StageAction::PrototypePrev => self.cycle_prototype(-1),
            StageAction::SearchToggle => self.search.toggle(&self.catalog),
            StageAction::SceneNext => self.request_scene_cycle(),
        }
    }

    /// Relative animation switch: wraps over the catalog and re-applies the
    /// new clip to a live preview without resetting its playback.
    fn switch_animation(&mut self, direction: i32) {
        if let Some(entry) = self.selection.switch(&self.catalog, direction) {
            let name = entry.name.clone();
            self.placement.apply_animation_to_preview(&mut self.stage, entry, false);
            self.stage.push_event(StageEvent::AnimationSwitched { name });
        }
    }

    fn cycle_prototype(&mut self, direction: i32) {
        let entry = self.selection.current(&self.catalog);
        self.placement.cycle_prototype(&mut self.stage, &self.props, direction, entry);
    }

    /// Absolute selection (search panel clicks and cursor moves land here):
    /// applies the clip to the preview *and* restarts its playback.
    pub fn select_animation(&mut self, name: &str) {
        if let Some(entry) = self.selection.select_by_name(&self.catalog, name) {
            let name = entry.name.clone();
            self.placement.apply_animation_to_preview(&mut self.stage, entry, true);
            self.stage.push_event(StageEvent::AnimationSwitched { name });
        }
    }

    pub fn search_set_query(&mut self, query: impl Into<String>) {
        if self.search.is_open() {
            self.search.set_query(&self.catalog, query);
        }
    }

    pub fn search_move_cursor(&mut self, direction: i32) {
        let Some(name) = self.search.move_cursor(direction).map(str::to_string) else {
            return;
        };
        self.select_animation(&name);
    }

    pub fn search_confirm(&mut self) {
        self.search.close();
    }

    /// Host-loop entry point: advances the session clock and runs one tick
    /// with the measured delta.
    pub fn tick_frame(&mut self) {
        self.clock.tick();
        let dt = self.clock.delta_seconds();
        self.tick(dt);
    }

    pub fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Per-frame tick: advance the scene-load machine, then preview tracking
    /// (skipped on camera-transition ticks so a stale viewpoint never drives
    /// the ray), then the stage schedule and popup expiry.
    pub fn tick(&mut self, dt: f32) {
        self.advance_scene_load();
        let camera_moved_this_tick = self.navigator.take_transition_tick();
        if self.placement.is_previewing()
            && !camera_moved_this_tick
            && matches!(self.load_state, SceneLoadState::Idle)
        {
            let ray = self.pointer_ray();
            self.placement.update_preview_position(&mut self.stage, ray);
        }
        self.stage.tick(dt);
        self.navigator.tick(dt);
        for event in self.stage.drain_events() {
            log::info!("event: {event}");
            if self.recent_events.len() == EVENT_LOG_LIMIT {
                self.recent_events.pop_front();
            }
            self.recent_events.push_back(event);
        }
    }

    /// Round-robins to the next configured scene. Rejected outright while a
    /// load is in flight; cleanup of placed instances happens before the load
    /// is issued so the outgoing scene never leaks registry entries.
    pub fn request_scene_cycle(&mut self) {
        if !matches!(self.load_state, SceneLoadState::Idle) {
            log::warn!("scene: load already in flight, request ignored");
            return;
        }
        if self.config.scenes.is_empty() {
            log::warn!("scene: no scenes configured");
            return;
        }
        let name = self.config.scenes[self.scene_index].clone();
        self.scene_index = (self.scene_index + 1) % self.config.scenes.len();

        self.placement.cleanup(&mut self.stage);
        match self.loader.begin(&name) {
            Ok(()) => {
                self.stage.push_event(StageEvent::SceneLoadStarted { name: name.clone() });
                self.load_state = SceneLoadState::Loading { name, progress: 0.0 };
            }
            Err(err) => {
                log::error!("scene: failed to begin load of '{name}': {err:#}");
            }
        }
    }

    fn advance_scene_load(&mut self) {
        let state = std::mem::replace(&mut self.load_state, SceneLoadState::Idle);
        self.load_state = match state {
            SceneLoadState::Idle => SceneLoadState::Idle,
            SceneLoadState::Loading { name, .. } => match self.loader.poll() {
                LoadPoll::Pending(progress) => SceneLoadState::Loading { name, progress },
                LoadPoll::Ready(scene) => SceneLoadState::Settling { scene },
                LoadPoll::Failed(reason) => {
                    log::error!("scene: load of '{name}' failed: {reason}");
                    self.stage.push_event(StageEvent::SceneLoadFailed { name, reason });
                    SceneLoadState::Idle
                }
            },
            SceneLoadState::Settling { scene } => {
                self.activate_scene(&scene);
                SceneLoadState::Idle
            }
        };
    }

    /// Activation pass, one settle tick after the load resolves: rebuild the
    /// statics, switch on the tagged ones, re-home the camera ring on the
    /// scene's spawn pose, and refresh the catalog view.
    fn activate_scene(&mut self, scene: &SceneDef) {
        self.stage.clear_statics();
        self.stage.populate_statics(scene);
        let enabled = self.stage.enable_statics_where(|tag, name| {
            tag == "SpawnPoint" || name.contains("Collider") || name.contains("Floor")
        });
        log::info!("scene: activated {} tagged statics in '{}'", enabled, scene.name);

        match scene.spawn_point.clone() {
            Some(data) => {
                let pose: Pose = data.into();
                self.stage.apply_pose(pose);
                let (yaw, pitch) = yaw_pitch_degrees(pose.rotation);
                self.stage.set_orientation(yaw, pitch);
                self.navigator.update_origin(pose);
            }
            None => {
                log::warn!("scene: '{}' has no spawn point, camera origin unchanged", scene.name);
            }
        }

        self.search.refresh(&self.catalog);
        self.current_scene = Some(scene.name.clone());
        self.stage.push_event(StageEvent::SceneActivated { name: scene.name.clone() });
    }

    fn pointer_ray(&self) -> Option<(Vec3, Vec3)> {
        let (x, y) = self.cursor?;
        let pose = self.stage.active_pose()?;
        let camera =
            Camera3D::from_pose(pose.position, pose.rotation, VIEW_FOV_RADIANS, VIEW_NEAR, VIEW_FAR);
        camera.screen_ray(Vec2::new(x, y), self.viewport)
    }

    // ---------- derived state for the renderer ----------

    pub fn current_animation_label(&self) -> &str {
        self.selection.current_label(&self.catalog)
    }

    pub fn slot_label(&self) -> &str {
        self.navigator.slot_label()
    }

    pub fn popup_label(&self) -> Option<&str> {
        self.navigator.popup_label()
    }

    pub fn placement_params(&self) -> PlacementParams {
        self.placement.params()
    }

    pub fn is_previewing(&self) -> bool {
        self.placement.is_previewing()
    }

    pub fn placed_count(&self) -> usize {
        self.placement.placed().len()
    }

    pub fn is_loading_scene(&self) -> bool {
        !matches!(self.load_state, SceneLoadState::Idle)
    }

    pub fn load_progress(&self) -> Option<f32> {
        match &self.load_state {
            SceneLoadState::Loading { progress, .. } => Some(*progress),
            SceneLoadState::Settling { .. } => Some(1.0),
            SceneLoadState::Idle => None,
        }
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    pub fn recent_events(&self) -> impl Iterator<Item = &StageEvent> {
        self.recent_events.iter()
    }

    pub fn catalog(&self) -> &AnimationCatalog {
        &self.catalog
    }

    pub fn search(&self) -> &SearchPanel {
        &self.search
    }

    pub fn navigator(&self) -> &CameraNavigator {
        &self.navigator
    }

    pub fn placement(&self) -> &PlacementEngine {
        &self.placement
    }

    pub fn stage(&self) -> &StageWorld {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut StageWorld {
        &mut self.stage
    }
}
