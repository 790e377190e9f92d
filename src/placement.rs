use crate::catalog::AnimationEntry;
use crate::config::PlacementConfig;
use crate::events::StageEvent;
use crate::prop_registry::PropRegistry;
use crate::stage::StageWorld;
use bevy_ecs::prelude::Entity;
use glam::Vec3;

pub const SCALE_MIN: f32 = 0.1;
pub const SCALE_MAX: f32 = 5.0;

/// Spawn template shared by the preview instance and every confirmed
/// placement. Scale clamps at the bounds; yaw wraps into `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementParams {
    pub scale: f32,
    pub yaw_degrees: f32,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self { scale: 1.0, yaw_degrees: 0.0 }
    }
}

impl PlacementParams {
    pub fn increment_scale(&mut self, amount: f32) {
        self.scale = (self.scale + amount).clamp(SCALE_MIN, SCALE_MAX);
    }

    pub fn increment_yaw(&mut self, amount: f32) {
        self.yaw_degrees = crate::wrap_degrees(self.yaw_degrees + amount);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    Idle,
    Previewing,
}

/// Owns the single preview instance and the registry of placed instances.
/// Every operation commits its full transition before returning; the
/// registry never holds an id whose instance is gone.
pub struct PlacementEngine {
    mode: PlacementMode,
    params: PlacementParams,
    prototype_index: usize,
    preview: Option<Entity>,
    placed: Vec<Entity>,
    config: PlacementConfig,
}

impl PlacementEngine {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            mode: PlacementMode::Idle,
            params: PlacementParams::default(),
            prototype_index: 0,
            preview: None,
            placed: Vec::new(),
            config,
        }
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn is_previewing(&self) -> bool {
        self.mode == PlacementMode::Previewing
    }

    pub fn params(&self) -> PlacementParams {
        self.params
    }

    pub fn prototype_index(&self) -> usize {
        self.prototype_index
    }

    pub fn preview_entity(&self) -> Option<Entity> {
        self.preview
    }

    pub fn placed(&self) -> &[Entity] {
        &self.placed
    }

    pub fn toggle_preview_mode(
        &mut self,
        stage: &mut StageWorld,
        props: &PropRegistry,
        animation: Option<&AnimationEntry>,
    ) {
        match self.mode {
            PlacementMode::Idle => {
                self.mode = PlacementMode::Previewing;
                self.preload(stage, props, animation);
            }
            PlacementMode::Previewing => {
                self.mode = PlacementMode::Idle;
                self.destroy_preview(stage);
            }
        }
    }

    /// Instantiates a fresh preview from the current prototype at the world
    /// origin: destroys any existing preview first, applies the spawn params
    /// and the current animation, and ghosts every renderable part. An
    /// out-of-range prototype index logs and leaves no instance behind.
    pub fn preload(
        &mut self,
        stage: &mut StageWorld,
        props: &PropRegistry,
        animation: Option<&AnimationEntry>,
    ) {
        self.destroy_preview(stage);
        let Some(prototype) = props.get(self.prototype_index) else {
            log::error!(
                "placement: cannot preload, prototype index {} out of range ({} registered)",
                self.prototype_index,
                props.len()
            );
            return;
        };
        let entity =
            stage.spawn_prop(prototype, Vec3::ZERO, self.params.yaw_degrees, self.params.scale);
        stage.set_ghosted(entity, true);
        if let Some(entry) = animation {
            stage.apply_animation(entity, entry, false);
        }
        stage.push_event(StageEvent::PreviewStarted { entity, prototype: prototype.name.clone() });
        self.preview = Some(entity);
    }

    fn destroy_preview(&mut self, stage: &mut StageWorld) {
        if let Some(entity) = self.preview.take() {
            stage.despawn(entity);
            stage.push_event(StageEvent::PreviewEnded);
        }
    }

    /// Switches the spawn template to a neighbouring prototype, re-preloading
    /// the preview when one is live.
    pub fn cycle_prototype(
        &mut self,
        stage: &mut StageWorld,
        props: &PropRegistry,
        direction: i32,
        animation: Option<&AnimationEntry>,
    ) {
        if props.is_empty() {
            return;
        }
        let count = props.len() as i64;
        self.prototype_index =
            (self.prototype_index as i64 + direction as i64).rem_euclid(count) as usize;
        if self.is_previewing() {
            self.preload(stage, props, animation);
        }
    }

    /// Re-casts the pointer ray and moves the preview to the hit point plus
    /// the clearance offset. A miss keeps the preview where it last stood.
    pub fn update_preview_position(
        &mut self,
        stage: &mut StageWorld,
        ray: Option<(Vec3, Vec3)>,
    ) {
        let Some(preview) = self.preview else {
            return;
        };
        let Some((origin, direction)) = ray else {
            return;
        };
        if let Some(hit) = stage.cast_ray_excluding(origin, direction, Some(preview)) {
            let position = hit.point + Vec3::Y * self.config.spawn_clearance;
            stage.set_prop_position(preview, position);
        }
    }

    /// Confirms a placement: spawns an independent instance at the hit point
    /// with the current params and animation, and appends it to the registry.
    pub fn place_at(
        &mut self,
        stage: &mut StageWorld,
        props: &PropRegistry,
        animation: Option<&AnimationEntry>,
        ray: Option<(Vec3, Vec3)>,
    ) -> Option<Entity> {
        if !self.is_previewing() {
            return None;
        }
        let prototype = props.get(self.prototype_index)?;
        let (origin, direction) = ray?;
        let hit = stage.cast_ray_excluding(origin, direction, self.preview)?;
        let position = hit.point + Vec3::Y * self.config.spawn_clearance;
        let entity = stage.spawn_prop(prototype, position, self.params.yaw_degrees, self.params.scale);
        if let Some(entry) = animation {
            stage.apply_animation(entity, entry, false);
        }
        stage.push_event(StageEvent::PropPlaced {
            entity,
            prototype: prototype.name.clone(),
            animation: animation.map(|entry| entry.name.clone()),
        });
        self.placed.push(entity);
        Some(entity)
    }

    /// Deletes the placed instance under the pointer, resolving part hits up
    /// the hierarchy to their registry root. Registry removal and instance
    /// destruction happen together.
    pub fn delete_at(&mut self, stage: &mut StageWorld, ray: Option<(Vec3, Vec3)>) -> Option<Entity> {
        let (origin, direction) = ray?;
        let hit = stage.cast_ray_excluding(origin, direction, self.preview)?;
        let root = stage
            .hierarchy_chain(hit.entity)
            .into_iter()
            .find(|candidate| self.placed.contains(candidate))?;
        self.placed.retain(|&entity| entity != root);
        stage.despawn(root);
        stage.push_event(StageEvent::PropDeleted { entity: root });
        Some(root)
    }

    pub fn increment_scale(&mut self, stage: &mut StageWorld, amount: f32) {
        self.params.increment_scale(amount);
        self.apply_params_to_preview(stage);
    }

    pub fn increment_yaw(&mut self, stage: &mut StageWorld, amount: f32) {
        self.params.increment_yaw(amount);
        self.apply_params_to_preview(stage);
    }

    fn apply_params_to_preview(&mut self, stage: &mut StageWorld) {
        if let Some(preview) = self.preview {
            stage.set_prop_params(preview, self.params.yaw_degrees, self.params.scale);
        }
    }

    pub fn apply_animation_to_preview(
        &mut self,
        stage: &mut StageWorld,
        entry: &AnimationEntry,
        reset: bool,
    ) {
        if let Some(preview) = self.preview {
            stage.apply_animation(preview, entry, reset);
        }
    }

    /// Resets playback on the preview and every placed instance without
    /// touching the selection.
    pub fn replay_all(&mut self, stage: &mut StageWorld) {
        if let Some(preview) = self.preview {
            stage.reset_playback(preview);
        }
        for &entity in &self.placed {
            stage.reset_playback(entity);
        }
    }

    /// Scene-boundary cleanup: every placed instance and the preview go away.
    pub fn cleanup(&mut self, stage: &mut StageWorld) {
        for entity in self.placed.drain(..) {
            stage.despawn(entity);
        }
        self.destroy_preview(stage);
        self.mode = PlacementMode::Idle;
    }

    pub fn scale_step(&self) -> f32 {
        self.config.scale_step
    }

    pub fn rotation_step(&self) -> f32 {
        self.config.rotation_step_degrees
    }
}
