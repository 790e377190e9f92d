use crate::camera_nav::{Pose, ViewpointRig};
use crate::catalog::AnimationEntry;
use crate::events::{EventBus, StageEvent};
use crate::prop_registry::PropPrototype;
use crate::scene::SceneDef;
use bevy_ecs::prelude::{Entity, Schedule, World};
use glam::{Quat, Vec3};
use smallvec::SmallVec;

pub mod picking;
pub mod systems;
pub mod types;

use picking::ray_hit_obb;
use types::{
    AnimationPlayer, Children, FlightState, Parent, PartBounds, PropRoot, RenderPart, SceneStatic,
    TickDelta, Transform3D, ViewpointTag,
};

#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Engine-side state the authoring session runs against: prop instance
/// lifecycle, scene statics, viewpoint rig, and per-tick animation playback.
pub struct StageWorld {
    pub world: World,
    schedule: Schedule,
}

impl Default for StageWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl StageWorld {
    pub fn new() -> Self {
        let mut world = World::new();
        world.insert_resource(TickDelta::default());
        world.insert_resource(EventBus::default());

        let mut schedule = Schedule::default();
        schedule.add_systems((systems::sys_advance_animation_players,));

        Self { world, schedule }
    }

    pub fn tick(&mut self, dt: f32) {
        self.world.resource_mut::<TickDelta>().0 = dt;
        self.schedule.run(&mut self.world);
    }

    pub fn push_event(&mut self, event: StageEvent) {
        self.world.resource_mut::<EventBus>().push(event);
    }

    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    // ---------- prop instances ----------

    pub fn spawn_prop(
        &mut self,
        prototype: &PropPrototype,
        position: Vec3,
        yaw_degrees: f32,
        scale: f32,
    ) -> Entity {
        let rotation = Quat::from_rotation_y(yaw_degrees.to_radians());
        let root = self
            .world
            .spawn((
                Transform3D { translation: position, rotation, scale: Vec3::splat(scale) },
                PropRoot { prototype: prototype.name.clone() },
                Children::default(),
            ))
            .id();
        let mut children = Vec::with_capacity(prototype.parts.len());
        for part in &prototype.parts {
            let child = self
                .world
                .spawn((
                    Transform3D { translation: part.offset, ..Default::default() },
                    RenderPart { label: part.label.clone(), ghosted: false, bounds: part.bounds },
                    Parent(root),
                ))
                .id();
            children.push(child);
        }
        if let Some(mut slot) = self.world.get_mut::<Children>(root) {
            slot.0 = children;
        }
        root
    }

    pub fn despawn(&mut self, entity: Entity) -> bool {
        if let Some(parent) = self.world.get::<Parent>(entity).copied() {
            if let Some(mut siblings) = self.world.get_mut::<Children>(parent.0) {
                siblings.0.retain(|&child| child != entity);
            }
        }
        let child_ids = self.world.get::<Children>(entity).map(|c| c.0.clone()).unwrap_or_default();
        let mut removed = false;
        for child in child_ids {
            removed |= self.despawn(child);
        }
        removed | self.world.despawn(entity)
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn set_prop_position(&mut self, entity: Entity, position: Vec3) -> bool {
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(entity) {
            transform.translation = position;
            true
        } else {
            false
        }
    }

    pub fn set_prop_params(&mut self, entity: Entity, yaw_degrees: f32, scale: f32) -> bool {
        if let Some(mut transform) = self.world.get_mut::<Transform3D>(entity) {
            transform.rotation = Quat::from_rotation_y(yaw_degrees.to_radians());
            transform.scale = Vec3::splat(scale);
            true
        } else {
            false
        }
    }

    pub fn prop_position(&self, entity: Entity) -> Option<Vec3> {
        self.world.get::<Transform3D>(entity).map(|t| t.translation)
    }

    pub fn prop_transform(&self, entity: Entity) -> Option<Transform3D> {
        self.world.get::<Transform3D>(entity).copied()
    }

    /// Flags every renderable part under the root for the preview-only
    /// override material.
    pub fn set_ghosted(&mut self, root: Entity, ghosted: bool) {
        let children = self.world.get::<Children>(root).map(|c| c.0.clone()).unwrap_or_default();
        for child in children {
            if let Some(mut part) = self.world.get_mut::<RenderPart>(child) {
                part.ghosted = ghosted;
            }
        }
    }

    pub fn ghosted_part_count(&self, root: Entity) -> usize {
        let children = self.world.get::<Children>(root).map(|c| c.0.clone()).unwrap_or_default();
        children
            .iter()
            .filter(|&&child| self.world.get::<RenderPart>(child).is_some_and(|part| part.ghosted))
            .count()
    }

    // ---------- animation playback ----------

    pub fn apply_animation(&mut self, root: Entity, entry: &AnimationEntry, reset: bool) {
        if let Some(mut player) = self.world.get_mut::<AnimationPlayer>(root) {
            player.clip = entry.name.clone();
            player.handle = entry.handle.clone();
            if reset {
                player.elapsed = 0.0;
            }
            player.playing = true;
        } else if self.world.get_entity(root).is_ok() {
            self.world.entity_mut(root).insert(AnimationPlayer::new(entry));
        }
    }

    pub fn reset_playback(&mut self, root: Entity) {
        if let Some(mut player) = self.world.get_mut::<AnimationPlayer>(root) {
            player.elapsed = 0.0;
            player.playing = true;
        }
    }

    pub fn playback(&self, root: Entity) -> Option<AnimationPlayer> {
        self.world.get::<AnimationPlayer>(root).cloned()
    }

    // ---------- hierarchy ----------

    /// The entity followed by its ancestors, innermost first. Deletion walks
    /// this chain looking for a registry root.
    pub fn hierarchy_chain(&self, entity: Entity) -> SmallVec<[Entity; 4]> {
        let mut chain = SmallVec::new();
        let mut cursor = Some(entity);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.world.get::<Parent>(current).map(|parent| parent.0);
        }
        chain
    }

    // ---------- ray casting ----------

    pub fn cast_ray(&mut self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        self.cast_ray_excluding(origin, direction, None)
    }

    /// Nearest hit over prop parts and enabled scene statics. `exclude` skips
    /// an entire prop hierarchy (the preview must not occlude its own ray).
    pub fn cast_ray_excluding(
        &mut self,
        origin: Vec3,
        direction: Vec3,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir.length_squared() <= f32::EPSILON {
            return None;
        }
        let mut closest: Option<RayHit> = None;

        let mut parts = self.world.query::<(Entity, &Transform3D, &RenderPart, Option<&Parent>)>();
        let mut candidates: Vec<(Entity, Transform3D, PartBounds)> = Vec::new();
        for (entity, transform, part, parent) in parts.iter(&self.world) {
            let root = parent.map(|p| p.0);
            if exclude.is_some() && (root == exclude || Some(entity) == exclude) {
                continue;
            }
            let world_transform = match root.and_then(|r| self.world.get::<Transform3D>(r)) {
                Some(root_transform) => compose(root_transform, transform),
                None => *transform,
            };
            candidates.push((entity, world_transform, part.bounds));
        }
        let mut statics = self.world.query::<(Entity, &Transform3D, &SceneStatic)>();
        for (entity, transform, scene_static) in statics.iter(&self.world) {
            if !scene_static.enabled {
                continue;
            }
            candidates.push((entity, *transform, scene_static.bounds));
        }

        for (entity, transform, bounds) in candidates {
            if let Some((distance, point)) = ray_hit_obb(origin, dir, &transform, &bounds) {
                match closest {
                    Some(best) if distance >= best.distance => {}
                    _ => closest = Some(RayHit { entity, point, distance }),
                }
            }
        }
        closest
    }

    // ---------- scene statics ----------

    pub fn clear_statics(&mut self) {
        let mut query = self.world.query::<(Entity, &SceneStatic)>();
        let entities: Vec<Entity> = query.iter(&self.world).map(|(entity, _)| entity).collect();
        for entity in entities {
            self.world.despawn(entity);
        }
    }

    pub fn populate_statics(&mut self, scene: &SceneDef) {
        for def in &scene.statics {
            self.world.spawn((
                Transform3D { translation: def.center.clone().into(), ..Default::default() },
                SceneStatic {
                    name: def.name.clone(),
                    tag: def.tag.clone(),
                    enabled: def.enabled,
                    bounds: PartBounds::from_half_extents(def.half_extents.clone().into()),
                },
            ));
        }
    }

    /// Tag-based activation pass; returns how many statics were switched on.
    pub fn enable_statics_where<F: Fn(&str, &str) -> bool>(&mut self, predicate: F) -> usize {
        let mut query = self.world.query::<&mut SceneStatic>();
        let mut enabled = 0;
        for mut scene_static in query.iter_mut(&mut self.world) {
            if !scene_static.enabled && predicate(&scene_static.tag, &scene_static.name) {
                scene_static.enabled = true;
                enabled += 1;
            }
        }
        enabled
    }

    pub fn static_count(&mut self) -> usize {
        self.world.query::<&SceneStatic>().iter(&self.world).count()
    }

    // ---------- viewpoint rig ----------

    /// Spawns a tagged camera, optionally parented under an anchor entity the
    /// way character rigs mount their heads.
    pub fn spawn_viewpoint(&mut self, pose: Pose, with_anchor: bool) -> Entity {
        if with_anchor {
            let anchor = self
                .world
                .spawn((Transform3D { translation: pose.position, ..Default::default() },))
                .id();
            self.world
                .spawn((
                    Transform3D { rotation: pose.rotation, ..Default::default() },
                    ViewpointTag,
                    FlightState::default(),
                    Parent(anchor),
                ))
                .id()
        } else {
            self.world
                .spawn((
                    Transform3D { translation: pose.position, rotation: pose.rotation, ..Default::default() },
                    ViewpointTag,
                    FlightState::default(),
                ))
                .id()
        }
    }

    fn tagged_viewpoints(&mut self) -> SmallVec<[Entity; 4]> {
        let mut query = self.world.query::<(Entity, &ViewpointTag)>();
        query.iter(&self.world).map(|(entity, _)| entity).collect()
    }

    pub fn viewpoint_pose(&self, camera: Entity) -> Option<Pose> {
        self.viewpoint_world_pose(camera)
    }

    fn viewpoint_world_pose(&self, camera: Entity) -> Option<Pose> {
        let transform = self.world.get::<Transform3D>(camera)?;
        let anchor_offset = self
            .world
            .get::<Parent>(camera)
            .and_then(|parent| self.world.get::<Transform3D>(parent.0))
            .map_or(Vec3::ZERO, |anchor| anchor.translation);
        Some(Pose::new(anchor_offset + transform.translation, transform.rotation))
    }

    pub fn flight_state(&self, camera: Entity) -> Option<FlightState> {
        self.world.get::<FlightState>(camera).copied()
    }
}

fn compose(root: &Transform3D, local: &Transform3D) -> Transform3D {
    Transform3D {
        translation: root.translation + root.rotation * (root.scale * local.translation),
        rotation: root.rotation * local.rotation,
        scale: root.scale * local.scale,
    }
}

impl ViewpointRig for StageWorld {
    fn active_pose(&self) -> Option<Pose> {
        // Queries need &mut World; read through a filtered entity walk instead.
        let mut found = None;
        for entity in self.world.iter_entities() {
            if entity.get::<ViewpointTag>().is_some() {
                found = Some(entity.id());
                break;
            }
        }
        found.and_then(|camera| self.viewpoint_world_pose(camera))
    }

    fn apply_pose(&mut self, pose: Pose) {
        for camera in self.tagged_viewpoints() {
            let Some(current) = self.viewpoint_world_pose(camera) else {
                continue;
            };
            let delta = pose.position - current.position;
            let anchor = self.world.get::<Parent>(camera).map(|parent| parent.0);
            match anchor {
                // Moving the anchor preserves whatever mount offset the rig has.
                Some(anchor) => {
                    if let Some(mut transform) = self.world.get_mut::<Transform3D>(anchor) {
                        transform.translation += delta;
                    }
                }
                None => {
                    if let Some(mut transform) = self.world.get_mut::<Transform3D>(camera) {
                        transform.translation = pose.position;
                    }
                }
            }
            if let Some(mut transform) = self.world.get_mut::<Transform3D>(camera) {
                transform.rotation = pose.rotation;
            }
        }
    }

    fn set_free_fly(&mut self, enabled: bool) {
        for camera in self.tagged_viewpoints() {
            if let Some(mut flight) = self.world.get_mut::<FlightState>(camera) {
                if flight.free_fly != enabled {
                    flight.free_fly = enabled;
                    flight.gravity_enabled = !enabled;
                    flight.velocity = Vec3::ZERO;
                }
            }
        }
    }

    fn set_orientation(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
        for camera in self.tagged_viewpoints() {
            if let Some(mut flight) = self.world.get_mut::<FlightState>(camera) {
                flight.yaw_degrees = yaw_degrees;
                flight.pitch_degrees = pitch_degrees;
            }
        }
    }
}
