use crate::catalog::{AnimationEntry, AnimationHandle};
use bevy_ecs::prelude::{Component, Entity, Resource};
use glam::{Quat, Vec3};

#[derive(Component, Clone, Copy)]
pub struct Transform3D {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

#[derive(Component, Clone, Copy)]
pub struct Parent(pub Entity);

#[derive(Component, Default)]
pub struct Children(pub Vec<Entity>);

/// Axis-aligned local bounds of a renderable part or scene static.
#[derive(Clone, Copy, Debug)]
pub struct PartBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl PartBounds {
    pub fn unit() -> Self {
        Self { min: Vec3::splat(-0.5), max: Vec3::splat(0.5) }
    }

    pub fn from_half_extents(half: Vec3) -> Self {
        Self { min: -half, max: half }
    }
}

/// Root of a spawned prop instance (preview or placed).
#[derive(Component, Clone)]
pub struct PropRoot {
    pub prototype: String,
}

/// Renderable sub-part of a prop. `ghosted` selects the preview-only
/// override material downstream.
#[derive(Component, Clone)]
pub struct RenderPart {
    pub label: String,
    pub ghosted: bool,
    pub bounds: PartBounds,
}

/// Animation playback state applied to a prop root.
#[derive(Component, Clone)]
pub struct AnimationPlayer {
    pub clip: String,
    pub handle: AnimationHandle,
    pub elapsed: f32,
    pub playing: bool,
    pub speed: f32,
}

impl AnimationPlayer {
    pub fn new(entry: &AnimationEntry) -> Self {
        Self {
            clip: entry.name.clone(),
            handle: entry.handle.clone(),
            elapsed: 0.0,
            playing: true,
            speed: 1.0,
        }
    }
}

/// Activation-tagged scene geometry. Disabled statics are invisible to ray
/// casts until the activation pass enables them.
#[derive(Component, Clone)]
pub struct SceneStatic {
    pub name: String,
    pub tag: String,
    pub enabled: bool,
    pub bounds: PartBounds,
}

/// Marks a camera as an active viewpoint. Multi-camera rigs tag several.
#[derive(Component, Clone, Copy, Default)]
pub struct ViewpointTag;

/// Locomotion state of a viewpoint's controller.
#[derive(Component, Clone, Copy)]
pub struct FlightState {
    pub free_fly: bool,
    pub gravity_enabled: bool,
    pub velocity: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            free_fly: false,
            gravity_enabled: true,
            velocity: Vec3::ZERO,
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
        }
    }
}

#[derive(Resource, Clone, Copy, Default)]
pub struct TickDelta(pub f32);
