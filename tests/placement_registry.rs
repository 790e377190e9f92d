use glam::Vec3;
use stagehand::catalog::{AnimationEntry, AnimationHandle};
use stagehand::config::PlacementConfig;
use stagehand::placement::{PlacementEngine, SCALE_MAX, SCALE_MIN};
use stagehand::prop_registry::{PropPrototype, PropRegistry};
use stagehand::scene::SceneDef;
use stagehand::stage::types::PropRoot;
use stagehand::stage::StageWorld;

fn ground_scene() -> SceneDef {
    serde_json::from_str(
        r#"{
            "name": "test-ground",
            "statics": [
                {"name": "Ground Floor", "tag": "Floor",
                 "half_extents": {"x": 50.0, "y": 0.5, "z": 50.0}, "enabled": true}
            ]
        }"#,
    )
    .expect("parse ground scene")
}

fn stage_with_ground() -> StageWorld {
    let mut stage = StageWorld::new();
    stage.populate_statics(&ground_scene());
    stage
}

fn props() -> PropRegistry {
    let mut registry = PropRegistry::new();
    registry.push(PropPrototype::block("dancer"));
    registry.push(PropPrototype::block("drummer"));
    registry
}

fn engine() -> PlacementEngine {
    PlacementEngine::new(PlacementConfig::default())
}

fn clip(name: &str) -> AnimationEntry {
    AnimationEntry { name: name.to_string(), handle: AnimationHandle::new(format!("anim://{name}")) }
}

fn down_ray(x: f32, z: f32) -> Option<(Vec3, Vec3)> {
    Some((Vec3::new(x, 10.0, z), Vec3::NEG_Y))
}

fn prop_root_count(stage: &mut StageWorld) -> usize {
    stage.world.query::<&PropRoot>().iter(&stage.world).count()
}

#[test]
fn preloading_twice_keeps_exactly_one_preview() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &props, None);
    let first = engine.preview_entity().expect("preview spawned");
    engine.preload(&mut stage, &props, None);
    let second = engine.preview_entity().expect("preview respawned");

    assert_ne!(first, second);
    assert!(!stage.entity_exists(first), "old preview instance must be destroyed");
    assert!(stage.entity_exists(second));
    assert_eq!(prop_root_count(&mut stage), 1, "at most one preview instance alive");
    assert_eq!(stage.ghosted_part_count(second), 1, "preview parts carry the override material");
}

#[test]
fn leaving_preview_mode_destroys_the_instance() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &props, None);
    let preview = engine.preview_entity().expect("preview spawned");
    engine.toggle_preview_mode(&mut stage, &props, None);
    assert!(engine.preview_entity().is_none());
    assert!(!stage.entity_exists(preview));
    assert!(!engine.is_previewing());
}

#[test]
fn preview_follows_hits_and_holds_position_on_miss() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &props, None);
    let preview = engine.preview_entity().expect("preview spawned");

    engine.update_preview_position(&mut stage, down_ray(3.0, -2.0));
    let after_hit = stage.prop_position(preview).expect("preview transform");
    assert!((after_hit - Vec3::new(3.0, 0.7, -2.0)).length() < 1e-4, "hit point plus clearance");

    let miss = Some((Vec3::new(0.0, 10.0, 0.0), Vec3::Y));
    engine.update_preview_position(&mut stage, miss);
    assert_eq!(stage.prop_position(preview), Some(after_hit), "a miss keeps the last position");
}

#[test]
fn registry_tracks_each_placement_and_deletion() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();
    let entry = clip("Samba");

    engine.toggle_preview_mode(&mut stage, &props, Some(&entry));
    for index in 0..4 {
        let placed =
            engine.place_at(&mut stage, &props, Some(&entry), down_ray(4.0 * index as f32, 0.0));
        assert!(placed.is_some(), "placement {index} should hit the ground");
    }
    assert_eq!(engine.placed().len(), 4);

    // The deletion ray strikes a renderable part; resolution walks up to the
    // registry root.
    let deleted = engine.delete_at(&mut stage, down_ray(8.0, 0.0)).expect("deletion hit");
    assert_eq!(engine.placed().len(), 3);
    assert!(!engine.placed().contains(&deleted));
    assert!(!stage.entity_exists(deleted));

    let nothing_there = engine.delete_at(&mut stage, down_ray(100.0, 100.0));
    assert!(nothing_there.is_none());
    assert_eq!(engine.placed().len(), 3, "a miss deletes nothing");
}

#[test]
fn placements_are_independent_of_later_parameter_changes() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &props, None);
    let placed = engine.place_at(&mut stage, &props, None, down_ray(5.0, 5.0)).expect("placed");
    let placed_before = stage.prop_transform(placed).expect("placed transform");

    engine.increment_scale(&mut stage, 0.5);
    engine.increment_yaw(&mut stage, 45.0);

    let preview = engine.preview_entity().expect("preview");
    let preview_after = stage.prop_transform(preview).expect("preview transform");
    assert!((preview_after.scale.x - 1.5).abs() < 1e-5, "preview picks up the new scale");

    let placed_after = stage.prop_transform(placed).expect("placed transform");
    assert_eq!(placed_before.scale, placed_after.scale);
    assert_eq!(placed_before.rotation, placed_after.rotation);
}

#[test]
fn scale_clamps_and_yaw_wraps_through_the_engine() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();
    engine.toggle_preview_mode(&mut stage, &props, None);

    for _ in 0..11 {
        engine.increment_scale(&mut stage, -0.1);
    }
    assert_eq!(engine.params().scale, SCALE_MIN);
    for _ in 0..200 {
        engine.increment_scale(&mut stage, 0.1);
    }
    assert_eq!(engine.params().scale, SCALE_MAX);

    for _ in 0..24 {
        engine.increment_yaw(&mut stage, 15.0);
    }
    assert_eq!(engine.params().yaw_degrees, 0.0);
}

#[test]
fn placements_carry_the_current_animation_and_replay_resets_all() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();
    let entry = clip("Samba");

    engine.toggle_preview_mode(&mut stage, &props, Some(&entry));
    let placed = engine.place_at(&mut stage, &props, Some(&entry), down_ray(6.0, 0.0)).expect("placed");
    assert_eq!(stage.playback(placed).map(|player| player.clip), Some("Samba".to_string()));

    stage.tick(0.5);
    let preview = engine.preview_entity().expect("preview");
    assert!(stage.playback(placed).expect("placed player").elapsed > 0.0);
    assert!(stage.playback(preview).expect("preview player").elapsed > 0.0);

    engine.replay_all(&mut stage);
    assert_eq!(stage.playback(placed).expect("placed player").elapsed, 0.0);
    assert_eq!(stage.playback(preview).expect("preview player").elapsed, 0.0);
}

#[test]
fn cleanup_empties_the_registry_and_preview() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &props, None);
    engine.place_at(&mut stage, &props, None, down_ray(1.0, 0.0));
    engine.place_at(&mut stage, &props, None, down_ray(5.0, 0.0));
    assert_eq!(engine.placed().len(), 2);

    engine.cleanup(&mut stage);
    assert!(engine.placed().is_empty());
    assert!(engine.preview_entity().is_none());
    assert!(!engine.is_previewing());
    assert_eq!(prop_root_count(&mut stage), 0);
}

#[test]
fn empty_prototype_registry_degrades_without_instances() {
    let mut stage = stage_with_ground();
    let empty = PropRegistry::new();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &empty, None);
    assert!(engine.is_previewing(), "mode flips even when preload cannot spawn");
    assert!(engine.preview_entity().is_none(), "no instance for an out-of-range prototype");
    assert!(engine.place_at(&mut stage, &empty, None, down_ray(0.0, 0.0)).is_none());
}

#[test]
fn prototype_cycling_respawns_the_preview() {
    let mut stage = stage_with_ground();
    let props = props();
    let mut engine = engine();

    engine.toggle_preview_mode(&mut stage, &props, None);
    let first = engine.preview_entity().expect("preview");
    engine.cycle_prototype(&mut stage, &props, 1, None);
    assert_eq!(engine.prototype_index(), 1);
    let second = engine.preview_entity().expect("preview respawned");
    assert_ne!(first, second);
    assert!(!stage.entity_exists(first));

    engine.cycle_prototype(&mut stage, &props, 1, None);
    assert_eq!(engine.prototype_index(), 0, "prototype index wraps over the registry");
}
