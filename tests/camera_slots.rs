use glam::{Quat, Vec3};
use stagehand::camera_nav::{CameraNavigator, Pose, ViewpointRig};
use stagehand::config::CameraConfig;
use stagehand::stage::StageWorld;

fn rig_with_camera(pose: Pose) -> StageWorld {
    let mut stage = StageWorld::new();
    stage.spawn_viewpoint(pose, true);
    stage
}

fn navigator(origin: Pose) -> CameraNavigator {
    CameraNavigator::with_seed(origin, CameraConfig::default(), 42)
}

#[test]
fn ring_traversal_remembers_a_moved_pose_per_slot() {
    let origin = Pose::IDENTITY;
    let mut stage = rig_with_camera(origin);
    let mut nav = navigator(origin);

    // Fly away from the base pose while still in slot 0.
    let moved = Pose::new(Vec3::new(12.0, 3.0, -4.0), Quat::from_rotation_y(0.8));
    stage.apply_pose(moved);

    for _ in 0..4 {
        nav.cycle(&mut stage);
    }
    assert_eq!(nav.current_slot(), 0, "four cycles traverse the full ring");

    let back_home = stage.active_pose().expect("camera pose");
    assert!(
        (back_home.position - moved.position).length() < 1e-4,
        "slot 0 must restore the moved pose, not its base pose"
    );
}

#[test]
fn each_slot_keeps_its_own_memory() {
    let origin = Pose::IDENTITY;
    let mut stage = rig_with_camera(origin);
    let mut nav = navigator(origin);

    nav.cycle(&mut stage); // slot 1
    let parked_high = Pose::new(Vec3::new(0.0, 60.0, 9.0), Quat::from_rotation_y(1.2));
    stage.apply_pose(parked_high);

    nav.cycle(&mut stage); // slot 2 records the parked pose for slot 1
    nav.cycle(&mut stage); // slot 3
    nav.cycle(&mut stage); // slot 0
    nav.cycle(&mut stage); // slot 1 again

    let revisited = stage.active_pose().expect("camera pose");
    assert!(
        (revisited.position - parked_high.position).length() < 1e-4,
        "slot 1 must restore its own remembered position"
    );
    let forward = revisited.rotation * Vec3::NEG_Z;
    assert!(forward.abs_diff_eq(-Vec3::Y, 1e-4), "bird's eye re-entry still looks straight down");
}

#[test]
fn bird_slot_enables_free_fly_on_the_rig() {
    let origin = Pose::IDENTITY;
    let mut stage = StageWorld::new();
    let camera = stage.spawn_viewpoint(origin, true);
    let mut nav = navigator(origin);

    nav.cycle(&mut stage);
    assert_eq!(nav.current_slot(), 1);
    let flight = stage.flight_state(camera).expect("flight state");
    assert!(flight.free_fly);
    assert!(!flight.gravity_enabled);
    assert_eq!(flight.velocity, Vec3::ZERO);
    assert!((flight.pitch_degrees + 90.0).abs() < 0.1, "orientation synced to the controller");
}

#[test]
fn origin_update_clears_all_remembered_poses() {
    let origin = Pose::IDENTITY;
    let mut stage = rig_with_camera(origin);
    let mut nav = navigator(origin);

    nav.cycle(&mut stage); // slot 1
    stage.apply_pose(Pose::new(Vec3::new(7.0, 44.0, 7.0), Quat::IDENTITY));
    nav.cycle(&mut stage); // slot 2, slot 1 memory now set

    let new_origin = Pose::new(Vec3::new(100.0, 0.0, 100.0), Quat::IDENTITY);
    stage.apply_pose(new_origin);
    nav.update_origin(new_origin);
    assert_eq!(nav.current_slot(), 0);
    assert!(nav.popup_label().is_none(), "re-homing cancels the slot popup");

    nav.cycle(&mut stage); // slot 1, freshly derived base
    let pose = stage.active_pose().expect("camera pose");
    let expected = new_origin.position + Vec3::Y * CameraConfig::default().bird_eye_height;
    assert!(
        (pose.position - expected).length() < 1e-3,
        "slot 1 must use the freshly derived base pose, not the stale memory"
    );
}

#[test]
fn multi_camera_rigs_move_together() {
    let origin = Pose::IDENTITY;
    let mut stage = StageWorld::new();
    let anchored = stage.spawn_viewpoint(origin, true);
    let bare = stage.spawn_viewpoint(origin, false);
    let mut nav = navigator(origin);

    nav.cycle(&mut stage);
    let expected_height = CameraConfig::default().bird_eye_height;
    for camera in [anchored, bare] {
        let pose = stage.viewpoint_pose(camera).expect("camera pose");
        assert!((pose.position.y - expected_height).abs() < 1e-3);
    }
    // The anchored camera moved through its parent anchor, keeping its mount offset.
    let local = stage.prop_transform(anchored).expect("camera transform");
    assert_eq!(local.translation, Vec3::ZERO);
}

#[test]
fn cycling_without_any_camera_is_a_no_op() {
    let mut stage = StageWorld::new();
    let mut nav = navigator(Pose::IDENTITY);
    nav.cycle(&mut stage);
    assert_eq!(nav.current_slot(), 0);
}
