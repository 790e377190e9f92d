use crate::camera3d::look_rotation;
use crate::config::CameraConfig;
use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const SLOT_COUNT: usize = 4;

const SLOT_LABELS: [&str; SLOT_COUNT] =
    ["Original Position", "Bird's Eye View", "Random Position 1", "Random Position 2"];

const BIRD_EYE_SLOT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose { position: Vec3::ZERO, rotation: Quat::IDENTITY };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// Yaw/pitch (degrees) of a rotation's forward axis, matching the
/// `EulerRot::YXZ` convention used for viewpoint orientation.
pub fn yaw_pitch_degrees(rotation: Quat) -> (f32, f32) {
    let forward = rotation * Vec3::NEG_Z;
    let pitch = forward.y.clamp(-1.0, 1.0).asin();
    let yaw = (-forward.x).atan2(-forward.z);
    (yaw.to_degrees(), pitch.to_degrees())
}

/// Capability surface of the hosting camera controller. Replaces the
/// reach-into-private-state patching the tool previously relied on: the rig
/// exposes pose application, orientation sync, and free-fly switching
/// explicitly, and applies them to every camera tagged as the active
/// viewpoint.
pub trait ViewpointRig {
    fn active_pose(&self) -> Option<Pose>;
    fn apply_pose(&mut self, pose: Pose);
    fn set_free_fly(&mut self, enabled: bool);
    fn set_orientation(&mut self, yaw_degrees: f32, pitch_degrees: f32);
}

#[derive(Debug, Clone)]
pub struct CameraSlot {
    pub label: &'static str,
    pub base_pose: Pose,
    pub last_visited: Option<Pose>,
}

struct SlotPopup {
    label: String,
    remaining: f32,
}

/// Four-viewpoint ring with per-slot pose memory. Slot 0 is the scene origin;
/// slot 1 hovers above it looking straight down; slots 2 and 3 are sampled
/// inside the configured offset envelope, oriented back at the origin.
pub struct CameraNavigator {
    slots: [CameraSlot; SLOT_COUNT],
    current: usize,
    origin: Pose,
    config: CameraConfig,
    rng: StdRng,
    popup: Option<SlotPopup>,
    transition_tick: bool,
}

impl CameraNavigator {
    pub fn new(origin: Pose, config: CameraConfig) -> Self {
        Self::with_rng(origin, config, StdRng::from_entropy())
    }

    pub fn with_seed(origin: Pose, config: CameraConfig, seed: u64) -> Self {
        Self::with_rng(origin, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(origin: Pose, config: CameraConfig, rng: StdRng) -> Self {
        let placeholder = CameraSlot { label: "", base_pose: origin, last_visited: None };
        let mut navigator = Self {
            slots: [
                placeholder.clone(),
                placeholder.clone(),
                placeholder.clone(),
                placeholder,
            ],
            current: 0,
            origin,
            config,
            rng,
            popup: None,
            transition_tick: false,
        };
        navigator.derive_slots();
        navigator
    }

    fn derive_slots(&mut self) {
        let origin = self.origin;
        self.slots[0] = CameraSlot { label: SLOT_LABELS[0], base_pose: origin, last_visited: None };

        let bird_position = origin.position + Vec3::Y * self.config.bird_eye_height;
        let bird_rotation = Quat::from_euler(EulerRot::YXZ, 0.0, -std::f32::consts::FRAC_PI_2, 0.0);
        self.slots[BIRD_EYE_SLOT] = CameraSlot {
            label: SLOT_LABELS[BIRD_EYE_SLOT],
            base_pose: Pose::new(bird_position, bird_rotation),
            last_visited: None,
        };

        for slot in 2..SLOT_COUNT {
            let lateral = self.config.lateral_offset;
            let offset = Vec3::new(
                self.rng.gen_range(-lateral..=lateral),
                self.rng.gen_range(self.config.min_height..=self.config.max_height),
                self.rng.gen_range(-lateral..=lateral),
            );
            let position = origin.position + offset;
            let rotation = look_rotation(origin.position - position);
            self.slots[slot] = CameraSlot {
                label: SLOT_LABELS[slot],
                base_pose: Pose::new(position, rotation),
                last_visited: None,
            };
        }
    }

    pub fn current_slot(&self) -> usize {
        self.current
    }

    pub fn slot_label(&self) -> &'static str {
        self.slots[self.current].label
    }

    pub fn slot(&self, index: usize) -> &CameraSlot {
        &self.slots[index]
    }

    /// Advances the ring by one slot: remembers the live pose of the slot
    /// being left, then applies the entered slot's remembered (or base) pose
    /// through the rig. Completes within the tick; preview tracking must skip
    /// this tick (see `take_transition_tick`).
    pub fn cycle(&mut self, rig: &mut dyn ViewpointRig) {
        let Some(live) = rig.active_pose() else {
            log::warn!("camera: no active viewpoint found, slot cycle ignored");
            return;
        };
        self.slots[self.current].last_visited = Some(live);

        self.current = (self.current + 1) % SLOT_COUNT;
        let slot = &self.slots[self.current];
        let mut target = slot.last_visited.unwrap_or(slot.base_pose);

        if self.current == BIRD_EYE_SLOT {
            // Stored poses can accumulate roll/pitch artifacts; bird's eye
            // always looks straight down, keeping only the stored yaw.
            let (yaw_degrees, _) = yaw_pitch_degrees(target.rotation);
            target.rotation = Quat::from_euler(
                EulerRot::YXZ,
                yaw_degrees.to_radians(),
                -std::f32::consts::FRAC_PI_2,
                0.0,
            );
        }

        rig.apply_pose(target);
        let (yaw_degrees, pitch_degrees) = yaw_pitch_degrees(target.rotation);
        rig.set_orientation(yaw_degrees, pitch_degrees);
        if self.current == BIRD_EYE_SLOT {
            rig.set_free_fly(true);
        }

        self.popup = Some(SlotPopup {
            label: self.slots[self.current].label.to_string(),
            remaining: self.config.popup_seconds,
        });
        self.transition_tick = true;
        log::info!("camera: entered slot {} ({})", self.current, self.slots[self.current].label);
    }

    /// Re-homes the ring on a new scene origin: rebuilds every base pose
    /// (re-sampling the random slots), returns to slot 0, and forgets all
    /// remembered viewpoints.
    pub fn update_origin(&mut self, pose: Pose) {
        self.origin = pose;
        self.derive_slots();
        self.current = 0;
        self.popup = None;
    }

    pub fn origin(&self) -> Pose {
        self.origin
    }

    /// True exactly once after a cycle; consumed by the tick that must not
    /// reposition the preview against a stale viewpoint.
    pub fn take_transition_tick(&mut self) -> bool {
        let was = self.transition_tick;
        self.transition_tick = false;
        was
    }

    pub fn tick(&mut self, dt: f32) {
        if let Some(popup) = self.popup.as_mut() {
            popup.remaining -= dt;
            if popup.remaining <= 0.0 {
                self.popup = None;
            }
        }
    }

    pub fn popup_label(&self) -> Option<&str> {
        self.popup.as_ref().map(|popup| popup.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeRig {
        pose: Option<Pose>,
        free_fly: bool,
        orientation: Option<(f32, f32)>,
    }

    impl FakeRig {
        fn at(pose: Pose) -> Self {
            Self { pose: Some(pose), free_fly: false, orientation: None }
        }
    }

    impl ViewpointRig for FakeRig {
        fn active_pose(&self) -> Option<Pose> {
            self.pose
        }

        fn apply_pose(&mut self, pose: Pose) {
            self.pose = Some(pose);
        }

        fn set_free_fly(&mut self, enabled: bool) {
            self.free_fly = enabled;
        }

        fn set_orientation(&mut self, yaw_degrees: f32, pitch_degrees: f32) {
            self.orientation = Some((yaw_degrees, pitch_degrees));
        }
    }

    fn navigator() -> CameraNavigator {
        CameraNavigator::with_seed(Pose::IDENTITY, CameraConfig::default(), 7)
    }

    #[test]
    fn random_slots_sit_inside_the_envelope() {
        let nav = navigator();
        for index in [2, 3] {
            let offset = nav.slot(index).base_pose.position;
            assert!(offset.x.abs() <= 50.0 && offset.z.abs() <= 50.0);
            assert!((10.0..=30.0).contains(&offset.y));
        }
    }

    #[test]
    fn bird_eye_slot_looks_straight_down_and_enables_free_fly() {
        let mut nav = navigator();
        let mut rig = FakeRig::at(Pose::IDENTITY);
        nav.cycle(&mut rig);
        assert_eq!(nav.current_slot(), 1);
        assert!(rig.free_fly);
        let applied = rig.pose.expect("pose applied");
        let forward = applied.rotation * Vec3::NEG_Z;
        assert!(forward.abs_diff_eq(-Vec3::Y, 1e-4), "bird's eye must look straight down");
        assert!((applied.position.y - 100.0).abs() < 1e-4);
    }

    #[test]
    fn missing_viewpoint_makes_cycle_a_no_op() {
        let mut nav = navigator();
        let mut rig = FakeRig { pose: None, free_fly: false, orientation: None };
        nav.cycle(&mut rig);
        assert_eq!(nav.current_slot(), 0);
        assert!(nav.popup_label().is_none());
    }

    #[test]
    fn popup_expires_after_configured_duration() {
        let mut nav = navigator();
        let mut rig = FakeRig::at(Pose::IDENTITY);
        nav.cycle(&mut rig);
        assert_eq!(nav.popup_label(), Some("Bird's Eye View"));
        nav.tick(2.9);
        assert!(nav.popup_label().is_some());
        nav.tick(0.2);
        assert!(nav.popup_label().is_none());
    }

    #[test]
    fn yaw_pitch_roundtrip_matches_forward() {
        let rotation = Quat::from_euler(EulerRot::YXZ, 0.7, -0.4, 0.0);
        let (yaw, pitch) = yaw_pitch_degrees(rotation);
        assert!((yaw - 0.7f32.to_degrees()).abs() < 1e-2);
        assert!((pitch - (-0.4f32).to_degrees()).abs() < 1e-2);
    }
}
