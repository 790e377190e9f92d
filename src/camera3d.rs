use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective camera used to turn pointer positions into world-space rays.
#[derive(Debug, Clone)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera3D {
    pub fn new(position: Vec3, target: Vec3, fov_y_radians: f32, near: f32, far: f32) -> Self {
        Self { position, target, up: DEFAULT_UP, fov_y_radians, near, far }
    }

    pub fn from_pose(position: Vec3, rotation: Quat, fov_y_radians: f32, near: f32, far: f32) -> Self {
        let forward = rotation * Vec3::new(0.0, 0.0, -1.0);
        let mut camera = Self::new(position, position + forward, fov_y_radians, near, far);
        // A straight-down pose is collinear with the default up axis; take the
        // rotated up so the view basis never degenerates.
        let up = (rotation * Vec3::Y).normalize_or_zero();
        camera.up = if up.length_squared() > 0.0 { up } else { Vec3::Y };
        camera
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, aspect.max(0.0001), self.near, self.far)
    }

    /// Generates a world-space ray originating from the camera through a screen-space position.
    pub fn screen_ray(&self, screen: Vec2, viewport: PhysicalSize<u32>) -> Option<(Vec3, Vec3)> {
        if viewport.width == 0 || viewport.height == 0 {
            return None;
        }
        let ndc_x = (2.0 * screen.x / viewport.width as f32) - 1.0;
        let ndc_y = 1.0 - (2.0 * screen.y / viewport.height as f32);
        let clip = Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let view = self.view_matrix();
        let proj = self.projection_matrix(viewport.width as f32 / viewport.height as f32);
        let inv_view_proj = (proj * view).inverse();
        let world = inv_view_proj * clip;
        if world.w.abs() < f32::EPSILON {
            return None;
        }
        let world_pos = (world.truncate() / world.w) - self.position;
        let dir = world_pos.normalize();
        Some((self.position, dir))
    }
}

/// Rotation that orients -Z toward `direction`, keeping world up where possible.
pub fn look_rotation(direction: Vec3) -> Quat {
    let forward = direction.normalize_or_zero();
    if forward.length_squared() <= f32::EPSILON {
        return Quat::IDENTITY;
    }
    let up = if forward.abs_diff_eq(Vec3::Y, 1e-4) || forward.abs_diff_eq(-Vec3::Y, 1e-4) {
        Vec3::Z
    } else {
        Vec3::Y
    };
    let view = Mat4::look_to_rh(Vec3::ZERO, forward, up);
    Quat::from_mat4(&view.inverse())
}
