/// Camera with yaw/pitch orientation and a reversed-depth projection.
use glam::{Mat4, Quat, Vec3, Vec4};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // Rotation around Y axis (radians)
    pub pitch: f32, // Rotation around X axis (radians)
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect_ratio: f32,
}

impl Camera {
    pub fn new(position: Vec3, aspect_ratio: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov: 90.0f32.to_radians(),
            near: 0.05,
            far: 100.0,
            aspect_ratio,
        }
    }

    /// Update camera orientation to look at a specific target point.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let view_matrix = Mat4::look_at_rh(self.position, target, up);
        let rotation_quat = Quat::from_mat4(&view_matrix.inverse());
        let (yaw, pitch, _roll) = rotation_quat.to_euler(glam::EulerRot::YXZ);
        self.yaw = yaw;
        self.pitch = pitch;
    }

    pub fn view_matrix(&self) -> Mat4 {
        let rotation = self.rotation_quat();
        let forward = rotation * Vec3::NEG_Z;
        let target = self.position + forward;
        let up = rotation * Vec3::Y;

        Mat4::look_at_rh(self.position, target, up)
    }

    /// Perspective projection whose clip `w` equals view-space `z`.
    ///
    /// The camera looks down -Z, so `w` is negative in front of it and grows
    /// towards zero as points get closer: a larger `w` is nearer. The
    /// rasterizer's depth buffer relies on exactly that ordering. The focal
    /// term is negated so the divide by a negative `w` keeps +X right and
    /// +Y up.
    pub fn projection_matrix(&self) -> Mat4 {
        let focal = -1.0 / (self.fov * 0.5).tan();
        let (n, f) = (self.near, self.far);
        Mat4::from_cols(
            Vec4::new(focal / self.aspect_ratio, 0.0, 0.0, 0.0),
            Vec4::new(0.0, focal, 0.0, 0.0),
            Vec4::new(0.0, 0.0, n / (n - f), 1.0),
            Vec4::new(0.0, 0.0, -n * f / (n - f), 0.0),
        )
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation_quat() * Vec3::NEG_Z
    }

    fn rotation_quat(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch)
    }

    /// Update aspect ratio (call when the target is resized)
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }
}
