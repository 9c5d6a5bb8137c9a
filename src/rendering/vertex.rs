/// Vertex stage: object space -> clip space plus the world-space attributes
/// the pixel shader needs.
use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Per-vertex input as stored in a mesh.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct VertexAttributes {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

impl VertexAttributes {
    #[inline]
    pub const fn new(position: Vec3, normal: Vec3, tex_coord: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// Output of the vertex stage, consumed by the rasterizer.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShadedVertex {
    pub clip_position: Vec4,
    pub world_normal: Vec3,
    pub world_position: Vec3,
    pub tex_coord: Vec2,
}

/// Transforms bound to one model. Build once per model per frame and run
/// it over every vertex of that model.
#[derive(Copy, Clone, Debug)]
pub struct VertexStage {
    model: Mat4,
    model_view_projection: Mat4,
    normal_matrix: Mat3,
}

impl VertexStage {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model,
            model_view_projection: projection * view * model,
            // Inverse-transpose of the linear part keeps normals perpendicular
            // under non-uniform scale.
            normal_matrix: Mat3::from_mat4(model).inverse().transpose(),
        }
    }

    #[inline]
    pub fn model_view_projection(&self) -> Mat4 {
        self.model_view_projection
    }

    #[inline]
    pub fn normal_matrix(&self) -> Mat3 {
        self.normal_matrix
    }

    #[inline(always)]
    pub fn run(&self, vertex: &VertexAttributes) -> ShadedVertex {
        ShadedVertex {
            clip_position: self.model_view_projection * vertex.position.extend(1.0),
            world_normal: self.normal_matrix * vertex.normal,
            world_position: self.model.transform_point3(vertex.position),
            tex_coord: vertex.tex_coord,
        }
    }

    #[inline]
    pub fn run_triangle(&self, triangle: &[VertexAttributes; 3]) -> [ShadedVertex; 3] {
        [
            self.run(&triangle[0]),
            self.run(&triangle[1]),
            self.run(&triangle[2]),
        ]
    }

    /// Clip-space position only, for depth pre-passes.
    #[inline(always)]
    pub fn transform_position(&self, position: Vec3) -> Vec4 {
        self.model_view_projection * position.extend(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn identity_transforms_pass_through() {
        let stage = VertexStage::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        let v = VertexAttributes::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Z, Vec2::new(0.25, 0.75));
        let out = stage.run(&v);
        assert_eq!(out.clip_position, Vec4::new(1.0, 2.0, 3.0, 1.0));
        assert_eq!(out.world_position, v.position);
        assert_eq!(out.world_normal, Vec3::Z);
        assert_eq!(out.tex_coord, v.tex_coord);
    }

    #[test]
    fn world_position_ignores_view_and_projection() {
        let model = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let projection = Mat4::from_scale(Vec3::splat(2.0));
        let stage = VertexStage::new(model, view, projection);

        let out = stage.run(&VertexAttributes::new(Vec3::ONE, Vec3::Y, Vec2::ZERO));
        assert!(approx(out.world_position, Vec3::new(6.0, 1.0, 1.0)));
        assert_eq!(out.clip_position, projection * view * model * Vec4::new(1.0, 1.0, 1.0, 1.0));
        // Translation never touches normals.
        assert!(approx(out.world_normal, Vec3::Y));
    }

    #[test]
    fn normals_stay_perpendicular_under_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let stage = VertexStage::new(model, Mat4::IDENTITY, Mat4::IDENTITY);

        // Surface x + y = 0 has normal (1, 1, 0); its tangent (1, -1, 0)
        // becomes (4, -1, 0) after scaling.
        let n = stage.run(&VertexAttributes::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec2::ZERO));
        let tangent = model.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert!(n.world_normal.dot(tangent).abs() < 1e-5);
    }
}
