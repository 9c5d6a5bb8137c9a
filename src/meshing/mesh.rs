/// Triangle-list meshes and procedural test geometry.
use crate::rendering::texture::Texture;
use crate::rendering::vertex::VertexAttributes;
use glam::{Vec2, Vec3};

/// Independent triangles, counter-clockwise when seen from the front.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<[VertexAttributes; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triangles(triangles: impl IntoIterator<Item = [VertexAttributes; 3]>) -> Self {
        Self {
            triangles: triangles.into_iter().collect(),
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Append a quad spanned by `u` and `v` around `center`, split into two
    /// triangles. The front side is the one `u x v` points to.
    pub fn push_quad(&mut self, center: Vec3, u: Vec3, v: Vec3) {
        let normal = u.cross(v).normalize_or_zero();
        let corner = |s: f32, t: f32| {
            VertexAttributes::new(
                center + u * s + v * t,
                normal,
                // Texture rows run top to bottom.
                Vec2::new(s + 0.5, 0.5 - t),
            )
        };
        let (a, b, c, d) = (
            corner(-0.5, -0.5),
            corner(0.5, -0.5),
            corner(0.5, 0.5),
            corner(-0.5, 0.5),
        );
        self.triangles.push([a, b, c]);
        self.triangles.push([a, c, d]);
    }

    /// Axis-aligned cube of edge `size` centered on the origin, one
    /// full-texture quad per face.
    pub fn cube(size: f32) -> Self {
        const FACES: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self::new();
        for (normal, u, v) in FACES {
            mesh.push_quad(normal * (size * 0.5), u * size, v * size);
        }
        mesh
    }

    /// `size`x`size` RGBA checkerboard with eight cells per side.
    pub fn checkerboard_texture(size: usize) -> Texture {
        Texture::checkerboard(size, size, (size / 8).max(1), [230, 230, 230], [40, 90, 200])
    }
}
