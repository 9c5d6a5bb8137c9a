/// Per-pixel lighting.
/// Kept separate from the rasterizer so pixel shaders can be swapped
/// without touching scan conversion.
use super::lanes::{ColorLanes, LaneF32, LaneI32, LaneMask, Vec2Lanes, Vec3Lanes};
use super::texture::Sampler;
use glam::Vec3;

/// Ambient term shared by every light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadingConfig {
    /// Fraction of the diffuse color added regardless of lighting.
    pub ambient: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self { ambient: 0.1 }
    }
}

/// Point light in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    pub position: Vec3,
    pub intensity: f32,
}

impl Light {
    pub const DEFAULT_INTENSITY: f32 = 0.9;

    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            intensity: Self::DEFAULT_INTENSITY,
        }
    }
}

impl Default for Light {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Interpolated attributes for one lane group.
#[derive(Copy, Clone, Debug)]
pub struct FragmentInput {
    pub world_positions: Vec3Lanes,
    pub world_normals: Vec3Lanes,
    /// Zero in lanes outside `mask`.
    pub tex_coords: Vec2Lanes,
    /// Lanes that will actually be written.
    pub mask: LaneMask,
}

/// Computes a color for each lane of a group.
pub trait PixelShader {
    fn run(&self, input: &FragmentInput) -> ColorLanes;
}

impl<F: Fn(&FragmentInput) -> ColorLanes> PixelShader for F {
    #[inline]
    fn run(&self, input: &FragmentInput) -> ColorLanes {
        self(input)
    }
}

/// Lambert diffuse from point lights plus ambient:
///
/// `sum(max(0, normalize(L - p) . n) * diffuse * intensity) + ambient * diffuse`
///
/// clamped to `[0, 255]` per channel. Normals are used as given.
pub fn shade_lanes(
    config: &ShadingConfig,
    positions: &Vec3Lanes,
    normals: &Vec3Lanes,
    diffuse: &ColorLanes,
    lights: &[Light],
) -> ColorLanes {
    let mut lighting = LaneF32::ZERO;
    for light in lights {
        let to_light = Vec3Lanes::splat(light.position).sub(positions);
        let inv_len = to_light.dot(&to_light).sqrt().recip();
        // A fragment sitting on the light gives NaN here, which max() drops.
        let lambert = to_light.dot(normals) * inv_len;
        lighting = lambert.max(LaneF32::ZERO).mul_add(LaneF32::splat(light.intensity), lighting);
    }
    let factor = lighting + config.ambient;

    let channel = |c: &LaneI32| (c.to_f32() * factor).round_to_i32().clamp(0, 255);
    ColorLanes {
        r: channel(&diffuse.r),
        g: channel(&diffuse.g),
        b: channel(&diffuse.b),
    }
}

/// Samples a texture for the diffuse color and lights it.
#[derive(Clone, Debug)]
pub struct TexturedShader<S> {
    pub sampler: S,
    pub lights: Vec<Light>,
    pub config: ShadingConfig,
}

impl<S: Sampler> TexturedShader<S> {
    pub fn new(sampler: S, lights: Vec<Light>) -> Self {
        Self {
            sampler,
            lights,
            config: ShadingConfig::default(),
        }
    }
}

impl<S: Sampler> PixelShader for TexturedShader<S> {
    #[inline]
    fn run(&self, input: &FragmentInput) -> ColorLanes {
        let diffuse = self.sampler.sample(&input.tex_coords.x, &input.tex_coords.y);
        shade_lanes(
            &self.config,
            &input.world_positions,
            &input.world_normals,
            &diffuse,
            &self.lights,
        )
    }
}

/// Samples a texture with no lighting at all.
#[derive(Clone, Debug)]
pub struct UnlitShader<S>(pub S);

impl<S: Sampler> PixelShader for UnlitShader<S> {
    #[inline]
    fn run(&self, input: &FragmentInput) -> ColorLanes {
        self.0.sample(&input.tex_coords.x, &input.tex_coords.y)
    }
}
