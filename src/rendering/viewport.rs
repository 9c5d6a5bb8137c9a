/// Normalized device coordinates -> pixel coordinates.
/// Cheaper than running a general 4x4 matrix per vertex.
use glam::{Vec3, Vec4};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewportTransform {
    half_width: f32,
    half_height: f32,
}

impl ViewportTransform {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            half_width: (width / 2) as f32,
            half_height: (height / 2) as f32,
        }
    }

    /// `round(x_ndc * hw + hw)`
    #[inline(always)]
    pub fn map_x(&self, x_ndc: f32) -> f32 {
        (x_ndc * self.half_width + self.half_width + 0.5).floor()
    }

    /// `round(-y_ndc * hh + hh)`; rows grow downwards.
    #[inline(always)]
    pub fn map_y(&self, y_ndc: f32) -> f32 {
        (-y_ndc * self.half_height + self.half_height + 0.5).floor()
    }

    /// Perspective-divide a clip-space position and map it to the screen.
    /// The returned `z` is the clip `w`, kept as the depth proxy.
    #[inline(always)]
    pub fn to_screen(&self, clip: Vec4) -> Vec3 {
        Vec3::new(self.map_x(clip.x / clip.w), self.map_y(clip.y / clip.w), clip.w)
    }

    /// Inverse of [`to_screen`](Self::to_screen) for integer pixel positions:
    /// the clip-space position with the given `w` that lands on `(x, y)`.
    #[inline]
    pub fn to_clip(&self, x: f32, y: f32, w: f32) -> Vec4 {
        let x_ndc = (x - self.half_width) / self.half_width;
        let y_ndc = -(y - self.half_height) / self.half_height;
        Vec4::new(x_ndc * w, y_ndc * w, 0.0, w)
    }
}
