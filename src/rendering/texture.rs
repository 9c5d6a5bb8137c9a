/// Texture storage and lane-parallel samplers.
///
/// Every sampler fetches one texel per lane with an ordinary bounds-checked
/// slice index; the coordinates are resolved through an [`AddressMode`]
/// first, so a fetch can never leave the texture.
use super::lanes::{ColorLanes, LaneF32, LaneI32, LANES};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture {width}x{height} has no texels")]
    Empty { width: usize, height: usize },
    #[error("row stride of {stride} bytes is shorter than a {width}-texel row")]
    StrideTooSmall { stride: usize, width: usize },
    #[error("texture data holds {len} bytes but {required} are needed")]
    DataTooSmall { len: usize, required: usize },
}

/// Byte layout of one texel. Channels are stored in R, G, B(, A) order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TexelFormat {
    Rgba8,
    Rgb8,
}

impl TexelFormat {
    #[inline(always)]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TexelFormat::Rgba8 => 4,
            TexelFormat::Rgb8 => 3,
        }
    }
}

/// What happens to texel coordinates that fall outside the texture.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AddressMode {
    /// Use the nearest edge texel.
    #[default]
    Clamp,
    /// Tile the texture.
    Repeat,
}

impl AddressMode {
    #[inline(always)]
    fn resolve(self, coord: i32, size: usize) -> usize {
        match self {
            AddressMode::Clamp => coord.clamp(0, size as i32 - 1) as usize,
            AddressMode::Repeat => coord.rem_euclid(size as i32) as usize,
        }
    }
}

/// Immutable texel buffer, cheap to share between samplers.
#[derive(Clone, Debug)]
pub struct Texture {
    data: Arc<[u8]>,
    width: usize,
    height: usize,
    stride: usize,
    format: TexelFormat,
}

impl Texture {
    /// Tightly packed texture (`stride = width * bytes_per_texel`).
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        width: usize,
        height: usize,
        format: TexelFormat,
    ) -> Result<Self, TextureError> {
        Self::with_stride(data, width, height, width * format.bytes_per_texel(), format)
    }

    pub fn with_stride(
        data: impl Into<Arc<[u8]>>,
        width: usize,
        height: usize,
        stride: usize,
        format: TexelFormat,
    ) -> Result<Self, TextureError> {
        let data = data.into();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let row = width * format.bytes_per_texel();
        if stride < row {
            return Err(TextureError::StrideTooSmall { stride, width });
        }
        let required = stride * (height - 1) + row;
        if data.len() < required {
            return Err(TextureError::DataTooSmall {
                len: data.len(),
                required,
            });
        }

        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// `width x height` RGBA checkerboard made of `cell`-sized squares,
    /// starting with `a` in the top-left corner.
    pub fn checkerboard(width: usize, height: usize, cell: usize, a: [u8; 3], b: [u8; 3]) -> Self {
        let cell = cell.max(1);
        let (width, height) = (width.max(1), height.max(1));
        let mut data = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                let c = if ((x / cell) + (y / cell)) % 2 == 0 { a } else { b };
                data.extend_from_slice(&[c[0], c[1], c[2], 255]);
            }
        }

        Self {
            data: data.into(),
            width,
            height,
            stride: width * 4,
            format: TexelFormat::Rgba8,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn format(&self) -> TexelFormat {
        self.format
    }

    /// Texel at `(x, y)` as `[r, g, b]`. Panics when out of bounds.
    #[inline(always)]
    pub fn texel(&self, x: usize, y: usize) -> [u8; 3] {
        let o = y * self.stride + x * self.format.bytes_per_texel();
        let px = &self.data[o..o + 3];
        [px[0], px[1], px[2]]
    }
}

/// Lane-parallel texture lookup: one `(u, v)` pair per lane in, one color
/// per lane out.
pub trait Sampler {
    fn sample(&self, u: &LaneF32, v: &LaneF32) -> ColorLanes;
}

impl<S: Sampler + ?Sized> Sampler for &S {
    #[inline]
    fn sample(&self, u: &LaneF32, v: &LaneF32) -> ColorLanes {
        (**self).sample(u, v)
    }
}

/// Point sampling: `tx = floor(u * (w - 1))`, `ty = floor(v * (h - 1))`.
#[derive(Clone, Debug)]
pub struct NearestSampler {
    texture: Texture,
    pub address_mode: AddressMode,
}

impl NearestSampler {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            address_mode: AddressMode::default(),
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

impl Sampler for NearestSampler {
    #[inline]
    fn sample(&self, u: &LaneF32, v: &LaneF32) -> ColorLanes {
        let t = &self.texture;
        let xs = (*u * (t.width - 1) as f32).floor().to_i32();
        let ys = (*v * (t.height - 1) as f32).floor().to_i32();

        let mut out = ColorLanes::BLACK;
        for i in 0..LANES {
            let x = self.address_mode.resolve(xs.0[i], t.width);
            let y = self.address_mode.resolve(ys.0[i], t.height);
            let [r, g, b] = t.texel(x, y);
            out.r.0[i] = r as i32;
            out.g.0[i] = g as i32;
            out.b.0[i] = b as i32;
        }
        out
    }
}

/// Bilinear filtering between the four texels bracketing
/// `(u * (w - 1), v * (h - 1))`.
#[derive(Clone, Debug)]
pub struct BilinearSampler {
    texture: Texture,
    pub address_mode: AddressMode,
}

impl BilinearSampler {
    pub fn new(texture: Texture) -> Self {
        Self {
            texture,
            address_mode: AddressMode::default(),
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }
}

impl Sampler for BilinearSampler {
    #[inline]
    fn sample(&self, u: &LaneF32, v: &LaneF32) -> ColorLanes {
        let t = &self.texture;
        let x = *u * (t.width - 1) as f32;
        let y = *v * (t.height - 1) as f32;
        let x0 = x.floor();
        let y0 = y.floor();

        // Distances to the right/bottom (a, b) and left/top (c, d) texels.
        let c = x - x0;
        let d = y - y0;
        let a = LaneF32::ONE - c;
        let b = LaneF32::ONE - d;

        let w11 = a * b;
        let w12 = a * d;
        let w21 = c * b;
        let w22 = c * d;

        let x0 = x0.to_i32();
        let y0 = y0.to_i32();

        let mut r = LaneF32::ZERO;
        let mut g = LaneF32::ZERO;
        let mut bl = LaneF32::ZERO;
        for i in 0..LANES {
            let xa = self.address_mode.resolve(x0.0[i], t.width);
            let xb = self.address_mode.resolve(x0.0[i].saturating_add(1), t.width);
            let ya = self.address_mode.resolve(y0.0[i], t.height);
            let yb = self.address_mode.resolve(y0.0[i].saturating_add(1), t.height);

            let taps = [
                (t.texel(xa, ya), w11.0[i]),
                (t.texel(xa, yb), w12.0[i]),
                (t.texel(xb, ya), w21.0[i]),
                (t.texel(xb, yb), w22.0[i]),
            ];
            for (texel, w) in taps {
                r.0[i] += texel[0] as f32 * w;
                g.0[i] += texel[1] as f32 * w;
                bl.0[i] += texel[2] as f32 * w;
            }
        }

        ColorLanes {
            r: r.round_to_i32(),
            g: g.round_to_i32(),
            b: bl.round_to_i32(),
        }
    }
}

/// Returns the same color for every lane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SolidSampler {
    pub color: [u8; 3],
}

impl Sampler for SolidSampler {
    #[inline]
    fn sample(&self, _u: &LaneF32, _v: &LaneF32) -> ColorLanes {
        ColorLanes {
            r: LaneI32::splat(self.color[0] as i32),
            g: LaneI32::splat(self.color[1] as i32),
            b: LaneI32::splat(self.color[2] as i32),
        }
    }
}
