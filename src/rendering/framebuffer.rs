/// BGR24 render targets and lane packing.
///
/// Shading works on planar lanes (one register of reds, one of greens, one
/// of blues) while the framebuffer is interleaved bytes, 3 per pixel in
/// B,G,R order with an explicit row stride. The functions here convert
/// between the two layouts.
use super::error::RasterError;
use super::lanes::{ColorLanes, LaneI32, LaneMask, LANES};

pub const BYTES_PER_PIXEL: usize = 3;

/// Write the masked lanes of `colors` as B,G,R triplets starting at byte
/// `offset`. Bytes belonging to unmasked lanes are not touched, so groups
/// from different triangles can interleave freely.
///
/// Channel values are expected in `[0, 255]`; only the low byte is stored.
#[inline]
pub fn store_interleaved(dst: &mut [u8], offset: usize, colors: &ColorLanes, mask: LaneMask) {
    if mask.is_full() {
        let span = &mut dst[offset..offset + LANES * BYTES_PER_PIXEL];
        for (i, px) in span.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            px[0] = colors.b.0[i] as u8;
            px[1] = colors.g.0[i] as u8;
            px[2] = colors.r.0[i] as u8;
        }
        return;
    }

    for i in mask.lanes() {
        let o = offset + i * BYTES_PER_PIXEL;
        dst[o] = colors.b.0[i] as u8;
        dst[o + 1] = colors.g.0[i] as u8;
        dst[o + 2] = colors.r.0[i] as u8;
    }
}

/// Read the masked lanes of an interleaved B,G,R run back into planar lanes.
/// Unmasked lanes come back as zero.
#[inline]
pub fn load_interleaved(src: &[u8], offset: usize, mask: LaneMask) -> ColorLanes {
    let mut out = ColorLanes::BLACK;
    for i in mask.lanes() {
        let o = offset + i * BYTES_PER_PIXEL;
        out.b.0[i] = src[o] as i32;
        out.g.0[i] = src[o + 1] as i32;
        out.r.0[i] = src[o + 2] as i32;
    }
    out
}

/// Borrowed, validated view of a caller-owned BGR24 buffer.
pub struct FrameTarget<'a> {
    pixels: &'a mut [u8],
    stride: usize,
    width: usize,
    height: usize,
}

impl<'a> FrameTarget<'a> {
    pub fn new(
        pixels: &'a mut [u8],
        stride: usize,
        width: usize,
        height: usize,
    ) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyViewport { width, height });
        }
        if stride < width * BYTES_PER_PIXEL {
            return Err(RasterError::StrideTooSmall { stride, width });
        }
        let required = stride * (height - 1) + width * BYTES_PER_PIXEL;
        if pixels.len() < required {
            return Err(RasterError::FramebufferTooSmall {
                len: pixels.len(),
                required,
            });
        }

        Ok(Self {
            pixels,
            stride,
            width,
            height,
        })
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
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels
    }

    /// Byte offset of pixel `(x, y)`. Callers guarantee it is in bounds.
    #[inline(always)]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + x * BYTES_PER_PIXEL
    }

    /// Masked store of one lane group whose first pixel is `(x, y)`.
    ///
    /// `x` may be negative for a group straddling the left edge; masked
    /// lanes must still land inside the row.
    #[inline(always)]
    pub fn store_group(&mut self, x: i32, y: usize, colors: &ColorLanes, mask: LaneMask) {
        if x >= 0 {
            let offset = self.offset(x as usize, y);
            store_interleaved(self.pixels, offset, colors, mask);
            return;
        }

        let row = y * self.stride;
        for i in mask.lanes() {
            let o = row + (x + i as i32) as usize * BYTES_PER_PIXEL;
            self.pixels[o] = colors.b.0[i] as u8;
            self.pixels[o + 1] = colors.g.0[i] as u8;
            self.pixels[o + 2] = colors.r.0[i] as u8;
        }
    }

    /// Write a single pixel, silently dropping it when outside the viewport.
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, rgb: [u8; 3]) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return false;
        }
        let o = self.offset(x as usize, y as usize);
        self.pixels[o] = rgb[2];
        self.pixels[o + 1] = rgb[1];
        self.pixels[o + 2] = rgb[0];
        true
    }

    /// Pixel at `(x, y)` as `[r, g, b]`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let o = self.offset(x, y);
        [self.pixels[o + 2], self.pixels[o + 1], self.pixels[o]]
    }

    /// Fill every visible pixel with `rgb`. Row padding is left alone.
    pub fn clear(&mut self, rgb: [u8; 3]) {
        let row_bytes = self.width * BYTES_PER_PIXEL;
        for y in 0..self.height {
            let start = y * self.stride;
            for px in self.pixels[start..start + row_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
                px[0] = rgb[2];
                px[1] = rgb[1];
                px[2] = rgb[0];
            }
        }
    }
}

/// Owned BGR24 image with rows padded to 4 bytes, the layout of a
/// 24-bit device-independent bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pub stride: usize,
    pub pixels: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let stride = (width * BYTES_PER_PIXEL + 3) & !3;
        Self {
            width,
            height,
            stride,
            pixels: vec![0; stride * height],
        }
    }

    /// Validated view for rasterization.
    pub fn target(&mut self) -> Result<FrameTarget<'_>, RasterError> {
        FrameTarget::new(&mut self.pixels, self.stride, self.width, self.height)
    }

    /// Pixel at `(x, y)` as `[r, g, b]`.
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let o = y * self.stride + x * BYTES_PER_PIXEL;
        [self.pixels[o + 2], self.pixels[o + 1], self.pixels[o]]
    }

    /// Number of visible pixels that differ from `rgb`.
    pub fn count_not(&self, rgb: [u8; 3]) -> usize {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|&(x, y)| self.pixel(x, y) != rgb)
            .count()
    }
}

/// Pack an 8-bit RGB triple into lanes, handy for solid fills.
#[inline]
pub fn splat_rgb(rgb: [u8; 3]) -> ColorLanes {
    ColorLanes {
        r: LaneI32::splat(rgb[0] as i32),
        g: LaneI32::splat(rgb[1] as i32),
        b: LaneI32::splat(rgb[2] as i32),
    }
}
