/// Reversed depth buffer: larger values are closer to the viewer.
///
/// Storage is rented from a [`MemoryPool`] and handed back when the buffer
/// is dropped.
use super::lanes::{LaneF32, LaneMask, LANES};
use super::framebuffer::FrameTarget;
use crate::memory::{MemoryPool, PoolError};
use crate::perf::FUNCTION_COUNTERS;
use crate::count_add;

/// Value of a cell nothing has been drawn to. Any finite depth beats it.
pub const FAR_DEPTH: f32 = f32::MIN;

pub struct DepthBuffer<'p> {
    values: Box<[f32]>,
    width: usize,
    height: usize,
    pool: &'p MemoryPool<f32>,
}

impl<'p> DepthBuffer<'p> {
    /// Rent `width * height` cells from `pool` and reset them to
    /// [`FAR_DEPTH`].
    pub fn rent(width: usize, height: usize, pool: &'p MemoryPool<f32>) -> Result<Self, PoolError> {
        let mut values = pool.rent(width * height * std::mem::size_of::<f32>())?;
        values.fill(FAR_DEPTH);
        log::debug!("depth buffer rented: {width}x{height}");
        Ok(Self {
            values,
            width,
            height,
            pool,
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

    /// Reset every cell to [`FAR_DEPTH`].
    pub fn clear(&mut self) {
        self.values.fill(FAR_DEPTH);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y * self.width + x]
    }

    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        &self.values[y * self.width..(y + 1) * self.width]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Copy of the current contents, row-major.
    pub fn to_vec(&self) -> Vec<f32> {
        self.values.to_vec()
    }

    /// Depth test and merge for one lane group starting at column `x` of
    /// row `y`.
    ///
    /// Every covered lane stores `max(old, z)`. The returned mask holds the
    /// covered lanes where `z` was strictly greater than the old value,
    /// i.e. the pixels whose color should be written. Redrawing the same
    /// triangle therefore writes nothing.
    ///
    /// Covered lanes must lie inside the buffer; `x` itself may be negative
    /// when the group straddles the left edge.
    #[inline(always)]
    pub fn merge(&mut self, x: i32, y: usize, z: &LaneF32, covered: LaneMask) -> LaneMask {
        let row = y * self.width;
        let mut passed = LaneMask::NONE;

        if covered.is_full() {
            let start = row + x as usize;
            let cells = &mut self.values[start..start + LANES];
            let mut old = LaneF32([FAR_DEPTH; LANES]);
            old.0.copy_from_slice(cells);
            passed = z.gt(old);
            cells.copy_from_slice(&old.max(*z).0);
        } else {
            for i in covered.lanes() {
                let cell = &mut self.values[row + (x + i as i32) as usize];
                let new = z.0[i];
                if new > *cell {
                    passed.0 |= 1 << i;
                }
                *cell = cell.max(new);
            }
        }

        count_add!(FUNCTION_COUNTERS.depth_test_passed, passed.count() as u64);
        count_add!(
            FUNCTION_COUNTERS.depth_test_failed,
            (covered.count() - passed.count()) as u64
        );
        passed
    }

    /// Render the depths as grayscale into `target`.
    pub fn write_visualization(&self, target: &mut FrameTarget<'_>) {
        write_depth_visualization(&self.values, self.width, target);
    }
}

/// Grayscale view of row-major depth values `width` cells wide: the nearest
/// value is white, the farthest black. Untouched cells are black too.
pub fn write_depth_visualization(values: &[f32], width: usize, target: &mut FrameTarget<'_>) {
    let drawn = |d: f32| d.is_finite() && d != FAR_DEPTH;
    let (lo, hi) = values
        .iter()
        .copied()
        .filter(|&d| drawn(d))
        .fold((f32::MAX, f32::MIN), |(lo, hi), d| (lo.min(d), hi.max(d)));
    let range = (hi - lo).max(f32::EPSILON);

    for (y, row) in values.chunks_exact(width.max(1)).take(target.height()).enumerate() {
        for (x, &d) in row.iter().take(target.width()).enumerate() {
            let gray = if drawn(d) {
                (((d - lo) / range) * 255.0).round() as u8
            } else {
                0
            };
            target.put_pixel(x as i32, y as i32, [gray; 3]);
        }
    }
}

impl Drop for DepthBuffer<'_> {
    fn drop(&mut self) {
        let values = std::mem::take(&mut self.values);
        self.pool.give_back(values);
    }
}
