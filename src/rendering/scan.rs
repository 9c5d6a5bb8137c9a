/// Per-triangle scan-conversion state.
///
/// The three edge functions are evaluated once, for the first lane group of
/// the bounding box, and from then on only moved by adding precomputed
/// increments: `LANES` pixels to the right, or one row down after undoing
/// the horizontal steps of the current row. Screen vertices sit on integer
/// pixel positions, so all of this is exact in `f32` for any realistic
/// viewport size.
use super::lanes::{LaneF32, LaneMask, LANES};
use glam::Vec3;

/// Inclusive pixel bounds of a triangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Aabb {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Aabb {
    pub fn of_triangle(tri: &[Vec3; 3]) -> Self {
        let min = tri[0].min(tri[1]).min(tri[2]);
        let max = tri[0].max(tri[1]).max(tri[2]);
        Self {
            left: min.x as i32,
            top: min.y as i32,
            right: max.x as i32,
            bottom: max.y as i32,
        }
    }

    /// Restrict the rows to `[0, height)`. Columns are left alone: lanes
    /// outside the viewport are masked during the walk instead.
    pub fn clamp_rows(self, height: usize) -> Self {
        Self {
            top: self.top.max(0),
            bottom: self.bottom.min(height as i32 - 1),
            ..self
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left > self.right || self.top > self.bottom
    }
}

/// Twice the signed area of a screen triangle, `e2.x * e1.y - e2.y * e1.x`.
/// Positive for front faces.
#[inline]
pub fn signed_area2(tri: &[Vec3; 3]) -> f32 {
    let e1 = tri[0] - tri[1];
    let e2 = tri[1] - tri[2];
    e2.x * e1.y - e2.y * e1.x
}

/// Barycentric weights for one lane group.
#[derive(Copy, Clone, Debug)]
pub struct Barycentric {
    pub b1: LaneF32,
    pub b2: LaneF32,
    pub b3: LaneF32,
}

impl Barycentric {
    /// `b1 * a1 + b2 * a2 + b3 * a3` for a scalar per-vertex attribute.
    #[inline(always)]
    pub fn interpolate(&self, a1: f32, a2: f32, a3: f32) -> LaneF32 {
        self.b3.mul_add(LaneF32::splat(a3), self.b1.mul_add(LaneF32::splat(a1), self.b2 * a2))
    }
}

pub struct ScanContext {
    aabb: Aabb,
    clip_right: i32,
    /// Horizontal steps taken in the current row; may go negative after
    /// the bulk advance past off-screen columns.
    steps_in_row: i32,

    /// Edge function accumulators, one lane per pixel of the current group.
    f1: LaneF32,
    f2: LaneF32,
    f3: LaneF32,

    /// Decrement for one lane-group step right: `e.y * LANES`.
    step_x: [f32; 3],
    /// Increment for one row down: `e.x`.
    step_y: [f32; 3],

    area2: f32,
    w: [f32; 3],
    inv_w: [f32; 3],
}

impl ScanContext {
    /// `tri` holds screen positions with the clip `w` in `z`. `clip_right`
    /// is the last column that may be covered.
    pub fn new(aabb: Aabb, clip_right: i32, tri: &[Vec3; 3]) -> Self {
        let [v1, v2, v3] = *tri;
        let e1 = v1 - v2;
        let e2 = v2 - v3;
        let e3 = v3 - v1;

        let px = LaneF32::ramp(aabb.left as f32);
        let py = aabb.top as f32;

        let edge = |e: Vec3, v: Vec3| (px + -v.x) * -e.y + LaneF32::splat(e.x * (py - v.y));

        Self {
            aabb,
            clip_right,
            steps_in_row: 0,
            f1: edge(e1, v1),
            f2: edge(e2, v2),
            f3: edge(e3, v3),
            step_x: [e1.y * LANES as f32, e2.y * LANES as f32, e3.y * LANES as f32],
            step_y: [e1.x, e2.x, e3.x],
            area2: e2.x * e1.y - e2.y * e1.x,
            w: [v1.z, v2.z, v3.z],
            inv_w: [1.0 / v1.z, 1.0 / v2.z, 1.0 / v3.z],
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    #[inline]
    pub fn area_times_two(&self) -> f32 {
        self.area2
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.area2 == 0.0
    }

    /// Current edge function values, for inspection.
    #[inline]
    pub fn edge_functions(&self) -> [LaneF32; 3] {
        [self.f1, self.f2, self.f3]
    }

    /// Lanes of the group starting at column `x` that are inside all three
    /// edges and inside `[0, clip_right]`.
    #[inline(always)]
    pub fn inside_mask(&self, x: i32) -> LaneMask {
        let inside =
            self.f1.ge(LaneF32::ZERO) & self.f2.ge(LaneF32::ZERO) & self.f3.ge(LaneF32::ZERO);
        if x < 0 || x + LANES as i32 - 1 > self.clip_right {
            inside & LaneMask::columns_within(x, 0, self.clip_right)
        } else {
            inside
        }
    }

    /// Move one lane group to the right.
    #[inline(always)]
    pub fn step_x(&mut self) {
        self.f1 -= LaneF32::splat(self.step_x[0]);
        self.f2 -= LaneF32::splat(self.step_x[1]);
        self.f3 -= LaneF32::splat(self.step_x[2]);
        self.steps_in_row += 1;
    }

    /// Move `n` lane groups to the right (left for negative `n`).
    #[inline(always)]
    pub fn step_x_by(&mut self, n: i32) {
        let n_f = n as f32;
        self.f1 -= LaneF32::splat(self.step_x[0] * n_f);
        self.f2 -= LaneF32::splat(self.step_x[1] * n_f);
        self.f3 -= LaneF32::splat(self.step_x[2] * n_f);
        self.steps_in_row += n;
    }

    /// Skip whole lane groups left of the viewport. Returns the column of
    /// the first group to test, which lies in `(-LANES, 0]` when the box
    /// starts off-screen.
    #[inline]
    pub fn advance_to_start(&mut self) -> i32 {
        let mut x = self.aabb.left;
        if x < 0 {
            let k = x / LANES as i32;
            x -= k * LANES as i32;
            self.step_x_by(-k);
        }
        x
    }

    /// Skip the rest of the row from the group at column `x`.
    #[inline]
    pub fn advance_to_end(&mut self, x: i32) {
        let remaining = self.aabb.right.min(self.clip_right) + 1 - x;
        let groups = (remaining + LANES as i32 - 1).div_euclid(LANES as i32);
        self.step_x_by(groups);
    }

    /// Undo every horizontal step of this row and move one row down.
    #[inline(always)]
    pub fn reset_x_and_step_y(&mut self) {
        let steps = self.steps_in_row as f32;
        self.f1 += LaneF32::splat(self.step_y[0] + self.step_x[0] * steps);
        self.f2 += LaneF32::splat(self.step_y[1] + self.step_x[1] * steps);
        self.f3 += LaneF32::splat(self.step_y[2] + self.step_x[2] * steps);
        self.steps_in_row = 0;
    }

    /// Screen-space barycentric weights of the current group.
    #[inline(always)]
    pub fn barycentric(&self) -> Barycentric {
        let area = LaneF32::splat(self.area2);
        let b1 = self.f2 / area;
        let b2 = self.f3 / area;
        Barycentric {
            b1,
            b2,
            b3: LaneF32::ONE - b1 - b2,
        }
    }

    /// Interpolated clip `w`: `1 / (b1/w1 + b2/w2 + b3/w3)`.
    #[inline(always)]
    pub fn depth(&self, b: &Barycentric) -> LaneF32 {
        let [i1, i2, i3] = self.inv_w;
        b.b1
            .mul_add(LaneF32::splat(i1), b.b2.mul_add(LaneF32::splat(i2), b.b3 * i3))
            .recip()
    }

    /// Weights for attribute interpolation. The third weight is derived from
    /// the other two so the three always sum to one.
    #[inline(always)]
    pub fn perspective_correct(&self, b: &Barycentric, z: LaneF32) -> Barycentric {
        let b1 = z / LaneF32::splat(self.w[0]) * b.b1;
        let b2 = z / LaneF32::splat(self.w[1]) * b.b2;
        Barycentric {
            b1,
            b2,
            b3: LaneF32::ONE - b1 - b2,
        }
    }
}
