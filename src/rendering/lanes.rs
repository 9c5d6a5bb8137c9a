/// Fixed-width lane groups used by the scan converter.
/// A lane group is `LANES` horizontally adjacent pixels of one scanline.
/// All arithmetic is plain array-of-lanes loops which LLVM turns into
/// packed SSE/AVX code on x86_64; there is no ISA-specific path.
use std::ops::{Add, AddAssign, BitAnd, BitOr, Div, Mul, Neg, Not, Sub, SubAssign};

/// Number of pixels processed together.
pub const LANES: usize = 8;

/// `LANES` floats, one per pixel.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C, align(32))]
pub struct LaneF32(pub [f32; LANES]);

/// `LANES` integers, one per pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(C, align(32))]
pub struct LaneI32(pub [i32; LANES]);

/// One bit per lane; bit `i` set means lane `i` is active.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct LaneMask(pub u8);

const _: () = assert!(LANES <= 8, "LaneMask stores one bit per lane in a u8");

impl LaneF32 {
    pub const ZERO: Self = Self([0.0; LANES]);
    pub const ONE: Self = Self([1.0; LANES]);

    #[inline(always)]
    pub const fn splat(v: f32) -> Self {
        Self([v; LANES])
    }

    /// `[start, start + 1, ..., start + LANES - 1]`
    #[inline(always)]
    pub fn ramp(start: f32) -> Self {
        Self::from_fn(|i| start + i as f32)
    }

    #[inline(always)]
    pub fn from_fn(mut f: impl FnMut(usize) -> f32) -> Self {
        let mut out = [0.0; LANES];
        for (i, o) in out.iter_mut().enumerate() {
            *o = f(i);
        }
        Self(out)
    }

    #[inline(always)]
    pub fn map(self, mut f: impl FnMut(f32) -> f32) -> Self {
        Self::from_fn(|i| f(self.0[i]))
    }

    #[inline(always)]
    pub fn zip(self, other: Self, mut f: impl FnMut(f32, f32) -> f32) -> Self {
        Self::from_fn(|i| f(self.0[i], other.0[i]))
    }

    #[inline(always)]
    pub fn max(self, other: Self) -> Self {
        self.zip(other, f32::max)
    }

    #[inline(always)]
    pub fn min(self, other: Self) -> Self {
        self.zip(other, f32::min)
    }

    #[inline(always)]
    pub fn floor(self) -> Self {
        self.map(f32::floor)
    }

    #[inline(always)]
    pub fn recip(self) -> Self {
        self.map(f32::recip)
    }

    #[inline(always)]
    pub fn sqrt(self) -> Self {
        self.map(f32::sqrt)
    }

    /// `self * a + b`
    #[inline(always)]
    pub fn mul_add(self, a: Self, b: Self) -> Self {
        Self::from_fn(|i| self.0[i] * a.0[i] + b.0[i])
    }

    #[inline(always)]
    pub fn ge(self, other: Self) -> LaneMask {
        LaneMask::from_fn(|i| self.0[i] >= other.0[i])
    }

    #[inline(always)]
    pub fn gt(self, other: Self) -> LaneMask {
        LaneMask::from_fn(|i| self.0[i] > other.0[i])
    }

    #[inline(always)]
    pub fn le(self, other: Self) -> LaneMask {
        LaneMask::from_fn(|i| self.0[i] <= other.0[i])
    }

    /// Lanes of `self` where `mask` is set, `other` elsewhere.
    #[inline(always)]
    pub fn select(self, mask: LaneMask, other: Self) -> Self {
        Self::from_fn(|i| if mask.test(i) { self.0[i] } else { other.0[i] })
    }

    /// Round to nearest, halfway cases away from zero.
    #[inline(always)]
    pub fn round_to_i32(self) -> LaneI32 {
        LaneI32::from_fn(|i| self.0[i].round() as i32)
    }

    #[inline(always)]
    pub fn to_i32(self) -> LaneI32 {
        LaneI32::from_fn(|i| self.0[i] as i32)
    }
}

impl LaneI32 {
    pub const ZERO: Self = Self([0; LANES]);

    #[inline(always)]
    pub const fn splat(v: i32) -> Self {
        Self([v; LANES])
    }

    #[inline(always)]
    pub fn from_fn(mut f: impl FnMut(usize) -> i32) -> Self {
        let mut out = [0; LANES];
        for (i, o) in out.iter_mut().enumerate() {
            *o = f(i);
        }
        Self(out)
    }

    #[inline(always)]
    pub fn to_f32(self) -> LaneF32 {
        LaneF32::from_fn(|i| self.0[i] as f32)
    }

    #[inline(always)]
    pub fn clamp(self, lo: i32, hi: i32) -> Self {
        Self::from_fn(|i| self.0[i].clamp(lo, hi))
    }
}

impl LaneMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(((1u16 << LANES) - 1) as u8);

    #[inline(always)]
    pub fn from_fn(mut f: impl FnMut(usize) -> bool) -> Self {
        let mut bits = 0u8;
        for i in 0..LANES {
            bits |= (f(i) as u8) << i;
        }
        Self(bits)
    }

    /// Lanes whose absolute x lies in `[lo, hi]`, for a group starting at `x`.
    #[inline(always)]
    pub fn columns_within(x: i32, lo: i32, hi: i32) -> Self {
        Self::from_fn(|i| {
            let px = x + i as i32;
            px >= lo && px <= hi
        })
    }

    #[inline(always)]
    pub const fn test(self, lane: usize) -> bool {
        self.0 & (1 << lane) != 0
    }

    #[inline(always)]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    pub const fn is_full(self) -> bool {
        self.0 == Self::ALL.0
    }

    #[inline(always)]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Indices of the set lanes, lowest first.
    #[inline]
    pub fn lanes(self) -> impl Iterator<Item = usize> {
        (0..LANES).filter(move |&i| self.test(i))
    }
}

macro_rules! impl_lane_binop {
    ($ty:ident, $trait:ident, $method:ident, $op:tt) => {
        impl $trait for $ty {
            type Output = $ty;
            #[inline(always)]
            fn $method(self, rhs: $ty) -> $ty {
                $ty::from_fn(|i| self.0[i] $op rhs.0[i])
            }
        }
    };
}

impl_lane_binop!(LaneF32, Add, add, +);
impl_lane_binop!(LaneF32, Sub, sub, -);
impl_lane_binop!(LaneF32, Mul, mul, *);
impl_lane_binop!(LaneF32, Div, div, /);
impl_lane_binop!(LaneI32, Add, add, +);
impl_lane_binop!(LaneI32, Sub, sub, -);
impl_lane_binop!(LaneI32, Mul, mul, *);

impl Mul<f32> for LaneF32 {
    type Output = LaneF32;
    #[inline(always)]
    fn mul(self, rhs: f32) -> LaneF32 {
        self.map(|v| v * rhs)
    }
}

impl Add<f32> for LaneF32 {
    type Output = LaneF32;
    #[inline(always)]
    fn add(self, rhs: f32) -> LaneF32 {
        self.map(|v| v + rhs)
    }
}

impl Neg for LaneF32 {
    type Output = LaneF32;
    #[inline(always)]
    fn neg(self) -> LaneF32 {
        self.map(|v| -v)
    }
}

impl AddAssign for LaneF32 {
    #[inline(always)]
    fn add_assign(&mut self, rhs: LaneF32) {
        *self = *self + rhs;
    }
}

impl SubAssign for LaneF32 {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: LaneF32) {
        *self = *self - rhs;
    }
}

impl BitAnd for LaneMask {
    type Output = LaneMask;
    #[inline(always)]
    fn bitand(self, rhs: LaneMask) -> LaneMask {
        LaneMask(self.0 & rhs.0)
    }
}

impl BitOr for LaneMask {
    type Output = LaneMask;
    #[inline(always)]
    fn bitor(self, rhs: LaneMask) -> LaneMask {
        LaneMask(self.0 | rhs.0)
    }
}

impl Not for LaneMask {
    type Output = LaneMask;
    #[inline(always)]
    fn not(self) -> LaneMask {
        LaneMask(!self.0 & Self::ALL.0)
    }
}

/// Planar 2-component vectors, one per lane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vec2Lanes {
    pub x: LaneF32,
    pub y: LaneF32,
}

/// Planar 3-component vectors, one per lane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vec3Lanes {
    pub x: LaneF32,
    pub y: LaneF32,
    pub z: LaneF32,
}

impl Vec3Lanes {
    #[inline(always)]
    pub fn splat(v: glam::Vec3) -> Self {
        Self {
            x: LaneF32::splat(v.x),
            y: LaneF32::splat(v.y),
            z: LaneF32::splat(v.z),
        }
    }

    #[inline(always)]
    pub fn dot(&self, other: &Self) -> LaneF32 {
        self.x.mul_add(other.x, self.y.mul_add(other.y, self.z * other.z))
    }

    #[inline(always)]
    pub fn sub(&self, other: &Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    #[inline(always)]
    pub fn scale(&self, s: LaneF32) -> Self {
        Self {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Extract lane `i` as a scalar vector.
    #[inline]
    pub fn lane(&self, i: usize) -> glam::Vec3 {
        glam::Vec3::new(self.x.0[i], self.y.0[i], self.z.0[i])
    }
}

/// Planar 8-bit color channels held as integers, one pixel per lane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorLanes {
    pub r: LaneI32,
    pub g: LaneI32,
    pub b: LaneI32,
}

impl ColorLanes {
    pub const BLACK: Self = Self::splat(0, 0, 0);

    #[inline(always)]
    pub const fn splat(r: i32, g: i32, b: i32) -> Self {
        Self {
            r: LaneI32::splat(r),
            g: LaneI32::splat(g),
            b: LaneI32::splat(b),
        }
    }

    /// Color of lane `i` as `[r, g, b]`, clamped to bytes.
    #[inline]
    pub fn lane(&self, i: usize) -> [u8; 3] {
        [
            self.r.0[i].clamp(0, 255) as u8,
            self.g.0[i].clamp(0, 255) as u8,
            self.b.0[i].clamp(0, 255) as u8,
        ]
    }
}
