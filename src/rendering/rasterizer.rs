/// Lane-parallel triangle rasterizer.
///
/// Triangles are walked over their screen bounding box one group of
/// `LANES` horizontally adjacent pixels at a time. Coverage comes from
/// incrementally stepped edge functions, depth is the perspective-correct
/// clip `w` (larger is closer), and only lanes that win the depth test are
/// shaded and written.
use super::depth::DepthBuffer;
use super::error::RasterError;
use super::framebuffer::FrameTarget;
use super::lanes::{LaneF32, LaneMask, Vec2Lanes, Vec3Lanes, LANES};
use super::scan::{signed_area2, Aabb, Barycentric, ScanContext};
use super::shading::{FragmentInput, PixelShader};
use super::vertex::{ShadedVertex, VertexStage};
use super::viewport::ViewportTransform;
use crate::memory::MemoryPool;
use crate::meshing::Mesh;
use crate::perf::FUNCTION_COUNTERS;
use crate::{count_add, count_call};
use bitflags::bitflags;
use glam::{Vec2, Vec3, Vec4};

bitflags! {
    /// Which passes run for each submitted triangle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RasterMode: u8 {
        /// Depth-tested, shaded interior.
        const FILL = 0b01;
        /// White edges on top, no depth test.
        const WIREFRAME = 0b10;
    }
}

impl Default for RasterMode {
    fn default() -> Self {
        Self::FILL
    }
}

pub const WIREFRAME_COLOR: [u8; 3] = [255, 255, 255];

pub struct Rasterizer<'a> {
    target: FrameTarget<'a>,
    depth: DepthBuffer<'a>,
    viewport: ViewportTransform,
    pub mode: RasterMode,
    /// Skip triangles that are clockwise on screen.
    pub cull_back_faces: bool,
    // Scratch for vertex-stage output so each mesh vertex is transformed
    // once per call rather than per pass.
    shaded: Vec<[ShadedVertex; 3]>,
}

impl<'a> Rasterizer<'a> {
    /// Bind to a caller-owned BGR24 framebuffer, renting the depth buffer
    /// from [`MemoryPool::shared`].
    pub fn new(
        framebuffer: &'a mut [u8],
        stride: usize,
        width: usize,
        height: usize,
    ) -> Result<Self, RasterError> {
        Self::with_pool(framebuffer, stride, width, height, MemoryPool::shared())
    }

    pub fn with_pool(
        framebuffer: &'a mut [u8],
        stride: usize,
        width: usize,
        height: usize,
        pool: &'a MemoryPool<f32>,
    ) -> Result<Self, RasterError> {
        let target = FrameTarget::new(framebuffer, stride, width, height)?;
        Self::from_target(target, pool)
    }

    pub fn from_target(
        target: FrameTarget<'a>,
        pool: &'a MemoryPool<f32>,
    ) -> Result<Self, RasterError> {
        let (width, height) = (target.width(), target.height());
        let depth = DepthBuffer::rent(width, height, pool)?;
        log::debug!(
            "rasterizer bound to {}x{} target, stride {}",
            width,
            height,
            target.stride()
        );
        Ok(Self {
            target,
            depth,
            viewport: ViewportTransform::new(width, height),
            mode: RasterMode::default(),
            cull_back_faces: true,
            shaded: Vec::new(),
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.target.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.target.height()
    }

    #[inline]
    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    #[inline]
    pub fn depth_buffer(&self) -> &DepthBuffer<'a> {
        &self.depth
    }

    #[inline]
    pub fn target(&self) -> &FrameTarget<'a> {
        &self.target
    }

    #[inline]
    pub fn target_mut(&mut self) -> &mut FrameTarget<'a> {
        &mut self.target
    }

    /// Start a new depth pass without rebinding the framebuffer.
    pub fn clear_depth(&mut self) {
        self.depth.clear();
    }

    /// Release the framebuffer borrow and return the depth buffer to its
    /// pool, keeping a copy of the depth values.
    pub fn into_depth_values(self) -> Vec<f32> {
        self.depth.to_vec()
    }

    #[inline]
    fn clip_right(&self) -> i32 {
        self.target.width() as i32 - 1
    }

    fn to_screen(&self, clip: [Vec4; 3]) -> [Vec3; 3] {
        clip.map(|c| self.viewport.to_screen(c))
    }

    /// Bounding box restricted to visible rows, or `None` when the triangle
    /// cannot touch the viewport.
    fn visible_box(&self, screen: &[Vec3; 3]) -> Option<Aabb> {
        let aabb = Aabb::of_triangle(screen).clamp_rows(self.target.height());
        if aabb.is_empty() || aabb.right < 0 || aabb.left > self.clip_right() {
            return None;
        }
        Some(aabb)
    }

    /// Draw one triangle with the passes selected by [`mode`](Self::mode).
    /// Returns the number of pixels whose color was written.
    pub fn rasterize<S: PixelShader + ?Sized>(
        &mut self,
        triangle: &[ShadedVertex; 3],
        shader: &S,
    ) -> usize {
        count_call!(FUNCTION_COUNTERS.triangles_submitted);
        let screen = self.to_screen(triangle.each_ref().map(|v| v.clip_position));

        if self.cull_back_faces && signed_area2(&screen) < 0.0 {
            count_call!(FUNCTION_COUNTERS.triangles_culled);
            log::trace!("culled back face {:?}", screen);
            return 0;
        }

        let mut written = 0;
        if self.mode.contains(RasterMode::FILL) {
            written += self.fill(triangle, &screen, shader);
        }
        if self.mode.contains(RasterMode::WIREFRAME) {
            written += self.draw_outline(&screen);
        }
        written
    }

    /// Depth-only pass: merges the triangle into the depth buffer without
    /// shading. Returns the number of depth values that increased.
    pub fn rasterize_depth_only(&mut self, clip: &[Vec4; 3]) -> usize {
        count_call!(FUNCTION_COUNTERS.depth_only_triangles);
        let screen = self.to_screen(*clip);
        if self.cull_back_faces && signed_area2(&screen) < 0.0 {
            count_call!(FUNCTION_COUNTERS.triangles_culled);
            return 0;
        }
        let Some(mut ctx) = self.scan_context(&screen) else {
            return 0;
        };

        let aabb = ctx.aabb();
        let x_end = aabb.right.min(self.clip_right());
        let mut merged = 0;
        for y in aabb.top..=aabb.bottom {
            let mut x = ctx.advance_to_start();
            let mut row_covered = false;
            while x <= x_end {
                count_call!(FUNCTION_COUNTERS.lane_groups_tested);
                let inside = ctx.inside_mask(x);
                if inside.any() {
                    row_covered = true;
                    let z = ctx.depth(&ctx.barycentric());
                    merged += self.depth.merge(x, y as usize, &z, inside).count() as usize;
                } else if row_covered {
                    ctx.advance_to_end(x);
                    break;
                }
                ctx.step_x();
                x += LANES as i32;
            }
            ctx.reset_x_and_step_y();
        }
        merged
    }

    /// Run the vertex stage over every triangle of `mesh` and rasterize the
    /// results. Returns the number of pixels written.
    pub fn render_mesh<S: PixelShader + ?Sized>(
        &mut self,
        mesh: &Mesh,
        stage: &VertexStage,
        shader: &S,
    ) -> usize {
        let mut shaded = std::mem::take(&mut self.shaded);
        shaded.clear();
        shaded.extend(mesh.triangles.iter().map(|tri| stage.run_triangle(tri)));

        let written: usize = shaded.iter().map(|tri| self.rasterize(tri, shader)).sum();

        self.shaded = shaded;
        written
    }

    /// Depth-only pass over a whole mesh. Only positions go through the
    /// vertex stage. Returns the number of depth values that increased.
    pub fn render_mesh_depth_only(&mut self, mesh: &Mesh, stage: &VertexStage) -> usize {
        mesh.triangles
            .iter()
            .map(|tri| {
                let clip = tri.each_ref().map(|v| stage.transform_position(v.position));
                self.rasterize_depth_only(&clip)
            })
            .sum()
    }

    fn scan_context(&self, screen: &[Vec3; 3]) -> Option<ScanContext> {
        let aabb = self.visible_box(screen)?;
        let ctx = ScanContext::new(aabb, self.clip_right(), screen);
        if ctx.is_degenerate() {
            count_call!(FUNCTION_COUNTERS.degenerate_triangles);
            log::trace!("skipped degenerate triangle {:?}", screen);
            return None;
        }
        Some(ctx)
    }

    fn fill<S: PixelShader + ?Sized>(
        &mut self,
        triangle: &[ShadedVertex; 3],
        screen: &[Vec3; 3],
        shader: &S,
    ) -> usize {
        let Some(mut ctx) = self.scan_context(screen) else {
            return 0;
        };

        let aabb = ctx.aabb();
        let x_end = aabb.right.min(self.clip_right());
        let mut written = 0;
        for y in aabb.top..=aabb.bottom {
            let mut x = ctx.advance_to_start();
            let mut row_covered = false;
            while x <= x_end {
                count_call!(FUNCTION_COUNTERS.lane_groups_tested);
                let inside = ctx.inside_mask(x);
                if inside.any() {
                    count_call!(FUNCTION_COUNTERS.lane_groups_covered);
                    row_covered = true;

                    let b = ctx.barycentric();
                    let z = ctx.depth(&b);
                    let visible = self.depth.merge(x, y as usize, &z, inside);
                    if visible.any() {
                        let weights = ctx.perspective_correct(&b, z);
                        let input = interpolate_fragment(triangle, &weights, visible);
                        let colors = shader.run(&input);
                        self.target.store_group(x, y as usize, &colors, visible);

                        count_add!(FUNCTION_COUNTERS.pixels_shaded, visible.count() as u64);
                        written += visible.count() as usize;
                    }
                } else if row_covered {
                    // Triangles are convex: nothing more on this row.
                    ctx.advance_to_end(x);
                    break;
                }
                ctx.step_x();
                x += LANES as i32;
            }
            ctx.reset_x_and_step_y();
        }
        written
    }

    fn draw_outline(&mut self, screen: &[Vec3; 3]) -> usize {
        let p = screen.map(|v| v.truncate());
        self.draw_line(p[0], p[1]) + self.draw_line(p[1], p[2]) + self.draw_line(p[2], p[0])
    }

    /// Part of the segment `a..b` inside the viewport, in whole pixels.
    /// Liang-Barsky in f64 so that endpoints far outside the screen (a
    /// vertex with `w` close to zero) never reach integer arithmetic.
    fn clip_line(&self, a: Vec2, b: Vec2) -> Option<((i32, i32), (i32, i32))> {
        if !(a.is_finite() && b.is_finite()) {
            return None;
        }
        let x_max = (self.target.width() - 1) as f64;
        let y_max = (self.target.height() - 1) as f64;
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);

        let (mut t0, mut t1) = (0.0f64, 1.0f64);
        for (p, q) in [(-dx, ax), (dx, x_max - ax), (-dy, ay), (dy, y_max - ay)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let t = q / p;
            if p < 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
            if t0 > t1 {
                return None;
            }
        }

        let point = |t: f64| {
            (
                (ax + t * dx).round().clamp(0.0, x_max) as i32,
                (ay + t * dy).round().clamp(0.0, y_max) as i32,
            )
        };
        Some((point(t0), point(t1)))
    }

    /// Bresenham line over the visible part of `a..b`.
    fn draw_line(&mut self, a: Vec2, b: Vec2) -> usize {
        let Some(((mut x0, mut y0), (x1, y1))) = self.clip_line(a, b) else {
            return 0;
        };

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let mut drawn = 0;

        loop {
            if self.target.put_pixel(x0, y0, WIREFRAME_COLOR) {
                drawn += 1;
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }

        count_add!(FUNCTION_COUNTERS.wireframe_pixels, drawn as u64);
        drawn
    }
}

/// Perspective-correct attributes for one lane group. Texture coordinates of
/// lanes outside `mask` are zeroed so samplers never see garbage there.
#[inline(always)]
fn interpolate_fragment(tri: &[ShadedVertex; 3], w: &Barycentric, mask: LaneMask) -> FragmentInput {
    let [a, b, c] = tri;
    let vec3 = |p: fn(&ShadedVertex) -> Vec3| {
        let (pa, pb, pc) = (p(a), p(b), p(c));
        Vec3Lanes {
            x: w.interpolate(pa.x, pb.x, pc.x),
            y: w.interpolate(pa.y, pb.y, pc.y),
            z: w.interpolate(pa.z, pb.z, pc.z),
        }
    };

    let u = w.interpolate(a.tex_coord.x, b.tex_coord.x, c.tex_coord.x);
    let v = w.interpolate(a.tex_coord.y, b.tex_coord.y, c.tex_coord.y);

    FragmentInput {
        world_positions: vec3(|s| s.world_position),
        world_normals: vec3(|s| s.world_normal),
        tex_coords: Vec2Lanes {
            x: u.select(mask, LaneF32::ZERO),
            y: v.select(mask, LaneF32::ZERO),
        },
        mask,
    }
}
