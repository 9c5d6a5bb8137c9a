//! Fill-pass behaviour on hand-placed triangles.
use glam::{Vec2, Vec3};
use softrender::memory::MemoryPool;
use softrender::rendering::framebuffer::splat_rgb;
use softrender::rendering::lanes::ColorLanes;
use softrender::rendering::{
    FragmentInput, Framebuffer, Light, Rasterizer, ShadedVertex, SolidSampler, TexturedShader,
    ViewportTransform, FAR_DEPTH,
};

const WIDTH: usize = 300;
const HEIGHT: usize = 300;

/// Vertex landing exactly on pixel `(x, y)` with clip `w`, lying in the
/// world plane z = 0 and facing +Z.
fn vertex(vp: &ViewportTransform, x: f32, y: f32, w: f32) -> ShadedVertex {
    ShadedVertex {
        clip_position: vp.to_clip(x, y, w),
        world_normal: Vec3::Z,
        world_position: Vec3::new(x, y, 0.0),
        tex_coord: Vec2::new(x / WIDTH as f32, y / HEIGHT as f32),
    }
}

fn triangle(vp: &ViewportTransform, pts: [(f32, f32); 3], w: f32) -> [ShadedVertex; 3] {
    pts.map(|(x, y)| vertex(vp, x, y, w))
}

/// Inside test evaluated from scratch at one pixel.
fn oracle_inside(pts: [(f32, f32); 3], px: f32, py: f32) -> bool {
    (0..3).all(|i| {
        let (vx, vy) = pts[i];
        let (nx, ny) = pts[(i + 1) % 3];
        let (ex, ey) = (vx - nx, vy - ny);
        ex * (py - vy) - ey * (px - vx) >= 0.0
    })
}

fn solid(rgb: [u8; 3]) -> impl Fn(&FragmentInput) -> ColorLanes {
    move |_| splat_rgb(rgb)
}

#[test]
fn red_triangle_is_drawn_once_and_redraw_is_idempotent() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stride = fb.stride;

    let pts = [(100.0, 100.0), (200.0, 100.0), (150.0, 50.0)];
    // Light where the camera would be: straight in front of the plane.
    let shader = TexturedShader::new(
        SolidSampler { color: [255, 0, 0] },
        vec![Light::new(Vec3::new(150.0, 83.0, 500.0))],
    );

    let written = {
        let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, WIDTH, HEIGHT, &pool).unwrap();
        let vp = *r.viewport();
        let tri = triangle(&vp, pts, 1.0);

        let written = r.rasterize(&tri, &shader);
        let first = r.target().as_bytes().to_vec();
        let depth = r.depth_buffer().to_vec();

        assert_eq!(r.rasterize(&tri, &shader), 0, "second pass must lose every depth test");
        assert_eq!(r.target().as_bytes(), &first[..]);
        assert_eq!(r.depth_buffer().to_vec(), depth);
        written
    };

    let mut red = 0;
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let [r, g, b] = fb.pixel(x, y);
            if oracle_inside(pts, x as f32, y as f32) {
                assert!(r > 200 && g == 0 && b == 0, "({x}, {y}) = {:?}", [r, g, b]);
                red += 1;
            } else {
                assert_eq!([r, g, b], [0, 0, 0], "({x}, {y}) must stay black");
            }
        }
    }
    assert_eq!(red, written);
    // Roughly half of the 100x50 box.
    assert!((2400..=2700).contains(&red), "covered {red}");
}

#[test]
fn degenerate_triangle_touches_nothing() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(64, 64);
    let stride = fb.stride;

    let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, 64, 64, &pool).unwrap();
    r.cull_back_faces = false;
    let vp = *r.viewport();

    let repeated = triangle(&vp, [(10.0, 10.0), (10.0, 10.0), (40.0, 30.0)], 1.0);
    let collinear = triangle(&vp, [(0.0, 0.0), (16.0, 16.0), (32.0, 32.0)], 1.0);
    assert_eq!(r.rasterize(&repeated, &solid([9, 9, 9])), 0);
    assert_eq!(r.rasterize(&collinear, &solid([9, 9, 9])), 0);
    assert_eq!(r.rasterize_depth_only(&repeated.map(|v| v.clip_position)), 0);

    assert!(r.depth_buffer().as_slice().iter().all(|&d| d == FAR_DEPTH));
    assert!(r.target().as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn nearer_triangle_wins_regardless_of_order() {
    let pool = MemoryPool::new();
    let pts_a = [(10.0, 50.0), (50.0, 50.0), (30.0, 10.0)];
    let pts_b = [(20.0, 55.0), (60.0, 55.0), (40.0, 15.0)];
    const NEAR: [u8; 3] = [0, 255, 0];
    const FAR: [u8; 3] = [0, 0, 255];

    let mut images = Vec::new();
    for near_first in [true, false] {
        let mut fb = Framebuffer::new(64, 64);
        let stride = fb.stride;
        {
            let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, 64, 64, &pool).unwrap();
            let vp = *r.viewport();
            // Camera-space w is negative; -1 is nearer than -3.
            let near = triangle(&vp, pts_a, -1.0);
            let far = triangle(&vp, pts_b, -3.0);
            if near_first {
                r.rasterize(&near, &solid(NEAR));
                r.rasterize(&far, &solid(FAR));
            } else {
                r.rasterize(&far, &solid(FAR));
                r.rasterize(&near, &solid(NEAR));
            }
        }
        images.push(fb);
    }

    assert_eq!(images[0], images[1]);
    let fb = &images[0];
    // Inside both: the nearer one shows.
    assert_eq!(fb.pixel(35, 40), NEAR);
    // Only inside the far one.
    assert_eq!(fb.pixel(55, 54), FAR);
}

#[test]
fn negative_w_keeps_winding() {
    // Negative w is what the camera produces for points in front of it.
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(64, 64);
    let stride = fb.stride;
    let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, 64, 64, &pool).unwrap();
    let vp = *r.viewport();
    let tri = triangle(&vp, [(10.0, 50.0), (50.0, 50.0), (30.0, 10.0)], -2.0);
    assert!(r.rasterize(&tri, &solid([1, 2, 3])) > 0);
}

#[test]
fn masked_lanes_keep_sentinel_bytes_with_padded_stride() {
    const SENTINEL: u8 = 0xA5;
    const W: usize = 21;
    const H: usize = 16;
    const STRIDE: usize = W * 3 + 7;
    let pool = MemoryPool::new();
    let mut buf = vec![SENTINEL; STRIDE * H];

    // Narrow triangle near the right edge: covers only some lanes of its
    // groups and runs past the last column.
    let pts = [(11.0, 14.0), (27.0, 14.0), (17.0, 2.0)];
    const GREEN: [u8; 3] = [0, 200, 0];
    {
        let mut r = Rasterizer::with_pool(&mut buf, STRIDE, W, H, &pool).unwrap();
        let vp = *r.viewport();
        let tri = pts.map(|(x, y)| ShadedVertex {
            clip_position: vp.to_clip(x, y, 1.0),
            ..Default::default()
        });
        let screen = tri.map(|v| vp.to_screen(v.clip_position));
        for (s, (x, y)) in screen.iter().zip(pts) {
            assert_eq!((s.x, s.y), (x, y));
        }
        assert!(r.rasterize(&tri, &solid(GREEN)) > 0);
    }

    for y in 0..H {
        let row = &buf[y * STRIDE..(y + 1) * STRIDE];
        for x in 0..W {
            let px = &row[x * 3..x * 3 + 3];
            if oracle_inside(pts, x as f32, y as f32) {
                assert_eq!(px, &[GREEN[2], GREEN[1], GREEN[0]], "({x}, {y})");
            } else {
                assert_eq!(px, &[SENTINEL; 3], "({x}, {y}) was overwritten");
            }
        }
        assert!(row[W * 3..].iter().all(|&b| b == SENTINEL), "padding of row {y}");
    }
}

#[test]
fn perspective_correct_interpolation_reaches_vertex_attributes() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(64, 64);
    let stride = fb.stride;
    let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, 64, 64, &pool).unwrap();
    let vp = *r.viewport();

    let mut tri = triangle(&vp, [(0.0, 60.0), (60.0, 60.0), (0.0, 0.0)], 1.0);
    for (v, w) in tri.iter_mut().zip([1.0, 4.0, 2.0]) {
        v.clip_position *= w;
    }
    tri[0].tex_coord = Vec2::new(0.0, 0.0);
    tri[1].tex_coord = Vec2::new(1.0, 0.0);
    tri[2].tex_coord = Vec2::new(0.0, 1.0);

    // Encode the interpolated u in red.
    let shader = |input: &FragmentInput| {
        let mut c = ColorLanes::BLACK;
        for i in input.mask.lanes() {
            c.r.0[i] = (input.tex_coords.x.0[i] * 255.0).round() as i32;
        }
        c
    };
    r.rasterize(&tri, &shader);

    let target = r.target();
    assert_eq!(target.pixel(0, 60)[0], 0);
    assert_eq!(target.pixel(60, 60)[0], 255);
    // Halfway along the bottom edge in screen space, u is pulled towards the
    // nearer vertex: 1/w interpolates linearly, u/w too, so u = 0.2.
    assert_eq!(target.pixel(30, 60)[0], 51);
}
