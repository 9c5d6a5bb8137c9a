//! Camera -> vertex stage -> rasterizer, plus depth-buffer pool ownership.
use glam::{Mat4, Vec3};
use softrender::memory::{MemoryPool, PoolError};
use softrender::rendering::framebuffer::splat_rgb;
use softrender::rendering::lanes::ColorLanes;
use softrender::rendering::{
    BilinearSampler, FragmentInput, Framebuffer, Light, NearestSampler, RasterError, RasterMode,
    Rasterizer, TexturedShader, UnlitShader, VertexStage,
};
use softrender::{Camera, Mesh};

const WIDTH: usize = 160;
const HEIGHT: usize = 120;
const BACKGROUND: [u8; 3] = [0, 0, 0];

fn front_camera() -> Camera {
    let mut camera = Camera::new(Vec3::new(0.0, 0.0, 4.0), WIDTH as f32 / HEIGHT as f32);
    camera.look_at(Vec3::ZERO, Vec3::Y);
    camera
}

fn stage_for(camera: &Camera, model: Mat4) -> VertexStage {
    VertexStage::new(model, camera.view_matrix(), camera.projection_matrix())
}

#[test]
fn cube_lands_in_the_middle_of_the_screen() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stride = fb.stride;
    let camera = front_camera();
    let mesh = Mesh::cube(2.0);
    let shader = TexturedShader::new(
        NearestSampler::new(Mesh::checkerboard_texture(16)),
        vec![Light::new(camera.position)],
    );

    let written = {
        let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, WIDTH, HEIGHT, &pool).unwrap();
        r.render_mesh(&mesh, &stage_for(&camera, Mat4::IDENTITY), &shader)
    };

    // Facing the +Z side head-on: the front face is a square a third of the
    // screen height across; the other five faces are culled or edge-on.
    let drawn = fb.count_not(BACKGROUND);
    // Pixels on the shared diagonal may be written by both triangles.
    assert!(written >= drawn && written <= drawn + 41, "{written} writes for {drawn} pixels");
    assert!((1500..=1900).contains(&drawn), "drew {drawn}");
    assert_ne!(fb.pixel(WIDTH / 2, HEIGHT / 2), BACKGROUND);
    assert_eq!(fb.pixel(5, 5), BACKGROUND);
    assert_eq!(fb.pixel(WIDTH / 2, 10), BACKGROUND);
}

#[test]
fn rendering_the_same_mesh_twice_writes_nothing_new() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stride = fb.stride;
    let camera = front_camera();
    let mesh = Mesh::cube(2.0);
    let stage = stage_for(&camera, Mat4::from_rotation_y(0.6) * Mat4::from_rotation_x(0.4));
    let shader = UnlitShader(BilinearSampler::new(Mesh::checkerboard_texture(32)));

    let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, WIDTH, HEIGHT, &pool).unwrap();
    let first = r.render_mesh(&mesh, &stage, &shader);
    assert!(first > 1000);
    assert_eq!(r.render_mesh(&mesh, &stage, &shader), 0);

    // A fresh depth pass shades everything again.
    r.clear_depth();
    assert_eq!(r.render_mesh(&mesh, &stage, &shader), first);
}

#[test]
fn rotated_cube_shows_at_most_three_faces() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stride = fb.stride;
    let camera = front_camera();
    let mesh = Mesh::cube(2.0);
    let stage = stage_for(&camera, Mat4::from_rotation_y(0.7) * Mat4::from_rotation_x(0.5));

    // Color each fragment by its world normal's dominant axis.
    let by_normal = |input: &FragmentInput| {
        let mut c = ColorLanes::BLACK;
        for i in input.mask.lanes() {
            let n = input.world_normals.lane(i);
            let a = n.abs();
            let axis = if a.x >= a.y && a.x >= a.z {
                0
            } else if a.y >= a.z {
                1
            } else {
                2
            };
            let sign = if n[axis] > 0.0 { 255 } else { 128 };
            match axis {
                0 => c.r.0[i] = sign,
                1 => c.g.0[i] = sign,
                _ => c.b.0[i] = sign,
            }
        }
        c
    };

    {
        let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, WIDTH, HEIGHT, &pool).unwrap();
        r.render_mesh(&mesh, &stage, &by_normal);
    }

    let mut seen = std::collections::HashSet::new();
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let px = fb.pixel(x, y);
            if px != BACKGROUND {
                seen.insert(px);
            }
        }
    }
    assert!((2..=3).contains(&seen.len()), "faces seen: {seen:?}");
}

#[test]
fn wireframe_overlay_outlines_visible_triangles() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stride = fb.stride;
    let camera = front_camera();
    let mesh = Mesh::cube(2.0);
    let fill = |_: &FragmentInput| splat_rgb([40, 40, 40]);

    {
        let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, WIDTH, HEIGHT, &pool).unwrap();
        r.mode = RasterMode::FILL | RasterMode::WIREFRAME;
        r.render_mesh(&mesh, &stage_for(&camera, Mat4::IDENTITY), &fill);
    }

    let white = (0..HEIGHT)
        .flat_map(|y| (0..WIDTH).map(move |x| (x, y)))
        .filter(|&(x, y)| fb.pixel(x, y) == [255, 255, 255])
        .count();
    let gray = fb.count_not(BACKGROUND) - white;
    assert!(white > 100, "outline pixels {white}");
    assert!(gray > white, "interior pixels {gray}");
    // The diagonal of the front face is an edge of both its triangles.
    assert_eq!(fb.pixel(WIDTH / 2, HEIGHT / 2), [255, 255, 255]);
}

#[test]
fn depth_prepass_matches_shaded_depth() {
    let pool = MemoryPool::new();
    let camera = front_camera();
    let mesh = Mesh::cube(2.0);
    let stage = stage_for(&camera, Mat4::from_rotation_y(0.5) * Mat4::from_rotation_x(0.3));
    let shader = UnlitShader(NearestSampler::new(Mesh::checkerboard_texture(8)));

    let mut fb = Framebuffer::new(WIDTH, HEIGHT);
    let stride = fb.stride;
    let mut r = Rasterizer::with_pool(&mut fb.pixels, stride, WIDTH, HEIGHT, &pool).unwrap();

    let merged = r.render_mesh_depth_only(&mesh, &stage);
    let prepass = r.depth_buffer().to_vec();
    assert!(merged > 1000);

    // Shading against the finished depth pass writes nothing new.
    assert_eq!(r.render_mesh(&mesh, &stage, &shader), 0);
    assert_eq!(r.depth_buffer().to_vec(), prepass);

    r.clear_depth();
    assert_eq!(r.render_mesh(&mesh, &stage, &shader), merged);
    assert_eq!(r.depth_buffer().to_vec(), prepass);
}

#[test]
fn depth_buffer_returns_to_pool_on_every_path() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(32, 32);
    let stride = fb.stride;

    {
        let _r = Rasterizer::with_pool(&mut fb.pixels, stride, 32, 32, &pool).unwrap();
        assert_eq!(pool.stats().rented, 1);
    }
    assert_eq!(pool.stats().rented, 0);
    assert_eq!(pool.stats().pooled, 1);

    // Early return through `?` after the rent.
    fn draw_then_fail(
        fb: &mut [u8],
        stride: usize,
        pool: &MemoryPool<f32>,
    ) -> Result<(), RasterError> {
        let r = Rasterizer::with_pool(fb, stride, 32, 32, pool)?;
        let _ = r.depth_buffer();
        Err(RasterError::EmptyViewport { width: 0, height: 0 })
    }
    assert!(draw_then_fail(&mut fb.pixels, stride, &pool).is_err());
    assert_eq!(pool.stats().rented, 0);

    // A panic while rasterizing unwinds through Drop as well.
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _r = Rasterizer::with_pool(&mut fb.pixels, stride, 32, 32, &pool).unwrap();
        panic!("shader blew up");
    }));
    assert!(result.is_err());
    assert_eq!(pool.stats().rented, 0);

    // The same buffer keeps being reused.
    assert_eq!(pool.stats().pooled, 1);
    assert_eq!(pool.free_all(), Ok(1));
}

#[test]
fn freeing_pool_with_live_rasterizer_poisons_it() {
    let pool = MemoryPool::new();
    let mut fb = Framebuffer::new(16, 16);
    let stride = fb.stride;
    let mut other = Framebuffer::new(16, 16);
    let other_stride = other.stride;

    let r = Rasterizer::with_pool(&mut fb.pixels, stride, 16, 16, &pool).unwrap();
    assert_eq!(pool.free_all(), Err(PoolError::OutstandingRentals(1)));
    drop(r);

    assert_eq!(
        Rasterizer::with_pool(&mut other.pixels, other_stride, 16, 16, &pool).err(),
        Some(RasterError::Pool(PoolError::Poisoned))
    );
}
