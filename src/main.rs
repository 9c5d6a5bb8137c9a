/// Headless demo: renders a spinning, lit, textured cube into an in-memory
/// BGR24 framebuffer and reports timings.
use anyhow::{ensure, Context, Result};
use clap::Parser;
use glam::{Mat4, Vec3};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
use softrender::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// softrender - lane-parallel software rasterizer demo
#[derive(Parser, Debug)]
#[command(name = "softrender", version, about = "Spin a textured cube on the CPU")]
struct Args {
    /// Number of frames to render
    #[arg(default_value_t = 120)]
    frames: u32,

    /// Framebuffer width in pixels
    #[arg(default_value_t = 640)]
    width: usize,

    /// Framebuffer height in pixels
    #[arg(default_value_t = 480)]
    height: usize,

    /// Draw triangle edges on top of the fill
    #[arg(long)]
    wireframe: bool,

    /// Filter the texture bilinearly instead of nearest-texel
    #[arg(long)]
    bilinear: bool,

    /// Replace the last frame with its depth buffer
    #[arg(long)]
    depth: bool,

    /// Write the last frame as a binary PPM
    #[arg(long, value_name = "FILE.ppm")]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    ensure!(args.width > 0 && args.height > 0, "width and height must be positive");
    run(&args)
}

fn run(opts: &Args) -> Result<()> {
    println!("=== softrender ===");
    println!(
        "{} frames at {}x{}{}",
        opts.frames,
        opts.width,
        opts.height,
        if opts.wireframe { " (wireframe)" } else { "" }
    );

    let mut framebuffer = Framebuffer::new(opts.width, opts.height);
    let mut camera = Camera::new(Vec3::new(0.0, 1.5, 4.0), opts.width as f32 / opts.height as f32);
    camera.look_at(Vec3::ZERO, Vec3::Y);

    let mesh = Mesh::cube(2.0);
    let texture = Mesh::checkerboard_texture(64);
    let lights = vec![
        Light::new(Vec3::new(3.0, 4.0, 5.0)),
        Light {
            position: Vec3::new(-4.0, -1.0, 2.0),
            intensity: 0.4,
        },
    ];
    let nearest = TexturedShader::new(NearestSampler::new(texture.clone()), lights.clone());
    let bilinear = TexturedShader::new(BilinearSampler::new(texture), lights);
    let shader: &dyn PixelShader = if opts.bilinear { &bilinear } else { &nearest };

    let mut stats = PerfStats::new();
    let mut shaded = Vec::with_capacity(mesh.triangle_count());
    let mut pixels_written = 0usize;
    let mut last_depth = Vec::new();

    FUNCTION_COUNTERS.reset();
    for frame in 0..opts.frames {
        let angle = frame as f32 * 0.03;
        let model = Mat4::from_rotation_y(angle) * Mat4::from_rotation_x(angle * 0.7);
        let stage = VertexStage::new(model, camera.view_matrix(), camera.projection_matrix());

        let vertex_start = Instant::now();
        shaded.clear();
        shaded.extend(mesh.triangles.iter().map(|tri| stage.run_triangle(tri)));
        let vertex_time = vertex_start.elapsed();

        let raster_start = Instant::now();
        {
            let mut target = framebuffer.target().context("binding the framebuffer")?;
            target.clear([16, 16, 24]);
            let mut rasterizer = Rasterizer::from_target(target, MemoryPool::shared())
                .context("renting the depth buffer")?;
            if opts.wireframe {
                rasterizer.mode |= RasterMode::WIREFRAME;
            }
            pixels_written = shaded
                .iter()
                .map(|tri| rasterizer.rasterize(tri, shader))
                .sum();
            if opts.depth && frame + 1 == opts.frames {
                last_depth = rasterizer.into_depth_values();
            }
        }
        stats.record_frame(vertex_time, raster_start.elapsed());
    }

    println!("pixels written in last frame: {pixels_written}");
    stats.print_summary();
    FUNCTION_COUNTERS.snapshot().print_report();

    let pool = MemoryPool::shared().stats();
    log::info!(
        "depth pool: {} rented, {} pooled ({} bytes)",
        pool.rented,
        pool.pooled,
        pool.pooled_bytes
    );

    if opts.depth && !last_depth.is_empty() {
        perf_scope!("depth visualization");
        let mut target = framebuffer.target().context("binding the framebuffer")?;
        write_depth_visualization(&last_depth, opts.width, &mut target);
    }

    if let Some(path) = &opts.out {
        perf_scope!("write ppm");
        write_ppm(&framebuffer, path).with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// Binary PPM (P6), converting from the BGR framebuffer layout.
fn write_ppm(fb: &Framebuffer, path: &Path) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write!(out, "P6\n{} {}\n255\n", fb.width, fb.height)?;
    for y in 0..fb.height {
        for x in 0..fb.width {
            out.write_all(&fb.pixel(x, y))?;
        }
    }
    out.flush()
}
