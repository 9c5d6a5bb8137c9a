/// softrender - CPU triangle rasterizer working on 8-wide pixel lanes
/// Each pipeline stage is a separate, benchmarkable component
pub mod camera;
pub mod memory;
pub mod meshing;
pub mod perf;
pub mod rendering;

pub use camera::Camera;
pub use memory::{MemoryPool, PoolError};
pub use meshing::Mesh;
pub use perf::{CounterSnapshot, FunctionCounters, PerfStats, FUNCTION_COUNTERS};
pub use rendering::{
    write_depth_visualization, BilinearSampler, DepthBuffer, FrameTarget, Framebuffer, Light,
    NearestSampler, PixelShader, RasterError, RasterMode, Rasterizer, Sampler, ShadedVertex,
    ShadingConfig, TexturedShader, Texture, VertexAttributes, VertexStage,
};
