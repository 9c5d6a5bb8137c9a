/// Software rasterization pipeline
/// Vertex stage -> scan conversion -> depth test -> pixel shader -> framebuffer
pub mod depth;
pub mod error;
pub mod framebuffer;
pub mod lanes;
pub mod rasterizer;
pub mod scan;
pub mod shading;
pub mod texture;
pub mod vertex;
pub mod viewport;

pub use depth::{write_depth_visualization, DepthBuffer, FAR_DEPTH};
pub use error::RasterError;
pub use framebuffer::{store_interleaved, FrameTarget, Framebuffer};
pub use lanes::{ColorLanes, LaneF32, LaneI32, LaneMask, LANES};
pub use rasterizer::{RasterMode, Rasterizer};
pub use scan::ScanContext;
pub use shading::{FragmentInput, Light, PixelShader, ShadingConfig, TexturedShader, UnlitShader};
pub use texture::{
    AddressMode, BilinearSampler, NearestSampler, Sampler, SolidSampler, TexelFormat, Texture,
    TextureError,
};
pub use vertex::{ShadedVertex, VertexAttributes, VertexStage};
pub use viewport::ViewportTransform;
