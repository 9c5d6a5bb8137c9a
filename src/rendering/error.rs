use crate::memory::PoolError;
use thiserror::Error;

/// Contract violations detected when a rasterizer is set up.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RasterError {
    #[error("viewport {width}x{height} has no pixels")]
    EmptyViewport { width: usize, height: usize },
    #[error("row stride of {stride} bytes is shorter than a {width}-pixel BGR24 row")]
    StrideTooSmall { stride: usize, width: usize },
    #[error("framebuffer holds {len} bytes but the viewport needs {required}")]
    FramebufferTooSmall { len: usize, required: usize },
    #[error("depth buffer unavailable: {0}")]
    Pool(#[from] PoolError),
}
