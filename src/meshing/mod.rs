/// Triangle-list geometry for the rasterizer
pub mod mesh;

pub use mesh::Mesh;
