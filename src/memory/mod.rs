/// Reusable allocations shared across frames
pub mod pool;

pub use pool::{MemoryPool, PoolError, PoolStats};
