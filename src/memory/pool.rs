/// Size-keyed buffer pool.
/// Depth buffers are rented once per frame and handed back when the
/// rasterizer that owns them is dropped, so steady-state rendering does
/// not allocate.
use crate::count_call;
use crate::perf::FUNCTION_COUNTERS;
use std::collections::HashMap;
use std::mem::size_of;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("cannot free pool: {0} buffer(s) are still rented")]
    OutstandingRentals(usize),
    #[error("pool was torn down while buffers were still rented")]
    Poisoned,
    #[error("requested {size} bytes, which is not a multiple of the {element}-byte element size")]
    UnalignedSize { size: usize, element: usize },
}

/// Rented / pooled buffer counts at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub rented: usize,
    pub pooled: usize,
    pub pooled_bytes: usize,
}

struct PoolState<T> {
    /// Address of every buffer currently rented out -> element count.
    rented: HashMap<usize, usize>,
    /// Returned buffers, keyed by element count.
    free: HashMap<usize, Vec<Box<[T]>>>,
    poisoned: bool,
}

/// Pool of boxed slices keyed by their byte size.
///
/// Buffers handed out by [`MemoryPool::rent`] keep whatever contents they had
/// when they were returned; callers reinitialize them.
pub struct MemoryPool<T> {
    state: Mutex<PoolState<T>>,
}

impl<T: Copy + Default> MemoryPool<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PoolState {
                rented: HashMap::new(),
                free: HashMap::new(),
                poisoned: false,
            }),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, PoolState<T>> {
        // A panic while holding the lock cannot leave the maps half-updated
        // in a way that matters here, so keep going with the inner state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rent a buffer of exactly `size_bytes`, reusing a returned buffer of the
    /// same size when one is available.
    pub fn rent(&self, size_bytes: usize) -> Result<Box<[T]>, PoolError> {
        let element = size_of::<T>();
        if element == 0 || size_bytes % element != 0 {
            return Err(PoolError::UnalignedSize { size: size_bytes, element });
        }
        let len = size_bytes / element;

        let mut state = self.lock();
        if state.poisoned {
            return Err(PoolError::Poisoned);
        }
        count_call!(FUNCTION_COUNTERS.pool_rents);

        // Empty slices all share one dangling address, so they are not tracked.
        if len == 0 {
            return Ok(Vec::new().into_boxed_slice());
        }

        let buffer = match state.free.get_mut(&len).and_then(Vec::pop) {
            Some(buffer) => buffer,
            None => {
                count_call!(FUNCTION_COUNTERS.pool_allocations);
                log::debug!("memory pool: allocating {} bytes", size_bytes);
                vec![T::default(); len].into_boxed_slice()
            }
        };

        state.rented.insert(buffer.as_ptr() as usize, len);
        Ok(buffer)
    }

    /// Hand a rented buffer back to the pool.
    ///
    /// Buffers the pool did not hand out are dropped.
    pub fn give_back(&self, buffer: Box<[T]>) {
        if buffer.is_empty() {
            return;
        }

        let mut state = self.lock();
        match state.rented.remove(&(buffer.as_ptr() as usize)) {
            Some(len) if !state.poisoned => {
                state.free.entry(len).or_default().push(buffer);
            }
            Some(_) => {}
            None => {
                log::warn!(
                    "memory pool: dropping {}-element buffer that was not rented from this pool",
                    buffer.len()
                );
            }
        }
    }

    /// Release every pooled buffer.
    ///
    /// Fails, and poisons the pool, if any buffer is still rented. Returns the
    /// number of buffers released otherwise.
    pub fn free_all(&self) -> Result<usize, PoolError> {
        let mut state = self.lock();
        if !state.rented.is_empty() {
            state.poisoned = true;
            return Err(PoolError::OutstandingRentals(state.rented.len()));
        }

        let released = state.free.values().map(Vec::len).sum();
        state.free.clear();
        Ok(released)
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        let (pooled, pooled_elements) = state
            .free
            .iter()
            .fold((0, 0), |(n, e), (len, bufs)| (n + bufs.len(), e + len * bufs.len()));
        PoolStats {
            rented: state.rented.len(),
            pooled,
            pooled_bytes: pooled_elements * size_of::<T>(),
        }
    }
}

impl<T: Copy + Default> Default for MemoryPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool<f32> {
    /// Process-wide pool used for depth buffers.
    pub fn shared() -> &'static MemoryPool<f32> {
        static SHARED: OnceLock<MemoryPool<f32>> = OnceLock::new();
        SHARED.get_or_init(MemoryPool::new)
    }
}
