/// Instrumentation for the rasterizer hot paths
/// Event counters that compile away unless the `profiling` feature is on
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe performance counters for rasterizer events
pub struct FunctionCounters {
    pub triangles_submitted: AtomicU64,
    pub triangles_culled: AtomicU64,
    pub degenerate_triangles: AtomicU64,
    pub depth_only_triangles: AtomicU64,
    pub lane_groups_tested: AtomicU64,
    pub lane_groups_covered: AtomicU64,
    pub depth_test_passed: AtomicU64,
    pub depth_test_failed: AtomicU64,
    pub pixels_shaded: AtomicU64,
    pub wireframe_pixels: AtomicU64,
    pub pool_rents: AtomicU64,
    pub pool_allocations: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            triangles_submitted: AtomicU64::new(0),
            triangles_culled: AtomicU64::new(0),
            degenerate_triangles: AtomicU64::new(0),
            depth_only_triangles: AtomicU64::new(0),
            lane_groups_tested: AtomicU64::new(0),
            lane_groups_covered: AtomicU64::new(0),
            depth_test_passed: AtomicU64::new(0),
            depth_test_failed: AtomicU64::new(0),
            pixels_shaded: AtomicU64::new(0),
            wireframe_pixels: AtomicU64::new(0),
            pool_rents: AtomicU64::new(0),
            pool_allocations: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.triangles_submitted.store(0, Ordering::Relaxed);
        self.triangles_culled.store(0, Ordering::Relaxed);
        self.degenerate_triangles.store(0, Ordering::Relaxed);
        self.depth_only_triangles.store(0, Ordering::Relaxed);
        self.lane_groups_tested.store(0, Ordering::Relaxed);
        self.lane_groups_covered.store(0, Ordering::Relaxed);
        self.depth_test_passed.store(0, Ordering::Relaxed);
        self.depth_test_failed.store(0, Ordering::Relaxed);
        self.pixels_shaded.store(0, Ordering::Relaxed);
        self.wireframe_pixels.store(0, Ordering::Relaxed);
        self.pool_rents.store(0, Ordering::Relaxed);
        self.pool_allocations.store(0, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            triangles_submitted: self.triangles_submitted.load(Ordering::Relaxed),
            triangles_culled: self.triangles_culled.load(Ordering::Relaxed),
            degenerate_triangles: self.degenerate_triangles.load(Ordering::Relaxed),
            depth_only_triangles: self.depth_only_triangles.load(Ordering::Relaxed),
            lane_groups_tested: self.lane_groups_tested.load(Ordering::Relaxed),
            lane_groups_covered: self.lane_groups_covered.load(Ordering::Relaxed),
            depth_test_passed: self.depth_test_passed.load(Ordering::Relaxed),
            depth_test_failed: self.depth_test_failed.load(Ordering::Relaxed),
            pixels_shaded: self.pixels_shaded.load(Ordering::Relaxed),
            wireframe_pixels: self.wireframe_pixels.load(Ordering::Relaxed),
            pool_rents: self.pool_rents.load(Ordering::Relaxed),
            pool_allocations: self.pool_allocations.load(Ordering::Relaxed),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterSnapshot {
    pub triangles_submitted: u64,
    pub triangles_culled: u64,
    pub degenerate_triangles: u64,
    pub depth_only_triangles: u64,
    pub lane_groups_tested: u64,
    pub lane_groups_covered: u64,
    pub depth_test_passed: u64,
    pub depth_test_failed: u64,
    pub pixels_shaded: u64,
    pub wireframe_pixels: u64,
    pub pool_rents: u64,
    pub pool_allocations: u64,
}

impl CounterSnapshot {
    /// Print formatted report
    pub fn print_report(&self) {
        println!("\n=== Performance Counters Report ===");
        println!("\nTriangles:");
        println!("  submitted:                  {:12}", self.triangles_submitted);
        println!("  back-face culled:           {:12}", self.triangles_culled);
        println!("  degenerate (skipped):       {:12}", self.degenerate_triangles);
        println!("  depth-only:                 {:12}", self.depth_only_triangles);

        println!("\nLane groups:");
        println!("  tested:                     {:12}", self.lane_groups_tested);
        println!("  with coverage:              {:12}", self.lane_groups_covered);
        if self.lane_groups_tested > 0 {
            let hit_rate =
                (self.lane_groups_covered as f64 / self.lane_groups_tested as f64) * 100.0;
            println!("  coverage rate:              {:11.2}%", hit_rate);
        }

        println!("\nPixel Operations:");
        println!("  depth test passed:          {:12}", self.depth_test_passed);
        println!("  depth test failed:          {:12}", self.depth_test_failed);
        let attempts = self.depth_test_passed + self.depth_test_failed;
        if attempts > 0 {
            let pass_rate = (self.depth_test_passed as f64 / attempts as f64) * 100.0;
            println!("  depth test pass rate:       {:11.2}%", pass_rate);
        }
        println!("  pixels shaded:              {:12}", self.pixels_shaded);
        println!("  wireframe pixels:           {:12}", self.wireframe_pixels);

        println!("\nMemory Pool:");
        println!("  rents:                      {:12}", self.pool_rents);
        println!("  fresh allocations:          {:12}", self.pool_allocations);

        println!();
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
