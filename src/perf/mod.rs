/// Performance measurement utilities
/// Each pipeline stage can be timed and the global counters reported
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::info!("[PERF] {}: {}μs", self.name, self.elapsed().as_micros());
    }
}

/// Per-frame timing accumulator
#[derive(Debug, Clone, Copy, Default)]
pub struct PerfStats {
    pub frames: u64,
    pub vertex_stage_us: f64,
    pub rasterization_us: f64,
    pub total_us: f64,
}

impl PerfStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one frame's stage timings.
    pub fn record_frame(&mut self, vertex_stage: Duration, rasterization: Duration) {
        let vs = vertex_stage.as_secs_f64() * 1e6;
        let rs = rasterization.as_secs_f64() * 1e6;
        self.frames += 1;
        self.vertex_stage_us += vs;
        self.rasterization_us += rs;
        self.total_us += vs + rs;
    }

    pub fn average_frame_us(&self) -> f64 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_us / self.frames as f64
        }
    }

    pub fn print_summary(&self) {
        let pct = |v: f64| if self.total_us > 0.0 { v / self.total_us * 100.0 } else { 0.0 };
        println!("\n========== PERFORMANCE SUMMARY ==========");
        println!("Frames:          {:8}", self.frames);
        println!(
            "Vertex Stage:    {:8.2}μs ({:5.1}%)",
            self.vertex_stage_us,
            pct(self.vertex_stage_us)
        );
        println!(
            "Rasterization:   {:8.2}μs ({:5.1}%)",
            self.rasterization_us,
            pct(self.rasterization_us)
        );
        println!("-----------------------------------------");
        println!("Total:           {:8.2}μs", self.total_us);
        println!("Per frame:       {:8.2}μs", self.average_frame_us());
        println!("=========================================\n");
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
