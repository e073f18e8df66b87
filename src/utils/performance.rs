//! Performance measurement utilities
//!
//! Wall-clock timing for operations. In the browser this reads
//! `performance.now()` (falling back to `Date.now()` inside workers without a
//! window); natively it uses `Instant`.

use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Samples kept per operation; older ones are dropped first
pub const MAX_SAMPLES: usize = 100;

/// Performance monitor for measuring operation times
pub struct PerformanceMonitor {
    measurements: FxHashMap<String, VecDeque<f64>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            measurements: FxHashMap::default(),
        }
    }

    pub fn record_measurement(&mut self, operation: &str, duration_ms: f64) {
        let samples = self.measurements.entry(operation.to_string()).or_default();
        if samples.len() == MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(duration_ms);
    }

    pub fn get_average_time(&self, operation: &str) -> Option<f64> {
        self.measurements.get(operation).map(|times| {
            if times.is_empty() {
                0.0
            } else {
                times.iter().sum::<f64>() / times.len() as f64
            }
        })
    }

    pub fn sample_count(&self, operation: &str) -> usize {
        self.measurements.get(operation).map_or(0, VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.measurements.clear();
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Elapsed-time measurement started at construction
pub struct Stopwatch {
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            started_ms: now_ms(),
            #[cfg(not(target_arch = "wasm32"))]
            started: std::time::Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            (now_ms() - self.started_ms).max(0.0)
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            self.started.elapsed().as_secs_f64() * 1000.0
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|performance| performance.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Run `f` and return its result with the elapsed milliseconds
pub fn measure<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let stopwatch = Stopwatch::start();
    let result = f();
    (result, stopwatch.elapsed_ms())
}
