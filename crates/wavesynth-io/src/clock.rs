//! Engine sample clock.

use std::sync::atomic::{AtomicU64, Ordering};

/// Count of samples written since the engine started.
///
/// Time is derived from the integer count, so it never drifts: after `n`
/// samples `time()` is exactly `n as f64 / sample_rate`. The producer is the
/// only writer; any thread may read.
#[derive(Debug)]
pub struct SampleClock {
    samples: AtomicU64,
    sample_rate: f64,
}

impl SampleClock {
    /// Create a clock at zero for the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: AtomicU64::new(0),
            sample_rate: f64::from(sample_rate),
        }
    }

    /// Samples written so far.
    #[inline]
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Acquire)
    }

    /// Current time in seconds.
    #[inline]
    pub fn time(&self) -> f64 {
        self.samples() as f64 / self.sample_rate
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Advance by one sample.
    #[inline]
    pub(crate) fn tick(&self) {
        // Single writer: a plain load/store pair is enough.
        let n = self.samples.load(Ordering::Relaxed);
        self.samples.store(n + 1, Ordering::Release);
    }
}
