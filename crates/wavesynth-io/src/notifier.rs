//! Completion path from the output device back to the block ring.

use crate::ring::{Block, BlockRing};
use crate::sample::PcmSample;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of engine streaming counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Blocks handed to the output device.
    pub blocks_submitted: u64,
    /// Blocks the device reported as played.
    pub blocks_completed: u64,
    /// Device callbacks that found no block to play.
    pub underruns: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StreamCounters {
    submitted: AtomicU64,
    completed: AtomicU64,
    underruns: AtomicU64,
}

impl StreamCounters {
    pub(crate) fn record_submit(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EngineStats {
        EngineStats {
            blocks_submitted: self.submitted.load(Ordering::Relaxed),
            blocks_completed: self.completed.load(Ordering::Relaxed),
            underruns: self.underruns.load(Ordering::Relaxed),
        }
    }
}

/// Handle an output device uses to hand finished blocks back.
///
/// Created by the engine and passed to
/// [`AudioBackend::open_output`](crate::AudioBackend::open_output) once. The
/// device keeps it for the lifetime of the stream and calls
/// [`complete`](Self::complete) from whatever thread its driver runs on.
#[derive(Debug)]
pub struct CompletionNotifier<S> {
    ring: Arc<BlockRing<S>>,
    counters: Arc<StreamCounters>,
}

impl<S> Clone for CompletionNotifier<S> {
    fn clone(&self) -> Self {
        Self {
            ring: Arc::clone(&self.ring),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<S: PcmSample> CompletionNotifier<S> {
    pub(crate) fn new(ring: Arc<BlockRing<S>>, counters: Arc<StreamCounters>) -> Self {
        Self { ring, counters }
    }

    /// Return a played block to the ring, waking the producer if it waits.
    pub fn complete(&self, block: Block<S>) {
        self.counters.completed.fetch_add(1, Ordering::Relaxed);
        self.ring.release(block);
    }

    /// Record that the device ran out of blocks.
    pub fn report_underrun(&self) {
        let total = self.counters.underruns.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!(total, "output underrun");
    }

    /// Current counter values.
    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }
}
