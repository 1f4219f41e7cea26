//! The producer thread: fills blocks from the synthesis callback.

use crate::backend::OutputDevice;
use crate::clock::SampleClock;
use crate::notifier::StreamCounters;
use crate::ring::{Block, BlockRing};
use crate::sample::{PcmSample, quantize};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use wavesynth_core::Synthesis;

/// Synthesis callback slot shared between the engine and the producer.
pub(crate) type SharedSynthesis = Arc<Mutex<Box<dyn Synthesis>>>;

pub(crate) const THREAD_NAME: &str = "wavesynth-producer";

pub(crate) struct Producer<S: PcmSample> {
    pub(crate) ring: Arc<BlockRing<S>>,
    pub(crate) clock: Arc<SampleClock>,
    pub(crate) synthesis: SharedSynthesis,
    pub(crate) device: Box<dyn OutputDevice<S>>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) counters: Arc<StreamCounters>,
}

impl<S: PcmSample> Producer<S> {
    /// Start the loop on its own named thread.
    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<Result<()>>> {
        thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) -> Result<()> {
        let count = self.ring.capacity();
        let mut current = 0;
        tracing::debug!(blocks = count, "producer started");

        let result = loop {
            // Stop is only observed between blocks.
            if !self.running.load(Ordering::Acquire) {
                break Ok(());
            }
            let Some(block) = self.ring.claim(current) else {
                break Ok(());
            };
            if let Err(e) = self.produce(block) {
                break Err(e);
            }
            current = (current + 1) % count;
        };

        if let Err(e) = &result {
            tracing::error!(error = %e, block = current, "producer stopped on device failure");
            self.running.store(false, Ordering::Release);
            self.ring.close();
        }
        tracing::debug!(samples = self.clock.samples(), "producer exited");
        result
    }

    /// Unprepare, fill, prepare and submit one claimed block.
    fn produce(&mut self, mut block: Block<S>) -> Result<()> {
        if block.is_prepared() {
            self.device.unprepare(&mut block)?;
            block.set_prepared(false);
        }

        self.fill(&mut block);

        self.device.prepare(&mut block)?;
        block.set_prepared(true);

        let index = block.index();
        self.ring.mark_submitted(index);
        self.device.submit(block)?;
        self.counters.record_submit();
        tracing::trace!(index, time = self.clock.time(), "block submitted");
        Ok(())
    }

    fn fill(&self, block: &mut Block<S>) {
        let mut synthesis = self
            .synthesis
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for sample in block.samples_mut() {
            *sample = quantize(synthesis.sample(self.clock.time()));
            self.clock.tick();
        }
    }
}

/// Join the producer, mapping a panic to [`Error::ProducerPanicked`].
pub(crate) fn join(handle: JoinHandle<Result<()>>) -> Result<()> {
    handle.join().unwrap_or(Err(Error::ProducerPanicked))
}
