//! Engine handle: owns the ring, the producer thread and the clock.

use crate::backend::AudioBackend;
use crate::clock::SampleClock;
use crate::cpal_backend::CpalBackend;
use crate::notifier::{CompletionNotifier, EngineStats, StreamCounters};
use crate::producer::{self, Producer, SharedSynthesis};
use crate::ring::BlockRing;
use crate::sample::PcmSample;
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use wavesynth_core::{Silence, Synthesis};

/// Engine geometry.
///
/// ## Fields
///
/// - `sample_rate`: Output sample rate in Hz (default: 44100)
/// - `channels`: Output channel count; each sample is written to every channel (default: 1)
/// - `block_count`: Blocks in the ring, at least 2 (default: 8)
/// - `block_samples`: Samples per block (default: 512)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
    /// Number of blocks in the ring.
    pub block_count: usize,
    /// Samples per block.
    pub block_samples: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            block_count: 8,
            block_samples: 512,
        }
    }
}

impl EngineConfig {
    /// Reject geometry the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be > 0".into()));
        }
        if self.channels == 0 {
            return Err(Error::InvalidConfig("channel count must be > 0".into()));
        }
        if self.block_count < 2 {
            return Err(Error::InvalidConfig(format!(
                "block count must be at least 2, got {}",
                self.block_count
            )));
        }
        if self.block_samples == 0 {
            return Err(Error::InvalidConfig("block size must be > 0".into()));
        }
        // Device APIs take the buffer size as a u32 frame count.
        if u32::try_from(self.block_samples).is_err() {
            return Err(Error::InvalidConfig(format!(
                "block size must be at most {} samples, got {}",
                u32::MAX,
                self.block_samples
            )));
        }
        Ok(())
    }

    /// Duration of one block in seconds.
    pub fn block_duration(&self) -> f64 {
        self.block_samples as f64 / f64::from(self.sample_rate)
    }

    /// Total buffered audio in seconds.
    pub fn latency(&self) -> f64 {
        self.block_duration() * self.block_count as f64
    }
}

/// A running synthesizer output.
///
/// Construction opens the device and starts the producer thread; there is no
/// half-built engine. The producer calls the registered [`Synthesis`] once per
/// sample with the engine clock, quantises the result to `S` and streams
/// blocks to the device until [`stop`](Self::stop) is called or the device
/// fails. Until a callback is registered the engine plays [`Silence`].
///
/// Dropping a running engine stops it.
pub struct Engine<S: PcmSample = i16> {
    config: EngineConfig,
    device_name: String,
    ring: Arc<BlockRing<S>>,
    clock: Arc<SampleClock>,
    synthesis: SharedSynthesis,
    running: Arc<AtomicBool>,
    counters: Arc<StreamCounters>,
    producer: Option<JoinHandle<Result<()>>>,
}

impl<S: PcmSample> Engine<S> {
    /// Open `device_name` through the platform audio host and start streaming.
    pub fn create(device_name: &str, config: EngineConfig) -> Result<Self> {
        Self::with_backend(&CpalBackend::new(), device_name, config)
    }

    /// Open `device_name` on `backend` and start streaming silence.
    ///
    /// Fails without side effects if the configuration is invalid or the
    /// name is not one of the backend's output devices.
    pub fn with_backend<B>(backend: &B, device_name: &str, config: EngineConfig) -> Result<Self>
    where
        B: AudioBackend<S> + ?Sized,
    {
        Self::with_synthesis(backend, device_name, config, Silence)
    }

    /// Like [`with_backend`](Self::with_backend), with `synthesis` already
    /// registered for the first block.
    pub fn with_synthesis<B, F>(
        backend: &B,
        device_name: &str,
        config: EngineConfig,
        synthesis: F,
    ) -> Result<Self>
    where
        B: AudioBackend<S> + ?Sized,
        F: Synthesis + 'static,
    {
        config.validate()?;

        let devices = backend.output_devices()?;
        if devices.is_empty() {
            return Err(Error::NoDevice);
        }
        if !devices.iter().any(|d| d == device_name) {
            return Err(Error::DeviceNotFound(device_name.to_string()));
        }

        let ring = Arc::new(BlockRing::try_new(
            config.block_count,
            config.block_samples,
        )?);
        let counters = Arc::new(StreamCounters::default());
        let notifier = CompletionNotifier::new(Arc::clone(&ring), Arc::clone(&counters));
        let device = backend.open_output(device_name, &config, notifier)?;

        let clock = Arc::new(SampleClock::new(config.sample_rate));
        let synthesis: SharedSynthesis = Arc::new(Mutex::new(Box::new(synthesis)));
        let running = Arc::new(AtomicBool::new(true));

        let handle = Producer {
            ring: Arc::clone(&ring),
            clock: Arc::clone(&clock),
            synthesis: Arc::clone(&synthesis),
            device,
            running: Arc::clone(&running),
            counters: Arc::clone(&counters),
        }
        .spawn()
        .map_err(Error::Thread)?;

        tracing::info!(
            backend = backend.name(),
            device = device_name,
            sample_rate = config.sample_rate,
            channels = config.channels,
            blocks = config.block_count,
            block_samples = config.block_samples,
            bits = S::BITS,
            "engine started"
        );

        Ok(Self {
            config,
            device_name: device_name.to_string(),
            ring,
            clock,
            synthesis,
            running,
            counters,
            producer: Some(handle),
        })
    }

    /// Replace the synthesis callback; takes effect from the next block.
    pub fn set_synthesis<F>(&self, synthesis: F)
    where
        F: Synthesis + 'static,
    {
        *self
            .synthesis
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Box::new(synthesis);
    }

    /// Engine clock in seconds: samples produced divided by the sample rate.
    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Stop the producer and wait for it to exit.
    ///
    /// A block being filled is finished and submitted first. Returns the
    /// device error that ended the producer early, if any. Calling `stop`
    /// again is a no-op.
    pub fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.producer.take() else {
            return Ok(());
        };

        self.running.store(false, Ordering::Release);
        self.ring.close();
        let result = producer::join(handle);

        let stats = self.stats();
        if stats.underruns > 0 {
            tracing::warn!(underruns = stats.underruns, "output starved during playback");
        }
        tracing::info!(
            device = %self.device_name,
            time = self.time(),
            submitted = stats.blocks_submitted,
            completed = stats.blocks_completed,
            "engine stopped"
        );
        result
    }

    /// Whether the producer is still streaming.
    pub fn is_running(&self) -> bool {
        self.producer.is_some() && !self.ring.is_closed()
    }

    /// Streaming counters.
    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }

    /// Engine geometry.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the open output device.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl<S: PcmSample> Drop for Engine<S> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!(error = %e, "engine stopped with error during drop");
        }
    }
}

impl<S: PcmSample> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("device_name", &self.device_name)
            .field("time", &self.time())
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
