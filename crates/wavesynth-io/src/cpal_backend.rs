//! cpal-based output backend.
//!
//! cpal pulls audio through a callback rather than accepting queued buffers,
//! so the output device bridges the two: submitted blocks go down a channel, and
//! the stream callback plays them back frame by frame, handing each block to
//! the [`CompletionNotifier`] as soon as its last frame has been written.
//!
//! ```rust,ignore
//! use wavesynth_io::{CpalBackend, Engine, EngineConfig};
//!
//! let backend = CpalBackend::new();
//! let devices = backend.list_output_devices()?;
//! let engine: Engine<i16> = Engine::with_backend(&backend, &devices[0], EngineConfig::default())?;
//! ```

use crate::backend::{AudioBackend, OutputDevice};
use crate::engine::EngineConfig;
use crate::notifier::CompletionNotifier;
use crate::ring::Block;
use crate::sample::PcmSample;
use crate::{Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Extract device name via `description()` (cpal 0.17+).
fn device_name(device: &cpal::Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// cpal-based audio backend.
///
/// Holds the platform's default cpal [`Host`] (ALSA on Linux, CoreAudio on
/// macOS, WASAPI on Windows).
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Create a backend on the platform's default audio host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    /// Output device names in host order.
    ///
    /// Devices whose name cannot be read are skipped.
    pub fn list_output_devices(&self) -> Result<Vec<String>> {
        let devices = self
            .host
            .output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;
        Ok(devices.filter_map(|d| device_name(&d).ok()).collect())
    }

    /// Name of the host's default output device, if any.
    pub fn default_output_device_name(&self) -> Result<Option<String>> {
        Ok(self
            .host
            .default_output_device()
            .and_then(|d| device_name(&d).ok()))
    }

    /// Find an output device by exact name.
    fn find_output_device(&self, name: &str) -> Result<cpal::Device> {
        let devices = self
            .host
            .output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?;

        for device in devices {
            if device_name(&device).is_ok_and(|n| n == name) {
                return Ok(device);
            }
        }
        Err(Error::DeviceNotFound(name.to_string()))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpalBackend")
            .field("host", &self.host.id().name())
            .finish()
    }
}

impl<S: PcmSample> AudioBackend<S> for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn output_devices(&self) -> Result<Vec<String>> {
        self.list_output_devices()
    }

    fn open_output(
        &self,
        device_name: &str,
        config: &EngineConfig,
        notifier: CompletionNotifier<S>,
    ) -> Result<Box<dyn OutputDevice<S>>> {
        let (sender, receiver) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let host_id = self.host.id();
        let name = device_name.to_string();
        let config = *config;

        // cpal streams are not `Send` on every platform, so the stream lives
        // on its own thread until the output is dropped.
        let owner = thread::Builder::new()
            .name(STREAM_THREAD_NAME.to_string())
            .spawn(move || {
                let stream = match start_stream(host_id, &name, &config, receiver, notifier) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                // Returns once the sender is dropped.
                let _ = stop_rx.recv();
                drop(stream);
                tracing::debug!(device = %name, "output stream closed");
            })
            .map_err(Error::Thread)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = owner.join();
                return Err(e);
            }
            Err(_) => {
                let _ = owner.join();
                return Err(Error::Stream("stream thread exited during startup".into()));
            }
        }

        tracing::info!(
            device = device_name,
            channels = config.channels,
            sample_rate = config.sample_rate,
            buffer = config.block_samples,
            "output stream started"
        );

        Ok(Box::new(CpalOutput {
            sender,
            stop: Some(stop_tx),
            owner: Some(owner),
        }))
    }
}

const STREAM_THREAD_NAME: &str = "wavesynth-cpal";

/// Open `name` on the host and start an f32 stream that plays `queue`.
fn start_stream<S: PcmSample>(
    host_id: cpal::HostId,
    name: &str,
    config: &EngineConfig,
    queue: Receiver<Block<S>>,
    notifier: CompletionNotifier<S>,
) -> Result<cpal::Stream> {
    let host = cpal::host_from_id(host_id).map_err(|e| Error::Stream(e.to_string()))?;
    let device = CpalBackend { host }.find_output_device(name)?;

    let frames = u32::try_from(config.block_samples)
        .map_err(|_| Error::InvalidConfig(format!("block size {}", config.block_samples)))?;
    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: config.sample_rate,
        buffer_size: cpal::BufferSize::Fixed(frames),
    };
    let mut playhead = Playhead::new(queue, notifier, usize::from(config.channels));

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                playhead.render(data);
            },
            move |err| {
                tracing::error!(error = %err, "output stream error");
            },
            None,
        )
        .map_err(|e| Error::Stream(e.to_string()))?;

    stream.play().map_err(|e| Error::Stream(e.to_string()))?;
    Ok(stream)
}

/// Feeds blocks to a cpal stream owned by a dedicated thread.
struct CpalOutput<S> {
    sender: Sender<Block<S>>,
    stop: Option<Sender<()>>,
    owner: Option<JoinHandle<()>>,
}

impl<S: PcmSample> OutputDevice<S> for CpalOutput<S> {
    // cpal has no buffer registration step; the flag on the block is enough.
    fn prepare(&mut self, _block: &mut Block<S>) -> Result<()> {
        Ok(())
    }

    fn unprepare(&mut self, _block: &mut Block<S>) -> Result<()> {
        Ok(())
    }

    fn submit(&mut self, block: Block<S>) -> Result<()> {
        self.sender
            .send(block)
            .map_err(|_| Error::Device("output stream closed".into()))
    }
}

impl<S> Drop for CpalOutput<S> {
    fn drop(&mut self) {
        drop(self.stop.take());
        if let Some(owner) = self.owner.take()
            && owner.join().is_err()
        {
            tracing::warn!("output stream thread panicked");
        }
    }
}

/// Playback position inside the stream callback.
struct Playhead<S> {
    queue: Receiver<Block<S>>,
    notifier: CompletionNotifier<S>,
    channels: usize,
    current: Option<Block<S>>,
    position: usize,
    started: bool,
}

impl<S: PcmSample> Playhead<S> {
    fn new(queue: Receiver<Block<S>>, notifier: CompletionNotifier<S>, channels: usize) -> Self {
        Self {
            queue,
            notifier,
            channels,
            current: None,
            position: 0,
            started: false,
        }
    }

    /// Fill an interleaved device buffer, one block sample per frame.
    fn render(&mut self, data: &mut [f32]) {
        let mut starved = false;

        for frame in data.chunks_mut(self.channels) {
            if self.current.is_none() {
                self.current = self.queue.try_recv().ok();
                self.position = 0;
            }

            let Some(block) = self.current.as_ref() else {
                frame.fill(0.0);
                starved = true;
                continue;
            };

            self.started = true;
            frame.fill(block.samples()[self.position].to_f32());
            self.position += 1;

            if self.position >= block.len()
                && let Some(done) = self.current.take()
            {
                self.notifier.complete(done);
            }
        }

        // Silence before the first block is startup, not an underrun.
        if starved && self.started {
            self.notifier.report_underrun();
        }
    }
}

/// Output device names on the default host, in host order.
pub fn enumerate() -> Result<Vec<String>> {
    CpalBackend::new().list_output_devices()
}

/// Name of the default host's default output device.
pub fn default_output_device() -> Result<Option<String>> {
    CpalBackend::new().default_output_device_name()
}
