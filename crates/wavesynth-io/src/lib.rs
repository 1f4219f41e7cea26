//! Real-time audio streaming engine for wavesynth.
//!
//! This crate provides:
//!
//! - **Block ring**: [`BlockRing`], a fixed pool of PCM blocks cycled between
//!   the producer thread and the output device
//! - **Engine**: [`Engine`], which owns the ring, the producer thread and the
//!   sample clock, and drives a [`wavesynth_core::Synthesis`] callback
//! - **Backends**: [`CpalBackend`] for real hardware and [`CaptureBackend`]
//!   for deterministic headless runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wavesynth_core::{Patch, Voice, VoiceSynth};
//! use wavesynth_io::{Engine, EngineConfig, enumerate};
//!
//! let devices = enumerate()?;
//! let mut engine: Engine<i16> = Engine::create(&devices[0], EngineConfig::default())?;
//!
//! let voice = Arc::new(Voice::default());
//! engine.set_synthesis(VoiceSynth::new(Arc::clone(&voice), Patch::default()));
//! voice.note_on(engine.time(), 220.0);
//!
//! // ... later
//! engine.stop()?;
//! ```

pub mod backend;
pub mod capture;
mod clock;
mod cpal_backend;
mod engine;
mod notifier;
mod producer;
mod ring;
mod sample;

pub use backend::{AudioBackend, OutputDevice};
pub use capture::{CaptureBackend, CaptureTap, CompletionMode, DeviceEvent};
pub use clock::SampleClock;
pub use cpal_backend::{CpalBackend, default_output_device, enumerate};
pub use engine::{Engine, EngineConfig};
pub use notifier::{CompletionNotifier, EngineStats};
pub use ring::{Block, BlockRing, BlockState};
pub use sample::{PcmSample, clip, quantize};

/// Error types for the streaming engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup error reported by the host audio API.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// The backend enumerated no output devices at all.
    #[error("No output devices available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Engine geometry rejected before any resources were allocated.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Block storage for the requested geometry could not be allocated.
    #[error("Cannot allocate block ring: {0}")]
    Allocation(String),

    /// The output device failed while preparing or submitting a block.
    #[error("Output device error: {0}")]
    Device(String),

    /// The producer thread could not be spawned.
    #[error("Failed to spawn producer thread: {0}")]
    Thread(#[source] std::io::Error),

    /// The producer thread panicked, most likely inside the synthesis callback.
    #[error("Producer thread panicked")]
    ProducerPanicked,
}

/// Convenience result type for streaming operations.
pub type Result<T> = std::result::Result<T, Error>;
