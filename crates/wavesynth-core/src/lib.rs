//! Wavesynth Core - synthesis layer for the wavesynth real-time synthesizer
//!
//! Everything in this crate is a function of absolute time. The streaming
//! engine in `wavesynth-io` owns the sample clock and calls a [`Synthesis`]
//! implementation once per sample with the current time; oscillators and
//! envelopes evaluate against that value instead of carrying per-sample state.
//!
//! # Oscillator Bank
//!
//! - [`oscillate`] - stateless `(hz, t, waveform) -> [-1, 1]`
//! - [`Waveform`] - Sine, Square, Triangle, AnalogSaw, DigitalSaw, Noise
//!
//! ```rust
//! use wavesynth_core::{Waveform, oscillate};
//!
//! let quarter_period = oscillate(1.0, 0.25, Waveform::Sine);
//! assert!((quarter_period - 1.0).abs() < 1e-12);
//! ```
//!
//! # Envelope
//!
//! - [`AdsrEnvelope`] - linear attack-decay-sustain-release
//! - [`EnvelopeStage`] - stage derived from elapsed time
//! - [`EnvelopeShape`] - timing and level parameters
//!
//! # Voice and Synthesis
//!
//! - [`Voice`] - lock-free shared pitch and envelope events for one voice
//! - [`Patch`] / [`Layer`] - oscillator layering
//! - [`Synthesis`] - the per-sample callback contract
//! - [`VoiceSynth`] - a patch played by a voice
//! - [`KeyboardLayout`] - computer-keyboard pitch map
//!
//! # Example: Playing a Note
//!
//! ```rust
//! use std::sync::Arc;
//! use wavesynth_core::{EnvelopeShape, Patch, Synthesis, Voice, VoiceSynth};
//!
//! let voice = Arc::new(Voice::new(EnvelopeShape::default()));
//! let mut synth = VoiceSynth::new(Arc::clone(&voice), Patch::default());
//!
//! voice.note_on(0.0, 220.0);
//! let samples: Vec<f64> = (0..512).map(|n| synth.sample(n as f64 / 44100.0)).collect();
//! assert_eq!(samples[0], 0.0);
//! ```
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (it needs `alloc`). Disable the default
//! `std` feature:
//!
//! ```toml
//! [dependencies]
//! wavesynth-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod envelope;
pub mod keyboard;
pub mod oscillator;
pub mod patch;
pub mod synthesis;
pub mod voice;

pub use envelope::{AMPLITUDE_FLOOR, AdsrEnvelope, EnvelopeShape, EnvelopeStage};
pub use keyboard::{KEY_LAYOUT, KeyboardLayout, SEMITONE_RATIO};
pub use oscillator::{
    ANALOG_SAW_HARMONICS, ParseWaveformError, Waveform, angular_velocity, oscillate,
};
pub use patch::{Layer, Patch};
pub use synthesis::{Silence, Synthesis, VoiceSynth};
pub use voice::{AtomicF64, Voice};
