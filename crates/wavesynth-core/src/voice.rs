//! Shared voice context.
//!
//! A [`Voice`] is the one place where the input side (note events, target
//! pitch) meets the synthesis callback running on the producer thread. All
//! event state lives in atomics, so neither side ever blocks the other.

use crate::envelope::{AdsrEnvelope, EnvelopeShape};
use core::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// An `f64` stored as its bit pattern in an [`AtomicU64`].
///
/// Writers publish with `Release`, readers observe with `Acquire`.
#[derive(Debug, Default)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    /// Create a new atomic holding `value`.
    pub const fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    /// Read the current value.
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Replace the current value.
    #[inline]
    pub fn store(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

/// One monophonic voice: a target frequency plus envelope event state.
///
/// Share it as `Arc<Voice>` between the thread that handles key events and
/// the synthesis callback. The envelope shape is fixed at construction; the
/// event state is overwritten on every note-on and note-off.
///
/// # Example
///
/// ```rust
/// use wavesynth_core::{EnvelopeShape, Voice};
///
/// let voice = Voice::new(EnvelopeShape::default());
/// voice.note_on(0.0, 220.0);
/// assert_eq!(voice.frequency(), 220.0);
/// assert!((voice.amplitude(0.05) - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct Voice {
    shape: EnvelopeShape,
    frequency: AtomicF64,
    note_on: AtomicBool,
    trigger_on_time: AtomicF64,
    trigger_off_time: AtomicF64,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(EnvelopeShape::default())
    }
}

impl Voice {
    /// Create a silent voice (no note held, frequency 0 Hz).
    pub fn new(shape: EnvelopeShape) -> Self {
        Self {
            shape,
            frequency: AtomicF64::new(0.0),
            note_on: AtomicBool::new(false),
            trigger_on_time: AtomicF64::new(0.0),
            trigger_off_time: AtomicF64::new(0.0),
        }
    }

    /// Envelope shape of this voice.
    pub fn shape(&self) -> EnvelopeShape {
        self.shape
    }

    /// Start a note at time `t` with target frequency `hz`.
    ///
    /// Frequency and trigger time are published before the gate flips, so a
    /// reader that sees the gate open also sees the new pitch.
    pub fn note_on(&self, t: f64, hz: f64) {
        self.frequency.store(hz);
        self.trigger_on_time.store(t);
        self.note_on.store(true, Ordering::Release);
    }

    /// Release the current note at time `t`.
    pub fn note_off(&self, t: f64) {
        self.trigger_off_time.store(t);
        self.note_on.store(false, Ordering::Release);
    }

    /// Change the target frequency without retriggering the envelope.
    pub fn set_frequency(&self, hz: f64) {
        self.frequency.store(hz);
    }

    /// Current target frequency in Hz.
    #[inline]
    pub fn frequency(&self) -> f64 {
        self.frequency.load()
    }

    /// Whether a note is currently held.
    pub fn is_note_on(&self) -> bool {
        self.note_on.load(Ordering::Acquire)
    }

    /// Snapshot of the envelope state.
    #[inline]
    pub fn envelope(&self) -> AdsrEnvelope {
        let is_note_on = self.note_on.load(Ordering::Acquire);
        AdsrEnvelope {
            shape: self.shape,
            is_note_on,
            trigger_on_time: self.trigger_on_time.load(),
            trigger_off_time: self.trigger_off_time.load(),
        }
    }

    /// Envelope amplitude at time `t`.
    #[inline]
    pub fn amplitude(&self, t: f64) -> f64 {
        self.envelope().amplitude(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EnvelopeStage;

    #[test]
    fn test_atomic_f64_round_trip() {
        let a = AtomicF64::new(1.5);
        assert_eq!(a.load(), 1.5);
        a.store(-0.25);
        assert_eq!(a.load(), -0.25);
    }

    #[test]
    fn test_new_voice_is_silent() {
        let voice = Voice::default();
        assert!(!voice.is_note_on());
        assert_eq!(voice.frequency(), 0.0);
        // Released at t=0 with a 0.2s release, long gone by t=1.
        assert_eq!(voice.amplitude(1.0), 0.0);
    }

    #[test]
    fn test_note_on_off_updates_snapshot() {
        let voice = Voice::default();
        voice.note_on(2.0, 440.0);

        let env = voice.envelope();
        assert!(env.is_note_on);
        assert_eq!(env.trigger_on_time, 2.0);
        assert_eq!(voice.frequency(), 440.0);

        voice.note_off(3.0);
        let env = voice.envelope();
        assert!(!env.is_note_on);
        assert_eq!(env.trigger_off_time, 3.0);
        assert_eq!(env.stage_at(3.1).0, EnvelopeStage::Release);
        // Pitch is kept through the release tail.
        assert_eq!(voice.frequency(), 440.0);
    }

    #[test]
    fn test_set_frequency_keeps_gate() {
        let voice = Voice::default();
        voice.note_on(0.0, 110.0);
        voice.set_frequency(220.0);
        assert!(voice.is_note_on());
        assert_eq!(voice.frequency(), 220.0);
        assert_eq!(voice.envelope().trigger_on_time, 0.0);
    }
}
