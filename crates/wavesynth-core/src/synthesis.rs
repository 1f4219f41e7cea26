//! The per-sample synthesis callback contract.

use crate::patch::Patch;
use crate::voice::Voice;
use alloc::sync::Arc;

/// A source of normalised samples, evaluated once per output sample.
///
/// `time` is the engine clock at the sample being generated, in seconds.
/// Return values are expected in `[-1, 1]`; the engine hard-clips anything
/// outside that range before quantising.
///
/// Any `FnMut(f64) -> f64 + Send` closure implements this trait.
///
/// ```rust
/// use wavesynth_core::{Synthesis, Waveform, oscillate};
///
/// let mut a440 = |t: f64| oscillate(440.0, t, Waveform::Sine);
/// assert_eq!(a440.sample(0.0), 0.0);
/// ```
pub trait Synthesis: Send {
    /// Produce the sample at `time`.
    fn sample(&mut self, time: f64) -> f64;
}

impl<F> Synthesis for F
where
    F: FnMut(f64) -> f64 + Send,
{
    #[inline]
    fn sample(&mut self, time: f64) -> f64 {
        self(time)
    }
}

/// Synthesis used when nothing has been registered: constant zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct Silence;

impl Synthesis for Silence {
    #[inline]
    fn sample(&mut self, _time: f64) -> f64 {
        0.0
    }
}

/// A [`Patch`] played by a shared [`Voice`], scaled by its envelope.
#[derive(Clone, Debug)]
pub struct VoiceSynth {
    voice: Arc<Voice>,
    patch: Patch,
}

impl VoiceSynth {
    /// Create a synth that renders `patch` at the voice's pitch and envelope.
    pub fn new(voice: Arc<Voice>, patch: Patch) -> Self {
        Self { voice, patch }
    }

    /// The voice this synth reads from.
    pub fn voice(&self) -> &Arc<Voice> {
        &self.voice
    }

    /// The patch this synth renders.
    pub fn patch(&self) -> &Patch {
        &self.patch
    }
}

impl Synthesis for VoiceSynth {
    #[inline]
    fn sample(&mut self, time: f64) -> f64 {
        let amplitude = self.voice.amplitude(time);
        if amplitude == 0.0 {
            return 0.0;
        }
        amplitude * self.patch.render(self.voice.frequency(), time)
    }
}
