//! Oscillator layering.

use crate::oscillator::{Waveform, oscillate};
use alloc::vec;
use alloc::vec::Vec;

/// One oscillator in a [`Patch`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    /// Waveform to evaluate.
    pub waveform: Waveform,
    /// Multiplier applied to the voice frequency.
    pub frequency_ratio: f64,
    /// Linear gain of this layer.
    pub gain: f64,
}

impl Layer {
    /// Create a layer.
    pub fn new(waveform: Waveform, frequency_ratio: f64, gain: f64) -> Self {
        Self {
            waveform,
            frequency_ratio,
            gain,
        }
    }
}

/// A sum of oscillator layers sharing one base frequency.
///
/// The default patch is a sine one octave down under a band-limited saw at
/// the played pitch.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    /// Layers summed by [`Patch::render`].
    pub layers: Vec<Layer>,
    /// Gain applied to the summed layers.
    pub gain: f64,
}

impl Default for Patch {
    fn default() -> Self {
        Self {
            layers: vec![
                Layer::new(Waveform::Sine, 0.5, 1.0),
                Layer::new(Waveform::AnalogSaw, 1.0, 1.0),
            ],
            gain: 1.0,
        }
    }
}

impl Patch {
    /// A patch with a single full-gain layer at the played pitch.
    pub fn single(waveform: Waveform) -> Self {
        Self {
            layers: vec![Layer::new(waveform, 1.0, 1.0)],
            gain: 1.0,
        }
    }

    /// Evaluate the patch at base frequency `hz` and time `t`.
    #[inline]
    pub fn render(&self, hz: f64, t: f64) -> f64 {
        let sum: f64 = self
            .layers
            .iter()
            .map(|layer| layer.gain * oscillate(hz * layer.frequency_ratio, t, layer.waveform))
            .sum();
        sum * self.gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_layers() {
        let patch = Patch::default();
        assert_eq!(patch.layers.len(), 2);

        let hz = 220.0;
        let t = 0.0123;
        let expected = oscillate(110.0, t, Waveform::Sine) + oscillate(220.0, t, Waveform::AnalogSaw);
        assert!((patch.render(hz, t) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_single_matches_oscillator() {
        let patch = Patch::single(Waveform::Triangle);
        let t = 0.004;
        assert_eq!(patch.render(330.0, t), oscillate(330.0, t, Waveform::Triangle));
    }

    #[test]
    fn test_empty_patch_is_silent() {
        let patch = Patch {
            layers: Vec::new(),
            gain: 1.0,
        };
        assert_eq!(patch.render(440.0, 0.5), 0.0);
    }
}
