//! Linear ADSR envelope evaluated against absolute time.
//!
//! The envelope keeps only two timestamps (note-on and note-off) and derives
//! its stage from elapsed time on every call. Nothing needs to be advanced
//! per sample, so the producer thread and the input thread can both query
//! it with the same engine clock value.

/// Amplitudes at or below this value are snapped to exactly zero.
pub const AMPLITUDE_FLOOR: f64 = 0.0001;

/// Envelope timing and level parameters.
///
/// Times are in seconds; amplitudes are linear gain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeShape {
    /// Time to ramp from silence to `start_amplitude`.
    pub attack_time: f64,
    /// Time to ramp from `start_amplitude` to `sustain_amplitude`.
    pub decay_time: f64,
    /// Level held while the note stays on.
    pub sustain_amplitude: f64,
    /// Time to ramp from `sustain_amplitude` to silence after note-off.
    pub release_time: f64,
    /// Peak level reached at the end of the attack.
    pub start_amplitude: f64,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            attack_time: 0.10,
            decay_time: 0.01,
            sustain_amplitude: 0.8,
            release_time: 0.20,
            start_amplitude: 1.0,
        }
    }
}

/// ADSR envelope stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Ramping up from zero toward the start amplitude.
    Attack,
    /// Ramping from the start amplitude toward the sustain level.
    Decay,
    /// Holding the sustain level while the note is on.
    Sustain,
    /// Ramping from the sustain level toward zero after note-off.
    Release,
}

/// ADSR envelope state for one voice.
///
/// `note_on` and `note_off` are plain overwrites of the event state. Calling
/// `note_on` twice restarts the attack from the new time; calling `note_off`
/// twice keeps only the latest release time.
///
/// # Example
///
/// ```rust
/// use wavesynth_core::{AdsrEnvelope, EnvelopeStage};
///
/// let mut env = AdsrEnvelope::default();
/// env.note_on(0.0);
/// assert_eq!(env.stage_at(0.05).0, EnvelopeStage::Attack);
/// assert!((env.amplitude(0.05) - 0.5).abs() < 1e-12);
///
/// env.note_off(1.0);
/// assert_eq!(env.amplitude(2.0), 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdsrEnvelope {
    /// Timing and level parameters.
    pub shape: EnvelopeShape,
    /// Whether the most recent event was a note-on.
    pub is_note_on: bool,
    /// Time of the most recent note-on, in seconds.
    pub trigger_on_time: f64,
    /// Time of the most recent note-off, in seconds.
    pub trigger_off_time: f64,
}

impl Default for AdsrEnvelope {
    fn default() -> Self {
        Self::new(EnvelopeShape::default())
    }
}

impl AdsrEnvelope {
    /// Create an envelope with the given shape and no note held.
    pub fn new(shape: EnvelopeShape) -> Self {
        Self {
            shape,
            is_note_on: false,
            trigger_on_time: 0.0,
            trigger_off_time: 0.0,
        }
    }

    /// Start (or restart) the attack at time `t`.
    pub fn note_on(&mut self, t: f64) {
        self.trigger_on_time = t;
        self.is_note_on = true;
    }

    /// Start the release at time `t`.
    pub fn note_off(&mut self, t: f64) {
        self.trigger_off_time = t;
        self.is_note_on = false;
    }

    /// Stage the envelope is in at time `t`, plus seconds elapsed within it.
    pub fn stage_at(&self, t: f64) -> (EnvelopeStage, f64) {
        if !self.is_note_on {
            return (EnvelopeStage::Release, (t - self.trigger_off_time).max(0.0));
        }

        let life = (t - self.trigger_on_time).max(0.0);
        let attack = self.shape.attack_time;
        let decay = self.shape.decay_time;

        if life <= attack {
            (EnvelopeStage::Attack, life)
        } else if life <= attack + decay {
            (EnvelopeStage::Decay, life - attack)
        } else {
            (EnvelopeStage::Sustain, life - attack - decay)
        }
    }

    /// Amplitude multiplier at time `t`.
    pub fn amplitude(&self, t: f64) -> f64 {
        let shape = &self.shape;
        let (stage, elapsed) = self.stage_at(t);

        let amplitude = match stage {
            EnvelopeStage::Attack => ramp(0.0, shape.start_amplitude, elapsed, shape.attack_time),
            EnvelopeStage::Decay => ramp(
                shape.start_amplitude,
                shape.sustain_amplitude,
                elapsed,
                shape.decay_time,
            ),
            EnvelopeStage::Sustain => shape.sustain_amplitude,
            EnvelopeStage::Release => {
                ramp(shape.sustain_amplitude, 0.0, elapsed, shape.release_time)
            }
        };

        if amplitude <= AMPLITUDE_FLOOR {
            0.0
        } else {
            amplitude
        }
    }
}

/// Linear interpolation from `from` to `to` over `duration` seconds.
///
/// The result is not clamped at `to`; past the end of a release the ramp
/// goes negative and the floor in [`AdsrEnvelope::amplitude`] takes over.
/// A zero-length segment jumps straight to `to`.
#[inline]
fn ramp(from: f64, to: f64, elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return to;
    }
    (elapsed / duration) * (to - from) + from
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn held_at_zero() -> AdsrEnvelope {
        let mut env = AdsrEnvelope::default();
        env.note_on(0.0);
        env
    }

    #[test]
    fn test_defaults() {
        let shape = EnvelopeShape::default();
        assert_eq!(shape.attack_time, 0.10);
        assert_eq!(shape.decay_time, 0.01);
        assert_eq!(shape.sustain_amplitude, 0.8);
        assert_eq!(shape.release_time, 0.20);
        assert_eq!(shape.start_amplitude, 1.0);
    }

    #[test]
    fn test_attack_midpoint_and_peak() {
        let env = held_at_zero();
        assert!((env.amplitude(0.05) - 0.5).abs() < EPS);
        assert!((env.amplitude(0.10) - 1.0).abs() < EPS);
        assert_eq!(env.stage_at(0.10).0, EnvelopeStage::Attack);
        assert_eq!(env.stage_at(0.1001).0, EnvelopeStage::Decay);
    }

    #[test]
    fn test_decay_reaches_sustain() {
        let env = held_at_zero();
        // Halfway through the 10ms decay: 1.0 -> 0.8
        assert!((env.amplitude(0.105) - 0.9).abs() < 1e-9);
        assert!((env.amplitude(0.11) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_sustain_holds() {
        let env = held_at_zero();
        for t in [0.2, 1.0, 10.0, 1000.0] {
            assert_eq!(env.stage_at(t).0, EnvelopeStage::Sustain);
            assert_eq!(env.amplitude(t), 0.8);
        }
    }

    #[test]
    fn test_release_ramps_to_floor() {
        let mut env = held_at_zero();
        env.note_off(1.0);

        assert!((env.amplitude(1.0) - 0.8).abs() < EPS);
        assert!((env.amplitude(1.1) - 0.4).abs() < 1e-9);
        assert_eq!(env.amplitude(1.2), 0.0);
        // Past the end the ramp would go negative; the floor clamps it.
        assert_eq!(env.amplitude(5.0), 0.0);
    }

    #[test]
    fn test_floor_snaps_small_values() {
        let mut env = held_at_zero();
        env.note_off(0.0);
        // Just before the end of release the ramp is below the floor.
        let t = 0.2 * (1.0 - 0.0001 / 0.8) + 1e-9;
        assert_eq!(env.amplitude(t), 0.0);
    }

    #[test]
    fn test_note_off_twice_keeps_latest() {
        let mut twice = held_at_zero();
        twice.note_off(1.0);
        twice.note_off(2.0);

        let mut once = held_at_zero();
        once.note_off(2.0);

        assert_eq!(twice, once);
        for t in [2.0, 2.05, 2.1, 2.3] {
            assert_eq!(twice.amplitude(t), once.amplitude(t));
        }
    }

    #[test]
    fn test_note_on_retriggers_attack() {
        let mut env = held_at_zero();
        env.note_on(5.0);
        assert_eq!(env.stage_at(5.02).0, EnvelopeStage::Attack);
        assert!((env.amplitude(5.05) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_length_segments() {
        let mut env = AdsrEnvelope::new(EnvelopeShape {
            attack_time: 0.0,
            decay_time: 0.0,
            sustain_amplitude: 0.5,
            release_time: 0.0,
            start_amplitude: 1.0,
        });
        env.note_on(0.0);
        assert_eq!(env.amplitude(0.0), 1.0);
        assert_eq!(env.amplitude(0.001), 0.5);

        env.note_off(1.0);
        assert_eq!(env.amplitude(1.0), 0.0);
    }

    #[test]
    fn test_time_before_trigger_is_clamped() {
        let mut env = AdsrEnvelope::default();
        env.note_on(1.0);
        assert_eq!(env.amplitude(0.5), 0.0);
    }
}
