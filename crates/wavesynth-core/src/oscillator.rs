//! Stateless oscillator bank.
//!
//! Every waveform is a pure function of frequency and absolute time, so the
//! producer can evaluate any sample position without carrying phase between
//! calls. This is what lets the engine's sample clock drive all timing.

use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU64, Ordering};
use libm::{asin, fmod, sin};

/// Number of partials summed by [`Waveform::AnalogSaw`].
pub const ANALOG_SAW_HARMONICS: u32 = 39;

/// Periodic waveform kinds understood by [`oscillate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Waveform {
    /// Pure sine, `sin(2π·hz·t)`.
    #[default]
    Sine,
    /// Sign of the sine: `+1` or `-1`.
    Square,
    /// `asin(sin(2π·hz·t)) · 2/π`.
    Triangle,
    /// Band-limited saw built from the first 39 harmonics.
    AnalogSaw,
    /// Exact closed-form saw. Aliases at high frequencies.
    DigitalSaw,
    /// Uniform white noise in `[-1, 1]`.
    Noise,
}

impl Waveform {
    /// All waveforms, in declaration order.
    pub const ALL: [Waveform; 6] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::AnalogSaw,
        Waveform::DigitalSaw,
        Waveform::Noise,
    ];

    /// Canonical lowercase name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::AnalogSaw => "analog-saw",
            Waveform::DigitalSaw => "digital-saw",
            Waveform::Noise => "noise",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a waveform name is not recognised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseWaveformError;

impl fmt::Display for ParseWaveformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(
            "unknown waveform (expected sine, square, triangle, analog-saw, digital-saw or noise)",
        )
    }
}

impl core::error::Error for ParseWaveformError {}

impl FromStr for Waveform {
    type Err = ParseWaveformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let matches = |name: &str| s.eq_ignore_ascii_case(name);

        if matches("sine") || matches("sin") {
            Ok(Waveform::Sine)
        } else if matches("square") {
            Ok(Waveform::Square)
        } else if matches("triangle") || matches("tri") {
            Ok(Waveform::Triangle)
        } else if matches("analog-saw") || matches("analog_saw") || matches("saw") {
            Ok(Waveform::AnalogSaw)
        } else if matches("digital-saw") || matches("digital_saw") {
            Ok(Waveform::DigitalSaw)
        } else if matches("noise") {
            Ok(Waveform::Noise)
        } else {
            Err(ParseWaveformError)
        }
    }
}

/// Convert a frequency in Hz to angular velocity in radians per second.
#[inline]
pub fn angular_velocity(hz: f64) -> f64 {
    hz * 2.0 * PI
}

/// Evaluate `waveform` at frequency `hz` and absolute time `t` (seconds).
///
/// Output is normalised to `[-1, 1]` for every waveform except
/// [`Waveform::AnalogSaw`], whose truncated Fourier series overshoots
/// slightly near the discontinuity (Gibbs ripple).
#[inline]
pub fn oscillate(hz: f64, t: f64, waveform: Waveform) -> f64 {
    let w = angular_velocity(hz);
    match waveform {
        Waveform::Sine => sin(w * t),

        Waveform::Square => {
            if sin(w * t) > 0.0 {
                1.0
            } else {
                -1.0
            }
        }

        Waveform::Triangle => asin(sin(w * t)) * (2.0 / PI),

        Waveform::AnalogSaw => {
            let mut out = 0.0;
            for n in 1..=ANALOG_SAW_HARMONICS {
                let n = f64::from(n);
                out += sin(n * w * t) / n;
            }
            out * (2.0 / PI)
        }

        Waveform::DigitalSaw => {
            if hz <= 0.0 {
                return 0.0;
            }
            (2.0 / PI) * (hz * PI * fmod(t, 1.0 / hz) - PI / 2.0)
        }

        Waveform::Noise => white_noise(),
    }
}

static NOISE_STATE: AtomicU64 = AtomicU64::new(0x9E37_79B9_7F4A_7C15);

#[inline]
fn xorshift64(mut x: u64) -> u64 {
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x
}

/// Draw one uniform sample in `[-1, 1]` from the shared generator.
///
/// The generator state lives in a single atomic, so concurrent callers each
/// get a distinct value without locking.
fn white_noise() -> f64 {
    let prev = NOISE_STATE
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |x| Some(xorshift64(x)))
        .unwrap_or_else(|x| x);
    let x = xorshift64(prev);

    // Top 53 bits give a uniform double in [0, 1).
    let unit = (x >> 11) as f64 / (1u64 << 53) as f64;
    2.0 * unit - 1.0
}
