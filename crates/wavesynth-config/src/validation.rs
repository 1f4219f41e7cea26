//! Configuration validation.
//!
//! [`validate_config`] checks every section and reports all problems at once
//! rather than stopping at the first.
//!
//! ```rust
//! use wavesynth_config::{SynthConfig, ValidationError, validate_config};
//!
//! let mut config = SynthConfig::default();
//! assert!(validate_config(&config).is_ok());
//!
//! config.engine.bit_depth = 24;
//! assert_eq!(validate_config(&config), Err(ValidationError::InvalidBitDepth(24)));
//! ```

use crate::config::SynthConfig;
use thiserror::Error;

/// Supported PCM sample widths.
pub const SUPPORTED_BIT_DEPTHS: [u16; 3] = [8, 16, 32];

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Numeric field outside its allowed range.
    #[error("'{field}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the field, e.g. `envelope.sustain_amplitude`.
        field: String,
        /// The rejected value.
        value: f64,
        /// Minimum allowed value.
        min: f64,
        /// Maximum allowed value.
        max: f64,
    },

    /// Bit depth other than 8, 16 or 32.
    #[error("unsupported bit depth {0} (expected 8, 16 or 32)")]
    InvalidBitDepth(u16),

    /// Waveform name that does not parse.
    #[error("unknown waveform: {0}")]
    UnknownWaveform(String),

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn check_range(errors: &mut Vec<ValidationError>, field: &str, value: f64, min: f64, max: f64) {
    // NaN is never contained in a range.
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        });
    }
}

fn check_count(
    errors: &mut Vec<ValidationError>,
    field: &str,
    value: usize,
    min: usize,
    max: usize,
) {
    if !(min..=max).contains(&value) {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
}

/// Largest block the output device can be asked to buffer.
const MAX_BLOCK_SAMPLES: usize = u32::MAX as usize;

/// Upper bound on the ring length.
const MAX_BLOCK_COUNT: usize = 1 << 16;

/// Validate every section of a configuration.
///
/// Returns the single error directly, or [`ValidationError::Multiple`] when
/// more than one check fails.
pub fn validate_config(config: &SynthConfig) -> ValidationResult<()> {
    let mut errors = Vec::new();

    let engine = &config.engine;
    let sample_rate = engine.sample_rate as usize;
    check_count(&mut errors, "engine.sample_rate", sample_rate, 1, usize::MAX);
    let channels = usize::from(engine.channels);
    check_count(&mut errors, "engine.channels", channels, 1, usize::MAX);
    check_count(&mut errors, "engine.block_count", engine.block_count, 2, MAX_BLOCK_COUNT);
    check_count(
        &mut errors,
        "engine.block_samples",
        engine.block_samples,
        1,
        MAX_BLOCK_SAMPLES,
    );
    if !SUPPORTED_BIT_DEPTHS.contains(&engine.bit_depth) {
        errors.push(ValidationError::InvalidBitDepth(engine.bit_depth));
    }

    let env = &config.envelope;
    for (field, value) in [
        ("envelope.attack_time", env.attack_time),
        ("envelope.decay_time", env.decay_time),
        ("envelope.release_time", env.release_time),
    ] {
        check_range(&mut errors, field, value, 0.0, f64::MAX);
    }
    check_range(&mut errors, "envelope.start_amplitude", env.start_amplitude, 0.0, 1.0);
    check_range(&mut errors, "envelope.sustain_amplitude", env.sustain_amplitude, 0.0, 1.0);

    check_range(&mut errors, "patch.gain", config.patch.gain, 0.0, f64::MAX);
    for (i, layer) in config.patch.layers.iter().enumerate() {
        if let Err(e) = layer.to_layer() {
            errors.push(e);
        }
        check_range(
            &mut errors,
            &format!("patch.layers[{i}].frequency_ratio"),
            layer.frequency_ratio,
            f64::MIN_POSITIVE,
            f64::MAX,
        );
        check_range(
            &mut errors,
            &format!("patch.layers[{i}].gain"),
            layer.gain,
            f64::MIN,
            f64::MAX,
        );
    }

    check_range(
        &mut errors,
        "keyboard.base_frequency",
        config.keyboard.base_frequency,
        f64::MIN_POSITIVE,
        f64::MAX,
    );

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerSettings;
    use wavesynth_core::Waveform;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(validate_config(&SynthConfig::default()), Ok(()));
    }

    #[test]
    fn test_single_block_rejected() {
        let mut config = SynthConfig::default();
        config.engine.block_count = 1;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "engine.block_count"
        ));
    }

    #[test]
    fn test_oversized_ring_rejected() {
        let mut config = SynthConfig::default();
        config.engine.block_samples = 9_223_372_036_854_775_807;
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "engine.block_samples"
        ));

        let mut config = SynthConfig::default();
        config.engine.block_count = MAX_BLOCK_COUNT + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_amplitude_bounds() {
        let mut config = SynthConfig::default();
        config.envelope.sustain_amplitude = 1.2;
        assert!(validate_config(&config).is_err());

        config.envelope.sustain_amplitude = f64::NAN;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_length_segments_allowed() {
        let mut config = SynthConfig::default();
        config.envelope.attack_time = 0.0;
        config.envelope.release_time = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_every_problem() {
        let mut config = SynthConfig::default();
        config.engine.bit_depth = 12;
        config.envelope.decay_time = -1.0;
        config.patch.layers.push(LayerSettings {
            waveform: "kazoo".to_string(),
            frequency_ratio: 0.0,
            gain: 1.0,
        });

        let Err(ValidationError::Multiple(errors)) = validate_config(&config) else {
            panic!("expected multiple errors");
        };
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::InvalidBitDepth(12)));
        assert!(errors.contains(&ValidationError::UnknownWaveform("kazoo".to_string())));
    }

    #[test]
    fn test_layer_ratio_must_be_positive() {
        let mut config = SynthConfig::default();
        config.patch.layers = vec![LayerSettings::new(Waveform::Sine, -1.0, 1.0)];
        assert!(validate_config(&config).is_err());
    }
}
