//! Integration tests for wavesynth-config.
//!
//! These tests cover file I/O and the path from a TOML file to core types.

use std::sync::Arc;
use tempfile::TempDir;
use wavesynth_config::{ConfigError, SynthConfig, ValidationError, validate_config};
use wavesynth_core::{Synthesis, Voice, VoiceSynth, Waveform};

/// Test saving into a missing directory and loading back.
#[test]
fn test_save_creates_parent_and_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("wavesynth.toml");

    let mut config = SynthConfig::default();
    config.engine.device = Some("USB Audio".to_string());
    config.engine.bit_depth = 32;
    config.envelope.release_time = 0.5;

    config.save(&path).expect("save should create parent directories");
    assert!(path.exists());

    let loaded = SynthConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

/// Missing files fall back to defaults; unreadable ones carry their path.
#[test]
fn test_load_or_default_and_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    assert_eq!(
        SynthConfig::load_or_default(&path).unwrap(),
        SynthConfig::default()
    );

    match SynthConfig::load(&path) {
        Err(ConfigError::ReadFile { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected ReadFile error, got {other:?}"),
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[engine\nsample_rate = ").unwrap();

    assert!(matches!(
        SynthConfig::load(&path),
        Err(ConfigError::TomlParse(_))
    ));
}

/// A hand-written file drives a voice end to end.
#[test]
fn test_file_to_voice_synth() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lead.toml");
    std::fs::write(
        &path,
        r#"
        [envelope]
        attack_time = 0.0
        sustain_amplitude = 0.5
        start_amplitude = 0.5

        [patch]
        gain = 1.0

        [[patch.layers]]
        waveform = "square"

        [keyboard]
        base_frequency = 220.0
        "#,
    )
    .unwrap();

    let config = SynthConfig::load(&path).unwrap();
    validate_config(&config).unwrap();

    let layout = config.keyboard.to_layout();
    let voice = Arc::new(Voice::new(config.envelope.to_shape()));
    let patch = config.patch.to_patch().unwrap();
    assert_eq!(patch.layers[0].waveform, Waveform::Square);

    let mut synth = VoiceSynth::new(Arc::clone(&voice), patch);
    voice.note_on(0.0, layout.key_frequency('z').unwrap());

    // Square at 220 Hz is +1 in its first half period; sustain is 0.5.
    assert_eq!(synth.sample(0.5 + 1.0 / 880.0), 0.5);
}

#[test]
fn test_invalid_file_reports_validation_error() {
    let config = SynthConfig::from_toml(
        r#"
        [engine]
        bit_depth = 12
        "#,
    )
    .unwrap();

    let err: ConfigError = validate_config(&config).unwrap_err().into();
    assert!(matches!(
        err,
        ConfigError::Validation(ValidationError::InvalidBitDepth(12))
    ));
}
