//! Synthesizer configuration file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use wavesynth_core::{EnvelopeShape, KeyboardLayout, Layer, Patch, Waveform};

use crate::error::ConfigError;
use crate::validation::ValidationError;

/// Complete synthesizer configuration.
///
/// Every section is optional in the file; missing sections and fields take
/// their defaults.
///
/// # TOML Format
///
/// ```toml
/// [engine]
/// device = "Built-in Output"
/// sample_rate = 44100
/// channels = 1
/// block_count = 8
/// block_samples = 512
/// bit_depth = 16
///
/// [envelope]
/// attack_time = 0.1
/// decay_time = 0.01
/// sustain_amplitude = 0.8
/// release_time = 0.2
/// start_amplitude = 1.0
///
/// [patch]
/// gain = 1.0
///
/// [[patch.layers]]
/// waveform = "sine"
/// frequency_ratio = 0.5
///
/// [[patch.layers]]
/// waveform = "analog-saw"
///
/// [keyboard]
/// base_frequency = 110.0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SynthConfig {
    /// Output engine geometry and device.
    #[serde(default)]
    pub engine: EngineSettings,

    /// Envelope shape for the voice.
    #[serde(default)]
    pub envelope: EnvelopeSettings,

    /// Oscillator layers.
    #[serde(default)]
    pub patch: PatchSettings,

    /// Keyboard pitch mapping.
    #[serde(default)]
    pub keyboard: KeyboardSettings,
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Output device name; the first enumerated device when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count.
    pub channels: u16,
    /// Blocks in the ring.
    pub block_count: usize,
    /// Samples per block.
    pub block_samples: usize,
    /// PCM sample width: 8, 16 or 32.
    pub bit_depth: u16,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: 44100,
            channels: 1,
            block_count: 8,
            block_samples: 512,
            bit_depth: 16,
        }
    }
}

/// `[envelope]` section, mirroring [`EnvelopeShape`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvelopeSettings {
    /// Attack time in seconds.
    pub attack_time: f64,
    /// Decay time in seconds.
    pub decay_time: f64,
    /// Sustain level.
    pub sustain_amplitude: f64,
    /// Release time in seconds.
    pub release_time: f64,
    /// Peak level at the end of the attack.
    pub start_amplitude: f64,
}

impl Default for EnvelopeSettings {
    fn default() -> Self {
        EnvelopeShape::default().into()
    }
}

impl From<EnvelopeShape> for EnvelopeSettings {
    fn from(shape: EnvelopeShape) -> Self {
        Self {
            attack_time: shape.attack_time,
            decay_time: shape.decay_time,
            sustain_amplitude: shape.sustain_amplitude,
            release_time: shape.release_time,
            start_amplitude: shape.start_amplitude,
        }
    }
}

impl EnvelopeSettings {
    /// Envelope shape for [`wavesynth_core::Voice::new`].
    pub fn to_shape(&self) -> EnvelopeShape {
        EnvelopeShape {
            attack_time: self.attack_time,
            decay_time: self.decay_time,
            sustain_amplitude: self.sustain_amplitude,
            release_time: self.release_time,
            start_amplitude: self.start_amplitude,
        }
    }
}

/// One `[[patch.layers]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayerSettings {
    /// Waveform name, e.g. `"sine"` or `"analog-saw"`.
    pub waveform: String,
    /// Multiplier applied to the played frequency.
    #[serde(default = "default_unity")]
    pub frequency_ratio: f64,
    /// Linear gain.
    #[serde(default = "default_unity")]
    pub gain: f64,
}

fn default_unity() -> f64 {
    1.0
}

impl LayerSettings {
    /// Create a layer entry.
    pub fn new(waveform: Waveform, frequency_ratio: f64, gain: f64) -> Self {
        Self {
            waveform: waveform.name().to_string(),
            frequency_ratio,
            gain,
        }
    }

    /// Resolve the waveform name into a core [`Layer`].
    pub fn to_layer(&self) -> Result<Layer, ValidationError> {
        let waveform = self
            .waveform
            .parse::<Waveform>()
            .map_err(|_| ValidationError::UnknownWaveform(self.waveform.clone()))?;
        Ok(Layer::new(waveform, self.frequency_ratio, self.gain))
    }
}

/// `[patch]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatchSettings {
    /// Gain applied to the summed layers.
    pub gain: f64,
    /// Oscillator layers.
    pub layers: Vec<LayerSettings>,
}

impl Default for PatchSettings {
    fn default() -> Self {
        let patch = Patch::default();
        Self {
            gain: patch.gain,
            layers: patch
                .layers
                .iter()
                .map(|l| LayerSettings::new(l.waveform, l.frequency_ratio, l.gain))
                .collect(),
        }
    }
}

impl PatchSettings {
    /// Build the core [`Patch`], failing on the first unknown waveform.
    pub fn to_patch(&self) -> Result<Patch, ValidationError> {
        let layers = self
            .layers
            .iter()
            .map(LayerSettings::to_layer)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Patch {
            layers,
            gain: self.gain,
        })
    }
}

/// `[keyboard]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyboardSettings {
    /// Frequency of the lowest key in Hz.
    pub base_frequency: f64,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        Self {
            base_frequency: KeyboardLayout::default().base_frequency,
        }
    }
}

impl KeyboardSettings {
    /// Keyboard layout for this section.
    pub fn to_layout(&self) -> KeyboardLayout {
        KeyboardLayout::new(self.base_frequency)
    }
}

impl SynthConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load `path` if it exists, otherwise return the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
