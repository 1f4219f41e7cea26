//! Computer-keyboard pitch layout.
//!
//! Two rows of a QWERTY keyboard laid out like a piano: the bottom row
//! carries the white keys and the row above it the black keys.
//!
//! ```text
//! |   |   |   |   |   | |   |   |   |   | |   | |   |   |   |
//! |   | S |   |   | F | | G |   |   | J | | K | | L |   |   |
//! |   |___|   |   |___| |___|   |   |___| |___| |___|   |   |__
//! |     |     |     |     |     |     |     |     |     |     |
//! |  Z  |  X  |  C  |  V  |  B  |  N  |  M  |  ,  |  .  |  /  |
//! |_____|_____|_____|_____|_____|_____|_____|_____|_____|_____|
//! ```

use libm::pow;

/// Keys in semitone order, starting at the layout's base frequency.
pub const KEY_LAYOUT: [char; 16] = [
    'z', 's', 'x', 'c', 'f', 'v', 'g', 'b', 'n', 'j', 'm', 'k', ',', 'l', '.', '/',
];

/// Frequency ratio between adjacent semitones (twelfth root of two).
pub const SEMITONE_RATIO: f64 = 1.059_463_094_359_295_3;

/// Maps keyboard keys to equal-tempered frequencies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyboardLayout {
    /// Frequency of the first key (`z`), in Hz.
    pub base_frequency: f64,
}

impl Default for KeyboardLayout {
    /// A2 (110 Hz) on the `z` key.
    fn default() -> Self {
        Self {
            base_frequency: 110.0,
        }
    }
}

impl KeyboardLayout {
    /// Create a layout with the given base frequency.
    pub fn new(base_frequency: f64) -> Self {
        Self { base_frequency }
    }

    /// Number of playable keys.
    pub const fn len(&self) -> usize {
        KEY_LAYOUT.len()
    }

    /// Always false; the layout has a fixed set of keys.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Semitone index of `key`, if it is part of the layout.
    pub fn index_of(&self, key: char) -> Option<usize> {
        let key = key.to_ascii_lowercase();
        KEY_LAYOUT.iter().position(|&k| k == key)
    }

    /// Frequency of the key `index` semitones above the base.
    pub fn frequency(&self, index: usize) -> f64 {
        self.base_frequency * pow(SEMITONE_RATIO, index as f64)
    }

    /// Frequency of `key`, if it is part of the layout.
    pub fn key_frequency(&self, key: char) -> Option<f64> {
        self.index_of(key).map(|i| self.frequency(i))
    }
}
