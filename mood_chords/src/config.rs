// Tunable parameters for generation and rendering.
//
// Everything the generator and renderer would otherwise hard-code lives here
// with the historical values as defaults, so a JSON file only needs to list
// what it changes:
//
//     { "generator": { "key": "Eb", "scale_shortlist": 3 },
//       "render": { "ticks_per_quarter": 480 } }
//
// See progression.rs for how `GeneratorConfig` is consumed and render.rs for
// `RenderConfig`.

use crate::error::{Error, Result};
use crate::theory::{Letter, Note, Voicing};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters for `progression::create_chord_progression`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Tonic of the generated progression.
    pub key: Note,
    /// How many of the best-matching scales to choose between (1..=9).
    pub scale_shortlist: usize,
    /// Octave placement of chord tones.
    pub voicing: Voicing,
    /// Measures during which no further diminished chord may be sampled
    /// after one is placed. The placing measure counts as the first.
    pub diminished_cooldown: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            key: Note::natural(Letter::C),
            scale_shortlist: 2,
            voicing: Voicing::Open,
            diminished_cooldown: 3,
        }
    }
}

/// Parameters for turning a progression into a MIDI file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// MIDI resolution (ticks per quarter note).
    pub ticks_per_quarter: u16,
    pub tempo_bpm: u16,
    /// General MIDI program number written in the program-change event.
    pub program: u8,
    /// One-based MIDI channel (1..=16).
    pub channel: u8,
    /// Note-on velocity for every chord tone.
    pub velocity: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            ticks_per_quarter: 128,
            tempo_bpm: 120,
            program: 1,
            channel: 1,
            velocity: 100,
        }
    }
}

/// Largest resolution a metrical SMF header can carry (15 bits).
pub const MAX_TICKS_PER_QUARTER: u16 = 0x7fff;

/// Slowest tempo whose microseconds-per-quarter fits the 24-bit tempo event.
pub const MIN_TEMPO_BPM: u16 = 4;

impl RenderConfig {
    /// Check that every field fits the MIDI encoding. Channel, program and
    /// velocity are clamped at render time; resolution and tempo are not,
    /// since clamping them would move every event.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_TICKS_PER_QUARTER).contains(&self.ticks_per_quarter) {
            return Err(Error::InvalidRenderConfig {
                field: "ticks_per_quarter",
                value: self.ticks_per_quarter as u32,
                expected: "1..=32767",
            });
        }
        if self.tempo_bpm < MIN_TEMPO_BPM {
            return Err(Error::InvalidRenderConfig {
                field: "tempo_bpm",
                value: self.tempo_bpm as u32,
                expected: "at least 4",
            });
        }
        Ok(())
    }
}

/// Top-level config file layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodChordsConfig {
    pub generator: GeneratorConfig,
    pub render: RenderConfig,
}

impl MoodChordsConfig {
    /// Load from a JSON file. Missing fields take their defaults; render
    /// settings are validated.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: MoodChordsConfig = serde_json::from_str(data)?;
        config.render.validate()?;
        Ok(config)
    }
}
