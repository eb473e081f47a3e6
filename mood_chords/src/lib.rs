// Mood Chords
//
// Generates an 8-measure chord progression from three mood sliders
// (sad/cheerful, mysterious/mundane, tense/calm) and a complexity level
// (triad, seventh, ninth), and renders it as a Standard MIDI File. Scales
// are ranked by how closely their mood profile matches the target; one of
// the best few is picked at random, and the progression is filled by
// rejection-sampling scale degrees against a small set of voice-leading
// rules.
//
// Architecture:
// - theory.rs: Notes, pitches, the major key table, scale derivation, and
//   diatonic chord construction with voicing
// - mood.rs: Mood vectors, scale ranking/selection, chord-quality weights
// - constraints.rs: Degree rules used by the sampler (cooldown, repeats,
//   forbidden transitions, leaps into diminished chords)
// - progression.rs: Rhythm patterns and the 8-measure generator
// - embellish.rs: Secondary dominants, leading-tone chords, chromatic
//   mediants
// - render.rs: Tick timeline and MIDI file output
// - config.rs: JSON-loadable generator/render parameters
// - error.rs: Crate error type
//
// Generation is deterministic given a seeded RNG.

pub mod config;
pub mod constraints;
pub mod embellish;
pub mod error;
pub mod mood;
pub mod progression;
pub mod render;
pub mod theory;

pub use error::{Error, Result};
