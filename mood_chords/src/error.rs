// Crate-wide error type.
//
// Generation itself is infallible once a supported key is chosen; errors come
// from unsupported keys, unparseable user input (note names, scale names,
// complexity levels), config loading, and the final MIDI file write.
// Invalid pitches during rendering are *not* errors: they are substituted and
// reported as warnings (see render.rs).

use crate::theory::{Note, ScaleType};
use thiserror::Error;

/// Errors produced by the theory engine, config loading, and rendering.
#[derive(Debug, Error)]
pub enum Error {
    /// No major key in the table yields this key/scale combination.
    #[error("unsupported key {key} for scale {scale}")]
    UnsupportedKey { key: Note, scale: ScaleType },

    /// A note name failed to parse.
    #[error("invalid note name: {0:?}")]
    InvalidNote(String),

    /// A scale name failed to parse.
    #[error("unknown scale type: {0:?}")]
    UnknownScale(String),

    /// Scale degree outside 1..=7.
    #[error("invalid scale degree {0}, expected 1..=7")]
    InvalidDegree(u8),

    /// Complexity outside {0, 1, 2}.
    #[error("invalid complexity {0}, expected 0 (triad), 1 (seventh) or 2 (ninth)")]
    InvalidComplexity(u8),

    /// A render parameter the MIDI file format cannot represent.
    #[error("invalid render setting {field} = {value}, expected {expected}")]
    InvalidRenderConfig {
        field: &'static str,
        value: u32,
        expected: &'static str,
    },

    /// I/O error while reading config or writing the MIDI file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON config.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
