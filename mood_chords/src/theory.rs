// Scale and chord theory engine.
//
// Everything here works on spelled note names (letter + accidental), not on
// semitones, so the seventh chord on degree 7 of C minor comes out as
// Bb D F Ab rather than A# D F G#. The only semitone arithmetic is
// `Pitch::midi_key`, used by render.rs at the very end.
//
// This module provides:
// - Letters, accidentals, notes and pitches, with saturating sharpen/flatten
// - The 15-key major scale table (circle of fifths spellings)
// - The nine scale types with their mood profiles and chord-quality tables
// - `scale_notes`: modal rotation of a parent major scale, plus the
//   harmonic/melodic minor alterations
// - `diatonic_chords`: stacked thirds over a scale with optional open voicing
//
// Harmonic and melodic minor chords are stacked over the *natural* minor
// scale and then patched (raised third on V, and on IV for melodic minor).
// The seventh/ninth tones are not re-derived from the altered scale.
//
// Used by progression.rs (chord lookup by degree), embellish.rs (derived
// chords), mood.rs (profiles) and render.rs (MIDI key numbers).

use crate::error::{Error, Result};
use crate::mood::MoodVector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// The seven note letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Semitones of the natural letter above C.
    pub fn semitones(self) -> i8 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Letter::C => 'C',
            Letter::D => 'D',
            Letter::E => 'E',
            Letter::F => 'F',
            Letter::G => 'G',
            Letter::A => 'A',
            Letter::B => 'B',
        }
    }

    pub fn from_char(c: char) -> Option<Letter> {
        Letter::ALL.into_iter().find(|l| l.as_char() == c)
    }
}

/// Position within a letter's chromatic triple (flat, natural, sharp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    Flat,
    Natural,
    Sharp,
}

impl Accidental {
    pub fn semitone_offset(self) -> i8 {
        match self {
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
        }
    }

    /// One step up the triple. Sharp stays sharp.
    fn raised(self) -> Accidental {
        match self {
            Accidental::Flat => Accidental::Natural,
            Accidental::Natural | Accidental::Sharp => Accidental::Sharp,
        }
    }

    /// One step down the triple. Flat stays flat.
    fn lowered(self) -> Accidental {
        match self {
            Accidental::Sharp => Accidental::Natural,
            Accidental::Natural | Accidental::Flat => Accidental::Flat,
        }
    }
}

/// A spelled note name without octave, e.g. `Bb` or `F#`.
///
/// Serialized as its spelling so configs can say `"key": "Eb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note {
    pub letter: Letter,
    pub accidental: Accidental,
}

impl Note {
    pub const fn new(letter: Letter, accidental: Accidental) -> Self {
        Note { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        Note::new(letter, Accidental::Natural)
    }

    /// Raise by one step within the letter's triple. `X#` is returned
    /// unchanged: the letter never changes.
    pub fn sharpened(self) -> Note {
        Note::new(self.letter, self.accidental.raised())
    }

    /// Lower by one step within the letter's triple. `Xb` is returned
    /// unchanged.
    pub fn flattened(self) -> Note {
        Note::new(self.letter, self.accidental.lowered())
    }

    /// Semitones above C. May be -1 (`Cb`) or 12 (`B#`); callers that need a
    /// pitch class should wrap.
    pub fn semitones(self) -> i8 {
        self.letter.semitones() + self.accidental.semitone_offset()
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter.as_char(), self.accidental.symbol())
    }
}

impl FromStr for Note {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.chars();
        let letter = chars
            .next()
            .and_then(Letter::from_char)
            .ok_or_else(|| Error::InvalidNote(s.to_string()))?;
        let accidental = match chars.next() {
            None => Accidental::Natural,
            Some('b') => Accidental::Flat,
            Some('#') => Accidental::Sharp,
            Some(_) => return Err(Error::InvalidNote(s.to_string())),
        };
        if chars.next().is_some() {
            return Err(Error::InvalidNote(s.to_string()));
        }
        Ok(Note::new(letter, accidental))
    }
}

impl TryFrom<String> for Note {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Note> for String {
    fn from(note: Note) -> String {
        note.to_string()
    }
}

/// A note with an optional octave number. Unvoiced pitches (`octave: None`)
/// are placed in octave 4 when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub note: Note,
    pub octave: Option<i8>,
}

impl Pitch {
    pub fn new(note: Note, octave: Option<i8>) -> Self {
        Pitch { note, octave }
    }

    /// Sharpen the note name, keeping the octave number.
    pub fn sharpened(self) -> Pitch {
        Pitch::new(self.note.sharpened(), self.octave)
    }

    /// Flatten the note name, keeping the octave number.
    pub fn flattened(self) -> Pitch {
        Pitch::new(self.note.flattened(), self.octave)
    }

    /// MIDI key number with C4 = 60, or `None` if it falls outside 0..=127.
    /// `Cb4` is 59 and `B#4` is 72: the octave number follows the letter.
    pub fn midi_key(self, default_octave: i8) -> Option<u8> {
        let octave = self.octave.unwrap_or(default_octave) as i16;
        let key = (octave + 1) * 12 + self.note.semitones() as i16;
        u8::try_from(key).ok().filter(|&k| k <= 127)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.octave {
            Some(octave) => write!(f, "{}{}", self.note, octave),
            None => write!(f, "{}", self.note),
        }
    }
}

/// Parses `[A-G][b#]?` with an optional single octave digit.
impl FromStr for Pitch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, octave) = match s.char_indices().last() {
            Some((i, c)) if c.is_ascii_digit() => (&s[..i], c.to_digit(10).map(|d| d as i8)),
            _ => (s, None),
        };
        let note = name
            .parse::<Note>()
            .map_err(|_| Error::InvalidNote(s.to_string()))?;
        Ok(Pitch::new(note, octave))
    }
}

// ---------------------------------------------------------------------------
// Major key table
// ---------------------------------------------------------------------------

/// The 15 supported major scales, in circle-of-fifths order: naturals and
/// sharps first (C through C#), then flats (F through Cb). Modal parent
/// lookup searches in this order.
pub const MAJOR_KEYS: [[Note; 7]; 15] = {
    use Letter::*;
    const fn n(letter: Letter) -> Note {
        Note::new(letter, Accidental::Natural)
    }
    const fn s(letter: Letter) -> Note {
        Note::new(letter, Accidental::Sharp)
    }
    const fn b(letter: Letter) -> Note {
        Note::new(letter, Accidental::Flat)
    }
    [
        [n(C), n(D), n(E), n(F), n(G), n(A), n(B)],
        [n(G), n(A), n(B), n(C), n(D), n(E), s(F)],
        [n(D), n(E), s(F), n(G), n(A), n(B), s(C)],
        [n(A), n(B), s(C), n(D), n(E), s(F), s(G)],
        [n(E), s(F), s(G), n(A), n(B), s(C), s(D)],
        [n(B), s(C), s(D), n(E), s(F), s(G), s(A)],
        [s(F), s(G), s(A), n(B), s(C), s(D), s(E)],
        [s(C), s(D), s(E), s(F), s(G), s(A), s(B)],
        [n(F), n(G), n(A), b(B), n(C), n(D), n(E)],
        [b(B), n(C), n(D), b(E), n(F), n(G), n(A)],
        [b(E), n(F), n(G), b(A), b(B), n(C), n(D)],
        [b(A), b(B), n(C), b(D), b(E), n(F), n(G)],
        [b(D), b(E), n(F), b(G), b(A), b(B), n(C)],
        [b(G), b(A), b(B), b(C), b(D), b(E), n(F)],
        [b(C), b(D), b(E), b(F), b(G), b(A), b(B)],
    ]
};

/// The major scale on `tonic`, if it is one of the 15 table keys.
pub fn major_scale(tonic: Note) -> Option<[Note; 7]> {
    MAJOR_KEYS.iter().find(|notes| notes[0] == tonic).copied()
}

// ---------------------------------------------------------------------------
// Degrees, qualities, chord types
// ---------------------------------------------------------------------------

/// A 1-indexed scale position, 1..=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Degree(u8);

impl Degree {
    pub const TONIC: Degree = Degree(1);

    pub fn new(n: u8) -> Option<Degree> {
        (1..=7).contains(&n).then_some(Degree(n))
    }

    /// Degree for a 0-based scale index, wrapping past 7.
    pub fn from_index(index: usize) -> Degree {
        Degree((index % 7) as u8 + 1)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// 0-based index into a 7-element scale or chord set.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Number of scale steps between two degrees, ignoring direction.
    pub fn distance(self, other: Degree) -> u8 {
        self.0.abs_diff(other.0)
    }
}

impl TryFrom<u8> for Degree {
    type Error = Error;

    fn try_from(n: u8) -> Result<Self> {
        Degree::new(n).ok_or(Error::InvalidDegree(n))
    }
}

impl From<Degree> for u8 {
    fn from(degree: Degree) -> u8 {
        degree.0
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Triad quality of a diatonic chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
}

impl ChordQuality {
    /// Order used when building the mood-weighted quality distribution.
    pub const ALL: [ChordQuality; 3] = [
        ChordQuality::Minor,
        ChordQuality::Major,
        ChordQuality::Diminished,
    ];

    pub fn mood_profile(self) -> MoodVector {
        match self {
            ChordQuality::Minor => MoodVector::new(5.0, 0.0, 3.0),
            ChordQuality::Major => MoodVector::new(-5.0, 0.0, -3.0),
            ChordQuality::Diminished => MoodVector::new(-5.0, 2.0, 5.0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
        }
    }
}

/// How many thirds are stacked per chord. Selected by the complexity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordType {
    Triad,
    Seventh,
    Ninth,
}

impl ChordType {
    pub const ALL: [ChordType; 3] = [ChordType::Triad, ChordType::Seventh, ChordType::Ninth];

    pub fn tone_count(self) -> usize {
        match self {
            ChordType::Triad => 3,
            ChordType::Seventh => 4,
            ChordType::Ninth => 5,
        }
    }

    /// The complexity level (0, 1, 2) that selects this chord type.
    pub fn complexity(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ChordType {
    type Error = Error;

    fn try_from(complexity: u8) -> Result<Self> {
        ChordType::ALL
            .get(complexity as usize)
            .copied()
            .ok_or(Error::InvalidComplexity(complexity))
    }
}

// ---------------------------------------------------------------------------
// Scale types
// ---------------------------------------------------------------------------

/// The nine scale types the generator chooses between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleType {
    #[serde(rename = "major")]
    Major,
    #[serde(rename = "natural minor")]
    NaturalMinor,
    #[serde(rename = "harmonic minor")]
    HarmonicMinor,
    #[serde(rename = "melodic minor")]
    MelodicMinor,
    #[serde(rename = "dorian")]
    Dorian,
    #[serde(rename = "phrygian")]
    Phrygian,
    #[serde(rename = "lydian")]
    Lydian,
    #[serde(rename = "mixolydian")]
    Mixolydian,
    #[serde(rename = "locrian")]
    Locrian,
}

impl ScaleType {
    /// Enumeration order; also the tie-break order when ranking by mood.
    pub const ALL: [ScaleType; 9] = [
        ScaleType::Major,
        ScaleType::NaturalMinor,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::Locrian,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::NaturalMinor => "natural minor",
            ScaleType::HarmonicMinor => "harmonic minor",
            ScaleType::MelodicMinor => "melodic minor",
            ScaleType::Dorian => "dorian",
            ScaleType::Phrygian => "phrygian",
            ScaleType::Lydian => "lydian",
            ScaleType::Mixolydian => "mixolydian",
            ScaleType::Locrian => "locrian",
        }
    }

    /// Where this scale sits on the three mood axes
    /// (sad-cheerful, mysterious-mundane, tense-calm).
    pub fn mood_profile(self) -> MoodVector {
        match self {
            ScaleType::Major => MoodVector::new(-4.0, 0.0, -2.0),
            ScaleType::NaturalMinor => MoodVector::new(3.0, 2.0, 3.0),
            ScaleType::HarmonicMinor => MoodVector::new(4.0, 3.0, 3.0),
            ScaleType::MelodicMinor => MoodVector::new(4.0, 4.0, 3.0),
            ScaleType::Dorian => MoodVector::new(2.0, 5.0, -3.0),
            ScaleType::Phrygian => MoodVector::new(4.0, 3.0, 4.0),
            ScaleType::Lydian => MoodVector::new(-5.0, 1.0, -2.0),
            ScaleType::Mixolydian => MoodVector::new(-3.0, 1.0, 0.0),
            ScaleType::Locrian => MoodVector::new(5.0, 4.0, 5.0),
        }
    }

    /// Triad quality on each degree, 1 through 7.
    pub fn chord_qualities(self) -> [ChordQuality; 7] {
        use ChordQuality::{Diminished as Dim, Major as Maj, Minor as Min};
        match self {
            ScaleType::Major => [Maj, Min, Min, Maj, Maj, Min, Dim],
            ScaleType::NaturalMinor => [Min, Dim, Maj, Min, Min, Maj, Maj],
            ScaleType::HarmonicMinor => [Min, Dim, Maj, Min, Maj, Maj, Maj],
            ScaleType::MelodicMinor => [Min, Min, Maj, Maj, Maj, Maj, Maj],
            ScaleType::Dorian => [Min, Min, Maj, Maj, Min, Dim, Maj],
            ScaleType::Phrygian => [Min, Maj, Maj, Min, Dim, Maj, Min],
            ScaleType::Lydian => [Maj, Maj, Min, Dim, Maj, Min, Min],
            ScaleType::Mixolydian => [Maj, Min, Dim, Maj, Min, Maj, Maj],
            ScaleType::Locrian => [Dim, Maj, Min, Min, Maj, Maj, Min],
        }
    }

    pub fn quality(self, degree: Degree) -> ChordQuality {
        self.chord_qualities()[degree.index()]
    }

    /// Index of the mode's tonic within its parent major scale. `None` for
    /// major itself, which is a direct table lookup.
    fn modal_shift(self) -> Option<usize> {
        match self {
            ScaleType::Major => None,
            ScaleType::Dorian => Some(1),
            ScaleType::Phrygian => Some(2),
            ScaleType::Lydian => Some(3),
            ScaleType::Mixolydian => Some(4),
            ScaleType::Locrian => Some(6),
            ScaleType::NaturalMinor | ScaleType::HarmonicMinor | ScaleType::MelodicMinor => {
                Some(5)
            }
        }
    }

    /// The scale whose notes chords are stacked over.
    fn stacking_scale(self) -> ScaleType {
        match self {
            ScaleType::HarmonicMinor | ScaleType::MelodicMinor => ScaleType::NaturalMinor,
            other => other,
        }
    }

    /// Chord indices whose third is raised after stacking.
    fn raised_thirds(self) -> &'static [usize] {
        match self {
            ScaleType::HarmonicMinor => &[4],
            ScaleType::MelodicMinor => &[3, 4],
            _ => &[],
        }
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts the display names, case-insensitively, with `_` or `-` in place
/// of the space (`natural_minor`, `Harmonic-Minor`).
impl FromStr for ScaleType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        ScaleType::ALL
            .into_iter()
            .find(|scale| scale.name() == normalized)
            .ok_or_else(|| Error::UnknownScale(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Scale notes and diatonic chords
// ---------------------------------------------------------------------------

/// The seven notes of `scale` starting on `key`.
///
/// Modes are found by locating the major scale that has `key` at the mode's
/// shift index and rotating it. Harmonic minor raises the 7th; melodic minor
/// raises the 6th and 7th.
pub fn scale_notes(key: Note, scale: ScaleType) -> Result<[Note; 7]> {
    let unsupported = || Error::UnsupportedKey { key, scale };

    let Some(shift) = scale.modal_shift() else {
        return major_scale(key).ok_or_else(unsupported);
    };

    let parent = MAJOR_KEYS
        .iter()
        .find(|notes| notes[shift] == key)
        .ok_or_else(unsupported)?;
    let mut notes: [Note; 7] = std::array::from_fn(|i| parent[(shift + i) % 7]);

    match scale {
        ScaleType::HarmonicMinor => {
            notes[6] = notes[6].sharpened();
        }
        ScaleType::MelodicMinor => {
            notes[5] = notes[5].sharpened();
            notes[6] = notes[6].sharpened();
        }
        _ => {}
    }

    Ok(notes)
}

/// Octave placement for chord tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Voicing {
    /// Open position: base octave 3 with selected tones raised to 4.
    #[default]
    Open,
    /// Every tone in octave 4.
    Close,
    /// Bare note names; the renderer places them in octave 4.
    Unvoiced,
}

impl Voicing {
    /// Octave of tone `tone` in the chord rooted on scale index `chord`.
    pub fn octave(self, chord_type: ChordType, chord: usize, tone: usize) -> Option<i8> {
        match self {
            Voicing::Unvoiced => None,
            Voicing::Close => Some(4),
            Voicing::Open => {
                let raised = match chord_type {
                    ChordType::Triad => {
                        matches!((chord, tone), (0..=2, 1) | (3..=4, 0) | (5..=6, 2))
                    }
                    ChordType::Seventh => matches!(
                        (chord, tone),
                        (0 | 5 | 6, 1 | 3) | (1 | 2, 2 | 3) | (3 | 4, 0 | 2)
                    ),
                    ChordType::Ninth => false,
                };
                Some(if raised { 4 } else { 3 })
            }
        }
    }
}

/// A chord rooted on a scale degree. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    pub degree: Degree,
    pub notes: Vec<Pitch>,
    pub quality: ChordQuality,
}

impl Chord {
    pub fn is_diminished(&self) -> bool {
        self.quality == ChordQuality::Diminished
    }

    /// Roman numeral: upper case for major, lower case for minor, lower case
    /// with `°` for diminished.
    pub fn roman(&self) -> String {
        const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];
        let numeral = NUMERALS[self.degree.index()];
        match self.quality {
            ChordQuality::Major => numeral.to_string(),
            ChordQuality::Minor => numeral.to_lowercase(),
            ChordQuality::Diminished => format!("{}°", numeral.to_lowercase()),
        }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.roman())?;
        for (i, pitch) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{pitch}")?;
        }
        f.write_str("]")
    }
}

/// The seven diatonic chords of `scale` on `key`, one per degree.
///
/// Tone `j` of the chord on scale index `i` is scale note `(i + 2j) mod 7`.
pub fn diatonic_chords(
    key: Note,
    scale: ScaleType,
    chord_type: ChordType,
    voicing: Voicing,
) -> Result<Vec<Chord>> {
    let notes = scale_notes(key, scale.stacking_scale())?;
    let qualities = scale.chord_qualities();

    let mut chords: Vec<Chord> = (0..7)
        .map(|i| Chord {
            degree: Degree::from_index(i),
            notes: (0..chord_type.tone_count())
                .map(|j| Pitch::new(notes[(i + 2 * j) % 7], voicing.octave(chord_type, i, j)))
                .collect(),
            quality: qualities[i],
        })
        .collect();

    for &index in scale.raised_thirds() {
        let third = &mut chords[index].notes[1];
        *third = third.sharpened();
    }

    Ok(chords)
}
