// Chord embellishments derived from a diatonic chord set.
//
// Three families of non-diatonic color chords, each defined as a fixed table
// of "take tone T of diatonic chord C, optionally sharpened or flattened":
//
// - Secondary dominants: a diatonic chord with its third (and for vii° also
//   its fifth) raised in major-family scales, or lowered in minor-family ones.
// - Secondary leading-tone chords: diminished, diminished seventh and
//   half-diminished chords built from chord roots, one set per target degree
//   (ii..vi in major, III..VII in minor).
// - Chromatic mediants: third-related major/minor chords. For seventh and
//   ninth chord types the upper tones are borrowed from a diatonic chord.
//
// Spelling alterations use the saturating `Pitch::sharpened`/`flattened`, so
// an already-flat note stays flat. Octaves are carried over from the source
// tones untouched.
//
// These are not used by progression.rs; the CLI lists them on request.

use crate::error::Result;
use crate::theory::{
    Chord, ChordQuality, ChordType, Degree, Note, Pitch, ScaleType, Voicing, diatonic_chords,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which table branch a scale uses: major when its tonic triad is major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleFamily {
    Major,
    Minor,
}

impl ScaleFamily {
    pub fn of(scale: ScaleType) -> ScaleFamily {
        match scale.quality(Degree::TONIC) {
            ChordQuality::Major => ScaleFamily::Major,
            ChordQuality::Minor | ChordQuality::Diminished => ScaleFamily::Minor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivedKind {
    SecondaryDominant,
    LeadingToneDiminished,
    LeadingToneDiminishedSeventh,
    LeadingToneHalfDiminished,
    MediantMajor,
    MediantMinor,
}

/// A non-diatonic chord together with the degree it relates to: the
/// altered degree for dominants and mediants, the resolution target for
/// leading-tone chords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedChord {
    pub kind: DerivedKind,
    pub degree: Degree,
    pub notes: Vec<Pitch>,
}

impl fmt::Display for DerivedChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({}) [", self.kind, self.degree)?;
        for (i, pitch) in self.notes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{pitch}")?;
        }
        f.write_str("]")
    }
}

#[derive(Debug, Clone, Copy)]
enum Shift {
    Keep,
    Up,
    Down,
}

impl Shift {
    fn apply(self, pitch: Pitch) -> Pitch {
        match self {
            Shift::Keep => pitch,
            Shift::Up => pitch.sharpened(),
            Shift::Down => pitch.flattened(),
        }
    }
}

/// Tone `.1` of diatonic chord index `.0`, shifted by `.2`.
#[derive(Debug, Clone, Copy)]
struct ToneRef(usize, usize, Shift);

impl ToneRef {
    fn resolve(self, chords: &[Chord]) -> Pitch {
        self.2.apply(chords[self.0].notes[self.1])
    }
}

const fn root(chord: usize, shift: Shift) -> ToneRef {
    ToneRef(chord, 0, shift)
}

use Shift::{Down, Keep, Up};

// ---------------------------------------------------------------------------
// Secondary dominants
// ---------------------------------------------------------------------------

/// (chord index, [(tone index, shift)]).
type DominantSpec = (usize, &'static [(usize, Shift)]);

const DOMINANTS_MAJOR: &[DominantSpec] = &[
    (1, &[(1, Up)]),
    (2, &[(1, Up)]),
    (5, &[(1, Up)]),
    (6, &[(1, Up), (2, Up)]),
];

const DOMINANTS_MINOR: &[DominantSpec] = &[
    (5, &[(1, Down)]),
    (6, &[(1, Down)]),
    (1, &[(2, Down)]),
    (2, &[(1, Down)]),
];

/// Secondary dominants from a 7-chord diatonic set. All chord tones are
/// kept; only the listed ones are altered.
pub fn secondary_dominants(chords: &[Chord], family: ScaleFamily) -> Vec<DerivedChord> {
    let table = match family {
        ScaleFamily::Major => DOMINANTS_MAJOR,
        ScaleFamily::Minor => DOMINANTS_MINOR,
    };
    table
        .iter()
        .map(|&(index, alterations)| {
            let mut notes = chords[index].notes.clone();
            for &(tone, shift) in alterations {
                notes[tone] = shift.apply(notes[tone]);
            }
            DerivedChord {
                kind: DerivedKind::SecondaryDominant,
                degree: Degree::from_index(index),
                notes,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Secondary leading-tone chords
// ---------------------------------------------------------------------------

struct LeadingToneSpec {
    target: usize,
    triad: [ToneRef; 3],
    diminished_seventh: ToneRef,
    half_diminished_seventh: ToneRef,
}

const LEADING_TONES_MAJOR: &[LeadingToneSpec] = &[
    LeadingToneSpec {
        target: 1,
        triad: [root(0, Up), root(2, Keep), root(4, Keep)],
        diminished_seventh: root(6, Down),
        half_diminished_seventh: root(6, Keep),
    },
    LeadingToneSpec {
        target: 2,
        triad: [root(1, Up), root(3, Up), root(5, Keep)],
        diminished_seventh: root(0, Keep),
        half_diminished_seventh: root(0, Up),
    },
    LeadingToneSpec {
        target: 3,
        triad: [root(2, Keep), root(4, Keep), root(6, Down)],
        diminished_seventh: root(1, Down),
        half_diminished_seventh: root(1, Keep),
    },
    LeadingToneSpec {
        target: 4,
        triad: [root(3, Up), root(5, Keep), root(0, Keep)],
        diminished_seventh: root(2, Down),
        half_diminished_seventh: root(2, Keep),
    },
    LeadingToneSpec {
        target: 5,
        triad: [root(4, Up), root(6, Keep), root(1, Keep)],
        diminished_seventh: root(3, Keep),
        half_diminished_seventh: root(3, Up),
    },
];

const LEADING_TONES_MINOR: &[LeadingToneSpec] = &[
    LeadingToneSpec {
        target: 2,
        triad: [root(1, Keep), root(3, Keep), root(5, Keep)],
        diminished_seventh: root(0, Down),
        half_diminished_seventh: root(0, Keep),
    },
    LeadingToneSpec {
        target: 3,
        triad: [root(2, Up), root(4, Keep), root(6, Down)],
        diminished_seventh: root(1, Down),
        half_diminished_seventh: root(1, Keep),
    },
    LeadingToneSpec {
        target: 4,
        triad: [root(3, Up), root(5, Up), root(0, Keep)],
        diminished_seventh: root(2, Keep),
        half_diminished_seventh: root(2, Up),
    },
    LeadingToneSpec {
        target: 5,
        triad: [root(4, Keep), root(6, Keep), root(1, Down)],
        diminished_seventh: root(3, Down),
        half_diminished_seventh: root(3, Keep),
    },
    LeadingToneSpec {
        target: 6,
        triad: [root(5, Up), root(0, Keep), root(2, Keep)],
        diminished_seventh: root(4, Down),
        half_diminished_seventh: root(4, Keep),
    },
];

/// For each target degree: the diminished triad, diminished seventh and
/// half-diminished seventh leading into it, in that order.
pub fn secondary_leading_tones(chords: &[Chord], family: ScaleFamily) -> Vec<DerivedChord> {
    let table = match family {
        ScaleFamily::Major => LEADING_TONES_MAJOR,
        ScaleFamily::Minor => LEADING_TONES_MINOR,
    };
    let mut out = Vec::with_capacity(table.len() * 3);
    for spec in table {
        let degree = Degree::from_index(spec.target);
        let triad: Vec<Pitch> = spec.triad.iter().map(|t| t.resolve(chords)).collect();
        let with = |extra: ToneRef| {
            let mut notes = triad.clone();
            notes.push(extra.resolve(chords));
            notes
        };
        out.push(DerivedChord {
            kind: DerivedKind::LeadingToneDiminished,
            degree,
            notes: triad.clone(),
        });
        out.push(DerivedChord {
            kind: DerivedKind::LeadingToneDiminishedSeventh,
            degree,
            notes: with(spec.diminished_seventh),
        });
        out.push(DerivedChord {
            kind: DerivedKind::LeadingToneHalfDiminished,
            degree,
            notes: with(spec.half_diminished_seventh),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Chromatic mediants
// ---------------------------------------------------------------------------

struct MediantSpec {
    kind: DerivedKind,
    degree: usize,
    triad: [ToneRef; 3],
    /// Diatonic chord whose 7th/9th tones are appended for larger chord types.
    upper_tones_from: usize,
}

const MEDIANTS_MAJOR: &[MediantSpec] = &[
    MediantSpec {
        kind: DerivedKind::MediantMajor,
        degree: 2,
        triad: [ToneRef(2, 0, Keep), ToneRef(2, 1, Up), ToneRef(2, 2, Keep)],
        upper_tones_from: 2,
    },
    MediantSpec {
        kind: DerivedKind::MediantMajor,
        degree: 5,
        triad: [root(5, Down), root(0, Keep), root(2, Down)],
        upper_tones_from: 5,
    },
    MediantSpec {
        kind: DerivedKind::MediantMinor,
        degree: 5,
        triad: [root(5, Down), root(0, Down), root(2, Down)],
        upper_tones_from: 5,
    },
    MediantSpec {
        kind: DerivedKind::MediantMajor,
        degree: 5,
        triad: [ToneRef(5, 0, Keep), ToneRef(5, 1, Up), ToneRef(5, 2, Keep)],
        upper_tones_from: 5,
    },
    MediantSpec {
        kind: DerivedKind::MediantMajor,
        degree: 2,
        triad: [root(2, Down), root(4, Keep), root(6, Down)],
        upper_tones_from: 2,
    },
    MediantSpec {
        kind: DerivedKind::MediantMinor,
        degree: 2,
        triad: [root(2, Down), root(4, Down), root(6, Down)],
        upper_tones_from: 2,
    },
];

const MEDIANTS_MINOR: &[MediantSpec] = &[
    MediantSpec {
        kind: DerivedKind::MediantMinor,
        degree: 2,
        triad: [ToneRef(2, 0, Keep), ToneRef(2, 1, Down), ToneRef(2, 2, Keep)],
        upper_tones_from: 2,
    },
    MediantSpec {
        kind: DerivedKind::MediantMinor,
        degree: 5,
        triad: [ToneRef(5, 0, Keep), ToneRef(5, 1, Down), ToneRef(5, 2, Keep)],
        upper_tones_from: 5,
    },
];

/// Chromatic mediants. For sevenths and ninths, tones 4 and 5 come from
/// the diatonic chord named in the table (when `chords` has them).
pub fn chromatic_mediants(
    chords: &[Chord],
    family: ScaleFamily,
    chord_type: ChordType,
) -> Vec<DerivedChord> {
    let table = match family {
        ScaleFamily::Major => MEDIANTS_MAJOR,
        ScaleFamily::Minor => MEDIANTS_MINOR,
    };
    let upper = chord_type.tone_count() - 3;
    table
        .iter()
        .map(|spec| {
            let mut notes: Vec<Pitch> = spec.triad.iter().map(|t| t.resolve(chords)).collect();
            notes.extend(
                chords[spec.upper_tones_from]
                    .notes
                    .iter()
                    .skip(3)
                    .take(upper)
                    .copied(),
            );
            DerivedChord {
                kind: spec.kind,
                degree: Degree::from_index(spec.degree),
                notes,
            }
        })
        .collect()
}

/// Every embellishment for a key/scale: secondary dominants and leading-tone
/// chords over the triads, mediants over `chord_type` chords.
pub fn all_embellishments(
    key: Note,
    scale: ScaleType,
    chord_type: ChordType,
    voicing: Voicing,
) -> Result<Vec<DerivedChord>> {
    let family = ScaleFamily::of(scale);
    let triads = diatonic_chords(key, scale, ChordType::Triad, voicing)?;
    let full = diatonic_chords(key, scale, chord_type, voicing)?;

    let mut out = secondary_dominants(&triads, family);
    out.extend(secondary_leading_tones(&triads, family));
    out.extend(chromatic_mediants(&full, family, chord_type));
    Ok(out)
}
