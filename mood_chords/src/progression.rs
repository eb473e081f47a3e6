// Progression generation: scale choice, rhythm pattern, and degree sampling.
//
// An 8-measure progression always opens on the tonic. One of three rhythm
// patterns decides which measures are pre-filled with the tonic and which
// sampled measures carry a second chord:
//
//   pattern              pre-filled         two chords on
//   OneChordPerBar       0, 5, 7            (none)
//   TwoOneAlternation    0 (+random), 1, 5, 7   odd measure numbers
//   OneTwoAlternation    0, 2               even measure numbers
//
// (Measure numbers are 1-based; indices 0-based.) The remaining measures
// are filled left to right by `constraints::sample_degree`. A sampled
// diminished chord starts a cooldown that blocks further diminished chords
// for the next two measures.
//
// The chord quality weights from mood.rs are stored on the result but not
// used to bias degree choice.

use crate::config::GeneratorConfig;
use crate::constraints::{
    FIRST_CHORD_RULES, SECOND_CHORD_RULES, SlotContext, random_non_tonic, sample_degree,
};
use crate::error::Result;
use crate::mood::{MoodVector, QualityWeights, choose_scale, chord_quality_weights};
use crate::theory::{Chord, ChordType, Degree, Note, ScaleType, diatonic_chords};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of every progression.
pub const MEASURES: usize = 8;

/// Which measures are pre-filled and which carry two chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmPattern {
    OneChordPerBar,
    TwoOneAlternation,
    OneTwoAlternation,
}

impl RhythmPattern {
    pub const ALL: [RhythmPattern; 3] = [
        RhythmPattern::OneChordPerBar,
        RhythmPattern::TwoOneAlternation,
        RhythmPattern::OneTwoAlternation,
    ];

    pub fn random(rng: &mut impl Rng) -> RhythmPattern {
        RhythmPattern::ALL[rng.random_range(0..RhythmPattern::ALL.len())]
    }

    /// Measure indices holding the tonic before sampling starts. These are
    /// skipped by the fill loop.
    pub fn seeded_measures(self) -> &'static [usize] {
        match self {
            RhythmPattern::OneChordPerBar => &[0, 5, 7],
            RhythmPattern::TwoOneAlternation => &[0, 1, 5, 7],
            RhythmPattern::OneTwoAlternation => &[0, 2],
        }
    }

    /// Whether a sampled measure at `index` gets a second chord.
    pub fn has_second_chord(self, index: usize) -> bool {
        let number = index + 1;
        match self {
            RhythmPattern::OneChordPerBar => false,
            RhythmPattern::TwoOneAlternation => number % 2 == 1,
            RhythmPattern::OneTwoAlternation => number % 2 == 0,
        }
    }
}

/// The chords sounding in one bar, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measure {
    pub chords: Vec<Chord>,
}

impl Measure {
    pub fn last_degree(&self) -> Option<Degree> {
        self.chords.last().map(|c| c.degree)
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

/// A generated progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub key: Note,
    pub scale: ScaleType,
    pub chord_type: ChordType,
    pub pattern: RhythmPattern,
    /// Exactly `MEASURES` entries.
    pub measures: Vec<Measure>,
    /// Mood-weighted chord-quality distribution for the chosen scale.
    /// Informational: degree sampling is uniform.
    pub quality_weights: QualityWeights,
}

impl Progression {
    /// All chords in playing order.
    pub fn chords(&self) -> impl Iterator<Item = &Chord> {
        self.measures.iter().flat_map(|m| m.chords.iter())
    }

    /// Degrees per measure, e.g. `[[1], [4, 5], ...]`.
    pub fn degrees(&self) -> Vec<Vec<u8>> {
        self.measures
            .iter()
            .map(|m| m.chords.iter().map(|c| c.degree.get()).collect())
            .collect()
    }
}

/// Choose a scale for `mood`, then generate a progression in it.
pub fn create_chord_progression(
    mood: MoodVector,
    chord_type: ChordType,
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Result<Progression> {
    let scale = choose_scale(&mood, config.scale_shortlist, rng);
    generate_progression(&mood, scale, chord_type, config, rng)
}

/// Generate a progression in a fixed `scale`. `mood` only feeds the
/// recorded quality weights.
pub fn generate_progression(
    mood: &MoodVector,
    scale: ScaleType,
    chord_type: ChordType,
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Result<Progression> {
    let chords = diatonic_chords(config.key, scale, chord_type, config.voicing)?;
    let chord_at = |degree: Degree| chords[degree.index()].clone();

    let pattern = RhythmPattern::random(rng);
    log::debug!("generating {} {scale} progression, pattern {pattern:?}", config.key);

    let seeded = pattern.seeded_measures();
    let mut measures = vec![Measure::default(); MEASURES];
    for &index in seeded {
        measures[index].chords.push(chord_at(Degree::TONIC));
    }
    if pattern == RhythmPattern::TwoOneAlternation {
        measures[0].chords.push(chord_at(random_non_tonic(rng)));
    }

    let mut previous: Option<Degree> = None;
    let mut cooldown: u8 = 0;

    for (index, measure) in measures.iter_mut().enumerate() {
        cooldown = cooldown.saturating_sub(1);

        if !seeded.contains(&index) {
            let ctx = SlotContext {
                scale,
                previous,
                cooldown,
            };
            let first = sample_degree(&ctx, FIRST_CHORD_RULES, rng);
            measure.chords.push(chord_at(first));

            if pattern.has_second_chord(index) {
                let ctx = SlotContext {
                    previous: Some(first),
                    ..ctx
                };
                let second = sample_degree(&ctx, SECOND_CHORD_RULES, rng);
                measure.chords.push(chord_at(second));
            }
        }

        // The tonic never starts a cooldown, even in locrian.
        if measure
            .chords
            .iter()
            .any(|c| c.degree != Degree::TONIC && c.is_diminished())
        {
            cooldown = config.diminished_cooldown;
        }
        previous = measure.last_degree().or(previous);
    }

    Ok(Progression {
        key: config.key,
        scale,
        chord_type,
        pattern,
        measures,
        quality_weights: chord_quality_weights(mood, scale),
    })
}
