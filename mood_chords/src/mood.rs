// Mood-to-distribution mapping.
//
// The user's three sliders form a target point in mood space. Every scale
// type and chord quality has a fixed profile point (see theory.rs). Closeness
// is measured with the L1 deviation and turned into an "affinity" score
// `1 - deviation / 30`. Affinities are not clamped and may go negative for
// far-away targets; they are only ever compared or normalized.
//
// Scale choice: rank all nine scales by affinity and pick uniformly among the
// top few (the shortlist width is a config option, default 2).
//
// Chord-quality weights: affinities of the qualities present in the chosen
// scale, normalized by their sum. These are recorded on the progression but
// degree sampling in progression.rs does not read them; degree choice is
// uniform over 2..7.

use crate::theory::{ChordQuality, ScaleType};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Deviation at which affinity reaches zero.
const AFFINITY_SCALE: f64 = 30.0;

/// A point on the three mood axes. Positive `sad_cheerful` is sadder,
/// positive `mysterious_mundane` more mysterious, positive `tense_calm` more
/// tense (matching the scale profiles; locrian sits near +5 on all three).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MoodVector {
    pub sad_cheerful: f64,
    pub mysterious_mundane: f64,
    pub tense_calm: f64,
}

impl MoodVector {
    pub const fn new(sad_cheerful: f64, mysterious_mundane: f64, tense_calm: f64) -> Self {
        MoodVector {
            sad_cheerful,
            mysterious_mundane,
            tense_calm,
        }
    }

    /// Sum of absolute per-axis differences.
    pub fn deviation(&self, other: &MoodVector) -> f64 {
        (self.sad_cheerful - other.sad_cheerful).abs()
            + (self.mysterious_mundane - other.mysterious_mundane).abs()
            + (self.tense_calm - other.tense_calm).abs()
    }

    /// `1 - deviation / 30`. Unclamped.
    pub fn affinity(&self, profile: &MoodVector) -> f64 {
        1.0 - self.deviation(profile) / AFFINITY_SCALE
    }
}

/// All nine scales with their affinity to `target`, best first. Ties keep
/// enumeration order.
pub fn rank_scales(target: &MoodVector) -> Vec<(ScaleType, f64)> {
    let mut ranked: Vec<(ScaleType, f64)> = ScaleType::ALL
        .iter()
        .map(|&scale| (scale, target.affinity(&scale.mood_profile())))
        .collect();
    // sort_by is stable, which gives the enumeration-order tie break.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Pick uniformly among the `shortlist` best-matching scales. The width is
/// clamped to 1..=9.
pub fn choose_scale(target: &MoodVector, shortlist: usize, rng: &mut impl Rng) -> ScaleType {
    let ranked = rank_scales(target);
    let width = shortlist.clamp(1, ranked.len());
    ranked[rng.random_range(0..width)].0
}

/// Normalized mood affinity per chord quality present in a scale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityWeights(pub Vec<(ChordQuality, f64)>);

impl QualityWeights {
    pub fn get(&self, quality: ChordQuality) -> Option<f64> {
        self.0.iter().find(|(q, _)| *q == quality).map(|&(_, w)| w)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ChordQuality, f64)> {
        self.0.iter()
    }
}

/// Affinity of each quality that occurs at least once in `scale`, divided by
/// the sum of those affinities. Absent qualities are omitted.
pub fn chord_quality_weights(target: &MoodVector, scale: ScaleType) -> QualityWeights {
    let qualities = scale.chord_qualities();
    let raw: Vec<(ChordQuality, f64)> = ChordQuality::ALL
        .iter()
        .filter(|q| qualities.contains(q))
        .map(|&q| (q, target.affinity(&q.mood_profile())))
        .collect();

    let total: f64 = raw.iter().map(|(_, p)| p).sum();
    QualityWeights(raw.into_iter().map(|(q, p)| (q, p / total)).collect())
}
