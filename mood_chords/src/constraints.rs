// Degree constraints for progression sampling.
//
// Non-tonic chords are chosen by rejection sampling: draw a degree uniformly
// from 2..=7, and redraw until every rule in the active rule set accepts it.
// Each rule is a named, independently testable predicate over the candidate
// degree and a small context (scale, previous degree, diminished cooldown).
//
// Rule sets:
// - first chord of a measure: cooldown, no repeat, no forbidden transition
// - second chord of a measure: the same, plus diminished chords only within
//   two scale steps of the first chord
//
// Every (scale, context) combination leaves at least one of the six degrees
// open, so the sampling loop always terminates; `has_candidate` exposes that
// check for the tests.

use crate::theory::{ChordQuality, Degree, ScaleType};
use rand::Rng;

/// Degree-to-degree moves that are never generated, per scale.
pub const FORBIDDEN_TRANSITIONS: &[(ScaleType, u8, u8)] = &[
    (ScaleType::HarmonicMinor, 2, 4),
    (ScaleType::MelodicMinor, 2, 4),
];

pub fn is_forbidden_transition(scale: ScaleType, from: Degree, to: Degree) -> bool {
    FORBIDDEN_TRANSITIONS
        .iter()
        .any(|&(s, f, t)| s == scale && f == from.get() && t == to.get())
}

/// What a rule gets to look at when judging a candidate degree.
#[derive(Debug, Clone, Copy)]
pub struct SlotContext {
    pub scale: ScaleType,
    /// Degree of the chord placed immediately before this slot.
    pub previous: Option<Degree>,
    /// Measures left before another diminished chord may be placed.
    pub cooldown: u8,
}

/// A single accept/reject predicate on a candidate degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeRule {
    /// No diminished chord while the cooldown is running.
    DiminishedCooldown,
    /// Never repeat the previous chord's degree.
    RepeatedDegree,
    /// No move listed in `FORBIDDEN_TRANSITIONS`.
    ForbiddenTransition,
    /// A diminished chord must be at most two steps from the previous chord.
    LeapIntoDiminished,
}

pub const FIRST_CHORD_RULES: &[DegreeRule] = &[
    DegreeRule::DiminishedCooldown,
    DegreeRule::RepeatedDegree,
    DegreeRule::ForbiddenTransition,
];

pub const SECOND_CHORD_RULES: &[DegreeRule] = &[
    DegreeRule::DiminishedCooldown,
    DegreeRule::RepeatedDegree,
    DegreeRule::ForbiddenTransition,
    DegreeRule::LeapIntoDiminished,
];

impl DegreeRule {
    pub fn allows(self, ctx: &SlotContext, candidate: Degree) -> bool {
        let diminished = ctx.scale.quality(candidate) == ChordQuality::Diminished;
        match self {
            DegreeRule::DiminishedCooldown => !(diminished && ctx.cooldown > 0),
            DegreeRule::RepeatedDegree => ctx.previous != Some(candidate),
            DegreeRule::ForbiddenTransition => ctx
                .previous
                .is_none_or(|prev| !is_forbidden_transition(ctx.scale, prev, candidate)),
            DegreeRule::LeapIntoDiminished => {
                !diminished || ctx.previous.is_none_or(|prev| prev.distance(candidate) <= 2)
            }
        }
    }
}

/// True if `candidate` passes every rule in `rules`.
pub fn satisfies(ctx: &SlotContext, rules: &[DegreeRule], candidate: Degree) -> bool {
    rules.iter().all(|rule| rule.allows(ctx, candidate))
}

/// Whether any non-tonic degree passes `rules`.
pub fn has_candidate(ctx: &SlotContext, rules: &[DegreeRule]) -> bool {
    (2..=7)
        .filter_map(Degree::new)
        .any(|d| satisfies(ctx, rules, d))
}

/// A uniformly random degree in 2..=7.
pub fn random_non_tonic(rng: &mut impl Rng) -> Degree {
    Degree::from_index(rng.random_range(1..7))
}

/// Draw non-tonic degrees until one passes every rule.
pub fn sample_degree(ctx: &SlotContext, rules: &[DegreeRule], rng: &mut impl Rng) -> Degree {
    loop {
        let candidate = random_non_tonic(rng);
        if satisfies(ctx, rules, candidate) {
            return candidate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn deg(n: u8) -> Degree {
        Degree::new(n).unwrap()
    }

    fn ctx(scale: ScaleType, previous: Option<u8>, cooldown: u8) -> SlotContext {
        SlotContext {
            scale,
            previous: previous.map(deg),
            cooldown,
        }
    }

    #[test]
    fn test_cooldown_blocks_only_diminished() {
        let c = ctx(ScaleType::Major, Some(1), 2);
        assert!(!DegreeRule::DiminishedCooldown.allows(&c, deg(7)));
        assert!(DegreeRule::DiminishedCooldown.allows(&c, deg(5)));
        let idle = ctx(ScaleType::Major, Some(1), 0);
        assert!(DegreeRule::DiminishedCooldown.allows(&idle, deg(7)));
    }

    #[test]
    fn test_repeated_degree() {
        let c = ctx(ScaleType::Dorian, Some(4), 0);
        assert!(!DegreeRule::RepeatedDegree.allows(&c, deg(4)));
        assert!(DegreeRule::RepeatedDegree.allows(&c, deg(5)));
        assert!(DegreeRule::RepeatedDegree.allows(&ctx(ScaleType::Dorian, None, 0), deg(4)));
    }

    #[test]
    fn test_forbidden_transition() {
        for scale in [ScaleType::MelodicMinor, ScaleType::HarmonicMinor] {
            let c = ctx(scale, Some(2), 0);
            assert!(!DegreeRule::ForbiddenTransition.allows(&c, deg(4)));
            assert!(DegreeRule::ForbiddenTransition.allows(&c, deg(5)));
            // Only 2 -> 4, not 4 -> 2.
            assert!(DegreeRule::ForbiddenTransition.allows(&ctx(scale, Some(4), 0), deg(2)));
        }
        let major = ctx(ScaleType::Major, Some(2), 0);
        assert!(DegreeRule::ForbiddenTransition.allows(&major, deg(4)));
    }

    #[test]
    fn test_leap_into_diminished() {
        // Major: vii° is degree 7.
        assert!(DegreeRule::LeapIntoDiminished.allows(&ctx(ScaleType::Major, Some(5), 0), deg(7)));
        assert!(!DegreeRule::LeapIntoDiminished.allows(&ctx(ScaleType::Major, Some(4), 0), deg(7)));
        assert!(DegreeRule::LeapIntoDiminished.allows(&ctx(ScaleType::Major, Some(2), 0), deg(6)));
    }

    #[test]
    fn test_every_context_has_a_candidate() {
        for scale in ScaleType::ALL {
            for previous in (1..=7).map(Some).chain([None]) {
                for cooldown in [0, 1, 3] {
                    let c = ctx(scale, previous, cooldown);
                    assert!(has_candidate(&c, FIRST_CHORD_RULES), "{scale} {previous:?} {cooldown}");
                    assert!(has_candidate(&c, SECOND_CHORD_RULES), "{scale} {previous:?} {cooldown}");
                }
            }
        }
    }

    #[test]
    fn test_sample_degree_respects_rules() {
        let mut rng = StdRng::seed_from_u64(99);
        for scale in ScaleType::ALL {
            for previous in 1..=7 {
                let c = ctx(scale, Some(previous), 3);
                for _ in 0..50 {
                    let d = sample_degree(&c, SECOND_CHORD_RULES, &mut rng);
                    assert!((2..=7).contains(&d.get()));
                    assert_ne!(d.get(), previous);
                    assert_ne!(scale.quality(d), ChordQuality::Diminished);
                    assert!(!is_forbidden_transition(scale, deg(previous), d));
                }
            }
        }
    }

    #[test]
    fn test_random_non_tonic_covers_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 8];
        for _ in 0..500 {
            seen[random_non_tonic(&mut rng).get() as usize] = true;
        }
        assert!(!seen[0] && !seen[1]);
        assert!(seen[2..].iter().all(|&s| s));
    }
}
