// MIDI output from progressions.
//
// Rendering happens in two steps:
// 1. `render_events`: lay chords out on an absolute tick timeline. Each
//    measure is 4 beats; its chords split it evenly (one chord = whole bar,
//    two chords = half bar each). Empty measures contribute nothing. Pitches
//    are normalized to MIDI keys here; anything unrepresentable becomes C4
//    and is reported as a `PitchWarning`.
// 2. `timeline_to_smf`: build a single-track SMF with tempo, 4/4 time
//    signature and a program change at tick 0, followed by note on/off
//    events sorted by absolute tick (offs before ons on the same tick) and
//    delta-encoded.
//
// `render_progression_to_file` serializes the whole file into memory and
// writes it with one `std::fs::write`.
//
// Uses the `midly` crate for MIDI writing.

use crate::config::{MAX_TICKS_PER_QUARTER, MIN_TEMPO_BPM, RenderConfig};
use crate::error::Result;
use crate::progression::Progression;
use crate::theory::Pitch;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::fmt;
use std::path::Path;

/// Fixed meter: 4/4.
pub const BEATS_PER_MEASURE: u32 = 4;

/// Octave used for pitches without one.
const DEFAULT_OCTAVE: i8 = 4;

/// Substitute for invalid pitches (C4).
const FALLBACK_KEY: u8 = 60;

/// A pitch that could not be rendered and was replaced with C4.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchWarning {
    /// 0-based measure index.
    pub measure: usize,
    pub pitch: String,
}

impl fmt::Display for PitchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid pitch {:?} in measure {}, defaulting to C4",
            self.pitch,
            self.measure + 1
        )
    }
}

/// One chord on the timeline: all keys start and stop together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteGroup {
    pub start_tick: u32,
    pub duration_ticks: u32,
    pub keys: Vec<u8>,
}

/// Output of `render_events`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    pub groups: Vec<NoteGroup>,
    pub warnings: Vec<PitchWarning>,
}

/// MIDI key for a pitch: no octave means octave 4, octaves 0..=9 pass
/// through, anything else (or a key above 127) is `None`.
pub fn normalize_pitch(pitch: Pitch) -> Option<u8> {
    match pitch.octave {
        None => pitch.midi_key(DEFAULT_OCTAVE),
        Some(octave) if (0..=9).contains(&octave) => pitch.midi_key(DEFAULT_OCTAVE),
        Some(_) => None,
    }
}

/// Resolution used for both the header and the event layout. In range
/// whenever `config` has passed `RenderConfig::validate`.
fn ticks_per_quarter(config: &RenderConfig) -> u16 {
    config.ticks_per_quarter.clamp(1, MAX_TICKS_PER_QUARTER)
}

/// Same as `normalize_pitch` for a textual pitch such as `"Eb"` or `"F#3"`.
pub fn normalize_pitch_str(raw: &str) -> Option<u8> {
    raw.parse::<Pitch>().ok().and_then(normalize_pitch)
}

/// Place every chord of `progression` on an absolute tick timeline.
pub fn render_events(progression: &Progression, config: &RenderConfig) -> Timeline {
    let ticks_per_measure = BEATS_PER_MEASURE * ticks_per_quarter(config) as u32;
    let mut timeline = Timeline::default();

    for (index, measure) in progression.measures.iter().enumerate() {
        if measure.is_empty() {
            continue;
        }
        let measure_start = index as u32 * ticks_per_measure;
        let duration = ticks_per_measure / measure.chords.len() as u32;

        for (slot, chord) in measure.chords.iter().enumerate() {
            let mut keys = Vec::with_capacity(chord.notes.len());
            for &pitch in &chord.notes {
                let key = match normalize_pitch(pitch) {
                    Some(key) => key,
                    None => {
                        let warning = PitchWarning {
                            measure: index,
                            pitch: pitch.to_string(),
                        };
                        log::warn!("{warning}");
                        timeline.warnings.push(warning);
                        FALLBACK_KEY
                    }
                };
                keys.push(key);
            }
            timeline.groups.push(NoteGroup {
                start_tick: measure_start + slot as u32 * duration,
                duration_ticks: duration,
                keys,
            });
        }
    }

    timeline
}

/// Build a single-track SMF from a timeline.
pub fn timeline_to_smf(timeline: &Timeline, config: &RenderConfig) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(ticks_per_quarter(config))),
    ));

    // MIDI channels are 0-based on the wire.
    let channel = u4::new(config.channel.clamp(1, 16) - 1);
    let velocity = u7::new(config.velocity.min(127));
    let tempo_microseconds = 60_000_000 / config.tempo_bpm.max(MIN_TEMPO_BPM) as u32;

    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    // 4/4: denominator as a power of two, 24 clocks per click, 8 32nds per quarter.
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
    });
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange {
                program: u7::new(config.program.min(127)),
            },
        },
    });

    // (tick, is_note_on, key). Sorting on (tick, is_note_on) puts note-offs
    // ahead of note-ons at the same tick; the sort is stable otherwise.
    let mut timed: Vec<(u32, bool, u8)> = Vec::new();
    for group in &timeline.groups {
        for &key in &group.keys {
            timed.push((group.start_tick, true, key));
            timed.push((group.start_tick + group.duration_ticks, false, key));
        }
    }
    timed.sort_by_key(|&(tick, is_on, _)| (tick, is_on));

    let mut last_event_tick: u32 = 0;
    for (tick, is_on, key) in timed {
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: velocity,
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last_event_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_event_tick = tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    smf
}

/// Render a progression to the bytes of a Standard MIDI File. Fails with
/// `InvalidRenderConfig` if the resolution or tempo cannot be encoded.
pub fn progression_to_midi(
    progression: &Progression,
    config: &RenderConfig,
) -> Result<(Vec<u8>, Vec<PitchWarning>)> {
    config.validate()?;
    let timeline = render_events(progression, config);
    let smf = timeline_to_smf(&timeline, config);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    Ok((buf, timeline.warnings))
}

/// Render and write a progression as a MIDI file. Returns any pitch
/// warnings; I/O failures are returned as errors.
pub fn render_progression_to_file(
    progression: &Progression,
    path: &Path,
    config: &RenderConfig,
) -> Result<Vec<PitchWarning>> {
    let (bytes, warnings) = progression_to_midi(progression, config)?;
    std::fs::write(path, &bytes)?;
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::QualityWeights;
    use crate::progression::{Measure, RhythmPattern};
    use crate::theory::{ChordType, Degree, Letter, Note, ScaleType, Voicing, diatonic_chords};

    fn progression(scale: ScaleType, voicing: Voicing, degrees: &[&[u8]]) -> Progression {
        let key = Note::natural(Letter::C);
        let chords = diatonic_chords(key, scale, ChordType::Triad, voicing).unwrap();
        Progression {
            key,
            scale,
            chord_type: ChordType::Triad,
            pattern: RhythmPattern::OneChordPerBar,
            measures: degrees
                .iter()
                .map(|ds| Measure {
                    chords: ds
                        .iter()
                        .map(|&d| chords[Degree::new(d).unwrap().index()].clone())
                        .collect(),
                })
                .collect(),
            quality_weights: QualityWeights::default(),
        }
    }

    #[test]
    fn test_normalize_pitch() {
        assert_eq!(normalize_pitch_str("C"), Some(60));
        assert_eq!(normalize_pitch_str("Eb"), Some(63));
        assert_eq!(normalize_pitch_str("F#3"), Some(54));
        assert_eq!(normalize_pitch_str("C0"), Some(12));
        assert_eq!(normalize_pitch_str("H4"), None);
        assert_eq!(normalize_pitch_str("C#10"), None);
        assert_eq!(normalize_pitch_str(""), None);
        assert_eq!(normalize_pitch(Pitch::new(Note::natural(Letter::C), Some(-1))), None);
    }

    #[test]
    fn test_one_chord_measures_are_whole_notes() {
        let p = progression(
            ScaleType::Major,
            Voicing::Open,
            &[&[1], &[4], &[5], &[6], &[2], &[1], &[5], &[1]],
        );
        let timeline = render_events(&p, &RenderConfig::default());
        assert_eq!(timeline.groups.len(), 8);
        assert_eq!(timeline.groups[0].start_tick, 0);
        assert_eq!(timeline.groups[1].start_tick, 512);
        for (i, group) in timeline.groups.iter().enumerate() {
            assert_eq!(group.start_tick, i as u32 * 512);
            assert_eq!(group.duration_ticks, 512);
            assert_eq!(group.keys.len(), 3);
        }
        // Open-voiced tonic: C3 E4 G3.
        assert_eq!(timeline.groups[0].keys, [48, 64, 55]);
        assert!(timeline.warnings.is_empty());
    }

    #[test]
    fn test_two_chord_measures_split_in_half() {
        let p = progression(ScaleType::Major, Voicing::Unvoiced, &[&[1, 4], &[5]]);
        let timeline = render_events(&p, &RenderConfig::default());
        let starts: Vec<(u32, u32)> = timeline
            .groups
            .iter()
            .map(|g| (g.start_tick, g.duration_ticks))
            .collect();
        assert_eq!(starts, [(0, 256), (256, 256), (512, 512)]);
        // Unvoiced notes land in octave 4.
        assert_eq!(timeline.groups[0].keys, [60, 64, 67]);
    }

    #[test]
    fn test_empty_measures_skipped() {
        let p = progression(ScaleType::Major, Voicing::Close, &[&[1], &[], &[5]]);
        let timeline = render_events(&p, &RenderConfig::default());
        assert_eq!(timeline.groups.len(), 2);
        assert_eq!(timeline.groups[1].start_tick, 1024);
    }

    #[test]
    fn test_invalid_pitch_becomes_c4_with_warning() {
        let mut p = progression(ScaleType::Major, Voicing::Close, &[&[5]]);
        p.measures[0].chords[0].notes[1].octave = Some(12);
        let timeline = render_events(&p, &RenderConfig::default());
        // G4 B12 D4: the B is out of range.
        assert_eq!(timeline.groups[0].keys, [67, 60, 62]);
        assert_eq!(timeline.warnings.len(), 1);
        assert_eq!(timeline.warnings[0].measure, 0);
        assert_eq!(timeline.warnings[0].pitch, "B12");
    }

    #[test]
    fn test_smf_layout() {
        let p = progression(ScaleType::Major, Voicing::Close, &[&[1], &[5]]);
        let config = RenderConfig::default();
        let smf = timeline_to_smf(&render_events(&p, &config), &config);
        assert_eq!(smf.tracks.len(), 1);
        let track = &smf.tracks[0];
        // 3 setup events + 2 chords * 3 tones * (on + off) + end of track.
        assert_eq!(track.len(), 3 + 12 + 1);
        assert!(matches!(
            track[0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 500_000
        ));
        assert!(matches!(
            track[1].kind,
            TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8))
        ));
        assert!(matches!(
            track[2].kind,
            TrackEventKind::Midi { message: MidiMessage::ProgramChange { .. }, .. }
        ));

        // At tick 512 the first chord's offs come before the second's ons.
        let kinds: Vec<bool> = track[3..15]
            .iter()
            .map(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }
                )
            })
            .collect();
        assert_eq!(
            kinds,
            [true, true, true, false, false, false, true, true, true, false, false, false]
        );
        assert_eq!(track[6].delta.as_int(), 512);
        assert_eq!(track[7].delta.as_int(), 0);
        assert!(matches!(track[15].kind, TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    }

    #[test]
    fn test_write_failure_is_error() {
        let p = progression(ScaleType::Major, Voicing::Open, &[&[1]]);
        let result = render_progression_to_file(
            &p,
            Path::new("/nonexistent-dir/mood_chords/out.mid"),
            &RenderConfig::default(),
        );
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }

    #[test]
    fn test_max_resolution_header_matches_layout() {
        let p = progression(ScaleType::Major, Voicing::Close, &[&[1], &[5]]);
        let config = RenderConfig {
            ticks_per_quarter: MAX_TICKS_PER_QUARTER,
            ..RenderConfig::default()
        };
        let (bytes, _) = progression_to_midi(&p, &config).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(32767)));

        let mut tick = 0u32;
        let mut onsets = Vec::new();
        for event in &smf.tracks[0] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. } = event.kind {
                onsets.push(tick);
            }
        }
        assert_eq!(onsets, [0, 0, 0, 131_068, 131_068, 131_068]);
    }

    #[test]
    fn test_unencodable_settings_rejected() {
        let p = progression(ScaleType::Major, Voicing::Open, &[&[1]]);
        for (tpq, bpm) in [(0, 120), (0x8000, 120), (40_000, 120), (128, 1), (128, 3)] {
            let config = RenderConfig {
                ticks_per_quarter: tpq,
                tempo_bpm: bpm,
                ..RenderConfig::default()
            };
            assert!(
                matches!(
                    progression_to_midi(&p, &config),
                    Err(crate::error::Error::InvalidRenderConfig { .. })
                ),
                "tpq {tpq} bpm {bpm}"
            );
        }
    }

    #[test]
    fn test_slowest_tempo_fits_tempo_event() {
        let p = progression(ScaleType::Major, Voicing::Open, &[&[1]]);
        let config = RenderConfig {
            tempo_bpm: MIN_TEMPO_BPM,
            ..RenderConfig::default()
        };
        let (bytes, _) = progression_to_midi(&p, &config).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 15_000_000
        ));
    }

    #[test]
    fn test_unvalidated_resolution_clamped_consistently() {
        // Calling the two steps directly skips validation; header and
        // layout still agree.
        let p = progression(ScaleType::Major, Voicing::Close, &[&[1], &[5]]);
        let config = RenderConfig {
            ticks_per_quarter: 40_000,
            ..RenderConfig::default()
        };
        let timeline = render_events(&p, &config);
        assert_eq!(timeline.groups[1].start_tick, 4 * 32_767);
        let smf = timeline_to_smf(&timeline, &config);
        assert_eq!(smf.header.timing, Timing::Metrical(u15::new(32_767)));
    }
}
