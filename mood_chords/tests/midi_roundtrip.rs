// End-to-end tests for MIDI output.
//
// Each test generates a progression with a seeded RNG, writes it to a real
// file under the system temp directory, reads the file back, and parses it
// with midly to check the header, the tick-0 setup events, and that every
// chord starts on the tick its measure and slot call for.

use std::collections::BTreeSet;
use std::path::PathBuf;

use midly::num::u15;
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use mood_chords::config::{GeneratorConfig, RenderConfig};
use mood_chords::mood::MoodVector;
use mood_chords::progression::{Progression, create_chord_progression};
use mood_chords::render::render_progression_to_file;
use mood_chords::theory::{ChordType, Voicing};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("mood_chords_{}_{}.mid", name, std::process::id()))
}

fn generate(seed: u64, chord_type: ChordType, config: &GeneratorConfig) -> Progression {
    let mut rng = StdRng::seed_from_u64(seed);
    create_chord_progression(MoodVector::new(-2.0, 1.0, -1.0), chord_type, config, &mut rng)
        .unwrap()
}

/// Write to a temp file and read the bytes back. The caller parses them,
/// since `Smf` borrows from the buffer.
fn write_and_read(progression: &Progression, name: &str, config: &RenderConfig) -> Vec<u8> {
    let path = temp_path(name);
    let warnings = render_progression_to_file(progression, &path, config).unwrap();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    bytes
}

/// Absolute tick of every note-on in the first track.
fn note_on_ticks(smf: &Smf) -> Vec<(u32, u8, u8)> {
    let mut tick = 0u32;
    let mut out = Vec::new();
    for event in &smf.tracks[0] {
        tick += event.delta.as_int();
        if let TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } = event.kind
        {
            out.push((tick, key.as_int(), vel.as_int()));
        }
    }
    out
}

#[test]
fn test_header_and_setup_events() {
    let progression = generate(7, ChordType::Triad, &GeneratorConfig::default());
    let bytes = write_and_read(&progression, "header", &RenderConfig::default());
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.header.format, Format::SingleTrack);
    match smf.header.timing {
        Timing::Metrical(tpq) => assert_eq!(tpq.as_int(), 128),
        other => panic!("unexpected timing {other:?}"),
    }
    assert_eq!(smf.tracks.len(), 1);

    let track = &smf.tracks[0];
    let mut saw_tempo = false;
    let mut saw_meter = false;
    let mut saw_program = false;
    for event in track.iter().take_while(|e| e.delta.as_int() == 0).take(3) {
        match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => {
                assert_eq!(60_000_000 / t.as_int(), 120);
                saw_tempo = true;
            }
            TrackEventKind::Meta(MetaMessage::TimeSignature(num, denom_pow, _, _)) => {
                assert_eq!((num, 1u8 << denom_pow), (4, 4));
                saw_meter = true;
            }
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange { program },
            } => {
                // One-based channel 1 is 0 on the wire.
                assert_eq!(channel.as_int(), 0);
                assert_eq!(program.as_int(), 1);
                saw_program = true;
            }
            _ => {}
        }
    }
    assert!(saw_tempo && saw_meter && saw_program);
    assert!(matches!(
        track.last().map(|e| e.kind),
        Some(TrackEventKind::Meta(MetaMessage::EndOfTrack))
    ));
}

#[test]
fn test_chord_onsets_follow_measures() {
    let config = RenderConfig::default();
    for seed in 0..20 {
        let progression = generate(seed, ChordType::Seventh, &GeneratorConfig::default());
        let bytes = write_and_read(&progression, &format!("onsets_{seed}"), &config);
        let smf = Smf::parse(&bytes).unwrap();
        let ons = note_on_ticks(&smf);

        let total_tones: usize = progression.chords().map(|c| c.notes.len()).sum();
        assert_eq!(ons.len(), total_tones);
        assert!(ons.iter().all(|&(_, _, vel)| vel == 100));

        let mut expected = BTreeSet::new();
        for (i, measure) in progression.measures.iter().enumerate() {
            let len = measure.chords.len() as u32;
            for slot in 0..len {
                expected.insert(i as u32 * 512 + slot * 512 / len);
            }
        }
        let actual: BTreeSet<u32> = ons.iter().map(|&(tick, _, _)| tick).collect();
        assert_eq!(actual, expected, "seed {seed}");
        // Measure 1 always starts on the tonic at tick 0.
        assert!(actual.contains(&0));
    }
}

#[test]
fn test_custom_render_config() {
    let generator = GeneratorConfig {
        key: "Eb".parse().unwrap(),
        voicing: Voicing::Close,
        ..GeneratorConfig::default()
    };
    let render = RenderConfig {
        ticks_per_quarter: 480,
        tempo_bpm: 90,
        program: 48,
        channel: 3,
        velocity: 80,
    };
    let progression = generate(11, ChordType::Ninth, &generator);
    let bytes = write_and_read(&progression, "custom", &render);
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.header.timing, Timing::Metrical(u15::new(480)));
    let ons = note_on_ticks(&smf);
    assert!(ons.iter().all(|&(_, key, vel)| (60..72).contains(&key) && vel == 80));
    // Last measure starts at 7 * 4 * 480.
    assert!(ons.iter().any(|&(tick, _, _)| tick == 13_440));

    let channels: BTreeSet<u8> = smf.tracks[0]
        .iter()
        .filter_map(|e| match e.kind {
            TrackEventKind::Midi { channel, .. } => Some(channel.as_int()),
            _ => None,
        })
        .collect();
    assert_eq!(channels, BTreeSet::from([2]));
}
