// Mood Chords: CLI entry point.
//
// Generates a chord progression for the given mood and writes it to MIDI.
// The pipeline: load config, pick scale, generate progression, write MIDI.
//
// Usage:
//   cargo run -p mood_chords -- [output.mid] [--sad-cheerful N]
//     [--mysterious-mundane N] [--tense-calm N] [--complexity 0|1|2]
//     [--seed N] [--key K] [--scale NAME] [--config FILE] [--json FILE]
//     [--embellishments]
//
// Mood sliders run from -5 to 5; positive values lean toward the first word
// (sad, mysterious, tense). Scales: major, natural_minor, harmonic_minor,
// melodic_minor, dorian, phrygian, lydian, mixolydian, locrian.

use mood_chords::config::MoodChordsConfig;
use mood_chords::embellish::all_embellishments;
use mood_chords::mood::{MoodVector, rank_scales};
use mood_chords::progression::{MEASURES, create_chord_progression, generate_progression};
use mood_chords::render::{BEATS_PER_MEASURE, render_progression_to_file};
use mood_chords::theory::{ChordType, Note, ScaleType};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Parse arguments
    let output_path = args
        .get(1)
        .filter(|s| !s.starts_with("--"))
        .map(|s| s.as_str())
        .unwrap_or("output.mid");
    let mood = MoodVector::new(
        parse_flag(&args, "--sad-cheerful").unwrap_or(0.0),
        parse_flag(&args, "--mysterious-mundane").unwrap_or(0.0),
        parse_flag(&args, "--tense-calm").unwrap_or(0.0),
    );
    let complexity: u8 = parse_flag(&args, "--complexity").unwrap_or(0);
    let seed: Option<u64> = parse_flag(&args, "--seed");
    let key: Option<Note> = parse_flag(&args, "--key");
    let scale_name: Option<String> = parse_flag(&args, "--scale");
    let config_path: Option<String> = parse_flag(&args, "--config");
    let json_path: Option<String> = parse_flag(&args, "--json");
    let show_embellishments = args.iter().any(|a| a == "--embellishments");

    let chord_type = ChordType::try_from(complexity).unwrap_or_else(|e| fail(e));

    let mut config = match &config_path {
        Some(path) => MoodChordsConfig::load(Path::new(path)).unwrap_or_else(|e| {
            fail(format!("failed to load config {path}: {e}"))
        }),
        None => MoodChordsConfig::default(),
    };
    if let Some(key) = key {
        config.generator.key = key;
    }
    let forced_scale: Option<ScaleType> = scale_name
        .map(|name| name.parse().unwrap_or_else(|e| fail(e)));

    println!("=== Mood Chords ===");
    println!("Output: {}", output_path);
    println!(
        "Mood: sad/cheerful {:+.1}, mysterious/mundane {:+.1}, tense/calm {:+.1}",
        mood.sad_cheerful, mood.mysterious_mundane, mood.tense_calm
    );
    println!("Chords: {:?} (complexity {})", chord_type, chord_type.complexity());
    println!("Key: {}", config.generator.key);
    if let Some(s) = seed {
        println!("Seed: {}", s);
    }
    println!();

    // Initialize RNG
    let mut rng = if let Some(s) = seed {
        StdRng::seed_from_u64(s)
    } else {
        StdRng::from_os_rng()
    };

    println!("[1/3] Ranking scales...");
    for (scale, affinity) in rank_scales(&mood)
        .iter()
        .take(config.generator.scale_shortlist.max(1))
    {
        println!("  {:<15} affinity {:.3}", scale.name(), affinity);
    }

    println!("[2/3] Generating progression...");
    let result = match forced_scale {
        Some(scale) => {
            println!("  Scale forced: {}", scale);
            generate_progression(&mood, scale, chord_type, &config.generator, &mut rng)
        }
        None => create_chord_progression(mood, chord_type, &config.generator, &mut rng),
    };
    let progression = result.unwrap_or_else(|e| fail(e));

    println!(
        "  {} {} ({:?})",
        progression.key, progression.scale, progression.pattern
    );
    for (i, measure) in progression.measures.iter().enumerate() {
        let chords: Vec<String> = measure.chords.iter().map(|c| c.to_string()).collect();
        println!("  Measure {}: {}", i + 1, chords.join("  "));
    }
    let weights: Vec<String> = progression
        .quality_weights
        .iter()
        .map(|(quality, weight)| format!("{} {:.2}", quality.name(), weight))
        .collect();
    println!("  Quality weights: {}", weights.join(", "));

    if show_embellishments {
        match all_embellishments(
            progression.key,
            progression.scale,
            chord_type,
            config.generator.voicing,
        ) {
            Ok(derived) => {
                println!("  Embellishments:");
                for chord in &derived {
                    println!("    {}", chord);
                }
            }
            Err(e) => eprintln!("  Could not derive embellishments: {}", e),
        }
    }

    if let Some(path) = &json_path {
        let written = serde_json::to_string_pretty(&progression)
            .map_err(mood_chords::Error::from)
            .and_then(|json| std::fs::write(path, json).map_err(mood_chords::Error::from));
        match written {
            Ok(()) => println!("  Wrote progression JSON to {}", path),
            Err(e) => fail(format!("failed to write {path}: {e}")),
        }
    }

    // Write MIDI
    println!("[3/3] Writing MIDI to {}...", output_path);
    match render_progression_to_file(&progression, Path::new(output_path), &config.render) {
        Ok(warnings) => {
            for warning in &warnings {
                eprintln!("  Warning: {}", warning);
            }
            let beats = (MEASURES as u32 * BEATS_PER_MEASURE) as f64;
            let seconds = beats * 60.0 / config.render.tempo_bpm.max(1) as f64;
            println!("  Done! Duration: {:.0}s ({} bars)", seconds, MEASURES);
        }
        Err(e) => {
            eprintln!("  Error writing MIDI: {}", e);
            std::process::exit(1);
        }
    }

    println!();
    println!("Play with: timidity {} (or any MIDI player)", output_path);
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
