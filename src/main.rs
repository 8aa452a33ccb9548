// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::Result;
use stemidi::{combine_files, read_document};

fn print_usage() {
    println!("STEMIDI - Stem-to-MIDI post-processing");
    println!();
    println!("Usage: stemidi [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --combine <OUT> <IN>...  Combine per-stem MIDI files into one unified file");
    println!("  --inspect <FILE>         Print track and note summary for a MIDI file");
    println!("  --help                   Show this help message");
}

fn combine(output: &Path, inputs: &[PathBuf]) -> Result<()> {
    println!("Combining {} MIDI file(s)...", inputs.len());
    let combined = combine_files(inputs, output)?;
    println!(
        "Unified MIDI written to {} ({} tracks, {} notes)",
        output.display(),
        combined.tracks.len(),
        combined.note_count()
    );
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let doc = read_document(path)?;
    println!("{}", path.display());
    println!("  tempo: {:.1} BPM, {} PPQN", doc.tempo, doc.ppqn);
    println!("  tracks: {}", doc.tracks.len());
    for track in &doc.tracks {
        let kind = if track.is_percussion { "percussion" } else { "pitched" };
        println!(
            "    {} ({}, program {}): {} notes",
            track.name,
            kind,
            track.program,
            track.note_count()
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("--combine") if args.len() >= 4 => {
            let output = PathBuf::from(&args[2]);
            let inputs: Vec<PathBuf> = args[3..].iter().map(PathBuf::from).collect();
            combine(&output, &inputs)
        }
        Some("--inspect") if args.len() == 3 => inspect(Path::new(&args[2])),
        Some("--help") | None => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            std::process::exit(1);
        }
    }
}
