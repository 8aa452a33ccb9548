// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file parsing.
//!
//! Reads a `.mid` file back into a `MidiDocument`. The document model has
//! a single fixed tempo, so the first tempo meta event wins; files with a
//! real tempo map are flattened onto that tempo.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};

use super::{InstrumentTrack, MidiDocument, DEFAULT_PPQN, DEFAULT_TEMPO};
use crate::error::{Error, Result};
use crate::note::NoteEvent;

/// Parse a MIDI file into a document.
///
/// NoteOn/NoteOff pairs are matched per (channel, pitch) with a pending
/// stack; a vel-0 NoteOn counts as NoteOff. Channel-9 notes land on a
/// percussion track. Tracks that carry no notes (conductor tracks, marker
/// tracks) contribute no `InstrumentTrack`. Notes left unterminated at end
/// of track are dropped.
pub fn read_document(path: &Path) -> Result<MidiDocument> {
    let bytes = fs::read(path)?;
    let smf = Smf::parse(&bytes).map_err(|e| Error::MidiParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let ppqn = match smf.header.timing {
        midly::Timing::Metrical(ticks) => ticks.as_int(),
        midly::Timing::Timecode(_, _) => DEFAULT_PPQN,
    };

    // First tempo event anywhere in the file, else 120 BPM
    let tempo = first_tempo_bpm(&smf).unwrap_or(DEFAULT_TEMPO);

    let mut doc = MidiDocument {
        tracks: Vec::new(),
        tempo,
        ppqn,
    };

    for (track_index, track) in smf.tracks.iter().enumerate() {
        let mut current_tick: u64 = 0;
        let mut name: Option<String> = None;
        let mut program: u8 = 0;
        let mut percussion = false;
        let mut notes: Vec<NoteEvent> = Vec::new();
        // (channel, pitch) -> stack of (onset_tick, velocity)
        let mut pending: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Meta(MetaMessage::TrackName(raw)) => {
                    name = Some(String::from_utf8_lossy(raw).into_owned());
                }
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    if ch == 9 {
                        percussion = true;
                    }
                    match message {
                        MidiMessage::ProgramChange { program: p } => {
                            program = p.as_int();
                        }
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            pending
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push((current_tick, vel.as_int()));
                        }
                        MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                            // vel=0 NoteOn is NoteOff
                            if let Some(stack) = pending.get_mut(&(ch, key.as_int())) {
                                if let Some((onset, velocity)) = stack.pop() {
                                    notes.push(NoteEvent::new(
                                        key.as_int(),
                                        doc.ticks_to_seconds(onset),
                                        doc.ticks_to_seconds(current_tick),
                                        velocity,
                                    ));
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if notes.is_empty() {
            continue;
        }

        notes.sort_by(|a, b| a.start.total_cmp(&b.start));

        doc.tracks.push(InstrumentTrack {
            name: name.unwrap_or_else(|| format!("Track {}", track_index)),
            program,
            is_percussion: percussion,
            notes,
        });
    }

    Ok(doc)
}

/// Scan all tracks for the first tempo meta event
fn first_tempo_bpm(smf: &Smf) -> Option<f64> {
    let mut best: Option<(u64, f64)> = None;

    for track in &smf.tracks {
        let mut current_tick: u64 = 0;
        for event in track {
            current_tick += event.delta.as_int() as u64;
            if let TrackEventKind::Meta(MetaMessage::Tempo(usec)) = event.kind {
                let bpm = 60_000_000.0 / usec.as_int() as f64;
                match best {
                    Some((tick, _)) if tick <= current_tick => {}
                    _ => best = Some((current_tick, bpm)),
                }
                break; // later tempo events on this track can't be earlier
            }
        }
    }

    best.map(|(_, bpm)| bpm)
}
