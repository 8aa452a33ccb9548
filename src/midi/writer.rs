// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file serialization.
//!
//! Writes a `MidiDocument` as a Type 1 file: a conductor track carrying
//! tempo and time signature, then one track per instrument. File writes
//! are atomic: bytes go to a temp file in the target directory which is
//! renamed into place, so a crashed write never leaves a partial `.mid`.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::info;

use super::MidiDocument;
use crate::error::Result;

/// A raw MIDI event at an absolute tick
#[derive(Debug, Clone)]
struct RawEvent {
    tick: u64,
    data: Vec<u8>,
}

impl RawEvent {
    fn note_on(tick: u64, channel: u8, pitch: u8, velocity: u8) -> Self {
        Self {
            tick,
            data: vec![0x90 | (channel & 0x0F), pitch & 0x7F, velocity & 0x7F],
        }
    }

    fn note_off(tick: u64, channel: u8, pitch: u8) -> Self {
        Self {
            tick,
            data: vec![0x80 | (channel & 0x0F), pitch & 0x7F, 0],
        }
    }

    fn program_change(tick: u64, channel: u8, program: u8) -> Self {
        Self {
            tick,
            data: vec![0xC0 | (channel & 0x0F), program & 0x7F],
        }
    }

    fn tempo(tick: u64, bpm: f64) -> Self {
        let microseconds = (60_000_000.0 / bpm) as u32;
        Self {
            tick,
            data: vec![
                0xFF, 0x51, 0x03,
                ((microseconds >> 16) & 0xFF) as u8,
                ((microseconds >> 8) & 0xFF) as u8,
                (microseconds & 0xFF) as u8,
            ],
        }
    }

    fn time_signature(tick: u64, numerator: u8, denominator: u8) -> Self {
        // Denominator is expressed as power of 2
        let denom_power = (denominator as f64).log2() as u8;
        Self {
            tick,
            data: vec![0xFF, 0x58, 0x04, numerator, denom_power, 24, 8],
        }
    }

    fn track_name(tick: u64, name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut data = vec![0xFF, 0x03, bytes.len().min(255) as u8];
        data.extend_from_slice(&bytes[..bytes.len().min(255)]);
        Self { tick, data }
    }

    fn is_note_off(&self) -> bool {
        self.data.first().is_some_and(|b| b & 0xF0 == 0x80)
    }
}

/// Serialize a document to Type 1 MIDI file bytes.
///
/// Conductor track first, then one track per instrument with track name,
/// program change, and note events. Pitched tracks take channels 0 upward
/// skipping channel 9; percussion tracks pin channel 9. Documents with
/// more than 15 pitched tracks share the last channel.
pub fn document_to_bytes(doc: &MidiDocument) -> Vec<u8> {
    let mut buf = Vec::new();

    // Header chunk: format 1, conductor + instrument tracks, PPQN
    let num_tracks = doc.tracks.len() as u16 + 1;
    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes());
    buf.extend_from_slice(&num_tracks.to_be_bytes());
    buf.extend_from_slice(&doc.ppqn.to_be_bytes());

    // Conductor track
    let conductor = vec![
        RawEvent::track_name(0, "Tempo"),
        RawEvent::tempo(0, doc.tempo),
        RawEvent::time_signature(0, 4, 4),
    ];
    write_track_chunk(&mut buf, conductor);

    // Instrument tracks
    let mut channel_alloc = 0u8;
    for track in &doc.tracks {
        let channel = if track.is_percussion {
            9
        } else {
            let ch = channel_alloc;
            channel_alloc += 1;
            if channel_alloc == 9 {
                channel_alloc += 1; // keep channel 10 for percussion
            }
            ch.min(15)
        };

        let mut events = Vec::with_capacity(track.notes.len() * 2 + 2);
        events.push(RawEvent::track_name(0, &track.name));
        events.push(RawEvent::program_change(0, channel, track.program));

        for note in &track.notes {
            events.push(RawEvent::note_on(
                doc.seconds_to_ticks(note.start),
                channel,
                note.pitch,
                note.velocity,
            ));
            events.push(RawEvent::note_off(
                doc.seconds_to_ticks(note.end),
                channel,
                note.pitch,
            ));
        }

        write_track_chunk(&mut buf, events);
    }

    buf
}

/// Write a document to `path` atomically.
pub fn write_document(doc: &MidiDocument, path: &Path) -> Result<()> {
    let bytes = document_to_bytes(doc);

    // Same-directory temp file so the rename stays on one filesystem
    let tmp_path = path.with_extension("mid.tmp");
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    info!(
        path = %path.display(),
        tracks = doc.tracks.len(),
        notes = doc.note_count(),
        "wrote MIDI file"
    );
    Ok(())
}

/// Append one MTrk chunk built from absolute-tick events.
fn write_track_chunk(buf: &mut Vec<u8>, mut events: Vec<RawEvent>) {
    // Sort by tick; note-offs precede note-ons at the same tick so a
    // repeated pitch is released before it re-triggers
    events.sort_by(|a, b| {
        a.tick
            .cmp(&b.tick)
            .then_with(|| b.is_note_off().cmp(&a.is_note_off()))
    });

    let mut track_data = Vec::new();
    let mut last_tick = 0u64;

    for event in &events {
        let delta = event.tick.saturating_sub(last_tick);
        write_variable_length(&mut track_data, delta as u32);
        track_data.extend_from_slice(&event.data);
        last_tick = event.tick;
    }

    // End of track
    write_variable_length(&mut track_data, 0);
    track_data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    buf.extend_from_slice(b"MTrk");
    buf.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
    buf.extend_from_slice(&track_data);
}

/// Write a variable-length quantity
fn write_variable_length(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = Vec::new();

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    buf.extend_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::InstrumentTrack;
    use crate::note::NoteEvent;

    fn one_note_doc() -> MidiDocument {
        let mut doc = MidiDocument::new();
        let mut track = InstrumentTrack::new("piano", 0);
        track.notes.push(NoteEvent::new(60, 0.0, 0.5, 80));
        doc.add_track(track);
        doc
    }

    #[test]
    fn test_header_format1() {
        let bytes = document_to_bytes(&one_note_doc());

        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..10], &1u16.to_be_bytes()); // format 1
        assert_eq!(&bytes[10..12], &2u16.to_be_bytes()); // conductor + 1
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes()); // PPQN
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn test_variable_length() {
        let mut buf = Vec::new();
        write_variable_length(&mut buf, 0);
        assert_eq!(buf, vec![0x00]);

        buf.clear();
        write_variable_length(&mut buf, 127);
        assert_eq!(buf, vec![0x7F]);

        buf.clear();
        write_variable_length(&mut buf, 128);
        assert_eq!(buf, vec![0x81, 0x00]);

        buf.clear();
        write_variable_length(&mut buf, 16383);
        assert_eq!(buf, vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_tempo_event_bytes() {
        let event = RawEvent::tempo(0, 120.0);
        // 120 BPM = 500000 microseconds per beat = 0x07A120
        assert_eq!(&event.data, &[0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
    }

    #[test]
    fn test_output_parses_with_midly() {
        let bytes = document_to_bytes(&one_note_doc());
        let smf = midly::Smf::parse(&bytes).expect("generated MIDI should parse");
        assert_eq!(smf.header.format, midly::Format::Parallel);
        assert_eq!(smf.tracks.len(), 2);
    }

    #[test]
    fn test_note_off_before_note_on_at_same_tick() {
        let mut doc = MidiDocument::new();
        let mut track = InstrumentTrack::new("piano", 0);
        // Second note starts exactly when the first ends
        track.notes.push(NoteEvent::new(60, 0.0, 0.5, 80));
        track.notes.push(NoteEvent::new(60, 0.5, 1.0, 80));
        doc.add_track(track);

        let bytes = document_to_bytes(&doc);
        let smf = midly::Smf::parse(&bytes).unwrap();

        let kinds: Vec<bool> = smf.tracks[1]
            .iter()
            .filter_map(|e| match e.kind {
                midly::TrackEventKind::Midi {
                    message: midly::MidiMessage::NoteOn { vel, .. },
                    ..
                } => Some(vel.as_int() > 0),
                midly::TrackEventKind::Midi {
                    message: midly::MidiMessage::NoteOff { .. },
                    ..
                } => Some(false),
                _ => None,
            })
            .collect();

        // on, off, on, off: the boundary tick releases before re-triggering
        assert_eq!(kinds, vec![true, false, true, false]);
    }

    #[test]
    fn test_percussion_track_uses_channel_9() {
        let mut doc = MidiDocument::new();
        doc.add_track(InstrumentTrack::new("melody", 0));
        let mut drums = InstrumentTrack::new("drums", 0).with_percussion(true);
        drums.notes.push(NoteEvent::new(36, 0.0, 0.1, 100));
        doc.add_track(drums);

        let bytes = document_to_bytes(&doc);
        let smf = midly::Smf::parse(&bytes).unwrap();

        // Track 2 is the drum track; its note events sit on channel 9
        let channels: Vec<u8> = smf.tracks[2]
            .iter()
            .filter_map(|e| match e.kind {
                midly::TrackEventKind::Midi { channel, message } => match message {
                    midly::MidiMessage::NoteOn { .. } | midly::MidiMessage::NoteOff { .. } => {
                        Some(channel.as_int())
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert!(!channels.is_empty());
        assert!(channels.iter().all(|&c| c == 9));
    }

    #[test]
    fn test_atomic_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");

        write_document(&one_note_doc(), &path).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("mid.tmp").exists());
        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[0..4], b"MThd");
    }
}
