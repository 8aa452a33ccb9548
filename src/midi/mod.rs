// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! MIDI document model and file I/O.
//!
//! An `InstrumentTrack` is a named collection of note events sharing one
//! timbre; a `MidiDocument` is an ordered collection of tracks plus the
//! global timing context used when serializing to a Standard MIDI File.

pub mod combine;
pub mod reader;
pub mod writer;

pub use combine::{combine_documents, combine_files};
pub use reader::read_document;
pub use writer::{document_to_bytes, write_document};

use serde::{Deserialize, Serialize};

use crate::note::NoteEvent;

/// Default tempo in BPM for generated documents
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Default ticks per quarter note for generated documents
pub const DEFAULT_PPQN: u16 = 480;

/// A named collection of note events sharing one instrument timbre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentTrack {
    /// Track name (typically the stem name)
    pub name: String,
    /// General MIDI program number (0-127)
    pub program: u8,
    /// Percussion tracks (MIDI channel 10) bypass pitched processing
    pub is_percussion: bool,
    /// Note events, in start-time order after merging
    pub notes: Vec<NoteEvent>,
}

impl InstrumentTrack {
    /// Create an empty pitched track
    pub fn new(name: impl Into<String>, program: u8) -> Self {
        Self {
            name: name.into(),
            program,
            is_percussion: false,
            notes: Vec::new(),
        }
    }

    /// Mark as a percussion track
    pub fn with_percussion(mut self, is_percussion: bool) -> Self {
        self.is_percussion = is_percussion;
        self
    }

    /// Number of notes in this track
    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// Force a uniform velocity on every note and a uniform program on the
    /// track, discarding prior values.
    ///
    /// Pure assignment, idempotent. Run this after merging: the merge
    /// step's louder-wins velocity policy needs the pre-normalization
    /// velocities to pick a meaningful peak.
    pub fn normalize(&mut self, velocity: u8, program: u8) {
        self.program = program;
        for note in &mut self.notes {
            note.velocity = velocity;
        }
    }
}

/// An ordered collection of instrument tracks with a fixed timing context.
///
/// Track order is insertion order. Tracks may share a program; nothing is
/// collapsed or deduplicated at this level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiDocument {
    /// Instrument tracks, in insertion order
    pub tracks: Vec<InstrumentTrack>,
    /// Tempo in BPM (single fixed tempo; tempo maps are not modeled)
    pub tempo: f64,
    /// Ticks per quarter note used when serializing
    pub ppqn: u16,
}

impl MidiDocument {
    /// Create an empty document with default timing (120 BPM, 480 PPQN)
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            tempo: DEFAULT_TEMPO,
            ppqn: DEFAULT_PPQN,
        }
    }

    /// Add a track
    pub fn add_track(&mut self, track: InstrumentTrack) {
        self.tracks.push(track);
    }

    /// Total note count across all tracks
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.note_count()).sum()
    }

    /// Seconds-to-ticks conversion for this document's timing context
    pub fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        (seconds * self.ppqn as f64 * self.tempo / 60.0).round() as u64
    }

    /// Ticks-to-seconds conversion for this document's timing context
    pub fn ticks_to_seconds(&self, ticks: u64) -> f64 {
        ticks as f64 * 60.0 / (self.ppqn as f64 * self.tempo)
    }
}

impl Default for MidiDocument {
    fn default() -> Self {
        Self::new()
    }
}
