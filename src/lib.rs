// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Stem-to-MIDI post-processing.
//!
//! Turns raw note-event output from an audio-to-MIDI predictor into
//! cleaned, normalized MIDI files, and packages multiple per-stem results
//! into one unified multi-track file. The predictor itself is a black box
//! behind the [`transcribe::NotePredictor`] trait; this crate owns the
//! note-level pipeline: merge rapid repeated detections, normalize
//! velocity and timbre, serialize, combine.

pub mod config;
pub mod error;
pub mod midi;
pub mod note;
pub mod transcribe;

pub use config::ProcessingConfig;
pub use error::{Error, Result};
pub use midi::{
    combine_documents, combine_files, document_to_bytes, read_document, write_document,
    InstrumentTrack, MidiDocument,
};
pub use note::{merge_notes, NoteEvent};
pub use transcribe::{BatchOutcome, NotePredictor, RawTranscription, StemTranscriber};
