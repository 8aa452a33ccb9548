// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Stem-to-MIDI transcription.
//!
//! This module provides a trait-based abstraction for the external
//! audio-to-notes predictor, allowing different backends (a neural model,
//! an RPC service, a test mock) to be used interchangeably, and drives the
//! raw prediction through the merge and normalize steps to a finished
//! per-stem MIDI document.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::ProcessingConfig;
use crate::error::{Error, Result};
use crate::midi::{writer::write_document, InstrumentTrack, MidiDocument};
use crate::note::{merge_notes, NoteEvent};

/// Trait for audio-to-note-event prediction backends.
///
/// The predictor is a black box: given an audio file it yields raw,
/// loosely-typed note material with no ordering or redundancy guarantees.
/// Everything downstream of this trait works on the typed model.
pub trait NotePredictor {
    /// Predict note events for one audio file.
    ///
    /// # Arguments
    /// * `audio_path` - Path to the audio stem to transcribe
    ///
    /// # Returns
    /// * `Ok(RawTranscription)` with the model's raw output
    /// * `Err` if the audio is unreadable or the model fails
    fn predict(&self, audio_path: &Path) -> anyhow::Result<RawTranscription>;
}

/// Raw per-file predictor output before translation to the typed model
#[derive(Debug, Clone, Default)]
pub struct RawTranscription {
    pub tracks: Vec<RawTrack>,
}

/// One raw instrument grouping as reported by the predictor
#[derive(Debug, Clone)]
pub struct RawTrack {
    pub program: i32,
    pub is_percussion: bool,
    pub notes: Vec<RawNote>,
}

/// One raw note as reported by the predictor. Wider types than the model:
/// the translation boundary does the range checking.
#[derive(Debug, Clone, Copy)]
pub struct RawNote {
    pub pitch: i32,
    pub start: f64,
    pub end: f64,
    pub velocity: i32,
}

/// Outcome of a multi-stem batch run.
///
/// Per-stem failures are isolated: one failed stem never aborts its
/// siblings, and the caller can report partial success ("N of M").
#[derive(Debug)]
pub struct BatchOutcome {
    /// Paths of successfully written per-stem MIDI files, in stem order
    pub produced: Vec<PathBuf>,
    /// Stems that failed, with the error for each
    pub failures: Vec<(String, Error)>,
}

impl BatchOutcome {
    /// Number of stems attempted
    pub fn attempted(&self) -> usize {
        self.produced.len() + self.failures.len()
    }

    /// True if at least one stem produced a MIDI file
    pub fn any_succeeded(&self) -> bool {
        !self.produced.is_empty()
    }
}

/// Drives one audio stem through predict, merge, and normalize.
pub struct StemTranscriber<P: NotePredictor> {
    predictor: P,
    config: ProcessingConfig,
}

impl<P: NotePredictor> StemTranscriber<P> {
    /// Create a transcriber from a predictor backend and configuration
    pub fn new(predictor: P, config: ProcessingConfig) -> Self {
        Self { predictor, config }
    }

    /// Processing configuration in use
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Transcribe one audio stem to a cleaned single-stem document.
    ///
    /// Runs the predictor, translates its raw output into the typed model,
    /// then per pitched track with at least one note: merge repeated notes,
    /// then normalize velocity and program. Zero-note tracks and percussion
    /// tracks pass through untouched. Any failure is reported as
    /// [`Error::Transcription`] carrying the stem name; callers processing
    /// a batch can continue with sibling stems.
    pub fn transcribe(&self, audio_path: &Path) -> Result<MidiDocument> {
        let stem = stem_name(audio_path);
        info!(stem = %stem, "transcribing audio stem");

        let raw = self
            .predictor
            .predict(audio_path)
            .map_err(|source| Error::Transcription {
                stem: stem.clone(),
                source,
            })?;

        let mut doc = raw_to_document(raw, &stem).map_err(|source| Error::Transcription {
            stem: stem.clone(),
            source,
        })?;

        let notes_before = doc.note_count();

        for track in &mut doc.tracks {
            if track.is_percussion || track.notes.is_empty() {
                continue;
            }

            let before = track.note_count();
            let notes = std::mem::take(&mut track.notes);
            track.notes = merge_notes(notes, self.config.merge_note_gap_seconds).map_err(
                |source| Error::Transcription {
                    stem: stem.clone(),
                    source: source.into(),
                },
            )?;
            debug!(
                stem = %stem,
                track = %track.name,
                before,
                after = track.note_count(),
                "merged repeated notes"
            );

            track.normalize(self.config.uniform_velocity, self.config.uniform_instrument);
        }

        info!(
            stem = %stem,
            notes_before,
            notes_after = doc.note_count(),
            "transcription complete"
        );
        Ok(doc)
    }

    /// Transcribe one stem and write `<stem>.mid` into `output_dir`.
    ///
    /// The file write is atomic: either the full file appears or nothing
    /// does.
    pub fn transcribe_to_file(&self, audio_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        let doc = self.transcribe(audio_path)?;

        let midi_path = output_dir.join(format!("{}.mid", stem_name(audio_path)));
        write_document(&doc, &midi_path)?;
        Ok(midi_path)
    }

    /// Transcribe every stem, isolating per-stem failures.
    pub fn transcribe_batch(&self, stems: &[PathBuf], output_dir: &Path) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            produced: Vec::new(),
            failures: Vec::new(),
        };

        for stem_path in stems {
            match self.transcribe_to_file(stem_path, output_dir) {
                Ok(path) => outcome.produced.push(path),
                Err(e) => {
                    warn!(stem = %stem_name(stem_path), error = %e, "stem failed, continuing");
                    outcome.failures.push((stem_name(stem_path), e));
                }
            }
        }

        info!(
            produced = outcome.produced.len(),
            attempted = outcome.attempted(),
            "batch transcription finished"
        );
        outcome
    }
}

/// Stem identifier for an audio path (file name without extension)
fn stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Translate raw predictor output into the typed document model.
///
/// The only place loosely-typed material is handled: out-of-range values
/// fail here with a descriptive cause instead of leaking into the
/// merge/normalize pipeline.
fn raw_to_document(raw: RawTranscription, stem: &str) -> anyhow::Result<MidiDocument> {
    let mut doc = MidiDocument::new();
    let track_count = raw.tracks.len();

    for (index, raw_track) in raw.tracks.into_iter().enumerate() {
        if !(0..=127).contains(&raw_track.program) {
            anyhow::bail!(
                "track {} has program {} out of range 0-127",
                index,
                raw_track.program
            );
        }

        let name = if track_count > 1 {
            format!("{} {}", stem, index + 1)
        } else {
            stem.to_string()
        };

        let mut track = InstrumentTrack::new(name, raw_track.program as u8)
            .with_percussion(raw_track.is_percussion);

        for raw_note in raw_track.notes {
            if !(0..=127).contains(&raw_note.pitch) {
                anyhow::bail!("pitch {} out of range 0-127", raw_note.pitch);
            }
            if !(0..=127).contains(&raw_note.velocity) {
                anyhow::bail!("velocity {} out of range 0-127", raw_note.velocity);
            }
            let note = NoteEvent::new(
                raw_note.pitch as u8,
                raw_note.start,
                raw_note.end,
                raw_note.velocity as u8,
            );
            note.validate()
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            track.notes.push(note);
        }

        doc.add_track(track);
    }

    Ok(doc)
}
