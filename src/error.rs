// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for stem-to-MIDI processing.

use std::path::PathBuf;

/// Errors produced by the MIDI processing pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A note violates a model invariant (end before start, out-of-range
    /// pitch or velocity, non-finite timing). Raised at merge entry.
    #[error("malformed note: {reason}")]
    MalformedNote { reason: String },

    /// The external note predictor failed for one stem. Non-fatal to a
    /// batch; sibling stems keep processing.
    #[error("transcription failed for stem '{stem}': {source}")]
    Transcription {
        stem: String,
        #[source]
        source: anyhow::Error,
    },

    /// Combination produced zero tracks (all inputs missing, empty, or
    /// unparseable). No output file is written in this case.
    #[error("nothing to combine: no tracks loaded from {attempted} input(s)")]
    NothingToCombine { attempted: usize },

    /// A MIDI file could not be parsed.
    #[error("failed to parse MIDI file {path:?}: {reason}")]
    MidiParse { path: PathBuf, reason: String },

    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
