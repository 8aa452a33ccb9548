// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Multi-document MIDI combination.
//!
//! Absorbs several single-stem MIDI documents into one unified multi-track
//! document. Inputs that are missing or unparseable are skipped with a
//! warning; an all-failed combination is an error so the caller never gets
//! an empty file silently.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{reader::read_document, writer::write_document, MidiDocument};
use crate::error::{Error, Result};

/// Concatenate the tracks of several documents, in input order.
///
/// No re-ordering and no instrument collapsing: two tracks with the same
/// program stay distinct. Timing context comes from the first non-empty
/// document. Returns [`Error::NothingToCombine`] if zero tracks survive.
pub fn combine_documents(documents: Vec<MidiDocument>) -> Result<MidiDocument> {
    let attempted = documents.len();
    let mut combined: Option<MidiDocument> = None;

    for doc in documents {
        if doc.tracks.is_empty() {
            continue;
        }
        let target = combined.get_or_insert_with(|| MidiDocument {
            tracks: Vec::new(),
            tempo: doc.tempo,
            ppqn: doc.ppqn,
        });
        target.tracks.extend(doc.tracks);
    }

    combined.ok_or(Error::NothingToCombine { attempted })
}

/// Load MIDI files from `inputs`, combine them, and write the result to
/// `output`.
///
/// A missing or unparseable input is skipped with a warning rather than
/// failing the whole combination. Nothing is written when zero tracks
/// survive.
pub fn combine_files(inputs: &[PathBuf], output: &Path) -> Result<MidiDocument> {
    info!(inputs = inputs.len(), output = %output.display(), "combining MIDI files");

    let mut loaded = Vec::with_capacity(inputs.len());
    for path in inputs {
        if !path.exists() {
            warn!(path = %path.display(), "skipping missing MIDI file");
            continue;
        }
        match read_document(path) {
            Ok(doc) => loaded.push(doc),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable MIDI file");
            }
        }
    }

    if loaded.is_empty() {
        return Err(Error::NothingToCombine {
            attempted: inputs.len(),
        });
    }

    let combined = combine_documents(loaded)?;
    write_document(&combined, output)?;

    info!(
        tracks = combined.tracks.len(),
        notes = combined.note_count(),
        "unified MIDI created"
    );
    Ok(combined)
}
