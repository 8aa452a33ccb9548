// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Note event model.
//!
//! A `NoteEvent` is one detected or generated pitched note with onset,
//! offset, and intensity. Timing is in seconds so that events coming from
//! the audio-domain predictor can be carried without tick conversion until
//! serialization.

pub mod merge;

pub use merge::merge_notes;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum valid MIDI data byte value (pitch, velocity, program)
pub const MAX_MIDI_VALUE: u8 = 127;

/// A single note event with absolute timing in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Semitone number (0-127, 60 = middle C)
    pub pitch: u8,
    /// Onset time in seconds
    pub start: f64,
    /// Offset time in seconds (>= start)
    pub end: f64,
    /// Loudness (0-127)
    pub velocity: u8,
}

impl NoteEvent {
    /// Create a new note event
    pub fn new(pitch: u8, start: f64, end: f64, velocity: u8) -> Self {
        Self {
            pitch,
            start,
            end,
            velocity,
        }
    }

    /// Note duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Check model invariants, naming the first violated one.
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::MalformedNote {
                reason: format!(
                    "non-finite timing (start={}, end={})",
                    self.start, self.end
                ),
            });
        }
        if self.start < 0.0 {
            return Err(Error::MalformedNote {
                reason: format!("negative start time {}", self.start),
            });
        }
        if self.end < self.start {
            return Err(Error::MalformedNote {
                reason: format!("end {} before start {}", self.end, self.start),
            });
        }
        if self.pitch > MAX_MIDI_VALUE {
            return Err(Error::MalformedNote {
                reason: format!("pitch {} out of range 0-127", self.pitch),
            });
        }
        if self.velocity > MAX_MIDI_VALUE {
            return Err(Error::MalformedNote {
                reason: format!("velocity {} out of range 0-127", self.velocity),
            });
        }
        Ok(())
    }
}
