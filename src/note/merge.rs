// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Repeated-note merging.
//!
//! Audio transcription tends to emit rapid re-detections of one sustained
//! note as a burst of short same-pitch notes. This module collapses those
//! bursts: consecutive notes of equal pitch whose gap is within a tolerance
//! become one note spanning both.

use tracing::debug;

use super::NoteEvent;
use crate::error::Result;

/// Merge consecutive same-pitch notes separated by at most `max_gap` seconds.
///
/// Consumes the input and returns a new sequence sorted by start time.
/// The gap is measured from the running note's end to the next note's
/// start, so overlapping notes (negative gap) always merge. Notes of
/// different pitch never merge, however much they overlap. A merged note
/// keeps the later end time and the louder velocity of its sources.
///
/// Every input note is validated first; a note with inverted timing or
/// out-of-range pitch/velocity fails the whole call with
/// [`Error::MalformedNote`](crate::error::Error::MalformedNote).
///
/// # Arguments
/// * `notes` - Note events in any order
/// * `max_gap` - Maximum gap in seconds for merge eligibility (>= 0)
///
/// # Returns
/// * Merged notes, sorted by start time ascending
pub fn merge_notes(mut notes: Vec<NoteEvent>, max_gap: f64) -> Result<Vec<NoteEvent>> {
    for note in &notes {
        note.validate()?;
    }

    // Stable sort: equal start times keep their original order
    notes.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged = Vec::with_capacity(notes.len());
    let mut drain = notes.into_iter();
    let Some(mut current) = drain.next() else {
        return Ok(merged);
    };

    for next in drain {
        let gap = next.start - current.end;

        if next.pitch == current.pitch && gap <= max_gap {
            // Extend the running note; louder source wins
            current = NoteEvent {
                pitch: current.pitch,
                start: current.start,
                end: current.end.max(next.end),
                velocity: current.velocity.max(next.velocity),
            };
            debug!(
                pitch = current.pitch,
                gap_s = gap,
                duration_s = current.duration(),
                "merged repeated note"
            );
        } else {
            merged.push(current);
            current = next;
        }
    }

    merged.push(current);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start: f64, end: f64, velocity: u8) -> NoteEvent {
        NoteEvent::new(pitch, start, end, velocity)
    }

    #[test]
    fn test_empty_input() {
        let merged = merge_notes(Vec::new(), 0.08).unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn test_single_note_unchanged() {
        let merged = merge_notes(vec![note(60, 0.0, 0.5, 90)], 0.08).unwrap();
        assert_eq!(merged, vec![note(60, 0.0, 0.5, 90)]);
    }

    #[test]
    fn test_gap_within_tolerance_merges() {
        // Gap is 0.03s, tolerance 0.08s: one sustained note, louder wins
        let notes = vec![note(60, 0.0, 0.05, 50), note(60, 0.08, 0.15, 90)];
        let merged = merge_notes(notes, 0.08).unwrap();
        assert_eq!(merged, vec![note(60, 0.0, 0.15, 90)]);
    }

    #[test]
    fn test_gap_beyond_tolerance_keeps_both() {
        // Same notes, tolerance 0.01s < gap 0.03s: no merge
        let notes = vec![note(60, 0.0, 0.05, 50), note(60, 0.08, 0.15, 90)];
        let merged = merge_notes(notes, 0.01).unwrap();
        assert_eq!(
            merged,
            vec![note(60, 0.0, 0.05, 50), note(60, 0.08, 0.15, 90)]
        );
    }

    #[test]
    fn test_different_pitch_never_merges() {
        // Overlapping but different pitches stay separate
        let notes = vec![note(60, 0.0, 0.2, 60), note(61, 0.05, 0.1, 70)];
        let merged = merge_notes(notes, 0.08).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], note(60, 0.0, 0.2, 60));
        assert_eq!(merged[1], note(61, 0.05, 0.1, 70));
    }

    #[test]
    fn test_overlap_merges_like_small_gap() {
        // Negative gap (overlap) is just gap <= max_gap
        let notes = vec![note(60, 0.0, 0.3, 70), note(60, 0.1, 0.2, 100)];
        let merged = merge_notes(notes, 0.0).unwrap();
        // Contained note: end stays at the later of the two
        assert_eq!(merged, vec![note(60, 0.0, 0.3, 100)]);
    }

    #[test]
    fn test_gap_exactly_at_tolerance_merges() {
        let notes = vec![note(60, 0.0, 0.1, 80), note(60, 0.18, 0.3, 80)];
        let merged = merge_notes(notes, 0.08).unwrap();
        assert_eq!(merged.len(), 1);
        assert!((merged[0].end - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_chain_of_repeats_collapses_to_one() {
        let notes = vec![
            note(72, 0.00, 0.05, 40),
            note(72, 0.06, 0.11, 60),
            note(72, 0.12, 0.17, 50),
            note(72, 0.18, 0.23, 45),
        ];
        let merged = merge_notes(notes, 0.08).unwrap();
        assert_eq!(merged, vec![note(72, 0.0, 0.23, 60)]);
    }

    #[test]
    fn test_unsorted_input_sorted_first() {
        let notes = vec![note(60, 0.08, 0.15, 90), note(60, 0.0, 0.05, 50)];
        let merged = merge_notes(notes, 0.08).unwrap();
        assert_eq!(merged, vec![note(60, 0.0, 0.15, 90)]);
    }

    #[test]
    fn test_order_invariance() {
        use rand::seq::SliceRandom;

        let base = vec![
            note(60, 0.0, 0.05, 50),
            note(60, 0.08, 0.15, 90),
            note(64, 0.2, 0.4, 70),
            note(60, 0.5, 0.6, 80),
            note(64, 0.41, 0.45, 60),
        ];
        let expected = merge_notes(base.clone(), 0.08).unwrap();

        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let mut shuffled = base.clone();
            shuffled.shuffle(&mut rng);
            assert_eq!(merge_notes(shuffled, 0.08).unwrap(), expected);
        }
    }

    #[test]
    fn test_idempotent() {
        let notes = vec![
            note(60, 0.0, 0.05, 50),
            note(60, 0.08, 0.15, 90),
            note(62, 0.2, 0.3, 70),
            note(62, 0.32, 0.4, 65),
        ];
        let once = merge_notes(notes, 0.08).unwrap();
        let twice = merge_notes(once.clone(), 0.08).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_never_increases_count_and_preserves_pitches() {
        let notes = vec![
            note(60, 0.0, 0.1, 80),
            note(62, 0.05, 0.2, 75),
            note(60, 0.12, 0.2, 85),
            note(67, 0.3, 0.5, 90),
        ];
        let input_len = notes.len();
        let input_pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();

        let merged = merge_notes(notes, 0.08).unwrap();
        assert!(merged.len() <= input_len);
        for out in &merged {
            assert!(input_pitches.contains(&out.pitch));
        }
    }

    #[test]
    fn test_tied_start_times_keep_input_order() {
        // Stable sort: at equal starts the earlier input note accumulates first
        let notes = vec![note(60, 0.0, 0.10, 50), note(60, 0.0, 0.05, 90)];
        let merged = merge_notes(notes, 0.0).unwrap();
        assert_eq!(merged, vec![note(60, 0.0, 0.10, 90)]);
    }

    #[test]
    fn test_malformed_note_rejected() {
        let notes = vec![note(60, 0.0, 0.1, 80), note(60, 0.5, 0.2, 80)];
        assert!(merge_notes(notes, 0.08).is_err());
    }

    #[test]
    fn test_zero_gap_tolerance() {
        // max_gap = 0 still merges touching and overlapping notes
        let notes = vec![note(60, 0.0, 0.1, 80), note(60, 0.1, 0.2, 70)];
        let merged = merge_notes(notes, 0.0).unwrap();
        assert_eq!(merged, vec![note(60, 0.0, 0.2, 80)]);
    }
}
