//! Chord Selector.
//!
//! Quantizes the melody into beat slots of length `divisions` ticks and
//! picks, for each slot, the diatonic triad whose chord tones include the
//! sounding pitch class, weighted by a functional transition table.

use log::{debug, warn};

use crate::cancel::CancellationToken;
use crate::chord::{initial_weight, transition_weight, Chord, Degree};
use crate::error::HarmonizeError;
use crate::key::Key;
use crate::note::MelodicLine;
use crate::pitch::{is_rest, pitch_class};
use crate::prng::Prng;
use crate::warnings::Warning;

/// Whether to pick each slot's best-scoring candidate, or its second-best,
/// as used by the one allowed refinement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRank {
    Best,
    SecondBest,
}

/// One slot's diatonic candidates with their transition weights, sorted by
/// descending weight.
struct SlotCandidates {
    candidates: Vec<(Chord, u32)>,
}

/// Run the Chord Selector over `num_slots` beat slots of `divisions` ticks.
/// Checks `cancel` between slots, per spec.md §5, failing with `Cancelled`
/// rather than returning a partial progression.
pub fn select_chords(
    key: &Key,
    melody: &MelodicLine,
    num_slots: usize,
    divisions: u32,
    rank: SelectionRank,
    prng: &mut Prng,
    cancel: &CancellationToken,
) -> Result<(Vec<Chord>, Vec<Warning>), HarmonizeError> {
    let mut chords = Vec::with_capacity(num_slots);
    let mut warnings = Vec::new();
    let mut prev_degree: Option<Degree> = None;

    for slot in 0..num_slots {
        if cancel.is_cancelled() {
            return Err(HarmonizeError::Cancelled);
        }

        let tick = slot as u32 * divisions;
        let sounding = melody.pitch_at(tick);

        let chosen = match sounding {
            None | Some(-1) => {
                // Rest (or nothing sounding yet): inherit previous chord,
                // preferring the tonic at slot 0.
                match chords.last().copied() {
                    Some(c) => c,
                    None => Chord::diatonic(key, Degree::I),
                }
            }
            Some(pitch) if is_rest(pitch) => match chords.last().copied() {
                Some(c) => c,
                None => Chord::diatonic(key, Degree::I),
            },
            Some(pitch) => {
                let pc = pitch_class(pitch);
                let slot_candidates = candidates_for(key, pc);
                if slot_candidates.candidates.is_empty() {
                    let warning = Warning::ChromaticMelodyNote { slot };
                    warn!("{warning}");
                    warnings.push(warning);
                    match chords.last().copied() {
                        Some(c) => c,
                        None => Chord::diatonic(key, Degree::I),
                    }
                } else {
                    pick(&slot_candidates, prev_degree, rank, prng)
                }
            }
        };

        debug!("slot {slot}: chose root pc {} (degree {:?})", chosen.root_pc, chosen.degree);
        prev_degree = Some(chosen.degree);
        chords.push(chosen);
    }

    Ok((chords, warnings))
}

/// Diatonic triads (native key, then parallel-mode borrowing per
/// SPEC_FULL.md §4.13) whose chord tones include `pc`.
fn candidates_for(key: &Key, pc: i32) -> SlotCandidates {
    let mut candidates = Vec::new();
    for &degree in Degree::ALL.iter() {
        let chord = Chord::diatonic(key, degree);
        if chord.contains_pitch_class(pc) {
            candidates.push(chord);
        }
    }
    if candidates.is_empty() {
        let parallel = key.parallel();
        for &degree in Degree::ALL.iter() {
            let chord = Chord::diatonic(&parallel, degree);
            if chord.contains_pitch_class(pc) {
                candidates.push(chord);
            }
        }
    }
    SlotCandidates { candidates: candidates.into_iter().map(|c| (c, 0)).collect() }
}

fn pick(
    slot: &SlotCandidates,
    prev_degree: Option<Degree>,
    rank: SelectionRank,
    prng: &mut Prng,
) -> Chord {
    let weights: Vec<u32> = slot
        .candidates
        .iter()
        .map(|(c, _)| match prev_degree {
            Some(prev) => transition_weight(prev, c.degree),
            None => initial_weight(c.degree),
        })
        .collect();

    match rank {
        SelectionRank::Best => {
            let idx = prng.argmax_tie_break(&weights);
            slot.candidates[idx].0
        }
        SelectionRank::SecondBest => {
            if slot.candidates.len() < 2 {
                let idx = prng.argmax_tie_break(&weights);
                return slot.candidates[idx].0;
            }
            // Remove the best-weighted candidate, then argmax the remainder.
            let best_idx = prng.argmax_tie_break(&weights);
            let remaining: Vec<(usize, u32)> = weights
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != best_idx)
                .map(|(i, &w)| (i, w))
                .collect();
            let remaining_weights: Vec<u32> = remaining.iter().map(|&(_, w)| w).collect();
            let chosen_in_remaining = prng.argmax_tie_break(&remaining_weights);
            let (orig_idx, _) = remaining[chosen_in_remaining];
            slot.candidates[orig_idx].0
        }
    }
}
