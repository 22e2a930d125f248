//! Part Extractor and Transposition.
//!
//! Assigns each requested instrument one SATB voice by a fixed round-robin
//! permutation, clamps that voice's pitches into the instrument's own MIDI
//! range, and adds the instrument's transposition to yield written pitch.

use log::warn;

use crate::instruments::Instrument;
use crate::note::{NoteEvent, Ticks};
use crate::pitch::{is_rest, Pitch, REST};
use crate::sonority::{Sonority, Voice};
use crate::warnings::Warning;

/// `[Alto, Bass, Tenor]`, indexed by `instrument_position mod 3` -- the
/// fourth instrument wraps back to Alto.
const VOICE_PERMUTATION: [Voice; 3] = [Voice::Alto, Voice::Bass, Voice::Tenor];

pub fn voice_for_instrument_position(position: usize) -> Voice {
    VOICE_PERMUTATION[position % 3]
}

/// A single instrument's extracted, transposed, range-clamped written part.
#[derive(Debug, Clone)]
pub struct InstrumentPart {
    pub instrument: Instrument,
    pub notes: Vec<NoteEvent>,
}

/// Extract and transpose one instrument's part from the solved progression.
///
/// `sonorities[i]` and `slot_duration` together define each slot's onset and
/// duration; a run of identical non-rest written pitches across consecutive
/// slots is not tied -- each slot emits its own note event, matching the
/// Solver's per-slot sonority granularity.
pub fn extract_instrument_part(
    sonorities: &[Sonority],
    slot_duration: Ticks,
    position: usize,
    instrument: Instrument,
    iteration_cap: u32,
) -> (InstrumentPart, Vec<Warning>) {
    let voice = voice_for_instrument_position(position);
    let mut notes = Vec::with_capacity(sonorities.len());
    let mut warnings = Vec::new();

    for (slot, sonority) in sonorities.iter().enumerate() {
        let onset = slot as u32 * slot_duration;
        if sonority.is_rest() {
            notes.push(NoteEvent { pitch: REST, duration: slot_duration, onset });
            continue;
        }

        let sounding = sonority.get(voice);
        let (clamped, out_of_range) =
            clamp_to_instrument_range(sounding, instrument, iteration_cap);
        if out_of_range {
            let warning = Warning::RangeWarning { slot, voice: voice.name() };
            warn!("{warning}");
            warnings.push(warning);
        }

        let written = clamped + instrument.transposition;
        notes.push(NoteEvent { pitch: written, duration: slot_duration, onset });
    }

    (InstrumentPart { instrument, notes }, warnings)
}

fn clamp_to_instrument_range(pitch: Pitch, instrument: Instrument, cap: u32) -> (Pitch, bool) {
    if is_rest(pitch) {
        return (pitch, false);
    }

    let mut p = pitch;
    let mut iterations = 0;
    while p < instrument.min_midi && iterations < cap {
        p += 12;
        iterations += 1;
    }
    while p > instrument.max_midi && iterations < cap {
        p -= 12;
        iterations += 1;
    }

    let out_of_range = p < instrument.min_midi || p > instrument.max_midi;
    (p.clamp(instrument.min_midi, instrument.max_midi), out_of_range)
}
