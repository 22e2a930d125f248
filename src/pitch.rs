//! MIDI pitch representation and diatonic spelling.
//!
//! Pitch is kept as a plain signed integer in the MIDI convention rather
//! than a letter/accidental/octave triple; the triple is derived only at
//! emission time (see [`spell`]).

use crate::key::Key;

/// Sentinel pitch used for a rest. MIDI pitches are otherwise `0..=127`.
pub const REST: i32 = -1;

/// A sounding (or rest) pitch, MIDI convention.
pub type Pitch = i32;

/// Whether a pitch is the rest sentinel.
pub fn is_rest(p: Pitch) -> bool {
    p == REST
}

/// Pitch class `0..12` of a sounding pitch. Panics on `REST`; callers must
/// filter rests before asking for a pitch class.
pub fn pitch_class(p: Pitch) -> i32 {
    debug_assert!(!is_rest(p), "pitch_class called on REST");
    p.rem_euclid(12)
}

/// The diatonic step letters, in `step` index order used by the XML dialect
/// (`0 = C .. 6 = B`).
const STEP_NAMES: [&str; 7] = ["C", "D", "E", "F", "G", "A", "B"];

/// Natural pitch class for each step index (`0 = C .. 6 = B`).
const STEP_NATURAL_PC: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// A written `(step, alter, octave)` triple ready for XML emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpelledPitch {
    /// Step index, `0 = C .. 6 = B`.
    pub step: u8,
    /// Accidental in semitones (`-2..=2` in practice).
    pub alter: i32,
    /// Octave number in the MusicXML convention (octave 4 contains middle C).
    pub octave: i32,
}

impl SpelledPitch {
    /// The `<step>` element text.
    pub fn step_name(&self) -> &'static str {
        STEP_NAMES[self.step as usize]
    }
}

/// Convert `(step, alter, octave)` to a MIDI pitch:
/// `12*(octave+1) + pc_table[step] + alter`.
pub fn to_midi(step: u8, alter: i32, octave: i32) -> Pitch {
    12 * (octave + 1) + STEP_NATURAL_PC[step as usize] + alter
}

/// Spell a sounding MIDI pitch as `(step, alter, octave)` using the key's
/// diatonic scale to prefer the spelling that needs no accidental, then
/// naturals, then sharps when `fifths >= 0` or flats when `fifths < 0`.
pub fn spell(pitch: Pitch, key: &Key) -> SpelledPitch {
    debug_assert!(!is_rest(pitch));
    let pc = pitch_class(pitch);
    let octave = pitch / 12 - 1;

    // Prefer the step whose diatonic scale degree lands exactly on `pc`.
    if let Some(step) = key.step_for_diatonic_pitch_class(pc) {
        return SpelledPitch {
            step,
            alter: pc_signed_distance(STEP_NATURAL_PC[step as usize], pc),
            octave,
        };
    }

    // Not diatonic: fall back to the nearest natural step, spelled with the
    // accidental direction the key signature prefers.
    let prefer_sharp = key.fifths >= 0;
    nearest_natural_spelling(pc, octave, prefer_sharp)
}

/// Smallest signed distance (in semitones, range `-6..=6`) from `from` to `to`
/// on the pitch-class circle.
fn pc_signed_distance(from: i32, to: i32) -> i32 {
    let mut d = (to - from).rem_euclid(12);
    if d > 6 {
        d -= 12;
    }
    d
}

fn nearest_natural_spelling(pc: i32, octave: i32, prefer_sharp: bool) -> SpelledPitch {
    // Try every natural step; pick the closest with accidental magnitude <= 2,
    // breaking ties toward sharps or flats per `prefer_sharp`.
    let mut best: Option<(u8, i32)> = None;
    for (step, &natural) in STEP_NATURAL_PC.iter().enumerate() {
        let dist = pc_signed_distance(natural, pc);
        if dist.abs() > 2 {
            continue;
        }
        let better = match best {
            None => true,
            Some((_, best_dist)) => {
                dist.abs() < best_dist.abs()
                    || (dist.abs() == best_dist.abs()
                        && ((prefer_sharp && dist > best_dist) || (!prefer_sharp && dist < best_dist)))
            }
        };
        if better {
            best = Some((step as u8, dist));
        }
    }
    let (step, alter) = best.unwrap_or((0, pc));
    SpelledPitch { step, alter, octave }
}
