//! Key/Scale Analyzer.
//!
//! Converts a key signature (`fifths`, `mode`) into a tonic pitch class and
//! a diatonic scale-degree table, and labels melody pitches by scale degree
//! or "chromatic".

/// Declared mode of a score's key signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn parallel(self) -> Mode {
        match self {
            Mode::Major => Mode::Minor,
            Mode::Minor => Mode::Major,
        }
    }

    pub fn from_str_lossy(s: &str) -> Mode {
        if s.eq_ignore_ascii_case("minor") {
            Mode::Minor
        } else {
            Mode::Major
        }
    }
}

/// Circle-of-fifths table: `fifths` (`-7..=7`) to `(major_tonic_pc,
/// relative_minor_tonic_pc)`, indexed by `fifths + 7`.
const CIRCLE_OF_FIFTHS: [(i32, i32); 15] = [
    (11, 8),  // -7: Cb major / Ab minor
    (6, 3),   // -6
    (1, 10),  // -5
    (8, 5),   // -4
    (3, 0),   // -3
    (10, 7),  // -2
    (5, 2),   // -1
    (0, 9),   // 0: C major / A minor
    (7, 4),   // 1: G major / E minor
    (2, 11),  // 2: D major / B minor
    (9, 6),   // 3: A major / F# minor
    (4, 1),   // 4: E major / C# minor
    (11, 8),  // 5: B major / G# minor
    (6, 3),   // 6: F# major / D# minor
    (1, 10),  // 7: C# major / A# minor
];

/// Major-scale interval pattern in semitones from the tonic.
const MAJOR_INTERVALS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Natural-minor interval pattern in semitones from the tonic.
const MINOR_INTERVALS: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

/// A resolved key: tonic pitch class, mode, and its seven diatonic pitch classes.
#[derive(Debug, Clone, Copy)]
pub struct Key {
    pub fifths: i32,
    pub mode: Mode,
    pub tonic_pc: i32,
    scale_degrees: [i32; 7],
}

impl Key {
    /// Build a key from `(fifths, mode)`. `fifths` is clamped into `[-7, 7]`.
    pub fn from_fifths(fifths: i32, mode: Mode) -> Self {
        let fifths = fifths.clamp(-7, 7);
        let (major_tonic, minor_tonic) = CIRCLE_OF_FIFTHS[(fifths + 7) as usize];
        let tonic_pc = match mode {
            Mode::Major => major_tonic,
            Mode::Minor => minor_tonic,
        };
        let intervals = match mode {
            Mode::Major => MAJOR_INTERVALS,
            Mode::Minor => MINOR_INTERVALS,
        };
        let mut scale_degrees = [0; 7];
        for (i, iv) in intervals.iter().enumerate() {
            scale_degrees[i] = (tonic_pc + iv).rem_euclid(12);
        }
        Key {
            fifths,
            mode,
            tonic_pc,
            scale_degrees,
        }
    }

    /// The key sharing this key's key signature but with the parallel mode
    /// (major<->minor on the same tonic), used for modal-mixture borrowing
    /// (see `selector.rs` for how borrowed triads are offered as candidates).
    pub fn parallel(&self) -> Key {
        let intervals = match self.mode.parallel() {
            Mode::Major => MAJOR_INTERVALS,
            Mode::Minor => MINOR_INTERVALS,
        };
        let mut scale_degrees = [0; 7];
        for (i, iv) in intervals.iter().enumerate() {
            scale_degrees[i] = (self.tonic_pc + iv).rem_euclid(12);
        }
        Key {
            fifths: self.fifths,
            mode: self.mode.parallel(),
            tonic_pc: self.tonic_pc,
            scale_degrees,
        }
    }

    /// The seven diatonic pitch classes, tonic first.
    pub fn scale_degrees(&self) -> [i32; 7] {
        self.scale_degrees
    }

    /// Scale degree (`0..7`) of a pitch class, or `None` if chromatic.
    pub fn degree_of(&self, pitch_class: i32) -> Option<usize> {
        self.scale_degrees.iter().position(|&d| d == pitch_class)
    }

    /// Diatonic step index (`0=C..6=B`) whose natural pitch class equals
    /// `pitch_class` under this key's degree-to-letter mapping. Used by
    /// [`crate::pitch::spell`] to prefer a spelling with no accidental.
    pub fn step_for_diatonic_pitch_class(&self, pitch_class: i32) -> Option<u8> {
        // Map degree index -> diatonic step letter by walking the circle of
        // fifths' letter-name convention: degree i of the major scale is
        // letter (tonic_letter + i) mod 7. We recover tonic_letter from the
        // tonic's pitch class assuming standard spelling (sharps/flats never
        // change the letter for the tonic itself across fifths in [-7,7]).
        let tonic_letter = tonic_letter_index(self.tonic_pc, self.fifths);
        let degree = self.degree_of(pitch_class)?;
        Some(((tonic_letter + degree) % 7) as u8)
    }
}

/// Map a tonic pitch class + fifths to its diatonic letter index (`0=C..6=B`).
/// Needed because e.g. pitch class 1 is spelled Db (fifths<0) or C# (fifths>=0).
fn tonic_letter_index(tonic_pc: i32, fifths: i32) -> i32 {
    const SHARP_TONIC_LETTERS: [i32; 12] = [0, 0, 1, 1, 2, 3, 3, 4, 4, 5, 5, 6];
    const FLAT_TONIC_LETTERS: [i32; 12] = [0, 1, 1, 2, 2, 3, 4, 4, 5, 5, 6, 6];
    if fifths >= 0 {
        SHARP_TONIC_LETTERS[tonic_pc as usize]
    } else {
        FLAT_TONIC_LETTERS[tonic_pc as usize]
    }
}
