//! Chord model and the functional degree lattice.

use crate::key::Key;

/// Triad quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Major,
    Minor,
    Diminished,
}

/// A functional scale degree, `I` through `vii°`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Degree {
    I = 0,
    Ii = 1,
    Iii = 2,
    Iv = 3,
    V = 4,
    Vi = 5,
    ViiDim = 6,
}

impl Degree {
    pub const ALL: [Degree; 7] = [
        Degree::I,
        Degree::Ii,
        Degree::Iii,
        Degree::Iv,
        Degree::V,
        Degree::Vi,
        Degree::ViiDim,
    ];

    fn index(self) -> usize {
        self as u8 as usize
    }
}

/// A realized triad: root pitch class, quality, and functional degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub root_pc: i32,
    pub quality: Quality,
    pub degree: Degree,
}

impl Chord {
    /// Build the diatonic triad for `degree` within `key` by stacking thirds
    /// on the key's own scale-degree table, so major and (strictly diatonic,
    /// natural-minor) keys each get their own diatonic quality pattern,
    /// strictly from the key's own degree table, rather than a single
    /// hardcoded major-scale quality row.
    pub fn diatonic(key: &Key, degree: Degree) -> Chord {
        let degrees = key.scale_degrees();
        let i = degree.index();
        let root_pc = degrees[i];
        let third_pc = degrees[(i + 2) % 7];
        let fifth_pc = degrees[(i + 4) % 7];
        let third_interval = (third_pc - root_pc).rem_euclid(12);
        let fifth_interval = (fifth_pc - root_pc).rem_euclid(12);
        let quality = match (third_interval, fifth_interval) {
            (4, 7) => Quality::Major,
            (3, 6) => Quality::Diminished,
            _ => Quality::Minor,
        };
        Chord { root_pc, quality, degree }
    }

    /// The three chord-tone pitch classes: root, third, fifth.
    pub fn tones(&self) -> [i32; 3] {
        let (third, fifth) = match self.quality {
            Quality::Major => (4, 7),
            Quality::Minor => (3, 7),
            Quality::Diminished => (3, 6),
        };
        [
            self.root_pc,
            (self.root_pc + third).rem_euclid(12),
            (self.root_pc + fifth).rem_euclid(12),
        ]
    }

    pub fn contains_pitch_class(&self, pc: i32) -> bool {
        self.tones().contains(&pc)
    }

    /// The root/third/fifth classified by role, used by the doubling-priority rule.
    pub fn root_pc_only(&self) -> i32 {
        self.root_pc
    }

    pub fn third_pc(&self) -> i32 {
        self.tones()[1]
    }

    pub fn fifth_pc(&self) -> i32 {
        self.tones()[2]
    }
}

/// Representative transition weight table (rows = previous degree, columns =
/// next degree). Unlisted pairs default to weight 1.
pub fn transition_weight(prev: Degree, next: Degree) -> u32 {
    use Degree::*;
    match (prev, next) {
        (I, Iv) => 3,
        (I, V) => 3,
        (I, Vi) => 2,
        (Iv, V) => 3,
        (V, I) => 4,
        (V, Vi) => 2,
        (Ii, V) => 3,
        (Vi, Ii) => 2,
        (ViiDim, I) => 3,
        _ => 1,
    }
}

/// Weight used for the very first slot, which has no previous chord:
/// `I` weighted 5, `V` weighted 2, others default to 1.
pub fn initial_weight(degree: Degree) -> u32 {
    match degree {
        Degree::I => 5,
        Degree::V => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Mode;

    #[test]
    fn c_major_one_chord_tones() {
        let key = Key::from_fifths(0, Mode::Major);
        let chord = Chord::diatonic(&key, Degree::I);
        assert_eq!(chord.root_pc, 0);
        assert_eq!(chord.quality, Quality::Major);
        assert_eq!(chord.tones(), [0, 4, 7]);
    }

    #[test]
    fn c_major_vii_is_diminished() {
        let key = Key::from_fifths(0, Mode::Major);
        let chord = Chord::diatonic(&key, Degree::ViiDim);
        assert_eq!(chord.quality, Quality::Diminished);
        assert_eq!(chord.root_pc, 11); // B
        assert_eq!(chord.tones(), [11, 2, 5]); // B D F
    }

    #[test]
    fn a_minor_i_chord_is_minor_quality() {
        let key = Key::from_fifths(0, Mode::Minor); // A minor
        let chord = Chord::diatonic(&key, Degree::I);
        assert_eq!(chord.root_pc, 9); // A
        assert_eq!(chord.quality, Quality::Minor);
        assert_eq!(chord.tones(), [9, 0, 4]); // A C E
    }

    #[test]
    fn a_minor_iii_chord_is_major_quality() {
        let key = Key::from_fifths(0, Mode::Minor);
        let chord = Chord::diatonic(&key, Degree::Iii);
        assert_eq!(chord.root_pc, 0); // C
        assert_eq!(chord.quality, Quality::Major); // relative major III
    }

    #[test]
    fn transition_weights_match_spec_table() {
        assert_eq!(transition_weight(Degree::I, Degree::Iv), 3);
        assert_eq!(transition_weight(Degree::V, Degree::I), 4);
        assert_eq!(transition_weight(Degree::Ii, Degree::Iii), 1); // unlisted -> default
    }

    #[test]
    fn initial_weights_favor_tonic() {
        assert_eq!(initial_weight(Degree::I), 5);
        assert_eq!(initial_weight(Degree::V), 2);
        assert_eq!(initial_weight(Degree::Ii), 1);
    }
}
