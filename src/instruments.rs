//! Built-in instrument catalog.

/// Clef sign as written in MusicXML `<clef><sign>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClefSign {
    G,
    F,
    C,
}

impl ClefSign {
    pub fn as_str(self) -> &'static str {
        match self {
            ClefSign::G => "G",
            ClefSign::F => "F",
            ClefSign::C => "C",
        }
    }
}

/// A closed, tagged description of one orchestral/vocal instrument.
#[derive(Debug, Clone, Copy)]
pub struct Instrument {
    pub name: &'static str,
    pub clef_sign: ClefSign,
    pub clef_line: u8,
    pub min_midi: i32,
    pub max_midi: i32,
    /// Semitones added to the sounding pitch to get the written pitch.
    pub transposition: i32,
}

/// Fallback descriptor used when a requested instrument name is not in the
/// built-in catalog; this is not an error, just a `Warning`.
pub const OTHER: Instrument = Instrument {
    name: "Other",
    clef_sign: ClefSign::G,
    clef_line: 2,
    min_midi: 40,
    max_midi: 84,
    transposition: 0,
};

/// The twelve built-in instruments, in catalog order.
pub const CATALOG: [Instrument; 12] = [
    Instrument { name: "Violin", clef_sign: ClefSign::G, clef_line: 2, min_midi: 55, max_midi: 96, transposition: 0 },
    Instrument { name: "Viola", clef_sign: ClefSign::C, clef_line: 3, min_midi: 48, max_midi: 77, transposition: 0 },
    Instrument { name: "Cello", clef_sign: ClefSign::F, clef_line: 4, min_midi: 36, max_midi: 80, transposition: 0 },
    Instrument { name: "Flute", clef_sign: ClefSign::G, clef_line: 2, min_midi: 60, max_midi: 99, transposition: 0 },
    Instrument { name: "Oboe", clef_sign: ClefSign::G, clef_line: 2, min_midi: 58, max_midi: 94, transposition: 0 },
    Instrument { name: "B-flat Clarinet", clef_sign: ClefSign::G, clef_line: 2, min_midi: 53, max_midi: 98, transposition: 2 },
    Instrument { name: "Bassoon", clef_sign: ClefSign::F, clef_line: 4, min_midi: 34, max_midi: 74, transposition: 0 },
    Instrument { name: "B-flat Trumpet", clef_sign: ClefSign::G, clef_line: 2, min_midi: 53, max_midi: 86, transposition: 2 },
    Instrument { name: "F Horn", clef_sign: ClefSign::G, clef_line: 2, min_midi: 41, max_midi: 84, transposition: 7 },
    Instrument { name: "Tuba", clef_sign: ClefSign::F, clef_line: 4, min_midi: 21, max_midi: 53, transposition: 0 },
    Instrument { name: "Soprano", clef_sign: ClefSign::G, clef_line: 2, min_midi: 60, max_midi: 84, transposition: 0 },
    Instrument { name: "Tenor Voice", clef_sign: ClefSign::G, clef_line: 2, min_midi: 48, max_midi: 67, transposition: 12 },
];

/// Resolve a requested instrument name, case-insensitively, falling back to
/// [`OTHER`] when unrecognized.
pub fn resolve(name: &str) -> Instrument {
    CATALOG
        .iter()
        .copied()
        .find(|i| i.name.eq_ignore_ascii_case(name))
        .unwrap_or(OTHER)
}

/// Whether `name` matches a built-in catalog entry.
pub fn is_known(name: &str) -> bool {
    CATALOG.iter().any(|i| i.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_instrument_case_insensitively() {
        let clarinet = resolve("b-flat clarinet");
        assert_eq!(clarinet.name, "B-flat Clarinet");
        assert_eq!(clarinet.transposition, 2);
    }

    #[test]
    fn unknown_instrument_falls_back_to_other() {
        let unknown = resolve("Kazoo");
        assert_eq!(unknown.name, "Other");
        assert!(!is_known("Kazoo"));
    }

    #[test]
    fn catalog_has_twelve_entries() {
        assert_eq!(CATALOG.len(), 12);
    }
}
