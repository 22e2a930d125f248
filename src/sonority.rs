//! The four-voice SATB sonority.

use crate::pitch::{is_rest, Pitch, REST};

/// One of the four SATB voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Voice {
    Soprano,
    Alto,
    Tenor,
    Bass,
}

impl Voice {
    pub const ALL: [Voice; 4] = [Voice::Soprano, Voice::Alto, Voice::Tenor, Voice::Bass];

    pub fn name(self) -> &'static str {
        match self {
            Voice::Soprano => "soprano",
            Voice::Alto => "alto",
            Voice::Tenor => "tenor",
            Voice::Bass => "bass",
        }
    }
}

/// Four simultaneous pitches realizing one chord, `S >= A >= T >= B` when
/// non-rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sonority {
    pub soprano: Pitch,
    pub alto: Pitch,
    pub tenor: Pitch,
    pub bass: Pitch,
}

impl Sonority {
    pub const ALL_REST: Sonority = Sonority {
        soprano: REST,
        alto: REST,
        tenor: REST,
        bass: REST,
    };

    pub fn is_rest(&self) -> bool {
        is_rest(self.soprano)
    }

    pub fn get(&self, voice: Voice) -> Pitch {
        match voice {
            Voice::Soprano => self.soprano,
            Voice::Alto => self.alto,
            Voice::Tenor => self.tenor,
            Voice::Bass => self.bass,
        }
    }

    /// `S >= A >= T >= B` ordering holds.
    pub fn is_ordered(&self) -> bool {
        self.soprano >= self.alto && self.alto >= self.tenor && self.tenor >= self.bass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_check() {
        let s = Sonority { soprano: 72, alto: 67, tenor: 64, bass: 48 };
        assert!(s.is_ordered());
        let bad = Sonority { soprano: 60, alto: 67, tenor: 64, bass: 48 };
        assert!(!bad.is_ordered());
    }

    #[test]
    fn rest_sonority_is_all_rest() {
        assert!(Sonority::ALL_REST.is_rest());
    }
}
