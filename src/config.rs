//! Tunable-but-fixed engine constants.
//!
//! These numbers are not exposed as user-facing knobs; they live here,
//! named, so the rest of the engine and the golden-corpus tests reference
//! one source of truth instead of scattered literals.

/// Inclusive MIDI range for each SATB voice when no instrument clamp applies.
#[derive(Debug, Clone, Copy)]
pub struct VoiceRange {
    pub low: i32,
    pub high: i32,
}

/// Reference SATB ranges and the scoring/refinement constants.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub soprano_range: VoiceRange,
    pub alto_range: VoiceRange,
    pub tenor_range: VoiceRange,
    pub bass_range: VoiceRange,

    /// Penalty per parallel perfect fifth/octave against the previous sonority.
    pub parallel_penalty: i32,
    /// Penalty per voice-crossing relative to S >= A >= T >= B.
    pub crossing_penalty: i32,
    /// Penalty per semitone of motion in A/T/B.
    pub motion_penalty_per_semitone: i32,
    /// Extra penalty per voice whose motion exceeds a perfect fifth (7 semitones).
    pub leap_penalty: i32,
    /// Leaps strictly greater than this many semitones incur `leap_penalty`.
    pub leap_threshold_semitones: i32,
    /// Bonus (applied as a negative score contribution) per common tone retained.
    pub common_tone_bonus: i32,
    /// Penalty when the bass is not the chord root (first inversion).
    pub first_inversion_penalty: i32,
    /// Penalty when the bass is neither root nor third (second inversion).
    pub second_inversion_penalty: i32,
    /// Penalty per voice left outside its reference range after clamping.
    pub range_violation_penalty: i32,

    /// Overall quality score (0-100) below which one refinement pass runs.
    pub refinement_threshold: f64,
    /// Weights for the four sub-scores; must sum to 1.0.
    pub motion_weight: f64,
    pub common_tone_weight: f64,
    pub progression_weight: f64,
    pub range_weight: f64,

    /// Hard cap on octave-displacement iterations when clamping a pitch into range.
    pub octave_clamp_iteration_cap: u32,

    /// Cache capacity (entry count) before oldest-eviction kicks in.
    pub cache_capacity: usize,
    /// Cache entry time-to-live.
    pub cache_ttl_minutes: i64,

    /// Reject inputs with more than this many note events.
    pub max_note_events: usize,
    /// Reject requests for more than this many instruments.
    pub max_instruments: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            soprano_range: VoiceRange { low: 60, high: 81 },
            alto_range: VoiceRange { low: 55, high: 74 },
            tenor_range: VoiceRange { low: 48, high: 67 },
            bass_range: VoiceRange { low: 36, high: 60 },

            parallel_penalty: 10,
            crossing_penalty: 4,
            motion_penalty_per_semitone: 1,
            leap_penalty: 3,
            leap_threshold_semitones: 7,
            common_tone_bonus: -2,
            first_inversion_penalty: 6,
            second_inversion_penalty: 10,
            range_violation_penalty: 20,

            refinement_threshold: 70.0,
            motion_weight: 0.3,
            common_tone_weight: 0.25,
            progression_weight: 0.25,
            range_weight: 0.2,

            octave_clamp_iteration_cap: 8,

            cache_capacity: 100,
            cache_ttl_minutes: 30,

            max_note_events: 10_000,
            max_instruments: 4,
        }
    }
}

impl EngineConfig {
    pub fn range_for(&self, voice: crate::sonority::Voice) -> VoiceRange {
        use crate::sonority::Voice::*;
        match voice {
            Soprano => self.soprano_range,
            Alto => self.alto_range,
            Tenor => self.tenor_range,
            Bass => self.bass_range,
        }
    }
}

/// Seed XOR'd into the PRNG seed before the one allowed refinement pass.
pub const REFINEMENT_RESEED_XOR: u64 = 0x9E3779B9;
