//! Quality Scorer and the one-pass refinement.

use crate::chord::{transition_weight, Chord};
use crate::config::EngineConfig;
use crate::pitch::Pitch;
use crate::sonority::{Sonority, Voice};

/// Threshold above which a degree transition counts as "progressing well"
/// for `progression_score`: a degree transition "progresses well" when its
/// functional transition weight is at least this value.
const PROGRESSION_WEIGHT_THRESHOLD: u32 = 2;
/// Points deducted from `range_score` per range violation.
const RANGE_VIOLATION_PENALTY: f64 = 10.0;

/// The four sub-scores (each on a `0..=100` scale, clamped) and their
/// weighted combination.
#[derive(Debug, Clone, Copy)]
pub struct QualityReport {
    pub motion_score: f64,
    pub common_tone_score: f64,
    pub progression_score: f64,
    pub range_score: f64,
    pub overall: f64,
}

/// Score a complete progression of sonorities against their chords.
pub fn score_progression(sonorities: &[Sonority], chords: &[Chord], config: &EngineConfig) -> QualityReport {
    let motion_score = motion_subscore(sonorities, config);
    let common_tone_score = common_tone_subscore(sonorities);
    let progression_score = progression_subscore(chords);
    let range_score = range_subscore(sonorities, config);

    let overall = config.motion_weight * motion_score
        + config.common_tone_weight * common_tone_score
        + config.progression_weight * progression_score
        + config.range_weight * range_score;

    QualityReport {
        motion_score,
        common_tone_score,
        progression_score,
        range_score,
        overall,
    }
}

/// `100 - mean(|ΔA| + |ΔT| + |ΔB|) * motion_penalty_per_semitone`, summed
/// per transition (not averaged across voices), clamped to `0..=100`.
fn motion_subscore(sonorities: &[Sonority], config: &EngineConfig) -> f64 {
    let pairs = consecutive_non_rest_pairs(sonorities);
    if pairs.is_empty() {
        return 100.0;
    }

    let total: i32 = pairs
        .iter()
        .map(|(prev, cur)| {
            [Voice::Alto, Voice::Tenor, Voice::Bass]
                .iter()
                .map(|&v| (cur.get(v) - prev.get(v)).abs())
                .sum::<i32>()
        })
        .sum();
    let mean = total as f64 / pairs.len() as f64;

    (100.0 - mean * config.motion_penalty_per_semitone as f64).clamp(0.0, 100.0)
}

/// Fraction of consecutive non-rest sonority pairs retaining at least one
/// common tone in the same voice, `×100`.
fn common_tone_subscore(sonorities: &[Sonority]) -> f64 {
    let pairs = consecutive_non_rest_pairs(sonorities);
    if pairs.is_empty() {
        return 100.0;
    }

    let retained = pairs
        .iter()
        .filter(|(prev, cur)| Voice::ALL.iter().any(|&v| prev.get(v) == cur.get(v)))
        .count();

    100.0 * retained as f64 / pairs.len() as f64
}

/// Fraction of chord-to-chord transitions whose degree pair has a
/// functional transition weight `>= 2`, `×100`.
fn progression_subscore(chords: &[Chord]) -> f64 {
    if chords.len() < 2 {
        return 100.0;
    }

    let strong = chords
        .windows(2)
        .filter(|w| transition_weight(w[0].degree, w[1].degree) >= PROGRESSION_WEIGHT_THRESHOLD)
        .count();
    let total = chords.len() - 1;

    100.0 * strong as f64 / total as f64
}

/// `100 - 10 * count of range violations`, floored at `0`.
fn range_subscore(sonorities: &[Sonority], config: &EngineConfig) -> f64 {
    let mut violations = 0u32;
    for s in sonorities {
        if s.is_rest() {
            continue;
        }
        for voice in Voice::ALL {
            let range = config.range_for(voice);
            let pitch: Pitch = s.get(voice);
            if pitch < range.low || pitch > range.high {
                violations += 1;
            }
        }
    }

    (100.0 - RANGE_VIOLATION_PENALTY * violations as f64).max(0.0)
}

fn consecutive_non_rest_pairs(sonorities: &[Sonority]) -> Vec<(Sonority, Sonority)> {
    let mut pairs = Vec::new();
    let mut prev: Option<Sonority> = None;
    for &s in sonorities {
        if s.is_rest() {
            continue;
        }
        if let Some(p) = prev {
            pairs.push((p, s));
        }
        prev = Some(s);
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::Degree;
    use crate::key::{Key, Mode};

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn static_progression_scores_perfectly_on_motion_and_common_tone() {
        let s = Sonority { soprano: 72, alto: 67, tenor: 64, bass: 48 };
        let sonorities = vec![s, s, s];
        let key = Key::from_fifths(0, Mode::Major);
        let chords = vec![
            Chord::diatonic(&key, Degree::I),
            Chord::diatonic(&key, Degree::V),
            Chord::diatonic(&key, Degree::I),
        ];
        let report = score_progression(&sonorities, &chords, &config());
        assert_eq!(report.motion_score, 100.0);
        assert_eq!(report.common_tone_score, 100.0);
        assert_eq!(report.progression_score, 100.0); // I->V->I both weight >= 2
        assert_eq!(report.overall, 100.0);
    }

    #[test]
    fn empty_progression_scores_fall_back_to_perfect() {
        let report = score_progression(&[], &[], &config());
        assert_eq!(report.overall, 100.0);
    }

    #[test]
    fn out_of_range_voicing_lowers_range_score() {
        let key = Key::from_fifths(0, Mode::Major);
        let s = Sonority { soprano: 72, alto: 67, tenor: 64, bass: 20 };
        let chords = vec![Chord::diatonic(&key, Degree::I)];
        let report = score_progression(&[s], &chords, &config());
        assert_eq!(report.range_score, 90.0); // one violation: bass 20 < 36
    }

    #[test]
    fn weak_progression_lowers_progression_score() {
        let key = Key::from_fifths(0, Mode::Major);
        let chords = vec![
            Chord::diatonic(&key, Degree::Ii),
            Chord::diatonic(&key, Degree::Iii), // unlisted pair, weight 1
        ];
        let report = score_progression(&[], &chords, &config());
        assert_eq!(report.progression_score, 0.0);
    }
}
