//! Voice-Leading Solver.
//!
//! For every slot, enumerates SATB realizations of the slot's chord with the
//! soprano pinned to the melody pitch, filters them by doubling priority
//! (root over fifth over third), scores the survivors against the previous
//! sonority, and keeps the minimum-scoring candidate (PRNG tie-break).

use log::{debug, warn};

use crate::cancel::CancellationToken;
use crate::chord::Chord;
use crate::config::{EngineConfig, VoiceRange};
use crate::error::HarmonizeError;
use crate::pitch::{is_rest, Pitch, REST};
use crate::prng::Prng;
use crate::sonority::{Sonority, Voice};
use crate::warnings::Warning;

/// Run the solver over a whole progression, one sonority per slot.
/// Checks `cancel` between slots, per spec.md §5, failing with `Cancelled`
/// rather than returning a partial progression.
///
/// `chords[i]` is `None` exactly where `melody[i]` is a rest; the caller
/// (the Chord Selector always emits a chord, even under a rest, by
/// inheriting the previous one) is expected to pass the inherited chord
/// there too -- rests are distinguished by `melody[i] == REST` alone.
pub fn voice_progression(
    chords: &[Chord],
    melody: &[Pitch],
    config: &EngineConfig,
    prng: &mut Prng,
    cancel: &CancellationToken,
) -> Result<(Vec<Sonority>, Vec<Warning>), HarmonizeError> {
    let mut sonorities = Vec::with_capacity(melody.len());
    let mut warnings = Vec::new();
    let mut last_non_rest: Option<Sonority> = None;

    for (slot, (&chord, &pitch)) in chords.iter().zip(melody.iter()).enumerate() {
        if cancel.is_cancelled() {
            return Err(HarmonizeError::Cancelled);
        }

        if is_rest(pitch) {
            sonorities.push(Sonority::ALL_REST);
            continue;
        }

        let (sonority, out_of_range) =
            voice_chord(&chord, pitch, last_non_rest, config, prng);
        debug!(
            "slot {slot}: voiced S{} A{} T{} B{}",
            sonority.soprano, sonority.alto, sonority.tenor, sonority.bass
        );
        for voice in &out_of_range {
            let warning = Warning::RangeWarning { slot, voice: voice.name() };
            warn!("{warning}");
            warnings.push(warning);
        }
        sonorities.push(sonority);
        last_non_rest = Some(sonority);
    }

    Ok((sonorities, warnings))
}

/// Voice a single chord against a fixed soprano pitch and the previous
/// non-rest sonority (`None` for the first sounding slot).
fn voice_chord(
    chord: &Chord,
    soprano_pitch: Pitch,
    prev: Option<Sonority>,
    config: &EngineConfig,
    prng: &mut Prng,
) -> (Sonority, Vec<Voice>) {
    let root = chord.root_pc_only();
    let third = chord.third_pc();
    let fifth = chord.fifth_pc();
    let bass_choices = [root, fifth, third];
    let inner_choices = [root, third, fifth];

    let mut raw = Vec::with_capacity(27);
    for &bass_pc in bass_choices.iter() {
        for &alto_pc in inner_choices.iter() {
            for &tenor_pc in inner_choices.iter() {
                let alto_anchor = prev.map(|p| p.alto).unwrap_or(range_mid(config.alto_range));
                let tenor_anchor = prev.map(|p| p.tenor).unwrap_or(range_mid(config.tenor_range));
                let bass_anchor = prev.map(|p| p.bass).unwrap_or(range_mid(config.bass_range));

                let (alto_pitch, alto_oor) =
                    place_pitch_class(alto_pc, config.alto_range, alto_anchor, config.octave_clamp_iteration_cap);
                let (tenor_pitch, tenor_oor) =
                    place_pitch_class(tenor_pc, config.tenor_range, tenor_anchor, config.octave_clamp_iteration_cap);
                let (bass_pitch, bass_oor) =
                    place_pitch_class(bass_pc, config.bass_range, bass_anchor, config.octave_clamp_iteration_cap);

                let soprano_oor =
                    soprano_pitch < config.soprano_range.low || soprano_pitch > config.soprano_range.high;

                let sonority = Sonority {
                    soprano: soprano_pitch,
                    alto: alto_pitch,
                    tenor: tenor_pitch,
                    bass: bass_pitch,
                };

                let mut out_of_range = Vec::new();
                if soprano_oor {
                    out_of_range.push(Voice::Soprano);
                }
                if alto_oor {
                    out_of_range.push(Voice::Alto);
                }
                if tenor_oor {
                    out_of_range.push(Voice::Tenor);
                }
                if bass_oor {
                    out_of_range.push(Voice::Bass);
                }

                raw.push(RawCandidate { sonority, bass_pc, out_of_range });
            }
        }
    }

    match admissible_partition(&raw, root, fifth, third, soprano_pitch) {
        Some(admissible) => {
            let scores: Vec<i32> = admissible
                .iter()
                .map(|c| score_candidate(c, prev, root, third, config))
                .collect();
            let idx = prng.argmin_tie_break(&scores);
            let chosen = &admissible[idx];
            (chosen.sonority, chosen.out_of_range.clone())
        }
        None => fallback_voicing(chord, soprano_pitch, config),
    }
}

struct RawCandidate {
    sonority: Sonority,
    bass_pc: i32,
    out_of_range: Vec<Voice>,
}

/// Partition raw candidates by which chord tone they double, requiring all
/// three chord tones present exactly `{2,1,1}` times across the four
/// voices, and return the highest-priority non-empty partition
/// (root > fifth > third), per the doubling-priority rule.
fn admissible_partition<'a>(
    raw: &'a [RawCandidate],
    root: i32,
    fifth: i32,
    third: i32,
    soprano_pitch: Pitch,
) -> Option<Vec<&'a RawCandidate>> {
    let soprano_pc = soprano_pitch.rem_euclid(12);

    let mut doubles_root = Vec::new();
    let mut doubles_fifth = Vec::new();
    let mut doubles_third = Vec::new();

    for candidate in raw {
        let pcs = [soprano_pc, candidate.sonority.alto.rem_euclid(12), candidate.sonority.tenor.rem_euclid(12), candidate.bass_pc];
        let root_count = pcs.iter().filter(|&&pc| pc == root).count();
        let third_count = pcs.iter().filter(|&&pc| pc == third).count();
        let fifth_count = pcs.iter().filter(|&&pc| pc == fifth).count();
        if root_count + third_count + fifth_count != 4 {
            continue; // a voice landed outside the triad's pitch classes
        }
        if root_count == 0 || third_count == 0 || fifth_count == 0 {
            continue; // incomplete triad
        }
        if root_count == 2 {
            doubles_root.push(candidate);
        } else if fifth_count == 2 {
            doubles_fifth.push(candidate);
        } else if third_count == 2 {
            doubles_third.push(candidate);
        }
    }

    if !doubles_root.is_empty() {
        Some(doubles_root)
    } else if !doubles_fifth.is_empty() {
        Some(doubles_fifth)
    } else if !doubles_third.is_empty() {
        Some(doubles_third)
    } else {
        None
    }
}

fn score_candidate(
    candidate: &RawCandidate,
    prev: Option<Sonority>,
    root: i32,
    third: i32,
    config: &EngineConfig,
) -> i32 {
    let s = candidate.sonority;
    let mut score = 0;

    if s.soprano < s.alto {
        score += config.crossing_penalty;
    }
    if s.alto < s.tenor {
        score += config.crossing_penalty;
    }
    if s.tenor < s.bass {
        score += config.crossing_penalty;
    }

    if let Some(prev) = prev {
        let pairs = [
            (s.soprano, prev.soprano, s.alto, prev.alto),
            (s.soprano, prev.soprano, s.tenor, prev.tenor),
            (s.soprano, prev.soprano, s.bass, prev.bass),
            (s.alto, prev.alto, s.tenor, prev.tenor),
            (s.alto, prev.alto, s.bass, prev.bass),
            (s.tenor, prev.tenor, s.bass, prev.bass),
        ];
        for (cur_a, prev_a, cur_b, prev_b) in pairs {
            if is_parallel_perfect(prev_a, prev_b, cur_a, cur_b) {
                score += config.parallel_penalty;
            }
        }

        for (cur, prior) in [(s.alto, prev.alto), (s.tenor, prev.tenor), (s.bass, prev.bass)] {
            let motion = (cur - prior).abs();
            score += motion * config.motion_penalty_per_semitone;
            if motion > config.leap_threshold_semitones {
                score += config.leap_penalty;
            }
        }

        for (cur, prior) in [
            (s.soprano, prev.soprano),
            (s.alto, prev.alto),
            (s.tenor, prev.tenor),
            (s.bass, prev.bass),
        ] {
            if cur == prior {
                score += config.common_tone_bonus;
            }
        }
    }

    if candidate.bass_pc == root {
        // root position, no penalty
    } else if candidate.bass_pc == third {
        score += config.first_inversion_penalty;
    } else {
        score += config.second_inversion_penalty;
    }

    score += config.range_violation_penalty * candidate.out_of_range.len() as i32;

    score
}

/// Two voices move in the same direction while maintaining a perfect fifth
/// or octave (glossary: "parallel fifths/octaves").
fn is_parallel_perfect(prev_a: Pitch, prev_b: Pitch, cur_a: Pitch, cur_b: Pitch) -> bool {
    let prev_interval = (prev_a - prev_b).abs().rem_euclid(12);
    if prev_interval != 0 && prev_interval != 7 {
        return false;
    }
    let cur_interval = (cur_a - cur_b).abs().rem_euclid(12);
    if cur_interval != prev_interval {
        return false;
    }
    let motion_a = cur_a - prev_a;
    let motion_b = cur_b - prev_b;
    if motion_a == 0 || motion_b == 0 {
        return false;
    }
    (motion_a > 0) == (motion_b > 0)
}

fn range_mid(range: VoiceRange) -> Pitch {
    (range.low + range.high) / 2
}

/// Find the pitch nearest `anchor` with pitch class `pc`, then clamp it into
/// `range` by octave displacement (bounded by `cap`). Returns the placed
/// pitch and whether it still lies outside `range` after the cap.
fn place_pitch_class(pc: i32, range: VoiceRange, anchor: Pitch, cap: u32) -> (Pitch, bool) {
    let mut best = anchor;
    let mut best_dist = i32::MAX;
    for k in -2..=2 {
        let candidate = (anchor.div_euclid(12) + k) * 12 + pc;
        let dist = (candidate - anchor).abs();
        if dist < best_dist {
            best_dist = dist;
            best = candidate;
        }
    }

    let mut pitch = best;
    let mut iterations = 0;
    while pitch < range.low && iterations < cap {
        pitch += 12;
        iterations += 1;
    }
    while pitch > range.high && iterations < cap {
        pitch -= 12;
        iterations += 1;
    }

    let out_of_range = pitch < range.low || pitch > range.high;
    let clamped = pitch.clamp(range.low, range.high);
    (clamped, out_of_range)
}

/// Hard fallback when no candidate realizes a complete triad (degenerate
/// ranges or an unreachable melody pitch): root at the bottom of the bass
/// range, fifth in the tenor, third in the alto, soprano left unchanged.
fn fallback_voicing(chord: &Chord, soprano_pitch: Pitch, config: &EngineConfig) -> (Sonority, Vec<Voice>) {
    let bass = config.bass_range.low + (chord.root_pc_only() - config.bass_range.low).rem_euclid(12);
    let (tenor, tenor_oor) = place_pitch_class(
        chord.fifth_pc(),
        config.tenor_range,
        range_mid(config.tenor_range),
        config.octave_clamp_iteration_cap,
    );
    let (alto, alto_oor) = place_pitch_class(
        chord.third_pc(),
        config.alto_range,
        range_mid(config.alto_range),
        config.octave_clamp_iteration_cap,
    );

    let sonority = Sonority { soprano: soprano_pitch, alto, tenor, bass };
    let mut out_of_range = vec![Voice::Bass];
    if alto_oor {
        out_of_range.push(Voice::Alto);
    }
    if tenor_oor {
        out_of_range.push(Voice::Tenor);
    }
    (sonority, out_of_range)
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
    fn first_sonority_is_ordered_and_doubles_root() {
        let key = Key::from_fifths(0, Mode::Major);
        let chord = Chord::diatonic(&key, Degree::I);
        let cfg = config();
        let mut prng = Prng::from_seed(1);
        let (sonority, _) = voice_chord(&chord, 72, None, &cfg, &mut prng);
        let pcs = [
            sonority.soprano.rem_euclid(12),
            sonority.alto.rem_euclid(12),
            sonority.tenor.rem_euclid(12),
            sonority.bass.rem_euclid(12),
        ];
        assert_eq!(pcs.iter().filter(|&&pc| pc == 0).count(), 2);
    }

    #[test]
    fn no_rest_gap_breaks_parallel_motion_lookback() {
        let key = Key::from_fifths(0, Mode::Major);
        let chords = vec![
            Chord::diatonic(&key, Degree::I),
            Chord::diatonic(&key, Degree::I),
            Chord::diatonic(&key, Degree::V),
        ];
        let melody = vec![72, REST, 71];
        let cfg = config();
        let mut prng = Prng::from_seed(1);
        let cancel = CancellationToken::new();
        let (sonorities, _) = voice_progression(&chords, &melody, &cfg, &mut prng, &cancel).unwrap();
        assert!(sonorities[1].is_rest());
        assert!(!sonorities[2].is_rest());
    }

    #[test]
    fn cancellation_is_observed_before_completion() {
        let key = Key::from_fifths(0, Mode::Major);
        let chords = vec![Chord::diatonic(&key, Degree::I); 4];
        let melody = vec![72, 74, 76, 77];
        let cfg = config();
        let mut prng = Prng::from_seed(1);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = voice_progression(&chords, &melody, &cfg, &mut prng, &cancel).unwrap_err();
        assert!(matches!(err, HarmonizeError::Cancelled));
    }

    #[test]
    fn parallel_fifths_detected_symmetrically() {
        assert!(is_parallel_perfect(60, 53, 62, 55)); // both up a tone, P5 maintained
        assert!(!is_parallel_perfect(60, 53, 60, 53)); // no motion
        assert!(!is_parallel_perfect(60, 53, 62, 50)); // contrary motion
    }

    #[test]
    fn place_pitch_class_clamps_into_range() {
        let range = VoiceRange { low: 48, high: 67 };
        let (pitch, out_of_range) = place_pitch_class(0, range, 60, 8);
        assert!(!out_of_range);
        assert!(pitch >= range.low && pitch <= range.high);
        assert_eq!(pitch.rem_euclid(12), 0);
    }
}
