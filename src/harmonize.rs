//! Top-level orchestration: wires the Score Reader through the Score Writer
//! behind the cache and cancellation token.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::cache::{compute_key, Cache};
use crate::cancel::CancellationToken;
use crate::config::EngineConfig;
use crate::error::HarmonizeError;
use crate::instruments::{self, Instrument};
use crate::key::{Key, Mode};
use crate::part_extractor::{extract_instrument_part, InstrumentPart};
use crate::pitch::Pitch;
use crate::prng::Prng;
use crate::reader::read_score;
use crate::scorer::{score_progression, QualityReport};
use crate::selector::{select_chords, SelectionRank};
use crate::voicing::voice_progression;
use crate::warnings::Warning;
use crate::writer;

/// A single emitted score document: its serialized content and the filename
/// the outer boundary should offer it under.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub filename: String,
}

/// The two output documents plus diagnostics, returned for a single
/// `harmonize` call.
#[derive(Debug, Clone)]
pub struct Output {
    pub harmony_only: Document,
    pub combined: Document,
    pub warnings: Vec<Warning>,
    pub quality: QualityReport,
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct Metadata {
    pub key_fifths: i32,
    pub mode_is_minor: bool,
    /// Instrument names as requested by the caller, in request order.
    pub instruments: Vec<String>,
    pub refined: bool,
    pub original_filename: Option<String>,
    /// Wall-clock time spent inside the pipeline; a cache hit returning a
    /// previously computed `Output` keeps that run's original value.
    pub processing_time_ms: u64,
}

/// Harmonize `bytes` (a partwise score) for `instruments`, sharing results
/// through `cache`. This is the crate's single public entry point.
pub fn harmonize(
    bytes: &[u8],
    instruments_requested: &[String],
    original_filename: Option<&str>,
    cache: &Cache<Output>,
) -> Result<Arc<Output>, HarmonizeError> {
    harmonize_with_cancellation(bytes, instruments_requested, original_filename, cache, &CancellationToken::new())
}

/// As [`harmonize`], but observes `cancel` between pipeline phases.
pub fn harmonize_with_cancellation(
    bytes: &[u8],
    instruments_requested: &[String],
    original_filename: Option<&str>,
    cache: &Cache<Output>,
    cancel: &CancellationToken,
) -> Result<Arc<Output>, HarmonizeError> {
    let config = EngineConfig::default();

    if instruments_requested.len() > config.max_instruments {
        return Err(HarmonizeError::InstrumentLimitExceeded {
            max: config.max_instruments,
            got: instruments_requested.len(),
        });
    }

    let key = compute_key(bytes, instruments_requested);
    cache.get_or_compute(key, || {
        run_pipeline(bytes, instruments_requested, original_filename, &config, key, cancel)
    })
}

/// Default base filename when the caller supplies none.
const DEFAULT_FILENAME: &str = "melody.xml";

fn run_pipeline(
    bytes: &[u8],
    instruments_requested: &[String],
    original_filename: Option<&str>,
    config: &EngineConfig,
    cache_key: [u8; 32],
    cancel: &CancellationToken,
) -> Result<Output, HarmonizeError> {
    let started_at = std::time::Instant::now();
    debug!("reading score ({} bytes)", bytes.len());
    let parsed = read_score(bytes)?;
    info!(
        "parse complete: {} note event(s), polyphonic={}",
        parsed.total_note_events, parsed.is_polyphonic
    );

    if parsed.total_note_events > config.max_note_events {
        return Err(HarmonizeError::InputTooLarge {
            found: parsed.total_note_events,
            limit: config.max_note_events,
        });
    }

    if cancel.is_cancelled() {
        return Err(HarmonizeError::Cancelled);
    }

    let key = Key::from_fifths(parsed.header.fifths, parsed.header.mode);
    let divisions = parsed.header.divisions;
    let num_slots = slot_count(parsed.primary_melody.total_duration(), divisions);
    let slot_pitches: Vec<Pitch> = (0..num_slots)
        .map(|slot| parsed.primary_melody.pitch_at(slot as u32 * divisions).unwrap_or(crate::pitch::REST))
        .collect();

    let seed = u64::from_le_bytes(cache_key[0..8].try_into().unwrap());
    let mut warnings = Vec::new();

    let mut prng = Prng::from_seed(seed);
    let (chords, selector_warnings) = select_chords(
        &key,
        &parsed.primary_melody,
        num_slots,
        divisions,
        SelectionRank::Best,
        &mut prng,
        cancel,
    )?;
    warnings.extend(selector_warnings);

    let (sonorities, solver_warnings) = voice_progression(&chords, &slot_pitches, config, &mut prng, cancel)?;
    warnings.extend(solver_warnings);
    info!("{num_slots} slot(s) harmonized");

    let mut report = score_progression(&sonorities, &chords, config);
    let mut final_sonorities = sonorities;
    let mut final_chords = chords;
    let mut final_warnings = warnings;
    let mut refined = false;

    if report.overall < config.refinement_threshold {
        info!("quality {:.1} below threshold {:.1}, running refinement pass", report.overall, config.refinement_threshold);
        let mut refine_prng = Prng::reseed_for_refinement(seed);
        let (refined_chords, refined_selector_warnings) = select_chords(
            &key,
            &parsed.primary_melody,
            num_slots,
            divisions,
            SelectionRank::SecondBest,
            &mut refine_prng,
            cancel,
        )?;
        let (refined_sonorities, refined_solver_warnings) =
            voice_progression(&refined_chords, &slot_pitches, config, &mut refine_prng, cancel)?;
        let refined_report = score_progression(&refined_sonorities, &refined_chords, config);

        if refined_report.overall > report.overall {
            debug!("refinement improved quality {:.1} -> {:.1}", report.overall, refined_report.overall);
            final_chords = refined_chords;
            final_sonorities = refined_sonorities;
            final_warnings = Vec::new();
            final_warnings.extend(refined_selector_warnings);
            final_warnings.extend(refined_solver_warnings);
            report = refined_report;
            refined = true;
        }
    }

    if cancel.is_cancelled() {
        return Err(HarmonizeError::Cancelled);
    }

    let resolved_instruments: Vec<(Instrument, String)> = instruments_requested
        .iter()
        .map(|name| {
            if !instruments::is_known(name) {
                (instruments::OTHER, name.clone())
            } else {
                (instruments::resolve(name), name.clone())
            }
        })
        .collect();

    for (index, (_, requested_name)) in resolved_instruments.iter().enumerate() {
        if !instruments::is_known(requested_name) {
            let warning = Warning::UnknownInstrument { requested: requested_name.clone(), index };
            warn!("{warning}");
            final_warnings.push(warning);
        }
    }

    let mut parts: Vec<InstrumentPart> = Vec::with_capacity(resolved_instruments.len());
    for (position, (instrument, _)) in resolved_instruments.iter().enumerate() {
        let (part, extractor_warnings) = extract_instrument_part(
            &final_sonorities,
            divisions,
            position,
            *instrument,
            config.octave_clamp_iteration_cap,
        );
        final_warnings.extend(extractor_warnings);
        parts.push(part);
    }

    if final_warnings.len() > 50 {
        warn!("{} warnings accumulated during harmonization", final_warnings.len());
    }

    let harmony_only_xml = writer::write_harmony_only(&parts, &key, divisions, parsed.header.beats as u32, parsed.header.beat_type as u32);
    let combined_xml = if parsed.is_polyphonic {
        let mut lines = vec![parsed.primary_melody.clone()];
        lines.extend(parsed.other_lines.clone());
        writer::write_combined_polyphonic(&lines, &parts, &key, divisions, parsed.header.beats as u32, parsed.header.beat_type as u32)
    } else {
        writer::write_combined_monophonic(
            &parsed.primary_melody,
            &parsed.header.original_part_name,
            &parts,
            &key,
            divisions,
            parsed.header.beats as u32,
            parsed.header.beat_type as u32,
        )
    };

    let _ = final_chords; // retained for potential future diagnostics; see DESIGN.md

    let base = original_filename.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_FILENAME);
    let processing_time_ms = started_at.elapsed().as_millis() as u64;

    Ok(Output {
        harmony_only: Document { content: harmony_only_xml, filename: format!("harmony_{base}") },
        combined: Document { content: combined_xml, filename: format!("combined_{base}") },
        warnings: final_warnings,
        quality: report,
        metadata: Metadata {
            key_fifths: key.fifths,
            mode_is_minor: matches!(key.mode, Mode::Minor),
            instruments: instruments_requested.to_vec(),
            refined,
            original_filename: original_filename.map(|s| s.to_string()),
            processing_time_ms,
        },
    })
}

fn slot_count(total_duration: crate::note::Ticks, divisions: u32) -> usize {
    if divisions == 0 {
        return 1;
    }
    let slots = (total_duration + divisions - 1) / divisions;
    slots.max(1) as usize
}
