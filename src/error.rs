//! Error types for the harmonization engine.
//!
//! A single `thiserror`-derived enum is the crate's only error type. The
//! Voice-Leading Solver never returns one of these — it always emits a
//! sonority and records a [`crate::warnings::Warning`] instead.

use thiserror::Error;

/// Failure modes surfaced by [`crate::harmonize`].
#[derive(Debug, Clone, Error)]
pub enum HarmonizeError {
    /// The document root is neither `score-partwise` nor `score-timewise`,
    /// or the XML itself did not parse.
    #[error("not a partwise score: {0}")]
    InvalidFormat(String),

    /// The document root is `score-timewise`; only partwise is supported.
    #[error("timewise scores are not supported")]
    UnsupportedFormat,

    /// The score contains no `<part>` elements.
    #[error("score has no parts")]
    NoParts,

    /// The primary melodic line has zero non-rest notes.
    #[error("melody has no sounding notes")]
    EmptyMelody,

    /// More note events than the engine is willing to process.
    #[error("input has {found} note events, limit is {limit}")]
    InputTooLarge { found: usize, limit: usize },

    /// More instruments were requested than the ensemble size allows.
    #[error("at most {max} instruments are supported, got {got}")]
    InstrumentLimitExceeded { max: usize, got: usize },

    /// A [`crate::cancel::CancellationToken`] was observed set between slots.
    #[error("operation cancelled")]
    Cancelled,

    /// The solver could not produce any candidate sonority at all. This
    /// should never escape in practice — the solver's fallback voicing
    /// (§4.4) always succeeds — so reaching this variant indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}
