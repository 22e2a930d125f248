//! Four-part tonal harmonization engine.
//!
//! Parses a melody from partwise score-exchange XML, infers its key,
//! synthesizes a chord progression, solves SATB voice-leading under
//! classical constraints, scores the result and conditionally refines it,
//! extracts transposed per-instrument parts, and emits two XML documents --
//! all behind a deterministic, content-addressed, single-flight cache.
//!
//! [`harmonize`] is the only entry point most callers need.

pub mod cache;
pub mod cancel;
pub mod chord;
pub mod config;
pub mod error;
pub mod harmonize;
pub mod instruments;
pub mod key;
pub mod note;
pub mod part_extractor;
pub mod pitch;
pub mod prng;
pub mod reader;
pub mod scorer;
pub mod selector;
pub mod sonority;
pub mod voicing;
pub mod warnings;
pub mod writer;

pub use cache::Cache;
pub use cancel::CancellationToken;
pub use error::HarmonizeError;
pub use harmonize::{harmonize, harmonize_with_cancellation, Document, Metadata, Output};
