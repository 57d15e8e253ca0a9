//! Text model side of the pipeline.
//!
//! - Fixed alphabet and text normalization (`alphabet`)
//! - Multi-order context counting and the count tables (`counts`)

/// Fixed alphabet and the normalizer built on it.
///
/// Lower-cases raw text and drops every character outside the alphabet.
pub mod alphabet;

/// Context and unigram count tables.
///
/// Handles the single left-to-right scan that records every context
/// length up to `MaxPrefix`, and in-memory additive merging.
pub mod counts;
