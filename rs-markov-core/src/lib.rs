//! Character-level Markov frequency tables.
//!
//! This crate builds the statistics of a Markov text model from a corpus:
//! - Normalization of raw text to a fixed alphabet
//! - Single-pass context counting for every order up to `MaxPrefix`
//! - Additive merging of the counts into a persistent store
//!
//! Sampling or generating text from the tables is not part of this crate.

/// Alphabet, normalization and context counting.
pub mod model;

/// Persistent count stores (embedded SQLite, networked PostgreSQL).
pub mod store;

/// Corpus loading.
pub mod io;

/// Error type shared by the whole crate.
pub mod error;

pub use error::{Error, Result};
