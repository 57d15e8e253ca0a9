use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a corpus or talking to a count store.
///
/// Variants fall in two families:
/// - configuration errors (bad corpus path, bad store address, missing backend)
/// - store operation failures (anything the engine itself reports)
///
/// Neither family is retried.
#[derive(Error, Debug)]
pub enum Error {
	/// The corpus path does not exist.
	#[error("Corpus not found: {}", .0.display())]
	CorpusMissing(PathBuf),

	/// The corpus exists but could not be read as UTF-8 text.
	#[error("Failed to read corpus {}: {source}", path.display())]
	CorpusUnreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// The store address does not start with a supported scheme.
	#[error("Unrecognized store address: {0}")]
	UnknownScheme(String),

	/// The backend exists but its client was not compiled into this build.
	#[error("Store backend '{0}' is not available in this build")]
	BackendUnavailable(&'static str),

	/// A count does not fit the store's signed 64-bit column.
	#[error("Count {0} exceeds the store's integer range")]
	CountOverflow(u64),

	/// A stored count is negative; the store was written by something else.
	#[error("Stored count {0} is negative")]
	CorruptCount(i64),

	#[error("SQLite error: {0}")]
	Sqlite(#[from] rusqlite::Error),

	#[cfg(feature = "postgres")]
	#[error("PostgreSQL error: {0}")]
	Postgres(#[from] postgres::Error),
}

impl Error {
	/// Returns `true` for configuration errors, `false` for store failures.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			Error::CorpusMissing(_) | Error::CorpusUnreadable { .. } | Error::UnknownScheme(_) | Error::BackendUnavailable(_)
		)
	}
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
