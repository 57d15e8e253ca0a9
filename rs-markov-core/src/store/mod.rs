//! Persistent count stores.
//!
//! A store keeps two tables, `counts` keyed by (prefix, next_char, length)
//! and `unigram` keyed by char, and only ever adds to them.
//!
//! Backends are a closed set, selected from the scheme of a store address:
//! - `sqlite:///<path>` → embedded SQLite file (`SqliteStore`)
//! - `postgresql://...` → PostgreSQL server (`PostgresStore`, `postgres` feature)

use std::fmt;
use std::path::PathBuf;

use log::debug;

use crate::error::{Error, Result};
use crate::model::counts::{ContextCounts, ContextKey, UnigramCounts};

/// Embedded single-file backend.
pub mod sqlite;

/// Networked relational backend.
#[cfg(feature = "postgres")]
pub mod postgresql;

pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgresql::PostgresStore;

/// Store address used when none is given.
pub const DEFAULT_STORE_URI: &str = "sqlite:///markov.db";

const SQLITE_SCHEME: &str = "sqlite:///";
const POSTGRES_SCHEME: &str = "postgresql://";

/// Row counts of a store, for reporting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreSummary {
	pub context_rows: u64,
	pub unigram_rows: u64,
	/// Sum of all unigram counts (characters seen over every run).
	pub unigram_total: u64,
}

impl fmt::Display for StoreSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} context rows, {} unigram rows, {} characters",
			self.context_rows, self.unigram_rows, self.unigram_total
		)
	}
}

/// Additive accumulator for count tables.
///
/// # Contract
/// - `init_schema` can be called any number of times
/// - after `merge_counts`, every key's stored count is its previous count
///   (0 if absent) plus the supplied delta
/// - a merge is one transaction: either every delta lands or none does
///
/// No operation overwrites or decrements a count.
pub trait CountStore {
	/// Creates the two tables if they do not exist yet.
	fn init_schema(&mut self) -> Result<()>;

	/// Adds the deltas to the stored counts, inserting missing keys.
	fn merge_counts(&mut self, contexts: &ContextCounts, unigrams: &UnigramCounts) -> Result<()>;

	/// Stored count for a context key, `None` if absent.
	fn context_count(&mut self, key: &ContextKey) -> Result<Option<u64>>;

	/// Stored count for a character, `None` if absent.
	fn unigram_count(&mut self, c: char) -> Result<Option<u64>>;

	/// Row counts and character total.
	fn summary(&mut self) -> Result<StoreSummary>;
}

/// Parsed store address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreAddress {
	/// Path of the database file (`:memory:` for an in-memory database).
	Sqlite(PathBuf),
	/// Full connection URI handed to the client.
	Postgres(String),
}

impl StoreAddress {
	/// Parses an address by its scheme.
	///
	/// # Errors
	/// `UnknownScheme` for anything that is neither `sqlite:///` nor `postgresql://`.
	pub fn parse(uri: &str) -> Result<Self> {
		if let Some(path) = uri.strip_prefix(SQLITE_SCHEME) {
			Ok(StoreAddress::Sqlite(PathBuf::from(path)))
		} else if uri.starts_with(POSTGRES_SCHEME) {
			Ok(StoreAddress::Postgres(uri.to_owned()))
		} else {
			Err(Error::UnknownScheme(uri.to_owned()))
		}
	}

	/// Backend name, as used in logs and errors.
	pub fn backend_name(&self) -> &'static str {
		match self {
			StoreAddress::Sqlite(_) => "sqlite",
			StoreAddress::Postgres(_) => "postgresql",
		}
	}
}

/// One of the supported stores, opened and ready to use.
pub enum Backend {
	Sqlite(SqliteStore),
	#[cfg(feature = "postgres")]
	Postgres(PostgresStore),
}

impl Backend {
	/// Opens the backend matching `address`.
	///
	/// # Errors
	/// - `BackendUnavailable` if the PostgreSQL client is not compiled in;
	///   this is reported before any connection attempt
	/// - any error of the engine while connecting
	pub fn open(address: &StoreAddress) -> Result<Self> {
		debug!("Opening {} store", address.backend_name());
		match address {
			StoreAddress::Sqlite(path) => Ok(Backend::Sqlite(SqliteStore::open(path)?)),
			#[cfg(feature = "postgres")]
			StoreAddress::Postgres(uri) => Ok(Backend::Postgres(PostgresStore::connect(uri)?)),
			#[cfg(not(feature = "postgres"))]
			StoreAddress::Postgres(_) => Err(Error::BackendUnavailable("postgresql")),
		}
	}

	/// Parses `uri` and opens the matching backend.
	pub fn open_uri(uri: &str) -> Result<Self> {
		Self::open(&StoreAddress::parse(uri)?)
	}

	fn store(&mut self) -> &mut dyn CountStore {
		match self {
			Backend::Sqlite(store) => store,
			#[cfg(feature = "postgres")]
			Backend::Postgres(store) => store,
		}
	}
}

impl CountStore for Backend {
	fn init_schema(&mut self) -> Result<()> {
		self.store().init_schema()
	}

	fn merge_counts(&mut self, contexts: &ContextCounts, unigrams: &UnigramCounts) -> Result<()> {
		self.store().merge_counts(contexts, unigrams)
	}

	fn context_count(&mut self, key: &ContextKey) -> Result<Option<u64>> {
		self.store().context_count(key)
	}

	fn unigram_count(&mut self, c: char) -> Result<Option<u64>> {
		self.store().unigram_count(c)
	}

	fn summary(&mut self) -> Result<StoreSummary> {
		self.store().summary()
	}
}

/// Converts an in-memory count to the stores' signed 64-bit column type.
pub(crate) fn to_column(count: u64) -> Result<i64> {
	i64::try_from(count).map_err(|_| Error::CountOverflow(count))
}

/// Converts a stored value back.
///
/// # Errors
/// `CorruptCount` if the value is negative, which merges alone never produce.
pub(crate) fn from_column(value: i64) -> Result<u64> {
	u64::try_from(value).map_err(|_| Error::CorruptCount(value))
}

/// Checks that every delta fits the column type before a merge starts.
pub(crate) fn check_deltas(contexts: &ContextCounts, unigrams: &UnigramCounts) -> Result<()> {
	for count in contexts.values().chain(unigrams.values()) {
		to_column(*count)?;
	}
	Ok(())
}
