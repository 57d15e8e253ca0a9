use std::path::Path;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

use super::{check_deltas, from_column, to_column, CountStore, StoreSummary};
use crate::error::Result;
use crate::model::counts::{ContextCounts, ContextKey, UnigramCounts};

// SQLite turns an overflowing integer sum into REAL; the CHECK makes that a
// constraint failure instead.
const CREATE_SCHEMA: &str = "
	CREATE TABLE IF NOT EXISTS counts (
		prefix TEXT, next_char TEXT, length INTEGER,
		count INTEGER CHECK (typeof(count) = 'integer'),
		PRIMARY KEY(prefix, next_char, length)
	);
	CREATE TABLE IF NOT EXISTS unigram (
		char TEXT PRIMARY KEY,
		count INTEGER CHECK (typeof(count) = 'integer')
	);
";

const UPSERT_CONTEXT: &str = "INSERT INTO counts (prefix, next_char, length, count) VALUES (?1, ?2, ?3, ?4) \
	ON CONFLICT(prefix, next_char, length) DO UPDATE SET count = count + excluded.count";

const UPSERT_UNIGRAM: &str = "INSERT INTO unigram (char, count) VALUES (?1, ?2) \
	ON CONFLICT(char) DO UPDATE SET count = count + excluded.count";

/// Count store backed by an embedded SQLite database file.
pub struct SqliteStore {
	conn: Connection,
}

impl SqliteStore {
	/// Opens (or creates) the database file at `path`.
	///
	/// `:memory:` opens a private in-memory database.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
		debug!("Opening SQLite database {}", path.as_ref().display());
		Ok(Self { conn: Connection::open(path)? })
	}

	/// Opens a private in-memory database.
	pub fn in_memory() -> Result<Self> {
		Ok(Self { conn: Connection::open_in_memory()? })
	}
}

impl CountStore for SqliteStore {
	fn init_schema(&mut self) -> Result<()> {
		let tx = self.conn.transaction()?;
		tx.execute_batch(CREATE_SCHEMA)?;
		tx.commit()?;
		Ok(())
	}

	fn merge_counts(&mut self, contexts: &ContextCounts, unigrams: &UnigramCounts) -> Result<()> {
		check_deltas(contexts, unigrams)?;

		// Dropping `tx` on an early return rolls the whole merge back
		let tx = self.conn.transaction()?;
		{
			let mut upsert = tx.prepare_cached(UPSERT_CONTEXT)?;
			for (key, count) in contexts {
				upsert.execute(params![
					key.context(),
					key.next_char().to_string(),
					key.length() as i64,
					to_column(*count)?
				])?;
			}

			let mut upsert = tx.prepare_cached(UPSERT_UNIGRAM)?;
			for (c, count) in unigrams {
				upsert.execute(params![c.to_string(), to_column(*count)?])?;
			}
		}
		tx.commit()?;

		debug!("Merged {} context rows and {} unigram rows into SQLite", contexts.len(), unigrams.len());
		Ok(())
	}

	fn context_count(&mut self, key: &ContextKey) -> Result<Option<u64>> {
		let count: Option<i64> = self
			.conn
			.query_row(
				"SELECT count FROM counts WHERE prefix = ?1 AND next_char = ?2 AND length = ?3",
				params![key.context(), key.next_char().to_string(), key.length() as i64],
				|row| row.get(0),
			)
			.optional()?;
		count.map(from_column).transpose()
	}

	fn unigram_count(&mut self, c: char) -> Result<Option<u64>> {
		let count: Option<i64> = self
			.conn
			.query_row("SELECT count FROM unigram WHERE char = ?1", params![c.to_string()], |row| row.get(0))
			.optional()?;
		count.map(from_column).transpose()
	}

	fn summary(&mut self) -> Result<StoreSummary> {
		let context_rows: i64 = self.conn.query_row("SELECT COUNT(*) FROM counts", [], |row| row.get(0))?;
		let (unigram_rows, unigram_total): (i64, i64) = self.conn.query_row(
			"SELECT COUNT(*), COALESCE(SUM(count), 0) FROM unigram",
			[],
			|row| Ok((row.get(0)?, row.get(1)?)),
		)?;
		Ok(StoreSummary {
			context_rows: from_column(context_rows)?,
			unigram_rows: from_column(unigram_rows)?,
			unigram_total: from_column(unigram_total)?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::Error;
	use crate::model::alphabet::normalize;
	use crate::model::counts::{collect_counts, CountTables, MaxPrefix};

	fn tables(raw: &str) -> CountTables {
		collect_counts(&normalize(raw), MaxPrefix::new(3))
	}

	fn ready_store() -> SqliteStore {
		let mut store = SqliteStore::in_memory().unwrap();
		store.init_schema().unwrap();
		store
	}

	fn merge(store: &mut SqliteStore, tables: &CountTables) {
		store.merge_counts(tables.contexts(), tables.unigrams()).unwrap();
	}

	/// Every key of `expected` is stored with exactly its count, and nothing else is stored.
	fn assert_store_matches(store: &mut SqliteStore, expected: &CountTables) {
		for (key, count) in expected.contexts() {
			assert_eq!(store.context_count(key).unwrap(), Some(*count), "{key:?}");
		}
		for (c, count) in expected.unigrams() {
			assert_eq!(store.unigram_count(*c).unwrap(), Some(*count), "{c:?}");
		}
		let summary = store.summary().unwrap();
		assert_eq!(summary.context_rows, expected.contexts().len() as u64);
		assert_eq!(summary.unigram_rows, expected.unigrams().len() as u64);
		assert_eq!(summary.unigram_total, expected.unigram_total());
	}

	#[test]
	fn test_init_schema_is_idempotent() {
		let mut store = ready_store();
		merge(&mut store, &tables("да да"));
		store.init_schema().unwrap();
		store.init_schema().unwrap();
		assert_store_matches(&mut store, &tables("да да"));
	}

	#[test]
	fn test_merge_into_empty_store() {
		let mut store = ready_store();
		assert_eq!(store.summary().unwrap(), StoreSummary::default());
		merge(&mut store, &tables("да да"));
		assert_store_matches(&mut store, &tables("да да"));
		assert_eq!(store.unigram_count('я').unwrap(), None);
	}

	#[test]
	fn test_merge_adds_to_existing_counts() {
		let mut store = ready_store();
		merge(&mut store, &tables("да да"));
		merge(&mut store, &tables("да да"));

		let key = ContextKey::new(&['д'], 'а');
		assert_eq!(store.context_count(&key).unwrap(), Some(4));
		assert_eq!(store.unigram_count('д').unwrap(), Some(4));
		assert_eq!(store.summary().unwrap().unigram_total, 10);
	}

	#[test]
	fn test_sequential_merges_equal_combined_merge() {
		let a = tables("Мама мыла раму.");
		let b = tables("Рама мыла маму!");

		let mut sequential = ready_store();
		merge(&mut sequential, &a);
		merge(&mut sequential, &b);

		let mut combined = a.clone();
		combined.merge(&b);
		let mut single = ready_store();
		merge(&mut single, &combined);

		assert_store_matches(&mut sequential, &combined);
		assert_store_matches(&mut single, &combined);
	}

	#[test]
	fn test_empty_merge() {
		let mut store = ready_store();
		merge(&mut store, &CountTables::new());
		assert_eq!(store.summary().unwrap(), StoreSummary::default());
	}

	#[test]
	fn test_overflowing_delta_leaves_store_untouched() {
		let mut store = ready_store();
		merge(&mut store, &tables("да"));

		let mut contexts = ContextCounts::new();
		contexts.insert(ContextKey::new(&['н'], 'е'), 1);
		let mut unigrams = UnigramCounts::new();
		unigrams.insert('н', u64::MAX);

		let err = store.merge_counts(&contexts, &unigrams).unwrap_err();
		assert!(matches!(err, Error::CountOverflow(_)));
		assert!(!err.is_configuration());
		assert_store_matches(&mut store, &tables("да"));
	}

	#[test]
	fn test_overflowing_sum_is_rejected() {
		let mut store = ready_store();
		let mut unigrams = UnigramCounts::new();
		unigrams.insert('а', i64::MAX as u64);
		store.merge_counts(&ContextCounts::new(), &unigrams).unwrap();

		let mut contexts = ContextCounts::new();
		contexts.insert(ContextKey::new(&['д'], 'а'), 1);
		unigrams.insert('а', 1);
		let err = store.merge_counts(&contexts, &unigrams).unwrap_err();
		assert!(matches!(err, Error::Sqlite(_)));

		// The failed merge was rolled back as a whole
		assert_eq!(store.unigram_count('а').unwrap(), Some(i64::MAX as u64));
		assert_eq!(store.context_count(&ContextKey::new(&['д'], 'а')).unwrap(), None);
	}

	#[test]
	fn test_negative_stored_count_is_reported() {
		let mut store = ready_store();
		store
			.conn
			.execute("INSERT INTO unigram (char, count) VALUES ('а', -5)", [])
			.unwrap();

		assert!(matches!(store.unigram_count('а'), Err(Error::CorruptCount(-5))));
		assert!(matches!(store.summary(), Err(Error::CorruptCount(-5))));
	}

	#[test]
	fn test_merge_without_schema_fails() {
		let mut store = SqliteStore::in_memory().unwrap();
		let err = store.merge_counts(tables("да").contexts(), tables("да").unigrams()).unwrap_err();
		assert!(matches!(err, Error::Sqlite(_)));
	}

	#[test]
	fn test_counts_persist_across_connections() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("markov.db");

		for _ in 0..3 {
			let mut store = SqliteStore::open(&path).unwrap();
			store.init_schema().unwrap();
			merge(&mut store, &tables("да да"));
		}

		let mut store = SqliteStore::open(&path).unwrap();
		assert_eq!(store.unigram_count('а').unwrap(), Some(6));
		assert_eq!(store.context_count(&ContextKey::new(&['а', ' '], 'д')).unwrap(), Some(3));
	}
}
