use std::collections::HashMap;

use log::debug;

use super::alphabet::NormalizedText;

/// Hard cap on the context length, whatever the caller requests.
pub const MAX_PREFIX_CAP: usize = 13;

/// Effective upper bound `K` on context lengths.
///
/// Only the upper bound is enforced: requests above `MAX_PREFIX_CAP` are
/// clamped, requests of zero or below give `K = 0` (unigrams only).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MaxPrefix(usize);

impl MaxPrefix {
	/// Clamps a requested bound.
	pub fn new(requested: i64) -> Self {
		let clamped = requested.min(MAX_PREFIX_CAP as i64);
		Self(usize::try_from(clamped).unwrap_or(0))
	}

	pub fn get(self) -> usize {
		self.0
	}
}

impl Default for MaxPrefix {
	fn default() -> Self {
		Self(MAX_PREFIX_CAP)
	}
}

/// Key of a context count: the `length` characters preceding `next_char`.
///
/// # Invariants
/// - `length` always equals the number of characters in `context`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey {
	context: String,
	next_char: char,
	length: usize,
}

impl ContextKey {
	/// Builds a key from the context characters and the character that follows.
	pub fn new(context: &[char], next_char: char) -> Self {
		Self {
			context: context.iter().collect(),
			next_char,
			length: context.len(),
		}
	}

	pub fn context(&self) -> &str {
		&self.context
	}

	pub fn next_char(&self) -> char {
		self.next_char
	}

	pub fn length(&self) -> usize {
		self.length
	}
}

/// Occurrence counts per (context, next character, length).
pub type ContextCounts = HashMap<ContextKey, u64>;

/// Occurrence counts per character.
pub type UnigramCounts = HashMap<char, u64>;

/// The two tables produced by one counting pass.
///
/// Each pass builds fresh tables; they are handed once to a store and then
/// dropped.
///
/// # Responsibilities
/// - Record unigram and multi-order context events
/// - Merge with another set of tables (counts are summed)
///
/// # Invariants
/// - All stored counts are >= 1
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountTables {
	contexts: ContextCounts,
	unigrams: UnigramCounts,
}

impl CountTables {
	/// Creates empty tables.
	pub fn new() -> Self {
		Self::default()
	}

	pub fn contexts(&self) -> &ContextCounts {
		&self.contexts
	}

	pub fn unigrams(&self) -> &UnigramCounts {
		&self.unigrams
	}

	/// Sum of all unigram counts.
	pub fn unigram_total(&self) -> u64 {
		self.unigrams.values().sum()
	}

	/// Sum of context counts recorded with context length `length`.
	pub fn total_for_length(&self, length: usize) -> u64 {
		self.contexts
			.iter()
			.filter(|(key, _)| key.length == length)
			.map(|(_, count)| count)
			.sum()
	}

	/// Adds `other` into these tables.
	///
	/// Matching keys have their counts summed, missing keys are inserted.
	/// The result does not depend on merge order.
	pub fn merge(&mut self, other: &Self) {
		for (key, count) in &other.contexts {
			*self.contexts.entry(key.clone()).or_insert(0) += *count;
		}
		for (c, count) in &other.unigrams {
			*self.unigrams.entry(*c).or_insert(0) += *count;
		}
	}

	fn add_unigram(&mut self, c: char) {
		*self.unigrams.entry(c).or_insert(0) += 1;
	}

	fn add_context(&mut self, context: &[char], next_char: char) {
		*self.contexts.entry(ContextKey::new(context, next_char)).or_insert(0) += 1;
	}
}

/// Counts unigrams and contexts of every length `1..=K` in one scan.
///
/// For each position `i`, the character `text[i]` is counted once as a
/// unigram, then once for each context `text[i-k..i]` with `k` growing from
/// 1 until `K` or until the start of the text is reached.
///
/// The scan must stay left-to-right: contexts are read from the prefix
/// already visited.
pub fn collect_counts(text: &NormalizedText, max_prefix: MaxPrefix) -> CountTables {
	let chars = text.as_chars();
	let mut tables = CountTables::new();

	for (i, &c) in chars.iter().enumerate() {
		tables.add_unigram(c);
		for k in 1..=max_prefix.get() {
			if k > i {
				// No history of this length yet
				break;
			}
			tables.add_context(&chars[i - k..i], c);
		}
	}

	debug!(
		"Counted {} characters: {} contexts, {} unigrams (K = {})",
		chars.len(),
		tables.contexts.len(),
		tables.unigrams.len(),
		max_prefix.get()
	);
	tables
}
