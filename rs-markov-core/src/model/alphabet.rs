use std::fmt;

/// Lowercase Russian letters, in alphabetical order.
pub const RUSSIAN_LETTERS: &str = "абвгдеёжзийклмнопрстуфхцчшщъыьэюя";

/// Punctuation and space symbols kept alongside the letters.
pub const SYMBOLS: [char; 5] = ['.', ',', ' ', '!', '?'];

/// Returns `true` if `c` belongs to the alphabet.
pub fn contains(c: char) -> bool {
	RUSSIAN_LETTERS.contains(c) || SYMBOLS.contains(&c)
}

/// Text restricted to the alphabet, lowercase.
///
/// Built once by `normalize` and never mutated afterwards. Characters are
/// kept in a `Vec<char>` so contexts can be sliced by position.
///
/// # Invariants
/// - Every character satisfies `contains`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedText {
	chars: Vec<char>,
}

impl NormalizedText {
	/// Number of characters.
	pub fn len(&self) -> usize {
		self.chars.len()
	}

	pub fn is_empty(&self) -> bool {
		self.chars.is_empty()
	}

	pub fn as_chars(&self) -> &[char] {
		&self.chars
	}
}

impl fmt::Display for NormalizedText {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for c in &self.chars {
			write!(f, "{c}")?;
		}
		Ok(())
	}
}

/// Normalizes raw text.
///
/// - Lower-cases every character (full Unicode mapping)
/// - Drops everything outside the alphabet, without any placeholder
///
/// Characters around a dropped one become adjacent: `"а-б"` gives `"аб"`.
/// Normalizing an already normalized text returns it unchanged.
pub fn normalize(raw: &str) -> NormalizedText {
	let chars = raw
		.chars()
		.flat_map(char::to_lowercase)
		.filter(|c| contains(*c))
		.collect();
	NormalizedText { chars }
}
