use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};

/// Reads a whole corpus file into memory as UTF-8 text.
///
/// # Errors
/// - `CorpusMissing` if the path does not exist
/// - `CorpusUnreadable` if it cannot be opened or is not valid UTF-8
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<String> {
	let path = path.as_ref();
	if !path.exists() {
		return Err(Error::CorpusMissing(path.to_path_buf()));
	}

	let unreadable = |source| Error::CorpusUnreadable { path: path.to_path_buf(), source };
	let mut contents = String::new();
	File::open(path)
		.map_err(unreadable)?
		.read_to_string(&mut contents)
		.map_err(unreadable)?;

	debug!("Read {} bytes from {}", contents.len(), path.display());
	Ok(contents)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn test_reads_utf8_file() {
		let mut file = NamedTempFile::new().unwrap();
		write!(file, "Да, да!").unwrap();
		assert_eq!(read_corpus(file.path()).unwrap(), "Да, да!");
	}

	#[test]
	fn test_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let err = read_corpus(dir.path().join("nope.txt")).unwrap_err();
		assert!(matches!(err, Error::CorpusMissing(_)));
		assert!(err.is_configuration());
	}

	#[test]
	fn test_invalid_utf8() {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
		let err = read_corpus(file.path()).unwrap_err();
		assert!(matches!(err, Error::CorpusUnreadable { .. }));
	}
}
