use std::ffi::OsString;
use std::path::{Path, PathBuf};

use error::{ErrorKind, Result};

/// The way a finished temporary file replaces the store.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum CommitStrategy {
	/// A single rename over the existing store. Readers see either the old
	/// or the new file, never an intermediate state.
	Replace,
	/// Remove the store first, then rename the temporary file into place.
	/// A crash between the two steps leaves no store at the original path;
	/// the new contents survive in the temporary file.
	RemoveThenRename,
}

/// Store options.
#[derive(Debug, PartialEq, Clone)]
pub struct Options {
	/// Extension appended to the store path to name the temporary file.
	pub temp_extension: String,
	/// How the temporary file is promoted to the store.
	pub commit: CommitStrategy,
	/// Sync the temporary file before the swap and its directory after it.
	pub sync: bool,
}

impl Default for Options {
	fn default() -> Self {
		Options {
			temp_extension: "tmp".into(),
			commit: CommitStrategy::Replace,
			sync: false,
		}
	}
}

impl Options {
	pub(crate) fn validate(&self) -> Result<()> {
		if self.temp_extension.is_empty() {
			bail!(ErrorKind::InvalidOptions(
				"temp_extension",
				"must not be empty.".into()
			));
		}

		if self.temp_extension.contains(|c| c == '/' || c == '\\' || c == '\0') {
			bail!(ErrorKind::InvalidOptions(
				"temp_extension",
				format!("{:?} must not contain path separators.", self.temp_extension)
			));
		}

		Ok(())
	}

	/// Returns the path of the working file used while rewriting the store at `path`.
	pub(crate) fn temp_path(&self, path: &Path) -> PathBuf {
		with_extension(path, &self.temp_extension)
	}
}

/// Appends `.ext` to the full file name, so `store.db` becomes `store.db.ext`.
pub(crate) fn with_extension(path: &Path, ext: &str) -> PathBuf {
	let mut name: OsString = path.as_os_str().to_owned();
	name.push(".");
	name.push(ext);
	name.into()
}
