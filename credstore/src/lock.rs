use std::fs::{self, File};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use error::{ErrorKind, Result};
use options::with_extension;

/// Advisory lock held on `<store>.lock` for the lifetime of the value.
///
/// The store itself never takes it. Processes sharing a store must agree to
/// acquire it before every operation.
#[derive(Debug)]
pub struct StoreLock {
	file: File,
	path: PathBuf,
}

impl StoreLock {
	const EXTENSION: &'static str = "lock";

	/// Acquires the lock for the store at `store` without blocking.
	pub fn acquire<P: AsRef<Path>>(store: P) -> Result<StoreLock> {
		let path = with_extension(store.as_ref(), Self::EXTENSION);
		let file = fs::OpenOptions::new()
			.write(true)
			.create(true)
			.open(&path)?;
		file.try_lock_exclusive().map_err(|_| ErrorKind::StoreLocked(path.clone()))?;
		debug!("Acquired {}", path.display());

		Ok(StoreLock {
			file,
			path,
		})
	}

	/// Location of the lock file.
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl Drop for StoreLock {
	fn drop(&mut self) {
		let _ = FileExt::unlock(&self.file);
	}
}
