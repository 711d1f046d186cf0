//! Swap committer
//!
//! Promotes a finished temporary file to the store. Both file handles must be
//! closed before this runs.

use std::io;
use std::path::Path;

use error::{Error, ErrorKind, Result, ResultExt};
use fs::StoreFs;
use options::CommitStrategy;

/// Makes `temp` the new store at `store`.
pub fn commit<F: StoreFs>(fs: &F, temp: &Path, store: &Path, strategy: CommitStrategy) -> Result<()> {
	match strategy {
		CommitStrategy::Replace => {
			debug!("Replacing {} with {}", store.display(), temp.display());
			fs.rename(temp, store).chain_err(|| ErrorKind::StoreUpdate(store.to_owned()))
		},
		CommitStrategy::RemoveThenRename => {
			debug!("Removing {} before moving {} into its place", store.display(), temp.display());
			match fs.remove(store) {
				Ok(()) => {},
				Err(ref err) if err.kind() == io::ErrorKind::NotFound => {},
				Err(err) => return Err(Error::with_chain(err, ErrorKind::StoreUpdate(store.to_owned()))),
			}

			fs.rename(temp, store).map_err(|err| {
				error!(
					"{} was removed but {} could not be renamed into its place, the store contents are in {}",
					store.display(),
					temp.display(),
					temp.display(),
				);
				Error::with_chain(err, ErrorKind::StoreUpdate(store.to_owned()))
			})
		},
	}
}
