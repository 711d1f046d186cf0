use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use zeroize::Zeroizing;

use commit;
use error::Result;
use fs::{DiskFs, StoreFs};
use lock::StoreLock;
use options::Options;
use query::{self, Entries};
use record::Line;
use writer::{self, Mutation, Outcome};

/// A top-level store API.
///
/// The store keeps no state between calls. Every operation opens the file,
/// does its work and closes it again, so the file on disk is the only record.
#[derive(Debug)]
pub struct Store<F = DiskFs> {
	path: PathBuf,
	temp_path: PathBuf,
	options: Options,
	fs: F,
}

impl Store<DiskFs> {
	/// Opens the store at given location. A missing file is an empty store,
	/// it is created by the first mutation.
	pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
		let fs = DiskFs::new(options.sync);
		Self::with_fs(fs, path, options)
	}
}

impl<F: StoreFs> Store<F> {
	/// Opens the store at `path` on a custom filesystem.
	pub fn with_fs<P: AsRef<Path>>(fs: F, path: P, options: Options) -> Result<Self> {
		options.validate()?;

		let path = path.as_ref().to_owned();
		let temp_path = options.temp_path(&path);

		Ok(Store {
			path,
			temp_path,
			options,
			fs,
		})
	}

	/// Location of the store file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Location of the working file used during a transaction.
	pub fn temp_path(&self) -> &Path {
		&self.temp_path
	}

	/// Takes the advisory lock guarding this store against other processes.
	pub fn lock(&self) -> Result<StoreLock> {
		StoreLock::acquire(&self.path)
	}

	/// Saves the password of `account` in `site`, replacing the current one.
	/// A missing account is added to the site, a missing site is appended.
	pub fn save_or_update(&self, site: &str, account: &str, password: &str) -> Result<Outcome> {
		let site = Line::from_value(site)?;
		let mutation = Mutation::Save {
			account: Line::from_value(account)?,
			password: Line::from_value(password)?,
		};
		self.transact(&site, &mutation)
	}

	/// Deletes `account` from `site`. The site goes away with its last account.
	pub fn delete_account(&self, site: &str, account: &str) -> Result<Outcome> {
		let site = Line::from_value(site)?;
		let mutation = Mutation::Delete {
			account: Line::from_value(account)?,
		};
		self.transact(&site, &mutation)
	}

	/// Looks up the password of `account` in `site`.
	pub fn get_password(&self, site: &str, account: &str) -> Result<Option<Zeroizing<String>>> {
		let site = Line::from_value(site)?;
		let account = Line::from_value(account)?;

		match self.fs.open(&self.path)? {
			Some(reader) => query::fetch(BufReader::new(reader), &site, &account),
			None => Ok(None),
		}
	}

	/// Returns a lazy iterator over every stored credential. Calling it again
	/// starts over from the current contents of the file.
	pub fn list_accounts(&self) -> Result<Entries<BufReader<F::Reader>>> {
		let source = self.fs.open(&self.path)?;
		Ok(Entries::new(source.map(BufReader::new)))
	}

	/// Applies a single mutation as a whole-file transaction: the store is
	/// rewritten into the temporary file, which then replaces the store.
	pub fn transact(&self, site: &Line, mutation: &Mutation) -> Result<Outcome> {
		debug!("Rewriting {} into {}", self.path.display(), self.temp_path.display());

		let (outcome, existed) = match self.write_temp(site, mutation) {
			Ok(written) => written,
			Err(err) => {
				self.discard_temp();
				return Err(err);
			},
		};

		if outcome.is_not_found() {
			warn!("Nothing to delete in {}: {}", self.path.display(), outcome);
			if !existed {
				self.discard_temp();
				return Ok(outcome);
			}
		}

		commit::commit(&self.fs, &self.temp_path, &self.path, self.options.commit)?;
		debug!("Committed {}: {}", self.path.display(), outcome);
		Ok(outcome)
	}

	/// Writes the mutated store to the temporary file and tells whether the
	/// store existed. Both handles are closed when this returns, whatever the result.
	fn write_temp(&self, site: &Line, mutation: &Mutation) -> Result<(Outcome, bool)> {
		let source = self.fs.open(&self.path)?;
		let existed = source.is_some();
		let mut sink = self.fs.create(&self.temp_path)?;

		let outcome = match source {
			Some(reader) => writer::apply(BufReader::new(reader), &mut sink, site, mutation)?,
			None => writer::apply(io::empty(), &mut sink, site, mutation)?,
		};

		self.fs.finish(sink)?;
		Ok((outcome, existed))
	}

	fn discard_temp(&self) {
		match self.fs.remove(&self.temp_path) {
			Ok(()) => debug!("Removed unfinished {}", self.temp_path.display()),
			Err(ref err) if err.kind() == io::ErrorKind::NotFound => {},
			Err(err) => warn!("Failed to remove unfinished {}: {}", self.temp_path.display(), err),
		}
	}
}
