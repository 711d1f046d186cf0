//! Filesystem access used by the store.
//!
//! A transaction needs exactly four capabilities: open the store for reading,
//! create the temporary file, remove a file and rename one file over another.
//! `DiskFs` provides them on top of `std::fs`. `MemoryFs` keeps files in memory,
//! can be told to fail any operation, and refuses to remove or rename files
//! which still have open handles.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Filesystem capability of a store.
pub trait StoreFs {
	/// Handle of a file opened for reading.
	type Reader: Read;
	/// Handle of the temporary file being written.
	type Writer: Write;

	/// Opens `path` for reading. Returns `None` if the file does not exist.
	fn open(&self, path: &Path) -> io::Result<Option<Self::Reader>>;

	/// Creates or truncates `path` for writing.
	fn create(&self, path: &Path) -> io::Result<Self::Writer>;

	/// Flushes and closes a handle returned by `create`.
	fn finish(&self, writer: Self::Writer) -> io::Result<()>;

	/// Removes `path`.
	fn remove(&self, path: &Path) -> io::Result<()>;

	/// Renames `from` to `to`, replacing `to` if it exists.
	fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone)]
pub struct DiskFs {
	sync: bool,
}

impl DiskFs {
	/// With `sync` set, finished files and renames are flushed to the disk.
	pub fn new(sync: bool) -> Self {
		DiskFs {
			sync,
		}
	}

	/// New files are readable by their owner only, they become the store.
	#[cfg(unix)]
	fn owner_only(options: &mut fs::OpenOptions) {
		use std::os::unix::fs::OpenOptionsExt;
		options.mode(0o600);
	}

	#[cfg(not(unix))]
	fn owner_only(_options: &mut fs::OpenOptions) {}

	#[cfg(unix)]
	fn sync_parent(path: &Path) -> io::Result<()> {
		let parent = match path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent,
			_ => Path::new("."),
		};
		File::open(parent)?.sync_all()
	}

	#[cfg(not(unix))]
	fn sync_parent(_path: &Path) -> io::Result<()> {
		Ok(())
	}
}

impl StoreFs for DiskFs {
	type Reader = File;
	type Writer = BufWriter<File>;

	fn open(&self, path: &Path) -> io::Result<Option<File>> {
		match File::open(path) {
			Ok(file) => Ok(Some(file)),
			Err(ref err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(err) => Err(err),
		}
	}

	fn create(&self, path: &Path) -> io::Result<BufWriter<File>> {
		let mut options = fs::OpenOptions::new();
		options.write(true).create(true).truncate(true);
		Self::owner_only(&mut options);
		let file = options.open(path)?;
		Ok(BufWriter::new(file))
	}

	fn finish(&self, writer: BufWriter<File>) -> io::Result<()> {
		let file = writer.into_inner().map_err(|err| err.into_error())?;
		if self.sync {
			file.sync_all()?;
		}
		Ok(())
	}

	fn remove(&self, path: &Path) -> io::Result<()> {
		fs::remove_file(path)
	}

	fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
		fs::rename(from, to)?;
		if self.sync {
			Self::sync_parent(to)?;
		}
		Ok(())
	}
}

/// Filesystem operations which can be made to fail.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum FsOp {
	/// `StoreFs::open`
	Open,
	/// `StoreFs::create`
	Create,
	/// Writes to a created file.
	Write,
	/// `StoreFs::remove`
	Remove,
	/// `StoreFs::rename`
	Rename,
}

#[derive(Debug, Default)]
struct MemoryState {
	files: BTreeMap<PathBuf, Vec<u8>>,
	open_handles: BTreeMap<PathBuf, usize>,
	failing: BTreeSet<FsOp>,
}

impl MemoryState {
	fn check(&self, op: FsOp, path: &Path) -> io::Result<()> {
		if self.failing.contains(&op) {
			return Err(io::Error::new(io::ErrorKind::Other, format!("injected {:?} failure on {}", op, path.display())));
		}
		Ok(())
	}

	fn check_closed(&self, path: &Path) -> io::Result<()> {
		match self.open_handles.get(path) {
			Some(&handles) if handles > 0 => Err(io::Error::new(
				io::ErrorKind::Other,
				format!("{} still has {} open handles", path.display(), handles),
			)),
			_ => Ok(()),
		}
	}
}

/// An in-memory filesystem, shared between its clones.
#[derive(Debug, Default, Clone)]
pub struct MemoryFs {
	state: Arc<Mutex<MemoryState>>,
}

/// Keeps a file marked as open until dropped.
#[derive(Debug)]
struct OpenHandle {
	state: Arc<Mutex<MemoryState>>,
	path: PathBuf,
}

impl OpenHandle {
	fn new(state: &Arc<Mutex<MemoryState>>, path: &Path) -> Self {
		*state.lock().open_handles.entry(path.to_owned()).or_insert(0) += 1;
		OpenHandle {
			state: state.clone(),
			path: path.to_owned(),
		}
	}
}

impl Drop for OpenHandle {
	fn drop(&mut self) {
		let mut state = self.state.lock();
		let remove = match state.open_handles.get_mut(&self.path) {
			Some(handles) => {
				*handles -= 1;
				*handles == 0
			},
			None => false,
		};
		if remove {
			state.open_handles.remove(&self.path);
		}
	}
}

/// Snapshot of an in-memory file taken when it was opened.
#[derive(Debug)]
pub struct MemoryReader {
	data: Cursor<Vec<u8>>,
	_handle: OpenHandle,
}

impl Read for MemoryReader {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		self.data.read(buf)
	}
}

/// In-memory file being written. The contents become visible once finished.
#[derive(Debug)]
pub struct MemoryWriter {
	data: Vec<u8>,
	handle: OpenHandle,
}

impl Write for MemoryWriter {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.handle.state.lock().check(FsOp::Write, &self.handle.path)?;
		self.data.write(buf)
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl MemoryFs {
	/// Creates an empty filesystem.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates or replaces a file.
	pub fn insert<P: AsRef<Path>, D: Into<Vec<u8>>>(&self, path: P, data: D) {
		self.state.lock().files.insert(path.as_ref().to_owned(), data.into());
	}

	/// Returns a copy of the file contents.
	pub fn contents<P: AsRef<Path>>(&self, path: P) -> Option<Vec<u8>> {
		self.state.lock().files.get(path.as_ref()).cloned()
	}

	/// Returns true if the file exists.
	pub fn exists<P: AsRef<Path>>(&self, path: P) -> bool {
		self.state.lock().files.contains_key(path.as_ref())
	}

	/// Number of handles currently open on any file.
	pub fn open_handles(&self) -> usize {
		self.state.lock().open_handles.values().sum()
	}

	/// Makes every following `op` fail.
	pub fn fail(&self, op: FsOp) {
		self.state.lock().failing.insert(op);
	}

	/// Lets `op` succeed again.
	pub fn heal(&self, op: FsOp) {
		self.state.lock().failing.remove(&op);
	}
}

impl StoreFs for MemoryFs {
	type Reader = MemoryReader;
	type Writer = MemoryWriter;

	fn open(&self, path: &Path) -> io::Result<Option<MemoryReader>> {
		let data = {
			let state = self.state.lock();
			state.check(FsOp::Open, path)?;
			match state.files.get(path) {
				Some(data) => data.clone(),
				None => return Ok(None),
			}
		};

		Ok(Some(MemoryReader {
			data: Cursor::new(data),
			_handle: OpenHandle::new(&self.state, path),
		}))
	}

	fn create(&self, path: &Path) -> io::Result<MemoryWriter> {
		{
			let mut state = self.state.lock();
			state.check(FsOp::Create, path)?;
			state.files.insert(path.to_owned(), Vec::new());
		}

		Ok(MemoryWriter {
			data: Vec::new(),
			handle: OpenHandle::new(&self.state, path),
		})
	}

	fn finish(&self, writer: MemoryWriter) -> io::Result<()> {
		let MemoryWriter { data, handle } = writer;
		self.state.lock().files.insert(handle.path.clone(), data);
		Ok(())
	}

	fn remove(&self, path: &Path) -> io::Result<()> {
		let mut state = self.state.lock();
		state.check(FsOp::Remove, path)?;
		state.check_closed(path)?;
		match state.files.remove(path) {
			Some(_) => Ok(()),
			None => Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))),
		}
	}

	fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
		let mut state = self.state.lock();
		state.check(FsOp::Rename, from)?;
		state.check_closed(from)?;
		state.check_closed(to)?;
		match state.files.remove(from) {
			Some(data) => {
				state.files.insert(to.to_owned(), data);
				Ok(())
			},
			None => Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", from.display()))),
		}
	}
}

#[cfg(test)]
mod tests {
	extern crate tempdir;

	use std::io::{Read, Write};
	use std::path::Path;
	use super::{DiskFs, FsOp, MemoryFs, StoreFs};

	#[test]
	fn test_memory_fs_roundtrip() {
		let fs = MemoryFs::new();
		assert!(fs.open(Path::new("store")).unwrap().is_none());

		let mut writer = fs.create(Path::new("store.tmp")).unwrap();
		writer.write_all(b"bank\n").unwrap();
		assert_eq!(fs.contents("store.tmp").unwrap(), b"");
		fs.finish(writer).unwrap();
		assert_eq!(fs.contents("store.tmp").unwrap(), b"bank\n");

		fs.rename(Path::new("store.tmp"), Path::new("store")).unwrap();
		assert!(!fs.exists("store.tmp"));

		let mut data = Vec::new();
		fs.open(Path::new("store")).unwrap().unwrap().read_to_end(&mut data).unwrap();
		assert_eq!(data, b"bank\n");
		assert_eq!(fs.open_handles(), 0);
	}

	#[test]
	fn test_memory_fs_refuses_to_move_open_files() {
		let fs = MemoryFs::new();
		fs.insert("store", "bank\n");

		let reader = fs.open(Path::new("store")).unwrap().unwrap();
		assert_eq!(fs.open_handles(), 1);
		assert!(fs.remove(Path::new("store")).is_err());

		drop(reader);
		assert_eq!(fs.open_handles(), 0);
		fs.remove(Path::new("store")).unwrap();
	}

	#[test]
	fn test_memory_fs_injected_failures() {
		let fs = MemoryFs::new();
		fs.fail(FsOp::Create);
		assert!(fs.create(Path::new("store.tmp")).is_err());
		fs.heal(FsOp::Create);

		fs.fail(FsOp::Write);
		let mut writer = fs.create(Path::new("store.tmp")).unwrap();
		assert!(writer.write_all(b"x").is_err());
	}

	#[test]
	fn test_disk_fs() {
		let temp = tempdir::TempDir::new("test_disk_fs").unwrap();
		let fs = DiskFs::new(true);
		let store = temp.path().join("store");
		let tmp = temp.path().join("store.tmp");

		assert!(fs.open(&store).unwrap().is_none());

		let mut writer = fs.create(&tmp).unwrap();
		writer.write_all(b"bank\n1\nalice\np@ss1\n").unwrap();
		fs.finish(writer).unwrap();
		fs.rename(&tmp, &store).unwrap();

		let mut data = Vec::new();
		fs.open(&store).unwrap().unwrap().read_to_end(&mut data).unwrap();
		assert_eq!(data, b"bank\n1\nalice\np@ss1\n");

		fs.remove(&store).unwrap();
		assert!(fs.open(&store).unwrap().is_none());
	}

	#[cfg(unix)]
	#[test]
	fn test_disk_fs_store_is_owner_only() {
		use std::os::unix::fs::PermissionsExt;

		let temp = tempdir::TempDir::new("test_disk_fs_store_is_owner_only").unwrap();
		let fs = DiskFs::new(false);
		let store = temp.path().join("store");
		let tmp = temp.path().join("store.tmp");

		let writer = fs.create(&tmp).unwrap();
		fs.finish(writer).unwrap();
		fs.rename(&tmp, &store).unwrap();

		let mode = ::std::fs::metadata(&store).unwrap().permissions().mode();
		assert_eq!(mode & 0o077, 0);
	}
}
