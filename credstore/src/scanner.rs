//! Site scanner
//!
//! Walks the store site by site. Sites which are not affected by an operation are
//! skipped with copy-through: their lines are mirrored to the sink exactly as read,
//! without being decoded or reformatted.

use std::io::{self, BufRead, Write};

use error::{ErrorKind, Result, ResultExt};
use record::{parse_count, Line, LineReader};

/// Sequential reader of store sites.
#[derive(Debug)]
pub struct Scanner<R> {
	reader: LineReader<R>,
}

#[inline]
fn mirror(sink: &mut Option<&mut dyn Write>, line: &Line) -> io::Result<()> {
	match *sink {
		Some(ref mut sink) => sink.write_all(line.as_bytes()),
		None => Ok(()),
	}
}

impl<R: BufRead> Scanner<R> {
	pub fn new(source: R) -> Self {
		Scanner {
			reader: LineReader::new(source),
		}
	}

	/// Line number of the last line read.
	pub fn line(&self) -> usize {
		self.reader.line()
	}

	/// Returns false if the store ended with a line that has no newline.
	pub fn ends_terminated(&self) -> bool {
		self.reader.ends_terminated()
	}

	/// Builds a corruption error pointing at the last line read.
	pub fn corrupted<S: Into<String>>(&self, msg: S) -> ErrorKind {
		ErrorKind::CorruptedStore(self.reader.line(), msg.into())
	}

	/// Reads the name of the next site. Returns `None` at the end of the store.
	pub fn next_site(&mut self) -> Result<Option<Line>> {
		self.reader.read_line()
	}

	/// Reads a record which has to be present.
	pub fn read_record(&mut self, what: &str) -> Result<Line> {
		match self.reader.read_line()? {
			Some(line) => Ok(line),
			None => Err(ErrorKind::CorruptedStore(
				self.reader.line() + 1,
				format!("expected {}, found end of file", what),
			).into()),
		}
	}

	/// Reads a record which is going to be written out again, so it must
	/// carry its newline.
	pub fn read_complete_record(&mut self, what: &str) -> Result<Line> {
		let line = self.read_record(what)?;
		if !line.is_terminated() {
			bail!(self.corrupted(format!("{} is missing its newline", what)));
		}
		Ok(line)
	}

	/// Reads the account count header. Returns the raw header with the parsed count.
	pub fn read_count(&mut self) -> Result<(Line, usize)> {
		let header = self.read_record("account count")?;
		let count = parse_count(header.as_bytes())
			.chain_err(|| self.corrupted("invalid account count"))?;
		Ok((header, count))
	}

	/// Skips a site whose name was just read: its count header and exactly
	/// `2 × count` following lines. Every line is mirrored to `sink` if present.
	pub fn skip_site(&mut self, mut sink: Option<&mut dyn Write>) -> Result<()> {
		let (header, count) = self.read_count()?;
		mirror(&mut sink, &header)?;

		for _ in 0..count {
			let name = self.read_record("account name")?;
			mirror(&mut sink, &name)?;
			let password = self.read_record("password")?;
			mirror(&mut sink, &password)?;
		}

		Ok(())
	}

	/// Copies everything not read yet to `sink`, byte for byte.
	pub fn copy_rest(&mut self, sink: &mut dyn Write) -> Result<u64> {
		Ok(io::copy(self.reader.get_mut(), sink)?)
	}
}
