//! Record codec
//!
//! Every value in the store (a site name, a count, an account name or a password)
//! is a single line. The terminating newline is part of the record, so two names
//! are equal only if their lines are byte-for-byte equal.

use std::{fmt, mem, str};
use std::io::{BufRead, Read, Write};

use zeroize::{Zeroize, Zeroizing};

use error::{ErrorKind, Result};

/// Maximum number of content bytes in a single record, newline excluded.
pub const MAX_RECORD_LEN: usize = 999;

/// Bytes requested from the source for a single line: the longest valid record
/// with its newline, plus one byte to detect an over-long one.
const LINE_CAPACITY: usize = MAX_RECORD_LEN + 2;

const NEWLINE: u8 = b'\n';

/// A single record, including its terminating newline.
///
/// The backing buffer is scrubbed when the line is dropped, since any line
/// read from the store may hold a password.
#[derive(Clone, PartialEq, Eq)]
pub struct Line {
	bytes: Zeroizing<Vec<u8>>,
}

impl Line {
	/// Creates a record from a single-line value supplied by the caller.
	pub fn from_value(value: &str) -> Result<Line> {
		validate_value(value)?;

		let mut bytes = Zeroizing::new(Vec::with_capacity(value.len() + 1));
		bytes.extend_from_slice(value.as_bytes());
		bytes.push(NEWLINE);
		Ok(Line { bytes })
	}

	/// Creates an account count header.
	pub(crate) fn count(count: usize) -> Line {
		Line {
			bytes: Zeroizing::new(format!("{}\n", count).into_bytes()),
		}
	}

	/// Raw bytes of the record, newline included.
	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Bytes of the record without its newline.
	pub fn value(&self) -> &[u8] {
		if self.is_terminated() {
			&self.bytes[..self.bytes.len() - 1]
		} else {
			&self.bytes
		}
	}

	/// Number of content bytes.
	pub fn content_len(&self) -> usize {
		self.value().len()
	}

	/// Returns false only for a final line which was cut off at the end of the file.
	pub fn is_terminated(&self) -> bool {
		self.bytes.last() == Some(&NEWLINE)
	}

	/// Converts the record value to a string which is scrubbed on drop.
	/// Returns `None` if the value is not valid UTF-8.
	pub(crate) fn into_string(mut self) -> Option<Zeroizing<String>> {
		if self.is_terminated() {
			self.bytes.pop();
		}

		let bytes = mem::replace(&mut *self.bytes, Vec::new());
		match String::from_utf8(bytes) {
			Ok(string) => Some(Zeroizing::new(string)),
			Err(err) => {
				let mut bytes = err.into_bytes();
				bytes.zeroize();
				None
			},
		}
	}
}

impl fmt::Debug for Line {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Line({} bytes)", self.bytes.len())
	}
}

/// Checks that `value` can be stored as a single record.
pub fn validate_value(value: &str) -> Result<()> {
	if value.as_bytes().contains(&NEWLINE) {
		bail!(ErrorKind::InvalidRecord("value must not contain a newline".into()));
	}

	if value.len() > MAX_RECORD_LEN {
		bail!(ErrorKind::InvalidRecord(format!(
			"value is {} bytes long, at most {} are allowed",
			value.len(),
			MAX_RECORD_LEN,
		)));
	}

	Ok(())
}

/// Parses an account count header. The count must be a positive decimal
/// number, optionally followed by the newline and nothing else.
pub fn parse_count(line: &[u8]) -> Result<usize> {
	let digits = match line.split_last() {
		Some((&NEWLINE, rest)) => rest,
		_ => line,
	};

	let invalid = || ErrorKind::InvalidCount(String::from_utf8_lossy(digits).into_owned());

	if digits.is_empty() || !digits.iter().all(|b| b.is_ascii_digit()) {
		return Err(invalid().into());
	}

	let count = str::from_utf8(digits).ok()
		.and_then(|digits| digits.parse::<usize>().ok())
		.ok_or_else(invalid)?;

	if count == 0 {
		return Err(invalid().into());
	}

	Ok(count)
}

/// Writes a complete record. Records over the length bound or without
/// their newline are never written.
pub fn write_record<W: Write + ?Sized>(sink: &mut W, line: &Line) -> Result<()> {
	if line.content_len() > MAX_RECORD_LEN {
		bail!(ErrorKind::InvalidRecord(format!("refusing to write a {} byte record", line.content_len())));
	}

	if !line.is_terminated() {
		bail!(ErrorKind::InvalidRecord("refusing to write a record without its newline".into()));
	}

	sink.write_all(line.as_bytes())?;
	Ok(())
}

/// Reads the store one line at a time.
#[derive(Debug)]
pub struct LineReader<R> {
	inner: R,
	line: usize,
	terminated: bool,
}

impl<R: BufRead> LineReader<R> {
	pub fn new(inner: R) -> Self {
		LineReader {
			inner,
			line: 0,
			terminated: true,
		}
	}

	/// Number of lines read so far, which is the line number of the last one.
	pub fn line(&self) -> usize {
		self.line
	}

	/// Returns false if the last line read had no newline.
	pub fn ends_terminated(&self) -> bool {
		self.terminated
	}

	/// Reads the next line. Returns `None` at the end of the source.
	pub fn read_line(&mut self) -> Result<Option<Line>> {
		// preallocated, so the buffer never moves and leaves copies behind
		let mut bytes = Zeroizing::new(Vec::with_capacity(LINE_CAPACITY));
		let read = (&mut self.inner)
			.take(LINE_CAPACITY as u64)
			.read_until(NEWLINE, &mut bytes)?;

		if read == 0 {
			return Ok(None);
		}

		self.line += 1;
		let line = Line { bytes };
		if line.content_len() > MAX_RECORD_LEN {
			bail!(ErrorKind::RecordTooLong(self.line));
		}

		self.terminated = line.is_terminated();
		Ok(Some(line))
	}

	pub(crate) fn get_mut(&mut self) -> &mut R {
		&mut self.inner
	}
}
