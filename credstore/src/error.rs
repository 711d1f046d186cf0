#![allow(unknown_lints)]
#![allow(missing_docs)]

use std::io;
use std::path::PathBuf;

error_chain! {
	foreign_links {
		Io(io::Error);
	}

	errors {
		CorruptedStore(line: usize, msg: String) {
			description("Store file was probably altered"),
			display("Store corruption detected at line {}: {}. The store file was probably altered.", line, msg),
		}
		RecordTooLong(line: usize) {
			description("Record exceeds the maximum length"),
			display("Record at line {} is longer than {} bytes.", line, ::record::MAX_RECORD_LEN),
		}
		InvalidCount(value: String) {
			description("Invalid account count"),
			display("Invalid account count {:?}, expected a positive decimal number.", value),
		}
		InvalidRecord(msg: String) {
			description("Value cannot be stored as a record"),
			display("Invalid record: {}", msg),
		}
		AllocationFailed(buffered: usize) {
			description("Failed to allocate memory for buffered accounts"),
			display("Out of memory after buffering {} accounts.", buffered),
		}
		StoreUpdate(path: PathBuf) {
			description("Failed to update store"),
			display("Failed to update store at {}.", path.display()),
		}
		StoreLocked(path: PathBuf) {
			description("Store lock is currently acquired"),
			display("Could not acquire store lock: {}. \
					 If you're sure that no other process is using \
					 the store you can delete this file.", path.display()),
		}
		InvalidOptions(field: &'static str, error: String) {
			description("Invalid options were provided"),
			display("Invalid value of `{}`: {}", field, error),
		}
	}
}

impl PartialEq for ErrorKind {
	fn eq(&self, other: &Self) -> bool {
		use self::ErrorKind::*;

		match (self, other) {
			(&CorruptedStore(line, ref msg), &CorruptedStore(line2, ref msg2))
				if line == line2 && msg == msg2 => true,
			(&RecordTooLong(line), &RecordTooLong(line2))
				if line == line2 => true,
			(&InvalidCount(ref value), &InvalidCount(ref value2))
				if value == value2 => true,
			(&InvalidRecord(ref msg), &InvalidRecord(ref msg2))
				if msg == msg2 => true,
			(&AllocationFailed(buffered), &AllocationFailed(buffered2))
				if buffered == buffered2 => true,
			(&StoreUpdate(ref path), &StoreUpdate(ref path2))
				if path == path2 => true,
			(&StoreLocked(ref path), &StoreLocked(ref path2))
				if path == path2 => true,
			(&InvalidOptions(field, ref error), &InvalidOptions(field2, ref error2))
				if field == field2 && error == error2 => true,
			_ => false,
		}
	}
}

impl ErrorKind {
	/// Returns true if the error means the store contents could not be parsed.
	pub fn is_format_error(&self) -> bool {
		match *self {
			ErrorKind::CorruptedStore(..) | ErrorKind::RecordTooLong(..) | ErrorKind::InvalidCount(_) => true,
			_ => false,
		}
	}
}
