//! Account index builder
//!
//! Locates an account inside the site being rewritten. Accounts read before the
//! match are buffered, so they can be written out again unchanged.

use std::io::{BufRead, Write};

use error::{ErrorKind, Result};
use record::{write_record, Line};
use scanner::Scanner;

/// A name and password pair. Both records keep their newline.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
	pub name: Line,
	pub password: Line,
}

impl Account {
	pub(crate) fn write_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
		write_record(sink, &self.name)?;
		write_record(sink, &self.password)
	}
}

/// Result of searching one site for an account.
#[derive(Debug)]
pub struct AccountIndex {
	/// Whether the account was found.
	pub found: bool,
	/// Accounts preceding the match, or every account of the site if there was none.
	pub buffered: Vec<Account>,
}

impl AccountIndex {
	/// Reads up to `count` accounts, stopping after the first one named `target`.
	///
	/// The matched account is consumed but not kept. On error the already buffered
	/// accounts are dropped, which scrubs their passwords.
	pub fn build<R: BufRead>(scanner: &mut Scanner<R>, count: usize, target: &Line) -> Result<Self> {
		let mut buffered: Vec<Account> = Vec::new();

		for read in 0..count {
			let name = scanner.read_complete_record("account name")?;
			if name == *target {
				// never written back, so it may be the unterminated last line
				let password = scanner.read_record("password")?;
				if !password.is_terminated() && read + 1 < count {
					bail!(scanner.corrupted("expected account name, found end of file"));
				}
				return Ok(AccountIndex {
					found: true,
					buffered,
				});
			}

			let password = scanner.read_complete_record("password")?;
			buffered.try_reserve(1).map_err(|_| ErrorKind::AllocationFailed(buffered.len()))?;
			buffered.push(Account { name, password });
		}

		Ok(AccountIndex {
			found: false,
			buffered,
		})
	}

	/// Writes the buffered accounts in their original order.
	pub fn write_buffered<W: Write + ?Sized>(&self, sink: &mut W) -> Result<()> {
		for account in &self.buffered {
			account.write_to(sink)?;
		}
		Ok(())
	}
}

/// Looks for `target` among the next `count` accounts and returns its password.
/// Accounts which do not match are dropped as soon as they are read.
pub fn find_password<R: BufRead>(scanner: &mut Scanner<R>, count: usize, target: &Line) -> Result<Option<Line>> {
	for _ in 0..count {
		let name = scanner.read_record("account name")?;
		let password = scanner.read_record("password")?;
		if name == *target {
			return Ok(Some(password));
		}
	}

	Ok(None)
}
