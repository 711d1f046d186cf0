//! Query engine
//!
//! Read-only traversals of the store. Nothing here writes, so sites are skipped
//! without a sink and non-matching accounts are dropped as soon as they are read.

use std::fmt;
use std::io::BufRead;

use zeroize::Zeroizing;

use error::{Error, Result};
use index::find_password;
use record::Line;
use scanner::Scanner;

/// A stored credential.
pub struct Entry {
	/// Site name.
	pub site: String,
	/// Account name.
	pub account: String,
	/// Password, scrubbed on drop.
	pub password: Zeroizing<String>,
}

impl fmt::Debug for Entry {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Entry")
			.field("site", &self.site)
			.field("account", &self.account)
			.field("password", &"<redacted>")
			.finish()
	}
}

fn decode<R: BufRead>(scanner: &Scanner<R>, line: Line, what: &str) -> Result<Zeroizing<String>> {
	line.into_string()
		.ok_or_else(|| Error::from(scanner.corrupted(format!("{} is not valid UTF-8", what))))
}

/// Lazy iterator over every credential in store order.
///
/// Iteration stops after the first error.
#[derive(Debug)]
pub struct Entries<R> {
	scanner: Option<Scanner<R>>,
	site: String,
	remaining: usize,
}

impl<R: BufRead> Entries<R> {
	/// Iterates over `source`, or over nothing if there is no store yet.
	pub(crate) fn new(source: Option<R>) -> Self {
		Entries {
			scanner: source.map(Scanner::new),
			site: String::new(),
			remaining: 0,
		}
	}

	fn next_entry(&mut self) -> Result<Option<Entry>> {
		let scanner = match self.scanner {
			Some(ref mut scanner) => scanner,
			None => return Ok(None),
		};

		if self.remaining == 0 {
			let name = match scanner.next_site()? {
				Some(name) => name,
				None => return Ok(None),
			};
			self.site = decode(scanner, name, "site name")?.as_str().to_owned();
			let (_, count) = scanner.read_count()?;
			self.remaining = count;
		}

		let name = scanner.read_record("account name")?;
		let account = decode(scanner, name, "account name")?.as_str().to_owned();
		let password = scanner.read_record("password")?;
		let password = decode(scanner, password, "password")?;
		self.remaining -= 1;

		Ok(Some(Entry {
			site: self.site.clone(),
			account,
			password,
		}))
	}
}

impl<R: BufRead> Iterator for Entries<R> {
	type Item = Result<Entry>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.next_entry() {
			Ok(Some(entry)) => Some(Ok(entry)),
			Ok(None) => {
				self.scanner = None;
				None
			},
			Err(err) => {
				self.scanner = None;
				Some(Err(err))
			},
		}
	}
}

/// Returns the password of `account` in the first site named `site`.
pub fn fetch<R: BufRead>(source: R, site: &Line, account: &Line) -> Result<Option<Zeroizing<String>>> {
	let mut scanner = Scanner::new(source);

	while let Some(name) = scanner.next_site()? {
		if name != *site {
			scanner.skip_site(None)?;
			continue;
		}

		let (_, count) = scanner.read_count()?;
		return match find_password(&mut scanner, count, account)? {
			Some(password) => decode(&scanner, password, "password").map(Some),
			None => Ok(None),
		};
	}

	Ok(None)
}
