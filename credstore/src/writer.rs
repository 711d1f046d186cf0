//! Transaction writer
//!
//! Builds the replacement store in a single pass over the old one. Every site
//! except the first one named like the target is copied through unchanged. The
//! target site is re-serialized with a corrected account count:
//!
//! ```text
//!  mutation   found         count   written after the header
//!  save       yes           N       preceding accounts, updated account
//!  save       no            N + 1   all accounts, new account
//!  delete     yes, N > 1    N - 1   preceding accounts
//!  delete     yes, N == 1   -       nothing, the site is removed
//!  delete     no            N       all accounts
//! ```
//!
//! Anything after the target site is copied byte for byte. A save for a site
//! which does not exist appends a new site at the end of the store.

use std::fmt;
use std::io::{BufRead, Write};

use error::Result;
use index::AccountIndex;
use record::{write_record, Line};
use scanner::Scanner;

/// A change to a single account of a site.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
	/// Insert the account or replace its password.
	Save {
		/// Account name.
		account: Line,
		/// New password.
		password: Line,
	},
	/// Remove the account.
	Delete {
		/// Account name.
		account: Line,
	},
}

impl Mutation {
	/// Account the mutation acts on.
	pub fn account(&self) -> &Line {
		match *self {
			Mutation::Save { ref account, .. } | Mutation::Delete { ref account } => account,
		}
	}
}

/// What was missing when a mutation had nothing to act on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Missing {
	/// No site with the given name.
	Site,
	/// The site exists but holds no such account.
	Account,
}

/// Result of a successful mutation.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Outcome {
	/// The password of an existing account was replaced.
	Updated,
	/// A new account was added to an existing site.
	Added,
	/// A new site holding the account was appended to the store.
	SiteCreated,
	/// The account was removed, its site still has other accounts.
	Deleted,
	/// The last account of a site was removed together with the site.
	SiteRemoved,
	/// Nothing to delete. The store is left unchanged.
	NotFound(Missing),
}

impl Outcome {
	/// Returns true if the mutation found nothing to delete.
	pub fn is_not_found(&self) -> bool {
		match *self {
			Outcome::NotFound(_) => true,
			_ => false,
		}
	}
}

impl fmt::Display for Outcome {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let msg = match *self {
			Outcome::Updated => "password updated",
			Outcome::Added => "account added",
			Outcome::SiteCreated => "site created",
			Outcome::Deleted => "account deleted",
			Outcome::SiteRemoved => "account deleted, site removed",
			Outcome::NotFound(Missing::Site) => "site not found",
			Outcome::NotFound(Missing::Account) => "account not found",
		};
		f.write_str(msg)
	}
}

/// Streams the store from `source` into `sink`, applying `mutation` to the
/// account in the first site named `site`.
pub fn apply<R: BufRead, W: Write>(source: R, sink: &mut W, site: &Line, mutation: &Mutation) -> Result<Outcome> {
	let mut scanner = Scanner::new(source);

	while let Some(name) = scanner.next_site()? {
		if name != *site {
			sink.write_all(name.as_bytes())?;
			scanner.skip_site(Some(&mut *sink as &mut dyn Write))?;
			continue;
		}

		debug!("Rewriting site found at line {}", scanner.line());
		let outcome = rewrite_site(&mut scanner, sink, &name, mutation)?;
		let tail = scanner.copy_rest(sink)?;
		trace!("Copied {} trailing bytes", tail);
		return Ok(outcome);
	}

	match *mutation {
		Mutation::Save { ref account, ref password } => {
			if !scanner.ends_terminated() {
				bail!(scanner.corrupted("last line is missing its newline"));
			}

			debug!("Appending new site after line {}", scanner.line());
			write_record(sink, site)?;
			write_record(sink, &Line::count(1))?;
			write_record(sink, account)?;
			write_record(sink, password)?;
			Ok(Outcome::SiteCreated)
		},
		Mutation::Delete { .. } => Ok(Outcome::NotFound(Missing::Site)),
	}
}

fn rewrite_site<R: BufRead, W: Write>(
	scanner: &mut Scanner<R>,
	sink: &mut W,
	name: &Line,
	mutation: &Mutation,
) -> Result<Outcome> {
	let (header, count) = scanner.read_count()?;
	let index = AccountIndex::build(scanner, count, mutation.account())?;

	let (new_count, outcome) = match (mutation, index.found) {
		(&Mutation::Save { .. }, true) => (Some(count), Outcome::Updated),
		(&Mutation::Save { .. }, false) => {
			let count = count.checked_add(1)
				.ok_or_else(|| scanner.corrupted("account count is too large"))?;
			(Some(count), Outcome::Added)
		},
		(&Mutation::Delete { .. }, true) if count > 1 => (Some(count - 1), Outcome::Deleted),
		(&Mutation::Delete { .. }, true) => (None, Outcome::SiteRemoved),
		(&Mutation::Delete { .. }, false) => (Some(count), Outcome::NotFound(Missing::Account)),
	};

	let new_count = match new_count {
		Some(new_count) => new_count,
		// the only account is gone, so is the site
		None => return Ok(outcome),
	};

	write_record(sink, name)?;
	if new_count == count {
		write_record(sink, &header)?;
	} else {
		write_record(sink, &Line::count(new_count))?;
	}

	index.write_buffered(sink)?;

	if let Mutation::Save { ref account, ref password } = *mutation {
		write_record(sink, account)?;
		write_record(sink, password)?;
	}

	Ok(outcome)
}
