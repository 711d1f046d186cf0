//! Flat-file credential store
//!
//! Assumptions:
//!
//! - a single local file holds every credential
//!
//! - credentials are grouped by site, a site holds one or more accounts
//!
//! - every mutation rewrites the whole file into a temporary one
//!
//! - the temporary file replaces the store only once it is complete
//!
//! The store is a sequence of newline-terminated records. Each site starts
//! with its name and the number of accounts it holds, followed by an account
//! name and a password for every account.
//!
//! ```text
//!  site   count  account  password  account  password
//!   /      /      /        /         /        /
//! |bank\n|2\n|alice\n|p@ss1\n|bob\n|hunter2\n|mail\n|1\n|...
//! ```
//!
//! A record holds at most 999 bytes, not counting its newline. Names are
//! compared byte for byte and only the first site or account with a given
//! name is ever looked at.
//!
//! A transaction streams the old store into the temporary file:
//!
//! ```text
//!  old store              temporary file
//! |site a|      copy     |site a|
//! |site b|  ->  rewrite  |site b'|
//! |site c|      copy     |site c|
//! ```
//!
//! Sites other than the mutated one are copied byte for byte.

#![warn(missing_docs)]

#[macro_use]
extern crate error_chain;
extern crate fs2;
#[macro_use]
extern crate log;
extern crate parking_lot;
extern crate zeroize;
#[cfg(test)]
#[macro_use]
extern crate matches;
#[cfg(test)]
#[macro_use]
extern crate quickcheck;

mod commit;
mod error;
mod fs;
mod index;
mod lock;
mod options;
mod query;
mod record;
mod scanner;
mod store;
mod writer;

pub use error::{Error, ErrorKind, Result, ResultExt};
pub use fs::{DiskFs, FsOp, MemoryFs, MemoryReader, MemoryWriter, StoreFs};
pub use lock::StoreLock;
pub use options::{CommitStrategy, Options};
pub use query::{Entries, Entry};
pub use record::{validate_value, Line, MAX_RECORD_LEN};
pub use store::Store;
pub use writer::{Missing, Mutation, Outcome};
