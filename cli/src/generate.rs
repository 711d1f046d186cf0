//! Random password generator

use rand::Rng;
use rand::seq::SliceRandom;
use zeroize::Zeroizing;

use credstore::MAX_RECORD_LEN;
use error::{ErrorKind, Result};

pub const MIN_LEN: usize = 9;
pub const MAX_LEN: usize = MAX_RECORD_LEN;
/// Lengths below this one are worth a warning.
pub const WEAK_LEN: usize = 12;
pub const RECOMMENDED_LEN: usize = 14;

/// Parses and checks a requested password length.
pub fn parse_length(value: &str) -> Result<usize> {
	match value.trim().parse::<usize>() {
		Ok(length) if length >= MIN_LEN && length <= MAX_LEN => Ok(length),
		_ => Err(ErrorKind::InvalidLength(value.to_owned()).into()),
	}
}

/// Printable ASCII characters, space included, except `excluded`.
pub fn pool(excluded: &str) -> Vec<char> {
	(b' '..b'~' + 1)
		.map(char::from)
		.filter(|c| !excluded.contains(*c))
		.collect()
}

/// Draws `length` characters uniformly from the pool.
pub fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize, excluded: &str) -> Result<Zeroizing<String>> {
	let pool = pool(excluded);
	if pool.is_empty() {
		bail!(ErrorKind::EmptyPool);
	}

	let mut password = Zeroizing::new(String::with_capacity(length));
	for _ in 0..length {
		if let Some(&c) = pool.choose(rng) {
			password.push(c);
		}
	}

	Ok(password)
}
