//! Password strength estimate
//!
//! The estimate is the entropy of a password drawn at random from every
//! character class it uses:
//!
//! ```text
//!  class    upper  lower  digit  other
//!  range       26     26     10     20
//! ```
//!
//! `entropy = length * log2(sum of used ranges)`

use std::fmt;

const LETTERS: u32 = 26;
const DIGITS: u32 = 10;
const OTHER: u32 = 20;

/// Passwords at least this long are very strong whatever they contain.
pub const VERY_STRONG_LEN: usize = 31;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Strength {
	VeryWeak,
	Weak,
	Reasonable,
	Strong,
	VeryStrong,
}

impl fmt::Display for Strength {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let name = match *self {
			Strength::VeryWeak => "very weak",
			Strength::Weak => "weak",
			Strength::Reasonable => "reasonable",
			Strength::Strong => "strong",
			Strength::VeryStrong => "very strong",
		};
		f.write_str(name)
	}
}

/// Sum of the ranges of every character class present in `password`.
pub fn char_range(password: &str) -> u32 {
	let (mut upper, mut lower, mut digit, mut other) = (false, false, false, false);

	for c in password.chars() {
		if c.is_ascii_uppercase() {
			upper = true;
		} else if c.is_ascii_lowercase() {
			lower = true;
		} else if c.is_ascii_digit() {
			digit = true;
		} else {
			other = true;
		}
	}

	[(upper, LETTERS), (lower, LETTERS), (digit, DIGITS), (other, OTHER)].iter()
		.filter(|&&(used, _)| used)
		.map(|&(_, range)| range)
		.sum()
}

/// Entropy of `password` in bits.
pub fn entropy(password: &str) -> f64 {
	match char_range(password) {
		0 => 0.0,
		range => password.chars().count() as f64 * (range as f64).log2(),
	}
}

pub fn rate(password: &str) -> Strength {
	if password.chars().count() >= VERY_STRONG_LEN {
		return Strength::VeryStrong;
	}

	match entropy(password) {
		e if e < 25.0 => Strength::VeryWeak,
		e if e < 50.0 => Strength::Weak,
		e if e < 75.0 => Strength::Reasonable,
		e if e < 100.0 => Strength::Strong,
		_ => Strength::VeryStrong,
	}
}
