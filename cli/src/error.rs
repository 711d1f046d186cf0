#![allow(unknown_lints)]
#![allow(missing_docs)]

use std::io;

use credstore;

error_chain! {
	links {
		Store(credstore::Error, credstore::ErrorKind);
	}

	foreign_links {
		Io(io::Error);
	}

	errors {
		InvalidInput(field: &'static str, msg: String) {
			description("Invalid input"),
			display("Invalid {}: {}", field, msg),
		}
		InvalidLength(length: String) {
			description("Invalid password length"),
			display("Invalid password length {:?}, enter a number between {} and {}.",
				length, ::generate::MIN_LEN, ::generate::MAX_LEN),
		}
		EmptyPool {
			description("No characters left to generate from"),
			display("Every character was excluded, nothing left to generate a password from."),
		}
		NotFound(what: String) {
			description("Nothing stored under given name"),
			display("{}.", what),
		}
	}
}

impl PartialEq for ErrorKind {
	fn eq(&self, other: &Self) -> bool {
		use self::ErrorKind::*;

		match (self, other) {
			(&Store(ref kind), &Store(ref kind2)) => kind == kind2,
			(&InvalidInput(field, ref msg), &InvalidInput(field2, ref msg2))
				if field == field2 && msg == msg2 => true,
			(&InvalidLength(ref length), &InvalidLength(ref length2))
				if length == length2 => true,
			(&EmptyPool, &EmptyPool) => true,
			(&NotFound(ref what), &NotFound(ref what2))
				if what == what2 => true,
			_ => false,
		}
	}
}
