extern crate credstore;
#[macro_use]
extern crate matches;
#[macro_use]
extern crate quickcheck;
extern crate tempdir;

use std::fs;
use tempdir::TempDir;
use credstore::{CommitStrategy, ErrorKind, Missing, Options, Outcome, Store};

#[derive(Debug)]
enum Action {
	Save(&'static str, &'static str, &'static str, Outcome),
	Delete(&'static str, &'static str, Outcome),
	AssertPassword(&'static str, &'static str, &'static str),
	AssertNone(&'static str, &'static str),
	AssertList(&'static [(&'static str, &'static str, &'static str)]),
	AssertContents(&'static str),
	AssertNoStore,
}

use Action::*;

fn run_actions(store: &Store, actions: &[Action]) {
	for action in actions {
		println!("action: {:?}", action);
		match *action {
			Save(site, account, password, outcome) => {
				assert_eq!(store.save_or_update(site, account, password).unwrap(), outcome);
			},
			Delete(site, account, outcome) => {
				assert_eq!(store.delete_account(site, account).unwrap(), outcome);
			},
			AssertPassword(site, account, expected) => {
				assert_eq!(store.get_password(site, account).unwrap().unwrap().as_str(), expected);
			},
			AssertNone(site, account) => {
				assert!(store.get_password(site, account).unwrap().is_none());
			},
			AssertList(expected) => {
				let listed = store.list_accounts().unwrap()
					.map(|entry| {
						let entry = entry.unwrap();
						(entry.site, entry.account, entry.password.as_str().to_owned())
					})
					.collect::<Vec<_>>();
				let expected = expected.iter()
					.map(|&(site, account, password)| (site.to_owned(), account.to_owned(), password.to_owned()))
					.collect::<Vec<_>>();
				assert_eq!(listed, expected);
			},
			AssertContents(expected) => {
				assert_eq!(fs::read(store.path()).unwrap(), expected.as_bytes());
				assert!(!store.temp_path().exists());
			},
			AssertNoStore => {
				assert!(!store.path().exists());
				assert!(!store.temp_path().exists());
			},
		}
	}
}

macro_rules! store_test {
	($name: tt, $($actions: expr),*) => {
		#[test]
		fn $name() {
			let temp = TempDir::new(stringify!($name)).unwrap();
			let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();
			run_actions(&store, &[$($actions),*]);

			let legacy = Store::open(temp.path().join("legacy"), Options {
				commit: CommitStrategy::RemoveThenRename,
				..Default::default()
			}).unwrap();
			run_actions(&legacy, &[$($actions),*]);
		}
	}
}

store_test!(
	test_store_save_and_get,
	Save("bank", "alice", "p@ss1", Outcome::SiteCreated),
	AssertContents("bank\n1\nalice\np@ss1\n"),
	AssertPassword("bank", "alice", "p@ss1"),
	AssertNone("bank", "bob"),
	AssertNone("mail", "alice")
);

store_test!(
	test_store_update_password,
	Save("bank", "alice", "p@ss1", Outcome::SiteCreated),
	Save("bank", "alice", "newpass", Outcome::Updated),
	AssertContents("bank\n1\nalice\nnewpass\n"),
	AssertPassword("bank", "alice", "newpass")
);

store_test!(
	test_store_add_account_and_site,
	Save("bank", "alice", "p@ss1", Outcome::SiteCreated),
	Save("bank", "bob", "xyz", Outcome::Added),
	Save("mail", "carol", "qwerty", Outcome::SiteCreated),
	AssertContents("bank\n2\nalice\np@ss1\nbob\nxyz\nmail\n1\ncarol\nqwerty\n"),
	AssertList(&[
		("bank", "alice", "p@ss1"),
		("bank", "bob", "xyz"),
		("mail", "carol", "qwerty"),
	])
);

store_test!(
	test_store_delete_last_account_removes_site,
	Save("bank", "alice", "p@ss1", Outcome::SiteCreated),
	Save("mail", "bob", "xyz", Outcome::SiteCreated),
	Save("shop", "carol", "qwerty", Outcome::SiteCreated),
	Delete("mail", "bob", Outcome::SiteRemoved),
	AssertContents("bank\n1\nalice\np@ss1\nshop\n1\ncarol\nqwerty\n"),
	AssertNone("mail", "bob"),
	Delete("bank", "alice", Outcome::SiteRemoved),
	Delete("shop", "carol", Outcome::SiteRemoved),
	AssertContents(""),
	AssertList(&[])
);

store_test!(
	test_store_delete_keeps_order,
	Save("bank", "a", "1", Outcome::SiteCreated),
	Save("bank", "b", "2", Outcome::Added),
	Save("bank", "c", "3", Outcome::Added),
	Delete("bank", "b", Outcome::Deleted),
	AssertContents("bank\n2\na\n1\nc\n3\n"),
	Save("bank", "b", "4", Outcome::Added),
	AssertList(&[
		("bank", "a", "1"),
		("bank", "c", "3"),
		("bank", "b", "4"),
	])
);

store_test!(
	test_store_delete_missing,
	Delete("bank", "alice", Outcome::NotFound(Missing::Site)),
	AssertNoStore,
	Save("bank", "alice", "p@ss1", Outcome::SiteCreated),
	Delete("bank", "bob", Outcome::NotFound(Missing::Account)),
	Delete("mail", "alice", Outcome::NotFound(Missing::Site)),
	AssertContents("bank\n1\nalice\np@ss1\n")
);

store_test!(
	test_store_names_are_case_sensitive,
	Save("Bank", "alice", "p@ss1", Outcome::SiteCreated),
	Save("bank", "Alice", "p@ss2", Outcome::SiteCreated),
	AssertNone("bank", "alice"),
	AssertPassword("Bank", "alice", "p@ss1"),
	AssertPassword("bank", "Alice", "p@ss2")
);

#[test]
fn test_missing_store_is_empty() {
	let temp = TempDir::new("test_missing_store_is_empty").unwrap();
	let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();

	assert!(store.get_password("bank", "alice").unwrap().is_none());
	assert_eq!(store.list_accounts().unwrap().count(), 0);
	assert!(!store.path().exists());
}

#[test]
fn test_malformed_count_leaves_store_unchanged() {
	let temp = TempDir::new("test_malformed_count_leaves_store_unchanged").unwrap();
	let path = temp.path().join("passwords");
	fs::write(&path, "bank\nabc\nalice\np@ss1\n").unwrap();
	let store = Store::open(&path, Options::default()).unwrap();

	let err = store.save_or_update("bank", "alice", "x").unwrap_err();
	assert!(matches!(*err.kind(), ErrorKind::CorruptedStore(2, _)));
	assert!(store.delete_account("bank", "alice").is_err());
	assert!(store.get_password("bank", "alice").is_err());

	assert_eq!(fs::read(&path).unwrap(), b"bank\nabc\nalice\np@ss1\n");
	assert!(!store.temp_path().exists());
}

#[test]
fn test_truncated_store_is_corrupted() {
	let temp = TempDir::new("test_truncated_store_is_corrupted").unwrap();
	let path = temp.path().join("passwords");
	fs::write(&path, "bank\n2\nalice\np@ss1\n").unwrap();
	let store = Store::open(&path, Options::default()).unwrap();

	let err = store.save_or_update("bank", "bob", "xyz").unwrap_err();
	assert!(err.kind().is_format_error());
	assert_eq!(fs::read(&path).unwrap(), b"bank\n2\nalice\np@ss1\n");
}

#[test]
fn test_invalid_values_are_rejected() {
	let temp = TempDir::new("test_invalid_values_are_rejected").unwrap();
	let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();
	let long = "x".repeat(1000);

	assert!(matches!(*store.save_or_update("ba\nnk", "alice", "p").unwrap_err().kind(), ErrorKind::InvalidRecord(_)));
	assert!(matches!(*store.save_or_update("bank", &long, "p").unwrap_err().kind(), ErrorKind::InvalidRecord(_)));
	assert!(matches!(*store.get_password("bank", "al\nice").unwrap_err().kind(), ErrorKind::InvalidRecord(_)));
	assert!(!store.path().exists());

	assert_eq!(store.save_or_update("bank", "alice", &long[..999]).unwrap(), Outcome::SiteCreated);
	assert_eq!(store.get_password("bank", "alice").unwrap().unwrap().len(), 999);
}

#[test]
fn test_unterminated_last_password_can_be_changed() {
	let temp = TempDir::new("test_unterminated_last_password_can_be_changed").unwrap();
	let path = temp.path().join("passwords");
	fs::write(&path, "bank\n1\nalice\np@ss1").unwrap();
	let store = Store::open(&path, Options::default()).unwrap();

	assert_eq!(store.get_password("bank", "alice").unwrap().unwrap().as_str(), "p@ss1");
	assert_eq!(store.save_or_update("bank", "alice", "new").unwrap(), Outcome::Updated);
	assert_eq!(fs::read(&path).unwrap(), b"bank\n1\nalice\nnew\n");

	fs::write(&path, "bank\n1\nalice\np@ss1").unwrap();
	assert_eq!(store.delete_account("bank", "alice").unwrap(), Outcome::SiteRemoved);
	assert_eq!(fs::read(&path).unwrap(), b"");
}

#[test]
fn test_foreign_bytes_are_preserved() {
	let temp = TempDir::new("test_foreign_bytes_are_preserved").unwrap();
	let path = temp.path().join("passwords");
	let old = b"bank\n002\na\n\xff\xfe\nb\n2\nmail\n1\nc\n3\n";
	fs::write(&path, &old[..]).unwrap();
	let store = Store::open(&path, Options::default()).unwrap();

	assert_eq!(store.save_or_update("mail", "c", "4").unwrap(), Outcome::Updated);
	assert_eq!(fs::read(&path).unwrap(), &b"bank\n002\na\n\xff\xfe\nb\n2\nmail\n1\nc\n4\n"[..]);
}

#[test]
fn test_lock_is_exclusive() {
	let temp = TempDir::new("test_lock_is_exclusive").unwrap();
	let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();

	let lock = store.lock().unwrap();
	assert!(matches!(*store.lock().unwrap_err().kind(), ErrorKind::StoreLocked(_)));
	drop(lock);
	assert!(store.lock().is_ok());
}

fn credentials(ops: &[(u8, u8, u8)]) -> Vec<(String, String, String)> {
	ops.iter()
		.map(|&(site, account, password)| (
			format!("site{}", site % 4),
			format!("acct{}", account % 5),
			format!("pw{}", password),
		))
		.collect()
}

fn parse_counts(data: &[u8]) -> bool {
	let text = String::from_utf8(data.to_vec()).unwrap();
	let mut lines = text.lines();

	while let Some(_site) = lines.next() {
		let count = match lines.next().and_then(|count| count.parse::<usize>().ok()) {
			Some(count) if count > 0 => count,
			_ => return false,
		};
		for _ in 0..count * 2 {
			if lines.next().is_none() {
				return false;
			}
		}
	}

	true
}

quickcheck! {
	fn quickcheck_listing_resaves_identically(ops: Vec<(u8, u8, u8)>) -> bool {
		let temp = TempDir::new("quickcheck_listing_resaves_identically").unwrap();
		let original = Store::open(temp.path().join("original"), Options::default()).unwrap();
		for (site, account, password) in credentials(&ops) {
			original.save_or_update(&site, &account, &password).unwrap();
		}

		let copy = Store::open(temp.path().join("copy"), Options::default()).unwrap();
		for entry in original.list_accounts().unwrap() {
			let entry = entry.unwrap();
			copy.save_or_update(&entry.site, &entry.account, &entry.password).unwrap();
		}

		let original = fs::read(original.path()).unwrap_or_default();
		let copy = fs::read(copy.path()).unwrap_or_default();
		original == copy
	}

	fn quickcheck_counts_match_accounts(ops: Vec<(u8, u8, u8)>, deletes: Vec<(u8, u8)>) -> bool {
		let temp = TempDir::new("quickcheck_counts_match_accounts").unwrap();
		let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();
		for (site, account, password) in credentials(&ops) {
			store.save_or_update(&site, &account, &password).unwrap();
		}
		for &(site, account) in &deletes {
			store.delete_account(&format!("site{}", site % 4), &format!("acct{}", account % 5)).unwrap();
		}

		parse_counts(&fs::read(store.path()).unwrap_or_default())
	}

	fn quickcheck_delete_is_idempotent(ops: Vec<(u8, u8, u8)>, site: u8, account: u8) -> bool {
		let temp = TempDir::new("quickcheck_delete_is_idempotent").unwrap();
		let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();
		for (site, account, password) in credentials(&ops) {
			store.save_or_update(&site, &account, &password).unwrap();
		}

		let site = format!("site{}", site % 4);
		let account = format!("acct{}", account % 5);
		store.delete_account(&site, &account).unwrap();
		let once = fs::read(store.path()).ok();

		store.delete_account(&site, &account).unwrap().is_not_found()
			&& fs::read(store.path()).ok() == once
			&& store.get_password(&site, &account).unwrap().is_none()
	}

	fn quickcheck_last_save_wins(ops: Vec<(u8, u8, u8)>) -> bool {
		let temp = TempDir::new("quickcheck_last_save_wins").unwrap();
		let store = Store::open(temp.path().join("passwords"), Options::default()).unwrap();
		let credentials = credentials(&ops);
		for &(ref site, ref account, ref password) in &credentials {
			store.save_or_update(site, account, password).unwrap();
		}

		credentials.iter().all(|&(ref site, ref account, _)| {
			let last = credentials.iter()
				.rev()
				.find(|&&(ref s, ref a, _)| s == site && a == account)
				.map(|&(_, _, ref password)| password.as_str());
			store.get_password(site, account).unwrap().as_ref().map(|password| password.as_str()) == last
		})
	}
}
