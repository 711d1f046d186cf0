extern crate clap;
extern crate credstore;
#[macro_use]
extern crate error_chain;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate rand;
extern crate tracing_subscriber;
extern crate zeroize;

mod error;
mod generate;
mod strength;

use std::io::{self, Write};
use std::process;

use clap::{Arg, ArgMatches, App, AppSettings, SubCommand};
use credstore::{CommitStrategy, Options, Store, StoreLock};
use error_chain::ChainedError;
use itertools::Itertools;
use rand::rngs::OsRng;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use error::{ErrorKind, Result, ResultExt};

const DEFAULT_STORE: &'static str = "passwords";

const TIPS: &'static str = "\
A strong password is one that's easy for you to remember but difficult for others to guess.
Here are some things to consider when creating your passwords:
- never use personal information, or anything about you that can be found on social media
- use longer passwords (at least 14 to 16 characters)
- combine letters, numbers and other characters
- never share a password between accounts
- avoid runs of consecutive letters or numbers
- random passwords are the strongest
- smileys make a password longer: :), :(, =), :<, :S, ;), 8), :D, ...

But how do you remember a strong password?
Use a bizarre passphrase with symbols and numbers, made of words that don't usually go together
(e.g. 32 Seagulls deliver bologna sandwiches to Paris
 or   32-Seagullsdeliver bologna5andwiches2Paris!)

Or shorten a phrase that means something to you:
(e.g. 2BorNot2B_ThatisThe? (To be or not to be, that is the question)
      1gbeFnw8f:)          (I go bowling every Friday night with 8 friends))

Or let a password manager remember completely random passwords for you.";

fn init_logging(verbose: bool) {
	let filter = if verbose {
		EnvFilter::new("debug")
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_target(false)
		.init();
}

fn is_verbose(matches: &ArgMatches) -> bool {
	matches.is_present("VERBOSE") || matches.subcommand().1.map_or(false, |sub_m| sub_m.is_present("VERBOSE"))
}

fn validate_input(field: &'static str, value: &str) -> Result<()> {
	if value.is_empty() {
		bail!(ErrorKind::InvalidInput(field, "must not be empty".into()));
	}

	credstore::validate_value(value)
		.chain_err(|| ErrorKind::InvalidInput(field, "cannot be stored".into()))
}

fn read_name<'a>(matches: &'a ArgMatches, name: &str, field: &'static str) -> Result<&'a str> {
	let value = matches.value_of(name).unwrap_or("");
	validate_input(field, value)?;
	Ok(value)
}

/// Reads a single line from stdin without its line ending.
fn read_secret(prompt: &str) -> Result<Zeroizing<String>> {
	eprint!("{}", prompt);
	io::stderr().flush()?;

	let mut line = Zeroizing::new(String::with_capacity(credstore::MAX_RECORD_LEN + 2));
	io::stdin().read_line(&mut line)?;
	while line.ends_with('\n') || line.ends_with('\r') {
		line.pop();
	}

	Ok(line)
}

fn read_options(matches: &ArgMatches) -> Options {
	let commit = match matches.value_of("COMMIT") {
		Some("remove-rename") => CommitStrategy::RemoveThenRename,
		_ => CommitStrategy::Replace,
	};

	Options {
		commit,
		sync: matches.is_present("SYNC"),
		..Default::default()
	}
}

fn open_store(matches: &ArgMatches) -> Result<(Store, StoreLock)> {
	let path = matches.value_of("STORE").unwrap_or(DEFAULT_STORE);
	debug!("Using store at {}", path);

	let store = Store::open(path, read_options(matches))?;
	let lock = store.lock()?;
	Ok((store, lock))
}

fn generate_password(length: &str, excluded: &str) -> Result<Zeroizing<String>> {
	let length = generate::parse_length(length)?;
	if length < generate::WEAK_LEN {
		eprintln!("If you want a strong password, use at least {} characters.", generate::RECOMMENDED_LEN);
	}

	generate::generate(&mut OsRng, length, excluded)
}

fn do_save(matches: &ArgMatches) -> Result<()> {
	let site = read_name(matches, "SITE", "site")?;
	let account = read_name(matches, "ACCOUNT", "account")?;

	let password = match (matches.value_of("PASSWORD"), matches.value_of("GENERATE")) {
		(Some(password), _) => Zeroizing::new(password.to_owned()),
		(None, Some(length)) => {
			let password = generate_password(length, matches.value_of("EXCLUDE").unwrap_or(""))?;
			println!("{}", password.as_str());
			password
		},
		(None, None) => read_secret("Password: ")?,
	};
	validate_input("password", &password)?;

	let (store, _lock) = open_store(matches)?;
	let outcome = store.save_or_update(site, account, &password)?;
	println!("{}", outcome);
	Ok(())
}

fn do_delete(matches: &ArgMatches) -> Result<()> {
	let site = read_name(matches, "SITE", "site")?;
	let account = read_name(matches, "ACCOUNT", "account")?;

	let (store, _lock) = open_store(matches)?;
	let outcome = store.delete_account(site, account)?;
	if outcome.is_not_found() {
		bail!(ErrorKind::NotFound(format!("Nothing to delete, {}", outcome)));
	}

	println!("{}", outcome);
	Ok(())
}

fn do_get(matches: &ArgMatches) -> Result<()> {
	let site = read_name(matches, "SITE", "site")?;
	let account = read_name(matches, "ACCOUNT", "account")?;

	let (store, _lock) = open_store(matches)?;
	match store.get_password(site, account)? {
		Some(password) => {
			println!("{}", password.as_str());
			Ok(())
		},
		None => Err(ErrorKind::NotFound(format!("No password saved for {} in {}", account, site)).into()),
	}
}

fn do_list(matches: &ArgMatches) -> Result<()> {
	let (store, _lock) = open_store(matches)?;
	let entries = store.list_accounts()?.collect::<credstore::Result<Vec<_>>>()?;
	let show = matches.is_present("SHOW");

	let stdout = io::stdout();
	let mut out = stdout.lock();
	for (site, accounts) in &entries.iter().group_by(|&entry| entry.site.as_str()) {
		writeln!(out, "{}", site)?;
		for entry in accounts {
			if show {
				writeln!(out, "  {}: {}", entry.account, entry.password.as_str())?;
			} else {
				writeln!(out, "  {}", entry.account)?;
			}
		}
	}

	Ok(())
}

fn do_strength() -> Result<()> {
	let password = read_secret("Password (it is forgotten right after the test): ")?;
	let rating = strength::rate(&password);
	debug!("Estimated entropy: {:.1} bits", strength::entropy(&password));
	println!("Your password is {}.", rating);
	Ok(())
}

fn do_generate(matches: &ArgMatches) -> Result<()> {
	let length = matches.value_of("LENGTH").unwrap_or("");
	let password = generate_password(length, matches.value_of("EXCLUDE").unwrap_or(""))?;
	println!("{}", password.as_str());
	Ok(())
}

fn site_arg<'a, 'b>() -> Arg<'a, 'b> {
	Arg::with_name("SITE")
		.short("s")
		.long("site")
		.takes_value(true)
		.required(true)
}

fn account_arg<'a, 'b>() -> Arg<'a, 'b> {
	Arg::with_name("ACCOUNT")
		.short("a")
		.long("account")
		.takes_value(true)
		.required(true)
}

fn exclude_arg<'a, 'b>() -> Arg<'a, 'b> {
	Arg::with_name("EXCLUDE")
		.short("x")
		.long("exclude")
		.help("Characters the generated password must not contain, like s.,5;~A")
		.takes_value(true)
}

fn main() {
	let matches =
		App::new("credstore")
			.version("0.1.0")
			.about("Keeps site credentials in a local flat file")
			.setting(AppSettings::SubcommandRequiredElseHelp)
			.arg(Arg::with_name("STORE")
				.long("store")
				.env("CREDSTORE_PATH")
				.default_value(DEFAULT_STORE)
				.global(true)
				.takes_value(true))
			.arg(Arg::with_name("COMMIT")
				.long("commit")
				.help("How the rewritten store replaces the old one")
				.possible_values(&["replace", "remove-rename"])
				.default_value("replace")
				.global(true)
				.takes_value(true))
			.arg(Arg::with_name("SYNC")
				.long("sync")
				.help("Flush the store to disk before returning")
				.global(true))
			.arg(Arg::with_name("VERBOSE")
				.short("v")
				.long("verbose")
				.global(true))
			.subcommand(SubCommand::with_name("save")
				.about("Save or update the password of an account")
				.arg(site_arg())
				.arg(account_arg())
				.arg(Arg::with_name("PASSWORD")
					.short("p")
					.long("password")
					.takes_value(true)
					.conflicts_with("GENERATE"))
				.arg(Arg::with_name("GENERATE")
					.short("g")
					.long("generate")
					.help("Save a generated password of given length")
					.takes_value(true))
				.arg(exclude_arg()
					.requires("GENERATE")))
			.subcommand(SubCommand::with_name("delete")
				.about("Delete an account, and its site with the last account")
				.arg(site_arg())
				.arg(account_arg()))
			.subcommand(SubCommand::with_name("get")
				.about("Print the password of an account")
				.arg(site_arg())
				.arg(account_arg()))
			.subcommand(SubCommand::with_name("list")
				.about("List every stored account")
				.arg(Arg::with_name("SHOW")
					.long("show-passwords")))
			.subcommand(SubCommand::with_name("strength")
				.about("Estimate the strength of a password read from stdin"))
			.subcommand(SubCommand::with_name("generate")
				.about("Generate a random password")
				.arg(Arg::with_name("LENGTH")
					.short("l")
					.long("length")
					.takes_value(true)
					.required(true))
				.arg(exclude_arg()))
			.subcommand(SubCommand::with_name("tips")
				.about("Advice on making your own strong password"))
			.get_matches();

	init_logging(is_verbose(&matches));

	let result = match matches.subcommand() {
		("save", Some(sub_m)) => do_save(sub_m),
		("delete", Some(sub_m)) => do_delete(sub_m),
		("get", Some(sub_m)) => do_get(sub_m),
		("list", Some(sub_m)) => do_list(sub_m),
		("strength", Some(_)) => do_strength(),
		("generate", Some(sub_m)) => do_generate(sub_m),
		("tips", Some(_)) => {
			println!("{}", TIPS);
			Ok(())
		},
		_ => Ok(()),
	};

	if let Err(err) = result {
		eprint!("{}", err.display_chain());
		process::exit(1);
	}
}
