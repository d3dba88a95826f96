use std::collections::HashMap;
use clap::{Command, Arg};

use crate::keys::key_names;
use crate::commands;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

pub fn build_app<'a>(key_map: HashMap<&'static str, Arg<'a>>) -> Command<'a> {
	Command::new("angepkg")
		.author(self::AUTHORS)
		.about("A command-line interface for packing and reading .angpkg archives")
		.version(self::VERSION)
		.arg_required_else_help(true)
		.subcommand(
			Command::new("pack")
				.author(AUTHORS)
				.version(commands::pack::VERSION)
				.about("Packs every file under a directory into an archive")
				// Files
				.arg(key_map.get(key_names::INPUT).unwrap())
				.arg(key_map.get(key_names::DESTINATION).unwrap())
				// Encryption
				.arg(key_map.get(key_names::KEY).unwrap())
				// Modifiers
				.arg(key_map.get(key_names::COMPRESS).unwrap())
				.arg(key_map.get(key_names::ENCRYPT).unwrap())
				.arg(key_map.get(key_names::JOBS).unwrap()),
		)
		.subcommand(
			Command::new("list")
				.author(AUTHORS)
				.version(commands::list::VERSION)
				.about("Lists all the entries in an archive and their metadata")
				.arg(key_map.get(key_names::INPUT).unwrap())
				.arg(key_map.get(key_names::KEY).unwrap())
				.arg(key_map.get(key_names::SORT).unwrap()),
		)
		.subcommand(
			Command::new("unpack")
				.author(AUTHORS)
				.version(commands::unpack::VERSION)
				.about("Unpacks an archive")
				.arg(key_map.get(key_names::INPUT).unwrap())
				.arg(key_map.get(key_names::OUTPUT).unwrap())
				.arg(key_map.get(key_names::KEY).unwrap())
				.arg(key_map.get(key_names::JOBS).unwrap()),
		)
		.subcommand(
			Command::new("pipe")
				.author(AUTHORS)
				.version(commands::pipe::VERSION)
				.about("Pipes a decoded entry from an archive to stdout")
				.arg(key_map.get(key_names::INPUT).unwrap())
				.arg(key_map.get(key_names::RESOURCE).unwrap())
				.arg(key_map.get(key_names::KEY).unwrap()),
		)
		.subcommand(
			Command::new("verify")
				.author(AUTHORS)
				.version(commands::verify::VERSION)
				.about("Verifies the validity of an archive, decoding every entry")
				.arg(key_map.get(key_names::INPUT).unwrap())
				.arg(key_map.get(key_names::KEY).unwrap()),
		)
		.subcommand(
			Command::new("keygen")
				.author(AUTHORS)
				.version(commands::keygen::VERSION)
				.about("Generates a random AES key and prints it as hex")
				.arg(key_map.get(key_names::BITS).unwrap()),
		)
}
