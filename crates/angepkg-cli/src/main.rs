mod app;
mod commands;
mod keys;


use std::{env, ffi::OsString, process};

use clap::ErrorKind;
use log::error;

fn main() {
	if env::var("RUST_LOG").is_err() {
		// log level not explicitly set by the user
		env::set_var("RUST_LOG", "info");
	}
	pretty_env_logger::init();

	process::exit(run(env::args_os()));
}

/// Parses `args`, runs the selected subcommand and returns the process exit code
pub(crate) fn run<I, T>(args: I) -> i32
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
{
	let key_map = keys::build_keys();
	let app = app::build_app(key_map);
	let commands = commands::build_commands();

	let matches = match app.try_get_matches_from(args) {
		Ok(matches) => matches,
		Err(err) => {
			// Help and version go to stdout, everything else is a usage error
			if let Err(io_err) = err.print() {
				error!("Unable to print usage: {}", io_err);
			}

			return match err.kind() {
				ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
				_ => 1,
			};
		},
	};

	let (name, args) = match matches.subcommand() {
		Some(subcommand) => subcommand,
		None => {
			error!("No subcommand given, see: angepkg --help");
			return 1;
		},
	};

	let result = match commands.get(name) {
		Some(command) => command.evaluate(args),
		None => {
			error!("Unknown subcommand: {}", name);
			return 1;
		},
	};

	match result {
		Ok(()) => 0,
		Err(err) => {
			error!("{}", err);
			commands::exit_code(name, &err)
		},
	}
}
