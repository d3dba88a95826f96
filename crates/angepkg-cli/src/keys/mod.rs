use clap::Arg;
use std::collections::HashMap;

pub mod key_names {
	pub(crate) const JOBS: &str = "JOBS";

	pub(crate) const INPUT: &str = "INPUT";
	pub(crate) const DESTINATION: &str = "DESTINATION";
	pub(crate) const OUTPUT: &str = "OUTPUT";
	pub(crate) const RESOURCE: &str = "RESOURCE";

	pub(crate) const KEY: &str = "KEY";
	pub(crate) const COMPRESS: &str = "COMPRESS";
	pub(crate) const ENCRYPT: &str = "ENCRYPT";
	pub(crate) const BITS: &str = "BITS";

	pub(crate) const SORT: &str = "SORT";
}

pub fn build_keys<'a>() -> HashMap<&'static str, Arg<'a>> {
	/* please only use this function once during the lifecycle of the program */
	let mut map = HashMap::with_capacity(10);

	/* The various keys usable in the CLI */
	// Number of threads to spawn during processing
	map.insert(
		key_names::JOBS,
		Arg::new(key_names::JOBS)
			.short('j')
			.long("jobs")
			.value_name(key_names::JOBS)
			.help("How many threads to spawn during archive processing, defaults to number of threads on system")
			.required(false)
			.takes_value(true)
			.number_of_values(1),
	);

	// The primary source: a directory when packing, an archive otherwise
	map.insert(
		key_names::INPUT,
		Arg::new(key_names::INPUT)
			.value_name(key_names::INPUT)
			.help("The input source, a directory to pack or an archive to read")
			.required(true)
			.index(1),
	);

	// Where pack writes the archive
	map.insert(
		key_names::DESTINATION,
		Arg::new(key_names::DESTINATION)
			.value_name("OUTPUT_FILE")
			.help("The archive file to write, replaced only once packing succeeds")
			.required(true)
			.index(2),
	);

	// A general output target
	map.insert(
		key_names::OUTPUT,
		Arg::new(key_names::OUTPUT)
			.short('o')
			.long("output")
			.value_name(key_names::OUTPUT)
			.help("A general output target, for example a directory to extract into")
			.required(false)
			.takes_value(true)
			.number_of_values(1),
	);

	// A resource to focus on and extract
	map.insert(
		key_names::RESOURCE,
		Arg::new(key_names::RESOURCE)
			.value_name(key_names::RESOURCE)
			.help("An exact entry path to extract from the archive, compared case-insensitively")
			.required(true)
			.index(2),
	);

	// The AES key, as hex
	map.insert(
		key_names::KEY,
		Arg::new(key_names::KEY)
			.short('k')
			.long("key")
			.value_name("HEX")
			.help("The AES key as hex, 16, 24 or 32 bytes long (AES-128/192/256). A 0x prefix is allowed")
			.required(false)
			.takes_value(true)
			.number_of_values(1),
	);

	// Gzip the entries and the manifest
	map.insert(
		key_names::COMPRESS,
		Arg::new(key_names::COMPRESS)
			.short('c')
			.long("compress")
			.help("Gzip every entry and the manifest")
			.required(false)
			.takes_value(false),
	);

	// Encrypt the data, a key must be provided
	map.insert(
		key_names::ENCRYPT,
		Arg::new(key_names::ENCRYPT)
			.short('e')
			.long("encrypt")
			.help("Encrypt every entry and the manifest with AES-GCM, a key must be provided with --key")
			.required(false)
			.takes_value(false),
	);

	// Size of generated keys
	map.insert(
		key_names::BITS,
		Arg::new(key_names::BITS)
			.short('b')
			.long("bits")
			.value_name(key_names::BITS)
			.help("Size of the generated key in bits: 128, 192 or 256. Defaults to 256")
			.required(false)
			.takes_value(true)
			.number_of_values(1)
			.possible_values(["128", "192", "256"]),
	);

	// How to order the listing
	map.insert(
		key_names::SORT,
		Arg::new(key_names::SORT)
			.long("sort")
			.value_name(key_names::SORT)
			.help("How to sort entries within the table, either based on size or alphabetically")
			.required(false)
			.takes_value(true)
			.number_of_values(1),
	);

	map
}
