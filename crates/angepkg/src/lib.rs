#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::manual_map)]
#![deny(missing_docs)]

/*!
A single-file asset archive, in Pure Rust.

An `.angpkg` file is a header, a self-describing manifest and the concatenated entry payloads.
Each entry may be gzip compressed and then sealed with AES-GCM; the manifest itself may be
compressed and sealed too. The key never lives in the archive.

### 🔫 Cargo Features
- `archive`: Enables the Archive loader.
- `builder`: Enables the Archive builder and [`pack_directory`](builder::pack_directory).
- `multithreaded`: [`dump`](builder::dump) processes leaves in parallel using `rayon`.
- `default`: Enables the `archive` and `builder` features.
- `all`: Enables all the above features.

### 🀄 Show me some code _dang it!_

```
use std::io::{Cursor, Read};
use angepkg::prelude::*;

let key = ArchiveKey::from_hex("000102030405060708090a0b0c0d0e0f").unwrap();

let mut leaves = [
	Leaf::new(b"Hello, Cassandra!".as_slice(), "text/hello.txt").compress(true).encrypt(true),
	Leaf::new([12, 23, 34, 45, 56, 67, 78, 90, 69].as_slice(), "audio/ftstep.raw"),
];

let mut target = Cursor::new(Vec::new());

let config = BuilderConfig::default().key(key.clone());
dump(&mut target, &mut leaves, &config, None).unwrap();

// roundtrip
let archive = Archive::with_key(target, Some(&key)).unwrap();
let mut resource = archive.fetch("Text/Hello.TXT").unwrap();

let mut text = String::new();
resource.read_to_string(&mut text).unwrap();
assert_eq!(text, "Hello, Cassandra!");
```
*/

/// All tests are included in this module.
mod tests;

pub(crate) mod global;

#[cfg(feature = "archive")]
#[cfg_attr(docsrs, doc(cfg(feature = "archive")))]
pub(crate) mod loader;

#[cfg(feature = "builder")]
#[cfg_attr(docsrs, doc(cfg(feature = "builder")))]
pub(crate) mod writer;

/// Current [`angepkg`](crate) format revision, written into every header
pub const VERSION: u32 = 1;

/// Magic Sequence used by `angepkg`: "ANGEPKG\0"
pub const MAGIC: [u8; crate::MAGIC_LENGTH] = *b"ANGEPKG\0";
pub(crate) const MAGIC_LENGTH: usize = 8;

/// Size of every AES-GCM nonce, for entries and the manifest alike
pub const NONCE_LENGTH: usize = 12;

/// Size of every AES-GCM authentication tag
pub const TAG_LENGTH: usize = 16;

/// Accepted key sizes: AES-128, AES-192 and AES-256
pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Consolidated crate imports.
pub mod prelude {
	pub use crate::global::{error::*, flags::Flags, manifest::ManifestEntry};
	pub use crate::crypto::{ArchiveKey, Cipher};

	#[cfg(feature = "archive")]
	pub use crate::archive::*;

	#[cfg(feature = "builder")]
	pub use crate::builder::*;
}

/// The AEAD primitive, keys and the two sealing framings used by the format
pub mod crypto;

/// Archive Creation logic and data structures, [`dump`](crate::builder::dump), [`Leaf`](crate::builder::Leaf) and [`BuilderConfig`](crate::builder::BuilderConfig)
#[cfg(feature = "builder")]
#[cfg_attr(docsrs, doc(cfg(feature = "builder")))]
pub mod builder {
	pub use crate::writer::*;
	pub use crate::global::{error::*, flags::Flags};
}

/// Archive Reading logic and data-structures, [`Archive`](crate::archive::Archive), [`Resource`](crate::archive::Resource)
#[cfg(feature = "archive")]
#[cfg_attr(docsrs, doc(cfg(feature = "archive")))]
pub mod archive {
	pub use crate::loader::{archive::Archive, resource::Resource};
	pub use crate::global::{manifest::ManifestEntry, error::*, flags::Flags};
}

/// Manifest encoding, exposed for tooling that inspects archives without the loader
pub mod manifest {
	pub use crate::global::manifest::{Manifest, ManifestEntry, decode, encode, encode_padded};
}
