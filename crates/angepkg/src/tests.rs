#![cfg(test)]
// This is meant to mirror as closely as possible, how users should use the crate

use std::{
	collections::HashSet,
	fs,
	io::{Cursor, Read, Seek, SeekFrom},
};

use rand::{rngs::OsRng, RngCore};

use crate::crypto::{self, Cipher};
use crate::manifest::{self as codec, Manifest};
use crate::prelude::*;

const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const OTHER_KEY_HEX: &str = "ff0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

fn random_bytes(len: usize) -> Vec<u8> {
	let mut data = vec![0u8; len];
	OsRng.fill_bytes(&mut data);
	data
}

fn build<R: Read + Send>(leaves: &mut [Leaf<R>], config: &BuilderConfig) -> InternalResult<Vec<u8>> {
	let mut target = Cursor::new(Vec::new());
	let written = dump(&mut target, leaves, config, None)?;

	let bytes = target.into_inner();
	assert_eq!(written, bytes.len() as u64);

	Ok(bytes)
}

fn key() -> ArchiveKey {
	ArchiveKey::from_hex(KEY_HEX).unwrap()
}

#[test]
fn flag_restricted_access() {
	let mut flag = Flags::from_bits(0);

	// This should return an error
	if let Err(error) = flag.set(0b0000_0100, true) {
		assert!(matches!(error, InternalError::RestrictedFlagAccess));
	} else {
		panic!("Access to restricted flags has been allowed, this should not be feasible")
	};

	assert_eq!(flag.set(Flags::MANIFEST_COMPRESSED, true).unwrap(), Flags::MANIFEST_COMPRESSED);
}

#[test]
fn flags_set_intersects() {
	let mut flag = Flags::new();

	flag.force_set(Flags::MANIFEST_COMPRESSED, true);
	assert_eq!(flag.bits(), Flags::MANIFEST_COMPRESSED);

	flag.force_set(Flags::MANIFEST_COMPRESSED, true);
	assert_eq!(flag.bits(), Flags::MANIFEST_COMPRESSED);

	flag.force_set(Flags::MANIFEST_ENCRYPTED, true);
	assert_eq!(flag.bits(), Flags::MANIFEST_COMPRESSED | Flags::MANIFEST_ENCRYPTED);

	flag.force_set(Flags::MANIFEST_COMPRESSED, false);
	assert_eq!(flag.bits(), Flags::MANIFEST_ENCRYPTED);

	assert_eq!(format!("{}", flag), "Flags[-E]");
	assert!(!flag.has_reserved());
}

#[test]
fn key_parsing() -> InternalResult {
	let key = ArchiveKey::from_hex(KEY_HEX)?;
	assert_eq!(key.bits(), 256);
	assert_eq!(key.to_hex(), KEY_HEX);

	let prefixed = ArchiveKey::from_hex(&format!("0x{}", KEY_HEX))?;
	assert_eq!(prefixed, key);

	// 31 digits are left-padded to 16 bytes
	let odd = ArchiveKey::from_hex(&"f".repeat(31))?;
	assert_eq!(odd.as_bytes()[0], 0x0f);
	assert_eq!(odd.bits(), 128);

	assert_eq!(ArchiveKey::from_hex(&"ab".repeat(24))?.bits(), 192);

	assert!(matches!(ArchiveKey::from_hex("zz"), Err(InternalError::KeyParse(_))));
	assert!(matches!(ArchiveKey::from_hex("0011223344556677"), Err(InternalError::InvalidKey(8))));
	assert!(matches!(ArchiveKey::generate(100), Err(InternalError::InvalidKey(_))));

	// Keys never show up in debug output
	assert!(!format!("{:?}", key).contains(KEY_HEX));

	Ok(())
}

#[test]
fn cipher_framings() -> InternalResult {
	let cipher = ArchiveKey::generate(192)?.cipher();
	let nonce = crypto::random_nonce();
	let plaintext = b"Fast-Acting Long-Lasting, *Bathroom Reader*";

	// Detached, with associated data
	let (ciphertext, tag) = cipher.encrypt(&nonce, plaintext, Some(b"aad".as_slice()))?;
	assert_eq!(ciphertext.len(), plaintext.len());
	assert_eq!(cipher.decrypt(&nonce, &ciphertext, &tag, Some(b"aad".as_slice()))?, plaintext);
	assert!(matches!(
		cipher.decrypt(&nonce, &ciphertext, &tag, Some(b"other".as_slice())),
		Err(InternalError::AuthenticationFailure)
	));

	// Appended
	let sealed = cipher.seal_appended(&nonce, plaintext)?;
	assert_eq!(sealed.len(), plaintext.len() + crate::TAG_LENGTH);
	assert_eq!(&sealed[..plaintext.len()], ciphertext.as_slice());
	assert_eq!(cipher.open_appended(&nonce, &sealed)?, plaintext);
	assert!(matches!(cipher.open_appended(&nonce, &sealed[..10]), Err(InternalError::TruncatedData)));

	assert!(matches!(Cipher::new(&[0u8; 20]), Err(InternalError::InvalidKey(20))));

	Ok(())
}

#[test]
fn manifest_wire_names() -> InternalResult {
	let entry = ManifestEntry {
		path: "text/hello.txt".to_string(),
		offset: 40,
		length: 5,
		..ManifestEntry::default()
	};

	let manifest = Manifest { files: vec![entry], created: 7 };
	let encoded = codec::encode(&manifest, false, None)?;

	let text = String::from_utf8(encoded).unwrap();
	assert_eq!(
		text,
		r#"{"Files":[{"Path":"text/hello.txt","Offset":40,"Length":5,"Compressed":false,"Encrypted":false,"Nonce":null,"Tag":null}],"Created":7}"#
	);

	let decoded = codec::decode(text.as_bytes(), false, false, None, None)?;
	assert_eq!(decoded, manifest);

	Ok(())
}

#[test]
fn manifest_padding_is_exact() -> InternalResult {
	let key = key();
	let cipher = key.cipher();
	let nonce = crypto::random_nonce();

	let entry = ManifestEntry {
		path: "audio/ftstep.raw".to_string(),
		offset: 1024,
		length: 9,
		encrypted: true,
		nonce: Some([1u8; 12]),
		tag: Some([2u8; 16]),
		..ManifestEntry::default()
	};
	let manifest = Manifest::new(vec![entry]);

	for (compress, seal) in [(false, None), (true, None), (false, Some((&cipher, &nonce))), (true, Some((&cipher, &nonce)))] {
		let natural = codec::encode(&manifest, compress, seal)?;

		for pad in [1usize, 2, 7, 64] {
			let padded = codec::encode_padded(&manifest, compress, seal, pad)?;
			assert_eq!(padded.len(), natural.len() + pad);

			let decoded = codec::decode(&padded, compress, seal.is_some(), Some(&cipher), Some(&nonce))?;
			assert_eq!(decoded, manifest);
		}
	}

	Ok(())
}

#[test]
fn manifest_decode_errors() -> InternalResult {
	let cipher = key().cipher();
	let nonce = crypto::random_nonce();

	assert!(matches!(
		codec::decode(b"[1, 2", false, false, None, None),
		Err(InternalError::CorruptManifest(_))
	));
	assert!(matches!(
		codec::decode(b"not gzip at all", true, false, None, None),
		Err(InternalError::CorruptManifest(_))
	));
	assert!(matches!(
		codec::decode(&[0u8; 32], false, true, None, Some(&nonce)),
		Err(InternalError::MissingKey)
	));
	assert!(matches!(
		codec::decode(&[0u8; 15], false, true, Some(&cipher), Some(&nonce)),
		Err(InternalError::CorruptManifest(_))
	));
	assert!(matches!(
		codec::decode(&[0u8; 32], false, true, Some(&cipher), Some(&nonce)),
		Err(InternalError::AuthenticationFailure)
	));

	Ok(())
}

#[test]
fn header_layout() -> InternalResult {
	let mut leaves: [Leaf; 0] = [];
	let bytes = build(&mut leaves, &BuilderConfig::default())?;

	assert_eq!(&bytes[0..8], b"ANGEPKG\0");
	assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), crate::VERSION);
	assert_eq!(i64::from_le_bytes(bytes[12..20].try_into().unwrap()), bytes.len() as i64 - 21);
	assert_eq!(bytes[20], 0);

	let archive = Archive::new(Cursor::new(bytes))?;
	assert!(archive.entries().is_empty());
	assert_eq!(archive.header_size(), 21);

	// An encrypted manifest carries its nonce in the header
	let config = BuilderConfig::default().key(key()).encrypt(true).compress(true);
	let bytes = build(&mut leaves, &config)?;
	assert_eq!(bytes[20], Flags::MANIFEST_ENCRYPTED | Flags::MANIFEST_COMPRESSED);
	assert_eq!(i64::from_le_bytes(bytes[12..20].try_into().unwrap()), bytes.len() as i64 - 33);

	Ok(())
}

#[test]
fn round_trip_all_modes() -> InternalResult {
	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;

	let files = [
		("a.txt", b"hello".to_vec()),
		("empty.dat", Vec::new()),
		("nested/deep/b.bin", random_bytes(1024)),
		("nested/lorem.txt", b"Lorem ipsum dolor sit amet, ".repeat(200)),
	];

	for (path, data) in files.iter() {
		let path = input.path().join(path);
		fs::create_dir_all(path.parent().unwrap())?;
		fs::write(path, data)?;
	}

	let key = key();
	for (compress, encrypt) in [(false, false), (true, false), (false, true), (true, true)] {
		let config = BuilderConfig::default().key(key.clone()).compress(compress).encrypt(encrypt);
		let target = output.path().join(format!("assets-{}-{}.angpkg", compress, encrypt));

		let written = pack_directory(input.path(), &target, &config)?;
		assert_eq!(fs::metadata(&target)?.len(), written);

		let archive = Archive::open(&target, Some(&key))?;
		assert_eq!(archive.entries().len(), files.len());

		for (path, data) in files.iter() {
			let entry = archive.find_entry(path).unwrap();
			assert_eq!(entry.compressed, compress);
			assert_eq!(entry.encrypted, encrypt);
			assert_eq!(entry.nonce.is_some(), encrypt);

			assert_eq!(&archive.fetch(path)?.into_inner(), data);
		}
	}

	Ok(())
}

#[test]
fn pack_directory_missing_input() {
	let output = tempfile::tempdir().unwrap();
	let result = pack_directory(
		output.path().join("does-not-exist"),
		output.path().join("out.angpkg"),
		&BuilderConfig::default(),
	);

	match result {
		Err(InternalError::IOError(err)) => assert_eq!(err.kind(), std::io::ErrorKind::NotFound),
		other => panic!("Expected a NotFound error, got: {:?}", other),
	}

	assert!(!output.path().join("out.angpkg").exists());
}

#[test]
#[cfg(unix)]
fn packed_archive_is_world_readable() -> InternalResult {
	use std::os::unix::fs::PermissionsExt;

	let input = tempfile::tempdir()?;
	let output = tempfile::tempdir()?;
	fs::write(input.path().join("a.txt"), b"hello")?;

	let target = output.path().join("fresh.angpkg");
	pack_directory(input.path(), &target, &BuilderConfig::default())?;
	assert_eq!(fs::metadata(&target)?.permissions().mode() & 0o777, 0o644);

	// Re-packing over an existing archive keeps its mode
	fs::set_permissions(&target, fs::Permissions::from_mode(0o664))?;
	pack_directory(input.path(), &target, &BuilderConfig::default())?;
	assert_eq!(fs::metadata(&target)?.permissions().mode() & 0o777, 0o664);

	Ok(())
}

#[test]
#[cfg(unix)]
fn symlinked_files_are_packed() -> InternalResult {
	let root = tempfile::tempdir()?;
	let (input, other) = (root.path().join("input"), root.path().join("other"));
	fs::create_dir_all(&input)?;
	fs::create_dir_all(&other)?;

	fs::write(other.join("real.txt"), b"linked asset")?;
	std::os::unix::fs::symlink(other.join("real.txt"), input.join("link.txt"))?;

	let target = root.path().join("linked.angpkg");
	pack_directory(&input, &target, &BuilderConfig::default())?;

	let archive = Archive::open(&target, None)?;
	assert_eq!(archive.entries().len(), 1);
	assert_eq!(archive.fetch("link.txt")?.into_inner(), b"linked asset");

	Ok(())
}

#[test]
fn offsets_are_consistent() -> InternalResult {
	let data = (0..40).map(|i| random_bytes(i * 13)).collect::<Vec<_>>();
	let mut leaves = data
		.iter()
		.enumerate()
		.map(|(i, d)| Leaf::new(d.as_slice(), format!("data/{}.bin", i)).compress(i % 3 == 0).encrypt(i % 2 == 0))
		.collect::<Vec<_>>();

	let config = BuilderConfig::default().key(key()).compress(true);
	let bytes = build(&mut leaves, &config)?;
	let file_length = bytes.len() as u64;

	let archive = Archive::with_key(Cursor::new(bytes), Some(&key()))?;
	let entries = archive.entries();

	assert_eq!(entries[0].offset, archive.header_size() + archive.manifest_length());
	assert_eq!(entries.last().unwrap().end(), file_length);

	for pair in entries.windows(2) {
		assert_eq!(pair[0].end(), pair[1].offset);
		assert!(pair[0].offset <= pair[1].offset);
	}

	for (i, d) in data.iter().enumerate() {
		assert_eq!(&archive.fetch(format!("DATA/{}.BIN", i))?.into_inner(), d);
	}

	Ok(())
}

#[test]
fn fixed_point_across_digit_boundaries() -> InternalResult {
	// Offsets around 10^3 and 10^4 change the manifest's own length as they are assigned
	for count in [1usize, 8, 9, 10, 11, 90] {
		for length in (0..320).step_by(17) {
			let payload = vec![b'x'; length];
			let mut leaves = (0..count)
				.map(|i| Leaf::new(payload.as_slice(), format!("{:03}.txt", i)))
				.collect::<Vec<_>>();

			let bytes = build(&mut leaves, &BuilderConfig::default())?;
			let archive = Archive::new(Cursor::new(bytes))?;

			for entry in archive.entries() {
				assert_eq!(archive.open_stream(entry)?.into_inner(), payload);
			}
		}
	}

	Ok(())
}

#[test]
fn layout_grows_past_placeholder_offsets() -> InternalResult {
	// Real offsets with more digits than the placeholder make the manifest grow on the first pass
	let header_size = 200_000_000;
	let files = (0..25)
		.map(|i| ManifestEntry {
			path: format!("big/{:02}.bin", i),
			length: 1_000 + i,
			..Default::default()
		})
		.collect::<Vec<_>>();

	let mut manifest = Manifest::new(files);
	let encoded = crate::writer::layout(&mut manifest, header_size, false, None)?;

	let mut cursor = header_size + encoded.len() as u64;
	for entry in manifest.files.iter() {
		assert_eq!(entry.offset, cursor);
		cursor += entry.length;
	}

	assert_eq!(codec::decode(&encoded, false, false, None, None)?, manifest);

	Ok(())
}

#[test]
fn tamper_ciphertext() -> InternalResult {
	let data = random_bytes(512);
	let mut leaves = [Leaf::new(data.as_slice(), "secret.bin").encrypt(true)];

	let mut bytes = build(&mut leaves, &BuilderConfig::default().key(key()))?;
	let offset = Archive::new(Cursor::new(bytes.clone()))?.find_entry("secret.bin").unwrap().offset as usize;

	bytes[offset + 100] ^= 0x01;

	let archive = Archive::with_key(Cursor::new(bytes), Some(&key()))?;
	assert!(matches!(archive.fetch("secret.bin"), Err(InternalError::AuthenticationFailure)));

	Ok(())
}

#[test]
fn tamper_tag() -> InternalResult {
	let mut leaves = [Leaf::new(b"Imago".as_slice(), "imago.txt").encrypt(true).compress(true)];
	let bytes = build(&mut leaves, &BuilderConfig::default().key(key()))?;

	let archive = Archive::with_key(Cursor::new(bytes), Some(&key()))?;
	let mut entry = archive.find_entry("imago.txt").unwrap().clone();
	assert_eq!(archive.open_stream(&entry)?.into_inner(), b"Imago");

	if let Some(tag) = entry.tag.as_mut() {
		tag[3] ^= 0x80;
	}

	assert!(matches!(archive.open_stream(&entry), Err(InternalError::AuthenticationFailure)));

	Ok(())
}

#[test]
fn tamper_compressed_payload() -> InternalResult {
	let data = b"Around The World, Fatter wetter stronker. ".repeat(64);
	let mut leaves = [Leaf::new(data.as_slice(), "song.txt").compress(true)];

	let mut bytes = build(&mut leaves, &BuilderConfig::default())?;
	let entry = Archive::new(Cursor::new(bytes.clone()))?.find_entry("song.txt").unwrap().clone();

	// Inside the deflate stream, clear of the gzip header and trailer
	bytes[(entry.offset + entry.length / 2) as usize] ^= 0xFF;

	let archive = Archive::new(Cursor::new(bytes))?;
	match archive.fetch("song.txt") {
		Err(InternalError::CorruptEntry { path, .. }) => assert_eq!(path, "song.txt"),
		Err(other) => panic!("Expected CorruptEntry, got: {}", other),
		Ok(_) => panic!("A corrupt payload was decoded silently"),
	}

	Ok(())
}

#[test]
fn nonces_never_repeat() -> InternalResult {
	const COUNT: usize = 10_000;
	const PAYLOAD: &[u8] = b"identical payload";

	let key = key();
	let config = BuilderConfig::default().key(key.clone()).encrypt(true);

	// Two packs of identical leaves under one key
	let packs = (0..2)
		.map(|_| {
			let mut leaves = (0..COUNT)
				.map(|i| Leaf::new(PAYLOAD, format!("n/{}", i)))
				.collect::<Vec<_>>();

			build(&mut leaves, &config)
		})
		.collect::<InternalResult<Vec<_>>>()?;

	let mut seen = HashSet::with_capacity(2 * (COUNT + 1));
	let mut archives = Vec::new();

	for bytes in packs.iter() {
		let manifest_nonce: [u8; 12] = bytes[21..33].try_into().unwrap();
		assert!(seen.insert(manifest_nonce), "Manifest nonce reused");

		let archive = Archive::with_key(Cursor::new(bytes.as_slice()), Some(&key))?;
		for entry in archive.entries() {
			assert!(seen.insert(entry.nonce.unwrap()), "Nonce reused for {}", entry.path);
		}

		archives.push(archive);
	}

	assert_eq!(seen.len(), 2 * (COUNT + 1));

	// Same plaintext, same path, same key: the stored ciphertexts still differ
	let (first, second) = (&archives[0], &archives[1]);
	for entry in first.entries() {
		let other = second.find_entry(&entry.path).unwrap();
		let a = &packs[0][entry.offset as usize..entry.end() as usize];
		let b = &packs[1][other.offset as usize..other.end() as usize];

		assert_ne!(a, b, "Identical ciphertext for {}", entry.path);
		assert_eq!(first.fetch(&entry.path)?.into_inner(), PAYLOAD);
	}

	Ok(())
}

#[test]
fn case_insensitive_lookup() -> InternalResult {
	let mut leaves = [Leaf::new(b"Hello, Cassandra!".as_slice(), "Text\\Hello.txt")];
	let bytes = build(&mut leaves, &BuilderConfig::default())?;

	let archive = Archive::new(Cursor::new(bytes))?;
	assert_eq!(archive.entries()[0].path, "Text/Hello.txt");

	for path in ["Text/Hello.TXT", "text/hello.txt", "text\\hello.txt"] {
		assert_eq!(archive.find_entry(path).unwrap().path, "Text/Hello.txt");
	}

	assert!(archive.find_entry("text/hello").is_none());
	assert!(matches!(archive.fetch("text/missing.txt"), Err(InternalError::EntryNotFound(_))));

	Ok(())
}

#[test]
fn duplicate_paths_are_rejected() {
	let mut leaves = [
		Leaf::new(b"one".as_slice(), "Data/A.txt"),
		Leaf::new(b"two".as_slice(), "b.txt"),
		Leaf::new(b"three".as_slice(), "data\\a.TXT"),
	];

	let mut target = Cursor::new(Vec::new());
	let result = dump(&mut target, &mut leaves, &BuilderConfig::default(), None);

	assert!(matches!(result, Err(InternalError::DuplicateEntryPath(_))));
}

#[test]
fn encrypt_without_key() {
	let mut target = Cursor::new(Vec::new());

	let mut leaves = [Leaf::new(b"data".as_slice(), "a").encrypt(true)];
	let result = dump(&mut target, &mut leaves, &BuilderConfig::default(), None);
	assert!(matches!(result, Err(InternalError::MissingKey)));

	let mut leaves = [Leaf::new(b"data".as_slice(), "a")];
	let result = dump(&mut target, &mut leaves, &BuilderConfig::default().encrypt(true), None);
	assert!(matches!(result, Err(InternalError::MissingKey)));
}

// a.txt = "hello", b.bin = 1024 random bytes, everything compressed and encrypted under a 256 bit key
#[test]
fn compressed_encrypted_scenario() -> InternalResult {
	let random = random_bytes(1024);
	let mut leaves = [
		Leaf::new(b"hello".as_slice(), "a.txt"),
		Leaf::new(random.as_slice(), "b.bin"),
	];

	let key = key();
	let config = BuilderConfig::default().key(key.clone()).compress(true).encrypt(true);
	let bytes = build(&mut leaves, &config)?;

	let archive = Archive::with_key(Cursor::new(bytes.clone()), Some(&key))?;
	assert!(archive.flags().contains(Flags::MANIFEST_ENCRYPTED | Flags::MANIFEST_COMPRESSED));
	assert_eq!(archive.fetch("a.txt")?.into_inner(), b"hello");
	assert_eq!(archive.fetch("b.bin")?.into_inner(), random);

	let wrong = ArchiveKey::from_hex(OTHER_KEY_HEX)?;
	assert!(matches!(
		Archive::with_key(Cursor::new(bytes.clone()), Some(&wrong)),
		Err(InternalError::AuthenticationFailure)
	));
	assert!(matches!(Archive::new(Cursor::new(bytes)), Err(InternalError::MissingKey)));

	Ok(())
}

#[test]
fn entries_without_manifest_encryption_need_key_on_fetch() -> InternalResult {
	let mut leaves = [Leaf::new(b"hello".as_slice(), "a.txt").encrypt(true)];
	let bytes = build(&mut leaves, &BuilderConfig::default().key(key()))?;

	// The manifest is readable, the entry isn't
	let archive = Archive::new(Cursor::new(bytes))?;
	assert!(archive.find_entry("a.txt").unwrap().encrypted);
	assert!(matches!(archive.fetch("a.txt"), Err(InternalError::MissingKey)));

	Ok(())
}

#[test]
fn plain_payloads_are_verbatim() -> InternalResult {
	let random = random_bytes(1024);
	let mut leaves = [
		Leaf::new(b"hello".as_slice(), "a.txt"),
		Leaf::new(random.as_slice(), "b.bin"),
	];

	let bytes = build(&mut leaves, &BuilderConfig::default())?;
	let archive = Archive::new(Cursor::new(bytes.clone()))?;

	for (path, data) in [("a.txt", b"hello".as_slice()), ("b.bin", random.as_slice())] {
		let entry = archive.find_entry(path).unwrap();
		assert!(!entry.compressed && !entry.encrypted);
		assert!(entry.nonce.is_none() && entry.tag.is_none());
		assert_eq!(&bytes[entry.offset as usize..entry.end() as usize], data);
	}

	Ok(())
}

#[test]
fn tampered_manifest() -> InternalResult {
	let lorem = b"Lorem ipsum dolor sit amet".repeat(8);
	let make_leaves = || {
		(0..20)
			.map(|i| Leaf::new(lorem.as_slice(), format!("lorem/{}.txt", i)))
			.collect::<Vec<_>>()
	};

	// Compressed manifest
	let mut bytes = build(&mut make_leaves(), &BuilderConfig::default().compress(true))?;
	let length = i64::from_le_bytes(bytes[12..20].try_into().unwrap()) as usize;

	// First byte of the gzip trailer's checksum
	bytes[21 + length - 8] ^= 0xFF;

	assert!(matches!(Archive::new(Cursor::new(bytes)), Err(InternalError::CorruptManifest(_))));

	// Encrypted manifest
	let config = BuilderConfig::default().key(key()).encrypt(true);
	let mut bytes = build(&mut make_leaves(), &config)?;
	let length = i64::from_le_bytes(bytes[12..20].try_into().unwrap()) as usize;
	bytes[33 + length / 2] ^= 0x01;

	assert!(matches!(
		Archive::with_key(Cursor::new(bytes), Some(&key())),
		Err(InternalError::AuthenticationFailure)
	));

	Ok(())
}

#[test]
fn malformed_sources() -> InternalResult {
	let mut leaves = [Leaf::new(b"payload bytes".as_slice(), "p.bin")];
	let bytes = build(&mut leaves, &BuilderConfig::default())?;

	let mut bad_magic = bytes.clone();
	bad_magic[0] = b'V';
	assert!(matches!(
		Archive::new(Cursor::new(bad_magic)),
		Err(InternalError::MalformedArchiveSource(_))
	));

	// A foreign file shorter than a header is still rejected on its magic
	assert!(matches!(
		Archive::new(Cursor::new(b"PK\x03\x04garbage".to_vec())),
		Err(InternalError::MalformedArchiveSource(m)) if &m == b"PK\x03\x04garb"
	));

	let mut bad_version = bytes.clone();
	bad_version[8..12].copy_from_slice(&2u32.to_le_bytes());
	assert!(matches!(
		Archive::new(Cursor::new(bad_version)),
		Err(InternalError::IncompatibleArchiveVersion(2))
	));

	let mut reserved = bytes.clone();
	reserved[20] |= 0b1000_0000;
	assert!(matches!(
		Archive::new(Cursor::new(reserved)),
		Err(InternalError::RestrictedFlagAccess)
	));

	let mut negative = bytes.clone();
	negative[12..20].copy_from_slice(&(-5i64).to_le_bytes());
	assert!(matches!(
		Archive::new(Cursor::new(negative)),
		Err(InternalError::InvalidManifestLength(-5))
	));

	// Cut inside the header, inside the manifest and inside the payload
	for cut in [10, 30, bytes.len() - 3] {
		assert!(matches!(
			Archive::new(Cursor::new(bytes[..cut].to_vec())),
			Err(InternalError::TruncatedData)
		));
	}

	let mut trailing = bytes;
	trailing.extend_from_slice(b"junk");
	assert!(matches!(
		Archive::new(Cursor::new(trailing)),
		Err(InternalError::CorruptManifest(_))
	));

	Ok(())
}

#[test]
fn resource_is_seekable() -> InternalResult {
	let mut leaves = [Leaf::new(b"0123456789".as_slice(), "digits.txt").compress(true)];
	let bytes = build(&mut leaves, &BuilderConfig::default())?;

	let mut archive = Archive::new(Cursor::new(bytes))?;
	let mut resource = archive.fetch_mut("DIGITS.txt")?;
	assert_eq!(resource.len(), 10);
	assert_eq!(resource.path(), "digits.txt");

	resource.seek(SeekFrom::Start(4))?;
	let mut tail = String::new();
	resource.read_to_string(&mut tail)?;
	assert_eq!(tail, "456789");

	resource.seek(SeekFrom::End(-2))?;
	let mut last = [0u8; 2];
	resource.read_exact(&mut last)?;
	assert_eq!(&last, b"89");

	// The handle comes back untouched
	let handle = archive.into_inner();
	assert!(!handle.into_inner().is_empty());

	Ok(())
}

#[test]
fn extract_to_disk() -> InternalResult {
	let output = tempfile::tempdir()?;
	let data = random_bytes(3000);

	let mut leaves = [Leaf::new(data.as_slice(), "audio/sfx/step.raw").compress(true)];
	let bytes = build(&mut leaves, &BuilderConfig::default())?;

	let archive = Archive::new(Cursor::new(bytes))?;
	let target = output.path().join("out/audio/sfx/step.raw");

	let written = archive.extract_to("AUDIO/SFX/STEP.RAW", &target)?;
	assert_eq!(written, data.len() as u64);
	assert_eq!(fs::read(&target)?, data);

	Ok(())
}

#[test]
fn progress_callback_sees_every_entry() -> InternalResult {
	let mut leaves = [
		Leaf::new(b"a".as_slice(), "c.txt"),
		Leaf::new(b"bb".as_slice(), "a.txt"),
		Leaf::new(b"ccc".as_slice(), "B.txt"),
	];

	let mut seen = Vec::new();
	let mut callback = |entry: &ManifestEntry, data: &[u8]| {
		assert_eq!(entry.length, data.len() as u64);
		seen.push(entry.path.clone());
	};

	let mut target = Cursor::new(Vec::new());
	dump(&mut target, &mut leaves, &BuilderConfig::default(), Some(&mut callback))?;

	assert_eq!(seen, ["a.txt", "B.txt", "c.txt"]);

	Ok(())
}

#[test]
#[cfg(feature = "multithreaded")]
fn test_batch_fetching() -> InternalResult {
	use std::{collections::HashMap, num::NonZeroUsize};
	use rayon::prelude::*;

	// Define input constants
	const INPUT_LEN: usize = 8;
	const INPUT: [u8; INPUT_LEN] = [69u8; INPUT_LEN];

	// Define and queue data
	let mut paths = (0..120).map(|i| format!("ID {}", i)).collect::<Vec<_>>();
	let mut leaves = paths
		.iter()
		.map(|i| Leaf::new(&INPUT[..], i).compress(true).encrypt(true))
		.collect::<Vec<_>>();

	paths.push("ERRORS".to_string());

	// Process data
	let key = key();
	let config = BuilderConfig::default()
		.key(key.clone())
		.threads(NonZeroUsize::new(2).unwrap());
	let bytes = build(&mut leaves, &config)?;

	let archive = Archive::with_key(Cursor::new(bytes), Some(&key))?;
	let mut resources = paths
		.as_slice()
		.par_iter()
		.map(|path| (path.as_str(), archive.fetch(path)))
		.collect::<HashMap<_, _>>();

	// Tests and checks
	assert!(resources.get("NON_EXISTENT").is_none());

	match resources.remove("ERRORS").unwrap() {
		Ok(_) => return Err(InternalError::OtherError("This should be an error".into())),
		Err(InternalError::EntryNotFound(_)) => (),
		Err(specific) => return Err(specific),
	};

	for (_, res) in resources {
		assert_eq!(res?.as_slice(), &INPUT[..]);
	}

	Ok(())
}
