use std::{fmt, time::SystemTime};

use serde::{Deserialize, Serialize};

use super::{compressor::Compressor, error::*};
use crate::crypto::{Cipher, NonceBytes, TagBytes};

/// Stand-alone meta-data for an archive entry. This can be fetched without reading from the archive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestEntry {
	/// Relative, forward-slash path of the entry, unique when compared case-insensitively
	pub path: String,
	/// Absolute position of the stored bytes, from the beginning of the archive
	pub offset: u64,
	/// Number of stored bytes, after compression and encryption
	pub length: u64,
	/// The payload was gzipped before (optional) encryption
	pub compressed: bool,
	/// The payload is sealed with AES-GCM, [`nonce`](ManifestEntry::nonce) and [`tag`](ManifestEntry::tag) are then set
	pub encrypted: bool,
	/// The entry's nonce, base64 in the manifest
	#[serde(default, with = "base64_bytes")]
	pub nonce: Option<NonceBytes>,
	/// The entry's detached authentication tag, base64 in the manifest
	#[serde(default, with = "base64_bytes")]
	pub tag: Option<TagBytes>,
}

impl ManifestEntry {
	/// One past the last stored byte
	#[inline(always)]
	pub fn end(&self) -> u64 {
		self.offset + self.length
	}
}

impl fmt::Display for ManifestEntry {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(
			f,
			"[ManifestEntry] path: {}, offset: {}, length: {}, compressed: {}, encrypted: {}",
			self.path, self.offset, self.length, self.compressed, self.encrypted
		)
	}
}

/// The ordered entry list plus a creation timestamp (unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
	/// Entries, ordered by ascending offset
	pub files: Vec<ManifestEntry>,
	/// Seconds since the unix epoch at packing time
	pub created: u64,
}

impl Manifest {
	/// A manifest stamped with the current time
	pub fn new(files: Vec<ManifestEntry>) -> Manifest {
		let created = SystemTime::now()
			.duration_since(SystemTime::UNIX_EPOCH)
			.map(|d| d.as_secs())
			.unwrap_or(0);

		Manifest { files, created }
	}
}

/// Lookup key for an entry path: backslashes become slashes, then everything is lowercased
pub(crate) fn lookup_key(path: &str) -> String {
	path.replace('\\', "/").to_lowercase()
}

/// Serialize `manifest`, gzip it if `compress`, then seal it with the appended-tag framing if `seal` is given
pub fn encode(manifest: &Manifest, compress: bool, seal: Option<(&Cipher, &NonceBytes)>) -> InternalResult<Vec<u8>> {
	encode_padded(manifest, compress, seal, 0)
}

/// Same as [`encode`], but the output is exactly `pad` bytes longer and still decodes to the same [`Manifest`].
/// Uncompressed manifests carry the padding as trailing JSON whitespace, compressed ones in the gzip header comment.
pub fn encode_padded(
	manifest: &Manifest, compress: bool, seal: Option<(&Cipher, &NonceBytes)>, pad: usize,
) -> InternalResult<Vec<u8>> {
	let mut json = serde_json::to_vec(manifest).map_err(|err| InternalError::OtherError(err.into()))?;

	let plain = if compress {
		let mut buffer = Vec::with_capacity(json.len() / 2 + pad);
		Compressor::new(json.as_slice()).compress_padded(pad, &mut buffer)?;
		buffer
	} else {
		json.resize(json.len() + pad, b' ');
		json
	};

	match seal {
		Some((cipher, nonce)) => cipher.seal_appended(nonce, &plain),
		None => Ok(plain),
	}
}

/// Inverse of [`encode`]. Opens the seal (if `encrypted`), gunzips (if `compressed`) and deserializes
pub fn decode(
	bytes: &[u8], compressed: bool, encrypted: bool, cipher: Option<&Cipher>, nonce: Option<&NonceBytes>,
) -> InternalResult<Manifest> {
	let opened;
	let mut bytes = bytes;

	if encrypted {
		let cipher = cipher.ok_or(InternalError::MissingKey)?;
		let nonce = nonce.ok_or_else(|| InternalError::CorruptManifest("Encrypted manifest has no nonce".to_string()))?;

		if bytes.len() < crate::TAG_LENGTH {
			return Err(InternalError::CorruptManifest(format!(
				"Encrypted manifest is {} bytes, too short to hold an authentication tag",
				bytes.len()
			)));
		}

		opened = cipher.open_appended(nonce, bytes)?;
		bytes = opened.as_slice();
	}

	let inflated;
	if compressed {
		let mut buffer = Vec::with_capacity(bytes.len() * 2);
		Compressor::new(bytes)
			.decompress(&mut buffer)
			.map_err(|err| InternalError::CorruptManifest(format!("Unable to decompress manifest: {}", err)))?;

		inflated = buffer;
		bytes = inflated.as_slice();
	}

	serde_json::from_slice(bytes).map_err(|err| InternalError::CorruptManifest(format!("Unable to parse manifest: {}", err)))
}

/// `Option<[u8; N]>` as a standard base64 string, or `null`
mod base64_bytes {
	use base64::{engine::general_purpose::STANDARD, Engine};
	use serde::{de::Error, Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer, const N: usize>(value: &Option<[u8; N]>, serializer: S) -> Result<S::Ok, S::Error> {
		match value {
			Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(deserializer: D) -> Result<Option<[u8; N]>, D::Error> {
		let Some(text) = Option::<String>::deserialize(deserializer)? else {
			return Ok(None);
		};

		let bytes = STANDARD.decode(text.as_bytes()).map_err(D::Error::custom)?;
		let len = bytes.len();

		bytes
			.try_into()
			.map(Some)
			.map_err(|_| D::Error::custom(format!("expected {} bytes, found {}", N, len)))
	}
}
