use std::{fmt, str::FromStr};

use aes_gcm::aead::{generic_array::GenericArray, AeadInPlace, KeyInit};
use aes_gcm::aes::cipher::consts::U12;
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use rand::{rngs::OsRng, RngCore};

use crate::prelude::{InternalError, InternalResult};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// A nonce, 12 bytes, must never repeat under the same key
pub type NonceBytes = [u8; crate::NONCE_LENGTH];
/// A detached authentication tag, 16 bytes
pub type TagBytes = [u8; crate::TAG_LENGTH];

/// Draws a fresh nonce from the operating system's RNG
#[inline]
pub fn random_nonce() -> NonceBytes {
	let mut nonce = [0u8; crate::NONCE_LENGTH];
	OsRng.fill_bytes(&mut nonce);
	nonce
}

/// A symmetric archive key: 16, 24 or 32 bytes, selecting AES-128, AES-192 or AES-256.
/// Never stored in an archive; the caller supplies it out-of-band.
#[derive(Clone, PartialEq, Eq)]
pub struct ArchiveKey {
	bytes: Vec<u8>,
}

impl ArchiveKey {
	/// Wraps raw key bytes, failing with [`InvalidKey`](InternalError::InvalidKey) on any other length than 16, 24 or 32
	pub fn from_bytes(bytes: &[u8]) -> InternalResult<ArchiveKey> {
		if !crate::KEY_LENGTHS.contains(&bytes.len()) {
			return Err(InternalError::InvalidKey(bytes.len()));
		}

		Ok(ArchiveKey { bytes: bytes.to_vec() })
	}

	/// Parses a hex key. A `0x` prefix is accepted and an odd number of digits is left-padded with `0`.
	pub fn from_hex(hex: &str) -> InternalResult<ArchiveKey> {
		let hex = hex.trim();
		let hex = hex
			.strip_prefix("0x")
			.or_else(|| hex.strip_prefix("0X"))
			.unwrap_or(hex);

		if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
			return Err(InternalError::KeyParse(format!("Invalid hex digit in key: {:?}", c)));
		}

		let padded = if hex.len() % 2 != 0 {
			format!("0{}", hex)
		} else {
			hex.to_string()
		};

		let bytes = (0..padded.len())
			.step_by(2)
			.map(|i| u8::from_str_radix(&padded[i..i + 2], 16))
			.collect::<Result<Vec<u8>, _>>()
			.map_err(|err| InternalError::KeyParse(err.to_string()))?;

		ArchiveKey::from_bytes(&bytes)
	}

	/// Generates a random key of `bits` bits, (128, 192 or 256)
	pub fn generate(bits: usize) -> InternalResult<ArchiveKey> {
		let mut bytes = vec![0u8; bits / 8];
		if bits % 8 != 0 || !crate::KEY_LENGTHS.contains(&bytes.len()) {
			return Err(InternalError::InvalidKey(bits / 8));
		}

		OsRng.fill_bytes(&mut bytes);
		Ok(ArchiveKey { bytes })
	}

	/// Lowercase hex, as accepted by [`from_hex`](ArchiveKey::from_hex)
	pub fn to_hex(&self) -> String {
		const HEX: &[u8; 16] = b"0123456789abcdef";

		let mut out = String::with_capacity(self.bytes.len() * 2);
		for b in self.bytes.iter().copied() {
			out.push(HEX[(b >> 4) as usize] as char);
			out.push(HEX[(b & 0xF) as usize] as char);
		}

		out
	}

	/// The raw key bytes
	#[inline(always)]
	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Key size in bits
	#[inline(always)]
	pub fn bits(&self) -> usize {
		self.bytes.len() * 8
	}

	/// Builds the AES-GCM engine for this key
	pub fn cipher(&self) -> Cipher {
		match self.bytes.len() {
			16 => Cipher::Aes128(Aes128Gcm::new(GenericArray::from_slice(&self.bytes))),
			24 => Cipher::Aes192(Aes192Gcm::new(GenericArray::from_slice(&self.bytes))),
			_ => Cipher::Aes256(Aes256Gcm::new(GenericArray::from_slice(&self.bytes))),
		}
	}
}

impl FromStr for ArchiveKey {
	type Err = InternalError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		ArchiveKey::from_hex(s)
	}
}

impl fmt::Debug for ArchiveKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[Angepkg::ArchiveKey] AES-{}: <redacted>", self.bits())
	}
}

/// Encryption - Decryption, a convenient wrapper around [`aes_gcm`], dispatching on key size.
///
/// Two framings are built on it and are deliberately distinct:
/// - detached: [`encrypt`](Cipher::encrypt) / [`decrypt`](Cipher::decrypt), the tag travels separately. Used for entries.
/// - appended: [`seal_appended`](Cipher::seal_appended) / [`open_appended`](Cipher::open_appended), `ciphertext ‖ tag`. Used for the manifest.
pub enum Cipher {
	/// AES-128-GCM
	Aes128(Aes128Gcm),
	/// AES-192-GCM
	Aes192(Aes192Gcm),
	/// AES-256-GCM
	Aes256(Aes256Gcm),
}

macro_rules! dispatch {
	($cipher:expr, $engine:ident => $body:expr) => {
		match $cipher {
			Cipher::Aes128($engine) => $body,
			Cipher::Aes192($engine) => $body,
			Cipher::Aes256($engine) => $body,
		}
	};
}

impl fmt::Debug for Cipher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let bits = match self {
			Cipher::Aes128(_) => 128,
			Cipher::Aes192(_) => 192,
			Cipher::Aes256(_) => 256,
		};

		write!(f, "[Angepkg::Cipher] cipher: Aes{}Gcm", bits)
	}
}

impl Cipher {
	/// Builds a cipher from raw key bytes
	pub fn new(key: &[u8]) -> InternalResult<Cipher> {
		ArchiveKey::from_bytes(key).map(|key| key.cipher())
	}

	/// Encrypts `plaintext`, returning the ciphertext (same length) and the detached tag
	pub fn encrypt(
		&self, nonce: &NonceBytes, plaintext: &[u8], associated_data: Option<&[u8]>,
	) -> InternalResult<(Vec<u8>, TagBytes)> {
		let mut buffer = plaintext.to_vec();
		let aad = associated_data.unwrap_or_default();
		let nonce = GenericArray::from_slice(nonce);

		let tag = dispatch!(self, engine => engine.encrypt_in_place_detached(nonce, aad, &mut buffer))
			.map_err(|_| InternalError::OtherError("AES-GCM encryption failed, plaintext too long".into()))?;

		let mut out = [0u8; crate::TAG_LENGTH];
		out.copy_from_slice(tag.as_slice());

		Ok((buffer, out))
	}

	/// Verifies `tag` (in constant time) and decrypts `ciphertext`.
	/// Fails with [`AuthenticationFailure`](InternalError::AuthenticationFailure) on mismatch
	pub fn decrypt(
		&self, nonce: &NonceBytes, ciphertext: &[u8], tag: &TagBytes, associated_data: Option<&[u8]>,
	) -> InternalResult<Vec<u8>> {
		let mut buffer = ciphertext.to_vec();
		let aad = associated_data.unwrap_or_default();
		let nonce = GenericArray::from_slice(nonce);
		let tag = GenericArray::from_slice(tag);

		dispatch!(self, engine => engine.decrypt_in_place_detached(nonce, aad, &mut buffer, tag))
			.map_err(|_| InternalError::AuthenticationFailure)?;

		Ok(buffer)
	}

	/// Appended-tag framing: returns `ciphertext ‖ tag`
	pub fn seal_appended(&self, nonce: &NonceBytes, plaintext: &[u8]) -> InternalResult<Vec<u8>> {
		let (mut sealed, tag) = self.encrypt(nonce, plaintext, None)?;
		sealed.extend_from_slice(&tag);

		Ok(sealed)
	}

	/// Inverse of [`seal_appended`](Cipher::seal_appended), the trailing 16 bytes are the tag
	pub fn open_appended(&self, nonce: &NonceBytes, sealed: &[u8]) -> InternalResult<Vec<u8>> {
		if sealed.len() < crate::TAG_LENGTH {
			return Err(InternalError::TruncatedData);
		}

		let (ciphertext, tag) = sealed.split_at(sealed.len() - crate::TAG_LENGTH);
		let tag: &TagBytes = tag.try_into().map_err(|_| InternalError::TruncatedData)?;

		self.decrypt(nonce, ciphertext, tag, None)
	}
}
