use std::io::Read;
use super::{error::*, flags::Flags};

#[derive(Debug, Clone)]
pub(crate) struct Header {
	pub(crate) magic: [u8; crate::MAGIC_LENGTH],
	pub version: u32,
	pub manifest_length: i64,
	pub flags: Flags,
	pub manifest_nonce: Option<[u8; crate::NONCE_LENGTH]>,
}

impl Default for Header {
	#[inline(always)]
	fn default() -> Header {
		Header {
			magic: crate::MAGIC,
			version: crate::VERSION,
			manifest_length: 0,
			flags: Flags::default(),
			manifest_nonce: None,
		}
	}
}

impl Header {
	pub const BASE_SIZE: usize = crate::MAGIC_LENGTH + Self::VERSION_SIZE + Self::MANIFEST_LENGTH_SIZE + Flags::BYTES;

	// Data appears in this order
	pub const VERSION_SIZE: usize = 4;
	pub const MANIFEST_LENGTH_SIZE: usize = 8;

	/// Size of a header with the given flags, the manifest nonce only exists for encrypted manifests
	#[inline(always)]
	pub(crate) fn size_for(flags: Flags) -> usize {
		if flags.contains(Flags::MANIFEST_ENCRYPTED) {
			Self::BASE_SIZE + crate::NONCE_LENGTH
		} else {
			Self::BASE_SIZE
		}
	}

	#[inline(always)]
	pub(crate) fn size(&self) -> usize {
		Header::size_for(self.flags)
	}

	/// Validates this Header's MAGIC, VERSION, flags and manifest length
	pub(crate) fn validate(&self) -> InternalResult {
		// Validate magic
		if self.magic != crate::MAGIC {
			return Err(InternalError::MalformedArchiveSource(self.magic));
		};

		// Validate version
		if crate::VERSION != self.version {
			return Err(InternalError::IncompatibleArchiveVersion(self.version));
		};

		if self.flags.has_reserved() {
			return Err(InternalError::RestrictedFlagAccess);
		};

		if self.manifest_length < 0 || self.manifest_length > i32::MAX as i64 {
			return Err(InternalError::InvalidManifestLength(self.manifest_length));
		};

		Ok(())
	}

	/// Reads the fixed fields, then the manifest nonce if the flags call for one.
	/// The magic is checked before anything else is read, so foreign files fail fast.
	pub(crate) fn from_handle<T: Read>(mut handle: T) -> InternalResult<Header> {
		let mut magic = [0u8; crate::MAGIC_LENGTH];
		handle.read_exact(&mut magic)?;

		if magic != crate::MAGIC {
			return Err(InternalError::MalformedArchiveSource(magic));
		}

		let mut buffer: [u8; Header::BASE_SIZE] = [0u8; Header::BASE_SIZE];
		buffer[..crate::MAGIC_LENGTH].copy_from_slice(&magic);
		handle.read_exact(&mut buffer[crate::MAGIC_LENGTH..])?;

		let flags = Flags::from_bits(buffer[20]);

		let manifest_nonce = if flags.contains(Flags::MANIFEST_ENCRYPTED) {
			let mut nonce = [0u8; crate::NONCE_LENGTH];
			handle.read_exact(&mut nonce)?;
			Some(nonce)
		} else {
			None
		};

		Ok(Header {
			magic,
			// Read version, u32 from [u8;4]
			version: u32::from_le_bytes(buffer[8..12].try_into().unwrap()),
			// Read the stored manifest length, i64 from [u8;8]
			manifest_length: i64::from_le_bytes(buffer[12..20].try_into().unwrap()),
			flags,
			manifest_nonce,
		})
	}

	pub(crate) fn to_bytes(&self) -> Vec<u8> {
		let mut buffer = Vec::with_capacity(self.size());
		buffer.extend_from_slice(&self.magic);
		buffer.extend_from_slice(&self.version.to_le_bytes());
		buffer.extend_from_slice(&self.manifest_length.to_le_bytes());
		buffer.push(self.flags.bits());

		if let Some(nonce) = self.manifest_nonce {
			buffer.extend_from_slice(&nonce);
		}

		buffer
	}
}
