use std::fmt;
use super::error::*;

/// Abstracted flag access and manipulation `struct`, for the single flags byte in the `Header`.
/// Basically just a tiny, [`bitflags`](https://github.com/bitflags/bitflags)
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Flags {
	pub(crate) bits: u8,
}

impl Flags {
	/// Bits reserved for future format revisions.
	pub const RESERVED_MASK: u8 = 0b1111_1100;
	/// The size in bytes of the flags entry
	pub const BYTES: usize = 1;

	/// The manifest is sealed with AES-GCM, and a manifest nonce follows the flags byte
	pub const MANIFEST_ENCRYPTED: u8 = 0b0000_0001;
	/// The manifest is gzip compressed
	pub const MANIFEST_COMPRESSED: u8 = 0b0000_0010;

	/// Construct a `Flags` struct from a `u8` number
	#[inline(always)]
	pub fn from_bits(bits: u8) -> Self {
		Flags { bits }
	}

	/// Returns a copy of the underlying number.
	#[inline(always)]
	pub fn bits(&self) -> u8 {
		self.bits
	}

	/// Create a new empty instance
	#[inline(always)]
	pub fn new() -> Self {
		Flags { bits: 0 }
	}

	/// Set a bit into the underlying [`u8`], will fail if set into the reserved mask.
	/// The `toggle` parameter specifies whether to insert the flags (when true), or to pop the flag, (when false).
	pub fn set(&mut self, bit: u8, toggle: bool) -> InternalResult<u8> {
		if (Flags::RESERVED_MASK & bit) != 0 {
			return Err(InternalError::RestrictedFlagAccess);
		} else {
			self.force_set(bit, toggle)
		}

		Ok(self.bits)
	}

	pub(crate) fn force_set(&mut self, mask: u8, toggle: bool) {
		if toggle {
			self.bits |= mask;
		} else {
			self.bits &= !mask;
		}
	}

	#[inline(always)]
	/// Checks whether the given flag is set.
	pub fn contains(&self, bit: u8) -> bool {
		(self.bits & bit) != 0
	}

	/// `true` if any reserved bit is set, which no current archive does
	#[inline(always)]
	pub fn has_reserved(&self) -> bool {
		self.contains(Flags::RESERVED_MASK)
	}
}

#[rustfmt::skip]
impl fmt::Display for Flags {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let compressed = if self.contains(Flags::MANIFEST_COMPRESSED) { 'C' } else { '-' };
		let encrypted = if self.contains(Flags::MANIFEST_ENCRYPTED) { 'E' } else { '-' };

		write!(f, "Flags[{}{}]", compressed, encrypted)
	}
}

#[rustfmt::skip]
impl fmt::Debug for Flags {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let compressed = if self.contains(Flags::MANIFEST_COMPRESSED) { 'C' } else { '-' };
		let encrypted = if self.contains(Flags::MANIFEST_ENCRYPTED) { 'E' } else { '-' };

		write!(f, "Flags[{}{}]: <{}u8 : {:#010b}>", compressed, encrypted, self.bits, self.bits)
	}
}
