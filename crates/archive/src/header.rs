//! Blob header framing.

use crate::{ArchiveError, Result};

/// Magic bytes identifying a trellis archive blob.
pub const MAGIC: &[u8; 8] = b"TRLSARCH";

/// Schema version for blob format compatibility.
pub const SCHEMA_VERSION: u32 = 1;

/// Total header length: magic plus little-endian version.
pub const HEADER_LEN: usize = MAGIC.len() + 4;

/// Appends the header for the current schema version.
pub fn write_header(out: &mut Vec<u8>) {
	out.extend_from_slice(MAGIC);
	out.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
}

/// Validates the header and returns the payload that follows it.
pub fn split_header(bytes: &[u8]) -> Result<&[u8]> {
	if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
		return Err(ArchiveError::BadMagic);
	}
	let mut version = [0u8; 4];
	version.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
	let found = u32::from_le_bytes(version);
	if found != SCHEMA_VERSION {
		return Err(ArchiveError::UnsupportedVersion {
			found,
			expected: SCHEMA_VERSION,
		});
	}
	Ok(&bytes[HEADER_LEN..])
}
