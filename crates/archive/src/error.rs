use crate::ScalarKind;

/// Errors raised while storing into or loading from an archive.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
	/// The loader expected one tag but the stream holds another.
	#[error("tag mismatch: expected {expected:?}, found {found:?}")]
	TagMismatch { expected: String, found: String },

	/// The next token has the wrong shape (e.g. a scalar where a tag begins).
	#[error("unexpected token: expected {expected}, found {found}")]
	UnexpectedToken { expected: &'static str, found: &'static str },

	/// A scalar of the wrong kind was stored where another kind is read.
	#[error("scalar mismatch: expected {expected}, found {found}")]
	ScalarMismatch { expected: ScalarKind, found: ScalarKind },

	/// The token stream ended before the reader was done.
	#[error("unexpected end of archive")]
	UnexpectedEnd,

	/// A tag was closed out of order, or left open when the archive was sealed.
	#[error("unbalanced tag {tag:?} (open: {open:?})")]
	Unbalanced { tag: String, open: Option<String> },

	/// A stored scalar holds a value the reader cannot interpret.
	#[error("invalid {what}: {found}")]
	InvalidValue { what: &'static str, found: String },

	/// A multi-tag count does not fit the persisted width.
	#[error("count {0} exceeds the archive limit")]
	CountOverflow(usize),

	/// The blob does not start with the archive magic.
	#[error("bad archive magic")]
	BadMagic,

	/// The blob was written with a different schema version.
	#[error("unsupported archive schema version {found} (expected {expected})")]
	UnsupportedVersion { found: u32, expected: u32 },

	/// Postcard failed to encode the token stream.
	#[error("failed to encode archive: {0}")]
	Encode(#[source] postcard::Error),

	/// Postcard failed to decode the token stream.
	#[error("failed to decode archive: {0}")]
	Decode(#[source] postcard::Error),
}
