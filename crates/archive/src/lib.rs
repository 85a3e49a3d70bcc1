//! Tagged archive contract and the in-memory blob archive.
//!
//! Configuration objects persist themselves through a single symmetric
//! `serialize(&mut self, archive)` method: the same code path writes when the
//! archive [is storing](Archive::is_storing) and reads when it is loading.
//! The archive enforces the tag structure, so a reader that walks tags in a
//! different order than the writer fails with [`ArchiveError::TagMismatch`]
//! instead of silently misreading values.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Archive`] | Object-safe tag/scalar contract implemented by archive backends. |
//! | [`ArchiveExt`] | Typed helpers (`process`, `tagged`, `multi_tagged`) over any archive. |
//! | [`ArchiveTag`] | Static tag identity used by serializers. |
//! | [`Scalar`] | The primitive values an archive can carry. |
//! | [`MemoryArchive`] | Token-stream archive with postcard blob encoding. |

mod archive;
mod error;
pub mod header;
mod memory;
mod scalar;
mod tag;

pub use archive::{Archive, ArchiveExt, ArchiveValue};
pub use error::ArchiveError;
pub use memory::{MemoryArchive, Token};
pub use scalar::{Scalar, ScalarKind};
pub use tag::ArchiveTag;

/// Result alias for archive operations.
pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
