use crate::{ArchiveError, ArchiveTag, Result, Scalar, ScalarKind, header};

/// Symmetric tag/scalar archive.
///
/// Serializers drive the same calls in both directions. When storing, each
/// call appends to the archive; when loading, each call consumes the next
/// element and checks that it matches what the serializer asked for.
pub trait Archive {
	/// Returns `true` when the archive is being written.
	fn is_storing(&self) -> bool;

	/// Returns the schema version of the data being processed.
	fn version(&self) -> u32 {
		header::SCHEMA_VERSION
	}

	/// Opens a tag.
	fn begin_tag(&mut self, tag: &ArchiveTag) -> Result<()>;

	/// Opens a tag holding `count` children tagged `sub_tag`.
	///
	/// On store `count` is written; on load it is overwritten with the stored
	/// count. The caller then processes exactly `count` `sub_tag` children and
	/// closes `tag` with [`Archive::end_tag`].
	fn begin_multi_tag(&mut self, tag: &ArchiveTag, sub_tag: &ArchiveTag, count: &mut usize) -> Result<()>;

	/// Closes the innermost open tag, which must be `tag`.
	fn end_tag(&mut self, tag: &ArchiveTag) -> Result<()>;

	/// Stores `value`, or replaces it with the next stored scalar.
	///
	/// On load the stored scalar must have the same [`ScalarKind`] as `value`.
	fn process_scalar(&mut self, value: &mut Scalar) -> Result<()>;
}

/// A Rust value that maps onto a single archive scalar.
pub trait ArchiveValue {
	/// Stores or loads `self` through `archive`.
	fn process<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<()>;
}

macro_rules! scalar_value {
	($($ty:ty => $variant:ident),* $(,)?) => {$(
		impl ArchiveValue for $ty {
			fn process<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<()> {
				let mut scalar = Scalar::$variant(*self);
				archive.process_scalar(&mut scalar)?;
				match scalar {
					Scalar::$variant(v) => {
						*self = v;
						Ok(())
					}
					other => Err(ArchiveError::ScalarMismatch {
						expected: ScalarKind::$variant,
						found: other.kind(),
					}),
				}
			}
		}
	)*};
}

scalar_value! {
	bool => Bool,
	i8 => I8,
	i16 => I16,
	i32 => I32,
	i64 => I64,
	u8 => U8,
	u16 => U16,
	u32 => U32,
	u64 => U64,
	f32 => F32,
	f64 => F64,
}

impl ArchiveValue for String {
	fn process<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<()> {
		let mut scalar = Scalar::String(std::mem::take(self));
		archive.process_scalar(&mut scalar)?;
		match scalar {
			Scalar::String(v) => {
				*self = v;
				Ok(())
			}
			other => Err(ArchiveError::ScalarMismatch {
				expected: ScalarKind::String,
				found: other.kind(),
			}),
		}
	}
}

impl ArchiveValue for Vec<u8> {
	fn process<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<()> {
		let mut scalar = Scalar::Bytes(std::mem::take(self));
		archive.process_scalar(&mut scalar)?;
		match scalar {
			Scalar::Bytes(v) => {
				*self = v;
				Ok(())
			}
			other => Err(ArchiveError::ScalarMismatch {
				expected: ScalarKind::Bytes,
				found: other.kind(),
			}),
		}
	}
}

/// Typed helpers available on every [`Archive`], including `dyn Archive`.
pub trait ArchiveExt: Archive {
	/// Stores or loads one typed value.
	fn process<T: ArchiveValue>(&mut self, value: &mut T) -> Result<()> {
		value.process(self)
	}

	/// Runs `f` between `begin_tag(tag)` and `end_tag(tag)`.
	fn tagged<R>(&mut self, tag: &ArchiveTag, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
		self.begin_tag(tag)?;
		let out = f(self)?;
		self.end_tag(tag)?;
		Ok(out)
	}

	/// Stores or loads a single value wrapped in its own tag.
	fn process_tagged<T: ArchiveValue>(&mut self, tag: &ArchiveTag, value: &mut T) -> Result<()> {
		self.tagged(tag, |archive| archive.process(value))
	}

	/// Opens a multi-tag and calls `f` once per child index.
	///
	/// `count` is written on store and filled in on load before the first call.
	fn multi_tagged(
		&mut self,
		tag: &ArchiveTag,
		sub_tag: &ArchiveTag,
		count: &mut usize,
		mut f: impl FnMut(&mut Self, usize) -> Result<()>,
	) -> Result<()> {
		self.begin_multi_tag(tag, sub_tag, count)?;
		for index in 0..*count {
			f(self, index)?;
		}
		self.end_tag(tag)
	}
}

impl<A: Archive + ?Sized> ArchiveExt for A {}
