//! Attribute values stored in registry elements.

use trellis_archive::{Archive, ArchiveError, ArchiveExt, ArchiveTag};

use crate::tags;

/// A type-erased attribute value.
///
/// Values map directly onto archive scalars. [`AttrValue::List`] holds the
/// values of a multi-valued attribute and is persisted as a multi-tag.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Bool(bool),
	I32(i32),
	I64(i64),
	U32(u32),
	U64(u64),
	F64(f64),
	Bytes(Vec<u8>),
	String(String),
	List(Vec<AttrValue>),
}

/// Discriminant of an [`AttrValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
	Bool,
	I32,
	I64,
	U32,
	U64,
	F64,
	Bytes,
	String,
	List,
}

const LIST: ArchiveTag = ArchiveTag::new("List", "Values of a multi-valued attribute");
const ITEM: ArchiveTag = ArchiveTag::new("Item", "One value of a multi-valued attribute");

impl AttrKind {
	/// Returns the lowercase type name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::I32 => "i32",
			Self::I64 => "i64",
			Self::U32 => "u32",
			Self::U64 => "u64",
			Self::F64 => "f64",
			Self::Bytes => "bytes",
			Self::String => "string",
			Self::List => "list",
		}
	}

	const fn code(self) -> u8 {
		match self {
			Self::Bool => 0,
			Self::I32 => 1,
			Self::I64 => 2,
			Self::U32 => 3,
			Self::U64 => 4,
			Self::F64 => 5,
			Self::Bytes => 6,
			Self::String => 7,
			Self::List => 8,
		}
	}

	fn from_code(code: u8) -> Option<Self> {
		Some(match code {
			0 => Self::Bool,
			1 => Self::I32,
			2 => Self::I64,
			3 => Self::U32,
			4 => Self::U64,
			5 => Self::F64,
			6 => Self::Bytes,
			7 => Self::String,
			8 => Self::List,
			_ => return None,
		})
	}

	fn placeholder(self) -> AttrValue {
		match self {
			Self::Bool => AttrValue::Bool(false),
			Self::I32 => AttrValue::I32(0),
			Self::I64 => AttrValue::I64(0),
			Self::U32 => AttrValue::U32(0),
			Self::U64 => AttrValue::U64(0),
			Self::F64 => AttrValue::F64(0.0),
			Self::Bytes => AttrValue::Bytes(Vec::new()),
			Self::String => AttrValue::String(String::new()),
			Self::List => AttrValue::List(Vec::new()),
		}
	}
}

impl std::fmt::Display for AttrKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl AttrValue {
	/// Returns the kind of this value.
	pub fn kind(&self) -> AttrKind {
		match self {
			AttrValue::Bool(_) => AttrKind::Bool,
			AttrValue::I32(_) => AttrKind::I32,
			AttrValue::I64(_) => AttrKind::I64,
			AttrValue::U32(_) => AttrKind::U32,
			AttrValue::U64(_) => AttrKind::U64,
			AttrValue::F64(_) => AttrKind::F64,
			AttrValue::Bytes(_) => AttrKind::Bytes,
			AttrValue::String(_) => AttrKind::String,
			AttrValue::List(_) => AttrKind::List,
		}
	}

	/// Returns the type name of this value.
	pub fn type_name(&self) -> &'static str {
		self.kind().as_str()
	}

	/// Returns the boolean value if this is a `Bool`.
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			AttrValue::Bool(v) => Some(*v),
			_ => None,
		}
	}

	/// Returns any integer value that fits in an `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match *self {
			AttrValue::I32(v) => Some(v.into()),
			AttrValue::I64(v) => Some(v),
			AttrValue::U32(v) => Some(v.into()),
			AttrValue::U64(v) => i64::try_from(v).ok(),
			_ => None,
		}
	}

	/// Returns a floating point view of numeric values.
	pub fn as_f64(&self) -> Option<f64> {
		match *self {
			AttrValue::F64(v) => Some(v),
			AttrValue::I32(v) => Some(v.into()),
			AttrValue::U32(v) => Some(v.into()),
			_ => None,
		}
	}

	/// Returns the string value if this is a `String`.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			AttrValue::String(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the bytes if this is a `Bytes`.
	pub fn as_bytes(&self) -> Option<&[u8]> {
		match self {
			AttrValue::Bytes(v) => Some(v),
			_ => None,
		}
	}

	/// Returns the items if this is a `List`.
	pub fn as_list(&self) -> Option<&[AttrValue]> {
		match self {
			AttrValue::List(v) => Some(v),
			_ => None,
		}
	}

	/// Extracts a typed value, see [`AttrType`].
	pub fn get<T: AttrType>(&self) -> Option<T> {
		T::from_attr(self)
	}

	/// Stores or loads this value as a `Type` kind code followed by its `Value`.
	///
	/// On load the value is replaced by whatever kind the archive holds.
	pub fn serialize<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<(), ArchiveError> {
		let mut code = self.kind().code();
		archive.process_tagged(&tags::TYPE, &mut code)?;
		if !archive.is_storing() {
			let kind = AttrKind::from_code(code).ok_or_else(|| ArchiveError::InvalidValue {
				what: "attribute type",
				found: code.to_string(),
			})?;
			*self = kind.placeholder();
		}
		archive.tagged(&tags::VALUE, |archive| self.process_payload(archive))
	}

	fn process_payload<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<(), ArchiveError> {
		match self {
			AttrValue::Bool(v) => archive.process(v),
			AttrValue::I32(v) => archive.process(v),
			AttrValue::I64(v) => archive.process(v),
			AttrValue::U32(v) => archive.process(v),
			AttrValue::U64(v) => archive.process(v),
			AttrValue::F64(v) => archive.process(v),
			AttrValue::Bytes(v) => archive.process(v),
			AttrValue::String(v) => archive.process(v),
			AttrValue::List(items) => {
				let mut count = items.len();
				if !archive.is_storing() {
					items.clear();
				}
				archive.multi_tagged(&LIST, &ITEM, &mut count, |archive, index| {
					if !archive.is_storing() {
						items.push(AttrValue::Bool(false));
					}
					archive.tagged(&ITEM, |archive| items[index].serialize(archive))
				})
			}
		}
	}
}

macro_rules! attr_from {
	($($ty:ty => $variant:ident),* $(,)?) => {$(
		impl From<$ty> for AttrValue {
			fn from(v: $ty) -> Self {
				AttrValue::$variant(v)
			}
		}
	)*};
}

attr_from! {
	bool => Bool,
	i32 => I32,
	i64 => I64,
	u32 => U32,
	u64 => U64,
	f64 => F64,
	Vec<u8> => Bytes,
	String => String,
	Vec<AttrValue> => List,
}

impl From<&str> for AttrValue {
	fn from(v: &str) -> Self {
		AttrValue::String(v.to_string())
	}
}

impl From<Vec<String>> for AttrValue {
	fn from(v: Vec<String>) -> Self {
		AttrValue::List(v.into_iter().map(AttrValue::String).collect())
	}
}

impl From<&[&str]> for AttrValue {
	fn from(v: &[&str]) -> Self {
		AttrValue::List(v.iter().map(|s| AttrValue::from(*s)).collect())
	}
}

mod sealed {
	pub trait Sealed {}
	impl Sealed for bool {}
	impl Sealed for i32 {}
	impl Sealed for i64 {}
	impl Sealed for u32 {}
	impl Sealed for u64 {}
	impl Sealed for f64 {}
	impl Sealed for String {}
	impl Sealed for Vec<u8> {}
	impl Sealed for Vec<String> {}
	impl Sealed for Vec<i64> {}
}

/// Rust types that can be bound from an [`AttrValue`].
///
/// Conversions are lossless: integers widen when the target can represent
/// every source value, nothing narrows, and strings never parse numbers.
pub trait AttrType: sealed::Sealed + Sized + Into<AttrValue> {
	/// The value kind written for this type.
	const KIND: AttrKind;

	/// Extracts the value, returning `None` on a kind mismatch.
	fn from_attr(value: &AttrValue) -> Option<Self>;
}

impl AttrType for bool {
	const KIND: AttrKind = AttrKind::Bool;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_bool()
	}
}

impl AttrType for i32 {
	const KIND: AttrKind = AttrKind::I32;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		match *value {
			AttrValue::I32(v) => Some(v),
			_ => None,
		}
	}
}

impl AttrType for i64 {
	const KIND: AttrKind = AttrKind::I64;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		match *value {
			AttrValue::I32(v) => Some(v.into()),
			AttrValue::I64(v) => Some(v),
			AttrValue::U32(v) => Some(v.into()),
			_ => None,
		}
	}
}

impl AttrType for u32 {
	const KIND: AttrKind = AttrKind::U32;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		match *value {
			AttrValue::U32(v) => Some(v),
			_ => None,
		}
	}
}

impl AttrType for u64 {
	const KIND: AttrKind = AttrKind::U64;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		match *value {
			AttrValue::U32(v) => Some(v.into()),
			AttrValue::U64(v) => Some(v),
			_ => None,
		}
	}
}

impl AttrType for f64 {
	const KIND: AttrKind = AttrKind::F64;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_f64()
	}
}

impl AttrType for String {
	const KIND: AttrKind = AttrKind::String;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_str().map(str::to_string)
	}
}

impl AttrType for Vec<u8> {
	const KIND: AttrKind = AttrKind::Bytes;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_bytes().map(<[u8]>::to_vec)
	}
}

impl AttrType for Vec<String> {
	const KIND: AttrKind = AttrKind::List;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_list()?.iter().map(String::from_attr).collect()
	}
}

impl From<Vec<i64>> for AttrValue {
	fn from(v: Vec<i64>) -> Self {
		AttrValue::List(v.into_iter().map(AttrValue::I64).collect())
	}
}

impl AttrType for Vec<i64> {
	const KIND: AttrKind = AttrKind::List;

	fn from_attr(value: &AttrValue) -> Option<Self> {
		value.as_list()?.iter().map(i64::from_attr).collect()
	}
}
