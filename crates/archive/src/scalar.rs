use serde::{Deserialize, Serialize};

/// A primitive value carried by an archive.
///
/// Archives only store scalars; composite structures are expressed with
/// nested tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
	Bool(bool),
	I8(i8),
	I16(i16),
	I32(i32),
	I64(i64),
	U8(u8),
	U16(u16),
	U32(u32),
	U64(u64),
	F32(f32),
	F64(f64),
	Bytes(Vec<u8>),
	String(String),
}

/// Discriminant of a [`Scalar`], used for type checks and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	F32,
	F64,
	Bytes,
	String,
}

impl Scalar {
	/// Returns the kind of this scalar.
	pub fn kind(&self) -> ScalarKind {
		match self {
			Scalar::Bool(_) => ScalarKind::Bool,
			Scalar::I8(_) => ScalarKind::I8,
			Scalar::I16(_) => ScalarKind::I16,
			Scalar::I32(_) => ScalarKind::I32,
			Scalar::I64(_) => ScalarKind::I64,
			Scalar::U8(_) => ScalarKind::U8,
			Scalar::U16(_) => ScalarKind::U16,
			Scalar::U32(_) => ScalarKind::U32,
			Scalar::U64(_) => ScalarKind::U64,
			Scalar::F32(_) => ScalarKind::F32,
			Scalar::F64(_) => ScalarKind::F64,
			Scalar::Bytes(_) => ScalarKind::Bytes,
			Scalar::String(_) => ScalarKind::String,
		}
	}
}

impl ScalarKind {
	/// Returns the lowercase name of this kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::I8 => "i8",
			Self::I16 => "i16",
			Self::I32 => "i32",
			Self::I64 => "i64",
			Self::U8 => "u8",
			Self::U16 => "u16",
			Self::U32 => "u32",
			Self::U64 => "u64",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::Bytes => "bytes",
			Self::String => "string",
		}
	}
}

impl std::fmt::Display for ScalarKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
