//! Token-stream archive held in memory.
//!
//! A [`MemoryArchive`] starts in storing mode, records a flat token stream,
//! and can be rewound with [`MemoryArchive::seek_begin`] to load the same
//! stream back. [`MemoryArchive::to_bytes`] frames the stream with the
//! [`header`](crate::header) and encodes it with postcard.

use serde::{Deserialize, Serialize};

use crate::{Archive, ArchiveError, ArchiveTag, Result, Scalar, header};


/// One element of the archive token stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Token {
	/// Opening of a plain tag.
	Begin(String),
	/// Opening of a tag holding `count` children tagged `sub_tag`.
	BeginMulti { tag: String, sub_tag: String, count: u32 },
	/// Closing of the innermost tag.
	End(String),
	/// A primitive value.
	Scalar(Scalar),
}

impl Token {
	fn shape(&self) -> &'static str {
		match self {
			Token::Begin(_) => "tag",
			Token::BeginMulti { .. } => "multi-tag",
			Token::End(_) => "end of tag",
			Token::Scalar(_) => "scalar",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
	Storing,
	Loading,
}

/// In-memory archive backed by a token stream.
#[derive(Debug, Clone)]
pub struct MemoryArchive {
	tokens: Vec<Token>,
	cursor: usize,
	mode: Mode,
	open: Vec<&'static str>,
}

impl Default for MemoryArchive {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryArchive {
	/// Creates an empty archive in storing mode.
	pub fn new() -> Self {
		Self {
			tokens: Vec::new(),
			cursor: 0,
			mode: Mode::Storing,
			open: Vec::new(),
		}
	}

	/// Creates a loading archive over an existing token stream.
	pub fn from_tokens(tokens: Vec<Token>) -> Self {
		Self {
			tokens,
			cursor: 0,
			mode: Mode::Loading,
			open: Vec::new(),
		}
	}

	/// Decodes a blob produced by [`MemoryArchive::to_bytes`] into a loading archive.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		let payload = header::split_header(bytes)?;
		let tokens: Vec<Token> = postcard::from_bytes(payload).map_err(ArchiveError::Decode)?;
		tracing::trace!(tokens = tokens.len(), "decoded archive blob");
		Ok(Self::from_tokens(tokens))
	}

	/// Encodes the recorded token stream as a framed blob.
	///
	/// Fails with [`ArchiveError::Unbalanced`] if a tag is still open.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		if let Some(open) = self.open.last() {
			return Err(ArchiveError::Unbalanced {
				tag: (*open).to_string(),
				open: Some((*open).to_string()),
			});
		}
		let mut out = Vec::with_capacity(header::HEADER_LEN + self.tokens.len() * 8);
		header::write_header(&mut out);
		let payload = postcard::to_allocvec(&self.tokens).map_err(ArchiveError::Encode)?;
		out.extend_from_slice(&payload);
		Ok(out)
	}

	/// Rewinds to the start of the stream and switches to loading mode.
	pub fn seek_begin(&mut self) {
		self.cursor = 0;
		self.mode = Mode::Loading;
		self.open.clear();
	}

	/// Returns the recorded tokens.
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	/// Returns `true` once a loading archive has consumed every token.
	pub fn is_exhausted(&self) -> bool {
		self.cursor >= self.tokens.len()
	}

	fn next(&mut self) -> Result<&Token> {
		let token = self.tokens.get(self.cursor).ok_or(ArchiveError::UnexpectedEnd)?;
		self.cursor += 1;
		Ok(token)
	}

	fn check_tag(expected: &ArchiveTag, found: &str) -> Result<()> {
		if expected.id() == found {
			Ok(())
		} else {
			Err(ArchiveError::TagMismatch {
				expected: expected.id().to_string(),
				found: found.to_string(),
			})
		}
	}
}

impl Archive for MemoryArchive {
	fn is_storing(&self) -> bool {
		self.mode == Mode::Storing
	}

	fn begin_tag(&mut self, tag: &ArchiveTag) -> Result<()> {
		match self.mode {
			Mode::Storing => self.tokens.push(Token::Begin(tag.id().to_string())),
			Mode::Loading => match self.next()? {
				Token::Begin(found) => Self::check_tag(tag, found)?,
				other => {
					return Err(ArchiveError::UnexpectedToken {
						expected: "tag",
						found: other.shape(),
					});
				}
			},
		}
		self.open.push(tag.id());
		Ok(())
	}

	fn begin_multi_tag(&mut self, tag: &ArchiveTag, sub_tag: &ArchiveTag, count: &mut usize) -> Result<()> {
		match self.mode {
			Mode::Storing => {
				let stored = u32::try_from(*count).map_err(|_| ArchiveError::CountOverflow(*count))?;
				self.tokens.push(Token::BeginMulti {
					tag: tag.id().to_string(),
					sub_tag: sub_tag.id().to_string(),
					count: stored,
				});
			}
			Mode::Loading => match self.next()? {
				Token::BeginMulti {
					tag: found,
					sub_tag: found_sub,
					count: stored,
				} => {
					Self::check_tag(tag, found)?;
					Self::check_tag(sub_tag, found_sub)?;
					*count = *stored as usize;
				}
				other => {
					return Err(ArchiveError::UnexpectedToken {
						expected: "multi-tag",
						found: other.shape(),
					});
				}
			},
		}
		self.open.push(tag.id());
		Ok(())
	}

	fn end_tag(&mut self, tag: &ArchiveTag) -> Result<()> {
		match self.open.last() {
			Some(open) if *open == tag.id() => {}
			open => {
				return Err(ArchiveError::Unbalanced {
					tag: tag.id().to_string(),
					open: open.map(|s| (*s).to_string()),
				});
			}
		}
		match self.mode {
			Mode::Storing => self.tokens.push(Token::End(tag.id().to_string())),
			Mode::Loading => match self.next()? {
				Token::End(found) => Self::check_tag(tag, found)?,
				other => {
					return Err(ArchiveError::UnexpectedToken {
						expected: "end of tag",
						found: other.shape(),
					});
				}
			},
		}
		self.open.pop();
		Ok(())
	}

	fn process_scalar(&mut self, value: &mut Scalar) -> Result<()> {
		match self.mode {
			Mode::Storing => {
				self.tokens.push(Token::Scalar(value.clone()));
				Ok(())
			}
			Mode::Loading => match self.next()? {
				Token::Scalar(stored) if stored.kind() == value.kind() => {
					*value = stored.clone();
					Ok(())
				}
				Token::Scalar(stored) => Err(ArchiveError::ScalarMismatch {
					expected: value.kind(),
					found: stored.kind(),
				}),
				other => Err(ArchiveError::UnexpectedToken {
					expected: "scalar",
					found: other.shape(),
				}),
			},
		}
	}
}
