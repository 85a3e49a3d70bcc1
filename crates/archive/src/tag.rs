/// Static identity of one archive tag.
///
/// Tags are declared as constants next to the serializer that uses them. Only
/// the id participates in equality and is persisted; the comment documents the
/// tag for human readers of dumps.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveTag {
	id: &'static str,
	comment: &'static str,
}

impl ArchiveTag {
	/// Creates a tag with the given id and comment.
	pub const fn new(id: &'static str, comment: &'static str) -> Self {
		Self { id, comment }
	}

	/// Returns the persisted tag id.
	pub const fn id(&self) -> &'static str {
		self.id
	}

	/// Returns the human-readable comment.
	pub const fn comment(&self) -> &'static str {
		self.comment
	}
}

impl PartialEq for ArchiveTag {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for ArchiveTag {}

impl std::fmt::Display for ArchiveTag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.id)
	}
}
