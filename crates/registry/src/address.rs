use std::fmt;
use std::str::FromStr;

use trellis_archive::{Archive, ArchiveExt, Result};

use crate::tags;

/// Identifies the component class an element instantiates.
///
/// Written as `package::component`. An empty package id addresses a
/// component of the hosting registry (an embedded composite).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentAddress {
	package_id: String,
	component_id: String,
}

impl ComponentAddress {
	pub fn new(package_id: impl Into<String>, component_id: impl Into<String>) -> Self {
		Self {
			package_id: package_id.into(),
			component_id: component_id.into(),
		}
	}

	pub fn package_id(&self) -> &str {
		&self.package_id
	}

	pub fn component_id(&self) -> &str {
		&self.component_id
	}

	/// Returns `true` when neither part is set.
	pub fn is_empty(&self) -> bool {
		self.package_id.is_empty() && self.component_id.is_empty()
	}

	pub fn serialize<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<()> {
		archive.tagged(&tags::ADDRESS, |archive| {
			archive.process_tagged(&tags::PACKAGE_ID, &mut self.package_id)?;
			archive.process_tagged(&tags::COMPONENT_ID, &mut self.component_id)
		})
	}
}

impl fmt::Display for ComponentAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}::{}", self.package_id, self.component_id)
	}
}

/// The address string lacks the `::` separator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("component address {0:?} is not of the form package::component")]
pub struct ParseAddressError(pub String);

impl FromStr for ComponentAddress {
	type Err = ParseAddressError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		let (package, component) = s.split_once("::").ok_or_else(|| ParseAddressError(s.to_string()))?;
		Ok(Self::new(package, component))
	}
}
