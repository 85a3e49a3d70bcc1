//! Composer configuration.

use serde::{Deserialize, Serialize};

use crate::error::ComposeError;

/// Tunables of a [`Composer`](crate::Composer).
///
/// Deserialized from TOML; every field is optional:
///
/// ```toml
/// eager = true
/// teardown_on_drop = true
/// max_depth = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComposerConfig {
	/// Activate every root element when the composer is built.
	pub eager: bool,
	/// Tear down all instances when the last composer handle is dropped.
	pub teardown_on_drop: bool,
	/// Maximum nesting of constructions triggered by resolution. Unbounded when unset.
	pub max_depth: Option<usize>,
}

impl Default for ComposerConfig {
	fn default() -> Self {
		Self {
			eager: false,
			teardown_on_drop: true,
			max_depth: None,
		}
	}
}

impl ComposerConfig {
	/// Parses a configuration from TOML text.
	pub fn from_toml(text: &str) -> Result<Self, ComposeError> {
		Ok(toml::from_str(text)?)
	}
}

impl std::str::FromStr for ComposerConfig {
	type Err = ComposeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_toml(s)
	}
}
