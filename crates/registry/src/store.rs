//! File-backed registry loading with a path-keyed cache.
//!
//! Registries are stored as archive blobs. A composite component whose
//! address names a package resolves to `<dir>/<package>/<component>.trls`,
//! where `<dir>` is the directory of the registry that declares it.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::address::ComponentAddress;
use crate::error::RegistryError;
use crate::registry::Registry;

/// File extension of registry blobs.
pub const REGISTRY_EXTENSION: &str = "trls";

/// Loads registries from disk and caches them by normalized path.
#[derive(Debug, Default)]
pub struct RegistryStore {
	cache: RwLock<FxHashMap<PathBuf, Arc<Registry>>>,
}

impl RegistryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the registry stored at `path`, reading it on first use.
	pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Registry>, RegistryError> {
		let key = normalize(path.as_ref());
		if let Some(registry) = self.cache.read().get(&key) {
			tracing::trace!(path = %key.display(), "registry cache hit");
			return Ok(Arc::clone(registry));
		}

		let bytes = std::fs::read(&key).map_err(|source| RegistryError::Io {
			path: key.clone(),
			source,
		})?;
		let registry = Arc::new(Registry::from_bytes(&bytes)?);
		tracing::debug!(path = %key.display(), elements = registry.elements_len(), "loaded registry");

		let mut cache = self.cache.write();
		Ok(Arc::clone(cache.entry(key).or_insert(registry)))
	}

	/// Loads the registry of a composite component declared next to `context`.
	pub fn load_component(&self, context: impl AsRef<Path>, address: &ComponentAddress) -> Result<Arc<Registry>, RegistryError> {
		self.load(component_path(context.as_ref(), address))
	}

	/// Writes `registry` to `path` and refreshes the cached copy.
	pub fn save(&self, path: impl AsRef<Path>, registry: &Registry) -> Result<(), RegistryError> {
		let key = normalize(path.as_ref());
		let bytes = registry.to_bytes()?;
		if let Some(parent) = key.parent() {
			std::fs::create_dir_all(parent).map_err(|source| RegistryError::Io {
				path: parent.to_path_buf(),
				source,
			})?;
		}
		std::fs::write(&key, bytes).map_err(|source| RegistryError::Io {
			path: key.clone(),
			source,
		})?;
		tracing::debug!(path = %key.display(), "saved registry");
		self.cache.write().insert(key, Arc::new(registry.clone()));
		Ok(())
	}

	/// Drops the cached copy of `path`. Returns `true` if one was cached.
	pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
		self.cache.write().remove(&normalize(path.as_ref())).is_some()
	}

	pub fn clear(&self) {
		self.cache.write().clear();
	}

	pub fn cached_len(&self) -> usize {
		self.cache.read().len()
	}
}

/// Returns `<dir of context>/<package>/<component>.trls`.
pub fn component_path(context: &Path, address: &ComponentAddress) -> PathBuf {
	let dir = if context.is_dir() {
		context
	} else {
		context.parent().unwrap_or(Path::new(""))
	};
	dir.join(address.package_id())
		.join(format!("{}.{REGISTRY_EXTENSION}", address.component_id()))
}

/// Lexically normalizes `path`, then makes it absolute against the working directory.
fn normalize(path: &Path) -> PathBuf {
	let absolute = if path.is_absolute() {
		path.to_path_buf()
	} else {
		std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
	};
	let mut out = PathBuf::new();
	for component in absolute.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				out.pop();
			}
			other => out.push(other),
		}
	}
	out
}
