//! Single-writer, multi-reader registry handle.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::registry::Registry;

/// Shared, lock-protected registry.
///
/// Readers and writers go through a [`parking_lot::RwLock`]. Resolution
/// passes take a [`snapshot`](SharedRegistry::snapshot) instead of holding a
/// read guard: the snapshot is an `Arc` of the current registry, and a later
/// write clones the registry only while such snapshots are alive.
#[derive(Clone, Default)]
pub struct SharedRegistry(Arc<RwLock<Arc<Registry>>>);

impl SharedRegistry {
	pub fn new(registry: Registry) -> Self {
		Self(Arc::new(RwLock::new(Arc::new(registry))))
	}

	/// Runs `f` with shared access to the registry.
	pub fn with<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
		let guard = self.0.read();
		f(&guard)
	}

	/// Runs `f` with exclusive access to the registry.
	pub fn with_mut<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
		let mut guard = self.0.write();
		f(Arc::make_mut(&mut guard))
	}

	/// Returns the current registry; unaffected by later writes.
	pub fn snapshot(&self) -> Arc<Registry> {
		Arc::clone(&self.0.read())
	}

	/// Replaces the registry wholesale.
	pub fn replace(&self, registry: Registry) -> Arc<Registry> {
		std::mem::replace(&mut *self.0.write(), Arc::new(registry))
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl std::fmt::Debug for SharedRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.with(|registry| f.debug_tuple("SharedRegistry").field(registry).finish())
	}
}

impl From<Registry> for SharedRegistry {
	fn from(registry: Registry) -> Self {
		Self::new(registry)
	}
}
