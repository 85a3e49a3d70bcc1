//! Capability tags and per-instance capability tables.

use std::any::Any;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// A queryable interface of a component.
///
/// Usually implemented for a trait object, e.g. `dyn Producer`, with the
/// [`capability!`](crate::capability!) macro. The tag is the name used in
/// registry interface export flags.
pub trait Capability: Send + Sync + 'static {
	const TAG: &'static str;
}

/// Implements [`Capability`] for a type with the given tag.
///
/// ```ignore
/// trait Producer: Send + Sync {
///     fn produce(&self) -> u32;
/// }
/// trellis_compose::capability!(dyn Producer => "Producer");
/// ```
#[macro_export]
macro_rules! capability {
	($ty:ty => $tag:literal) => {
		impl $crate::Capability for $ty {
			const TAG: &'static str = $tag;
		}
	};
}

/// Capability objects registered by one live instance, keyed by tag.
#[derive(Default)]
pub(crate) struct Capabilities {
	entries: FxHashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl Capabilities {
	pub(crate) fn insert<C: Capability + ?Sized>(&mut self, value: Arc<C>) {
		self.entries.insert(C::TAG, Box::new(value));
	}

	/// Returns the capability registered under `C::TAG`.
	///
	/// A different type registered under the same tag yields `None`.
	pub(crate) fn get<C: Capability + ?Sized>(&self) -> Option<Arc<C>> {
		self.entries.get(C::TAG)?.downcast_ref::<Arc<C>>().cloned()
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}
}

impl std::fmt::Debug for Capabilities {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_set().entries(self.entries.keys()).finish()
	}
}
