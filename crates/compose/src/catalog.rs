//! Address-keyed table of component classes.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use trellis_registry::ComponentAddress;

use crate::class::{ClassObject, ComponentClass};
use crate::component::Component;
use crate::error::ComposeError;

/// Maps component addresses to the classes that instantiate them.
#[derive(Default)]
pub struct Catalog {
	classes: FxHashMap<ComponentAddress, Arc<dyn ClassObject>>,
}

impl Catalog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `class` under its address.
	///
	/// Fails with [`ComposeError::DuplicateId`] if the address is taken.
	pub fn register<T: Component>(&mut self, class: ComponentClass<T>) -> Result<(), ComposeError> {
		let address = class.address().clone();
		if self.classes.contains_key(&address) {
			return Err(ComposeError::DuplicateId { id: address.to_string() });
		}
		tracing::trace!(class = %address, "registered component class");
		self.classes.insert(address, Arc::new(class));
		Ok(())
	}

	/// Builder form of [`Catalog::register`].
	pub fn with<T: Component>(mut self, class: ComponentClass<T>) -> Result<Self, ComposeError> {
		self.register(class)?;
		Ok(self)
	}

	pub fn contains(&self, address: &ComponentAddress) -> bool {
		self.classes.contains_key(address)
	}

	pub fn len(&self) -> usize {
		self.classes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.classes.is_empty()
	}

	/// Iterates registered addresses in unspecified order.
	pub fn addresses(&self) -> impl Iterator<Item = &ComponentAddress> + '_ {
		self.classes.keys()
	}

	pub(crate) fn get(&self, address: &ComponentAddress) -> Option<Arc<dyn ClassObject>> {
		self.classes.get(address).cloned()
	}
}

impl std::fmt::Debug for Catalog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut addresses: Vec<_> = self.classes.values().map(|class| class.address().to_string()).collect();
		addresses.sort();
		f.debug_struct("Catalog").field("classes", &addresses).finish()
	}
}
