//! Ordered element collection with named embedded registries.
//!
//! # Role
//!
//! A [`Registry`] is the persisted configuration of one composition scope.
//! Element insertion order is the deterministic instantiation order.
//! Embedded registries are held as shared [`Arc`] handles so a parsed
//! sub-registry can be hosted by several parents; mutating one through its
//! host clones it first.
//!
//! # Invariants
//!
//! - Element ids are unique within one registry (embedded registries are
//!   separate id spaces).
//! - Embedded names are unique within one host.
//! - Element and embedded counts are independent.

use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use trellis_archive::{Archive, ArchiveError, ArchiveExt, MemoryArchive};

use crate::element::RegistryElement;
use crate::error::RegistryError;
use crate::tags;


/// A registry of element declarations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
	elements: IndexMap<String, RegistryElement>,
	embedded: IndexMap<String, Arc<Registry>>,
	exported_components: IndexMap<String, String>,
	description: String,
	keywords: String,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends an element.
	///
	/// Fails with [`RegistryError::DuplicateId`] if the id is taken; the
	/// existing element is left untouched.
	pub fn insert_element(&mut self, element: RegistryElement) -> Result<&mut RegistryElement, RegistryError> {
		match self.elements.entry(element.id().to_string()) {
			Entry::Occupied(slot) => Err(RegistryError::DuplicateId { id: slot.key().clone() }),
			Entry::Vacant(slot) => {
				tracing::trace!(element = %slot.key(), "inserted element");
				Ok(slot.insert(element))
			}
		}
	}

	/// Looks up an element by id in this registry only.
	pub fn element(&self, id: &str) -> Option<&RegistryElement> {
		self.elements.get(id)
	}

	pub fn element_mut(&mut self, id: &str) -> Option<&mut RegistryElement> {
		self.elements.get_mut(id)
	}

	/// Returns the position of an element in instantiation order.
	pub fn element_index(&self, id: &str) -> Option<usize> {
		self.elements.get_index_of(id)
	}

	/// Removes an element, preserving the order of the others.
	///
	/// Elements referencing the removed id are not touched.
	pub fn remove_element(&mut self, id: &str) -> Option<RegistryElement> {
		let removed = self.elements.shift_remove(id);
		if removed.is_some() {
			tracing::trace!(element = %id, "removed element");
		}
		removed
	}

	/// Changes an element's id in place.
	///
	/// Position and attributes are kept. References to `old` elsewhere,
	/// including exported component entries, are not rewritten.
	pub fn rename_element(&mut self, old: &str, new: &str) -> Result<(), RegistryError> {
		if !self.elements.contains_key(old) {
			return Err(RegistryError::NotFound { id: old.to_string() });
		}
		if old == new {
			return Ok(());
		}
		if self.elements.contains_key(new) {
			return Err(RegistryError::DuplicateId { id: new.to_string() });
		}
		let Some((index, _, mut element)) = self.elements.shift_remove_full(old) else {
			return Err(RegistryError::NotFound { id: old.to_string() });
		};
		element.set_id(new);
		self.elements.shift_insert(index, new.to_string(), element);
		tracing::debug!(from = %old, to = %new, "renamed element");
		Ok(())
	}

	pub fn elements_len(&self) -> usize {
		self.elements.len()
	}

	/// Iterates element ids in instantiation order.
	pub fn element_ids(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
		self.elements.keys().map(String::as_str)
	}

	/// Iterates elements in instantiation order.
	pub fn elements(&self) -> impl ExactSizeIterator<Item = &RegistryElement> + '_ {
		self.elements.values()
	}

	/// Hosts `registry` under `name`.
	pub fn insert_embedded_registry(&mut self, name: impl Into<String>, registry: Arc<Registry>) -> Result<(), RegistryError> {
		match self.embedded.entry(name.into()) {
			Entry::Occupied(slot) => Err(RegistryError::DuplicateEmbedded { name: slot.key().clone() }),
			Entry::Vacant(slot) => {
				tracing::trace!(embedded = %slot.key(), "inserted embedded registry");
				slot.insert(registry);
				Ok(())
			}
		}
	}

	pub fn embedded_registry(&self, name: &str) -> Option<&Arc<Registry>> {
		self.embedded.get(name)
	}

	/// Returns an embedded registry for mutation, cloning it if it is shared.
	pub fn embedded_registry_mut(&mut self, name: &str) -> Option<&mut Registry> {
		self.embedded.get_mut(name).map(Arc::make_mut)
	}

	pub fn remove_embedded_registry(&mut self, name: &str) -> Option<Arc<Registry>> {
		self.embedded.shift_remove(name)
	}

	pub fn embedded_registries_len(&self) -> usize {
		self.embedded.len()
	}

	/// Iterates embedded registries with their names, in insertion order.
	pub fn embedded_registries(&self) -> impl ExactSizeIterator<Item = (&str, &Arc<Registry>)> + '_ {
		self.embedded.iter().map(|(name, registry)| (name.as_str(), registry))
	}

	/// Sets an interface export flag on one element. Returns `false` if the element is missing.
	pub fn set_element_interface_exported(&mut self, id: &str, tag: &str, exported: bool) -> bool {
		match self.elements.get_mut(id) {
			Some(element) => {
				element.set_interface_exported(tag, exported);
				true
			}
			None => false,
		}
	}

	/// Maps each exported interface tag to the first element exporting it.
	pub fn exported_interfaces(&self) -> IndexMap<&str, &str> {
		let mut out = IndexMap::new();
		for element in self.elements.values() {
			for tag in element.exported_interfaces() {
				out.entry(tag).or_insert(element.id());
			}
		}
		out
	}

	/// Returns the element exporting `tag`, if any.
	pub fn interface_exporter(&self, tag: &str) -> Option<&RegistryElement> {
		self.elements.values().find(|element| element.is_interface_exported(tag))
	}

	/// Publishes `element_id` as a sub-component under `export_id`.
	///
	/// Returns the element previously exported under that id.
	pub fn set_element_exported(&mut self, export_id: impl Into<String>, element_id: impl Into<String>) -> Option<String> {
		self.exported_components.insert(export_id.into(), element_id.into())
	}

	pub fn remove_exported_component(&mut self, export_id: &str) -> Option<String> {
		self.exported_components.shift_remove(export_id)
	}

	/// Returns the element id behind an exported sub-component.
	pub fn exported_component(&self, export_id: &str) -> Option<&str> {
		self.exported_components.get(export_id).map(String::as_str)
	}

	/// Iterates `(export id, element id)` pairs in insertion order.
	pub fn exported_components(&self) -> impl ExactSizeIterator<Item = (&str, &str)> + '_ {
		self.exported_components.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn set_description(&mut self, description: impl Into<String>) {
		self.description = description.into();
	}

	pub fn keywords(&self) -> &str {
		&self.keywords
	}

	pub fn set_keywords(&mut self, keywords: impl Into<String>) {
		self.keywords = keywords.into();
	}

	/// Removes every element, embedded registry and export; clears metadata.
	pub fn clear(&mut self) {
		self.elements.clear();
		self.embedded.clear();
		self.exported_components.clear();
		self.description.clear();
		self.keywords.clear();
	}

	/// Stores or loads the whole registry.
	///
	/// Loading clears `self` first. Duplicate element ids or embedded names in
	/// the archive fail with [`ArchiveError::InvalidValue`].
	pub fn serialize<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<(), ArchiveError> {
		if archive.is_storing() {
			return self.store(archive);
		}
		self.clear();
		archive.tagged(&tags::REGISTRY, |archive| {
			self.load_elements(archive)?;
			self.load_embedded(archive)?;
			self.load_exports(archive)?;
			archive.process_tagged(&tags::DESCRIPTION, &mut self.description)?;
			archive.process_tagged(&tags::KEYWORDS, &mut self.keywords)
		})
	}

	/// Writes the registry into a storing archive.
	///
	/// Embedded registries are written through their shared handles; only
	/// leaf values are copied.
	pub fn store<A: Archive + ?Sized>(&self, archive: &mut A) -> Result<(), ArchiveError> {
		archive.tagged(&tags::REGISTRY, |archive| {
			let elements: Vec<&RegistryElement> = self.elements.values().collect();
			let mut count = elements.len();
			archive.multi_tagged(&tags::ELEMENTS, &tags::ELEMENT, &mut count, |archive, index| {
				let mut element = elements[index].clone();
				archive.tagged(&tags::ELEMENT, |archive| element.serialize(archive))
			})?;

			let embedded: Vec<(&String, &Arc<Registry>)> = self.embedded.iter().collect();
			let mut count = embedded.len();
			archive.multi_tagged(&tags::EMBEDDED_REGISTRIES, &tags::EMBEDDED_REGISTRY, &mut count, |archive, index| {
				let (name, registry) = embedded[index];
				archive.tagged(&tags::EMBEDDED_REGISTRY, |archive| {
					archive.process_tagged(&tags::NAME, &mut name.clone())?;
					registry.store(archive)
				})
			})?;

			let exports: Vec<(&String, &String)> = self.exported_components.iter().collect();
			let mut count = exports.len();
			archive.multi_tagged(&tags::EXPORTED_COMPONENTS, &tags::EXPORTED_COMPONENT, &mut count, |archive, index| {
				let (export_id, element_id) = exports[index];
				archive.tagged(&tags::EXPORTED_COMPONENT, |archive| {
					archive.process_tagged(&tags::EXPORT_ID, &mut export_id.clone())?;
					archive.process_tagged(&tags::ELEMENT_ID, &mut element_id.clone())
				})
			})?;

			archive.process_tagged(&tags::DESCRIPTION, &mut self.description.clone())?;
			archive.process_tagged(&tags::KEYWORDS, &mut self.keywords.clone())
		})
	}

	fn load_elements<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<(), ArchiveError> {
		let mut count = 0;
		archive.multi_tagged(&tags::ELEMENTS, &tags::ELEMENT, &mut count, |archive, _| {
			let mut element = RegistryElement::default();
			archive.tagged(&tags::ELEMENT, |archive| element.serialize(archive))?;
			self.insert_element(element).map(|_| ()).map_err(|err| ArchiveError::InvalidValue {
				what: "registry element",
				found: err.to_string(),
			})
		})
	}

	fn load_embedded<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<(), ArchiveError> {
		let mut count = 0;
		archive.multi_tagged(&tags::EMBEDDED_REGISTRIES, &tags::EMBEDDED_REGISTRY, &mut count, |archive, _| {
			let mut name = String::new();
			let mut registry = Registry::default();
			archive.tagged(&tags::EMBEDDED_REGISTRY, |archive| {
				archive.process_tagged(&tags::NAME, &mut name)?;
				registry.serialize(archive)
			})?;
			self.insert_embedded_registry(name, Arc::new(registry))
				.map_err(|err| ArchiveError::InvalidValue {
					what: "embedded registry",
					found: err.to_string(),
				})
		})
	}

	fn load_exports<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<(), ArchiveError> {
		let mut count = 0;
		archive.multi_tagged(&tags::EXPORTED_COMPONENTS, &tags::EXPORTED_COMPONENT, &mut count, |archive, _| {
			let mut export_id = String::new();
			let mut element_id = String::new();
			archive.tagged(&tags::EXPORTED_COMPONENT, |archive| {
				archive.process_tagged(&tags::EXPORT_ID, &mut export_id)?;
				archive.process_tagged(&tags::ELEMENT_ID, &mut element_id)
			})?;
			self.exported_components.insert(export_id, element_id);
			Ok(())
		})
	}

	/// Encodes the registry as a framed blob.
	pub fn to_bytes(&self) -> Result<Vec<u8>, RegistryError> {
		let mut archive = MemoryArchive::new();
		self.store(&mut archive)?;
		Ok(archive.to_bytes()?)
	}

	/// Decodes a registry from a blob produced by [`Registry::to_bytes`].
	pub fn from_bytes(bytes: &[u8]) -> Result<Self, RegistryError> {
		let mut archive = MemoryArchive::from_bytes(bytes)?;
		let mut registry = Registry::new();
		registry.serialize(&mut archive)?;
		Ok(registry)
	}
}
