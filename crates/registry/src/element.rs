//! One declared unit of a registry.

use indexmap::IndexMap;
use trellis_archive::{Archive, ArchiveError, ArchiveExt, Result};

use crate::address::ComponentAddress;
use crate::tags;
use crate::value::AttrValue;

/// An element declaration: id, component address, attribute bag and
/// interface export flags.
///
/// Attribute and interface maps keep insertion order, which is also the
/// persisted order. Values are not validated against any class here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistryElement {
	id: String,
	address: ComponentAddress,
	attributes: IndexMap<String, AttrValue>,
	interfaces: IndexMap<String, bool>,
}

impl RegistryElement {
	/// Creates an element with an id and component address and no attributes.
	pub fn new(id: impl Into<String>, address: ComponentAddress) -> Self {
		Self {
			id: id.into(),
			address,
			..Self::default()
		}
	}

	/// Builder form of [`RegistryElement::set_attribute`].
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.set_attribute(key, value);
		self
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn set_id(&mut self, id: impl Into<String>) {
		self.id = id.into();
	}

	pub fn address(&self) -> &ComponentAddress {
		&self.address
	}

	pub fn set_address(&mut self, address: ComponentAddress) {
		self.address = address;
	}

	/// Inserts or replaces an attribute. A replaced key keeps its position.
	pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
		self.attributes.insert(key.into(), value.into());
	}

	pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
		self.attributes.get(key)
	}

	/// Returns the attribute value, or `default` if unset.
	pub fn attribute_or<'a>(&'a self, key: &str, default: &'a AttrValue) -> &'a AttrValue {
		self.attributes.get(key).unwrap_or(default)
	}

	/// Removes an attribute, keeping the order of the remaining ones.
	pub fn remove_attribute(&mut self, key: &str) -> Option<AttrValue> {
		self.attributes.shift_remove(key)
	}

	/// Iterates attributes in insertion order.
	pub fn attributes(&self) -> impl ExactSizeIterator<Item = (&str, &AttrValue)> + '_ {
		self.attributes.iter().map(|(k, v)| (k.as_str(), v))
	}

	pub fn set_interface_exported(&mut self, tag: impl Into<String>, exported: bool) {
		self.interfaces.insert(tag.into(), exported);
	}

	pub fn is_interface_exported(&self, tag: &str) -> bool {
		self.interfaces.get(tag).copied().unwrap_or(false)
	}

	/// Iterates the tags whose export flag is set.
	pub fn exported_interfaces(&self) -> impl Iterator<Item = &str> + '_ {
		self.interfaces
			.iter()
			.filter(|(_, exported)| **exported)
			.map(|(tag, _)| tag.as_str())
	}

	/// Stores or loads the element body.
	///
	/// Loading replaces every field of `self`. Repeated attribute or interface
	/// names in the archive fail with [`ArchiveError::InvalidValue`].
	pub fn serialize<A: Archive + ?Sized>(&mut self, archive: &mut A) -> Result<()> {
		archive.process_tagged(&tags::ID, &mut self.id)?;
		self.address.serialize(archive)?;

		let storing = archive.is_storing();
		let mut interfaces: Vec<(String, bool)> = if storing {
			self.interfaces.iter().map(|(k, v)| (k.clone(), *v)).collect()
		} else {
			Vec::new()
		};
		let mut count = interfaces.len();
		archive.multi_tagged(&tags::EXPORTED_INTERFACES, &tags::INTERFACE, &mut count, |archive, index| {
			if !storing {
				interfaces.push((String::new(), false));
			}
			let (name, exported) = &mut interfaces[index];
			archive.tagged(&tags::INTERFACE, |archive| {
				archive.process_tagged(&tags::NAME, name)?;
				archive.process_tagged(&tags::EXPORTED, exported)
			})
		})?;

		let mut attributes: Vec<(String, AttrValue)> = if storing {
			self.attributes.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
		} else {
			Vec::new()
		};
		let mut count = attributes.len();
		archive.multi_tagged(&tags::ATTRIBUTES, &tags::ATTRIBUTE, &mut count, |archive, index| {
			if !storing {
				attributes.push((String::new(), AttrValue::Bool(false)));
			}
			let (name, value) = &mut attributes[index];
			archive.tagged(&tags::ATTRIBUTE, |archive| {
				archive.process_tagged(&tags::NAME, name)?;
				value.serialize(archive)
			})
		})?;

		if !storing {
			self.interfaces = unique_entries(interfaces, "element interface")?;
			self.attributes = unique_entries(attributes, "element attribute")?;
		}
		Ok(())
	}
}

fn unique_entries<V>(entries: Vec<(String, V)>, what: &'static str) -> Result<IndexMap<String, V>> {
	let mut map = IndexMap::with_capacity(entries.len());
	for (key, value) in entries {
		if map.contains_key(&key) {
			return Err(ArchiveError::InvalidValue { what, found: key });
		}
		map.insert(key, value);
	}
	Ok(map)
}
