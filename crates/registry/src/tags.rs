//! Archive tags of the persisted registry layout.

use trellis_archive::ArchiveTag;

pub const REGISTRY: ArchiveTag = ArchiveTag::new("Registry", "Registry of elements");
pub const ELEMENTS: ArchiveTag = ArchiveTag::new("Elements", "List of registry elements");
pub const ELEMENT: ArchiveTag = ArchiveTag::new("Element", "One registry element");
pub const ID: ArchiveTag = ArchiveTag::new("Id", "Element id");
pub const ADDRESS: ArchiveTag = ArchiveTag::new("Address", "Component address");
pub const PACKAGE_ID: ArchiveTag = ArchiveTag::new("PackageId", "Package part of a component address");
pub const COMPONENT_ID: ArchiveTag = ArchiveTag::new("ComponentId", "Component part of a component address");
pub const EXPORTED_INTERFACES: ArchiveTag = ArchiveTag::new("ExportedInterfaces", "Interface export flags");
pub const INTERFACE: ArchiveTag = ArchiveTag::new("Interface", "One interface export flag");
pub const NAME: ArchiveTag = ArchiveTag::new("Name", "Name of an interface, attribute or embedded registry");
pub const EXPORTED: ArchiveTag = ArchiveTag::new("Exported", "Interface export state");
pub const ATTRIBUTES: ArchiveTag = ArchiveTag::new("Attributes", "Element attribute bag");
pub const ATTRIBUTE: ArchiveTag = ArchiveTag::new("Attribute", "One named attribute");
pub const TYPE: ArchiveTag = ArchiveTag::new("Type", "Kind code of an attribute value");
pub const VALUE: ArchiveTag = ArchiveTag::new("Value", "Typed attribute value");
pub const EMBEDDED_REGISTRIES: ArchiveTag = ArchiveTag::new("EmbeddedRegistries", "Named nested registries");
pub const EMBEDDED_REGISTRY: ArchiveTag = ArchiveTag::new("EmbeddedRegistry", "One named nested registry");
pub const EXPORTED_COMPONENTS: ArchiveTag = ArchiveTag::new("ExportedComponents", "Exported sub-components");
pub const EXPORTED_COMPONENT: ArchiveTag = ArchiveTag::new("ExportedComponent", "One exported sub-component");
pub const EXPORT_ID: ArchiveTag = ArchiveTag::new("ExportId", "Public id of an exported sub-component");
pub const ELEMENT_ID: ArchiveTag = ArchiveTag::new("ElementId", "Element behind an exported sub-component");
pub const DESCRIPTION: ArchiveTag = ArchiveTag::new("Description", "Human readable registry description");
pub const KEYWORDS: ArchiveTag = ArchiveTag::new("Keywords", "Registry search keywords");
