use std::sync::Arc;

use pretty_assertions::assert_eq;
use trellis_compose::{ComposeError, Composer};
use trellis_registry::{ComponentAddress, Registry, RegistryElement, RegistryStore, SharedRegistry};

use crate::common::{self, Source, constant, element, new_log, registry};

#[test]
fn test_loaded_registry_composes_like_the_original() {
	let log = new_log();
	let mut original = registry([
		constant("a", 2),
		constant("b", 3),
		element("sum", "Sum").with_attribute("Inputs", &["a", "b"][..]).with_attribute("Offset", 1i64),
	]);
	let mut pipeline = registry([constant("inner", 7)]);
	pipeline.set_element_interface_exported("inner", "Source", true);
	original.insert_embedded_registry("Pipeline", Arc::new(pipeline)).unwrap();
	original
		.insert_element(RegistryElement::new("pipe", ComponentAddress::new("", "Pipeline")))
		.unwrap();

	let loaded = Registry::from_bytes(&original.to_bytes().unwrap()).unwrap();
	assert_eq!(loaded, original);

	let composer = common::compose(loaded, &log);
	assert_eq!(composer.query::<dyn Source>("sum").unwrap().value().unwrap(), 6);
	assert_eq!(composer.query::<dyn Source>("pipe").unwrap().value().unwrap(), 7);
}

#[test]
fn test_packaged_composite_loads_from_store() {
	let log = new_log();
	let dir = tempfile::tempdir().unwrap();
	let store = Arc::new(RegistryStore::new());

	let mut filter = registry([constant("gain", 11)]);
	filter.set_element_interface_exported("gain", "Source", true);
	store.save(dir.path().join("audio").join("Filter.trls"), &filter).unwrap();
	store.clear();

	let root = registry([RegistryElement::new("filter", ComponentAddress::new("audio", "Filter"))]);
	let composer = Composer::builder(root, common::catalog(&log))
		.store(Arc::clone(&store), dir.path().join("app.trls"))
		.finish()
		.unwrap();

	assert_eq!(composer.query::<dyn Source>("filter").unwrap().value().unwrap(), 11);
	assert_eq!(composer.query::<dyn Source>("filter.gain").unwrap().value().unwrap(), 11);
	assert_eq!(store.cached_len(), 1);
}

#[test]
fn test_missing_package_file_is_unknown_component() {
	let log = new_log();
	let dir = tempfile::tempdir().unwrap();
	let root = registry([RegistryElement::new("filter", ComponentAddress::new("audio", "Filter"))]);
	let composer = Composer::builder(root, common::catalog(&log))
		.store(Arc::new(RegistryStore::new()), dir.path())
		.finish()
		.unwrap();

	assert!(matches!(
		composer.activate("filter"),
		Err(ComposeError::UnknownComponent { element, .. }) if element == "filter"
	));
}

#[test]
fn test_corrupt_package_file_is_reported() {
	let log = new_log();
	let dir = tempfile::tempdir().unwrap();
	std::fs::create_dir_all(dir.path().join("audio")).unwrap();
	std::fs::write(dir.path().join("audio").join("Filter.trls"), b"not a registry").unwrap();

	let root = registry([RegistryElement::new("filter", ComponentAddress::new("audio", "Filter"))]);
	let composer = Composer::builder(root, common::catalog(&log))
		.store(Arc::new(RegistryStore::new()), dir.path())
		.finish()
		.unwrap();

	assert!(matches!(composer.activate("filter"), Err(ComposeError::Registry(_))));
}

#[test]
fn test_composer_keeps_its_snapshot() {
	let log = new_log();
	let shared = SharedRegistry::new(registry([constant("base", 1)]));
	let composer = Composer::new(shared.snapshot(), common::catalog(&log));

	shared.with_mut(|registry| {
		registry.element_mut("base").unwrap().set_attribute("Value", 2i64);
	});

	assert_eq!(composer.query::<dyn Source>("base").unwrap().value().unwrap(), 1);
	let refreshed = Composer::new(shared.snapshot(), common::catalog(&log));
	assert_eq!(refreshed.query::<dyn Source>("base").unwrap().value().unwrap(), 2);
}
