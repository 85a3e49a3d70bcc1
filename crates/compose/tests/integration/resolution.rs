use std::sync::Arc;

use pretty_assertions::assert_eq;
use rstest::rstest;
use trellis_compose::{ComposeError, LifecycleState};
use trellis_registry::{ComponentAddress, RegistryElement};

use crate::common::{self, Named, Source, constant, element, new_log, registry};

fn scale(id: &str, input: &str, factor: i64) -> RegistryElement {
	element(id, "Scale").with_attribute("Input", input).with_attribute("Factor", factor)
}

#[test]
fn test_shared_target_constructed_once() {
	let log = new_log();
	let composer = common::compose(
		registry([constant("base", 5), scale("double", "base", 2), scale("triple", "base", 3)]),
		&log,
	);

	assert_eq!(composer.query::<dyn Source>("double").unwrap().value().unwrap(), 10);
	assert_eq!(composer.query::<dyn Source>("triple").unwrap().value().unwrap(), 15);
	assert_eq!(composer.instances_len(), 3);

	let first = composer.query::<dyn Source>("base").unwrap();
	let second = composer.query::<dyn Source>("base").unwrap();
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(composer.instances_len(), 3);
}

#[test]
fn test_references_resolve_lazily() {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 5), scale("double", "base", 2)]), &log);

	let double = composer.query::<dyn Source>("double").unwrap();
	assert_eq!(composer.state("base"), Some(LifecycleState::Declared));
	assert_eq!(double.value().unwrap(), 10);
	assert_eq!(composer.state("base"), Some(LifecycleState::Active));
}

#[test]
fn test_optional_reference_absent_is_none() {
	let log = new_log();
	let composer = common::compose(
		registry([
			constant("base", 4),
			element("scaled", "Scale")
				.with_attribute("Input", "base")
				.with_attribute("Factor", 1i64)
				.with_attribute("Bias", "missing"),
			scale("biased", "base", 2).with_attribute("Bias", "base"),
		]),
		&log,
	);

	let scaled = composer.query::<dyn Source>("scaled").unwrap();
	assert_eq!(scaled.value().unwrap(), 4);
	assert_eq!(composer.query::<dyn Source>("biased").unwrap().value().unwrap(), 12);
	assert_eq!(composer.query_optional::<dyn Source>("missing").unwrap().map(|_| ()), None);
}

#[test]
fn test_mandatory_reference_missing_is_not_found() {
	let log = new_log();
	let composer = common::compose(registry([scale("scaled", "ghost", 2)]), &log);

	let scaled = composer.query::<dyn Source>("scaled").unwrap();
	assert!(matches!(scaled.value(), Err(ComposeError::NotFound { name }) if name == "ghost"));
}

#[test]
fn test_query_unknown_name() {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 1)]), &log);

	assert!(matches!(composer.query::<dyn Source>("nope"), Err(ComposeError::NotFound { name }) if name == "nope"));
	assert!(composer.query_optional::<dyn Source>("nope").unwrap().is_none());
	assert!(matches!(composer.activate("nope"), Err(ComposeError::NotFound { .. })));
	assert_eq!(composer.state("nope"), None);
}

#[test]
fn test_missing_capability_is_type_mismatch() {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 1)]), &log);

	let result = composer.query::<dyn Named>("base");
	assert!(matches!(
		result,
		Err(ComposeError::TypeMismatch { element, capability: "Named" }) if element == "base"
	));
	assert_eq!(composer.state("base"), Some(LifecycleState::Active));
}

#[test]
fn test_multi_reference_keeps_declaration_order() {
	let log = new_log();
	let composer = common::compose(
		registry([
			common::tracer("first"),
			common::tracer("second"),
			element("sum", "Sum").with_attribute("Inputs", &["second", "first"][..]),
		]),
		&log,
	);

	assert_eq!(composer.query::<dyn Source>("sum").unwrap().value().unwrap(), 3);
	assert_eq!(common::entries(&log), ["created:second#1", "created:first#2"]);
}

#[test]
fn test_optional_multi_reference_skips_absent_targets() {
	let log = new_log();
	let composer = common::compose(
		registry([
			constant("a", 1),
			constant("b", 2),
			element("loose", "LooseSum").with_attribute("Inputs", &["a", "ghost", "b"][..]),
			element("strict", "Sum").with_attribute("Inputs", &["a", "ghost", "b"][..]),
		]),
		&log,
	);

	assert_eq!(composer.query::<dyn Source>("loose").unwrap().value().unwrap(), 103);
	let strict = composer.query::<dyn Source>("strict").unwrap();
	assert!(matches!(strict.value(), Err(ComposeError::NotFound { name }) if name == "ghost"));
}

#[test]
fn test_inherited_attribute_applies() {
	let log = new_log();
	let composer = common::compose(
		registry([
			constant("a", 1),
			element("sum", "Sum").with_attribute("Inputs", "a").with_attribute("Offset", 10i64),
		]),
		&log,
	);

	assert_eq!(composer.query::<dyn Source>("sum").unwrap().value().unwrap(), 11);
}

#[rstest]
#[case::required_attribute_missing(element("scaled", "Scale").with_attribute("Input", "base"), "Factor")]
#[case::attribute_mistyped(scale("scaled", "base", 1).with_attribute("Factor", "two"), "Factor")]
#[case::reference_not_a_name(element("scaled", "Scale").with_attribute("Input", 5i64).with_attribute("Factor", 1i64), "Input")]
#[case::required_reference_unset(element("scaled", "Scale").with_attribute("Factor", 1i64), "Input")]
#[case::single_reference_with_many_targets(scale("scaled", "base", 1).with_attribute("Input", &["base", "base"][..]), "Input")]
fn test_binding_errors(#[case] scaled: RegistryElement, #[case] expected_key: &str) {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 1), scaled]), &log);

	let result = composer.query::<dyn Source>("scaled");
	assert!(matches!(
		result,
		Err(ComposeError::Binding { element, key, .. }) if element == "scaled" && key == expected_key
	));
	assert_eq!(composer.state("scaled"), Some(LifecycleState::Declared));
	assert_eq!(composer.instances_len(), 0);
}

#[test]
fn test_unknown_component() {
	let log = new_log();
	let composer = common::compose(registry([element("odd", "Nope")]), &log);

	assert!(matches!(
		composer.activate("odd"),
		Err(ComposeError::UnknownComponent { element, address }) if element == "odd" && address == ComponentAddress::new("test", "Nope")
	));
}

#[test]
fn test_release_returns_to_declared() {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 1)]), &log);

	assert_eq!(composer.state("base"), Some(LifecycleState::Declared));
	assert!(!composer.release("base"));
	composer.activate("base").unwrap();
	assert_eq!(composer.state("base"), Some(LifecycleState::Active));

	let generation = composer.generation();
	assert!(composer.release("base"));
	assert_eq!(composer.state("base"), Some(LifecycleState::Declared));
	assert!(composer.generation() > generation);
	assert!(!composer.release("base"));
}

#[test]
fn test_reset_invalidates_held_references() {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 5), scale("double", "base", 2)]), &log);

	let double = composer.query::<dyn Source>("double").unwrap();
	assert_eq!(double.value().unwrap(), 10);
	composer.reset();

	assert_eq!(composer.instances_len(), 0);
	assert!(matches!(double.value(), Err(ComposeError::Destroyed { element }) if element == "double"));

	let rebuilt = composer.query::<dyn Source>("double").unwrap();
	assert!(!Arc::ptr_eq(&rebuilt, &double));
	assert_eq!(rebuilt.value().unwrap(), 10);
}

#[test]
fn test_released_target_is_rebuilt_for_live_dependents() {
	let log = new_log();
	let composer = common::compose(registry([common::tracer("target"), element("sum", "Sum").with_attribute("Inputs", "target")]), &log);

	let sum = composer.query::<dyn Source>("sum").unwrap();
	assert_eq!(sum.value().unwrap(), 1);
	assert!(composer.release("target"));
	assert_eq!(sum.value().unwrap(), 2);
	assert_eq!(
		common::entries(&log),
		["created:target#1", "destroyed:target#1", "created:target#2"]
	);
}

#[test]
fn test_dropped_composer_fails_resolution() {
	let log = new_log();
	let composer = common::compose(registry([constant("base", 5), scale("double", "base", 2)]), &log);
	let double = composer.query::<dyn Source>("double").unwrap();
	drop(composer);

	assert!(matches!(double.value(), Err(ComposeError::Destroyed { .. })));
}
