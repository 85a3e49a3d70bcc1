use pretty_assertions::assert_eq;
use trellis_compose::{ComposeError, Composer, ComposerConfig, LifecycleState};
use trellis_registry::RegistryElement;

use crate::common::{self, Named, Source, element, entries, new_log, tracer, registry};

fn eager_tracer(id: &str, peer: &str) -> RegistryElement {
	tracer(id).with_attribute("Eager", true).with_attribute("Peer", peer)
}

#[test]
fn test_hooks_run_once_per_instance() {
	let log = new_log();
	let composer = common::compose(registry([tracer("a")]), &log);

	composer.activate("a").unwrap();
	composer.activate("a").unwrap();
	composer.query::<dyn Named>("a").unwrap();
	assert_eq!(entries(&log), ["created:a#1"]);
}

#[test]
fn test_build_activates_in_registration_order() {
	let log = new_log();
	let composer = common::compose(registry([tracer("p1"), tracer("p2"), tracer("p3")]), &log);

	composer.build().unwrap();
	for id in ["p1", "p2", "p3"] {
		assert_eq!(composer.state(id), Some(LifecycleState::Active));
	}
	assert_eq!(entries(&log), ["created:p1#1", "created:p2#2", "created:p3#3"]);
}

#[test]
fn test_reset_tears_down_in_reverse_creation_order() {
	let log = new_log();
	let composer = common::compose(registry([tracer("p1"), tracer("p2"), tracer("p3")]), &log);
	composer.build().unwrap();
	log.lock().clear();

	composer.reset();
	assert_eq!(entries(&log), ["destroyed:p3#3", "destroyed:p2#2", "destroyed:p1#1"]);
	assert_eq!(composer.instances_len(), 0);
	assert_eq!(composer.state("p1"), Some(LifecycleState::Declared));
}

#[test]
fn test_factory_products_are_fresh_and_torn_down_first() {
	let log = new_log();
	let composer = common::compose(
		registry([element("owner", "Spawner").with_attribute("Name", "owner").with_attribute("Spawn", "template"), tracer("template")]),
		&log,
	);

	assert_eq!(composer.query::<dyn Named>("owner").unwrap().name(), "owner");
	assert_eq!(composer.instances_len(), 3);
	assert_eq!(composer.state("template"), Some(LifecycleState::Declared));

	assert!(composer.release("owner"));
	assert_eq!(
		entries(&log),
		[
			"created:owner#100",
			"created:template#1",
			"created:template#2",
			"destroyed:template#2",
			"destroyed:template#1",
			"destroyed:owner#100",
		]
	);
	assert_eq!(composer.instances_len(), 0);
}

#[test]
fn test_factory_products_are_not_memoized() {
	let log = new_log();
	let composer = common::compose(
		registry([element("owner", "Spawner").with_attribute("Name", "owner").with_attribute("Spawn", "template"), tracer("template")]),
		&log,
	);
	composer.activate("owner").unwrap();

	let shared = composer.query::<dyn Source>("template").unwrap();
	assert_eq!(shared.value().unwrap(), 3);
	assert_eq!(composer.instances_len(), 4);
}

fn spawner(id: &str, spawn: &str) -> RegistryElement {
	element(id, "Spawner").with_attribute("Name", id).with_attribute("Spawn", spawn)
}

#[test]
fn test_factory_spawning_itself_is_a_cycle() {
	let log = new_log();
	let composer = common::compose(registry([spawner("owner", "owner")]), &log);

	let result = composer.activate("owner");
	assert!(matches!(result, Err(ComposeError::CycleDetected { element }) if element == "owner"));
	assert_eq!(entries(&log), ["created:owner#100", "destroyed:owner#100"]);
	assert_eq!(composer.state("owner"), Some(LifecycleState::Declared));
	assert_eq!(composer.instances_len(), 0);
}

#[test]
fn test_factory_chain_back_to_owner_is_a_cycle() {
	let log = new_log();
	let composer = common::compose(registry([spawner("x", "y"), spawner("y", "x")]), &log);

	let result = composer.activate("x");
	assert!(matches!(result, Err(ComposeError::CycleDetected { element }) if element == "x"));
	assert_eq!(entries(&log), ["created:x#100", "created:y#101", "destroyed:y#101", "destroyed:x#100"]);
	assert_eq!(composer.instances_len(), 0);
}

#[test]
fn test_eager_mutual_references_are_a_cycle() {
	let log = new_log();
	let composer = common::compose(registry([eager_tracer("a", "b"), eager_tracer("b", "a")]), &log);

	let result = composer.activate("a");
	assert!(matches!(result, Err(ComposeError::CycleDetected { element }) if element == "a"));
	assert_eq!(entries(&log), ["created:a#1", "created:b#2", "destroyed:b#2", "destroyed:a#1"]);
	assert_eq!(composer.state("a"), Some(LifecycleState::Declared));
	assert_eq!(composer.state("b"), Some(LifecycleState::Declared));
	assert_eq!(composer.instances_len(), 0);
}

#[test]
fn test_eager_self_reference_is_a_cycle() {
	let log = new_log();
	let composer = common::compose(registry([eager_tracer("a", "a")]), &log);

	assert!(matches!(composer.activate("a"), Err(ComposeError::CycleDetected { element }) if element == "a"));
}

#[test]
fn test_lazy_mutual_references_are_allowed() {
	let log = new_log();
	let composer = common::compose(
		registry([tracer("a").with_attribute("Peer", "b"), tracer("b").with_attribute("Peer", "a")]),
		&log,
	);

	composer.build().unwrap();
	assert_eq!(composer.state("a"), Some(LifecycleState::Active));
	assert_eq!(composer.state("b"), Some(LifecycleState::Active));
}

#[test]
fn test_failure_after_successes_keeps_earlier_instances() {
	let log = new_log();
	let composer = common::compose(registry([tracer("ok"), element("broken", "Tracer")]), &log);

	assert!(matches!(composer.build(), Err(ComposeError::Binding { element, key, .. }) if element == "broken" && key == "Name"));
	assert_eq!(composer.state("ok"), Some(LifecycleState::Active));
	assert_eq!(composer.state("broken"), Some(LifecycleState::Declared));
}

#[test]
fn test_eager_config_builds_on_finish() {
	let log = new_log();
	let config: ComposerConfig = "eager = true".parse().unwrap();
	let composer = Composer::builder(registry([tracer("p1"), tracer("p2")]), common::catalog(&log))
		.config(config)
		.finish()
		.unwrap();

	assert_eq!(composer.instances_len(), 2);
	assert_eq!(entries(&log), ["created:p1#1", "created:p2#2"]);
}

#[test]
fn test_eager_config_reports_first_failure() {
	let log = new_log();
	let result = Composer::builder(registry([element("broken", "Tracer")]), common::catalog(&log))
		.config(ComposerConfig {
			eager: true,
			..ComposerConfig::default()
		})
		.finish();

	assert!(matches!(result, Err(ComposeError::Binding { .. })));
}

#[test]
fn test_max_depth_limits_nested_construction() {
	let log = new_log();
	let config = ComposerConfig {
		max_depth: Some(2),
		..ComposerConfig::default()
	};
	let elements = [eager_tracer("a", "b"), eager_tracer("b", "c"), tracer("c")];

	let limited = Composer::builder(registry(elements.clone()), common::catalog(&log))
		.config(config)
		.finish()
		.unwrap();
	let result = limited.activate("a");
	assert!(matches!(result, Err(ComposeError::DepthExceeded { element, limit: 2 }) if element == "c"));
	assert_eq!(limited.instances_len(), 0);

	let unlimited = common::compose(registry(elements), &log);
	unlimited.activate("a").unwrap();
	assert_eq!(unlimited.instances_len(), 3);
}

#[test]
fn test_drop_tears_down_instances() {
	let log = new_log();
	let composer = common::compose(registry([tracer("p1"), tracer("p2")]), &log);
	composer.build().unwrap();
	let clone = composer.clone();
	drop(composer);
	assert_eq!(entries(&log).len(), 2);

	drop(clone);
	assert_eq!(entries(&log), ["created:p1#1", "created:p2#2", "destroyed:p2#2", "destroyed:p1#1"]);
}

#[test]
fn test_drop_without_teardown_skips_hooks() {
	let log = new_log();
	let composer = Composer::builder(registry([tracer("p1")]), common::catalog(&log))
		.config(ComposerConfig {
			teardown_on_drop: false,
			..ComposerConfig::default()
		})
		.finish()
		.unwrap();
	composer.build().unwrap();
	drop(composer);

	assert_eq!(entries(&log), ["created:p1#1"]);
}
