use std::sync::{Arc, Barrier};
use std::thread;

use pretty_assertions::assert_eq;
use trellis_compose::Composer;
use trellis_registry::{AttrValue, SharedRegistry};

use crate::common::{self, Source, constant, entries, new_log, tracer, registry};

const THREADS: usize = 8;

#[test]
fn test_parallel_queries_share_one_instance() {
	let log = new_log();
	let composer = common::compose(registry([tracer("t")]), &log);
	let barrier = Barrier::new(THREADS);

	let results: Vec<Arc<dyn Source>> = thread::scope(|scope| {
		let handles: Vec<_> = (0..THREADS)
			.map(|_| {
				let composer = composer.clone();
				let barrier = &barrier;
				scope.spawn(move || {
					barrier.wait();
					composer.query::<dyn Source>("t").unwrap()
				})
			})
			.collect();
		handles.into_iter().map(|handle| handle.join().unwrap()).collect()
	});

	assert!(results.iter().all(|source| Arc::ptr_eq(source, &results[0])));
	assert_eq!(entries(&log), ["created:t#1"]);
	assert_eq!(composer.instances_len(), 1);
}

#[test]
fn test_snapshots_never_observe_half_applied_edits() {
	let shared = SharedRegistry::new(registry([constant("a", 0), constant("b", 0)]));
	let barrier = Barrier::new(THREADS + 1);

	thread::scope(|scope| {
		for _ in 0..THREADS {
			let shared = shared.clone();
			let barrier = &barrier;
			scope.spawn(move || {
				barrier.wait();
				for _ in 0..200 {
					let snapshot = shared.snapshot();
					let a = snapshot.element("a").unwrap().attribute("Value").cloned();
					let b = snapshot.element("b").unwrap().attribute("Value").cloned();
					assert_eq!(a, b);
				}
			});
		}
		barrier.wait();
		for value in 1..=200i64 {
			shared.with_mut(|registry| {
				registry.element_mut("a").unwrap().set_attribute("Value", value);
				registry.element_mut("b").unwrap().set_attribute("Value", value);
			});
		}
	});

	let log = new_log();
	let composer = Composer::new(shared.snapshot(), common::catalog(&log));
	assert_eq!(composer.query::<dyn Source>("a").unwrap().value().unwrap(), 200);
	assert_eq!(composer.query::<dyn Source>("b").unwrap().value().unwrap(), 200);
	assert_eq!(shared.with(|registry| registry.element("a").unwrap().attribute("Value").cloned()), Some(AttrValue::I64(200)));
}
