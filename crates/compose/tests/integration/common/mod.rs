//! Component fixtures shared by the composer integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use trellis_compose::{
	Attribute, Catalog, Component, ComponentClass, ComponentContext, ComposeError, Composer, Factory, MultiReference, Reference,
};
use trellis_registry::{ComponentAddress, Registry, RegistryElement};

pub trait Source: Send + Sync {
	fn value(&self) -> Result<i64, ComposeError>;
}
trellis_compose::capability!(dyn Source => "Source");

pub trait Named: Send + Sync {
	fn name(&self) -> String;
}
trellis_compose::capability!(dyn Named => "Named");

#[derive(Default)]
pub struct Constant {
	value: i64,
}

impl Component for Constant {}

impl Source for Constant {
	fn value(&self) -> Result<i64, ComposeError> {
		Ok(self.value)
	}
}

#[derive(Default)]
pub struct Sum {
	inputs: MultiReference<dyn Source>,
	offset: i64,
}

impl Component for Sum {}

impl Source for Sum {
	fn value(&self) -> Result<i64, ComposeError> {
		let mut total = self.offset;
		for input in self.inputs.get()? {
			total += input.value()?;
		}
		Ok(total)
	}
}

#[derive(Default)]
pub struct Scale {
	input: Reference<dyn Source>,
	bias: Reference<dyn Source>,
	factor: i64,
}

impl Component for Scale {}

impl Source for Scale {
	fn value(&self) -> Result<i64, ComposeError> {
		let bias = match self.bias.get()? {
			Some(bias) => bias.value()?,
			None => 0,
		};
		Ok(self.input.require()?.value()? * self.factor + bias)
	}
}

pub type Log = Arc<Mutex<Vec<String>>>;

/// Records its lifecycle hooks into a shared log.
pub struct Tracer {
	log: Log,
	serial: usize,
	name: String,
	eager: bool,
	peer: Reference<dyn Source>,
	spawn: Factory<dyn Source>,
	spawned: Mutex<Vec<Arc<dyn Source>>>,
}

impl Tracer {
	fn label(&self) -> String {
		format!("{}#{}", self.name, self.serial)
	}
}

impl Component for Tracer {
	fn on_created(&self, _context: &ComponentContext) -> Result<(), ComposeError> {
		self.log.lock().push(format!("created:{}", self.label()));
		if self.eager {
			self.peer.require()?;
		}
		if self.spawn.target().is_some() {
			for _ in 0..2 {
				let product = self.spawn.create()?;
				self.spawned.lock().push(product);
			}
		}
		Ok(())
	}

	fn on_destroyed(&self) {
		self.log.lock().push(format!("destroyed:{}", self.label()));
	}
}

impl Source for Tracer {
	fn value(&self) -> Result<i64, ComposeError> {
		match self.peer.get()? {
			Some(peer) => peer.value(),
			None => Ok(self.serial as i64),
		}
	}
}

impl Named for Tracer {
	fn name(&self) -> String {
		self.name.clone()
	}
}

static SUM_BASE: LazyLock<ComponentClass<Sum>> = LazyLock::new(|| {
	ComponentClass::builder(address("SumBase"))
		.attribute(Attribute::new("Offset", |sum: &mut Sum, offset: i64| sum.offset = offset).with_default(0))
		.capability::<dyn Source>(|sum| Arc::clone(sum) as Arc<dyn Source>)
		.build()
});

pub fn address(component: &str) -> ComponentAddress {
	ComponentAddress::new("test", component)
}

pub fn element(id: &str, component: &str) -> RegistryElement {
	RegistryElement::new(id, address(component))
}

pub fn constant(id: &str, value: i64) -> RegistryElement {
	element(id, "Constant").with_attribute("Value", value)
}

pub fn tracer(id: &str) -> RegistryElement {
	element(id, "Tracer").with_attribute("Name", id)
}

/// Builds the test catalog; every tracer appends to `log`.
pub fn catalog(log: &Log) -> Arc<Catalog> {
	let mut catalog = Catalog::new();
	catalog
		.register(
			ComponentClass::<Constant>::builder(address("Constant"))
				.attribute(Attribute::new("Value", |c: &mut Constant, v: i64| c.value = v).with_default(0))
				.capability::<dyn Source>(|c| Arc::clone(c) as Arc<dyn Source>)
				.build(),
		)
		.unwrap();
	catalog
		.register(
			ComponentClass::builder(address("Sum"))
				.base(&SUM_BASE)
				.multi_reference::<dyn Source>("Inputs", |sum: &mut Sum, inputs| sum.inputs = inputs)
				.build(),
		)
		.unwrap();
	catalog
		.register(
			ComponentClass::builder(address("LooseSum"))
				.base(&SUM_BASE)
				.attribute(Attribute::new("Offset", |sum: &mut Sum, offset: i64| sum.offset = offset).with_default(100))
				.optional_multi_reference::<dyn Source>("Inputs", |sum: &mut Sum, inputs| sum.inputs = inputs)
				.build(),
		)
		.unwrap();
	catalog
		.register(
			ComponentClass::<Scale>::builder(address("Scale"))
				.attribute(Attribute::new("Factor", |s: &mut Scale, f: i64| s.factor = f).required())
				.reference::<dyn Source>("Input", |s: &mut Scale, input| s.input = input)
				.optional_reference::<dyn Source>("Bias", |s: &mut Scale, bias| s.bias = bias)
				.capability::<dyn Source>(|s| Arc::clone(s) as Arc<dyn Source>)
				.build(),
		)
		.unwrap();

	let serial = Arc::new(AtomicUsize::new(0));
	let tracer_log = Arc::clone(log);
	catalog
		.register(
			ComponentClass::builder_with(address("Tracer"), move || Tracer {
				log: Arc::clone(&tracer_log),
				serial: serial.fetch_add(1, Ordering::Relaxed) + 1,
				name: String::new(),
				eager: false,
				peer: Reference::default(),
				spawn: Factory::default(),
				spawned: Mutex::new(Vec::new()),
			})
			.attribute(Attribute::new("Name", |p: &mut Tracer, name: String| p.name = name).required())
			.attribute(Attribute::new("Eager", |p: &mut Tracer, eager: bool| p.eager = eager).with_default(false))
			.optional_reference::<dyn Source>("Peer", |p: &mut Tracer, peer| p.peer = peer)
			.capability::<dyn Source>(|p| Arc::clone(p) as Arc<dyn Source>)
			.capability::<dyn Named>(|p| Arc::clone(p) as Arc<dyn Named>)
			.build(),
		)
		.unwrap();

	let spawner_log = Arc::clone(log);
	let spawner_serial = Arc::new(AtomicUsize::new(100));
	catalog
		.register(
			ComponentClass::builder_with(address("Spawner"), move || Tracer {
				log: Arc::clone(&spawner_log),
				serial: spawner_serial.fetch_add(1, Ordering::Relaxed),
				name: String::new(),
				eager: false,
				peer: Reference::default(),
				spawn: Factory::default(),
				spawned: Mutex::new(Vec::new()),
			})
			.attribute(Attribute::new("Name", |p: &mut Tracer, name: String| p.name = name).required())
			.factory::<dyn Source>("Spawn", |p: &mut Tracer, spawn| p.spawn = spawn)
			.capability::<dyn Named>(|p| Arc::clone(p) as Arc<dyn Named>)
			.build(),
		)
		.unwrap();
	Arc::new(catalog)
}

pub fn new_log() -> Log {
	Arc::new(Mutex::new(Vec::new()))
}

pub fn compose(registry: Registry, log: &Log) -> Composer {
	Composer::new(registry, catalog(log))
}

pub fn registry(elements: impl IntoIterator<Item = RegistryElement>) -> Registry {
	let mut registry = Registry::new();
	for element in elements {
		registry.insert_element(element).unwrap();
	}
	registry
}

pub fn entries(log: &Log) -> Vec<String> {
	log.lock().clone()
}
