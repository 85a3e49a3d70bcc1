//! Component class descriptors.
//!
//! A [`ComponentClass`] describes how to turn a registry element into a live
//! component of type `T`: which attributes it binds, which references it
//! declares, and which capabilities it exposes. Descriptors are built
//! explicitly with a [`ClassBuilder`].
//!
//! # Inheritance
//!
//! A class may name a `'static` base class of the same component type. Each
//! descriptor table is a [`CascadedMap`] whose parent is the base's table:
//! inherited descriptors apply unless the derived class declares the same key,
//! in which case the derived descriptor shadows the inherited one.

use std::any::Any;
use std::sync::Arc;

use trellis_registry::{AttrKind, AttrType, AttrValue, CascadedMap, ComponentAddress, RegistryElement};

use crate::capability::{Capabilities, Capability};
use crate::component::{Component, Instance};
use crate::context::ComponentContext;
use crate::error::ComposeError;
use crate::reference::{Factory, MultiReference, Reference, Wiring};


type Apply<T> = Box<dyn Fn(&mut T, &AttrValue) -> bool + Send + Sync>;
type Install<T> = Box<dyn Fn(&mut T, Wiring) + Send + Sync>;
type Register<T> = Box<dyn Fn(&Arc<T>, &mut Capabilities) + Send + Sync>;

/// Declared attribute of a component class.
pub struct Attribute<T> {
	key: &'static str,
	description: &'static str,
	kind: AttrKind,
	default: Option<AttrValue>,
	required: bool,
	apply: Apply<T>,
}

impl<T: 'static> Attribute<T> {
	/// Declares attribute `key`, bound through `set` as a `V`.
	pub fn new<V: AttrType>(key: &'static str, set: impl Fn(&mut T, V) + Send + Sync + 'static) -> Self {
		Self {
			key,
			description: "",
			kind: V::KIND,
			default: None,
			required: false,
			apply: Box::new(move |target: &mut T, value: &AttrValue| match V::from_attr(value) {
				Some(value) => {
					set(target, value);
					true
				}
				None => false,
			}),
		}
	}

	pub fn description(mut self, description: &'static str) -> Self {
		self.description = description;
		self
	}

	/// Value bound when the element does not set the attribute.
	pub fn with_default(mut self, value: impl Into<AttrValue>) -> Self {
		self.default = Some(value.into());
		self
	}

	/// Fails binding when neither the element nor a default provides a value.
	pub fn required(mut self) -> Self {
		self.required = true;
		self
	}
}

impl<T> Attribute<T> {
	pub fn key(&self) -> &'static str {
		self.key
	}

	pub fn help(&self) -> &'static str {
		self.description
	}

	pub fn kind(&self) -> AttrKind {
		self.kind
	}

	pub fn default_value(&self) -> Option<&AttrValue> {
		self.default.as_ref()
	}

	pub fn is_required(&self) -> bool {
		self.required
	}
}

impl<T> std::fmt::Debug for Attribute<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Attribute")
			.field("key", &self.key)
			.field("kind", &self.kind)
			.field("default", &self.default)
			.field("required", &self.required)
			.finish_non_exhaustive()
	}
}

/// Shape of a declared dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
	/// One memoized target, see [`Reference`].
	Single,
	/// An ordered list of memoized targets, see [`MultiReference`].
	Multi,
	/// Fresh instances on demand, see [`Factory`].
	Factory,
}

/// Declared dependency of a component class.
pub struct Dependency<T> {
	key: &'static str,
	capability: &'static str,
	kind: DependencyKind,
	optional: bool,
	install: Install<T>,
}

impl<T> Dependency<T> {
	pub fn key(&self) -> &'static str {
		self.key
	}

	/// Tag of the capability the targets must provide.
	pub fn capability(&self) -> &'static str {
		self.capability
	}

	pub fn kind(&self) -> DependencyKind {
		self.kind
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}
}

impl<T> std::fmt::Debug for Dependency<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dependency")
			.field("key", &self.key)
			.field("capability", &self.capability)
			.field("kind", &self.kind)
			.field("optional", &self.optional)
			.finish_non_exhaustive()
	}
}

/// Static description of a component type.
pub struct ComponentClass<T: Component> {
	address: ComponentAddress,
	description: String,
	construct: Box<dyn Fn() -> T + Send + Sync>,
	attributes: CascadedMap<'static, &'static str, Attribute<T>>,
	dependencies: CascadedMap<'static, &'static str, Dependency<T>>,
	capabilities: CascadedMap<'static, &'static str, Register<T>>,
	base: Option<&'static ComponentClass<T>>,
}

impl<T: Component + Default> ComponentClass<T> {
	/// Starts a class whose instances begin as `T::default()`.
	pub fn builder(address: ComponentAddress) -> ClassBuilder<T> {
		Self::builder_with(address, T::default)
	}
}

impl<T: Component> ComponentClass<T> {
	/// Starts a class whose instances begin as `construct()`.
	pub fn builder_with(address: ComponentAddress, construct: impl Fn() -> T + Send + Sync + 'static) -> ClassBuilder<T> {
		ClassBuilder {
			class: ComponentClass {
				address,
				description: String::new(),
				construct: Box::new(construct),
				attributes: CascadedMap::new(),
				dependencies: CascadedMap::new(),
				capabilities: CascadedMap::new(),
				base: None,
			},
		}
	}

	pub fn address(&self) -> &ComponentAddress {
		&self.address
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	pub fn base(&self) -> Option<&'static ComponentClass<T>> {
		self.base
	}

	/// Looks up an attribute, inherited ones included.
	pub fn attribute(&self, key: &str) -> Option<&Attribute<T>> {
		self.attributes.find(key)
	}

	/// Iterates effective attributes: own first, then inherited, shadowed ones skipped.
	pub fn attributes(&self) -> impl Iterator<Item = &Attribute<T>> + '_ {
		effective(&self.attributes).map(|(_, attribute)| attribute)
	}

	pub fn dependency(&self, key: &str) -> Option<&Dependency<T>> {
		self.dependencies.find(key)
	}

	pub fn dependencies(&self) -> impl Iterator<Item = &Dependency<T>> + '_ {
		effective(&self.dependencies).map(|(_, dependency)| dependency)
	}

	/// Iterates the tags of every capability instances register.
	pub fn capability_tags(&self) -> impl Iterator<Item = &'static str> + '_ {
		effective(&self.capabilities).map(|(tag, _)| *tag)
	}

	/// Builds the initial value and binds attributes and dependencies of `element`.
	fn bind_value(&self, element: &RegistryElement, context: &ComponentContext) -> Result<T, ComposeError> {
		let mut value = (self.construct)();

		for (_, attribute) in effective(&self.attributes) {
			let Some(bound) = element.attribute(attribute.key).or(attribute.default.as_ref()) else {
				if attribute.required {
					return Err(binding_error(element, attribute.key, "required attribute is not set".to_string()));
				}
				continue;
			};
			if !(attribute.apply)(&mut value, bound) {
				return Err(binding_error(
					element,
					attribute.key,
					format!("expected {}, found {}", attribute.kind, bound.kind()),
				));
			}
		}

		for (_, dependency) in effective(&self.dependencies) {
			let targets = reference_targets(element, dependency.key)?;
			if targets.is_empty() && !dependency.optional {
				return Err(binding_error(element, dependency.key, "required reference is not set".to_string()));
			}
			if targets.len() > 1 && dependency.kind != DependencyKind::Multi {
				return Err(binding_error(
					element,
					dependency.key,
					format!("expected one target, found {}", targets.len()),
				));
			}
			(dependency.install)(
				&mut value,
				Wiring {
					context: context.clone(),
					key: dependency.key,
					targets,
					optional: dependency.optional,
				},
			);
		}

		for (key, _) in element.attributes() {
			if self.attributes.find(key).is_none() && self.dependencies.find(key).is_none() {
				tracing::warn!(element = %element.id(), attribute = %key, class = %self.address, "attribute not declared by class");
			}
		}

		Ok(value)
	}
}

impl<T: Component> std::fmt::Debug for ComponentClass<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentClass")
			.field("address", &self.address)
			.field("attributes", &self.attributes().map(Attribute::key).collect::<Vec<_>>())
			.field("dependencies", &self.dependencies().map(Dependency::key).collect::<Vec<_>>())
			.field("capabilities", &self.capability_tags().collect::<Vec<_>>())
			.finish_non_exhaustive()
	}
}

/// Iterates entries whose key is not shadowed by an entry closer to `map`.
fn effective<'a, V>(map: &'a CascadedMap<'static, &'static str, V>) -> impl Iterator<Item = (&'a &'static str, &'a V)> + 'a {
	map.iter()
		.enumerate()
		.filter(move |(index, (key, _))| map.find_index(**key) == Some(*index))
		.map(|(_, entry)| entry)
}

fn binding_error(element: &RegistryElement, key: &str, reason: String) -> ComposeError {
	ComposeError::Binding {
		element: element.id().to_string(),
		key: key.to_string(),
		reason,
	}
}

/// Reads the target names of a reference attribute: one string or a list of strings.
fn reference_targets(element: &RegistryElement, key: &str) -> Result<Vec<String>, ComposeError> {
	let targets = match element.attribute(key) {
		None => Vec::new(),
		Some(AttrValue::String(target)) => vec![target.clone()],
		Some(value @ AttrValue::List(_)) => value
			.get::<Vec<String>>()
			.ok_or_else(|| binding_error(element, key, "reference list must hold strings".to_string()))?,
		Some(other) => {
			return Err(binding_error(
				element,
				key,
				format!("expected reference target string, found {}", other.kind()),
			));
		}
	};
	Ok(targets.into_iter().filter(|target| !target.is_empty()).collect())
}

/// Explicit builder for a [`ComponentClass`].
pub struct ClassBuilder<T: Component> {
	class: ComponentClass<T>,
}

impl<T: Component> ClassBuilder<T> {
	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.class.description = description.into();
		self
	}

	/// Inherits every descriptor of `base`.
	pub fn base(mut self, base: &'static ComponentClass<T>) -> Self {
		self.class.attributes.set_parent(Some(&base.attributes));
		self.class.dependencies.set_parent(Some(&base.dependencies));
		self.class.capabilities.set_parent(Some(&base.capabilities));
		self.class.base = Some(base);
		self
	}

	/// Declares an attribute. A key already declared by this class is ignored.
	pub fn attribute(mut self, attribute: Attribute<T>) -> Self {
		let key = attribute.key;
		if !self.class.attributes.insert_local(key, attribute) {
			tracing::warn!(class = %self.class.address, attribute = key, "duplicate attribute declaration ignored");
		}
		self
	}

	/// Declares a mandatory reference to one element providing `C`.
	pub fn reference<C: Capability + ?Sized>(self, key: &'static str, set: impl Fn(&mut T, Reference<C>) + Send + Sync + 'static) -> Self {
		self.dependency::<C>(key, DependencyKind::Single, false, Box::new(move |target: &mut T, wiring: Wiring| {
			set(target, Reference::from_wiring(wiring));
		}))
	}

	/// Declares a reference whose absence resolves to `None`.
	pub fn optional_reference<C: Capability + ?Sized>(
		self,
		key: &'static str,
		set: impl Fn(&mut T, Reference<C>) + Send + Sync + 'static,
	) -> Self {
		self.dependency::<C>(key, DependencyKind::Single, true, Box::new(move |target: &mut T, wiring: Wiring| {
			set(target, Reference::from_wiring(wiring));
		}))
	}

	/// Declares a mandatory list of references.
	pub fn multi_reference<C: Capability + ?Sized>(
		self,
		key: &'static str,
		set: impl Fn(&mut T, MultiReference<C>) + Send + Sync + 'static,
	) -> Self {
		self.dependency::<C>(key, DependencyKind::Multi, false, Box::new(move |target: &mut T, wiring: Wiring| {
			set(target, MultiReference::from_wiring(wiring));
		}))
	}

	/// Declares a list of references whose absent targets are skipped.
	pub fn optional_multi_reference<C: Capability + ?Sized>(
		self,
		key: &'static str,
		set: impl Fn(&mut T, MultiReference<C>) + Send + Sync + 'static,
	) -> Self {
		self.dependency::<C>(key, DependencyKind::Multi, true, Box::new(move |target: &mut T, wiring: Wiring| {
			set(target, MultiReference::from_wiring(wiring));
		}))
	}

	/// Declares a factory building fresh instances of one element.
	pub fn factory<C: Capability + ?Sized>(self, key: &'static str, set: impl Fn(&mut T, Factory<C>) + Send + Sync + 'static) -> Self {
		self.dependency::<C>(key, DependencyKind::Factory, false, Box::new(move |target: &mut T, wiring: Wiring| {
			set(target, Factory::from_wiring(wiring));
		}))
	}

	fn dependency<C: Capability + ?Sized>(mut self, key: &'static str, kind: DependencyKind, optional: bool, install: Install<T>) -> Self {
		let dependency = Dependency {
			key,
			capability: C::TAG,
			kind,
			optional,
			install,
		};
		if !self.class.dependencies.insert_local(key, dependency) {
			tracing::warn!(class = %self.class.address, dependency = key, "duplicate dependency declaration ignored");
		}
		self
	}

	/// Registers capability `C`, extracted from the constructed instance.
	pub fn capability<C: Capability + ?Sized>(mut self, extract: impl Fn(&Arc<T>) -> Arc<C> + Send + Sync + 'static) -> Self {
		let register: Register<T> = Box::new(move |instance: &Arc<T>, table: &mut Capabilities| table.insert::<C>(extract(instance)));
		if !self.class.capabilities.insert_local(C::TAG, register) {
			tracing::warn!(class = %self.class.address, capability = C::TAG, "duplicate capability declaration ignored");
		}
		self
	}

	pub fn build(self) -> ComponentClass<T> {
		self.class
	}
}

/// Type-erased class interface used by the composer.
pub(crate) trait ClassObject: Send + Sync {
	fn address(&self) -> &ComponentAddress;

	/// Binds attributes and dependencies into an unconstructed value.
	fn bind(&self, element: &RegistryElement, context: &ComponentContext) -> Result<Box<dyn Any + Send>, ComposeError>;

	/// Allocates the bound value and registers its capabilities.
	fn construct(&self, bound: Box<dyn Any + Send>) -> Instance;
}

impl<T: Component> ClassObject for ComponentClass<T> {
	fn address(&self) -> &ComponentAddress {
		&self.address
	}

	fn bind(&self, element: &RegistryElement, context: &ComponentContext) -> Result<Box<dyn Any + Send>, ComposeError> {
		Ok(Box::new(self.bind_value(element, context)?))
	}

	fn construct(&self, bound: Box<dyn Any + Send>) -> Instance {
		let value = match bound.downcast::<T>() {
			Ok(value) => *value,
			Err(_) => unreachable!("bound value of class {} has a foreign type", self.address),
		};
		let component = Arc::new(value);
		let mut capabilities = Capabilities::default();
		for (_, register) in effective(&self.capabilities) {
			register(&component, &mut capabilities);
		}
		Instance { component, capabilities }
	}
}
