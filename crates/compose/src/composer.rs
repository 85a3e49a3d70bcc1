//! Instantiation, dependency resolution and teardown of registry elements.
//!
//! # Role
//!
//! A [`Composer`] turns the elements of a root [`Registry`] into live
//! components. Elements are instantiated lazily, at most once per scope, the
//! first time they are activated, queried, or reached through a dependency.
//!
//! # Lifecycle
//!
//! `Declared → AttributesBound → Constructed → Active`, then `Destroyed` on
//! teardown. Attributes are bound before the instance is allocated; the
//! creation hook runs once capabilities are registered. Dependencies are not
//! resolved eagerly: each reference resolves on first use.
//!
//! # Scopes
//!
//! Every registry being resolved is a scope. The root registry is the root
//! scope; each composite instance opens a scope over its embedded registry
//! whose parent is the scope declaring the composite. Name lookup walks the
//! scope chain outward; dotted names (`outer.inner`) descend into composites.
//!
//! # Concurrency
//!
//! The arena sits behind a reentrant mutex: construction recurses on one
//! thread through component hooks while other threads wait. Internal borrows
//! are never held across a hook.
//!
//! # Invariants
//!
//! - A node is under construction until its creation hook returns;
//!   reaching it again through resolution is a cycle.
//! - Children are torn down before their parent, in reverse creation order.
//! - Memoized nodes are unique per `(scope, element id)`.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use trellis_registry::{Registry, RegistryElement, RegistryError, RegistryStore};

use crate::capability::Capability;
use crate::catalog::Catalog;
use crate::class::ClassObject;
use crate::config::ComposerConfig;
use crate::context::ComponentContext;
use crate::error::ComposeError;

mod arena;

pub(crate) use arena::{NodeId, ScopeId};
use arena::{Arena, NodeKind};


/// Visible lifecycle state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
	/// Declared in the registry, not instantiated.
	Declared,
	/// Attributes and dependency descriptors bound; no instance yet.
	AttributesBound,
	/// Instance allocated and capabilities registered; creation hook pending.
	Constructed,
	/// Creation hook completed.
	Active,
	/// Torn down.
	Destroyed,
}

impl LifecycleState {
	/// Construction runs until the creation hook returns.
	fn is_constructing(self) -> bool {
		matches!(self, Self::Declared | Self::AttributesBound | Self::Constructed)
	}
}

enum Blueprint {
	Class(Arc<dyn ClassObject>),
	Composite(Arc<Registry>),
}

enum Lookup {
	Instantiated(NodeId),
	Declared,
	Missing,
}

struct StoreBinding {
	store: Arc<RegistryStore>,
	context: PathBuf,
}

pub(crate) struct Shared {
	arena: ReentrantMutex<RefCell<Arena>>,
	root: ScopeId,
	catalog: Arc<Catalog>,
	config: ComposerConfig,
	store: Option<StoreBinding>,
	generation: AtomicU64,
	depth: AtomicUsize,
}

/// Decrements the construction depth when a nested instantiation ends.
struct DepthGuard<'a> {
	depth: &'a AtomicUsize,
}

impl<'a> DepthGuard<'a> {
	fn enter(shared: &'a Shared, element_id: &str) -> Result<Self, ComposeError> {
		let depth = shared.depth.fetch_add(1, Ordering::Relaxed) + 1;
		let guard = Self { depth: &shared.depth };
		if let Some(limit) = shared.config.max_depth
			&& depth > limit
		{
			return Err(ComposeError::DepthExceeded {
				element: element_id.to_string(),
				limit,
			});
		}
		Ok(guard)
	}
}

impl Drop for DepthGuard<'_> {
	fn drop(&mut self) {
		self.depth.fetch_sub(1, Ordering::Relaxed);
	}
}

impl Shared {
	fn with_arena<R>(&self, f: impl FnOnce(&Arena) -> R) -> R {
		let guard = self.arena.lock();
		let arena = guard.borrow();
		f(&arena)
	}

	fn with_arena_mut<R>(&self, f: impl FnOnce(&mut Arena) -> R) -> R {
		let guard = self.arena.lock();
		let mut arena = guard.borrow_mut();
		f(&mut arena)
	}

	pub(crate) fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	fn bump_generation(&self) {
		self.generation.fetch_add(1, Ordering::AcqRel);
	}

	pub(crate) fn node_state(&self, node: NodeId) -> Option<LifecycleState> {
		self.with_arena(|arena| arena.node(node).map(|node| node.state))
	}

	pub(crate) fn resolved_count(&self, node: NodeId) -> Option<usize> {
		self.with_arena(|arena| arena.node(node).map(|node| node.resolved))
	}

	fn set_state(&self, node: NodeId, state: LifecycleState) {
		self.with_arena_mut(|arena| {
			if let Some(node) = arena.node_mut(node) {
				node.state = state;
			}
		});
	}

	fn element_name(&self, node: NodeId) -> String {
		self.with_arena(|arena| arena.node(node).map(|node| node.element_id.to_string()))
			.unwrap_or_default()
	}

	/// Resolves `context`'s reference to `name` and queries capability `C`.
	pub(crate) fn resolve_from<C: Capability + ?Sized>(
		self: &Arc<Self>,
		context: &ComponentContext,
		name: &str,
	) -> Result<Option<Arc<C>>, ComposeError> {
		let _guard = self.arena.lock();
		if matches!(self.node_state(context.node()), None | Some(LifecycleState::Destroyed)) {
			return Err(context.destroyed());
		}
		let resolved = self.resolve_capability::<C>(context.scope(), name)?;
		if resolved.is_some() {
			self.with_arena_mut(|arena| {
				if let Some(node) = arena.node_mut(context.node()) {
					node.resolved += 1;
				}
			});
		}
		Ok(resolved)
	}

	/// Builds a fresh, unmemoized instance of `name` owned by `context`'s node.
	pub(crate) fn create_from<C: Capability + ?Sized>(self: &Arc<Self>, context: &ComponentContext, name: &str) -> Result<Arc<C>, ComposeError> {
		let _guard = self.arena.lock();
		if matches!(self.node_state(context.node()), None | Some(LifecycleState::Destroyed)) {
			return Err(context.destroyed());
		}
		let scope = self
			.with_arena(|arena| arena.declaring_scope(context.scope(), name))
			.ok_or_else(|| ComposeError::NotFound { name: name.to_string() })?;
		if self.with_arena(|arena| arena.constructing_in_owners(context.node(), scope, name)) {
			tracing::warn!(owner = %context.element_id(), element = %name, "factory cycle detected");
			return Err(ComposeError::CycleDetected { element: name.to_string() });
		}
		let node = self.instantiate(scope, name, Some(context.node()), false)?;
		match self.node_capability::<C>(node) {
			Ok(capability) => {
				tracing::debug!(owner = %context.element_id(), element = %name, "factory created instance");
				Ok(capability)
			}
			Err(err) => {
				self.teardown(node);
				Err(err)
			}
		}
	}

	fn resolve_capability<C: Capability + ?Sized>(self: &Arc<Self>, scope: ScopeId, path: &str) -> Result<Option<Arc<C>>, ComposeError> {
		match self.resolve_node(scope, path)? {
			Some(node) => self.node_capability::<C>(node).map(Some),
			None => Ok(None),
		}
	}

	/// Finds and activates the node named by a possibly dotted `path`.
	fn resolve_node(self: &Arc<Self>, scope: ScopeId, path: &str) -> Result<Option<NodeId>, ComposeError> {
		let mut segments = path.split('.');
		let first = segments.next().unwrap_or_default();
		let Some(owner) = self.with_arena(|arena| arena.declaring_scope(scope, first)) else {
			tracing::trace!(name = %path, "name not declared in scope chain");
			return Ok(None);
		};
		let mut node = self.activate_in(owner, first)?;
		for segment in segments {
			let Some((inner, element_id)) = self.with_arena(|arena| inner_element(arena, node, segment)) else {
				return Ok(None);
			};
			node = self.activate_in(inner, &element_id)?;
		}
		Ok(Some(node))
	}

	/// Walks `path` through memoized nodes only, instantiating nothing.
	fn lookup(&self, scope: ScopeId, path: &str) -> Lookup {
		self.with_arena(|arena| {
			let mut segments = path.split('.');
			let first = segments.next().unwrap_or_default();
			let Some(owner) = arena.declaring_scope(scope, first) else {
				return Lookup::Missing;
			};
			let Some((mut node, _)) = arena.memoized(owner, first) else {
				return Lookup::Declared;
			};
			for segment in segments {
				let Some((inner, element_id)) = inner_element(arena, node, segment) else {
					return Lookup::Missing;
				};
				match arena.memoized(inner, &element_id) {
					Some((next, _)) => node = next,
					None => return Lookup::Declared,
				}
			}
			Lookup::Instantiated(node)
		})
	}

	/// Returns the memoized node for `element_id` in `scope`, constructing it if needed.
	fn activate_in(self: &Arc<Self>, scope: ScopeId, element_id: &str) -> Result<NodeId, ComposeError> {
		if let Some((node, state)) = self.with_arena(|arena| arena.memoized(scope, element_id)) {
			if state == LifecycleState::Destroyed {
				return Err(ComposeError::Destroyed {
					element: element_id.to_string(),
				});
			}
			if state.is_constructing() {
				tracing::warn!(element = %element_id, ?state, "dependency cycle detected");
				return Err(ComposeError::CycleDetected {
					element: element_id.to_string(),
				});
			}
			tracing::trace!(element = %element_id, "reusing instance");
			return Ok(node);
		}
		self.instantiate(scope, element_id, None, true)
	}

	/// Runs the full construction of one element in `scope`.
	///
	/// On failure the partially built node is torn down before the error is returned.
	fn instantiate(self: &Arc<Self>, scope: ScopeId, element_id: &str, owner: Option<NodeId>, memoize: bool) -> Result<NodeId, ComposeError> {
		let _depth = DepthGuard::enter(self, element_id)?;
		let Some((registry, host)) = self.with_arena(|arena| {
			let scope = arena.scope(scope)?;
			Some((Arc::clone(&scope.registry), scope.host))
		}) else {
			return Err(ComposeError::Destroyed {
				element: element_id.to_string(),
			});
		};
		let element = registry.element(element_id).ok_or_else(|| ComposeError::NotFound {
			name: element_id.to_string(),
		})?;
		let blueprint = self.blueprint(&registry, element)?;

		let id: Arc<str> = Arc::from(element_id);
		let parent = owner.or(host);
		let node = self.with_arena_mut(|arena| arena.insert_node(scope, Arc::clone(&id), parent, memoize));
		tracing::debug!(element = %id, address = %element.address(), "declared");

		let built = match blueprint {
			Blueprint::Class(class) => self.construct_component(node, scope, element, &id, &*class),
			Blueprint::Composite(inner) => {
				self.construct_composite(node, scope, inner);
				Ok(())
			}
		};
		if let Err(err) = built {
			tracing::warn!(element = %id, error = %err, "construction failed");
			self.teardown(node);
			return Err(err);
		}
		Ok(node)
	}

	/// Picks the class or composite registry an element instantiates.
	fn blueprint(&self, registry: &Registry, element: &RegistryElement) -> Result<Blueprint, ComposeError> {
		let address = element.address();
		if let Some(class) = self.catalog.get(address) {
			return Ok(Blueprint::Class(class));
		}
		if address.package_id().is_empty()
			&& let Some(embedded) = registry.embedded_registry(address.component_id())
		{
			return Ok(Blueprint::Composite(Arc::clone(embedded)));
		}
		if let Some(binding) = &self.store
			&& !address.package_id().is_empty()
		{
			match binding.store.load_component(&binding.context, address) {
				Ok(loaded) => return Ok(Blueprint::Composite(loaded)),
				Err(RegistryError::Io { path, .. }) => {
					tracing::trace!(address = %address, path = %path.display(), "no registry file for component");
				}
				Err(err) => return Err(err.into()),
			}
		}
		Err(ComposeError::UnknownComponent {
			element: element.id().to_string(),
			address: address.clone(),
		})
	}

	fn construct_component(
		self: &Arc<Self>,
		node: NodeId,
		scope: ScopeId,
		element: &RegistryElement,
		id: &Arc<str>,
		class: &dyn ClassObject,
	) -> Result<(), ComposeError> {
		let context = ComponentContext::new(Arc::downgrade(self), node, scope, Arc::clone(id));

		let bound = class.bind(element, &context)?;
		self.set_state(node, LifecycleState::AttributesBound);
		tracing::trace!(element = %id, "attributes bound");

		let instance = class.construct(bound);
		let component = Arc::clone(&instance.component);
		let capabilities = instance.capabilities.len();
		self.with_arena_mut(|arena| {
			if let Some(node) = arena.node_mut(node) {
				node.instance = Some(instance);
				node.state = LifecycleState::Constructed;
			}
		});
		tracing::debug!(element = %id, class = %class.address(), capabilities, "constructed");

		component.on_created(&context)?;
		self.set_state(node, LifecycleState::Active);
		tracing::debug!(element = %id, "active");
		Ok(())
	}

	fn construct_composite(&self, node: NodeId, scope: ScopeId, registry: Arc<Registry>) {
		let elements = registry.elements_len();
		self.with_arena_mut(|arena| {
			let inner = arena.insert_scope(registry, Some(scope), Some(node));
			if let Some(node) = arena.node_mut(node) {
				node.kind = NodeKind::Composite { inner };
				node.state = LifecycleState::Active;
			}
		});
		tracing::debug!(element = %self.element_name(node), elements, "composite active");
	}

	/// Queries capability `C` on a node, routing composites to their exporting element.
	fn node_capability<C: Capability + ?Sized>(self: &Arc<Self>, node: NodeId) -> Result<Arc<C>, ComposeError> {
		enum Step<C: ?Sized> {
			Found(Option<Arc<C>>),
			Route(ScopeId, Option<String>),
		}

		let (element, step) = self
			.with_arena(|arena| {
				let entry = arena.node(node)?;
				let step = match entry.kind {
					NodeKind::Component => Step::Found(entry.instance.as_ref().and_then(|instance| instance.capabilities.get::<C>())),
					NodeKind::Composite { inner } => {
						let exporter = arena
							.scope(inner)
							.and_then(|scope| scope.registry.interface_exporter(C::TAG))
							.map(|element| element.id().to_string());
						Step::Route(inner, exporter)
					}
				};
				Some((entry.element_id.to_string(), step))
			})
			.ok_or_else(|| ComposeError::Destroyed {
				element: String::new(),
			})?;

		match step {
			Step::Found(Some(capability)) => Ok(capability),
			Step::Route(inner, Some(target)) => {
				tracing::trace!(composite = %element, target = %target, capability = C::TAG, "routing capability query");
				let inner_node = self.activate_in(inner, &target)?;
				self.node_capability::<C>(inner_node)
			}
			Step::Found(None) | Step::Route(_, None) => Err(ComposeError::TypeMismatch {
				element,
				capability: C::TAG,
			}),
		}
	}

	/// Tears down `node` and everything it owns, children first.
	fn teardown(&self, node: NodeId) {
		let Some(children) = self.with_arena(|arena| arena.node(node).map(|node| node.children.clone())) else {
			return;
		};
		for child in children.iter().rev() {
			self.teardown(*child);
		}

		let Some((id, instance)) = self.with_arena_mut(|arena| {
			let node = arena.node_mut(node)?;
			node.state = LifecycleState::Destroyed;
			Some((Arc::clone(&node.element_id), node.instance.take()))
		}) else {
			return;
		};
		if let Some(instance) = &instance {
			instance.component.on_destroyed();
		}
		self.with_arena_mut(|arena| arena.remove_node(node));
		tracing::debug!(element = %id, "destroyed");
		drop(instance);
	}

	fn teardown_all(&self) {
		let _guard = self.arena.lock();
		let roots = self.with_arena(|arena| arena.roots().to_vec());
		for root in roots.iter().rev() {
			self.teardown(*root);
		}
	}
}

/// Finds the element `segment` names inside a composite node's scope.
///
/// Exported component ids take precedence over plain element ids.
fn inner_element(arena: &Arena, node: NodeId, segment: &str) -> Option<(ScopeId, String)> {
	let NodeKind::Composite { inner } = arena.node(node)?.kind else {
		return None;
	};
	let registry = &arena.scope(inner)?.registry;
	let element_id = registry.exported_component(segment).unwrap_or(segment);
	registry.element(element_id)?;
	Some((inner, element_id.to_string()))
}

impl Drop for Shared {
	fn drop(&mut self) {
		if self.config.teardown_on_drop {
			tracing::debug!("composer dropped, tearing down instances");
			self.teardown_all();
		}
	}
}

/// Instantiates and wires the elements of a registry.
///
/// Cheap to clone; clones share the same instances.
#[derive(Clone)]
pub struct Composer {
	shared: Arc<Shared>,
}

impl Composer {
	/// Creates a composer over `registry` with the default configuration.
	pub fn new(registry: impl Into<Arc<Registry>>, catalog: Arc<Catalog>) -> Self {
		Self::from_parts(registry.into(), catalog, ComposerConfig::default(), None)
	}

	/// Starts a configured composer.
	pub fn builder(registry: impl Into<Arc<Registry>>, catalog: Arc<Catalog>) -> ComposerBuilder {
		ComposerBuilder {
			registry: registry.into(),
			catalog,
			config: ComposerConfig::default(),
			store: None,
		}
	}

	fn from_parts(registry: Arc<Registry>, catalog: Arc<Catalog>, config: ComposerConfig, store: Option<StoreBinding>) -> Self {
		let mut arena = Arena::default();
		let root = arena.insert_scope(registry, None, None);
		Self {
			shared: Arc::new(Shared {
				arena: ReentrantMutex::new(RefCell::new(arena)),
				root,
				catalog,
				config,
				store,
				generation: AtomicU64::new(0),
				depth: AtomicUsize::new(0),
			}),
		}
	}

	pub(crate) fn from_shared(shared: Arc<Shared>) -> Self {
		Self { shared }
	}

	/// Returns the root registry.
	pub fn registry(&self) -> Arc<Registry> {
		self.shared
			.with_arena(|arena| arena.scope(self.shared.root).map(|scope| Arc::clone(&scope.registry)))
			.unwrap_or_default()
	}

	pub fn config(&self) -> &ComposerConfig {
		&self.shared.config
	}

	pub fn catalog(&self) -> &Arc<Catalog> {
		&self.shared.catalog
	}

	/// Returns the counter that invalidates cached references.
	pub fn generation(&self) -> u64 {
		self.shared.generation()
	}

	/// Activates every root element in registration order.
	///
	/// Stops at the first failure; elements activated before it stay active.
	pub fn build(&self) -> Result<(), ComposeError> {
		let _guard = self.shared.arena.lock();
		let registry = self.registry();
		for id in registry.element_ids() {
			self.shared.activate_in(self.shared.root, id)?;
		}
		tracing::debug!(elements = registry.elements_len(), "composition built");
		Ok(())
	}

	/// Activates the element at `name`, which may be a dotted path.
	pub fn activate(&self, name: &str) -> Result<(), ComposeError> {
		let _guard = self.shared.arena.lock();
		match self.shared.resolve_node(self.shared.root, name)? {
			Some(_) => Ok(()),
			None => Err(ComposeError::NotFound { name: name.to_string() }),
		}
	}

	/// Resolves `name` and queries capability `C`. Absence is an error.
	pub fn query<C: Capability + ?Sized>(&self, name: &str) -> Result<Arc<C>, ComposeError> {
		self.query_optional::<C>(name)?
			.ok_or_else(|| ComposeError::NotFound { name: name.to_string() })
	}

	/// Resolves `name` and queries capability `C`. Absence yields `None`.
	pub fn query_optional<C: Capability + ?Sized>(&self, name: &str) -> Result<Option<Arc<C>>, ComposeError> {
		let _guard = self.shared.arena.lock();
		self.shared.resolve_capability::<C>(self.shared.root, name)
	}

	/// Returns the state of `name` without instantiating anything.
	///
	/// `None` when no such element is declared.
	pub fn state(&self, name: &str) -> Option<LifecycleState> {
		match self.shared.lookup(self.shared.root, name) {
			Lookup::Instantiated(node) => self.shared.node_state(node),
			Lookup::Declared => Some(LifecycleState::Declared),
			Lookup::Missing => None,
		}
	}

	/// Tears down the instance at `name` and everything it owns.
	///
	/// Returns `false` if it was not instantiated. Cached references are invalidated.
	pub fn release(&self, name: &str) -> bool {
		let _guard = self.shared.arena.lock();
		let Lookup::Instantiated(node) = self.shared.lookup(self.shared.root, name) else {
			return false;
		};
		self.shared.teardown(node);
		self.shared.bump_generation();
		true
	}

	/// Tears down every instance and invalidates cached references.
	pub fn reset(&self) {
		self.shared.teardown_all();
		self.shared.bump_generation();
		tracing::debug!(generation = self.generation(), "composition reset");
	}

	/// Returns the number of live nodes, factory products and composites included.
	pub fn instances_len(&self) -> usize {
		self.shared.with_arena(Arena::nodes_len)
	}

	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.shared, &other.shared)
	}
}

impl std::fmt::Debug for Composer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Composer")
			.field("instances", &self.instances_len())
			.field("generation", &self.generation())
			.field("config", &self.shared.config)
			.finish_non_exhaustive()
	}
}

/// Configures a [`Composer`] before any element is instantiated.
pub struct ComposerBuilder {
	registry: Arc<Registry>,
	catalog: Arc<Catalog>,
	config: ComposerConfig,
	store: Option<StoreBinding>,
}

impl ComposerBuilder {
	pub fn config(mut self, config: ComposerConfig) -> Self {
		self.config = config;
		self
	}

	/// Resolves packaged composite components through `store`, relative to `context`.
	///
	/// `context` is the path of the root registry file or its directory.
	pub fn store(mut self, store: Arc<RegistryStore>, context: impl Into<PathBuf>) -> Self {
		self.store = Some(StoreBinding {
			store,
			context: context.into(),
		});
		self
	}

	/// Creates the composer, building every root element if `eager` is set.
	pub fn finish(self) -> Result<Composer, ComposeError> {
		let eager = self.config.eager;
		let composer = Composer::from_parts(self.registry, self.catalog, self.config, self.store);
		if eager {
			composer.build()?;
		}
		Ok(composer)
	}
}
