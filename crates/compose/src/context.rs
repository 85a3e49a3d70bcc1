//! The binding between one registry element and its live instance.

use std::sync::{Arc, Weak};

use crate::capability::Capability;
use crate::composer::{Composer, LifecycleState, NodeId, ScopeId, Shared};
use crate::error::ComposeError;

/// Handle a component uses to reach its own scope.
///
/// Holds the composer weakly: once the composer is dropped or the node torn
/// down, every resolution through the context fails with
/// [`ComposeError::Destroyed`].
#[derive(Clone)]
pub struct ComponentContext {
	shared: Weak<Shared>,
	node: NodeId,
	scope: ScopeId,
	element_id: Arc<str>,
}

impl ComponentContext {
	pub(crate) fn new(shared: Weak<Shared>, node: NodeId, scope: ScopeId, element_id: Arc<str>) -> Self {
		Self {
			shared,
			node,
			scope,
			element_id,
		}
	}

	/// Returns the id of the element this context belongs to.
	pub fn element_id(&self) -> &str {
		&self.element_id
	}

	/// Returns the composer that owns this context.
	pub fn composer(&self) -> Result<Composer, ComposeError> {
		self.shared().map(Composer::from_shared)
	}

	/// Returns the lifecycle state of the bound node.
	///
	/// Torn-down nodes and dropped composers report [`LifecycleState::Destroyed`].
	pub fn state(&self) -> LifecycleState {
		self.shared
			.upgrade()
			.and_then(|shared| shared.node_state(self.node))
			.unwrap_or(LifecycleState::Destroyed)
	}

	/// Returns `true` while the bound node is alive.
	pub fn is_alive(&self) -> bool {
		self.state() != LifecycleState::Destroyed
	}

	/// Returns how many dependency lookups through this context found a target.
	pub fn resolved_dependencies(&self) -> usize {
		self.shared
			.upgrade()
			.and_then(|shared| shared.resolved_count(self.node))
			.unwrap_or(0)
	}

	/// Resolves `name` from this element's scope and queries capability `C`.
	///
	/// Returns `Ok(None)` when no element named `name` is reachable.
	pub fn resolve<C: Capability + ?Sized>(&self, name: &str) -> Result<Option<Arc<C>>, ComposeError> {
		self.shared()?.resolve_from::<C>(self, name)
	}

	/// Like [`ComponentContext::resolve`], but absence is [`ComposeError::NotFound`].
	pub fn require<C: Capability + ?Sized>(&self, name: &str) -> Result<Arc<C>, ComposeError> {
		self.resolve::<C>(name)?
			.ok_or_else(|| ComposeError::NotFound { name: name.to_string() })
	}

	/// Builds a fresh, unshared instance of `name` owned by this element.
	pub fn create<C: Capability + ?Sized>(&self, name: &str) -> Result<Arc<C>, ComposeError> {
		self.shared()?.create_from::<C>(self, name)
	}

	pub(crate) fn generation(&self) -> Result<u64, ComposeError> {
		Ok(self.shared()?.generation())
	}

	pub(crate) fn node(&self) -> NodeId {
		self.node
	}

	pub(crate) fn scope(&self) -> ScopeId {
		self.scope
	}

	fn shared(&self) -> Result<Arc<Shared>, ComposeError> {
		self.shared.upgrade().ok_or_else(|| self.destroyed())
	}

	pub(crate) fn destroyed(&self) -> ComposeError {
		ComposeError::Destroyed {
			element: self.element_id.to_string(),
		}
	}
}

impl std::fmt::Debug for ComponentContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComponentContext")
			.field("element_id", &self.element_id)
			.field("node", &self.node)
			.finish_non_exhaustive()
	}
}
