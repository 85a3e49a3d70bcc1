//! Slab storage for instantiated nodes and resolution scopes.
//!
//! Handles carry the generation of the slot they were issued for, so a
//! handle to a torn-down node never aliases a later node in the same slot.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use slab::Slab;
use smallvec::SmallVec;
use trellis_registry::Registry;

use super::LifecycleState;
use crate::component::Instance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
	index: usize,
	generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ScopeId {
	index: usize,
	generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
	Component,
	Composite { inner: ScopeId },
}

#[derive(Debug)]
pub(crate) struct Node {
	generation: u64,
	pub(crate) element_id: Arc<str>,
	pub(crate) scope: ScopeId,
	pub(crate) state: LifecycleState,
	pub(crate) kind: NodeKind,
	pub(crate) instance: Option<Instance>,
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: SmallVec<[NodeId; 4]>,
	pub(crate) memoized: bool,
	pub(crate) resolved: usize,
}

/// One registry being resolved, with the instances created from it.
#[derive(Debug)]
pub(crate) struct Scope {
	generation: u64,
	pub(crate) registry: Arc<Registry>,
	pub(crate) parent: Option<ScopeId>,
	/// Composite node that opened this scope; `None` for the root scope.
	pub(crate) host: Option<NodeId>,
	pub(crate) memo: FxHashMap<Arc<str>, NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
	nodes: Slab<Node>,
	scopes: Slab<Scope>,
	roots: Vec<NodeId>,
	next_generation: u64,
}

impl Arena {
	fn bump(&mut self) -> u64 {
		self.next_generation += 1;
		self.next_generation
	}

	pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.index).filter(|node| node.generation == id.generation)
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.nodes.get_mut(id.index).filter(|node| node.generation == id.generation)
	}

	pub(crate) fn scope(&self, id: ScopeId) -> Option<&Scope> {
		self.scopes.get(id.index).filter(|scope| scope.generation == id.generation)
	}

	fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
		self.scopes.get_mut(id.index).filter(|scope| scope.generation == id.generation)
	}

	pub(crate) fn insert_scope(&mut self, registry: Arc<Registry>, parent: Option<ScopeId>, host: Option<NodeId>) -> ScopeId {
		let generation = self.bump();
		let index = self.scopes.insert(Scope {
			generation,
			registry,
			parent,
			host,
			memo: FxHashMap::default(),
		});
		ScopeId { index, generation }
	}

	/// Returns the memoized node for `element_id` in `scope` with its state.
	pub(crate) fn memoized(&self, scope: ScopeId, element_id: &str) -> Option<(NodeId, LifecycleState)> {
		let id = *self.scope(scope)?.memo.get(element_id)?;
		Some((id, self.node(id)?.state))
	}

	/// Finds the nearest scope, starting at `start`, whose registry declares `element_id`.
	pub(crate) fn declaring_scope(&self, start: ScopeId, element_id: &str) -> Option<ScopeId> {
		let mut current = Some(start);
		while let Some(id) = current {
			let scope = self.scope(id)?;
			if scope.registry.element(element_id).is_some() {
				return Some(id);
			}
			current = scope.parent;
		}
		None
	}

	/// Returns `true` if `start` or one of its owners is still constructing
	/// `element_id` from `scope`.
	pub(crate) fn constructing_in_owners(&self, start: NodeId, scope: ScopeId, element_id: &str) -> bool {
		let mut current = Some(start);
		while let Some(id) = current {
			let Some(node) = self.node(id) else {
				return false;
			};
			if node.scope == scope && &*node.element_id == element_id && node.state.is_constructing() {
				return true;
			}
			current = node.parent;
		}
		false
	}

	/// Adds a `Declared` node and links it to its parent (or the roots) and scope memo.
	pub(crate) fn insert_node(&mut self, scope: ScopeId, element_id: Arc<str>, parent: Option<NodeId>, memoized: bool) -> NodeId {
		let generation = self.bump();
		let index = self.nodes.insert(Node {
			generation,
			element_id: Arc::clone(&element_id),
			scope,
			state: LifecycleState::Declared,
			kind: NodeKind::Component,
			instance: None,
			parent,
			children: SmallVec::new(),
			memoized,
			resolved: 0,
		});
		let id = NodeId { index, generation };
		match parent.and_then(|parent| self.node_mut(parent)) {
			Some(parent) => parent.children.push(id),
			None => self.roots.push(id),
		}
		if memoized && let Some(scope) = self.scope_mut(scope) {
			scope.memo.insert(element_id, id);
		}
		id
	}

	/// Unlinks and frees a node. Its children must already be gone.
	///
	/// A composite node takes its inner scope with it.
	pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<Node> {
		self.node(id)?;
		let node = self.nodes.remove(id.index);
		debug_assert!(node.children.is_empty(), "node removed before its children");

		if node.memoized
			&& let Some(scope) = self.scope_mut(node.scope)
			&& scope.memo.get(&node.element_id) == Some(&id)
		{
			scope.memo.remove(&node.element_id);
		}
		match node.parent.and_then(|parent| self.node_mut(parent)) {
			Some(parent) => parent.children.retain(|child| *child != id),
			None => self.roots.retain(|root| *root != id),
		}
		if let NodeKind::Composite { inner } = node.kind
			&& self.scope(inner).is_some()
		{
			self.scopes.remove(inner.index);
		}
		Some(node)
	}

	/// Root nodes in creation order.
	pub(crate) fn roots(&self) -> &[NodeId] {
		&self.roots
	}

	pub(crate) fn nodes_len(&self) -> usize {
		self.nodes.len()
	}
}
