//! Scoped, insert-only map with a parent chain.
//!
//! # Index Space
//!
//! A [`CascadedMap`] addresses its entries with *global* indices. Local
//! entries come first and occupy `[0, local_len)`; an index `i >= local_len`
//! belongs to the parent at `i - local_len`, recursively. Key lookup prefers
//! the local scope, so a local key shadows the same key in any ancestor.
//!
//! # Invariants
//!
//! - Local indices are contiguous and stable: entries are never removed or
//!   reordered once inserted.
//! - `key_at(find_index(k)?) == k` for every reachable key `k`.
//! - The parent is borrowed, never owned; it outlives every child (`'p`).

use std::borrow::Borrow;
use std::hash::Hash;

use rustc_hash::FxHashMap;


/// Global index outside of the map and its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index {index} out of range for cascaded map of {len} entries")]
pub struct OutOfRange {
	pub index: usize,
	pub len: usize,
}

/// Ordered key/value index that falls back to a parent map on local miss.
pub struct CascadedMap<'p, K, V> {
	parent: Option<&'p CascadedMap<'p, K, V>>,
	positions: FxHashMap<K, usize>,
	entries: Vec<(K, V)>,
}

impl<K, V> Default for CascadedMap<'_, K, V> {
	fn default() -> Self {
		Self {
			parent: None,
			positions: FxHashMap::default(),
			entries: Vec::new(),
		}
	}
}

impl<K: std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for CascadedMap<'_, K, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CascadedMap")
			.field("entries", &self.entries)
			.field("parent", &self.parent)
			.finish()
	}
}

impl<'p, K, V> CascadedMap<'p, K, V>
where
	K: Eq + Hash + Clone,
{
	/// Creates an empty map without a parent.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty map cascading to `parent`.
	pub fn with_parent(parent: &'p CascadedMap<'p, K, V>) -> Self {
		Self {
			parent: Some(parent),
			..Self::default()
		}
	}

	/// Returns the parent map, if any.
	pub fn parent(&self) -> Option<&'p CascadedMap<'p, K, V>> {
		self.parent
	}

	/// Replaces the parent map.
	pub fn set_parent(&mut self, parent: Option<&'p CascadedMap<'p, K, V>>) {
		self.parent = parent;
	}

	/// Returns the number of entries reachable through this map, ancestors included.
	pub fn len(&self) -> usize {
		self.entries.len() + self.parent.map_or(0, |p| p.len())
	}

	/// Returns `true` if neither this map nor any ancestor holds an entry.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the number of entries stored in this map itself.
	pub fn local_len(&self) -> usize {
		self.entries.len()
	}

	/// Finds the global index of `key`, searching ancestors on local miss.
	pub fn find_index<Q>(&self, key: &Q) -> Option<usize>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		if let Some(&index) = self.positions.get(key) {
			return Some(index);
		}
		self.parent?.find_index(key).map(|index| self.entries.len() + index)
	}

	/// Finds the local index of `key` without consulting ancestors.
	pub fn find_local_index<Q>(&self, key: &Q) -> Option<usize>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.positions.get(key).copied()
	}

	/// Finds the value for `key`, searching ancestors on local miss.
	pub fn find<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		match self.positions.get(key) {
			Some(&index) => Some(&self.entries[index].1),
			None => self.parent?.find(key),
		}
	}

	/// Finds the value for `key` in this map only.
	pub fn find_local<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		self.positions.get(key).map(|&index| &self.entries[index].1)
	}

	/// Finds the value for `key` in this map only, mutably.
	pub fn find_local_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
	where
		K: Borrow<Q>,
		Q: Hash + Eq + ?Sized,
	{
		let index = *self.positions.get(key)?;
		Some(&mut self.entries[index].1)
	}

	/// Returns the key at a global index.
	pub fn key_at(&self, index: usize) -> Result<&K, OutOfRange> {
		let (owner, local) = self.owner_map(index)?;
		Ok(&owner.entries[local].0)
	}

	/// Returns the value at a global index.
	pub fn value_at(&self, index: usize) -> Result<&V, OutOfRange> {
		let (owner, local) = self.owner_map(index)?;
		Ok(&owner.entries[local].1)
	}

	/// Returns the key at a local index.
	pub fn local_key_at(&self, index: usize) -> Result<&K, OutOfRange> {
		self.entries.get(index).map(|(k, _)| k).ok_or(OutOfRange {
			index,
			len: self.entries.len(),
		})
	}

	/// Returns the value at a local index.
	pub fn local_value_at(&self, index: usize) -> Result<&V, OutOfRange> {
		self.entries.get(index).map(|(_, v)| v).ok_or(OutOfRange {
			index,
			len: self.entries.len(),
		})
	}

	/// Returns the value at a local index, mutably.
	pub fn local_value_at_mut(&mut self, index: usize) -> Result<&mut V, OutOfRange> {
		let len = self.entries.len();
		self.entries
			.get_mut(index)
			.map(|(_, v)| v)
			.ok_or(OutOfRange { index, len })
	}

	/// Returns the map that stores the entry at a global index, with its local index there.
	///
	/// Entries owned by an ancestor can only be read through the returned
	/// reference; mutate them on the ancestor itself via
	/// [`CascadedMap::local_value_at_mut`].
	pub fn owner_map(&self, index: usize) -> Result<(&CascadedMap<'p, K, V>, usize), OutOfRange> {
		let mut map = self;
		let mut local = index;
		loop {
			let count = map.entries.len();
			if local < count {
				return Ok((map, local));
			}
			match map.parent {
				Some(parent) => {
					local -= count;
					map = parent;
				}
				None => {
					return Err(OutOfRange {
						index,
						len: self.len(),
					});
				}
			}
		}
	}

	/// Appends `key` with `value` to this map.
	///
	/// Returns `false` and leaves the map untouched if `key` already exists
	/// locally. Keys that only exist in an ancestor are shadowed.
	pub fn insert_local(&mut self, key: K, value: V) -> bool {
		if self.positions.contains_key(&key) {
			return false;
		}
		self.positions.insert(key.clone(), self.entries.len());
		self.entries.push((key, value));
		true
	}

	/// Returns the local value for `key`, appending a default entry if missing.
	pub fn get_or_insert_local(&mut self, key: K) -> &mut V
	where
		V: Default,
	{
		let index = match self.positions.get(&key) {
			Some(&index) => index,
			None => {
				let index = self.entries.len();
				self.positions.insert(key.clone(), index);
				self.entries.push((key, V::default()));
				index
			}
		};
		&mut self.entries[index].1
	}

	/// Iterates all entries in global index order: local entries, then each ancestor's.
	///
	/// Shadowed ancestor entries are included, since they keep their global index.
	pub fn iter(&self) -> Iter<'_, 'p, K, V> {
		Iter { map: Some(self), pos: 0 }
	}

	/// Iterates the entries stored in this map only.
	pub fn local_iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
		self.entries.iter().map(|(k, v)| (k, v))
	}
}

/// Global-order iterator over a [`CascadedMap`] and its ancestors.
pub struct Iter<'a, 'p, K, V> {
	map: Option<&'a CascadedMap<'p, K, V>>,
	pos: usize,
}

impl<'a, 'p: 'a, K, V> Iterator for Iter<'a, 'p, K, V> {
	type Item = (&'a K, &'a V);

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			let map = self.map?;
			if let Some((k, v)) = map.entries.get(self.pos) {
				self.pos += 1;
				return Some((k, v));
			}
			self.map = map.parent;
			self.pos = 0;
		}
	}
}
