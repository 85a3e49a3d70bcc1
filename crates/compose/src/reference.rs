//! Lazily resolved dependency descriptors.
//!
//! Descriptors are installed into a component while its attributes are bound
//! and resolve nothing until first use. Single and multi references cache
//! their result until the composer generation changes (on reset or
//! release); factories never cache.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::capability::Capability;
use crate::context::ComponentContext;
use crate::error::ComposeError;

/// Everything a descriptor needs from the bind step.
pub(crate) struct Wiring {
	pub(crate) context: ComponentContext,
	pub(crate) key: &'static str,
	pub(crate) targets: Vec<String>,
	pub(crate) optional: bool,
}

type Cached<T> = Mutex<Option<(u64, T)>>;

fn cached<T: Clone>(cache: &Cached<T>, generation: u64) -> Option<T> {
	match &*cache.lock() {
		Some((stored, value)) if *stored == generation => Some(value.clone()),
		_ => None,
	}
}

/// A dependency on one element providing capability `C`.
///
/// A default-constructed reference is unbound: it resolves to
/// [`ComposeError::NotFound`].
pub struct Reference<C: Capability + ?Sized> {
	context: Option<ComponentContext>,
	key: &'static str,
	target: Option<String>,
	optional: bool,
	cache: Cached<Option<Arc<C>>>,
}

impl<C: Capability + ?Sized> Reference<C> {
	pub(crate) fn from_wiring(wiring: Wiring) -> Self {
		Self {
			context: Some(wiring.context),
			key: wiring.key,
			target: wiring.targets.into_iter().next(),
			optional: wiring.optional,
			cache: Mutex::new(None),
		}
	}

	/// Returns the element name this reference points at, if set.
	pub fn target(&self) -> Option<&str> {
		self.target.as_deref()
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}

	/// Resolves the target.
	///
	/// Returns `Ok(None)` only for an optional reference whose target is
	/// unset or absent. A mandatory reference fails with
	/// [`ComposeError::NotFound`] instead.
	pub fn get(&self) -> Result<Option<Arc<C>>, ComposeError> {
		let Some(context) = &self.context else {
			return self.absent();
		};
		let generation = context.generation()?;
		if let Some(value) = cached(&self.cache, generation) {
			tracing::trace!(element = %context.element_id(), key = self.key, "reference cache hit");
			return Ok(value);
		}
		let resolved = match &self.target {
			Some(target) => context.resolve::<C>(target)?,
			None => None,
		};
		if resolved.is_none() && !self.optional {
			return self.absent();
		}
		*self.cache.lock() = Some((generation, resolved.clone()));
		Ok(resolved)
	}

	/// Resolves the target, treating absence as an error even when optional.
	pub fn require(&self) -> Result<Arc<C>, ComposeError> {
		self.get()?.ok_or_else(|| self.not_found())
	}

	fn absent(&self) -> Result<Option<Arc<C>>, ComposeError> {
		if self.optional { Ok(None) } else { Err(self.not_found()) }
	}

	fn not_found(&self) -> ComposeError {
		ComposeError::NotFound {
			name: self.target.clone().unwrap_or_else(|| self.key.to_string()),
		}
	}
}

impl<C: Capability + ?Sized> Default for Reference<C> {
	fn default() -> Self {
		Self {
			context: None,
			key: "",
			target: None,
			optional: false,
			cache: Mutex::new(None),
		}
	}
}

impl<C: Capability + ?Sized> std::fmt::Debug for Reference<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Reference")
			.field("capability", &C::TAG)
			.field("target", &self.target)
			.field("optional", &self.optional)
			.finish()
	}
}

/// A dependency on an ordered list of elements providing capability `C`.
pub struct MultiReference<C: Capability + ?Sized> {
	context: Option<ComponentContext>,
	key: &'static str,
	targets: Vec<String>,
	optional: bool,
	cache: Cached<Vec<Arc<C>>>,
}

impl<C: Capability + ?Sized> MultiReference<C> {
	pub(crate) fn from_wiring(wiring: Wiring) -> Self {
		Self {
			context: Some(wiring.context),
			key: wiring.key,
			targets: wiring.targets,
			optional: wiring.optional,
			cache: Mutex::new(None),
		}
	}

	/// Returns the element names in declaration order.
	pub fn targets(&self) -> &[String] {
		&self.targets
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}

	/// Resolves every target in declaration order.
	///
	/// Absent targets are skipped when the reference is optional and fail
	/// with [`ComposeError::NotFound`] otherwise.
	pub fn get(&self) -> Result<Vec<Arc<C>>, ComposeError> {
		let Some(context) = &self.context else {
			return Ok(Vec::new());
		};
		let generation = context.generation()?;
		if let Some(values) = cached(&self.cache, generation) {
			tracing::trace!(element = %context.element_id(), key = self.key, "multi reference cache hit");
			return Ok(values);
		}
		let mut resolved = Vec::with_capacity(self.targets.len());
		for target in &self.targets {
			match context.resolve::<C>(target)? {
				Some(value) => resolved.push(value),
				None if self.optional => {
					tracing::debug!(element = %context.element_id(), target = %target, "skipping absent optional target");
				}
				None => return Err(ComposeError::NotFound { name: target.clone() }),
			}
		}
		*self.cache.lock() = Some((generation, resolved.clone()));
		Ok(resolved)
	}
}

impl<C: Capability + ?Sized> Default for MultiReference<C> {
	fn default() -> Self {
		Self {
			context: None,
			key: "",
			targets: Vec::new(),
			optional: true,
			cache: Mutex::new(None),
		}
	}
}

impl<C: Capability + ?Sized> std::fmt::Debug for MultiReference<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MultiReference")
			.field("capability", &C::TAG)
			.field("targets", &self.targets)
			.field("optional", &self.optional)
			.finish()
	}
}

/// Builds fresh instances of one element on demand.
///
/// Products are owned by the component holding the factory and are torn
/// down with it.
pub struct Factory<C: Capability + ?Sized> {
	context: Option<ComponentContext>,
	key: &'static str,
	target: Option<String>,
	_capability: std::marker::PhantomData<fn() -> Arc<C>>,
}

impl<C: Capability + ?Sized> Factory<C> {
	pub(crate) fn from_wiring(wiring: Wiring) -> Self {
		Self {
			context: Some(wiring.context),
			key: wiring.key,
			target: wiring.targets.into_iter().next(),
			_capability: std::marker::PhantomData,
		}
	}

	pub fn target(&self) -> Option<&str> {
		self.target.as_deref()
	}

	/// Constructs a new instance of the target element.
	pub fn create(&self) -> Result<Arc<C>, ComposeError> {
		let (Some(context), Some(target)) = (&self.context, &self.target) else {
			return Err(ComposeError::NotFound {
				name: self.key.to_string(),
			});
		};
		context.create::<C>(target)
	}
}

impl<C: Capability + ?Sized> Default for Factory<C> {
	fn default() -> Self {
		Self {
			context: None,
			key: "",
			target: None,
			_capability: std::marker::PhantomData,
		}
	}
}

impl<C: Capability + ?Sized> std::fmt::Debug for Factory<C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Factory")
			.field("capability", &C::TAG)
			.field("target", &self.target)
			.finish()
	}
}
