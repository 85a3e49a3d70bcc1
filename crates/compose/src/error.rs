use trellis_archive::ArchiveError;
use trellis_registry::{ComponentAddress, RegistryError};

/// Errors raised while building, resolving or tearing down components.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
	/// A mandatory dependency or queried name resolved to nothing.
	#[error("element {name:?} not found")]
	NotFound { name: String },

	/// The target exists but does not provide the requested capability.
	#[error("element {element:?} does not provide capability {capability}")]
	TypeMismatch { element: String, capability: &'static str },

	/// An id was registered twice.
	#[error("duplicate id {id:?}")]
	DuplicateId { id: String },

	/// Resolution reached an element that is still being constructed.
	#[error("dependency cycle through element {element:?}")]
	CycleDetected { element: String },

	/// Nested resolution went deeper than the configured limit.
	#[error("resolution depth limit {limit} exceeded at element {element:?}")]
	DepthExceeded { element: String, limit: usize },

	/// An attribute or reference could not be bound to the component.
	#[error("cannot bind {key:?} of element {element:?}: {reason}")]
	Binding { element: String, key: String, reason: String },

	/// The element's address is neither a registered class nor a composite.
	#[error("unknown component {address} for element {element:?}")]
	UnknownComponent { element: String, address: ComponentAddress },

	/// The component context was torn down or its composer dropped.
	#[error("component context of {element:?} was destroyed")]
	Destroyed { element: String },

	/// Persisted configuration could not be read or written.
	#[error(transparent)]
	Serialization(#[from] ArchiveError),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error("invalid composer configuration: {0}")]
	Config(#[from] toml::de::Error),
}
