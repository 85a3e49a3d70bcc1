use trellis_archive::ArchiveError;

/// Errors raised by registry mutation, persistence and the registry store.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	/// An element with this id already exists in the registry.
	#[error("duplicate element id {id:?}")]
	DuplicateId { id: String },

	/// An embedded registry with this name already exists in the host.
	#[error("duplicate embedded registry {name:?}")]
	DuplicateEmbedded { name: String },

	/// No element with this id exists in the registry.
	#[error("element {id:?} not found")]
	NotFound { id: String },

	/// Archive content could not be stored or loaded.
	#[error("registry serialization failed: {0}")]
	Serialization(#[from] ArchiveError),

	/// Reading or writing a registry file failed.
	#[error("registry file {path}: {source}")]
	Io {
		path: std::path::PathBuf,
		#[source]
		source: std::io::Error,
	},
}
