//! Registry of component declarations.
//!
//! A [`Registry`] holds ordered [`RegistryElement`]s (id, component address,
//! attribute bag, interface export flags) and named embedded registries. It
//! persists itself through the [`trellis_archive::Archive`] contract.
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`CascadedMap`] | Scoped insert-only map with a parent chain and global indices. |
//! | [`AttrValue`] / [`AttrType`] | Type-erased attribute values and typed extraction. |
//! | [`ComponentAddress`] | `package::component` identity of a component class. |
//! | [`RegistryElement`] | One element declaration. |
//! | [`Registry`] | Ordered elements plus embedded registries. |
//! | [`SharedRegistry`] | Lock-protected handle with cheap snapshots. |
//! | [`RegistryStore`] | Path-keyed cache of registries loaded from blob files. |

pub mod address;
pub mod cascade;
pub mod element;
mod error;
pub mod registry;
pub mod shared;
pub mod store;
pub mod tags;
pub mod value;

pub use address::{ComponentAddress, ParseAddressError};
pub use cascade::{CascadedMap, OutOfRange};
pub use element::RegistryElement;
pub use error::RegistryError;
pub use registry::Registry;
pub use shared::SharedRegistry;
pub use store::RegistryStore;
pub use value::{AttrKind, AttrType, AttrValue};
