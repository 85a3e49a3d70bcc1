//! Declarative component composition over trellis registries.
//!
//! A [`Composer`] walks a [`Registry`](trellis_registry::Registry) and turns
//! each element into a live component of the class registered for its
//! address in a [`Catalog`]. Components declare attributes, references to
//! other elements, and the capabilities they expose through an explicit
//! [`ComponentClass`] builder; references resolve lazily through the
//! component's [`ComponentContext`].
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Capability`] | Tagged interface a component can be queried for. |
//! | [`Component`] | Lifecycle hooks of a live instance. |
//! | [`ComponentClass`] / [`ClassBuilder`] | Attribute, dependency and capability descriptors. |
//! | [`Catalog`] | Address → class table. |
//! | [`Reference`] / [`MultiReference`] / [`Factory`] | Lazily resolved dependencies. |
//! | [`ComponentContext`] | Element ↔ instance binding used for resolution. |
//! | [`Composer`] | Resolver and lifecycle manager. |
//! | [`ComposerConfig`] | TOML-loadable composer settings. |
//!
//! # Example
//!
//! ```ignore
//! trait Producer: Send + Sync {
//!     fn produce(&self) -> u32;
//! }
//! trellis_compose::capability!(dyn Producer => "Producer");
//!
//! let class = ComponentClass::<Constant>::builder("demo::Constant".parse()?)
//!     .attribute(Attribute::new("Value", |c: &mut Constant, v: i64| c.value = v).with_default(1))
//!     .capability::<dyn Producer>(|c| c.clone() as Arc<dyn Producer>)
//!     .build();
//! let catalog = Arc::new(Catalog::new().with(class)?);
//! let composer = Composer::new(registry, catalog);
//! let producer = composer.query::<dyn Producer>("source")?;
//! ```

mod capability;
mod catalog;
mod class;
mod component;
mod composer;
mod config;
mod context;
mod error;
mod reference;

pub use capability::Capability;
pub use catalog::Catalog;
pub use class::{Attribute, ClassBuilder, ComponentClass, Dependency, DependencyKind};
pub use component::Component;
pub use composer::{Composer, ComposerBuilder, LifecycleState};
pub use config::ComposerConfig;
pub use context::ComponentContext;
pub use error::ComposeError;
pub use reference::{Factory, MultiReference, Reference};
