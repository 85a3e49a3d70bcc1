use std::sync::Arc;

use crate::capability::Capabilities;
use crate::context::ComponentContext;
use crate::error::ComposeError;

/// A live component built from a registry element.
///
/// Both hooks run without any internal borrow held, so `on_created` may
/// resolve references through `context`.
pub trait Component: Send + Sync + 'static {
	/// Runs once the instance and its capabilities are registered.
	///
	/// An error aborts construction; the instance is then torn down.
	fn on_created(&self, context: &ComponentContext) -> Result<(), ComposeError> {
		let _ = context;
		Ok(())
	}

	/// Runs during teardown, after every child has been torn down.
	fn on_destroyed(&self) {}
}

/// A constructed component with its capability table.
pub(crate) struct Instance {
	pub(crate) component: Arc<dyn Component>,
	pub(crate) capabilities: Capabilities,
}

impl std::fmt::Debug for Instance {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Instance").field("capabilities", &self.capabilities).finish_non_exhaustive()
	}
}
