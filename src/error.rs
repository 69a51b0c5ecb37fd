use std::error::Error;
use thiserror::Error;

/// Errors that abort a render call.
///
/// A failing [`Root::render`](`crate::render::Root::render`) leaves the previously rendered tree in place
/// as long as the error originated during normalization, which is the case for every variant except [`RenderError::UnsupportedNode`] and [`RenderError::Host`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
	/// A normalized node can't be represented in the host tree.
	#[error("unsupported node: {reason}")]
	UnsupportedNode { reason: String },

	/// A function component returned an error. The component's error is kept unchanged as [`Error::source`].
	#[error("component {component} failed to render")]
	ComponentRenderFailure {
		component: String,
		#[source]
		source: Box<dyn Error + 'static>,
	},

	/// Component resolution nested deeper than [`RenderOptions::max_component_depth`](`crate::render::RenderOptions::max_component_depth`).
	///
	/// This usually means a component (indirectly) renders itself.
	#[error("component nesting exceeded the limit of {limit}")]
	ComponentDepthExceeded { limit: usize },

	#[error(transparent)]
	Host(#[from] HostError),
}

/// A host tree refused an operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("host tree error: {message}")]
pub struct HostError {
	pub message: String,
}

impl HostError {
	#[must_use]
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}
