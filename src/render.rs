use crate::{
	delegate::Delegation,
	error::RenderError,
	events::{EventRegistry, Handler},
	host::HostTree,
	materialize::materialize,
	normalize::{normalize_with_depth, NormalizedNode, DEFAULT_MAX_COMPONENT_DEPTH},
	reconcile::reconcile,
	vnode::VNode,
};
use std::{cell::RefCell, rc::Rc};
use tracing::{error, info, instrument, trace_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
	/// How many function components may be nested along a single path before rendering fails with [`RenderError::ComponentDepthExceeded`].
	pub max_component_depth: usize,
}
impl Default for RenderOptions {
	fn default() -> Self {
		Self {
			max_component_depth: DEFAULT_MAX_COMPONENT_DEPTH,
		}
	}
}
impl RenderOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_max_component_depth(mut self, max_component_depth: usize) -> Self {
		self.max_component_depth = max_component_depth;
		self
	}
}

/// Attached to a specific host node, this `struct` renders virtual trees into its children.
///
/// The first [`render`](`Root::render`) replaces the node's content. Later calls reconcile against the tree rendered last.
///
/// Each [`Root`] owns its own [`EventRegistry`], so separate roots never see each other's handlers.
/// Dropping a [`Root`] detaches its native listeners but leaves the rendered content in place.
#[derive(Debug)]
pub struct Root<T: HostTree> {
	tree: T,
	node: T::Node,
	registry: Rc<RefCell<EventRegistry>>,
	delegation: Delegation<T>,
	previous: Option<NormalizedNode>,
	options: RenderOptions,
}

impl<T: HostTree> Root<T> {
	#[must_use]
	pub fn new(tree: T, node: T::Node) -> Self {
		Self::with_options(tree, node, RenderOptions::default())
	}

	#[must_use]
	pub fn with_options(tree: T, node: T::Node, options: RenderOptions) -> Self {
		Self {
			tree,
			node,
			registry: Rc::default(),
			delegation: Delegation::new(),
			previous: None,
			options,
		}
	}

	#[must_use]
	pub fn tree(&self) -> &T {
		&self.tree
	}

	#[must_use]
	pub fn node(&self) -> &T::Node {
		&self.node
	}

	#[must_use]
	pub fn options(&self) -> RenderOptions {
		self.options
	}

	/// The normalized tree of the last successful render.
	#[must_use]
	pub fn previous(&self) -> Option<&NormalizedNode> {
		self.previous.as_ref()
	}

	#[must_use]
	pub fn registry(&self) -> &Rc<RefCell<EventRegistry>> {
		&self.registry
	}

	#[must_use]
	pub fn delegation(&self) -> &Delegation<T> {
		&self.delegation
	}

	/// Renders `vnode` into the root and makes sure its event types are listened for.
	///
	/// # Errors
	///
	/// Normalization errors ([`RenderError::ComponentRenderFailure`], [`RenderError::ComponentDepthExceeded`]) leave the host tree untouched.
	///
	/// If materialization fails, the host tree may be partially updated.
	/// The next render then starts over as if it were the first.
	#[instrument(skip_all)]
	pub fn render(&mut self, vnode: &VNode) -> Result<(), RenderError> {
		let normalized = normalize_with_depth(vnode, self.options.max_component_depth)?;

		let result = {
			let mut registry = self.registry.borrow_mut();
			match self.previous.as_ref() {
				None => self.mount(&mut registry, &normalized),
				Some(previous) => {
					let span = trace_span!("Re-render");
					let _enter = span.enter();
					reconcile(&self.tree, &mut registry, &self.node, Some(&normalized), Some(previous), 0)
				}
			}
		};
		if let Err(err) = result {
			error!("Render failed, restarting with the next render: {}", err);
			self.previous = None;
			return Err(err);
		}

		self.previous = Some(normalized);
		self.delegation.setup_event_listeners(&self.tree, &self.node, &self.registry);

		let registry = self.registry.borrow();
		info!("Nodes with handlers/delegated event types: {}/{}", registry.node_count(), self.delegation.installed_types().count());
		Ok(())
	}

	fn mount(&self, registry: &mut EventRegistry, normalized: &NormalizedNode) -> Result<(), RenderError> {
		let span = trace_span!("Initial render");
		let _enter = span.enter();
		self.clear(registry);
		let content = materialize(&self.tree, registry, normalized)?;
		self.tree.append_child(&self.node, &content);
		Ok(())
	}

	fn clear(&self, registry: &mut EventRegistry) {
		for i in (0..self.tree.child_count(&self.node)).rev() {
			if let Some(child) = self.tree.child_at(&self.node, i) {
				registry.forget_subtree(&self.tree, &child);
				self.tree.remove_child(&self.node, &child);
			}
		}
	}

	/// Registers a handler on a host node directly, outside of any props.
	///
	/// The event type is listened for on the root when this returns.
	pub fn add_event(&mut self, node: &T::Node, event_type: &str, handler: Handler) {
		self.registry.borrow_mut().add_event(self.tree.key(node), event_type, handler);
		self.delegation.setup_event_listeners(&self.tree, &self.node, &self.registry);
	}

	pub fn remove_event(&mut self, node: &T::Node, event_type: &str, handler: &Handler) {
		self.registry.borrow_mut().remove_event(self.tree.key(node), event_type, handler);
	}

	/// Removes the rendered content, all registrations and the native listeners.
	///
	/// The root can be rendered into again afterwards.
	#[instrument(skip_all)]
	pub fn unmount(&mut self) {
		{
			let mut registry = self.registry.borrow_mut();
			self.clear(&mut registry);
			registry.clear();
		}
		self.delegation.teardown(&self.tree, &self.node);
		self.previous = None;
	}
}

impl<T: HostTree> Drop for Root<T> {
	fn drop(&mut self) {
		self.delegation.teardown(&self.tree, &self.node);
	}
}
