//! One native listener per event type and render root, dispatching to the nearest registered handler.

use crate::{
	events::{Event, EventRegistry},
	host::{HostTree, NativeListener},
};
use core::fmt::{self, Debug, Formatter};
use indexmap::IndexSet;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{error, instrument, trace, trace_span};

/// The delegated listener state of one render root.
pub struct Delegation<T: HostTree> {
	listener: Option<NativeListener<T::Node>>,
	installed: IndexSet<String>,
}
impl<T: HostTree> Default for Delegation<T> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T: HostTree> Debug for Delegation<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Delegation")
			.field("listener", &self.listener.as_ref().map(|_| "…"))
			.field("installed", &self.installed)
			.finish()
	}
}

impl<T: HostTree> Delegation<T> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			listener: None,
			installed: IndexSet::new(),
		}
	}

	/// Whether a listener was ever installed.
	#[must_use]
	pub fn is_set_up(&self) -> bool {
		self.listener.is_some()
	}

	/// The event types listened for on the root, in order of installation.
	pub fn installed_types(&self) -> impl Iterator<Item = &str> {
		self.installed.iter().map(String::as_str)
	}

	/// Attaches the root's listener once for each delegated event type of `registry` that isn't installed yet.
	///
	/// Calling this again without new event types is a no-op.
	#[instrument(skip_all)]
	pub fn setup_event_listeners(&mut self, tree: &T, root: &T::Node, registry: &Rc<RefCell<EventRegistry>>) {
		let listener = Rc::clone(self.listener.get_or_insert_with(|| {
			trace!("Creating delegated listener.");
			make_listener(tree.clone(), root.clone(), Rc::downgrade(registry))
		}));

		let registry = registry.borrow();
		for event_type in registry.delegated_types() {
			if self.installed.contains(event_type) {
				continue;
			}
			trace!(event_type, "Installing delegated listener.");
			tree.add_listener(root, event_type, Rc::clone(&listener));
			self.installed.insert(event_type.to_owned());
		}
	}

	/// Detaches all installed native listeners from `root`.
	#[instrument(skip_all)]
	pub fn teardown(&mut self, tree: &T, root: &T::Node) {
		if let Some(listener) = self.listener.take() {
			for event_type in self.installed.drain(..) {
				trace!(event_type = event_type.as_str(), "Removing delegated listener.");
				tree.remove_listener(root, &event_type, &listener);
			}
		}
	}
}

fn make_listener<T: HostTree>(tree: T, root: T::Node, registry: Weak<RefCell<EventRegistry>>) -> NativeListener<T::Node> {
	Rc::new(move |target: &T::Node, event: &mut Event| {
		let registry = match registry.upgrade() {
			Some(registry) => registry,
			None => return trace!("Render root was dropped. Ignoring event."),
		};
		dispatch(&tree, &root, &registry, target, event);
	})
}

/// Walks from `target` up to and including `root`, and runs the handlers of the first node that has any for the event's type.
///
/// The handler list is copied before handlers run, so they may re-render.
pub fn dispatch<T: HostTree>(tree: &T, root: &T::Node, registry: &RefCell<EventRegistry>, target: &T::Node, event: &mut Event) {
	let span = trace_span!("Dispatching delegated event", event_type = event.event_type());
	let _enter = span.enter();

	let mut current = Some(target.clone());
	while let Some(node) = current {
		let key = tree.key(&node);
		let handlers = match registry.try_borrow() {
			Ok(registry) => registry.handlers(key, event.event_type()),
			Err(_) => return error!("Event dispatched while the registry is being updated. Ignoring."),
		};

		if let Some(handlers) = handlers {
			trace!(?key, count = handlers.len(), "Running handlers.");
			let previous_target = event.current_target();
			event.set_current_target(Some(key));
			for handler in handlers {
				handler.call(event);
			}
			event.set_current_target(previous_target);
			return;
		}

		if node == *root {
			break;
		}
		current = tree.parent(&node);
	}
	trace!("No handler found.");
}
