//! Handler registration, keyed by host node.

use crate::host::{HostTree, NodeKey};
use core::{
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
};
use hashbrown::HashMap;
use indexmap::{IndexMap, IndexSet};
use std::rc::Rc;
use tracing::{instrument, trace};

/// A dispatched event, as seen by native listeners and [`Handler`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
	event_type: String,
	target: NodeKey,
	current_target: Option<NodeKey>,
	propagation_stopped: bool,
}
impl Event {
	#[must_use]
	pub fn new(event_type: impl Into<String>, target: NodeKey) -> Self {
		Self {
			event_type: event_type.into(),
			target,
			current_target: None,
			propagation_stopped: false,
		}
	}

	#[must_use]
	pub fn event_type(&self) -> &str {
		&self.event_type
	}

	/// The node the event originated at.
	#[must_use]
	pub fn target(&self) -> NodeKey {
		self.target
	}

	/// The node whose handlers are currently running, if any.
	#[must_use]
	pub fn current_target(&self) -> Option<NodeKey> {
		self.current_target
	}

	pub fn set_current_target(&mut self, current_target: Option<NodeKey>) {
		self.current_target = current_target;
	}

	/// Stops native bubbling past the listener that is currently running.
	pub fn stop_propagation(&mut self) {
		self.propagation_stopped = true;
	}

	#[must_use]
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped
	}
}

/// An event handler, compared and hashed by identity.
///
/// Clones of a [`Handler`] are the same handler.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&mut Event)>);
impl Handler {
	pub fn new(handler: impl Fn(&mut Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &mut Event) {
		(self.0)(event);
	}

	fn address(&self) -> *const () {
		Rc::as_ptr(&self.0).cast::<()>()
	}
}
impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.address() == other.address()
	}
}
impl Eq for Handler {}
impl Hash for Handler {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.address().hash(state);
	}
}
impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&self.address()).finish()
	}
}

type HandlerSets = IndexMap<String, IndexSet<Handler>>;

/// Maps host nodes (by [`NodeKey`]) to their handlers per event type,
/// and remembers every event type that was ever registered.
///
/// A node's entry exists exactly as long as it has at least one handler.
#[derive(Debug, Default)]
pub struct EventRegistry {
	handlers: HashMap<NodeKey, HandlerSets>,
	delegated: IndexSet<String>,
}
impl EventRegistry {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler`. Re-adding the same handler is a no-op.
	#[instrument(skip(self))]
	pub fn add_event(&mut self, node: NodeKey, event_type: &str, handler: Handler) {
		let added = self
			.handlers
			.entry(node)
			.or_default()
			.entry(event_type.to_owned())
			.or_default()
			.insert(handler);
		if !added {
			trace!("Handler was already registered.");
		}
		if !self.delegated.contains(event_type) {
			trace!("New delegated event type.");
			self.delegated.insert(event_type.to_owned());
		}
	}

	/// Unregisters `handler`, dropping entries that become empty. Unknown registrations are ignored.
	#[instrument(skip(self))]
	pub fn remove_event(&mut self, node: NodeKey, event_type: &str, handler: &Handler) {
		let sets = match self.handlers.get_mut(&node) {
			Some(sets) => sets,
			None => return trace!("No handlers registered for this node."),
		};
		let set = match sets.get_mut(event_type) {
			Some(set) => set,
			None => return trace!("No handlers registered for this event type."),
		};

		if !set.shift_remove(handler) {
			trace!("Handler was not registered.");
		}
		if set.is_empty() {
			sets.shift_remove(event_type);
		}
		if sets.is_empty() {
			self.handlers.remove(&node);
		}
	}

	/// Drops all registrations of `node`.
	pub fn forget(&mut self, node: NodeKey) {
		if self.handlers.remove(&node).is_some() {
			trace!(?node, "Forgot handlers of discarded node.");
		}
	}

	/// Drops all registrations of `node` and its descendants.
	#[instrument(skip(self, tree, node))]
	pub fn forget_subtree<T: HostTree>(&mut self, tree: &T, node: &T::Node) {
		if self.handlers.is_empty() {
			return;
		}
		self.forget(tree.key(node));
		for i in 0..tree.child_count(node) {
			if let Some(child) = tree.child_at(node, i) {
				self.forget_subtree(tree, &child);
			}
		}
	}

	/// A snapshot of the handlers for `event_type` on `node`, in registration order.
	#[must_use]
	pub fn handlers(&self, node: NodeKey, event_type: &str) -> Option<Vec<Handler>> {
		self.handlers.get(&node)?.get(event_type).map(|set| set.iter().cloned().collect())
	}

	#[must_use]
	pub fn has_handlers(&self, node: NodeKey) -> bool {
		self.handlers.contains_key(&node)
	}

	/// The number of nodes with at least one handler.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.handlers.len()
	}

	/// Every event type that was ever registered, in order of first registration.
	pub fn delegated_types(&self) -> impl Iterator<Item = &str> {
		self.delegated.iter().map(String::as_str)
	}

	/// Clears all registrations while keeping the delegated types.
	pub fn clear(&mut self) {
		self.handlers.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;

	#[test]
	fn add_is_idempotent() {
		let count = Rc::new(Cell::new(0));
		let handler = {
			let count = Rc::clone(&count);
			Handler::new(move |_| count.set(count.get() + 1))
		};

		let mut registry = EventRegistry::new();
		registry.add_event(NodeKey(1), "click", handler.clone());
		registry.add_event(NodeKey(1), "click", handler.clone());

		let handlers = registry.handlers(NodeKey(1), "click").unwrap();
		assert_eq!(handlers.len(), 1);
		for handler in handlers {
			handler.call(&mut Event::new("click", NodeKey(1)));
		}
		assert_eq!(count.get(), 1);
	}

	#[test]
	fn removal_drops_empty_entries() {
		let a = Handler::new(|_| ());
		let b = Handler::new(|_| ());

		let mut registry = EventRegistry::new();
		registry.add_event(NodeKey(7), "click", a.clone());
		registry.add_event(NodeKey(7), "input", b.clone());

		registry.remove_event(NodeKey(7), "click", &a);
		assert!(registry.handlers(NodeKey(7), "click").is_none());
		assert!(registry.has_handlers(NodeKey(7)));

		registry.remove_event(NodeKey(7), "input", &b);
		assert!(!registry.has_handlers(NodeKey(7)));
		assert_eq!(registry.node_count(), 0);

		// Delegated types outlive their handlers.
		assert_eq!(registry.delegated_types().collect::<Vec<_>>(), ["click", "input"]);
	}

	#[test]
	fn unknown_removals_are_ignored() {
		let a = Handler::new(|_| ());
		let mut registry = EventRegistry::new();
		registry.remove_event(NodeKey(1), "click", &a);

		registry.add_event(NodeKey(1), "click", a.clone());
		registry.remove_event(NodeKey(1), "keydown", &a);
		registry.remove_event(NodeKey(1), "click", &Handler::new(|_| ()));
		assert_eq!(registry.handlers(NodeKey(1), "click"), Some(vec![a]));
	}

	#[test]
	fn handlers_keep_insertion_order() {
		let handlers: Vec<_> = (0..4).map(|_| Handler::new(|_| ())).collect();
		let mut registry = EventRegistry::new();
		for handler in handlers.iter().rev() {
			registry.add_event(NodeKey(3), "click", handler.clone());
		}
		let expected: Vec<_> = handlers.into_iter().rev().collect();
		assert_eq!(registry.handlers(NodeKey(3), "click"), Some(expected));
	}
}
