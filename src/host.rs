//! The adapter interface to the mutable presentation tree that gets rendered into.

use crate::{error::HostError, events::Event};
use core::{fmt::Debug, hash::Hash};
use std::rc::Rc;

/// A stable, opaque identifier of a host node, assigned when the node is created.
///
/// No two live nodes of the same [`HostTree`] share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// A native event listener. It receives the node the event originated at.
pub type NativeListener<N> = Rc<dyn Fn(&N, &mut Event)>;

/// A retained-mode presentation tree, mutated through handles.
///
/// Implementations are cheap to clone, with clones referring to the same tree.
/// Methods take `&self` so that listeners may hold a clone while the tree is being dispatched from.
///
/// Child indices count both element and text children.
pub trait HostTree: Clone + 'static {
	type Node: Clone + PartialEq + Debug + 'static;

	/// # Errors
	///
	/// Iff the host can't create an element with this name.
	fn create_element(&self, tag: &str) -> Result<Self::Node, HostError>;
	fn create_text(&self, text: &str) -> Self::Node;

	/// Replaces the text content of a text node.
	fn set_text(&self, node: &Self::Node, text: &str);

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&self, node: &Self::Node, name: &str);

	/// Sets a live boolean property (for example `checked`), as opposed to an attribute.
	fn set_property(&self, node: &Self::Node, name: &str, value: bool);
	/// Resets a live boolean property and removes a same-named attribute.
	fn remove_property(&self, node: &Self::Node, name: &str);

	/// Sets one entry of the node's style, keeping the others.
	fn set_style(&self, node: &Self::Node, name: &str, value: &str);
	fn remove_style(&self, node: &Self::Node, name: &str);

	fn append_child(&self, parent: &Self::Node, child: &Self::Node);
	/// Inserts `child` before `reference`, or appends it if `reference` is [`None`].
	fn insert_before(&self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>);
	fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node);
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node);

	fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;
	fn child_count(&self, parent: &Self::Node) -> usize;
	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	fn key(&self, node: &Self::Node) -> NodeKey;

	/// Attaches a native listener. Events dispatched at `node` or its descendants bubble to it.
	fn add_listener(&self, node: &Self::Node, event_type: &str, listener: NativeListener<Self::Node>);
	/// Detaches a listener previously attached with an identical (same [`Rc`]) `listener`.
	fn remove_listener(&self, node: &Self::Node, event_type: &str, listener: &NativeListener<Self::Node>);
}
