//! An arena-backed [`HostTree`] with native event bubbling.
//!
//! Nodes are never deallocated: removed nodes stay valid as detached handles, so their identity can still be compared after a diff.

use crate::{
	error::HostError,
	events::Event,
	host::{HostTree, NativeListener, NodeKey},
};
use core::fmt::{self, Debug, Formatter};
use indexmap::IndexMap;
use std::{
	cell::{Ref, RefCell, RefMut},
	rc::Rc,
};
use tracing::{trace, warn};

/// A handle to a node of a [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryNode(usize);

/// Counts of host mutations since creation or the last [`MemoryTree::reset_mutations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mutations {
	pub created: usize,
	pub text_writes: usize,
	pub attribute_writes: usize,
	pub property_writes: usize,
	pub style_writes: usize,
	pub insertions: usize,
	pub replacements: usize,
	pub removals: usize,
}
impl Mutations {
	/// Whether nothing at all was changed.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// A cheaply cloneable handle to a shared in-memory tree.
///
/// The arena only grows: nodes are never freed, so a long-lived tree keeps every node it ever created.
///
/// # Panics
///
/// Handles are plain arena indices and aren't checked against the tree they came from.
/// Every method panics if given a [`MemoryNode`] of another [`MemoryTree`] whose index is out of range here, and otherwise acts on an unrelated node.
#[derive(Clone, Default)]
pub struct MemoryTree(Rc<RefCell<Arena>>);

#[derive(Default)]
struct Arena {
	slots: Vec<Slot>,
	mutations: Mutations,
}

struct Slot {
	data: NodeData,
	parent: Option<usize>,
	children: Vec<usize>,
	listeners: Vec<(String, NativeListener<MemoryNode>)>,
}

enum NodeData {
	Element(ElementData),
	Text(String),
}

#[derive(Default)]
struct ElementData {
	tag: String,
	attributes: IndexMap<String, String>,
	properties: IndexMap<String, bool>,
	style: IndexMap<String, String>,
}

impl Debug for MemoryTree {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let arena = self.0.borrow();
		f.debug_struct("MemoryTree")
			.field("nodes", &arena.slots.len())
			.field("mutations", &arena.mutations)
			.finish()
	}
}

impl MemoryTree {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn arena(&self) -> Ref<'_, Arena> {
		self.0.borrow()
	}

	fn arena_mut(&self) -> RefMut<'_, Arena> {
		self.0.borrow_mut()
	}

	fn push(&self, data: NodeData) -> MemoryNode {
		let mut arena = self.arena_mut();
		arena.mutations.created += 1;
		arena.slots.push(Slot {
			data,
			parent: None,
			children: Vec::new(),
			listeners: Vec::new(),
		});
		MemoryNode(arena.slots.len() - 1)
	}

	#[must_use]
	pub fn mutations(&self) -> Mutations {
		self.arena().mutations
	}

	pub fn reset_mutations(&self) {
		self.arena_mut().mutations = Mutations::default();
	}

	/// The element's tag name, or [`None`] for text nodes.
	#[must_use]
	pub fn tag(&self, node: MemoryNode) -> Option<String> {
		match &self.arena().slots[node.0].data {
			NodeData::Element(element) => Some(element.tag.clone()),
			NodeData::Text(_) => None,
		}
	}

	/// The text node's content, or [`None`] for elements.
	#[must_use]
	pub fn text(&self, node: MemoryNode) -> Option<String> {
		match &self.arena().slots[node.0].data {
			NodeData::Text(text) => Some(text.clone()),
			NodeData::Element(_) => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: MemoryNode, name: &str) -> Option<String> {
		self.with_element(node, |element| element.attributes.get(name).cloned()).flatten()
	}

	#[must_use]
	pub fn property(&self, node: MemoryNode, name: &str) -> Option<bool> {
		self.with_element(node, |element| element.properties.get(name).copied()).flatten()
	}

	#[must_use]
	pub fn style(&self, node: MemoryNode, name: &str) -> Option<String> {
		self.with_element(node, |element| element.style.get(name).cloned()).flatten()
	}

	#[must_use]
	pub fn children(&self, node: MemoryNode) -> Vec<MemoryNode> {
		self.arena().slots[node.0].children.iter().copied().map(MemoryNode).collect()
	}

	/// The number of native listeners attached directly to `node`.
	#[must_use]
	pub fn listener_count(&self, node: MemoryNode) -> usize {
		self.arena().slots[node.0].listeners.len()
	}

	fn with_element<R>(&self, node: MemoryNode, f: impl FnOnce(&ElementData) -> R) -> Option<R> {
		match &self.arena().slots[node.0].data {
			NodeData::Element(element) => Some(f(element)),
			NodeData::Text(_) => None,
		}
	}

	fn with_element_mut(&self, node: MemoryNode, operation: &str, f: impl FnOnce(&mut ElementData, &mut Mutations)) {
		let mut arena = self.arena_mut();
		let Arena { slots, mutations } = &mut *arena;
		match &mut slots[node.0].data {
			NodeData::Element(element) => f(element, mutations),
			NodeData::Text(_) => warn!(?node, "Tried to {} on a text node. Ignoring.", operation),
		}
	}

	/// Serializes the children of `node` as HTML.
	#[must_use]
	pub fn inner_html(&self, node: MemoryNode) -> String {
		let arena = self.arena();
		let mut html = String::new();
		for &child in &arena.slots[node.0].children {
			arena.write_html(child, &mut html);
		}
		html
	}

	/// Serializes `node` itself as HTML.
	#[must_use]
	pub fn outer_html(&self, node: MemoryNode) -> String {
		let mut html = String::new();
		self.arena().write_html(node.0, &mut html);
		html
	}

	/// Dispatches a bubbling event at `target`, calling native listeners from `target` up to the topmost ancestor.
	///
	/// No borrow of the tree is held while listeners run, so they may mutate it.
	pub fn dispatch(&self, target: MemoryNode, event_type: &str) -> Event {
		let mut event = Event::new(event_type, self.key(&target));
		let mut current = Some(target);
		while let Some(node) = current {
			let listeners: Vec<NativeListener<MemoryNode>> = self.arena().slots[node.0]
				.listeners
				.iter()
				.filter(|(ty, _)| ty == event_type)
				.map(|(_, listener)| Rc::clone(listener))
				.collect();

			for listener in listeners {
				event.set_current_target(Some(self.key(&node)));
				listener(&target, &mut event);
			}
			if event.propagation_stopped() {
				trace!(?node, "Propagation stopped.");
				break;
			}
			current = self.parent(&node);
		}
		event.set_current_target(None);
		event
	}

	fn detach(arena: &mut Arena, child: usize) {
		if let Some(parent) = arena.slots[child].parent.take() {
			arena.slots[parent].children.retain(|&c| c != child);
		}
	}
}

impl Arena {
	fn write_html(&self, node: usize, html: &mut String) {
		match &self.slots[node].data {
			NodeData::Text(text) => escape_into(text, false, html),
			NodeData::Element(element) => {
				html.push('<');
				html.push_str(&element.tag);
				for (name, value) in &element.attributes {
					if name == "style" && !element.style.is_empty() {
						continue;
					}
					html.push(' ');
					html.push_str(name);
					html.push_str("=\"");
					escape_into(value, true, html);
					html.push('"');
				}
				for (name, value) in &element.properties {
					if *value && !element.attributes.contains_key(name) {
						html.push(' ');
						html.push_str(name);
					}
				}
				if !element.style.is_empty() {
					let declarations = element.style.iter().map(|(name, value)| format!("{}: {};", name, value)).collect::<Vec<_>>().join(" ");
					html.push_str(" style=\"");
					escape_into(&declarations, true, html);
					html.push('"');
				}
				html.push('>');
				for &child in &self.slots[node].children {
					self.write_html(child, html);
				}
				html.push_str("</");
				html.push_str(&element.tag);
				html.push('>');
			}
		}
	}
}

fn escape_into(text: &str, attribute: bool, html: &mut String) {
	for c in text.chars() {
		match c {
			'&' => html.push_str("&amp;"),
			'<' => html.push_str("&lt;"),
			'>' => html.push_str("&gt;"),
			'"' if attribute => html.push_str("&quot;"),
			c => html.push(c),
		}
	}
}

impl HostTree for MemoryTree {
	type Node = MemoryNode;

	fn create_element(&self, tag: &str) -> Result<MemoryNode, HostError> {
		if tag.is_empty() {
			return Err(HostError::new("empty tag name"));
		}
		Ok(self.push(NodeData::Element(ElementData {
			tag: tag.to_owned(),
			..ElementData::default()
		})))
	}

	fn create_text(&self, text: &str) -> MemoryNode {
		self.push(NodeData::Text(text.to_owned()))
	}

	fn set_text(&self, node: &MemoryNode, text: &str) {
		let mut arena = self.arena_mut();
		let Arena { slots, mutations } = &mut *arena;
		match &mut slots[node.0].data {
			NodeData::Text(data) => {
				mutations.text_writes += 1;
				text.clone_into(data);
			}
			NodeData::Element(_) => warn!(?node, "Tried to set text data of an element. Ignoring."),
		}
	}

	fn set_attribute(&self, node: &MemoryNode, name: &str, value: &str) {
		self.with_element_mut(*node, "set an attribute", |element, mutations| {
			mutations.attribute_writes += 1;
			element.attributes.insert(name.to_owned(), value.to_owned());
		});
	}

	fn remove_attribute(&self, node: &MemoryNode, name: &str) {
		self.with_element_mut(*node, "remove an attribute", |element, mutations| {
			mutations.attribute_writes += 1;
			element.attributes.shift_remove(name);
			if name == "style" {
				element.style.clear();
			}
		});
	}

	fn set_property(&self, node: &MemoryNode, name: &str, value: bool) {
		self.with_element_mut(*node, "set a property", |element, mutations| {
			mutations.property_writes += 1;
			element.properties.insert(name.to_owned(), value);
		});
	}

	fn remove_property(&self, node: &MemoryNode, name: &str) {
		self.with_element_mut(*node, "remove a property", |element, mutations| {
			mutations.property_writes += 1;
			element.properties.shift_remove(name);
			element.attributes.shift_remove(name);
		});
	}

	fn set_style(&self, node: &MemoryNode, name: &str, value: &str) {
		self.with_element_mut(*node, "set a style", |element, mutations| {
			mutations.style_writes += 1;
			element.style.insert(name.to_owned(), value.to_owned());
		});
	}

	fn remove_style(&self, node: &MemoryNode, name: &str) {
		self.with_element_mut(*node, "remove a style", |element, mutations| {
			mutations.style_writes += 1;
			element.style.shift_remove(name);
		});
	}

	fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) {
		self.insert_before(parent, child, None);
	}

	fn insert_before(&self, parent: &MemoryNode, child: &MemoryNode, reference: Option<&MemoryNode>) {
		let mut arena = self.arena_mut();
		Self::detach(&mut arena, child.0);
		let position = match reference {
			None => None,
			Some(reference) => {
				let position = arena.slots[parent.0].children.iter().position(|&c| c == reference.0);
				if position.is_none() {
					warn!(?parent, ?reference, "Reference node is not a child of the parent. Appending instead.");
				}
				position
			}
		};
		let children = &mut arena.slots[parent.0].children;
		match position {
			Some(position) => children.insert(position, child.0),
			None => children.push(child.0),
		}
		arena.slots[child.0].parent = Some(parent.0);
		arena.mutations.insertions += 1;
	}

	fn replace_child(&self, parent: &MemoryNode, new_child: &MemoryNode, old_child: &MemoryNode) {
		let mut arena = self.arena_mut();
		Self::detach(&mut arena, new_child.0);
		let position = match arena.slots[parent.0].children.iter().position(|&c| c == old_child.0) {
			Some(position) => position,
			None => return warn!(?parent, ?old_child, "Replaced node is not a child of the parent. Ignoring."),
		};
		arena.slots[parent.0].children[position] = new_child.0;
		arena.slots[old_child.0].parent = None;
		arena.slots[new_child.0].parent = Some(parent.0);
		arena.mutations.replacements += 1;
	}

	fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) {
		let mut arena = self.arena_mut();
		if arena.slots[child.0].parent != Some(parent.0) {
			return warn!(?parent, ?child, "Removed node is not a child of the parent. Ignoring.");
		}
		Self::detach(&mut arena, child.0);
		arena.mutations.removals += 1;
	}

	fn child_at(&self, parent: &MemoryNode, index: usize) -> Option<MemoryNode> {
		self.arena().slots[parent.0].children.get(index).copied().map(MemoryNode)
	}

	fn child_count(&self, parent: &MemoryNode) -> usize {
		self.arena().slots[parent.0].children.len()
	}

	fn parent(&self, node: &MemoryNode) -> Option<MemoryNode> {
		self.arena().slots[node.0].parent.map(MemoryNode)
	}

	fn key(&self, node: &MemoryNode) -> NodeKey {
		NodeKey(node.0 as u64)
	}

	fn add_listener(&self, node: &MemoryNode, event_type: &str, listener: NativeListener<MemoryNode>) {
		self.arena_mut().slots[node.0].listeners.push((event_type.to_owned(), listener));
	}

	fn remove_listener(&self, node: &MemoryNode, event_type: &str, listener: &NativeListener<MemoryNode>) {
		self.arena_mut().slots[node.0]
			.listeners
			.retain(|(ty, l)| !(ty == event_type && Rc::ptr_eq(l, listener)));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;

	#[test]
	fn insert_before_and_replace() {
		let tree = MemoryTree::new();
		let root = tree.create_element("div").unwrap();
		let a = tree.create_text("a");
		let b = tree.create_text("b");
		let c = tree.create_element("i").unwrap();

		tree.append_child(&root, &b);
		tree.insert_before(&root, &a, Some(&b));
		assert_eq!(tree.inner_html(root), "ab");

		tree.replace_child(&root, &c, &a);
		assert_eq!(tree.inner_html(root), "<i></i>b");
		assert_eq!(tree.parent(&a), None);

		tree.remove_child(&root, &b);
		assert_eq!(tree.children(root), vec![c]);
	}

	#[test]
	fn serializes_attributes_properties_and_style() {
		let tree = MemoryTree::new();
		let input = tree.create_element("input").unwrap();
		tree.set_attribute(&input, "value", "a \"b\" & <c>");
		tree.set_property(&input, "disabled", true);
		tree.set_property(&input, "checked", false);
		tree.set_style(&input, "color", "red");
		assert_eq!(
			tree.outer_html(input),
			r#"<input value="a &quot;b&quot; &amp; &lt;c&gt;" disabled style="color: red;"></input>"#
		);
	}

	#[test]
	fn dispatch_bubbles_until_stopped() {
		let tree = MemoryTree::new();
		let outer = tree.create_element("div").unwrap();
		let inner = tree.create_element("span").unwrap();
		tree.append_child(&outer, &inner);

		let calls = Rc::new(Cell::new(0));
		let counting: NativeListener<MemoryNode> = {
			let calls = Rc::clone(&calls);
			Rc::new(move |_: &MemoryNode, _: &mut Event| calls.set(calls.get() + 1))
		};
		tree.add_listener(&outer, "click", Rc::clone(&counting));
		tree.add_listener(&inner, "click", Rc::new(|_: &MemoryNode, event: &mut Event| event.stop_propagation()));

		tree.dispatch(inner, "click");
		assert_eq!(calls.get(), 0);

		tree.dispatch(outer, "click");
		assert_eq!(calls.get(), 1);

		tree.remove_listener(&outer, "click", &counting);
		tree.dispatch(outer, "click");
		assert_eq!(calls.get(), 1);
	}
}
