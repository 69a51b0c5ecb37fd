//! A [`HostTree`] over the browser DOM.
//!
//! Node keys are stored on each node as an expando property, so they survive round trips through JavaScript.

use crate::{
	error::HostError,
	events::Event,
	host::{HostTree, NativeListener, NodeKey},
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use js_sys::Reflect;
use std::rc::Rc;
use tracing::{error, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

const KEY_PROPERTY: &str = "__twigDomKey";

type JsListener = Closure<dyn Fn(web_sys::Event)>;

/// Handle to a [`web_sys::Document`], used to create and mutate its nodes.
#[derive(Clone)]
pub struct WebTree {
	document: web_sys::Document,
	next_key: Rc<Cell<u64>>,
	listeners: Rc<RefCell<HashMap<(NodeKey, String, *const ()), JsListener>>>,
}

impl Debug for WebTree {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebTree")
			.field("next_key", &self.next_key.get())
			.field("listeners", &self.listeners.borrow().len())
			.finish()
	}
}

impl WebTree {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			next_key: Rc::new(Cell::new(1)),
			listeners: Rc::default(),
		}
	}

	/// The [`WebTree`] of the current window's document.
	///
	/// # Errors
	///
	/// Iff there is no window or it has no document.
	pub fn from_window() -> Result<Self, HostError> {
		let document = web_sys::window()
			.ok_or_else(|| HostError::new("no window"))?
			.document()
			.ok_or_else(|| HostError::new("window has no document"))?;
		Ok(Self::new(document))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	#[allow(clippy::cast_precision_loss)]
	fn assign_key(&self, node: &web_sys::Node) {
		let key = self.next_key.get();
		self.next_key.set(key + 1);
		if let Err(error) = Reflect::set(node, &JsValue::from_str(KEY_PROPERTY), &JsValue::from_f64(key as f64)) {
			error!("Failed to assign node key: {:?}", error);
		}
	}

	fn element<'a>(node: &'a web_sys::Node, operation: &str) -> Option<&'a web_sys::Element> {
		let element = node.dyn_ref::<web_sys::Element>();
		if element.is_none() {
			warn!("Tried to {} on a non-element node. Ignoring.", operation);
		}
		element
	}

	fn html_element<'a>(node: &'a web_sys::Node, operation: &str) -> Option<&'a web_sys::HtmlElement> {
		let element = node.dyn_ref::<web_sys::HtmlElement>();
		if element.is_none() {
			warn!("Tried to {} on a non-HTML element. Ignoring.", operation);
		}
		element
	}
}

impl HostTree for WebTree {
	type Node = web_sys::Node;

	fn create_element(&self, tag: &str) -> Result<web_sys::Node, HostError> {
		let element = self.document.create_element(tag).map_err(|error| HostError::new(format!("failed to create <{}>: {:?}", tag, error)))?;
		let node: web_sys::Node = element.into();
		self.assign_key(&node);
		Ok(node)
	}

	fn create_text(&self, text: &str) -> web_sys::Node {
		let node: web_sys::Node = self.document.create_text_node(text).into();
		self.assign_key(&node);
		node
	}

	fn set_text(&self, node: &web_sys::Node, text: &str) {
		node.set_text_content(Some(text));
	}

	fn set_attribute(&self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(element) = Self::element(node, "set an attribute") {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Failed to set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&self, node: &web_sys::Node, name: &str) {
		if let Some(element) = Self::element(node, "remove an attribute") {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn set_property(&self, node: &web_sys::Node, name: &str, value: bool) {
		if let Err(error) = Reflect::set(node, &JsValue::from_str(name), &JsValue::from_bool(value)) {
			error!("Failed to set property {:?}: {:?}", name, error);
		}
	}

	fn remove_property(&self, node: &web_sys::Node, name: &str) {
		self.set_property(node, name, false);
		self.remove_attribute(node, name);
	}

	fn set_style(&self, node: &web_sys::Node, name: &str, value: &str) {
		if let Some(element) = Self::html_element(node, "set a style") {
			if let Err(error) = element.style().set_property(name, value) {
				error!("Failed to set style {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_style(&self, node: &web_sys::Node, name: &str) {
		if let Some(element) = Self::html_element(node, "remove a style") {
			if let Err(error) = element.style().remove_property(name) {
				error!("Failed to remove style {:?}: {:?}", name, error);
			}
		}
	}

	fn append_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.append_child(child) {
			error!("Failed to append child: {:?}", error);
		}
	}

	fn insert_before(&self, parent: &web_sys::Node, child: &web_sys::Node, reference: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Failed to insert child: {:?}", error);
		}
	}

	fn replace_child(&self, parent: &web_sys::Node, new_child: &web_sys::Node, old_child: &web_sys::Node) {
		if let Err(error) = parent.replace_child(new_child, old_child) {
			error!("Failed to replace child: {:?}", error);
		}
	}

	fn remove_child(&self, parent: &web_sys::Node, child: &web_sys::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove child: {:?}", error);
		}
	}

	fn child_at(&self, parent: &web_sys::Node, index: usize) -> Option<web_sys::Node> {
		parent.child_nodes().get(index.try_into().ok()?)
	}

	fn child_count(&self, parent: &web_sys::Node) -> usize {
		parent.child_nodes().length() as usize
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	fn key(&self, node: &web_sys::Node) -> NodeKey {
		match Reflect::get(node, &JsValue::from_str(KEY_PROPERTY)).ok().and_then(|key| key.as_f64()) {
			Some(key) => NodeKey(key as u64),
			None => {
				// Nodes not created through this tree, like the render root itself, are keyed lazily.
				trace!("Assigning key to foreign node.");
				self.assign_key(node);
				NodeKey(self.next_key.get() - 1)
			}
		}
	}

	fn add_listener(&self, node: &web_sys::Node, event_type: &str, listener: NativeListener<web_sys::Node>) {
		let identity = Rc::as_ptr(&listener).cast::<()>();
		let key = (self.key(node), event_type.to_owned(), identity);
		let tree = self.clone();
		let js_listener: JsListener = Closure::wrap(Box::new(move |web_event: web_sys::Event| {
			let target = match web_event.target().and_then(|target| target.dyn_into::<web_sys::Node>().ok()) {
				Some(target) => target,
				None => return trace!("Event target is not a node. Ignoring."),
			};
			let mut event = Event::new(web_event.type_(), tree.key(&target));
			listener(&target, &mut event);
			if event.propagation_stopped() {
				web_event.stop_propagation();
			}
		}) as Box<dyn Fn(web_sys::Event)>);

		if let Err(error) = node.add_event_listener_with_callback(event_type, js_listener.as_ref().unchecked_ref()) {
			return error!("Failed to add event listener {:?}: {:?}", event_type, error);
		}
		if let Some(replaced) = self.listeners.borrow_mut().insert(key, js_listener) {
			warn!("Listener {:?} was added twice.", event_type);
			drop(replaced);
		}
	}

	fn remove_listener(&self, node: &web_sys::Node, event_type: &str, listener: &NativeListener<web_sys::Node>) {
		let key = (self.key(node), event_type.to_owned(), Rc::as_ptr(listener).cast::<()>());
		let js_listener = match self.listeners.borrow_mut().remove(&key) {
			Some(js_listener) => js_listener,
			None => return trace!("Listener {:?} was not added. Ignoring.", event_type),
		};
		if let Err(error) = node.remove_event_listener_with_callback(event_type, js_listener.as_ref().unchecked_ref()) {
			error!("Failed to remove event listener {:?}: {:?}", event_type, error);
		}
	}
}
