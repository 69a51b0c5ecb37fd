//! How props map onto host attributes, properties, styles and event registrations.

use crate::{
	events::EventRegistry,
	host::HostTree,
	vnode::{PropValue, Props},
};
use indexmap::IndexMap;
use tracing::{instrument, trace, trace_span};

/// The fixed classification of a prop, in order of precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind<'a> {
	/// `className`, written to the `class` attribute.
	ClassName,
	/// `style` with a [`PropValue::Style`] mapping.
	Style(&'a IndexMap<String, String>),
	/// `on…` with a handler value. Carries the event name as written after `on`.
	Handler(&'a str),
	/// Any [`PropValue::Bool`], set as a live property.
	Boolean(bool),
	/// Everything else, set as a stringified attribute.
	Literal,
}
impl<'a> PropKind<'a> {
	#[must_use]
	pub fn classify(key: &'a str, value: &'a PropValue) -> Self {
		match (key, value) {
			("className", _) => PropKind::ClassName,
			("style", PropValue::Style(style)) => PropKind::Style(style),
			(key, PropValue::Handler(_)) if event_name(key).is_some() => PropKind::Handler(&key[2..]),
			(_, &PropValue::Bool(b)) => PropKind::Boolean(b),
			_ => PropKind::Literal,
		}
	}
}

/// `onClick` → `Some("Click")`. The caller lower-cases.
fn event_name(key: &str) -> Option<&str> {
	key.strip_prefix("on").filter(|name| !name.is_empty())
}

fn event_type(name: &str) -> String {
	name.to_ascii_lowercase()
}

/// Applies one prop to a freshly created or changed element.
#[instrument(skip(tree, registry, node, value))]
pub fn apply_prop<T: HostTree>(tree: &T, registry: &mut EventRegistry, node: &T::Node, key: &str, value: &PropValue) {
	match PropKind::classify(key, value) {
		PropKind::ClassName => tree.set_attribute(node, "class", &value.to_attribute_value()),
		PropKind::Style(style) => {
			for (name, value) in style {
				tree.set_style(node, name, value);
			}
		}
		PropKind::Handler(name) => {
			if let PropValue::Handler(handler) = value {
				registry.add_event(tree.key(node), &event_type(name), handler.clone());
			}
		}
		PropKind::Boolean(b) => tree.set_property(node, key, b),
		PropKind::Literal => tree.set_attribute(node, key, &value.to_attribute_value()),
	}
}

/// Undoes [`apply_prop`] for a prop that was removed.
#[instrument(skip(tree, registry, node, old_value))]
pub fn remove_prop<T: HostTree>(tree: &T, registry: &mut EventRegistry, node: &T::Node, key: &str, old_value: &PropValue) {
	match PropKind::classify(key, old_value) {
		PropKind::ClassName => tree.remove_attribute(node, "class"),
		PropKind::Style(_) => tree.remove_attribute(node, "style"),
		PropKind::Handler(name) => {
			if let PropValue::Handler(handler) = old_value {
				registry.remove_event(tree.key(node), &event_type(name), handler);
			}
		}
		PropKind::Boolean(_) => tree.remove_property(node, key),
		PropKind::Literal => tree.remove_attribute(node, key),
	}
}

/// Brings `node`'s props from `old` to `new`, touching only changed keys.
#[instrument(skip_all, fields(new = new.len(), old = old.len()))]
pub fn diff_props<T: HostTree>(tree: &T, registry: &mut EventRegistry, node: &T::Node, new: &Props, old: &Props) {
	for (key, value) in new.iter() {
		let old_value = old.get(key);
		if old_value.map_or(false, |old_value| unchanged(value, old_value)) {
			continue;
		}

		let span = trace_span!("Changed prop", key);
		let _enter = span.enter();
		match old_value {
			None => apply_prop(tree, registry, node, key, value),
			Some(old_value) => replace_prop(tree, registry, node, key, value, old_value),
		}
	}

	for (key, old_value) in old.iter() {
		if new.get(key).is_none() {
			let span = trace_span!("Removed prop", key);
			let _enter = span.enter();
			remove_prop(tree, registry, node, key, old_value);
		}
	}
}

/// Like `==`, except that `NaN` numbers equal each other.
#[allow(clippy::float_cmp)]
fn unchanged(value: &PropValue, old_value: &PropValue) -> bool {
	match (value, old_value) {
		(PropValue::Number(n), PropValue::Number(old_n)) => n == old_n || (n.is_nan() && old_n.is_nan()),
		_ => value == old_value,
	}
}

fn replace_prop<T: HostTree>(tree: &T, registry: &mut EventRegistry, node: &T::Node, key: &str, value: &PropValue, old_value: &PropValue) {
	match (PropKind::classify(key, value), PropKind::classify(key, old_value)) {
		(PropKind::Style(style), PropKind::Style(old_style)) => {
			for name in old_style.keys().filter(|name| !style.contains_key(*name)) {
				tree.remove_style(node, name);
			}
			for (name, value) in style.iter().filter(|(name, value)| old_style.get(*name) != Some(*value)) {
				tree.set_style(node, name, value);
			}
		}
		(_, PropKind::Handler(_)) | (_, PropKind::Style(_)) => {
			trace!("Removing previous registration or style before applying.");
			remove_prop(tree, registry, node, key, old_value);
			apply_prop(tree, registry, node, key, value);
		}
		(PropKind::Handler(_) | PropKind::Style(_), PropKind::Boolean(_) | PropKind::Literal) => {
			trace!("Removing previous attribute before applying.");
			remove_prop(tree, registry, node, key, old_value);
			apply_prop(tree, registry, node, key, value);
		}
		(PropKind::Literal, PropKind::Boolean(_)) => {
			tree.remove_property(node, key);
			apply_prop(tree, registry, node, key, value);
		}
		(PropKind::Boolean(_), PropKind::Literal) => {
			tree.remove_attribute(node, key);
			apply_prop(tree, registry, node, key, value);
		}
		_ => apply_prop(tree, registry, node, key, value),
	}
}
