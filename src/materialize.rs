use crate::{
	attributes::apply_prop,
	error::RenderError,
	events::EventRegistry,
	host::HostTree,
	normalize::{NormalizedElement, NormalizedNode},
};
use tracing::{instrument, trace, trace_span};

/// Creates a new, detached host subtree for `node`, registering its handlers in `registry`.
///
/// # Errors
///
/// - [`RenderError::UnsupportedNode`] for an element with an invalid tag name,
/// - [`RenderError::Host`] if the host refuses to create an element.
///
/// Nodes created before an error stay detached, and their handlers are unregistered again.
#[instrument(skip_all)]
pub fn materialize<T: HostTree>(tree: &T, registry: &mut EventRegistry, node: &NormalizedNode) -> Result<T::Node, RenderError> {
	match node {
		NormalizedNode::Text(text) => {
			let span = trace_span!("Creating text node", len = text.len(), text = cfg!(feature = "dangerous-logging").then(|| text.as_str()));
			let _enter = span.enter();
			Ok(tree.create_text(text))
		}
		NormalizedNode::Element(NormalizedElement { tag, props, children }) => {
			let span = trace_span!("Creating element", tag = tag.as_str(), props = props.len(), children = children.len());
			let _enter = span.enter();

			if !is_valid_tag_name(tag) {
				return Err(RenderError::UnsupportedNode {
					reason: format!("invalid tag name {:?}", tag),
				});
			}

			let element = tree.create_element(tag)?;
			for (key, value) in props.iter() {
				apply_prop(tree, registry, &element, key, value);
			}
			for child in children {
				match materialize(tree, registry, child) {
					Ok(child) => tree.append_child(&element, &child),
					Err(err) => {
						trace!("Forgetting registrations of partially created element.");
						registry.forget_subtree(tree, &element);
						return Err(err);
					}
				}
			}
			Ok(element)
		}
	}
}

/// An ASCII letter, followed by ASCII alphanumerics or any of `-_.:`.
#[must_use]
pub fn is_valid_tag_name(tag: &str) -> bool {
	let mut chars = tag.chars();
	chars.next().map_or(false, |first| first.is_ascii_alphabetic()) && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
}
