//! Resolves function components and removes empty nodes, so that the differ only deals in text and tags.

use crate::{
	error::RenderError,
	vnode::{ComponentProps, Element, ElementType, Props, VNode},
};
use tracing::{error, instrument, trace, trace_span};

/// The default bound on component nesting, see [`normalize_with_depth`].
pub const DEFAULT_MAX_COMPONENT_DEPTH: usize = 64;

/// A fully resolved virtual node.
///
/// [`VNode::Empty`] normalizes to an empty [`NormalizedNode::Text`], and components can't be represented at all.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedNode {
	Text(String),
	Element(NormalizedElement),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedElement {
	pub tag: String,
	pub props: Props,
	/// Never contains empty text.
	pub children: Vec<NormalizedNode>,
}

impl NormalizedNode {
	#[must_use]
	pub fn is_empty_text(&self) -> bool {
		matches!(self, NormalizedNode::Text(text) if text.is_empty())
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			NormalizedNode::Text(text) => Some(text),
			NormalizedNode::Element(_) => None,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&NormalizedElement> {
		match self {
			NormalizedNode::Element(element) => Some(element),
			NormalizedNode::Text(_) => None,
		}
	}
}

impl From<NormalizedNode> for VNode {
	fn from(node: NormalizedNode) -> Self {
		match node {
			NormalizedNode::Text(text) => VNode::Text(text),
			NormalizedNode::Element(NormalizedElement { tag, props, children }) => VNode::Element(Element {
				ty: ElementType::Tag(tag),
				props,
				children: children.into_iter().map(Into::into).collect(),
			}),
		}
	}
}

/// [`normalize_with_depth`] with [`DEFAULT_MAX_COMPONENT_DEPTH`].
///
/// # Errors
///
/// See [`normalize_with_depth`].
pub fn normalize(vnode: &VNode) -> Result<NormalizedNode, RenderError> {
	normalize_with_depth(vnode, DEFAULT_MAX_COMPONENT_DEPTH)
}

/// Normalizes `vnode`, invoking each component with its props and raw children.
///
/// `max_component_depth` limits how many components may be nested along any single path.
///
/// # Errors
///
/// - [`RenderError::ComponentRenderFailure`] if a component fails,
/// - [`RenderError::ComponentDepthExceeded`] if components nest too deeply (usually a render cycle).
#[instrument(skip(vnode))]
pub fn normalize_with_depth(vnode: &VNode, max_component_depth: usize) -> Result<NormalizedNode, RenderError> {
	normalize_at(vnode, 0, max_component_depth)
}

fn normalize_at(vnode: &VNode, depth: usize, max_depth: usize) -> Result<NormalizedNode, RenderError> {
	match vnode {
		VNode::Empty => Ok(NormalizedNode::Text(String::new())),
		VNode::Text(text) => Ok(NormalizedNode::Text(text.clone())),
		VNode::Element(Element {
			ty: ElementType::Component(component),
			props,
			children,
		}) => {
			let span = trace_span!("Resolving component", component = component.name(), depth);
			let _enter = span.enter();
			if depth >= max_depth {
				error!("Component depth limit reached");
				return Err(RenderError::ComponentDepthExceeded { limit: max_depth });
			}

			let rendered = component
				.call(&ComponentProps {
					props: props.clone(),
					children: children.clone(),
				})
				.map_err(|source| RenderError::ComponentRenderFailure {
					component: component.name().to_owned(),
					source,
				})?;
			normalize_at(&rendered, depth + 1, max_depth)
		}
		VNode::Element(Element {
			ty: ElementType::Tag(tag),
			props,
			children,
		}) => {
			let mut normalized = Vec::with_capacity(children.len());
			for child in children {
				let child = normalize_at(child, depth, max_depth)?;
				if child.is_empty_text() {
					trace!(tag = tag.as_str(), "Dropping empty child.");
				} else {
					normalized.push(child);
				}
			}
			Ok(NormalizedNode::Element(NormalizedElement {
				tag: tag.clone(),
				props: props.clone(),
				children: normalized,
			}))
		}
	}
}
