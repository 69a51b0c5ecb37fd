use crate::{
	attributes::diff_props,
	error::RenderError,
	events::EventRegistry,
	host::HostTree,
	materialize::materialize,
	normalize::{NormalizedElement, NormalizedNode},
};
use tracing::{error, instrument, trace, trace_span, warn};

/// Updates the child of `parent` at `index` from representing `old` to representing `new`.
///
/// Children are matched by position only. Nodes that can't be updated in place (text ↔ element, or a different tag) are recreated,
/// and the registrations of discarded host subtrees are dropped from `registry`.
///
/// If the host tree turns out not to match `old`, this logs an error and falls back to insertion.
///
/// # Errors
///
/// Iff materializing a new node fails. The host tree may then be partially updated.
#[instrument(skip(tree, registry, parent, new, old))]
pub fn reconcile<T: HostTree>(tree: &T, registry: &mut EventRegistry, parent: &T::Node, new: Option<&NormalizedNode>, old: Option<&NormalizedNode>, index: usize) -> Result<(), RenderError> {
	match (new, old) {
		(None, None) => {
			trace!("Nothing to do.");
			Ok(())
		}

		(None, Some(_)) => {
			let span = trace_span!("Removing node");
			let _enter = span.enter();
			remove_at(tree, registry, parent, index);
			Ok(())
		}

		(Some(new), None) => {
			let span = trace_span!("Creating node");
			let _enter = span.enter();
			insert_at(tree, registry, parent, new, index)
		}

		(Some(NormalizedNode::Text(t_2)), Some(NormalizedNode::Text(t_1))) => {
			let span = trace_span!(
				"Diffing text node",
				changed = t_1 != t_2,
				t_1 = cfg!(feature = "dangerous-logging").then(|| t_1.as_str()),
				t_2 = cfg!(feature = "dangerous-logging").then(|| t_2.as_str())
			);
			let _enter = span.enter();
			let text = match tree.child_at(parent, index) {
				Some(text) => text,
				None => {
					error!("Expected text beyond end of host child list. Switching to insertion.");
					return insert_at(tree, registry, parent, &NormalizedNode::Text(t_2.clone()), index);
				}
			};
			if t_1 == t_2 {
				trace!("Text unchanged.");
			} else {
				tree.set_text(&text, t_2);
			}
			Ok(())
		}

		(Some(NormalizedNode::Element(e_2)), Some(NormalizedNode::Element(e_1))) if e_1.tag == e_2.tag => {
			let span = trace_span!("Diffing element", tag = e_1.tag.as_str());
			let _enter = span.enter();
			let element = match tree.child_at(parent, index) {
				Some(element) => element,
				None => {
					error!("Expected <{}> beyond end of host child list. Switching to insertion.", e_1.tag);
					return insert_at(tree, registry, parent, &NormalizedNode::Element(e_2.clone()), index);
				}
			};
			update_element(tree, registry, &element, e_2, e_1)
		}

		// Mismatching nodes: Destroy and rebuild.
		(Some(new), Some(old)) => {
			let span = trace_span!("Replacing mismatching node", new_tag = new.as_element().map(|e| e.tag.as_str()), old_tag = old.as_element().map(|e| e.tag.as_str()));
			let _enter = span.enter();
			replace_at(tree, registry, parent, new, index)
		}
	}
}

fn update_element<T: HostTree>(tree: &T, registry: &mut EventRegistry, element: &T::Node, new: &NormalizedElement, old: &NormalizedElement) -> Result<(), RenderError> {
	diff_props(tree, registry, element, &new.props, &old.props);
	reconcile_children(tree, registry, element, &new.children, &old.children)
}

/// Positional child diff. Surplus old children are removed from the back so that lower indices stay valid.
#[instrument(skip_all, fields(new = new.len(), old = old.len()))]
pub fn reconcile_children<T: HostTree>(tree: &T, registry: &mut EventRegistry, parent: &T::Node, new: &[NormalizedNode], old: &[NormalizedNode]) -> Result<(), RenderError> {
	for (i, new_child) in new.iter().enumerate() {
		reconcile(tree, registry, parent, Some(new_child), old.get(i), i)?;
	}
	for i in (new.len()..old.len()).rev() {
		reconcile(tree, registry, parent, None, Some(&old[i]), i)?;
	}
	Ok(())
}

fn insert_at<T: HostTree>(tree: &T, registry: &mut EventRegistry, parent: &T::Node, new: &NormalizedNode, index: usize) -> Result<(), RenderError> {
	let node = materialize(tree, registry, new)?;
	let reference = tree.child_at(parent, index);
	tree.insert_before(parent, &node, reference.as_ref());
	Ok(())
}

fn remove_at<T: HostTree>(tree: &T, registry: &mut EventRegistry, parent: &T::Node, index: usize) {
	match tree.child_at(parent, index) {
		Some(child) => {
			registry.forget_subtree(tree, &child);
			tree.remove_child(parent, &child);
		}
		None => warn!("Expected to remove node beyond end of host child list. Ignoring."),
	}
}

fn replace_at<T: HostTree>(tree: &T, registry: &mut EventRegistry, parent: &T::Node, new: &NormalizedNode, index: usize) -> Result<(), RenderError> {
	let old_child = match tree.child_at(parent, index) {
		Some(old_child) => old_child,
		None => {
			error!("Expected to replace node beyond end of host child list. Switching to insertion.");
			return insert_at(tree, registry, parent, new, index);
		}
	};

	let new_child = materialize(tree, registry, new)?;
	registry.forget_subtree(tree, &old_child);
	tree.replace_child(parent, &new_child, &old_child);
	Ok(())
}
