//! Virtual nodes and the tree builder.
//!
//! Trees are usually assembled with [`h`], which flattens nested child lists and drops [`VNode::Empty`] children:
//!
//! ```
//! use twig_dom::vnode::{h, Child, Props, VNode};
//!
//! let show_footer = false;
//! let list = h("ul", Props::new().with("className", "items"), [
//! 	Child::from(vec![h("li", (), ["a"]), h("li", (), ["b"])]),
//! 	Child::from(show_footer),
//! ]);
//!
//! match list {
//! 	VNode::Element(element) => assert_eq!(element.children.len(), 2),
//! 	_ => unreachable!(),
//! }
//! ```

use crate::events::Handler;
use core::fmt::{self, Debug, Formatter};
use indexmap::IndexMap;
use std::{error::Error, rc::Rc};

/// A declarative description of a piece of presentation, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
	/// Renders nothing.
	Empty,
	Text(String),
	Element(Element),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub ty: ElementType,
	pub props: Props,
	pub children: Vec<VNode>,
}

/// Either a concrete tag name or a function component that renders to another [`VNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
	Tag(String),
	Component(Component),
}

/// What a [`Component`] receives: the element's props plus its raw (not yet normalized) children.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentProps {
	pub props: Props,
	pub children: Vec<VNode>,
}

type ComponentFn = dyn Fn(&ComponentProps) -> Result<VNode, Box<dyn Error>>;

/// A named function component.
///
/// Two [`Component`]s are equal only if they share the same function instance.
#[derive(Clone)]
pub struct Component {
	name: Rc<str>,
	render: Rc<ComponentFn>,
}
impl Component {
	/// Creates a component that can fail.
	pub fn new(name: impl Into<Rc<str>>, render: impl Fn(&ComponentProps) -> Result<VNode, Box<dyn Error>> + 'static) -> Self {
		Self {
			name: name.into(),
			render: Rc::new(render),
		}
	}

	/// Creates a component that always renders.
	pub fn infallible(name: impl Into<Rc<str>>, render: impl Fn(&ComponentProps) -> VNode + 'static) -> Self {
		Self::new(name, move |props| Ok(render(props)))
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Invokes the component function.
	///
	/// # Errors
	///
	/// Iff the component function fails.
	pub fn call(&self, props: &ComponentProps) -> Result<VNode, Box<dyn Error>> {
		(self.render)(props)
	}
}
impl PartialEq for Component {
	fn eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.render).cast::<()>() == Rc::as_ptr(&other.render).cast::<()>()
	}
}
impl Debug for Component {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Component").field(&self.name).finish()
	}
}

/// A single property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
	Str(String),
	Number(f64),
	Bool(bool),
	/// Style declarations, merged onto the element's style.
	Style(IndexMap<String, String>),
	Handler(Handler),
}
impl PropValue {
	/// The literal attribute form of the value.
	///
	/// Style mappings are rendered as declaration lists, and handlers have no meaningful string form.
	#[must_use]
	pub fn to_attribute_value(&self) -> String {
		match self {
			PropValue::Str(s) => s.clone(),
			PropValue::Number(n) => number_to_string(*n),
			PropValue::Bool(b) => b.to_string(),
			PropValue::Style(style) => style.iter().map(|(name, value)| format!("{}: {};", name, value)).collect::<Vec<_>>().join(" "),
			PropValue::Handler(_) => String::new(),
		}
	}
}
impl From<&str> for PropValue {
	fn from(s: &str) -> Self {
		PropValue::Str(s.to_owned())
	}
}
impl From<String> for PropValue {
	fn from(s: String) -> Self {
		PropValue::Str(s)
	}
}
impl From<bool> for PropValue {
	fn from(b: bool) -> Self {
		PropValue::Bool(b)
	}
}
impl From<f64> for PropValue {
	fn from(n: f64) -> Self {
		PropValue::Number(n)
	}
}
impl From<i32> for PropValue {
	fn from(n: i32) -> Self {
		PropValue::Number(n.into())
	}
}
impl From<Handler> for PropValue {
	fn from(handler: Handler) -> Self {
		PropValue::Handler(handler)
	}
}
impl From<IndexMap<String, String>> for PropValue {
	fn from(style: IndexMap<String, String>) -> Self {
		PropValue::Style(style)
	}
}

/// Formats a number the way script hosts stringify theirs: integral values have no fractional part.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn number_to_string(n: f64) -> String {
	if n.is_infinite() {
		if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
	} else if n.fract() == 0.0 && n.abs() < 1e15 {
		(n as i64).to_string()
	} else {
		n.to_string()
	}
}

/// Insertion-ordered element properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props(IndexMap<String, PropValue>);
impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Option<PropValue> {
		self.0.insert(key.into(), value.into())
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&PropValue> {
		self.0.get(key)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<()> for Props {
	fn from((): ()) -> Self {
		Props::default()
	}
}
impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl<K: Into<String>, V: Into<PropValue>, const N: usize> From<[(K, V); N]> for Props {
	fn from(entries: [(K, V); N]) -> Self {
		entries.into_iter().collect()
	}
}

/// A builder argument: one node or an arbitrarily nested list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
	Node(VNode),
	List(Vec<Child>),
}

impl From<VNode> for Child {
	fn from(node: VNode) -> Self {
		Child::Node(node)
	}
}
impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Child::List(children.into_iter().map(Into::into).collect())
	}
}

macro_rules! child_via_vnode {
	($($ty:ty),*$(,)?) => {$(
		impl From<$ty> for Child {
			fn from(value: $ty) -> Self {
				Child::Node(value.into())
			}
		}
	)*};
}
child_via_vnode!(&str, String, bool, (), i32, i64, u32, u64, usize, f64, Element);

impl<T: Into<VNode>> From<Option<T>> for Child {
	fn from(value: Option<T>) -> Self {
		Child::Node(value.map_or(VNode::Empty, Into::into))
	}
}

impl From<&str> for VNode {
	fn from(text: &str) -> Self {
		VNode::Text(text.to_owned())
	}
}
impl From<String> for VNode {
	fn from(text: String) -> Self {
		VNode::Text(text)
	}
}
impl From<bool> for VNode {
	fn from(_: bool) -> Self {
		VNode::Empty
	}
}
impl From<()> for VNode {
	fn from((): ()) -> Self {
		VNode::Empty
	}
}
impl From<Element> for VNode {
	fn from(element: Element) -> Self {
		VNode::Element(element)
	}
}
impl From<f64> for VNode {
	fn from(n: f64) -> Self {
		VNode::Text(number_to_string(n))
	}
}

macro_rules! vnode_via_to_string {
	($($ty:ty),*$(,)?) => {$(
		impl From<$ty> for VNode {
			fn from(n: $ty) -> Self {
				VNode::Text(n.to_string())
			}
		}
	)*};
}
vnode_via_to_string!(i32, i64, u32, u64, usize);

impl From<&str> for ElementType {
	fn from(tag: &str) -> Self {
		ElementType::Tag(tag.to_owned())
	}
}
impl From<String> for ElementType {
	fn from(tag: String) -> Self {
		ElementType::Tag(tag)
	}
}
impl From<Component> for ElementType {
	fn from(component: Component) -> Self {
		ElementType::Component(component)
	}
}
impl From<&Component> for ElementType {
	fn from(component: &Component) -> Self {
		ElementType::Component(component.clone())
	}
}

/// Builds an [`Element`] from a type, props and a (nested) child list.
///
/// Children are flattened depth-first, left to right, and [`VNode::Empty`] children are dropped.
pub fn build<C: Into<Child>>(ty: impl Into<ElementType>, props: impl Into<Props>, children: impl IntoIterator<Item = C>) -> Element {
	let mut flat = Vec::new();
	for child in children {
		flatten_into(child.into(), &mut flat);
	}
	Element {
		ty: ty.into(),
		props: props.into(),
		children: flat,
	}
}

/// [`build`], wrapped in [`VNode::Element`].
pub fn h<C: Into<Child>>(ty: impl Into<ElementType>, props: impl Into<Props>, children: impl IntoIterator<Item = C>) -> VNode {
	VNode::Element(build(ty, props, children))
}

fn flatten_into(child: Child, flat: &mut Vec<VNode>) {
	match child {
		Child::Node(VNode::Empty) => (),
		Child::Node(node) => flat.push(node),
		Child::List(children) => {
			for child in children {
				flatten_into(child, flat);
			}
		}
	}
}
