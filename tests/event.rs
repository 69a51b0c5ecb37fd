use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};
use twig_dom::{
	delegate::dispatch,
	events::{Event, EventRegistry},
	h,
	host::HostTree,
	memory::{MemoryNode, MemoryTree},
	vnode::{Props, VNode},
	Handler, Root,
};


fn counter() -> (Rc<Cell<usize>>, Handler) {
	let count = Rc::new(Cell::new(0));
	let handler = {
		let count = Rc::clone(&count);
		Handler::new(move |_| count.set(count.get() + 1))
	};
	(count, handler)
}

/// `R > A > B`, with `on_a` registered for clicks on `A`.
fn nested(on_a: Handler) -> (MemoryTree, Root<MemoryTree>, MemoryNode, MemoryNode) {
	logging_::init();
	let tree = MemoryTree::new();
	let r = tree.create_element("div").unwrap();
	let mut root = Root::new(tree.clone(), r);
	root.render(&h("section", Props::new().with("onClick", on_a), [h("span", (), ["B"])])).unwrap();
	let a = tree.children(r)[0];
	let b = tree.children(a)[0];
	(tree, root, a, b)
}

#[test]
fn nearest_registered_ancestor_wins() {
	let (a_clicks, on_a) = counter();
	let (r_clicks, on_r) = counter();
	let (tree, mut root, _, b) = nested(on_a);
	let r = *root.node();
	root.add_event(&r, "click", on_r);

	tree.dispatch(b, "click");
	assert_eq!(a_clicks.get(), 1);
	assert_eq!(r_clicks.get(), 0);

	tree.dispatch(r, "click");
	assert_eq!(a_clicks.get(), 1);
	assert_eq!(r_clicks.get(), 1);
}

#[test]
fn target_and_current_target() {
	let seen = Rc::new(RefCell::new(None));
	let on_a = {
		let seen = Rc::clone(&seen);
		Handler::new(move |event: &mut Event| *seen.borrow_mut() = Some((event.target(), event.current_target())))
	};
	let (tree, _root, a, b) = nested(on_a);

	let event = tree.dispatch(b, "click");

	assert_eq!(*seen.borrow(), Some((tree.key(&b), Some(tree.key(&a)))));
	assert_eq!(event.current_target(), None);
}

#[test]
fn handlers_of_one_node_run_in_registration_order() {
	let order = Rc::new(RefCell::new(Vec::new()));
	let log = |name: &'static str| {
		let order = Rc::clone(&order);
		Handler::new(move |_| order.borrow_mut().push(name))
	};
	let (tree, mut root, a, b) = nested(log("first"));
	root.add_event(&a, "click", log("second"));

	tree.dispatch(b, "click");
	assert_eq!(*order.borrow(), ["first", "second"]);
}

#[test]
fn unregistered_types_are_ignored() {
	let (clicks, on_a) = counter();
	let (tree, _root, _, b) = nested(on_a);

	tree.dispatch(b, "keydown");
	tree.dispatch(b, "focus");
	assert_eq!(clicks.get(), 0);
}

#[test]
fn one_native_listener_per_event_type() {
	logging_::init();
	let tree = MemoryTree::new();
	let r = tree.create_element("div").unwrap();
	let mut root = Root::new(tree.clone(), r);
	let handler = Handler::new(|_| ());

	root.render(&h("ul", (), [h("li", Props::new().with("onClick", handler.clone()), ["1"]), h("li", Props::new().with("onClick", handler.clone()), ["2"])])).unwrap();
	assert_eq!(tree.listener_count(r), 1);

	let both = h("form", Props::new().with("onInput", handler.clone()).with("onClick", handler.clone()), Vec::<VNode>::new());
	root.render(&both).unwrap();
	assert_eq!(tree.listener_count(r), 2);

	root.render(&both).unwrap();
	assert_eq!(tree.listener_count(r), 2);
	assert_eq!(root.delegation().installed_types().collect::<Vec<_>>(), ["click", "input"]);

	// Types stay delegated after their last handler is gone.
	root.render(&h("form", (), Vec::<VNode>::new())).unwrap();
	assert_eq!(tree.listener_count(r), 2);
}

#[test]
fn add_event_installs_immediately() {
	logging_::init();
	let tree = MemoryTree::new();
	let r = tree.create_element("div").unwrap();
	let mut root = Root::new(tree.clone(), r);
	let (clicks, on_click) = counter();

	root.add_event(&r, "click", on_click.clone());
	assert_eq!(tree.listener_count(r), 1);
	tree.dispatch(r, "click");
	assert_eq!(clicks.get(), 1);

	root.remove_event(&r, "click", &on_click);
	tree.dispatch(r, "click");
	assert_eq!(clicks.get(), 1);
}

#[test]
fn removed_handler_no_longer_fires() {
	logging_::init();
	let tree = MemoryTree::new();
	let r = tree.create_element("div").unwrap();
	let mut root = Root::new(tree.clone(), r);
	let (clicks, on_click) = counter();

	root.render(&h("button", Props::new().with("onClick", on_click), ["x"])).unwrap();
	let b = tree.children(r)[0];
	root.render(&h("button", (), ["x"])).unwrap();
	assert_eq!(tree.children(r)[0], b);

	tree.dispatch(b, "click");
	tree.dispatch(tree.children(b)[0], "click");
	assert_eq!(clicks.get(), 0);
}

fn button(count: usize, on_click: Handler) -> VNode {
	h("button", Props::new().with("onClick", on_click), [count])
}

#[test]
fn handlers_may_re_render() {
	logging_::init();
	let tree = MemoryTree::new();
	let r = tree.create_element("div").unwrap();
	let root = Rc::new(RefCell::new(Root::new(tree.clone(), r)));
	let count = Rc::new(Cell::new(0));

	let slot = Rc::new(RefCell::new(None::<Handler>));
	let on_click = {
		let root = Rc::downgrade(&root);
		let count = Rc::clone(&count);
		let slot = Rc::clone(&slot);
		Handler::new(move |_| {
			count.set(count.get() + 1);
			let on_click = slot.borrow().clone().unwrap();
			root.upgrade().unwrap().borrow_mut().render(&button(count.get(), on_click)).unwrap();
		})
	};
	*slot.borrow_mut() = Some(on_click.clone());

	root.borrow_mut().render(&button(0, on_click)).unwrap();
	let b = tree.children(r)[0];

	tree.dispatch(tree.children(b)[0], "click");
	assert_eq!(tree.inner_html(r), "<button>1</button>");

	tree.dispatch(b, "click");
	assert_eq!(tree.inner_html(r), "<button>2</button>");
	assert_eq!(tree.children(r)[0], b);
	assert_eq!(root.borrow().registry().borrow().node_count(), 1);

	// Break the cycle between the handler and its slot.
	slot.borrow_mut().take();
}

#[test]
fn stop_propagation_stops_native_bubbling() {
	let stopping = Handler::new(|event: &mut Event| event.stop_propagation());
	let (tree, root, _, b) = nested(stopping);

	let page = tree.create_element("body").unwrap();
	tree.append_child(&page, root.node());
	let outer_calls = Rc::new(Cell::new(0));
	{
		let outer_calls = Rc::clone(&outer_calls);
		tree.add_listener(&page, "click", Rc::new(move |_: &MemoryNode, _: &mut Event| outer_calls.set(outer_calls.get() + 1)));
	}

	let event = tree.dispatch(b, "click");
	assert!(event.propagation_stopped());
	assert_eq!(outer_calls.get(), 0);

	// Not stopped for targets without handlers.
	tree.dispatch(*root.node(), "click");
	assert_eq!(outer_calls.get(), 1);
}

#[test]
fn dispatch_walk_ends_at_the_root() {
	logging_::init();
	let tree = MemoryTree::new();
	let outer = tree.create_element("div").unwrap();
	let root = tree.create_element("div").unwrap();
	let target = tree.create_element("span").unwrap();
	tree.append_child(&outer, &root);
	tree.append_child(&root, &target);

	let (clicks, on_click) = counter();
	let registry = RefCell::new(EventRegistry::new());
	registry.borrow_mut().add_event(tree.key(&outer), "click", on_click);

	let mut event = Event::new("click", tree.key(&target));
	dispatch(&tree, &root, &registry, &target, &mut event);
	assert_eq!(clicks.get(), 0);

	dispatch(&tree, &outer, &registry, &target, &mut event);
	assert_eq!(clicks.get(), 1);
}

#[test]
fn roots_do_not_share_handlers() {
	logging_::init();
	let tree = MemoryTree::new();
	let first = tree.create_element("div").unwrap();
	let second = tree.create_element("div").unwrap();
	tree.append_child(&first, &second);

	let (outer_clicks, on_outer) = counter();
	let (inner_clicks, on_inner) = counter();
	let mut outer = Root::new(tree.clone(), first);
	outer.add_event(&first, "click", on_outer);
	let mut inner = Root::new(tree.clone(), second);
	inner.render(&h("i", Props::new().with("onClick", on_inner), ["x"])).unwrap();

	assert_eq!(outer.registry().borrow().node_count(), 1);
	assert_eq!(inner.registry().borrow().node_count(), 1);

	// Each root's listener only consults its own registry.
	let i = tree.children(second)[0];
	tree.dispatch(i, "click");
	assert_eq!(inner_clicks.get(), 1);
	assert_eq!(outer_clicks.get(), 1);
}
