#![cfg(all(target_arch = "wasm32", feature = "web"))]

use twig_dom::{h, host::HostTree, vnode::Props, Handler, Root, VNode};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);


#[wasm_bindgen_test]
fn text() {
	test_create_diff_identical_remove(&"Hello twig-dom text!".into(), "Hello twig-dom text!");
}

#[wasm_bindgen_test]
fn minimal_div() {
	test_create_diff_identical_remove(&h("div", (), Vec::<VNode>::new()), "<div></div>");
}

#[wasm_bindgen_test]
fn attributes() {
	test_create_diff_identical_remove(&h("a", [("href", "#top"), ("className", "link")], ["top"]), r##"<a href="#top" class="link">top</a>"##);
}

#[wasm_bindgen_test]
fn nested() {
	test_create_diff_identical_remove(&h("ul", (), [h("li", (), ["a"]), h("li", (), ["b", "c"])]), "<ul><li>a</li><li>bc</li></ul>");
}

#[wasm_bindgen_test]
fn clickable_div() {
	test_create_diff_identical_remove(&h("div", Props::new().with("onClick", Handler::new(|_| ())), Vec::<VNode>::new()), "<div></div>");
}

fn test_create_diff_identical_remove(vnode: &VNode, html: &str) {
	let (tree, container) = web_::setup();
	let mut root = Root::new(tree.clone(), container.clone());
	let inner_html = || container.dyn_ref::<Element>().unwrap().inner_html();

	root.render(vnode).unwrap();
	assert_eq!(inner_html(), html);
	let created = tree.child_at(&container, 0).unwrap();

	root.render(vnode).unwrap();
	assert_eq!(inner_html(), html);
	assert_eq!(tree.child_at(&container, 0), Some(created));

	root.unmount();
	assert_eq!(tree.child_count(&container), 0);
	assert_eq!(root.registry().borrow().node_count(), 0);

	drop(root);
	container.dyn_into::<Element>().unwrap().remove();
}
