//! Idempotent writes into host-rendered containers.
//!
//! Every helper here can run any number of times against the same node and leaves the same result
//! as running it once.

use crate::Result;
use core::cell::RefCell;
use hashbrown::HashMap;
use tracing::{debug, trace};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, NodeList};

thread_local! {
	/// `"property:value"` to the browser's serialisation of that declaration.
	static SERIALISED: RefCell<HashMap<String, String>> = RefCell::new(HashMap::new());
}

/// The [`Element`]s in `list`, skipping any other kind of node.
pub fn elements(list: NodeList) -> impl Iterator<Item = Element> {
	(0..list.length()).filter_map(move |i| list.get(i)?.dyn_into().ok())
}

/// Returns the one marker element with `class` inside `container`, creating it as the last child of
/// `container` if there is none.
///
/// Surplus markers (say, cloned along with a host template) are removed, so afterwards there is
/// exactly one.
///
/// # Errors
///
/// Iff `class` doesn't form a valid selector or the DOM refuses the insertion.
pub fn find_or_create(document: &Document, container: &Element, class: &str, extra_classes: &str) -> Result<Element> {
	let existing = container.query_selector_all(&format!(".{}", class))?;
	if let Some(first) = existing.get(0).and_then(|node| node.dyn_into::<Element>().ok()) {
		for i in 1..existing.length() {
			if let Some(surplus) = existing.get(i).and_then(|node| node.dyn_into::<Element>().ok()) {
				debug!("Removing surplus marker.");
				surplus.remove();
			}
		}
		return Ok(first);
	}

	let marker = document.create_element("div")?;
	marker.set_class_name(&if extra_classes.is_empty() { class.to_owned() } else { format!("{} {}", class, extra_classes) });
	container.append_child(&marker)?;
	trace!("Created marker.");
	Ok(marker)
}

/// Replaces the text content of `element` unless it already is exactly `text`.
///
/// Returns whether a write happened. Skipping identical writes keeps the text node (and any
/// observer watching it) undisturbed.
pub fn set_text(element: &Element, text: &str) -> bool {
	if element.text_content().as_deref() == Some(text) {
		return false;
	}
	element.set_text_content(Some(text));
	true
}

/// # Errors
///
/// Iff `name` is not a valid attribute name.
pub fn set_attribute(element: &Element, name: &str, value: &str) -> Result<()> {
	if element.get_attribute(name).as_deref() != Some(value) {
		element.set_attribute(name, value)?;
	}
	Ok(())
}

/// Sets inline style `properties` on `element`. Non-HTML elements are left alone.
///
/// Values are compared the way the browser serialises them (`#ff0000` reads back as
/// `rgb(255, 0, 0)`), so declarations already in place aren't written again.
///
/// Returns whether `element` could be styled.
///
/// # Errors
///
/// Iff the style declaration is read-only.
pub fn set_style(element: &Element, properties: &[(&str, &str)]) -> Result<bool> {
	let Some(element) = element.dyn_ref::<HtmlElement>() else {
		return Ok(false);
	};
	let style = element.style();
	for (name, value) in properties {
		if style.get_property_value(name)? != serialised(element, name, value)? {
			style.set_property(name, value)?;
		}
	}
	Ok(true)
}

fn serialised(element: &HtmlElement, name: &str, value: &str) -> Result<String> {
	let key = format!("{}:{}", name, value);
	if let Some(known) = SERIALISED.with(|cache| cache.borrow().get(&key).cloned()) {
		return Ok(known);
	}
	let Some(document) = element.owner_document() else {
		return Ok(value.to_owned());
	};
	let scratch: HtmlElement = document.create_element("div")?.unchecked_into();
	scratch.style().set_property(name, value)?;
	let known = scratch.style().get_property_value(name)?;
	SERIALISED.with(|cache| cache.borrow_mut().insert(key, known.clone()));
	Ok(known)
}
