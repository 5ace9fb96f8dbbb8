//! Rust functions made callable from JavaScript as `window` properties.
//!
//! The [`Closure`]s backing them live in a thread-local registry until they are unpublished or replaced.

use crate::Result;
use core::cell::RefCell;
use hashbrown::HashMap;
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsValue};
use web_sys::Window;

thread_local! {
	static PUBLISHED: RefCell<HashMap<String, Closure<dyn Fn()>>> = RefCell::default();
}

/// Makes `function` callable as `window[name]()`, replacing whatever was published under `name` before.
///
/// # Errors
///
/// Iff the property can't be assigned (for example on a frozen `window`).
pub fn publish(window: &Window, name: &str, function: impl Fn() + 'static) -> Result<()> {
	let closure = Closure::wrap(Box::new(function) as Box<dyn Fn()>);
	js_sys::Reflect::set(window, &JsValue::from_str(name), closure.as_ref())?;
	let previous = PUBLISHED.with(|published| published.borrow_mut().insert(name.to_owned(), closure));
	if previous.is_some() {
		trace!("Replaced published function {:?}.", name);
	} else {
		trace!("Published function {:?}.", name);
	}
	Ok(())
}

/// Removes the `window` property `name` and releases its closure, if it was published through [`publish`].
///
/// Returns whether anything was published under `name`.
///
/// # Errors
///
/// Iff the property can't be deleted.
pub fn unpublish(window: &Window, name: &str) -> Result<bool> {
	if !is_published(name) {
		return Ok(false);
	}
	// The closure must outlive the property.
	js_sys::Reflect::delete_property(window, &JsValue::from_str(name))?;
	drop(PUBLISHED.with(|published| published.borrow_mut().remove(name)));
	trace!("Unpublished function {:?}.", name);
	Ok(true)
}

#[must_use]
pub fn is_published(name: &str) -> bool {
	PUBLISHED.with(|published| published.borrow().contains_key(name))
}
