//! Passive observation of structural changes below a root node, plus viewport resizes.

use crate::Result;
use js_sys::Array;
use tracing::{instrument, trace};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord, Node, Window};

/// A live observation session. [`stop`](`ChangeObserver::stop`)s when dropped.
///
/// Only child list changes are observed, never attributes or character data, so the appliers' own
/// style writes can't feed back into another pass.
pub struct ChangeObserver {
	mutation_observer: MutationObserver,
	window: Window,
	_on_mutation: Closure<dyn FnMut(Array, MutationObserver)>,
	on_resize: Closure<dyn FnMut()>,
	stopped: bool,
}

impl ChangeObserver {
	/// Starts observing `root` and the viewport. `on_change` is called once per relevant mutation batch
	/// and once per resize event; it is expected to be throttled.
	///
	/// Batches made up entirely of changes inside elements with `own_marker_class` are ignored.
	///
	/// # Errors
	///
	/// Iff the browser refuses to observe `root` or to listen for resizes.
	#[instrument(skip(root, on_change))]
	pub fn start(window: &Window, root: &Node, own_marker_class: &str, on_change: impl Fn() + 'static) -> Result<Self> {
		let on_change = std::rc::Rc::new(on_change);

		let on_mutation = Closure::wrap(Box::new({
			let on_change = on_change.clone();
			let own_marker_class = own_marker_class.to_owned();
			move |records: Array, _: MutationObserver| {
				if records.iter().all(|record| record.dyn_ref::<MutationRecord>().map_or(false, |record| is_own_mutation(record, &own_marker_class))) {
					return trace!("Ignored {} mutation record(s) inside own markers.", records.length());
				}
				on_change();
			}
		}) as Box<dyn FnMut(Array, MutationObserver)>);

		let on_resize = Closure::wrap(Box::new(move || on_change()) as Box<dyn FnMut()>);

		let mutation_observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
		let init = MutationObserverInit::new();
		init.set_child_list(true);
		init.set_subtree(true);
		mutation_observer.observe_with_options(root, &init)?;

		if let Err(error) = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref()) {
			mutation_observer.disconnect();
			return Err(error.into());
		}

		trace!("Observing.");
		Ok(Self {
			mutation_observer,
			window: window.clone(),
			_on_mutation: on_mutation,
			on_resize,
			stopped: false,
		})
	}

	/// Releases the observation. Idempotent.
	pub fn stop(&mut self) {
		if self.stopped {
			return;
		}
		self.stopped = true;
		self.mutation_observer.disconnect();
		// Can only fail for a non-function listener, which `on_resize` isn't.
		let _ = self.window.remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref());
		trace!("Stopped observing.");
	}

	#[must_use]
	pub fn is_observing(&self) -> bool {
		!self.stopped
	}
}

impl Drop for ChangeObserver {
	fn drop(&mut self) {
		self.stop();
	}
}

/// Whether `record` describes a change that only touched the inside of one of our markers,
/// like a count marker's text being replaced.
fn is_own_mutation(record: &MutationRecord, own_marker_class: &str) -> bool {
	let Some(target) = record.target() else {
		return false;
	};
	let target = match target.dyn_into::<Element>() {
		Ok(element) => element,
		Err(node) => match node.parent_element() {
			Some(parent) => parent,
			None => return false,
		},
	};
	if target.class_list().contains(own_marker_class) {
		return true;
	}

	// A marker being inserted is ours too; removals are left to count as host changes.
	let added = record.added_nodes();
	record.removed_nodes().length() == 0
		&& added.length() > 0
		&& (0..added.length()).all(|i| {
			added
				.get(i)
				.and_then(|node| node.dyn_into::<Element>().ok())
				.map_or(false, |element| element.class_list().contains(own_marker_class))
		})
}
