//! Hooks for host frameworks that let extensions run code around a kanban column's render.
//!
//! Counts injected here come from the group metadata the host hands over, so they include records
//! that aren't rendered. They take precedence over card counts.

use crate::{boot::Engine, config::Config, counts};
use js_sys::Reflect;
use std::rc::Rc;
use tracing::{trace, warn};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use web_sys::Element;

/// Property paths probed for a group's record count, in order.
const COUNT_PATHS: [&[&str]; 5] = [
	&["count"],
	&["data", "count"],
	&["data", "__count"],
	&["aggregateValues", "__count"],
	&["aggregateValues", "count"],
];

/// The record count carried by a host group object: the first of [`COUNT_PATHS`] that holds a value.
///
/// Missing groups, missing values and values that aren't counts give `0`.
#[must_use]
pub fn pick_count(group: &JsValue) -> u64 {
	COUNT_PATHS
		.iter()
		.find_map(|path| {
			path.iter()
				.try_fold(group.clone(), |value, key| {
					if value.is_object() {
						Reflect::get(&value, &JsValue::from_str(key)).ok()
					} else {
						None
					}
				})
				.filter(|value| !value.is_undefined() && !value.is_null())
		})
		.map_or(0, |value| count_from(&value))
}

fn count_from(value: &JsValue) -> u64 {
	let number = value.as_f64().or_else(|| value.as_string().and_then(|text| text.trim().parse().ok()));
	match number {
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		Some(number) if number.is_finite() && number >= 0.0 => number as u64,
		_ => 0,
	}
}

/// Call after a kanban column has been mounted.
///
/// Never throws.
#[wasm_bindgen(js_name = columnMounted)]
pub fn column_mounted(column: Element, group: JsValue) {
	inject(&column, &group);
}

/// Call when a kanban column is about to receive new props. The count is injected once the current
/// render has been flushed, in a microtask.
///
/// Never throws.
#[wasm_bindgen(js_name = columnWillUpdateProps)]
pub fn column_will_update_props(column: Element, group: JsValue) {
	wasm_bindgen_futures::spawn_local(async move { inject(&column, &group) });
}

fn inject(column: &Element, group: &JsValue) {
	let config = Engine::current().map_or_else(|| Rc::new(Config::default()), |engine| engine.reconciler().config().clone());
	let Some(document) = column.owner_document() else {
		return trace!("Column without owner document.");
	};
	let count = pick_count(group);
	match counts::inject_group_count(&document, column, &config.selectors, count) {
		Ok(true) => trace!("Injected group count."),
		Ok(false) => (),
		Err(error) => warn!("Could not inject group count: {}", error),
	}
}
