//! Runtime configuration.
//!
//! Everything the engine knows about the host's markup lives here, so that a host theme or
//! version change can be met with a configuration object instead of a rebuild.
//! Compile-time switches are Cargo features instead (see the crate manifest).

use crate::{Error, Result};
use serde::Deserialize;
use wasm_bindgen::JsValue;

/// Window of the shared reconciliation [`Throttle`](`crate::throttle::Throttle`), in milliseconds.
pub const DEFAULT_THROTTLE_WINDOW_MS: f64 = 250.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	pub throttle_window_ms: f64,
	/// JSON-RPC endpoint the stage colors are read from.
	pub rpc_url: String,
	pub model: String,
	pub fetch_limit: u32,
	/// Used when a stage has a background color but no text color.
	pub default_foreground: String,
	/// Nearest stable ancestor of all annotated containers. The document body if unset or unmatched.
	pub observe_root: Option<String>,
	/// `window` property the manual refresh function is published under. Not published if empty.
	pub refresh_hook_name: String,
	pub selectors: Selectors,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			throttle_window_ms: DEFAULT_THROTTLE_WINDOW_MS,
			rpc_url: "/web/dataset/call_kw".to_owned(),
			model: "crm.stage".to_owned(),
			fetch_limit: 2000,
			default_foreground: "#fff".to_owned(),
			observe_root: None,
			refresh_hook_name: "__crmRefreshStageCounts".to_owned(),
			selectors: Selectors::default(),
		}
	}
}

/// CSS selectors, class names and attribute names of the host's markup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selectors {
	pub kanban_group: String,
	pub kanban_header: String,
	pub kanban_counter: String,
	pub native_counter: String,
	pub kanban_record: String,
	pub list_row: String,
	pub list_stage_cell: String,
	pub list_badge: String,
	/// Attributes carrying the entity id, in order of preference.
	pub id_attributes: Vec<String>,
	/// Attribute whose text may end in `(<id>)`, consulted only if no id attribute matched.
	pub tooltip_attribute: String,
	/// Class name (not selector) identifying count markers.
	pub marker_class: String,
	pub marker_extra_classes: String,
	pub marker_tooltip: String,
}

impl Default for Selectors {
	fn default() -> Self {
		Self {
			kanban_group: ".o_kanban_group".to_owned(),
			kanban_header: ".o_kanban_header".to_owned(),
			kanban_counter: ".o_kanban_counter".to_owned(),
			native_counter: ".o_animated_number".to_owned(),
			kanban_record: ".o_kanban_record".to_owned(),
			list_row: ".o_list_view table tbody tr".to_owned(),
			list_stage_cell: r#"td.o_data_cell[data-name="stage_id"], td[data-field="stage_id"]"#.to_owned(),
			list_badge: ".o_m2o_badge, .o_field_widget, span, a".to_owned(),
			id_attributes: vec!["data-id".to_owned(), "data-res-id".to_owned()],
			tooltip_attribute: "title".to_owned(),
			marker_class: "o_stage_real_count".to_owned(),
			marker_extra_classes: "ms-2 text-900 text-nowrap".to_owned(),
			marker_tooltip: "Lead count".to_owned(),
		}
	}
}

impl Selectors {
	#[must_use]
	pub fn marker_selector(&self) -> String {
		format!(".{}", self.marker_class)
	}
}

impl Config {
	/// Reads a configuration object handed over from JavaScript.
	///
	/// `undefined` and `null` select the defaults. Missing keys keep their default values.
	///
	/// # Errors
	///
	/// Iff `value` can't be serialised by `JSON.stringify` or doesn't describe a [`Config`].
	pub fn from_js(value: &JsValue) -> Result<Self> {
		if value.is_undefined() || value.is_null() {
			return Ok(Self::default());
		}
		let json = js_sys::JSON::stringify(value)?;
		Self::from_json(&json.as_string().unwrap_or_default())
	}

	/// # Errors
	///
	/// Iff `json` doesn't describe a [`Config`].
	pub fn from_json(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(Error::Config)
	}
}
