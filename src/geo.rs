//! Coordinate model of the map picker field.
//!
//! The map itself belongs to the host's mapping library; this side decides which point a record
//! starts at and what is written back, always both coordinates together.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

/// Shown for records that don't have a location yet.
pub const DEFAULT_POINT: GeoPoint = GeoPoint {
	lat: 41.311_081,
	lng: 69.240_562,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lng: f64,
}

#[derive(Debug, Default, Deserialize)]
struct GeoFields {
	#[serde(default)]
	geo_lat: Value,
	#[serde(default)]
	geo_lng: Value,
}

impl GeoPoint {
	/// The starting point for a record's `geo_lat`/`geo_lng` fields, each falling back to
	/// [`DEFAULT_POINT`] separately.
	///
	/// # Errors
	///
	/// Iff `json` isn't a JSON object.
	pub fn from_record_json(json: &str) -> Result<Self> {
		let fields: GeoFields = serde_json::from_str(json).map_err(Error::Data)?;
		Ok(Self {
			lat: coordinate(&fields.geo_lat).unwrap_or(DEFAULT_POINT.lat),
			lng: coordinate(&fields.geo_lng).unwrap_or(DEFAULT_POINT.lng),
		})
	}

	/// The field update to send after a click or a marker drag.
	#[must_use]
	pub fn commit_payload(self) -> Value {
		json!({ "geo_lat": self.lat, "geo_lng": self.lng })
	}
}

/// The host stores unset floats as `false` or `0`, both of which mean the null island. Only absent
/// values and text that isn't a number fall back.
fn coordinate(value: &Value) -> Option<f64> {
	match value {
		Value::Null => None,
		Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
		Value::Number(number) => number.as_f64(),
		Value::String(text) => text.trim().parse().ok().filter(|number: &f64| number.is_finite()),
		Value::Array(_) | Value::Object(_) => None,
	}
}

fn to_js(value: &Value) -> Result<JsValue> {
	Ok(js_sys::JSON::parse(&value.to_string())?)
}

/// `{ lat, lng }` to open the map at for a record's data object.
///
/// Never throws; unusable records open at the default point.
#[wasm_bindgen(js_name = geoInitialPoint)]
pub fn geo_initial_point(record_data: &JsValue) -> JsValue {
	let point = if record_data.is_undefined() || record_data.is_null() {
		DEFAULT_POINT
	} else {
		js_sys::JSON::stringify(record_data)
			.map_err(Error::from)
			// Functions and symbols stringify to `undefined`, which no record parses from.
			.and_then(|json| GeoPoint::from_record_json(&json.as_string().unwrap_or_default()))
			.unwrap_or_else(|error| {
				warn!("Unusable record data for the map picker: {}", error);
				DEFAULT_POINT
			})
	};
	to_js(&json!(point)).unwrap_or(JsValue::NULL)
}

/// `{ geo_lat, geo_lng }` to hand to the host's record update.
#[wasm_bindgen(js_name = geoCommitPayload)]
pub fn geo_commit_payload(lat: f64, lng: f64) -> JsValue {
	to_js(&GeoPoint { lat, lng }.commit_payload()).unwrap_or(JsValue::NULL)
}
