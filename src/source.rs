//! Where stage colors come from.

use crate::{config::Config, error::FetchError};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::{debug, instrument};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestCredentials, RequestInit, Response};

/// One row of the stage lookup as returned by the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StageRow {
	pub id: u64,
	#[serde(default, deserialize_with = "text_or_false")]
	pub color_hex: Option<String>,
	#[serde(default, deserialize_with = "text_or_false")]
	pub text_color_hex: Option<String>,
}

/// The host reports unset text fields as `false`. Empty strings count as unset too.
fn text_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum Field {
		Text(String),
		Flag(bool),
	}

	Ok(match Option::<Field>::deserialize(deserializer)? {
		Some(Field::Text(text)) if !text.trim().is_empty() => Some(text),
		Some(Field::Text(_) | Field::Flag(_)) | None => None,
	})
}

/// A single full read of the entity → colors lookup.
#[allow(async_fn_in_trait)] // Single-threaded; futures never cross threads.
pub trait ColorSource {
	/// # Errors
	///
	/// Iff the lookup couldn't be read in full.
	async fn fetch(&self) -> Result<Vec<StageRow>, FetchError>;
}

/// Reads the lookup through the host's JSON-RPC `call_kw` endpoint.
#[derive(Debug, Clone)]
pub struct JsonRpcSource {
	url: String,
	model: String,
	limit: u32,
}

impl JsonRpcSource {
	#[must_use]
	pub fn new(config: &Config) -> Self {
		Self {
			url: config.rpc_url.clone(),
			model: config.model.clone(),
			limit: config.fetch_limit,
		}
	}

	#[must_use]
	pub fn request_body(&self, request_id: u64) -> String {
		json!({
			"jsonrpc": "2.0",
			"method": "call",
			"id": request_id,
			"params": {
				"model": self.model,
				"method": "search_read",
				"args": [[], ["id", "color_hex", "text_color_hex"]],
				"kwargs": { "limit": self.limit },
			},
		})
		.to_string()
	}
}

impl ColorSource for JsonRpcSource {
	#[instrument(skip(self), fields(url = %self.url, model = %self.model))]
	async fn fetch(&self) -> Result<Vec<StageRow>, FetchError> {
		let window = web_sys::window().ok_or_else(|| FetchError::Transport(JsValue::from_str("no window")))?;

		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let request_id = (js_sys::Math::random() * 1e9) as u64;
		let init = RequestInit::new();
		init.set_method("POST");
		init.set_credentials(RequestCredentials::SameOrigin);
		init.set_body(&JsValue::from_str(&self.request_body(request_id)));
		let request = Request::new_with_str_and_init(&self.url, &init)?;
		request.headers().set("Content-Type", "application/json")?;

		let response: Response = JsFuture::from(window.fetch_with_request(&request)).await?.dyn_into()?;
		if !response.ok() {
			return Err(FetchError::Status(response.status()));
		}
		let text = JsFuture::from(response.text()?).await?;
		let text = text.as_string().ok_or(FetchError::Transport(text))?;
		let rows = decode_response(&text)?;
		debug!("Fetched {} stage row(s).", rows.len());
		Ok(rows)
	}
}

#[derive(Deserialize)]
struct Envelope {
	#[serde(default)]
	result: Option<Vec<StageRow>>,
	#[serde(default)]
	error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
	#[serde(default)]
	message: String,
	#[serde(default)]
	data: Option<RpcErrorData>,
}

#[derive(Deserialize)]
struct RpcErrorData {
	#[serde(default)]
	message: Option<String>,
}

/// Decodes a JSON-RPC 2.0 response carrying stage rows.
///
/// # Errors
///
/// [`FetchError::Rpc`] for an `error` member (the more specific nested message wins),
/// [`FetchError::Decode`] for anything that isn't a response.
pub fn decode_response(text: &str) -> Result<Vec<StageRow>, FetchError> {
	let envelope: Envelope = serde_json::from_str(text).map_err(FetchError::Decode)?;
	match (envelope.result, envelope.error) {
		(_, Some(error)) => Err(FetchError::Rpc {
			message: error.data.and_then(|data| data.message).unwrap_or(error.message),
		}),
		(Some(rows), None) => Ok(rows),
		(None, None) => Err(FetchError::Rpc {
			message: "response carries neither `result` nor `error`".to_owned(),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn request_envelope() {
		let source = JsonRpcSource::new(&Config::default());
		let body: serde_json::Value = serde_json::from_str(&source.request_body(7)).unwrap();
		assert_eq!(body["id"], 7);
		assert_eq!(body["method"], "call");
		assert_eq!(body["params"]["model"], "crm.stage");
		assert_eq!(body["params"]["method"], "search_read");
		assert_eq!(body["params"]["args"][1], json!(["id", "color_hex", "text_color_hex"]));
		assert_eq!(body["params"]["kwargs"]["limit"], 2000);
	}

	#[test]
	fn rows_with_unset_fields() {
		let rows = decode_response(
			r##"{"jsonrpc": "2.0", "id": 1, "result": [
				{"id": 1, "color_hex": "#3498db", "text_color_hex": "#ffffff"},
				{"id": 2, "color_hex": false, "text_color_hex": false},
				{"id": 3, "color_hex": "#000", "text_color_hex": ""},
				{"id": 4}
			]}"##,
		)
		.unwrap();
		assert_eq!(
			rows,
			vec![
				StageRow { id: 1, color_hex: Some("#3498db".to_owned()), text_color_hex: Some("#ffffff".to_owned()) },
				StageRow { id: 2, color_hex: None, text_color_hex: None },
				StageRow { id: 3, color_hex: Some("#000".to_owned()), text_color_hex: None },
				StageRow { id: 4, color_hex: None, text_color_hex: None },
			]
		);
	}

	#[test]
	fn rpc_errors() {
		let nested = decode_response(r#"{"error": {"code": 200, "message": "Odoo Server Error", "data": {"message": "Access Denied"}}}"#);
		assert!(matches!(nested, Err(FetchError::Rpc { message }) if message == "Access Denied"));

		let flat = decode_response(r#"{"error": {"message": "Session expired"}}"#);
		assert!(matches!(flat, Err(FetchError::Rpc { message }) if message == "Session expired"));

		assert!(matches!(decode_response(r#"{"jsonrpc": "2.0"}"#), Err(FetchError::Rpc { .. })));
		assert!(matches!(decode_response("<html>"), Err(FetchError::Decode(_))));
	}
}
