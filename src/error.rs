use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failures that can reach the bootstrap boundary.
///
/// Lookup misses, missing identifiers and absent host markup are *not* errors;
/// the appliers express those as skipped containers instead.
#[derive(Debug, Error)]
pub enum Error {
	#[error("JavaScript exception: {0:?}")]
	Js(JsValue),
	#[error("no `window` in this context")]
	NoWindow,
	#[error("no `document` attached to the window")]
	NoDocument,
	#[error("stage colors could not be fetched: {0}")]
	Fetch(#[from] FetchError),
	#[error("invalid configuration: {0}")]
	Config(#[source] serde_json::Error),
	#[error("malformed host data: {0}")]
	Data(#[source] serde_json::Error),
	#[error("the reconciliation engine is already running on this page")]
	AlreadyStarted,
}

impl From<JsValue> for Error {
	fn from(value: JsValue) -> Self {
		Self::Js(value)
	}
}

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("transport failure: {0:?}")]
	Transport(JsValue),
	#[error("unexpected HTTP status {0}")]
	Status(u16),
	#[error("remote call failed: {message}")]
	Rpc { message: String },
	#[error("malformed response: {0}")]
	Decode(#[source] serde_json::Error),
}

impl From<JsValue> for FetchError {
	fn from(value: JsValue) -> Self {
		Self::Transport(value)
	}
}
