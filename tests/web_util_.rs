#![cfg(target_arch = "wasm32")]
#![allow(dead_code)]

use js_sys::Promise;
use stage_dom::{
	cache::{ColorTable, StageColorCache},
	source::{ColorSource, StageRow},
	FetchError,
};
use std::{rc::Rc, sync::Once};
use wasm_bindgen_futures::JsFuture;
use web_sys::{window, Document, Element};

static LOG_INITIALIZED: Once = Once::new();

pub fn init_logging() {
	LOG_INITIALIZED.call_once(|| {
		if !tracing::dispatcher::has_been_set() {
			tracing_wasm::set_as_global_default();
		}
	});
}

pub fn document() -> Document {
	window().unwrap().document().unwrap()
}

/// A fresh `<div>` with `html` as content, attached to the body. Call `.remove()` when done.
pub fn fixture(html: &str) -> Element {
	init_logging();
	let document = document();
	let fixture = document.create_element("div").unwrap();
	fixture.set_inner_html(html);
	document.body().unwrap().append_child(&fixture).unwrap();
	fixture
}

pub fn row(id: u64, color_hex: &str, text_color_hex: Option<&str>) -> StageRow {
	StageRow {
		id,
		color_hex: Some(color_hex.to_owned()),
		text_color_hex: text_color_hex.map(str::to_owned),
	}
}

pub fn table(rows: Vec<StageRow>) -> Rc<ColorTable> {
	let cache = StageColorCache::new("#fff");
	cache.settle(Ok(rows)).unwrap();
	cache.snapshot().unwrap()
}

pub async fn sleep(ms: i32) {
	let promise = Promise::new(&mut |resolve, _| {
		window().unwrap().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms).unwrap();
	});
	JsFuture::from(promise).await.unwrap();
}

pub fn inline_style(element: &Element, property: &str) -> String {
	use wasm_bindgen::JsCast;
	element.dyn_ref::<web_sys::HtmlElement>().unwrap().style().get_property_value(property).unwrap()
}

pub struct StaticSource(pub Vec<StageRow>);
impl ColorSource for StaticSource {
	async fn fetch(&self) -> Result<Vec<StageRow>, FetchError> {
		Ok(self.0.clone())
	}
}

pub struct FailingSource;
impl ColorSource for FailingSource {
	async fn fetch(&self) -> Result<Vec<StageRow>, FetchError> {
		Err(FetchError::Status(503))
	}
}
