#![doc(html_root_url = "https://docs.rs/stage-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Keeps a host-rendered CRM board annotated with stage colors and real per-stage record counts.
//!
//! The host owns and re-renders the DOM whenever it likes. This crate observes structural
//! mutations below a root, funnels them through a [`Throttle`](`throttle::Throttle`) and re-runs
//! idempotent appliers that read the current DOM and a [`StageColorCache`](`cache::StageColorCache`).
//!
//! See [`boot::start`] for the entry point.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod boot;
pub mod cache;
pub mod colors;
pub mod config;
pub mod counts;
pub mod entity;
mod error;
pub mod geo;
pub mod lifecycle;
pub mod marker;
pub mod observer;
pub mod published;
pub mod reconcile;
pub mod source;
pub mod throttle;

pub use error::{Error, FetchError, Result};

/// Installs the crate's log and panic output, once. Leaves any existing global subscriber in place.
pub fn init_logging() {
	#[cfg(feature = "console_error_panic_hook")]
	console_error_panic_hook::set_once();

	#[cfg(feature = "console-log")]
	{
		static INSTALL: std::sync::Once = std::sync::Once::new();
		INSTALL.call_once(|| {
			if !tracing::dispatcher::has_been_set() {
				tracing_wasm::set_as_global_default();
			}
		});
	}
}

#[cfg(feature = "auto-start")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn auto_start() {
	boot::start(config::Config::default());
}
