//! Startup and ownership of the single running engine.
//!
//! Nothing in here may fail the host page: every error ends at [`start`] or at a reconciliation pass,
//! gets logged and is otherwise dropped.

use crate::{
	cache::StageColorCache,
	config::Config,
	observer::ChangeObserver,
	published,
	reconcile::{ApplyReport, Reconciler},
	source::{ColorSource, JsonRpcSource},
	throttle::{BrowserScheduler, Throttle},
	Error, Result,
};
use core::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, instrument, warn};
use wasm_bindgen::{closure::Closure, prelude::wasm_bindgen, JsCast, JsValue};
use web_sys::{AddEventListenerOptions, Document, Element, Window};

thread_local! {
	static ENGINE: RefCell<Option<Rc<Engine>>> = RefCell::new(None);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	NotStarted,
	WaitingForDocument,
	InitialRefresh,
	/// Terminal for the page's lifetime, unless [`Engine::shutdown`] is called.
	Observing,
}

pub struct Engine {
	phase: Cell<Phase>,
	window: Window,
	document: Document,
	reconciler: Reconciler,
	throttle: Throttle<BrowserScheduler>,
	root: RefCell<Option<Element>>,
	session: RefCell<Option<ChangeObserver>>,
}

impl Engine {
	/// The engine running on this page, if any.
	#[must_use]
	pub fn current() -> Option<Rc<Engine>> {
		ENGINE.with(|engine| engine.borrow().clone())
	}

	/// Starts the engine with lookup data from `source`.
	///
	/// Returns once the engine waits for the document; the refresh and observation setup continue
	/// asynchronously and never report failure other than through the log.
	///
	/// # Errors
	///
	/// Iff another engine is running or there is no window or document.
	#[instrument(skip_all)]
	pub fn start_with_source<C: ColorSource + 'static>(config: Config, source: C) -> Result<Rc<Engine>> {
		let document = web_sys::window().ok_or(Error::NoWindow)?.document().ok_or(Error::NoDocument)?;
		Self::launch(config, source, document.ready_state() == "loading")
	}

	/// Like [`start_with_source`](`Engine::start_with_source`), waiting for ***DOMContentLoaded***
	/// iff `loading`.
	fn launch<C: ColorSource + 'static>(config: Config, source: C, loading: bool) -> Result<Rc<Engine>> {
		if Self::current().is_some() {
			return Err(Error::AlreadyStarted);
		}
		let window = web_sys::window().ok_or(Error::NoWindow)?;
		let document = window.document().ok_or(Error::NoDocument)?;
		let scheduler = BrowserScheduler::new()?;

		let config = Rc::new(config);
		let cache = Rc::new(StageColorCache::new(&config.default_foreground));
		let window_ms = config.throttle_window_ms;
		let engine = Rc::new_cyclic(|weak: &std::rc::Weak<Engine>| {
			let weak = weak.clone();
			Engine {
				phase: Cell::new(Phase::NotStarted),
				window,
				document,
				reconciler: Reconciler::new(cache, config),
				throttle: Throttle::new(scheduler, window_ms, move || {
					match weak.upgrade() {
						Some(engine) if engine.phase() != Phase::NotStarted => {
							engine.run_pass();
						}
						_ => (),
					}
				}),
				root: RefCell::new(None),
				session: RefCell::new(None),
			}
		});
		ENGINE.with(|slot| *slot.borrow_mut() = Some(engine.clone()));

		engine.set_phase(Phase::WaitingForDocument);
		if loading {
			let options = AddEventListenerOptions::new();
			options.set_once(true);
			let on_ready = Closure::once_into_js({
				let engine = engine.clone();
				move || engine.begin(source)
			});
			if let Err(error) = engine
				.document
				.add_event_listener_with_callback_and_add_event_listener_options("DOMContentLoaded", on_ready.unchecked_ref(), &options)
			{
				engine.shutdown();
				return Err(error.into());
			}
		} else {
			engine.clone().begin(source);
		}
		Ok(engine)
	}

	fn set_phase(&self, phase: Phase) {
		debug!("{:?} -> {:?}", self.phase.get(), phase);
		self.phase.set(phase);
	}

	#[must_use]
	pub fn phase(&self) -> Phase {
		self.phase.get()
	}

	#[must_use]
	pub fn reconciler(&self) -> &Reconciler {
		&self.reconciler
	}

	fn begin<C: ColorSource + 'static>(self: Rc<Self>, source: C) {
		if self.phase() != Phase::WaitingForDocument {
			// Shut down before the document was ready.
			return;
		}
		self.set_phase(Phase::InitialRefresh);
		wasm_bindgen_futures::spawn_local(async move {
			match self.reconciler.cache().refresh(&source).await {
				Ok(entries) => info!("Loaded colors for {} stage(s).", entries),
				Err(error) => warn!("Continuing without stage colors: {}", error),
			}
			if let Err(error) = self.observe() {
				warn!("Could not start observing; annotations stay static: {}", error);
			}
		});
	}

	fn observe(&self) -> Result<()> {
		if self.phase() != Phase::InitialRefresh {
			// Shut down while the refresh was in flight.
			return Ok(());
		}
		let root = self.resolve_root()?;
		*self.root.borrow_mut() = Some(root.clone());
		self.throttle.trigger();

		let throttle = self.throttle.clone();
		let observer = ChangeObserver::start(&self.window, &root, &self.reconciler.config().selectors.marker_class, move || throttle.trigger())?;
		*self.session.borrow_mut() = Some(observer);

		let hook = &self.reconciler.config().refresh_hook_name;
		if !hook.is_empty() {
			// Without the escape hatch the engine still works, so this is not fatal.
			if let Err(error) = published::publish(&self.window, hook, refresh) {
				warn!("Could not publish the manual refresh hook: {}", error);
			}
		}
		self.set_phase(Phase::Observing);
		Ok(())
	}

	/// The configured observation root, or the document body.
	fn resolve_root(&self) -> Result<Element> {
		if let Some(selector) = &self.reconciler.config().observe_root {
			if let Some(root) = self.document.query_selector(selector)? {
				return Ok(root);
			}
			debug!("Observation root not found, falling back to the document body.");
		}
		self.document.body().map(Into::into).ok_or(Error::NoDocument)
	}

	/// Runs one reconciliation pass right now, bypassing the throttle.
	///
	/// This is the outermost boundary of a pass: failures are logged and dropped.
	pub fn run_pass(&self) -> Option<ApplyReport> {
		let observed_root = self.root.borrow().clone();
		let root = match observed_root {
			Some(root) => root,
			None => match self.resolve_root() {
				Ok(root) => root,
				Err(error) => {
					warn!("No root to reconcile: {}", error);
					return None;
				}
			},
		};
		match self.reconciler.reconcile(&self.document, &root) {
			Ok(report) => Some(report),
			Err(error) => {
				warn!("Reconciliation pass failed: {}", error);
				None
			}
		}
	}

	/// Requests a throttled pass, as a mutation would.
	pub fn schedule_pass(&self) {
		self.throttle.trigger();
	}

	/// Stops observing, drops any pending pass, withdraws the manual refresh hook and frees the page's
	/// engine slot.
	pub fn shutdown(&self) {
		if let Some(mut session) = self.session.borrow_mut().take() {
			session.stop();
		}
		self.throttle.cancel();
		let hook = &self.reconciler.config().refresh_hook_name;
		if !hook.is_empty() {
			if let Err(error) = published::unpublish(&self.window, hook) {
				warn!("Could not withdraw the manual refresh hook: {}", error);
			}
		}
		self.set_phase(Phase::NotStarted);
		ENGINE.with(|slot| {
			let mut slot = slot.borrow_mut();
			if slot.as_ref().map_or(false, |current| core::ptr::eq(&**current, self)) {
				*slot = None;
			}
		});
	}
}

/// Boots the engine with `config` (a plain object, or `undefined` for the defaults).
///
/// Never throws. Failures are logged.
#[wasm_bindgen(js_name = start)]
pub fn start_js(config: &JsValue) {
	match Config::from_js(config) {
		Ok(config) => start(config),
		Err(error) => warn!("Stage annotations disabled: {}", error),
	}
}

/// Boots the engine, reading stage colors over JSON-RPC. Never fails; failures are logged.
pub fn start(config: Config) {
	crate::init_logging();
	let source = JsonRpcSource::new(&config);
	if let Err(error) = Engine::start_with_source(config, source) {
		warn!("Stage annotations disabled: {}", error);
	}
}

/// The manual escape hatch: one immediate pass, if the engine runs.
#[wasm_bindgen]
pub fn refresh() {
	match Engine::current() {
		Some(engine) => {
			engine.run_pass();
		}
		None => debug!("Manual refresh without a running engine."),
	}
}

/// Tears the running engine down, if any.
#[wasm_bindgen]
pub fn stop() {
	if let Some(engine) = Engine::current() {
		engine.shutdown();
	}
}
