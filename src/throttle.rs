//! Leading- and trailing-edge rate limiting of reconciliation passes.

use crate::{Error, Result};
use core::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

/// Time source and deferred execution for a [`Throttle`].
pub trait Scheduler {
	/// A scheduled task. Dropping it cancels the task if it hasn't run yet.
	type Pending;

	/// Current time in milliseconds.
	fn now(&self) -> f64;

	/// Runs `task` once, `delay_ms` from now.
	///
	/// # Errors
	///
	/// Iff the task couldn't be scheduled.
	fn schedule(&self, delay_ms: f64, task: Box<dyn FnOnce()>) -> Result<Self::Pending>;
}

/// [`Scheduler`] backed by ***setTimeout*** and ***Date.now()***.
#[derive(Debug, Clone)]
pub struct BrowserScheduler {
	window: Window,
}

impl BrowserScheduler {
	/// # Errors
	///
	/// Iff there is no `window` (for example in a worker).
	pub fn new() -> Result<Self> {
		Ok(Self {
			window: web_sys::window().ok_or(Error::NoWindow)?,
		})
	}
}

/// A pending ***setTimeout***, cleared on drop.
#[derive(Debug)]
pub struct Timeout {
	window: Window,
	handle: i32,
	_closure: Closure<dyn FnMut()>,
}

impl Drop for Timeout {
	fn drop(&mut self) {
		self.window.clear_timeout_with_handle(self.handle);
	}
}

impl Scheduler for BrowserScheduler {
	type Pending = Timeout;

	fn now(&self) -> f64 {
		js_sys::Date::now()
	}

	fn schedule(&self, delay_ms: f64, task: Box<dyn FnOnce()>) -> Result<Timeout> {
		let closure = Closure::once(task);
		#[allow(clippy::cast_possible_truncation)]
		let handle = self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(closure.as_ref().unchecked_ref(), delay_ms.max(0.0).ceil() as i32)?;
		Ok(Timeout {
			window: self.window.clone(),
			handle,
			_closure: closure,
		})
	}
}

/// Coalesces bursts of [`trigger`](`Throttle::trigger`)s into at most one deferred execution.
///
/// A trigger more than one window after the last execution runs the action immediately.
/// Any other trigger replaces the pending deferred execution with one a full window after itself,
/// so a burst settles into a single execution that sees the state after its last trigger.
///
/// Clones share state.
pub struct Throttle<S: Scheduler> {
	inner: Rc<Inner<S>>,
}

struct Inner<S: Scheduler> {
	scheduler: S,
	window_ms: f64,
	action: Box<dyn Fn()>,
	last_fire: Cell<Option<f64>>,
	pending: RefCell<Option<S::Pending>>,
}

impl<S: Scheduler> Clone for Throttle<S> {
	fn clone(&self) -> Self {
		Self { inner: self.inner.clone() }
	}
}

impl<S: Scheduler + 'static> Throttle<S> {
	pub fn new(scheduler: S, window_ms: f64, action: impl Fn() + 'static) -> Self {
		Self {
			inner: Rc::new(Inner {
				scheduler,
				window_ms,
				action: Box::new(action),
				last_fire: Cell::new(None),
				pending: RefCell::new(None),
			}),
		}
	}

	/// Never blocks and never runs the action more than once.
	pub fn trigger(&self) {
		let inner = &*self.inner;
		let now = inner.scheduler.now();
		match inner.last_fire.get() {
			Some(last_fire) if now - last_fire <= inner.window_ms => {
				let delay = inner.window_ms;
				// Cancel first, so the replaced task can't run in between.
				drop(inner.pending.borrow_mut().take());

				let weak = Rc::downgrade(&self.inner);
				match inner.scheduler.schedule(delay, Box::new(move || Self::fire_deferred(&weak))) {
					Ok(pending) => {
						trace!("Deferred by {}ms.", delay);
						*inner.pending.borrow_mut() = Some(pending);
					}
					Err(error) => {
						warn!("Could not defer throttled action, running it now: {}", error);
						inner.fire(now);
					}
				}
			}
			_ => {
				drop(inner.pending.borrow_mut().take());
				inner.fire(now);
			}
		}
	}

	fn fire_deferred(weak: &Weak<Inner<S>>) {
		if let Some(inner) = weak.upgrade() {
			// Released only after the action, in case it's the closure running right now.
			let _fired = inner.pending.borrow_mut().take();
			inner.fire(inner.scheduler.now());
		}
	}

	/// Drops the pending deferred execution, if any. Later triggers work as usual.
	pub fn cancel(&self) {
		if self.inner.pending.borrow_mut().take().is_some() {
			trace!("Cancelled deferred execution.");
		}
	}

	/// Whether a deferred execution is outstanding.
	#[must_use]
	pub fn is_pending(&self) -> bool {
		self.inner.pending.borrow().is_some()
	}
}

impl<S: Scheduler> Inner<S> {
	fn fire(&self, now: f64) {
		self.last_fire.set(Some(now));
		(self.action)();
	}
}


#[cfg(test)]
mod tests {
	use super::{manual::ManualScheduler, *};

	fn counting(scheduler: &ManualScheduler, window_ms: f64) -> (Throttle<ManualScheduler>, Rc<RefCell<Vec<f64>>>) {
		let fired = Rc::new(RefCell::new(Vec::new()));
		let throttle = Throttle::new(scheduler.clone(), window_ms, {
			let scheduler = scheduler.clone();
			let fired = fired.clone();
			move || fired.borrow_mut().push(scheduler.now())
		});
		(throttle, fired)
	}

	#[test]
	fn leading_edge_runs_immediately() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);

		throttle.trigger();
		assert_eq!(*fired.borrow(), vec![1000.0]);
		assert!(!throttle.is_pending());
	}

	#[test]
	fn burst_coalesces_into_one_trailing_execution() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);

		throttle.trigger();
		scheduler.advance_to(1005.0);
		throttle.trigger();
		scheduler.advance_to(1010.0);
		throttle.trigger();
		assert_eq!(scheduler.pending_count(), 1);

		scheduler.advance_to(1259.0);
		assert_eq!(*fired.borrow(), vec![1000.0]);

		// One window after the last trigger of the burst.
		scheduler.advance_to(2000.0);
		assert_eq!(*fired.borrow(), vec![1000.0, 1260.0]);
		assert!(!throttle.is_pending());
	}

	#[test]
	fn burst_inside_an_open_window_lands_a_window_after_its_last_trigger() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);
		throttle.trigger();

		scheduler.advance_to(1100.0);
		throttle.trigger();
		scheduler.advance_to(1105.0);
		throttle.trigger();
		scheduler.advance_to(1110.0);
		throttle.trigger();

		scheduler.advance_to(1359.0);
		assert_eq!(*fired.borrow(), vec![1000.0]);
		scheduler.advance_to(5000.0);
		assert_eq!(*fired.borrow(), vec![1000.0, 1360.0]);
	}

	#[test]
	fn separated_triggers_each_fire_immediately() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);

		throttle.trigger();
		scheduler.advance_to(1300.0);
		throttle.trigger();
		scheduler.advance_to(1600.0);
		throttle.trigger();
		assert_eq!(*fired.borrow(), vec![1000.0, 1300.0, 1600.0]);
		assert_eq!(scheduler.pending_count(), 0);
	}

	#[test]
	fn trailing_execution_restarts_the_window() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);

		throttle.trigger();
		scheduler.advance_to(1200.0);
		throttle.trigger();
		scheduler.advance_to(1450.0);
		assert_eq!(*fired.borrow(), vec![1000.0, 1450.0]);

		// Within the window that began with the trailing execution.
		scheduler.advance_to(1500.0);
		throttle.trigger();
		assert_eq!(fired.borrow().len(), 2);
		scheduler.advance_to(1750.0);
		assert_eq!(*fired.borrow(), vec![1000.0, 1450.0, 1750.0]);
	}

	#[test]
	fn cancel_drops_the_pending_execution() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);
		throttle.trigger();
		scheduler.advance_to(1010.0);
		throttle.trigger();
		assert!(throttle.is_pending());

		throttle.cancel();
		assert!(!throttle.is_pending());
		assert_eq!(scheduler.pending_count(), 0);
		scheduler.advance_to(2000.0);
		assert_eq!(*fired.borrow(), vec![1000.0]);

		throttle.trigger();
		assert_eq!(*fired.borrow(), vec![1000.0, 2000.0]);
	}

	#[test]
	fn dropping_the_throttle_cancels_its_pending_execution() {
		let scheduler = ManualScheduler::default();
		scheduler.advance_to(1000.0);
		let (throttle, fired) = counting(&scheduler, 250.0);
		throttle.trigger();
		scheduler.advance_to(1010.0);
		throttle.trigger();
		drop(throttle);

		scheduler.advance_to(2000.0);
		assert_eq!(*fired.borrow(), vec![1000.0]);
	}
}
