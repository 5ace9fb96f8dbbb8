#![cfg(target_arch = "wasm32")]

use stage_dom::{
	observer::ChangeObserver,
	throttle::{BrowserScheduler, Throttle},
};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{window, Event};

wasm_bindgen_test_configure!(run_in_browser);

mod web_util_;
use web_util_::{document, fixture, sleep};

fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
	let calls = Rc::new(Cell::new(0));
	(calls.clone(), move || calls.set(calls.get() + 1))
}

#[wasm_bindgen_test]
async fn only_structural_changes_are_observed() {
	let fixture = fixture(r#"<div class="o_kanban_group"><span>Stage</span></div>"#);
	let (calls, on_change) = counter();
	let mut observer = ChangeObserver::start(&window().unwrap(), &fixture, "o_stage_real_count", on_change).unwrap();

	let group = fixture.first_element_child().unwrap();
	group.set_attribute("style", "background-color: red").unwrap();
	group.set_attribute("data-id", "5").unwrap();
	sleep(10).await;
	assert_eq!(calls.get(), 0);

	group.first_element_child().unwrap().append_child(&document().create_element("b").unwrap()).unwrap();
	sleep(10).await;
	assert_eq!(calls.get(), 1);

	group.first_element_child().unwrap().remove();
	sleep(10).await;
	assert_eq!(calls.get(), 2);

	observer.stop();
	assert!(!observer.is_observing());
	fixture.append_child(&document().create_element("div").unwrap()).unwrap();
	sleep(10).await;
	assert_eq!(calls.get(), 2);

	fixture.remove();
}

#[wasm_bindgen_test]
async fn own_marker_writes_are_ignored() {
	let fixture = fixture(r#"<div class="o_kanban_counter"></div>"#);
	let (calls, on_change) = counter();
	let _observer = ChangeObserver::start(&window().unwrap(), &fixture, "o_stage_real_count", on_change).unwrap();

	let marker = document().create_element("div").unwrap();
	marker.set_class_name("o_stage_real_count ms-2");
	fixture.first_element_child().unwrap().append_child(&marker).unwrap();
	sleep(10).await;
	assert_eq!(calls.get(), 0);

	marker.set_text_content(Some("7"));
	sleep(10).await;
	marker.set_text_content(Some("8"));
	sleep(10).await;
	assert_eq!(calls.get(), 0);

	marker.remove();
	sleep(10).await;
	assert_eq!(calls.get(), 1);

	fixture.remove();
}

#[wasm_bindgen_test]
fn resizes_are_observed() {
	let fixture = fixture("");
	let (calls, on_change) = counter();
	let observer = ChangeObserver::start(&window().unwrap(), &fixture, "o_stage_real_count", on_change).unwrap();

	window().unwrap().dispatch_event(&Event::new("resize").unwrap()).unwrap();
	assert_eq!(calls.get(), 1);

	drop(observer);
	window().unwrap().dispatch_event(&Event::new("resize").unwrap()).unwrap();
	assert_eq!(calls.get(), 1);

	fixture.remove();
}

#[wasm_bindgen_test]
async fn browser_throttle_coalesces_bursts() {
	web_util_::init_logging();
	let (calls, action) = counter();
	let throttle = Throttle::new(BrowserScheduler::new().unwrap(), 50.0, action);

	throttle.trigger();
	assert_eq!(calls.get(), 1);
	throttle.trigger();
	throttle.trigger();
	throttle.trigger();
	assert_eq!(calls.get(), 1);
	assert!(throttle.is_pending());

	sleep(120).await;
	assert_eq!(calls.get(), 2);
	assert!(!throttle.is_pending());
}

#[wasm_bindgen_test]
async fn observed_bursts_settle_into_passes() {
	let fixture = fixture("");
	let (calls, action) = counter();
	let throttle = Throttle::new(BrowserScheduler::new().unwrap(), 200.0, action);
	let _observer = ChangeObserver::start(&window().unwrap(), &fixture, "o_stage_real_count", {
		let throttle = throttle.clone();
		move || throttle.trigger()
	})
	.unwrap();

	for _ in 0..5 {
		fixture.append_child(&document().create_element("div").unwrap()).unwrap();
		sleep(5).await;
	}
	sleep(300).await;
	// Leading edge plus one trailing pass.
	assert_eq!(calls.get(), 2);

	fixture.remove();
}
