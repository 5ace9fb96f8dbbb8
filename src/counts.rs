//! Real record counts in kanban column headers.
//!
//! The host's own counter widgets show aggregate values (often a zero revenue) where a record count is
//! wanted. Both paths here mask those widgets and keep a single count marker per counter up to date.

use crate::{
	config::Selectors,
	marker::{self, elements},
	reconcile::ApplyReport,
	Result,
};
use tracing::{instrument, trace};
use web_sys::{Document, Element};

/// Marker attribute recording which path wrote the count.
pub const COUNT_SOURCE_ATTRIBUTE: &str = "data-count-source";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSource {
	/// Counted from the record cards currently in the DOM.
	Records,
	/// Taken from the host's group metadata, which also covers records that aren't loaded.
	Group,
}

impl CountSource {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			CountSource::Records => "records",
			CountSource::Group => "group",
		}
	}
}

/// What happens to the host's own counter widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCounters {
	/// `display: none`; survives host re-renders of the counter's contents.
	Hide,
	Remove,
}

/// Counts the record cards in every kanban group and writes the count into the group's counter.
///
/// Groups without a counter are skipped. Counts written by [`inject_group_count`] are left alone,
/// since group metadata is more complete than the cards on screen.
///
/// # Errors
///
/// Iff a configured selector is invalid or the DOM refuses a write.
#[instrument(skip_all)]
pub fn apply_kanban(document: &Document, root: &Element, selectors: &Selectors) -> Result<ApplyReport> {
	let mut report = ApplyReport::default();
	let marker_selector = selectors.marker_selector();
	for group in elements(root.query_selector_all(&selectors.kanban_group)?) {
		let Some(counter) = group.query_selector(&selectors.kanban_counter)? else {
			trace!("Kanban group without counter.");
			report.skipped += 1;
			continue;
		};
		if let Some(existing) = counter.query_selector(&marker_selector)? {
			if existing.get_attribute(COUNT_SOURCE_ATTRIBUTE).as_deref() == Some(CountSource::Group.as_str()) {
				report.skipped += 1;
				continue;
			}
		}

		let count = group.query_selector_all(&selectors.kanban_record)?.length();
		write_count(document, &counter, selectors, u64::from(count), NativeCounters::Hide, CountSource::Records)?;
		report.annotated += 1;
	}
	Ok(report)
}

/// Writes `count` from host group metadata into the counter of `column`, removing the host's counters.
///
/// Returns whether `column` had a counter.
///
/// # Errors
///
/// Iff a configured selector is invalid or the DOM refuses a write.
#[instrument(skip(document, column, selectors))]
pub fn inject_group_count(document: &Document, column: &Element, selectors: &Selectors, count: u64) -> Result<bool> {
	let Some(counter) = column.query_selector(&selectors.kanban_counter)? else {
		trace!("Column without counter.");
		return Ok(false);
	};
	write_count(document, &counter, selectors, count, NativeCounters::Remove, CountSource::Group)?;
	Ok(true)
}

fn write_count(document: &Document, counter: &Element, selectors: &Selectors, count: u64, natives: NativeCounters, source: CountSource) -> Result<()> {
	for native in elements(counter.query_selector_all(&selectors.native_counter)?) {
		match natives {
			NativeCounters::Hide => {
				marker::set_style(&native, &[("display", "none")])?;
			}
			NativeCounters::Remove => native.remove(),
		}
	}

	let marker = marker::find_or_create(document, counter, &selectors.marker_class, &selectors.marker_extra_classes)?;
	marker::set_text(&marker, &count.to_string());
	marker::set_attribute(&marker, "title", &selectors.marker_tooltip)?;
	marker::set_attribute(&marker, COUNT_SOURCE_ATTRIBUTE, source.as_str())
}
