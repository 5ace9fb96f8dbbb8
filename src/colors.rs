//! Stage coloring of kanban headers and list view stage badges.

use crate::{
	cache::ColorTable,
	config::Selectors,
	entity::{EntityColorRecord, EntityId},
	marker::{self, elements},
	reconcile::ApplyReport,
	Result,
};
use tracing::{instrument, trace};
use web_sys::Element;

/// Badge shape for stage cells in list views, on top of the colors.
const LIST_BADGE_STYLE: [(&str, &str); 4] = [
	("padding", "2px 6px"),
	("border-radius", "6px"),
	("font-weight", "600"),
	("display", "inline-block"),
];

/// Colors the header of every kanban group with a known stage id.
///
/// Groups without an id, with an id not in `table`, or without a header are skipped.
/// `table` is `None` while the cache hasn't been populated, which skips everything.
///
/// # Errors
///
/// Iff a configured selector is invalid or an inline style can't be written.
#[instrument(skip_all)]
pub fn apply_kanban(root: &Element, table: Option<&ColorTable>, selectors: &Selectors) -> Result<ApplyReport> {
	let mut report = ApplyReport::default();
	let Some(table) = table else {
		trace!("No stage colors yet.");
		return Ok(report);
	};

	for group in elements(root.query_selector_all(&selectors.kanban_group)?) {
		let Some(record) = lookup(table, EntityId::resolve(&group, &selectors.id_attributes, &selectors.tooltip_attribute)) else {
			report.skipped += 1;
			continue;
		};
		let Some(header) = group.query_selector(&selectors.kanban_header)? else {
			trace!("Kanban group without header.");
			report.skipped += 1;
			continue;
		};
		if marker::set_style(&header, &colors(record))? {
			report.annotated += 1;
		} else {
			report.skipped += 1;
		}
	}
	Ok(report)
}

/// Colors the stage badge of every list row with a known stage id.
///
/// The id comes from the badge's id attributes, then the cell's, then the badge's tooltip.
/// Cells without a dedicated badge element are colored themselves.
///
/// # Errors
///
/// Iff a configured selector is invalid or an inline style can't be written.
#[instrument(skip_all)]
pub fn apply_list(root: &Element, table: Option<&ColorTable>, selectors: &Selectors) -> Result<ApplyReport> {
	let mut report = ApplyReport::default();
	let Some(table) = table else {
		return Ok(report);
	};

	for row in elements(root.query_selector_all(&selectors.list_row)?) {
		let Some(cell) = row.query_selector(&selectors.list_stage_cell)? else {
			// Rows without a stage column are common (grouped lists, other models).
			continue;
		};
		let badge = row_badge(&cell, selectors)?;
		let id = EntityId::from_attributes(&badge, &selectors.id_attributes)
			.or_else(|| EntityId::from_attributes(&cell, &selectors.id_attributes))
			.or_else(|| badge.get_attribute(&selectors.tooltip_attribute).as_deref().and_then(EntityId::from_tooltip));
		let Some(record) = lookup(table, id) else {
			report.skipped += 1;
			continue;
		};

		let mut style = colors(record).to_vec();
		style.extend_from_slice(&LIST_BADGE_STYLE);
		if marker::set_style(&badge, &style)? {
			report.annotated += 1;
		} else {
			report.skipped += 1;
		}
	}
	Ok(report)
}

fn row_badge(cell: &Element, selectors: &Selectors) -> Result<Element> {
	Ok(cell.query_selector(&selectors.list_badge)?.unwrap_or_else(|| cell.clone()))
}

fn lookup(table: &ColorTable, id: Option<EntityId>) -> Option<&EntityColorRecord> {
	let id = id?;
	let record = table.get(&id);
	if cfg!(feature = "dangerous-logging") {
		match record {
			Some(record) => trace!("Stage {} colors: {:?}", id, record),
			None => trace!("No colors for stage {}.", id),
		}
	} else if record.is_none() {
		trace!("No colors for a stage.");
	}
	record
}

fn colors(record: &EntityColorRecord) -> [(&str, &str); 2] {
	[("background-color", record.background.as_str()), ("color", record.foreground.as_str())]
}
