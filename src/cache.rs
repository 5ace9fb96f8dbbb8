//! The process-wide stage → colors lookup, pulled from a [`ColorSource`] on demand.

use crate::{
	entity::{Color, EntityColorRecord, EntityId},
	error::FetchError,
	source::{ColorSource, StageRow},
};
use core::cell::RefCell;
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{debug, instrument, trace, warn};

pub type ColorTable = HashMap<EntityId, EntityColorRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
	Uninitialized,
	Populated { entries: usize },
}

/// Replace-only cache of [`EntityColorRecord`]s.
///
/// The table is swapped as a whole behind an [`Rc`]. Passes that hold a [`snapshot`](`StageColorCache::snapshot`)
/// keep reading the table they started with, even if a refresh completes in between.
#[derive(Debug)]
pub struct StageColorCache {
	table: RefCell<Option<Rc<ColorTable>>>,
	default_foreground: Color,
}

impl StageColorCache {
	/// `default_foreground` is used for stages without a text color. Falls back to white if not a color.
	#[must_use]
	pub fn new(default_foreground: &str) -> Self {
		Self {
			table: RefCell::new(None),
			default_foreground: Color::parse(default_foreground).unwrap_or_else(|| {
				warn!("Configured default foreground is not a color. Using white.");
				Color::white()
			}),
		}
	}

	/// Fetches the full lookup once and replaces the cache on success.
	///
	/// # Errors
	///
	/// Iff the fetch failed. The previous table (or absence of one) is kept in that case.
	#[instrument(skip(self, source))]
	pub async fn refresh(&self, source: &impl ColorSource) -> Result<usize, FetchError> {
		let fetched = source.fetch().await;
		self.settle(fetched)
	}

	/// Installs the outcome of a fetch. Split from [`refresh`](`StageColorCache::refresh`) so the swap
	/// itself can't interleave with anything.
	///
	/// # Errors
	///
	/// Passes `fetched` errors through untouched.
	pub fn settle(&self, fetched: Result<Vec<StageRow>, FetchError>) -> Result<usize, FetchError> {
		let rows = fetched?;
		let table = self.build(rows);
		let entries = table.len();
		*self.table.borrow_mut() = Some(Rc::new(table));
		debug!("Stage color cache replaced ({} entries).", entries);
		Ok(entries)
	}

	fn build(&self, rows: Vec<StageRow>) -> ColorTable {
		rows.into_iter()
			.filter_map(|row| {
				let id = EntityId::new(row.id)?;
				let background = Color::parse(row.color_hex.as_deref()?).or_else(|| {
					if cfg!(feature = "dangerous-logging") {
						trace!("Skipping stage {}: unusable background color.", id);
					} else {
						trace!("Skipping a stage with an unusable background color.");
					}
					None
				})?;
				let foreground = row
					.text_color_hex
					.as_deref()
					.and_then(Color::parse)
					.unwrap_or_else(|| self.default_foreground.clone());
				Some((id, EntityColorRecord { background, foreground }))
			})
			.collect()
	}

	/// `None` both before the first successful refresh and for unknown ids.
	#[must_use]
	pub fn lookup(&self, id: EntityId) -> Option<EntityColorRecord> {
		self.table.borrow().as_ref()?.get(&id).cloned()
	}

	/// The current table, for passes that look up many ids.
	#[must_use]
	pub fn snapshot(&self) -> Option<Rc<ColorTable>> {
		self.table.borrow().clone()
	}

	#[must_use]
	pub fn state(&self) -> CacheState {
		match &*self.table.borrow() {
			None => CacheState::Uninitialized,
			Some(table) => CacheState::Populated { entries: table.len() },
		}
	}
}
