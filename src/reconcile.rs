use crate::{cache::StageColorCache, colors, config::Config, counts, Result};
use core::ops::AddAssign;
use std::rc::Rc;
use tracing::{debug, instrument};
use web_sys::{Document, Element};

/// Outcome of one applier run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
	/// Containers that now carry the derived value.
	pub annotated: usize,
	/// Containers left untouched: no id, no data for the id, or incomplete host markup.
	pub skipped: usize,
}

impl AddAssign for ApplyReport {
	fn add_assign(&mut self, rhs: Self) {
		self.annotated += rhs.annotated;
		self.skipped += rhs.skipped;
	}
}

/// Runs every applier against the current DOM and cache.
#[derive(Debug)]
pub struct Reconciler {
	cache: Rc<StageColorCache>,
	config: Rc<Config>,
}

impl Reconciler {
	#[must_use]
	pub fn new(cache: Rc<StageColorCache>, config: Rc<Config>) -> Self {
		Self { cache, config }
	}

	#[must_use]
	pub fn cache(&self) -> &Rc<StageColorCache> {
		&self.cache
	}

	#[must_use]
	pub fn config(&self) -> &Rc<Config> {
		&self.config
	}

	/// One full pass below `root`. All color lookups of the pass read the same cache table.
	///
	/// # Errors
	///
	/// Only for genuine DOM exceptions; missing data and missing markup are reported as skips.
	#[instrument(skip_all)]
	pub fn reconcile(&self, document: &Document, root: &Element) -> Result<ApplyReport> {
		let selectors = &self.config.selectors;
		let table = self.cache.snapshot();

		let mut report = colors::apply_kanban(root, table.as_deref(), selectors)?;
		report += colors::apply_list(root, table.as_deref(), selectors)?;
		report += counts::apply_kanban(document, root, selectors)?;
		debug!("Reconciled: {} annotated, {} skipped.", report.annotated, report.skipped);
		Ok(report)
	}
}
