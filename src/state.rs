use std::path::PathBuf;
use std::sync::Arc;

use supersale_insights::{
    Dataset, DatasetCache, Dimension, FilterSpec, HourRange, Report, SourceConfig,
};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where the current dataset came from; loaded once per source.
    pub cache: DatasetCache,

    /// Loaded dataset (None until a load succeeds).
    pub dataset: Option<Arc<Dataset>>,

    /// Current selector values.
    pub filters: Option<FilterSpec>,

    /// Everything drawn for `filters` (recomputed on every change).
    pub report: Option<Report>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(source: SourceConfig) -> Self {
        Self {
            cache: DatasetCache::new(source),
            dataset: None,
            filters: None,
            report: None,
            status_message: None,
        }
    }

    /// Load (or fetch the cached) dataset for the current source.
    pub fn load(&mut self) {
        match self.cache.get_or_load() {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load data: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Switch to another file with the same sheet layout. The current source
    /// stays in place unless the new one loads.
    pub fn open(&mut self, path: PathBuf) {
        let cache = DatasetCache::new(self.cache.source().with_path(path));
        match cache.get_or_load() {
            Ok(dataset) => {
                self.cache = cache;
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to open {}: {e}", cache.source().path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset and select everything.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.filters = Some(FilterSpec::select_all(&dataset));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refresh();
    }

    /// Re-run filter and aggregation after a selector change.
    pub fn refresh(&mut self) {
        if let (Some(ds), Some(filters)) = (&self.dataset, &self.filters) {
            self.report = Some(Report::build(ds, filters));
        }
    }

    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        if let Some(filters) = &mut self.filters {
            filters.toggle(dim, value);
            self.refresh();
        }
    }

    pub fn select_all(&mut self, dim: Dimension) {
        if let (Some(ds), Some(filters)) = (&self.dataset, &mut self.filters) {
            filters.select_every(dim, ds);
            self.refresh();
        }
    }

    pub fn select_none(&mut self, dim: Dimension) {
        if let Some(filters) = &mut self.filters {
            filters.select_none(dim);
            self.refresh();
        }
    }

    /// Ignored when `lo > hi`; the sliders never produce that.
    pub fn set_hours(&mut self, lo: u8, hi: u8) {
        if let (Some(filters), Some(hours)) = (&mut self.filters, HourRange::new(lo, hi)) {
            if filters.hours != hours {
                filters.hours = hours;
                self.refresh();
            }
        }
    }
}
