use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::dataset::Dataset;
use crate::engine;
use crate::error::StatsResult;
use crate::ingest::{LoadSummary, LoadedData};
use crate::report::{Report, ReportKind, Scope};

/// The loaded snapshot for one dashboard session. Reloading swaps the whole `Arc`;
/// reports already computed against the previous snapshot stay valid.
#[derive(Debug, Clone)]
pub struct Session {
    snapshot: Arc<Dataset>,
    summary: LoadSummary,
    loaded_at: DateTime<Local>,
}

impl Session {
    pub fn new(data: LoadedData) -> Self {
        Self {
            snapshot: Arc::new(data.dataset),
            summary: data.summary,
            loaded_at: Local::now(),
        }
    }

    pub fn snapshot(&self) -> Arc<Dataset> {
        Arc::clone(&self.snapshot)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.snapshot
    }

    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    pub fn loaded_at(&self) -> DateTime<Local> {
        self.loaded_at
    }

    pub fn replace(&mut self, data: LoadedData) {
        *self = Session::new(data);
    }

    pub fn report(&self, kind: ReportKind, scope: Scope) -> StatsResult<Report> {
        engine::compute_report(&self.snapshot, kind, scope)
    }
}
