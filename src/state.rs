use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crate::dataset::Dataset;
use crate::ingest::LoadedData;
use crate::report::{Report, ReportKind, Scope};
use crate::session::Session;

const MAX_LOGS: usize = 200;

/// What the table pane shows for the selected report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportView {
    Loading,
    Ready(Report),
    Failed(String),
    Unavailable(String),
}

pub struct AppState {
    pub session: Option<Session>,
    pub loading: bool,
    pub load_error: Option<String>,
    /// Last reload failed; `session` still holds the earlier snapshot.
    pub reload_failed: bool,
    pub selected: usize,
    pub scope: Scope,
    pub view: ReportView,
    pub table_scroll: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportState,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: None,
            loading: true,
            load_error: None,
            reload_failed: false,
            selected: 0,
            scope: Scope::default(),
            view: ReportView::Loading,
            table_scroll: 0,
            logs: VecDeque::new(),
            help_overlay: false,
            export: ExportState::new(),
        }
    }

    pub fn selected_kind(&self) -> ReportKind {
        ReportKind::ALL[self.selected % ReportKind::ALL.len()]
    }

    pub fn snapshot(&self) -> Option<Arc<Dataset>> {
        self.session.as_ref().map(Session::snapshot)
    }

    pub fn current_report(&self) -> Option<&Report> {
        match &self.view {
            ReportView::Ready(report) => Some(report),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        let total = ReportKind::ALL.len();
        self.selected = (self.selected + 1) % total;
        self.table_scroll = 0;
        self.recompute();
    }

    pub fn select_prev(&mut self) {
        let total = ReportKind::ALL.len();
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
        self.table_scroll = 0;
        self.recompute();
    }

    pub fn toggle_scope(&mut self) {
        self.scope = self.scope.toggle();
        self.table_scroll = 0;
        self.recompute();
    }

    pub fn scroll_down(&mut self, page: usize) {
        let rows = self.current_report().map(Report::len).unwrap_or(0);
        let max = rows.saturating_sub(1);
        self.table_scroll = (self.table_scroll + page.max(1)).min(max);
    }

    pub fn scroll_up(&mut self, page: usize) {
        self.table_scroll = self.table_scroll.saturating_sub(page.max(1));
    }

    /// Recomputes the selected report against the current snapshot.
    pub fn recompute(&mut self) {
        self.view = match (&self.session, &self.load_error) {
            (Some(session), _) => match session.report(self.selected_kind(), self.scope) {
                Ok(report) => ReportView::Ready(report),
                Err(err) => ReportView::Failed(err.to_string()),
            },
            (None, Some(err)) => ReportView::Unavailable(err.clone()),
            (None, None) => ReportView::Loading,
        };
        let rows = self.current_report().map(Report::len).unwrap_or(0);
        self.table_scroll = self.table_scroll.min(rows.saturating_sub(1));
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn maybe_clear_export(&mut self, now: Instant) {
        self.export.clear_if_done_for(now, 8);
    }
}

pub struct ExportState {
    pub active: bool,
    pub done: bool,
    pub path: Option<String>,
    pub message: String,
    pub error_count: usize,
    pub last_updated: Option<Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            active: false,
            done: false,
            path: None,
            message: String::new(),
            error_count: 0,
            last_updated: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: Instant, keep_secs: u64) {
        if !self.active || !self.done {
            return;
        }
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    Loaded(Box<LoadedData>),
    LoadFailed(String),
    ExportStarted {
        path: String,
    },
    ExportFinished {
        path: String,
        message: String,
        errors: usize,
    },
    ExportFailed {
        path: String,
        error: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Reload,
    ExportCsv {
        path: String,
        report: Report,
    },
    ExportWorkbook {
        path: String,
        dataset: Arc<Dataset>,
        scope: Scope,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Loaded(data) => {
            let data = *data;
            let summary = data.summary.clone();
            match state.session.as_mut() {
                Some(session) => session.replace(data),
                None => state.session = Some(Session::new(data)),
            }
            state.loading = false;
            state.load_error = None;
            state.reload_failed = false;
            state.push_log(format!(
                "[INFO] Loaded {} rows ({} players, {} matches) from {}",
                summary.rows, summary.players, summary.matches, summary.source
            ));
            for warning in summary.warnings {
                state.push_log(format!("[WARN] {warning}"));
            }
            state.recompute();
        }
        Delta::LoadFailed(err) => {
            state.loading = false;
            state.push_log(format!("[WARN] Load failed: {err}"));
            // A failed reload keeps the previous snapshot on screen.
            if state.session.is_none() {
                state.load_error = Some(err);
                state.recompute();
            } else {
                state.reload_failed = true;
            }
        }
        Delta::ExportStarted { path } => {
            state.export = ExportState::new();
            state.export.active = true;
            state.export.path = Some(path);
            state.export.message = "Exporting".to_string();
            state.export.last_updated = Some(Instant::now());
        }
        Delta::ExportFinished {
            path,
            message,
            errors,
        } => {
            state.export.active = true;
            state.export.done = true;
            state.export.error_count = errors;
            state.export.message = format!("Done: {message} ({errors} errors)");
            state.export.last_updated = Some(Instant::now());
            state.push_log(format!("[INFO] Exported {path}: {message}"));
            state.export.path = Some(path);
        }
        Delta::ExportFailed { path, error } => {
            state.export.active = true;
            state.export.done = true;
            state.export.error_count += 1;
            state.export.message = format!("Failed: {error}");
            state.export.last_updated = Some(Instant::now());
            state.push_log(format!("[WARN] Export {path} failed: {error}"));
            state.export.path = Some(path);
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
