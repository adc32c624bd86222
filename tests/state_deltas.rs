use matchday_stats::dataset::{Dataset, EventRow, Stat, TeamLookup};
use matchday_stats::ingest::{LoadSummary, LoadedData};
use matchday_stats::report::{ReportKind, Scope};
use matchday_stats::state::{AppState, Delta, ReportView, apply_delta};

fn loaded(goals: u32) -> Delta {
    let dataset = Dataset::with_all_columns(
        vec![
            EventRow::new("1", "m1")
                .named("ana")
                .team("1")
                .with(Stat::Goals, goals),
            EventRow::new("2", "m1").named("bo").team("2"),
        ],
        TeamLookup::new(),
    );
    let summary = LoadSummary {
        source: "test".to_string(),
        rows: 2,
        players: 2,
        matches: 1,
        warnings: vec!["skipped 1 rows without playerid/matchid".to_string()],
        ..LoadSummary::default()
    };
    Delta::Loaded(Box::new(LoadedData { dataset, summary }))
}

#[test]
fn starts_in_loading_state() {
    let state = AppState::new();
    assert!(state.loading);
    assert_eq!(state.view, ReportView::Loading);
    assert_eq!(state.selected_kind(), ReportKind::Goals);
}

#[test]
fn loaded_delta_computes_selected_report_and_logs_warnings() {
    let mut state = AppState::new();
    apply_delta(&mut state, loaded(3));

    assert!(!state.loading);
    let report = state.current_report().expect("report should be ready");
    assert_eq!(report.kind, ReportKind::Goals);
    assert_eq!(report.len(), 1);
    assert!(state.logs.iter().any(|l| l.starts_with("[INFO] Loaded 2 rows")));
    assert!(state.logs.iter().any(|l| l.starts_with("[WARN] skipped")));
}

#[test]
fn failed_first_load_shows_error() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::LoadFailed("error accessing GitHub".to_string()));
    assert!(!state.loading);
    assert_eq!(
        state.view,
        ReportView::Unavailable("error accessing GitHub".to_string())
    );
}

#[test]
fn failed_reload_keeps_previous_snapshot() {
    let mut state = AppState::new();
    apply_delta(&mut state, loaded(3));
    state.loading = true;
    apply_delta(&mut state, Delta::LoadFailed("timeout".to_string()));

    assert!(state.session.is_some());
    assert!(state.current_report().is_some());
    assert!(state.reload_failed);
    assert!(state.logs.back().unwrap().contains("timeout"));

    state.loading = true;
    apply_delta(&mut state, loaded(4));
    assert!(!state.reload_failed);
}

#[test]
fn failed_first_load_is_not_a_failed_reload() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::LoadFailed("timeout".to_string()));
    assert!(!state.reload_failed);
    assert!(state.load_error.is_some());
}

#[test]
fn reload_replaces_snapshot_but_not_held_reports() {
    let mut state = AppState::new();
    apply_delta(&mut state, loaded(3));
    let before = state.current_report().cloned().unwrap();
    let old_snapshot = state.snapshot().unwrap();

    apply_delta(&mut state, loaded(5));
    let after = state.current_report().unwrap();
    assert_eq!(after.cell(0, "Goals").unwrap().to_string(), "5");
    assert_eq!(before.cell(0, "Goals").unwrap().to_string(), "3");
    assert_eq!(old_snapshot.rows()[0].get(Stat::Goals), 3);
}

#[test]
fn selection_wraps_and_scope_toggle_recomputes() {
    let mut state = AppState::new();
    apply_delta(&mut state, loaded(3));

    state.select_prev();
    assert_eq!(state.selected_kind(), ReportKind::TeamTotals);
    state.select_next();
    assert_eq!(state.selected_kind(), ReportKind::Goals);

    state.toggle_scope();
    assert_eq!(state.scope, Scope::ByTeam);
    let report = state.current_report().unwrap();
    assert!(report.column_index("Team").is_some());
}

#[test]
fn scroll_is_clamped_to_report_rows() {
    let mut state = AppState::new();
    apply_delta(&mut state, loaded(3));
    state.scroll_down(10);
    assert_eq!(state.table_scroll, 0);
    state.scroll_up(10);
    assert_eq!(state.table_scroll, 0);
}

#[test]
fn export_deltas_update_status_and_log() {
    let mut state = AppState::new();
    apply_delta(
        &mut state,
        Delta::ExportStarted {
            path: "out.csv".to_string(),
        },
    );
    assert!(state.export.active);
    assert!(!state.export.done);

    apply_delta(
        &mut state,
        Delta::ExportFinished {
            path: "out.csv".to_string(),
            message: "2 rows".to_string(),
            errors: 0,
        },
    );
    assert!(state.export.done);
    assert_eq!(state.export.path.as_deref(), Some("out.csv"));
    assert!(state.logs.back().unwrap().contains("out.csv"));
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("[INFO] {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 50"));
}
