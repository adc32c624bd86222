use std::fs;

use matchday_stats::dataset::{Column, Dataset, EventRow, Stat, TeamLookup};
use matchday_stats::engine::{compute_all, compute_report};
use matchday_stats::export::{export_workbook, report_to_csv_string, write_report_csv};
use matchday_stats::report::{ReportKind, Scope};

fn small_dataset() -> Dataset {
    let teams: TeamLookup = [("1", "Reds"), ("2", "Blues")].into_iter().collect();
    Dataset::with_all_columns(
        vec![
            EventRow::new("1", "m1")
                .named("ana lee")
                .team("1")
                .with(Stat::Goals, 2)
                .with(Stat::Shots, 3)
                .with(Stat::ShotsOnTarget, 2),
            EventRow::new("2", "m1")
                .named("bo")
                .team("2")
                .position("GK")
                .with(Stat::Saves, 4)
                .with(Stat::ShotsFaced, 6),
        ],
        teams,
    )
}

#[test]
fn csv_file_matches_in_memory_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("goals.csv");
    let report = compute_report(&small_dataset(), ReportKind::Goals, Scope::ByTeam).unwrap();

    write_report_csv(&path, &report).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, report_to_csv_string(&report).unwrap());
    assert_eq!(written, "Rank,Name,Team,Matches,Goals\n1,Ana Lee,Reds,1,2\n");
}

#[test]
fn empty_report_writes_header_only() {
    let report = compute_report(&small_dataset(), ReportKind::RedCards, Scope::Overall).unwrap();
    assert!(report.is_empty());
    assert_eq!(report_to_csv_string(&report).unwrap(), "Name,Red Cards\n");
}

#[test]
fn workbook_has_one_sheet_per_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("all.xlsx");
    let reports = compute_all(&small_dataset(), Scope::Overall);

    let summary = export_workbook(&path, &reports).unwrap();
    assert_eq!(summary.sheets, ReportKind::ALL.len());
    assert!(summary.errors.is_empty());
    assert!(fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn failed_report_is_recorded_in_workbook_summary() {
    let columns = [Column::PlayerName, Column::Stat(Stat::Goals)]
        .into_iter()
        .collect();
    let data = Dataset::new(
        vec![EventRow::new("1", "m1").named("ana").with(Stat::Goals, 1)],
        columns,
        TeamLookup::new(),
    );
    let reports = vec![
        (
            ReportKind::Goals,
            compute_report(&data, ReportKind::Goals, Scope::Overall),
        ),
        (
            ReportKind::Fouls,
            compute_report(&data, ReportKind::Fouls, Scope::Overall),
        ),
    ];

    let dir = tempfile::tempdir().unwrap();
    let summary = export_workbook(&dir.path().join("partial.xlsx"), &reports).unwrap();
    assert_eq!(summary.sheets, 2);
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("Fouls:"));
}
