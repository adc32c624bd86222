use std::path::PathBuf;

use matchday_stats::dataset::Dataset;
use matchday_stats::engine::{compute_all, compute_report};
use matchday_stats::ingest::load_local_dir;
use matchday_stats::report::{Cell, Report, ReportKind, Scope};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

fn fixture_dataset() -> Dataset {
    load_local_dir(&fixture_path("rounds"), Some(&fixture_path("teams.csv")))
        .expect("fixture rounds should load")
        .dataset
}

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn column(report: &Report, label: &str) -> Vec<Cell> {
    let idx = report
        .column_index(label)
        .unwrap_or_else(|| panic!("missing column {label}"));
    report.rows.iter().map(|row| row[idx].clone()).collect()
}

#[test]
fn goals_ties_share_rank_in_player_id_order() {
    let report = compute_report(&fixture_dataset(), ReportKind::Goals, Scope::Overall).unwrap();
    assert_eq!(report.columns, ["Rank", "Name", "Matches", "Goals"]);
    assert_eq!(
        report.rows,
        vec![
            vec![Cell::Int(1), text("Lionel Messi"), Cell::Int(2), Cell::Int(3)],
            vec![Cell::Int(1), text("Kylian Mbappe"), Cell::Int(2), Cell::Int(3)],
        ]
    );
}

#[test]
fn by_team_scope_adds_team_name() {
    let report = compute_report(&fixture_dataset(), ReportKind::Goals, Scope::ByTeam).unwrap();
    assert_eq!(report.columns, ["Rank", "Name", "Team", "Matches", "Goals"]);
    assert_eq!(column(&report, "Team"), [text("Argentina"), text("France")]);
}

#[test]
fn assists_rank_is_dense() {
    let report = compute_report(&fixture_dataset(), ReportKind::Assists, Scope::Overall).unwrap();
    assert_eq!(
        column(&report, "Name"),
        [text("Rodri"), text("Lionel Messi"), text("Kylian Mbappe")]
    );
    assert_eq!(
        column(&report, "Rank"),
        [Cell::Int(1), Cell::Int(2), Cell::Int(2)]
    );
}

#[test]
fn goals_and_assists_sums_both_counters() {
    let report =
        compute_report(&fixture_dataset(), ReportKind::GoalsAndAssists, Scope::Overall).unwrap();
    assert_eq!(
        report.columns,
        ["Rank", "Name", "Team", "Matches", "Goals", "Assists", "Goals + Assists"]
    );
    assert_eq!(
        report.rows[2],
        vec![
            Cell::Int(2),
            text("Rodri"),
            text("Argentina"),
            Cell::Int(2),
            Cell::Int(0),
            Cell::Int(3),
            Cell::Int(3),
        ]
    );
    assert_eq!(column(&report, "Goals + Assists")[0], Cell::Int(4));
}

#[test]
fn detailed_goals_carries_sub_splits() {
    let report =
        compute_report(&fixture_dataset(), ReportKind::DetailedGoals, Scope::Overall).unwrap();
    assert_eq!(
        report.columns,
        [
            "Rank",
            "Name",
            "Team",
            "Matches",
            "Goals",
            "Left Foot",
            "Right Foot",
            "Headers",
            "Penalties"
        ]
    );
    assert_eq!(report.cell(0, "Left Foot"), Some(&Cell::Int(3)));
    assert_eq!(report.cell(0, "Penalties"), Some(&Cell::Int(1)));
    assert_eq!(report.cell(1, "Right Foot"), Some(&Cell::Int(2)));
    assert_eq!(report.cell(1, "Headers"), Some(&Cell::Int(1)));
}

#[test]
fn shot_accuracy_overall_keeps_shooters_at_or_above_mean() {
    let report =
        compute_report(&fixture_dataset(), ReportKind::ShotAccuracy, Scope::Overall).unwrap();
    assert_eq!(report.columns, ["Name", "Matches", "Shots", "Shot Accuracy"]);
    assert_eq!(
        report.rows,
        vec![
            vec![text("Kylian Mbappe"), Cell::Int(2), Cell::Int(7), Cell::Float(71.4)],
            vec![text("Lionel Messi"), Cell::Int(2), Cell::Int(7), Cell::Float(57.1)],
        ]
    );
}

#[test]
fn shot_accuracy_by_team_uses_median_and_drops_zero_accuracy() {
    // Median shots is 1, so Rodri passes the threshold but his 0.0 accuracy is dropped.
    let report =
        compute_report(&fixture_dataset(), ReportKind::ShotAccuracy, Scope::ByTeam).unwrap();
    assert_eq!(
        column(&report, "Name"),
        [text("Kylian Mbappe"), text("Lionel Messi")]
    );
}

#[test]
fn fouls_sort_without_matches_tie_break() {
    let report = compute_report(&fixture_dataset(), ReportKind::Fouls, Scope::Overall).unwrap();
    assert_eq!(report.columns, ["Rank", "Name", "Matches", "Fouls"]);
    assert_eq!(
        column(&report, "Fouls"),
        [Cell::Int(5), Cell::Int(3), Cell::Int(1)]
    );
    assert_eq!(
        column(&report, "Rank"),
        [Cell::Int(1), Cell::Int(2), Cell::Int(3)]
    );
}

#[test]
fn card_and_offside_reports_list_only_nonzero_players() {
    let dataset = fixture_dataset();
    let yellow = compute_report(&dataset, ReportKind::YellowCards, Scope::Overall).unwrap();
    assert_eq!(yellow.columns, ["Name", "Yellow Cards"]);
    assert_eq!(column(&yellow, "Name"), [text("Kylian Mbappe"), text("Rodri")]);

    let red = compute_report(&dataset, ReportKind::RedCards, Scope::Overall).unwrap();
    assert_eq!(red.rows, vec![vec![text("Kylian Mbappe"), Cell::Int(1)]]);

    let offside = compute_report(&dataset, ReportKind::Offsides, Scope::Overall).unwrap();
    assert_eq!(offside.columns, ["Name", "Offside"]);
    assert_eq!(column(&offside, "Offside"), [Cell::Int(2), Cell::Int(1)]);
}

#[test]
fn per_match_rates_divide_by_distinct_matches() {
    let dataset = fixture_dataset();
    let tackles = compute_report(&dataset, ReportKind::TacklesPerMatch, Scope::Overall).unwrap();
    assert_eq!(tackles.columns, ["Name", "Tackles Per Match"]);
    assert_eq!(
        tackles.rows,
        vec![
            vec![text("Rodri"), Cell::Float(3.5)],
            vec![text("Kylian Mbappe"), Cell::Float(1.0)],
        ]
    );

    let interceptions =
        compute_report(&dataset, ReportKind::InterceptionsPerMatch, Scope::Overall).unwrap();
    assert_eq!(
        column(&interceptions, "Interceptions Per Match"),
        [Cell::Float(2.5), Cell::Float(0.5)]
    );

    let blocks = compute_report(&dataset, ReportKind::BlocksPerMatch, Scope::Overall).unwrap();
    assert_eq!(
        column(&blocks, "Blocks Per Match"),
        [Cell::Float(1.5), Cell::Float(0.5)]
    );
}

#[test]
fn goalkeeper_reports() {
    let dataset = fixture_dataset();
    let saves = compute_report(&dataset, ReportKind::GoalkeeperSaves, Scope::Overall).unwrap();
    assert_eq!(
        saves.rows,
        vec![
            vec![text("Emi Martinez"), Cell::Int(9)],
            vec![text("Hugo Lloris"), Cell::Int(7)],
        ]
    );

    let clean =
        compute_report(&dataset, ReportKind::GoalkeeperCleanSheets, Scope::Overall).unwrap();
    assert_eq!(clean.columns, ["Name", "Team", "Clean Sheets"]);
    assert_eq!(
        clean.rows,
        vec![vec![text("Emi Martinez"), text("Argentina"), Cell::Int(1)]]
    );

    // Mean saves is 8; only the keeper strictly above it stays.
    let pct =
        compute_report(&dataset, ReportKind::GoalkeeperSavePercentage, Scope::Overall).unwrap();
    assert_eq!(pct.columns, ["Name", "Team", "Saves", "Save Percentage"]);
    assert_eq!(
        pct.rows,
        vec![vec![
            text("Emi Martinez"),
            text("Argentina"),
            Cell::Int(9),
            Cell::Float(90.0)
        ]]
    );
}

#[test]
fn team_totals_break_ties_on_fewer_matches() {
    let report = compute_report(&fixture_dataset(), ReportKind::TeamTotals, Scope::Overall).unwrap();
    assert_eq!(
        report.columns,
        [
            "Rank",
            "Team",
            "Matches",
            "Goals",
            "Shots",
            "Shots On Target",
            "Shot Accuracy"
        ]
    );
    assert_eq!(
        report.rows,
        vec![
            vec![
                Cell::Int(1),
                text("France"),
                Cell::Int(2),
                Cell::Int(3),
                Cell::Int(7),
                Cell::Int(5),
                Cell::Float(71.4),
            ],
            vec![
                Cell::Int(1),
                text("Argentina"),
                Cell::Int(3),
                Cell::Int(3),
                Cell::Int(8),
                Cell::Int(4),
                Cell::Float(50.0),
            ],
        ]
    );
}

#[test]
fn chances_created_hides_rank_when_split_by_team() {
    let dataset = fixture_dataset();
    let overall = compute_report(&dataset, ReportKind::ChancesCreated, Scope::Overall).unwrap();
    assert_eq!(column(&overall, "Chances Created")[0], Cell::Int(6));
    let by_team = compute_report(&dataset, ReportKind::ChancesCreated, Scope::ByTeam).unwrap();
    assert_eq!(by_team.column_index("Rank"), None);
    assert_eq!(by_team.len(), 3);
}

#[test]
fn compute_all_returns_every_kind_in_selector_order() {
    let dataset = fixture_dataset();
    for scope in [Scope::Overall, Scope::ByTeam] {
        let all = compute_all(&dataset, scope);
        let kinds: Vec<ReportKind> = all.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, ReportKind::ALL);
        for (kind, result) in all {
            let report = result.unwrap_or_else(|err| panic!("{kind} failed: {err}"));
            assert_eq!(report, compute_report(&dataset, kind, scope).unwrap());
        }
    }
}

#[test]
fn reports_are_idempotent_on_one_snapshot() {
    let dataset = fixture_dataset();
    for kind in ReportKind::ALL {
        let first = compute_report(&dataset, kind, Scope::ByTeam).unwrap();
        let second = compute_report(&dataset, kind, Scope::ByTeam).unwrap();
        assert_eq!(first, second, "{kind}");
    }
}
