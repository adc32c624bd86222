use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use log::debug;
use rayon::prelude::*;

use crate::dataset::{Column, Dataset, EventRow, Stat};
use crate::error::{StatsError, StatsResult};
use crate::report::{
    Cell, Center, Formula, Grouping, RankColumn, Report, ReportKind, ReportSpec, Scope, Threshold,
};

/// Run one report against a snapshot. Pure: the dataset is only read.
pub fn compute_report(dataset: &Dataset, kind: ReportKind, scope: Scope) -> StatsResult<Report> {
    run_spec(dataset, &kind.spec(scope))
}

/// Every report for the same snapshot, computed in parallel, in selector order.
pub fn compute_all(dataset: &Dataset, scope: Scope) -> Vec<(ReportKind, StatsResult<Report>)> {
    ReportKind::ALL
        .par_iter()
        .map(|&kind| (kind, compute_report(dataset, kind, scope)))
        .collect()
}

pub fn run_spec(dataset: &Dataset, spec: &ReportSpec) -> StatsResult<Report> {
    for column in required_columns(spec) {
        if !dataset.has_column(column) {
            return Err(StatsError::MissingColumn {
                report: spec.kind,
                column,
            });
        }
    }

    let mut rows: Vec<GroupRow<'_>> = aggregate(dataset.rows(), spec)
        .into_iter()
        .map(|(key, acc)| derive_row(key, acc, spec))
        .collect();

    if let Some(threshold) = spec.threshold {
        apply_threshold(&mut rows, threshold);
    }
    if spec.drop_zero {
        rows.retain(|row| row.values[spec.primary] != 0.0);
    }

    // Groups arrive in key order; the stable sort keeps it among full ties.
    rows.sort_by(|a, b| {
        let by_metric = b.values[spec.primary].total_cmp(&a.values[spec.primary]);
        if spec.tie_break_matches {
            by_metric.then(a.matches.cmp(&b.matches))
        } else {
            by_metric
        }
    });

    let primary: Vec<f64> = rows.iter().map(|row| row.values[spec.primary]).collect();
    let ranks = dense_rank_desc(&primary);

    let rows: Vec<Vec<Cell>> = rows
        .iter()
        .zip(ranks)
        .map(|(row, rank)| format_row(dataset, spec, row, rank))
        .collect();

    debug!(
        "report {} ({:?}): {} rows",
        spec.kind.label(),
        spec.grouping,
        rows.len()
    );

    Ok(Report {
        kind: spec.kind,
        grouping: spec.grouping,
        columns: spec.column_labels(),
        rows,
    })
}

/// Columns the snapshot must carry for `spec`, in the order they are checked.
pub fn required_columns(spec: &ReportSpec) -> Vec<Column> {
    let mut out = Vec::new();
    match spec.grouping {
        Grouping::Player => out.push(Column::PlayerName),
        Grouping::PlayerTeam => out.extend([Column::PlayerName, Column::TeamId]),
        Grouping::Team => out.push(Column::TeamId),
    }
    if spec.goalkeepers_only {
        out.push(Column::Position);
    }
    for metric in &spec.metrics {
        for stat in metric.formula.stats() {
            let column = Column::Stat(stat);
            if !out.contains(&column) {
                out.push(column);
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct GroupKey<'a> {
    player_id: Option<&'a str>,
    player_name: Option<&'a str>,
    team_id: Option<&'a str>,
}

impl<'a> GroupKey<'a> {
    fn for_row(row: &'a EventRow, grouping: Grouping) -> Option<Self> {
        match grouping {
            Grouping::Player => Some(Self {
                player_id: Some(&row.player_id),
                player_name: Some(row.player_name.as_deref()?),
                team_id: None,
            }),
            Grouping::PlayerTeam => Some(Self {
                player_id: Some(&row.player_id),
                player_name: Some(row.player_name.as_deref()?),
                team_id: row.team_id.as_deref(),
            }),
            Grouping::Team => Some(Self {
                player_id: None,
                player_name: None,
                team_id: Some(row.team_id.as_deref()?),
            }),
        }
    }

    fn sort_cmp(&self, other: &Self) -> Ordering {
        cmp_opt_ids(self.player_id, other.player_id)
            .then_with(|| self.player_name.cmp(&other.player_name))
            .then_with(|| cmp_opt_ids(self.team_id, other.team_id))
    }
}

struct Accumulator<'a> {
    matches: HashSet<&'a str>,
    totals: [u64; Stat::COUNT],
}

impl<'a> Accumulator<'a> {
    fn new() -> Self {
        Self {
            matches: HashSet::new(),
            totals: [0; Stat::COUNT],
        }
    }

    fn add(&mut self, row: &'a EventRow) {
        self.matches.insert(&row.match_id);
        for stat in Stat::ALL {
            self.totals[stat.index()] += u64::from(row.get(stat));
        }
    }

    fn total(&self, stat: Stat) -> u64 {
        self.totals[stat.index()]
    }
}

struct GroupRow<'a> {
    key: GroupKey<'a>,
    matches: usize,
    values: Vec<f64>,
}

fn aggregate<'a>(rows: &'a [EventRow], spec: &ReportSpec) -> Vec<(GroupKey<'a>, Accumulator<'a>)> {
    let mut groups: HashMap<GroupKey<'a>, Accumulator<'a>> = HashMap::new();
    for row in rows {
        if spec.goalkeepers_only && !row.is_goalkeeper() {
            continue;
        }
        let Some(key) = GroupKey::for_row(row, spec.grouping) else {
            continue;
        };
        groups.entry(key).or_insert_with(Accumulator::new).add(row);
    }
    let mut out: Vec<_> = groups.into_iter().collect();
    out.sort_by(|(a, _), (b, _)| a.sort_cmp(b));
    out
}

fn derive_row<'a>(key: GroupKey<'a>, acc: Accumulator<'a>, spec: &ReportSpec) -> GroupRow<'a> {
    let matches = acc.matches.len();
    let values = spec
        .metrics
        .iter()
        .map(|metric| match metric.formula {
            Formula::Sum(stat) => acc.total(stat) as f64,
            Formula::Total(stats) => stats.iter().map(|s| acc.total(*s)).sum::<u64>() as f64,
            Formula::Percentage { part, whole } => percentage(acc.total(part), acc.total(whole)),
            Formula::PerMatch(stat) => per_match(acc.total(stat), matches),
        })
        .collect();
    GroupRow {
        key,
        matches,
        values,
    }
}

fn apply_threshold(rows: &mut Vec<GroupRow<'_>>, threshold: Threshold) {
    let values: Vec<f64> = rows.iter().map(|row| row.values[threshold.metric]).collect();
    let center = match threshold.center {
        Center::Mean => mean(&values),
        Center::Median => median(&values),
    };
    let Some(center) = center else {
        return;
    };
    rows.retain(|row| threshold.comparison.keeps(row.values[threshold.metric], center));
}

fn format_row(dataset: &Dataset, spec: &ReportSpec, row: &GroupRow<'_>, rank: u32) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(spec.metrics.len() + 4);
    if spec.rank == RankColumn::Shown {
        cells.push(Cell::Int(u64::from(rank)));
    }
    match spec.grouping {
        Grouping::Player => {
            cells.push(Cell::Text(title_case(row.key.player_name.unwrap_or(""))));
        }
        Grouping::PlayerTeam => {
            cells.push(Cell::Text(title_case(row.key.player_name.unwrap_or(""))));
            cells.push(Cell::Text(dataset.team_display(row.key.team_id)));
        }
        Grouping::Team => {
            cells.push(Cell::Text(dataset.team_display(row.key.team_id)));
        }
    }
    if spec.show_matches {
        cells.push(Cell::Int(row.matches as u64));
    }
    for (metric, value) in spec.metrics.iter().zip(&row.values) {
        if metric.formula.is_fractional() {
            cells.push(Cell::Float(*value));
        } else {
            cells.push(Cell::Int(*value as u64));
        }
    }
    cells
}

/// `part / whole * 100` to one decimal, within `[0, 100]`. A zero `whole` gives 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let pct = part as f64 / whole as f64 * 100.0;
    round1(pct.clamp(0.0, 100.0))
}

pub fn per_match(total: u64, matches: usize) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    round1(total as f64 / matches as f64)
}

/// Half-way cases go to the even tenth: 2.25 -> 2.2, 2.75 -> 2.8.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Dense rank, highest value first: ties share a rank and the next value is one more.
pub fn dense_rank_desc(values: &[f64]) -> Vec<u32> {
    let mut distinct = values.to_vec();
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();
    values
        .iter()
        .map(|v| {
            let pos = distinct.partition_point(|d| d.total_cmp(v) == Ordering::Greater);
            pos as u32 + 1
        })
        .collect()
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the rest.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alpha = false;
    for c in raw.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Numeric ids compare as numbers and sort before non-numeric ones.
fn cmp_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn cmp_opt_ids(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp_ids(a, b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
