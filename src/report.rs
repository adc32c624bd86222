use std::fmt;

use crate::dataset::Stat;

/// Every report the dashboard offers, in selector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Goals,
    DetailedGoals,
    Assists,
    GoalsAndAssists,
    ChancesCreated,
    ShotAccuracy,
    Fouls,
    YellowCards,
    RedCards,
    Offsides,
    TacklesPerMatch,
    InterceptionsPerMatch,
    BlocksPerMatch,
    GoalkeeperSaves,
    GoalkeeperCleanSheets,
    GoalkeeperSavePercentage,
    TeamTotals,
}

impl ReportKind {
    pub const ALL: [ReportKind; 17] = [
        ReportKind::Goals,
        ReportKind::DetailedGoals,
        ReportKind::Assists,
        ReportKind::GoalsAndAssists,
        ReportKind::ChancesCreated,
        ReportKind::ShotAccuracy,
        ReportKind::Fouls,
        ReportKind::YellowCards,
        ReportKind::RedCards,
        ReportKind::Offsides,
        ReportKind::TacklesPerMatch,
        ReportKind::InterceptionsPerMatch,
        ReportKind::BlocksPerMatch,
        ReportKind::GoalkeeperSaves,
        ReportKind::GoalkeeperCleanSheets,
        ReportKind::GoalkeeperSavePercentage,
        ReportKind::TeamTotals,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ReportKind::Goals => "Goals",
            ReportKind::DetailedGoals => "Detailed Goals",
            ReportKind::Assists => "Assists",
            ReportKind::GoalsAndAssists => "Goals + Assists",
            ReportKind::ChancesCreated => "Chances Created",
            ReportKind::ShotAccuracy => "Shot Accuracy",
            ReportKind::Fouls => "Fouls",
            ReportKind::YellowCards => "Yellow Cards",
            ReportKind::RedCards => "Red Cards",
            ReportKind::Offsides => "Offsides",
            ReportKind::TacklesPerMatch => "Tackles Per Match",
            ReportKind::InterceptionsPerMatch => "Interceptions Per Match",
            ReportKind::BlocksPerMatch => "Blocks Per Match",
            ReportKind::GoalkeeperSaves => "Goalkeeper Saves",
            ReportKind::GoalkeeperCleanSheets => "Goalkeeper Clean Sheets",
            ReportKind::GoalkeeperSavePercentage => "Goalkeeper Save Percentage",
            ReportKind::TeamTotals => "Team Totals",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ReportKind::Goals => "Player goal statistics",
            ReportKind::DetailedGoals => "Goals split by left foot, right foot, header and penalty",
            ReportKind::Assists => "Player assist statistics",
            ReportKind::GoalsAndAssists => "Goal contributions (goals plus assists)",
            ReportKind::ChancesCreated => "Chances created by players",
            ReportKind::ShotAccuracy => "Player shot accuracy statistics",
            ReportKind::Fouls => "Fouls committed by players",
            ReportKind::YellowCards => "Yellow cards received by players",
            ReportKind::RedCards => "Red cards received by players",
            ReportKind::Offsides => "Offside statistics by players",
            ReportKind::TacklesPerMatch => "Average tackles per match by players",
            ReportKind::InterceptionsPerMatch => "Average interceptions per match by players",
            ReportKind::BlocksPerMatch => "Average blocks per match by players",
            ReportKind::GoalkeeperSaves => "Total saves by goalkeepers",
            ReportKind::GoalkeeperCleanSheets => "Clean sheets by goalkeepers",
            ReportKind::GoalkeeperSavePercentage => "Save percentage by goalkeepers",
            ReportKind::TeamTotals => "Team goal and shooting totals",
        }
    }

    /// Kebab-case name used on the command line.
    pub fn slug(self) -> String {
        self.label()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|part| !part.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Accepts a label (any case) or a slug.
    pub fn parse(raw: &str) -> Option<ReportKind> {
        let needle = raw.trim();
        ReportKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.label().eq_ignore_ascii_case(needle) || kind.slug() == needle)
    }

    pub fn grouping(self, scope: Scope) -> Grouping {
        match self {
            ReportKind::DetailedGoals
            | ReportKind::GoalsAndAssists
            | ReportKind::GoalkeeperCleanSheets
            | ReportKind::GoalkeeperSavePercentage => Grouping::PlayerTeam,
            ReportKind::TeamTotals => Grouping::Team,
            _ => match scope {
                Scope::Overall => Grouping::Player,
                Scope::ByTeam => Grouping::PlayerTeam,
            },
        }
    }

    pub fn honours_scope(self) -> bool {
        self.grouping(Scope::Overall) != self.grouping(Scope::ByTeam)
    }

    /// Descriptor driving the engine for this kind under `scope`.
    pub fn spec(self, scope: Scope) -> ReportSpec {
        let grouping = self.grouping(scope);
        let base = ReportSpec {
            kind: self,
            grouping,
            goalkeepers_only: false,
            metrics: Vec::new(),
            primary: 0,
            drop_zero: true,
            threshold: None,
            rank: RankColumn::None,
            tie_break_matches: false,
            show_matches: false,
        };

        match self {
            ReportKind::Goals => ReportSpec {
                metrics: vec![Metric::sum("Goals", Stat::Goals)],
                rank: RankColumn::Shown,
                tie_break_matches: true,
                show_matches: true,
                ..base
            },
            ReportKind::DetailedGoals => ReportSpec {
                metrics: vec![
                    Metric::sum("Goals", Stat::Goals),
                    Metric::sum("Left Foot", Stat::LeftFootGoals),
                    Metric::sum("Right Foot", Stat::RightFootGoals),
                    Metric::sum("Headers", Stat::HeaderGoals),
                    Metric::sum("Penalties", Stat::PenaltyGoals),
                ],
                rank: RankColumn::Shown,
                tie_break_matches: true,
                show_matches: true,
                ..base
            },
            ReportKind::Assists => ReportSpec {
                metrics: vec![Metric::sum("Assists", Stat::Assists)],
                rank: RankColumn::Shown,
                tie_break_matches: true,
                show_matches: true,
                ..base
            },
            ReportKind::GoalsAndAssists => ReportSpec {
                metrics: vec![
                    Metric::sum("Goals", Stat::Goals),
                    Metric::sum("Assists", Stat::Assists),
                    Metric {
                        label: "Goals + Assists",
                        formula: Formula::Total(&[Stat::Goals, Stat::Assists]),
                    },
                ],
                primary: 2,
                rank: RankColumn::Shown,
                tie_break_matches: true,
                show_matches: true,
                ..base
            },
            ReportKind::ChancesCreated => ReportSpec {
                metrics: vec![Metric::sum("Chances Created", Stat::ChancesCreated)],
                rank: match scope {
                    Scope::Overall => RankColumn::Shown,
                    Scope::ByTeam => RankColumn::Hidden,
                },
                tie_break_matches: true,
                show_matches: true,
                ..base
            },
            ReportKind::ShotAccuracy => ReportSpec {
                metrics: vec![
                    Metric::sum("Shots", Stat::Shots),
                    Metric {
                        label: "Shot Accuracy",
                        formula: Formula::Percentage {
                            part: Stat::ShotsOnTarget,
                            whole: Stat::Shots,
                        },
                    },
                ],
                primary: 1,
                threshold: Some(Threshold {
                    metric: 0,
                    center: match scope {
                        Scope::Overall => Center::Mean,
                        Scope::ByTeam => Center::Median,
                    },
                    comparison: Comparison::AtLeast,
                }),
                show_matches: true,
                ..base
            },
            ReportKind::Fouls => ReportSpec {
                metrics: vec![Metric::sum("Fouls", Stat::Fouls)],
                rank: RankColumn::Shown,
                show_matches: true,
                ..base
            },
            ReportKind::YellowCards => ReportSpec {
                metrics: vec![Metric::sum("Yellow Cards", Stat::YellowCards)],
                ..base
            },
            ReportKind::RedCards => ReportSpec {
                metrics: vec![Metric::sum("Red Cards", Stat::RedCards)],
                ..base
            },
            ReportKind::Offsides => ReportSpec {
                metrics: vec![Metric::sum("Offside", Stat::Offsides)],
                ..base
            },
            ReportKind::TacklesPerMatch => ReportSpec {
                metrics: vec![Metric::per_match("Tackles Per Match", Stat::Tackles)],
                ..base
            },
            ReportKind::InterceptionsPerMatch => ReportSpec {
                metrics: vec![Metric::per_match(
                    "Interceptions Per Match",
                    Stat::Interceptions,
                )],
                ..base
            },
            ReportKind::BlocksPerMatch => ReportSpec {
                metrics: vec![Metric::per_match("Blocks Per Match", Stat::Blocks)],
                ..base
            },
            ReportKind::GoalkeeperSaves => ReportSpec {
                metrics: vec![Metric::sum("Saves", Stat::Saves)],
                ..base
            },
            ReportKind::GoalkeeperCleanSheets => ReportSpec {
                goalkeepers_only: true,
                metrics: vec![Metric::sum("Clean Sheets", Stat::CleanSheets)],
                ..base
            },
            ReportKind::GoalkeeperSavePercentage => ReportSpec {
                goalkeepers_only: true,
                metrics: vec![
                    Metric::sum("Saves", Stat::Saves),
                    Metric {
                        label: "Save Percentage",
                        formula: Formula::Percentage {
                            part: Stat::Saves,
                            whole: Stat::ShotsFaced,
                        },
                    },
                ],
                primary: 1,
                drop_zero: false,
                threshold: Some(Threshold {
                    metric: 0,
                    center: Center::Mean,
                    comparison: Comparison::Above,
                }),
                ..base
            },
            ReportKind::TeamTotals => ReportSpec {
                metrics: vec![
                    Metric::sum("Goals", Stat::Goals),
                    Metric::sum("Shots", Stat::Shots),
                    Metric::sum("Shots On Target", Stat::ShotsOnTarget),
                    Metric {
                        label: "Shot Accuracy",
                        formula: Formula::Percentage {
                            part: Stat::ShotsOnTarget,
                            whole: Stat::Shots,
                        },
                    },
                ],
                drop_zero: false,
                rank: RankColumn::Shown,
                tie_break_matches: true,
                show_matches: true,
                ..base
            },
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scope {
    #[default]
    Overall,
    ByTeam,
}

impl Scope {
    pub fn toggle(self) -> Scope {
        match self {
            Scope::Overall => Scope::ByTeam,
            Scope::ByTeam => Scope::Overall,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scope::Overall => "Overall",
            Scope::ByTeam => "By Team",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grouping {
    Player,
    PlayerTeam,
    Team,
}

impl Grouping {
    pub fn key_labels(self) -> &'static [&'static str] {
        match self {
            Grouping::Player => &["Name"],
            Grouping::PlayerTeam => &["Name", "Team"],
            Grouping::Team => &["Team"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankColumn {
    None,
    /// Computed for ordering but left out of the output.
    Hidden,
    Shown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    Sum(Stat),
    Total(&'static [Stat]),
    /// `part / whole * 100`, 0 when `whole` is 0.
    Percentage { part: Stat, whole: Stat },
    PerMatch(Stat),
}

impl Formula {
    pub fn stats(&self) -> Vec<Stat> {
        match *self {
            Formula::Sum(stat) | Formula::PerMatch(stat) => vec![stat],
            Formula::Total(stats) => stats.to_vec(),
            Formula::Percentage { part, whole } => vec![part, whole],
        }
    }

    pub fn is_fractional(&self) -> bool {
        matches!(self, Formula::Percentage { .. } | Formula::PerMatch(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub label: &'static str,
    pub formula: Formula,
}

impl Metric {
    pub fn sum(label: &'static str, stat: Stat) -> Self {
        Self {
            label,
            formula: Formula::Sum(stat),
        }
    }

    pub fn per_match(label: &'static str, stat: Stat) -> Self {
        Self {
            label,
            formula: Formula::PerMatch(stat),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Center {
    Mean,
    Median,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    AtLeast,
    Above,
}

impl Comparison {
    pub fn keeps(self, value: f64, center: f64) -> bool {
        match self {
            Comparison::AtLeast => value >= center,
            Comparison::Above => value > center,
        }
    }
}

/// Drops small-sample groups: `metrics[metric]` compared against its center across all groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub metric: usize,
    pub center: Center,
    pub comparison: Comparison,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportSpec {
    pub kind: ReportKind,
    pub grouping: Grouping,
    pub goalkeepers_only: bool,
    pub metrics: Vec<Metric>,
    /// Index into `metrics` used for zero filter, sort and rank.
    pub primary: usize,
    pub drop_zero: bool,
    pub threshold: Option<Threshold>,
    pub rank: RankColumn,
    pub tie_break_matches: bool,
    pub show_matches: bool,
}

impl ReportSpec {
    pub fn column_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        if self.rank == RankColumn::Shown {
            labels.push("Rank".to_string());
        }
        labels.extend(self.grouping.key_labels().iter().map(|s| s.to_string()));
        if self.show_matches {
            labels.push("Matches".to_string());
        }
        labels.extend(self.metrics.iter().map(|m| m.label.to_string()));
        labels
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Int(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v:.1}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub kind: ReportKind,
    pub grouping: Grouping,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Cell by row index and column label.
    pub fn cell(&self, row: usize, label: &str) -> Option<&Cell> {
        let col = self.column_index(label)?;
        self.rows.get(row)?.get(col)
    }

    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip_through_parse() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::parse(&kind.slug()), Some(kind));
            assert_eq!(ReportKind::parse(&kind.label().to_uppercase()), Some(kind));
        }
        assert_eq!(ReportKind::GoalsAndAssists.slug(), "goals-assists");
        assert_eq!(ReportKind::parse("nope"), None);
    }

    #[test]
    fn fixed_groupings_ignore_scope() {
        assert_eq!(ReportKind::TeamTotals.grouping(Scope::Overall), Grouping::Team);
        assert_eq!(
            ReportKind::GoalkeeperCleanSheets.grouping(Scope::Overall),
            Grouping::PlayerTeam
        );
        assert_eq!(ReportKind::Goals.grouping(Scope::ByTeam), Grouping::PlayerTeam);
        assert!(!ReportKind::DetailedGoals.honours_scope());
        assert!(ReportKind::Fouls.honours_scope());
    }

    #[test]
    fn descriptors_reference_real_metrics() {
        for kind in ReportKind::ALL {
            for scope in [Scope::Overall, Scope::ByTeam] {
                let spec = kind.spec(scope);
                assert!(spec.primary < spec.metrics.len(), "{kind}");
                if let Some(t) = spec.threshold {
                    assert!(t.metric < spec.metrics.len(), "{kind}");
                }
            }
        }
    }

    #[test]
    fn chances_created_hides_rank_by_team() {
        let overall = ReportKind::ChancesCreated.spec(Scope::Overall).column_labels();
        let by_team = ReportKind::ChancesCreated.spec(Scope::ByTeam).column_labels();
        assert_eq!(overall, ["Rank", "Name", "Matches", "Chances Created"]);
        assert_eq!(by_team, ["Name", "Team", "Matches", "Chances Created"]);
    }

    #[test]
    fn float_cells_show_one_decimal() {
        assert_eq!(Cell::Float(66.66).to_string(), "66.7");
        assert_eq!(Cell::Float(0.0).to_string(), "0.0");
        assert_eq!(Cell::Int(3).to_string(), "3");
    }
}
