use std::collections::{BTreeSet, HashMap};
use std::fmt;

use anyhow::{Context, Result, anyhow};

pub const PLAYER_ID_HEADER: &str = "playerid";
pub const MATCH_ID_HEADER: &str = "matchid";
pub const PLAYER_NAME_HEADER: &str = "Player_FN";
/// Older exports carry the display name here instead of `Player_FN`.
pub const PLAYER_FALLBACK_HEADER: &str = "player";
pub const TEAM_ID_HEADER: &str = "teamid";
pub const POSITION_HEADER: &str = "position";

pub const GOALKEEPER_POSITION: &str = "GK";

/// Per-match counters carried by an event row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stat {
    Goals,
    Assists,
    ChancesCreated,
    Shots,
    ShotsOnTarget,
    Fouls,
    YellowCards,
    RedCards,
    Offsides,
    Tackles,
    Interceptions,
    Blocks,
    Saves,
    ShotsFaced,
    CleanSheets,
    PenaltySaves,
    LeftFootGoals,
    RightFootGoals,
    HeaderGoals,
    PenaltyGoals,
}

impl Stat {
    pub const COUNT: usize = 20;

    pub const ALL: [Stat; Stat::COUNT] = [
        Stat::Goals,
        Stat::Assists,
        Stat::ChancesCreated,
        Stat::Shots,
        Stat::ShotsOnTarget,
        Stat::Fouls,
        Stat::YellowCards,
        Stat::RedCards,
        Stat::Offsides,
        Stat::Tackles,
        Stat::Interceptions,
        Stat::Blocks,
        Stat::Saves,
        Stat::ShotsFaced,
        Stat::CleanSheets,
        Stat::PenaltySaves,
        Stat::LeftFootGoals,
        Stat::RightFootGoals,
        Stat::HeaderGoals,
        Stat::PenaltyGoals,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Stat::Goals => "Goals",
            Stat::Assists => "Assists",
            Stat::ChancesCreated => "chances_created",
            Stat::Shots => "shots",
            Stat::ShotsOnTarget => "shots_on_target",
            Stat::Fouls => "fouls",
            Stat::YellowCards => "yellow_cards",
            Stat::RedCards => "red_cards",
            Stat::Offsides => "offsides",
            Stat::Tackles => "tackles",
            Stat::Interceptions => "interceptions",
            Stat::Blocks => "blocks",
            Stat::Saves => "saves",
            Stat::ShotsFaced => "shots_faced",
            Stat::CleanSheets => "clean_sheets",
            Stat::PenaltySaves => "penalty_saves",
            Stat::LeftFootGoals => "left_foot_goals",
            Stat::RightFootGoals => "right_foot_goals",
            Stat::HeaderGoals => "header_goals",
            Stat::PenaltyGoals => "penalty_goals",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    fn from_header(raw: &str) -> Option<Stat> {
        Stat::ALL.iter().copied().find(|stat| stat.header() == raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    PlayerId,
    PlayerName,
    MatchId,
    TeamId,
    Position,
    Stat(Stat),
}

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::PlayerId => PLAYER_ID_HEADER,
            Column::PlayerName => PLAYER_NAME_HEADER,
            Column::MatchId => MATCH_ID_HEADER,
            Column::TeamId => TEAM_ID_HEADER,
            Column::Position => POSITION_HEADER,
            Column::Stat(stat) => stat.header(),
        }
    }

    fn from_header(raw: &str) -> Option<Column> {
        match raw {
            PLAYER_ID_HEADER => Some(Column::PlayerId),
            PLAYER_NAME_HEADER | PLAYER_FALLBACK_HEADER => Some(Column::PlayerName),
            MATCH_ID_HEADER => Some(Column::MatchId),
            TEAM_ID_HEADER => Some(Column::TeamId),
            POSITION_HEADER => Some(Column::Position),
            other => Stat::from_header(other).map(Column::Stat),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One player's record for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub player_id: String,
    pub player_name: Option<String>,
    pub match_id: String,
    pub team_id: Option<String>,
    pub position: Option<String>,
    counters: [u32; Stat::COUNT],
}

impl EventRow {
    pub fn new(player_id: impl Into<String>, match_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: None,
            match_id: match_id.into(),
            team_id: None,
            position: None,
            counters: [0; Stat::COUNT],
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    pub fn team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }

    pub fn position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with(mut self, stat: Stat, value: u32) -> Self {
        self.set(stat, value);
        self
    }

    pub fn set(&mut self, stat: Stat, value: u32) {
        self.counters[stat.index()] = value;
    }

    pub fn get(&self, stat: Stat) -> u32 {
        self.counters[stat.index()]
    }

    pub fn is_goalkeeper(&self) -> bool {
        self.position.as_deref() == Some(GOALKEEPER_POSITION)
    }
}

/// Team id to display name. Presentation only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamLookup {
    names: HashMap<String, String>,
}

impl TeamLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, team_id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(normalize_id(&team_id.into()), name.into());
    }

    pub fn get(&self, team_id: &str) -> Option<&str> {
        self.names.get(team_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TeamLookup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut lookup = TeamLookup::new();
        for (id, name) in iter {
            lookup.insert(id, name);
        }
        lookup
    }
}

/// Immutable snapshot handed to every report computation.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<EventRow>,
    columns: BTreeSet<Column>,
    teams: TeamLookup,
}

impl Dataset {
    pub fn new(rows: Vec<EventRow>, columns: BTreeSet<Column>, teams: TeamLookup) -> Self {
        let mut columns = columns;
        columns.insert(Column::PlayerId);
        columns.insert(Column::MatchId);
        Self {
            rows,
            columns,
            teams,
        }
    }

    /// Snapshot that claims every known column, for rows built in code.
    pub fn with_all_columns(rows: Vec<EventRow>, teams: TeamLookup) -> Self {
        let mut columns: BTreeSet<Column> = [
            Column::PlayerName,
            Column::TeamId,
            Column::Position,
        ]
        .into_iter()
        .collect();
        columns.extend(Stat::ALL.iter().copied().map(Column::Stat));
        Self::new(rows, columns, teams)
    }

    pub fn from_parsed(parsed: ParsedEvents, teams: TeamLookup) -> Self {
        Self::new(parsed.rows, parsed.columns, teams)
    }

    pub fn rows(&self) -> &[EventRow] {
        &self.rows
    }

    pub fn columns(&self) -> &BTreeSet<Column> {
        &self.columns
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn teams(&self) -> &TeamLookup {
        &self.teams
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lookup name, then the raw id, then blank.
    pub fn team_display(&self, team_id: Option<&str>) -> String {
        match team_id {
            Some(id) => self
                .teams
                .get(id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string()),
            None => String::new(),
        }
    }

    pub fn distinct_players(&self) -> usize {
        let mut ids: Vec<&str> = self.rows.iter().map(|r| r.player_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    pub fn distinct_matches(&self) -> usize {
        let mut ids: Vec<&str> = self.rows.iter().map(|r| r.match_id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }
}

/// Rows parsed from one or more CSV sources, plus the union of their headers.
#[derive(Debug, Clone, Default)]
pub struct ParsedEvents {
    pub rows: Vec<EventRow>,
    pub columns: BTreeSet<Column>,
    pub skipped: usize,
}

impl ParsedEvents {
    pub fn append(&mut self, other: ParsedEvents) {
        self.rows.extend(other.rows);
        self.columns.extend(other.columns);
        self.skipped += other.skipped;
    }
}

/// Source files are ISO-8859-1; every byte maps to the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

pub fn parse_events_csv(text: &str) -> Result<ParsedEvents> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = reader.headers().context("read csv header")?.clone();

    let mut player_id_idx = None;
    let mut match_id_idx = None;
    let mut name_idx = None;
    let mut fallback_name_idx = None;
    let mut team_idx = None;
    let mut position_idx = None;
    let mut stat_idx: Vec<(usize, Stat)> = Vec::new();
    let mut columns = BTreeSet::new();

    for (idx, raw) in headers.iter().enumerate() {
        let header = raw.trim();
        let Some(column) = Column::from_header(header) else {
            continue;
        };
        columns.insert(column);
        match column {
            Column::PlayerId => player_id_idx = Some(idx),
            Column::MatchId => match_id_idx = Some(idx),
            Column::PlayerName if header == PLAYER_FALLBACK_HEADER => {
                fallback_name_idx = Some(idx)
            }
            Column::PlayerName => name_idx = Some(idx),
            Column::TeamId => team_idx = Some(idx),
            Column::Position => position_idx = Some(idx),
            Column::Stat(stat) => stat_idx.push((idx, stat)),
        }
    }

    let player_id_idx = player_id_idx
        .ok_or_else(|| anyhow!("missing required column `{PLAYER_ID_HEADER}`"))?;
    let match_id_idx =
        match_id_idx.ok_or_else(|| anyhow!("missing required column `{MATCH_ID_HEADER}`"))?;

    let mut parsed = ParsedEvents {
        rows: Vec::new(),
        columns,
        skipped: 0,
    };

    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = record.with_context(|| format!("read csv line {line}"))?;
        let cell = |i: Option<usize>| cell_value(&record, i);

        let (Some(player_id), Some(match_id)) =
            (cell(Some(player_id_idx)), cell(Some(match_id_idx)))
        else {
            parsed.skipped += 1;
            continue;
        };

        let mut row = EventRow::new(normalize_id(player_id), normalize_id(match_id));
        row.player_name = cell(name_idx)
            .or_else(|| cell(fallback_name_idx))
            .map(str::to_string);
        row.team_id = cell(team_idx).map(normalize_id);
        row.position = cell(position_idx).map(str::to_string);

        for (i, stat) in &stat_idx {
            let raw = record.get(*i).unwrap_or("");
            let value = parse_counter(raw).with_context(|| {
                format!("line {line}, column `{}`: invalid counter {raw:?}", stat.header())
            })?;
            row.set(*stat, value.unwrap_or(0));
        }
        parsed.rows.push(row);
    }

    Ok(parsed)
}

/// Two columns: team id, team name. The header row is skipped whatever it says.
pub fn parse_team_lookup_csv(text: &str) -> Result<TeamLookup> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut lookup = TeamLookup::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read team lookup line {}", idx + 2))?;
        let id = record.get(0).map(str::trim).unwrap_or("");
        let name = record.get(1).map(str::trim).unwrap_or("");
        if id.is_empty() || name.is_empty() {
            continue;
        }
        let id = normalize_id(id);
        if lookup.get(&id).is_none() {
            lookup.insert(id, name);
        }
    }
    Ok(lookup)
}

/// `None` for a null cell; an error for anything that is not a non-negative whole number.
pub fn parse_counter(raw: &str) -> Result<Option<u32>> {
    let s = raw.trim();
    if s.is_empty() || is_null_marker(s) {
        return Ok(None);
    }
    let value: f64 = s.parse().map_err(|_| anyhow!("not a number"))?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(anyhow!("expected a non-negative whole number"));
    }
    Ok(Some(value as u32))
}

/// Spreadsheet exports write integer ids as `123.0` once a column has a gap.
pub fn normalize_id(raw: &str) -> String {
    let s = raw.trim();
    if let Some(int_part) = s.strip_suffix(".0") {
        if !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit()) {
            return int_part.to_string();
        }
    }
    s.to_string()
}

fn cell_value(record: &csv::StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty() && !is_null_marker(s))
}

fn is_null_marker(s: &str) -> bool {
    matches!(s, "-" | "nan" | "NaN" | "NA" | "N/A" | "null")
}
