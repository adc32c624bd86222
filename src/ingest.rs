use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{Config, SourceKind};
use crate::dataset::{
    Dataset, ParsedEvents, TeamLookup, decode_latin1, parse_events_csv, parse_team_lookup_csv,
};
use crate::http_cache::fetch_bytes_cached;
use crate::http_client::http_client;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub source: String,
    pub files_loaded: Vec<String>,
    pub rows: usize,
    pub skipped_rows: usize,
    pub players: usize,
    pub matches: usize,
    pub teams: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedData {
    pub dataset: Dataset,
    pub summary: LoadSummary,
}

/// One entry of the GitHub contents API listing.
#[derive(Debug, Clone, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub download_url: String,
}

pub fn load(config: &Config) -> Result<LoadedData> {
    match config.source {
        SourceKind::GitHub => load_github(config),
        SourceKind::Local => {
            let lookup = config.team_lookup.as_deref();
            if let Some(url) = lookup.filter(|l| is_url(l)) {
                let client = http_client(config.http_timeout)?;
                let teams = fetch_team_lookup(client, url, &[]);
                load_local_dir_with(&config.local_dir, Some(teams))
            } else {
                load_local_dir(&config.local_dir, lookup.map(Path::new))
            }
        }
    }
}

pub fn load_github(config: &Config) -> Result<LoadedData> {
    let client = http_client(config.http_timeout)?;
    let gh = &config.github;
    let auth = gh.token.as_ref().map(|t| format!("Bearer {t}"));
    let mut headers: Vec<(&str, &str)> = vec![("Accept", "application/vnd.github+json")];
    if let Some(auth) = auth.as_deref() {
        headers.push(("Authorization", auth));
    }

    let listing_url = gh.contents_url();
    let listing = fetch_bytes_cached(client, &listing_url, &headers)
        .context("error accessing GitHub repository")?;
    let listing = String::from_utf8(listing).context("GitHub listing is not UTF-8")?;
    let files = parse_contents_listing(&listing)?;
    if files.is_empty() {
        bail!("no CSV files found in {} directory", gh.csv_dir);
    }

    let parts = files
        .iter()
        .map(|file| {
            info!("loading {}", file.name);
            let parsed = fetch_bytes_cached(client, &file.download_url, &headers)
                .and_then(|bytes| parse_events_csv(&decode_latin1(&bytes)));
            (file.name.clone(), parsed)
        })
        .collect();

    let teams = config.team_lookup.as_deref().map(|lookup| {
        let url = if is_url(lookup) {
            lookup.to_string()
        } else {
            gh.raw_url(lookup)
        };
        fetch_team_lookup(client, &url, &headers)
    });

    assemble(config.source_label(), parts, teams)
}

/// Every `*.csv` in `dir`, in file-name order.
pub fn load_local_dir(dir: &Path, team_lookup: Option<&Path>) -> Result<LoadedData> {
    let teams = team_lookup.map(|path| {
        fs::read(path)
            .with_context(|| format!("read team lookup {}", path.display()))
            .and_then(|bytes| parse_team_lookup_csv(&decode_latin1(&bytes)))
    });
    load_local_dir_with(dir, teams)
}

fn load_local_dir_with(dir: &Path, teams: Option<Result<TeamLookup>>) -> Result<LoadedData> {
    let files = local_csv_files(dir)?;
    if files.is_empty() {
        bail!("no CSV files found in {}", dir.display());
    }
    let parts = files
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            info!("loading {name}");
            let parsed = fs::read(path)
                .with_context(|| format!("read {}", path.display()))
                .and_then(|bytes| parse_events_csv(&decode_latin1(&bytes)));
            (name, parsed)
        })
        .collect();
    assemble(format!("local:{}", dir.display()), parts, teams)
}

fn local_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read data directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list {}", dir.display()))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn fetch_team_lookup(client: &Client, url: &str, headers: &[(&str, &str)]) -> Result<TeamLookup> {
    fetch_bytes_cached(client, url, headers)
        .and_then(|bytes| parse_team_lookup_csv(&decode_latin1(&bytes)))
        .with_context(|| format!("error fetching team lookup {url}"))
}

/// CSV files from a contents listing, in listing order.
pub fn parse_contents_listing(raw: &str) -> Result<Vec<RemoteFile>> {
    let entries: Vec<ContentEntry> = serde_json::from_str(raw)
        .map_err(|err| anyhow!("unexpected GitHub contents listing: {err}"))?;
    Ok(entries
        .into_iter()
        .filter(|e| e.kind.as_deref().is_none_or(|k| k == "file"))
        .filter(|e| e.name.to_ascii_lowercase().ends_with(".csv"))
        .filter_map(|e| {
            let download_url = e.download_url?;
            Some(RemoteFile {
                name: e.name,
                download_url,
            })
        })
        .collect())
}

/// Concatenates the parsed files into one snapshot. Failed files become warnings;
/// the load fails only when nothing could be read.
pub fn assemble(
    source: String,
    parts: Vec<(String, Result<ParsedEvents>)>,
    teams: Option<Result<TeamLookup>>,
) -> Result<LoadedData> {
    if parts.is_empty() {
        bail!("no CSV files to load from {source}");
    }

    let mut merged = ParsedEvents::default();
    let mut summary = LoadSummary {
        source,
        ..LoadSummary::default()
    };
    let mut first_error = None;

    for (name, parsed) in parts {
        match parsed {
            Ok(parsed) => {
                summary.files_loaded.push(name);
                merged.append(parsed);
            }
            Err(err) => {
                let msg = format!("error reading {name}: {err:#}");
                warn!("{msg}");
                first_error.get_or_insert_with(|| msg.clone());
                summary.warnings.push(msg);
            }
        }
    }

    if summary.files_loaded.is_empty() {
        let reason = first_error.unwrap_or_default();
        bail!("failed to load any CSV files ({reason})");
    }

    let teams = match teams {
        Some(Ok(teams)) => teams,
        Some(Err(err)) => {
            let msg = format!("team lookup unavailable: {err:#}");
            warn!("{msg}");
            summary.warnings.push(msg);
            TeamLookup::new()
        }
        None => TeamLookup::new(),
    };

    if merged.skipped > 0 {
        let msg = format!("skipped {} rows without playerid/matchid", merged.skipped);
        warn!("{msg}");
        summary.warnings.push(msg);
    }

    summary.skipped_rows = merged.skipped;
    let dataset = Dataset::from_parsed(merged, teams);
    summary.rows = dataset.rows().len();
    summary.players = dataset.distinct_players();
    summary.matches = dataset.distinct_matches();
    summary.teams = dataset.teams().len();

    info!(
        "loaded {} rows ({} players, {} matches) from {} files",
        summary.rows,
        summary.players,
        summary.matches,
        summary.files_loaded.len()
    );

    Ok(LoadedData { dataset, summary })
}

fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}
