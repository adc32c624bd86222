use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use log::{error, info};

use matchday_stats::config::Config;
use matchday_stats::engine;
use matchday_stats::export;
use matchday_stats::ingest;
use matchday_stats::report::{ReportKind, Scope};

#[derive(Parser)]
#[command(name = "stats_report")]
#[command(about = "Football match-event statistics reports", long_about = None)]
struct Cli {
    /// Where to read match CSV files from
    #[arg(long, value_enum)]
    source: Option<SourceArg>,

    /// Directory of match CSV files (implies --source local)
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// Team lookup CSV: file path, repository path, or URL
    #[arg(long, value_name = "PATH|URL")]
    teams: Option<String>,

    #[arg(long, value_enum, default_value = "overall")]
    scope: ScopeArg,

    /// Report slug, repeatable (see --list)
    #[arg(long = "report", value_name = "SLUG")]
    reports: Vec<String>,

    /// Every report in the catalogue
    #[arg(long)]
    all: bool,

    /// Write the selected report as CSV
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write every selected report to a workbook
    #[arg(long, value_name = "PATH")]
    xlsx: Option<PathBuf>,

    /// List available reports and exit
    #[arg(long)]
    list: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Github,
    Local,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Overall,
    Team,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if cli.list {
        print_catalogue();
        return Ok(());
    }

    let config = config_from(&cli, |key| env::var(key).ok());
    let kinds = selected_kinds(&cli)?;
    let scope = match cli.scope {
        ScopeArg::Overall => Scope::Overall,
        ScopeArg::Team => Scope::ByTeam,
    };

    let loaded = ingest::load(&config)?;
    for warning in &loaded.summary.warnings {
        eprintln!("warning: {warning}");
    }
    info!(
        "{} rows from {} files",
        loaded.summary.rows,
        loaded.summary.files_loaded.len()
    );
    let dataset = loaded.dataset;

    if let Some(path) = &cli.xlsx {
        let reports = if kinds.len() == ReportKind::ALL.len() {
            engine::compute_all(&dataset, scope)
        } else {
            kinds
                .iter()
                .map(|&kind| (kind, engine::compute_report(&dataset, kind, scope)))
                .collect()
        };
        let summary = export::export_workbook(path, &reports)?;
        println!(
            "wrote {} ({} sheets, {} rows)",
            path.display(),
            summary.sheets,
            summary.rows
        );
        for err in &summary.errors {
            error!("{err}");
        }
    }

    let mut failed = 0usize;
    for &kind in &kinds {
        let report = match engine::compute_report(&dataset, kind, scope) {
            Ok(report) => report,
            Err(err) => {
                eprintln!("error: {err}");
                failed += 1;
                continue;
            }
        };
        if let Some(path) = &cli.csv {
            export::write_report_csv(path, &report)?;
            println!("wrote {} ({} rows)", path.display(), report.len());
        } else if cli.xlsx.is_none() {
            println!("== {} ({}) ==", kind.label(), scope.label());
            if report.is_empty() {
                println!("No data");
            } else {
                print!("{}", export::format_table(&report));
            }
            println!();
        }
    }

    if failed > 0 {
        bail!("{failed} of {} reports failed", kinds.len());
    }
    Ok(())
}

/// Flags win over `STATS_*` values from `lookup`.
fn config_from(cli: &Cli, lookup: impl Fn(&str) -> Option<String>) -> Config {
    let mut overrides: HashMap<&str, String> = HashMap::new();
    match cli.source {
        Some(SourceArg::Github) => {
            overrides.insert("STATS_SOURCE", "github".to_string());
        }
        Some(SourceArg::Local) => {
            overrides.insert("STATS_SOURCE", "local".to_string());
        }
        None if cli.dir.is_some() => {
            overrides.insert("STATS_SOURCE", "local".to_string());
        }
        None => {}
    }
    if let Some(dir) = &cli.dir {
        overrides.insert("STATS_LOCAL_DIR", dir.display().to_string());
    }
    if let Some(teams) = &cli.teams {
        overrides.insert("STATS_TEAM_LOOKUP", teams.clone());
    }
    Config::from_lookup(|key| overrides.get(key).cloned().or_else(|| lookup(key)))
}

fn selected_kinds(cli: &Cli) -> Result<Vec<ReportKind>> {
    let kinds = if cli.all || cli.reports.is_empty() {
        ReportKind::ALL.to_vec()
    } else {
        let mut kinds = Vec::new();
        for raw in &cli.reports {
            let Some(kind) = ReportKind::parse(raw) else {
                bail!("unknown report `{raw}` (try --list)");
            };
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    };
    if cli.csv.is_some() && kinds.len() != 1 {
        bail!("--csv writes a single report; pick one with --report");
    }
    Ok(kinds)
}

fn print_catalogue() {
    let width = ReportKind::ALL
        .iter()
        .map(|k| k.slug().len())
        .max()
        .unwrap_or(0);
    for kind in ReportKind::ALL {
        let scoped = if kind.honours_scope() { "" } else { " [fixed grouping]" };
        println!(
            "{:<width$}  {}{scoped}\n{:<width$}  {}",
            kind.slug(),
            kind.label(),
            "",
            kind.description()
        );
    }
}
