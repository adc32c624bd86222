use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::StatsResult;
use crate::report::{Cell, Report, ReportKind};

const MAX_SHEET_NAME: usize = 31;

pub struct WorkbookSummary {
    pub sheets: usize,
    pub rows: usize,
    pub errors: Vec<String>,
}

pub fn report_to_csv_string(report: &Report) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_csv(&mut writer, report)?;
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("flush csv buffer: {}", err.error()))?;
    String::from_utf8(bytes).context("csv output is not UTF-8")
}

pub fn write_report_csv(path: &Path, report: &Report) -> Result<()> {
    ensure_parent(path)?;
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(&mut writer, report)?;
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn write_csv<W: std::io::Write>(writer: &mut csv::Writer<W>, report: &Report) -> Result<()> {
    writer.write_record(&report.columns)?;
    for row in &report.rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }
    Ok(())
}

/// One sheet per report, in the order given.
pub fn export_workbook(
    path: &Path,
    reports: &[(ReportKind, StatsResult<Report>)],
) -> Result<WorkbookSummary> {
    ensure_parent(path)?;
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let mut summary = WorkbookSummary {
        sheets: 0,
        rows: 0,
        errors: Vec::new(),
    };

    for (kind, result) in reports {
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name(kind.label()))?;
        match result {
            Ok(report) => {
                write_report(sheet, report, &header)?;
                summary.rows += report.len();
            }
            Err(err) => {
                sheet.write_string_with_format(0, 0, format!("Error: {err}"), &header)?;
                summary.errors.push(format!("{kind}: {err}"));
            }
        }
        summary.sheets += 1;
    }

    workbook
        .save(path)
        .with_context(|| format!("save workbook {}", path.display()))?;
    Ok(summary)
}

fn write_report(sheet: &mut Worksheet, report: &Report, header: &Format) -> Result<()> {
    for (col_idx, label) in report.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col_idx as u16, label, header)?;
    }
    for (row_idx, row) in report.rows.iter().enumerate() {
        let r = row_idx as u32 + 1;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = col_idx as u16;
            match cell {
                Cell::Int(v) => {
                    sheet.write_number(r, c, *v as f64)?;
                }
                Cell::Float(v) => {
                    sheet.write_number(r, c, *v)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
            }
        }
    }
    Ok(())
}

/// Plain-text table with columns padded to their widest cell. Numbers are
/// right-aligned.
pub fn format_table(report: &Report) -> String {
    let rows = report.display_rows();
    let widths: Vec<usize> = report
        .columns
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            rows.iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .fold(label.chars().count(), usize::max)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = report
        .columns
        .iter()
        .zip(&widths)
        .map(|(label, &w)| format!("{label:<w$}"))
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for (row, cells) in report.rows.iter().zip(&rows) {
        let line: Vec<String> = cells
            .iter()
            .zip(row)
            .zip(&widths)
            .map(|((text, cell), &w)| match cell {
                Cell::Text(_) => format!("{text:<w$}"),
                Cell::Int(_) | Cell::Float(_) => format!("{text:>w$}"),
            })
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Excel limits sheet names to 31 characters and forbids `[]:*?/\`.
pub fn sheet_name(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '-',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

pub fn csv_file_name(kind: ReportKind, at: DateTime<Local>) -> String {
    format!("{}_{}.csv", kind.slug(), at.format("%Y%m%d_%H%M%S"))
}

pub fn workbook_file_name(at: DateTime<Local>) -> String {
    format!("matchday_stats_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}

pub fn export_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::report::Grouping;

    #[test]
    fn csv_has_header_and_no_index() {
        let report = Report {
            kind: ReportKind::ShotAccuracy,
            grouping: Grouping::Player,
            columns: vec!["Name".into(), "Shots".into(), "Shot Accuracy".into()],
            rows: vec![vec![
                Cell::Text("Ann Lee".into()),
                Cell::Int(6),
                Cell::Float(66.7),
            ]],
        };
        let out = report_to_csv_string(&report).unwrap();
        assert_eq!(out, "Name,Shots,Shot Accuracy\nAnn Lee,6,66.7\n");
    }

    #[test]
    fn text_table_pads_columns() {
        let report = Report {
            kind: ReportKind::Goals,
            grouping: Grouping::Player,
            columns: vec!["Rank".into(), "Name".into(), "Goals".into()],
            rows: vec![
                vec![Cell::Int(1), Cell::Text("Ann Lee".into()), Cell::Int(12)],
                vec![Cell::Int(2), Cell::Text("Bo".into()), Cell::Int(3)],
            ],
        };
        let out = format_table(&report);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Rank  Name     Goals");
        assert_eq!(lines[1], "   1  Ann Lee     12");
        assert_eq!(lines[2], "   2  Bo           3");
    }

    #[test]
    fn sheet_names_are_truncated_and_sanitized() {
        let long = "Goalkeeper Save Percentage / Overall Listing";
        let name = sheet_name(long);
        assert_eq!(name.chars().count(), 31);
        assert!(!name.contains('/'));
        assert_eq!(sheet_name("Goals"), "Goals");
    }

    #[test]
    fn file_names_carry_timestamp() {
        let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            csv_file_name(ReportKind::GoalsAndAssists, at),
            "goals-assists_20260304_050607.csv"
        );
        assert_eq!(workbook_file_name(at), "matchday_stats_20260304_050607.xlsx");
    }
}
