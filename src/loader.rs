use std::path::Path;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::config::Config;
use crate::engine;
use crate::export;
use crate::ingest;
use crate::state::{Delta, ProviderCommand};

/// Loads the dataset on a background thread, then serves reload and export
/// commands until the command channel closes.
pub fn spawn_loader(config: Config, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        load_and_send(&config, &tx);

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::Reload => load_and_send(&config, &tx),
                ProviderCommand::ExportCsv { path, report } => {
                    let _ = tx.send(Delta::ExportStarted { path: path.clone() });
                    let delta = match export::write_report_csv(Path::new(&path), &report) {
                        Ok(()) => Delta::ExportFinished {
                            path,
                            message: format!("{} rows", report.len()),
                            errors: 0,
                        },
                        Err(err) => Delta::ExportFailed {
                            path,
                            error: format!("{err:#}"),
                        },
                    };
                    let _ = tx.send(delta);
                }
                ProviderCommand::ExportWorkbook {
                    path,
                    dataset,
                    scope,
                } => {
                    let tx = tx.clone();
                    thread::spawn(move || {
                        let _ = tx.send(Delta::ExportStarted { path: path.clone() });
                        let reports = engine::compute_all(&dataset, scope);
                        let delta = match export::export_workbook(Path::new(&path), &reports) {
                            Ok(summary) => {
                                for err in &summary.errors {
                                    let _ = tx.send(Delta::Log(format!("[WARN] {err}")));
                                }
                                Delta::ExportFinished {
                                    path,
                                    message: format!(
                                        "{} sheets, {} rows",
                                        summary.sheets, summary.rows
                                    ),
                                    errors: summary.errors.len(),
                                }
                            }
                            Err(err) => Delta::ExportFailed {
                                path,
                                error: format!("{err:#}"),
                            },
                        };
                        let _ = tx.send(delta);
                    });
                }
            }
        }
    });
}

fn load_and_send(config: &Config, tx: &Sender<Delta>) {
    let _ = tx.send(Delta::Log(format!(
        "[INFO] Loading from {}",
        config.source_label()
    )));
    let delta = match ingest::load(config) {
        Ok(data) => Delta::Loaded(Box::new(data)),
        Err(err) => Delta::LoadFailed(format!("{err:#}")),
    };
    let _ = tx.send(delta);
}
