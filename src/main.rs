use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};

use matchday_stats::config::Config;
use matchday_stats::export;
use matchday_stats::loader;
use matchday_stats::report::{Report, ReportKind};
use matchday_stats::state::{self, AppState, ProviderCommand, ReportView, apply_delta};

const PAGE: usize = 10;

struct App {
    state: AppState,
    config: Config,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
}

impl App {
    fn new(config: Config, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(),
            config,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::PageDown => self.state.scroll_down(PAGE),
            KeyCode::PageUp => self.state.scroll_up(PAGE),
            KeyCode::Char('t') | KeyCode::Char('T') => {
                self.state.toggle_scope();
                let scope = self.state.scope.label();
                self.state.push_log(format!("[INFO] Scope: {scope}"));
            }
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_reload(),
            KeyCode::Char('e') | KeyCode::Char('E') => self.request_csv_export(),
            KeyCode::Char('x') | KeyCode::Char('X') => self.request_workbook_export(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand) -> bool {
        let Some(tx) = &self.cmd_tx else {
            return false;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Loader thread is gone");
            return false;
        }
        true
    }

    fn request_reload(&mut self) {
        if self.state.loading {
            self.state.push_log("[INFO] Load already in progress");
            return;
        }
        if self.send(ProviderCommand::Reload) {
            self.state.loading = true;
        }
    }

    fn request_csv_export(&mut self) {
        let Some(report) = self.state.current_report().cloned() else {
            self.state
                .push_log("[WARN] Nothing to export for the selected report");
            return;
        };
        let file_name = export::csv_file_name(report.kind, Local::now());
        let path = export::export_path(&self.config.export_dir, &file_name);
        let path = path.display().to_string();
        self.send(ProviderCommand::ExportCsv { path, report });
    }

    fn request_workbook_export(&mut self) {
        let Some(dataset) = self.state.snapshot() else {
            self.state.push_log("[WARN] No dataset loaded yet");
            return;
        };
        let file_name = export::workbook_file_name(Local::now());
        let path = export::export_path(&self.config.export_dir, &file_name);
        let path = path.display().to_string();
        let scope = self.state.scope;
        self.send(ProviderCommand::ExportWorkbook {
            path,
            dataset,
            scope,
        });
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = Config::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    loader::spawn_loader(config.clone(), tx, cmd_rx);

    let mut app = App::new(config, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.maybe_clear_export(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(20)])
        .split(chunks[1]);
    render_report_list(frame, body[0], &app.state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(5)])
        .split(body[1]);
    render_report(frame, right[0], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, right[1]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[2]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let kind = state.selected_kind();
    let line1 = format!(
        "MATCHDAY STATS | {} | Scope: {}",
        kind.label(),
        state.scope.label()
    );
    let line2 = match &state.session {
        Some(session) => {
            let summary = session.summary();
            format!(
                "{} | {} rows, {} players, {} matches | loaded {}{}",
                summary.source,
                summary.rows,
                summary.players,
                summary.matches,
                session.loaded_at().format("%H:%M:%S"),
                reload_marker(state)
            )
        }
        None if state.loading => "Loading…".to_string(),
        None => "No dataset".to_string(),
    };
    format!("{line1}\n{line2}")
}

fn reload_marker(state: &AppState) -> &'static str {
    if state.loading {
        " | reloading…"
    } else if state.reload_failed {
        " | reload failed, showing previous load"
    } else {
        ""
    }
}

fn footer_text(state: &AppState) -> String {
    if state.export.active {
        let path = state.export.path.as_deref().unwrap_or("");
        return format!("Export {path}: {}", state.export.message);
    }
    "j/k/↑/↓ Report | PgUp/PgDn Scroll | t Scope | r Reload | e CSV | x Workbook | ? Help | q Quit"
        .to_string()
}

fn render_report_list(frame: &mut Frame, area: Rect, state: &AppState) {
    let selected = state.selected_kind();
    let lines: Vec<Line> = ReportKind::ALL
        .iter()
        .map(|kind| {
            let scoped = if kind.honours_scope() { "" } else { " *" };
            let text = format!("{}{scoped}", kind.label());
            if *kind == selected {
                Line::from(Span::styled(
                    format!("> {text}"),
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(format!("  {text}"))
            }
        })
        .collect();

    let list = Paragraph::new(lines).block(Block::default().title("Reports").borders(Borders::ALL));
    frame.render_widget(list, area);
}

fn render_report(frame: &mut Frame, area: Rect, state: &AppState) {
    let kind = state.selected_kind();
    let block = Block::default()
        .title(format!("{} ({})", kind.label(), state.scope.label()))
        .borders(Borders::ALL);

    match &state.view {
        ReportView::Loading => {
            let text = Paragraph::new("Loading…").block(block);
            frame.render_widget(text, area);
        }
        ReportView::Failed(err) | ReportView::Unavailable(err) => {
            let text = Paragraph::new(err.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(text, area);
        }
        ReportView::Ready(report) if report.is_empty() => {
            let text = Paragraph::new(format!("No data\n\n{}", kind.description())).block(block);
            frame.render_widget(text, area);
        }
        ReportView::Ready(report) => {
            let visible = area.height.saturating_sub(3) as usize;
            let (start, end) = visible_range(state.table_scroll, report.len(), visible);
            frame.render_widget(report_table(report, start, end).block(block), area);
        }
    }
}

fn report_table(report: &Report, start: usize, end: usize) -> Table<'static> {
    let rows = report.display_rows();
    let widths: Vec<Constraint> = report
        .columns
        .iter()
        .enumerate()
        .map(|(idx, label)| {
            let widest = rows
                .iter()
                .filter_map(|row| row.get(idx))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
                .max(label.chars().count());
            Constraint::Length(widest as u16 + 1)
        })
        .collect();

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new(
        report
            .columns
            .iter()
            .map(|label| Cell::from(label.clone()).style(bold))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(Color::Yellow));

    let body: Vec<Row> = rows
        .into_iter()
        .skip(start)
        .take(end - start)
        .map(|row| Row::new(row.into_iter().map(Cell::from).collect::<Vec<_>>()))
        .collect();

    Table::new(body, widths).header(header)
}

fn visible_range(first: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }
    let start = first.min(total - visible);
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Matchday Stats - Help",
        "",
        "  j/k or ↑/↓   Select report",
        "  PgUp/PgDn    Scroll table",
        "  t            Toggle Overall / By Team",
        "  r            Reload dataset",
        "  e            Export report to CSV",
        "  x            Export all reports to a workbook",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Reports marked * ignore the scope toggle.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
