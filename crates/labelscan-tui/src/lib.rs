// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use labelscan_app::{
    AnalysisError, AnalysisResult, AppCommand, AppEvent, AppState, DisplayMode, RequestId,
    ResultRegion, SelectedFile, ViewState,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);

pub trait AppRuntime {
    fn load_file(&mut self, path: &Path) -> Result<SelectedFile>;
    fn analyze(&mut self, file: &SelectedFile) -> AnalysisResult;
    fn spawn_analysis(
        &mut self,
        request_id: RequestId,
        file: SelectedFile,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self.analyze(&file);
        tx.send(InternalEvent::AnalysisFinished { request_id, result })
            .map_err(|_| anyhow::anyhow!("analysis event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    AnalysisFinished {
        request_id: RequestId,
        result: AnalysisResult,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TuiOptions {
    /// Directory the file prompt starts in and resolves relative paths against.
    pub start_dir: PathBuf,
    pub home_dir: Option<PathBuf>,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct PickerUiState {
    visible: bool,
    input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    options: TuiOptions,
    picker: PickerUiState,
    status_line: Option<String>,
    status_token: u64,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        options,
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    // Dropping the receiver makes late worker sends fail, so nothing lands
    // on a torn-down view.
    drop(internal_rx);
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::AnalysisFinished { request_id, result } => {
                let events = state.dispatch(AppCommand::Resolve { request_id, result });
                log_events(&events);
                if events
                    .iter()
                    .any(|event| matches!(event, AppEvent::StaleResponseDiscarded { .. }))
                {
                    emit_status(view_data, tx, "ignored a result for an earlier file");
                }
            }
        }
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.picker.visible {
        handle_picker_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('o') | KeyCode::Char('f') => open_picker(view_data),
        KeyCode::Enter | KeyCode::Char('s') => {
            apply_command(state, runtime, view_data, internal_tx, AppCommand::Submit);
        }
        _ => {}
    }
    false
}

fn open_picker(view_data: &mut ViewData) {
    let start = view_data.options.start_dir.display().to_string();
    let input = if start.is_empty() || start.ends_with('/') {
        start
    } else {
        format!("{start}/")
    };
    view_data.picker = PickerUiState {
        visible: true,
        input,
    };
}

fn handle_picker_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Esc => {
            view_data.picker = PickerUiState::default();
        }
        KeyCode::Backspace => {
            view_data.picker.input.pop();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.picker.input.clear();
        }
        KeyCode::Char(ch) => {
            view_data.picker.input.push(ch);
        }
        KeyCode::Enter => {
            let path = resolve_picker_path(
                &view_data.picker.input,
                &view_data.options.start_dir,
                view_data.options.home_dir.as_deref(),
            );
            match runtime.load_file(&path) {
                Ok(file) => {
                    view_data.picker = PickerUiState::default();
                    apply_command(
                        state,
                        runtime,
                        view_data,
                        internal_tx,
                        AppCommand::SelectFile(file),
                    );
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %format!("{error:#}"), "file pick rejected");
                    emit_status(view_data, internal_tx, format!("{error:#}"));
                }
            }
        }
        _ => {}
    }
}

fn apply_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    log_events(&events);

    for event in events {
        if let AppEvent::RequestIssued { request_id, file } = event
            && let Err(error) = runtime.spawn_analysis(request_id, file, internal_tx.clone())
        {
            // A request that never started must not leave the view loading.
            let failure = AnalysisError::Transport(format!("{error:#}"));
            let resolved = state.dispatch(AppCommand::Resolve {
                request_id,
                result: Err(failure),
            });
            log_events(&resolved);
            emit_status(view_data, internal_tx, "could not start analysis");
        }
    }
}

fn log_events(events: &[AppEvent]) {
    for event in events {
        match event {
            AppEvent::FileSelected { name } => tracing::info!(%name, "file selected"),
            AppEvent::RequestIssued { request_id, file } => {
                tracing::info!(%request_id, name = %file.name, "analysis requested");
            }
            AppEvent::RequestAbandoned { request_id } => {
                tracing::info!(%request_id, "in-flight analysis superseded by new file");
            }
            AppEvent::StaleResponseDiscarded { request_id } => {
                tracing::info!(%request_id, "discarded stale analysis result");
            }
            AppEvent::OutcomeResolved(outcome) => {
                tracing::info!(outcome = outcome.label(), "analysis resolved");
            }
            AppEvent::ValidationFailed(message) => tracing::debug!(%message, "submit rejected"),
            AppEvent::SubmitIgnored => tracing::debug!("submit ignored while loading"),
            AppEvent::OutcomeReset => tracing::debug!("outcome reset"),
        }
    }
}

/// Resolves prompt input against the start directory, expanding `~`.
pub fn resolve_picker_path(input: &str, start_dir: &Path, home_dir: Option<&Path>) -> PathBuf {
    let trimmed = input.trim();
    if let Some(home) = home_dir {
        if trimmed == "~" {
            return home.to_path_buf();
        }
        if let Some(rest) = trimmed.strip_prefix("~/") {
            return home.join(rest);
        }
    }

    let path = Path::new(trimmed);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        start_dir.join(path)
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let view = state.view();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(&view_data.options))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let upload = Paragraph::new(render_upload_text(&view))
        .block(
            Block::default()
                .title(upload_title(view.mode))
                .borders(Borders::ALL),
        );
    frame.render_widget(upload, layout[1]);

    let results = Paragraph::new(render_result_text(&view))
        .style(region_style(&view.region))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("analysis summary")
                .borders(Borders::ALL),
        );
    frame.render_widget(results, layout[2]);

    let status = Paragraph::new(status_text(&view, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.picker.visible {
        let area = centered_rect(70, 24, frame.area());
        frame.render_widget(Clear, area);
        let picker = Paragraph::new(render_picker_text(&view_data.picker))
            .block(Block::default().title("select image").borders(Borders::ALL));
        frame.render_widget(picker, area);
    }
}

fn header_text(options: &TuiOptions) -> String {
    if options.endpoint.is_empty() {
        "AI Nutrition Label Analyzer".to_owned()
    } else {
        format!("AI Nutrition Label Analyzer  ({})", options.endpoint)
    }
}

fn upload_title(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Idle => "upload: no file",
        DisplayMode::FileSelected => "upload: ready",
        DisplayMode::Loading => "upload: analyzing",
        DisplayMode::Result => "upload: done",
    }
}

fn render_upload_text(view: &ViewState) -> String {
    let selected = match &view.selected_file {
        Some(name) => format!("Selected: {name}"),
        None => "Selected: (none)".to_owned(),
    };
    let button = if view.submit_enabled {
        format!("[ {} ]  (enter)", view.submit_label)
    } else {
        format!("[ {} ]  (unavailable)", view.submit_label)
    };
    ["1. Select a photo of a food label (o)".to_owned(), selected, String::new(), button]
        .join("\n")
}

fn render_result_text(view: &ViewState) -> String {
    match &view.region {
        ResultRegion::Placeholder(message) => (*message).to_owned(),
        ResultRegion::ValidationError(message) => message.clone(),
        ResultRegion::Progress => "Analyzing... waiting for the backend".to_owned(),
        ResultRegion::RemoteError(message) => format!("Backend Error:\n{message}"),
        ResultRegion::Summary(summary) => format!("LLM Insight:\n{summary}"),
    }
}

fn region_style(region: &ResultRegion) -> Style {
    match region {
        ResultRegion::Placeholder(_) => Style::default().fg(Color::Gray),
        ResultRegion::ValidationError(_) => Style::default().fg(Color::Magenta),
        ResultRegion::Progress => Style::default().fg(Color::Yellow),
        ResultRegion::RemoteError(_) => Style::default().fg(Color::Red),
        ResultRegion::Summary(_) => Style::default().fg(Color::Green),
    }
}

fn render_picker_text(picker: &PickerUiState) -> String {
    format!(
        "path: {}_\n\nenter select | esc cancel | ctrl+u clear",
        picker.input
    )
}

fn status_text(view: &ViewState, view_data: &ViewData) -> String {
    let submit = if view.submit_enabled {
        "enter analyze"
    } else {
        "enter (unavailable)"
    };
    let keys = format!("o pick file | {submit} | q quit");
    match &view_data.status_line {
        Some(status) => format!("{status} | {keys}"),
        None => keys,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
