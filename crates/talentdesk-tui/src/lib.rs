// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{
    BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap,
};
use serde_json::{Map, Value};
use std::io;
use std::ops::Range;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use talentdesk_app::analytics::{
    MonthlyFunnel, application_status_counts, group_by_columns, group_counts, key_metrics,
    monthly_funnel, numeric_distribution, reference_feedback_buckets, summary_stats,
};
use talentdesk_app::{
    ApiOutcome, AppCommand, AppEvent, AppMode, AppState, BadgeTone, CandidateRecord, CellDisplay,
    DEFAULT_LONG_TEXT_WIDTH, DetailView, DropdownOptions, FormField, FormKind, FormWidget,
    NotificationLevel, RecordBatch, RecordId, RenderedCell, SortDirection, SortSpec, ViewKind,
    WriteOrigin, WriteRequest, build_edit_form_for_role, build_form, collect_submission,
    detail_view, form_entries, format_indian_grouping, render_cell, sorted_row_order,
    validate_form,
};

const HALF_PAGE_ROWS: isize = 10;
const VISIBLE_COLUMNS: usize = 8;
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);
const LINK_ARROW: &str = "→";
const SELECT_MARK: &str = "▾";

/// Everything the front end needs from the backend.
pub trait AppRuntime {
    fn load_dropdown_options(&mut self) -> Result<DropdownOptions>;
    fn load_records(&mut self) -> Result<RecordBatch>;
    fn create_record(&mut self, record: &Map<String, Value>) -> Result<ApiOutcome>;
    fn update_record(&mut self, id: &RecordId, patch: &Map<String, Value>) -> Result<ApiOutcome>;
    fn delete_record(&mut self, id: &RecordId) -> Result<ApiOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub long_text_width: usize,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            long_text_width: DEFAULT_LONG_TEXT_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ChartData {
    title: String,
    bars: Vec<(String, u64)>,
}

/// Holds at most one chart. Installing a chart releases the previous one
/// first, so a slot never owns two charts at once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ChartSlot {
    chart: Option<ChartData>,
    released: usize,
}

impl ChartSlot {
    fn install(&mut self, chart: ChartData) {
        self.release();
        self.chart = Some(chart);
    }

    fn release(&mut self) {
        if let Some(old) = self.chart.take() {
            debug!("released chart {:?}", old.title);
            self.released += 1;
        }
    }

    fn chart(&self) -> Option<&ChartData> {
        self.chart.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct AnalyticsUiState {
    group_index: usize,
    group: ChartSlot,
    statuses: ChartSlot,
    distribution: ChartSlot,
    feedback: ChartSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct TableUiState {
    selected_row: usize,
    selected_col: usize,
    sort: Option<SortSpec>,
}

#[derive(Debug, Clone, PartialEq)]
struct FormUiState {
    kind: FormKind,
    fields: Vec<FormField>,
    cursor: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    table_state: TableUiState,
    analytics: AnalyticsUiState,
    form: Option<FormUiState>,
    help_visible: bool,
    status_line: Option<String>,
    status_token: u64,
    long_text_width: usize,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            table_state: TableUiState::default(),
            analytics: AnalyticsUiState::default(),
            form: None,
            help_visible: false,
            status_line: None,
            status_token: 0,
            long_text_width: options.long_text_width.max(1),
        }
    }
}

impl Default for ViewData {
    fn default() -> Self {
        Self::new(UiOptions::default())
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    let events = refresh_all(state, runtime, &mut view_data);
    track_events(&mut view_data, &internal_tx, &events);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

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
                Ok(Event::Key(key)) => {
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

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
                state.dispatch(AppCommand::ClearNotification);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(NOTIFICATION_TTL);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    bump_status_token(view_data, internal_tx);
}

fn track_events(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>, events: &[AppEvent]) {
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::Notified(_)))
    {
        bump_status_token(view_data, internal_tx);
    }
}

fn dispatch(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::ViewChanged(ViewKind::Analytics)))
    {
        rebuild_charts(state, view_data);
    }
    open_form_for_mode(state, view_data);
    track_events(view_data, internal_tx, &events);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode.clone() {
        AppMode::Form(_) => {
            handle_form_key(state, runtime, view_data, internal_tx, key);
            return false;
        }
        AppMode::Detail(id) => {
            handle_detail_key(state, view_data, internal_tx, key, id);
            return false;
        }
        AppMode::ConfirmDelete(id) => {
            handle_confirm_delete_key(state, runtime, view_data, internal_tx, key, id);
            return false;
        }
        AppMode::Nav => {}
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('?'), _) => {
            view_data.help_visible = true;
        }
        (KeyCode::Tab, _) | (KeyCode::Char('f'), KeyModifiers::NONE) => {
            dispatch(state, view_data, internal_tx, AppCommand::NextView);
        }
        (KeyCode::BackTab, _) | (KeyCode::Char('b'), KeyModifiers::NONE) => {
            dispatch(state, view_data, internal_tx, AppCommand::PrevView);
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            let events = refresh_all(state, runtime, view_data);
            if !events
                .iter()
                .any(|event| matches!(event, AppEvent::Notified(_)))
            {
                emit_status(
                    view_data,
                    internal_tx,
                    format!("reloaded {} candidates", state.records.len()),
                );
            }
            track_events(view_data, internal_tx, &events);
        }
        (KeyCode::Esc, _) => {
            view_data.status_line = None;
            state.dispatch(AppCommand::ClearNotification);
        }
        _ => match state.active_view {
            ViewKind::Candidates => handle_table_key(state, runtime, view_data, internal_tx, key),
            ViewKind::Analytics => handle_analytics_key(state, view_data, internal_tx, key),
        },
    }
    false
}

fn handle_table_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => {
            move_row(state, view_data, 1);
        }
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => {
            move_row(state, view_data, -1);
        }
        (KeyCode::Char('h'), KeyModifiers::NONE) | (KeyCode::Left, _) => {
            move_col(state, view_data, -1);
        }
        (KeyCode::Char('l'), KeyModifiers::NONE) | (KeyCode::Right, _) => {
            move_col(state, view_data, 1);
        }
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            move_row(state, view_data, HALF_PAGE_ROWS);
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            move_row(state, view_data, -HALF_PAGE_ROWS);
        }
        (KeyCode::PageDown, _) => move_row(state, view_data, HALF_PAGE_ROWS * 2),
        (KeyCode::PageUp, _) => move_row(state, view_data, -HALF_PAGE_ROWS * 2),
        (KeyCode::Char('g'), KeyModifiers::NONE) | (KeyCode::Home, _) => {
            view_data.table_state.selected_row = 0;
        }
        (KeyCode::Char('G'), _) | (KeyCode::End, _) => {
            view_data.table_state.selected_row = state.records.len().saturating_sub(1);
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            let status = cycle_sort(state, view_data);
            emit_status(view_data, internal_tx, status);
        }
        (KeyCode::Char('S'), _) => {
            view_data.table_state.sort = None;
            emit_status(view_data, internal_tx, "sort cleared");
        }
        (KeyCode::Char('['), _) => cycle_status_cell(state, runtime, view_data, internal_tx, -1),
        (KeyCode::Char(']'), _) => cycle_status_cell(state, runtime, view_data, internal_tx, 1),
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            dispatch(state, view_data, internal_tx, AppCommand::OpenCreateForm);
        }
        (KeyCode::Enter, _) | (KeyCode::Char('e'), KeyModifiers::NONE) | (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let Some(id) = selected_record(state, view_data).and_then(|record| record.id.clone())
            else {
                emit_status(
                    view_data,
                    internal_tx,
                    "row has no id -- it is read-only until the backend assigns one",
                );
                return;
            };
            let command = match key.code {
                KeyCode::Char('e') => AppCommand::OpenEditForm(id),
                KeyCode::Char('d') => AppCommand::ConfirmDelete(id),
                _ => AppCommand::OpenDetail(id),
            };
            dispatch(state, view_data, internal_tx, command);
        }
        _ => {}
    }
}

fn handle_analytics_key(
    state: &AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let delta = match (key.code, key.modifiers) {
        (KeyCode::Char('j'), KeyModifiers::NONE) | (KeyCode::Down, _) => 1,
        (KeyCode::Char('k'), KeyModifiers::NONE) | (KeyCode::Up, _) => -1,
        _ => return,
    };
    let columns = group_by_columns(&state.columns(), &state.catalog);
    if columns.is_empty() {
        emit_status(view_data, internal_tx, "nothing to group by");
        return;
    }
    let len = columns.len() as isize;
    let next = (view_data.analytics.group_index as isize + delta).rem_euclid(len) as usize;
    view_data.analytics.group_index = next;
    rebuild_charts(state, view_data);
    emit_status(
        view_data,
        internal_tx,
        format!("group by {}", columns[next]),
    );
}

fn handle_detail_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    id: RecordId,
) {
    let command = match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => AppCommand::ExitToNav,
        KeyCode::Char('e') => AppCommand::OpenEditForm(id),
        KeyCode::Char('d') => AppCommand::ConfirmDelete(id),
        _ => return,
    };
    dispatch(state, view_data, internal_tx, command);
}

fn handle_confirm_delete_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
    id: RecordId,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            perform_write(state, runtime, view_data, internal_tx, WriteRequest::Delete(id));
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
            emit_status(view_data, internal_tx, "form canceled");
            return;
        }
        (KeyCode::Enter, _) | (KeyCode::Char('s'), KeyModifiers::CONTROL) => {
            submit_form(state, runtime, view_data, internal_tx);
            return;
        }
        _ => {}
    }

    let Some(form) = view_data.form.as_mut() else {
        warn!("form mode without form fields; returning to the table");
        dispatch(state, view_data, internal_tx, AppCommand::ExitToNav);
        return;
    };
    let count = form.fields.len();
    if count == 0 {
        return;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Tab, _) | (KeyCode::Down, _) => {
            form.cursor = (form.cursor + 1) % count;
        }
        (KeyCode::BackTab, _) | (KeyCode::Up, _) => {
            form.cursor = (form.cursor + count - 1) % count;
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(field) = form.fields.get_mut(form.cursor) {
                if matches!(field.widget, FormWidget::Select { .. }) {
                    field.select(None);
                } else {
                    field.set_text(String::new());
                }
            }
        }
        (code, modifiers) => {
            let Some(field) = form.fields.get_mut(form.cursor) else {
                return;
            };
            edit_form_field(field, code, modifiers);
        }
    }
}

fn edit_form_field(field: &mut FormField, code: KeyCode, modifiers: KeyModifiers) {
    if matches!(field.widget, FormWidget::Select { .. }) {
        match code {
            KeyCode::Left => field.cycle_option(-1),
            KeyCode::Right | KeyCode::Char(' ') => field.cycle_option(1),
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
            field.value.push(ch);
        }
        KeyCode::Backspace => {
            field.value.pop();
        }
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = &view_data.form else {
        return;
    };
    if let Err(error) = validate_form(&form.fields) {
        emit_status(view_data, internal_tx, format!("form invalid: {error}"));
        return;
    }

    let submission = collect_submission(&state.catalog, form_entries(&form.fields));
    let request = match &form.kind {
        FormKind::Create => WriteRequest::Create(submission),
        FormKind::Edit(id) => WriteRequest::Update {
            id: id.clone(),
            fields: submission,
            origin: WriteOrigin::Form,
        },
    };
    perform_write(state, runtime, view_data, internal_tx, request);
}

fn cycle_status_cell<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    delta: isize,
) {
    let Some(cell) = selected_cell(state, view_data) else {
        emit_status(view_data, internal_tx, "no cell selected");
        return;
    };
    let CellDisplay::Select {
        options, selected, ..
    } = &cell.display
    else {
        emit_status(
            view_data,
            internal_tx,
            format!("{} is not a status column", cell.column),
        );
        return;
    };
    if !cell.editable {
        emit_status(view_data, internal_tx, format!("{} is read-only", cell.column));
        return;
    }
    if options.is_empty() {
        emit_status(
            view_data,
            internal_tx,
            format!("no options loaded for {}", cell.column),
        );
        return;
    }

    let len = options.len() as isize;
    let next = match selected {
        Some(index) => (*index as isize + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    } as usize;
    let Some(change) = cell.select(next) else {
        return;
    };
    perform_write(
        state,
        runtime,
        view_data,
        internal_tx,
        WriteRequest::from_cell_change(change),
    );
}

fn perform_write<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    request: WriteRequest,
) {
    let result = match &request {
        WriteRequest::Create(record) => runtime.create_record(record),
        WriteRequest::Update { id, fields, .. } => runtime.update_record(id, fields),
        WriteRequest::Delete(id) => runtime.delete_record(id),
    };
    let resolution = state.apply_write(&request, result);
    let mut events = resolution.events;
    if resolution.refetch {
        events.extend(reload_records(state, runtime, view_data));
    } else {
        rebuild_charts(state, view_data);
    }
    sync_form_ui_state(state, view_data);
    track_events(view_data, internal_tx, &events);
}

fn refresh_all<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Vec<AppEvent> {
    let fetched = match runtime.load_dropdown_options() {
        Ok(options) => Some(options),
        Err(error) => {
            warn!("dropdown options unavailable, using built-in lists: {error:#}");
            None
        }
    };
    state.install_options(fetched);
    reload_records(state, runtime, view_data)
}

fn reload_records<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Vec<AppEvent> {
    let events = match runtime.load_records() {
        Ok(batch) => state.replace_records(batch),
        Err(error) => state.fetch_failed(&error),
    };
    clamp_table_cursor(state, view_data);
    rebuild_charts(state, view_data);
    sync_form_ui_state(state, view_data);
    events
}

fn open_form_for_mode(state: &AppState, view_data: &mut ViewData) {
    let AppMode::Form(kind) = &state.mode else {
        view_data.form = None;
        return;
    };
    if view_data.form.as_ref().is_some_and(|form| form.kind == *kind) {
        return;
    }
    let fields = match kind {
        FormKind::Create => build_form(&state.catalog, &state.options, None),
        FormKind::Edit(id) => match state.record(id) {
            Some(record) => {
                build_edit_form_for_role(&state.catalog, &state.options, record, state.role)
            }
            None => Vec::new(),
        },
    };
    view_data.form = Some(FormUiState {
        kind: kind.clone(),
        fields,
        cursor: 0,
    });
}

fn sync_form_ui_state(state: &AppState, view_data: &mut ViewData) {
    if !matches!(state.mode, AppMode::Form(_)) {
        view_data.form = None;
    }
}

fn rebuild_charts(state: &AppState, view_data: &mut ViewData) {
    let columns = state.columns();
    let analytics = &mut view_data.analytics;

    let group_columns = group_by_columns(&columns, &state.catalog);
    if group_columns.is_empty() {
        analytics.group_index = 0;
        analytics.group.release();
        if !state.records.is_empty() {
            warn!("no groupable column in the loaded candidates; group chart left empty");
        }
    } else {
        analytics.group_index = analytics.group_index.min(group_columns.len() - 1);
        let column = &group_columns[analytics.group_index];
        analytics.group.install(ChartData {
            title: format!("candidates by {column}"),
            bars: group_counts(&state.records, column)
                .into_iter()
                .map(|group| (group.label, group.count as u64))
                .collect(),
        });
    }

    match numeric_distribution(&state.records, &columns, &state.catalog) {
        Some(distribution) => analytics.distribution.install(ChartData {
            title: format!("{} distribution", distribution.column),
            bars: distribution
                .bins
                .into_iter()
                .map(|bin| (bin.label, bin.count as u64))
                .collect(),
        }),
        None => analytics.distribution.release(),
    }

    if state.records.is_empty() {
        analytics.statuses.release();
        analytics.feedback.release();
        return;
    }
    analytics.statuses.install(ChartData {
        title: "application status".to_owned(),
        bars: labeled_counts(application_status_counts(&state.records)),
    });
    analytics.feedback.install(ChartData {
        title: "reference feedback".to_owned(),
        bars: labeled_counts(reference_feedback_buckets(&state.records)),
    });
}

fn labeled_counts(counts: Vec<(&'static str, usize)>) -> Vec<(String, u64)> {
    counts
        .into_iter()
        .map(|(label, count)| (label.to_owned(), count as u64))
        .collect()
}

fn record_order(state: &AppState, view_data: &ViewData) -> Vec<usize> {
    sorted_row_order(&state.records, view_data.table_state.sort.as_ref())
}

fn selected_record<'a>(state: &'a AppState, view_data: &ViewData) -> Option<&'a CandidateRecord> {
    let order = record_order(state, view_data);
    let index = *order.get(view_data.table_state.selected_row)?;
    state.records.get(index)
}

fn selected_cell(state: &AppState, view_data: &ViewData) -> Option<RenderedCell> {
    let columns = state.columns();
    let column = columns.get(view_data.table_state.selected_col)?;
    let record = selected_record(state, view_data)?;
    let ctx = state.render_context(view_data.long_text_width);
    Some(render_cell(column, record, &ctx))
}

fn move_row(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let row_count = state.records.len();
    if row_count == 0 {
        view_data.table_state.selected_row = 0;
        return;
    }
    let current = view_data.table_state.selected_row;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.table_state.selected_row = next.min(row_count - 1);
}

fn move_col(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let column_count = state.columns().len();
    if column_count == 0 {
        view_data.table_state.selected_col = 0;
        return;
    }
    let current = view_data.table_state.selected_col;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    view_data.table_state.selected_col = next.min(column_count - 1);
}

fn clamp_table_cursor(state: &AppState, view_data: &mut ViewData) {
    let table = &mut view_data.table_state;
    table.selected_row = table.selected_row.min(state.records.len().saturating_sub(1));
    let columns = state.columns();
    table.selected_col = table.selected_col.min(columns.len().saturating_sub(1));
    if table
        .sort
        .as_ref()
        .is_some_and(|sort| !columns.contains(&sort.column))
    {
        table.sort = None;
    }
}

fn cycle_sort(state: &AppState, view_data: &mut ViewData) -> String {
    let columns = state.columns();
    let Some(column) = columns.get(view_data.table_state.selected_col) else {
        return "sort unavailable".to_owned();
    };
    let direction = match &view_data.table_state.sort {
        Some(sort) if sort.column == *column => sort.direction.toggled(),
        _ => SortDirection::Asc,
    };
    view_data.table_state.sort = Some(SortSpec {
        column: column.clone(),
        direction,
    });
    view_data.table_state.selected_row = 0;
    let label = match direction {
        SortDirection::Asc => "asc",
        SortDirection::Desc => "desc",
    };
    format!("sort {column} {label}")
}

/// Columns drawn for a table of `total` columns so that `selected` stays on
/// screen.
fn visible_column_range(total: usize, selected: usize, width: usize) -> Range<usize> {
    let width = width.max(1);
    if total <= width {
        return 0..total;
    }
    let selected = selected.min(total - 1);
    let start = selected.saturating_sub(width - 1).min(total - width);
    start..start + width
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let selected = ViewKind::ALL
        .iter()
        .position(|view| *view == state.active_view)
        .unwrap_or(0);
    let titles = ViewKind::ALL
        .iter()
        .map(|view| format!(" {} ", view.label()))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(titles)
        .block(Block::default().title("talentdesk").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.active_view {
        ViewKind::Candidates => render_table(frame, layout[1], state, view_data),
        ViewKind::Analytics => render_analytics(frame, layout[1], state, view_data),
    }

    let mut lines = Vec::with_capacity(2);
    if let Some(notification) = &state.notification {
        let color = match notification.level {
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Error => Color::Red,
        };
        lines.push(Line::styled(
            notification.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    }
    lines.push(Line::styled(
        status_text(state, view_data),
        Style::default().fg(Color::Yellow),
    ));
    let status = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    match &state.mode {
        AppMode::Detail(id) => {
            if let Some(record) = state.record(id) {
                let area = centered_rect(80, 80, frame.area());
                frame.render_widget(Clear, area);
                let ctx = state.render_context(view_data.long_text_width);
                let detail = Paragraph::new(render_detail_overlay_text(&detail_view(record, &ctx)))
                    .wrap(Wrap { trim: false })
                    .block(
                        Block::default()
                            .title(record_title(record))
                            .borders(Borders::ALL),
                    );
                frame.render_widget(detail, area);
            }
        }
        AppMode::Form(kind) => {
            if let Some(form) = &view_data.form {
                let area = centered_rect(76, 84, frame.area());
                frame.render_widget(Clear, area);
                let title = match kind {
                    FormKind::Create => "add candidate".to_owned(),
                    FormKind::Edit(id) => format!("edit candidate {id}"),
                };
                let visible_rows = usize::from(area.height.saturating_sub(2));
                let scroll = form.cursor.saturating_sub(visible_rows.saturating_sub(2));
                let body = Paragraph::new(render_form_overlay_text(form))
                    .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
                    .block(Block::default().title(title).borders(Borders::ALL));
                frame.render_widget(body, area);
            }
        }
        AppMode::ConfirmDelete(id) => {
            let area = centered_rect(50, 20, frame.area());
            frame.render_widget(Clear, area);
            let name = state.record(id).map(record_title).unwrap_or_else(|| id.to_string());
            let confirm = Paragraph::new(format!(
                "Are you sure you want to delete {name}?\n\ny delete | n keep"
            ))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("delete")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
            frame.render_widget(confirm, area);
        }
        AppMode::Nav => {}
    }

    if view_data.help_visible {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let columns = state.columns();
    if columns.is_empty() {
        let empty = Paragraph::new("no candidates loaded -- press r to reload").block(
            Block::default()
                .borders(Borders::ALL)
                .title(ViewKind::Candidates.label()),
        );
        frame.render_widget(empty, area);
        return;
    }

    let table_state = &view_data.table_state;
    let visible: Vec<usize> =
        visible_column_range(columns.len(), table_state.selected_col, VISIBLE_COLUMNS).collect();
    let header = Row::new(visible.iter().map(|index| {
        Cell::from(header_label(&columns[*index], table_state.sort.as_ref())).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let ctx = state.render_context(view_data.long_text_width);
    let rows = record_order(state, view_data)
        .into_iter()
        .filter_map(|index| state.records.get(index))
        .enumerate()
        .map(|(row_index, record)| {
            let selected_row = row_index == table_state.selected_row;
            let cells = visible
                .iter()
                .map(|column_index| {
                    let rendered = render_cell(&columns[*column_index], record, &ctx);
                    let mut style = cell_style(&rendered);
                    if !record.is_addressable() {
                        style = style.fg(Color::DarkGray);
                    }
                    if selected_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if selected_row && *column_index == table_state.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(cell_text(&rendered)).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        });

    let widths = vec![Constraint::Min(8); visible.len().max(1)];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state, &columns, &visible))
                .borders(Borders::ALL),
        );
    let mut scroll = TableState::default().with_selected(Some(table_state.selected_row));
    frame.render_stateful_widget(table, area, &mut scroll);
}

fn header_label(column: &str, sort: Option<&SortSpec>) -> String {
    match sort {
        Some(sort) if sort.column == column => {
            let arrow = match sort.direction {
                SortDirection::Asc => "↑",
                SortDirection::Desc => "↓",
            };
            format!("{column} {arrow}")
        }
        _ => column.to_owned(),
    }
}

fn table_title(state: &AppState, columns: &[String], visible: &[usize]) -> String {
    let mut title = format!(
        "candidates ({}) {}",
        state.records.len(),
        state.role.label()
    );
    if visible.len() < columns.len() {
        let first = visible.first().map_or(0, |index| index + 1);
        let last = visible.last().map_or(0, |index| index + 1);
        title.push_str(&format!(" | cols {first}-{last} of {}", columns.len()));
    }
    title
}

fn cell_text(cell: &RenderedCell) -> String {
    match &cell.display {
        CellDisplay::Link { label, .. } => format!("{label} {LINK_ARROW}"),
        CellDisplay::Select { current, .. } if cell.editable => {
            format!("{current} {SELECT_MARK}")
        }
        other => other.text().to_owned(),
    }
}

fn cell_style(cell: &RenderedCell) -> Style {
    match &cell.display {
        CellDisplay::Link { .. } => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::UNDERLINED),
        CellDisplay::Select { current, .. } if !current.is_empty() => {
            Style::default().fg(tone_color(BadgeTone::for_status(current)))
        }
        CellDisplay::Badge { tone, .. } => Style::default().fg(tone_color(*tone)),
        _ => Style::default(),
    }
}

fn tone_color(tone: BadgeTone) -> Color {
    match tone {
        BadgeTone::Primary => Color::LightBlue,
        BadgeTone::Success => Color::Green,
        BadgeTone::Secondary => Color::Gray,
        BadgeTone::Warning => Color::Yellow,
        BadgeTone::Danger => Color::Red,
        BadgeTone::Info => Color::Cyan,
    }
}

fn record_title(record: &CandidateRecord) -> String {
    let name = record
        .get("Name")
        .map(talentdesk_app::normalize_value)
        .unwrap_or_default();
    match (&record.id, name.is_empty()) {
        (_, false) => name,
        (Some(id), true) => format!("candidate {id}"),
        (None, true) => "unnamed candidate".to_owned(),
    }
}

fn render_detail_overlay_text(view: &DetailView) -> String {
    let mut lines = Vec::new();
    for card in &view.remarks {
        lines.push(format!("[{}]", card.title));
        if card.text.is_empty() {
            lines.push("  no remarks yet".to_owned());
        } else {
            lines.push(format!("  {}", card.text));
        }
    }
    if !view.remarks.is_empty() {
        lines.push(String::new());
    }
    for item in &view.items {
        let value = match &item.value {
            CellDisplay::Link { label, url } => format!("{label} ({url})"),
            CellDisplay::Badge { text, .. } => format!("[{text}]"),
            other => other.text().to_owned(),
        };
        lines.push(format!("{}: {value}", item.label));
    }
    lines.push(String::new());
    lines.push("e edit | d delete | esc close".to_owned());
    lines.join("\n")
}

fn render_form_overlay_text(form: &FormUiState) -> String {
    form.fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let marker = if index == form.cursor { ">" } else { " " };
            let required = if field.widget.is_required() { "*" } else { "" };
            let value = match &field.widget {
                FormWidget::Select { prompt, .. } if field.value.is_empty() => {
                    format!("‹{prompt}›")
                }
                FormWidget::Select { .. } => format!("‹{}›", field.value),
                FormWidget::Input { placeholder, .. } if field.value.is_empty() => {
                    placeholder.clone()
                }
                FormWidget::TextArea if field.value.is_empty() => String::new(),
                _ => field.value.clone(),
            };
            let cursor = if index == form.cursor
                && !matches!(field.widget, FormWidget::Select { .. })
            {
                "▏"
            } else {
                ""
            };
            format!("{marker} {}{required}: {value}{cursor}", field.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_analytics(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    if state.records.is_empty() {
        let empty = Paragraph::new("no candidates loaded -- press r to reload").block(
            Block::default()
                .borders(Borders::ALL)
                .title(ViewKind::Analytics.label()),
        );
        frame.render_widget(empty, area);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(36),
            Constraint::Percentage(32),
            Constraint::Percentage(32),
        ])
        .split(area);
    let split = |area: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area)
    };
    let top = split(rows[0]);
    let middle = split(rows[1]);
    let bottom = split(rows[2]);

    let analytics = &view_data.analytics;
    render_bar_chart(frame, top[0], &analytics.group, "group counts");
    render_bar_chart(frame, top[1], &analytics.statuses, "application status");
    render_bar_chart(frame, middle[0], &analytics.distribution, "distribution");
    render_bar_chart(frame, middle[1], &analytics.feedback, "reference feedback");

    let funnel = monthly_funnel(&state.records, &state.catalog);
    let header = Row::new(FUNNEL_HEADERS.iter().map(|label| {
        Cell::from(*label).style(Style::default().add_modifier(Modifier::BOLD))
    }));
    let funnel_rows = funnel_rows(&funnel).into_iter().map(Row::new);
    let widths = vec![Constraint::Min(6); FUNNEL_HEADERS.len()];
    let table = Table::new(funnel_rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title("monthly funnel").borders(Borders::ALL));
    frame.render_widget(table, bottom[0]);

    let summary = Paragraph::new(render_summary_text(state, &funnel))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("summary").borders(Borders::ALL));
    frame.render_widget(summary, bottom[1]);
}

fn render_bar_chart(frame: &mut ratatui::Frame<'_>, area: Rect, slot: &ChartSlot, title: &str) {
    let Some(chart) = slot.chart() else {
        let empty = Paragraph::new("no data")
            .block(Block::default().title(title.to_owned()).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };
    let bars: Vec<(&str, u64)> = chart
        .bars
        .iter()
        .map(|(label, count)| (label.as_str(), *count))
        .collect();
    let widget = BarChart::default()
        .block(
            Block::default()
                .title(chart.title.clone())
                .borders(Borders::ALL),
        )
        .data(bars.as_slice())
        .bar_width(bar_width(area.width, bars.len()))
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    frame.render_widget(widget, area);
}

fn bar_width(area_width: u16, bars: usize) -> u16 {
    let bars = u16::try_from(bars).unwrap_or(u16::MAX).max(1);
    let per_bar = area_width.saturating_sub(2) / bars;
    per_bar.saturating_sub(1).clamp(1, 14)
}

const FUNNEL_HEADERS: [&str; 7] = [
    "Month",
    "Applicants",
    "Accepted",
    "Rejected",
    "In Notice",
    "Joined",
    "Feedback",
];

fn funnel_rows(funnel: &MonthlyFunnel) -> Vec<Vec<String>> {
    let row = |label: &str, counts: &talentdesk_app::analytics::FunnelCounts| {
        vec![
            label.to_owned(),
            counts.applicants.to_string(),
            counts.accepted.to_string(),
            counts.rejected.to_string(),
            counts.in_notice.to_string(),
            counts.joined.to_string(),
            counts.feedback_given.to_string(),
        ]
    };
    let mut rows: Vec<Vec<String>> = funnel
        .rows
        .iter()
        .map(|month| row(&month.label, &month.counts))
        .collect();
    if !funnel.rows.is_empty() {
        rows.push(row("Total", &funnel.totals));
    }
    rows
}

fn render_summary_text(state: &AppState, funnel: &MonthlyFunnel) -> String {
    let mut lines: Vec<String> = key_metrics(&funnel.totals)
        .into_iter()
        .map(|metric| format!("{}: {} ({:.1}%)", metric.label, metric.value, metric.percent))
        .collect();
    for stats in summary_stats(&state.records, &state.catalog) {
        lines.push(format!(
            "{}: avg {} | min {} | max {} (n={})",
            stats.column,
            format_indian_grouping(stats.mean),
            format_indian_grouping(stats.min),
            format_indian_grouping(stats.max),
            stats.count,
        ));
    }
    lines.join("\n")
}

fn mode_label(mode: &AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "NAV",
        AppMode::Detail(_) => "DETAIL",
        AppMode::Form(_) => "FORM",
        AppMode::ConfirmDelete(_) => "DELETE",
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.help_visible {
        return "esc close help".to_owned();
    }
    let hints = match (&state.mode, state.active_view) {
        (AppMode::Nav, ViewKind::Candidates) => {
            "j/k/h/l g/G | enter open | s/S sort | [/] status | a add e edit d del | tab view | r reload | ? help | q quit"
        }
        (AppMode::Nav, ViewKind::Analytics) => {
            "j/k group by | tab view | r reload | ? help | q quit"
        }
        (AppMode::Detail(_), _) => "e edit | d delete | esc close",
        (AppMode::Form(_), _) => {
            "tab/shift+tab field | left/right choose | ctrl+u clear | enter save | esc cancel"
        }
        (AppMode::ConfirmDelete(_), _) => "y delete | n keep",
    };

    let mut parts = vec![mode_label(&state.mode), state.role.label()];
    if let Some(status) = &view_data.status_line {
        parts.push(status);
    }
    parts.push(hints);
    parts.join(" | ")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ? help | tab/shift+tab or f/b switch view | r reload | esc dismiss\n\
candidates: j/k/h/l move | g/G first/last | ctrl+d/ctrl+u half page | s sort | S clear sort\n\
candidates: enter detail | [/] change status | a add | e edit | d delete\n\
analytics: j/k change group-by column\n\
detail: e edit | d delete | esc close\n\
form: tab/shift+tab field | left/right/space choose | ctrl+u clear | enter or ctrl+s save | esc cancel\n\
delete: y confirm | n keep"
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

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, ChartData, ChartSlot, InternalEvent, ViewData, bar_width, funnel_rows,
        handle_key_event, header_label, process_internal_events, refresh_all,
        render_detail_overlay_text, render_form_overlay_text, status_text, visible_column_range,
    };
    use anyhow::anyhow;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use serde_json::{Map, Value, json};
    use std::sync::mpsc;
    use talentdesk_app::analytics::monthly_funnel;
    use talentdesk_app::{
        ApiOutcome, AppMode, AppState, DropdownOptions, FormKind, Notification, RecordBatch,
        RecordId, SortDirection, SortSpec, ViewKind, detail_view,
    };
    use talentdesk_testkit::{MemoryBackend, sample_candidates};

    #[derive(Debug)]
    struct TestRuntime {
        backend: MemoryBackend,
        list_calls: usize,
        update_calls: Vec<(RecordId, Map<String, Value>)>,
        fail_options: bool,
        fail_list: bool,
        fail_transport: bool,
    }

    impl TestRuntime {
        fn new(is_admin: bool) -> Self {
            Self {
                backend: MemoryBackend::new(sample_candidates(), is_admin),
                list_calls: 0,
                update_calls: Vec::new(),
                fail_options: false,
                fail_list: false,
                fail_transport: false,
            }
        }

        fn transport(&self) -> anyhow::Result<()> {
            if self.fail_transport {
                return Err(anyhow!("cannot reach http://127.0.0.1:5000 -- is the backend running?"));
            }
            Ok(())
        }
    }

    impl AppRuntime for TestRuntime {
        fn load_dropdown_options(&mut self) -> anyhow::Result<DropdownOptions> {
            if self.fail_options {
                return Err(anyhow!("server returned 500"));
            }
            Ok(self.backend.dropdown_options())
        }

        fn load_records(&mut self) -> anyhow::Result<RecordBatch> {
            self.list_calls += 1;
            if self.fail_list {
                return Err(anyhow!("server returned 502"));
            }
            Ok(self.backend.list())
        }

        fn create_record(&mut self, record: &Map<String, Value>) -> anyhow::Result<ApiOutcome> {
            self.transport()?;
            Ok(self.backend.create(record))
        }

        fn update_record(
            &mut self,
            id: &RecordId,
            patch: &Map<String, Value>,
        ) -> anyhow::Result<ApiOutcome> {
            self.update_calls.push((id.clone(), patch.clone()));
            self.transport()?;
            Ok(self.backend.update(id, patch))
        }

        fn delete_record(&mut self, id: &RecordId) -> anyhow::Result<ApiOutcome> {
            self.transport()?;
            Ok(self.backend.delete(id))
        }
    }

    struct Harness {
        state: AppState,
        runtime: TestRuntime,
        view_data: ViewData,
        tx: mpsc::Sender<InternalEvent>,
        rx: mpsc::Receiver<InternalEvent>,
    }

    impl Harness {
        fn new(runtime: TestRuntime) -> Self {
            let (tx, rx) = mpsc::channel();
            let mut harness = Self {
                state: AppState::default(),
                runtime,
                view_data: ViewData::default(),
                tx,
                rx,
            };
            refresh_all(
                &mut harness.state,
                &mut harness.runtime,
                &mut harness.view_data,
            );
            harness
        }

        fn admin() -> Self {
            Self::new(TestRuntime::new(true))
        }

        fn press(&mut self, code: KeyCode) -> bool {
            self.press_with(code, KeyModifiers::NONE)
        }

        fn press_with(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
            let quit = handle_key_event(
                &mut self.state,
                &mut self.runtime,
                &mut self.view_data,
                &self.tx,
                KeyEvent::new(code, modifiers),
            );
            process_internal_events(&mut self.state, &mut self.view_data, &self.rx);
            quit
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                self.press(KeyCode::Char(ch));
            }
        }

        fn select_row(&mut self, name: &str) {
            let index = self
                .state
                .records
                .iter()
                .position(|record| record.get("Name") == Some(&json!(name)))
                .expect("row present");
            self.view_data.table_state.selected_row = index;
        }

        fn select_column(&mut self, column: &str) {
            let index = self
                .state
                .columns()
                .iter()
                .position(|name| name == column)
                .expect("column present");
            self.view_data.table_state.selected_col = index;
        }

        fn value_of(&self, id: i64, field: &str) -> Option<Value> {
            self.state
                .record(&RecordId::from(id))
                .and_then(|record| record.get(field))
                .cloned()
        }
    }

    #[test]
    fn startup_loads_options_records_and_role() {
        let harness = Harness::admin();
        assert_eq!(harness.state.records.len(), 3);
        assert!(harness.state.role.is_admin);
        assert!(harness.state.options.has_choices("Notice Period"));
        assert_eq!(harness.runtime.list_calls, 1);
        assert!(harness.view_data.analytics.statuses.chart().is_some());
    }

    #[test]
    fn options_failure_falls_back_to_hardcoded_lists() {
        let mut runtime = TestRuntime::new(true);
        runtime.fail_options = true;
        let harness = Harness::new(runtime);
        assert!(!harness.state.options.has_choices("Notice Period"));
        assert_eq!(harness.state.options.get("Interview Status").len(), 13);
        assert_eq!(harness.state.records.len(), 3);
    }

    #[test]
    fn list_failure_shows_load_notification() {
        let mut runtime = TestRuntime::new(true);
        runtime.fail_list = true;
        let harness = Harness::new(runtime);
        assert!(harness.state.records.is_empty());
        assert_eq!(
            harness.state.notification,
            Some(Notification::error(
                "Failed to load data. Please try again later."
            ))
        );
    }

    #[test]
    fn status_change_patches_in_place_without_refetch() {
        let mut harness = Harness::admin();
        harness.select_row("Jane Smith");
        harness.select_column("Interview Status");

        harness.press(KeyCode::Char(']'));

        assert_eq!(harness.runtime.list_calls, 1);
        assert_eq!(
            harness.runtime.update_calls,
            vec![(
                RecordId::from(2),
                json!({"Interview Status": "Applied"})
                    .as_object()
                    .cloned()
                    .expect("object patch"),
            )]
        );
        assert_eq!(harness.value_of(2, "Interview Status"), Some(json!("Applied")));
        assert_eq!(
            harness.state.notification,
            Some(Notification::success("Status updated successfully!"))
        );
    }

    #[test]
    fn rejected_status_change_refetches_and_keeps_server_value() {
        let mut harness = Harness::admin();
        harness.runtime.backend.reject_writes("No record found at index 2");
        harness.select_row("Jane Smith");
        harness.select_column("Interview Status");

        harness.press(KeyCode::Char(']'));

        assert_eq!(harness.runtime.update_calls.len(), 1);
        assert_eq!(harness.runtime.list_calls, 2);
        assert_eq!(harness.value_of(2, "Interview Status"), Some(json!("Selected")));
        assert_eq!(
            harness.state.notification,
            Some(Notification::error("No record found at index 2"))
        );
    }

    #[test]
    fn transport_failure_on_update_refetches() {
        let mut harness = Harness::admin();
        harness.runtime.fail_transport = true;
        harness.select_row("John Doe");
        harness.select_column("Application Status");

        harness.press(KeyCode::Char('['));

        assert_eq!(harness.runtime.list_calls, 2);
        assert_eq!(harness.value_of(1, "Application Status"), Some(json!("In Process")));
        let note = harness.state.notification.clone().expect("notification");
        assert!(note.is_error());
        assert!(note.message.starts_with("Error updating record: cannot reach"), "{}", note.message);
    }

    #[test]
    fn viewers_can_edit_stage_remarks_only() {
        let mut harness = Harness::new(TestRuntime::new(false));
        assert_eq!(
            harness.state.columns(),
            vec![
                "Date",
                "Name",
                "Email ID",
                "Initial Screening",
                "Round 1 Remarks",
                "Round 2 Remarks",
            ]
        );

        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.state.notification.as_ref().is_some_and(Notification::is_error));

        harness.select_row("John Doe");
        harness.press(KeyCode::Char('e'));
        let form = harness.view_data.form.as_ref().expect("edit form open");
        let labels: Vec<&str> = form.fields.iter().map(|field| field.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Initial Screening", "Round 1 Remarks", "Round 2 Remarks"]
        );
    }

    #[test]
    fn create_form_submits_and_refetches() {
        let mut harness = Harness::admin();
        harness.press(KeyCode::Char('a'));
        assert_eq!(harness.state.mode, AppMode::Form(FormKind::Create));

        harness.type_text("Zed Kumar");
        harness.press(KeyCode::Tab);
        harness.type_text("zed@example.com");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert!(harness.view_data.form.is_none());
        assert_eq!(harness.state.records.len(), 4);
        assert_eq!(harness.value_of(4, "Name"), Some(json!("Zed Kumar")));
        assert_eq!(harness.value_of(4, "Email ID"), Some(json!("zed@example.com")));
        assert_eq!(
            harness.state.notification,
            Some(Notification::success("Record added successfully!"))
        );
    }

    #[test]
    fn invalid_form_stays_open_with_reason() {
        let mut harness = Harness::admin();
        harness.press(KeyCode::Char('a'));
        harness.type_text("No Email");
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Form(FormKind::Create));
        assert_eq!(harness.runtime.backend.records().len(), 3);
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("form invalid: email id is required -- enter a value and retry")
        );
    }

    #[test]
    fn edit_form_round_trip_keeps_types() {
        let mut harness = Harness::admin();
        harness.select_row("Jane Smith");
        harness.press(KeyCode::Char('e'));
        assert_eq!(
            harness.state.mode,
            AppMode::Form(FormKind::Edit(RecordId::from(2)))
        );
        harness.press(KeyCode::Enter);

        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.value_of(2, "Offered CTC"), Some(json!(1400000)));
        assert_eq!(harness.value_of(2, "Month Count"), Some(json!(2)));
        assert_eq!(
            harness.state.notification,
            Some(Notification::success("Record updated successfully!"))
        );
    }

    #[test]
    fn select_fields_cycle_with_arrows() {
        let mut harness = Harness::admin();
        harness.press(KeyCode::Char('a'));
        let position = harness
            .view_data
            .form
            .as_ref()
            .and_then(|form| form.fields.iter().position(|field| field.label == "Notice Period"))
            .expect("notice period field");
        for _ in 0..position {
            harness.press(KeyCode::Tab);
        }
        harness.press(KeyCode::Right);
        harness.press(KeyCode::Right);
        let form = harness.view_data.form.as_ref().expect("form open");
        assert_eq!(form.fields[position].value, "15 days");
        harness.press(KeyCode::Left);
        harness.press(KeyCode::Left);
        let form = harness.view_data.form.as_ref().expect("form open");
        assert_eq!(form.fields[position].value, "");
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut harness = Harness::admin();
        harness.select_row("John Doe");
        harness.press(KeyCode::Char('d'));
        assert_eq!(
            harness.state.mode,
            AppMode::ConfirmDelete(RecordId::from(1))
        );
        harness.press(KeyCode::Char('n'));
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.state.records.len(), 3);

        harness.press(KeyCode::Char('d'));
        harness.press(KeyCode::Char('y'));
        assert_eq!(harness.state.mode, AppMode::Nav);
        assert_eq!(harness.state.records.len(), 2);
        assert!(harness.state.record(&RecordId::from(1)).is_none());
        assert_eq!(
            harness.state.notification,
            Some(Notification::success("Record deleted successfully!"))
        );
    }

    #[test]
    fn enter_opens_detail_and_esc_closes_it() {
        let mut harness = Harness::admin();
        harness.select_row("Jane Smith");
        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Detail(RecordId::from(2)));
        harness.press(KeyCode::Esc);
        assert_eq!(harness.state.mode, AppMode::Nav);
    }

    #[test]
    fn rows_without_ids_are_read_only() {
        let mut harness = Harness::admin();
        let mut fields = Map::new();
        fields.insert("Date".to_owned(), json!("2025-01-01 00:00:00"));
        fields.insert("Name".to_owned(), json!("Legacy"));
        fields.insert("Interview Status".to_owned(), json!("Applied"));
        harness
            .state
            .records
            .push(talentdesk_app::CandidateRecord::new(None, fields));
        harness.select_row("Legacy");
        harness.select_column("Interview Status");

        harness.press(KeyCode::Char(']'));
        assert!(harness.runtime.update_calls.is_empty());
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("Interview Status is read-only")
        );

        harness.press(KeyCode::Enter);
        assert_eq!(harness.state.mode, AppMode::Nav);
    }

    #[test]
    fn sort_toggles_direction_on_same_column() {
        let mut harness = Harness::admin();
        harness.select_column("Current CTC per Annum");
        harness.press(KeyCode::Char('s'));
        assert_eq!(
            harness.view_data.table_state.sort,
            Some(SortSpec {
                column: "Current CTC per Annum".to_owned(),
                direction: SortDirection::Asc,
            })
        );
        assert_eq!(
            super::selected_record(&harness.state, &harness.view_data)
                .and_then(|record| record.get("Name")),
            Some(&json!(""))
        );

        harness.press(KeyCode::Char('s'));
        assert_eq!(
            harness.view_data.status_line.as_deref(),
            Some("sort Current CTC per Annum desc")
        );
        assert_eq!(
            super::selected_record(&harness.state, &harness.view_data)
                .and_then(|record| record.get("Name")),
            Some(&json!("Jane Smith"))
        );

        harness.press(KeyCode::Char('S'));
        assert_eq!(harness.view_data.table_state.sort, None);
    }

    #[test]
    fn header_marks_sorted_column() {
        let sort = SortSpec {
            column: "Name".to_owned(),
            direction: SortDirection::Desc,
        };
        assert_eq!(header_label("Name", Some(&sort)), "Name ↓");
        assert_eq!(header_label("Date", Some(&sort)), "Date");
    }

    #[test]
    fn chart_slot_releases_before_install() {
        let mut slot = ChartSlot::default();
        slot.install(ChartData {
            title: "first".to_owned(),
            bars: vec![("a".to_owned(), 1)],
        });
        assert_eq!(slot.released, 0);
        slot.install(ChartData {
            title: "second".to_owned(),
            bars: Vec::new(),
        });
        assert_eq!(slot.released, 1);
        assert_eq!(slot.chart().map(|chart| chart.title.as_str()), Some("second"));
        slot.release();
        slot.release();
        assert_eq!(slot.released, 2);
        assert!(slot.chart().is_none());
    }

    #[test]
    fn analytics_view_cycles_group_column() {
        let mut harness = Harness::admin();
        harness.press(KeyCode::Tab);
        assert_eq!(harness.state.active_view, ViewKind::Analytics);
        let first_title = harness
            .view_data
            .analytics
            .group
            .chart()
            .map(|chart| chart.title.clone());
        assert_eq!(first_title.as_deref(), Some("candidates by Name"));

        let released = harness.view_data.analytics.group.released;
        harness.press(KeyCode::Char('j'));
        assert_eq!(
            harness
                .view_data
                .analytics
                .group
                .chart()
                .map(|chart| chart.title.as_str()),
            Some("candidates by Interested Position")
        );
        assert_eq!(harness.view_data.analytics.group.released, released + 1);

        harness.press(KeyCode::Char('k'));
        harness.press(KeyCode::Char('k'));
        let title = harness
            .view_data
            .analytics
            .group
            .chart()
            .map(|chart| chart.title.clone())
            .expect("group chart");
        assert_eq!(title, "candidates by Reference");
    }

    #[test]
    fn distribution_uses_first_amount_column() {
        let harness = Harness::admin();
        let chart = harness
            .view_data
            .analytics
            .distribution
            .chart()
            .expect("distribution chart");
        assert_eq!(chart.title, "Current CTC per Annum distribution");
        assert_eq!(chart.bars.iter().map(|(_, count)| count).sum::<u64>(), 3);
    }

    #[test]
    fn funnel_rows_end_with_totals() {
        let harness = Harness::admin();
        let funnel = monthly_funnel(&harness.state.records, &harness.state.catalog);
        let rows = funnel_rows(&funnel);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], "Jan 2025");
        assert_eq!(rows[1][0], "Feb 2025");
        assert_eq!(rows[2], vec!["Total", "3", "0", "1", "0", "0", "0"]);
    }

    #[test]
    fn visible_columns_follow_selection() {
        assert_eq!(visible_column_range(5, 4, 8), 0..5);
        assert_eq!(visible_column_range(31, 0, 8), 0..8);
        assert_eq!(visible_column_range(31, 10, 8), 3..11);
        assert_eq!(visible_column_range(31, 40, 8), 23..31);
    }

    #[test]
    fn bar_width_stays_positive() {
        assert_eq!(bar_width(0, 0), 1);
        assert_eq!(bar_width(42, 4), 9);
        assert_eq!(bar_width(200, 2), 14);
    }

    #[test]
    fn detail_overlay_lists_cards_then_fields() {
        let harness = Harness::admin();
        let record = harness.state.record(&RecordId::from(2)).expect("jane");
        let ctx = harness.state.render_context(24);
        let text = render_detail_overlay_text(&detail_view(record, &ctx));

        assert!(text.starts_with("[Initial Screening]\n  no remarks yet\n[Round 1]"), "{text}");
        assert!(text.contains("Interview Status: [Selected]"), "{text}");
        assert!(text.contains("Offered CTC: 14,00,000"), "{text}");
        assert!(!text.contains("Resume:"), "{text}");
    }

    #[test]
    fn form_overlay_marks_cursor_and_required_fields() {
        let mut harness = Harness::admin();
        harness.press(KeyCode::Char('a'));
        harness.press(KeyCode::Tab);
        let form = harness.view_data.form.as_ref().expect("form open");
        let text = render_form_overlay_text(form);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "  Name: Enter Name...");
        assert_eq!(lines[1], "> Email ID*: Enter Email ID...▏");
        assert!(
            lines
                .iter()
                .any(|line| *line == "  Notice Period: ‹Select Notice Period...›")
        );
    }

    #[test]
    fn status_text_reflects_mode_and_role() {
        let mut harness = Harness::new(TestRuntime::new(false));
        let text = status_text(&harness.state, &harness.view_data);
        assert!(text.starts_with("NAV | viewer | j/k/h/l"), "{text}");

        harness.select_row("John Doe");
        harness.press(KeyCode::Enter);
        let text = status_text(&harness.state, &harness.view_data);
        assert_eq!(text, "DETAIL | viewer | e edit | d delete | esc close");
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut harness = Harness::admin();
        assert!(harness.press_with(KeyCode::Char('q'), KeyModifiers::CONTROL));
        assert!(harness.press(KeyCode::Char('q')));

        harness.press(KeyCode::Char('a'));
        assert!(!harness.press(KeyCode::Char('q')));
    }

    #[test]
    fn stale_status_tokens_are_ignored() {
        let mut harness = Harness::admin();
        harness.press(KeyCode::Char('s'));
        assert!(harness.view_data.status_line.is_some());

        let stale = harness.view_data.status_token.saturating_sub(1);
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: stale })
            .expect("send stale token");
        process_internal_events(&mut harness.state, &mut harness.view_data, &harness.rx);
        assert!(harness.view_data.status_line.is_some());

        let current = harness.view_data.status_token;
        harness
            .tx
            .send(InternalEvent::ClearStatus { token: current })
            .expect("send current token");
        process_internal_events(&mut harness.state, &mut harness.view_data, &harness.rx);
        assert!(harness.view_data.status_line.is_none());
    }
}
