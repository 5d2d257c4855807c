// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::cells::{CellChange, RenderContext};
use crate::projection::project_columns;
use crate::{
    ApiOutcome, AppMode, CandidateRecord, DropdownOptions, FieldCatalog, FormKind, Notification,
    RecordBatch, RecordId, RoleContext, ViewKind,
};

/// The single owner of client-side state: the cached records, the caller's
/// role, the merged dropdown options and the transient notification.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    pub active_view: ViewKind,
    pub role: RoleContext,
    pub records: Vec<CandidateRecord>,
    pub options: DropdownOptions,
    pub notification: Option<Notification>,
    pub catalog: FieldCatalog,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(FieldCatalog::canonical())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    NextView,
    PrevView,
    ShowView(ViewKind),
    OpenDetail(RecordId),
    OpenCreateForm,
    OpenEditForm(RecordId),
    ConfirmDelete(RecordId),
    ExitToNav,
    ClearNotification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    ViewChanged(ViewKind),
    RecordsReplaced { count: usize, role: RoleContext },
    RecordPatched(RecordId),
    Notified(Notification),
    NotificationCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    Cell,
    Form,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Create(Map<String, Value>),
    Update {
        id: RecordId,
        fields: Map<String, Value>,
        origin: WriteOrigin,
    },
    Delete(RecordId),
}

impl WriteRequest {
    pub fn from_cell_change(change: CellChange) -> Self {
        let (id, fields) = change.into_patch();
        Self::Update {
            id,
            fields,
            origin: WriteOrigin::Cell,
        }
    }

    fn messages(&self) -> WriteMessages {
        match self {
            Self::Create(_) => WriteMessages {
                success: "Record added successfully!",
                failure: "Failed to add record.",
                transport: "Error adding record",
            },
            Self::Update {
                origin: WriteOrigin::Cell,
                ..
            } => WriteMessages {
                success: "Status updated successfully!",
                failure: "Failed to update status.",
                transport: "Error updating record",
            },
            Self::Update {
                origin: WriteOrigin::Form,
                ..
            } => WriteMessages {
                success: "Record updated successfully!",
                failure: "Failed to update record.",
                transport: "Error updating record",
            },
            Self::Delete(_) => WriteMessages {
                success: "Record deleted successfully!",
                failure: "Failed to delete record.",
                transport: "Error deleting record",
            },
        }
    }
}

struct WriteMessages {
    success: &'static str,
    failure: &'static str,
    transport: &'static str,
}

/// What the caller must do after a write settles.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteResolution {
    pub events: Vec<AppEvent>,
    pub refetch: bool,
}

impl AppState {
    pub fn new(catalog: FieldCatalog) -> Self {
        Self {
            mode: AppMode::Nav,
            active_view: ViewKind::Candidates,
            role: RoleContext::default(),
            records: Vec::new(),
            options: catalog.hardcoded_options(),
            notification: None,
            catalog,
        }
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::NextView => self.rotate_view(1),
            AppCommand::PrevView => self.rotate_view(-1),
            AppCommand::ShowView(view) => {
                self.active_view = view;
                vec![AppEvent::ViewChanged(view)]
            }
            AppCommand::OpenDetail(id) => self.enter_record_mode(id, AppMode::Detail),
            AppCommand::OpenCreateForm => {
                if !self.role.is_admin {
                    return vec![self.notify(Notification::error(
                        "only admins can add candidates",
                    ))];
                }
                self.set_mode(AppMode::Form(FormKind::Create))
            }
            AppCommand::OpenEditForm(id) => {
                self.enter_record_mode(id, |id| AppMode::Form(FormKind::Edit(id)))
            }
            AppCommand::ConfirmDelete(id) => {
                if !self.role.is_admin {
                    return vec![self.notify(Notification::error(
                        "only admins can delete candidates",
                    ))];
                }
                self.enter_record_mode(id, AppMode::ConfirmDelete)
            }
            AppCommand::ExitToNav => self.set_mode(AppMode::Nav),
            AppCommand::ClearNotification => {
                self.notification = None;
                vec![AppEvent::NotificationCleared]
            }
        }
    }

    /// Installs the dropdown set; `None` means the server fetch failed and
    /// only the hardcoded options apply.
    pub fn install_options(&mut self, fetched: Option<DropdownOptions>) {
        self.options = match fetched {
            Some(server) => DropdownOptions::merged(server, &self.catalog),
            None => self.catalog.hardcoded_options(),
        };
        debug!("installed dropdown options for {} fields", self.options.len());
    }

    /// Replaces the cache wholesale; the batch's role supersedes the old one.
    pub fn replace_records(&mut self, batch: RecordBatch) -> Vec<AppEvent> {
        self.role = batch.role();
        self.records = batch.data;
        let mut events = vec![AppEvent::RecordsReplaced {
            count: self.records.len(),
            role: self.role,
        }];

        let focused = match &self.mode {
            AppMode::Detail(id)
            | AppMode::ConfirmDelete(id)
            | AppMode::Form(FormKind::Edit(id)) => Some(id.clone()),
            AppMode::Nav | AppMode::Form(FormKind::Create) => None,
        };
        if let Some(id) = focused
            && self.record(&id).is_none()
        {
            events.extend(self.set_mode(AppMode::Nav));
        }
        events
    }

    pub fn fetch_failed(&mut self, error: &anyhow::Error) -> Vec<AppEvent> {
        warn!("fetching candidates failed: {error:#}");
        vec![self.notify(Notification::error(
            "Failed to load data. Please try again later.",
        ))]
    }

    pub fn record(&self, id: &RecordId) -> Option<&CandidateRecord> {
        self.records
            .iter()
            .find(|record| record.id.as_ref() == Some(id))
    }

    pub fn columns(&self) -> Vec<String> {
        project_columns(&self.records, self.role, &self.catalog)
    }

    pub fn render_context(&self, long_text_width: usize) -> RenderContext<'_> {
        RenderContext::new(&self.catalog, &self.options, self.role)
            .with_long_text_width(long_text_width)
    }

    /// Settles a write. Only a successful single-cell update is applied
    /// locally; everything else, failures included, asks for a refetch so
    /// no optimistic value outlives a rejected write.
    pub fn apply_write(
        &mut self,
        request: &WriteRequest,
        result: Result<ApiOutcome>,
    ) -> WriteResolution {
        let messages = request.messages();
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("{}: {error:#}", messages.transport);
                return WriteResolution {
                    events: vec![self.notify(Notification::error(format!(
                        "{}: {error:#}",
                        messages.transport
                    )))],
                    refetch: true,
                };
            }
        };

        if !outcome.is_success() {
            let message = outcome.message_or(messages.failure).to_owned();
            warn!("backend rejected write: {message}");
            return WriteResolution {
                events: vec![self.notify(Notification::error(message))],
                refetch: true,
            };
        }

        let mut events = Vec::new();
        let mut refetch = true;
        if let WriteRequest::Update {
            id,
            fields,
            origin: WriteOrigin::Cell,
        } = request
            && let Some(record) = self
                .records
                .iter_mut()
                .find(|record| record.id.as_ref() == Some(id))
        {
            record.apply_patch(fields);
            events.push(AppEvent::RecordPatched(id.clone()));
            refetch = false;
        }
        if refetch {
            events.extend(self.set_mode(AppMode::Nav));
        }
        events.push(self.notify(Notification::success(messages.success)));
        WriteResolution { events, refetch }
    }

    fn enter_record_mode(&mut self, id: RecordId, mode: impl FnOnce(RecordId) -> AppMode) -> Vec<AppEvent> {
        if self.record(&id).is_none() {
            return vec![self.notify(Notification::error(format!(
                "candidate {id} is no longer loaded -- refresh and retry"
            )))];
        }
        self.set_mode(mode(id))
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![AppEvent::ModeChanged(self.mode.clone())]
    }

    fn rotate_view(&mut self, delta: isize) -> Vec<AppEvent> {
        let views = ViewKind::ALL;
        let current = views
            .iter()
            .position(|view| *view == self.active_view)
            .unwrap_or(0) as isize;
        let len = views.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active_view = views[next];
        vec![AppEvent::ViewChanged(self.active_view)]
    }

    fn notify(&mut self, notification: Notification) -> AppEvent {
        self.notification = Some(notification.clone());
        AppEvent::Notified(notification)
    }
}
