// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Map, Value};
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

use crate::{CandidateRecord, CellKind, DropdownOptions, FieldCatalog, RecordId, RoleContext};

pub const DEFAULT_LONG_TEXT_WIDTH: usize = 24;

/// Everything the renderer needs besides the record itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub catalog: &'a FieldCatalog,
    pub options: &'a DropdownOptions,
    pub role: RoleContext,
    pub long_text_width: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(catalog: &'a FieldCatalog, options: &'a DropdownOptions, role: RoleContext) -> Self {
        Self {
            catalog,
            options,
            role,
            long_text_width: DEFAULT_LONG_TEXT_WIDTH,
        }
    }

    pub fn with_long_text_width(mut self, width: usize) -> Self {
        self.long_text_width = width.max(1);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Primary,
    Success,
    Secondary,
    Warning,
    Danger,
    Info,
}

impl BadgeTone {
    pub fn for_status(status: &str) -> Self {
        match status {
            "Active" => Self::Success,
            "Inactive" => Self::Secondary,
            "Pending" => Self::Warning,
            "Rejected" => Self::Danger,
            "Selected" => Self::Info,
            _ => Self::Primary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellDisplay {
    Text(String),
    Link {
        label: String,
        url: String,
    },
    Badge {
        text: String,
        tone: BadgeTone,
    },
    Select {
        options: Vec<String>,
        selected: Option<usize>,
        current: String,
    },
    Truncated {
        text: String,
        full: String,
    },
}

impl CellDisplay {
    /// The text a terminal cell shows.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Link { label, .. } => label,
            Self::Badge { text, .. } => text,
            Self::Select { current, .. } => current,
            Self::Truncated { text, .. } => text,
        }
    }

    pub fn tooltip(&self) -> Option<&str> {
        match self {
            Self::Truncated { full, text } if full != text => Some(full),
            Self::Link { url, .. } => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub column: String,
    pub record_id: Option<RecordId>,
    pub kind: CellKind,
    pub display: CellDisplay,
    pub editable: bool,
}

impl RenderedCell {
    /// Picks an option of an editable status cell. Re-selecting the current
    /// value, or selecting on a read-only cell, yields nothing.
    pub fn select(&self, option_index: usize) -> Option<CellChange> {
        if !self.editable {
            return None;
        }
        let CellDisplay::Select {
            options, current, ..
        } = &self.display
        else {
            return None;
        };
        let value = options.get(option_index)?;
        if value == current {
            return None;
        }
        Some(CellChange {
            record_id: self.record_id.clone()?,
            field: self.column.clone(),
            value: value.clone(),
        })
    }
}

/// A single-field edit produced by the table, issued as a partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub record_id: RecordId,
    pub field: String,
    pub value: String,
}

impl CellChange {
    pub fn into_patch(self) -> (RecordId, Map<String, Value>) {
        let mut patch = Map::new();
        patch.insert(self.field, Value::String(self.value));
        (self.record_id, patch)
    }
}

pub fn render_cell(column: &str, record: &CandidateRecord, ctx: &RenderContext<'_>) -> RenderedCell {
    let kind = ctx
        .catalog
        .get(column)
        .map(|field| field.cell_kind)
        .unwrap_or(CellKind::Plain);
    let text = format_field_value(ctx.catalog, column, record.get(column));

    let (display, editable) = match kind {
        CellKind::Link { label } if text.starts_with("http") => (
            CellDisplay::Link {
                label: label.to_owned(),
                url: text,
            },
            false,
        ),
        CellKind::Status => {
            let options = ctx.options.get(column).to_vec();
            let selected = options.iter().position(|option| *option == text);
            let editable = record.is_addressable() && can_edit(column, ctx);
            (
                CellDisplay::Select {
                    options,
                    selected,
                    current: text,
                },
                editable,
            )
        }
        CellKind::LongText => {
            let full = long_text_value(column, record, ctx.catalog);
            (
                CellDisplay::Truncated {
                    text: truncate_label(&full, ctx.long_text_width),
                    full,
                },
                false,
            )
        }
        CellKind::Timestamp => (CellDisplay::Text(date_part(&text)), false),
        CellKind::Link { .. } | CellKind::Currency | CellKind::Plain => {
            (CellDisplay::Text(text), false)
        }
    };

    RenderedCell {
        column: column.to_owned(),
        record_id: record.id.clone(),
        kind,
        display,
        editable,
    }
}

/// Read-only rendering used by the detail view: status fields become badges.
pub fn render_detail_value(column: &str, record: &CandidateRecord, ctx: &RenderContext<'_>) -> CellDisplay {
    let cell = render_cell(column, record, ctx);
    match cell.display {
        CellDisplay::Select { current, .. } => CellDisplay::Badge {
            tone: BadgeTone::for_status(&current),
            text: current,
        },
        CellDisplay::Truncated { full, .. } => CellDisplay::Text(full),
        other => other,
    }
}

fn can_edit(column: &str, ctx: &RenderContext<'_>) -> bool {
    ctx.role.is_admin
        || ctx
            .catalog
            .get(column)
            .is_some_and(|field| field.editable_by_non_admin)
}

fn long_text_value(column: &str, record: &CandidateRecord, catalog: &FieldCatalog) -> String {
    let primary = format_field_value(catalog, column, record.get(column));
    if !primary.is_empty() {
        return primary;
    }
    catalog
        .get(column)
        .and_then(|field| field.legacy_name)
        .map(|legacy| format_field_value(catalog, legacy, record.get(legacy)))
        .unwrap_or_default()
}

/// Normalizes a raw value for display. Never yields `null` or `undefined`.
pub fn format_field_value(catalog: &FieldCatalog, field: &str, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    let currency = catalog
        .get(field)
        .is_some_and(|descriptor| descriptor.cell_kind == CellKind::Currency);
    if currency {
        let amount = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(amount) = amount {
            return if amount.is_finite() {
                format_indian_grouping(amount)
            } else {
                String::new()
            };
        }
    }
    normalize_value(value)
}

/// Catalog-independent normalization shared by display, sorting and analytics.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => {
            let trimmed = text.trim();
            if is_null_marker(trimmed) {
                String::new()
            } else {
                trimmed.to_owned()
            }
        }
        Value::Number(number) => match number.as_f64() {
            Some(float) if !float.is_finite() => String::new(),
            Some(float) if float.fract() == 0.0 && float.abs() < 1e15 => {
                format!("{}", float as i64)
            }
            _ => number.to_string(),
        },
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => items
            .iter()
            .map(normalize_value)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

fn is_null_marker(text: &str) -> bool {
    text.is_empty()
        || ["nil", "null", "nan"]
            .iter()
            .any(|marker| text.eq_ignore_ascii_case(marker))
}

/// Formats with the `en-IN` convention: the last three integer digits, then
/// groups of two, and at most three fraction digits.
pub fn format_indian_grouping(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let scaled = (amount.abs() * 1000.0).round();
    let whole = (scaled / 1000.0).trunc();
    let fraction = (scaled - whole * 1000.0) as u64;
    let digits = format!("{whole:.0}");

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups = Vec::new();
        let mut rest = head;
        while rest.len() > 2 {
            let (front, back) = rest.split_at(rest.len() - 2);
            groups.push(back);
            rest = front;
        }
        groups.push(rest);
        groups.reverse();
        format!("{},{tail}", groups.join(","))
    };

    if fraction == 0 {
        return format!("{sign}{grouped}");
    }
    let fraction = format!("{fraction:03}");
    format!("{sign}{grouped}.{}", fraction.trim_end_matches('0'))
}

/// Date part of `YYYY-MM-DD HH:MM:SS`; unparseable text is returned as is.
pub fn date_part(text: &str) -> String {
    parse_record_date(text)
        .map(|date| date.to_string())
        .unwrap_or_else(|| text.to_owned())
}

pub fn parse_record_date(text: &str) -> Option<Date> {
    let trimmed = text.trim();
    PrimitiveDateTime::parse(
        trimmed,
        &format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    )
    .map(PrimitiveDateTime::date)
    .or_else(|_| Date::parse(trimmed, &format_description!("[year]-[month]-[day]")))
    .ok()
}

pub fn truncate_label(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}…")
    } else {
        truncated
    }
}
