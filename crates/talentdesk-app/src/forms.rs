// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde_json::{Map, Value};

use crate::cells::normalize_value;
use crate::{CandidateRecord, DropdownOptions, FieldCatalog, FieldDescriptor, InputKind, RoleContext};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormWidget {
    Input {
        kind: InputKind,
        required: bool,
        placeholder: String,
    },
    TextArea,
    Select {
        options: Vec<String>,
        prompt: String,
    },
}

impl FormWidget {
    pub fn input_kind(&self) -> InputKind {
        match self {
            Self::Input { kind, .. } => *kind,
            Self::TextArea => InputKind::TextArea,
            Self::Select { .. } => InputKind::Select,
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Input { required: true, .. })
    }
}

/// One label/widget pair. `value` is the live edit buffer; for selects it is
/// the chosen option or empty when nothing is selected.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: String,
    pub widget_id: String,
    pub widget: FormWidget,
    pub value: String,
    original: Option<Value>,
    initial_text: String,
}

impl FormField {
    pub fn is_modified(&self) -> bool {
        self.value != self.initial_text
    }

    pub fn selected_index(&self) -> Option<usize> {
        match &self.widget {
            FormWidget::Select { options, .. } => {
                options.iter().position(|option| *option == self.value)
            }
            _ => None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.value = text.into();
    }

    /// Selects `index` in a select widget; `None` clears the selection.
    pub fn select(&mut self, index: Option<usize>) {
        if let FormWidget::Select { options, .. } = &self.widget {
            self.value = index
                .and_then(|index| options.get(index))
                .cloned()
                .unwrap_or_default();
        }
    }

    /// Steps through `[unselected, option 0, option 1, ...]`, wrapping.
    pub fn cycle_option(&mut self, delta: isize) {
        let FormWidget::Select { options, .. } = &self.widget else {
            return;
        };
        let slots = options.len() as isize + 1;
        let current = self.selected_index().map(|index| index as isize + 1).unwrap_or(0);
        let next = (current + delta).rem_euclid(slots);
        self.select(if next == 0 { None } else { Some(next as usize - 1) });
    }

    /// Unmodified widgets submit their original value so types survive an
    /// edit round trip.
    pub fn submitted_value(&self) -> Value {
        match (&self.original, self.is_modified()) {
            (Some(original), false) => original.clone(),
            _ => Value::String(self.value.clone()),
        }
    }
}

pub fn build_form(
    catalog: &FieldCatalog,
    options: &DropdownOptions,
    existing: Option<&CandidateRecord>,
) -> Vec<FormField> {
    catalog
        .fields()
        .iter()
        .filter(|field| field.name != catalog.primary())
        .map(|field| build_field(field, options, existing))
        .collect()
}

/// Viewers only get the fields they may edit; admins get the full form.
pub fn build_edit_form_for_role(
    catalog: &FieldCatalog,
    options: &DropdownOptions,
    record: &CandidateRecord,
    role: RoleContext,
) -> Vec<FormField> {
    let mut fields = build_form(catalog, options, Some(record));
    if !role.is_admin {
        fields.retain(|form_field| {
            catalog
                .get(&form_field.label)
                .is_some_and(|field| field.editable_by_non_admin)
        });
    }
    fields
}

fn build_field(
    field: &FieldDescriptor,
    options: &DropdownOptions,
    existing: Option<&CandidateRecord>,
) -> FormField {
    let original = existing.and_then(|record| record.get(field.name)).cloned();
    let text = original.as_ref().map(normalize_value).unwrap_or_default();

    let widget = if options.has_choices(field.name) {
        let mut choices = options.get(field.name).to_vec();
        if !text.is_empty() && !choices.contains(&text) {
            choices.insert(0, text.clone());
        }
        FormWidget::Select {
            options: choices,
            prompt: format!("Select {}...", field.name),
        }
    } else {
        match field.input_kind {
            InputKind::TextArea => FormWidget::TextArea,
            InputKind::Url => FormWidget::Input {
                kind: InputKind::Url,
                required: false,
                placeholder: format!("Enter {} URL...", field.name),
            },
            InputKind::Email => FormWidget::Input {
                kind: InputKind::Email,
                required: true,
                placeholder: format!("Enter {}...", field.name),
            },
            InputKind::Number => FormWidget::Input {
                kind: InputKind::Number,
                required: false,
                placeholder: format!("Enter {}...", field.name),
            },
            InputKind::Text | InputKind::Select => FormWidget::Input {
                kind: InputKind::Text,
                required: false,
                placeholder: format!("Enter {}...", field.name),
            },
        }
    };

    FormField {
        label: field.name.to_owned(),
        widget_id: field.widget_id(),
        widget,
        value: text.clone(),
        original,
        initial_text: text,
    }
}

/// The `(widget id, value)` pairs a submitted form carries.
pub fn form_entries(fields: &[FormField]) -> Vec<(String, Value)> {
    fields
        .iter()
        .map(|field| (field.widget_id.clone(), field.submitted_value()))
        .collect()
}

/// Maps widget ids back to catalog names; unknown ids pass through as is.
pub fn collect_submission(catalog: &FieldCatalog, entries: Vec<(String, Value)>) -> Map<String, Value> {
    let mut submission = Map::with_capacity(entries.len());
    for (widget_id, value) in entries {
        let name = catalog
            .field_for_widget_id(&widget_id)
            .map(|field| field.name.to_owned())
            .unwrap_or(widget_id);
        submission.insert(name, value);
    }
    submission
}

/// Trivial type-hint checks on what the user actually typed.
pub fn validate_form(fields: &[FormField]) -> Result<()> {
    for field in fields {
        let value = field.value.trim();
        if field.widget.is_required() && value.is_empty() {
            bail!(
                "{} is required -- enter a value and retry",
                field.label.to_lowercase()
            );
        }
        if value.is_empty() || !field.is_modified() {
            continue;
        }
        match field.widget.input_kind() {
            InputKind::Email if !value.contains('@') => {
                bail!("{} must be an email address, got {value:?}", field.label)
            }
            InputKind::Number if value.parse::<f64>().is_err() => {
                bail!("{} must be a number, got {value:?}", field.label)
            }
            InputKind::Url if url::Url::parse(value).is_err() => {
                bail!(
                    "{} must be a full URL such as https://example.com, got {value:?}",
                    field.label
                )
            }
            _ => {}
        }
    }
    Ok(())
}
