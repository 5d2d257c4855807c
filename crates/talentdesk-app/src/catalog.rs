// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

pub const PRIMARY_FIELD: &str = "Date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Text,
    Email,
    Number,
    Url,
    TextArea,
    Select,
}

impl InputKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Number => "number",
            Self::Url => "url",
            Self::TextArea => "textarea",
            Self::Select => "select",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "email" => Some(Self::Email),
            "number" => Some(Self::Number),
            "url" => Some(Self::Url),
            "textarea" => Some(Self::TextArea),
            "select" => Some(Self::Select),
            _ => None,
        }
    }
}

/// How a column is drawn in the table, independent of how it is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Plain,
    Timestamp,
    Link { label: &'static str },
    Status,
    LongText,
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub input_kind: InputKind,
    pub cell_kind: CellKind,
    pub dropdown: &'static [&'static str],
    pub visible_to_non_admin: bool,
    pub editable_by_non_admin: bool,
    pub groupable: bool,
    pub legacy_name: Option<&'static str>,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            input_kind: InputKind::Text,
            cell_kind: CellKind::Plain,
            dropdown: &[],
            visible_to_non_admin: false,
            editable_by_non_admin: false,
            groupable: true,
            legacy_name: None,
        }
    }

    pub const fn input(mut self, kind: InputKind) -> Self {
        self.input_kind = kind;
        self
    }

    pub const fn cell(mut self, kind: CellKind) -> Self {
        self.cell_kind = kind;
        self
    }

    pub const fn options(mut self, options: &'static [&'static str]) -> Self {
        self.dropdown = options;
        self.input_kind = InputKind::Select;
        self
    }

    pub const fn shown_to_everyone(mut self) -> Self {
        self.visible_to_non_admin = true;
        self
    }

    pub const fn editable_by_everyone(mut self) -> Self {
        self.visible_to_non_admin = true;
        self.editable_by_non_admin = true;
        self
    }

    pub const fn ungroupable(mut self) -> Self {
        self.groupable = false;
        self
    }

    pub const fn legacy(mut self, name: &'static str) -> Self {
        self.legacy_name = Some(name);
        self
    }

    pub fn widget_id(&self) -> String {
        widget_id(self.name)
    }
}

/// Widget identifiers drop every whitespace run from the field name.
pub fn widget_id(field: &str) -> String {
    field.split_whitespace().collect()
}

const INTERVIEW_STATUSES: &[&str] = &[
    "Applied",
    "Profile Screening Comp",
    "Voice Screening Comp",
    "Tech Inter Sched",
    "Tech Inter Comp",
    "Code Inter Sched",
    "Code Inter Comp",
    "HR Inter Sched",
    "HR Inter Comp",
    "Offer",
    "Pending Final Noti",
    "References",
    "All Completed",
];

const APPLICATION_STATUSES: &[&str] = &[
    "Proceed Further",
    "On Hold",
    "No Resp Call/Email",
    "Did Not Join",
    "Sent",
    "Recieved",
    "In Notice",
    "Accepted",
    "Rejected",
    "Joined",
];

const CANONICAL_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor::new(PRIMARY_FIELD)
        .cell(CellKind::Timestamp)
        .shown_to_everyone()
        .ungroupable(),
    FieldDescriptor::new("Name").shown_to_everyone(),
    FieldDescriptor::new("Email ID")
        .input(InputKind::Email)
        .shown_to_everyone()
        .ungroupable(),
    FieldDescriptor::new("Contact Number")
        .input(InputKind::Number)
        .ungroupable(),
    FieldDescriptor::new("Interested Position"),
    FieldDescriptor::new("Current Role"),
    FieldDescriptor::new("Current Organization"),
    FieldDescriptor::new("Current Location"),
    FieldDescriptor::new("Current CTC per Annum")
        .input(InputKind::Number)
        .cell(CellKind::Currency)
        .ungroupable(),
    FieldDescriptor::new("Expected CTC per Annum")
        .input(InputKind::Number)
        .cell(CellKind::Currency)
        .ungroupable(),
    FieldDescriptor::new("Total Years of Experience"),
    FieldDescriptor::new("Notice Period"),
    FieldDescriptor::new("Interview Status")
        .options(INTERVIEW_STATUSES)
        .cell(CellKind::Status),
    FieldDescriptor::new("Referred By"),
    FieldDescriptor::new("Comments")
        .input(InputKind::TextArea)
        .ungroupable(),
    FieldDescriptor::new("In Notice"),
    FieldDescriptor::new("Immediate Joiner"),
    FieldDescriptor::new("Offers in Hand"),
    FieldDescriptor::new("Offered CTC")
        .input(InputKind::Number)
        .cell(CellKind::Currency)
        .ungroupable(),
    FieldDescriptor::new("Location Preference"),
    FieldDescriptor::new("Certifications"),
    FieldDescriptor::new("Resume")
        .input(InputKind::Url)
        .cell(CellKind::Link {
            label: "View Resume",
        })
        .ungroupable(),
    FieldDescriptor::new("LinkedIn Profile")
        .input(InputKind::Url)
        .cell(CellKind::Link {
            label: "View Profile",
        })
        .ungroupable(),
    FieldDescriptor::new("Initial Screening")
        .input(InputKind::TextArea)
        .cell(CellKind::LongText)
        .editable_by_everyone()
        .ungroupable()
        .legacy("Initial Remarks"),
    FieldDescriptor::new("Round 1 Remarks")
        .input(InputKind::TextArea)
        .cell(CellKind::LongText)
        .editable_by_everyone()
        .ungroupable(),
    FieldDescriptor::new("Round 2 Remarks")
        .input(InputKind::TextArea)
        .cell(CellKind::LongText)
        .editable_by_everyone()
        .ungroupable(),
    FieldDescriptor::new("Final Remarks")
        .input(InputKind::TextArea)
        .ungroupable(),
    FieldDescriptor::new("Remarks")
        .input(InputKind::TextArea)
        .cell(CellKind::LongText)
        .ungroupable(),
    FieldDescriptor::new("Reject Mail Sent"),
    FieldDescriptor::new("Month Count"),
    FieldDescriptor::new("Application Status")
        .options(APPLICATION_STATUSES)
        .cell(CellKind::Status),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    EmptyName,
    DuplicateField(String),
    MissingPrimary(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => f.write_str("field catalog contains a field with an empty name"),
            Self::DuplicateField(name) => write!(f, "field catalog lists {name:?} more than once"),
            Self::MissingPrimary(name) => {
                write!(f, "primary field {name:?} is not part of the field catalog")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Ordered field descriptors; order drives default display and form order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
    primary: &'static str,
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::canonical()
    }
}

impl FieldCatalog {
    pub fn new(
        fields: Vec<FieldDescriptor>,
        primary: &'static str,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !seen.insert(field.name) {
                return Err(CatalogError::DuplicateField(field.name.to_owned()));
            }
        }
        if !seen.contains(primary) {
            return Err(CatalogError::MissingPrimary(primary.to_owned()));
        }
        Ok(Self { fields, primary })
    }

    pub fn canonical() -> Self {
        Self {
            fields: CANONICAL_FIELDS.to_vec(),
            primary: PRIMARY_FIELD,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn primary(&self) -> &'static str {
        self.primary
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Inverts [`widget_id`] by lookup; a collision resolves to the first match.
    pub fn field_for_widget_id(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.widget_id() == id)
    }

    pub fn non_admin_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.visible_to_non_admin)
    }

    pub fn hardcoded_options(&self) -> DropdownOptions {
        let mut options = DropdownOptions::default();
        for field in self.fields.iter().filter(|field| !field.dropdown.is_empty()) {
            options.insert(
                field.name,
                field.dropdown.iter().map(|option| (*option).to_owned()).collect(),
            );
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropdownOptions(BTreeMap<String, Vec<String>>);

impl DropdownOptions {
    pub fn from_map(map: BTreeMap<String, Vec<String>>) -> Self {
        Self(map)
    }

    /// Server options overlaid with the catalog's hardcoded lists; the
    /// hardcoded list wins whenever both define the same field.
    pub fn merged(server: Self, catalog: &FieldCatalog) -> Self {
        let mut merged = server;
        for (field, options) in catalog.hardcoded_options().0 {
            merged.0.insert(field, options);
        }
        merged
    }

    pub fn insert(&mut self, field: impl Into<String>, options: Vec<String>) {
        self.0.insert(field.into(), options);
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_choices(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CatalogError, CellKind, DropdownOptions, FieldCatalog, FieldDescriptor, InputKind,
        PRIMARY_FIELD, widget_id,
    };
    use std::collections::{BTreeMap, HashSet};

    #[test]
    fn canonical_catalog_passes_validation() {
        let canonical = FieldCatalog::canonical();
        let validated = FieldCatalog::new(canonical.fields().to_vec(), PRIMARY_FIELD);
        assert_eq!(validated, Ok(canonical));
    }

    #[test]
    fn canonical_catalog_starts_with_primary_and_ends_with_application_status() {
        let catalog = FieldCatalog::canonical();
        let names = catalog
            .fields()
            .iter()
            .map(|field| field.name)
            .collect::<Vec<_>>();
        assert_eq!(names.first(), Some(&"Date"));
        assert_eq!(names.last(), Some(&"Application Status"));
        assert_eq!(names.len(), 31);
    }

    #[test]
    fn canonical_widget_ids_do_not_collide() {
        let catalog = FieldCatalog::canonical();
        let ids = catalog
            .fields()
            .iter()
            .map(FieldDescriptor::widget_id)
            .collect::<HashSet<_>>();
        assert_eq!(ids.len(), catalog.fields().len());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let fields = vec![
            FieldDescriptor::new("Date"),
            FieldDescriptor::new("Name"),
            FieldDescriptor::new("Name"),
        ];
        assert_eq!(
            FieldCatalog::new(fields, "Date"),
            Err(CatalogError::DuplicateField("Name".to_owned()))
        );
    }

    #[test]
    fn missing_primary_is_rejected() {
        let error = FieldCatalog::new(vec![FieldDescriptor::new("Name")], "Date")
            .expect_err("primary must exist");
        assert!(error.to_string().contains("primary field"));
    }

    #[test]
    fn widget_id_strips_all_whitespace() {
        assert_eq!(widget_id("Current CTC per Annum"), "CurrentCTCperAnnum");
        assert_eq!(widget_id("Email  ID"), "EmailID");
        let catalog = FieldCatalog::canonical();
        assert_eq!(
            catalog
                .field_for_widget_id("Round1Remarks")
                .map(|field| field.name),
            Some("Round 1 Remarks")
        );
        assert!(catalog.field_for_widget_id("Reference").is_none());
    }

    #[test]
    fn descriptors_carry_rendering_rules() {
        let catalog = FieldCatalog::canonical();
        let resume = catalog.get("Resume").expect("resume field");
        assert_eq!(resume.input_kind, InputKind::Url);
        assert_eq!(
            resume.cell_kind,
            CellKind::Link {
                label: "View Resume"
            }
        );
        let status = catalog.get("Interview Status").expect("status field");
        assert_eq!(status.input_kind, InputKind::Select);
        assert_eq!(status.cell_kind, CellKind::Status);
        assert_eq!(
            catalog
                .get("Initial Screening")
                .and_then(|field| field.legacy_name),
            Some("Initial Remarks")
        );
    }

    #[test]
    fn non_admin_fields_follow_catalog_order() {
        let catalog = FieldCatalog::canonical();
        let names = catalog
            .non_admin_fields()
            .map(|field| field.name)
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "Date",
                "Name",
                "Email ID",
                "Initial Screening",
                "Round 1 Remarks",
                "Round 2 Remarks",
            ]
        );
    }

    #[test]
    fn hardcoded_options_win_on_collision() {
        let catalog = FieldCatalog::canonical();
        let mut server = BTreeMap::new();
        server.insert("Interview Status".to_owned(), vec!["X".to_owned()]);
        server.insert("In Notice".to_owned(), vec!["Yes".to_owned(), "No".to_owned()]);

        let merged = DropdownOptions::merged(DropdownOptions::from_map(server), &catalog);
        assert_eq!(merged.get("Interview Status").first().map(String::as_str), Some("Applied"));
        assert_eq!(merged.get("Interview Status").last().map(String::as_str), Some("All Completed"));
        assert_eq!(merged.get("Interview Status").len(), 13);
        assert_eq!(merged.get("In Notice"), ["Yes".to_owned(), "No".to_owned()]);
        assert!(merged.has_choices("Application Status"));
        assert!(!merged.has_choices("Name"));
    }

    #[test]
    fn input_kind_round_trips_through_labels() {
        for kind in [
            InputKind::Text,
            InputKind::Email,
            InputKind::Number,
            InputKind::Url,
            InputKind::TextArea,
            InputKind::Select,
        ] {
            assert_eq!(InputKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(InputKind::parse("date"), None);
    }
}
