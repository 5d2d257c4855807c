// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::ids::RecordId;

pub const ID_KEY: &str = "id";

/// One candidate as the backend returns it. Field order follows the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CandidateRecord {
    pub id: Option<RecordId>,
    pub fields: Map<String, Value>,
}

impl CandidateRecord {
    pub fn new(id: Option<RecordId>, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let id = object
            .remove(ID_KEY)
            .and_then(|value| RecordId::from_value(&value));
        Self { id, fields: object }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_addressable(&self) -> bool {
        self.id.is_some()
    }

    /// Merges a partial update into this record, overwriting present keys.
    pub fn apply_patch(&mut self, patch: &Map<String, Value>) {
        for (key, value) in patch {
            if key == ID_KEY {
                continue;
            }
            self.fields.insert(key.clone(), value.clone());
        }
    }

    pub fn to_object(&self) -> Map<String, Value> {
        let mut object = Map::with_capacity(self.fields.len() + 1);
        if let Some(id) = &self.id {
            object.insert(ID_KEY.to_owned(), Value::String(id.as_str().to_owned()));
        }
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        object
    }
}

impl<'de> Deserialize<'de> for CandidateRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(object) => Ok(Self::from_object(object)),
            other => Err(D::Error::custom(format!(
                "candidate record must be a JSON object, got {other}"
            ))),
        }
    }
}

impl Serialize for CandidateRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_object().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleContext {
    pub is_admin: bool,
}

impl RoleContext {
    pub const ADMIN: Self = Self { is_admin: true };
    pub const VIEWER: Self = Self { is_admin: false };

    pub const fn label(self) -> &'static str {
        if self.is_admin { "admin" } else { "viewer" }
    }
}

/// Body of `GET /api/data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordBatch {
    #[serde(default)]
    pub data: Vec<CandidateRecord>,
    #[serde(default)]
    pub is_admin: bool,
}

impl RecordBatch {
    pub fn role(&self) -> RoleContext {
        RoleContext {
            is_admin: self.is_admin,
        }
    }
}

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Body of every write response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOutcome {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_SUCCESS.to_owned(),
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_owned(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn message_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Candidates,
    Analytics,
}

impl ViewKind {
    pub const ALL: [Self; 2] = [Self::Candidates, Self::Analytics];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Candidates => "candidates",
            Self::Analytics => "analytics",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "candidates" => Some(Self::Candidates),
            "analytics" => Some(Self::Analytics),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Nav,
    Detail(RecordId),
    Form(FormKind),
    ConfirmDelete(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}
