use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<String> for TodoId {
    fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for TodoId {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self { Priority::Low => "low", Priority::Medium => "medium", Priority::High => "high" }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s { "low" => Some(Priority::Low), "medium" => Some(Priority::Medium), "high" => Some(Priority::High), _ => None }
    }

    /// Next priority in display order, wrapping around.
    pub fn cycle(self) -> Self {
        match self { Priority::Low => Priority::Medium, Priority::Medium => Priority::High, Priority::High => Priority::Low }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Builds a fresh record with a generated id and creation defaults.
    pub fn new(input: CreateTodo, now: DateTime<Utc>) -> Self {
        Self {
            id: TodoId::generate(),
            text: input.text,
            completed: false,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Text is required")]
    TextRequired,
}

/// Validated creation input: `text` is trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTodo {
    pub text: String,
    pub priority: Priority,
}

impl CreateTodo {
    pub fn new(text: Option<&str>, priority: Option<Priority>) -> Result<Self, ValidationError> {
        Ok(Self { text: required_text(text)?, priority: priority.unwrap_or_default() })
    }
}

/// Sparse set of mutable fields. `None` means "leave untouched".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl UpdateTodo {
    /// Validates a raw patch. A supplied `text` must survive trimming.
    pub fn new(text: Option<&str>, completed: Option<bool>, priority: Option<Priority>) -> Result<Self, ValidationError> {
        let text = match text {
            Some(t) => Some(required_text(Some(t))?),
            None => None,
        };
        Ok(Self { text, completed, priority })
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none() && self.priority.is_none()
    }
}

fn required_text(text: Option<&str>) -> Result<String, ValidationError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(ValidationError::TextRequired),
    }
}
