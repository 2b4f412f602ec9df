//! Partial-update construction.
//!
//! A patch is turned into an ordered list of assignments containing only the
//! fields the caller supplied, followed by the `updatedAt` stamp. Store
//! backends render that list into their own dialect.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::todo::UpdateTodo;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoField {
    Text,
    Completed,
    Priority,
    UpdatedAt,
}

impl TodoField {
    /// Attribute name as stored in the document store.
    pub fn attribute(&self) -> &'static str {
        match self {
            TodoField::Text => "text",
            TodoField::Completed => "completed",
            TodoField::Priority => "priority",
            TodoField::UpdatedAt => "updatedAt",
        }
    }

    /// Column name in the SQL table.
    pub fn column(&self) -> &'static str {
        match self {
            TodoField::Text => "text",
            TodoField::Completed => "completed",
            TodoField::Priority => "priority",
            TodoField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub field: TodoField,
    pub value: FieldValue,
}

pub fn assignments(patch: &UpdateTodo, now: DateTime<Utc>) -> Vec<Assignment> {
    let mut out = Vec::with_capacity(4);
    if let Some(text) = &patch.text {
        out.push(Assignment { field: TodoField::Text, value: FieldValue::Str(text.clone()) });
    }
    if let Some(completed) = patch.completed {
        out.push(Assignment { field: TodoField::Completed, value: FieldValue::Bool(completed) });
    }
    if let Some(priority) = patch.priority {
        out.push(Assignment { field: TodoField::Priority, value: FieldValue::Str(priority.as_str().to_string()) });
    }
    out.push(Assignment { field: TodoField::UpdatedAt, value: FieldValue::Str(now.to_rfc3339()) });
    out
}

/// `SET` expression with name/value placeholders, safe against reserved words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateExpression {
    pub expression: String,
    pub names: BTreeMap<String, String>,
    pub values: BTreeMap<String, FieldValue>,
}

impl UpdateExpression {
    pub fn render(assignments: &[Assignment]) -> Self {
        let mut names = BTreeMap::new();
        let mut values = BTreeMap::new();
        let mut parts = Vec::with_capacity(assignments.len());
        for (i, a) in assignments.iter().enumerate() {
            let name = format!("#f{i}");
            let value = format!(":v{i}");
            parts.push(format!("{name} = {value}"));
            names.insert(name, a.field.attribute().to_string());
            values.insert(value, a.value.clone());
        }
        Self { expression: format!("SET {}", parts.join(", ")), names, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::Priority;

    fn fields(list: &[Assignment]) -> Vec<TodoField> { list.iter().map(|a| a.field).collect() }

    #[test]
    fn only_completed_touches_completed_and_timestamp() {
        let now = Utc::now();
        let patch = UpdateTodo { completed: Some(true), ..Default::default() };
        let list = assignments(&patch, now);
        assert_eq!(fields(&list), vec![TodoField::Completed, TodoField::UpdatedAt]);
        assert_eq!(list[0].value, FieldValue::Bool(true));
        assert_eq!(list[1].value, FieldValue::Str(now.to_rfc3339()));
    }

    #[test]
    fn empty_patch_still_stamps_updated_at() {
        let list = assignments(&UpdateTodo::default(), Utc::now());
        assert_eq!(fields(&list), vec![TodoField::UpdatedAt]);
    }

    #[test]
    fn full_patch_keeps_fixed_order() {
        let patch = UpdateTodo { text: Some("a".into()), completed: Some(false), priority: Some(Priority::High) };
        let list = assignments(&patch, Utc::now());
        assert_eq!(fields(&list), vec![TodoField::Text, TodoField::Completed, TodoField::Priority, TodoField::UpdatedAt]);
        assert_eq!(list[2].value, FieldValue::Str("high".into()));
    }

    #[test]
    fn render_uses_placeholders_for_names_and_values() {
        let patch = UpdateTodo { text: Some("hello".into()), priority: Some(Priority::Low), ..Default::default() };
        let expr = UpdateExpression::render(&assignments(&patch, Utc::now()));
        assert_eq!(expr.expression, "SET #f0 = :v0, #f1 = :v1, #f2 = :v2");
        assert_eq!(expr.names["#f0"], "text");
        assert_eq!(expr.names["#f1"], "priority");
        assert_eq!(expr.names["#f2"], "updatedAt");
        assert_eq!(expr.values[":v0"], FieldValue::Str("hello".into()));
        assert!(!expr.expression.contains("text"));
    }
}
