use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    types::{AttributeValue, ReturnValue},
    Client,
};
use chrono::Utc;

use crate::domain::{
    repository::{Listing, StoreError, StoreResult, TodoStore},
    todo::{Priority, Todo, TodoId, UpdateTodo},
    update::{assignments, FieldValue, UpdateExpression},
};

use super::parse_timestamp;

type Item = HashMap<String, AttributeValue>;

const KEY: &str = "id";

#[derive(Clone)]
pub struct DynamoTodoStore {
    client: Client,
    table_name: String,
}

impl DynamoTodoStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self { client, table_name: table_name.into() }
    }
}

#[async_trait]
impl TodoStore for DynamoTodoStore {
    async fn list_all(&self) -> StoreResult<Listing> {
        let mut items = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Unavailable(DisplayErrorContext(&e).to_string()))?;

            for item in output.items() {
                items.push(item_to_todo(item)?);
            }
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }
        tracing::debug!(count = items.len(), table = %self.table_name, "scanned todos");
        Ok(Listing::new(items))
    }

    async fn create_if_absent(&self, todo: &Todo) -> StoreResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(todo_to_item(todo)))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", KEY)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.as_service_error().is_some_and(|s| s.is_conditional_check_failed_exception()) => {
                Err(StoreError::AlreadyExists(todo.id.clone()))
            }
            Err(e) => Err(StoreError::Unavailable(DisplayErrorContext(&e).to_string())),
        }
    }

    async fn update_if_present(&self, id: &TodoId, patch: &UpdateTodo) -> StoreResult<Todo> {
        let expr = UpdateExpression::render(&assignments(patch, Utc::now()));
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY, AttributeValue::S(id.to_string()))
            .update_expression(expr.expression)
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", KEY)
            .return_values(ReturnValue::AllNew);
        for (placeholder, name) in expr.names {
            request = request.expression_attribute_names(placeholder, name);
        }
        for (placeholder, value) in expr.values {
            request = request.expression_attribute_values(placeholder, to_attribute(value));
        }

        match request.send().await {
            Ok(output) => match output.attributes() {
                Some(item) => item_to_todo(item),
                None => Err(StoreError::Malformed(format!("update of {id} returned no attributes"))),
            },
            Err(e) if e.as_service_error().is_some_and(|s| s.is_conditional_check_failed_exception()) => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(StoreError::Unavailable(DisplayErrorContext(&e).to_string())),
        }
    }

    async fn delete_if_present(&self, id: &TodoId) -> StoreResult<Todo> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(KEY, AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(#pk)")
            .expression_attribute_names("#pk", KEY)
            .return_values(ReturnValue::AllOld)
            .send()
            .await;

        match result {
            Ok(output) => match output.attributes() {
                Some(item) => item_to_todo(item),
                None => Err(StoreError::Malformed(format!("delete of {id} returned no attributes"))),
            },
            Err(e) if e.as_service_error().is_some_and(|s| s.is_conditional_check_failed_exception()) => {
                Err(StoreError::NotFound(id.clone()))
            }
            Err(e) => Err(StoreError::Unavailable(DisplayErrorContext(&e).to_string())),
        }
    }
}

fn to_attribute(value: FieldValue) -> AttributeValue {
    match value {
        FieldValue::Str(s) => AttributeValue::S(s),
        FieldValue::Bool(b) => AttributeValue::Bool(b),
    }
}

pub(crate) fn todo_to_item(todo: &Todo) -> Item {
    HashMap::from([
        (KEY.to_string(), AttributeValue::S(todo.id.to_string())),
        ("text".to_string(), AttributeValue::S(todo.text.clone())),
        ("completed".to_string(), AttributeValue::Bool(todo.completed)),
        ("priority".to_string(), AttributeValue::S(todo.priority.as_str().to_string())),
        ("createdAt".to_string(), AttributeValue::S(todo.created_at.to_rfc3339())),
        ("updatedAt".to_string(), AttributeValue::S(todo.updated_at.to_rfc3339())),
    ])
}

/// Decodes a stored item. Items written before `priority` and `updatedAt`
/// existed fall back to `medium` and `createdAt`.
pub(crate) fn item_to_todo(item: &Item) -> StoreResult<Todo> {
    let id = string_attr(item, KEY)?;
    let text = string_attr(item, "text")?;
    let completed = match item.get("completed") {
        Some(AttributeValue::Bool(b)) => *b,
        None => false,
        Some(other) => return Err(StoreError::Malformed(format!("todo {id}: completed is {other:?}"))),
    };
    let priority = match item.get("priority") {
        Some(AttributeValue::S(s)) => Priority::parse(s)
            .ok_or_else(|| StoreError::Malformed(format!("todo {id}: unknown priority {s:?}")))?,
        None => Priority::default(),
        Some(other) => return Err(StoreError::Malformed(format!("todo {id}: priority is {other:?}"))),
    };
    let created_at = parse_timestamp(&string_attr(item, "createdAt")?)?;
    let updated_at = match item.get("updatedAt") {
        Some(AttributeValue::S(s)) => parse_timestamp(s)?,
        _ => created_at,
    };
    Ok(Todo { id: TodoId(id), text, completed, priority, created_at, updated_at })
}

fn string_attr(item: &Item, name: &str) -> StoreResult<String> {
    match item.get(name) {
        Some(AttributeValue::S(s)) => Ok(s.clone()),
        Some(other) => Err(StoreError::Malformed(format!("attribute {name} is {other:?}"))),
        None => Err(StoreError::Malformed(format!("attribute {name} missing"))),
    }
}
