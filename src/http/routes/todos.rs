use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::{Path, State}, routing::{get, put}, Json, Router};
use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use serde::Deserialize;

use crate::{
    application::todo_service::TodoService,
    domain::todo::{CreateTodo, Priority, Todo, TodoId, UpdateTodo},
    http::{
        routes::system::ServiceInfo,
        routing::route_not_found,
        types::{ApiError, ApiResponse},
    },
};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S, pub info: Arc<ServiceInfo> }

pub fn router<S: TodoService + Clone>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos::<S>).post(create_todo::<S>).fallback(route_not_found))
        .route("/api/todos/:id", put(update_todo::<S>).delete(delete_todo::<S>).fallback(route_not_found))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateBody { text: Option<String>, priority: Option<Priority> }

#[derive(Default, Deserialize)]
struct UpdateBody { text: Option<String>, completed: Option<bool>, priority: Option<Priority> }

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<ApiResponse<Vec<Todo>>>, ApiError> {
    let listing = state.service.list().await
        .map_err(|e| ApiError::from_todo(e, "Failed to fetch todos", state.info.expose_errors))?;
    Ok(Json(ApiResponse::counted(listing.items, listing.count)))
}

async fn create_todo<S: TodoService>(State(state): State<AppState<S>>, payload: Result<Json<CreateBody>, JsonRejection>) -> Result<(StatusCode, Json<ApiResponse<Todo>>), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::invalid_body(e.body_text()))?;
    let input = CreateTodo::new(body.text.as_deref(), body.priority)?;
    let todo = state.service.create(input).await
        .map_err(|e| ApiError::from_todo(e, "Failed to create todo", state.info.expose_errors))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(todo))))
}

/// A missing body, or one not sent as JSON, is an empty patch that only refreshes `updatedAt`.
fn update_body(headers: &HeaderMap, bytes: &[u8]) -> Result<UpdateBody, ApiError> {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("application/json"));
    if !is_json || bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdateBody::default());
    }
    serde_json::from_slice(bytes).map_err(ApiError::invalid_body)
}

async fn update_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>, headers: HeaderMap, payload: Bytes) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    let body = update_body(&headers, &payload)?;
    let patch = UpdateTodo::new(body.text.as_deref(), body.completed, body.priority)?;
    let todo = state.service.update(TodoId(id), patch).await
        .map_err(|e| ApiError::from_todo(e, "Failed to update todo", state.info.expose_errors))?;
    Ok(Json(ApiResponse::ok(todo)))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<ApiResponse<Todo>>, ApiError> {
    let todo = state.service.delete(TodoId(id)).await
        .map_err(|e| ApiError::from_todo(e, "Failed to delete todo", state.info.expose_errors))?;
    Ok(Json(ApiResponse::ok(todo)))
}
