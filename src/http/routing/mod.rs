use std::{any::Any, sync::Arc};

use axum::{response::{IntoResponse, Response}, Router};
use http::Uri;
use tower_http::{catch_panic::CatchPanicLayer, cors::{self, CorsLayer}, trace::TraceLayer};

use crate::application::todo_service::TodoService;
use crate::http::routes::{system, todos};
use crate::http::types::ApiError;

/// Full API: todo CRUD, health and metrics, plus the shared fallbacks and layers.
pub fn api<S: TodoService + Clone>(state: todos::AppState<S>) -> Router {
    let expose_errors = state.info.expose_errors;
    let routes = system::router(Arc::clone(&state.info)).merge(todos::router(state));
    app(routes, expose_errors)
}

/// Wraps `router` with the 404 fallback, panic-to-500 conversion, request tracing and CORS.
/// CORS is outermost so panic responses still carry the CORS headers.
pub fn app(router: Router, expose_errors: bool) -> Router {
    router
        .fallback(route_not_found)
        .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, expose_errors)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(cors::Any).allow_methods(cors::Any).allow_headers(cors::Any))
}

pub async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::RouteNotFound(uri.path().to_string())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, expose_errors: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::internal("Internal server error", detail, expose_errors).into_response()
}
