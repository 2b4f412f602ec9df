//! Typed HTTP client for the todo API.

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::repository::Listing;
use crate::domain::todo::{Priority, Todo, TodoId, UpdateTodo};
use crate::http::types::{ApiResponse, ErrorBody, Health, Metrics};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{status}: {error}")]
    Api { status: u16, error: String, message: Option<String> },
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn url(&self, path: &str) -> String { format!("{}{}", self.base_url, path) }

    pub async fn list(&self) -> ClientResult<Listing> {
        let resp = self.http.get(self.url("/api/todos")).send().await?;
        let body: ApiResponse<Vec<Todo>> = decode(resp).await?;
        let count = body.count.unwrap_or(body.data.len());
        Ok(Listing { items: body.data, count })
    }

    pub async fn create(&self, text: &str, priority: Option<Priority>) -> ClientResult<Todo> {
        let resp = self.http.post(self.url("/api/todos")).json(&CreateRequest { text, priority }).send().await?;
        Ok(decode::<ApiResponse<Todo>>(resp).await?.data)
    }

    pub async fn update(&self, id: &TodoId, patch: &UpdateTodo) -> ClientResult<Todo> {
        let resp = self.http.put(self.url(&format!("/api/todos/{id}"))).json(patch).send().await?;
        Ok(decode::<ApiResponse<Todo>>(resp).await?.data)
    }

    pub async fn delete(&self, id: &TodoId) -> ClientResult<Todo> {
        let resp = self.http.delete(self.url(&format!("/api/todos/{id}"))).send().await?;
        Ok(decode::<ApiResponse<Todo>>(resp).await?.data)
    }

    pub async fn health(&self) -> ClientResult<Health> {
        decode(self.http.get(self.url("/api/health")).send().await?).await
    }

    pub async fn metrics(&self) -> ClientResult<Metrics> {
        decode(self.http.get(self.url("/api/metrics")).send().await?).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> ClientResult<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json::<T>().await?);
    }
    let (error, message) = match resp.json::<ErrorBody>().await {
        Ok(body) => (body.error, body.message),
        Err(_) => (status.canonical_reason().unwrap_or("request failed").to_string(), None),
    };
    Err(ClientError::Api { status: status.as_u16(), error, message })
}
