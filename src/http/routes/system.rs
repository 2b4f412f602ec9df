//! Liveness and process introspection.

use std::{sync::Arc, time::Instant};

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use sysinfo::{ProcessesToUpdate, System};

use crate::config::Config;
use crate::http::routing::route_not_found;
use crate::http::types::{Health, MemoryUsage, Metrics};

/// Static facts about the running process, captured at startup.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub service: String,
    pub version: String,
    pub environment: String,
    pub region: String,
    pub table_name: String,
    pub secrets_enabled: bool,
    /// Whether internal error detail may be sent to clients.
    pub expose_errors: bool,
    pub started_at: Instant,
}

impl ServiceInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: config.environment.clone(),
            region: config.region.clone(),
            table_name: config.table_name.clone(),
            secrets_enabled: config.secrets_enabled,
            expose_errors: config.is_development(),
            started_at: Instant::now(),
        }
    }
}

pub fn router(info: Arc<ServiceInfo>) -> Router {
    Router::new()
        .route("/api/health", get(health).fallback(route_not_found))
        .route("/api/metrics", get(metrics).fallback(route_not_found))
        .with_state(info)
}

async fn health(State(info): State<Arc<ServiceInfo>>) -> Json<Health> {
    Json(Health {
        status: "OK".into(),
        service: info.service.clone(),
        timestamp: Utc::now(),
        environment: info.environment.clone(),
        region: info.region.clone(),
        table_name: info.table_name.clone(),
        secrets_enabled: info.secrets_enabled,
    })
}

async fn metrics(State(info): State<Arc<ServiceInfo>>) -> Json<Metrics> {
    Json(Metrics {
        uptime_seconds: info.started_at.elapsed().as_secs(),
        memory_usage: sample_memory(),
        environment: info.environment.clone(),
        version: info.version.clone(),
        timestamp: Utc::now(),
    })
}

fn sample_memory() -> MemoryUsage {
    let mut system = System::new();
    system.refresh_memory();
    let mut usage = MemoryUsage {
        system_total_bytes: system.total_memory(),
        system_used_bytes: system.used_memory(),
        ..Default::default()
    };
    if let Ok(pid) = sysinfo::get_current_pid() {
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        if let Some(process) = system.process(pid) {
            usage.rss_bytes = process.memory();
            usage.virtual_bytes = process.virtual_memory();
        }
    }
    usage
}
