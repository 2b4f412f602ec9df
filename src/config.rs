//! Process configuration.
//!
//! Settings are resolved once at startup by asking each source in order
//! (secret, then environment) and falling back to a default.

use std::{collections::HashMap, env, fmt, str::FromStr};

use anyhow::{bail, Context, Result};
use aws_config::SdkConfig;

use crate::infrastructure::secrets;

pub const DEFAULT_REGION: &str = "eu-west-1";
pub const DEFAULT_TABLE_NAME: &str = "iim-project-data";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://todos.db";
pub const DEFAULT_PORT: u16 = 3001;

pub trait SettingSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment. Empty values count as unset.
pub struct EnvSource;

impl SettingSource for EnvSource {
    fn name(&self) -> &'static str { "env" }
    fn get(&self, key: &str) -> Option<String> { env::var(key).ok().filter(|v| !v.trim().is_empty()) }
}

/// Fixed key/value pairs, e.g. the decoded contents of a secret.
pub struct MapSource {
    name: &'static str,
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new(name: &'static str, values: HashMap<String, String>) -> Self { Self { name, values } }
}

impl SettingSource for MapSource {
    fn name(&self) -> &'static str { self.name }
    fn get(&self, key: &str) -> Option<String> { self.values.get(key).cloned() }
}

#[derive(Default)]
pub struct Resolver {
    sources: Vec<Box<dyn SettingSource>>,
}

impl Resolver {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, source: impl SettingSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|s| {
            let value = s.get(key)?;
            tracing::debug!(key, source = s.name(), "resolved setting");
            Some(value)
        })
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Sqlite,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(StoreBackend::DynamoDb),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown STORE_BACKEND {other:?} (expected dynamodb, sqlite or memory)"),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { StoreBackend::DynamoDb => "dynamodb", StoreBackend::Sqlite => "sqlite", StoreBackend::Memory => "memory" })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub region: String,
    pub table_name: String,
    /// True only when the secret was configured and fetched successfully.
    pub secrets_enabled: bool,
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Reads `SECRET_NAME` from the environment, fetches that secret if set,
    /// then resolves every setting through secret → env → default.
    pub async fn load(aws: &SdkConfig) -> Result<Self> {
        let secret_name = EnvSource.get("SECRET_NAME");
        let mut resolver = Resolver::new();
        let mut secrets_enabled = false;

        if let Some(name) = &secret_name {
            let client = aws_sdk_secretsmanager::Client::new(aws);
            match secrets::fetch_settings(&client, name).await {
                Ok(values) => {
                    tracing::info!(secret = %name, keys = values.len(), "loaded settings from secret");
                    resolver = resolver.with(MapSource::new("secret", values));
                    secrets_enabled = true;
                }
                Err(e) => tracing::warn!(secret = %name, error = %e, "secret unavailable, using environment"),
            }
        }

        let region = aws.region().map(|r| r.to_string()).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let mut config = Self::resolve(&resolver.with(EnvSource), region)?;
        config.secrets_enabled = secrets_enabled;
        Ok(config)
    }

    pub fn resolve(resolver: &Resolver, region: String) -> Result<Self> {
        let port = match resolver.get("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT {p:?}"))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            environment: resolver.get_or("ENVIRONMENT", DEFAULT_ENVIRONMENT),
            region,
            table_name: resolver.get_or("TABLE_NAME", DEFAULT_TABLE_NAME),
            secrets_enabled: false,
            store_backend: resolver.get_or("STORE_BACKEND", "dynamodb").parse()?,
            database_url: resolver.get_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            host: resolver.get_or("HOST", "0.0.0.0"),
            port,
        })
    }

    pub fn is_development(&self) -> bool { self.environment.eq_ignore_ascii_case("development") }

    pub fn server_addr(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Region used to bootstrap the AWS clients, before any secret is read.
pub fn bootstrap_region() -> String {
    EnvSource.get("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string())
}
