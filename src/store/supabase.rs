//! Supabase (PostgREST) item store.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::config::Config;
use crate::error::StoreError;
use crate::item::{Item, ItemPatch, NewItem, Status};

use super::ItemStore;

/// Media type asking PostgREST for exactly one object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// PostgREST code for a single-object request that matched no row.
const NO_ROWS: &str = "PGRST116";

/// Error object returned by PostgREST.
#[derive(Debug, Clone, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Clone)]
struct Endpoint {
    /// `{project}/rest/v1/{table}`.
    table_url: Url,
    key: String,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("table_url", &self.table_url.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Item store backed by a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    http: reqwest::Client,
    /// `None` when the project URL or key is missing; every call then fails.
    endpoint: Option<Endpoint>,
}

impl SupabaseStore {
    /// Build the store from configuration. Missing credentials produce an
    /// unconfigured store rather than an error.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let http = Self::http_client(config.http_pool_size)?;

        let endpoint = match (config.supabase_url(), config.supabase_key()) {
            (Some(url), Some(key)) => Some(Endpoint {
                table_url: table_url(url, &config.supabase_table)?,
                key: key.to_string(),
            }),
            _ => None,
        };

        Ok(Self { http, endpoint })
    }

    /// Build a store for an explicit project URL, key and table.
    pub fn connect(base_url: &str, key: &str, table: &str) -> Result<Self, StoreError> {
        Ok(Self {
            http: Self::http_client(10)?,
            endpoint: Some(Endpoint {
                table_url: table_url(base_url, table)?,
                key: key.to_string(),
            }),
        })
    }

    fn http_client(pool_size: usize) -> Result<reqwest::Client, StoreError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(pool_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;
        Ok(http)
    }

    /// Whether a project URL and key were provided.
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Table endpoint, when configured.
    pub fn table_url(&self) -> Option<&Url> {
        self.endpoint.as_ref().map(|e| &e.table_url)
    }

    fn request(&self, method: Method, single: bool) -> Result<RequestBuilder, StoreError> {
        let endpoint = self.endpoint.as_ref().ok_or(StoreError::NotConfigured)?;

        let mut request = self
            .http
            .request(method, endpoint.table_url.clone())
            .header("apikey", &endpoint.key)
            .bearer_auth(&endpoint.key);

        if single {
            request = request.header(ACCEPT, SINGLE_OBJECT);
        }

        Ok(request)
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(status, &body));
        }

        serde_json::from_slice(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Resolve `{base}/rest/v1/{table}`, tolerating a base with or without a
/// trailing slash.
fn table_url(base: &str, table: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.join("rest/v1/")?.join(table)?)
}

fn parse_error(status: reqwest::StatusCode, body: &[u8]) -> StoreError {
    match serde_json::from_slice::<PostgrestError>(body) {
        Ok(err) if err.code.as_deref() == Some(NO_ROWS) => StoreError::NotFound,
        Ok(err) => StoreError::Remote {
            message: err.message.unwrap_or_else(|| format!("HTTP {}", status)),
            code: err.code,
        },
        Err(_) => StoreError::Remote {
            code: None,
            message: format!("HTTP {}: {}", status, String::from_utf8_lossy(body)),
        },
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl ItemStore for SupabaseStore {
    #[instrument(skip(self, item), fields(customer = %item.customer_name))]
    async fn insert(&self, item: NewItem) -> Result<Item, StoreError> {
        let request = self
            .request(Method::POST, true)?
            .query(&[("select", "*")])
            .header("Prefer", "return=representation")
            .json(&item);

        let row: Item = Self::send(request).await?;
        debug!(id = %row.id, "Inserted item");
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn list(&self, status: Option<Status>) -> Result<Vec<Item>, StoreError> {
        let mut request = self
            .request(Method::GET, false)?
            .query(&[("select", "*"), ("order", "created_at.desc")]);

        if let Some(status) = status {
            request = request.query(&[("status", eq(status))]);
        }

        let rows: Vec<Item> = Self::send(request).await?;
        debug!(count = rows.len(), "Listed items");
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Item, StoreError> {
        let request = self
            .request(Method::GET, true)?
            .query(&[("select", "*".to_string()), ("id", eq(id))]);

        Self::send(request).await
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: ItemPatch) -> Result<Item, StoreError> {
        let request = self
            .request(Method::PATCH, true)?
            .query(&[("select", "*".to_string()), ("id", eq(id))])
            .header("Prefer", "return=representation")
            .json(&patch);

        Self::send(request).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<Item, StoreError> {
        let request = self
            .request(Method::DELETE, true)?
            .query(&[("select", "*".to_string()), ("id", eq(id))])
            .header("Prefer", "return=representation");

        Self::send(request).await
    }
}
