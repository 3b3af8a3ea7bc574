//! Application configuration loaded from environment variables.

use axum::http::HeaderValue;
use serde::Deserialize;

use crate::error::Result;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Supabase ===
    /// Project URL, e.g. `https://abcd.supabase.co`.
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Service role key (preferred).
    #[serde(default)]
    pub supabase_service_role_key: Option<String>,

    /// Anonymous key, used when no service role key is set.
    #[serde(default)]
    pub supabase_anon_key: Option<String>,

    /// Table holding the items.
    #[serde(default = "default_table")]
    pub supabase_table: String,

    /// Connection pool size per host for the store client.
    #[serde(default = "default_pool_size")]
    pub http_pool_size: usize,

    // === Server Configuration ===
    /// Allowed CORS origins, comma separated. `*` allows any origin.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    // === Metrics ===
    /// Start the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Port for the Prometheus exporter.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

fn default_table() -> String {
    "items".to_string()
}

fn default_pool_size() -> usize {
    10
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supabase_url: None,
            supabase_service_role_key: None,
            supabase_anon_key: None,
            supabase_table: default_table(),
            http_pool_size: default_pool_size(),
            cors_origin: default_cors_origin(),
            port: default_port(),
            rust_log: default_log_level(),
            log_json: false,
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

/// Which origins the CORS layer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin.
    Any,
    /// Only the listed origins.
    List(Vec<HeaderValue>),
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter(vars)?)
    }

    /// Database key, service role first.
    pub fn supabase_key(&self) -> Option<&str> {
        self.supabase_service_role_key
            .as_deref()
            .or(self.supabase_anon_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    /// Project URL, if set and non-empty.
    pub fn supabase_url(&self) -> Option<&str> {
        self.supabase_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Parse `CORS_ORIGIN`. An empty list or a `*` entry allows any origin.
    pub fn cors_origins(&self) -> CorsOrigins {
        let entries: Vec<&str> = self
            .cors_origin
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        if entries.is_empty() || entries.contains(&"*") {
            return CorsOrigins::Any;
        }

        let origins: Vec<HeaderValue> = entries
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }

    /// Check the configuration. Problems are reported, never fatal: a
    /// missing store only makes requests fail later.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        match self.supabase_url() {
            None => warnings.push("SUPABASE_URL is not set".to_string()),
            Some(raw) => {
                if let Err(e) = url::Url::parse(raw) {
                    warnings.push(format!("SUPABASE_URL is not a valid url: {}", e));
                }
            }
        }

        if self.supabase_key().is_none() {
            warnings.push(
                "neither SUPABASE_SERVICE_ROLE_KEY nor SUPABASE_ANON_KEY is set".to_string(),
            );
        }

        for origin in self.cors_origin.split(',').map(str::trim) {
            if !origin.is_empty() && origin != "*" && HeaderValue::from_str(origin).is_err() {
                warnings.push(format!("ignoring invalid CORS origin {:?}", origin));
            }
        }

        warnings
    }
}
