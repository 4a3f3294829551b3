//! Reader configuration
//!
//! Describes the service, the table, the continuation shape and the HTTP
//! settings, loaded from YAML.
//!
//! ```yaml
//! service_url: "https://myservice.azure-mobile.net/"
//! app_key: "..."
//! table: person
//! page_size: 10
//! continuation:
//!   type: link_header
//! stale_reference: expect_empty_page
//! http:
//!   max_retries: 0
//! ```

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::pagination::{
    ContinuationShape, PageReader, StaleReferencePolicy, DEFAULT_PAGE_SIZE_PARAM,
};
use crate::table::TableClient;
use crate::types::{BackoffType, OptionStringExt, StringMap};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Root URL of the service
    pub service_url: String,

    /// Application key sent with every request
    #[serde(default)]
    pub app_key: Option<String>,

    /// Table to read
    #[serde(default)]
    pub table: Option<String>,

    /// Page-size hint for the first request
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Query parameter carrying the page-size hint
    #[serde(default = "default_page_size_param")]
    pub page_size_param: String,

    /// Where responses carry the continuation
    #[serde(default)]
    pub continuation: ContinuationShape,

    /// Assumed server behavior for an already exhausted continuation
    #[serde(default)]
    pub stale_reference: StaleReferencePolicy,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_page_size() -> u32 {
    50
}

fn default_page_size_param() -> String {
    DEFAULT_PAGE_SIZE_PARAM.to_string()
}

impl ReaderConfig {
    /// Create a config with defaults for everything but the service URL
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            app_key: None,
            table: None,
            page_size: default_page_size(),
            page_size_param: default_page_size_param(),
            continuation: ContinuationShape::default(),
            stale_reference: StaleReferencePolicy::default(),
            http: HttpConfig::default(),
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.service_url).map_err(|e| {
            Error::config(format!("service_url '{}' is invalid: {e}", self.service_url))
        })?;

        if self.page_size == 0 {
            return Err(Error::config("page_size must be at least 1"));
        }

        if self.page_size_param.trim().is_empty() {
            return Err(Error::config("page_size_param must not be empty"));
        }

        match &self.continuation {
            ContinuationShape::LinkHeader { rel } if rel.trim().is_empty() => {
                Err(Error::config("continuation.rel must not be empty"))
            }
            ContinuationShape::BodyField { results, next_link }
                if results.trim().is_empty() || next_link.trim().is_empty() =>
            {
                Err(Error::config(
                    "continuation.results and continuation.next_link must not be empty",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Build the HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff.backoff_type,
                Duration::from_millis(self.http.backoff.initial_ms),
                Duration::from_millis(self.http.backoff.max_ms),
            );

        builder = match &self.http.rate_limit {
            Some(rate_limit) => builder.rate_limit(rate_limit.clone()),
            None => builder.no_rate_limit(),
        };

        for (key, value) in &self.http.headers {
            builder = builder.header(key, value);
        }

        if let Some(key) = self.app_key.clone().none_if_empty() {
            builder = builder.app_key(key);
        }

        builder.build()
    }

    /// Build a page reader from this configuration
    pub fn build_reader(&self) -> Result<PageReader> {
        let http = HttpClient::with_config(self.http_client_config())?;
        Ok(PageReader::new(http, &self.continuation)
            .page_size_param(&self.page_size_param)
            .stale_policy(self.stale_reference))
    }

    /// Build a client for the configured table, or `table` when given
    pub fn build_table(&self, table: Option<&str>) -> Result<TableClient> {
        let table = table
            .or(self.table.as_deref())
            .ok_or_else(|| Error::config("no table configured (set `table` or pass --table)"))?;
        TableClient::new(self.build_reader()?, &self.service_url, table)
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries per request (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Rate limiting configuration (`null` disables it)
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: StringMap,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
            headers: StringMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    100
}

fn default_max_ms() -> u64 {
    60000
}
