//! Configuration for the ECS object client.
//!
//! This module defines the configuration for [`EcsObjectClient`](super::client::EcsObjectClient)
//! and its HTTP transport.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default request timeout in milliseconds (60 seconds).
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Default number of keys requested per listing page.
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 1000;

/// Environment variable holding the service endpoint.
pub const ENDPOINT_ENV: &str = "ECS_ENDPOINT";

/// Configuration for the object client.
///
/// # Example
///
/// ```rust,ignore
/// let config = ObjectClientConfig::new("https://ecs.example.com:9021")
///     .with_request_timeout(Duration::from_secs(30))
///     .with_list_page_size(500);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectClientConfig {
    /// Base URL of the service. Requests use path-style addressing:
    /// `{endpoint}/{bucket}/{key}`.
    pub endpoint: String,

    /// Per-request timeout applied by the HTTP transport, in milliseconds.
    /// Zero falls back to the default.
    ///
    /// Default: 60000 (60 seconds)
    #[serde(default = "ObjectClientConfig::default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// User agent sent with every request.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Keys requested per listing page. Zero is sent as one.
    ///
    /// Default: 1000
    #[serde(default = "ObjectClientConfig::default_list_page_size")]
    pub list_page_size: u32,
}

impl ObjectClientConfig {
    /// Create a new configuration with defaults.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Create a configuration from `ECS_ENDPOINT`, if set.
    pub fn from_env() -> Option<Self> {
        Self::from_env_var(ENDPOINT_ENV)
    }

    /// Create a configuration from the endpoint in environment variable `name`.
    /// Unset or blank variables yield `None`.
    pub fn from_env_var(name: &str) -> Option<Self> {
        env::var(name)
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .map(Self::new)
    }

    /// Set the request timeout.
    ///
    /// Sub-millisecond remainders round up; a zero timeout restores the default.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.request_timeout_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the listing page size. Zero is bumped to one.
    pub fn with_list_page_size(mut self, list_page_size: u32) -> Self {
        self.list_page_size = list_page_size.max(1);
        self
    }

    /// Effective request timeout; never zero.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_ms {
            0 => Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            millis => Duration::from_millis(millis),
        }
    }

    fn default_request_timeout_ms() -> u64 {
        DEFAULT_REQUEST_TIMEOUT_MS
    }

    fn default_list_page_size() -> u32 {
        DEFAULT_LIST_PAGE_SIZE
    }
}

impl Default for ObjectClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            user_agent: None,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}
