//! Pooled HTTP client
//!
//! Retries cover failures to establish a connection only. A request whose
//! bytes may have reached the server is never sent twice.

use project_worker_config::ConfigMap;
use reqwest::blocking::{Client, Request, RequestBuilder, Response};
use reqwest::{IntoUrl, Method};
use std::thread;
use std::time::Duration;
use tracing::warn;

pub const POOL_CONNECTIONS_KEY: &str = "HTTP_POOL_CONNECTIONS";
pub const POOL_MAXSIZE_KEY: &str = "HTTP_POOL_MAXSIZE";
pub const POOL_RETRIES_KEY: &str = "HTTP_POOL_RETRIES";

/// Older names for the pool keys, read when the new key is absent
pub const LEGACY_POOL_CONNECTIONS_KEY: &str = "REQUESTS_POOL_CONNECTIONS";
pub const LEGACY_POOL_MAXSIZE_KEY: &str = "REQUESTS_POOL_MAXSIZE";
pub const LEGACY_POOL_RETRIES_KEY: &str = "REQUESTS_POOL_RETRIES";

pub const DEFAULT_POOL_CONNECTIONS: usize = 10;
pub const DEFAULT_POOL_MAXSIZE: usize = 1000;
pub const DEFAULT_POOL_RETRIES: u32 = 3;

/// Connection pool sizing and retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    /// Number of hosts expected to be talked to
    pub connections: usize,
    /// Idle connections kept per host
    pub maxsize: usize,
    /// Extra attempts after a failed connect
    pub retries: u32,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            connections: DEFAULT_POOL_CONNECTIONS,
            maxsize: DEFAULT_POOL_MAXSIZE,
            retries: DEFAULT_POOL_RETRIES,
        }
    }
}

impl PoolSettings {
    /// Read the `HTTP_POOL_*` keys (or their `REQUESTS_POOL_*` names), using
    /// defaults for anything missing or not a non-negative integer
    pub fn from_config(config: &ConfigMap) -> Self {
        let defaults = Self::default();
        let read = |key: &str, legacy: &str| {
            config.get_u64(key).or_else(|| config.get_u64(legacy))
        };
        Self {
            connections: read(POOL_CONNECTIONS_KEY, LEGACY_POOL_CONNECTIONS_KEY)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.connections),
            maxsize: read(POOL_MAXSIZE_KEY, LEGACY_POOL_MAXSIZE_KEY)
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(defaults.maxsize),
            retries: read(POOL_RETRIES_KEY, LEGACY_POOL_RETRIES_KEY)
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.retries),
        }
    }
}

/// Blocking HTTP client shared by a worker
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    settings: PoolSettings,
}

impl HttpClient {
    pub fn new(settings: PoolSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(settings.maxsize.max(settings.connections))
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }

    /// The underlying client, for requests that should not be retried
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> Result<Response, reqwest::Error> {
        self.send(self.client.get(url))
    }

    /// Build and send a request with connect-level retries
    pub fn send(&self, builder: RequestBuilder) -> Result<Response, reqwest::Error> {
        self.execute(builder.build()?)
    }

    /// Send `request`, retrying up to `retries` times while the connection
    /// cannot be established. Requests with a streaming body are sent once.
    pub fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        let mut attempt = 0;
        let mut pending = request;
        loop {
            let retry = if attempt < self.settings.retries {
                pending.try_clone()
            } else {
                None
            };

            match self.client.execute(pending) {
                Err(e) if e.is_connect() => match retry {
                    Some(next) => {
                        warn!(
                            "Connect to {} failed (attempt {}): {e}",
                            next.url(),
                            attempt + 1
                        );
                        thread::sleep(backoff(attempt));
                        attempt += 1;
                        pending = next;
                    }
                    None => return Err(e),
                },
                result => return result,
            }
        }
    }
}

/// 50ms, 100ms, 200ms, ... capped at 800ms
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(50u64 << attempt.min(4))
}
