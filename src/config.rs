//! Configuration types for nzb-health

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Usenet provider (NNTP server account) configuration
///
/// Supplied by an external configuration manager. Only providers that are
/// enabled and have a host take part in a health check, in the order given.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Display name used in logs
    #[serde(default)]
    pub name: String,

    /// Server hostname
    pub host: String,

    /// Server port (typically 119 for unencrypted, 563 for TLS)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use TLS (implicit TLS, not STARTTLS)
    ///
    /// The direct-dial client always negotiates implicit TLS; the flag is
    /// forwarded for pools and other dialers that honour it.
    #[serde(default = "default_true")]
    pub use_tls: bool,

    /// Username for authentication
    #[serde(default)]
    pub username: Option<String>,

    /// Password for authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Connection budget for this account (default: 8)
    #[serde(default = "default_connections")]
    pub max_connections: usize,

    /// Whether the provider participates in checks
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProviderConfig {
    /// Create an enabled TLS provider with default port and connection budget
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port: default_port(),
            use_tls: true,
            username: None,
            password: None,
            max_connections: default_connections(),
            enabled: true,
        }
    }

    /// Whether this provider can be used for checks (enabled, non-blank host)
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.host.trim().is_empty()
    }

    /// Name for log output, falling back to the host
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            self.host.trim()
        } else {
            self.name.trim()
        }
    }
}

impl From<&ProviderConfig> for nntp_rs::ServerConfig {
    fn from(config: &ProviderConfig) -> Self {
        nntp_rs::ServerConfig {
            host: config.host.trim().to_string(),
            port: config.port,
            tls: config.use_tls,
            allow_insecure_tls: false,
            username: config.username.clone().unwrap_or_default(),
            password: config.password.clone().unwrap_or_default(),
        }
    }
}

/// Keep only usable providers, preserving configured order (fallback priority)
pub fn enabled_providers(providers: &[ProviderConfig]) -> Vec<ProviderConfig> {
    providers.iter().filter(|p| p.is_usable()).cloned().collect()
}

/// Source of provider configuration, consulted at the start of every check
///
/// Persistence of provider settings lives outside this crate; a plain
/// `Vec<ProviderConfig>` is the simplest source.
pub trait ProviderSource: Send + Sync {
    /// Load the current provider list
    fn load_providers(&self) -> Result<Vec<ProviderConfig>>;
}

impl ProviderSource for Vec<ProviderConfig> {
    fn load_providers(&self) -> Result<Vec<ProviderConfig>> {
        Ok(self.clone())
    }
}

/// Health check tuning
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthCheckConfig {
    /// Maximum number of segments probed per NZB (default: 3)
    ///
    /// NZBs with at most this many segments are checked in full. Larger ones
    /// are sampled: first and last segment plus random interior segments.
    /// Zero disables sampling and always checks every segment.
    #[serde(default = "default_sample_budget")]
    pub sample_budget: usize,

    /// Timeout for fetching the NZB document (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Timeout for a single probe, including connect and authentication (default: 30 seconds)
    #[serde(default = "default_probe_timeout", with = "duration_serde")]
    pub probe_timeout: Duration,

    /// Maximum concurrent segment checks (None = sum of provider connection budgets)
    #[serde(default)]
    pub max_workers: Option<usize>,

    /// Consult the shared provider pool before dialing providers directly (default: false)
    #[serde(default)]
    pub use_pool: bool,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            sample_budget: default_sample_budget(),
            request_timeout: default_request_timeout(),
            probe_timeout: default_probe_timeout(),
            max_workers: None,
            use_pool: false,
        }
    }
}

impl HealthCheckConfig {
    /// Number of segment checks allowed in flight for these providers
    pub fn worker_limit(&self, providers: &[ProviderConfig]) -> usize {
        let limit = match self.max_workers {
            Some(n) => n,
            None => providers.iter().map(|p| p.max_connections).sum(),
        };
        limit.max(1)
    }

    /// Reject settings that would make every check fail
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request timeout must be greater than zero".to_string(),
                key: Some("request_timeout".to_string()),
            });
        }
        if self.probe_timeout.is_zero() {
            return Err(Error::Config {
                message: "probe timeout must be greater than zero".to_string(),
                key: Some("probe_timeout".to_string()),
            });
        }
        if self.max_workers == Some(0) {
            return Err(Error::Config {
                message: "max workers must be at least 1".to_string(),
                key: Some("max_workers".to_string()),
            });
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    563
}

fn default_connections() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_sample_budget() -> usize {
    3
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
