//! Test configuration helpers for loading .env provider credentials

use nzb_health::ProviderConfig;

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Load provider configuration from environment variables
///
/// Required environment variables:
/// - `NNTP_HOST` - Server hostname
/// - `NNTP_USERNAME` - Authentication username
/// - `NNTP_PASSWORD` - Authentication password
///
/// Optional environment variables:
/// - `NNTP_PORT_SSL` - TLS port (default: 563)
pub fn load_provider_config() -> Result<ProviderConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let host = std::env::var("NNTP_HOST")
        .map_err(|_| ConfigError("NNTP_HOST not set in environment".to_string()))?;

    let port: u16 = std::env::var("NNTP_PORT_SSL")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(563);

    let username = std::env::var("NNTP_USERNAME")
        .map_err(|_| ConfigError("NNTP_USERNAME not set in environment".to_string()))?;

    let password = std::env::var("NNTP_PASSWORD")
        .map_err(|_| ConfigError("NNTP_PASSWORD not set in environment".to_string()))?;

    let mut provider = ProviderConfig::new("live", host);
    provider.port = port;
    provider.username = Some(username);
    provider.password = Some(password);
    provider.max_connections = 2;
    Ok(provider)
}

/// Check if live provider credentials are available
pub fn has_live_credentials() -> bool {
    load_provider_config().is_ok()
}
