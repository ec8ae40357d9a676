//! Direct-dial STAT sessions over `nntp-rs`
//!
//! [`NntpDialer`] opens one [`nntp_rs::NntpClient`] per check (implicit TLS,
//! `AUTHINFO` when the provider has credentials) and hands it out as a
//! [`StatSession`].

use super::{Dialer, StatSession};
use crate::config::ProviderConfig;
use crate::error::ProbeError;
use nntp_rs::{ArticleInfo, NntpClient, NntpError};
use std::sync::Arc;
use std::time::Duration;

/// Whether an NNTP error means the article does not exist on the server
///
/// 430 (and 423 for number lookups) come back as `NoSuchArticle`; some
/// servers answer with a bare protocol error carrying the code instead.
fn is_missing_article_error(err: &NntpError) -> bool {
    match err {
        NntpError::NoSuchArticle(_) => true,
        NntpError::Protocol { code, .. } => *code == super::NO_SUCH_ARTICLE,
        _ => false,
    }
}

/// Map a STAT result to presence: found, definitively missing, or an error
fn stat_outcome(
    result: nntp_rs::Result<ArticleInfo>,
    host: &str,
    timeout: Duration,
) -> Result<bool, ProbeError> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if is_missing_article_error(&e) => Ok(false),
        Err(NntpError::Io(e)) => Err(ProbeError::Io(e)),
        Err(NntpError::Timeout) => Err(ProbeError::Timeout(timeout)),
        Err(e) => Err(ProbeError::Protocol {
            host: host.to_string(),
            response: e.to_string(),
        }),
    }
}

/// Map a failure while connecting or authenticating
fn dial_error(err: NntpError, host: &str, timeout: Duration) -> ProbeError {
    match err {
        NntpError::AuthFailed(response) => ProbeError::Auth {
            host: host.to_string(),
            response,
        },
        NntpError::Timeout => ProbeError::Timeout(timeout),
        NntpError::Io(e) => ProbeError::Connect {
            host: host.to_string(),
            reason: e.to_string(),
        },
        NntpError::Tls(reason) => ProbeError::Connect {
            host: host.to_string(),
            reason,
        },
        NntpError::ConnectionClosed => ProbeError::Connect {
            host: host.to_string(),
            reason: "connection closed before greeting".to_string(),
        },
        other => ProbeError::Protocol {
            host: host.to_string(),
            response: other.to_string(),
        },
    }
}

/// An authenticated client, used for STAT and then closed
pub struct NntpClientSession {
    client: NntpClient,
    host: String,
    timeout: Duration,
}

#[async_trait::async_trait]
impl StatSession for NntpClientSession {
    async fn stat(&mut self, message_id: &str) -> Result<bool, ProbeError> {
        let result = self.client.stat(message_id).await;
        stat_outcome(result, &self.host, self.timeout)
    }

    async fn quit(&mut self) -> Result<(), ProbeError> {
        self.client
            .quit()
            .await
            .map_err(|e| dial_error(e, &self.host, self.timeout))
    }
}

/// Production [`Dialer`]: a fresh `nntp-rs` client per provider check
pub struct NntpDialer {
    connect_timeout: Duration,
}

impl NntpDialer {
    /// Create a dialer whose connect + greeting + auth is bounded by `connect_timeout`
    ///
    /// TLS certificates are verified against the Mozilla root bundle.
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn connect(&self, provider: &ProviderConfig) -> Result<NntpClient, NntpError> {
        let mut client = NntpClient::connect(Arc::new(provider.into())).await?;
        if provider.username.as_deref().is_some_and(|u| !u.is_empty()) {
            client.authenticate().await?;
        }
        Ok(client)
    }
}

#[async_trait::async_trait]
impl Dialer for NntpDialer {
    async fn dial(&self, provider: &ProviderConfig) -> Result<Box<dyn StatSession>, ProbeError> {
        let host = provider.host.trim();
        let client = match tokio::time::timeout(self.connect_timeout, self.connect(provider)).await
        {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(dial_error(e, host, self.connect_timeout)),
            Err(_) => return Err(ProbeError::Timeout(self.connect_timeout)),
        };
        tracing::debug!(provider = provider.label(), "Connected for STAT");
        Ok(Box::new(NntpClientSession {
            client,
            host: host.to_string(),
            timeout: self.connect_timeout,
        }))
    }
}
