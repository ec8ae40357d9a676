//! Segment availability probes
//!
//! A [`SegmentProbe`] answers one question: does a provider have this
//! article? Two strategies exist:
//!
//! - [`PoolProbe`] asks a shared, externally managed provider pool. A pool may
//!   try several providers internally, so its
//!   [`PoolError::NotFoundInProviders`] answer is definitive.
//! - [`DirectDialProbe`] opens a fresh connection to one provider with that
//!   provider's credentials and issues `STAT <message-id>`.

mod nntp;

pub use nntp::{NntpClientSession, NntpDialer};

use crate::config::ProviderConfig;
use crate::error::{PoolError, ProbeError};
use crate::nzb::normalize_message_id;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// NNTP response code for "article exists" (STAT)
pub const ARTICLE_EXISTS: u16 = 223;

/// NNTP response code for "no such article"
pub const NO_SUCH_ARTICLE: u16 = 430;

/// Canonical form of `message_id`, refusing ids that cannot go on a command line
fn checked_id(message_id: &str) -> Result<String, ProbeError> {
    let id = normalize_message_id(message_id);
    if id.is_empty() {
        return Err(ProbeError::InvalidMessageId(message_id.to_string()));
    }
    Ok(id)
}

/// Abstraction over article existence checks, enabling testability.
#[async_trait::async_trait]
pub trait SegmentProbe: Send + Sync {
    /// Check whether the article is present
    ///
    /// `Ok(false)` means the probe saw the article as absent. Whether that is
    /// conclusive is up to the caller; only an error for which
    /// [`ProbeError::is_definitive_absence`] holds proves absence across providers.
    async fn check_availability(
        &self,
        message_id: &str,
        groups: &[String],
    ) -> Result<bool, ProbeError>;

    /// Name used in log output
    fn label(&self) -> &str;
}

/// A shared, multiplexed connection pool over all configured providers
#[async_trait::async_trait]
pub trait SegmentPool: Send + Sync {
    /// Issue STAT through the pool, returning the NNTP status code
    async fn stat(&self, message_id: &str, groups: &[String]) -> Result<u16, PoolError>;
}

/// Owner of the shared pool (configured and rebuilt outside this crate)
pub trait PoolManager: Send + Sync {
    /// Current pool, if one is configured
    fn get_pool(&self) -> Result<Arc<dyn SegmentPool>, PoolError>;
}

/// [`SegmentProbe`] backed by the shared provider pool
pub struct PoolProbe {
    pool: Arc<dyn SegmentPool>,
}

impl PoolProbe {
    /// Wrap a pool handle
    pub fn new(pool: Arc<dyn SegmentPool>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SegmentProbe for PoolProbe {
    async fn check_availability(
        &self,
        message_id: &str,
        groups: &[String],
    ) -> Result<bool, ProbeError> {
        let code = self.pool.stat(&checked_id(message_id)?, groups).await?;
        Ok(code == ARTICLE_EXISTS)
    }

    fn label(&self) -> &str {
        "pool"
    }
}

/// An authenticated NNTP session able to answer STAT
#[async_trait::async_trait]
pub trait StatSession: Send {
    /// Issue `STAT <message-id>`; `true` for 223, `false` for 430
    async fn stat(&mut self, message_id: &str) -> Result<bool, ProbeError>;

    /// Politely end the session
    async fn quit(&mut self) -> Result<(), ProbeError>;
}

/// Opens [`StatSession`]s to individual providers
#[async_trait::async_trait]
pub trait Dialer: Send + Sync {
    /// Connect and authenticate to `provider`
    async fn dial(&self, provider: &ProviderConfig) -> Result<Box<dyn StatSession>, ProbeError>;
}

/// [`SegmentProbe`] that dials a single provider for every check
///
/// At most `max_connections` sessions to the provider are open at once;
/// further checks wait for a slot. The optional timeout starts once a slot
/// is held and covers dial, STAT and QUIT.
pub struct DirectDialProbe {
    provider: ProviderConfig,
    dialer: Arc<dyn Dialer>,
    connections: Semaphore,
    timeout: Option<Duration>,
}

impl DirectDialProbe {
    /// Probe `provider` through `dialer`
    pub fn new(provider: ProviderConfig, dialer: Arc<dyn Dialer>) -> Self {
        let slots = provider.max_connections.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            provider,
            dialer,
            connections: Semaphore::new(slots),
            timeout: None,
        }
    }

    /// Bound each provider exchange by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The provider this probe talks to
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    async fn stat_once(&self, message_id: &str) -> Result<bool, ProbeError> {
        let message_id = checked_id(message_id)?;
        let mut session = self.dialer.dial(&self.provider).await?;
        let present = session.stat(&message_id).await;
        if let Err(e) = session.quit().await {
            tracing::debug!(provider = self.provider.label(), error = %e, "QUIT failed");
        }
        present
    }
}

#[async_trait::async_trait]
impl SegmentProbe for DirectDialProbe {
    async fn check_availability(
        &self,
        message_id: &str,
        _groups: &[String],
    ) -> Result<bool, ProbeError> {
        let _slot = self
            .connections
            .acquire()
            .await
            .map_err(|e| ProbeError::Connect {
                host: self.provider.host.clone(),
                reason: format!("connection limiter closed: {e}"),
            })?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.stat_once(message_id))
                .await
                .unwrap_or(Err(ProbeError::Timeout(limit))),
            None => self.stat_once(message_id).await,
        }
    }

    fn label(&self) -> &str {
        self.provider.label()
    }
}
