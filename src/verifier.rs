//! Concurrent multi-provider segment verification
//!
//! Every segment is checked independently, with at most `worker_limit` checks
//! in flight. Per segment the fallback chain is:
//!
//! 1. If a pool probe is configured, ask it first. A definitive "not found in
//!    any provider" answer marks the segment missing without further dials.
//! 2. Otherwise (or if the pool answer was inconclusive) dial each provider in
//!    configured order and stop at the first one that has the article.
//! 3. If no provider confirms the article, it is reported missing.
//!
//! Direct dials also respect each provider's `max_connections`: a check waits
//! for a free connection slot before its timeout starts.

use crate::config::{ProviderConfig, enabled_providers};
use crate::error::{Error, ProbeError, Result};
use crate::probe::{Dialer, DirectDialProbe, SegmentProbe};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Checks a set of segments across providers with bounded concurrency
pub struct SegmentVerifier {
    dialer: Arc<dyn Dialer>,
    pool: Option<Arc<dyn SegmentProbe>>,
    worker_limit: usize,
    probe_timeout: Duration,
}

impl SegmentVerifier {
    /// Create a verifier that dials providers through `dialer`
    pub fn new(dialer: Arc<dyn Dialer>, worker_limit: usize, probe_timeout: Duration) -> Self {
        Self {
            dialer,
            pool: None,
            worker_limit: worker_limit.max(1),
            probe_timeout,
        }
    }

    /// Consult `pool` before dialing providers directly
    pub fn with_pool(mut self, pool: Arc<dyn SegmentProbe>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Return the message-ids from `segment_ids` that no provider could confirm
    ///
    /// Duplicate ids are checked once. The order of the returned ids is
    /// unspecified.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no provider in `providers` is usable
    /// - [`Error::Cancelled`] if `cancel` fires; in-flight probes are dropped
    ///   and no partial result is returned
    pub async fn verify_all(
        &self,
        segment_ids: &[String],
        groups: &[String],
        providers: &[ProviderConfig],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if segment_ids.is_empty() {
            return Ok(Vec::new());
        }

        let enabled = enabled_providers(providers);
        if enabled.is_empty() {
            return Err(Error::no_providers());
        }
        let direct: Vec<DirectDialProbe> = enabled
            .into_iter()
            .map(|provider| {
                DirectDialProbe::new(provider, Arc::clone(&self.dialer))
                    .with_timeout(self.probe_timeout)
            })
            .collect();

        let mut seen = HashSet::new();
        let unique: Vec<&String> = segment_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .collect();

        let direct = &direct;
        let mut checks = stream::iter(unique)
            .map(|segment_id| async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    present = self.segment_present(segment_id, groups, direct) => {
                        Ok((!present).then(|| segment_id.clone()))
                    }
                }
            })
            .buffer_unordered(self.worker_limit);

        let mut missing = Vec::new();
        while let Some(outcome) = checks.next().await {
            if let Some(segment_id) = outcome? {
                missing.push(segment_id);
            }
        }

        if !missing.is_empty() {
            tracing::warn!(
                missing = missing.len(),
                checked = seen.len(),
                "Segments missing from all providers"
            );
        }

        Ok(missing)
    }

    async fn segment_present(
        &self,
        segment_id: &str,
        groups: &[String],
        direct: &[DirectDialProbe],
    ) -> bool {
        if let Some(pool) = &self.pool {
            match self.bounded(pool.check_availability(segment_id, groups)).await {
                Ok(true) => return true,
                Ok(false) => {
                    tracing::debug!(
                        segment = segment_id,
                        "Pool could not confirm segment, retrying with fresh connections"
                    );
                }
                Err(e) if e.is_definitive_absence() => {
                    tracing::debug!(
                        segment = segment_id,
                        "Pool confirmed segment missing from all providers"
                    );
                    return false;
                }
                Err(e) => {
                    tracing::warn!(
                        segment = segment_id,
                        error = %e,
                        "Pool check failed, retrying with fresh connections"
                    );
                }
            }
        }

        for probe in direct {
            match probe.check_availability(segment_id, groups).await {
                Ok(true) => return true,
                Ok(false) => {
                    tracing::debug!(
                        segment = segment_id,
                        provider = probe.label(),
                        "Segment not found on provider, trying next provider"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        segment = segment_id,
                        provider = probe.label(),
                        error = %e,
                        "Provider check failed, trying next provider"
                    );
                }
            }
        }

        tracing::warn!(segment = segment_id, "Segment missing from all providers");
        false
    }

    async fn bounded<F>(&self, probe: F) -> std::result::Result<bool, ProbeError>
    where
        F: Future<Output = std::result::Result<bool, ProbeError>>,
    {
        match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.probe_timeout)),
        }
    }
}
