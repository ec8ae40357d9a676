//! Top-level health check entry point
//!
//! A check loads the usable providers, fetches the NZB (unless it was handed
//! in already), parses it, samples the segments to probe and verifies them
//! across providers.

use crate::config::{HealthCheckConfig, ProviderConfig, ProviderSource, enabled_providers};
use crate::error::{Error, Result};
use crate::nzb::{parse_nzb, summarize_subjects};
use crate::probe::{Dialer, NntpDialer, PoolManager, PoolProbe};
use crate::sampling::plan_samples;
use crate::types::{HealthCheckResult, NzbCandidate};
use crate::utils::nzb_file_name;
use crate::verifier::SegmentVerifier;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Maximum number of response-body bytes quoted in a fetch error
const MAX_ERROR_BODY_BYTES: usize = 2048;

/// Optional collaborators for [`HealthCheckService`]
///
/// Everything left as `None` gets a production default: a fresh
/// `reqwest::Client`, a TLS-capable [`NntpDialer`], no pool and an
/// entropy-seeded RNG.
#[derive(Default)]
pub struct HealthCheckOptions {
    /// HTTP client used to fetch NZB documents
    pub http_client: Option<reqwest::Client>,

    /// Dialer used for direct provider checks
    pub dialer: Option<Arc<dyn Dialer>>,

    /// Shared provider pool, consulted only when `use_pool` is enabled
    pub pool_manager: Option<Arc<dyn PoolManager>>,

    /// Fixed seed for segment sampling; every check uses the same draw
    pub rng_seed: Option<u64>,
}

/// Verifies NZB candidates against the configured usenet providers
pub struct HealthCheckService {
    config: HealthCheckConfig,
    providers: Arc<dyn ProviderSource>,
    http: reqwest::Client,
    dialer: Arc<dyn Dialer>,
    pool_manager: Option<Arc<dyn PoolManager>>,
    rng_seed: Option<u64>,
}

impl HealthCheckService {
    /// Create a service with production collaborators
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` is invalid or the HTTP/TLS
    /// clients cannot be initialised.
    pub fn new(config: HealthCheckConfig, providers: Arc<dyn ProviderSource>) -> Result<Self> {
        Self::with_options(config, providers, HealthCheckOptions::default())
    }

    /// Create a service with some collaborators replaced
    ///
    /// # Errors
    ///
    /// Same as [`HealthCheckService::new`].
    pub fn with_options(
        config: HealthCheckConfig,
        providers: Arc<dyn ProviderSource>,
        options: HealthCheckOptions,
    ) -> Result<Self> {
        config.validate()?;

        let http = match options.http_client {
            Some(client) => client,
            None => reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(|e| Error::Config {
                    message: format!("failed to create HTTP client: {e}"),
                    key: None,
                })?,
        };

        let dialer: Arc<dyn Dialer> = match options.dialer {
            Some(dialer) => dialer,
            None => Arc::new(NntpDialer::new(config.probe_timeout)),
        };

        Ok(Self {
            config,
            providers,
            http,
            dialer,
            pool_manager: options.pool_manager,
            rng_seed: options.rng_seed,
        })
    }

    /// Current configuration
    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }

    /// Fetch the candidate's NZB and verify its segments
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when no provider is usable (checked before any I/O)
    /// - [`Error::Fetch`] when the candidate has no URL or the download fails
    /// - [`Error::InvalidNzb`] when the document cannot be parsed
    /// - [`Error::Cancelled`] when `cancel` fires
    pub async fn check_health(
        &self,
        candidate: &NzbCandidate,
        cancel: &CancellationToken,
    ) -> Result<HealthCheckResult> {
        let started = Instant::now();
        let providers = self.usable_providers()?;

        let url = candidate
            .resolved_url()
            .ok_or_else(|| Error::Fetch("nzb result is missing a download URL".to_string()))?;

        tracing::info!(
            title = %candidate.title.trim(),
            source = %source_host(url),
            prefetched = false,
            "Starting NZB health check"
        );

        let (nzb, file_name) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            fetched = self.fetch_nzb(url, &candidate.title) => fetched?,
        };

        self.evaluate(candidate, &nzb, Some(file_name), &providers, cancel, started)
            .await
    }

    /// Verify an NZB payload that the caller already downloaded
    ///
    /// # Errors
    ///
    /// As [`HealthCheckService::check_health`], except that no fetch happens;
    /// an empty payload is [`Error::InvalidNzb`].
    pub async fn check_health_with_nzb(
        &self,
        candidate: &NzbCandidate,
        nzb: &[u8],
        file_name: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<HealthCheckResult> {
        let started = Instant::now();
        let providers = self.usable_providers()?;

        tracing::info!(
            title = %candidate.title.trim(),
            source = %candidate.resolved_url().map(source_host).unwrap_or_default(),
            prefetched = true,
            "Starting NZB health check"
        );

        if nzb.is_empty() {
            return Err(Error::InvalidNzb("nzb payload is empty".to_string()));
        }

        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        self.evaluate(candidate, nzb, file_name, &providers, cancel, started)
            .await
    }

    async fn evaluate(
        &self,
        candidate: &NzbCandidate,
        nzb: &[u8],
        file_name: Option<String>,
        providers: &[ProviderConfig],
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<HealthCheckResult> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let parsed = parse_nzb(nzb)?;
        if !parsed.subjects.is_empty() {
            tracing::debug!(
                title = %candidate.title.trim(),
                count = parsed.subjects.len(),
                files = %summarize_subjects(&parsed.subjects),
                "NZB files"
            );
        }
        if parsed.has_archive_hint {
            tracing::debug!(title = %candidate.title.trim(), "NZB contains 7z archive parts");
        }

        let mut rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let plan = plan_samples(parsed.total_segments, self.config.sample_budget, &mut rng);
        let sampled_ids: Vec<String> = plan
            .indices
            .iter()
            .filter_map(|&i| parsed.segment_ids.get(i).cloned())
            .collect();

        let missing = self
            .verifier(providers)
            .verify_all(&sampled_ids, &parsed.groups, providers, cancel)
            .await?;

        let result = HealthCheckResult::new(
            parsed.total_segments,
            sampled_ids.len(),
            plan.sampled,
            missing,
            file_name,
        );

        tracing::info!(
            title = %candidate.title.trim(),
            status = %result.status,
            sampled = result.sampled,
            checked = result.checked_segments,
            total = result.total_segments,
            missing = result.missing_segments.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            file_name = result.file_name.as_deref().unwrap_or(""),
            "NZB health check finished"
        );

        Ok(result)
    }

    fn usable_providers(&self) -> Result<Vec<ProviderConfig>> {
        let providers = enabled_providers(&self.providers.load_providers()?);
        if providers.is_empty() {
            return Err(Error::no_providers());
        }
        Ok(providers)
    }

    fn verifier(&self, providers: &[ProviderConfig]) -> SegmentVerifier {
        let verifier = SegmentVerifier::new(
            Arc::clone(&self.dialer),
            self.config.worker_limit(providers),
            self.config.probe_timeout,
        );

        if self.config.use_pool
            && let Some(manager) = &self.pool_manager
        {
            match manager.get_pool() {
                Ok(pool) => return verifier.with_pool(Arc::new(PoolProbe::new(pool))),
                Err(e) => {
                    tracing::warn!(error = %e, "Provider pool unavailable, dialing providers directly");
                }
            }
        }

        verifier
    }

    async fn fetch_nzb(&self, url: &str, title: &str) -> Result<(Vec<u8>, String)> {
        let timeout = self.config.request_timeout;
        let response = self
            .http
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Fetch(format!(
                        "timeout fetching NZB from {} (exceeded {} seconds)",
                        source_host(url),
                        timeout.as_secs()
                    ))
                } else if e.is_connect() {
                    Error::Fetch(format!("connection failed for {}: {e}", source_host(url)))
                } else {
                    Error::Fetch(format!("download nzb failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let snippet = error_body_snippet(response).await;
            return Err(Error::Fetch(format!(
                "download nzb failed: {status}: {}",
                snippet.trim()
            )));
        }

        let file_name = nzb_file_name(response.headers(), url, title);
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read NZB response body: {e}")))?;

        tracing::debug!(bytes = body.len(), file_name = %file_name, "Fetched NZB");

        Ok((body.to_vec(), file_name))
    }
}

/// Leading part of an error response body, read no further than needed
async fn error_body_snippet(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(MAX_ERROR_BODY_BYTES - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to read error response body");
                break;
            }
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

/// Host of the NZB URL, for logs (the full URL usually carries an API key)
fn source_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
