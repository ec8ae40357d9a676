//! # nzb-health
//!
//! Pre-flight availability checks for Usenet NZB releases.
//!
//! Before a release is downloaded or streamed, this crate confirms that the
//! articles an NZB points at can still be retrieved from at least one
//! configured provider:
//!
//! - the NZB is fetched over HTTP and parsed into canonical message-ids
//! - large posts are sampled (first and last segment plus random interior ones)
//! - each sampled segment is checked with NNTP `STAT`, falling back across
//!   providers in configured order with bounded concurrency
//!
//! ## Quick Start
//!
//! ```no_run
//! use nzb_health::{HealthCheckConfig, HealthCheckService, NzbCandidate, ProviderConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut provider = ProviderConfig::new("Primary", "news.example.com");
//!     provider.username = Some("user".to_string());
//!     provider.password = Some("pass".to_string());
//!
//!     let service = HealthCheckService::new(HealthCheckConfig::default(), Arc::new(vec![provider]))?;
//!
//!     let candidate = NzbCandidate::new("Some.Release.1080p", "https://indexer.example/get/123.nzb");
//!     let result = service
//!         .check_health(&candidate, &CancellationToken::new())
//!         .await?;
//!
//!     println!(
//!         "{}: {} of {} segments checked, {} missing",
//!         result.status,
//!         result.checked_segments,
//!         result.total_segments,
//!         result.missing_segments.len()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// NZB document parsing
pub mod nzb;
/// Segment availability probes (pool and direct NNTP dial)
pub mod probe;
/// Segment sampling
pub mod sampling;
/// Health check service
pub mod service;
/// Core request and result types
pub mod types;
/// File naming helpers
pub mod utils;
/// Concurrent multi-provider verification
pub mod verifier;

// Re-export commonly used types
pub use config::{HealthCheckConfig, ProviderConfig, ProviderSource};
pub use error::{Error, PoolError, ProbeError, Result, ToHttpStatus};
pub use nzb::{ParsedNzb, parse_nzb};
pub use probe::{Dialer, PoolManager, SegmentPool, SegmentProbe, StatSession};
pub use sampling::{SamplingPlan, plan_samples};
pub use service::{HealthCheckOptions, HealthCheckService};
pub use types::{HealthCheckResult, HealthStatus, NzbCandidate};
pub use verifier::SegmentVerifier;
