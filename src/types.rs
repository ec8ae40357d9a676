//! Core request and result types

use serde::{Deserialize, Serialize};
use std::fmt;

/// An NZB search result whose availability should be verified
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NzbCandidate {
    /// Release title as reported by the indexer
    pub title: String,

    /// URL of the NZB document
    #[serde(default)]
    pub download_url: String,

    /// Alternate link, used when `download_url` is blank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl NzbCandidate {
    /// Create a candidate from a title and download URL
    pub fn new(title: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            download_url: download_url.into(),
            link: None,
        }
    }

    /// The URL to fetch: `download_url`, else `link`, trimmed; `None` if both are blank
    pub fn resolved_url(&self) -> Option<&str> {
        let primary = self.download_url.trim();
        if !primary.is_empty() {
            return Some(primary);
        }
        self.link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// Overall verdict of a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Every checked segment was found on at least one provider
    Healthy,
    /// At least one checked segment could not be confirmed on any provider
    MissingSegments,
}

impl HealthStatus {
    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::MissingSegments => "missing_segments",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of verifying one NZB candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckResult {
    /// True when no checked segment is missing
    pub healthy: bool,

    /// `healthy` or `missing_segments`
    pub status: HealthStatus,

    /// Number of segments in the NZB
    pub total_segments: usize,

    /// Number of segments actually probed
    pub checked_segments: usize,

    /// Message-ids of checked segments that no provider confirmed (unordered)
    pub missing_segments: Vec<String>,

    /// Whether only a subset of the segments was probed
    pub sampled: bool,

    /// Name of the NZB file, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl HealthCheckResult {
    pub(crate) fn new(
        total_segments: usize,
        checked_segments: usize,
        sampled: bool,
        missing_segments: Vec<String>,
        file_name: Option<String>,
    ) -> Self {
        let healthy = missing_segments.is_empty();
        Self {
            healthy,
            status: if healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::MissingSegments
            },
            total_segments,
            checked_segments,
            missing_segments,
            sampled,
            file_name,
        }
    }
}
