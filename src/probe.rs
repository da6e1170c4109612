//! Remote size estimation
//!
//! Issues HEAD requests against resolved snapshot URLs to show the operator
//! how much will be downloaded. Every failure degrades to an unknown size.

use crate::error::ProbeError;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const GIB: u64 = 1024 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

/// Extracted data plus working overhead over the compressed total
const FREE_SPACE_MULTIPLIER: f64 = 2.5;

/// What is known about a remote artifact before downloading it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifactDescriptor {
    pub url: String,
    pub byte_size: Option<u64>,
}

impl RemoteArtifactDescriptor {
    pub fn human_readable_size(&self) -> String {
        self.byte_size
            .map(format_size)
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Aggregate over the artifacts that will be downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceEstimate {
    pub total_bytes: u64,
    pub recommended_free_bytes: u64,
}

/// Probe results shown before confirmation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeSummary {
    pub node: Option<RemoteArtifactDescriptor>,
    pub mdw: Option<RemoteArtifactDescriptor>,
    pub estimate: Option<SpaceEstimate>,
}

/// Sum the probed sizes; any unknown size means no estimate
pub fn estimate_space(sizes: &[Option<u64>]) -> Option<SpaceEstimate> {
    if sizes.is_empty() {
        return None;
    }
    let total_bytes = sizes
        .iter()
        .try_fold(0u64, |acc, size| size.map(|s| acc.saturating_add(s)))?;
    Some(SpaceEstimate {
        total_bytes,
        recommended_free_bytes: (total_bytes as f64 * FREE_SPACE_MULTIPLIER).round() as u64,
    })
}

/// Render a byte count in binary GB above 1 GiB, MB below
pub fn format_size(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2} GB", bytes as f64 / GIB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}

pub struct SizeProber {
    client: reqwest::Client,
}

impl SizeProber {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn content_length_of(&self, url: &str) -> Result<u64, ProbeError> {
        let response = self
            .client
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProbeError::Status(response.status()));
        }
        content_length(response.headers()).ok_or(ProbeError::NoLength)
    }

    /// Probe one URL; failures are logged and reported as an unknown size
    pub async fn probe(&self, url: &str) -> RemoteArtifactDescriptor {
        let byte_size = match self.content_length_of(url).await {
            Ok(size) => Some(size),
            Err(e) => {
                log::warn!("Unable to determine size of {url}: {e}");
                None
            }
        };
        RemoteArtifactDescriptor {
            url: url.to_string(),
            byte_size,
        }
    }

    /// Probe whichever archives are going to be downloaded
    pub async fn summarize(&self, node_url: Option<&str>, mdw_url: Option<&str>) -> SizeSummary {
        let node = match node_url {
            Some(url) => Some(self.probe(url).await),
            None => None,
        };
        let mdw = match mdw_url {
            Some(url) => Some(self.probe(url).await),
            None => None,
        };

        let sizes: Vec<Option<u64>> = node
            .iter()
            .chain(mdw.iter())
            .map(|d| d.byte_size)
            .collect();

        SizeSummary {
            estimate: estimate_space(&sizes),
            node,
            mdw,
        }
    }
}
