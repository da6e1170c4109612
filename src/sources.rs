//! Snapshot location resolution
//!
//! Default archive locations come from a fixed table keyed by network and
//! variant. Overrides are honoured verbatim; anything without a remote scheme
//! is a pre-existing local archive and is never downloaded.

use crate::network::{Network, Variant};
use std::fmt;
use std::path::PathBuf;

const SNAPSHOT_BASE_URL: &str = "https://aeternity-database-backups.s3.eu-central-1.amazonaws.com/";

const REMOTE_SCHEMES: [&str; 3] = ["http://", "https://", "s3://"];

/// Where an artifact comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    Remote(String),
    Local(PathBuf),
}

impl ArtifactSource {
    /// Classify a raw URL or path
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if is_remote(raw) {
            ArtifactSource::Remote(raw.to_string())
        } else {
            ArtifactSource::Local(PathBuf::from(raw))
        }
    }

    /// URL reqwest can talk to; `s3://` goes through the bucket's HTTPS endpoint
    pub fn fetch_url(&self) -> Option<String> {
        match self {
            ArtifactSource::Remote(url) => Some(to_fetch_url(url)),
            ArtifactSource::Local(_) => None,
        }
    }

    /// File name used when the artifact is stored under `downloads/`
    pub fn file_name(&self) -> Option<String> {
        match self {
            ArtifactSource::Remote(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                without_query
                    .rsplit('/')
                    .next()
                    .filter(|name| !name.is_empty() && !name.contains(':'))
                    .map(str::to_string)
            }
            ArtifactSource::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string()),
        }
    }
}

impl fmt::Display for ArtifactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactSource::Remote(url) => write!(f, "{url}"),
            ArtifactSource::Local(path) => write!(f, "{} (local)", path.display()),
        }
    }
}

pub fn is_remote(raw: &str) -> bool {
    let lower = raw.trim().to_lowercase();
    REMOTE_SCHEMES.iter().any(|scheme| lower.starts_with(scheme))
}

fn to_fetch_url(url: &str) -> String {
    match url.strip_prefix("s3://") {
        Some(rest) => {
            let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
            format!("https://{bucket}.s3.amazonaws.com/{key}")
        }
        None => url.to_string(),
    }
}

/// Default node snapshot file for a network and variant
fn node_archive_name(network: Network, variant: Variant) -> &'static str {
    match (network, variant) {
        (Network::Mainnet, Variant::Full) => "main_v-1_full_latest.tar.zst",
        (Network::Mainnet, Variant::Light) => "main_v-1_light_latest.tar.zst",
        (Network::Uat, Variant::Full) => "uat_v-1_full_latest.tar.zst",
        (Network::Uat, Variant::Light) => "uat_v-1_light_latest.tar.zst",
    }
}

/// Default indexer snapshot file for a network
fn mdw_archive_name(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "mdw_main_latest.tar.zst",
        Network::Uat => "mdw_uat_latest.tar.zst",
    }
}

/// Resolve the node archive source, honouring an override verbatim
pub fn node_archive_source(
    network: Network,
    variant: Variant,
    override_url: Option<&str>,
) -> ArtifactSource {
    match override_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => ArtifactSource::classify(url),
        None => ArtifactSource::Remote(format!(
            "{SNAPSHOT_BASE_URL}{}",
            node_archive_name(network, variant)
        )),
    }
}

/// Resolve the indexer archive source, honouring an override verbatim
pub fn mdw_archive_source(network: Network, override_url: Option<&str>) -> ArtifactSource {
    match override_url.filter(|url| !url.trim().is_empty()) {
        Some(url) => ArtifactSource::classify(url),
        None => ArtifactSource::Remote(format!("{SNAPSHOT_BASE_URL}{}", mdw_archive_name(network))),
    }
}

/// Manifest and service config have no default location: only an override counts
pub fn optional_source(override_url: Option<&str>) -> Option<ArtifactSource> {
    override_url
        .filter(|url| !url.trim().is_empty())
        .map(ArtifactSource::classify)
}
