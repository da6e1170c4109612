//! Idempotent artifact materialization
//!
//! An artifact that already exists at its target path is never touched again.
//! Otherwise it is fetched from its source, or written from its template
//! when no source is configured.

use crate::downloader::{download_with_progress, DownloadProgress};
use crate::error::ArtifactError;
use crate::sources::ArtifactSource;
use crate::templates::Template;
use std::fs;
use std::path::{Path, PathBuf};

/// What `ensure` did to the target path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Materialized {
    /// The target existed and was left unchanged
    Existing,
    Downloaded { url: String, bytes: u64 },
    Copied { from: PathBuf },
    /// Written from a template compiled into the installer
    Packaged { name: &'static str },
}

pub struct Materializer<'a> {
    client: &'a reqwest::Client,
}

impl<'a> Materializer<'a> {
    pub fn new(client: &'a reqwest::Client) -> Self {
        Self { client }
    }

    /// Ensure `target` exists, fetching or copying it when absent
    pub async fn ensure<F>(
        &self,
        target: &Path,
        source: Option<&ArtifactSource>,
        template: Option<&Template>,
        progress: F,
    ) -> Result<Materialized, ArtifactError>
    where
        F: FnMut(DownloadProgress),
    {
        if target.exists() {
            log::info!("{} already exists, left unchanged", target.display());
            return Ok(Materialized::Existing);
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        match (source, template) {
            (Some(source @ ArtifactSource::Remote(_)), _) => {
                let url = source.fetch_url().unwrap_or_default();
                log::info!("Fetching {url} to {}", target.display());
                let result = download_with_progress(self.client, &url, target, progress).await?;
                log::info!(
                    "Saved {} bytes to {} ({:.0} B/s)",
                    result.total_bytes,
                    result.file_path.display(),
                    result.average_speed_bytes_per_sec
                );
                Ok(Materialized::Downloaded {
                    url,
                    bytes: result.total_bytes,
                })
            }
            (Some(ArtifactSource::Local(path)), _) if !path.is_file() => {
                Err(ArtifactError::SourceMissing(path.clone()))
            }
            (Some(ArtifactSource::Local(path)), _) => copy_file(path, target),
            (None, Some(Template::File(path))) if path.is_file() => copy_file(path, target),
            (None, Some(Template::Packaged { name, content })) => {
                log::info!("Writing built-in {name} to {}", target.display());
                fs::write(target, content)?;
                Ok(Materialized::Packaged { name: *name })
            }
            (None, template) => Err(ArtifactError::TemplateMissing {
                target: target.to_path_buf(),
                template: template
                    .map(Template::to_string)
                    .unwrap_or_else(|| "(none)".to_string()),
            }),
        }
    }
}

fn copy_file(from: &Path, target: &Path) -> Result<Materialized, ArtifactError> {
    log::info!("Copying {} to {}", from.display(), target.display());
    fs::copy(from, target)?;
    Ok(Materialized::Copied {
        from: from.to_path_buf(),
    })
}
