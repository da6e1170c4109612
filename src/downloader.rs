//! Snapshot and template downloader
//!
//! Streams a remote artifact to disk while reporting progress. Data goes to a
//! `.part` sibling first and is renamed onto the target once complete, so a
//! failed transfer never leaves the final path populated.

use crate::error::DownloadError;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Represents the progress information during download
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: u64,
    pub speed_bytes_per_sec: f64,
}

/// Represents the result of a download
#[derive(Debug)]
pub struct DownloadResult {
    pub file_path: PathBuf,
    pub total_bytes: u64,
    pub average_speed_bytes_per_sec: f64,
}

/// Shared HTTP client for downloads and probes
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Calculate download speed in bytes per second
fn calculate_speed_bytes_per_sec(bytes: u64, duration: Duration) -> f64 {
    let secs = duration.as_secs_f64();
    if secs > 0.0 {
        bytes as f64 / secs
    } else {
        0.0
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Download `url` to `destination` with a progress callback
pub async fn download_with_progress<F>(
    client: &reqwest::Client,
    url: &str,
    destination: &Path,
    mut progress_callback: F,
) -> Result<DownloadResult, DownloadError>
where
    F: FnMut(DownloadProgress),
{
    log::debug!("Downloading {url} to {}", destination.display());

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        log::debug!("Download failed - Status: {}", response.status());
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let part = partial_path(destination);
    match stream_to_file(response, &part, &mut progress_callback).await {
        Ok((downloaded, avg_speed)) => {
            tokio::fs::rename(&part, destination).await?;
            Ok(DownloadResult {
                file_path: destination.to_path_buf(),
                total_bytes: downloaded,
                average_speed_bytes_per_sec: avg_speed,
            })
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                log::warn!("Error deleting partial file {}: {cleanup}", part.display());
            }
            Err(e)
        }
    }
}

async fn stream_to_file<F>(
    response: reqwest::Response,
    path: &Path,
    progress_callback: &mut F,
) -> Result<(u64, f64), DownloadError>
where
    F: FnMut(DownloadProgress),
{
    let total_size = response.content_length().unwrap_or(0);

    // Initial progress callback
    progress_callback(DownloadProgress {
        downloaded: 0,
        total: total_size,
        speed_bytes_per_sec: 0.0,
    });

    let mut file = File::create(path).await?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    // Variables for speed calculation and display frequency
    let start_time = Instant::now();
    let mut last_update = start_time;
    let mut last_downloaded = 0u64;
    let update_interval = Duration::from_millis(250);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        let now = Instant::now();
        if now.duration_since(last_update) >= update_interval {
            let speed = calculate_speed_bytes_per_sec(
                downloaded - last_downloaded,
                now.duration_since(last_update),
            );

            progress_callback(DownloadProgress {
                downloaded,
                total: total_size,
                speed_bytes_per_sec: speed,
            });

            last_update = now;
            last_downloaded = downloaded;
        }
    }

    file.flush().await?;

    // Final callback with average speed
    let avg_speed = calculate_speed_bytes_per_sec(downloaded, start_time.elapsed());
    progress_callback(DownloadProgress {
        downloaded,
        total: total_size,
        speed_bytes_per_sec: avg_speed,
    });

    Ok((downloaded, avg_speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn downloads_body_and_reports_progress() {
        let server = MockServer::start_async().await;
        let content = b"snapshot bytes".to_vec();
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/node.tar.zst");
                then.status(200).body(&content);
            })
            .await;

        let temp = tempdir().unwrap();
        let dest = temp.path().join("downloads").join("node.tar.zst");
        let client = http_client().unwrap();

        let mut last_seen = 0;
        let mut calls = 0;
        let result = download_with_progress(&client, &server.url("/node.tar.zst"), &dest, |p| {
            calls += 1;
            last_seen = p.downloaded;
        })
        .await
        .unwrap();

        mock.assert_async().await;
        assert_eq!(result.total_bytes, content.len() as u64);
        assert_eq!(result.file_path, dest);
        assert_eq!(std::fs::read(&dest).unwrap(), content);
        assert!(calls >= 2);
        assert_eq!(last_seen, content.len() as u64);
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn error_status_leaves_no_file_behind() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.tar.zst");
                then.status(404).body("Not Found");
            })
            .await;

        let temp = tempdir().unwrap();
        let dest = temp.path().join("missing.tar.zst");
        let client = http_client().unwrap();

        let err = download_with_progress(&client, &server.url("/missing.tar.zst"), &dest, |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status, .. } if status.as_u16() == 404));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn partial_path_is_a_sibling() {
        assert_eq!(
            partial_path(Path::new("/opt/ae/downloads/node.tar.zst")),
            PathBuf::from("/opt/ae/downloads/node.tar.zst.part")
        );
    }
}
