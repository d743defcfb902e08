//! HTTP transport
//!
//! Streaming video transfers with resume support via `.part` files. Bodies are
//! written chunk by chunk and the finished part file is renamed into place, so
//! an interrupted transfer always leaves something the next run can continue.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT_RANGES, CONTENT_RANGE, RANGE};
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::files::{atomic_rename, create_temp_path, ensure_dir, partial_size};
use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{DownloadError, FileOperation, ProgressCallback, ProgressEvent, Result};
use crate::downloader::transport::{TransferStrategy, Transport};

/// reqwest-backed [`Transport`] for video files
///
/// Uses its own client: video hosts are not the platform API and get the
/// transfer timeouts (connect and read) rather than a whole-request limit.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    allow_resume: bool,
    read_timeout: Duration,
    progress_interval: Duration,
}

impl HttpTransport {
    /// Create a new transport from download configuration
    pub fn from_config(config: &DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                field: None,
                suggestion: None,
            })?;

        Ok(Self {
            client,
            allow_resume: config.allow_resume,
            read_timeout: config.read_timeout,
            progress_interval: config.progress_interval,
        })
    }

    fn request_error(&self, url: &str, error: reqwest::Error) -> DownloadError {
        if error.is_timeout() {
            DownloadError::NetworkTimeout {
                url: url.to_string(),
                duration_secs: self.read_timeout.as_secs(),
            }
        } else {
            DownloadError::HttpRequest {
                url: url.to_string(),
                source: error,
            }
        }
    }

    async fn prepare(&self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            ensure_dir(parent).await?;
        }
        Ok(())
    }

    /// Stream a response body into `temp_path`, returning the resulting file size
    async fn stream_to_file(
        &self,
        url: &str,
        response: Response,
        temp_path: &Path,
        start_byte: u64,
        progress: &Option<ProgressCallback>,
    ) -> Result<u64> {
        let total_size = response.content_length().map(|len| start_byte + len);
        debug!(
            "Streaming {} into {} from byte {} (total {:?})",
            url,
            temp_path.display(),
            start_byte,
            total_size
        );

        if let Some(callback) = progress {
            callback(ProgressEvent::DownloadStarted {
                url: url.to_string(),
                resumed_from: start_byte,
                total_size,
            });
        }

        let mut file = if start_byte > 0 {
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(temp_path)
                .await
                .map_err(|e| DownloadError::FileSystem {
                    path: temp_path.to_path_buf(),
                    operation: FileOperation::Write,
                    source: e,
                })?
        } else {
            fs::File::create(temp_path)
                .await
                .map_err(|e| DownloadError::FileSystem {
                    path: temp_path.to_path_buf(),
                    operation: FileOperation::Create,
                    source: e,
                })?
        };

        let mut stream = response.bytes_stream();
        let mut downloaded = start_byte;
        let start_time = Instant::now();
        let mut last_progress_time = start_time;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| self.request_error(url, e))?;

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::FileSystem {
                    path: temp_path.to_path_buf(),
                    operation: FileOperation::Write,
                    source: e,
                })?;

            downloaded += chunk.len() as u64;

            let now = Instant::now();
            if now.duration_since(last_progress_time) >= self.progress_interval {
                if let Some(callback) = progress {
                    let elapsed = start_time.elapsed().as_secs_f64();
                    let speed = if elapsed > 0.0 {
                        (downloaded - start_byte) as f64 / elapsed
                    } else {
                        0.0
                    };

                    callback(ProgressEvent::DownloadProgress {
                        url: url.to_string(),
                        downloaded,
                        total: total_size,
                        speed_bps: speed,
                    });
                }
                last_progress_time = now;
            }
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::FileSystem {
                path: temp_path.to_path_buf(),
                operation: FileOperation::Write,
                source: e,
            })?;

        file.sync_all()
            .await
            .map_err(|e| DownloadError::FileSystem {
                path: temp_path.to_path_buf(),
                operation: FileOperation::Write,
                source: e,
            })?;

        Ok(downloaded)
    }

    async fn finish(
        &self,
        url: &str,
        temp_path: &Path,
        target: &Path,
        final_size: u64,
        progress: &Option<ProgressCallback>,
    ) -> Result<u64> {
        atomic_rename(temp_path, target).await?;

        if let Some(callback) = progress {
            callback(ProgressEvent::DownloadComplete {
                url: url.to_string(),
                final_size,
            });
        }

        debug!("Transfer completed: {} bytes", final_size);
        Ok(final_size)
    }
}

/// Whether a `Content-Range` header starts where the partial file ends
fn range_starts_at(content_range: Option<&str>, start_byte: u64) -> bool {
    match content_range {
        // Missing header: trust the 206
        None => true,
        Some(value) => value
            .trim()
            .strip_prefix("bytes ")
            .and_then(|rest| rest.split('-').next())
            .and_then(|first| first.trim().parse::<u64>().ok())
            .is_some_and(|first| first == start_byte),
    }
}

/// Resource length from the `bytes */<total>` form sent with a 416
fn unsatisfied_range_total(content_range: &str) -> Option<u64> {
    content_range
        .trim()
        .strip_prefix("bytes */")
        .and_then(|total| total.trim().parse::<u64>().ok())
}

#[async_trait]
impl Transport for HttpTransport {
    async fn probe(&self, url: &str) -> TransferStrategy {
        if !self.allow_resume {
            return TransferStrategy::WholeFile;
        }

        match self.client.head(url).send().await {
            Ok(response) => {
                let accept_ranges = response
                    .headers()
                    .get(ACCEPT_RANGES)
                    .and_then(|v| v.to_str().ok());
                if accept_ranges.is_some_and(|v| v.trim().eq_ignore_ascii_case("none")) {
                    debug!("{} advertises no byte range support", url);
                    TransferStrategy::WholeFile
                } else {
                    TransferStrategy::Resumable
                }
            }
            Err(e) => {
                debug!("Probe of {} failed, assuming resumable: {}", url, e);
                TransferStrategy::Resumable
            }
        }
    }

    async fn resumable_fetch(
        &self,
        url: &str,
        target: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64> {
        self.prepare(target).await?;

        let temp_path = create_temp_path(target);
        let start_byte = partial_size(&temp_path).await?;
        if start_byte > 0 {
            debug!("Found partial file, resuming from byte {}", start_byte);
        }

        let mut request = self.client.get(url);
        if start_byte > 0 {
            request = request.header(RANGE, format!("bytes={}-", start_byte));
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;
        let status = response.status();

        if start_byte > 0 {
            match status {
                StatusCode::RANGE_NOT_SATISFIABLE => {
                    let total = response
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok())
                        .and_then(unsatisfied_range_total);
                    if total != Some(start_byte) {
                        debug!(
                            "Partial file for {} has {} bytes but the resource has {:?}",
                            url, start_byte, total
                        );
                        return Err(DownloadError::ResumeUnsupported {
                            url: url.to_string(),
                        });
                    }
                    debug!("Partial file for {} is already complete", url);
                    return self
                        .finish(url, &temp_path, target, start_byte, &progress)
                        .await;
                }
                StatusCode::PARTIAL_CONTENT => {
                    let content_range = response
                        .headers()
                        .get(CONTENT_RANGE)
                        .and_then(|v| v.to_str().ok());
                    if !range_starts_at(content_range, start_byte) {
                        return Err(DownloadError::ResumeUnsupported {
                            url: url.to_string(),
                        });
                    }
                }
                s if s.is_success() => {
                    // Full body for a ranged request: the server ignored the range
                    return Err(DownloadError::ResumeUnsupported {
                        url: url.to_string(),
                    });
                }
                _ => {}
            }
        }

        if !status.is_success() {
            return Err(DownloadError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        let final_size = self
            .stream_to_file(url, response, &temp_path, start_byte, &progress)
            .await?;
        self.finish(url, &temp_path, target, final_size, &progress)
            .await
    }

    async fn whole_file_fetch(
        &self,
        url: &str,
        target: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64> {
        self.prepare(target).await?;

        let temp_path = create_temp_path(target);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;

        if !response.status().is_success() {
            return Err(DownloadError::UnexpectedStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let final_size = self
            .stream_to_file(url, response, &temp_path, 0, &progress)
            .await?;
        self.finish(url, &temp_path, target, final_size, &progress)
            .await
    }
}
