//! Sequential per-lecture download pipeline
//!
//! The call chain for one lecture flows as follows:
//!
//! DownloadPipeline::run
//! ↓
//! existing file check (skip)
//! ↓
//! SourceResolver::resolve
//! ↓
//! Transport::probe → resumable_fetch, or whole_file_fetch on fallback
//!
//! Every per-lecture error ends in that lecture's [`LectureReport`]; the run
//! only stops early when cancelled.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::curriculum::SelectedLecture;
use crate::downloader::config::DownloadConfig;
use crate::downloader::core::files::ensure_dir;
use crate::downloader::core::{
    DownloadError, DownloadTarget, FailureReason, LectureOutcome, LectureReport, ProgressCallback,
    ProgressEvent, Result, SkipReason,
};
use crate::downloader::sources::SourceResolver;
use crate::downloader::transport::{TransferStrategy, Transport};

/// Drives resolution and transfer for a sequence of selected lectures
pub struct DownloadPipeline {
    resolver: Arc<dyn SourceResolver>,
    transport: Arc<dyn Transport>,
    config: DownloadConfig,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for DownloadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadPipeline")
            .field("config", &self.config)
            .field("has_progress", &self.progress.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl DownloadPipeline {
    pub fn new(
        resolver: Arc<dyn SourceResolver>,
        transport: Arc<dyn Transport>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            resolver,
            transport,
            config,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Use an externally owned token, e.g. one cancelled by a signal handler
    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.progress {
            callback(event);
        }
    }

    /// Download every lecture in order, one at a time
    ///
    /// Returns one report per processed lecture in input order. Lectures after
    /// a cancellation are not processed and get no report.
    pub async fn run<I>(&self, lectures: I, dest_root: Option<&Path>) -> Vec<LectureReport>
    where
        I: IntoIterator<Item = SelectedLecture>,
    {
        let mut reports = Vec::new();

        for lecture in lectures {
            if self.cancel.is_cancelled() {
                info!("Run cancelled after {} lectures", reports.len());
                break;
            }

            let report = self.process(lecture, dest_root).await;
            let cancelled = report.outcome == LectureOutcome::Failed(FailureReason::Cancelled);
            reports.push(report);
            if cancelled {
                info!("Run cancelled during a transfer; partial file kept for resume");
                break;
            }
        }

        reports
    }

    async fn process(&self, lecture: SelectedLecture, dest_root: Option<&Path>) -> LectureReport {
        let target = DownloadTarget::for_lecture(&lecture, dest_root);
        let path = target.path();
        let label = lecture.label();

        let outcome = self.download_lecture(&lecture, &target).await;
        match &outcome {
            LectureOutcome::Downloaded { bytes } => {
                info!("Downloaded {} ({} bytes)", label, bytes)
            }
            LectureOutcome::Skipped(reason) => {
                info!("Skipping {}: {}", label, reason);
                self.emit(ProgressEvent::LectureSkipped {
                    label: label.clone(),
                    reason: reason.to_string(),
                });
            }
            LectureOutcome::Failed(reason) => {
                warn!("Cannot download lecture \"{}\": {:?}", label, reason)
            }
        }

        LectureReport {
            lecture,
            target: path,
            outcome,
        }
    }

    async fn download_lecture(
        &self,
        lecture: &SelectedLecture,
        target: &DownloadTarget,
    ) -> LectureOutcome {
        let path = target.path();

        match fs::try_exists(&path).await {
            Ok(true) => return LectureOutcome::Skipped(SkipReason::Exists),
            Ok(false) => {}
            Err(e) => return LectureOutcome::Failed(FailureReason::Transfer(e.to_string())),
        }

        let resolved = self
            .cancellable(
                lecture.lecture_id.as_str(),
                self.resolver
                    .resolve(&lecture.lecture_id, self.config.prefer_high_quality),
            )
            .await;
        let source = match resolved {
            Ok(source) => source,
            Err(DownloadError::Cancelled { .. }) => {
                return LectureOutcome::Failed(FailureReason::Cancelled);
            }
            Err(e) => {
                let reason = match e {
                    DownloadError::Resolution { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.emit(ProgressEvent::Warning {
                    url: lecture.lecture_id.to_string(),
                    message: format!("Cannot download lecture \"{}\": {}", lecture.lecture_title, reason),
                });
                return LectureOutcome::Failed(FailureReason::Resolution(reason));
            }
        };

        if let Err(e) = ensure_dir(&target.directory).await {
            return LectureOutcome::Failed(FailureReason::Transfer(e.to_string()));
        }

        self.emit(ProgressEvent::LectureStarted {
            label: lecture.label(),
            path: path.clone(),
        });

        let transferred = self
            .cancellable(&source.url, self.transfer(&source.url, &path))
            .await;

        match transferred {
            Ok(bytes) => LectureOutcome::Downloaded { bytes },
            Err(DownloadError::Cancelled { .. }) => {
                self.emit(ProgressEvent::Cancelled {
                    url: source.url.clone(),
                });
                LectureOutcome::Failed(FailureReason::Cancelled)
            }
            Err(e) => {
                self.emit(ProgressEvent::Error {
                    url: source.url.clone(),
                    error: e.to_string(),
                });
                LectureOutcome::Failed(FailureReason::Transfer(e.to_string()))
            }
        }
    }

    /// Race `operation` against the cancellation token
    async fn cancellable<T, F>(&self, url: &str, operation: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DownloadError::Cancelled {
                reason: "interrupted by user".to_string(),
                url: Some(url.to_string()),
            }),
            result = operation => result,
        }
    }

    /// Run the chosen transfer arm, moving to the whole-file arm once on a capability error
    async fn transfer(&self, url: &str, path: &Path) -> Result<u64> {
        let strategy = self.transport.probe(url).await;
        debug!("Transfer strategy for {}: {:?}", url, strategy);

        match strategy {
            TransferStrategy::Resumable => {
                match self
                    .transport
                    .resumable_fetch(url, path, self.progress.clone())
                    .await
                {
                    Err(e) if e.is_capability_error() => {
                        warn!("Resumable transfer unavailable, fetching whole file: {}", e);
                        self.emit(ProgressEvent::FallbackTransfer {
                            url: url.to_string(),
                            reason: e.to_string(),
                        });
                        self.transport
                            .whole_file_fetch(url, path, self.progress.clone())
                            .await
                    }
                    other => other,
                }
            }
            TransferStrategy::WholeFile => {
                self.transport
                    .whole_file_fetch(url, path, self.progress.clone())
                    .await
            }
        }
    }
}
