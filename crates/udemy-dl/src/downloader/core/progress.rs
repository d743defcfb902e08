//! Progress tracking and reporting for lecture downloads

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Progress callback for download operations
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Events emitted while a course is being downloaded
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    LectureStarted {
        label: String,
        path: PathBuf,
    },
    LectureSkipped {
        label: String,
        reason: String,
    },
    DownloadStarted {
        url: String,
        /// Bytes already on disk from an earlier attempt
        resumed_from: u64,
        total_size: Option<u64>,
    },
    DownloadProgress {
        url: String,
        downloaded: u64,
        total: Option<u64>,
        speed_bps: f64,
    },
    DownloadComplete {
        url: String,
        final_size: u64,
    },
    /// The resumable method was unavailable and the whole-file method took over
    FallbackTransfer {
        url: String,
        reason: String,
    },
    /// The run was cancelled while this transfer was in flight
    Cancelled {
        url: String,
    },
    /// `url` holds the lecture id when no source URL is known yet
    Warning {
        url: String,
        message: String,
    },
    Error {
        url: String,
        error: String,
    },
}

/// Trait for progress reporting with more granular control
pub trait ProgressReporter: Send + Sync {
    fn on_lecture_started(&self, _label: &str, _path: &std::path::Path) {}
    fn on_lecture_skipped(&self, _label: &str, _reason: &str) {}
    fn on_download_started(&self, _url: &str, _resumed_from: u64, _total_size: Option<u64>) {}
    fn on_download_progress(&self, _url: &str, _downloaded: u64, _total: Option<u64>, _speed_bps: f64) {}
    fn on_download_complete(&self, _url: &str, _final_size: u64) {}
    fn on_fallback(&self, _url: &str, _reason: &str) {}
    fn on_cancelled(&self, _url: &str) {}
    fn on_warning(&self, _url: &str, _message: &str) {}
    fn on_error(&self, _url: &str, _error: &str) {}
}

/// Extension trait to convert ProgressReporter to ProgressCallback
pub trait IntoProgressCallback {
    fn into_callback(self) -> ProgressCallback;
}

impl<T: ProgressReporter + 'static> IntoProgressCallback for T {
    fn into_callback(self) -> ProgressCallback {
        Arc::new(move |event| match event {
            ProgressEvent::LectureStarted { label, path } => {
                self.on_lecture_started(&label, &path);
            }
            ProgressEvent::LectureSkipped { label, reason } => {
                self.on_lecture_skipped(&label, &reason);
            }
            ProgressEvent::DownloadStarted { url, resumed_from, total_size } => {
                self.on_download_started(&url, resumed_from, total_size);
            }
            ProgressEvent::DownloadProgress { url, downloaded, total, speed_bps } => {
                self.on_download_progress(&url, downloaded, total, speed_bps);
            }
            ProgressEvent::DownloadComplete { url, final_size } => {
                self.on_download_complete(&url, final_size);
            }
            ProgressEvent::FallbackTransfer { url, reason } => {
                self.on_fallback(&url, &reason);
            }
            ProgressEvent::Cancelled { url } => {
                self.on_cancelled(&url);
            }
            ProgressEvent::Warning { url, message } => {
                self.on_warning(&url, &message);
            }
            ProgressEvent::Error { url, error } => {
                self.on_error(&url, &error);
            }
        })
    }
}

/// Plain console reporter printing a running percentage per lecture
#[derive(Debug, Default)]
pub struct ConsoleProgressReporter {
    pub verbose: bool,
}

impl ConsoleProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_lecture_started(&self, _label: &str, path: &std::path::Path) {
        println!("Downloading {}", path.display());
    }

    fn on_lecture_skipped(&self, label: &str, reason: &str) {
        println!("Skipping {} ({})", label, reason);
    }

    fn on_download_started(&self, url: &str, resumed_from: u64, total_size: Option<u64>) {
        if self.verbose {
            match (resumed_from, total_size) {
                (0, Some(size)) => println!("  from {} ({} bytes)", url, size),
                (0, None) => println!("  from {}", url),
                (offset, _) => println!("  resuming {} at byte {}", url, offset),
            }
        }
    }

    fn on_download_progress(&self, _url: &str, downloaded: u64, total: Option<u64>, _speed_bps: f64) {
        if let Some(total) = total.filter(|t| *t > 0) {
            let percent = (downloaded as f64 / total as f64) * 100.0;
            print!("\r{:3.0}%", percent.min(100.0));
            let _ = std::io::stdout().flush();
        }
    }

    fn on_download_complete(&self, _url: &str, final_size: u64) {
        println!("\rdone ({} bytes)", final_size);
    }

    fn on_fallback(&self, url: &str, reason: &str) {
        if self.verbose {
            println!("  resumable transfer unavailable for {}: {}", url, reason);
        }
    }

    fn on_cancelled(&self, _url: &str) {
        println!();
    }

    fn on_warning(&self, _url: &str, message: &str) {
        eprintln!("warning: {}", message);
    }

    fn on_error(&self, url: &str, error: &str) {
        eprintln!("Error downloading {}: {}", url, error);
    }
}

/// Null progress reporter that does nothing
#[derive(Debug, Default)]
pub struct NullProgressReporter;

impl ProgressReporter for NullProgressReporter {}

/// Composite progress reporter that forwards events to multiple reporters
pub struct CompositeProgressReporter {
    reporters: Vec<Box<dyn ProgressReporter>>,
}

impl std::fmt::Debug for CompositeProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeProgressReporter")
            .field("reporters_count", &self.reporters.len())
            .finish()
    }
}

impl CompositeProgressReporter {
    pub fn new() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    pub fn add_reporter<R: ProgressReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }
}

impl Default for CompositeProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for CompositeProgressReporter {
    fn on_lecture_started(&self, label: &str, path: &std::path::Path) {
        for reporter in &self.reporters {
            reporter.on_lecture_started(label, path);
        }
    }

    fn on_lecture_skipped(&self, label: &str, reason: &str) {
        for reporter in &self.reporters {
            reporter.on_lecture_skipped(label, reason);
        }
    }

    fn on_download_started(&self, url: &str, resumed_from: u64, total_size: Option<u64>) {
        for reporter in &self.reporters {
            reporter.on_download_started(url, resumed_from, total_size);
        }
    }

    fn on_download_progress(&self, url: &str, downloaded: u64, total: Option<u64>, speed_bps: f64) {
        for reporter in &self.reporters {
            reporter.on_download_progress(url, downloaded, total, speed_bps);
        }
    }

    fn on_download_complete(&self, url: &str, final_size: u64) {
        for reporter in &self.reporters {
            reporter.on_download_complete(url, final_size);
        }
    }

    fn on_fallback(&self, url: &str, reason: &str) {
        for reporter in &self.reporters {
            reporter.on_fallback(url, reason);
        }
    }

    fn on_cancelled(&self, url: &str) {
        for reporter in &self.reporters {
            reporter.on_cancelled(url);
        }
    }

    fn on_warning(&self, url: &str, message: &str) {
        for reporter in &self.reporters {
            reporter.on_warning(url, message);
        }
    }

    fn on_error(&self, url: &str, error: &str) {
        for reporter in &self.reporters {
            reporter.on_error(url, error);
        }
    }
}
