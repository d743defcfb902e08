//! Downloader module
//!
//! This module contains all the download functionality including
//! core types, configuration, the platform session, source resolution,
//! transport and the per-lecture pipeline.

pub mod api;
pub mod config;
pub mod core;
pub mod pipeline;
pub mod sources;
pub mod transport;

// Re-export main types for convenience
pub use api::{Credentials, Session};
pub use config::DownloadConfig;
pub use core::{
    CompositeProgressReporter, ConsoleProgressReporter, DownloadError, DownloadTarget,
    ErrorSeverity, FailureReason, FileOperation, HttpTransport, IntoProgressCallback,
    LectureOutcome, LectureReport, NullProgressReporter, ProgressCallback, ProgressEvent,
    ProgressReporter, Quality, Result, RunSummary, SkipReason, VideoSource,
};
pub use pipeline::DownloadPipeline;
pub use sources::{EmbedPlayerResolver, SourceResolver};
pub use transport::{TransferStrategy, Transport};

#[cfg(test)]
mod tests;
