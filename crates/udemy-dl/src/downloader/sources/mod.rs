//! Video source resolution
//!
//! A resolver turns a lecture id into a downloadable URL. The pipeline only
//! sees the [`SourceResolver`] trait, so tests and alternative platforms can
//! plug in their own.

pub mod embed;

pub use embed::EmbedPlayerResolver;

use async_trait::async_trait;

use crate::curriculum::LectureId;
use crate::downloader::core::{Result, VideoSource};

#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Locate the video for `lecture_id`
    ///
    /// Failures are reported as [`DownloadError::Resolution`] and only affect
    /// this lecture.
    ///
    /// [`DownloadError::Resolution`]: crate::downloader::core::DownloadError::Resolution
    async fn resolve(&self, lecture_id: &LectureId, prefer_high_quality: bool) -> Result<VideoSource>;
}
