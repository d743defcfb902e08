//! Byte transfer abstraction used by the pipeline
//!
//! A transfer runs in one of two arms. The resumable arm continues an existing
//! `.part` file from its size; the whole-file arm starts from scratch. Which arm
//! is used is decided up front by [`Transport::probe`], and a capability error
//! from the resumable arm moves the lecture to the whole-file arm once.

use async_trait::async_trait;
use std::path::Path;

use crate::downloader::core::{ProgressCallback, Result};

/// Transfer method chosen for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStrategy {
    /// Continue from the partial file via byte ranges
    Resumable,
    /// Fetch the whole body into a fresh partial file
    WholeFile,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Decide which arm suits `url`; never fails, unknown means resumable
    async fn probe(&self, url: &str) -> TransferStrategy;

    /// Fetch `url` into `target`, continuing a partial file when present
    ///
    /// Returns the final file size. Fails with a capability error when the
    /// server cannot continue a partial file.
    async fn resumable_fetch(
        &self,
        url: &str,
        target: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64>;

    /// Fetch `url` into `target` from the first byte
    async fn whole_file_fetch(
        &self,
        url: &str,
        target: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<u64>;
}
