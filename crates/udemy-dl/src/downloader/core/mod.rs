//! Core types used throughout the downloader system
//!
//! This module contains the fundamental types that all other modules depend on.

pub mod error;
pub mod files;
pub mod http;
pub mod progress;

// Re-export main types for convenience
pub use error::{DownloadError, ErrorSeverity, FileOperation, Result};
pub use http::HttpTransport;
pub use progress::{
    CompositeProgressReporter, ConsoleProgressReporter, IntoProgressCallback,
    NullProgressReporter, ProgressCallback, ProgressEvent, ProgressReporter,
};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::curriculum::SelectedLecture;
use files::sanitize_path;

/// Quality tier of a resolved video
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Standard,
    High,
}

/// A downloadable video location for one lecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    pub url: String,
    pub quality: Quality,
}

impl VideoSource {
    pub fn new<S: Into<String>>(url: S, quality: Quality) -> Self {
        Self {
            url: url.into(),
            quality,
        }
    }
}

/// Where a lecture ends up on disk
///
/// Both components are derived from the lecture's position and titles only,
/// so the same curriculum always maps to the same files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub directory: PathBuf,
    pub filename: String,
}

impl DownloadTarget {
    /// `NN Chapter/NNN Lecture.mp4`, optionally below `dest_root`
    pub fn for_lecture(lecture: &SelectedLecture, dest_root: Option<&Path>) -> Self {
        let chapter_dir = sanitize_path(&format!(
            "{:02} {}",
            lecture.chapter_number, lecture.chapter_title
        ));
        let filename = sanitize_path(&format!(
            "{:03} {}.mp4",
            lecture.lecture_number, lecture.lecture_title
        ));

        let directory = match dest_root {
            Some(root) => root.join(chapter_dir),
            None => PathBuf::from(chapter_dir),
        };

        Self {
            directory,
            filename,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}

/// Why a lecture was not transferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The final file is already on disk
    Exists,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Exists => write!(f, "file already exists"),
        }
    }
}

/// Why a lecture could not be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Resolution(String),
    Transfer(String),
    Cancelled,
}

/// Result of processing a single lecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LectureOutcome {
    Downloaded { bytes: u64 },
    Skipped(SkipReason),
    Failed(FailureReason),
}

impl LectureOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, LectureOutcome::Failed(_))
    }
}

impl fmt::Display for LectureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LectureOutcome::Downloaded { bytes } => write!(f, "downloaded ({} bytes)", bytes),
            LectureOutcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            LectureOutcome::Failed(FailureReason::Resolution(reason)) => {
                write!(f, "failed (resolution: {})", reason)
            }
            LectureOutcome::Failed(FailureReason::Transfer(reason)) => {
                write!(f, "failed (transfer: {})", reason)
            }
            LectureOutcome::Failed(FailureReason::Cancelled) => write!(f, "failed (cancelled)"),
        }
    }
}

/// Outcome of one lecture, attributable to that lecture and its file
#[derive(Debug, Clone)]
pub struct LectureReport {
    pub lecture: SelectedLecture,
    pub target: PathBuf,
    pub outcome: LectureOutcome,
}

/// Totals over a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes: u64,
}

impl RunSummary {
    pub fn from_reports(reports: &[LectureReport]) -> Self {
        reports
            .iter()
            .fold(Self::default(), |mut summary, report| {
                match &report.outcome {
                    LectureOutcome::Downloaded { bytes } => {
                        summary.downloaded += 1;
                        summary.bytes += bytes;
                    }
                    LectureOutcome::Skipped(_) => summary.skipped += 1,
                    LectureOutcome::Failed(_) => summary.failed += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lectures: {} downloaded, {} skipped, {} failed ({} bytes)",
            self.total(),
            self.downloaded,
            self.skipped,
            self.failed,
            self.bytes
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::LectureId;

    fn lecture(chapter: u32, title: &str, number: u32, lecture_title: &str) -> SelectedLecture {
        SelectedLecture {
            chapter_number: chapter,
            chapter_title: title.to_string(),
            lecture_number: number,
            lecture_title: lecture_title.to_string(),
            lecture_id: LectureId::from(1),
        }
    }

    #[test]
    fn target_names_are_zero_padded_and_sanitized() {
        let target = DownloadTarget::for_lecture(&lecture(1, "Intro: Start", 7, "What/Why?"), None);
        assert_eq!(target.directory, PathBuf::from("01 Intro Start"));
        assert_eq!(target.filename, "007 WhatWhy.mp4");
        assert_eq!(target.path(), PathBuf::from("01 Intro Start/007 WhatWhy.mp4"));
    }

    #[test]
    fn target_is_placed_below_dest_root() {
        let target =
            DownloadTarget::for_lecture(&lecture(12, "Basics", 3, "Setup"), Some(Path::new("/data/course")));
        assert_eq!(target.path(), PathBuf::from("/data/course/12 Basics/003 Setup.mp4"));
    }

    #[test]
    fn summary_counts_each_outcome() {
        let make = |outcome| LectureReport {
            lecture: lecture(1, "A", 1, "x"),
            target: PathBuf::from("x"),
            outcome,
        };
        let reports = vec![
            make(LectureOutcome::Downloaded { bytes: 10 }),
            make(LectureOutcome::Downloaded { bytes: 5 }),
            make(LectureOutcome::Skipped(SkipReason::Exists)),
            make(LectureOutcome::Failed(FailureReason::Cancelled)),
        ];

        let summary = RunSummary::from_reports(&reports);
        assert_eq!(
            summary,
            RunSummary {
                downloaded: 2,
                skipped: 1,
                failed: 1,
                bytes: 15
            }
        );
        assert_eq!(summary.total(), 4);
    }

    #[test]
    fn outcome_display_names_reason() {
        let failed = LectureOutcome::Failed(FailureReason::Resolution("no player".into()));
        assert_eq!(failed.to_string(), "failed (resolution: no player)");
        assert!(failed.is_failed());
    }
}
