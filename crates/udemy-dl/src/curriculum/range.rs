//! Inclusive chapter × lecture selection

use crate::downloader::core::{DownloadError, Result};

/// One end of a range: a chapter, optionally narrowed to a lecture inside it
///
/// A lecture bound only exists together with its chapter, so the
/// "lecture without chapter" configuration cannot be represented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub chapter: u32,
    pub lecture: Option<u32>,
}

impl Bound {
    pub fn chapter(chapter: u32) -> Self {
        Self { chapter, lecture: None }
    }

    pub fn lecture(chapter: u32, lecture: u32) -> Self {
        Self {
            chapter,
            lecture: Some(lecture),
        }
    }
}

/// Requested lectures; an absent bound is unbounded on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LectureRange {
    pub start: Option<Bound>,
    pub end: Option<Bound>,
}

impl LectureRange {
    /// Everything in the course
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: Option<Bound>, end: Option<Bound>) -> Self {
        Self { start, end }
    }

    /// Build a range from the four loose command-line values, validating them
    ///
    /// All bounds must be positive, a lecture bound needs the chapter bound on
    /// the same side, the chapters must be ordered and, when start and end name
    /// the same chapter, so must the lectures.
    pub fn from_bounds(
        chapter_start: Option<u32>,
        chapter_end: Option<u32>,
        lecture_start: Option<u32>,
        lecture_end: Option<u32>,
    ) -> Result<Self> {
        for (field, value) in [
            ("chapter-start", chapter_start),
            ("chapter-end", chapter_end),
            ("lecture-start", lecture_start),
            ("lecture-end", lecture_end),
        ] {
            if value == Some(0) {
                return Err(DownloadError::config(
                    field,
                    format!("--{} requires natural number argument", field),
                ));
            }
        }

        if let (Some(start), Some(end)) = (chapter_start, chapter_end) {
            if start > end {
                return Err(DownloadError::config(
                    "chapter-start",
                    "--chapter-start cannot be after --chapter-end",
                ));
            }
        }

        if lecture_start.is_some() && chapter_start.is_none() {
            return Err(DownloadError::config(
                "lecture-start",
                "--lecture-start argument requires --chapter-start",
            ));
        }
        if lecture_end.is_some() && chapter_end.is_none() {
            return Err(DownloadError::config(
                "lecture-end",
                "--lecture-end argument requires --chapter-end",
            ));
        }

        if let (Some(ls), Some(le)) = (lecture_start, lecture_end) {
            if chapter_start == chapter_end && ls > le {
                return Err(DownloadError::config(
                    "lecture-start",
                    "--lecture-start cannot be after --lecture-end in same chapter",
                ));
            }
        }

        Ok(Self {
            start: chapter_start.map(|chapter| Bound {
                chapter,
                lecture: lecture_start,
            }),
            end: chapter_end.map(|chapter| Bound {
                chapter,
                lecture: lecture_end,
            }),
        })
    }

    /// Whether the 1-based (chapter, lecture) coordinate lies inside the range
    pub fn is_selected(&self, chapter: u32, lecture: u32) -> bool {
        if let Some(start) = self.start {
            if chapter < start.chapter {
                return false;
            }
            if chapter == start.chapter && start.lecture.is_some_and(|l| lecture < l) {
                return false;
            }
        }

        if let Some(end) = self.end {
            if chapter > end.chapter {
                return false;
            }
            if chapter == end.chapter && end.lecture.is_some_and(|l| lecture > l) {
                return false;
            }
        }

        true
    }
}
