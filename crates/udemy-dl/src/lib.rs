//! Course Downloader Library
//!
//! This library logs into a course platform, walks a course's curriculum and
//! downloads the selected lecture videos with resumable transfers and
//! deterministic file names.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use udemy_dl::{
//!     Credentials, CurriculumWalker, DownloadConfig, DownloadPipeline, EmbedPlayerResolver,
//!     HttpTransport, LectureRange, RunSummary, Session,
//! };
//!
//! # async fn example() -> udemy_dl::Result<()> {
//! let config = DownloadConfig::default();
//! let credentials = Credentials::new("me@example.com", "secret");
//!
//! let session = Session::login(config.clone(), &credentials).await?;
//! let course_id = session.course_id("https://www.udemy.com/some-course").await?;
//! let items = session.fetch_curriculum(&course_id).await?;
//!
//! // Chapters 2 to 3 only
//! let range = LectureRange::from_bounds(Some(2), Some(3), None, None)?;
//!
//! let pipeline = DownloadPipeline::new(
//!     Arc::new(EmbedPlayerResolver::new(session.clone())),
//!     Arc::new(HttpTransport::from_config(&config)?),
//!     config,
//! );
//! let reports = pipeline
//!     .run(CurriculumWalker::new(&items, range), Some("some-course".as_ref()))
//!     .await;
//!
//! println!("{}", RunSummary::from_reports(&reports));
//! session.logout().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Range selection**: inclusive chapter × lecture windows with partial bounds
//! - **Stable numbering**: chapter and lecture numbers follow curriculum order
//! - **Failure isolation**: one broken lecture never stops the rest of the course
//! - **Resume capability**: interrupted transfers continue from their `.part` file
//! - **Fallback transfer**: servers without byte ranges get a whole-file fetch
//! - **Progress tracking**: throttled progress events with speed calculation

pub mod curriculum;
pub mod downloader;

// Re-export commonly used types for convenience
pub use curriculum::{Bound, CurriculumItem, CurriculumWalker, LectureId, LectureRange, SelectedLecture};
pub use downloader::{
    Credentials, DownloadConfig, DownloadError, DownloadPipeline, DownloadTarget,
    EmbedPlayerResolver, HttpTransport, LectureOutcome, LectureReport, ProgressCallback,
    ProgressEvent, Result, RunSummary, Session,
};
