//! End-to-end tests for the download pipeline
//!
//! The platform resolver is replaced by a fake; video transfers go through the
//! real [`HttpTransport`] against a wiremock server.

use super::*;
use crate::curriculum::{CurriculumItem, CurriculumWalker, LectureId, LectureRange};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Resolver mapping lecture `id` to `{base}/video/{id}.mp4`
struct FakeResolver {
    base: String,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeResolver {
    fn new(base: String) -> Self {
        Self {
            base,
            failing: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }
}

#[async_trait]
impl SourceResolver for FakeResolver {
    async fn resolve(&self, lecture_id: &LectureId, _prefer_high_quality: bool) -> Result<VideoSource> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(lecture_id.as_str()) {
            return Err(DownloadError::Resolution {
                lecture_id: lecture_id.clone(),
                reason: "no player setup found in embed page".to_string(),
            });
        }
        Ok(VideoSource::new(
            format!("{}/video/{}.mp4", self.base, lecture_id),
            Quality::High,
        ))
    }
}

/// Helper struct to capture progress events during testing
#[derive(Debug, Default)]
struct ProgressCapture {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl ProgressCapture {
    fn get_callback(&self) -> ProgressCallback {
        let events = self.events.clone();
        Arc::new(move |event| {
            events.lock().unwrap().push(event);
        })
    }

    fn count_fallbacks(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, ProgressEvent::FallbackTransfer { .. }))
            .count()
    }

    fn skip_reasons(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::LectureSkipped { reason, .. } => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }

    fn count_cancellations(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, ProgressEvent::Cancelled { .. }))
            .count()
    }

    fn count_skips(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, ProgressEvent::LectureSkipped { .. }))
            .count()
    }
}

/// Deterministic video payload, distinct per lecture
fn video_bytes(id: u64, len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i as u64 * 7 + id) % 251) as u8).collect()
}

/// `chapters` × `lectures` course; lecture ids are `chapter * 10 + lecture`
fn course(chapters: u64, lectures: u64) -> Vec<CurriculumItem> {
    let mut items = Vec::new();
    for c in 1..=chapters {
        items.push(CurriculumItem::chapter(format!("Chapter {}", c)));
        for l in 1..=lectures {
            items.push(CurriculumItem::video_lecture(c * 10 + l, format!("Lecture {}", l)));
        }
        items.push(CurriculumItem::Quiz);
    }
    items
}

async fn mount_video(server: &MockServer, id: u64, content: Vec<u8>, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/video/{}.mp4", id)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn pipeline(resolver: Arc<FakeResolver>) -> DownloadPipeline {
    let config = DownloadConfig::default();
    let transport = HttpTransport::from_config(&config).unwrap();
    DownloadPipeline::new(resolver, Arc::new(transport), config)
}

fn outcomes(reports: &[LectureReport]) -> Vec<(u32, u32, LectureOutcome)> {
    reports
        .iter()
        .map(|r| (r.lecture.chapter_number, r.lecture.lecture_number, r.outcome.clone()))
        .collect()
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_single_resolution_failure_is_isolated() {
        let server = MockServer::start().await;
        for c in 1..=3u64 {
            for l in 1..=2u64 {
                let id = c * 10 + l;
                let calls = if id == 21 { 0 } else { 1 };
                mount_video(&server, id, video_bytes(id, 2048), calls).await;
            }
        }

        let resolver = Arc::new(FakeResolver::new(server.uri()).failing_on("21"));
        let dest = tempdir().unwrap();
        let items = course(3, 2);

        let reports = pipeline(resolver.clone())
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert_eq!(reports.len(), 6);
        let failed: Vec<_> = outcomes(&reports)
            .into_iter()
            .filter(|(_, _, outcome)| outcome.is_failed())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!((failed[0].0, failed[0].1), (2, 1));
        assert!(matches!(failed[0].2, LectureOutcome::Failed(FailureReason::Resolution(_))));

        let summary = RunSummary::from_reports(&reports);
        assert_eq!(summary.downloaded, 5);
        assert_eq!(summary.bytes, 5 * 2048);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 6);

        let welcome = dest.path().join("01 Chapter 1").join("001 Lecture 1.mp4");
        assert_eq!(std::fs::read(welcome).unwrap(), video_bytes(11, 2048));
        assert!(!dest.path().join("02 Chapter 2").join("001 Lecture 1.mp4").exists());
    }

    #[tokio::test]
    async fn test_failed_resolution_creates_no_directory() {
        let server = MockServer::start().await;
        let dest = tempdir().unwrap();
        let items = course(1, 1);

        let reports = pipeline(Arc::new(FakeResolver::new(server.uri()).failing_on("11")))
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert!(reports[0].outcome.is_failed());
        assert!(!dest.path().join("01 Chapter 1").exists());
    }

    #[tokio::test]
    async fn test_stalled_transfer_times_out_and_run_continues() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/11.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(video_bytes(11, 100))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;
        mount_video(&server, 12, video_bytes(12, 100), 1).await;

        let config = DownloadConfig::default().with_read_timeout(Duration::from_millis(200));
        let transport = HttpTransport::from_config(&config).unwrap();
        let pipeline = DownloadPipeline::new(
            Arc::new(FakeResolver::new(server.uri())),
            Arc::new(transport),
            config,
        );

        let dest = tempdir().unwrap();
        let items = course(1, 2);
        let started = std::time::Instant::now();
        let reports = pipeline
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(
            reports[0].outcome,
            LectureOutcome::Failed(FailureReason::Transfer(_))
        ));
        assert_eq!(reports[1].outcome, LectureOutcome::Downloaded { bytes: 100 });
    }

    #[tokio::test]
    async fn test_transfer_failure_is_isolated() {
        let server = MockServer::start().await;
        mount_video(&server, 11, video_bytes(11, 100), 1).await;
        Mock::given(method("GET"))
            .and(path("/video/12.mp4"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dest = tempdir().unwrap();
        let items = course(1, 2);
        let reports = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert_eq!(reports[0].outcome, LectureOutcome::Downloaded { bytes: 100 });
        assert!(matches!(
            reports[1].outcome,
            LectureOutcome::Failed(FailureReason::Transfer(_))
        ));
    }

    #[tokio::test]
    async fn test_rerun_only_skips() {
        let server = MockServer::start().await;
        for c in 1..=2u64 {
            for l in 1..=2u64 {
                let id = c * 10 + l;
                // Exactly one transfer per lecture across both runs
                mount_video(&server, id, video_bytes(id, 512), 1).await;
            }
        }

        let resolver = Arc::new(FakeResolver::new(server.uri()));
        let dest = tempdir().unwrap();
        let items = course(2, 2);
        let pipeline = pipeline(resolver.clone());

        let first = pipeline
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;
        assert_eq!(RunSummary::from_reports(&first).downloaded, 4);
        let before: Vec<Vec<u8>> = first
            .iter()
            .map(|r| std::fs::read(&r.target).unwrap())
            .collect();

        let capture = ProgressCapture::default();
        let pipeline = pipeline.with_progress(capture.get_callback());
        let second = pipeline
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert!(second
            .iter()
            .all(|r| r.outcome == LectureOutcome::Skipped(SkipReason::Exists)));
        assert_eq!(capture.count_skips(), 4);
        assert!(capture.skip_reasons().iter().all(|r| r == "file already exists"));
        let after: Vec<Vec<u8>> = second
            .iter()
            .map(|r| std::fs::read(&r.target).unwrap())
            .collect();
        assert_eq!(before, after);
        // Existing files are skipped before resolution
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_resume_produces_identical_file() {
        let server = MockServer::start().await;
        let full = video_bytes(11, 10_000);
        let cut = 3_333;

        Mock::given(method("GET"))
            .and(path("/video/11.mp4"))
            .and(header("Range", format!("bytes={}-", cut).as_str()))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {}-{}/{}", cut, full.len() - 1, full.len()).as_str(),
                    )
                    .set_body_bytes(full[cut..].to_vec()),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        mount_video(&server, 11, full.clone(), 0).await;

        let dest = tempdir().unwrap();
        let items = course(1, 1);
        let target = dest.path().join("01 Chapter 1").join("001 Lecture 1.mp4");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(PathBuf::from(format!("{}.part", target.display())), &full[..cut]).unwrap();

        let reports = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert_eq!(reports[0].outcome, LectureOutcome::Downloaded { bytes: full.len() as u64 });
        assert_eq!(std::fs::read(&target).unwrap(), full);
    }

    #[tokio::test]
    async fn test_ignored_range_falls_back_to_whole_file() {
        let server = MockServer::start().await;
        let full = video_bytes(11, 4_000);
        // Answers every request, ranged or not, with the full body
        mount_video(&server, 11, full.clone(), 2).await;

        let dest = tempdir().unwrap();
        let items = course(1, 1);
        let target = dest.path().join("01 Chapter 1").join("001 Lecture 1.mp4");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(PathBuf::from(format!("{}.part", target.display())), b"stale").unwrap();

        let capture = ProgressCapture::default();
        let reports = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .with_progress(capture.get_callback())
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert_eq!(reports[0].outcome, LectureOutcome::Downloaded { bytes: 4_000 });
        assert_eq!(std::fs::read(&target).unwrap(), full);
        assert_eq!(capture.count_fallbacks(), 1);
    }

    #[tokio::test]
    async fn test_oversized_partial_is_replaced_by_whole_file() {
        let server = MockServer::start().await;
        let full = video_bytes(11, 200);
        Mock::given(method("GET"))
            .and(path("/video/11.mp4"))
            .and(header("Range", "bytes=300-"))
            .respond_with(ResponseTemplate::new(416).insert_header("Content-Range", "bytes */200"))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        mount_video(&server, 11, full.clone(), 1).await;

        let dest = tempdir().unwrap();
        let items = course(1, 1);
        let target = dest.path().join("01 Chapter 1").join("001 Lecture 1.mp4");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(PathBuf::from(format!("{}.part", target.display())), video_bytes(99, 300))
            .unwrap();

        let capture = ProgressCapture::default();
        let reports = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .with_progress(capture.get_callback())
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert_eq!(reports[0].outcome, LectureOutcome::Downloaded { bytes: 200 });
        assert_eq!(std::fs::read(&target).unwrap(), full);
        assert_eq!(capture.count_fallbacks(), 1);
    }

    #[tokio::test]
    async fn test_probe_without_ranges_uses_whole_file() {
        let server = MockServer::start().await;
        let full = video_bytes(11, 1_000);
        Mock::given(method("HEAD"))
            .and(path("/video/11.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("Accept-Ranges", "none"))
            .mount(&server)
            .await;
        mount_video(&server, 11, full.clone(), 1).await;

        let dest = tempdir().unwrap();
        let items = course(1, 1);
        let target = dest.path().join("01 Chapter 1").join("001 Lecture 1.mp4");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(PathBuf::from(format!("{}.part", target.display())), b"stale").unwrap();

        let capture = ProgressCapture::default();
        let reports = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .with_progress(capture.get_callback())
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert_eq!(reports[0].outcome, LectureOutcome::Downloaded { bytes: 1_000 });
        assert_eq!(std::fs::read(&target).unwrap(), full);
        assert_eq!(capture.count_fallbacks(), 0);
    }

    #[tokio::test]
    async fn test_range_limits_downloads() {
        let server = MockServer::start().await;
        for c in 1..=3u64 {
            for l in 1..=6u64 {
                let id = c * 10 + l;
                let wanted = c == 2 && (3..=5).contains(&l);
                mount_video(&server, id, video_bytes(id, 64), if wanted { 1 } else { 0 }).await;
            }
        }

        let dest = tempdir().unwrap();
        let items = course(3, 6);
        let range = LectureRange::from_bounds(Some(2), Some(2), Some(3), Some(5)).unwrap();
        let reports = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .run(CurriculumWalker::new(&items, range), Some(dest.path()))
            .await;

        let coords: Vec<_> = outcomes(&reports).into_iter().map(|(c, l, _)| (c, l)).collect();
        assert_eq!(coords, vec![(2, 3), (2, 4), (2, 5)]);
        assert!(dest.path().join("02 Chapter 2").join("004 Lecture 4.mp4").exists());
    }
}

#[cfg(test)]
mod cancellation_tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_before_start_processes_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let resolver = Arc::new(FakeResolver::new("http://127.0.0.1:9".to_string()));
        let items = course(2, 2);
        let reports = pipeline(resolver.clone())
            .with_cancellation_token(token)
            .run(CurriculumWalker::new(&items, LectureRange::all()), None)
            .await;

        assert!(reports.is_empty());
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_during_transfer_stops_run() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/video/11.mp4"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(video_bytes(11, 100))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;
        mount_video(&server, 12, video_bytes(12, 100), 0).await;

        let dest = tempdir().unwrap();
        let items = course(1, 2);
        let capture = ProgressCapture::default();
        let pipeline = pipeline(Arc::new(FakeResolver::new(server.uri())))
            .with_progress(capture.get_callback());
        let token = pipeline.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            token.cancel();
        });

        let started = std::time::Instant::now();
        let reports = pipeline
            .run(CurriculumWalker::new(&items, LectureRange::all()), Some(dest.path()))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(reports.len(), 1);
        assert_eq!(
            reports[0].outcome,
            LectureOutcome::Failed(FailureReason::Cancelled)
        );
        assert!(!reports[0].target.exists());
        assert_eq!(capture.count_cancellations(), 1);
    }
}

#[cfg(test)]
mod reporter_tests {
    use super::*;

    #[derive(Default)]
    struct Counting {
        skipped: Arc<AtomicUsize>,
    }

    impl ProgressReporter for Counting {
        fn on_lecture_skipped(&self, _label: &str, _reason: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_composite_reporter_forwards_to_all() {
        let first = Counting::default();
        let second = Counting::default();
        let (a, b) = (first.skipped.clone(), second.skipped.clone());

        let callback = CompositeProgressReporter::new()
            .add_reporter(first)
            .add_reporter(second)
            .add_reporter(NullProgressReporter)
            .into_callback();

        callback(ProgressEvent::LectureSkipped {
            label: "1.1 Welcome".into(),
            reason: "exists".into(),
        });

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_targets_are_relative_without_dest_root() {
        let items = course(1, 1);
        let lecture = CurriculumWalker::new(&items, LectureRange::all())
            .next()
            .unwrap();
        let target = DownloadTarget::for_lecture(&lecture, None);
        assert_eq!(target.path(), Path::new("01 Chapter 1").join("001 Lecture 1.mp4"));
    }
}
