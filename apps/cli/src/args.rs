//! Command line surface

use clap::{ArgAction, Parser};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use udemy_dl::{DownloadConfig, DownloadError, LectureRange};
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "udemy-dl", author, version, about = "Fetch all the videos for a udemy course")]
pub struct Cli {
    /// Link for udemy course
    pub link: String,

    /// Username/Email (falls back to UDEMY_USERNAME, then a prompt)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password (falls back to UDEMY_PASSWORD, then a hidden prompt)
    #[arg(short, long)]
    pub password: Option<String>,

    /// Chapter to start at (default is 1); can be combined with --lecture-start
    #[arg(long)]
    pub chapter_start: Option<u32>,

    /// Chapter to end at (default is last); can be combined with --lecture-end
    #[arg(long)]
    pub chapter_end: Option<u32>,

    /// Lecture to start at (default is 1); must be used with --chapter-start
    #[arg(long)]
    pub lecture_start: Option<u32>,

    /// Lecture to end at (default is last); must be used with --chapter-end
    #[arg(long)]
    pub lecture_end: Option<u32>,

    /// Output directory (default is ./<last part of the course link>)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Take the first listed video source instead of looking for HD
    #[arg(long)]
    pub standard_quality: bool,

    /// Seconds a transfer may stall before it is abandoned
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Do not verify TLS certificates of video hosts
    #[arg(long)]
    pub insecure: bool,

    /// More output; repeat for debug logging
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validated lecture range; fails before any network activity
    pub fn range(&self) -> udemy_dl::Result<LectureRange> {
        LectureRange::from_bounds(
            self.chapter_start,
            self.chapter_end,
            self.lecture_start,
            self.lecture_end,
        )
    }

    /// The course link without trailing slashes
    pub fn course_link(&self) -> udemy_dl::Result<Url> {
        let link = self.link.trim_end_matches('/');
        Url::parse(link).map_err(|e| DownloadError::InvalidUrl {
            url: link.to_string(),
            suggestion: "Pass the full course link, e.g. https://www.udemy.com/course-name".to_string(),
            source: e,
        })
    }

    /// `-o` normalized, or `./<last path segment of the link>`
    pub fn output_dir(&self, link: &Url) -> udemy_dl::Result<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(normalize(dir));
        }

        link.path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(|name| Path::new(".").join(name))
            .ok_or_else(|| {
                DownloadError::config("output-dir", "Cannot derive an output directory from the link")
            })
    }

    pub fn download_config(&self) -> DownloadConfig {
        DownloadConfig::default()
            .with_prefer_high_quality(!self.standard_quality)
            .with_read_timeout(Duration::from_secs(self.timeout))
            .with_accept_invalid_certs(self.insecure)
    }
}

/// Lexically collapse `.` and `..` components, like a path normalizer without I/O
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
