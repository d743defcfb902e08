//! Resolver reading the setup call of the embedded lecture player

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::SourceResolver;
use crate::curriculum::LectureId;
use crate::downloader::api::Session;
use crate::downloader::core::{DownloadError, Quality, Result, VideoSource};

static PLAYER_SETUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r##"(?s)\$\("#player"\)\.jwplayer\((.*?)\);.*</script>"##).expect("valid regex")
});

#[derive(Debug, Deserialize)]
struct PlayerSetup {
    #[serde(default)]
    playlist: Vec<PlaylistEntry>,
}

#[derive(Debug, Deserialize)]
struct PlaylistEntry {
    #[serde(default)]
    sources: Vec<PlayerSource>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlayerSource {
    file: String,
    #[serde(default)]
    label: String,
}

impl PlayerSource {
    /// Label heuristic only; the platform gives no structured resolution
    fn looks_high_definition(&self) -> bool {
        self.label.contains("720") || self.label.contains("HD")
    }
}

/// Resolves lectures through `{base}/embed/{lecture_id}`
#[derive(Debug, Clone)]
pub struct EmbedPlayerResolver {
    session: Session,
}

impl EmbedPlayerResolver {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

/// Pick a source from the player page markup
///
/// With `prefer_high_quality` the first source labelled 720 or HD wins;
/// otherwise, or when none is labelled that way, the first source is used.
fn select_source(html: &str, prefer_high_quality: bool) -> std::result::Result<VideoSource, String> {
    let setup = PLAYER_SETUP
        .captures(html)
        .ok_or_else(|| "no player setup found in embed page".to_string())?;

    let player: PlayerSetup = serde_json::from_str(setup[1].trim())
        .map_err(|e| format!("player setup is not valid JSON: {}", e))?;

    let sources = player
        .playlist
        .into_iter()
        .next()
        .map(|entry| entry.sources)
        .unwrap_or_default();

    if prefer_high_quality {
        if let Some(source) = sources.iter().find(|s| s.looks_high_definition()) {
            return Ok(VideoSource::new(source.file.clone(), Quality::High));
        }
    }

    sources
        .into_iter()
        .next()
        .map(|source| VideoSource::new(source.file, Quality::Standard))
        .ok_or_else(|| "player lists no video sources".to_string())
}

#[async_trait]
impl SourceResolver for EmbedPlayerResolver {
    async fn resolve(&self, lecture_id: &LectureId, prefer_high_quality: bool) -> Result<VideoSource> {
        let url = self.session.config().url(&format!("embed/{}", lecture_id));
        let resolution_error = |reason: String| DownloadError::Resolution {
            lecture_id: lecture_id.clone(),
            reason,
        };

        let response = self
            .session
            .get(&url)
            .await
            .map_err(|e| resolution_error(e.to_string()))?;
        let html = response
            .text()
            .await
            .map_err(|e| resolution_error(e.to_string()))?;

        let source = select_source(&html, prefer_high_quality).map_err(resolution_error)?;
        debug!("Lecture {} resolved to {:?} source {}", lecture_id, source.quality, source.url);
        Ok(source)
    }
}
