//! Course curriculum model
//!
//! The platform returns a course as one flat, ordered list of items. Chapters
//! open a new section and every following lecture belongs to it until the next
//! chapter. There is no index field on the items, so numbering is derived from
//! position by [`CurriculumWalker`].

pub mod range;
pub mod walker;

pub use range::{Bound, LectureRange};
pub use walker::{CurriculumWalker, SelectedLecture};

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Opaque lecture identifier as handed out by the platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LectureId(String);

impl LectureId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LectureId {
    fn from(value: &str) -> Self {
        LectureId(value.to_string())
    }
}

impl From<u64> for LectureId {
    fn from(value: u64) -> Self {
        LectureId(value.to_string())
    }
}

impl<'de> Deserialize<'de> for LectureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Ids are numbers in the curriculum API but strings elsewhere
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => LectureId(n.to_string()),
            RawId::Text(s) => LectureId(s),
        })
    }
}

/// One entry of the curriculum list, tagged by the `__class` field
///
/// Fields are optional so that a single malformed entry can be skipped by the
/// walker instead of failing to decode the whole course.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "__class", rename_all = "lowercase")]
pub enum CurriculumItem {
    Chapter {
        #[serde(default)]
        title: Option<String>,
    },
    Lecture {
        #[serde(default)]
        id: Option<LectureId>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default, rename = "assetType")]
        asset_type: Option<String>,
    },
    Quiz,
    #[serde(other)]
    Other,
}

impl CurriculumItem {
    pub fn chapter<S: Into<String>>(title: S) -> Self {
        CurriculumItem::Chapter {
            title: Some(title.into()),
        }
    }

    pub fn video_lecture<I: Into<LectureId>, S: Into<String>>(id: I, title: S) -> Self {
        CurriculumItem::Lecture {
            id: Some(id.into()),
            title: Some(title.into()),
            asset_type: Some("Video".to_string()),
        }
    }

    pub fn lecture_with_asset<I: Into<LectureId>, S: Into<String>, A: Into<String>>(
        id: I,
        title: S,
        asset_type: A,
    ) -> Self {
        CurriculumItem::Lecture {
            id: Some(id.into()),
            title: Some(title.into()),
            asset_type: Some(asset_type.into()),
        }
    }

    /// Lectures whose asset is a video are the only downloadable items
    pub fn is_video_lecture(&self) -> bool {
        match self {
            CurriculumItem::Lecture {
                asset_type: Some(asset),
                ..
            } => asset.eq_ignore_ascii_case("video"),
            _ => false,
        }
    }
}

/// Decode a curriculum response body, one item at a time
///
/// Items whose structure cannot be decoded at all become [`CurriculumItem::Other`]
/// so they neither abort the course nor shift chapter numbering.
pub fn decode_items(values: Vec<serde_json::Value>) -> Vec<CurriculumItem> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, value)| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!("Skipping undecodable curriculum item #{}: {}", position, e);
                CurriculumItem::Other
            })
        })
        .collect()
}
