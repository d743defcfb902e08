//! Example showing how a curriculum is numbered and filtered
//!
//! Decodes a curriculum response, selects chapter 2 lecture 2 through the end
//! of chapter 3, and prints where each lecture would be stored. No network
//! access is needed.
//!
//! Run this example with:
//! ```
//! cargo run -p udemy-dl --example walk_curriculum
//! ```

use udemy_dl::curriculum::decode_items;
use udemy_dl::{CurriculumWalker, DownloadTarget, LectureRange};

const CURRICULUM: &str = r#"[
    {"__class": "chapter", "title": "Getting Started"},
    {"__class": "lecture", "id": 101, "title": "Welcome", "assetType": "Video"},
    {"__class": "lecture", "id": 102, "title": "Course Notes", "assetType": "Article"},
    {"__class": "chapter", "title": "Ownership & Borrowing"},
    {"__class": "lecture", "id": 201, "title": "Moves", "assetType": "Video"},
    {"__class": "lecture", "id": 202, "title": "References: shared/mutable", "assetType": "Video"},
    {"__class": "quiz", "id": 203, "title": "Check yourself"},
    {"__class": "lecture", "id": 204, "title": "Lifetimes", "assetType": "Video"},
    {"__class": "chapter", "title": "Traits"},
    {"__class": "lecture", "id": 301, "title": "Generics", "assetType": "Video"},
    {"__class": "chapter", "title": "Wrap-up"},
    {"__class": "lecture", "id": 401, "title": "Next steps", "assetType": "Video"}
]"#;

fn main() -> udemy_dl::Result<()> {
    // Malformed items are reported through tracing
    tracing_subscriber::fmt::init();

    let values: Vec<serde_json::Value> =
        serde_json::from_str(CURRICULUM).map_err(|e| udemy_dl::DownloadError::Parse {
            context: "example curriculum".to_string(),
            source: e,
        })?;
    let items = decode_items(values);

    let range = LectureRange::from_bounds(Some(2), Some(3), Some(2), None)?;

    println!("Selected lectures:");
    for lecture in CurriculumWalker::new(&items, range) {
        let target = DownloadTarget::for_lecture(&lecture, Some("rust-course".as_ref()));
        println!("  {:<40} -> {}", lecture.label(), target.path().display());
    }

    Ok(())
}
