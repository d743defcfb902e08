//! Numbering and selection over the flat curriculum list

use tracing::{debug, warn};

use super::{CurriculumItem, LectureId, LectureRange};

/// A video lecture picked for download, numbered by its position in the course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedLecture {
    /// 1-based chapter position
    pub chapter_number: u32,
    pub chapter_title: String,
    /// 1-based position among the chapter's video lectures
    pub lecture_number: u32,
    pub lecture_title: String,
    pub lecture_id: LectureId,
}

impl SelectedLecture {
    /// Short `chapter.lecture title` label for logs and progress output
    pub fn label(&self) -> String {
        format!(
            "{}.{} {}",
            self.chapter_number, self.lecture_number, self.lecture_title
        )
    }
}

/// Lazy, single-pass walk over curriculum items
///
/// The chapter counter advances on every chapter item, the lecture counter
/// advances only on video lectures and restarts at every chapter. Quizzes and
/// non-video lectures take no lecture number. Walking the same slice again
/// yields the same sequence.
#[derive(Debug, Clone)]
pub struct CurriculumWalker<'a> {
    items: std::slice::Iter<'a, CurriculumItem>,
    range: LectureRange,
    chapter_number: u32,
    lecture_number: u32,
    chapter_title: Option<&'a str>,
}

impl<'a> CurriculumWalker<'a> {
    pub fn new(items: &'a [CurriculumItem], range: LectureRange) -> Self {
        Self {
            items: items.iter(),
            range,
            chapter_number: 0,
            lecture_number: 0,
            chapter_title: None,
        }
    }
}

impl<'a> Iterator for CurriculumWalker<'a> {
    type Item = SelectedLecture;

    fn next(&mut self) -> Option<SelectedLecture> {
        for item in self.items.by_ref() {
            match item {
                CurriculumItem::Chapter { title: Some(title) } => {
                    self.chapter_number += 1;
                    self.lecture_number = 0;
                    self.chapter_title = Some(title.as_str());
                }
                CurriculumItem::Chapter { title: None } => {
                    warn!("Skipping chapter without a title");
                }
                CurriculumItem::Lecture { id, title, .. } if item.is_video_lecture() => {
                    let (Some(id), Some(title)) = (id, title) else {
                        warn!("Skipping video lecture without id or title: {:?}", item);
                        continue;
                    };
                    let Some(chapter_title) = self.chapter_title else {
                        warn!("Skipping lecture '{}' that precedes every chapter", title);
                        continue;
                    };

                    self.lecture_number += 1;
                    if self.range.is_selected(self.chapter_number, self.lecture_number) {
                        return Some(SelectedLecture {
                            chapter_number: self.chapter_number,
                            chapter_title: chapter_title.to_string(),
                            lecture_number: self.lecture_number,
                            lecture_title: title.clone(),
                            lecture_id: id.clone(),
                        });
                    }
                    debug!(
                        "Lecture {}.{} outside requested range",
                        self.chapter_number, self.lecture_number
                    );
                }
                _ => {}
            }
        }
        None
    }
}
