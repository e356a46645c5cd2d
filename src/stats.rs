//! Question counts per lesson and section

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::quiz::QuizBatcher;
use nevermore_core::{CourseError, CourseLayout, QuestionStore};

/// State of a lesson's question pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PoolStatus {
    Ok,
    Missing,
    Malformed(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonCount {
    pub lesson: String,
    pub questions: usize,
    pub status: PoolStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionCount {
    pub section: String,
    pub lessons: Vec<LessonCount>,

    /// Primary quiz files currently on disk
    pub quiz_files: usize,

    /// Summary quiz files currently on disk
    pub summary_files: usize,

    /// Quizzes a batching run would emit for this section
    pub planned_quizzes: usize,
}

impl SectionCount {
    pub fn total_questions(&self) -> usize {
        self.lessons.iter().map(|l| l.questions).sum()
    }

    /// Lessons that would take part in quiz generation
    pub fn usable_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.questions > 0).count()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CourseCount {
    pub sections: Vec<SectionCount>,
}

impl CourseCount {
    pub fn total_questions(&self) -> usize {
        self.sections.iter().map(SectionCount::total_questions).sum()
    }

    pub fn total_lessons(&self) -> usize {
        self.sections.iter().map(|s| s.lessons.len()).sum()
    }

    pub fn log_report(&self) {
        for section in &self.sections {
            info!(
                "📂 {}: {} questions in {}/{} usable lessons, {} quiz file(s) ({} planned), {} summary file(s)",
                section.section,
                section.total_questions(),
                section.usable_lessons(),
                section.lessons.len(),
                section.quiz_files,
                section.planned_quizzes,
                section.summary_files
            );
            for lesson in &section.lessons {
                match &lesson.status {
                    PoolStatus::Ok => info!("  {}: {} questions", lesson.lesson, lesson.questions),
                    PoolStatus::Missing => warn!("  {}: no question file", lesson.lesson),
                    PoolStatus::Malformed(reason) => warn!("  {}: unreadable ({})", lesson.lesson, reason),
                }
            }
        }
        info!(
            "📊 Total questions in course: {} across {} lessons",
            self.total_questions(),
            self.total_lessons()
        );
    }
}

/// Counts question pools across a course
pub struct QuestionCounter<'a> {
    layout: &'a CourseLayout,
    store: QuestionStore,
    omitted: HashSet<String>,
    batcher: QuizBatcher,
}

impl<'a> QuestionCounter<'a> {
    pub fn new(layout: &'a CourseLayout, omitted: HashSet<String>, lessons_per_quiz: usize) -> Self {
        Self {
            store: QuestionStore::new(layout.names().questions_file.clone()),
            layout,
            omitted,
            batcher: QuizBatcher::new(lessons_per_quiz),
        }
    }

    pub async fn count(&self) -> Result<CourseCount> {
        let mut course = CourseCount::default();

        for section in self.layout.sections()? {
            let mut lessons = Vec::new();
            for lesson in self.layout.lessons(&section, &self.omitted)? {
                let (questions, status) = match self.store.try_load(&lesson.path).await {
                    Ok(records) => (records.len(), PoolStatus::Ok),
                    Err(CourseError::MissingArtifact(_)) => (0, PoolStatus::Missing),
                    Err(e) => (0, PoolStatus::Malformed(e.to_string())),
                };
                lessons.push(LessonCount {
                    lesson: lesson.name,
                    questions,
                    status,
                });
            }

            let usable = lessons.iter().filter(|l| l.questions > 0).count();
            course.sections.push(SectionCount {
                quiz_files: self.layout.existing_quiz_files(&section)?.len(),
                summary_files: self.layout.existing_summary_files(&section)?.len(),
                planned_quizzes: self.batcher.plan_groups(usable).len(),
                section: section.name,
                lessons,
            });
        }

        Ok(course)
    }
}
