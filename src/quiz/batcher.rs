use serde::Serialize;
use serde_json::Value;
use std::ops::Range;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use super::{remove_stale, write_json_artifact, ArtifactReport, LessonPool, QuizError, QuizMapping, WriteOutcome};
use crate::random::RandomSource;
use nevermore_core::{CourseLayout, QuizQuestion, Section};

/// One primary quiz: a question from each lesson of a lesson group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quiz {
    /// 1-based position of the quiz within its section
    pub index: usize,

    /// Lessons of the group, in order
    pub lessons: Vec<String>,

    /// One question per lesson, in lesson order
    pub questions: Vec<QuizQuestion>,
}

/// Groups the lessons of a section into fixed-size quizzes
#[derive(Debug, Clone)]
pub struct QuizBatcher {
    lessons_per_quiz: usize,
}

impl Default for QuizBatcher {
    fn default() -> Self {
        Self::new(10)
    }
}

impl QuizBatcher {
    pub fn new(lessons_per_quiz: usize) -> Self {
        Self {
            lessons_per_quiz: lessons_per_quiz.max(1),
        }
    }

    pub fn lessons_per_quiz(&self) -> usize {
        self.lessons_per_quiz
    }

    /// Lesson index ranges that become quizzes.
    ///
    /// A section smaller than one group yields a single short quiz; otherwise
    /// only full groups are kept and a trailing partial group is dropped.
    pub fn plan_groups(&self, lesson_count: usize) -> Vec<Range<usize>> {
        if lesson_count == 0 {
            return Vec::new();
        }

        if lesson_count < self.lessons_per_quiz {
            return vec![0..lesson_count];
        }

        (0..lesson_count / self.lessons_per_quiz)
            .map(|group| {
                let start = group * self.lessons_per_quiz;
                start..start + self.lessons_per_quiz
            })
            .collect()
    }

    /// Sample one question per lesson for every planned group.
    ///
    /// Every pool that falls inside a group must be non-empty; an empty one
    /// aborts assembly with [`QuizError::EmptyLessonPool`].
    pub fn assemble<R: RandomSource + ?Sized>(
        &self,
        section_name: &str,
        pools: &[LessonPool],
        rng: &mut R,
    ) -> Result<Vec<Quiz>, QuizError> {
        let groups = self.plan_groups(pools.len());

        if pools.len() < self.lessons_per_quiz && !pools.is_empty() {
            info!(
                "Section '{}' has only {} valid lessons; generating a single quiz with all of them",
                section_name,
                pools.len()
            );
        }

        let covered = groups.last().map(|g| g.end).unwrap_or(0);
        if covered < pools.len() {
            info!(
                "⏭️ Skipping incomplete quiz group in section '{}' (only {} lessons)",
                section_name,
                pools.len() - covered
            );
        }

        let mut quizzes = Vec::with_capacity(groups.len());
        for (offset, group) in groups.into_iter().enumerate() {
            let mut lessons = Vec::with_capacity(group.len());
            let mut questions = Vec::with_capacity(group.len());

            for pool in &pools[group] {
                if pool.questions.is_empty() {
                    return Err(QuizError::EmptyLessonPool {
                        lesson: pool.lesson.clone(),
                    });
                }

                let picked = pool.questions[rng.pick_index(pool.questions.len())].clone();
                let position = rng.correct_position();
                questions.push(picked.into_quiz_question(&pool.lesson, position));
                lessons.push(pool.lesson.clone());
            }

            quizzes.push(Quiz {
                index: offset + 1,
                lessons,
                questions,
            });
        }

        Ok(quizzes)
    }

    /// Write each quiz to `<quiz_prefix>-<n>.json` and return the mappings of
    /// the quizzes now present on disk. Failed writes are logged and left out.
    pub async fn write_quizzes(
        &self,
        layout: &CourseLayout,
        section: &Section,
        quizzes: &[Quiz],
        skip_existing: bool,
    ) -> (Vec<QuizMapping>, ArtifactReport) {
        let mut mappings = Vec::new();
        let mut report = ArtifactReport::default();

        for quiz in quizzes {
            let file_name = layout.quiz_file_name(quiz.index);
            let path = layout.quiz_path(section, quiz.index);
            let outcome = write_json_artifact(&path, &quiz.questions, skip_existing).await;

            let covered = match &outcome {
                Ok(WriteOutcome::Written) => {
                    info!("📝 Created {} in {}", file_name, section.path.display());
                    Some(quiz.lessons.clone())
                }
                Ok(WriteOutcome::SkippedExisting) => {
                    info!("⏭️ {} already exists in {}, keeping it", file_name, section.path.display());
                    let on_disk = read_quiz_lessons(&path).await;
                    match &on_disk {
                        Some(lessons) if lessons != &quiz.lessons => warn!(
                            "Kept {} covers {:?} instead of planned {:?}; rerun with --overwrite to regroup",
                            file_name, lessons, quiz.lessons
                        ),
                        Some(_) => {}
                        None => warn!("Could not read lessons of kept {}, leaving it out of the mappings", file_name),
                    }
                    on_disk
                }
                Err(e) => {
                    warn!("❌ Failed to create {} in {}: {}", file_name, section.path.display(), e);
                    None
                }
            };

            if let Some(lessons) = covered {
                mappings.push(QuizMapping {
                    quiz_file: file_name,
                    lessons,
                });
            }
            report.record(path, &outcome);
        }

        if !skip_existing {
            match layout.existing_quiz_files(section) {
                Ok(existing) => {
                    let current: Vec<_> = quizzes.iter().map(|q| layout.quiz_path(section, q.index)).collect();
                    remove_stale(&existing, &current).await;
                }
                Err(e) => warn!("Could not list quiz files in {}: {}", section.path.display(), e),
            }
        }

        (mappings, report)
    }
}

/// Lessons a quiz file on disk covers, in first-appearance order
async fn read_quiz_lessons(path: &Path) -> Option<Vec<String>> {
    let content = fs::read_to_string(path).await.ok()?;
    let entries: Vec<Value> = serde_json::from_str(&content).ok()?;

    let mut lessons: Vec<String> = Vec::new();
    for entry in &entries {
        let lesson = entry.get("lesson").and_then(Value::as_str)?;
        if !lessons.iter().any(|l| l == lesson) {
            lessons.push(lesson.to_string());
        }
    }
    Some(lessons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::StdRandom;
    use nevermore_core::QuestionRecord;

    fn record(text: &str) -> QuestionRecord {
        QuestionRecord {
            question: text.to_string(),
            correct_answer: "right".to_string(),
            wrong_answer_1: "w1".to_string(),
            wrong_answer_2: "w2".to_string(),
            wrong_answer_3: "w3".to_string(),
            explanation: "because".to_string(),
            answer_timestamp: None,
        }
    }

    fn pools(lessons: usize, per_lesson: usize) -> Vec<LessonPool> {
        (1..=lessons)
            .map(|l| {
                let questions = (1..=per_lesson).map(|q| record(&format!("L{l} Q{q}"))).collect();
                LessonPool::new(format!("{l}-lesson"), questions)
            })
            .collect()
    }

    #[test]
    fn test_plan_groups() {
        let batcher = QuizBatcher::new(10);
        assert!(batcher.plan_groups(0).is_empty());
        assert_eq!(batcher.plan_groups(3), vec![0..3]);
        assert_eq!(batcher.plan_groups(10), vec![0..10]);
        assert_eq!(batcher.plan_groups(12), vec![0..10]);
        assert_eq!(batcher.plan_groups(25), vec![0..10, 10..20]);
    }

    #[test]
    fn test_full_groups_only() {
        let batcher = QuizBatcher::new(4);
        let mut rng = StdRandom::from_seed(1);

        for lessons in 4..=13 {
            let quizzes = batcher.assemble("s", &pools(lessons, 3), &mut rng).unwrap();
            assert_eq!(quizzes.len(), lessons / 4);
            for quiz in &quizzes {
                assert_eq!(quiz.questions.len(), 4);
            }
        }
    }

    #[test]
    fn test_small_section_single_quiz() {
        let batcher = QuizBatcher::new(10);
        let mut rng = StdRandom::from_seed(2);

        let quizzes = batcher.assemble("s", &pools(3, 2), &mut rng).unwrap();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(quizzes[0].index, 1);
        assert_eq!(quizzes[0].lessons, vec!["1-lesson", "2-lesson", "3-lesson"]);
        assert_eq!(quizzes[0].questions.len(), 3);
    }

    #[test]
    fn test_questions_come_from_their_group() {
        let batcher = QuizBatcher::new(5);
        let mut rng = StdRandom::from_seed(3);
        let pools = pools(10, 4);

        let quizzes = batcher.assemble("s", &pools, &mut rng).unwrap();
        assert_eq!(quizzes.len(), 2);

        for quiz in &quizzes {
            for (question, lesson) in quiz.questions.iter().zip(&quiz.lessons) {
                assert_eq!(&question.lesson, lesson);
                assert!((1..=4).contains(&question.correct_position));

                let pool = pools.iter().find(|p| &p.lesson == lesson).unwrap();
                assert!(pool.questions.contains(&question.record));
            }
        }
        assert_eq!(quizzes[1].lessons[0], "6-lesson");
        assert_eq!(quizzes[1].index, 2);
    }

    #[test]
    fn test_empty_pool_in_group_is_fatal() {
        let batcher = QuizBatcher::new(3);
        let mut rng = StdRandom::from_seed(4);
        let mut pools = pools(3, 2);
        pools[1].questions.clear();

        let err = batcher.assemble("s", &pools, &mut rng).unwrap_err();
        assert!(matches!(err, QuizError::EmptyLessonPool { lesson } if lesson == "2-lesson"));
    }

    #[test]
    fn test_empty_pool_outside_groups_is_ignored() {
        let batcher = QuizBatcher::new(2);
        let mut rng = StdRandom::from_seed(5);
        let mut pools = pools(3, 2);
        pools[2].questions.clear();

        let quizzes = batcher.assemble("s", &pools, &mut rng).unwrap();
        assert_eq!(quizzes.len(), 1);
    }

    fn section_in(dir: &tempfile::TempDir) -> (CourseLayout, Section) {
        let layout = CourseLayout::new(dir.path(), Default::default());
        let section = Section {
            name: "1-basics".to_string(),
            path: dir.path().join("1-basics"),
        };
        (layout, section)
    }

    #[tokio::test]
    async fn test_failed_quiz_write_is_left_out_of_mappings() {
        let dir = tempfile::TempDir::new().unwrap();
        let (layout, section) = section_in(&dir);

        // A non-empty directory where quiz-1.json should go
        let blocked = layout.quiz_path(&section, 1);
        fs::create_dir_all(&blocked).await.unwrap();
        fs::write(blocked.join("keep"), "x").await.unwrap();

        let batcher = QuizBatcher::new(2);
        let quizzes = batcher.assemble("1-basics", &pools(4, 2), &mut StdRandom::from_seed(8)).unwrap();
        assert_eq!(quizzes.len(), 2);

        let (mappings, report) = batcher.write_quizzes(&layout, &section, &quizzes, false).await;

        assert_eq!(report.failed, vec![blocked.clone()]);
        assert_eq!(report.written, vec![layout.quiz_path(&section, 2)]);
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].quiz_file, "quiz-2.json");
        assert_eq!(mappings[0].lessons, vec!["3-lesson", "4-lesson"]);
        assert!(layout.quiz_path(&section, 2).is_file());
        assert!(blocked.join("keep").exists());
    }

    #[tokio::test]
    async fn test_kept_quiz_maps_lessons_found_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let (layout, section) = section_in(&dir);
        fs::create_dir_all(&section.path).await.unwrap();

        let batcher = QuizBatcher::new(2);
        let all = pools(3, 2);
        let first = batcher.assemble("1-basics", &all, &mut StdRandom::from_seed(1)).unwrap();
        batcher.write_quizzes(&layout, &section, &first, true).await;

        // Regrouped without the first lesson, the kept quiz-1 still holds 1 and 2
        let second = batcher.assemble("1-basics", &all[1..], &mut StdRandom::from_seed(2)).unwrap();
        assert_eq!(second[0].lessons, vec!["2-lesson", "3-lesson"]);
        let (mappings, report) = batcher.write_quizzes(&layout, &section, &second, true).await;

        assert_eq!(report.skipped, vec![layout.quiz_path(&section, 1)]);
        assert_eq!(mappings[0].lessons, vec!["1-lesson", "2-lesson"]);
    }
}
