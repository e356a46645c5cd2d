use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tokio::fs;
use tracing::{debug, info, warn};

use super::{remove_stale, write_json_artifact, ArtifactReport, LessonPool, WriteOutcome};
use crate::random::RandomSource;
use nevermore_core::{CourseLayout, QuestionRecord, QuizQuestion, Section};

/// Question texts already placed in primary quizzes, keyed by lesson
pub type UsedQuestions = HashMap<String, HashSet<String>>;

/// Builds a section's summary quiz from questions the primary quizzes left
/// unused.
///
/// Backfill below `min_summary` is greedy: lessons are drained in section
/// order, so earlier lessons supply the extra questions. This is a sampling
/// policy, not a balanced cover.
#[derive(Debug, Clone)]
pub struct SummaryQuizBuilder {
    summary_cap: usize,
    min_summary: usize,
}

impl Default for SummaryQuizBuilder {
    fn default() -> Self {
        Self::new(35, 8)
    }
}

impl SummaryQuizBuilder {
    pub fn new(summary_cap: usize, min_summary: usize) -> Self {
        Self {
            summary_cap: summary_cap.max(1),
            min_summary,
        }
    }

    /// Read a section's primary quiz files back and collect the question
    /// texts they use per lesson. Unreadable files and entries without a
    /// `lesson` or `question` are ignored.
    pub async fn load_used_questions(&self, layout: &CourseLayout, section: &Section) -> UsedQuestions {
        let mut used = UsedQuestions::new();

        let quiz_files = match layout.existing_quiz_files(section) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list quiz files in {}: {}", section.path.display(), e);
                return used;
            }
        };

        for path in quiz_files {
            let entries = match fs::read_to_string(&path).await {
                Ok(content) => match serde_json::from_str::<Value>(&content) {
                    Ok(Value::Array(entries)) => entries,
                    Ok(_) => {
                        warn!("Quiz file {} is not a list, ignoring it", path.display());
                        continue;
                    }
                    Err(e) => {
                        warn!("Error parsing quiz file {}: {}", path.display(), e);
                        continue;
                    }
                },
                Err(e) => {
                    warn!("Error reading quiz file {}: {}", path.display(), e);
                    continue;
                }
            };

            for entry in &entries {
                let lesson = entry.get("lesson").and_then(Value::as_str);
                let question = entry.get("question").and_then(Value::as_str);
                if let (Some(lesson), Some(question)) = (lesson, question) {
                    used.entry(lesson.to_string())
                        .or_default()
                        .insert(question.to_string());
                }
            }
            debug!("Read {} used questions from {}", entries.len(), path.display());
        }

        used
    }

    /// Pick the summary questions for a section, in pick order.
    pub fn select<R: RandomSource + ?Sized>(
        &self,
        pools: &[LessonPool],
        used: &UsedQuestions,
        rng: &mut R,
    ) -> Vec<QuizQuestion> {
        let mut picks = Vec::new();
        let mut spares: Vec<(&str, Vec<QuestionRecord>)> = Vec::new();

        for pool in pools {
            let mut candidates = unused_candidates(pool, used.get(&pool.lesson));
            if candidates.is_empty() {
                info!("No new questions available for lesson '{}'", pool.lesson);
                continue;
            }

            let picked = candidates.remove(rng.pick_index(candidates.len()));
            let position = rng.correct_position();
            picks.push(picked.into_quiz_question(&pool.lesson, position));
            spares.push((pool.lesson.as_str(), candidates));
        }

        if picks.len() < self.min_summary {
            info!(
                "Summary questions ({}) below minimum ({}); attempting to add {} more",
                picks.len(),
                self.min_summary,
                self.min_summary - picks.len()
            );

            'backfill: for (lesson, remaining) in spares.iter_mut() {
                while !remaining.is_empty() {
                    if picks.len() >= self.min_summary {
                        break 'backfill;
                    }
                    let extra = remaining.remove(rng.pick_index(remaining.len()));
                    let position = rng.correct_position();
                    picks.push(extra.into_quiz_question(*lesson, position));
                }
            }

            if picks.len() < self.min_summary {
                info!("Only {} summary questions available after backfill", picks.len());
            }
        }

        picks
    }

    /// Split picks into files of at most `summary_cap` questions, keeping order
    pub fn chunk(&self, picks: Vec<QuizQuestion>) -> Vec<Vec<QuizQuestion>> {
        let mut chunks = Vec::new();
        let mut iter = picks.into_iter().peekable();

        while iter.peek().is_some() {
            chunks.push(iter.by_ref().take(self.summary_cap).collect());
        }

        chunks
    }

    /// Select, chunk and write the summary quiz of one section.
    ///
    /// With `skip_existing`, a section that already has summary files is left
    /// untouched, since its chunks come from a single pick sequence.
    pub async fn build_section<R: RandomSource + ?Sized>(
        &self,
        layout: &CourseLayout,
        section: &Section,
        pools: &[LessonPool],
        skip_existing: bool,
        rng: &mut R,
    ) -> ArtifactReport {
        let mut report = ArtifactReport::default();

        let existing = layout.existing_summary_files(section).unwrap_or_else(|e| {
            warn!("Could not list summary files in {}: {}", section.path.display(), e);
            Vec::new()
        });
        if skip_existing && !existing.is_empty() {
            info!("⏭️ Summary quiz already exists for section '{}', keeping it", section.name);
            report.skipped.extend(existing);
            return report;
        }

        let used = self.load_used_questions(layout, section).await;
        let picks = self.select(pools, &used, rng);

        if picks.is_empty() {
            info!("No new questions were available to create a summary quiz for section '{}'", section.name);
            return report;
        }

        let mut per_lesson: Vec<(String, usize)> = Vec::new();
        for pick in &picks {
            match per_lesson.iter_mut().find(|(lesson, _)| lesson == &pick.lesson) {
                Some((_, count)) => *count += 1,
                None => per_lesson.push((pick.lesson.clone(), 1)),
            }
        }

        let mut current = Vec::new();
        for (offset, chunk) in self.chunk(picks).into_iter().enumerate() {
            let index = offset + 1;
            let path = layout.summary_path(section, index);
            let outcome = write_json_artifact(&path, &chunk, false).await;

            match &outcome {
                Ok(WriteOutcome::Written) | Ok(WriteOutcome::SkippedExisting) => {
                    info!(
                        "📝 Created summary quiz for section '{}' in {} ({} questions)",
                        section.name,
                        path.display(),
                        chunk.len()
                    );
                }
                Err(e) => warn!("❌ Failed to create summary quiz for section '{}': {}", section.name, e),
            }

            current.push(path.clone());
            report.record(path, &outcome);
        }

        for (lesson, count) in &per_lesson {
            debug!("  {}: {} summary question(s)", lesson, count);
        }

        remove_stale(&existing, &current).await;
        report
    }
}

/// Pool entries whose text is not in `used`, de-duplicated by text
fn unused_candidates(pool: &LessonPool, used: Option<&HashSet<String>>) -> Vec<QuestionRecord> {
    let mut seen = HashSet::new();
    pool.questions
        .iter()
        .filter(|q| used.map_or(true, |used| !used.contains(&q.question)))
        .filter(|q| seen.insert(q.question.as_str()))
        .cloned()
        .collect()
}
