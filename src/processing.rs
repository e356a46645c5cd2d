use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::quiz::{
    section_pools, ArtifactReport, LessonPool, MappingReporter, QuizBatcher, SummaryQuizBuilder,
};
use crate::random::{RandomSource, StdRandom};
use nevermore_core::{CourseLayout, QuestionStore, Section};

/// Outcome of one pass over a course
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingResult {
    /// Sections that had at least one usable lesson
    pub sections_processed: usize,

    /// Sections with no usable lessons
    pub sections_skipped: usize,

    /// Quizzes recorded in the manifest
    pub quizzes_mapped: usize,

    pub artifacts: ArtifactReport,

    pub total_time: Duration,
}

impl ProcessingResult {
    pub fn merge(&mut self, other: ProcessingResult) {
        self.sections_processed = self.sections_processed.max(other.sections_processed);
        self.sections_skipped = self.sections_skipped.max(other.sections_skipped);
        self.quizzes_mapped += other.quizzes_mapped;
        self.artifacts.merge(other.artifacts);
        self.total_time += other.total_time;
    }

    pub fn has_failures(&self) -> bool {
        !self.artifacts.failed.is_empty()
    }
}

/// Runs quiz and summary-quiz generation over every section of a course
pub struct CourseProcessor<R: RandomSource = StdRandom> {
    config: Config,
    layout: CourseLayout,
    store: QuestionStore,
    omitted: HashSet<String>,
    rng: R,
}

impl CourseProcessor<StdRandom> {
    /// Processor whose sampling is seeded from the config, or from entropy
    pub fn new(config: Config, course_dir: PathBuf) -> Result<Self> {
        let rng = StdRandom::from_optional_seed(config.processing.seed);
        Self::with_random(config, course_dir, rng)
    }
}

impl<R: RandomSource> CourseProcessor<R> {
    pub fn with_random(config: Config, course_dir: PathBuf, rng: R) -> Result<Self> {
        config.validate()?;

        if !course_dir.is_dir() {
            anyhow::bail!("Course directory does not exist: {}", course_dir.display());
        }

        let layout = CourseLayout::new(course_dir, config.artifacts.clone());
        let store = QuestionStore::new(config.artifacts.questions_file.clone());
        let omitted = config.quiz.omitted_set();

        info!(
            "🔧 Initializing CourseProcessor: {} lessons per quiz, summary cap {}, minimum summary {}",
            config.quiz.lessons_per_quiz, config.quiz.summary_cap, config.quiz.min_summary
        );

        Ok(Self {
            config,
            layout,
            store,
            omitted,
            rng,
        })
    }

    pub fn layout(&self) -> &CourseLayout {
        &self.layout
    }

    async fn load_sections(&self) -> Result<Vec<(Section, Vec<LessonPool>)>> {
        let sections = self
            .layout
            .sections()
            .with_context(|| format!("Failed to list sections of {}", self.layout.root().display()))?;

        let mut loaded = Vec::with_capacity(sections.len());
        for section in sections {
            let pools = section_pools(&self.layout, &self.store, &section, &self.omitted)
                .await
                .with_context(|| format!("Failed to read lessons of section '{}'", section.name))?;
            loaded.push((section, pools));
        }

        Ok(loaded)
    }

    /// Generate the primary quizzes of every section and rewrite the manifest
    pub async fn generate_quizzes(&mut self) -> Result<ProcessingResult> {
        let start_time = Instant::now();
        let batcher = QuizBatcher::new(self.config.quiz.lessons_per_quiz);
        let skip_existing = self.config.processing.skip_existing;

        info!("🚀 Generating quizzes for {}", self.layout.root().display());

        let mut result = ProcessingResult::default();
        let mut reporter = MappingReporter::new();

        for (section, pools) in self.load_sections().await? {
            if pools.is_empty() {
                info!("Section '{}' has no valid lessons. Skipping section.", section.name);
                result.sections_skipped += 1;
                continue;
            }
            result.sections_processed += 1;

            let quizzes = batcher
                .assemble(&section.name, &pools, &mut self.rng)
                .with_context(|| format!("Quiz assembly failed in section '{}'", section.name))?;

            let (mappings, report) = batcher
                .write_quizzes(&self.layout, &section, &quizzes, skip_existing)
                .await;

            reporter.record(&section.name, mappings);
            reporter.report_section(&section.name);
            result.artifacts.merge(report);
        }

        let mapping_path = self.layout.mapping_path();
        match reporter.persist(&mapping_path).await {
            Ok(()) => result.artifacts.written.push(mapping_path),
            Err(e) => {
                warn!("❌ Failed to save overall quiz mappings: {}", e);
                result.artifacts.failed.push(mapping_path);
            }
        }

        result.quizzes_mapped = reporter.quiz_count();
        result.total_time = start_time.elapsed();
        info!(
            "🎉 Quiz generation finished in {:.2}s: {} quizzes across {} sections",
            result.total_time.as_secs_f64(),
            result.quizzes_mapped,
            result.sections_processed
        );

        Ok(result)
    }

    /// Generate summary quizzes from the questions the primary quizzes left
    /// unused
    pub async fn generate_summary_quizzes(&mut self) -> Result<ProcessingResult> {
        let start_time = Instant::now();
        let builder = SummaryQuizBuilder::new(self.config.quiz.summary_cap, self.config.quiz.min_summary);
        let skip_existing = self.config.processing.skip_existing;

        info!("🚀 Generating summary quizzes for {}", self.layout.root().display());

        let mut result = ProcessingResult::default();

        for (section, pools) in self.load_sections().await? {
            if pools.is_empty() {
                info!(
                    "Section '{}' has no valid lessons. Skipping summary quiz generation.",
                    section.name
                );
                result.sections_skipped += 1;
                continue;
            }
            result.sections_processed += 1;

            let report = builder
                .build_section(&self.layout, &section, &pools, skip_existing, &mut self.rng)
                .await;
            result.artifacts.merge(report);
        }

        result.total_time = start_time.elapsed();
        info!(
            "🎉 Summary generation finished in {:.2}s: {} files written",
            result.total_time.as_secs_f64(),
            result.artifacts.written.len()
        );

        Ok(result)
    }

    /// Primary quizzes first, then summary quizzes against them
    pub async fn generate_all(&mut self) -> Result<ProcessingResult> {
        let mut result = self.generate_quizzes().await?;
        result.merge(self.generate_summary_quizzes().await?);
        Ok(result)
    }
}
