/// Nevermore Quiz - quiz assembly for lesson-based video courses
///
/// Builds per-section multiple-choice quizzes from the question pools stored
/// next to each lesson video, summary quizzes from the questions left over,
/// and a course-level manifest of which lessons each quiz covers.

pub mod audit;
pub mod config;
pub mod processing;
pub mod quiz;
pub mod random;
pub mod stats;

// Re-export main types for easy access
pub use crate::audit::{AuditFinding, AuditIssue, StructureAuditor};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::processing::{CourseProcessor, ProcessingResult};
pub use crate::quiz::{MappingReporter, QuizBatcher, QuizError, QuizMapping, SummaryQuizBuilder};
pub use crate::random::{RandomSource, StdRandom};
pub use crate::stats::{CourseCount, QuestionCounter};
pub use nevermore_core::{CourseError, CourseLayout, QuestionRecord, QuestionStore, QuizQuestion};
