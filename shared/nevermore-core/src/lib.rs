//! Nevermore Core - Course layout, question records and artifact loading

pub mod naming;
pub mod question;
pub mod store;
pub mod layout;

pub use naming::{natural_key, sort_naturally, split_numbered_name, NaturalKey};
pub use question::{QuestionRecord, QuizQuestion};
pub use store::{QuestionStore, QUESTIONS_FILE};
pub use layout::{ArtifactNames, CourseLayout, Lesson, Section};

use std::path::PathBuf;

/// Result type for Nevermore Core operations
pub type Result<T> = std::result::Result<T, CourseError>;

/// Error types for Nevermore Core operations
#[derive(thiserror::Error, Debug)]
pub enum CourseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Artifact not found: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Malformed artifact {}: {reason}", path.display())]
    MalformedArtifact { path: PathBuf, reason: String },
}
