use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::{write_json_artifact, QuizError};

/// Which lessons a quiz file covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMapping {
    pub quiz_file: String,
    pub lessons: Vec<String>,
}

/// Collects quiz coverage for every section of a course run
#[derive(Debug, Clone, Default)]
pub struct MappingReporter {
    sections: BTreeMap<String, Vec<QuizMapping>>,
}

impl MappingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a section's mappings. Sections without quizzes are left out.
    pub fn record(&mut self, section: &str, mappings: Vec<QuizMapping>) {
        if mappings.is_empty() {
            return;
        }
        self.sections.entry(section.to_string()).or_default().extend(mappings);
    }

    pub fn sections(&self) -> &BTreeMap<String, Vec<QuizMapping>> {
        &self.sections
    }

    pub fn quiz_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    /// Log the coverage of one section
    pub fn report_section(&self, section: &str) {
        let Some(mappings) = self.sections.get(section) else {
            return;
        };

        info!("🗺️ Quiz mappings for section '{}':", section);
        for mapping in mappings {
            info!("  {}: covers lessons {:?}", mapping.quiz_file, mapping.lessons);
        }
    }

    /// Log the coverage of every section
    pub fn report(&self) {
        for section in self.sections.keys() {
            self.report_section(section);
        }
        info!("📊 {} quizzes across {} sections", self.quiz_count(), self.sections.len());
    }

    /// Write the manifest, replacing any previous one
    pub async fn persist(&self, path: &Path) -> Result<(), QuizError> {
        write_json_artifact(path, &self.sections, false).await?;
        info!("💾 Saved overall quiz mappings to {}", path.display());
        Ok(())
    }
}
