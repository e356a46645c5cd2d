//! Course directory layout: `course/<section>/<lesson>/` and artifact paths

use crate::naming::sort_naturally;
use crate::{CourseError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// File names of the artifacts read and written inside a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    /// Per-lesson question pool
    pub questions_file: String,

    /// Prefix of primary quiz files (`<prefix>-<n>.json`)
    pub quiz_prefix: String,

    /// Prefix of summary quiz files (`<prefix>-<n>.json`)
    pub summary_prefix: String,

    /// Course-level quiz-to-lesson manifest
    pub mapping_file: String,
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            questions_file: crate::QUESTIONS_FILE.to_string(),
            quiz_prefix: "quiz".to_string(),
            summary_prefix: "summary_quiz".to_string(),
            mapping_file: "quiz_mappings.json".to_string(),
        }
    }
}

/// A section directory inside a course
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub path: PathBuf,
}

/// A lesson directory inside a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    pub name: String,
    pub path: PathBuf,
}

/// Resolves sections, lessons and artifact paths for one course
#[derive(Debug, Clone)]
pub struct CourseLayout {
    root: PathBuf,
    names: ArtifactNames,
}

impl CourseLayout {
    pub fn new(root: impl Into<PathBuf>, names: ArtifactNames) -> Self {
        Self {
            root: root.into(),
            names,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn names(&self) -> &ArtifactNames {
        &self.names
    }

    /// Sections of the course in plain name order
    pub fn sections(&self) -> Result<Vec<Section>> {
        if !self.root.is_dir() {
            return Err(CourseError::Path(format!(
                "Course directory does not exist: {}",
                self.root.display()
            )));
        }

        let mut names = subdirectory_names(&self.root)?;
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| Section {
                path: self.root.join(&name),
                name,
            })
            .collect())
    }

    /// Every lesson directory of a section, in natural order
    pub fn all_lessons(&self, section: &Section) -> Result<Vec<Lesson>> {
        let mut names = subdirectory_names(&section.path)?;
        sort_naturally(&mut names);

        Ok(names
            .into_iter()
            .map(|name| Lesson {
                path: section.path.join(&name),
                name,
            })
            .collect())
    }

    /// Lessons of a section in natural order, without the omitted ones
    pub fn lessons(&self, section: &Section, omitted: &HashSet<String>) -> Result<Vec<Lesson>> {
        Ok(self
            .all_lessons(section)?
            .into_iter()
            .filter(|lesson| {
                let keep = !omitted.contains(&lesson.name);
                if !keep {
                    info!("⏭️ Skipping omitted lesson: {}", lesson.name);
                }
                keep
            })
            .collect())
    }

    pub fn questions_path(&self, lesson: &Lesson) -> PathBuf {
        lesson.path.join(&self.names.questions_file)
    }

    /// File name of the `index`-th quiz (1-based)
    pub fn quiz_file_name(&self, index: usize) -> String {
        format!("{}-{}.json", self.names.quiz_prefix, index)
    }

    /// File name of the `index`-th summary quiz chunk (1-based)
    pub fn summary_file_name(&self, index: usize) -> String {
        format!("{}-{}.json", self.names.summary_prefix, index)
    }

    pub fn quiz_path(&self, section: &Section, index: usize) -> PathBuf {
        section.path.join(self.quiz_file_name(index))
    }

    pub fn summary_path(&self, section: &Section, index: usize) -> PathBuf {
        section.path.join(self.summary_file_name(index))
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.root.join(&self.names.mapping_file)
    }

    /// Existing primary quiz files of a section, ordered by index
    pub fn existing_quiz_files(&self, section: &Section) -> Result<Vec<PathBuf>> {
        numbered_files(&section.path, &self.names.quiz_prefix)
    }

    /// Existing summary quiz files of a section, ordered by index
    pub fn existing_summary_files(&self, section: &Section) -> Result<Vec<PathBuf>> {
        numbered_files(&section.path, &self.names.summary_prefix)
    }
}

/// Names of the immediate, non-hidden subdirectories of `dir`
fn subdirectory_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CourseError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            debug!("Ignoring hidden directory {}", entry.path().display());
            continue;
        }
        names.push(name);
    }

    Ok(names)
}

/// Files named exactly `<prefix>-<n>.json` in `dir`, sorted by `n`
fn numbered_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let pattern = Regex::new(&format!(r"^{}-(\d+)\.json$", regex::escape(prefix)))
        .map_err(|e| CourseError::Path(format!("Invalid artifact prefix {prefix}: {e}")))?;

    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| CourseError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let index = pattern
            .captures(&name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok());
        if let Some(index) = index {
            found.push((index, entry.into_path()));
        }
    }

    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sections_are_sorted_and_skip_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("2-advanced")).unwrap();
        fs::create_dir(dir.path().join("1-basics")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("quiz_mappings.json"), "{}").unwrap();

        let layout = CourseLayout::new(dir.path(), ArtifactNames::default());
        let sections = layout.sections().unwrap();
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["1-basics", "2-advanced"]);
    }

    #[test]
    fn test_missing_course_dir() {
        let layout = CourseLayout::new("/definitely/not/here", ArtifactNames::default());
        assert!(matches!(layout.sections(), Err(CourseError::Path(_))));
    }

    #[test]
    fn test_numbered_files_only_match_exact_prefix() {
        let dir = TempDir::new().unwrap();
        for name in ["quiz-10.json", "quiz-2.json", "summary_quiz-1.json", "quiz-x.json", "quiz-1.json.tmp"] {
            fs::write(dir.path().join(name), "[]").unwrap();
        }

        let layout = CourseLayout::new(dir.path(), ArtifactNames::default());
        let section = Section {
            name: "s".to_string(),
            path: dir.path().to_path_buf(),
        };

        let quizzes = layout.existing_quiz_files(&section).unwrap();
        let names: Vec<_> = quizzes
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["quiz-2.json", "quiz-10.json"]);

        let summaries = layout.existing_summary_files(&section).unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn test_artifact_paths() {
        let layout = CourseLayout::new("/course", ArtifactNames::default());
        let section = Section {
            name: "1-basics".to_string(),
            path: PathBuf::from("/course/1-basics"),
        };

        assert_eq!(layout.quiz_path(&section, 3), PathBuf::from("/course/1-basics/quiz-3.json"));
        assert_eq!(
            layout.summary_path(&section, 1),
            PathBuf::from("/course/1-basics/summary_quiz-1.json")
        );
        assert_eq!(layout.mapping_path(), PathBuf::from("/course/quiz_mappings.json"));
    }
}
