use anyhow::{anyhow, Context, Result};
use nevermore_core::ArtifactNames;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Configuration for the Nevermore quiz assembler
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiz grouping and summary sizing
    pub quiz: QuizConfig,

    /// Names of the artifacts read and written
    pub artifacts: ArtifactNames,

    /// Run behaviour
    pub processing: ProcessingConfig,

    /// Structure audit settings
    pub audit: AuditConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Lessons per primary quiz
    pub lessons_per_quiz: usize,

    /// Maximum questions per summary quiz file
    pub summary_cap: usize,

    /// Minimum summary questions per section, backfilled when short
    pub min_summary: usize,

    /// Lesson directory names excluded from every quiz
    pub omitted_lessons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Leave quiz files that already exist untouched
    pub skip_existing: bool,

    /// Fixed seed for reproducible sampling
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Lesson video extensions, without the dot
    pub video_extensions: Vec<String>,

    /// Probe video durations with ffprobe
    pub probe_durations: bool,

    /// Shortest acceptable video, in seconds
    pub min_video_seconds: f64,

    /// Longest acceptable video, in seconds
    pub max_video_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is unset
    pub level: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            lessons_per_quiz: 10,
            summary_cap: 35,
            min_summary: 8,
            omitted_lessons: Vec::new(),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            skip_existing: true,
            seed: None,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            video_extensions: vec!["mp4".to_string(), "mov".to_string()],
            probe_durations: false,
            min_video_seconds: 1.0,
            max_video_seconds: 1800.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl QuizConfig {
    pub fn omitted_set(&self) -> HashSet<String> {
        self.omitted_lessons.iter().cloned().collect()
    }
}

impl Config {
    /// Load configuration from the first config file found, falling back to
    /// defaults. Environment overrides are applied either way.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with_source(explicit).map(|(config, _)| config)
    }

    /// Like [`Config::load`], also returning the file the settings came from
    pub fn load_with_source(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let (mut config, source) = match explicit {
            Some(path) => (Self::from_file(path)?, Some(path.to_path_buf())),
            None => match Self::search() {
                Some((config, path)) => (config, Some(path)),
                None => (Self::default(), None),
            },
        };
        config.apply_env()?;
        Ok((config, source))
    }

    fn search() -> Option<(Self, PathBuf)> {
        let config_paths = ["nevermore-quiz.toml", "config/nevermore-quiz.toml"];

        for path in &config_paths {
            let path = Path::new(path);
            if !path.exists() {
                continue;
            }
            match Self::from_file(path) {
                Ok(config) => return Some((config, path.to_path_buf())),
                Err(e) => tracing::warn!("Failed to parse config file {}: {:#}", path.display(), e),
            }
        }

        None
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        tracing::debug!("Parsed configuration file {}", path.display());
        Ok(config)
    }

    /// Override settings from `NEVERMORE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var("NEVERMORE_LESSONS_PER_QUIZ") {
            self.quiz.lessons_per_quiz = value
                .parse()
                .with_context(|| format!("Invalid NEVERMORE_LESSONS_PER_QUIZ: {value}"))?;
        }

        if let Ok(value) = std::env::var("NEVERMORE_SUMMARY_CAP") {
            self.quiz.summary_cap = value
                .parse()
                .with_context(|| format!("Invalid NEVERMORE_SUMMARY_CAP: {value}"))?;
        }

        if let Ok(value) = std::env::var("NEVERMORE_MIN_SUMMARY") {
            self.quiz.min_summary = value
                .parse()
                .with_context(|| format!("Invalid NEVERMORE_MIN_SUMMARY: {value}"))?;
        }

        if let Ok(value) = std::env::var("NEVERMORE_OMIT") {
            self.quiz.omitted_lessons.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from),
            );
        }

        if let Ok(value) = std::env::var("NEVERMORE_SEED") {
            self.processing.seed = Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid NEVERMORE_SEED: {value}"))?,
            );
        }

        if let Ok(level) = std::env::var("NEVERMORE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.quiz.lessons_per_quiz == 0 {
            return Err(anyhow!("lessons_per_quiz must be greater than 0"));
        }

        if self.quiz.summary_cap == 0 {
            return Err(anyhow!("summary_cap must be greater than 0"));
        }

        let names = [
            ("questions_file", &self.artifacts.questions_file),
            ("quiz_prefix", &self.artifacts.quiz_prefix),
            ("summary_prefix", &self.artifacts.summary_prefix),
            ("mapping_file", &self.artifacts.mapping_file),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(anyhow!("artifacts.{key} must not be empty"));
            }
        }

        if self.artifacts.quiz_prefix == self.artifacts.summary_prefix {
            return Err(anyhow!("quiz_prefix and summary_prefix must differ"));
        }

        if self.audit.min_video_seconds > self.audit.max_video_seconds {
            return Err(anyhow!("audit.min_video_seconds exceeds audit.max_video_seconds"));
        }

        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Nevermore Quiz Configuration:\n\
            - Lessons per quiz: {}\n\
            - Summary cap: {}\n\
            - Minimum summary questions: {}\n\
            - Omitted lessons: {}\n\
            - Skip existing: {}\n\
            - Seed: {}",
            self.quiz.lessons_per_quiz,
            self.quiz.summary_cap,
            self.quiz.min_summary,
            if self.quiz.omitted_lessons.is_empty() {
                "none".to_string()
            } else {
                self.quiz.omitted_lessons.join(", ")
            },
            self.processing.skip_existing,
            self.processing
                .seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string()),
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_lessons_per_quiz(mut self, lessons: usize) -> Self {
        self.config.quiz.lessons_per_quiz = lessons;
        self
    }

    pub fn with_summary_cap(mut self, cap: usize) -> Self {
        self.config.quiz.summary_cap = cap;
        self
    }

    pub fn with_min_summary(mut self, min: usize) -> Self {
        self.config.quiz.min_summary = min;
        self
    }

    pub fn omit_lesson(mut self, name: impl Into<String>) -> Self {
        self.config.quiz.omitted_lessons.push(name.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.processing.seed = Some(seed);
        self
    }

    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.config.processing.skip_existing = skip;
        self
    }

    pub fn probe_durations(mut self, probe: bool) -> Self {
        self.config.audit.probe_durations = probe;
        self
    }

    pub fn with_video_extensions(mut self, extensions: &[&str]) -> Self {
        self.config.audit.video_extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default location for a generated config file
pub fn default_config_path() -> PathBuf {
    PathBuf::from("nevermore-quiz.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.quiz.lessons_per_quiz, 10);
        assert_eq!(config.quiz.summary_cap, 35);
        assert_eq!(config.quiz.min_summary, 8);
        assert!(config.quiz.omitted_lessons.is_empty());
        assert!(config.processing.skip_existing);
        assert_eq!(config.artifacts.mapping_file, "quiz_mappings.json");
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_lessons_per_quiz(5)
            .with_summary_cap(20)
            .with_min_summary(3)
            .omit_lesson("1-introduction")
            .with_seed(42)
            .build();

        assert_eq!(config.quiz.lessons_per_quiz, 5);
        assert_eq!(config.quiz.summary_cap, 20);
        assert_eq!(config.quiz.min_summary, 3);
        assert!(config.quiz.omitted_set().contains("1-introduction"));
        assert_eq!(config.processing.seed, Some(42));
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(ConfigBuilder::new().with_lessons_per_quiz(0).build().validate().is_err());
        assert!(ConfigBuilder::new().with_summary_cap(0).build().validate().is_err());
        assert!(ConfigBuilder::new().with_min_summary(0).build().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nevermore-quiz.toml");
        std::fs::write(
            &path,
            "[quiz]\nlessons_per_quiz = 4\nomitted_lessons = [\"50-recap\"]\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.quiz.lessons_per_quiz, 4);
        assert_eq!(config.quiz.summary_cap, 35);
        assert_eq!(config.quiz.omitted_lessons, vec!["50-recap"]);
        assert_eq!(config.artifacts.questions_file, "questions.json");
    }

    #[test]
    fn test_save_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");
        let config = ConfigBuilder::new().with_min_summary(2).build();

        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.quiz.min_summary, 2);
    }

    #[test]
    fn test_load_reports_explicit_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.toml");
        std::fs::write(&path, "[quiz]\nsummary_cap = 12\n").unwrap();

        let (config, source) = Config::load_with_source(Some(&path)).unwrap();
        assert_eq!(source.as_deref(), Some(path.as_path()));
        assert_eq!(config.quiz.summary_cap, 12);

        assert!(Config::load_with_source(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
