//! Course directory structure audit
//!
//! Checks that sections and lessons follow the `<number>-<slug>` naming
//! convention without duplicates, and that every lesson holds a video.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::AuditConfig;
use nevermore_core::{split_numbered_name, CourseLayout};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AuditIssue {
    InvalidSectionName,
    DuplicateSectionNumber(u64),
    DuplicateSectionSlug(String),
    InvalidLessonName,
    DuplicateLessonNumber(u64),
    DuplicateLessonSlug(String),
    EmptyLesson,
    MissingVideo,
    VideoTooShort(f64),
    VideoTooLong(f64),
    UnreadableVideo(String),
}

/// A problem found at a path in the course tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditFinding {
    pub issue: AuditIssue,
    pub path: PathBuf,
}

impl fmt::Display for AuditFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.issue {
            AuditIssue::InvalidSectionName => write!(f, "Invalid section directory name: {path}"),
            AuditIssue::DuplicateSectionNumber(n) => write!(f, "Duplicate section number {n}: {path}"),
            AuditIssue::DuplicateSectionSlug(s) => write!(f, "Duplicate section slug '{s}': {path}"),
            AuditIssue::InvalidLessonName => write!(f, "Invalid lesson directory name: {path}"),
            AuditIssue::DuplicateLessonNumber(n) => write!(f, "Duplicate lesson number {n}: {path}"),
            AuditIssue::DuplicateLessonSlug(s) => write!(f, "Duplicate lesson slug '{s}': {path}"),
            AuditIssue::EmptyLesson => write!(f, "Lesson directory is empty: {path}"),
            AuditIssue::MissingVideo => write!(f, "No video file found in lesson: {path}"),
            AuditIssue::VideoTooShort(s) => write!(f, "Video is only {s:.1}s long: {path}"),
            AuditIssue::VideoTooLong(s) => write!(f, "Video runs {s:.1}s: {path}"),
            AuditIssue::UnreadableVideo(e) => write!(f, "Could not probe video {path}: {e}"),
        }
    }
}

/// Tracks numbers and slugs seen among sibling directories
#[derive(Default)]
struct SiblingNames {
    numbers: HashSet<u64>,
    slugs: HashSet<String>,
}

impl SiblingNames {
    /// Returns the duplicate number and/or slug of `name`, or `None` when the
    /// name is not `<number>-<slug>`
    fn check(&mut self, name: &str) -> Option<(Option<u64>, Option<String>)> {
        let (number, slug) = split_numbered_name(name)?;
        let dup_number = (!self.numbers.insert(number)).then_some(number);
        let dup_slug = (!self.slugs.insert(slug.to_string())).then(|| slug.to_string());
        Some((dup_number, dup_slug))
    }
}

pub struct StructureAuditor<'a> {
    layout: &'a CourseLayout,
    config: AuditConfig,
}

impl<'a> StructureAuditor<'a> {
    pub fn new(layout: &'a CourseLayout, config: AuditConfig) -> Self {
        Self { layout, config }
    }

    pub async fn audit(&self) -> Result<Vec<AuditFinding>> {
        let mut findings = Vec::new();
        let mut sections_seen = SiblingNames::default();

        for section in self.layout.sections()? {
            match sections_seen.check(&section.name) {
                None => {
                    findings.push(finding(AuditIssue::InvalidSectionName, &section.path));
                    continue;
                }
                Some((dup_number, dup_slug)) => {
                    if let Some(n) = dup_number {
                        findings.push(finding(AuditIssue::DuplicateSectionNumber(n), &section.path));
                    }
                    if let Some(s) = dup_slug {
                        findings.push(finding(AuditIssue::DuplicateSectionSlug(s), &section.path));
                    }
                }
            }

            let mut lessons_seen = SiblingNames::default();
            for lesson in self.layout.all_lessons(&section)? {
                match lessons_seen.check(&lesson.name) {
                    None => {
                        findings.push(finding(AuditIssue::InvalidLessonName, &lesson.path));
                        continue;
                    }
                    Some((dup_number, dup_slug)) => {
                        if let Some(n) = dup_number {
                            findings.push(finding(AuditIssue::DuplicateLessonNumber(n), &lesson.path));
                        }
                        if let Some(s) = dup_slug {
                            findings.push(finding(AuditIssue::DuplicateLessonSlug(s), &lesson.path));
                        }
                    }
                }

                findings.extend(self.audit_lesson(&lesson.path).await);
            }
        }

        info!("🔍 Structure audit found {} issue(s)", findings.len());
        Ok(findings)
    }

    async fn audit_lesson(&self, lesson_dir: &Path) -> Vec<AuditFinding> {
        let mut findings = Vec::new();
        let mut entry_count = 0;
        let mut videos = Vec::new();

        for entry in WalkDir::new(lesson_dir).min_depth(1).max_depth(1).into_iter().flatten() {
            entry_count += 1;
            if entry.file_type().is_file() && self.is_video_file(entry.path()) {
                videos.push(entry.into_path());
            }
        }

        if entry_count == 0 {
            findings.push(finding(AuditIssue::EmptyLesson, lesson_dir));
            return findings;
        }

        if videos.is_empty() {
            findings.push(finding(AuditIssue::MissingVideo, lesson_dir));
            return findings;
        }

        if self.config.probe_durations {
            for video in &videos {
                match probe_duration(video).await {
                    Ok(seconds) if seconds < self.config.min_video_seconds => {
                        findings.push(finding(AuditIssue::VideoTooShort(seconds), video));
                    }
                    Ok(seconds) if seconds > self.config.max_video_seconds => {
                        findings.push(finding(AuditIssue::VideoTooLong(seconds), video));
                    }
                    Ok(seconds) => debug!("🎬 {} runs {:.1}s", video.display(), seconds),
                    Err(e) => findings.push(finding(AuditIssue::UnreadableVideo(e.to_string()), video)),
                }
            }
        }

        findings
    }

    /// Check if a file has one of the configured video extensions
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.config
                    .video_extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

fn finding(issue: AuditIssue, path: &Path) -> AuditFinding {
    AuditFinding {
        issue,
        path: path.to_path_buf(),
    }
}

/// Video duration in seconds, read with ffprobe
async fn probe_duration(video_path: &Path) -> Result<f64> {
    let output = tokio::process::Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(video_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(anyhow!("ffprobe failed for {}", video_path.display()));
    }

    let ffprobe_data: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    ffprobe_data["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| anyhow!("No duration reported for {}", video_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nevermore_core::ArtifactNames;
    use std::fs;
    use tempfile::TempDir;

    fn course() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        // Valid lesson
        fs::create_dir_all(root.join("1-basics/1-intro")).unwrap();
        fs::write(root.join("1-basics/1-intro/video.MP4"), b"v").unwrap();

        // Duplicate lesson number, slug unique
        fs::create_dir_all(root.join("1-basics/01-setup")).unwrap();
        fs::write(root.join("1-basics/01-setup/video.mov"), b"v").unwrap();

        // Empty lesson
        fs::create_dir_all(root.join("1-basics/2-empty")).unwrap();

        // Lesson with questions but no video
        fs::create_dir_all(root.join("1-basics/3-no-video")).unwrap();
        fs::write(root.join("1-basics/3-no-video/questions.json"), b"[]").unwrap();

        // Badly named lesson
        fs::create_dir_all(root.join("1-basics/extras")).unwrap();

        // Duplicate section slug and a badly named section
        fs::create_dir_all(root.join("2-basics")).unwrap();
        fs::create_dir_all(root.join("appendix")).unwrap();

        dir
    }

    #[tokio::test]
    async fn test_audit_reports_structure_issues() {
        let dir = course();
        let layout = CourseLayout::new(dir.path(), ArtifactNames::default());
        let auditor = StructureAuditor::new(&layout, AuditConfig::default());

        let findings = auditor.audit().await.unwrap();
        let issues: Vec<_> = findings.iter().map(|f| f.issue.clone()).collect();

        assert!(issues.contains(&AuditIssue::DuplicateLessonNumber(1)));
        assert!(issues.contains(&AuditIssue::EmptyLesson));
        assert!(issues.contains(&AuditIssue::MissingVideo));
        assert!(issues.contains(&AuditIssue::InvalidLessonName));
        assert!(issues.contains(&AuditIssue::DuplicateSectionSlug("basics".to_string())));
        assert!(issues.contains(&AuditIssue::InvalidSectionName));
        assert_eq!(findings.len(), 6);

        let empty = findings.iter().find(|f| f.issue == AuditIssue::EmptyLesson).unwrap();
        assert!(empty.path.ends_with("2-empty"));
        assert!(empty.to_string().contains("empty"));
    }

    #[test]
    fn test_video_extension_match_is_case_insensitive() {
        let layout = CourseLayout::new("/course", ArtifactNames::default());
        let auditor = StructureAuditor::new(&layout, AuditConfig::default());

        assert!(auditor.is_video_file(Path::new("a/lesson.MOV")));
        assert!(auditor.is_video_file(Path::new("a/lesson.mp4")));
        assert!(!auditor.is_video_file(Path::new("a/questions.json")));
        assert!(!auditor.is_video_file(Path::new("a/mp4")));
    }
}
