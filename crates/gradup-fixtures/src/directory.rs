//! Assessments loaded from a directory of TOML files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use gradup_core::model::{Assessment, AssessmentInfo};
use gradup_core::parser::load_assessment_directory;
use gradup_core::traits::AssessmentSource;

use crate::error::FixtureError;

/// Reads every `.toml` assessment under a directory on each call, so edits
/// show up without a restart.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn load(&self) -> Result<Vec<Assessment>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_assessment_directory(&dir))
            .await
            .context("assessment loader task failed")?
    }
}

#[async_trait]
impl AssessmentSource for DirectorySource {
    fn name(&self) -> &str {
        "directory"
    }

    async fn list_assessments(&self) -> Result<Vec<AssessmentInfo>> {
        Ok(self.load().await?.iter().map(Assessment::info).collect())
    }

    async fn fetch_assessment(&self, id: &str) -> Result<Assessment> {
        let found = self.load().await?.into_iter().find(|a| a.id == id);
        match found {
            Some(assessment) => Ok(assessment),
            None => {
                tracing::debug!(dir = %self.dir.display(), id, "assessment not in directory");
                Err(FixtureError::NotFound(id.to_string()).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
[assessment]
id = "small"
title = "Small"
duration_minutes = 5

[[phases]]
label = "Only"

[[phases.sections]]
label = "Domain"
category = "domain"

[[phases.sections.questions]]
id = "d1"
kind = "free_text"
prompt = "Explain normalization."
"#;

    #[tokio::test]
    async fn lists_and_fetches_from_nested_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("small.toml"), SMALL).unwrap();

        let source = DirectorySource::new(dir.path());
        let infos = source.list_assessments().await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].id, "small");
        assert_eq!(infos[0].question_count, 1);

        let assessment = source.fetch_assessment("small").await.unwrap();
        assert_eq!(assessment.phases[0].label, "Only");
    }

    #[tokio::test]
    async fn picks_up_files_added_later() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(source.list_assessments().await.unwrap().is_empty());

        std::fs::write(dir.path().join("small.toml"), SMALL).unwrap();
        assert_eq!(source.list_assessments().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_id_and_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        let err = source.fetch_assessment("small").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FixtureError>(),
            Some(FixtureError::NotFound(_))
        ));

        let gone = DirectorySource::new(dir.path().join("absent"));
        let err = gone.list_assessments().await.unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
