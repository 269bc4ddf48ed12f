use std::path::{Path, PathBuf};

use crate::pipeline::PipelineError;
use crate::utils::filename::validate_flat_filename;

/// Kind of experiment selected on the upload form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentType {
    Ed,
    Tvips,
    Other(String),
}

impl ExperimentType {
    pub fn parse(value: &str) -> Self {
        match value {
            "ED" => Self::Ed,
            "TVIPS" => Self::Tvips,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Schema file for this experiment type; `fallback` is the user's
    /// choice and only applies to types without a fixed schema.
    pub fn schema_file<'a>(&self, fallback: &'a str) -> &'a str {
        match self {
            Self::Ed => "ED_mapping.json",
            Self::Tvips => "TVIPS_mapping.json",
            Self::Other(_) => fallback,
        }
    }
}

/// The directory of mapping schema files.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    dir: PathBuf,
}

impl SchemaCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the schema used for `experiment_type`.
    ///
    /// Only the file name is validated; a missing file surfaces later as a
    /// conversion failure.
    pub fn resolve(
        &self,
        experiment_type: &ExperimentType,
        fallback: &str,
    ) -> Result<PathBuf, PipelineError> {
        let name = validate_flat_filename(experiment_type.schema_file(fallback))
            .map_err(|e| PipelineError::Validation(format!("Schema file: {}", e.message())))?;
        Ok(self.dir.join(name))
    }

    /// `*.json` file names in the schema directory, sorted.
    pub async fn list(&self) -> std::io::Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && name.ends_with(".json")
            {
                names.push(name.to_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}
