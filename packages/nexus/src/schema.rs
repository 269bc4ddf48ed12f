use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

/// Describes how source-image metadata maps into container entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingSchema {
    pub name: String,
    pub version: String,
    /// NeXus application definition recorded on the entry, e.g. `NXem`.
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
}

/// One source field → container entry rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldMapping {
    /// Source metadata name (a TIFF tag such as `Model`).
    pub source: String,
    /// `/`-separated path below `NXentry`; the last segment names the
    /// dataset (or attribute), the others are groups.
    pub target: String,
    /// Write an attribute on the parent group instead of a dataset.
    #[serde(default)]
    pub attribute: bool,
    #[serde(default)]
    pub units: Option<String>,
}

impl FieldMapping {
    /// Split the target into its group path and leaf name.
    pub fn target_parts(&self) -> (Vec<&str>, &str) {
        let mut segments: Vec<&str> = self.target.split('/').collect();
        let leaf = segments.pop().unwrap_or_default();
        (segments, leaf)
    }
}

impl MappingSchema {
    /// Read and validate a schema file.
    pub fn load(path: &Path) -> Result<Self, ConversionError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConversionError::Schema(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConversionError> {
        let schema: Self = serde_json::from_str(text)?;
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), ConversionError> {
        if self.name.trim().is_empty() {
            return Err(ConversionError::Schema("schema name is empty".into()));
        }
        for field in &self.fields {
            if field.source.trim().is_empty() {
                return Err(ConversionError::Schema(format!(
                    "mapping for '{}' has an empty source",
                    field.target
                )));
            }
            if field
                .target
                .split('/')
                .any(|segment| segment.is_empty() || segment == "." || segment == "..")
            {
                return Err(ConversionError::Schema(format!(
                    "invalid target path '{}'",
                    field.target
                )));
            }
        }
        Ok(())
    }
}
