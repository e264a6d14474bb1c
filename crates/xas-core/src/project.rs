//! Project bundles: every processed series of a batch in one JSON file.

use crate::domain::{XafsGroup, XasError, XasResult};
use crate::serialization::write_text_artifact;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const PROJECT_FORMAT_VERSION: u32 = 1;
pub const PROJECT_EXTENSION: &str = "prj.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    pub format_version: u32,
    groups: Vec<XafsGroup>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format_version: PROJECT_FORMAT_VERSION,
            groups: Vec::new(),
        }
    }

    /// Adds a series, replacing any earlier one with the same label.
    pub fn add_group(&mut self, group: XafsGroup) {
        match self
            .groups
            .iter_mut()
            .find(|existing| existing.label == group.label)
        {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    pub fn group(&self, label: &str) -> Option<&XafsGroup> {
        self.groups.iter().find(|group| group.label == label)
    }

    pub fn groups(&self) -> &[XafsGroup] {
        &self.groups
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|group| group.label.as_str())
    }

    pub fn save(&self, path: &Path) -> XasResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            XasError::internal(
                "SYS.PROJECT_ENCODE",
                format!("failed to encode project '{}': {}", self.name, source),
            )
        })?;
        write_text_artifact(path, &json)
    }

    pub fn load(path: &Path) -> XasResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| {
            XasError::io_system(
                "IO.PROJECT_READ",
                format!("failed to read project '{}': {}", path.display(), source),
            )
        })?;
        let project: Self = serde_json::from_str(&content).map_err(|source| {
            XasError::input_validation(
                "INPUT.PROJECT_PARSE",
                format!("failed to parse project '{}': {}", path.display(), source),
            )
        })?;

        if project.format_version != PROJECT_FORMAT_VERSION {
            return Err(XasError::input_validation(
                "INPUT.PROJECT_VERSION",
                format!(
                    "project '{}' has format version {}, expected {}",
                    path.display(),
                    project.format_version,
                    PROJECT_FORMAT_VERSION
                ),
            ));
        }
        Ok(project)
    }
}
