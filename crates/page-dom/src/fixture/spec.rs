//! Page descriptions loaded from YAML or JSON files

use std::path::Path;

use pagepilot_core_types::Viewport;
use serde::{Deserialize, Serialize};

use super::builder::{ElementSpec, PageBuilder};
use super::FixtureDocument;
use crate::errors::FixtureError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSpec {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub body: Vec<ElementSpec>,
}

impl PageSpec {
    pub fn from_yaml(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load by extension: `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, FixtureError> {
        let raw = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&raw),
            _ => Self::from_yaml(&raw),
        }
    }

    pub fn into_document(self) -> FixtureDocument {
        let mut builder = PageBuilder::new(self.url, self.title).children(self.body);
        if let Some(viewport) = self.viewport {
            builder = builder.viewport(viewport.width, viewport.height);
        }
        builder.build()
    }
}
