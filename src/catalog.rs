use crate::ir::Diagram;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: json5::Error,
    },
    #[error("unknown project id: {0}")]
    UnknownProject(String),
}

// One diagram per project id, the content-store side of the renderer.
// The renderer itself never sees the catalog, only a single Diagram.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(flatten)]
    projects: BTreeMap<String, Diagram>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    // Catalog documents are hand-maintained content; json5 accepts the
    // comments and trailing commas that strict JSON rejects.
    pub fn parse(contents: &str) -> Result<Self, json5::Error> {
        json5::from_str(contents)
    }

    pub fn get(&self, project_id: &str) -> Result<&Diagram, CatalogError> {
        self.projects
            .get(project_id)
            .ok_or_else(|| CatalogError::UnknownProject(project_id.to_string()))
    }

    pub fn project_ids(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }
}
