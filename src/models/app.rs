use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::utils::{AppError, AppResult};

/// An installed application as handed over by whatever enumerated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,
    pub install_path: PathBuf,
}

impl Application {
    pub fn new(name: impl Into<String>, install_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            install_path: install_path.into(),
        }
    }

    /// Build an application from its bundle path, naming it after the bundle
    /// (`/Applications/Foo Bar.app` → `Foo Bar`).
    pub fn from_bundle_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Unknown")
            .to_string();
        Self {
            name,
            install_path: path.to_path_buf(),
        }
    }

    /// Like [`Application::from_bundle_path`], for a path given by a user:
    /// relative paths, `..` and symlinks are resolved first.
    pub fn resolve(path: &Path) -> AppResult<Self> {
        let canonical = std::fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(path.display().to_string()),
            _ => AppError::Io(e),
        })?;
        Ok(Self::from_bundle_path(&canonical))
    }
}

/// Every name an application may have used when writing files outside its bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub display_name: String,
    pub normalized_no_spaces: String,
    pub normalized_alnum: String,
    pub bundle_identifier: Option<String>,
    pub manifest_aliases: BTreeSet<String>,
}

impl Identity {
    /// Identifier strings to expand templates with, in a fixed order, without
    /// empties or repeats.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let candidates = [
            Some(self.display_name.as_str()),
            Some(self.normalized_no_spaces.as_str()),
            Some(self.normalized_alnum.as_str()),
            self.bundle_identifier.as_deref(),
        ];
        for id in candidates
            .into_iter()
            .flatten()
            .chain(self.manifest_aliases.iter().map(String::as_str))
        {
            if !id.is_empty() && !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }
}
