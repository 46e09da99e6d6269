//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the marker directory holding the database and config
pub const MARKER_DIR: &str = ".qcd";

/// Represents a QCD workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root directory of the workspace (parent of .qcd/)
    root: PathBuf,
}

impl Workspace {
    /// Find workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(MARKER_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path, force: bool) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(path).map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        let marker = root.join(MARKER_DIR);
        if marker.exists() && !force {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        std::fs::create_dir_all(&marker).map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::create_dir_all(root.join("exports"))
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        let config_path = marker.join("config.yaml");
        if !config_path.exists() || force {
            std::fs::write(&config_path, Self::default_config())
                .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        }

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# QCD Workspace Configuration

# Name recorded on exported reports (can be overridden by global config)
# author: ""

# Inspector (short ID or name) preselected in MDR and inspection forms
# default_inspector: ""

# Default output format (auto, yaml, tsv, json, csv, md, id, short-id)
# default_format: auto

# Directory PDF/Markdown exports are written to, relative to the workspace root
# export_dir: exports

# Welders with a repair rate (percent) strictly below this are in good standing
# repair_rate_threshold: 5.0
"#
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .qcd directory
    pub fn marker_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    /// Path of the SQLite database
    pub fn db_path(&self) -> PathBuf {
        self.marker_dir().join("qcd.db")
    }

    /// Path of the workspace config file
    pub fn config_path(&self) -> PathBuf {
        self.marker_dir().join("config.yaml")
    }

    /// Resolve a possibly relative path against the workspace root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a QCD workspace (searched from {searched_from:?}). Run 'qcd init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("QCD workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_workspace_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let ws = Workspace::init(tmp.path(), false).unwrap();

        assert!(ws.marker_dir().is_dir());
        assert!(ws.config_path().exists());
        assert!(ws.root().join("exports").is_dir());
    }

    #[test]
    fn test_workspace_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path(), false).unwrap();

        let err = Workspace::init(tmp.path(), false).unwrap_err();
        assert!(matches!(err, WorkspaceError::AlreadyExists(_)));

        assert!(Workspace::init(tmp.path(), true).is_ok());
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Workspace::init(tmp.path(), false).unwrap();

        let sub = tmp.path().join("a/b/c");
        std::fs::create_dir_all(&sub).unwrap();

        let ws = Workspace::discover_from(&sub).unwrap();
        assert_eq!(ws.root(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_discover_fails_outside_workspace() {
        let tmp = tempdir().unwrap();
        let err = Workspace::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotFound { .. }));
    }
}
