//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Workspace;
use crate::entities::welder::DEFAULT_REPAIR_RATE_THRESHOLD;

/// QCD configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name recorded on exported reports
    pub author: Option<String>,

    /// Inspector preselected in MDR and inspection forms
    pub default_inspector: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Directory exports are written to
    pub export_dir: Option<PathBuf>,

    /// Repair rate (percent) below which a welder is in good standing
    pub repair_rate_threshold: Option<f64>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/qcd/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Workspace config (.qcd/config.yaml)
        if let Some(ws) = workspace {
            if let Some(local) = Self::read_file(&ws.config_path()) {
                config.merge(local);
            }
        }

        // 4. Environment variables
        if let Ok(author) = std::env::var("QCD_AUTHOR") {
            config.author = Some(author);
        }
        if let Ok(inspector) = std::env::var("QCD_INSPECTOR") {
            config.default_inspector = Some(inspector);
        }
        if let Ok(dir) = std::env::var("QCD_EXPORT_DIR") {
            config.export_dir = Some(PathBuf::from(dir));
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read config file");
                return None;
            }
        };
        match serde_yml::from_str::<Config>(&contents) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "qcd")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.default_inspector.is_some() {
            self.default_inspector = other.default_inspector;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.export_dir.is_some() {
            self.export_dir = other.export_dir;
        }
        if other.repair_rate_threshold.is_some() {
            self.repair_rate_threshold = other.repair_rate_threshold;
        }
    }

    /// Get the author name, falling back to the login name
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }

    /// Welder repair rate threshold in percent
    pub fn repair_rate_threshold(&self) -> f64 {
        self.repair_rate_threshold
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(DEFAULT_REPAIR_RATE_THRESHOLD)
    }

    /// Directory exports are written to, resolved against the workspace
    pub fn export_dir(&self, workspace: &Workspace) -> PathBuf {
        let dir = self
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("exports"));
        workspace.resolve(&dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            author: Some("a".to_string()),
            repair_rate_threshold: Some(4.0),
            ..Default::default()
        };
        base.merge(Config {
            author: Some("b".to_string()),
            ..Default::default()
        });
        assert_eq!(base.author.as_deref(), Some("b"));
        assert_eq!(base.repair_rate_threshold(), 4.0);
    }

    #[test]
    fn test_threshold_defaults() {
        let config = Config::default();
        assert_eq!(config.repair_rate_threshold(), DEFAULT_REPAIR_RATE_THRESHOLD);

        let config = Config {
            repair_rate_threshold: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(config.repair_rate_threshold(), DEFAULT_REPAIR_RATE_THRESHOLD);
    }

    #[test]
    fn test_parse_yaml() {
        let config: Config =
            serde_yml::from_str("author: QA Lead\nrepair_rate_threshold: 3.5\n").unwrap();
        assert_eq!(config.author.as_deref(), Some("QA Lead"));
        assert_eq!(config.repair_rate_threshold(), 3.5);
    }
}
