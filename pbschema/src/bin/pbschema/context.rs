use anyhow::{Context, Result};
use pbschema::DiffEngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".pbschema";
pub const CONFIG_FILE: &str = "config.toml";

/// Project context for pbschema operations
pub struct ProjectContext {
    /// Directory containing `.pbschema/`
    pub project_root: PathBuf,
    /// Path to .pbschema directory
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    /// Directory holding the collection JSON files
    pub schema_dir: PathBuf,
    /// Recorded snapshot of the last applied schema
    pub snapshot_path: PathBuf,
    /// Loaded configuration, defaults when no config file exists
    pub config: PbschemaConfig,
}

/// Configuration stored in .pbschema/config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PbschemaConfig {
    #[serde(default)]
    pub pbschema: PathSettings,
    #[serde(default)]
    pub diff: DiffEngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSettings {
    #[serde(default = "default_schema_dir")]
    pub schema_dir: String,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            schema_dir: default_schema_dir(),
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_schema_dir() -> String {
    "pb_schema".to_string()
}

fn default_snapshot_path() -> String {
    ".pbschema/snapshot.json".to_string()
}

impl ProjectContext {
    /// Find and load project context from current directory or ancestors
    pub fn find() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::find_from(&current_dir)
    }

    /// Find project context starting from the given directory.
    ///
    /// Falls back to `start` itself when no ancestor has been initialized.
    pub fn find_from(start: &Path) -> Result<Self> {
        let project_root = Self::find_project_root(start).unwrap_or_else(|| start.to_path_buf());
        Self::from_root(project_root)
    }

    /// Create context from a known project root
    pub fn from_root(project_root: PathBuf) -> Result<Self> {
        let state_dir = project_root.join(STATE_DIR);
        let config_path = state_dir.join(CONFIG_FILE);

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            parse_config(&content).with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            PbschemaConfig::default()
        };

        Ok(Self {
            schema_dir: project_root.join(&config.pbschema.schema_dir),
            snapshot_path: project_root.join(&config.pbschema.snapshot_path),
            project_root,
            state_dir,
            config_path,
            config,
        })
    }

    /// Walk up from `start` looking for a `.pbschema/config.toml`
    fn find_project_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| dir.join(STATE_DIR).join(CONFIG_FILE).is_file())
            .map(Path::to_path_buf)
    }

    /// Check if pbschema is initialized in this project
    pub fn is_initialized(&self) -> bool {
        self.state_dir.exists() && self.config_path.exists()
    }

    /// Path relative to the project root, for display
    pub fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.project_root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

pub fn parse_config(content: &str) -> pbschema::Result<PbschemaConfig> {
    toml::from_str(content).map_err(|err| pbschema::SchemaError::InvalidConfig {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbschema::Severity;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = PbschemaConfig::default();
        assert_eq!(config.pbschema.schema_dir, "pb_schema");
        assert_eq!(config.pbschema.snapshot_path, ".pbschema/snapshot.json");
        assert_eq!(config.diff, DiffEngineConfig::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = PbschemaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("schema_dir"));
        assert!(toml_str.contains("severity_threshold"));
        assert_eq!(parse_config(&toml_str).unwrap(), config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config("[diff]\nseverity_threshold = \"low\"\n").unwrap();
        assert_eq!(config.diff.severity_threshold, Severity::Low);
        assert!(config.diff.require_force_for_destructive);
        assert_eq!(config.pbschema, PathSettings::default());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = parse_config("[diff]\nseverity_threshold = \"extreme\"\n").unwrap_err();
        assert!(matches!(err, pbschema::SchemaError::InvalidConfig { .. }));
    }

    #[test]
    fn test_find_walks_up_to_initialized_root() {
        let temp = TempDir::new().unwrap();
        let state = temp.path().join(STATE_DIR);
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(state.join(CONFIG_FILE), "[pbschema]\nschema_dir = \"schema\"\n").unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = ProjectContext::find_from(&nested).unwrap();
        assert_eq!(ctx.project_root, temp.path());
        assert!(ctx.is_initialized());
        assert_eq!(ctx.schema_dir, temp.path().join("schema"));
        assert_eq!(ctx.display_path(&ctx.schema_dir), "schema");
    }

    #[test]
    fn test_uninitialized_directory_falls_back_to_start() {
        let temp = TempDir::new().unwrap();
        let ctx = ProjectContext::find_from(temp.path()).unwrap();
        assert_eq!(ctx.project_root, temp.path());
        assert!(!ctx.is_initialized());
        assert_eq!(ctx.config, PbschemaConfig::default());
    }
}
