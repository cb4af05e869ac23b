use crate::CoreError;
use kiln_toolchain::ToolchainConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-user defaults, read from `~/.config/kiln/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KilnConfig {
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Profile used when the command line names none.
    #[serde(default)]
    pub default_profile: Option<PathBuf>,
    /// Build tool backend (`cmake` or `mock`).
    #[serde(default)]
    pub tool: Option<String>,
}

impl KilnConfig {
    /// Load the user config. A missing file yields the defaults.
    pub fn load_default() -> Result<Self, CoreError> {
        let path = default_config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            CoreError::Config(format!("invalid config {}: {e}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn tool_name(&self) -> &str {
        self.tool.as_deref().unwrap_or("cmake")
    }
}

pub fn default_config_path() -> Result<PathBuf, CoreError> {
    let home = std::env::var("HOME").map_err(|_| CoreError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/kiln/config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = KilnConfig {
            toolchain: ToolchainConfig {
                cmake_program: "/opt/cmake/bin/cmake".to_owned(),
                generator: Some("Ninja".to_owned()),
                jobs: Some(8),
            },
            default_profile: Some(PathBuf::from("/home/dev/profiles/gcc11")),
            tool: Some("mock".to_owned()),
        };
        config.save(&path).unwrap();

        assert_eq!(KilnConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"toolchain": {"generator": "Ninja"}}"#).unwrap();

        let config = KilnConfig::load(&path).unwrap();
        assert_eq!(config.toolchain.cmake_program, "cmake");
        assert_eq!(config.toolchain.generator.as_deref(), Some("Ninja"));
        assert_eq!(config.tool_name(), "cmake");
        assert!(config.default_profile.is_none());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"remote": "x"}"#).unwrap();
        assert!(matches!(
            KilnConfig::load(&path),
            Err(CoreError::Config(_))
        ));
    }
}
