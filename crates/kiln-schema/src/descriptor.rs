use crate::reference::ReferenceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the package descriptor inside a recipe folder.
pub const DESCRIPTOR_FILE: &str = "kiln.toml";

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse descriptor: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("package.name must not be empty")]
    EmptyName,
    #[error("invalid package name '{0}'")]
    InvalidName(String),
    #[error("package.version must not be declared; it is derived from source control")]
    DeclaredVersion,
    #[error("invalid requirement: {0}")]
    Reference(#[from] ReferenceError),
    #[error("package '{0}' is required more than once")]
    DuplicateRequirement(String),
    #[error("unknown setting '{0}' in package.settings (expected os, compiler, build_type, arch)")]
    UnknownSetting(String),
    #[error("option '{0}' is not declared by this package")]
    UnknownOption(String),
    #[error("invalid exports_sources pattern '{0}'")]
    InvalidExportPattern(String),
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    pub package: PackageSection,
    /// Declared options and their default values.
    #[serde(default)]
    pub options: BTreeMap<String, bool>,
    #[serde(default)]
    pub package_info: PackageInfoSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackageSection {
    pub name: String,
    /// Present only so a hand-written version can be rejected with a clear error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub url: String,
    /// Settings the binary is sensitive to.
    #[serde(default = "default_settings")]
    pub settings: Vec<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub exports_sources: Vec<String>,
}

/// What consumers of the packaged library need to know.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PackageInfoSection {
    #[serde(default = "default_build_dirs")]
    pub build_dirs: Vec<String>,
}

impl Default for PackageInfoSection {
    fn default() -> Self {
        Self {
            build_dirs: default_build_dirs(),
        }
    }
}

fn default_settings() -> Vec<String> {
    ["os", "compiler", "build_type", "arch"]
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

fn default_build_dirs() -> Vec<String> {
    vec!["lib/cmake".to_owned()]
}

pub fn parse_descriptor_str(input: &str) -> Result<Descriptor, DescriptorError> {
    Ok(toml::from_str(input)?)
}

pub fn parse_descriptor_file(path: impl AsRef<Path>) -> Result<Descriptor, DescriptorError> {
    let content = fs::read_to_string(path)?;
    parse_descriptor_str(&content)
}
