use crate::descriptor::{Descriptor, DescriptorError};
use crate::reference::{is_component_char, DependencyRef};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const KNOWN_SETTINGS: [&str; 4] = ["os", "compiler", "build_type", "arch"];

/// Validated, sorted form of a [`Descriptor`].
///
/// Requirements are parsed and sorted by name, settings are deduplicated, and
/// export patterns are checked. This is what the driver and the identity
/// policy consume.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedDescriptor {
    pub name: String,
    pub description: String,
    pub license: String,
    pub url: String,
    pub settings: Vec<String>,
    pub requires: Vec<DependencyRef>,
    pub options: BTreeMap<String, bool>,
    pub exports_sources: Vec<String>,
    pub build_dirs: Vec<String>,
}

impl Descriptor {
    pub fn normalize(&self) -> Result<NormalizedDescriptor, DescriptorError> {
        if self.package.version.is_some() {
            return Err(DescriptorError::DeclaredVersion);
        }

        let name = self.package.name.trim().to_owned();
        if name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        if !name.chars().all(is_component_char) {
            return Err(DescriptorError::InvalidName(name));
        }

        let settings = normalize_string_list(&self.package.settings);
        if let Some(unknown) = settings
            .iter()
            .find(|s| !KNOWN_SETTINGS.contains(&s.as_str()))
        {
            return Err(DescriptorError::UnknownSetting(unknown.clone()));
        }

        let mut requires = Vec::with_capacity(self.package.requires.len());
        for raw in &self.package.requires {
            requires.push(raw.parse::<DependencyRef>()?);
        }
        requires.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = requires.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(DescriptorError::DuplicateRequirement(pair[0].name.clone()));
        }

        let exports_sources = normalize_string_list(&self.package.exports_sources);
        for pattern in &exports_sources {
            validate_export_pattern(pattern)?;
        }

        Ok(NormalizedDescriptor {
            name,
            description: self.package.description.trim().to_owned(),
            license: self.package.license.trim().to_owned(),
            url: self.package.url.trim().to_owned(),
            settings,
            requires,
            options: self.options.clone(),
            exports_sources,
            build_dirs: normalize_string_list(&self.package_info.build_dirs),
        })
    }
}

impl NormalizedDescriptor {
    /// Settings with every declared option filled in.
    ///
    /// Values chosen by the caller win over the declared defaults. Options the
    /// package does not declare are rejected.
    pub fn effective_settings(&self, settings: &Settings) -> Result<Settings, DescriptorError> {
        if let Some(unknown) = settings
            .options
            .keys()
            .find(|k| !self.options.contains_key(*k))
        {
            return Err(DescriptorError::UnknownOption(unknown.clone()));
        }

        let mut effective = settings.clone();
        for (name, default) in &self.options {
            effective.options.entry(name.clone()).or_insert(*default);
        }
        Ok(effective)
    }
}

/// Export patterns are relative paths, optionally ending in `/*` for a whole
/// directory.
fn validate_export_pattern(pattern: &str) -> Result<(), DescriptorError> {
    let path = pattern.strip_suffix("/*").unwrap_or(pattern);
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.contains('*')
        || path.split('/').any(|seg| seg == ".." || seg.is_empty());
    if invalid {
        return Err(DescriptorError::InvalidExportPattern(pattern.to_owned()));
    }
    Ok(())
}

fn normalize_string_list(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values
        .iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}
