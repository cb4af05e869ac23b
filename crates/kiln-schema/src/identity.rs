//! Binary identity: the key deciding whether a previously built package binary
//! may be reused.
//!
//! The identity is a blake3 digest over the settings the package is sensitive
//! to, its option values, and its resolved requirements. How much of each
//! requirement participates is governed by a [`RequiresMode`]. The packaging
//! default ([`RequiresMode::Semver`]) only tracks major versions; kiln widens it
//! to [`RequiresMode::FullVersion`] so that any change in any resolved
//! dependency version yields a new identity.

use crate::normalize::NormalizedDescriptor;
use crate::reference::DependencyRef;
use crate::settings::Settings;
use crate::types::{PackageId, ShortId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("dependency '{0}' has no resolved version")]
    Unresolved(String),
    #[error("dependency '{name}' resolved to conflicting versions '{first}' and '{second}'")]
    Conflicting {
        name: String,
        first: String,
        second: String,
    },
}

/// How much of a requirement's reference enters the identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiresMode {
    /// `name/MAJOR.Y.Z`; versions with major `0` or a non-numeric major are kept whole.
    #[default]
    Semver,
    /// `name/MAJOR.MINOR.Z`
    Minor,
    /// `name/MAJOR.MINOR.PATCH`
    Patch,
    /// `name/version`, whole; the channel does not participate.
    FullVersion,
    /// `name/version@user/channel`
    FullRecipe,
}

impl RequiresMode {
    /// Render a resolved reference the way it participates in the identity.
    pub fn render(self, dep: &DependencyRef) -> String {
        match self {
            Self::FullRecipe => dep.to_string(),
            Self::FullVersion => format!("{}/{}", dep.name, dep.version),
            Self::Patch => format!("{}/{}", dep.name, truncate_version(&dep.version, 3)),
            Self::Minor => format!("{}/{}", dep.name, truncate_version(&dep.version, 2)),
            Self::Semver => {
                let major = dep.version.split('.').next().unwrap_or_default();
                match major.parse::<u64>() {
                    Ok(0) | Err(_) => format!("{}/{}", dep.name, dep.version),
                    Ok(_) => format!("{}/{}", dep.name, truncate_version(&dep.version, 1)),
                }
            }
        }
    }
}

/// Keep the first `keep` dot-separated components and replace the rest of the
/// usual three with `Y`/`Z` placeholders.
fn truncate_version(version: &str, keep: usize) -> String {
    let mut out: Vec<&str> = version.split('.').take(keep).collect();
    out.extend(["Y", "Z"].iter().skip(keep.saturating_sub(1)).copied());
    out.join(".")
}

/// Identity of one package binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageIdentity {
    pub package_id: PackageId,
    pub short_id: ShortId,
}

/// Every fact that participates in a binary identity, already rendered.
///
/// Stored verbatim in the binary info record so the identity can be
/// recomputed later without the descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityFacts {
    /// Rendered requirements, sorted.
    pub requires: Vec<String>,
    pub settings: BTreeMap<String, String>,
    pub options: BTreeMap<String, bool>,
}

/// Hash one fact with every part length-prefixed, so no value can spell out
/// another fact.
fn hash_fact(hasher: &mut blake3::Hasher, section: &str, key: &str, value: &str) {
    hasher.update(
        format!(
            "{section}:{}:{key}={}:{value}\n",
            key.len(),
            value.len()
        )
        .as_bytes(),
    );
}

impl IdentityFacts {
    pub fn digest(&self) -> PackageIdentity {
        let mut hasher = blake3::Hasher::new();

        for (key, value) in &self.settings {
            hash_fact(&mut hasher, "settings", key, value);
        }
        for (key, value) in &self.options {
            hash_fact(&mut hasher, "options", key, if *value { "true" } else { "false" });
        }
        for req in &self.requires {
            hash_fact(&mut hasher, "requires", "", req);
        }

        let hex = hasher.finalize().to_hex().to_string();
        let short = hex[..12].to_owned();

        PackageIdentity {
            package_id: PackageId::new(hex),
            short_id: ShortId::new(short),
        }
    }
}

/// Which facts contribute to a binary identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityPolicy {
    pub requires_mode: RequiresMode,
}

impl IdentityPolicy {
    /// What the packaging tool uses when a recipe says nothing.
    pub fn packaging_default() -> Self {
        Self::default()
    }

    /// Make every change in a dependency's version require a new binary.
    #[must_use]
    pub fn full_version_mode(mut self) -> Self {
        self.requires_mode = RequiresMode::FullVersion;
        self
    }

    /// Like [`Self::full_version_mode`], but a channel change also requires a
    /// new binary.
    #[must_use]
    pub fn full_recipe_mode(mut self) -> Self {
        self.requires_mode = RequiresMode::FullRecipe;
        self
    }

    /// Collect the identity facts for a build.
    ///
    /// `settings` should already carry the effective option values.
    /// `resolved` is the resolution set supplied by the caller, in any order;
    /// every requirement declared by `descriptor` must be present in it.
    /// Resolved entries the descriptor does not declare directly are treated
    /// as transitive dependencies and participate too.
    pub fn facts(
        &self,
        settings: &Settings,
        descriptor: &NormalizedDescriptor,
        resolved: &[DependencyRef],
    ) -> Result<IdentityFacts, IdentityError> {
        let mut by_name: BTreeMap<&str, &DependencyRef> = BTreeMap::new();
        for dep in resolved {
            if dep.version.trim().is_empty() {
                return Err(IdentityError::Unresolved(dep.name.clone()));
            }
            if let Some(existing) = by_name.insert(dep.name.as_str(), dep) {
                if existing != dep {
                    return Err(IdentityError::Conflicting {
                        name: dep.name.clone(),
                        first: existing.to_string(),
                        second: dep.to_string(),
                    });
                }
            }
        }

        if let Some(missing) = descriptor
            .requires
            .iter()
            .find(|req| !by_name.contains_key(req.name.as_str()))
        {
            return Err(IdentityError::Unresolved(missing.name.clone()));
        }

        let mut requires: Vec<String> = by_name
            .values()
            .map(|dep| self.requires_mode.render(dep))
            .collect();
        requires.sort();

        let options = descriptor
            .options
            .keys()
            .filter_map(|name| settings.option(name).map(|v| (name.clone(), v)))
            .collect();

        Ok(IdentityFacts {
            settings: settings.flatten(&descriptor.settings),
            options,
            requires,
        })
    }

    pub fn compute(
        &self,
        settings: &Settings,
        descriptor: &NormalizedDescriptor,
        resolved: &[DependencyRef],
    ) -> Result<PackageIdentity, IdentityError> {
        Ok(self.facts(settings, descriptor, resolved)?.digest())
    }
}

/// Compute the binary identity of a build with full-version dependency
/// tracking.
pub fn compute_identity(
    settings: &Settings,
    descriptor: &NormalizedDescriptor,
    resolved: &[DependencyRef],
) -> Result<PackageIdentity, IdentityError> {
    IdentityPolicy::packaging_default()
        .full_version_mode()
        .compute(settings, descriptor, resolved)
}
