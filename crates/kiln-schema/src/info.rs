use crate::identity::{IdentityFacts, PackageIdentity};
use crate::types::{PackageId, ShortId, Version};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the binary info record inside a package folder.
pub const INFO_FILE: &str = "kiln-info.toml";

#[derive(Debug, Error)]
pub enum InfoError {
    #[error("binary info I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("binary info parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("binary info serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("binary info package_id mismatch: record has '{recorded}', recomputed '{computed}'")]
    PackageIdMismatch { recorded: String, computed: String },
}

/// Record describing one packaged binary, written next to the installed
/// artifacts.
///
/// The package_id is derived from the recorded facts, so
/// same facts → same package_id → interchangeable binary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryInfo {
    pub info_version: u32,
    pub name: String,
    pub version: Version,
    pub package_id: PackageId,
    pub short_id: ShortId,
    /// RFC 3339 time the record was written. Not part of the identity.
    pub packaged_at: String,
    pub build_dirs: Vec<String>,
    pub facts: IdentityFacts,
}

impl BinaryInfo {
    pub fn new(
        name: &str,
        version: Version,
        facts: IdentityFacts,
        build_dirs: Vec<String>,
        packaged_at: String,
    ) -> Self {
        let identity = facts.digest();
        Self {
            info_version: 1,
            name: name.to_owned(),
            version,
            package_id: identity.package_id,
            short_id: identity.short_id,
            packaged_at,
            build_dirs,
            facts,
        }
    }

    /// Check that the stored package_id matches the recorded facts.
    pub fn verify_integrity(&self) -> Result<PackageIdentity, InfoError> {
        let identity = self.facts.digest();
        if self.package_id != identity.package_id {
            return Err(InfoError::PackageIdMismatch {
                recorded: self.package_id.to_string(),
                computed: identity.package_id.into_inner(),
            });
        }
        Ok(identity)
    }

    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), InfoError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        std::io::Write::write_all(&mut tmp, content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| InfoError::Io(e.error))?;
        Ok(())
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, InfoError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_facts() -> IdentityFacts {
        let mut settings = BTreeMap::new();
        settings.insert("os".to_owned(), "Linux".to_owned());
        settings.insert("build_type".to_owned(), "Release".to_owned());
        let mut options = BTreeMap::new();
        options.insert("shared".to_owned(), false);
        IdentityFacts {
            settings,
            options,
            requires: vec!["nitro/2.11.5".to_owned()],
        }
    }

    fn sample_info() -> BinaryInfo {
        BinaryInfo::new(
            "six-library",
            Version::new("main_abc123def4567890"),
            sample_facts(),
            vec!["lib/cmake".to_owned()],
            "2026-01-01T00:00:00+00:00".to_owned(),
        )
    }

    #[test]
    fn info_file_roundtrip() {
        let info = sample_info();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(INFO_FILE);

        info.write_to_file(&path).unwrap();
        let loaded = BinaryInfo::read_from_file(&path).unwrap();
        assert_eq!(info, loaded);
        assert!(loaded.verify_integrity().is_ok());
    }

    #[test]
    fn package_id_matches_facts_digest() {
        let info = sample_info();
        assert_eq!(info.package_id, sample_facts().digest().package_id);
    }

    #[test]
    fn timestamp_does_not_affect_identity() {
        let a = sample_info();
        let b = BinaryInfo::new(
            "six-library",
            Version::new("main_abc123def4567890"),
            sample_facts(),
            vec!["lib/cmake".to_owned()],
            "2027-06-30T12:00:00+00:00".to_owned(),
        );
        assert_eq!(a.package_id, b.package_id);
    }

    #[test]
    fn tampered_facts_fail_integrity() {
        let mut info = sample_info();
        info.facts.requires = vec!["nitro/2.11.6".to_owned()];
        assert!(matches!(
            info.verify_integrity(),
            Err(InfoError::PackageIdMismatch { .. })
        ));
    }
}
