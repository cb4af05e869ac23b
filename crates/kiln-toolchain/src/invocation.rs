use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// CMake cache definitions (`-DNAME=VALUE`), ordered by name.
pub type Definitions = BTreeMap<String, String>;

/// Folders one build operation works in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folders {
    pub source: PathBuf,
    pub build: PathBuf,
    pub package: PathBuf,
    /// Install prefixes of already-built dependencies, searched by `find_package`.
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
}

/// Everything needed to run the external tool for one build.
///
/// Produced by [`crate::Translator::translate`]; consumed by
/// [`crate::BuildTool::configure`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invocation {
    pub folders: Folders,
    pub generator: String,
    /// Generator platform (`-A`), used by Visual Studio generators.
    pub platform: Option<String>,
    /// Configuration selected at build time for multi-config generators.
    pub build_config: Option<String>,
    pub definitions: Definitions,
    /// Names of the quirk rules that adjusted `definitions`, in order.
    pub applied_quirks: Vec<String>,
    pub jobs: Option<u32>,
}

impl Invocation {
    pub fn configure_args(&self) -> Vec<String> {
        let mut args = vec![
            "-S".to_owned(),
            self.folders.source.to_string_lossy().into_owned(),
            "-B".to_owned(),
            self.folders.build.to_string_lossy().into_owned(),
            "-G".to_owned(),
            self.generator.clone(),
        ];
        if let Some(platform) = &self.platform {
            args.push("-A".to_owned());
            args.push(platform.clone());
        }
        for (name, value) in &self.definitions {
            args.push(format!("-D{name}={value}"));
        }
        args
    }

    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "--build".to_owned(),
            self.folders.build.to_string_lossy().into_owned(),
        ];
        if let Some(config) = &self.build_config {
            args.push("--config".to_owned());
            args.push(config.clone());
        }
        if let Some(jobs) = self.jobs {
            args.push("--parallel".to_owned());
            args.push(jobs.to_string());
        }
        args
    }

    /// Builds the `install` target, which compiles first. The prefix comes
    /// from `CMAKE_INSTALL_PREFIX` set at configure time.
    pub fn install_args(&self) -> Vec<String> {
        let mut args = self.build_args();
        args.push("--target".to_owned());
        args.push("install".to_owned());
        args
    }
}
