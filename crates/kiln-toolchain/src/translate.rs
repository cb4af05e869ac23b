use crate::invocation::{Definitions, Folders, Invocation};
use crate::quirks::{builtin_quirks, QuirkRule};
use crate::ToolError;
use kiln_schema::{Arch, Compiler, Settings};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tool-level configuration that is not part of the settings vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolchainConfig {
    #[serde(default = "default_cmake_program")]
    pub cmake_program: String,
    /// Generator for non-MSVC builds. When set explicitly it is also used for
    /// MSVC builds.
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub jobs: Option<u32>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cmake_program: default_cmake_program(),
            generator: None,
            jobs: None,
        }
    }
}

fn default_cmake_program() -> String {
    "cmake".to_owned()
}

const DEFAULT_GENERATOR: &str = "Unix Makefiles";

/// Maps a settings vector onto a CMake invocation.
///
/// Translation is pure: the same settings, folders and configuration always
/// give the same invocation.
#[derive(Debug, Clone)]
pub struct Translator {
    config: ToolchainConfig,
    quirks: Vec<QuirkRule>,
}

impl Translator {
    pub fn new(config: ToolchainConfig) -> Self {
        Self {
            config,
            quirks: builtin_quirks(),
        }
    }

    /// Replace the quirk list. Rules run in the given order.
    #[must_use]
    pub fn with_quirks(mut self, quirks: Vec<QuirkRule>) -> Self {
        self.quirks = quirks;
        self
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn translate(&self, settings: &Settings, folders: &Folders) -> Result<Invocation, ToolError> {
        let generator = self.generator_for(settings)?;
        let multi_config = is_multi_config(&generator);

        let platform = if generator.starts_with("Visual Studio") {
            Some(vs_platform(settings.arch).to_owned())
        } else {
            None
        };

        let mut definitions = base_definitions(settings, folders, multi_config);

        let mut applied_quirks = Vec::new();
        for rule in &self.quirks {
            if rule.apply(settings, &mut definitions) {
                debug!(quirk = rule.name, "applied toolchain quirk");
                applied_quirks.push(rule.name.to_owned());
            }
        }

        Ok(Invocation {
            folders: folders.clone(),
            generator,
            platform,
            build_config: multi_config.then(|| settings.build_type.to_string()),
            definitions,
            applied_quirks,
            jobs: self.config.jobs,
        })
    }

    fn generator_for(&self, settings: &Settings) -> Result<String, ToolError> {
        if let Some(generator) = &self.config.generator {
            return Ok(generator.clone());
        }
        if settings.compiler.name == Compiler::Msvc {
            return visual_studio_generator(&settings.compiler.version);
        }
        Ok(DEFAULT_GENERATOR.to_owned())
    }
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(ToolchainConfig::default())
    }
}

/// Definitions every build receives before quirk rules run.
fn base_definitions(settings: &Settings, folders: &Folders, multi_config: bool) -> Definitions {
    let mut defs = Definitions::new();

    defs.insert(
        "CMAKE_INSTALL_PREFIX".to_owned(),
        folders.package.to_string_lossy().into_owned(),
    );

    if let Some(shared) = settings.option("shared") {
        defs.insert(
            "BUILD_SHARED_LIBS".to_owned(),
            if shared { "ON" } else { "OFF" }.to_owned(),
        );
    }

    if !multi_config {
        defs.insert(
            "CMAKE_BUILD_TYPE".to_owned(),
            settings.build_type.to_string(),
        );
    }

    if !folders.dependencies.is_empty() {
        let joined = folders
            .dependencies
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(";");
        defs.insert("CMAKE_PREFIX_PATH".to_owned(), joined);
    }

    if let Some(cppstd) = &settings.compiler.cppstd {
        let (standard, extensions) = match cppstd.strip_prefix("gnu") {
            Some(rest) => (rest, "ON"),
            None => (cppstd.as_str(), "OFF"),
        };
        defs.insert("CMAKE_CXX_STANDARD".to_owned(), standard.to_owned());
        defs.insert("CMAKE_CXX_EXTENSIONS".to_owned(), extensions.to_owned());
    }

    if settings.compiler.name == Compiler::Msvc {
        if let Some(runtime) = settings.compiler.runtime.as_deref().and_then(msvc_runtime) {
            defs.insert("CMAKE_MSVC_RUNTIME_LIBRARY".to_owned(), runtime.to_owned());
        }
    }

    defs
}

fn is_multi_config(generator: &str) -> bool {
    generator.starts_with("Visual Studio") || generator == "Xcode" || generator.contains("Multi-Config")
}

fn visual_studio_generator(version: &str) -> Result<String, ToolError> {
    let name = match version {
        "14" => "Visual Studio 14 2015",
        "15" => "Visual Studio 15 2017",
        "16" => "Visual Studio 16 2019",
        "17" => "Visual Studio 17 2022",
        other => {
            return Err(ToolError::Unsupported(format!(
                "no Visual Studio generator known for compiler.version={other}"
            )))
        }
    };
    Ok(name.to_owned())
}

fn vs_platform(arch: Arch) -> &'static str {
    match arch {
        Arch::X86 => "Win32",
        Arch::X86_64 => "x64",
        Arch::Armv7 => "ARM",
        Arch::Armv8 => "ARM64",
    }
}

fn msvc_runtime(runtime: &str) -> Option<&'static str> {
    match runtime {
        "MT" => Some("MultiThreaded"),
        "MTd" => Some("MultiThreadedDebug"),
        "MD" => Some("MultiThreadedDLL"),
        "MDd" => Some("MultiThreadedDebugDLL"),
        _ => None,
    }
}
