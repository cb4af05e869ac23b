//! The settings vector: operating system, compiler, architecture, build type,
//! and option values a build is configured for.
//!
//! Settings are always an explicit value. They come from a profile file,
//! `key=value` overrides, or [`Settings::detect_host`]; nothing downstream
//! reads the process environment to learn them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profile: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),
    #[error("invalid value '{value}' for setting '{key}'")]
    InvalidValue { key: String, value: String },
    #[error("malformed override '{0}', expected 'key=value'")]
    MalformedOverride(String),
}

macro_rules! setting_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ProfileError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ProfileError::InvalidValue {
                        key: stringify!($name).to_lowercase(),
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

setting_enum!(
    /// Target operating system.
    Os {
        Linux => "Linux",
        Windows => "Windows",
        Macos => "Macos",
        FreeBsd => "FreeBSD",
        Android => "Android",
        Ios => "iOS",
    }
);

setting_enum!(
    /// Target CPU architecture.
    Arch {
        X86 => "x86",
        X86_64 => "x86_64",
        Armv7 => "armv7",
        Armv8 => "armv8",
    }
);

setting_enum!(
    BuildType {
        Debug => "Debug",
        Release => "Release",
        RelWithDebInfo => "RelWithDebInfo",
        MinSizeRel => "MinSizeRel",
    }
);

setting_enum!(
    /// Compiler family. `Msvc` keeps the historical "Visual Studio" spelling
    /// used in profiles.
    Compiler {
        Gcc => "gcc",
        Clang => "clang",
        AppleClang => "apple-clang",
        Msvc => "Visual Studio",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CompilerSettings {
    pub name: Compiler,
    pub version: String,
    /// MSVC runtime flavour (`MD`, `MT`, `MDd`, `MTd`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cppstd: Option<String>,
}

/// The settings vector a single build is configured for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub os: Os,
    pub arch: Arch,
    pub build_type: BuildType,
    pub compiler: CompilerSettings,
    #[serde(default)]
    pub options: BTreeMap<String, bool>,
}

impl Settings {
    /// Settings describing the machine kiln runs on, with a `Release` build type
    /// and each OS's customary compiler.
    pub fn detect_host() -> Self {
        let os = match std::env::consts::OS {
            "windows" => Os::Windows,
            "macos" => Os::Macos,
            "freebsd" => Os::FreeBsd,
            "android" => Os::Android,
            "ios" => Os::Ios,
            _ => Os::Linux,
        };
        let arch = match std::env::consts::ARCH {
            "x86" => Arch::X86,
            "arm" => Arch::Armv7,
            "aarch64" => Arch::Armv8,
            _ => Arch::X86_64,
        };
        let compiler = match os {
            Os::Windows => CompilerSettings {
                name: Compiler::Msvc,
                version: "17".to_owned(),
                runtime: Some("MD".to_owned()),
                cppstd: None,
            },
            Os::Macos | Os::Ios => CompilerSettings {
                name: Compiler::AppleClang,
                version: "15".to_owned(),
                runtime: None,
                cppstd: None,
            },
            Os::FreeBsd | Os::Android => CompilerSettings {
                name: Compiler::Clang,
                version: "17".to_owned(),
                runtime: None,
                cppstd: None,
            },
            Os::Linux => CompilerSettings {
                name: Compiler::Gcc,
                version: "13".to_owned(),
                runtime: None,
                cppstd: None,
            },
        };
        Self {
            os,
            arch,
            build_type: BuildType::Release,
            compiler,
            options: BTreeMap::new(),
        }
    }

    /// Apply a `key=value` setting override, e.g. `build_type=Debug` or
    /// `compiler.version=12`.
    pub fn apply_override(&mut self, pair: &str) -> Result<(), ProfileError> {
        let (key, value) = split_pair(pair)?;
        match key {
            "os" => self.os = value.parse()?,
            "arch" => self.arch = value.parse()?,
            "build_type" => self.build_type = value.parse()?,
            "compiler" => self.compiler.name = value.parse()?,
            "compiler.version" => self.compiler.version = free_form(key, value)?,
            "compiler.runtime" => self.compiler.runtime = Some(free_form(key, value)?),
            "compiler.cppstd" => self.compiler.cppstd = Some(free_form(key, value)?),
            other => return Err(ProfileError::UnknownSetting(other.to_owned())),
        }
        Ok(())
    }

    /// Apply an option override such as `shared=True`.
    pub fn apply_option(&mut self, pair: &str) -> Result<(), ProfileError> {
        let (key, value) = split_pair(pair)?;
        let parsed = parse_bool(value).ok_or_else(|| ProfileError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        })?;
        let name = free_form("option name", key)?;
        self.options.insert(name, parsed);
        Ok(())
    }

    /// Reject free-form values a profile file could smuggle control
    /// characters through.
    fn validate(&self) -> Result<(), ProfileError> {
        free_form("compiler.version", &self.compiler.version)?;
        if let Some(runtime) = &self.compiler.runtime {
            free_form("compiler.runtime", runtime)?;
        }
        if let Some(cppstd) = &self.compiler.cppstd {
            free_form("compiler.cppstd", cppstd)?;
        }
        for name in self.options.keys() {
            free_form("option name", name)?;
        }
        Ok(())
    }

    /// Flatten the settings named in `fields` into `name -> value` pairs.
    ///
    /// `compiler` expands to its sub-settings. Unknown field names are ignored;
    /// descriptor validation rejects them before this is reached.
    pub fn flatten(&self, fields: &[String]) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for field in fields {
            match field.as_str() {
                "os" => {
                    out.insert("os".to_owned(), self.os.to_string());
                }
                "arch" => {
                    out.insert("arch".to_owned(), self.arch.to_string());
                }
                "build_type" => {
                    out.insert("build_type".to_owned(), self.build_type.to_string());
                }
                "compiler" => {
                    out.insert("compiler".to_owned(), self.compiler.name.to_string());
                    out.insert(
                        "compiler.version".to_owned(),
                        self.compiler.version.clone(),
                    );
                    if let Some(runtime) = &self.compiler.runtime {
                        out.insert("compiler.runtime".to_owned(), runtime.clone());
                    }
                    if let Some(cppstd) = &self.compiler.cppstd {
                        out.insert("compiler.cppstd".to_owned(), cppstd.clone());
                    }
                }
                _ => {}
            }
        }
        out
    }

    pub fn option(&self, name: &str) -> Option<bool> {
        self.options.get(name).copied()
    }
}

pub fn parse_profile_str(input: &str) -> Result<Settings, ProfileError> {
    let settings: Settings = toml::from_str(input)?;
    settings.validate()?;
    Ok(settings)
}

pub fn parse_profile_file(path: impl AsRef<Path>) -> Result<Settings, ProfileError> {
    let content = fs::read_to_string(path)?;
    parse_profile_str(&content)
}

fn split_pair(pair: &str) -> Result<(&str, &str), ProfileError> {
    let Some((key, value)) = pair.split_once('=') else {
        return Err(ProfileError::MalformedOverride(pair.to_owned()));
    };
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return Err(ProfileError::MalformedOverride(pair.to_owned()));
    }
    Ok((key, value))
}

/// Free-form setting values are identity facts; they must not contain
/// control characters or be blank.
fn free_form(key: &str, value: &str) -> Result<String, ProfileError> {
    if value.trim().is_empty() || value.chars().any(char::is_control) {
        return Err(ProfileError::InvalidValue {
            key: key.to_owned(),
            value: value.escape_debug().to_string(),
        });
    }
    Ok(value.to_owned())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Some(true),
        "false" | "off" | "0" | "no" => Some(false),
        _ => None,
    }
}
