//! Build tool layer for kiln.
//!
//! This crate turns a settings vector into a concrete CMake invocation
//! (`Translator`), applies ordered compiler quirk rules (`QuirkRule`), and
//! drives the external tool through the pluggable `BuildTool` trait with a
//! `cmake` backend and a `mock` backend for tests.

pub mod cmake;
pub mod invocation;
pub mod mock;
pub mod prereq;
pub mod quirks;
pub mod tool;
pub mod translate;

pub use invocation::{Definitions, Folders, Invocation};
pub use prereq::{check_cmake_prereqs, format_missing, MissingPrereq};
pub use quirks::{builtin_quirks, QuirkRule};
pub use tool::{select_tool, BuildHandle, BuildTool};
pub use translate::{ToolchainConfig, Translator};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// External tool step a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Configure,
    Build,
    Install,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        })
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("build tool I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("build tool '{0}' is not available on this system")]
    Unavailable(String),
    #[error("unsupported settings: {0}")]
    Unsupported(String),
    #[error("{program} {stage} step failed{}", exit_suffix(*.code))]
    StepFailed {
        stage: Stage,
        program: String,
        code: Option<i32>,
    },
}

fn exit_suffix(code: Option<i32>) -> String {
    code.map_or_else(
        || " (terminated by signal)".to_owned(),
        |c| format!(" with exit code {c}"),
    )
}
