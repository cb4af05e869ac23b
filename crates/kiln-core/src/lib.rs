//! Lifecycle driver for kiln recipes.
//!
//! `Recipe` ties the descriptor, the identity resolver, the configuration
//! translator and the build tool together. Each build or package operation
//! walks the lifecycle state machine from scratch. User configuration and
//! the Ctrl-C flag live here too.

pub mod config;
pub mod lifecycle;
pub mod recipe;
pub mod signal;

pub use config::KilnConfig;
pub use lifecycle::{validate_transition, LifecycleState};
pub use recipe::{LifecycleReport, Recipe};
pub use signal::{install_signal_handler, shutdown_requested};

use kiln_toolchain::ToolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("descriptor error: {0}")]
    Descriptor(#[from] kiln_schema::DescriptorError),
    #[error("profile error: {0}")]
    Profile(#[from] kiln_schema::ProfileError),
    #[error("repository state error: {0}")]
    RepositoryState(#[from] kiln_vcs::RepositoryStateError),
    #[error("configuration error: {0}")]
    Configuration(#[source] ToolError),
    #[error("configuration error: exported source '{0}' is missing from the source folder")]
    MissingExport(String),
    #[error("build failed: {0}")]
    BuildFailure(#[source] ToolError),
    #[error("install failed: {0}")]
    InstallFailure(#[source] ToolError),
    #[error("dependency resolution error: {0}")]
    DependencyResolution(#[from] kiln_schema::IdentityError),
    #[error("binary info error: {0}")]
    Info(#[from] kiln_schema::InfoError),
    #[error("config error: {0}")]
    Config(String),
    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
    #[error("operation cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CoreError {
    /// Lifecycle stage the error surfaced in, when it belongs to one.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::RepositoryState(_) => Some("version"),
            Self::Configuration(_) | Self::MissingExport(_) | Self::Profile(_) => {
                Some("configure")
            }
            Self::BuildFailure(_) => Some("build"),
            Self::InstallFailure(_) | Self::Info(_) => Some("package"),
            Self::DependencyResolution(_) => Some("package_id"),
            _ => None,
        }
    }
}
