use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of a single build or package operation.
///
/// Nothing persists between operations: each one starts from `Unconfigured`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Unconfigured,
    Configured,
    Built,
    Installed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Built => "built",
            Self::Installed => "installed",
        })
    }
}

pub fn validate_transition(from: LifecycleState, to: LifecycleState) -> Result<(), CoreError> {
    let valid = matches!(
        (from, to),
        (LifecycleState::Unconfigured, LifecycleState::Configured)
            | (
                LifecycleState::Configured,
                LifecycleState::Built | LifecycleState::Installed
            )
    );

    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        assert!(validate_transition(LifecycleState::Unconfigured, LifecycleState::Configured).is_ok());
        assert!(validate_transition(LifecycleState::Configured, LifecycleState::Built).is_ok());
        assert!(validate_transition(LifecycleState::Configured, LifecycleState::Installed).is_ok());
    }

    #[test]
    fn invalid_transitions() {
        assert!(validate_transition(LifecycleState::Unconfigured, LifecycleState::Built).is_err());
        assert!(validate_transition(LifecycleState::Unconfigured, LifecycleState::Installed).is_err());
        assert!(validate_transition(LifecycleState::Built, LifecycleState::Installed).is_err());
        assert!(validate_transition(LifecycleState::Installed, LifecycleState::Configured).is_err());
        assert!(validate_transition(LifecycleState::Configured, LifecycleState::Configured).is_err());
    }
}
