use std::fmt;
use std::process::{Command, Stdio};

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn program_runs(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check what the cmake backend needs: the cmake program itself and, for the
/// default Makefile generator, a make implementation.
///
/// Returns the missing items; an empty list means all prerequisites are met.
pub fn check_cmake_prereqs(cmake_program: &str, generator: Option<&str>) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !program_runs(cmake_program) {
        missing.push(MissingPrereq {
            name: cmake_program.to_owned(),
            purpose: "generating and driving native build files",
            install_hint: "apt install cmake | dnf install cmake | brew install cmake | https://cmake.org/download",
        });
    }

    match generator {
        Some(g) if g.starts_with("Ninja") => {
            if !program_runs("ninja") {
                missing.push(MissingPrereq {
                    name: "ninja".to_owned(),
                    purpose: "running Ninja build files",
                    install_hint: "apt install ninja-build | dnf install ninja-build | brew install ninja",
                });
            }
        }
        Some(_) => {}
        None => {
            if cfg!(unix) && !program_runs("make") {
                missing.push(MissingPrereq {
                    name: "make".to_owned(),
                    purpose: "running Unix Makefiles",
                    install_hint: "apt install make | dnf install make | xcode-select --install",
                });
            }
        }
    }

    missing
}

pub fn format_missing(missing: &[MissingPrereq]) -> String {
    let mut out = String::from("missing build prerequisites:\n");
    for m in missing {
        out.push_str(&m.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cmake_is_reported_with_hint() {
        let missing = check_cmake_prereqs("kiln-test-no-such-cmake", Some("Xcode"));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "kiln-test-no-such-cmake");
        assert!(format_missing(&missing).contains("cmake.org"));
    }

    #[test]
    fn format_lists_every_item() {
        let missing = vec![
            MissingPrereq {
                name: "cmake".to_owned(),
                purpose: "a",
                install_hint: "b",
            },
            MissingPrereq {
                name: "ninja".to_owned(),
                purpose: "c",
                install_hint: "d",
            },
        ];
        let text = format_missing(&missing);
        assert!(text.contains("  - cmake: a (install: b)"));
        assert!(text.contains("  - ninja: c (install: d)"));
    }
}
