//! Toolchain exceptions applied on top of the base CMake definitions.
//!
//! Each rule is a predicate on the settings plus an adjustment to the
//! definitions. Rules run in list order after the base definitions are built,
//! so a later rule sees earlier adjustments.

use crate::invocation::Definitions;
use kiln_schema::{Compiler, Settings};
use std::fmt;

#[derive(Clone, Copy)]
pub struct QuirkRule {
    pub name: &'static str,
    pub applies: fn(&Settings) -> bool,
    pub adjust: fn(&Settings, &mut Definitions),
}

impl fmt::Debug for QuirkRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuirkRule").field("name", &self.name).finish()
    }
}

impl QuirkRule {
    /// Apply the rule if its predicate matches. Returns whether it applied.
    pub fn apply(&self, settings: &Settings, definitions: &mut Definitions) -> bool {
        if (self.applies)(settings) {
            (self.adjust)(settings, definitions);
            true
        } else {
            false
        }
    }
}

/// Visual Studio generators are multi-config and never receive
/// `CMAKE_BUILD_TYPE` from the base definitions, but project scripts that
/// branch on it still need it.
pub const MSVC_BUILD_TYPE: QuirkRule = QuirkRule {
    name: "msvc-build-type",
    applies: |settings| settings.compiler.name == Compiler::Msvc,
    adjust: |settings, definitions| {
        definitions.insert(
            "CMAKE_BUILD_TYPE".to_owned(),
            settings.build_type.to_string(),
        );
    },
};

pub fn builtin_quirks() -> Vec<QuirkRule> {
    vec![MSVC_BUILD_TYPE]
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_schema::parse_profile_str;

    fn settings(compiler: &str, build_type: &str) -> Settings {
        parse_profile_str(&format!(
            r#"
os = "Windows"
arch = "x86_64"
build_type = "{build_type}"
[compiler]
name = "{compiler}"
version = "16"
"#
        ))
        .unwrap()
    }

    #[test]
    fn msvc_rule_injects_requested_build_type() {
        for build_type in ["Debug", "Release", "RelWithDebInfo", "MinSizeRel"] {
            let mut defs = Definitions::new();
            assert!(MSVC_BUILD_TYPE.apply(&settings("Visual Studio", build_type), &mut defs));
            assert_eq!(
                defs.get("CMAKE_BUILD_TYPE").map(String::as_str),
                Some(build_type)
            );
        }
    }

    #[test]
    fn msvc_rule_skips_other_compilers() {
        let mut defs = Definitions::new();
        assert!(!MSVC_BUILD_TYPE.apply(&settings("clang", "Debug"), &mut defs));
        assert!(defs.is_empty());
    }

    #[test]
    fn rules_run_in_order() {
        const FIRST: QuirkRule = QuirkRule {
            name: "first",
            applies: |_| true,
            adjust: |_, d| {
                d.insert("MARK".to_owned(), "first".to_owned());
            },
        };
        const SECOND: QuirkRule = QuirkRule {
            name: "second",
            applies: |_| true,
            adjust: |_, d| {
                let prev = d.get("MARK").cloned().unwrap_or_default();
                d.insert("MARK".to_owned(), format!("{prev}+second"));
            },
        };

        let s = settings("gcc", "Release");
        let mut defs = Definitions::new();
        for rule in [FIRST, SECOND] {
            rule.apply(&s, &mut defs);
        }
        assert_eq!(defs.get("MARK").map(String::as_str), Some("first+second"));
    }
}
