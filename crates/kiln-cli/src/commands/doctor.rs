use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use kiln_core::config::default_config_path;
use kiln_core::KilnConfig;
use kiln_schema::{parse_descriptor_file, parse_profile_file, DESCRIPTOR_FILE};
use kiln_toolchain::{check_cmake_prereqs, format_missing};
use std::path::Path;

pub fn run(recipe_dir: &Path, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    let config = check_config(&mut checks, &mut all_pass);
    check_prereqs(&config, &mut checks, &mut all_pass);
    check_recipe(recipe_dir, &mut checks, &mut all_pass);
    check_checkout(recipe_dir, &mut checks);

    print_results(&checks, all_pass, json_output)
}

fn check_config(checks: &mut Vec<Check>, all_pass: &mut bool) -> KilnConfig {
    let path = default_config_path().ok();
    let config = match KilnConfig::load_default() {
        Ok(config) => {
            let message = match path {
                Some(p) if p.exists() => format!("User config loaded from {}", p.display()),
                _ => "No user config (using defaults)".to_owned(),
            };
            checks.push(Check::pass("user_config", &message));
            config
        }
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail("user_config", &e.to_string()));
            return KilnConfig::default();
        }
    };

    if let Some(profile) = &config.default_profile {
        match parse_profile_file(profile) {
            Ok(_) => checks.push(Check::pass(
                "default_profile",
                &format!("Default profile {} is valid", profile.display()),
            )),
            Err(e) => {
                *all_pass = false;
                checks.push(Check::fail(
                    "default_profile",
                    &format!("Default profile {}: {e}", profile.display()),
                ));
            }
        }
    }
    config
}

fn check_prereqs(config: &KilnConfig, checks: &mut Vec<Check>, all_pass: &mut bool) {
    let missing = check_cmake_prereqs(
        &config.toolchain.cmake_program,
        config.toolchain.generator.as_deref(),
    );
    if missing.is_empty() {
        checks.push(Check::pass(
            "build_prereqs",
            "Build tool prerequisites satisfied",
        ));
    } else if config.tool_name() == "cmake" {
        *all_pass = false;
        checks.push(Check::fail("build_prereqs", format_missing(&missing).trim_end()));
    } else {
        checks.push(Check::warn("build_prereqs", format_missing(&missing).trim_end()));
    }
}

fn check_recipe(recipe_dir: &Path, checks: &mut Vec<Check>, all_pass: &mut bool) {
    let path = recipe_dir.join(DESCRIPTOR_FILE);
    if !path.exists() {
        checks.push(Check::info(
            "descriptor",
            &format!("No {DESCRIPTOR_FILE} in {}", recipe_dir.display()),
        ));
        return;
    }
    match parse_descriptor_file(&path).and_then(|d| d.normalize()) {
        Ok(d) => checks.push(Check::pass(
            "descriptor",
            &format!("{DESCRIPTOR_FILE} is valid ({}, {} requirements)", d.name, d.requires.len()),
        )),
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail("descriptor", &format!("{DESCRIPTOR_FILE}: {e}")));
        }
    }
}

fn check_checkout(recipe_dir: &Path, checks: &mut Vec<Check>) {
    match kiln_vcs::resolve_version(recipe_dir) {
        Ok(version) => checks.push(Check::pass(
            "checkout",
            &format!("Version resolves to {version}"),
        )),
        Err(e) => checks.push(Check::warn(
            "checkout",
            &format!("Version cannot be resolved: {e}"),
        )),
    }
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!("{}", json_pretty(&json)?);
    } else {
        println!("kiln doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}
