pub mod build;
pub mod completions;
pub mod doctor;
pub mod inspect;
pub mod package;
pub mod package_id;
pub mod verify_info;
pub mod version;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use kiln_core::{KilnConfig, Recipe};
use kiln_schema::{parse_profile_file, DependencyRef, Settings};
use kiln_toolchain::{check_cmake_prereqs, format_missing, select_tool, Folders, Translator};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_DESCRIPTOR_ERROR: u8 = 2;
pub const EXIT_REPOSITORY_ERROR: u8 = 3;

/// Settings vector selection shared by every command that needs one.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsArgs {
    /// Settings profile (TOML). Defaults to the configured profile, then the host.
    #[arg(long)]
    pub profile: Option<PathBuf>,
    /// Override a setting, e.g. `-s build_type=Debug` or `-s compiler.version=12`.
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    pub settings: Vec<String>,
    /// Override an option, e.g. `-o shared=True`.
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,
}

/// Folders and build tool for commands that run the tool.
#[derive(Debug, Clone, Default, Args)]
pub struct FolderArgs {
    /// Source folder (defaults to the recipe directory).
    #[arg(long)]
    pub source_folder: Option<PathBuf>,
    /// Build folder (defaults to `<recipe>/build`).
    #[arg(long)]
    pub build_folder: Option<PathBuf>,
    /// Install prefix (defaults to `<recipe>/package`).
    #[arg(long)]
    pub package_folder: Option<PathBuf>,
    /// Install prefix of an already-built dependency. Repeatable.
    #[arg(long = "dep-folder")]
    pub dep_folders: Vec<PathBuf>,
    /// Build tool backend: `cmake` or `mock`.
    #[arg(long)]
    pub tool: Option<String>,
}

/// Resolution set input for identity computations.
#[derive(Debug, Clone, Default, Args)]
pub struct ResolvedArgs {
    /// Resolved dependency reference `name/version@user/channel`. Replaces the
    /// declared requirement of the same name, or adds a transitive one.
    #[arg(long = "resolved", value_name = "REF")]
    pub resolved: Vec<String>,
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✗ {msg}"));
}

pub fn colorize_state(state: &str) -> String {
    use console::Style;
    match state {
        "built" => Style::new().green().apply_to(state).to_string(),
        "installed" => Style::new().cyan().bold().apply_to(state).to_string(),
        "configured" => Style::new().yellow().apply_to(state).to_string(),
        other => other.to_owned(),
    }
}

pub fn load_config() -> Result<KilnConfig, String> {
    KilnConfig::load_default().map_err(|e| e.to_string())
}

/// Profile (or host detection), then `-s` overrides, then `-o` options.
pub fn load_settings(args: &SettingsArgs, config: &KilnConfig) -> Result<Settings, String> {
    let profile = args.profile.as_ref().or(config.default_profile.as_ref());
    let mut settings = match profile {
        Some(path) => parse_profile_file(path).map_err(|e| format!("profile error: {e}"))?,
        None => Settings::detect_host(),
    };
    for pair in &args.settings {
        settings
            .apply_override(pair)
            .map_err(|e| format!("profile error: {e}"))?;
    }
    for pair in &args.options {
        settings
            .apply_option(pair)
            .map_err(|e| format!("profile error: {e}"))?;
    }
    Ok(settings)
}

/// Load the recipe with the requested folders, translator and build tool.
pub fn open_recipe(
    recipe_dir: &Path,
    settings: &Settings,
    folders: &FolderArgs,
    config: &KilnConfig,
) -> Result<Recipe, String> {
    let recipe = Recipe::load(recipe_dir, settings).map_err(|e| e.to_string())?;

    let tool_name = folders.tool.as_deref().unwrap_or(config.tool_name());
    let tool = select_tool(tool_name, &config.toolchain).map_err(|e| e.to_string())?;

    let defaults = recipe.folders().clone();
    let layout = Folders {
        source: folders.source_folder.clone().unwrap_or(defaults.source),
        build: folders.build_folder.clone().unwrap_or(defaults.build),
        package: folders.package_folder.clone().unwrap_or(defaults.package),
        dependencies: folders.dep_folders.clone(),
    };

    Ok(recipe
        .with_folders(layout)
        .with_translator(Translator::new(config.toolchain.clone()))
        .with_tool(tool))
}

/// Fail early when the cmake backend cannot run. `KILN_SKIP_PREREQS=1`
/// disables the check.
pub fn ensure_prereqs(folders: &FolderArgs, config: &KilnConfig) -> Result<(), String> {
    let tool_name = folders.tool.as_deref().unwrap_or(config.tool_name());
    if tool_name != "cmake" || std::env::var("KILN_SKIP_PREREQS").as_deref() == Ok("1") {
        return Ok(());
    }
    let missing = check_cmake_prereqs(
        &config.toolchain.cmake_program,
        config.toolchain.generator.as_deref(),
    );
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format_missing(&missing).trim_end().to_owned())
    }
}

/// Declared requirements, with `--resolved` entries replacing same-named ones
/// and adding the rest.
pub fn resolution_set(recipe: &Recipe, args: &ResolvedArgs) -> Result<Vec<DependencyRef>, String> {
    let mut by_name: BTreeMap<String, DependencyRef> = recipe
        .descriptor()
        .requires
        .iter()
        .map(|dep| (dep.name.clone(), dep.clone()))
        .collect();
    for raw in &args.resolved {
        let dep: DependencyRef = raw
            .parse()
            .map_err(|e| format!("invalid --resolved '{raw}': {e}"))?;
        by_name.insert(dep.name.clone(), dep);
    }
    Ok(by_name.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_recipe(dir: &Path) {
        std::fs::write(
            dir.join("kiln.toml"),
            "[package]\nname = \"six\"\nrequires = [\"nitro/2.11.5@user/testing\"]\n[options]\nshared = false\n",
        )
        .unwrap();
    }

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn colorize_state_keeps_text() {
        assert!(colorize_state("built").contains("built"));
        assert!(colorize_state("installed").contains("installed"));
        assert_eq!(colorize_state("unknown"), "unknown");
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_DESCRIPTOR_ERROR);
        assert_ne!(EXIT_DESCRIPTOR_ERROR, EXIT_REPOSITORY_ERROR);
    }

    #[test]
    fn overrides_apply_after_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = dir.path().join("profile.toml");
        std::fs::write(
            &profile,
            "os = \"Linux\"\narch = \"x86_64\"\nbuild_type = \"Release\"\n[compiler]\nname = \"gcc\"\nversion = \"11\"\n",
        )
        .unwrap();
        let args = SettingsArgs {
            profile: Some(profile),
            settings: vec!["build_type=Debug".to_owned()],
            options: vec!["shared=True".to_owned()],
        };

        let settings = load_settings(&args, &KilnConfig::default()).unwrap();
        assert_eq!(settings.build_type.to_string(), "Debug");
        assert_eq!(settings.compiler.version, "11");
        assert_eq!(settings.option("shared"), Some(true));
    }

    #[test]
    fn bad_override_is_a_profile_error() {
        let args = SettingsArgs {
            settings: vec!["color=blue".to_owned()],
            ..SettingsArgs::default()
        };
        let err = load_settings(&args, &KilnConfig::default()).unwrap_err();
        assert!(err.starts_with("profile error:"));
    }

    #[test]
    fn folder_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        write_recipe(dir.path());
        let folders = FolderArgs {
            build_folder: Some(dir.path().join("out")),
            dep_folders: vec![dir.path().join("deps/nitro")],
            tool: Some("mock".to_owned()),
            ..FolderArgs::default()
        };

        let recipe = open_recipe(
            dir.path(),
            &Settings::detect_host(),
            &folders,
            &KilnConfig::default(),
        )
        .unwrap();
        assert_eq!(recipe.folders().build, dir.path().join("out"));
        assert_eq!(recipe.folders().package, dir.path().join("package"));
        assert_eq!(recipe.folders().dependencies.len(), 1);
    }

    #[test]
    fn resolved_entries_replace_declared_ones() {
        let dir = tempfile::tempdir().unwrap();
        write_recipe(dir.path());
        let recipe = Recipe::load(dir.path(), &Settings::detect_host()).unwrap();
        let args = ResolvedArgs {
            resolved: vec![
                "nitro/2.11.6@user/testing".to_owned(),
                "zlib/1.3.1@conan/stable".to_owned(),
            ],
        };

        let set = resolution_set(&recipe, &args).unwrap();
        let rendered: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["nitro/2.11.6@user/testing", "zlib/1.3.1@conan/stable"]
        );
    }

    #[test]
    fn mock_tool_needs_no_prereqs() {
        let folders = FolderArgs {
            tool: Some("mock".to_owned()),
            ..FolderArgs::default()
        };
        assert!(ensure_prereqs(&folders, &KilnConfig::default()).is_ok());
    }

    #[test]
    fn spinner_finishes() {
        let pb = spinner("testing...");
        spin_ok(&pb, "done");
        let pb = spinner("testing...");
        spin_fail(&pb, "failed");
    }
}
