use super::{json_pretty, load_settings, open_recipe, FolderArgs, SettingsArgs, EXIT_SUCCESS};
use kiln_core::KilnConfig;
use std::path::Path;

/// Show the normalized descriptor and the tool invocation the current
/// settings translate to, without running anything.
pub fn run(
    recipe_dir: &Path,
    settings_args: &SettingsArgs,
    folder_args: &FolderArgs,
    config: &KilnConfig,
    json: bool,
) -> Result<u8, String> {
    let settings = load_settings(settings_args, config)?;
    let recipe = open_recipe(recipe_dir, &settings, folder_args, config)?;
    let invocation = recipe.invocation().map_err(|e| e.to_string())?;
    let descriptor = recipe.descriptor();
    let program = &config.toolchain.cmake_program;

    if json {
        let payload = serde_json::json!({
            "descriptor": descriptor,
            "settings": recipe.settings(),
            "program": program,
            "invocation": invocation,
        });
        println!("{}", json_pretty(&payload)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("name:       {}", descriptor.name);
    if !descriptor.description.is_empty() {
        println!("about:      {}", descriptor.description);
    }
    if !descriptor.license.is_empty() {
        println!("license:    {}", descriptor.license);
    }
    println!("requires:   {}", descriptor.requires.len());
    for dep in &descriptor.requires {
        println!("  - {dep}");
    }
    for (name, value) in &recipe.settings().options {
        println!("option:     {name}={value}");
    }
    println!("generator:  {}", invocation.generator);
    if let Some(platform) = &invocation.platform {
        println!("platform:   {platform}");
    }
    if !invocation.applied_quirks.is_empty() {
        println!("quirks:     {}", invocation.applied_quirks.join(", "));
    }
    println!("configure:  {program} {}", invocation.configure_args().join(" "));
    println!("build:      {program} {}", invocation.build_args().join(" "));
    println!("install:    {program} {}", invocation.install_args().join(" "));
    Ok(EXIT_SUCCESS)
}
