use super::{
    colorize_state, ensure_prereqs, json_pretty, load_settings, open_recipe, spin_fail, spin_ok,
    spinner, FolderArgs, SettingsArgs, EXIT_SUCCESS,
};
use kiln_core::KilnConfig;
use std::path::Path;

pub fn run(
    recipe_dir: &Path,
    settings_args: &SettingsArgs,
    folder_args: &FolderArgs,
    config: &KilnConfig,
    json: bool,
) -> Result<u8, String> {
    ensure_prereqs(folder_args, config)?;
    let settings = load_settings(settings_args, config)?;
    let recipe = open_recipe(recipe_dir, &settings, folder_args, config)?;

    let pb = if json {
        None
    } else {
        Some(spinner(&format!("building {}...", recipe.descriptor().name)))
    };

    let report = match recipe.build() {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, &format!("{} built", recipe.descriptor().name));
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "build failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "name": recipe.descriptor().name,
            "state": report.state,
            "build_folder": report.invocation.folders.build,
            "generator": report.invocation.generator,
            "applied_quirks": report.invocation.applied_quirks,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("state:        {}", colorize_state(&report.state.to_string()));
        println!("build folder: {}", report.invocation.folders.build.display());
        println!("generator:    {}", report.invocation.generator);
    }
    Ok(EXIT_SUCCESS)
}
