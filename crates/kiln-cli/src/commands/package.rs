use super::{
    colorize_state, ensure_prereqs, json_pretty, load_settings, open_recipe, resolution_set,
    spin_fail, spin_ok, spinner, FolderArgs, ResolvedArgs, SettingsArgs, EXIT_SUCCESS,
};
use kiln_core::{KilnConfig, LifecycleReport};
use kiln_schema::BinaryInfo;
use std::path::Path;

pub fn run(
    recipe_dir: &Path,
    settings_args: &SettingsArgs,
    folder_args: &FolderArgs,
    resolved_args: &ResolvedArgs,
    no_record: bool,
    config: &KilnConfig,
    json: bool,
) -> Result<u8, String> {
    ensure_prereqs(folder_args, config)?;
    let settings = load_settings(settings_args, config)?;
    let recipe = open_recipe(recipe_dir, &settings, folder_args, config)?;

    // Version and resolution are checked before the tool runs.
    let prepared = if no_record {
        None
    } else {
        let version = recipe.resolve_version().map_err(|e| e.to_string())?;
        Some((version, resolution_set(&recipe, resolved_args)?))
    };

    let name = recipe.descriptor().name.clone();
    let pb = if json {
        None
    } else {
        Some(spinner(&format!("packaging {name}...")))
    };

    let outcome: Result<(LifecycleReport, Option<BinaryInfo>), _> = match prepared {
        Some((version, resolved)) => recipe
            .package_and_record(version, &resolved)
            .map(|(report, info)| (report, Some(info))),
        None => recipe.package().map(|report| (report, None)),
    };

    let (report, info) = match outcome {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, &format!("{name} packaged"));
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "package failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        let payload = serde_json::json!({
            "name": name,
            "state": report.state,
            "package_folder": report.invocation.folders.package,
            "version": info.as_ref().map(|i| i.version.clone()),
            "package_id": info.as_ref().map(|i| i.package_id.clone()),
            "short_id": info.as_ref().map(|i| i.short_id.clone()),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("state:          {}", colorize_state(&report.state.to_string()));
        println!(
            "package folder: {}",
            report.invocation.folders.package.display()
        );
        if let Some(info) = info {
            println!("version:        {}", info.version);
            println!("package_id:     {}", info.package_id);
        }
    }
    Ok(EXIT_SUCCESS)
}
