use super::{
    json_pretty, load_settings, resolution_set, ResolvedArgs, SettingsArgs, EXIT_SUCCESS,
};
use kiln_core::{KilnConfig, Recipe};
use std::path::Path;

pub fn run(
    recipe_dir: &Path,
    settings_args: &SettingsArgs,
    resolved_args: &ResolvedArgs,
    config: &KilnConfig,
    json: bool,
) -> Result<u8, String> {
    let settings = load_settings(settings_args, config)?;
    let recipe = Recipe::load(recipe_dir, &settings).map_err(|e| e.to_string())?;
    let resolved = resolution_set(&recipe, resolved_args)?;
    let facts = recipe.identity_facts(&resolved).map_err(|e| e.to_string())?;
    let identity = facts.digest();

    if json {
        let payload = serde_json::json!({
            "name": recipe.descriptor().name,
            "package_id": identity.package_id,
            "short_id": identity.short_id,
            "facts": facts,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{}", identity.package_id);
    }
    Ok(EXIT_SUCCESS)
}
