use super::{json_pretty, EXIT_SUCCESS};
use std::path::Path;

pub fn run(recipe_dir: &Path, json: bool) -> Result<u8, String> {
    let version = kiln_vcs::resolve_version(recipe_dir)
        .map_err(|e| format!("repository state error: {e}"))?;
    if json {
        let payload = serde_json::json!({ "version": version });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{version}");
    }
    Ok(EXIT_SUCCESS)
}
