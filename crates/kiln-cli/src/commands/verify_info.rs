use super::{json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use kiln_schema::{BinaryInfo, INFO_FILE};
use std::path::Path;

/// Recompute the package id of a binary info record from its recorded facts.
pub fn run(package_folder: &Path, json: bool) -> Result<u8, String> {
    let path = if package_folder.is_dir() {
        package_folder.join(INFO_FILE)
    } else {
        package_folder.to_path_buf()
    };
    let info = BinaryInfo::read_from_file(&path).map_err(|e| e.to_string())?;
    let outcome = info.verify_integrity();

    if json {
        let payload = serde_json::json!({
            "name": info.name,
            "version": info.version,
            "package_id": info.package_id,
            "valid": outcome.is_ok(),
            "error": outcome.as_ref().err().map(ToString::to_string),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        match &outcome {
            Ok(_) => println!("✓ {} {} ({}) verified", info.name, info.version, info.short_id),
            Err(e) => println!("✗ {}: {e}", path.display()),
        }
    }
    Ok(if outcome.is_ok() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    })
}
