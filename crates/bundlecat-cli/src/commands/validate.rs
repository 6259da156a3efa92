use super::{json_pretty, EXIT_SUCCESS};
use bundlecat_schema::{read_catalog_file, validate};
use std::path::Path;

pub fn run(path: &Path, json: bool) -> Result<u8, String> {
    let cfg = read_catalog_file(path)
        .map_err(|e| format!("failed to read catalog {}: {e}", path.display()))?;
    let model = validate(&cfg).map_err(|e| format!("validation error: {e}"))?;

    if json {
        let payload = serde_json::json!({
            "valid": true,
            "packages": model.packages.len(),
            "channels": model.channel_count(),
            "bundles": model.bundle_count(),
            "others": cfg.others.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{}: valid ({} packages, {} channels, {} bundles)",
            path.display(),
            model.packages.len(),
            model.channel_count(),
            model.bundle_count()
        );
    }
    Ok(EXIT_SUCCESS)
}
