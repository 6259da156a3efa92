use super::{json_pretty, EXIT_SUCCESS};
use bundlecat_render::{LabelSet, LocalImageStore};
use bundlecat_schema::read_catalog_file;
use std::path::Path;

pub fn run(
    store_path: &Path,
    reference: &str,
    labels_path: &Path,
    catalog_path: Option<&Path>,
    json: bool,
) -> Result<u8, String> {
    let content = std::fs::read_to_string(labels_path)
        .map_err(|e| format!("failed to read labels {}: {e}", labels_path.display()))?;
    let labels: LabelSet = serde_json::from_str(&content)
        .map_err(|e| format!("invalid labels {}: {e}", labels_path.display()))?;
    let catalog = catalog_path
        .map(|p| {
            read_catalog_file(p).map_err(|e| format!("failed to read catalog {}: {e}", p.display()))
        })
        .transpose()?;

    let store = LocalImageStore::new(store_path);
    let dir = store
        .import(reference, &labels, catalog.as_ref())
        .map_err(|e| format!("store error: {e}"))?;

    if json {
        let payload = serde_json::json!({
            "reference": reference.trim(),
            "path": dir,
            "labels": labels.len(),
            "has_catalog": catalog.is_some(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("imported {} ({} labels)", reference.trim(), labels.len());
    }
    Ok(EXIT_SUCCESS)
}
